//! Tick-driven game state: selection, placement, firing and projectile movement.

use std::collections::BTreeMap;

use monster_defence_core::{
    Cadence, Event, GridDimensions, Monster, PlacementError, ProjectileId, SceneContext,
    TowerId, TowerKind,
};
use tracing::{debug, trace};

use crate::{grid::Tile, projectiles::Projectile, towers::Tower};

/// Tunable rules governing the simulation cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rules {
    dimensions: GridDimensions,
    fire_cadence: Cadence,
    movement_cadence: Cadence,
    despawn_out_of_bounds: bool,
}

impl Rules {
    /// Creates rules for a play field of the provided dimensions using the
    /// default cadences and no despawning.
    #[must_use]
    pub const fn new(dimensions: GridDimensions) -> Self {
        Self {
            dimensions,
            fire_cadence: Cadence::DEFAULT_FIRE,
            movement_cadence: Cadence::DEFAULT_MOVEMENT,
            despawn_out_of_bounds: false,
        }
    }

    /// Replaces the interval between tower volleys.
    #[must_use]
    pub const fn with_fire_cadence(mut self, cadence: Cadence) -> Self {
        self.fire_cadence = cadence;
        self
    }

    /// Replaces the interval between projectile steps.
    #[must_use]
    pub const fn with_movement_cadence(mut self, cadence: Cadence) -> Self {
        self.movement_cadence = cadence;
        self
    }

    /// Enables or disables removal of projectiles that leave the play field.
    #[must_use]
    pub const fn with_despawn_out_of_bounds(mut self, enabled: bool) -> Self {
        self.despawn_out_of_bounds = enabled;
        self
    }

    /// Dimensions of the play field.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Interval between tower volleys.
    #[must_use]
    pub const fn fire_cadence(&self) -> Cadence {
        self.fire_cadence
    }

    /// Interval between projectile steps.
    #[must_use]
    pub const fn movement_cadence(&self) -> Cadence {
        self.movement_cadence
    }

    /// Whether projectiles leaving the play field are removed.
    #[must_use]
    pub const fn despawn_out_of_bounds(&self) -> bool {
        self.despawn_out_of_bounds
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new(GridDimensions::default())
    }
}

/// Authoritative simulation state.
///
/// Every tower lives in exactly one place: the selection slot before it is
/// placed, or the bucket for its kind afterwards.
#[derive(Debug)]
pub struct GameState {
    rules: Rules,
    tick: u64,
    towers_by_kind: BTreeMap<TowerKind, Vec<Tower>>,
    projectiles: Vec<Projectile>,
    selected: Option<Tower>,
    next_tower_id: TowerId,
    next_projectile_id: ProjectileId,
}

impl GameState {
    /// Creates an empty game state at tick zero.
    #[must_use]
    pub fn new(rules: Rules) -> Self {
        Self {
            rules,
            tick: 0,
            towers_by_kind: TowerKind::ALL
                .into_iter()
                .map(|kind| (kind, Vec::new()))
                .collect(),
            projectiles: Vec::new(),
            selected: None,
            next_tower_id: TowerId::new(0),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    /// Rules the state was created with.
    #[must_use]
    pub const fn rules(&self) -> &Rules {
        &self.rules
    }

    /// Number of completed steps.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Tower waiting in the selection slot, if any.
    #[must_use]
    pub fn selected(&self) -> Option<&Tower> {
        self.selected.as_ref()
    }

    /// Placed towers of the provided kind in placement order.
    #[must_use]
    pub fn towers(&self, kind: TowerKind) -> &[Tower] {
        self.towers_by_kind
            .get(&kind)
            .map_or(&[], |towers| towers.as_slice())
    }

    /// All placed towers, grouped by kind, each group in placement order.
    pub fn placed_towers(&self) -> impl Iterator<Item = &Tower> {
        self.towers_by_kind.values().flatten()
    }

    /// Placed tower with the provided identifier.
    #[must_use]
    pub fn placed_tower(&self, id: TowerId) -> Option<&Tower> {
        self.placed_towers().find(|tower| tower.id() == id)
    }

    /// Live projectiles in spawn order.
    #[must_use]
    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    /// Creates a fresh, unplaced tower with a newly allocated identifier.
    pub fn create_tower<S>(&mut self, kind: TowerKind, monster: Monster, scene: &mut S) -> Tower
    where
        S: SceneContext + ?Sized,
    {
        let id = self.next_tower_id;
        self.next_tower_id = id.next();
        Tower::new(id, kind, monster, scene)
    }

    /// Puts `tower` in the selection slot. A previous unplaced selection is
    /// dropped and its drawable released.
    pub fn select_tower<S>(&mut self, tower: Tower, scene: &mut S, out_events: &mut Vec<Event>)
    where
        S: SceneContext + ?Sized,
    {
        let id = tower.id();
        let kind = tower.kind();

        if let Some(discarded) = self.selected.replace(tower) {
            scene.destroy(discarded.drawable());
            debug!(
                tower = discarded.id().get(),
                kind = %discarded.kind(),
                "unplaced selection discarded"
            );
            out_events.push(Event::SelectionDiscarded {
                tower: discarded.id(),
                kind: discarded.kind(),
            });
        }

        debug!(tower = id.get(), %kind, "tower selected");
        out_events.push(Event::TowerSelected { tower: id, kind });
    }

    /// Moves the selected tower onto `tile`.
    ///
    /// Fails without changing any state when nothing is selected or the tile
    /// already holds a tower.
    pub fn place_tower<S>(
        &mut self,
        tile: &mut Tile,
        scene: &mut S,
        out_events: &mut Vec<Event>,
    ) -> Result<TowerId, PlacementError>
    where
        S: SceneContext + ?Sized,
    {
        if self.selected.is_some() && tile.is_occupied() {
            return Err(PlacementError::TileOccupied { tile: tile.index() });
        }
        let mut tower = self
            .selected
            .take()
            .ok_or(PlacementError::NoTowerSelected)?;

        let id = tower.id();
        let kind = tower.kind();
        let position = tile.position();
        tower.place_at(position, scene);
        tile.occupy(id);
        self.towers_by_kind.entry(kind).or_default().push(tower);

        debug!(tower = id.get(), %kind, tile = tile.index().get(), %position, "tower placed");
        out_events.push(Event::TowerPlaced {
            tower: id,
            kind,
            tile: tile.index(),
            position,
        });
        Ok(id)
    }

    /// Appends a projectile and shows it in the scene.
    pub fn add_projectile<S>(
        &mut self,
        projectile: Projectile,
        scene: &mut S,
        out_events: &mut Vec<Event>,
    ) where
        S: SceneContext + ?Sized,
    {
        scene.attach(projectile.drawable());
        out_events.push(Event::ProjectileSpawned {
            projectile: projectile.id(),
            kind: projectile.kind(),
            tower: projectile.tower(),
            position: projectile.position(),
        });
        self.projectiles.push(projectile);
    }

    /// Advances the simulation by one tick.
    ///
    /// Runs, in order: tick increment, firing phase, movement phase, redraw
    /// request. Both phases run when their cadences coincide; the movement
    /// phase only steps projectiles that were in flight before this tick's
    /// volley, so a fresh projectile starts moving on the next due tick.
    pub fn step<S>(&mut self, scene: &mut S, out_events: &mut Vec<Event>)
    where
        S: SceneContext + ?Sized,
    {
        self.tick = self.tick.saturating_add(1);
        trace!(tick = self.tick, "tick");
        out_events.push(Event::TickAdvanced { tick: self.tick });

        let in_flight = self.projectiles.len();

        if self.rules.fire_cadence.is_due(self.tick) && self.has_armed_towers() {
            self.fire_towers(scene, out_events);
        }

        if self.rules.movement_cadence.is_due(self.tick) && in_flight > 0 {
            self.advance_projectiles(in_flight, scene, out_events);
        }

        scene.request_redraw();
    }

    fn has_armed_towers(&self) -> bool {
        self.towers_by_kind
            .iter()
            .any(|(kind, towers)| kind.projectile().is_some() && !towers.is_empty())
    }

    fn fire_towers<S>(&mut self, scene: &mut S, out_events: &mut Vec<Event>)
    where
        S: SceneContext + ?Sized,
    {
        let mut volley = Vec::new();
        for tower in self.towers_by_kind.values().flatten() {
            if let Some(projectile) = tower.fire(self.next_projectile_id, scene) {
                self.next_projectile_id = self.next_projectile_id.next();
                volley.push(projectile);
            }
        }

        debug!(tick = self.tick, projectiles = volley.len(), "towers fired");
        for projectile in volley {
            self.add_projectile(projectile, scene, out_events);
        }
    }

    fn advance_projectiles<S>(&mut self, in_flight: usize, scene: &mut S, out_events: &mut Vec<Event>)
    where
        S: SceneContext + ?Sized,
    {
        let cell_size = self.rules.dimensions.cell_size();
        for projectile in self.projectiles.iter_mut().take(in_flight) {
            let from = projectile.position();
            let to = projectile.advance(cell_size);
            scene.set_position(projectile.drawable(), to);
            out_events.push(Event::ProjectileAdvanced {
                projectile: projectile.id(),
                from,
                to,
            });
        }

        if self.rules.despawn_out_of_bounds {
            self.despawn_escaped(scene, out_events);
        }
    }

    fn despawn_escaped<S>(&mut self, scene: &mut S, out_events: &mut Vec<Event>)
    where
        S: SceneContext + ?Sized,
    {
        let dimensions = self.rules.dimensions;
        let (kept, escaped): (Vec<_>, Vec<_>) = self
            .projectiles
            .drain(..)
            .partition(|projectile| dimensions.overlaps_field(projectile.position()));
        self.projectiles = kept;

        for projectile in escaped {
            scene.destroy(projectile.drawable());
            debug!(
                projectile = projectile.id().get(),
                position = %projectile.position(),
                "projectile left the field"
            );
            out_events.push(Event::ProjectileDespawned {
                projectile: projectile.id(),
                position: projectile.position(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Grid;
    use monster_defence_core::{PixelPosition, TileIndex, TileKind};
    use monster_defence_rendering::HeadlessScene;

    fn setup() -> (GameState, Grid, HeadlessScene) {
        let mut scene = HeadlessScene::new();
        let rules = Rules::default();
        let grid = Grid::layout(TileKind::Background, rules.dimensions(), &mut scene);
        (GameState::new(rules), grid, scene)
    }

    fn select(game: &mut GameState, scene: &mut HeadlessScene, kind: TowerKind) -> TowerId {
        let tower = game.create_tower(kind, Monster::new("bulbasaur"), scene);
        let id = tower.id();
        game.select_tower(tower, scene, &mut Vec::new());
        id
    }

    #[test]
    fn tower_ids_are_allocated_sequentially() {
        let (mut game, _grid, mut scene) = setup();

        let first = game.create_tower(TowerKind::Grass, Monster::new("a"), &mut scene);
        let second = game.create_tower(TowerKind::Fire, Monster::new("b"), &mut scene);

        assert_eq!(first.id(), TowerId::new(0));
        assert_eq!(second.id(), TowerId::new(1));
    }

    #[test]
    fn placement_attaches_the_tower_drawable_at_the_tile() {
        let (mut game, mut grid, mut scene) = setup();
        let id = select(&mut game, &mut scene, TowerKind::Grass);
        let tile = grid.tile_mut(TileIndex::new(40)).expect("tile 40");
        let mut events = Vec::new();

        let placed = game
            .place_tower(tile, &mut scene, &mut events)
            .expect("placement succeeds");

        assert_eq!(placed, id);
        let tower = game.placed_tower(id).expect("tower placed");
        let drawable = scene.drawable(tower.drawable()).expect("tower drawable");
        assert!(drawable.attached);
        assert_eq!(drawable.position, PixelPosition::new(144, 16));
        assert_eq!(
            events,
            vec![Event::TowerPlaced {
                tower: id,
                kind: TowerKind::Grass,
                tile: TileIndex::new(40),
                position: PixelPosition::new(144, 16),
            }]
        );
    }

    #[test]
    fn occupied_tile_keeps_the_selection() {
        let (mut game, mut grid, mut scene) = setup();
        let _ = select(&mut game, &mut scene, TowerKind::Grass);
        let tile = grid.tile_mut(TileIndex::new(3)).expect("tile 3");
        let _ = game
            .place_tower(tile, &mut scene, &mut Vec::new())
            .expect("first placement succeeds");

        let second = select(&mut game, &mut scene, TowerKind::Fire);
        let tile = grid.tile_mut(TileIndex::new(3)).expect("tile 3");
        let result = game.place_tower(tile, &mut scene, &mut Vec::new());

        assert_eq!(
            result,
            Err(PlacementError::TileOccupied {
                tile: TileIndex::new(3)
            })
        );
        assert_eq!(game.selected().map(Tower::id), Some(second));
        assert!(game.towers(TowerKind::Fire).is_empty());
    }

    #[test]
    fn fire_towers_never_spawn_projectiles() {
        let (mut game, mut grid, mut scene) = setup();
        let _ = select(&mut game, &mut scene, TowerKind::Fire);
        let tile = grid.tile_mut(TileIndex::new(10)).expect("tile 10");
        let _ = game
            .place_tower(tile, &mut scene, &mut Vec::new())
            .expect("placement succeeds");

        let mut events = Vec::new();
        for _ in 0..200 {
            game.step(&mut scene, &mut events);
        }

        assert!(game.projectiles().is_empty());
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::ProjectileSpawned { .. })));
    }

    #[test]
    fn step_requests_one_redraw_per_call() {
        let (mut game, _grid, mut scene) = setup();
        let before = scene.redraw_requests();

        for _ in 0..7 {
            game.step(&mut scene, &mut Vec::new());
        }

        assert_eq!(scene.redraw_requests() - before, 7);
    }

    fn despawning_state(columns: u32, fire_cadence: u64) -> (GameState, Grid, HeadlessScene) {
        let mut scene = HeadlessScene::new();
        let dimensions = GridDimensions::new(columns, 1, 16).expect("valid dimensions");
        let rules = Rules::new(dimensions)
            .with_fire_cadence(Cadence::new(fire_cadence).expect("non-zero"))
            .with_movement_cadence(Cadence::new(1).expect("non-zero"))
            .with_despawn_out_of_bounds(true);
        let grid = Grid::layout(TileKind::Background, dimensions, &mut scene);
        (GameState::new(rules), grid, scene)
    }

    #[test]
    fn despawn_removes_projectiles_that_leave_the_field() {
        let (mut game, mut grid, mut scene) = despawning_state(4, 2);
        let _ = select(&mut game, &mut scene, TowerKind::Grass);
        let tile = grid.tile_mut(TileIndex::new(1)).expect("tile 1");
        let _ = game
            .place_tower(tile, &mut scene, &mut Vec::new())
            .expect("placement succeeds");

        for _ in 0..2 {
            game.step(&mut scene, &mut Vec::new());
        }
        let first = &game.projectiles()[0];
        assert_eq!(first.position(), PixelPosition::new(16, 0));
        let (first_id, drawable) = (first.id(), first.drawable());

        game.step(&mut scene, &mut Vec::new());
        assert_eq!(game.projectiles().len(), 1, "x=0 is still on the field");

        let mut events = Vec::new();
        game.step(&mut scene, &mut events);
        let live: Vec<_> = game.projectiles().iter().map(Projectile::id).collect();
        assert_eq!(live, vec![first_id.next()]);
        assert!(events.contains(&Event::ProjectileDespawned {
            projectile: first_id,
            position: PixelPosition::new(-16, 0),
        }));
        assert!(scene.drawable(drawable).is_none());
    }

    #[test]
    fn scene_stays_bounded_while_projectiles_despawn() {
        let (mut game, mut grid, mut scene) = despawning_state(2, 50);
        let _ = select(&mut game, &mut scene, TowerKind::Grass);
        let tile = grid.tile_mut(TileIndex::new(0)).expect("tile 0");
        let _ = game
            .place_tower(tile, &mut scene, &mut Vec::new())
            .expect("placement succeeds");
        let baseline = scene.drawable_count();

        let mut despawned = 0;
        for _ in 0..20_000 {
            let mut events = Vec::new();
            game.step(&mut scene, &mut events);
            despawned += events
                .iter()
                .filter(|event| matches!(event, Event::ProjectileDespawned { .. }))
                .count();
            assert_eq!(
                scene.drawable_count(),
                baseline + game.projectiles().len(),
                "tick {}",
                game.tick()
            );
        }

        assert_eq!(despawned, 399);
        assert_eq!(game.projectiles().len(), 1);
    }

    #[test]
    fn discarded_selection_releases_its_drawable() {
        let (mut game, _grid, mut scene) = setup();
        let baseline = scene.drawable_count();

        let _ = select(&mut game, &mut scene, TowerKind::Grass);
        let discarded = game.selected().map(Tower::drawable).expect("selected");
        let _ = select(&mut game, &mut scene, TowerKind::Fire);

        assert!(scene.drawable(discarded).is_none());
        assert_eq!(scene.drawable_count(), baseline + 1);
    }

    #[test]
    fn without_despawn_projectiles_travel_forever() {
        let (mut game, mut grid, mut scene) = setup();
        let _ = select(&mut game, &mut scene, TowerKind::Grass);
        let tile = grid.tile_mut(TileIndex::new(0)).expect("tile 0");
        let _ = game
            .place_tower(tile, &mut scene, &mut Vec::new())
            .expect("placement succeeds");

        for _ in 0..50 {
            game.step(&mut scene, &mut Vec::new());
        }
        for _ in 0..100 {
            game.step(&mut scene, &mut Vec::new());
        }

        let first = &game.projectiles()[0];
        assert_eq!(first.position(), PixelPosition::new(-64, 0));
    }
}
