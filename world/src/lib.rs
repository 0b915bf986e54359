#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Monster Defence.

mod game;
mod grid;
mod projectiles;
mod towers;

pub use game::{GameState, Rules};
pub use grid::{Grid, Tile};
pub use projectiles::Projectile;
pub use towers::Tower;

use monster_defence_core::{Command, Event, PlacementError, SceneContext, TileKind};

/// Represents the authoritative Monster Defence world: the game state plus
/// the grid it is played on.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    game: GameState,
    grid: Grid,
}

impl World {
    /// Creates a world, laying out the grid described by `rules` into `scene`.
    pub fn new<S>(rules: Rules, tile_kind: TileKind, scene: &mut S) -> Self
    where
        S: SceneContext + ?Sized,
    {
        let grid = Grid::layout(tile_kind, rules.dimensions(), scene);
        Self {
            banner: monster_defence_core::WELCOME_BANNER,
            game: GameState::new(rules),
            grid,
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected placements leave the world untouched and are reported as
/// [`Event::TowerPlacementRejected`].
pub fn apply<S>(world: &mut World, command: Command, scene: &mut S, out_events: &mut Vec<Event>)
where
    S: SceneContext + ?Sized,
{
    match command {
        Command::SelectTower { kind, monster } => {
            let tower = world.game.create_tower(kind, monster, scene);
            world.game.select_tower(tower, scene, out_events);
        }
        Command::PlaceTower { tile } => {
            let result = match world.grid.tile_mut(tile) {
                Some(target) => target.on_pointer_down(&mut world.game, scene, out_events),
                None => Err(PlacementError::TileOutOfBounds { tile }),
            };

            if let Err(reason) = result {
                tracing::debug!(tile = tile.get(), %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected { tile, reason });
            }
        }
        Command::Tick => world.game.step(scene, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use monster_defence_core::{TileIndex, TowerKind};

    use super::{GameState, Grid, Projectile, Tower, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Provides read-only access to the game state.
    #[must_use]
    pub fn game(world: &World) -> &GameState {
        &world.game
    }

    /// Provides read-only access to the grid.
    #[must_use]
    pub fn grid(world: &World) -> &Grid {
        &world.grid
    }

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick(world: &World) -> u64 {
        world.game.tick()
    }

    /// Tower waiting in the selection slot, if any.
    #[must_use]
    pub fn selected_tower(world: &World) -> Option<&Tower> {
        world.game.selected()
    }

    /// Placed towers of the provided kind in placement order.
    #[must_use]
    pub fn towers(world: &World, kind: TowerKind) -> &[Tower] {
        world.game.towers(kind)
    }

    /// Live projectiles in spawn order.
    #[must_use]
    pub fn projectiles(world: &World) -> &[Projectile] {
        world.game.projectiles()
    }

    /// Resolves the tower referenced by the tile at `index`.
    #[must_use]
    pub fn tower_on_tile(world: &World, index: TileIndex) -> Option<&Tower> {
        world
            .grid
            .tile(index)
            .and_then(|tile| tile.occupant())
            .and_then(|id| world.game.placed_tower(id))
    }
}
