#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pointer input system: the tower picker and routing of pointer-downs to
//! world commands.

use monster_defence_core::{
    AssetKey, Command, DrawableHandle, GridDimensions, Monster, PixelPosition, SceneContext,
    TileIndex, TowerKind,
};

/// Tower offered by one slot of the picker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PickerEntry {
    kind: TowerKind,
    monster: Monster,
}

impl PickerEntry {
    /// Creates an entry offering a `kind` tower drawn as `monster`.
    #[must_use]
    pub fn new(kind: TowerKind, monster: Monster) -> Self {
        Self { kind, monster }
    }

    /// Tower kind created when the entry is chosen.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Monster identity of the created tower.
    #[must_use]
    pub fn monster(&self) -> &Monster {
        &self.monster
    }

    /// Command issued when the entry is chosen.
    #[must_use]
    pub fn select_command(&self) -> Command {
        Command::SelectTower {
            kind: self.kind,
            monster: self.monster.clone(),
        }
    }
}

/// Index of an icon in the tower picker, counted from the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PickerSlot(usize);

impl PickerSlot {
    /// Creates a slot referencing the provided index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Retrieves the numeric index of the slot.
    #[must_use]
    pub const fn get(&self) -> usize {
        self.0
    }
}

/// What a pointer-down landed on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointerTarget {
    /// An icon of the tower picker.
    Picker(PickerSlot),
    /// A tile of the play field.
    Tile(TileIndex),
}

/// Column of tower icons drawn along the left edge of the play field.
#[derive(Clone, Debug)]
pub struct TowerPicker {
    entries: Vec<PickerEntry>,
    icon_size: u32,
    icons: Vec<DrawableHandle>,
}

impl TowerPicker {
    /// Creates a picker offering `entries`, each icon `icon_size` pixels square.
    #[must_use]
    pub fn new(entries: Vec<PickerEntry>, icon_size: u32) -> Self {
        Self {
            entries,
            icon_size,
            icons: Vec::new(),
        }
    }

    /// Picker offering a grass bulbasaur and a fire charmander.
    #[must_use]
    pub fn with_default_roster(icon_size: u32) -> Self {
        Self::new(
            vec![
                PickerEntry::new(TowerKind::Grass, Monster::new("bulbasaur")),
                PickerEntry::new(TowerKind::Fire, Monster::new("charmander")),
            ],
            icon_size,
        )
    }

    /// Creates, positions and attaches one drawable per entry.
    ///
    /// Installing twice leaves the first set of icons in place.
    pub fn install<S>(&mut self, scene: &mut S)
    where
        S: SceneContext + ?Sized,
    {
        if !self.icons.is_empty() {
            tracing::warn!("tower picker already installed");
            return;
        }

        for (index, entry) in self.entries.iter().enumerate() {
            let asset = AssetKey::sprite(entry.monster.name());
            let drawable = scene.create_drawable(&asset);
            scene.set_position(drawable, self.icon_origin(index));
            scene.attach(drawable);
            self.icons.push(drawable);
        }

        tracing::debug!(icons = self.icons.len(), "tower picker installed");
    }

    /// Entries in slot order.
    #[must_use]
    pub fn entries(&self) -> &[PickerEntry] {
        &self.entries
    }

    /// Entry occupying the provided slot.
    #[must_use]
    pub fn entry(&self, slot: PickerSlot) -> Option<&PickerEntry> {
        self.entries.get(slot.get())
    }

    /// Drawables created by [`TowerPicker::install`], in slot order.
    #[must_use]
    pub fn icons(&self) -> &[DrawableHandle] {
        &self.icons
    }

    /// First slot offering the provided tower kind.
    #[must_use]
    pub fn slot_for(&self, kind: TowerKind) -> Option<PickerSlot> {
        self.entries
            .iter()
            .position(|entry| entry.kind == kind)
            .map(PickerSlot::new)
    }

    /// Top-left corner of the icon in `slot`.
    #[must_use]
    pub fn icon_position(&self, slot: PickerSlot) -> Option<PixelPosition> {
        (slot.get() < self.entries.len()).then(|| self.icon_origin(slot.get()))
    }

    /// Slot whose icon contains the provided pixel.
    #[must_use]
    pub fn slot_at(&self, position: PixelPosition) -> Option<PickerSlot> {
        let size = i64::from(self.icon_size);
        if size == 0 || position.x < 0 || position.x >= size || position.y < 0 {
            return None;
        }

        let index = usize::try_from(position.y / size).ok()?;
        (index < self.entries.len()).then_some(PickerSlot::new(index))
    }

    fn icon_origin(&self, index: usize) -> PixelPosition {
        let row = i64::try_from(index).unwrap_or(i64::MAX);
        PixelPosition::new(0, row.saturating_mul(i64::from(self.icon_size)))
    }
}

/// Routes pointer-downs to the picker or the grid and emits the matching
/// world commands.
#[derive(Clone, Debug)]
pub struct InputRouter {
    picker: TowerPicker,
    dimensions: GridDimensions,
}

impl InputRouter {
    /// Creates a router over the provided picker and play field.
    #[must_use]
    pub fn new(picker: TowerPicker, dimensions: GridDimensions) -> Self {
        Self { picker, dimensions }
    }

    /// Picker consulted before the grid.
    #[must_use]
    pub fn picker(&self) -> &TowerPicker {
        &self.picker
    }

    /// Resolves what lies under the provided pixel. Picker icons are drawn
    /// above the tiles and win.
    #[must_use]
    pub fn resolve(&self, position: PixelPosition) -> Option<PointerTarget> {
        if let Some(slot) = self.picker.slot_at(position) {
            return Some(PointerTarget::Picker(slot));
        }

        self.dimensions.index_at(position).map(PointerTarget::Tile)
    }

    /// Translates a resolved target into the command it triggers.
    #[must_use]
    pub fn dispatch(&self, target: PointerTarget) -> Option<Command> {
        match target {
            PointerTarget::Picker(slot) => self.picker.entry(slot).map(PickerEntry::select_command),
            PointerTarget::Tile(tile) => Some(Command::PlaceTower { tile }),
        }
    }

    /// Emits one command per pointer-down that hit something, in input order.
    pub fn handle(&self, pointer_downs: &[PixelPosition], out: &mut Vec<Command>) {
        for &position in pointer_downs {
            match self.resolve(position).and_then(|target| self.dispatch(target)) {
                Some(command) => out.push(command),
                None => tracing::trace!(%position, "pointer-down hit nothing"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monster_defence_rendering::HeadlessScene;

    fn router() -> InputRouter {
        InputRouter::new(
            TowerPicker::with_default_roster(16),
            GridDimensions::default(),
        )
    }

    #[test]
    fn default_roster_offers_grass_then_fire() {
        let picker = TowerPicker::with_default_roster(16);

        let kinds: Vec<_> = picker.entries().iter().map(PickerEntry::kind).collect();
        assert_eq!(kinds, vec![TowerKind::Grass, TowerKind::Fire]);
        assert_eq!(picker.entries()[0].monster().name(), "bulbasaur");
        assert_eq!(picker.entries()[1].monster().name(), "charmander");
        assert_eq!(picker.slot_for(TowerKind::Fire), Some(PickerSlot::new(1)));
    }

    #[test]
    fn install_stacks_icons_down_the_left_edge() {
        let mut scene = HeadlessScene::new();
        let mut picker = TowerPicker::with_default_roster(16);

        picker.install(&mut scene);
        picker.install(&mut scene);

        assert_eq!(picker.icons().len(), 2);
        let first = scene.drawable(picker.icons()[0]).expect("grass icon");
        let second = scene.drawable(picker.icons()[1]).expect("fire icon");
        assert_eq!(first.asset.as_str(), "img/bulbasaur.png");
        assert_eq!(first.position, PixelPosition::ORIGIN);
        assert_eq!(second.asset.as_str(), "img/charmander.png");
        assert_eq!(second.position, PixelPosition::new(0, 16));
        assert!(first.attached && second.attached);
        assert_eq!(scene.drawable_count(), 2);
    }

    #[test]
    fn picker_icons_take_priority_over_tiles() {
        let router = router();

        assert_eq!(
            router.resolve(PixelPosition::new(3, 20)),
            Some(PointerTarget::Picker(PickerSlot::new(1)))
        );
        assert_eq!(
            router.resolve(PixelPosition::new(3, 40)),
            Some(PointerTarget::Tile(TileIndex::new(62)))
        );
        assert_eq!(
            router.resolve(PixelPosition::new(90, 5)),
            Some(PointerTarget::Tile(TileIndex::new(5)))
        );
        assert_eq!(router.resolve(PixelPosition::new(-4, 5)), None);
    }

    #[test]
    fn handle_emits_commands_in_input_order() {
        let router = router();
        let mut commands = Vec::new();

        router.handle(
            &[
                PixelPosition::new(8, 8),
                PixelPosition::new(5000, 5),
                PixelPosition::new(88, 8),
            ],
            &mut commands,
        );

        assert_eq!(
            commands,
            vec![
                Command::SelectTower {
                    kind: TowerKind::Grass,
                    monster: Monster::new("bulbasaur"),
                },
                Command::PlaceTower {
                    tile: TileIndex::new(5),
                },
            ]
        );
    }

    #[test]
    fn icon_positions_exist_only_for_known_slots() {
        let picker = TowerPicker::with_default_roster(12);

        assert_eq!(
            picker.icon_position(PickerSlot::new(1)),
            Some(PixelPosition::new(0, 12))
        );
        assert_eq!(picker.icon_position(PickerSlot::new(2)), None);
        assert_eq!(picker.slot_at(PixelPosition::new(0, 24)), None);
    }
}
