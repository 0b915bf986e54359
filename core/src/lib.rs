#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Monster Defence engine.
//!
//! This crate defines the vocabulary that connects adapters, the authoritative
//! world, and pure systems. Adapters and systems submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then reports [`Event`] values describing what
//! happened. Anything visual flows through the [`SceneContext`] contract, which
//! the world calls into but never owns.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Monster Defence.";

/// Pixel edge length of one grid cell when no configuration overrides it.
pub const DEFAULT_TILE_SIZE: u32 = 16;
/// Number of grid columns when no configuration overrides it.
pub const DEFAULT_MAP_COLUMNS: u32 = 31;
/// Number of grid rows when no configuration overrides it.
pub const DEFAULT_MAP_ROWS: u32 = 20;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    /// Creates a fresh tower and places it in the selection slot.
    SelectTower {
        /// Kind of tower to create.
        kind: TowerKind,
        /// Visual identity of the created tower.
        monster: Monster,
    },
    /// Requests that the selected tower be placed onto the provided tile.
    PlaceTower {
        /// Linear index of the tile receiving the tower.
        tile: TileIndex,
    },
    /// Advances the simulation by exactly one tick.
    Tick,
}

/// Events reported by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Event {
    /// Indicates that the tick counter advanced.
    TickAdvanced {
        /// Value of the tick counter after the increment.
        tick: u64,
    },
    /// Confirms that a freshly created tower now occupies the selection slot.
    TowerSelected {
        /// Identifier allocated to the tower.
        tower: TowerId,
        /// Kind of the selected tower.
        kind: TowerKind,
    },
    /// Reports that an unplaced selection was overwritten and lost.
    SelectionDiscarded {
        /// Identifier of the tower that was dropped.
        tower: TowerId,
        /// Kind of the tower that was dropped.
        kind: TowerKind,
    },
    /// Confirms that the selected tower was placed onto a tile.
    TowerPlaced {
        /// Identifier of the placed tower.
        tower: TowerId,
        /// Kind of the placed tower.
        kind: TowerKind,
        /// Tile that now references the tower.
        tile: TileIndex,
        /// Pixel position assigned to the tower.
        position: PixelPosition,
    },
    /// Reports that a placement request was rejected without changing state.
    TowerPlacementRejected {
        /// Tile named by the placement request.
        tile: TileIndex,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower fired and a projectile joined the world.
    ProjectileSpawned {
        /// Identifier allocated to the projectile.
        projectile: ProjectileId,
        /// Kind of the spawned projectile.
        kind: ProjectileKind,
        /// Tower that fired the projectile.
        tower: TowerId,
        /// Position the projectile starts from.
        position: PixelPosition,
    },
    /// Confirms that a projectile advanced one step.
    ProjectileAdvanced {
        /// Identifier of the projectile that moved.
        projectile: ProjectileId,
        /// Position before the step.
        from: PixelPosition,
        /// Position after the step.
        to: PixelPosition,
    },
    /// Reports that a projectile left the play field and was removed.
    ProjectileDespawned {
        /// Identifier of the removed projectile.
        projectile: ProjectileId,
        /// Last position held by the projectile.
        position: PixelPosition,
    },
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the identifier that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Unique identifier assigned to a projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the projectile identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the identifier that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

/// Linear, row-major index of a tile within the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileIndex(u32);

impl TileIndex {
    /// Creates a tile index from its linear value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the linear value of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to a drawable owned by the rendering collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableHandle(u32);

impl DrawableHandle {
    /// Wraps a collaborator-assigned handle value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the collaborator-assigned handle value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location expressed in whole pixels. Either axis may be negative.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PixelPosition {
    /// Horizontal offset from the left edge of the play field.
    pub x: i64,
    /// Vertical offset from the top edge of the play field.
    pub y: i64,
}

impl PixelPosition {
    /// Top-left corner of the play field.
    pub const ORIGIN: Self = Self { x: 0, y: 0 };

    /// Creates a new pixel position.
    #[must_use]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the position shifted by the provided deltas.
    #[must_use]
    pub const fn offset(self, dx: i64, dy: i64) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

impl fmt::Display for PixelPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Validated dimensions of the play-field grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct GridDimensions {
    columns: u32,
    rows: u32,
    cell_size: u32,
}

impl GridDimensions {
    /// Creates grid dimensions, rejecting zero-sized axes and grids whose tile
    /// count cannot be addressed by a [`TileIndex`].
    pub fn new(columns: u32, rows: u32, cell_size: u32) -> Result<Self, DimensionError> {
        if columns == 0 {
            return Err(DimensionError::Zero { field: "columns" });
        }
        if rows == 0 {
            return Err(DimensionError::Zero { field: "rows" });
        }
        if cell_size == 0 {
            return Err(DimensionError::Zero { field: "cell_size" });
        }
        if columns.checked_mul(rows).is_none() {
            return Err(DimensionError::TooManyTiles { columns, rows });
        }

        Ok(Self {
            columns,
            rows,
            cell_size,
        })
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Pixel edge length of one cell.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Total number of tiles in the grid.
    #[must_use]
    pub const fn tile_count(&self) -> u32 {
        self.columns * self.rows
    }

    /// Width of the play field in pixels.
    #[must_use]
    pub fn width(&self) -> i64 {
        i64::from(self.columns) * i64::from(self.cell_size)
    }

    /// Height of the play field in pixels.
    #[must_use]
    pub fn height(&self) -> i64 {
        i64::from(self.rows) * i64::from(self.cell_size)
    }

    /// Pixel position of the tile at the provided index.
    ///
    /// Index `i` lives at `(cell_size * (i mod columns), cell_size * (i div columns))`.
    #[must_use]
    pub fn position_of(&self, index: TileIndex) -> Option<PixelPosition> {
        if index.get() >= self.tile_count() {
            return None;
        }

        let column = index.get() % self.columns;
        let row = index.get() / self.columns;
        let cell = i64::from(self.cell_size);
        Some(PixelPosition::new(
            cell * i64::from(column),
            cell * i64::from(row),
        ))
    }

    /// Index of the tile containing the provided pixel, if it lies on the field.
    #[must_use]
    pub fn index_at(&self, position: PixelPosition) -> Option<TileIndex> {
        if position.x < 0 || position.y < 0 {
            return None;
        }
        if position.x >= self.width() || position.y >= self.height() {
            return None;
        }

        let cell = i64::from(self.cell_size);
        let column = u32::try_from(position.x / cell).ok()?;
        let row = u32::try_from(position.y / cell).ok()?;
        Some(TileIndex::new(row * self.columns + column))
    }

    /// Reports whether a cell-sized footprint anchored at `position` overlaps
    /// the play field.
    #[must_use]
    pub fn overlaps_field(&self, position: PixelPosition) -> bool {
        let cell = i64::from(self.cell_size);
        position.x + cell > 0
            && position.x < self.width()
            && position.y + cell > 0
            && position.y < self.height()
    }
}

impl Default for GridDimensions {
    fn default() -> Self {
        Self {
            columns: DEFAULT_MAP_COLUMNS,
            rows: DEFAULT_MAP_ROWS,
            cell_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// Fixed tick interval at which a class of entities acts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cadence {
    period: u64,
}

impl Cadence {
    /// Default interval between tower volleys.
    pub const DEFAULT_FIRE: Self = Self { period: 50 };
    /// Default interval between projectile steps.
    pub const DEFAULT_MOVEMENT: Self = Self { period: 25 };

    /// Creates a cadence that is due every `period` ticks.
    pub const fn new(period: u64) -> Result<Self, CadenceError> {
        if period == 0 {
            return Err(CadenceError::Zero);
        }
        Ok(Self { period })
    }

    /// Number of ticks between two due ticks.
    #[must_use]
    pub const fn period(&self) -> u64 {
        self.period
    }

    /// Reports whether the cadence fires on the provided tick.
    #[must_use]
    pub const fn is_due(&self, tick: u64) -> bool {
        tick % self.period == 0
    }
}

/// Types of towers that can be selected and placed.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TowerKind {
    /// Tower that periodically launches grass projectiles.
    Grass,
    /// Tower that currently never fires.
    Fire,
}

impl TowerKind {
    /// Every tower kind in processing order.
    pub const ALL: [Self; 2] = [Self::Grass, Self::Fire];

    /// Lower-case name used by configuration and the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Fire => "fire",
        }
    }

    /// Projectile launched when a tower of this kind fires.
    ///
    /// `TowerKind::Fire` has no volley yet and therefore reports `None`.
    #[must_use]
    pub const fn projectile(self) -> Option<ProjectileKind> {
        match self {
            Self::Grass => Some(ProjectileKind::Grass),
            Self::Fire => None,
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TowerKind {
    type Err = UnknownTowerKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownTowerKind {
                name: trimmed.to_owned(),
            })
    }
}

/// Types of projectiles that towers may launch.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ProjectileKind {
    /// Leaf launched by grass towers; travels leftward.
    Grass,
}

impl ProjectileKind {
    /// Lower-case name of the projectile kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Grass => "grass",
        }
    }

    /// Displacement applied per step, measured in whole cells.
    #[must_use]
    pub const fn velocity_in_cells(self) -> (i64, i64) {
        match self {
            Self::Grass => (-1, 0),
        }
    }

    /// Asset displayed for projectiles of this kind.
    #[must_use]
    pub fn asset_key(self) -> AssetKey {
        AssetKey::sprite(self.name())
    }
}

/// Visual style of the tiles composing the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TileKind {
    /// Plain background tile.
    #[default]
    Background,
}

impl TileKind {
    /// Asset displayed for tiles of this kind.
    #[must_use]
    pub fn asset_key(self) -> AssetKey {
        match self {
            Self::Background => AssetKey::sprite("background"),
        }
    }
}

/// Visual identity of a tower; only selects which sprite is shown.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Monster(String);

impl Monster {
    /// Creates a monster identifier from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the monster.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Asset displayed for towers wearing this monster.
    #[must_use]
    pub fn asset_key(&self) -> AssetKey {
        AssetKey::sprite(&self.0)
    }
}

impl fmt::Display for Monster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Logical path of a visual asset understood by the rendering collaborator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetKey(String);

impl AssetKey {
    /// Wraps an arbitrary asset path.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Asset key of the sprite image named `name`.
    #[must_use]
    pub fn sprite(name: &str) -> Self {
        Self(format!("img/{name}.png"))
    }

    /// Asset path as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rendering collaborator the simulation calls into.
///
/// Implementations own every drawable; the simulation only keeps the handles
/// they return. All calls happen on the thread driving the simulation.
pub trait SceneContext {
    /// Produces a positionable, initially detached drawable for `asset`.
    fn create_drawable(&mut self, asset: &AssetKey) -> DrawableHandle;

    /// Moves a drawable to the provided pixel position.
    fn set_position(&mut self, handle: DrawableHandle, position: PixelPosition);

    /// Adds a drawable to the visible scene.
    fn attach(&mut self, handle: DrawableHandle);

    /// Removes a drawable from the visible scene.
    fn detach(&mut self, handle: DrawableHandle);

    /// Releases a drawable that will never be shown again, detaching it
    /// first if needed. The handle is invalid afterwards.
    fn destroy(&mut self, handle: DrawableHandle);

    /// Asks the collaborator to present a new frame.
    fn request_redraw(&mut self);
}

/// Reasons a tower placement request may be rejected.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error,
)]
pub enum PlacementError {
    /// Placement was attempted while the selection slot was empty.
    #[error("no tower is selected")]
    NoTowerSelected,
    /// The tile already references a tower.
    #[error("tile {tile} is already occupied")]
    TileOccupied {
        /// Tile that rejected the placement.
        tile: TileIndex,
    },
    /// The tile index does not exist in the grid.
    #[error("tile {tile} lies outside the grid")]
    TileOutOfBounds {
        /// Index named by the request.
        tile: TileIndex,
    },
}

/// A tower kind name that does not match any known kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[error("unknown tower kind `{name}` (expected `grass` or `fire`)")]
pub struct UnknownTowerKind {
    /// Name that failed to parse.
    pub name: String,
}

/// Reasons grid dimensions may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DimensionError {
    /// One of the axes or the cell size was zero.
    #[error("grid {field} must be positive")]
    Zero {
        /// Name of the offending field.
        field: &'static str,
    },
    /// The grid holds more tiles than a [`TileIndex`] can address.
    #[error("a {columns}x{rows} grid has too many tiles")]
    TooManyTiles {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
}

/// Reasons a cadence may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, thiserror::Error)]
pub enum CadenceError {
    /// A period of zero ticks would never be due.
    #[error("cadence period must be at least one tick")]
    Zero,
}

/// Umbrella error for every recoverable failure the engine reports.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// A placement request was rejected.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// A tower kind name was not recognised.
    #[error(transparent)]
    UnknownTowerKind(#[from] UnknownTowerKind),
    /// Grid dimensions were invalid.
    #[error(transparent)]
    Dimension(#[from] DimensionError),
    /// A cadence was invalid.
    #[error(transparent)]
    Cadence(#[from] CadenceError),
}
