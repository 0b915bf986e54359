//! Play-field grid and the tiles that accept tower placement.

use monster_defence_core::{
    DrawableHandle, Event, GridDimensions, PixelPosition, PlacementError, SceneContext,
    TileIndex, TileKind, TowerId,
};

use crate::game::GameState;

/// Single grid cell. Holds a non-owning reference to the tower placed on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tile {
    index: TileIndex,
    position: PixelPosition,
    occupant: Option<TowerId>,
    drawable: DrawableHandle,
}

impl Tile {
    /// Linear index of the tile.
    #[must_use]
    pub const fn index(&self) -> TileIndex {
        self.index
    }

    /// Pixel position of the tile's top-left corner.
    #[must_use]
    pub const fn position(&self) -> PixelPosition {
        self.position
    }

    /// Tower placed on the tile, if any.
    #[must_use]
    pub const fn occupant(&self) -> Option<TowerId> {
        self.occupant
    }

    /// Reports whether a tower was placed on the tile.
    #[must_use]
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Handle of the tile's drawable.
    #[must_use]
    pub const fn drawable(&self) -> DrawableHandle {
        self.drawable
    }

    /// Handles a pointer-down on the tile by placing the selected tower here.
    pub fn on_pointer_down<S>(
        &mut self,
        game: &mut GameState,
        scene: &mut S,
        out_events: &mut Vec<Event>,
    ) -> Result<TowerId, PlacementError>
    where
        S: SceneContext + ?Sized,
    {
        game.place_tower(self, scene, out_events)
    }

    pub(crate) fn occupy(&mut self, tower: TowerId) {
        self.occupant = Some(tower);
    }
}

/// Rectangular arrangement of tiles covering the play field.
#[derive(Clone, Debug)]
pub struct Grid {
    dimensions: GridDimensions,
    tile_kind: TileKind,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Lays out one tile per cell in row-major order and registers each tile's
    /// drawable with the scene.
    pub fn layout<S>(tile_kind: TileKind, dimensions: GridDimensions, scene: &mut S) -> Self
    where
        S: SceneContext + ?Sized,
    {
        let asset = tile_kind.asset_key();
        let cell = i64::from(dimensions.cell_size());
        let mut tiles = Vec::new();

        for row in 0..dimensions.rows() {
            for column in 0..dimensions.columns() {
                let index = TileIndex::new(row * dimensions.columns() + column);
                let position = PixelPosition::new(cell * i64::from(column), cell * i64::from(row));
                let drawable = scene.create_drawable(&asset);
                scene.set_position(drawable, position);
                scene.attach(drawable);
                tiles.push(Tile {
                    index,
                    position,
                    occupant: None,
                    drawable,
                });
            }
        }

        tracing::debug!(
            columns = dimensions.columns(),
            rows = dimensions.rows(),
            cell_size = dimensions.cell_size(),
            "grid laid out"
        );

        Self {
            dimensions,
            tile_kind,
            tiles,
        }
    }

    /// Dimensions the grid was laid out with.
    #[must_use]
    pub const fn dimensions(&self) -> GridDimensions {
        self.dimensions
    }

    /// Visual style shared by every tile.
    #[must_use]
    pub const fn tile_kind(&self) -> TileKind {
        self.tile_kind
    }

    /// All tiles in row-major order.
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// Tile at the provided index.
    #[must_use]
    pub fn tile(&self, index: TileIndex) -> Option<&Tile> {
        let index = usize::try_from(index.get()).ok()?;
        self.tiles.get(index)
    }

    /// Mutable access to the tile at the provided index, for input dispatch.
    pub fn tile_mut(&mut self, index: TileIndex) -> Option<&mut Tile> {
        let index = usize::try_from(index.get()).ok()?;
        self.tiles.get_mut(index)
    }

    /// Tile containing the provided pixel.
    #[must_use]
    pub fn tile_at(&self, position: PixelPosition) -> Option<&Tile> {
        self.dimensions
            .index_at(position)
            .and_then(|index| self.tile(index))
    }
}
