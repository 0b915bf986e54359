//! Projectile entities launched by towers.

use monster_defence_core::{
    DrawableHandle, PixelPosition, ProjectileId, ProjectileKind, SceneContext, TowerId,
};

/// A moving entity spawned by a tower.
#[derive(Debug)]
pub struct Projectile {
    id: ProjectileId,
    kind: ProjectileKind,
    tower: TowerId,
    position: PixelPosition,
    drawable: DrawableHandle,
}

impl Projectile {
    pub(crate) fn new<S>(
        id: ProjectileId,
        kind: ProjectileKind,
        tower: TowerId,
        position: PixelPosition,
        scene: &mut S,
    ) -> Self
    where
        S: SceneContext + ?Sized,
    {
        let drawable = scene.create_drawable(&kind.asset_key());
        scene.set_position(drawable, position);
        Self {
            id,
            kind,
            tower,
            position,
            drawable,
        }
    }

    /// Identifier allocated by the game state.
    #[must_use]
    pub const fn id(&self) -> ProjectileId {
        self.id
    }

    /// Kind of the projectile.
    #[must_use]
    pub const fn kind(&self) -> ProjectileKind {
        self.kind
    }

    /// Tower that launched the projectile.
    #[must_use]
    pub const fn tower(&self) -> TowerId {
        self.tower
    }

    /// Current pixel position.
    #[must_use]
    pub const fn position(&self) -> PixelPosition {
        self.position
    }

    /// Handle of the projectile's drawable.
    #[must_use]
    pub const fn drawable(&self) -> DrawableHandle {
        self.drawable
    }

    /// Moves the projectile one step along its kind's velocity and returns the
    /// new position. No bounds are enforced here.
    pub fn advance(&mut self, cell_size: u32) -> PixelPosition {
        let (dx, dy) = self.kind.velocity_in_cells();
        let cell = i64::from(cell_size);
        self.position = self.position.offset(dx * cell, dy * cell);
        self.position
    }
}
