//! Tower entities and their firing contract.

use monster_defence_core::{
    DrawableHandle, Monster, PixelPosition, ProjectileId, SceneContext, TowerId, TowerKind,
};

use crate::projectiles::Projectile;

/// A placeable tower. Lives in the selection slot until placed, then in the
/// game state's per-kind bucket.
#[derive(Debug)]
pub struct Tower {
    id: TowerId,
    kind: TowerKind,
    monster: Monster,
    position: PixelPosition,
    drawable: DrawableHandle,
}

impl Tower {
    /// Creates a tower together with its (detached) drawable.
    pub(crate) fn new<S>(id: TowerId, kind: TowerKind, monster: Monster, scene: &mut S) -> Self
    where
        S: SceneContext + ?Sized,
    {
        let drawable = scene.create_drawable(&monster.asset_key());
        Self {
            id,
            kind,
            monster,
            position: PixelPosition::ORIGIN,
            drawable,
        }
    }

    /// Identifier allocated by the game state.
    #[must_use]
    pub const fn id(&self) -> TowerId {
        self.id
    }

    /// Kind of the tower.
    #[must_use]
    pub const fn kind(&self) -> TowerKind {
        self.kind
    }

    /// Monster shown for the tower.
    #[must_use]
    pub fn monster(&self) -> &Monster {
        &self.monster
    }

    /// Current pixel position; the origin until the tower is placed.
    #[must_use]
    pub const fn position(&self) -> PixelPosition {
        self.position
    }

    /// Handle of the tower's drawable.
    #[must_use]
    pub const fn drawable(&self) -> DrawableHandle {
        self.drawable
    }

    /// Fires one volley, returning the spawned projectile.
    ///
    /// Towers whose kind has no projectile (currently `TowerKind::Fire`)
    /// return `None` and leave the scene untouched.
    pub(crate) fn fire<S>(&self, id: ProjectileId, scene: &mut S) -> Option<Projectile>
    where
        S: SceneContext + ?Sized,
    {
        let kind = self.kind.projectile()?;
        Some(Projectile::new(id, kind, self.id, self.position, scene))
    }

    pub(crate) fn place_at<S>(&mut self, position: PixelPosition, scene: &mut S)
    where
        S: SceneContext + ?Sized,
    {
        self.position = position;
        scene.set_position(self.drawable, position);
        scene.attach(self.drawable);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monster_defence_core::ProjectileKind;
    use monster_defence_rendering::HeadlessScene;

    #[test]
    fn new_tower_registers_a_detached_drawable() {
        let mut scene = HeadlessScene::new();
        let tower = Tower::new(
            TowerId::new(3),
            TowerKind::Grass,
            Monster::new("bulbasaur"),
            &mut scene,
        );

        let drawable = scene.drawable(tower.drawable()).expect("drawable created");
        assert_eq!(drawable.asset.as_str(), "img/bulbasaur.png");
        assert!(!drawable.attached);
        assert_eq!(tower.position(), PixelPosition::ORIGIN);
    }

    #[test]
    fn grass_tower_fires_from_its_position() {
        let mut scene = HeadlessScene::new();
        let mut tower = Tower::new(
            TowerId::new(1),
            TowerKind::Grass,
            Monster::new("bulbasaur"),
            &mut scene,
        );
        tower.place_at(PixelPosition::new(48, 32), &mut scene);

        let projectile = tower
            .fire(ProjectileId::new(9), &mut scene)
            .expect("grass towers fire");

        assert_eq!(projectile.id(), ProjectileId::new(9));
        assert_eq!(projectile.kind(), ProjectileKind::Grass);
        assert_eq!(projectile.tower(), TowerId::new(1));
        assert_eq!(projectile.position(), PixelPosition::new(48, 32));
    }

    #[test]
    fn fire_tower_volley_is_empty() {
        let mut scene = HeadlessScene::new();
        let tower = Tower::new(
            TowerId::new(2),
            TowerKind::Fire,
            Monster::new("charmander"),
            &mut scene,
        );
        let drawables_before = scene.drawable_count();

        assert!(tower.fire(ProjectileId::new(0), &mut scene).is_none());
        assert_eq!(scene.drawable_count(), drawables_before);
    }
}
