//! Bullet and pickup components.

use serde::{Deserialize, Serialize};
use tankwave_logic::geometry::Vec2;
use tankwave_logic::waves::ItemKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Owner {
    Player,
    Enemy,
    Boss,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BulletKind {
    #[default]
    Normal,
    Pierce,
    Aoe,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Element {
    #[default]
    Kinetic,
    Fire,
    Cryo,
    Shock,
}

/// A live projectile. `prev_pos` trails one tick behind for swept collision
/// so fast bullets cannot tunnel through thin structures.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bullet {
    pub vel: Vec2,
    pub prev_pos: Vec2,
    /// Seconds until expiry.
    pub life: f32,
    pub damage: f32,
    pub owner: Owner,
    pub kind: BulletKind,
    pub element: Element,
    /// Entities a pierce round may still pass through.
    pub pierce_remaining: u8,
}

impl Bullet {
    pub fn new(pos: Vec2, vel: Vec2, damage: f32, life: f32, owner: Owner) -> Self {
        Self {
            vel,
            prev_pos: pos,
            life,
            damage,
            owner,
            kind: BulletKind::Normal,
            element: Element::Kinetic,
            pierce_remaining: 0,
        }
    }

    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self
    }

    pub fn with_kind(mut self, kind: BulletKind, pierce: u8) -> Self {
        self.kind = kind;
        self.pierce_remaining = pierce;
        self
    }
}

/// A dropped item waiting on the ground.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pickup {
    pub item: ItemKind,
    /// Seconds until it disappears.
    pub life: f32,
    /// Phase of the idle bobbing animation; render-only but persisted so a
    /// loaded game does not visibly snap.
    pub float_phase: f32,
}

impl Pickup {
    pub fn new(item: ItemKind) -> Self {
        Self {
            item,
            life: tankwave_logic::constants::pickups::LIFETIME,
            float_phase: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_builder_sets_fields() {
        let b = Bullet::new(Vec2::ZERO, Vec2::new(100.0, 0.0), 5.0, 1.0, Owner::Player)
            .with_element(Element::Fire)
            .with_kind(BulletKind::Pierce, 2);
        assert_eq!(b.element, Element::Fire);
        assert_eq!(b.pierce_remaining, 2);
        assert_eq!(b.prev_pos, Vec2::ZERO);
    }
}
