//! Components shared across entity kinds.

use serde::{Deserialize, Serialize};
use tankwave_logic::geometry::Vec2;

/// World-space position.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }
}

/// Per-second velocity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Velocity(pub Vec2);

/// Hit points with a fixed maximum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Health {
    pub hp: f32,
    pub max_hp: f32,
}

impl Health {
    pub fn full(max_hp: f32) -> Self {
        Self { hp: max_hp, max_hp }
    }

    pub fn ratio(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Apply damage, clamping at zero. Returns true if this killed.
    pub fn damage(&mut self, amount: f32) -> bool {
        let was_alive = !self.is_dead();
        self.hp = (self.hp - amount).max(0.0);
        was_alive && self.is_dead()
    }

    pub fn heal(&mut self, amount: f32) {
        self.hp = (self.hp + amount).min(self.max_hp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_kills_exactly_once() {
        let mut h = Health::full(10.0);
        assert!(!h.damage(5.0));
        assert!(h.damage(20.0));
        assert!(!h.damage(5.0)); // already dead
        assert_eq!(h.hp, 0.0);
    }

    #[test]
    fn heal_caps_at_max() {
        let mut h = Health::full(10.0);
        h.damage(6.0);
        h.heal(100.0);
        assert_eq!(h.hp, 10.0);
        assert_eq!(h.ratio(), 1.0);
    }
}
