//! Static world structures.

use serde::{Deserialize, Serialize};
use tankwave_logic::constants::world;
use tankwave_logic::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StructureKind {
    Wall,
    Crate,
}

/// A wall or crate. Crates are always destructible; walls only when
/// flagged. `crack_seed` drives deterministic damage-crack rendering and
/// must survive save/load even though it never affects gameplay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Structure {
    pub kind: StructureKind,
    pub rect: Rect,
    pub destructible: bool,
    pub crack_seed: u32,
}

impl Structure {
    pub fn wall(rect: Rect, destructible: bool, crack_seed: u32) -> Self {
        Self {
            kind: StructureKind::Wall,
            rect,
            destructible,
            crack_seed,
        }
    }

    pub fn crate_box(rect: Rect, crack_seed: u32) -> Self {
        Self {
            kind: StructureKind::Crate,
            rect,
            destructible: true,
            crack_seed,
        }
    }

    pub fn max_hp(&self) -> f32 {
        match self.kind {
            StructureKind::Wall => world::WALL_HP,
            StructureKind::Crate => world::CRATE_HP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crates_are_always_destructible() {
        let c = Structure::crate_box(Rect::new(0.0, 0.0, 60.0, 60.0), 7);
        assert!(c.destructible);
        assert_eq!(c.kind, StructureKind::Crate);
        let w = Structure::wall(Rect::new(0.0, 0.0, 200.0, 40.0), false, 3);
        assert!(!w.destructible);
    }
}
