//! Spatial hash grid over world structures.
//!
//! The grid is the only shared mutable index in the simulation and follows
//! a strict dirty/rebuild discipline: any structure add or remove calls
//! [`SpatialGrid::invalidate`], and the engine rebuilds before the next
//! query. Querying a stale grid is a correctness bug, not a slowdown, so
//! debug builds assert on it.

use hecs::{Entity, World};
use std::collections::HashMap;
use tankwave_logic::constants::world::GRID_CELL_SIZE;
use tankwave_logic::geometry::{Rect, Vec2};

use crate::components::Structure;

#[derive(Debug, Clone, Copy)]
pub struct GridEntry {
    pub entity: Entity,
    pub rect: Rect,
}

#[derive(Debug, Default)]
pub struct SpatialGrid {
    cells: HashMap<(i32, i32), Vec<usize>>,
    entries: Vec<GridEntry>,
    dirty: bool,
}

impl SpatialGrid {
    pub fn new() -> Self {
        Self {
            cells: HashMap::new(),
            entries: Vec::new(),
            dirty: true,
        }
    }

    /// Mark the grid stale. Must be called after any structure mutation.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    fn cell_of(x: f32, y: f32) -> (i32, i32) {
        (
            (x / GRID_CELL_SIZE).floor() as i32,
            (y / GRID_CELL_SIZE).floor() as i32,
        )
    }

    /// Rebuild from the world's structure list if stale.
    pub fn ensure_built(&mut self, world: &World) {
        if !self.dirty {
            return;
        }
        self.cells.clear();
        self.entries.clear();
        for (entity, structure) in world.query::<&Structure>().iter() {
            let idx = self.entries.len();
            self.entries.push(GridEntry {
                entity,
                rect: structure.rect,
            });
            let r = structure.rect;
            let (cx0, cy0) = Self::cell_of(r.x, r.y);
            let (cx1, cy1) = Self::cell_of(r.x + r.w, r.y + r.h);
            for cx in cx0..=cx1 {
                for cy in cy0..=cy1 {
                    self.cells.entry((cx, cy)).or_default().push(idx);
                }
            }
        }
        self.dirty = false;
    }

    fn candidates_for_rect(&self, rect: Rect) -> Vec<usize> {
        debug_assert!(!self.dirty, "spatial grid queried while stale");
        let (cx0, cy0) = Self::cell_of(rect.x, rect.y);
        let (cx1, cy1) = Self::cell_of(rect.x + rect.w, rect.y + rect.h);
        let mut seen = Vec::new();
        for cx in cx0..=cx1 {
            for cy in cy0..=cy1 {
                if let Some(bucket) = self.cells.get(&(cx, cy)) {
                    for &idx in bucket {
                        if !seen.contains(&idx) {
                            seen.push(idx);
                        }
                    }
                }
            }
        }
        seen
    }

    /// Structures whose rects intersect `rect`.
    pub fn query_rect(&self, rect: Rect) -> Vec<GridEntry> {
        self.candidates_for_rect(rect)
            .into_iter()
            .map(|i| self.entries[i])
            .filter(|e| e.rect.intersects(&rect))
            .collect()
    }

    /// Structures touching a circle.
    pub fn query_circle(&self, center: Vec2, radius: f32) -> Vec<GridEntry> {
        let bounds = Rect::new(
            center.x - radius,
            center.y - radius,
            radius * 2.0,
            radius * 2.0,
        );
        self.candidates_for_rect(bounds)
            .into_iter()
            .map(|i| self.entries[i])
            .filter(|e| e.rect.overlaps_circle(center, radius))
            .collect()
    }

    /// Nearest structure hit along the segment a->b, by entry parameter.
    pub fn segment_hit(&self, a: Vec2, b: Vec2) -> Option<(GridEntry, f32)> {
        let bounds = Rect::new(
            a.x.min(b.x),
            a.y.min(b.y),
            (a.x - b.x).abs(),
            (a.y - b.y).abs(),
        );
        let mut best: Option<(GridEntry, f32)> = None;
        for idx in self.candidates_for_rect(bounds) {
            let entry = self.entries[idx];
            if let Some(t) = entry.rect.segment_entry(a, b) {
                match best {
                    Some((_, bt)) if bt <= t => {}
                    _ => best = Some((entry, t)),
                }
            }
        }
        best
    }

    /// True if no structure blocks the segment a->b.
    pub fn line_of_sight(&self, a: Vec2, b: Vec2) -> bool {
        self.segment_hit(a, b).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Health, Structure};

    fn world_with_wall(rect: Rect) -> World {
        let mut world = World::new();
        world.spawn((
            Structure::wall(rect, false, 1),
            Health::full(tankwave_logic::constants::world::WALL_HP),
        ));
        world
    }

    #[test]
    fn rebuild_clears_dirty() {
        let world = world_with_wall(Rect::new(100.0, 100.0, 200.0, 40.0));
        let mut grid = SpatialGrid::new();
        assert!(grid.is_dirty());
        grid.ensure_built(&world);
        assert!(!grid.is_dirty());
    }

    #[test]
    fn los_blocked_by_wall() {
        let world = world_with_wall(Rect::new(100.0, -20.0, 40.0, 40.0));
        let mut grid = SpatialGrid::new();
        grid.ensure_built(&world);
        assert!(!grid.line_of_sight(Vec2::ZERO, Vec2::new(300.0, 0.0)));
        assert!(grid.line_of_sight(Vec2::ZERO, Vec2::new(0.0, 300.0)));
    }

    #[test]
    fn segment_hit_returns_nearest() {
        let mut world = world_with_wall(Rect::new(100.0, -20.0, 40.0, 40.0));
        world.spawn((
            Structure::wall(Rect::new(200.0, -20.0, 40.0, 40.0), false, 2),
            Health::full(tankwave_logic::constants::world::WALL_HP),
        ));
        let mut grid = SpatialGrid::new();
        grid.ensure_built(&world);
        let (entry, t) = grid
            .segment_hit(Vec2::ZERO, Vec2::new(400.0, 0.0))
            .expect("hit");
        assert!(entry.rect.x < 150.0);
        assert!(t < 0.5);
    }

    #[test]
    fn invalidate_then_rebuild_sees_changes() {
        let mut world = world_with_wall(Rect::new(100.0, 100.0, 40.0, 40.0));
        let mut grid = SpatialGrid::new();
        grid.ensure_built(&world);
        assert_eq!(grid.query_rect(Rect::new(90.0, 90.0, 60.0, 60.0)).len(), 1);

        // Remove the wall; grid must be invalidated to notice.
        let entity = world
            .query::<&Structure>()
            .iter()
            .map(|(e, _)| e)
            .next()
            .unwrap();
        world.despawn(entity).unwrap();
        grid.invalidate();
        grid.ensure_built(&world);
        assert!(grid.query_rect(Rect::new(90.0, 90.0, 60.0, 60.0)).is_empty());
    }
}
