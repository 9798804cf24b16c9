//! Per-tick steering math for enemy tanks.
//!
//! Everything here is pure: callers pass position snapshots and pre-rolled
//! random values, and get velocity adjustments or waypoints back. The engine
//! crate owns the state machine; this module owns the vectors it blends.

use crate::constants::ai::*;
use crate::geometry::{angle_diff, Rect, Vec2};

/// A bullet the steering code may want to dodge.
#[derive(Debug, Clone, Copy)]
pub struct BulletThreat {
    pub pos: Vec2,
    pub vel: Vec2,
}

/// Pairwise separation force from nearby enemies.
///
/// Soft push inside `ENEMY_SOFT_SEPARATION`, hard push inside
/// `ENEMY_HARD_SEPARATION`, and an additional `ENEMY_REPULSION_STRENGTH`
/// gain inside `ENEMY_MIN_DISTANCE` so overlapping enemies always receive a
/// mutually repulsive adjustment. `fallback_angle` breaks the tie when two
/// enemies occupy the exact same point (callers derive it per enemy).
pub fn separation(me: Vec2, neighbors: &[Vec2], fallback_angle: f32) -> Vec2 {
    let mut force = Vec2::ZERO;
    for &other in neighbors {
        let delta = me - other;
        let dist = delta.length();
        if dist >= ENEMY_SOFT_SEPARATION {
            continue;
        }
        let away = if dist > 1e-4 {
            delta * (1.0 / dist)
        } else {
            Vec2::from_angle(fallback_angle)
        };
        let mut strength = if dist < ENEMY_HARD_SEPARATION {
            // Hard band: ramp from 1.0 at the soft edge of the band to 2.0
            // at contact.
            1.0 + (ENEMY_HARD_SEPARATION - dist) / ENEMY_HARD_SEPARATION
        } else {
            (ENEMY_SOFT_SEPARATION - dist) / (ENEMY_SOFT_SEPARATION - ENEMY_HARD_SEPARATION)
        };
        if dist < ENEMY_MIN_DISTANCE {
            strength *= ENEMY_REPULSION_STRENGTH;
        }
        force += away * strength;
    }
    force
}

/// Tangential strafe component layered onto direct pursuit.
///
/// `arc_dir` is +1/-1 (the enemy's persistent orbit direction) and
/// `variance` is the enemy's rolled arc variance in [-1, 1].
pub fn arc_strafe(to_player: Vec2, arc_dir: f32, variance: f32) -> Vec2 {
    let tangent = to_player.normalize().perp();
    tangent * arc_dir * (ENEMY_ARC_STRAFE_WEIGHT + variance * ENEMY_ARC_VARIANCE)
}

/// Radial gain along the direction to the player that holds the standoff
/// band: positive approaches, negative backs off.
pub fn standoff_gain(dist: f32) -> f32 {
    if dist > ENEMY_STANDOFF_RADIUS {
        ((dist - ENEMY_STANDOFF_RADIUS) / ENEMY_STANDOFF_RADIUS).min(1.0)
    } else if dist < MIN_ATTACK_SPACING {
        -1.0
    } else {
        // Inside the band: ease back the closer we are to minimum spacing.
        -(ENEMY_STANDOFF_RADIUS - dist) / (ENEMY_STANDOFF_RADIUS - MIN_ATTACK_SPACING)
    }
}

/// Lateral dodge away from the most urgent incoming bullet, if any bullet
/// within `BULLET_DODGE_RADIUS` is on a near-collision course.
pub fn dodge_vector(me: Vec2, bullets: &[BulletThreat]) -> Option<Vec2> {
    let mut best: Option<(f32, Vec2)> = None;
    for threat in bullets {
        let to_me = me - threat.pos;
        let dist = to_me.length();
        if dist > BULLET_DODGE_RADIUS || threat.vel.length_squared() < 1e-6 {
            continue;
        }
        let course_error = angle_diff(threat.vel.angle(), to_me.angle()).abs();
        if course_error > BULLET_DODGE_ANGLE {
            continue;
        }
        // Step off the bullet's line, on whichever side we already lean.
        let lateral = threat.vel.normalize().perp();
        let side = if lateral.dot(to_me) >= 0.0 { 1.0 } else { -1.0 };
        let urgency = 1.0 - dist / BULLET_DODGE_RADIUS;
        match best {
            Some((u, _)) if u >= urgency => {}
            _ => best = Some((urgency, lateral * side * (1.0 + urgency))),
        }
    }
    best.map(|(_, v)| v)
}

/// Waypoint to the side of a blocked direction. `side` is +1/-1 and
/// `variance_roll` is in [-1, 1].
pub fn detour_waypoint(pos: Vec2, blocked_dir: Vec2, side: f32, variance_roll: f32) -> Vec2 {
    let lateral = blocked_dir.normalize().perp() * side;
    let dist = ENEMY_DETOUR_DISTANCE + variance_roll * ENEMY_DETOUR_VARIANCE;
    pos + lateral * dist + blocked_dir.normalize() * (dist * 0.25)
}

/// True once the retreat distance band has been reached.
pub fn retreat_satisfied(dist_to_player: f32) -> bool {
    (ENEMY_RETREAT_MIN_DISTANCE..=ENEMY_RETREAT_MAX_DISTANCE).contains(&dist_to_player)
}

/// Pick a retreat target: behind the best cover rect if one exists,
/// otherwise straight away from the player into the retreat band.
///
/// Covers are scored by how well they sit between a retreat position and
/// the player, preferring nearer crates. The returned point stands
/// `ENEMY_COVER_BUFFER` behind the cover on the player-cover axis.
pub fn retreat_target(me: Vec2, player: Vec2, covers: &[Rect]) -> Vec2 {
    let away = (me - player).normalize();
    let fallback = player
        + if away == Vec2::ZERO {
            Vec2::new(ENEMY_RETREAT_MIN_DISTANCE, 0.0)
        } else {
            away * ((ENEMY_RETREAT_MIN_DISTANCE + ENEMY_RETREAT_MAX_DISTANCE) * 0.5)
        };

    let mut best: Option<(f32, Vec2)> = None;
    for cover in covers {
        let center = cover.center();
        let from_player = (center - player).normalize();
        if from_player == Vec2::ZERO {
            continue;
        }
        let hide = center + from_player * (cover.w.max(cover.h) * 0.5 + ENEMY_COVER_BUFFER);
        let dist_to_player = hide.distance(player);
        if dist_to_player < ENEMY_RETREAT_MIN_DISTANCE * 0.5 {
            continue;
        }
        // Near covers that put us outside the player's reach score best.
        let score = hide.distance(me) + (dist_to_player - ENEMY_RETREAT_MAX_DISTANCE).abs() * 0.5;
        match best {
            Some((s, _)) if s <= score => {}
            _ => best = Some((score, hide)),
        }
    }
    best.map(|(_, p)| p).unwrap_or(fallback)
}

/// Follower decision to break a single-file pursuit queue.
pub fn queue_break(lead_dist_to_player: f32, ticks_waiting: u32) -> bool {
    lead_dist_to_player > ENEMY_QUEUE_DISTANCE_BREAK && ticks_waiting >= ENEMY_QUEUE_BREAK_TIME
}

/// Formation anchor for an enemy without an attack slot. `rank` is its
/// position in the overflow order; six hold points per ring.
pub fn formation_anchor(player: Vec2, rank: usize) -> Vec2 {
    let ring = rank / 6;
    let slot = rank % 6;
    let radius = ENEMY_STANDOFF_RADIUS + ENEMY_FORMATION_RADIUS_STEP * (ring as f32 + 1.0);
    let angle = slot as f32 * (std::f32::consts::PI * 2.0 / 6.0);
    player + Vec2::from_angle(angle) * radius
}

/// Blend pursuit, strafe, and separation into a final desired velocity of
/// at most `speed`.
pub fn blend_attack(
    pursuit: Vec2,
    strafe: Vec2,
    separation_force: Vec2,
    speed: f32,
) -> Vec2 {
    let combined = pursuit + strafe + separation_force * ENEMY_SEPARATION_WEIGHT;
    if combined.length_squared() < 1e-6 {
        return Vec2::ZERO;
    }
    combined.normalize() * speed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlapping_enemies_repel_mutually() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(ENEMY_MIN_DISTANCE * 0.5, 0.0);
        let fa = separation(a, &[b], 0.0);
        let fb = separation(b, &[a], 1.0);
        // Pushed apart along the x axis, opposite signs.
        assert!(fa.x < 0.0);
        assert!(fb.x > 0.0);
    }

    #[test]
    fn coincident_enemies_still_separate() {
        let p = Vec2::new(10.0, 10.0);
        let fa = separation(p, &[p], 0.0);
        let fb = separation(p, &[p], std::f32::consts::PI);
        assert!(fa.length() > 0.0);
        assert!(fb.length() > 0.0);
        assert!(fa.dot(fb) < 0.0);
    }

    #[test]
    fn separation_ignores_distant_neighbors() {
        let f = separation(
            Vec2::ZERO,
            &[Vec2::new(ENEMY_SOFT_SEPARATION + 1.0, 0.0)],
            0.0,
        );
        assert_eq!(f, Vec2::ZERO);
    }

    #[test]
    fn standoff_gain_holds_the_band() {
        assert!(standoff_gain(ENEMY_STANDOFF_RADIUS * 2.0) > 0.0);
        assert!(standoff_gain(MIN_ATTACK_SPACING * 0.5) < 0.0);
        assert!(standoff_gain(ENEMY_STANDOFF_RADIUS).abs() < 1e-6);
    }

    #[test]
    fn dodges_bullet_on_collision_course() {
        let me = Vec2::new(100.0, 0.0);
        let threat = BulletThreat {
            pos: Vec2::ZERO,
            vel: Vec2::new(400.0, 0.0),
        };
        let dodge = dodge_vector(me, &[threat]).expect("should dodge");
        // Dodge is lateral to the bullet path.
        assert!(dodge.x.abs() < 1e-4);
        assert!(dodge.y.abs() > 0.0);
    }

    #[test]
    fn ignores_bullet_heading_away() {
        let me = Vec2::new(100.0, 0.0);
        let threat = BulletThreat {
            pos: Vec2::ZERO,
            vel: Vec2::new(-400.0, 0.0),
        };
        assert!(dodge_vector(me, &[threat]).is_none());
    }

    #[test]
    fn detour_is_lateral() {
        let pos = Vec2::ZERO;
        let wp = detour_waypoint(pos, Vec2::new(1.0, 0.0), 1.0, 0.0);
        assert!(wp.y.abs() > ENEMY_DETOUR_DISTANCE * 0.9);
    }

    #[test]
    fn retreat_target_without_cover_moves_away() {
        let me = Vec2::new(100.0, 0.0);
        let player = Vec2::ZERO;
        let target = retreat_target(me, player, &[]);
        assert!(target.x > me.x);
        assert!(target.distance(player) >= ENEMY_RETREAT_MIN_DISTANCE);
    }

    #[test]
    fn retreat_prefers_cover_behind_crate() {
        let me = Vec2::new(200.0, 0.0);
        let player = Vec2::ZERO;
        let crate_rect = Rect::new(580.0, -30.0, 60.0, 60.0);
        let target = retreat_target(me, player, &[crate_rect]);
        // Hide point is on the far side of the crate from the player.
        assert!(target.x > crate_rect.x + crate_rect.w);
    }

    #[test]
    fn queue_break_needs_both_conditions() {
        assert!(!queue_break(ENEMY_QUEUE_DISTANCE_BREAK + 1.0, 0));
        assert!(!queue_break(0.0, ENEMY_QUEUE_BREAK_TIME));
        assert!(queue_break(
            ENEMY_QUEUE_DISTANCE_BREAK + 1.0,
            ENEMY_QUEUE_BREAK_TIME
        ));
    }

    #[test]
    fn formation_rings_step_outward() {
        let player = Vec2::ZERO;
        let inner = formation_anchor(player, 0).distance(player);
        let outer = formation_anchor(player, 6).distance(player);
        assert!((outer - inner - ENEMY_FORMATION_RADIUS_STEP).abs() < 1e-3);
    }
}
