//! Enemy AI controller: per-enemy steering and the behavior state machine.
//!
//! One pass per tick. The system first snapshots everything the decisions
//! need (enemy positions, player bullets, crate covers, attack-slot
//! ranking), then walks every enemy once, mutating its state, velocity,
//! facing, and fire intent. Bullets for this tick's shots are spawned at
//! the end, after the borrow on the enemy query ends.

use hecs::World;
use rand::rngs::StdRng;
use rand::Rng;

use tankwave_logic::constants::{ai, combat as cc};
use tankwave_logic::geometry::{angle_diff, Rect, Vec2};
use tankwave_logic::steering::{self, BulletThreat};
use tankwave_logic::tiers::{self, WeaponKind};

use crate::components::{
    AiState, Bullet, BulletKind, Element, Enemy, Health, Owner, Player, Position, Structure,
    StructureKind, Velocity,
};
use crate::spatial::SpatialGrid;
use crate::worldgen::clamp_to_world;

/// Pending shot collected during the decision pass.
struct FireCommand {
    pos: Vec2,
    angle: f32,
    tier: u8,
}

/// Nearest crate center to `home`, or `home` itself in an empty arena.
pub fn guard_anchor(covers: &[Rect], home: Vec2) -> Vec2 {
    covers
        .iter()
        .map(|r| r.center())
        .min_by(|a, b| {
            a.distance_squared(home)
                .partial_cmp(&b.distance_squared(home))
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .unwrap_or(home)
}

pub fn enemy_ai_system(
    world: &mut World,
    grid: &SpatialGrid,
    player: &Player,
    rng: &mut StdRng,
    dt: f32,
) {
    // Snapshot phase: immutable reads before the mutable pass.
    let threats: Vec<BulletThreat> = world
        .query::<(&Bullet, &Position)>()
        .iter()
        .filter(|(_, (b, _))| b.owner == Owner::Player)
        .map(|(_, (b, p))| BulletThreat { pos: p.0, vel: b.vel })
        .collect();

    let covers: Vec<Rect> = world
        .query::<&Structure>()
        .iter()
        .filter(|(_, s)| s.kind == StructureKind::Crate)
        .map(|(_, s)| s.rect)
        .collect();

    let positions: Vec<(hecs::Entity, Vec2)> = world
        .query::<(&Enemy, &Position)>()
        .iter()
        .map(|(e, (_, p))| (e, p.0))
        .collect();

    // Attack slots: the closest engaged enemies claim them; the rest hold
    // formation rings. Ranks are assigned in distance order.
    let mut engaged: Vec<(hecs::Entity, f32)> = world
        .query::<(&Enemy, &Position)>()
        .iter()
        .filter(|(_, (e, _))| {
            matches!(e.state, AiState::Alert | AiState::Attack) && e.warmed_up()
        })
        .map(|(ent, (_, p))| (ent, p.0.distance(player.pos)))
        .collect();
    engaged.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    let slotted: Vec<hecs::Entity> = engaged
        .iter()
        .take(ai::MAX_SIMULTANEOUS_ATTACKERS)
        .map(|(e, _)| *e)
        .collect();
    let lead_dist = engaged.first().map(|(_, d)| *d).unwrap_or(f32::MAX);
    let formation_rank: Vec<(hecs::Entity, usize)> = engaged
        .iter()
        .skip(ai::MAX_SIMULTANEOUS_ATTACKERS)
        .enumerate()
        .map(|(rank, (e, _))| (*e, rank))
        .collect();

    let mut fire_commands: Vec<FireCommand> = Vec::new();

    // Decision + apply phase.
    for (entity, (enemy, pos, vel, health)) in world
        .query::<(&mut Enemy, &mut Position, &mut Velocity, &Health)>()
        .iter()
    {
        let def = tiers::tier(enemy.tier);
        enemy.status.tick(dt);

        // Spawn warmup: inert and untargetable.
        if enemy.warmup_ticks > 0 {
            enemy.warmup_ticks -= 1;
            vel.0 = Vec2::ZERO;
            continue;
        }
        if enemy.holdoff_ticks > 0 {
            enemy.holdoff_ticks -= 1;
        }

        let me = pos.0;
        let dist = me.distance(player.pos);
        let to_player = (player.pos - me).normalize();
        let los = grid.line_of_sight(me, player.pos);
        let hp_ratio = health.ratio();

        // Player tracking: remember the last position we actually saw.
        if los {
            enemy.last_known_player = Some(player.pos);
            enemy.time_since_seen = 0.0;
        } else {
            enemy.time_since_seen += dt;
        }

        // State transitions.
        let emergency = hp_ratio < ai::CRITICAL_HP_THRESHOLD;
        if hp_ratio < ai::LOW_HP_RETREAT_THRESHOLD && enemy.state != AiState::Retreat {
            enemy.state = AiState::Retreat;
            enemy.cover_recalc_ticks = 0;
        }

        match enemy.state {
            AiState::Patrol => {
                let in_cone = dist < ai::ENEMY_VISION_RANGE
                    && angle_diff(enemy.heading, (player.pos - me).angle()).abs()
                        < ai::ENEMY_VISION_HALF_ANGLE
                    && los;
                if in_cone || dist < ai::ENEMY_CHASE_DISTANCE_THRESHOLD {
                    enemy.state = AiState::Alert;
                }
            }
            AiState::Alert => {
                if slotted.contains(&entity) {
                    enemy.state = AiState::Attack;
                }
            }
            AiState::Attack => {
                if !slotted.contains(&entity) {
                    enemy.state = AiState::Alert;
                }
            }
            AiState::Retreat => {
                if !emergency
                    && hp_ratio >= ai::LOW_HP_RETREAT_THRESHOLD * 0.9
                    && steering::retreat_satisfied(dist)
                {
                    enemy.state = AiState::Alert;
                }
            }
            AiState::Detour => {
                enemy.detour_ticks += 1;
                let arrived = enemy
                    .detour_target
                    .map(|t| me.distance(t) < cc::ENEMY_RADIUS)
                    .unwrap_or(true);
                if arrived {
                    enemy.state = AiState::Alert;
                    enemy.detour_target = None;
                } else if enemy.detour_ticks > ai::ENEMY_DETOUR_TIMEOUT {
                    // Waypoint went stale; flip sides next time.
                    if enemy.avoid_lock_ticks == 0 {
                        enemy.avoid_side = -enemy.avoid_side;
                        enemy.avoid_lock_ticks = ai::ENEMY_AVOID_LOCK_FRAMES;
                    }
                    enemy.state = AiState::Alert;
                    enemy.detour_target = None;
                }
            }
            AiState::StuckRecovery => {
                enemy.detour_ticks += 1;
                if enemy.detour_ticks > ai::ENEMY_PATH_FAIL_THRESHOLD {
                    enemy.state = AiState::Alert;
                    enemy.stuck_ticks = 0;
                }
            }
        }
        if enemy.avoid_lock_ticks > 0 {
            enemy.avoid_lock_ticks -= 1;
        }

        // Steering per state.
        let neighbors: Vec<Vec2> = positions
            .iter()
            .filter(|(e, p)| *e != entity && p.distance(me) < ai::ENEMY_SOFT_SEPARATION)
            .map(|(_, p)| *p)
            .collect();
        let fallback_angle = (enemy.tier as f32 + 1.0) * 1.7 + enemy.arc_variance;
        let separation = steering::separation(me, &neighbors, fallback_angle);

        let speed = def.speed * enemy.status.speed_factor();
        let mut desired = Vec2::ZERO;
        let mut wants_fire = false;

        match enemy.state {
            AiState::Patrol => {
                if me.distance(enemy.patrol_point) < cc::ENEMY_RADIUS {
                    let anchor = guard_anchor(&covers, enemy.home);
                    enemy.guard_point = anchor;
                    enemy.patrol_point = clamp_to_world(
                        anchor
                            + Vec2::from_angle(rng.gen_range(0.0..std::f32::consts::TAU))
                                * rng.gen_range(0.0..ai::PATROL_RADIUS),
                    );
                }
                desired = (enemy.patrol_point - me).normalize()
                    * (speed * ai::PATROL_SPEED_FACTOR)
                    + separation * ai::ENEMY_SEPARATION_WEIGHT * speed * 0.2;
            }
            AiState::Alert => {
                // Unslotted: hold a formation ring, break the queue if the
                // lead attacker drifts too far out.
                let rank = formation_rank
                    .iter()
                    .find(|(e, _)| *e == entity)
                    .map(|(_, r)| *r);
                if let Some(rank) = rank {
                    enemy.queue_wait_ticks += 1;
                    if steering::queue_break(lead_dist, enemy.queue_wait_ticks) {
                        // Stop waiting in line: press in as if slotted.
                        enemy.queue_wait_ticks = 0;
                        desired = steering::blend_attack(
                            to_player * steering::standoff_gain(dist).max(0.3),
                            steering::arc_strafe(
                                player.pos - me,
                                enemy.arc_dir,
                                enemy.arc_variance,
                            ),
                            separation,
                            speed,
                        );
                    } else {
                        let anchor = steering::formation_anchor(player.pos, rank);
                        desired = steering::blend_attack(
                            (anchor - me).normalize(),
                            Vec2::ZERO,
                            separation,
                            speed * 0.8,
                        );
                    }
                } else {
                    enemy.queue_wait_ticks = 0;
                    desired = steering::blend_attack(
                        to_player * 0.8,
                        Vec2::ZERO,
                        separation,
                        speed * 0.9,
                    );
                }
                wants_fire = los && dist < ai::ENEMY_VISION_RANGE;
            }
            AiState::Attack => {
                enemy.queue_wait_ticks = 0;
                let pursuit = to_player * steering::standoff_gain(dist);
                let strafe =
                    steering::arc_strafe(player.pos - me, enemy.arc_dir, enemy.arc_variance);
                desired = steering::blend_attack(pursuit, strafe, separation, speed);
                wants_fire = los;
            }
            AiState::Retreat => {
                enemy.queue_wait_ticks = 0;
                if enemy.cover_recalc_ticks == 0 {
                    enemy.cover_point =
                        Some(steering::retreat_target(me, player.pos, &covers));
                    enemy.cover_recalc_ticks = ai::ENEMY_COVER_RECALC;
                } else {
                    enemy.cover_recalc_ticks -= 1;
                }
                let target = enemy.cover_point.unwrap_or(me - to_player * 100.0);
                let run = if emergency { 1.25 } else { 1.0 };
                desired = steering::blend_attack(
                    (target - me).normalize(),
                    Vec2::ZERO,
                    separation,
                    speed * ai::ENEMY_RETREAT_SPEED * run,
                );
                wants_fire = !emergency && los;
            }
            AiState::Detour => {
                if let Some(target) = enemy.detour_target {
                    desired = steering::blend_attack(
                        (target - me).normalize(),
                        Vec2::ZERO,
                        separation,
                        speed,
                    );
                }
            }
            AiState::StuckRecovery => {
                // Back straight out of whatever we are wedged against.
                desired = -Vec2::from_angle(enemy.heading) * speed * 0.6;
            }
        }

        // Bullet dodging overrides everything except a stun.
        if let Some(dodge) = steering::dodge_vector(me, &threats) {
            desired = (desired * 0.3 + dodge * speed).clamp_length(speed);
        }

        // Wall-danger probe along the travel direction forces a detour.
        if matches!(enemy.state, AiState::Alert | AiState::Attack)
            && desired.length_squared() > 1e-3
        {
            let probe = me + desired.normalize() * ai::ENEMY_WALL_DANGER_DISTANCE;
            if grid.segment_hit(me, probe).is_some() {
                enemy.state = AiState::Detour;
                enemy.detour_ticks = 0;
                enemy.detour_target = Some(clamp_to_world(steering::detour_waypoint(
                    me,
                    desired,
                    enemy.avoid_side,
                    rng.gen_range(-1.0..1.0),
                )));
                desired = desired * 0.3;
            }
        }

        // Integrate with structure collision.
        vel.0 = desired;
        let step = desired * dt;
        let mut next = clamp_to_world(me + step);
        if !grid.query_circle(next, cc::ENEMY_RADIUS).is_empty() {
            // Slide on one axis if the diagonal is blocked.
            let x_only = clamp_to_world(me + Vec2::new(step.x, 0.0));
            let y_only = clamp_to_world(me + Vec2::new(0.0, step.y));
            next = if grid.query_circle(x_only, cc::ENEMY_RADIUS).is_empty() {
                x_only
            } else if grid.query_circle(y_only, cc::ENEMY_RADIUS).is_empty() {
                y_only
            } else {
                me
            };
        }
        pos.0 = next;

        // Stuck bookkeeping against the intended speed.
        let moved = next.distance(enemy.prev_pos);
        if desired.length() > speed * 0.3 && moved < ai::STUCK_EPSILON {
            enemy.stuck_ticks += 1;
            if enemy.stuck_ticks >= ai::ENEMY_PATH_FAIL_THRESHOLD
                && enemy.state != AiState::Detour
                && enemy.state != AiState::StuckRecovery
            {
                enemy.state = AiState::StuckRecovery;
                enemy.detour_ticks = 0;
            }
        } else {
            enemy.stuck_ticks = 0;
        }
        enemy.prev_pos = next;

        // Facing and turret.
        if desired.length_squared() > 1e-3 {
            enemy.heading = desired.angle();
        }

        // Turret error relaxes toward its rolled target; a fresh target is
        // rolled on the jitter interval, scaled by tier aim error.
        if enemy.turret_jitter_ticks == 0 {
            enemy.turret_error_target = rng.gen_range(-def.aim_error..=def.aim_error);
            enemy.turret_jitter_ticks = ai::TURRET_JITTER_INTERVAL;
        } else {
            enemy.turret_jitter_ticks -= 1;
        }
        enemy.turret_error += (enemy.turret_error_target - enemy.turret_error) * (dt * 4.0);

        // Aim at the player if visible, else hold the last-known position.
        let aim_point = if los {
            player.pos
        } else {
            enemy.last_known_player.unwrap_or(player.pos)
        };
        enemy.turret_angle = (aim_point - me).angle() + enemy.turret_error;

        // Fire intent.
        enemy.fire_cooldown = (enemy.fire_cooldown - dt).max(0.0);
        if wants_fire && enemy.fire_cooldown <= 0.0 && enemy.status.stunned <= 0.0 {
            fire_commands.push(FireCommand {
                pos: me,
                angle: enemy.turret_angle,
                tier: enemy.tier,
            });
            enemy.fire_cooldown = def.fire_cooldown * rng.gen_range(0.85..1.15);
        }
    }

    // Spawn this tick's enemy bullets.
    for cmd in fire_commands {
        let def = tiers::tier(cmd.tier);
        let dir = Vec2::from_angle(cmd.angle);
        let origin = cmd.pos + dir * (cc::ENEMY_RADIUS + 6.0);
        let mut bullet = Bullet::new(
            origin,
            dir * def.bullet_speed,
            def.bullet_damage,
            2.2,
            Owner::Enemy,
        );
        bullet = match def.weapon {
            WeaponKind::Flamer => bullet.with_element(Element::Fire),
            WeaponKind::CryoLauncher => bullet.with_element(Element::Cryo),
            WeaponKind::Railgun => bullet.with_kind(BulletKind::Pierce, 2),
            WeaponKind::Cannon | WeaponKind::TwinCannon => bullet,
        };
        world.spawn((Position(origin), bullet));
    }
}
