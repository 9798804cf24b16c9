//! Boss behavior: hover orbit, hp-threshold phases, turret fire, ultimate.

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::Rng;

use tankwave_logic::constants::{boss as bc, combat as cc};
use tankwave_logic::geometry::Vec2;
use tankwave_logic::tiers::{boss_phase, boss_phase_def};

use crate::components::{Boss, Bullet, BulletKind, Health, Owner, Player, Position, UltimateState};
use crate::systems::GameEvent;
use crate::worldgen::world_center;

/// Spawn the singleton boss on its hover orbit. The caller sets the
/// engine's `boss_active` flag; the two must stay in lockstep.
pub fn activate_boss(world: &mut World) -> Entity {
    let pos = world_center() + Vec2::new(0.0, -bc::HOVER_RADIUS);
    world.spawn((Boss::new(), Position(pos), Health::full(bc::MAX_HP)))
}

pub fn boss_system(
    world: &mut World,
    player: &Player,
    rng: &mut StdRng,
    events: &mut Vec<GameEvent>,
    dt: f32,
) {
    struct Shot {
        origin: Vec2,
        dir: Vec2,
        damage: f32,
        kind: BulletKind,
    }
    let mut shots: Vec<Shot> = Vec::new();
    let mut phase_event = None;

    for (_, (boss, pos, health)) in world
        .query::<(&mut Boss, &mut Position, &Health)>()
        .iter()
    {
        let phase = boss_phase(health.ratio());
        if phase != boss.phase {
            boss.phase = phase;
            phase_event = Some(phase);
        }
        let def = boss_phase_def(phase);

        // Hover orbit around the arena center, faster in later phases.
        let angular = bc::HOVER_SPEED * def.hover_speed_multiplier / bc::HOVER_RADIUS;
        boss.hover_angle += boss.hover_dir * angular * dt;
        pos.0 = world_center() + Vec2::from_angle(boss.hover_angle) * bc::HOVER_RADIUS;

        // Turrets run their own energy pools and cooldowns.
        let to_player = (player.pos - pos.0).angle();
        for turret in &mut boss.turrets {
            turret.energy = (turret.energy + bc::TURRET_REGEN * dt).min(turret.max_energy);
            turret.cooldown = (turret.cooldown - dt).max(0.0);
            if turret.cooldown <= 0.0 && turret.energy >= bc::TURRET_FIRE_COST {
                turret.energy -= bc::TURRET_FIRE_COST;
                turret.cooldown = bc::TURRET_COOLDOWN / def.fire_rate_multiplier;
                let error = rng.gen_range(-0.12..0.12);
                let dir = Vec2::from_angle(to_player + turret.mount_angle * 0.08 + error);
                shots.push(Shot {
                    origin: pos.0 + dir * cc::BOSS_RADIUS,
                    dir,
                    damage: 9.0,
                    kind: BulletKind::Normal,
                });
            }
        }

        // Ultimate cycle: idle -> charging -> firing (radial burst on
        // entry) -> cooldown -> idle. Phase 1 never uses it.
        boss.ultimate = match boss.ultimate {
            UltimateState::Idle => {
                if def.uses_ultimate {
                    UltimateState::Charging {
                        remaining: bc::ULTIMATE_CHARGE,
                    }
                } else {
                    UltimateState::Idle
                }
            }
            UltimateState::Charging { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    for i in 0..bc::ULTIMATE_BULLETS {
                        let angle =
                            i as f32 * std::f32::consts::TAU / bc::ULTIMATE_BULLETS as f32;
                        let dir = Vec2::from_angle(angle);
                        // Ultimate rounds detonate on impact.
                        shots.push(Shot {
                            origin: pos.0 + dir * cc::BOSS_RADIUS,
                            dir,
                            damage: 14.0,
                            kind: BulletKind::Aoe,
                        });
                    }
                    UltimateState::Firing {
                        remaining: bc::ULTIMATE_FIRING,
                    }
                } else {
                    UltimateState::Charging { remaining }
                }
            }
            UltimateState::Firing { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    UltimateState::Cooldown {
                        remaining: bc::ULTIMATE_COOLDOWN,
                    }
                } else {
                    UltimateState::Firing { remaining }
                }
            }
            UltimateState::Cooldown { remaining } => {
                let remaining = remaining - dt;
                if remaining <= 0.0 {
                    UltimateState::Idle
                } else {
                    UltimateState::Cooldown { remaining }
                }
            }
        };
    }

    if let Some(phase) = phase_event {
        events.push(GameEvent::BossPhaseChanged { phase });
    }

    for shot in shots {
        world.spawn((
            Position(shot.origin),
            Bullet::new(shot.origin, shot.dir * 360.0, shot.damage, 3.0, Owner::Boss)
                .with_kind(shot.kind, 0),
        ));
    }
}
