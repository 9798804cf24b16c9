//! Combat resolution: bullet sweeps, damage, auto-aim, and player fire.

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::Rng;

use tankwave_logic::constants::{combat as cc, player as pc};
use tankwave_logic::geometry::{point_segment_distance, Vec2};
use tankwave_logic::targeting::{self, AimTarget, TargetCandidate};
use tankwave_logic::tiers;

use crate::components::{
    AiState, Boss, Bullet, BulletKind, Element, Enemy, Health, InputIntent, Owner, Player,
    Position, Structure, Velocity,
};
use crate::spatial::SpatialGrid;
use crate::systems::GameEvent;

/// Resolve this tick's auto-aim target from live enemies and the boss.
pub fn resolve_auto_aim(world: &World, grid: &SpatialGrid, player: &Player) -> AimTarget {
    let boss = world
        .query::<(&Boss, &Position)>()
        .iter()
        .next()
        .map(|(_, (_, p))| (p.0, grid.line_of_sight(player.pos, p.0)));

    let candidates: Vec<TargetCandidate> = world
        .query::<(&Enemy, &Position)>()
        .iter()
        .map(|(_, (e, p))| TargetCandidate {
            pos: p.0,
            tier: e.tier,
            shielded: tiers::tier(e.tier).shielded,
            warmed_up: e.warmed_up(),
            targetable: e.targetable(),
            line_of_sight: grid.line_of_sight(player.pos, p.0),
        })
        .collect();

    targeting::select_target(player.pos, boss, &candidates)
}

/// Turn input and auto-aim into at most one player shot this tick.
///
/// The auto-fire gate checks resources only; the rate cooldown is enforced
/// here by `Player::can_fire` so targeting never double-gates a shot.
pub fn player_fire_system(
    world: &mut World,
    player: &mut Player,
    intent: &InputIntent,
    aim: AimTarget,
    rng: &mut StdRng,
    events: &mut Vec<GameEvent>,
) {
    let (angle, auto_aimed) = match intent.aim_angle {
        Some(manual) => (Some(manual), false),
        None => (aim.angle(), true),
    };
    let Some(angle) = angle else {
        return;
    };
    player.turret_angle = angle;

    let wants_fire =
        intent.fire || (auto_aimed && targeting::can_auto_fire(&player.fire_gate()));
    if !wants_fire || !player.can_fire() {
        return;
    }

    player.apply_fire_costs();
    let spread = targeting::shot_spread(auto_aimed);
    let shot_angle = angle + rng.gen_range(-spread..=spread);
    let dir = Vec2::from_angle(shot_angle);
    let origin = player.pos + dir * (cc::PLAYER_RADIUS + 6.0);
    let damage = pc::BULLET_DAMAGE * player.passives.damage;
    world.spawn((
        Position(origin),
        Bullet::new(origin, dir * pc::BULLET_SPEED, damage, pc::BULLET_LIFE, Owner::Player),
    ));
    events.push(GameEvent::ShotFired { auto_aimed });
}

/// Apply an elemental status to an enemy.
fn apply_element(enemy: &mut Enemy, element: Element) {
    match element {
        Element::Fire => enemy.status.burning = cc::BURN_DURATION,
        Element::Cryo => enemy.status.frozen = cc::FREEZE_DURATION,
        Element::Shock => enemy.status.stunned = cc::STUN_DURATION,
        Element::Kinetic => {}
    }
}

/// Move every bullet, sweep its segment against structures and hulls, and
/// apply damage. Also ticks burn damage-over-time on enemies.
pub fn bullet_system(
    world: &mut World,
    grid: &mut SpatialGrid,
    player: &mut Player,
    rng: &mut StdRng,
    events: &mut Vec<GameEvent>,
    dt: f32,
) {
    // Burn DoT first; kills here count like any other.
    let mut burn_kills: Vec<(Entity, u8, Vec2)> = Vec::new();
    for (entity, (enemy, health, pos)) in
        world.query::<(&Enemy, &mut Health, &Position)>().iter()
    {
        if enemy.status.burning > 0.0 && health.damage(cc::BURN_DPS * dt) {
            burn_kills.push((entity, enemy.tier, pos.0));
        }
    }
    for (entity, tier, pos) in burn_kills {
        let _ = world.despawn(entity);
        events.push(GameEvent::EnemyKilled { tier, pos });
    }

    // Integrate bullets.
    let mut expired: Vec<Entity> = Vec::new();
    for (entity, (bullet, pos)) in world.query::<(&mut Bullet, &mut Position)>().iter() {
        bullet.prev_pos = pos.0;
        pos.0 += bullet.vel * dt;
        bullet.life -= dt;
        if bullet.life <= 0.0 {
            expired.push(entity);
        }
    }
    for entity in expired {
        let _ = world.despawn(entity);
    }

    // Sweep each bullet's segment. Collect outcomes, then apply, so the
    // bullet query does not alias the enemy/boss queries.
    struct Sweep {
        bullet: Entity,
        seg: (Vec2, Vec2),
        vel: Vec2,
        damage: f32,
        owner: Owner,
        kind: BulletKind,
        element: Element,
        pierce: u8,
    }
    let sweeps: Vec<Sweep> = world
        .query::<(&Bullet, &Position)>()
        .iter()
        .map(|(e, (b, p))| Sweep {
            bullet: e,
            seg: (b.prev_pos, p.0),
            vel: b.vel,
            damage: b.damage,
            owner: b.owner,
            kind: b.kind,
            element: b.element,
            pierce: b.pierce_remaining,
        })
        .collect();

    let mut dead_bullets: Vec<Entity> = Vec::new();
    let mut structure_hits: Vec<(Entity, f32)> = Vec::new();
    let mut enemy_hits: Vec<(Entity, f32, Element, Vec2)> = Vec::new();
    let mut boss_hits: Vec<f32> = Vec::new();
    let mut pierce_updates: Vec<(Entity, u8)> = Vec::new();
    let mut blasts: Vec<(Vec2, f32, Owner)> = Vec::new();

    for sweep in &sweeps {
        let (a, b) = sweep.seg;

        // Structure impact truncates the sweep; pierce rounds stop too.
        let wall_t = grid.segment_hit(a, b).map(|(entry, t)| (entry.entity, t));
        let end_t = wall_t.map(|(_, t)| t).unwrap_or(1.0);
        let end = a + (b - a) * end_t;

        let mut stopped = false;
        match sweep.owner {
            Owner::Player => {
                // Nearest enemy on the swept segment.
                let mut hit: Option<(Entity, f32, Vec2)> = None;
                for (entity, (_, pos)) in world.query::<(&Enemy, &Position)>().iter() {
                    if point_segment_distance(pos.0, a, end) <= cc::ENEMY_RADIUS {
                        let t = pos.0.distance(a);
                        match hit {
                            Some((_, ht, _)) if ht <= t => {}
                            _ => hit = Some((entity, t, pos.0)),
                        }
                    }
                }
                let boss_hit = world
                    .query::<(&Boss, &Position)>()
                    .iter()
                    .next()
                    .and_then(|(_, (_, pos))| {
                        (point_segment_distance(pos.0, a, end) <= cc::BOSS_RADIUS)
                            .then(|| (pos.0.distance(a), pos.0))
                    });

                if sweep.kind == BulletKind::Aoe {
                    // Area rounds detonate at first contact instead of
                    // applying hull damage directly.
                    let mut contact = hit.map(|(_, t, p)| (t, p));
                    if let Some((t, p)) = boss_hit {
                        if contact.map_or(true, |(ct, _)| t < ct) {
                            contact = Some((t, p));
                        }
                    }
                    if wall_t.is_some() {
                        contact = contact.or(Some((end.distance(a), end)));
                    }
                    if let Some((_, center)) = contact {
                        blasts.push((center, sweep.damage, Owner::Player));
                        stopped = true;
                    }
                } else {
                    // Crits and lifesteal apply to the player's own shots.
                    let mut damage = sweep.damage;
                    if rng.gen::<f32>() < player.passives.critical {
                        damage *= cc::CRIT_MULTIPLIER;
                    }

                    match (hit, boss_hit) {
                        (Some((_, et, _)), Some((bt, _))) if bt < et => {
                            boss_hits.push(damage);
                            stopped = true;
                        }
                        (Some((entity, _, epos)), _) => {
                            enemy_hits.push((entity, damage, sweep.element, epos));
                            player.hp = (player.hp + damage * player.passives.lifesteal)
                                .min(player.max_hp);
                            if sweep.kind == BulletKind::Pierce && sweep.pierce > 0 {
                                pierce_updates.push((sweep.bullet, sweep.pierce - 1));
                            } else {
                                stopped = true;
                            }
                        }
                        (None, Some(_)) => {
                            boss_hits.push(damage);
                            stopped = true;
                        }
                        (None, None) => {}
                    }
                }
            }
            Owner::Enemy | Owner::Boss => {
                let hit_player = point_segment_distance(player.pos, a, end) <= cc::PLAYER_RADIUS;
                if sweep.kind == BulletKind::Aoe {
                    if hit_player {
                        blasts.push((player.pos, sweep.damage, sweep.owner));
                        stopped = true;
                    } else if wall_t.is_some() {
                        blasts.push((end, sweep.damage, sweep.owner));
                        stopped = true;
                    }
                } else if hit_player {
                    player.hp = (player.hp - sweep.damage).max(0.0);
                    events.push(GameEvent::PlayerDamaged {
                        amount: sweep.damage,
                    });
                    if player.is_dead() {
                        events.push(GameEvent::PlayerDied);
                    }
                    stopped = true;
                }
            }
        }

        if let Some((structure_entity, _)) = wall_t {
            if !stopped {
                structure_hits.push((structure_entity, sweep.damage));
                stopped = true;
            }
        }
        if stopped {
            dead_bullets.push(sweep.bullet);
        }
    }

    // Detonations: radial damage to the opposing side and to any structure
    // caught in the blast.
    for (center, damage, owner) in blasts {
        match owner {
            Owner::Player => {
                for (entity, (_, pos)) in world.query::<(&Enemy, &Position)>().iter() {
                    if pos.0.distance(center) <= cc::AOE_RADIUS + cc::ENEMY_RADIUS {
                        enemy_hits.push((entity, damage, Element::Kinetic, pos.0));
                    }
                }
                let boss_in_range = world
                    .query::<(&Boss, &Position)>()
                    .iter()
                    .next()
                    .is_some_and(|(_, (_, pos))| {
                        pos.0.distance(center) <= cc::AOE_RADIUS + cc::BOSS_RADIUS
                    });
                if boss_in_range {
                    boss_hits.push(damage);
                }
            }
            Owner::Enemy | Owner::Boss => {
                if player.pos.distance(center) <= cc::AOE_RADIUS + cc::PLAYER_RADIUS {
                    player.hp = (player.hp - damage).max(0.0);
                    events.push(GameEvent::PlayerDamaged { amount: damage });
                    if player.is_dead() {
                        events.push(GameEvent::PlayerDied);
                    }
                }
            }
        }
        for entry in grid.query_circle(center, cc::AOE_RADIUS) {
            structure_hits.push((entry.entity, damage));
        }
    }

    // Apply enemy damage and element statuses.
    let mut enemy_kills: Vec<(Entity, u8, Vec2)> = Vec::new();
    for (entity, damage, element, epos) in enemy_hits {
        let mut killed = None;
        if let Ok((enemy, health)) = world
            .query_one_mut::<(&mut Enemy, &mut Health)>(entity)
        {
            apply_element(enemy, element);
            // Getting shot wakes a patroller even without line of sight.
            if enemy.state == AiState::Patrol {
                enemy.state = AiState::Alert;
                enemy.last_known_player = Some(player.pos);
                enemy.time_since_seen = 0.0;
            }
            if health.damage(damage) {
                killed = Some((enemy.tier, epos));
            }
        }
        if let Some((tier, pos)) = killed {
            let _ = world.despawn(entity);
            enemy_kills.push((entity, tier, pos));
        }
    }
    for (_, tier, pos) in enemy_kills {
        events.push(GameEvent::EnemyKilled { tier, pos });
    }

    // Boss damage; phase bookkeeping is the boss system's job.
    if !boss_hits.is_empty() {
        let total: f32 = boss_hits.iter().sum();
        let mut killed_at = None;
        if let Some((entity, (_, health, pos))) = world
            .query::<(&Boss, &mut Health, &Position)>()
            .iter()
            .next()
        {
            if health.damage(total) {
                killed_at = Some((entity, pos.0));
            }
        }
        if let Some((entity, pos)) = killed_at {
            let _ = world.despawn(entity);
            events.push(GameEvent::BossKilled { pos });
        }
    }

    // Structure damage; destruction invalidates the spatial grid.
    for (entity, damage) in structure_hits {
        let mut destroyed = None;
        if let Ok((structure, health)) = world
            .query_one_mut::<(&Structure, &mut Health)>(entity)
        {
            if structure.destructible && health.damage(damage) {
                destroyed = Some((structure.kind, structure.rect.center()));
            }
        }
        if let Some((kind, pos)) = destroyed {
            let _ = world.despawn(entity);
            grid.invalidate();
            events.push(GameEvent::StructureDestroyed { kind, pos });
        }
    }

    for (entity, pierce) in pierce_updates {
        if let Ok(mut bullet) = world.get::<&mut Bullet>(entity) {
            bullet.pierce_remaining = pierce;
        }
    }
    for entity in dead_bullets {
        let _ = world.despawn(entity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::worldgen::spawn_structure;
    use rand::SeedableRng;
    use tankwave_logic::geometry::Rect;

    fn setup() -> (World, SpatialGrid, Player, StdRng, Vec<GameEvent>) {
        (
            World::new(),
            SpatialGrid::new(),
            Player::new(Vec2::new(500.0, 500.0)),
            StdRng::seed_from_u64(3),
            Vec::new(),
        )
    }

    fn spawn_enemy_at(world: &mut World, pos: Vec2, tier: u8) -> Entity {
        let mut e = Enemy::spawn(tier, pos, 0.5, 0.5);
        e.warmup_ticks = 0;
        e.holdoff_ticks = 0;
        let hp = tiers::tier(tier).max_hp;
        world.spawn((e, Position(pos), Velocity::default(), Health::full(hp)))
    }

    #[test]
    fn player_bullet_damages_enemy() {
        let (mut world, mut grid, mut player, mut rng, mut events) = setup();
        player.passives.critical = 0.0;
        grid.ensure_built(&world);
        let target = spawn_enemy_at(&mut world, Vec2::new(600.0, 500.0), 1);
        let origin = Vec2::new(540.0, 500.0);
        world.spawn((
            Position(origin),
            Bullet::new(origin, Vec2::new(800.0, 0.0), 10.0, 1.0, Owner::Player),
        ));
        bullet_system(&mut world, &mut grid, &mut player, &mut rng, &mut events, 0.1);
        let health = world.get::<&Health>(target).unwrap();
        assert!(health.hp < health.max_hp);
        // Bullet consumed on impact.
        assert_eq!(world.query::<&Bullet>().iter().count(), 0);
    }

    #[test]
    fn kill_emits_event_and_despawns() {
        let (mut world, mut grid, mut player, mut rng, mut events) = setup();
        player.passives.critical = 0.0;
        grid.ensure_built(&world);
        let pos = Vec2::new(600.0, 500.0);
        let target = spawn_enemy_at(&mut world, pos, 0);
        {
            let mut h = world.get::<&mut Health>(target).unwrap();
            h.hp = 1.0;
        }
        let origin = Vec2::new(540.0, 500.0);
        world.spawn((
            Position(origin),
            Bullet::new(origin, Vec2::new(800.0, 0.0), 10.0, 1.0, Owner::Player),
        ));
        bullet_system(&mut world, &mut grid, &mut player, &mut rng, &mut events, 0.1);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::EnemyKilled { tier: 0, .. })));
        assert!(world.get::<&Enemy>(target).is_err());
    }

    #[test]
    fn wall_stops_bullet_before_enemy() {
        let (mut world, mut grid, mut player, mut rng, mut events) = setup();
        let target = spawn_enemy_at(&mut world, Vec2::new(800.0, 500.0), 1);
        spawn_structure(
            &mut world,
            Structure::wall(Rect::new(640.0, 460.0, 40.0, 80.0), false, 1),
        );
        grid.ensure_built(&world);
        let origin = Vec2::new(540.0, 500.0);
        world.spawn((
            Position(origin),
            Bullet::new(origin, Vec2::new(3000.0, 0.0), 10.0, 1.0, Owner::Player),
        ));
        bullet_system(&mut world, &mut grid, &mut player, &mut rng, &mut events, 0.1);
        let health = world.get::<&Health>(target).unwrap();
        assert_eq!(health.hp, health.max_hp);
    }

    #[test]
    fn crate_destruction_invalidates_grid() {
        let (mut world, mut grid, mut player, mut rng, mut events) = setup();
        spawn_structure(
            &mut world,
            Structure::crate_box(Rect::new(640.0, 460.0, 60.0, 60.0), 1),
        );
        grid.ensure_built(&world);
        let origin = Vec2::new(540.0, 490.0);
        world.spawn((
            Position(origin),
            Bullet::new(
                origin,
                Vec2::new(3000.0, 0.0),
                tankwave_logic::constants::world::CRATE_HP + 1.0,
                1.0,
                Owner::Player,
            ),
        ));
        bullet_system(&mut world, &mut grid, &mut player, &mut rng, &mut events, 0.1);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::StructureDestroyed { .. })));
        assert!(grid.is_dirty());
    }

    #[test]
    fn aoe_round_splashes_grouped_enemies() {
        let (mut world, mut grid, mut player, mut rng, mut events) = setup();
        grid.ensure_built(&world);
        let near = spawn_enemy_at(&mut world, Vec2::new(600.0, 500.0), 1);
        let grouped = spawn_enemy_at(&mut world, Vec2::new(660.0, 540.0), 1);
        let origin = Vec2::new(540.0, 500.0);
        world.spawn((
            Position(origin),
            Bullet::new(origin, Vec2::new(800.0, 0.0), 10.0, 1.0, Owner::Player)
                .with_kind(BulletKind::Aoe, 0),
        ));
        bullet_system(&mut world, &mut grid, &mut player, &mut rng, &mut events, 0.1);
        for target in [near, grouped] {
            let health = world.get::<&Health>(target).unwrap();
            assert!(health.hp < health.max_hp, "blast missed a grouped enemy");
        }
        assert_eq!(world.query::<&Bullet>().iter().count(), 0);
    }

    #[test]
    fn boss_aoe_blast_reaches_player_past_the_impact_point() {
        let (mut world, mut grid, mut player, mut rng, mut events) = setup();
        player.pos = Vec2::new(700.0, 500.0);
        spawn_structure(
            &mut world,
            Structure::wall(Rect::new(640.0, 460.0, 40.0, 80.0), false, 1),
        );
        grid.ensure_built(&world);
        // Detonates on the wall; the player stands inside the blast radius
        // but outside the bullet's own path.
        let origin = Vec2::new(540.0, 500.0);
        world.spawn((
            Position(origin),
            Bullet::new(origin, Vec2::new(3000.0, 0.0), 14.0, 1.0, Owner::Boss)
                .with_kind(BulletKind::Aoe, 0),
        ));
        bullet_system(&mut world, &mut grid, &mut player, &mut rng, &mut events, 0.1);
        assert!(player.hp < player.max_hp);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerDamaged { .. })));
    }

    #[test]
    fn enemy_bullet_hurts_player() {
        let (mut world, mut grid, mut player, mut rng, mut events) = setup();
        grid.ensure_built(&world);
        let origin = Vec2::new(440.0, 500.0);
        world.spawn((
            Position(origin),
            Bullet::new(origin, Vec2::new(800.0, 0.0), 12.0, 1.0, Owner::Enemy),
        ));
        bullet_system(&mut world, &mut grid, &mut player, &mut rng, &mut events, 0.1);
        assert!(player.hp < player.max_hp);
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerDamaged { .. })));
    }

    #[test]
    fn auto_aim_prefers_boss_then_tier() {
        let (mut world, mut grid, player, _rng, _events) = setup();
        grid.ensure_built(&world);
        spawn_enemy_at(&mut world, Vec2::new(600.0, 500.0), 3);
        let aim = resolve_auto_aim(&world, &grid, &player);
        assert!(matches!(aim, AimTarget::Enemy { shielded: false, .. }));

        world.spawn((
            Boss::new(),
            Position(Vec2::new(500.0, 900.0)),
            Health::full(tankwave_logic::constants::boss::MAX_HP),
        ));
        let aim = resolve_auto_aim(&world, &grid, &player);
        assert!(matches!(aim, AimTarget::Boss { .. }));
    }

    #[test]
    fn manual_fire_spawns_bullet_with_costs() {
        let (mut world, _grid, mut player, mut rng, mut events) = setup();
        let intent = InputIntent {
            aim_angle: Some(0.0),
            fire: true,
            ..Default::default()
        };
        player_fire_system(
            &mut world,
            &mut player,
            &intent,
            AimTarget::None,
            &mut rng,
            &mut events,
        );
        assert_eq!(world.query::<&Bullet>().iter().count(), 1);
        assert!(player.temperature > 0.0);
        assert!(matches!(
            events.last(),
            Some(GameEvent::ShotFired { auto_aimed: false })
        ));
    }

    #[test]
    fn auto_fire_respects_resource_gate() {
        let (mut world, _grid, mut player, mut rng, mut events) = setup();
        player.temperature = player.max_temperature * 0.95; // above gate
        let intent = InputIntent::default();
        player_fire_system(
            &mut world,
            &mut player,
            &intent,
            AimTarget::Enemy {
                angle: 0.0,
                shielded: false,
            },
            &mut rng,
            &mut events,
        );
        assert_eq!(world.query::<&Bullet>().iter().count(), 0);
    }
}
