//! Tankwave Headless Simulation Harness
//!
//! Validates pure combat logic and full-engine behavior without rendering.
//! Runs entirely in-process — no window, no storage, no networking.
//!
//! Usage:
//!   cargo run -p tankwave-simtest
//!   cargo run -p tankwave-simtest -- --verbose

use std::collections::HashMap;

use tankwave_core::components::{Enemy, Health, InputIntent};
use tankwave_core::engine::{GameEngine, GamePhase};
use tankwave_core::persistence::{self, MemorySlot, SaveSlot};
use tankwave_logic::achievements::{evaluate, merge, SessionStats, StatDelta, ACHIEVEMENTS};
use tankwave_logic::constants::{ai, player as plc, waves as wvc, world as wc};
use tankwave_logic::geometry::{Rect, Vec2};
use tankwave_logic::steering::{self, BulletThreat};
use tankwave_logic::targeting::{can_auto_fire, select_target, AimTarget, FireGate, TargetCandidate};
use tankwave_logic::tiers;
use tankwave_logic::waves;

const DT: f32 = 1.0 / 60.0;

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(name: &str, passed: bool, detail: impl Into<String>) -> TestResult {
    TestResult {
        name: name.into(),
        passed,
        detail: detail.into(),
    }
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== Tankwave Simulation Harness ===\n");

    let mut results = Vec::new();

    results.extend(validate_steering(verbose));
    results.extend(validate_targeting(verbose));
    results.extend(validate_tables(verbose));
    results.extend(validate_achievements(verbose));
    results.extend(validate_wave_lifecycle(verbose));
    results.extend(validate_persistence(verbose));
    results.extend(soak_run(verbose));

    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Steering sweep ───────────────────────────────────────────────────

fn validate_steering(_verbose: bool) -> Vec<TestResult> {
    println!("--- Steering ---");
    let mut results = Vec::new();

    // Separation pushes apart at every tested spacing inside the soft band.
    let mut all_push_away = true;
    for d in [10.0f32, 30.0, 59.0, 79.0, 100.0] {
        let me = Vec2::new(0.0, 0.0);
        let other = Vec2::new(d, 0.0);
        let force = steering::separation(me, &[other], 0.0);
        if force.x >= 0.0 {
            all_push_away = false;
        }
    }
    results.push(check(
        "separation_pushes_apart",
        all_push_away,
        "force points away from neighbor across the soft band",
    ));

    // Coincident tanks still separate, deterministically by fallback angle.
    let f1 = steering::separation(Vec2::new(5.0, 5.0), &[Vec2::new(5.0, 5.0)], 1.0);
    let f2 = steering::separation(Vec2::new(5.0, 5.0), &[Vec2::new(5.0, 5.0)], 1.0);
    results.push(check(
        "separation_coincident_fallback",
        f1.length() > 0.0 && (f1 - f2).length() < 1e-6,
        format!("fallback force length {:.2}", f1.length()),
    ));

    // A bullet on a collision course produces a perpendicular dodge.
    let me = Vec2::new(200.0, 0.0);
    let threat = BulletThreat {
        pos: Vec2::new(100.0, 0.0),
        vel: Vec2::new(600.0, 0.0),
    };
    let dodge = steering::dodge_vector(me, &[threat]);
    let perpendicular = dodge
        .map(|d| d.normalize().dot(Vec2::new(1.0, 0.0)).abs() < 0.3)
        .unwrap_or(false);
    results.push(check(
        "dodge_perpendicular",
        perpendicular,
        "dodge vector is roughly perpendicular to bullet velocity",
    ));

    // A bullet heading away triggers no dodge.
    let away = BulletThreat {
        pos: Vec2::new(100.0, 0.0),
        vel: Vec2::new(-600.0, 0.0),
    };
    results.push(check(
        "dodge_ignores_receding",
        steering::dodge_vector(me, &[away]).is_none(),
        "receding bullet ignored",
    ));

    // Retreat target puts cover between enemy and player when available.
    let player = Vec2::new(0.0, 0.0);
    let enemy = Vec2::new(300.0, 0.0);
    let cover = Rect::new(380.0, -40.0, 80.0, 80.0);
    let target = steering::retreat_target(enemy, player, &[cover]);
    results.push(check(
        "retreat_hides_behind_cover",
        target.x > cover.center().x,
        format!("retreat target x {:.0} beyond cover center", target.x),
    ));

    // Standoff gain flips sign across the preferred radius.
    let near = steering::standoff_gain(ai::MIN_ATTACK_SPACING + 10.0);
    let far = steering::standoff_gain(ai::ENEMY_STANDOFF_RADIUS * 2.0);
    results.push(check(
        "standoff_gain_signs",
        near < 0.0 && far > 0.0,
        format!("near {near:.2}, far {far:.2}"),
    ));

    results
}

// ── 2. Targeting priority ───────────────────────────────────────────────

fn validate_targeting(_verbose: bool) -> Vec<TestResult> {
    println!("--- Targeting ---");
    let mut results = Vec::new();
    let player = Vec2::new(0.0, 0.0);

    let candidate = |pos: Vec2, tier: u8, shielded: bool, los: bool| TargetCandidate {
        pos,
        tier,
        shielded,
        warmed_up: true,
        targetable: true,
        line_of_sight: los,
    };

    // Boss with line of sight beats everything.
    let enemies = vec![candidate(Vec2::new(50.0, 0.0), 4, false, true)];
    let aim = select_target(player, Some((Vec2::new(400.0, 0.0), true)), &enemies);
    results.push(check(
        "boss_outranks_enemies",
        matches!(aim, AimTarget::Boss { .. }),
        format!("{aim:?}"),
    ));

    // Without boss LOS, highest unshielded tier wins over closer low tier.
    let enemies = vec![
        candidate(Vec2::new(60.0, 0.0), 0, false, true),
        candidate(Vec2::new(300.0, 0.0), 3, false, true),
    ];
    let aim = select_target(player, Some((Vec2::new(400.0, 0.0), false)), &enemies);
    let picked_heavy = matches!(aim, AimTarget::Enemy { angle, .. } if angle.abs() < 0.01)
        && matches!(aim, AimTarget::Enemy { shielded: false, .. });
    results.push(check(
        "max_tier_beats_proximity",
        picked_heavy,
        format!("{aim:?}"),
    ));

    // Only shielded targets visible: nearest shielded is the fallback.
    let enemies = vec![
        candidate(Vec2::new(500.0, 0.0), 4, true, true),
        candidate(Vec2::new(200.0, 0.0), 4, true, true),
    ];
    let aim = select_target(player, None, &enemies);
    results.push(check(
        "shielded_fallback_nearest",
        matches!(aim, AimTarget::Enemy { shielded: true, .. }),
        format!("{aim:?}"),
    ));

    // Nothing targetable yields the explicit none sentinel.
    let enemies = vec![TargetCandidate {
        pos: Vec2::new(100.0, 0.0),
        tier: 1,
        shielded: false,
        warmed_up: false,
        targetable: false,
        line_of_sight: true,
    }];
    let aim = select_target(player, None, &enemies);
    results.push(check(
        "no_target_sentinel",
        matches!(aim, AimTarget::None),
        format!("{aim:?}"),
    ));

    // Auto-fire gate: heat and energy limits, no double rate gating here.
    let mut gate = FireGate {
        overheated: false,
        thermal_locked: false,
        temperature: 0.0,
        max_temperature: plc::MAX_TEMPERATURE,
        energy: plc::MAX_ENERGY,
        max_energy: plc::MAX_ENERGY,
    };
    let ok_cold = can_auto_fire(&gate);
    gate.temperature = plc::MAX_TEMPERATURE * (plc::AUTO_FIRE_MAX_HEAT_FRACTION + 0.05);
    let blocked_hot = !can_auto_fire(&gate);
    gate.temperature = 0.0;
    gate.energy = plc::MAX_ENERGY * (plc::AUTO_FIRE_MIN_ENERGY_FRACTION - 0.05);
    let blocked_dry = !can_auto_fire(&gate);
    results.push(check(
        "auto_fire_resource_gates",
        ok_cold && blocked_hot && blocked_dry,
        format!("cold {ok_cold}, hot-block {blocked_hot}, dry-block {blocked_dry}"),
    ));

    results
}

// ── 3. Tier and wave tables ─────────────────────────────────────────────

fn validate_tables(_verbose: bool) -> Vec<TestResult> {
    println!("--- Tables ---");
    let mut results = Vec::new();

    let ordered = tiers::TIERS.windows(2).all(|w| w[0].score < w[1].score);
    results.push(check(
        "tier_scores_ascend",
        ordered,
        "score ascends with tier",
    ));

    let mut early_ok = true;
    for roll in 0..50 {
        let id = tiers::pick_tier(1, roll as f32 / 50.0);
        if tiers::tier(id).min_wave > 1 {
            early_ok = false;
        }
    }
    results.push(check(
        "wave_one_spawns_only_early_tiers",
        early_ok,
        "50-roll sweep over wave 1",
    ));

    let growth_ok = (1..30u32)
        .all(|w| waves::enemies_per_wave(w) <= waves::enemies_per_wave(w + 1));
    let capped = waves::enemies_per_wave(999) == wvc::MAX_ENEMIES_PER_WAVE;
    results.push(check(
        "wave_quota_monotonic_and_capped",
        growth_ok && capped,
        format!("cap {}", wvc::MAX_ENEMIES_PER_WAVE),
    ));

    results.push(check(
        "completion_predicate",
        !waves::wave_complete(0, 3, 4) && !waves::wave_complete(1, 4, 4) && waves::wave_complete(0, 4, 4),
        "requires full spawn and zero live",
    ));

    results
}

// ── 4. Achievement engine ───────────────────────────────────────────────

fn validate_achievements(_verbose: bool) -> Vec<TestResult> {
    println!("--- Achievements ---");
    let mut results = Vec::new();

    let well_formed = ACHIEVEMENTS.iter().all(|d| {
        d.thresholds.len() == d.tier_names.len()
            && d.thresholds.windows(2).all(|w| w[0] < w[1])
    });
    results.push(check(
        "achievement_table_well_formed",
        well_formed,
        format!("{} rows", ACHIEVEMENTS.len()),
    ));

    // A single large delta crosses multiple tiers, one unlock per tier.
    let mut stats = SessionStats::default();
    let unlocked = HashMap::new();
    merge(
        &mut stats,
        &StatDelta {
            kills_added: 30,
            ..Default::default()
        },
    );
    let unlocks = evaluate(&stats, &unlocked);
    let fb: Vec<_> = unlocks.iter().filter(|u| u.id == "first_blood").collect();
    results.push(check(
        "multi_tier_jump",
        fb.len() == 2 && fb[0].tier == 1 && fb[1].tier == 2,
        format!("30 kills emitted {} first_blood unlocks", fb.len()),
    ));

    // Re-evaluating with tiers applied emits nothing new.
    let mut applied = HashMap::new();
    for u in &unlocks {
        let e = applied.entry(u.id.clone()).or_insert(0u32);
        *e = (*e).max(u.tier);
    }
    results.push(check(
        "no_reemission",
        evaluate(&stats, &applied).is_empty(),
        "unchanged stats emit no unlocks",
    ));

    results
}

// ── 5. Wave lifecycle on the full engine ────────────────────────────────

/// Put every live enemy one DoT tick from death so the next update kills
/// them through the normal combat path, keeping accounting honest.
fn ignite_all(engine: &mut GameEngine) {
    for (_, (enemy, health)) in engine.world.query::<(&mut Enemy, &mut Health)>().iter() {
        enemy.status.burning = 1.0;
        health.hp = 0.01;
    }
}

fn validate_wave_lifecycle(verbose: bool) -> Vec<TestResult> {
    println!("--- Wave lifecycle ---");
    let mut results = Vec::new();

    let mut engine = GameEngine::new();
    engine.start(1001);
    let quota = engine.wave.quota();

    // Burn down wave 1: ignite after every tick until quota is spawned
    // and cleared, then let the intermission run out.
    let mut accounting_ok = true;
    let mut ticks = 0u32;
    let max_ticks = 60 * 120;
    while engine.wave.wave == 1 && ticks < max_ticks {
        engine.update(DT, &InputIntent::default());
        ignite_all(&mut engine);
        let live = engine.world.query::<&Enemy>().iter().count() as u32;
        if live + engine.wave.killed_this_wave != engine.wave.total_spawned {
            accounting_ok = false;
        }
        ticks += 1;
    }
    if verbose {
        println!("  wave 1 cleared in {ticks} ticks");
    }
    results.push(check(
        "wave_accounting_invariant",
        accounting_ok,
        "live + killed == spawned every tick",
    ));
    results.push(check(
        "wave_advances_after_intermission",
        engine.wave.wave == 2,
        format!("reached wave {} in {} ticks", engine.wave.wave, ticks),
    ));
    results.push(check(
        "wave_one_spawned_full_quota",
        engine.stats.session.kills >= quota as u64,
        format!("{} kills recorded, quota {}", engine.stats.session.kills, quota),
    ));
    results.push(check(
        "kills_scored",
        engine.score > 0,
        format!("score {}", engine.score),
    ));

    results
}

// ── 6. Persistence through the engine ───────────────────────────────────

fn validate_persistence(_verbose: bool) -> Vec<TestResult> {
    println!("--- Persistence ---");
    let mut results = Vec::new();

    let mut engine = GameEngine::new();
    engine.start(2002);
    for _ in 0..300 {
        engine.update(DT, &InputIntent::default());
    }
    let score = engine.score;
    let wave = engine.wave.wave;
    let enemies = engine.world.query::<&Enemy>().iter().count();

    let mut slot = MemorySlot::new();
    let saved = engine.save_to(&mut slot).unwrap_or(false);
    results.push(check("save_written", saved, "mid-run save accepted"));

    // The record on the wire is plain JSON with the expected top level.
    let raw = slot.read(persistence::SAVE_KEY).ok().flatten().unwrap_or_default();
    let shape_ok = serde_json::from_str::<serde_json::Value>(&raw)
        .map(|v| {
            v.get("version").is_some()
                && v.get("player").is_some()
                && v.get("wave").is_some()
                && v.get("camera").is_some()
                && v.get("structures").is_some()
                && v.get("bullets").is_some()
        })
        .unwrap_or(false);
    results.push(check(
        "save_record_is_json",
        shape_ok,
        format!("{} byte JSON record", raw.len()),
    ));

    let mut restored = GameEngine::new();
    let loaded = restored.load_from(&mut slot).unwrap_or(false);
    let state_matches = restored.score == score
        && restored.wave.wave == wave
        && restored.world.query::<&Enemy>().iter().count() == enemies;
    results.push(check(
        "roundtrip_state",
        loaded && state_matches,
        format!("score {score}, wave {wave}, {enemies} enemies"),
    ));

    let combat_ready = restored
        .world
        .query::<&Enemy>()
        .iter()
        .all(|(_, e)| e.targetable());
    results.push(check(
        "loaded_enemies_combat_ready",
        combat_ready,
        "no spawn grace after load",
    ));

    results.push(check(
        "save_single_use",
        !persistence::has_save(&slot),
        "record deleted on successful load",
    ));

    // A run saved mid-boss-fight resumes with the boss still standing.
    let mut boss_engine = GameEngine::new();
    boss_engine.start(2003);
    tankwave_core::systems::boss::activate_boss(&mut boss_engine.world);
    boss_engine.wave.boss_active = true;
    let mut boss_slot = MemorySlot::new();
    let boss_saved = boss_engine.save_to(&mut boss_slot).unwrap_or(false);
    let mut boss_restored = GameEngine::new();
    let boss_loaded = boss_restored.load_from(&mut boss_slot).unwrap_or(false);
    let bosses = boss_restored
        .world
        .query::<&tankwave_core::components::Boss>()
        .iter()
        .count();
    boss_restored.update(DT, &InputIntent::default());
    results.push(check(
        "boss_fight_resumes_after_load",
        boss_saved && boss_loaded && boss_restored.wave.boss_active && bosses == 1,
        format!("boss_active with {bosses} boss entity after load"),
    ));

    // Corrupt record: load fails, record is cleared, engine keeps running.
    let mut bad = MemorySlot::new();
    bad.write(persistence::SAVE_KEY, "{broken").ok();
    let err = restored.load_from(&mut bad).is_err();
    results.push(check(
        "corrupt_record_cleared",
        err && !persistence::has_save(&bad) && restored.phase == GamePhase::Running,
        "parse failure clears the slot and leaves the run intact",
    ));

    // Dead player cannot write a resumable save.
    restored.player.hp = 0.0;
    let refused = !restored.save_to(&mut slot).unwrap_or(true);
    results.push(check(
        "dead_player_save_refused",
        refused && !persistence::has_save(&slot),
        "no save record for a dead run",
    ));

    results
}

// ── 7. Soak run ─────────────────────────────────────────────────────────

fn soak_run(verbose: bool) -> Vec<TestResult> {
    println!("--- Soak ---");
    let mut results = Vec::new();

    let mut engine = GameEngine::new();
    engine.start(3003);
    let mut all_finite = true;
    let mut in_bounds = true;
    let mut max_live = 0usize;

    for tick in 0..(60 * 60) {
        // Sweep movement direction so the player crosses the arena.
        let angle = tick as f32 * 0.002;
        let intent = InputIntent {
            move_dir: Vec2::from_angle(angle),
            fire: tick % 3 == 0,
            ..Default::default()
        };
        engine.update(DT, &intent);

        if !engine.player.pos.is_finite() {
            all_finite = false;
        }
        if engine.player.pos.x < 0.0
            || engine.player.pos.x > wc::WORLD_WIDTH
            || engine.player.pos.y < 0.0
            || engine.player.pos.y > wc::WORLD_HEIGHT
        {
            in_bounds = false;
        }
        for (_, pos) in engine
            .world
            .query::<&tankwave_core::components::Position>()
            .iter()
        {
            if !pos.0.is_finite() {
                all_finite = false;
            }
        }
        max_live = max_live.max(engine.world.query::<&Enemy>().iter().count());
    }

    if verbose {
        println!(
            "  60s soak: wave {}, score {}, peak {} live enemies",
            engine.wave.wave, engine.score, max_live
        );
    }
    results.push(check("soak_positions_finite", all_finite, "no NaN leaked"));
    results.push(check("soak_player_in_bounds", in_bounds, "player stayed in arena"));
    results.push(check(
        "soak_live_cap",
        max_live as u32 <= wvc::MAX_ENEMIES_PER_WAVE,
        format!("peak {max_live} live"),
    ));
    results.push(check(
        "soak_still_running_or_over",
        engine.phase == GamePhase::Running || engine.phase == GamePhase::GameOver,
        format!("{:?}", engine.phase),
    ));

    results
}
