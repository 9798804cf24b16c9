//! The player tank. Not an ECS entity: the engine owns exactly one as a
//! resource, the way every system expects to find it.

use serde::{Deserialize, Serialize};
use tankwave_logic::constants::player as pc;
use tankwave_logic::geometry::Vec2;
use tankwave_logic::targeting::FireGate;

/// Passive multipliers granted by pickups; all start at identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Passives {
    pub damage: f32,
    pub critical: f32,
    pub lifesteal: f32,
    pub cooling: f32,
}

impl Default for Passives {
    fn default() -> Self {
        Self {
            damage: 1.0,
            critical: 0.05,
            lifesteal: 0.0,
            cooling: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Player {
    pub pos: Vec2,
    pub vel: Vec2,
    pub heading: f32,
    pub turret_angle: f32,
    pub hp: f32,
    pub max_hp: f32,
    pub energy: f32,
    pub max_energy: f32,
    pub temperature: f32,
    pub max_temperature: f32,
    pub overheated: bool,
    pub thermal_locked: bool,
    pub fire_cooldown: f32,
    pub turbo_cooldown: f32,
    pub ultimate_cooldown: f32,
    pub streak: u32,
    pub streak_timer: f32,
    pub best_streak: u32,
    pub revive_tokens: u32,
    pub passives: Passives,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(Vec2::ZERO)
    }
}

impl Player {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            heading: 0.0,
            turret_angle: 0.0,
            hp: pc::MAX_HP,
            max_hp: pc::MAX_HP,
            energy: pc::MAX_ENERGY,
            max_energy: pc::MAX_ENERGY,
            temperature: 0.0,
            max_temperature: pc::MAX_TEMPERATURE,
            overheated: false,
            thermal_locked: false,
            fire_cooldown: 0.0,
            turbo_cooldown: 0.0,
            ultimate_cooldown: 0.0,
            streak: 0,
            streak_timer: 0.0,
            best_streak: 0,
            revive_tokens: 0,
            passives: Passives::default(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    /// Cooling, energy regen, cooldown and streak timers. The thermal lock
    /// engages at full heat and releases once cooled past the unlock
    /// fraction.
    pub fn tick_resources(&mut self, dt: f32) {
        self.temperature =
            (self.temperature - pc::COOLING_RATE * self.passives.cooling * dt).max(0.0);
        self.energy = (self.energy + pc::ENERGY_REGEN * dt).min(self.max_energy);
        self.fire_cooldown = (self.fire_cooldown - dt).max(0.0);
        self.turbo_cooldown = (self.turbo_cooldown - dt).max(0.0);
        self.ultimate_cooldown = (self.ultimate_cooldown - dt).max(0.0);

        if self.temperature >= self.max_temperature * pc::THERMAL_LOCK_FRACTION {
            self.thermal_locked = true;
            self.overheated = true;
        } else if self.temperature <= self.max_temperature * pc::THERMAL_UNLOCK_FRACTION {
            self.thermal_locked = false;
            self.overheated = false;
        }

        if self.streak > 0 {
            self.streak_timer -= dt;
            if self.streak_timer <= 0.0 {
                self.streak = 0;
            }
        }
    }

    /// Register a kill for the streak counter.
    pub fn bump_streak(&mut self) {
        self.streak += 1;
        self.best_streak = self.best_streak.max(self.streak);
        self.streak_timer = tankwave_logic::constants::waves::STREAK_WINDOW;
    }

    /// True if the weapon-fire operation itself permits a shot right now.
    /// This is the rate/resource check; the auto-fire gate is separate.
    pub fn can_fire(&self) -> bool {
        self.fire_cooldown <= 0.0
            && !self.thermal_locked
            && self.energy >= pc::FIRE_ENERGY_COST
    }

    /// Pay the costs of one shot.
    pub fn apply_fire_costs(&mut self) {
        self.fire_cooldown = pc::FIRE_COOLDOWN;
        self.energy = (self.energy - pc::FIRE_ENERGY_COST).max(0.0);
        self.temperature = (self.temperature + pc::FIRE_HEAT_COST).min(self.max_temperature);
    }

    pub fn fire_gate(&self) -> FireGate {
        FireGate {
            overheated: self.overheated,
            thermal_locked: self.thermal_locked,
            temperature: self.temperature,
            max_temperature: self.max_temperature,
            energy: self.energy,
            max_energy: self.max_energy,
        }
    }
}

/// Already-decoded input intents, consumed once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputIntent {
    /// Normalized movement direction (zero = idle).
    pub move_dir: Vec2,
    /// Manual aim override; `None` lets auto-aim drive the turret.
    pub aim_angle: Option<f32>,
    pub fire: bool,
    pub turbo: bool,
}
