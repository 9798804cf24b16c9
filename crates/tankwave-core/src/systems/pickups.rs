//! Pickup drops, ground lifetime, and collection effects.

use hecs::{Entity, World};
use log::debug;
use rand::rngs::StdRng;
use rand::Rng;

use tankwave_logic::constants::{pickups as pc, player as plc};
use tankwave_logic::geometry::Vec2;
use tankwave_logic::waves::{roll_kill_drop, ItemKind};

use crate::components::{Pickup, Player, Position};
use crate::systems::GameEvent;

/// Roll a kill drop and place it where the enemy died.
pub fn spawn_kill_drop(world: &mut World, pos: Vec2, rng: &mut StdRng) -> Option<ItemKind> {
    let item = roll_kill_drop(rng.gen::<f32>(), rng.gen::<f32>())?;
    spawn_pickup(world, pos, item);
    Some(item)
}

pub fn spawn_pickup(world: &mut World, pos: Vec2, item: ItemKind) {
    world.spawn((Position(pos), Pickup::new(item)));
}

pub fn pickup_system(
    world: &mut World,
    player: &mut Player,
    events: &mut Vec<GameEvent>,
    dt: f32,
) {
    let mut expired: Vec<Entity> = Vec::new();
    let mut collected: Vec<(Entity, ItemKind)> = Vec::new();

    for (entity, (pickup, pos)) in world.query::<(&mut Pickup, &Position)>().iter() {
        pickup.life -= dt;
        pickup.float_phase = (pickup.float_phase + dt * 3.0) % std::f32::consts::TAU;
        if pickup.life <= 0.0 {
            expired.push(entity);
        } else if pos.0.distance(player.pos) <= pc::COLLECT_RADIUS {
            collected.push((entity, pickup.item));
        }
    }

    for entity in expired {
        let _ = world.despawn(entity);
    }
    for (entity, item) in collected {
        let _ = world.despawn(entity);
        apply_item(player, item);
        debug!("collected {:?}", item);
        events.push(GameEvent::PickupCollected { item });
    }
}

/// Apply an item's effect to the player. Consumables act immediately,
/// upgrade items adjust passives, revive tokens bank a charge.
pub fn apply_item(player: &mut Player, item: ItemKind) {
    match item {
        ItemKind::RepairKit => {
            player.hp = (player.hp + 30.0).min(player.max_hp);
        }
        ItemKind::EnergyCell => {
            player.energy = (player.energy + 40.0).min(player.max_energy);
        }
        ItemKind::Coolant => {
            player.temperature = (player.temperature - 45.0).max(0.0);
            if player.temperature <= player.max_temperature * plc::THERMAL_UNLOCK_FRACTION {
                player.thermal_locked = false;
            }
        }
        ItemKind::DamageCore => {
            player.passives.damage += 0.12;
        }
        ItemKind::CritScope => {
            player.passives.critical = (player.passives.critical + 0.04).min(0.5);
        }
        ItemKind::LifestealRig => {
            player.passives.lifesteal = (player.passives.lifesteal + 0.05).min(0.35);
        }
        ItemKind::ReviveToken => {
            player.revive_tokens += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pickups_expire_on_the_ground() {
        let mut world = World::new();
        spawn_pickup(&mut world, Vec2::new(2000.0, 200.0), ItemKind::RepairKit);
        let mut player = Player::new(Vec2::ZERO);
        let mut events = Vec::new();
        pickup_system(&mut world, &mut player, &mut events, pc::LIFETIME + 0.1);
        assert_eq!(world.query::<&Pickup>().iter().count(), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn nearby_pickup_is_collected_and_applied() {
        let mut world = World::new();
        let mut player = Player::new(Vec2::ZERO);
        player.hp = 40.0;
        spawn_pickup(&mut world, Vec2::new(10.0, 0.0), ItemKind::RepairKit);
        let mut events = Vec::new();
        pickup_system(&mut world, &mut player, &mut events, 1.0 / 60.0);
        assert_eq!(world.query::<&Pickup>().iter().count(), 0);
        assert_eq!(player.hp, 70.0);
        assert!(events.iter().any(|e| matches!(
            e,
            GameEvent::PickupCollected {
                item: ItemKind::RepairKit
            }
        )));
    }

    #[test]
    fn heals_never_exceed_max() {
        let mut player = Player::new(Vec2::ZERO);
        player.hp = player.max_hp - 5.0;
        apply_item(&mut player, ItemKind::RepairKit);
        assert_eq!(player.hp, player.max_hp);
    }

    #[test]
    fn coolant_can_release_thermal_lock() {
        let mut player = Player::new(Vec2::ZERO);
        player.temperature = player.max_temperature;
        player.thermal_locked = true;
        apply_item(&mut player, ItemKind::Coolant);
        assert!(player.temperature < player.max_temperature);
        assert!(!player.thermal_locked);
    }

    #[test]
    fn upgrade_items_stack_with_caps() {
        let mut player = Player::new(Vec2::ZERO);
        for _ in 0..50 {
            apply_item(&mut player, ItemKind::CritScope);
            apply_item(&mut player, ItemKind::LifestealRig);
        }
        assert!(player.passives.critical <= 0.5);
        assert!(player.passives.lifesteal <= 0.35);
        apply_item(&mut player, ItemKind::ReviveToken);
        assert_eq!(player.revive_tokens, 1);
    }
}
