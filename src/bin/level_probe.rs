//! Level Probe - headless simulation of a level
//!
//! Run with: `cargo run --bin level_probe -- [LEVEL.json] [--config CONFIG.json] [--ticks N]`
//!
//! Loads a level (or the built-in test room), spawns the player, monsters and
//! items, runs the physics, monster AI and item pickups for a number of 60 Hz
//! ticks and logs what happened: where everyone ended up, projectile impacts
//! and a ring of hitscan probes from the player's eye.
//!
//! Set `RUST_LOG=sector_arena_engine=debug` for BSP details or `=trace` for
//! per-step physics.

use std::collections::HashMap;
use std::error::Error;
use std::f32::consts::TAU;

use glam::Vec3;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use sector_arena_engine::config::EngineConfig;
use sector_arena_engine::entity::{Entity, EntityId, EntityKind, MonsterAttack, Species};
use sector_arena_engine::physics::{PhysicsSystem, ProjectileEvent, cast_ray, line_of_sight};
use sector_arena_engine::world::{Level, load_level};

const TICK: f32 = 1.0 / 60.0;
const DEFAULT_TICKS: u32 = 180;
const PROBE_RAYS: u32 = 8;
const PROBE_RANGE: f32 = 100.0;
const PLAYER: EntityId = EntityId(0);

struct Args {
    level: Option<String>,
    config: Option<String>,
    ticks: u32,
}

fn parse_args() -> Result<Args, Box<dyn Error>> {
    let mut args = Args {
        level: None,
        config: None,
        ticks: DEFAULT_TICKS,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => args.config = Some(iter.next().ok_or("--config needs a path")?),
            "--ticks" => args.ticks = iter.next().ok_or("--ticks needs a number")?.parse()?,
            _ => args.level = Some(arg),
        }
    }
    Ok(args)
}

fn spawn_entities(level: &Level, config: &EngineConfig) -> Vec<Entity> {
    let mut entities = vec![Entity::player(PLAYER, level.player_spawn(), &config.player)];
    let mut next_id = 1;

    for spawn in level.monster_spawns() {
        let species = spawn.species.unwrap_or(Species::Imp);
        let mut monster = Entity::monster(EntityId(next_id), species, spawn.position);
        if let EntityKind::Monster(state) = &mut monster.kind {
            state.set_target(PLAYER);
        }
        entities.push(monster);
        next_id += 1;
    }
    for spawn in level.item_spawns() {
        entities.push(Entity::item(EntityId(next_id), spawn.kind.clone(), spawn.position));
        next_id += 1;
    }
    entities
}

/// Runs monster AI and turns attacks into damage or new projectiles.
fn think(entities: &mut Vec<Entity>, next_id: &mut u32) {
    let positions: HashMap<EntityId, Vec3> = entities
        .iter()
        .filter(|entity| entity.is_active() || entity.id == PLAYER)
        .map(|entity| (entity.id, entity.position))
        .collect();

    let mut attacks = Vec::new();
    for entity in entities.iter_mut().filter(|entity| entity.is_active()) {
        let target = entity.monster_state().and_then(|monster| monster.target);
        let target_position = target.and_then(|id| positions.get(&id).copied());
        attacks.extend(entity.update_monster(TICK, target_position));
    }

    for attack in attacks {
        match attack {
            MonsterAttack::Direct {
                attacker,
                target,
                damage,
            } => {
                if let Some(victim) = entities.iter_mut().find(|entity| entity.id == target) {
                    victim.take_damage(damage, Some(attacker));
                }
            }
            MonsterAttack::Projectile {
                owner,
                kind,
                position,
                direction,
            } => {
                entities.push(Entity::projectile(EntityId(*next_id), kind, position, direction, Some(owner)));
                *next_id += 1;
            }
        }
    }
}

/// Lets the player collect any item in reach.
fn collect_items(entities: &mut [Entity]) {
    let Some((player, rest)) = entities.split_first_mut() else {
        return;
    };
    for item in rest.iter_mut() {
        let kind = match &item.kind {
            EntityKind::Item(state) => state.kind.clone(),
            _ => continue,
        };
        if item.try_pickup(player) {
            info!(item = item.id.0, kind = %kind, "Picked up");
        }
    }
}

fn probe(level: &Level, entities: &[Entity], config: &EngineConfig) {
    let Some(player) = entities.first() else {
        return;
    };
    let eye = player.position + Vec3::Y * config.player.eye_height;

    for i in 0..PROBE_RAYS {
        let angle = i as f32 / PROBE_RAYS as f32 * TAU;
        let direction = Vec3::new(angle.cos(), 0.0, angle.sin());
        match cast_ray(eye, direction, PROBE_RANGE, level, &entities[1..]) {
            Some(hit) => info!(
                angle_deg = angle.to_degrees(),
                distance = hit.distance,
                hit = ?hit.target,
                "Probe hit"
            ),
            None => info!(angle_deg = angle.to_degrees(), "Probe missed"),
        }
    }

    for monster in entities.iter().filter(|entity| entity.monster_state().is_some()) {
        let chest = monster.world_footprint().center();
        let others = entities.iter().filter(|other| other.id != monster.id && other.id != player.id);
        info!(
            monster = monster.id.0,
            visible = line_of_sight(eye, chest, level, others),
            "Line of sight"
        );
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("sector_arena_engine=info".parse()?)
                .add_directive("level_probe=info".parse()?),
        )
        .init();

    let args = parse_args()?;
    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    let level = match &args.level {
        Some(path) => load_level(path, config.partition)?,
        None => {
            info!("No level given, using the test room");
            Level::test_room()
        }
    };

    let physics = PhysicsSystem::new(config.physics.clone());
    let mut entities = spawn_entities(&level, &config);
    let mut next_id = entities.len() as u32;
    let mut impacts = 0usize;

    for _ in 0..args.ticks {
        think(&mut entities, &mut next_id);
        let events = physics.step_chunked(&mut entities, &level, TICK);
        PhysicsSystem::apply_projectile_damage(&mut entities, &events);
        for event in &events {
            if let ProjectileEvent::HitEntity { target, damage, .. } = event {
                info!(victim = target.0, damage, "Projectile hit");
            }
        }
        impacts += events.len();
        collect_items(&mut entities);
        entities.retain(|entity| entity.is_active() || entity.id == PLAYER);
    }

    let player = entities.first().ok_or("player missing after simulation")?;
    if let EntityKind::Player(state) = &player.kind {
        if !state.is_alive() {
            warn!("Player died during the probe");
        }
        info!(
            health = state.health,
            armor = state.armor,
            bullets = state.ammo.bullets,
            shells = state.ammo.shells,
            "Player status"
        );
    }
    let on_ground = player.physics.as_ref().is_some_and(|body| body.on_ground);
    info!(
        ticks = args.ticks,
        x = player.position.x,
        y = player.position.y,
        z = player.position.z,
        on_ground,
        sector = ?level.find_sector_id_at(player.position.x, player.position.z),
        entities = entities.len(),
        projectile_events = impacts,
        "Simulation finished"
    );

    probe(&level, &entities, &config);
    Ok(())
}
