//! Entities
//!
//! An [`Entity`] is a position, a local footprint box, an optional physics
//! body and a closed set of kinds. Capabilities that only some kinds have
//! (AI, combat stats, projectile flight) live in the kind's payload.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::monster::{DamageOutcome, Monster, MovementMode, Species, Steering};
use super::projectile::{PROJECTILE_SIZE, ProjectileKind, ProjectileState};
use crate::config::PlayerConfig;
use crate::physics::{AABB, PhysicsComponent};

/// Player health and armor caps.
pub const PLAYER_MAX_HEALTH: f32 = 100.0;
pub const PLAYER_MAX_ARMOR: f32 = 100.0;

/// Share of incoming damage armor soaks up while it lasts.
const ARMOR_ABSORPTION: f32 = 0.5;

/// Health restored by a health pack.
pub const HEALTH_PACK_AMOUNT: f32 = 25.0;
/// Armor given by an armor bonus.
pub const ARMOR_BONUS_AMOUNT: f32 = 50.0;
/// Rounds in an ammo box.
pub const AMMO_BOX_AMOUNT: u32 = 20;

/// Items are collected when the player's feet come closer than this.
const PICKUP_RANGE: f32 = 1.0;

/// Monster fireballs leave from this height above the feet...
const PROJECTILE_SPAWN_HEIGHT: f32 = 1.0;
/// ...and this far in front of the thrower.
const PROJECTILE_SPAWN_OFFSET: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmmoType {
    Bullets,
    Shells,
    Rockets,
    Cells,
}

impl AmmoType {
    /// Parses the lower-case name used in level files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bullets" => Some(AmmoType::Bullets),
            "shells" => Some(AmmoType::Shells),
            "rockets" => Some(AmmoType::Rockets),
            "cells" => Some(AmmoType::Cells),
            _ => None,
        }
    }
}

/// Rounds carried per ammo type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmmoPouch {
    pub bullets: u32,
    pub shells: u32,
    pub rockets: u32,
    pub cells: u32,
}

impl Default for AmmoPouch {
    fn default() -> Self {
        Self {
            bullets: 50,
            shells: 0,
            rockets: 0,
            cells: 0,
        }
    }
}

impl AmmoPouch {
    pub fn get(&self, ammo: AmmoType) -> u32 {
        match ammo {
            AmmoType::Bullets => self.bullets,
            AmmoType::Shells => self.shells,
            AmmoType::Rockets => self.rockets,
            AmmoType::Cells => self.cells,
        }
    }

    pub fn add(&mut self, ammo: AmmoType, amount: u32) {
        let slot = match ammo {
            AmmoType::Bullets => &mut self.bullets,
            AmmoType::Shells => &mut self.shells,
            AmmoType::Rockets => &mut self.rockets,
            AmmoType::Cells => &mut self.cells,
        };
        *slot = slot.saturating_add(amount);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerState {
    pub health: f32,
    pub armor: f32,
    pub ammo: AmmoPouch,
    pub sprinting: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self {
            health: PLAYER_MAX_HEALTH,
            armor: 0.0,
            ammo: AmmoPouch::default(),
            sprinting: false,
        }
    }
}

impl PlayerState {
    /// Armor absorbs half the damage, up to what is left of it.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.health <= 0.0 {
            return DamageOutcome::Ignored;
        }
        let absorbed = (amount * ARMOR_ABSORPTION).min(self.armor);
        self.armor -= absorbed;
        self.health -= amount - absorbed;
        if self.health <= 0.0 {
            self.health = 0.0;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Survived
        }
    }

    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).min(PLAYER_MAX_HEALTH);
    }

    pub fn add_armor(&mut self, amount: f32) {
        self.armor = (self.armor + amount).min(PLAYER_MAX_ARMOR);
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    /// Applies an item effect. Health and armor are refused when already
    /// full; ammo is always taken. Dead players take nothing.
    pub fn apply_pickup(&mut self, effect: ItemEffect) -> bool {
        if !self.is_alive() {
            return false;
        }
        match effect {
            ItemEffect::Health(amount) if self.health < PLAYER_MAX_HEALTH => self.heal(amount),
            ItemEffect::Armor(amount) if self.armor < PLAYER_MAX_ARMOR => self.add_armor(amount),
            ItemEffect::Ammo(ammo, amount) => self.ammo.add(ammo, amount),
            ItemEffect::Health(_) | ItemEffect::Armor(_) => return false,
        }
        true
    }
}

/// What collecting an item does to the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ItemEffect {
    Health(f32),
    Armor(f32),
    Ammo(AmmoType, u32),
}

impl ItemEffect {
    /// Effect of a level-file item type, or `None` for decorations and
    /// unknown types.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "health" | "health_pack" => Some(ItemEffect::Health(HEALTH_PACK_AMOUNT)),
            "armor" | "armor_bonus" => Some(ItemEffect::Armor(ARMOR_BONUS_AMOUNT)),
            other => AmmoType::from_name(other).map(|ammo| ItemEffect::Ammo(ammo, AMMO_BOX_AMOUNT)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemState {
    /// Item type name from the level file
    pub kind: String,
    pub effect: Option<ItemEffect>,
    pub pickup_range: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    Player(PlayerState),
    Monster(Monster),
    Item(ItemState),
    Projectile(ProjectileState),
}

/// Attack produced by a monster tick, for the game to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum MonsterAttack {
    /// Immediate damage to the target
    Direct {
        attacker: EntityId,
        target: EntityId,
        damage: f32,
    },
    /// A projectile to spawn
    Projectile {
        owner: EntityId,
        kind: ProjectileKind,
        position: Vec3,
        direction: Vec3,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    /// Feet position in world space
    pub position: Vec3,
    /// Heading in radians around +Y, measured from +X towards +Z
    pub yaw: f32,
    /// Footprint relative to `position`
    pub footprint: AABB,
    pub physics: Option<PhysicsComponent>,
    pub kind: EntityKind,
    /// Blocks other bodies and hitscan when set
    pub solid: bool,
    active: bool,
}

impl Entity {
    pub fn new(id: EntityId, position: Vec3, footprint: AABB, kind: EntityKind) -> Self {
        Self {
            id,
            position,
            yaw: 0.0,
            footprint,
            physics: None,
            kind,
            solid: true,
            active: true,
        }
    }

    pub fn player(id: EntityId, position: Vec3, config: &PlayerConfig) -> Self {
        let footprint = AABB::from_center_size(
            Vec3::new(0.0, config.height * 0.5, 0.0),
            Vec3::new(config.radius * 2.0, config.height, config.radius * 2.0),
        );
        let mut entity = Self::new(id, position, footprint, EntityKind::Player(PlayerState::default()));
        entity.physics = Some(PhysicsComponent::default());
        entity
    }

    pub fn monster(id: EntityId, species: Species, position: Vec3) -> Self {
        let monster = Monster::new(species);
        let footprint =
            AABB::from_center_size(monster.profile.footprint_center, monster.profile.footprint_size);
        let use_gravity = monster.profile.movement == MovementMode::Ground;
        let mut entity = Self::new(id, position, footprint, EntityKind::Monster(monster));
        entity.physics = Some(PhysicsComponent::new(1.0, use_gravity));
        entity
    }

    pub fn item(id: EntityId, kind: impl Into<String>, position: Vec3) -> Self {
        let footprint = AABB::from_center_size(Vec3::new(0.0, 0.3, 0.0), Vec3::new(0.5, 0.6, 0.5));
        let kind = kind.into();
        let state = ItemState {
            effect: ItemEffect::from_kind(&kind),
            kind,
            pickup_range: PICKUP_RANGE,
        };
        let mut entity = Self::new(id, position, footprint, EntityKind::Item(state));
        entity.solid = false;
        entity
    }

    pub fn projectile(
        id: EntityId,
        kind: ProjectileKind,
        position: Vec3,
        direction: Vec3,
        owner: Option<EntityId>,
    ) -> Self {
        let footprint = AABB::from_center_size(Vec3::ZERO, Vec3::splat(PROJECTILE_SIZE));
        let state = ProjectileState::new(kind, direction, owner);
        let mut entity = Self::new(id, position, footprint, EntityKind::Projectile(state));
        entity.solid = false;
        entity
    }

    /// Footprint translated to the entity's position.
    pub fn world_footprint(&self) -> AABB {
        self.footprint.translate(self.position)
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Marks the entity for removal.
    pub fn destroy(&mut self) {
        self.active = false;
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, self.yaw.sin())
    }

    pub fn right(&self) -> Vec3 {
        let yaw = self.yaw + std::f32::consts::FRAC_PI_2;
        Vec3::new(yaw.cos(), 0.0, yaw.sin())
    }

    pub fn distance_to(&self, other: &Entity) -> f32 {
        self.position.distance(other.position)
    }

    pub fn monster_state(&self) -> Option<&Monster> {
        match &self.kind {
            EntityKind::Monster(monster) => Some(monster),
            _ => None,
        }
    }

    pub fn projectile_state(&self) -> Option<&ProjectileState> {
        match &self.kind {
            EntityKind::Projectile(state) => Some(state),
            _ => None,
        }
    }

    /// Lets `player` collect this item when within its pickup range.
    ///
    /// A collected item is destroyed. Returns whether the pickup happened;
    /// inactive items, items without an effect and non-player collectors
    /// never pick up.
    pub fn try_pickup(&mut self, player: &mut Entity) -> bool {
        if !self.active {
            return false;
        }
        let EntityKind::Item(item) = &self.kind else {
            return false;
        };
        let Some(effect) = item.effect else {
            return false;
        };
        if self.position.distance(player.position) >= item.pickup_range {
            return false;
        }
        let EntityKind::Player(state) = &mut player.kind else {
            return false;
        };
        if !state.apply_pickup(effect) {
            return false;
        }
        self.destroy();
        true
    }

    /// Applies damage to players and monsters. A monster that dies is
    /// destroyed; other kinds ignore damage.
    pub fn take_damage(&mut self, amount: f32, attacker: Option<EntityId>) -> DamageOutcome {
        let outcome = match &mut self.kind {
            EntityKind::Player(player) => player.take_damage(amount),
            EntityKind::Monster(monster) => monster.take_damage(amount, attacker),
            EntityKind::Item(_) | EntityKind::Projectile(_) => DamageOutcome::Ignored,
        };
        if outcome == DamageOutcome::Killed && matches!(self.kind, EntityKind::Monster(_)) {
            self.destroy();
        }
        outcome
    }

    /// Sets the player's horizontal velocity from movement input in `[-1, 1]`.
    ///
    /// Zero input stops horizontal motion. Does nothing for other kinds.
    pub fn drive_player(&mut self, forward: f32, right: f32, config: &PlayerConfig) {
        let EntityKind::Player(player) = &self.kind else {
            return;
        };
        let mut speed = config.speed;
        if player.sprinting {
            speed *= config.sprint_multiplier;
        }
        let wish = (self.forward() * forward + self.right() * right).normalize_or_zero() * speed;

        if let Some(body) = self.physics.as_mut() {
            body.velocity.x = wish.x;
            body.velocity.z = wish.z;
        }
    }

    /// Starts a jump when standing on the ground. Returns whether it jumped.
    pub fn jump(&mut self, config: &PlayerConfig) -> bool {
        match self.physics.as_mut() {
            Some(body) if body.on_ground => {
                body.velocity.y = config.jump_velocity;
                true
            }
            _ => false,
        }
    }

    /// Runs one monster AI tick and applies its steering to the body.
    ///
    /// `target_position` is where the monster's current target stands, or
    /// `None` when it is gone. Returns the attack to carry out, if any.
    pub fn update_monster(&mut self, dt: f32, target_position: Option<Vec3>) -> Option<MonsterAttack> {
        let position = self.position;
        let EntityKind::Monster(monster) = &mut self.kind else {
            return None;
        };
        let steering: Steering = monster.think(dt, position, target_position);

        if let Some(yaw) = steering.yaw {
            self.yaw = yaw;
        }
        if let (Some(velocity), Some(body)) = (steering.velocity, self.physics.as_mut()) {
            match monster.profile.movement {
                MovementMode::Ground => {
                    body.velocity.x = velocity.x;
                    body.velocity.z = velocity.z;
                }
                MovementMode::Flying => body.velocity = velocity,
            }
        }

        if !steering.attack {
            return None;
        }
        let target = monster.target?;
        let target_position = target_position?;

        if monster.profile.ranged {
            let mut direction = target_position - position;
            direction.y = 0.0;
            let direction = direction.normalize_or_zero();
            let mut spawn = position + direction * PROJECTILE_SPAWN_OFFSET;
            spawn.y = position.y + PROJECTILE_SPAWN_HEIGHT;
            Some(MonsterAttack::Projectile {
                owner: self.id,
                kind: ProjectileKind::Fireball,
                position: spawn,
                direction,
            })
        } else {
            Some(MonsterAttack::Direct {
                attacker: self.id,
                target,
                damage: monster.profile.damage,
            })
        }
    }
}
