//! Monster behavior
//!
//! Every species runs the same `Idle -> Chase -> Dead` state machine. The
//! differences between species are data in a [`SpeciesProfile`]: stats, the
//! ranged flag and the [`MovementMode`]. Flying monsters chase in 3D and
//! ignore gravity; ground monsters steer in the XZ plane.
//!
//! The state machine does not know about the world. Each tick the caller
//! passes the target's position and applies the returned [`Steering`].

use std::f32::consts::TAU;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;

/// Distance at which a chasing monster gives up, as a multiple of sight range.
const LOSE_TARGET_FACTOR: f32 = 1.5;

/// Ranged monsters back away at this fraction of move speed when too close.
const RETREAT_SPEED_FACTOR: f32 = 0.8;
/// Sideways speed fraction while strafing inside attack range.
const STRAFE_SPEED_FACTOR: f32 = 0.6;
/// Extra backward drift while strafing closer than the preferred range.
const BACKOFF_SPEED_FACTOR: f32 = 0.3;

/// Melee monsters slow down inside this distance...
const MELEE_CLOSE_DISTANCE: f32 = 3.0;
/// ...and speed up beyond this one.
const MELEE_FAR_DISTANCE: f32 = 5.0;
const MELEE_CLOSE_MULTIPLIER: f32 = 0.8;
const MELEE_FAR_MULTIPLIER: f32 = 1.2;

/// Seconds between strafe direction flips.
pub const STRAFE_HALF_PERIOD: f32 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Species {
    Imp,
    Demon,
    Cacodemon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementMode {
    /// Walks on the floor under gravity, steering in XZ
    Ground,
    /// Floats without gravity, steering in 3D
    Flying,
}

/// Stats and movement parameters of one species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesProfile {
    pub health: f32,
    pub damage: f32,
    pub move_speed: f32,
    pub attack_range: f32,
    /// Distance a ranged monster tries to keep
    pub preferred_range: f32,
    /// Ranged monsters back away when closer than this
    pub min_range: f32,
    /// Attacks per second
    pub attack_rate: f32,
    pub sight_range: f32,
    pub ranged: bool,
    pub movement: MovementMode,
    /// Local footprint center and full size
    pub footprint_center: Vec3,
    pub footprint_size: Vec3,
}

impl Species {
    pub fn profile(self) -> SpeciesProfile {
        match self {
            Species::Imp => SpeciesProfile {
                health: 60.0,
                damage: 3.0,
                move_speed: 2.5,
                attack_range: 7.0,
                preferred_range: 6.0,
                min_range: 4.0,
                attack_rate: 0.8,
                sight_range: 15.0,
                ranged: true,
                movement: MovementMode::Ground,
                footprint_center: Vec3::new(0.0, 0.8, 0.0),
                footprint_size: Vec3::new(0.6, 1.6, 0.6),
            },
            Species::Demon => SpeciesProfile {
                health: 60.0,
                damage: 15.0,
                move_speed: 3.0,
                attack_range: 2.0,
                preferred_range: 1.5,
                min_range: 0.0,
                attack_rate: 1.5,
                sight_range: 15.0,
                ranged: false,
                movement: MovementMode::Ground,
                footprint_center: Vec3::new(0.0, 0.7, 0.0),
                footprint_size: Vec3::new(0.8, 1.4, 0.8),
            },
            Species::Cacodemon => SpeciesProfile {
                health: 400.0,
                damage: 15.0,
                move_speed: 3.0,
                attack_range: 12.0,
                preferred_range: 1.5,
                min_range: 0.5,
                attack_rate: 1.0,
                sight_range: 15.0,
                ranged: false,
                movement: MovementMode::Flying,
                footprint_center: Vec3::new(0.0, 1.0, 0.0),
                footprint_size: Vec3::new(1.0, 1.0, 1.0),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MonsterState {
    #[default]
    Idle,
    Chase,
    Dead,
}

/// Tactical notes written by the AI layer and read back on later ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TacticalMemory {
    pub flanking_target: Option<Vec3>,
    pub retreat_position: Option<Vec3>,
    /// 0 = cautious, 1 = aggressive
    pub aggression: f32,
    /// Seconds until the AI layer reconsiders tactics
    pub cooldown: f32,
    pub coordination_group: Option<u32>,
}

impl Default for TacticalMemory {
    fn default() -> Self {
        Self {
            flanking_target: None,
            retreat_position: None,
            aggression: 1.0,
            cooldown: 0.0,
            coordination_group: None,
        }
    }
}

/// Alternates strafe direction every `half_period` seconds of simulated time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrafeTimer {
    elapsed: f32,
    half_period: f32,
}

impl Default for StrafeTimer {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl StrafeTimer {
    /// `phase` offsets the timer so monsters spawned together do not strafe
    /// in lockstep.
    pub fn new(phase: f32) -> Self {
        Self {
            elapsed: phase.rem_euclid(2.0 * STRAFE_HALF_PERIOD),
            half_period: STRAFE_HALF_PERIOD,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed = (self.elapsed + dt).rem_euclid(2.0 * self.half_period);
    }

    /// `1.0` for the first half of each period, `-1.0` for the second.
    pub fn sign(&self) -> f32 {
        if self.elapsed < self.half_period { 1.0 } else { -1.0 }
    }
}

/// What a monster wants to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Steering {
    /// Desired velocity: horizontal only for ground monsters, full 3D for
    /// flyers. `None` leaves the current velocity alone.
    pub velocity: Option<Vec3>,
    /// Yaw to face, radians
    pub yaw: Option<f32>,
    /// An attack was triggered this tick
    pub attack: bool,
}

/// Outcome of damage dealt to a monster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Survived,
    Killed,
    /// Already dead; the damage was ignored
    Ignored,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Monster {
    pub species: Species,
    pub profile: SpeciesProfile,
    pub health: f32,
    pub state: MonsterState,
    pub target: Option<EntityId>,
    pub attack_cooldown: f32,
    pub strafe: StrafeTimer,
    pub tactics: TacticalMemory,
}

impl Monster {
    pub fn new(species: Species) -> Self {
        let profile = species.profile();
        Self {
            species,
            health: profile.health,
            profile,
            state: MonsterState::Idle,
            target: None,
            attack_cooldown: 0.0,
            strafe: StrafeTimer::default(),
            tactics: TacticalMemory::default(),
        }
    }

    pub fn is_dead(&self) -> bool {
        self.state == MonsterState::Dead
    }

    /// Locks onto `target`, waking an idle monster.
    pub fn set_target(&mut self, target: EntityId) {
        if self.is_dead() {
            return;
        }
        self.target = Some(target);
        if self.state == MonsterState::Idle {
            self.state = MonsterState::Chase;
        }
    }

    /// Subtracts health. A surviving monster without a target turns on its
    /// attacker.
    pub fn take_damage(&mut self, amount: f32, attacker: Option<EntityId>) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::Ignored;
        }
        self.health -= amount;
        if self.health <= 0.0 {
            self.health = 0.0;
            self.state = MonsterState::Dead;
            return DamageOutcome::Killed;
        }
        if let (Some(attacker), None) = (attacker, self.target) {
            self.set_target(attacker);
        }
        DamageOutcome::Survived
    }

    /// Runs one tick of the state machine.
    ///
    /// `target_position` is where the current target stands, or `None` when it
    /// no longer exists.
    pub fn think(&mut self, dt: f32, position: Vec3, target_position: Option<Vec3>) -> Steering {
        if self.attack_cooldown > 0.0 {
            self.attack_cooldown -= dt;
        }
        self.strafe.advance(dt);

        if self.target.is_some() && target_position.is_none() {
            self.target = None;
        }

        match self.state {
            MonsterState::Dead => Steering::default(),
            MonsterState::Idle => {
                if let Some(target) = target_position.filter(|_| self.target.is_some()) {
                    if position.distance(target) < self.profile.sight_range {
                        self.state = MonsterState::Chase;
                    }
                }
                Steering::default()
            }
            MonsterState::Chase => match target_position {
                None => {
                    self.state = MonsterState::Idle;
                    Steering::default()
                }
                Some(target) => self.chase(position, target),
            },
        }
    }

    fn chase(&mut self, position: Vec3, target: Vec3) -> Steering {
        let distance = position.distance(target);
        if distance > self.profile.sight_range * LOSE_TARGET_FACTOR {
            self.state = MonsterState::Idle;
            self.target = None;
            return Steering::default();
        }

        match self.profile.movement {
            MovementMode::Flying => self.chase_flying(position, target, distance),
            MovementMode::Ground if self.profile.ranged => self.chase_ranged(position, target, distance),
            MovementMode::Ground => self.chase_melee(position, target, distance),
        }
    }

    fn try_attack(&mut self) -> bool {
        if self.attack_cooldown > 0.0 {
            return false;
        }
        self.attack_cooldown = 1.0 / self.profile.attack_rate;
        true
    }

    fn chase_ranged(&mut self, position: Vec3, target: Vec3, distance: f32) -> Steering {
        let direction = flat_direction(position, target);
        let speed = self.profile.move_speed;

        let (velocity, attack) = if distance < self.profile.min_range {
            (-direction * speed * RETREAT_SPEED_FACTOR, self.try_attack())
        } else if distance <= self.profile.attack_range {
            let strafe = Vec3::new(-direction.z, 0.0, direction.x);
            let mut velocity = strafe * speed * STRAFE_SPEED_FACTOR * self.strafe.sign();
            if distance < self.profile.preferred_range {
                velocity -= direction * speed * BACKOFF_SPEED_FACTOR;
            }
            (velocity, self.try_attack())
        } else {
            (direction * speed, false)
        };

        Steering {
            velocity: Some(velocity),
            yaw: facing(direction),
            attack,
        }
    }

    fn chase_melee(&mut self, position: Vec3, target: Vec3, distance: f32) -> Steering {
        let direction = flat_direction(position, target);

        let (velocity, attack) = if distance <= self.profile.attack_range {
            (Vec3::ZERO, self.try_attack())
        } else {
            let multiplier = if distance < MELEE_CLOSE_DISTANCE {
                MELEE_CLOSE_MULTIPLIER
            } else if distance > MELEE_FAR_DISTANCE {
                MELEE_FAR_MULTIPLIER
            } else {
                1.0
            };
            (direction * self.profile.move_speed * multiplier, false)
        };

        Steering {
            velocity: Some(velocity),
            yaw: facing(direction),
            attack,
        }
    }

    fn chase_flying(&mut self, position: Vec3, target: Vec3, distance: f32) -> Steering {
        if distance <= self.profile.attack_range {
            return Steering {
                velocity: Some(Vec3::ZERO),
                yaw: facing(flat_direction(position, target)),
                attack: self.try_attack(),
            };
        }

        let direction = (target - position).normalize_or_zero();
        Steering {
            velocity: Some(direction * self.profile.move_speed),
            yaw: facing(direction),
            attack: false,
        }
    }
}

/// Unit direction from `from` to `to` in the XZ plane, zero when they share
/// a column.
fn flat_direction(from: Vec3, to: Vec3) -> Vec3 {
    let mut direction = to - from;
    direction.y = 0.0;
    direction.normalize_or_zero()
}

fn facing(direction: Vec3) -> Option<f32> {
    if direction.x == 0.0 && direction.z == 0.0 {
        return None;
    }
    Some(direction.z.atan2(direction.x).rem_euclid(TAU))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAYER: EntityId = EntityId(0);

    fn chasing(species: Species) -> Monster {
        let mut monster = Monster::new(species);
        monster.set_target(PLAYER);
        monster
    }

    #[test]
    fn test_species_profiles() {
        let imp = Species::Imp.profile();
        assert!(imp.ranged);
        assert_eq!(imp.attack_range, 7.0);
        assert_eq!(Species::Demon.profile().damage, 15.0);
        let caco = Species::Cacodemon.profile();
        assert_eq!(caco.health, 400.0);
        assert_eq!(caco.movement, MovementMode::Flying);
    }

    #[test]
    fn test_idle_wakes_when_target_in_sight() {
        let mut monster = Monster::new(Species::Demon);
        monster.target = Some(PLAYER);
        monster.think(0.1, Vec3::ZERO, Some(Vec3::new(20.0, 0.0, 0.0)));
        assert_eq!(monster.state, MonsterState::Idle, "Target is beyond sight range");
        monster.think(0.1, Vec3::ZERO, Some(Vec3::new(10.0, 0.0, 0.0)));
        assert_eq!(monster.state, MonsterState::Chase);
    }

    #[test]
    fn test_chase_loses_distant_target() {
        let mut monster = chasing(Species::Demon);
        let steering = monster.think(0.1, Vec3::ZERO, Some(Vec3::new(30.0, 0.0, 0.0)));
        assert_eq!(monster.state, MonsterState::Idle);
        assert_eq!(monster.target, None);
        assert_eq!(steering, Steering::default());
    }

    #[test]
    fn test_missing_target_returns_to_idle() {
        let mut monster = chasing(Species::Imp);
        monster.think(0.1, Vec3::ZERO, None);
        assert_eq!(monster.state, MonsterState::Idle);
        assert_eq!(monster.target, None);
    }

    #[test]
    fn test_melee_speed_multipliers() {
        let mut demon = chasing(Species::Demon);
        let far = demon.think(0.1, Vec3::ZERO, Some(Vec3::new(8.0, 0.0, 0.0)));
        assert!((far.velocity.unwrap().x - 3.6).abs() < 1e-5);

        let mid = demon.think(0.1, Vec3::ZERO, Some(Vec3::new(4.0, 0.0, 0.0)));
        assert!((mid.velocity.unwrap().x - 3.0).abs() < 1e-5);

        let close = demon.think(0.1, Vec3::ZERO, Some(Vec3::new(2.5, 0.0, 0.0)));
        assert!((close.velocity.unwrap().x - 2.4).abs() < 1e-5);
    }

    #[test]
    fn test_melee_attack_respects_cooldown() {
        let mut demon = chasing(Species::Demon);
        let target = Some(Vec3::new(1.0, 0.0, 0.0));
        let first = demon.think(0.1, Vec3::ZERO, target);
        assert!(first.attack);
        assert_eq!(first.velocity, Some(Vec3::ZERO));

        let second = demon.think(0.1, Vec3::ZERO, target);
        assert!(!second.attack, "Cooldown of 1/1.5 s should still be running");

        let attacked_again = (0..7).any(|_| demon.think(0.1, Vec3::ZERO, target).attack);
        assert!(attacked_again, "Should attack again once the cooldown expires");
    }

    #[test]
    fn test_ranged_backs_away_when_too_close() {
        let mut imp = chasing(Species::Imp);
        let steering = imp.think(0.1, Vec3::ZERO, Some(Vec3::new(2.0, 0.0, 0.0)));
        let velocity = steering.velocity.unwrap();
        assert!((velocity.x + 2.0).abs() < 1e-5, "Should retreat at 0.8 speed, got {velocity:?}");
        assert!(steering.attack);
    }

    #[test]
    fn test_ranged_strafe_flips_on_timer() {
        let mut imp = chasing(Species::Imp);
        let target = Some(Vec3::new(6.5, 0.0, 0.0));
        let first = imp.think(0.1, Vec3::ZERO, target).velocity.unwrap();
        assert!((first.z - 1.5).abs() < 1e-5, "Strafe at 0.6 speed, got {first:?}");
        assert_eq!(first.x, 0.0, "No backoff beyond preferred range");

        imp.strafe.advance(STRAFE_HALF_PERIOD);
        let flipped = imp.think(0.1, Vec3::ZERO, target).velocity.unwrap();
        assert!((flipped.z + 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_ranged_approaches_from_afar() {
        let mut imp = chasing(Species::Imp);
        let steering = imp.think(0.1, Vec3::ZERO, Some(Vec3::new(0.0, 0.0, 10.0)));
        assert!((steering.velocity.unwrap().z - 2.5).abs() < 1e-5);
        assert!(!steering.attack);
        let yaw = steering.yaw.unwrap();
        assert!((yaw - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_flyer_chases_in_3d() {
        let mut caco = chasing(Species::Cacodemon);
        let steering = caco.think(0.1, Vec3::ZERO, Some(Vec3::new(0.0, 13.0, 0.0)));
        let velocity = steering.velocity.unwrap();
        assert!((velocity.y - 3.0).abs() < 1e-5, "Flyers should climb towards the target");
        assert_eq!(steering.yaw, None, "Straight up has no heading");

        let in_range = caco.think(0.1, Vec3::ZERO, Some(Vec3::new(5.0, 2.0, 0.0)));
        assert_eq!(in_range.velocity, Some(Vec3::ZERO));
        assert!(in_range.attack);
    }

    #[test]
    fn test_damage_and_death() {
        let mut imp = Monster::new(Species::Imp);
        assert_eq!(imp.take_damage(10.0, Some(EntityId(9))), DamageOutcome::Survived);
        assert_eq!(imp.target, Some(EntityId(9)));
        assert_eq!(imp.state, MonsterState::Chase);

        assert_eq!(imp.take_damage(100.0, None), DamageOutcome::Killed);
        assert_eq!(imp.health, 0.0);
        assert_eq!(imp.take_damage(5.0, None), DamageOutcome::Ignored);
        assert_eq!(imp.think(0.1, Vec3::ZERO, Some(Vec3::X)), Steering::default());
    }

    #[test]
    fn test_strafe_timer_phase() {
        let mut timer = StrafeTimer::new(1.5);
        assert_eq!(timer.sign(), 1.0);
        timer.advance(1.0);
        assert_eq!(timer.sign(), -1.0);
        timer.advance(2.0);
        assert_eq!(timer.sign(), 1.0);
    }
}
