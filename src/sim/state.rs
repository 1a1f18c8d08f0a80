//! Simulation state and entity types
//!
//! Everything the step mutates lives in [`SimulationState`]. Pools and the grid
//! cache are owned here as well, so two simulations in one process never share
//! bookkeeping.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::config::PoolConfig;
use super::grid::GridPool;
use super::pool::{Pool, PoolError, PoolKind, PoolManager, PoolStats, Poolable};
use crate::consts::*;
use crate::{finite_or, finite_vec, normalize_angle};

/// Team tag
pub type TeamId = u8;

/// Hull classes with built-in stat tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShipClass {
    Fighter,
    Corvette,
    Frigate,
    Destroyer,
    Carrier,
}

impl ShipClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipClass::Fighter => "fighter",
            ShipClass::Corvette => "corvette",
            ShipClass::Frigate => "frigate",
            ShipClass::Destroyer => "destroyer",
            ShipClass::Carrier => "carrier",
        }
    }
}

/// A forward-mounted gun (also the gun inside a turret)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cannon {
    pub damage: f32,
    /// Shots per second
    pub fire_rate: f32,
    /// Max deviation from the aim direction (radians)
    pub spread: f32,
    pub muzzle_speed: f32,
    pub bullet_radius: f32,
    /// Bullet time-to-live (seconds)
    pub bullet_ttl: f32,
    /// Seconds until the next shot
    #[serde(default)]
    pub cooldown: f32,
}

impl Cannon {
    pub fn new(damage: f32, fire_rate: f32, muzzle_speed: f32) -> Self {
        Self {
            damage,
            fire_rate,
            spread: 0.04,
            muzzle_speed,
            bullet_radius: DEFAULT_BULLET_RADIUS,
            bullet_ttl: 1.5,
            cooldown: 0.0,
        }
    }

    /// Seconds between shots
    pub fn interval(&self) -> f32 {
        if self.fire_rate > 0.0 {
            1.0 / self.fire_rate
        } else {
            f32::INFINITY
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetingMode {
    /// Fire along the hull heading while the trigger is held
    #[default]
    Forward,
    /// Track the closest enemy in range
    Nearest,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Turret {
    /// Mount point in hull space (x forward)
    pub mount: Vec2,
    #[serde(default)]
    pub targeting: TargetingMode,
    pub range: f32,
    pub cannon: Cannon,
}

/// Fighter launch bookkeeping for carriers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarrierBay {
    pub fighter: ShipClass,
    pub max_fighters: u32,
    /// Seconds between launches
    pub launch_interval: f32,
    #[serde(default)]
    pub cooldown: f32,
}

/// Stat table used to build a ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipStats {
    pub class: ShipClass,
    pub max_hp: f32,
    pub max_shield: f32,
    pub shield_regen: f32,
    pub armor: f32,
    pub accel: f32,
    pub turn_rate: f32,
    pub max_speed: f32,
    pub radius: f32,
    #[serde(default)]
    pub cannons: Vec<Cannon>,
    #[serde(default)]
    pub turrets: Vec<Turret>,
    #[serde(default)]
    pub carrier: Option<CarrierBay>,
}

impl ShipStats {
    /// Built-in defaults for a hull class
    pub fn for_class(class: ShipClass) -> Self {
        let light = Cannon {
            spread: 0.05,
            bullet_ttl: 1.2,
            ..Cannon::new(3.0, 4.0, 420.0)
        };
        let medium = Cannon {
            bullet_radius: 3.0,
            ..Cannon::new(8.0, 1.5, 360.0)
        };
        let heavy = Cannon {
            spread: 0.02,
            bullet_radius: 4.0,
            bullet_ttl: 2.0,
            ..Cannon::new(18.0, 0.6, 320.0)
        };
        let point_defense = |mount: Vec2| Turret {
            mount,
            targeting: TargetingMode::Nearest,
            range: 260.0,
            cannon: light,
        };

        match class {
            ShipClass::Fighter => Self {
                class,
                max_hp: 15.0,
                max_shield: 0.0,
                shield_regen: 0.0,
                armor: 0.0,
                accel: 220.0,
                turn_rate: 4.0,
                max_speed: 200.0,
                radius: 8.0,
                cannons: vec![light],
                turrets: Vec::new(),
                carrier: None,
            },
            ShipClass::Corvette => Self {
                class,
                max_hp: 40.0,
                max_shield: 20.0,
                shield_regen: 2.0,
                armor: 1.0,
                accel: 160.0,
                turn_rate: 3.0,
                max_speed: 170.0,
                radius: 12.0,
                cannons: vec![light, light],
                turrets: Vec::new(),
                carrier: None,
            },
            ShipClass::Frigate => Self {
                class,
                max_hp: 90.0,
                max_shield: 50.0,
                shield_regen: 4.0,
                armor: 2.0,
                accel: 110.0,
                turn_rate: 2.0,
                max_speed: 140.0,
                radius: 18.0,
                cannons: vec![medium],
                turrets: vec![point_defense(Vec2::new(-6.0, 0.0))],
                carrier: None,
            },
            ShipClass::Destroyer => Self {
                class,
                max_hp: 180.0,
                max_shield: 90.0,
                shield_regen: 6.0,
                armor: 4.0,
                accel: 80.0,
                turn_rate: 1.4,
                max_speed: 110.0,
                radius: 26.0,
                cannons: vec![heavy, heavy],
                turrets: vec![
                    point_defense(Vec2::new(8.0, 10.0)),
                    point_defense(Vec2::new(8.0, -10.0)),
                ],
                carrier: None,
            },
            ShipClass::Carrier => Self {
                class,
                max_hp: 260.0,
                max_shield: 140.0,
                shield_regen: 8.0,
                armor: 5.0,
                accel: 50.0,
                turn_rate: 0.8,
                max_speed: 80.0,
                radius: 36.0,
                cannons: Vec::new(),
                turrets: vec![
                    point_defense(Vec2::new(0.0, 18.0)),
                    point_defense(Vec2::new(0.0, -18.0)),
                ],
                carrier: Some(CarrierBay {
                    fighter: ShipClass::Fighter,
                    max_fighters: 4,
                    launch_interval: 3.0,
                    cooldown: 1.0,
                }),
            },
        }
    }
}

/// A combat unit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub id: u32,
    pub team: TeamId,
    pub class: ShipClass,
    pub pos: Vec2,
    pub vel: Vec2,
    /// Heading (radians, [-π, π))
    pub angle: f32,
    pub accel: f32,
    /// Radians per second at full steering
    pub turn_rate: f32,
    pub max_speed: f32,
    /// Per-ship override for the global friction multiplier
    #[serde(default)]
    pub friction: Option<f32>,
    pub hp: f32,
    pub max_hp: f32,
    pub shield: f32,
    pub max_shield: f32,
    pub shield_regen: f32,
    pub hp_percent: f32,
    pub shield_percent: f32,
    /// Carried for stat readouts; damage does not consult it
    pub armor: f32,
    pub cannons: Vec<Cannon>,
    pub turrets: Vec<Turret>,
    pub xp: f32,
    pub level: u32,
    pub radius: f32,

    // Pilot commands, written by AI/input between ticks
    /// Turn command in [-1, 1]; positive turns counter-clockwise
    #[serde(default)]
    pub steering: f32,
    /// Optional heading to steer toward instead of turning freely
    #[serde(default)]
    pub target_heading: Option<f32>,
    /// Thrust command in [0, 1]
    #[serde(default)]
    pub throttle: f32,
    #[serde(default)]
    pub firing: bool,

    /// Carrier that launched this ship
    #[serde(default)]
    pub parent_id: Option<u32>,
    #[serde(default)]
    pub carrier: Option<CarrierBay>,
}

impl Ship {
    pub fn new(id: u32, team: TeamId, stats: &ShipStats, pos: Vec2, angle: f32) -> Self {
        let mut ship = Self {
            id,
            team,
            class: stats.class,
            pos,
            vel: Vec2::ZERO,
            angle,
            accel: stats.accel,
            turn_rate: stats.turn_rate,
            max_speed: stats.max_speed,
            friction: None,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            shield: stats.max_shield,
            max_shield: stats.max_shield,
            shield_regen: stats.shield_regen,
            hp_percent: 100.0,
            shield_percent: 0.0,
            armor: stats.armor,
            cannons: stats.cannons.clone(),
            turrets: stats.turrets.clone(),
            xp: 0.0,
            level: 1,
            radius: stats.radius,
            steering: 0.0,
            target_heading: None,
            throttle: 0.0,
            firing: false,
            parent_id: None,
            carrier: stats.carrier,
        };
        ship.sanitize();
        ship
    }

    /// Replace unusable numeric fields with fallbacks
    pub fn sanitize(&mut self) {
        self.pos = finite_vec(self.pos);
        self.vel = finite_vec(self.vel);
        self.angle = normalize_angle(self.angle);
        self.accel = finite_or(self.accel, 0.0);
        self.turn_rate = finite_or(self.turn_rate, 0.0);
        self.max_speed = match self.max_speed {
            s if s.is_finite() && s > 0.0 => s,
            _ => DEFAULT_MAX_SPEED,
        };
        self.radius = match self.radius {
            r if r.is_finite() && r > 0.0 => r,
            _ => DEFAULT_SHIP_RADIUS,
        };
        self.max_hp = finite_or(self.max_hp, 0.0).max(0.0);
        self.hp = finite_or(self.hp, 0.0);
        self.max_shield = finite_or(self.max_shield, 0.0).max(0.0);
        self.shield = finite_or(self.shield, 0.0).clamp(0.0, self.max_shield);
        self.shield_regen = finite_or(self.shield_regen, 0.0);
        self.steering = finite_or(self.steering, 0.0).clamp(-1.0, 1.0);
        self.throttle = finite_or(self.throttle, 0.0).clamp(0.0, 1.0);
        self.xp = finite_or(self.xp, 0.0);
        self.level = self.level.max(1);
        self.refresh_percentages();
    }

    /// Recompute `hp_percent` / `shield_percent` (0-100)
    pub fn refresh_percentages(&mut self) {
        self.hp_percent = if self.max_hp > 0.0 {
            self.hp / self.max_hp * 100.0
        } else {
            0.0
        };
        self.shield_percent = if self.max_shield > 0.0 {
            self.shield / self.max_shield * 100.0
        } else {
            0.0
        };
    }

    pub fn is_dead(&self) -> bool {
        self.hp <= 0.0
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// Arguments for firing a bullet
#[derive(Debug, Clone, Copy)]
pub struct BulletSpec {
    pub owner_id: u32,
    pub team: TeamId,
    pub pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    pub ttl: f32,
    pub radius: f32,
}

/// A projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub owner_id: u32,
    pub team: TeamId,
    pub pos: Vec2,
    /// Position at the start of the current tick (swept tests)
    pub prev_pos: Vec2,
    pub vel: Vec2,
    pub damage: f32,
    /// Seconds left
    pub ttl: f32,
    pub radius: f32,
    pub alive: bool,
}

impl Poolable for Bullet {
    type Init = BulletSpec;
    const KIND: PoolKind = PoolKind::Bullet;

    fn create(spec: BulletSpec) -> Self {
        let pos = finite_vec(spec.pos);
        Self {
            id: 0,
            owner_id: spec.owner_id,
            team: spec.team,
            pos,
            prev_pos: pos,
            vel: finite_vec(spec.vel),
            damage: finite_or(spec.damage, 0.0).max(0.0),
            ttl: finite_or(spec.ttl, 0.0),
            radius: match spec.radius {
                r if r.is_finite() && r > 0.0 => r,
                _ => DEFAULT_BULLET_RADIUS,
            },
            alive: true,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn retire(&mut self) {
        self.alive = false;
    }

    fn pool(pools: &mut PoolManager) -> &mut Pool<Self> {
        &mut pools.bullets
    }
}

/// Arguments for an explosion
#[derive(Debug, Clone, Copy)]
pub struct ExplosionSpec {
    pub pos: Vec2,
    pub radius: f32,
    pub life: f32,
    pub team: TeamId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explosion {
    pub pos: Vec2,
    pub radius: f32,
    pub life: f32,
    pub max_life: f32,
    pub team: TeamId,
    pub alive: bool,
}

impl Poolable for Explosion {
    type Init = ExplosionSpec;
    const KIND: PoolKind = PoolKind::Explosion;

    fn create(spec: ExplosionSpec) -> Self {
        Self {
            pos: spec.pos,
            radius: spec.radius,
            life: spec.life,
            max_life: spec.life,
            team: spec.team,
            alive: true,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn retire(&mut self) {
        self.alive = false;
    }

    fn pool(pools: &mut PoolManager) -> &mut Pool<Self> {
        &mut pools.explosions
    }
}

/// Arguments for a shield or health hit marker
#[derive(Debug, Clone, Copy)]
pub struct HitSpec {
    pub pos: Vec2,
    pub team: TeamId,
    pub target_id: u32,
    pub amount: f32,
    pub life: f32,
}

/// Damage soaked by a shield
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShieldHit {
    pub pos: Vec2,
    pub team: TeamId,
    pub target_id: u32,
    pub amount: f32,
    pub life: f32,
    pub alive: bool,
}

impl Poolable for ShieldHit {
    type Init = HitSpec;
    const KIND: PoolKind = PoolKind::ShieldHit;

    fn create(spec: HitSpec) -> Self {
        Self {
            pos: spec.pos,
            team: spec.team,
            target_id: spec.target_id,
            amount: spec.amount,
            life: spec.life,
            alive: true,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn retire(&mut self) {
        self.alive = false;
    }

    fn pool(pools: &mut PoolManager) -> &mut Pool<Self> {
        &mut pools.shield_hits
    }
}

/// Damage that reached the hull
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthHit {
    pub pos: Vec2,
    pub team: TeamId,
    pub target_id: u32,
    pub amount: f32,
    pub life: f32,
    pub alive: bool,
}

impl Poolable for HealthHit {
    type Init = HitSpec;
    const KIND: PoolKind = PoolKind::HealthHit;

    fn create(spec: HitSpec) -> Self {
        Self {
            pos: spec.pos,
            team: spec.team,
            target_id: spec.target_id,
            amount: spec.amount,
            life: spec.life,
            alive: true,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn retire(&mut self) {
        self.alive = false;
    }

    fn pool(pools: &mut PoolManager) -> &mut Pool<Self> {
        &mut pools.health_hits
    }
}

/// Arguments for a particle
#[derive(Debug, Clone, Copy)]
pub struct ParticleSpec {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub size: f32,
    pub team: TeamId,
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    pub team: TeamId,
    pub alive: bool,
}

impl Poolable for Particle {
    type Init = ParticleSpec;
    const KIND: PoolKind = PoolKind::Particle;

    fn create(spec: ParticleSpec) -> Self {
        Self {
            pos: spec.pos,
            vel: spec.vel,
            life: spec.life,
            max_life: spec.life,
            size: spec.size,
            team: spec.team,
            alive: true,
        }
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn retire(&mut self) {
        self.alive = false;
    }

    fn pool(pools: &mut PoolManager) -> &mut Pool<Self> {
        &mut pools.particles
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DamageKind {
    Shield,
    Hp,
}

/// One damage component applied by a bullet
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub target_id: u32,
    #[serde(rename = "type")]
    pub kind: DamageKind,
    pub amount: f32,
    pub position: Vec2,
    /// Team of the damaged ship
    pub team: TeamId,
    pub attacker_id: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KillEvent {
    pub victim_id: u32,
    pub victim_team: TeamId,
    pub victim_class: ShipClass,
    pub attacker_id: Option<u32>,
    pub position: Vec2,
}

/// World rectangle with its origin at (0, 0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(WORLD_WIDTH, WORLD_HEIGHT)
    }
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.x <= self.width && pos.y >= 0.0 && pos.y <= self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width * 0.5, self.height * 0.5)
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Generator for one tick, reproducible from (seed, tick)
    pub fn tick_rng(&self, tick: u64) -> Pcg32 {
        self.stream_rng(tick, 0)
    }

    /// Independent generator per (tick, stream) so subsystems don't share draws
    pub fn stream_rng(&self, tick: u64, stream: u64) -> Pcg32 {
        let mixed = self.seed
            ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ stream.wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
        Pcg32::seed_from_u64(mixed)
    }
}

/// Root aggregate for one simulation instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    /// Elapsed simulated seconds
    pub time: f32,
    /// Completed ticks
    pub tick: u64,
    pub ships: Vec<Ship>,
    pub bullets: Vec<Bullet>,
    pub explosions: Vec<Explosion>,
    pub shield_hits: Vec<ShieldHit>,
    pub health_hits: Vec<HealthHit>,
    pub particles: Vec<Particle>,
    /// Drained by the host between ticks
    pub damage_events: Vec<DamageEvent>,
    pub kill_events: Vec<KillEvent>,
    pub rng_state: RngState,
    #[serde(skip)]
    pub pools: PoolManager,
    #[serde(skip)]
    pub(crate) grids: GridPool<usize>,
    next_id: u32,
}

impl SimulationState {
    pub fn new(seed: u64, pools: &PoolConfig) -> Self {
        Self {
            time: 0.0,
            tick: 0,
            ships: Vec::new(),
            bullets: Vec::new(),
            explosions: Vec::new(),
            shield_hits: Vec::new(),
            health_hits: Vec::new(),
            particles: Vec::new(),
            damage_events: Vec::new(),
            kill_events: Vec::new(),
            rng_state: RngState::new(seed),
            pools: PoolManager::new(pools),
            grids: GridPool::default(),
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Build a ship from a stat table and add it to the live set
    pub fn spawn_ship(&mut self, team: TeamId, stats: &ShipStats, pos: Vec2, angle: f32) -> u32 {
        let id = self.next_entity_id();
        self.ships.push(Ship::new(id, team, stats, pos, angle));
        id
    }

    pub fn ship(&self, id: u32) -> Option<&Ship> {
        self.ships.iter().find(|s| s.id == id)
    }

    pub fn ship_mut(&mut self, id: u32) -> Option<&mut Ship> {
        self.ships.iter_mut().find(|s| s.id == id)
    }

    /// Acquire a bullet from the pool and add it to the live set
    pub fn spawn_bullet(&mut self, spec: BulletSpec) -> Result<u32, PoolError> {
        let mut bullet: Bullet = self.pools.acquire(spec)?;
        bullet.id = self.next_entity_id();
        let id = bullet.id;
        self.bullets.push(bullet);
        Ok(id)
    }

    pub fn spawn_explosion(&mut self, spec: ExplosionSpec) -> Result<(), PoolError> {
        let explosion = self.pools.acquire(spec)?;
        self.explosions.push(explosion);
        Ok(())
    }

    pub fn spawn_shield_hit(&mut self, spec: HitSpec) -> Result<(), PoolError> {
        let hit = self.pools.acquire(spec)?;
        self.shield_hits.push(hit);
        Ok(())
    }

    pub fn spawn_health_hit(&mut self, spec: HitSpec) -> Result<(), PoolError> {
        let hit = self.pools.acquire(spec)?;
        self.health_hits.push(hit);
        Ok(())
    }

    pub fn spawn_particle(&mut self, spec: ParticleSpec) -> Result<(), PoolError> {
        let particle = self.pools.acquire(spec)?;
        self.particles.push(particle);
        Ok(())
    }

    /// Live ships launched by a carrier
    pub fn live_fighters(&self, carrier_id: u32) -> usize {
        self.ships
            .iter()
            .filter(|s| s.parent_id == Some(carrier_id) && !s.is_dead())
            .count()
    }

    pub fn pool_stats(&self, kind: PoolKind) -> PoolStats {
        self.pools.stats(kind)
    }

    pub fn drain_damage_events(&mut self) -> Vec<DamageEvent> {
        std::mem::take(&mut self.damage_events)
    }

    pub fn drain_kill_events(&mut self) -> Vec<KillEvent> {
        std::mem::take(&mut self.kill_events)
    }

    /// Ships alive per team, sorted by team
    pub fn team_counts(&self) -> Vec<(TeamId, usize)> {
        let mut counts: Vec<(TeamId, usize)> = Vec::new();
        for ship in &self.ships {
            match counts.iter_mut().find(|(team, _)| *team == ship.team) {
                Some((_, n)) => *n += 1,
                None => counts.push((ship.team, 1)),
            }
        }
        counts.sort_by_key(|(team, _)| *team);
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ship_from_class_table() {
        let stats = ShipStats::for_class(ShipClass::Fighter);
        let ship = Ship::new(1, 0, &stats, Vec2::new(5.0, 5.0), 0.0);
        assert_eq!(ship.max_hp, 15.0);
        assert_eq!(ship.hp, 15.0);
        assert_eq!(ship.level, 1);
        assert_eq!(ship.hp_percent, 100.0);
        assert_eq!(ship.shield_percent, 0.0);
    }

    #[test]
    fn test_sanitize_defaults_bad_numbers() {
        let mut stats = ShipStats::for_class(ShipClass::Corvette);
        stats.max_speed = f32::NAN;
        stats.radius = -3.0;
        let mut ship = Ship::new(1, 0, &stats, Vec2::new(f32::NAN, 4.0), f32::INFINITY);
        assert_eq!(ship.max_speed, DEFAULT_MAX_SPEED);
        assert_eq!(ship.radius, DEFAULT_SHIP_RADIUS);
        assert_eq!(ship.pos, Vec2::new(0.0, 4.0));
        assert_eq!(ship.angle, 0.0);

        ship.shield = 1000.0;
        ship.sanitize();
        assert_eq!(ship.shield, ship.max_shield);
        assert_eq!(ship.shield_percent, 100.0);
    }

    #[test]
    fn test_bullet_defaults() {
        let bullet = Bullet::create(BulletSpec {
            owner_id: 1,
            team: 0,
            pos: Vec2::new(1.0, 2.0),
            vel: Vec2::new(f32::NAN, 3.0),
            damage: f32::NAN,
            ttl: 1.0,
            radius: 0.0,
        });
        assert_eq!(bullet.prev_pos, bullet.pos);
        assert_eq!(bullet.vel, Vec2::new(0.0, 3.0));
        assert_eq!(bullet.damage, 0.0);
        assert_eq!(bullet.radius, DEFAULT_BULLET_RADIUS);
        assert!(bullet.alive);
    }

    #[test]
    fn test_spawn_bullet_assigns_ids_and_counts() {
        let mut state = SimulationState::new(7, &PoolConfig::default());
        let spec = BulletSpec {
            owner_id: 1,
            team: 0,
            pos: Vec2::ZERO,
            vel: Vec2::X,
            damage: 1.0,
            ttl: 1.0,
            radius: 2.0,
        };
        let a = state.spawn_bullet(spec).unwrap();
        let b = state.spawn_bullet(spec).unwrap();
        assert_ne!(a, b);
        assert_eq!(state.bullets.len(), 2);
        assert_eq!(state.pool_stats(PoolKind::Bullet).allocated, 2);
    }

    #[test]
    fn test_damage_event_wire_shape() {
        let event = DamageEvent {
            target_id: 3,
            kind: DamageKind::Hp,
            amount: 2.5,
            position: Vec2::new(1.0, 2.0),
            team: 1,
            attacker_id: Some(9),
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["type"], "hp");
        assert_eq!(json["attacker_id"], 9);
    }

    #[test]
    fn test_tick_rng_is_reproducible() {
        use rand::Rng;
        let rng_state = RngState::new(42);
        let a: u32 = rng_state.tick_rng(5).random();
        let b: u32 = rng_state.tick_rng(5).random();
        let c: u32 = rng_state.tick_rng(6).random();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_team_counts() {
        let mut state = SimulationState::new(1, &PoolConfig::default());
        let stats = ShipStats::for_class(ShipClass::Fighter);
        state.spawn_ship(1, &stats, Vec2::ZERO, 0.0);
        state.spawn_ship(0, &stats, Vec2::ZERO, 0.0);
        state.spawn_ship(1, &stats, Vec2::ZERO, 0.0);
        assert_eq!(state.team_counts(), vec![(0, 1), (1, 2)]);
    }
}
