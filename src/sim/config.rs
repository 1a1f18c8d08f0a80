//! Simulation tuning
//!
//! Read-only for the duration of a tick. Loaded from JSON by the host and
//! validated once at load time; the step never re-checks it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::pool::{OverflowPolicy, PoolKind};
use crate::consts::DEFAULT_CELL_SIZE;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("cell size must be positive, got {0}")]
    InvalidCellSize(f32),
    #[error("friction must be in (0, 1], got {0}")]
    InvalidFriction(f32),
    #[error("xp curve must start positive and never shrink (base {base}, growth {growth})")]
    InvalidXpCurve { base: f32, growth: f32 },
    #[error("{0} pool uses the error policy with zero capacity")]
    ZeroCapacity(PoolKind),
}

/// What happens to an entity that leaves the world rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    #[default]
    Wrap,
    Bounce,
    Remove,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub ships: BoundaryPolicy,
    pub bullets: BoundaryPolicy,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            ships: BoundaryPolicy::Wrap,
            bullets: BoundaryPolicy::Remove,
        }
    }
}

/// Per-level boost fraction; the applied factor is `1 + at(level)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BoostScalar {
    Constant(f32),
    Linear { base: f32, per_level: f32 },
}

impl BoostScalar {
    pub fn at(&self, level: u32) -> f32 {
        match *self {
            BoostScalar::Constant(v) => v,
            BoostScalar::Linear { base, per_level } => base + per_level * level as f32,
        }
    }

    pub fn factor(&self, level: u32) -> f32 {
        1.0 + self.at(level)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelBoosts {
    pub hp: BoostScalar,
    pub shield: BoostScalar,
    pub damage: BoostScalar,
    pub speed: BoostScalar,
    pub regen: BoostScalar,
}

impl Default for LevelBoosts {
    fn default() -> Self {
        Self {
            hp: BoostScalar::Constant(0.10),
            shield: BoostScalar::Constant(0.10),
            damage: BoostScalar::Constant(0.05),
            speed: BoostScalar::Constant(0.03),
            regen: BoostScalar::Constant(0.05),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    pub xp_per_damage: f32,
    pub xp_per_kill: f32,
    /// XP needed to leave level 1
    pub xp_base: f32,
    /// Multiplier on the threshold for each further level
    pub xp_growth: f32,
    pub boosts: LevelBoosts,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_per_damage: 1.0,
            xp_per_kill: 25.0,
            xp_base: 100.0,
            xp_growth: 1.5,
            boosts: LevelBoosts::default(),
        }
    }
}

impl ProgressionConfig {
    /// XP required to advance from `level` to `level + 1`
    pub fn xp_to_level(&self, level: u32) -> f32 {
        let steps = level.saturating_sub(1).min(i32::MAX as u32) as i32;
        self.xp_base * self.xp_growth.powi(steps)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    pub capacity: usize,
    pub overflow: OverflowPolicy,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            capacity: 256,
            overflow: OverflowPolicy::Grow,
        }
    }
}

impl PoolSettings {
    pub fn new(capacity: usize, overflow: OverflowPolicy) -> Self {
        Self { capacity, overflow }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub bullets: PoolSettings,
    pub explosions: PoolSettings,
    pub shield_hits: PoolSettings,
    pub health_hits: PoolSettings,
    pub particles: PoolSettings,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            bullets: PoolSettings::new(2048, OverflowPolicy::Grow),
            explosions: PoolSettings::new(256, OverflowPolicy::Grow),
            shield_hits: PoolSettings::new(256, OverflowPolicy::Grow),
            health_hits: PoolSettings::new(256, OverflowPolicy::Grow),
            particles: PoolSettings::new(1024, OverflowPolicy::Grow),
        }
    }
}

impl PoolConfig {
    pub fn settings(&self, kind: PoolKind) -> PoolSettings {
        match kind {
            PoolKind::Bullet => self.bullets,
            PoolKind::Explosion => self.explosions,
            PoolKind::ShieldHit => self.shield_hits,
            PoolKind::HealthHit => self.health_hits,
            PoolKind::Particle => self.particles,
        }
    }

    /// Apply one size and policy to explosions and both hit markers
    pub fn set_effect_pool(&mut self, capacity: usize, overflow: OverflowPolicy) {
        let settings = PoolSettings::new(capacity, overflow);
        self.explosions = settings;
        self.shield_hits = settings;
        self.health_hits = settings;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Seconds an explosion stays visible
    pub explosion_life: f32,
    /// Explosion radius as a multiple of the destroyed ship's radius
    pub explosion_scale: f32,
    /// Seconds a shield/health hit marker stays visible
    pub hit_marker_life: f32,
    /// Debris particles per kill
    pub debris_particles: u32,
    pub debris_speed: f32,
    /// Particles per carrier launch
    pub launch_particles: u32,
    pub particle_life: f32,
}

impl Default for EffectsConfig {
    fn default() -> Self {
        Self {
            explosion_life: 0.6,
            explosion_scale: 2.0,
            hit_marker_life: 0.4,
            debris_particles: 6,
            debris_speed: 90.0,
            launch_particles: 4,
            particle_life: 0.8,
        }
    }
}

/// Full simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub boundary: BoundaryConfig,
    /// Velocity multiplier applied once per tick
    pub friction: f32,
    /// Broad-phase bucket size
    pub cell_size: f32,
    pub progression: ProgressionConfig,
    pub pools: PoolConfig,
    pub effects: EffectsConfig,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            boundary: BoundaryConfig::default(),
            friction: 0.99,
            cell_size: DEFAULT_CELL_SIZE,
            progression: ProgressionConfig::default(),
            pools: PoolConfig::default(),
            effects: EffectsConfig::default(),
        }
    }
}

impl SimConfig {
    /// Parse and validate
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::InvalidCellSize(self.cell_size));
        }
        if !(self.friction > 0.0 && self.friction <= 1.0) {
            return Err(ConfigError::InvalidFriction(self.friction));
        }
        let progression = &self.progression;
        if !(progression.xp_base.is_finite()
            && progression.xp_base > 0.0
            && progression.xp_growth.is_finite()
            && progression.xp_growth >= 1.0)
        {
            return Err(ConfigError::InvalidXpCurve {
                base: progression.xp_base,
                growth: progression.xp_growth,
            });
        }
        for kind in PoolKind::ALL {
            let settings = self.pools.settings(kind);
            if settings.capacity == 0 && settings.overflow == OverflowPolicy::Error {
                return Err(ConfigError::ZeroCapacity(kind));
            }
        }
        Ok(())
    }
}
