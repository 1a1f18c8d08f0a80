//! Deterministic simulation module
//!
//! All battle logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only, derived per tick
//! - Stable iteration order (insertion order of the live collections)
//! - No rendering or platform dependencies

pub mod boundary;
pub mod carrier;
pub mod collision;
pub mod combat;
pub mod config;
pub mod grid;
pub mod pool;
pub mod state;
pub mod tick;
pub mod weapons;

pub use boundary::{BoundaryOutcome, apply_boundary};
pub use collision::{bullet_hits_ship, circles_overlap, segment_circle_hit};
pub use combat::{HitOutcome, apply_hit, award_xp};
pub use config::{
    BoostScalar, BoundaryConfig, BoundaryPolicy, ConfigError, EffectsConfig, LevelBoosts,
    PoolConfig, PoolSettings, ProgressionConfig, SimConfig,
};
pub use grid::{GridPool, SpatialGrid};
pub use pool::{OverflowPolicy, Pool, PoolError, PoolKind, PoolManager, PoolStats, Poolable};
pub use state::{
    Bounds, Bullet, BulletSpec, Cannon, CarrierBay, DamageEvent, DamageKind, Explosion, HealthHit,
    KillEvent, Particle, ShieldHit, Ship, ShipClass, ShipStats, SimulationState, TargetingMode,
    TeamId, Turret,
};
pub use tick::{SimError, StepReport, simulate_step};
pub use weapons::fire_weapons;
