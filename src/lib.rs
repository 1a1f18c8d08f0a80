//! Void Skirmish - real-time 2D space battles
//!
//! Core modules:
//! - `sim`: Deterministic simulation (pooling, broad-phase, combat, progression)
//! - `session`: Fixed-step host driver and snapshot handoff
//! - `settings`: Player-facing quality presets
//! - `platform`: Browser bindings (wasm32 only)

pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use session::{Session, Snapshot};
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Largest frame delta the host feeds into the accumulator
    pub const MAX_FRAME_DT: f32 = 0.25;

    /// Default world dimensions
    pub const WORLD_WIDTH: f32 = 1600.0;
    pub const WORLD_HEIGHT: f32 = 900.0;

    /// Fallback top speed for ships with no usable stat
    pub const DEFAULT_MAX_SPEED: f32 = 160.0;
    /// Fallback collision radius for ships
    pub const DEFAULT_SHIP_RADIUS: f32 = 12.0;
    /// Fallback collision radius for bullets
    pub const DEFAULT_BULLET_RADIUS: f32 = 2.0;

    /// Default broad-phase cell size (world units)
    pub const DEFAULT_CELL_SIZE: f32 = 64.0;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    if !angle.is_finite() {
        return 0.0;
    }
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Unit vector for a heading angle
#[inline]
pub fn heading_vector(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}

/// Replace NaN/inf with a fallback
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Replace non-finite vector components with zero
#[inline]
pub fn finite_vec(v: Vec2) -> Vec2 {
    Vec2::new(finite_or(v.x, 0.0), finite_or(v.y, 0.0))
}
