//! Host driver
//!
//! Feeds variable frame deltas into a fixed-step accumulator, fires weapons
//! before each step, and hands the renderer a borrowed snapshot of the live
//! collections. Optionally flies every ship itself for attract-mode battles.

use glam::Vec2;
use serde::Serialize;

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS, SIM_DT};
use crate::finite_or;
use crate::sim::weapons::nearest_enemy;
use crate::sim::{
    Bounds, Bullet, DamageEvent, Explosion, HealthHit, KillEvent, Particle, ShieldHit, Ship,
    ShipClass, ShipStats, SimConfig, SimError, SimulationState, StepReport, TeamId, fire_weapons,
    simulate_step,
};

/// Gap between ships in a spawned formation
const FORMATION_SPACING: f32 = 60.0;

/// Demo pilots close to this range, then ease off the throttle
const ENGAGE_RANGE: f32 = 220.0;

/// Demo pilots fire when the target is within this heading error (radians)
const FIRE_CONE: f32 = 0.3;

/// Read-only view of the world for rendering
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub tick: u64,
    pub time: f32,
    pub bounds: Bounds,
    pub ships: &'a [Ship],
    pub bullets: &'a [Bullet],
    pub explosions: &'a [Explosion],
    pub shield_hits: &'a [ShieldHit],
    pub health_hits: &'a [HealthHit],
    pub particles: &'a [Particle],
}

/// Events produced since the last drain
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionEvents {
    pub damage: Vec<DamageEvent>,
    pub kills: Vec<KillEvent>,
}

/// One battle and its frame clock
pub struct Session {
    pub state: SimulationState,
    pub config: SimConfig,
    pub bounds: Bounds,
    /// Let the built-in pilot fly every ship
    pub demo_mode: bool,
    accumulator: f32,
}

impl Session {
    pub fn new(seed: u64, config: SimConfig, bounds: Bounds) -> Self {
        log::info!(
            "session seed {} ({}x{} world)",
            seed,
            bounds.width,
            bounds.height
        );
        Self {
            state: SimulationState::new(seed, &config.pools),
            config,
            bounds,
            demo_mode: false,
            accumulator: 0.0,
        }
    }

    /// Start over with a fresh world, keeping config and bounds
    pub fn restart(&mut self, seed: u64) {
        self.state = SimulationState::new(seed, &self.config.pools);
        self.accumulator = 0.0;
    }

    /// Feed one frame's elapsed time. Returns the number of steps run.
    pub fn advance(&mut self, frame_dt: f32) -> Result<u32, SimError> {
        let frame_dt = finite_or(frame_dt, 0.0).clamp(0.0, MAX_FRAME_DT);
        self.accumulator += frame_dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            self.step()?;
            self.accumulator -= SIM_DT;
            substeps += 1;
        }

        // Drop the backlog rather than spiral
        if self.accumulator >= SIM_DT {
            log::debug!("dropping {:.3}s of simulation backlog", self.accumulator);
            self.accumulator = 0.0;
        }
        Ok(substeps)
    }

    /// Run exactly one fixed step
    pub fn step(&mut self) -> Result<StepReport, SimError> {
        if self.demo_mode {
            pilot_fleet(&mut self.state);
        }
        fire_weapons(&mut self.state, SIM_DT)?;
        simulate_step(&mut self.state, &self.config, SIM_DT, self.bounds)
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        let state = &self.state;
        Snapshot {
            tick: state.tick,
            time: state.time,
            bounds: self.bounds,
            ships: &state.ships,
            bullets: &state.bullets,
            explosions: &state.explosions,
            shield_hits: &state.shield_hits,
            health_hits: &state.health_hits,
            particles: &state.particles,
        }
    }

    pub fn drain_events(&mut self) -> SessionEvents {
        SessionEvents {
            damage: self.state.drain_damage_events(),
            kills: self.state.drain_kill_events(),
        }
    }

    /// Spawn a column of ships centered on `anchor`, all facing `facing`
    pub fn spawn_fleet(
        &mut self,
        team: TeamId,
        classes: &[ShipClass],
        anchor: Vec2,
        facing: f32,
    ) -> Vec<u32> {
        let across = Vec2::from_angle(facing).perp();
        let half = (classes.len() as f32 - 1.0) * 0.5;
        classes
            .iter()
            .enumerate()
            .map(|(i, class)| {
                let pos = anchor + across * ((i as f32 - half) * FORMATION_SPACING);
                self.state
                    .spawn_ship(team, &ShipStats::for_class(*class), pos, facing)
            })
            .collect()
    }

    /// The last team standing, if only one remains
    pub fn winner(&self) -> Option<TeamId> {
        match self.state.team_counts().as_slice() {
            [(team, _)] => Some(*team),
            _ => None,
        }
    }
}

/// Point every ship at its nearest enemy, close in and hold the trigger when lined up
fn pilot_fleet(state: &mut SimulationState) {
    let orders: Vec<Option<Vec2>> = state
        .ships
        .iter()
        .map(|ship| nearest_enemy(&state.ships, ship.team, ship.pos, f32::INFINITY))
        .collect();

    for (ship, target) in state.ships.iter_mut().zip(orders) {
        let Some(target) = target else {
            ship.target_heading = None;
            ship.steering = 0.0;
            ship.throttle = 0.0;
            ship.firing = false;
            continue;
        };

        let to_target = target - ship.pos;
        let desired = to_target.to_angle();
        let error = crate::normalize_angle(desired - ship.angle).abs();

        ship.target_heading = Some(desired);
        ship.steering = 1.0;
        ship.throttle = if to_target.length() > ENGAGE_RANGE { 1.0 } else { 0.3 };
        ship.firing = error < FIRE_CONE;
    }
}
