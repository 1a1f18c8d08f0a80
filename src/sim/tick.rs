//! Fixed timestep simulation step
//!
//! One call advances the world by `dt` seconds in a fixed phase order:
//! effects and bullets, ship kinematics, carrier bays, broad-phase collision
//! with damage and progression, then shield regen. Removals are tombstoned
//! during a phase and compacted once at its end.

use thiserror::Error;

use super::boundary::{BoundaryOutcome, apply_boundary};
use super::carrier::update_carriers;
use super::collision::bullet_hits_ship;
use super::combat::resolve_hit;
use super::config::{BoundaryPolicy, SimConfig};
use super::pool::PoolError;
use super::state::{Bounds, Ship, SimulationState};
use crate::{finite_or, heading_vector, normalize_angle};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimError {
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// What happened during one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Bullets dropped for TTL or leaving the world
    pub bullets_expired: u32,
    pub ships_out_of_bounds: u32,
    pub fighters_launched: u32,
    pub hits: u32,
    pub kills: u32,
}

/// Stable in-place partition. `keep` sees every item once, in order; the
/// rejected items are handed to `release` after the survivors are packed.
pub fn compact<T>(
    items: &mut Vec<T>,
    mut keep: impl FnMut(&mut T) -> bool,
    mut release: impl FnMut(T),
) {
    let mut write = 0;
    for read in 0..items.len() {
        if keep(&mut items[read]) {
            items.swap(write, read);
            write += 1;
        }
    }
    for item in items.drain(write..) {
        release(item);
    }
}

/// Advance the simulation by one step of `dt` seconds.
///
/// `dt` is used as given; callers clamp frame spikes. A pool configured with
/// the `error` policy can abort the step; removals already decided are still
/// compacted before the error is returned.
pub fn simulate_step(
    state: &mut SimulationState,
    config: &SimConfig,
    dt: f32,
    bounds: Bounds,
) -> Result<StepReport, SimError> {
    let dt = finite_or(dt, 0.0).max(0.0);
    let mut report = StepReport::default();
    let mut rng = state.rng_state.tick_rng(state.tick);

    advance_effects(state, dt, bounds);
    report.bullets_expired = advance_bullets(state, config, dt, bounds);
    report.ships_out_of_bounds = advance_ships(state, config, dt, bounds);
    report.fighters_launched = update_carriers(state, config, dt, &mut rng)?;
    resolve_collisions(state, config, &mut rng, &mut report)?;
    regenerate_shields(state, dt);

    state.time += dt;
    state.tick += 1;

    log::trace!(
        "tick {}: {} ships, {} bullets, {} hits, {} kills",
        state.tick,
        state.ships.len(),
        state.bullets.len(),
        report.hits,
        report.kills
    );
    Ok(report)
}

/// Age explosions, particles and hit markers, returning expired ones to their pools
fn advance_effects(state: &mut SimulationState, dt: f32, bounds: Bounds) {
    let pools = &mut state.pools;

    compact(
        &mut state.explosions,
        |e| {
            e.life -= dt;
            e.alive && e.life > 0.0
        },
        |e| {
            pools.explosions.release(e);
        },
    );

    compact(
        &mut state.particles,
        |p| {
            p.pos += p.vel * dt;
            p.vel *= 0.98;
            p.life -= dt;
            p.alive && p.life > 0.0
        },
        |p| {
            pools.particles.release(p);
        },
    );

    // Hit markers expire on TTL and when they fall outside the world
    compact(
        &mut state.shield_hits,
        |h| {
            h.life -= dt;
            h.alive && h.life > 0.0 && bounds.contains(h.pos)
        },
        |h| {
            pools.shield_hits.release(h);
        },
    );
    compact(
        &mut state.health_hits,
        |h| {
            h.life -= dt;
            h.alive && h.life > 0.0 && bounds.contains(h.pos)
        },
        |h| {
            pools.health_hits.release(h);
        },
    );
}

/// Integrate bullets and drop the expired ones. Returns how many were dropped.
fn advance_bullets(state: &mut SimulationState, config: &SimConfig, dt: f32, bounds: Bounds) -> u32 {
    let policy = config.boundary.bullets;
    let pool = &mut state.pools.bullets;
    let mut expired = 0;

    compact(
        &mut state.bullets,
        |b| {
            b.prev_pos = b.pos;
            b.pos += b.vel * dt;
            b.ttl -= dt;
            if !b.alive || b.ttl <= 0.0 {
                return false;
            }
            let landed = b.pos;
            match apply_boundary(&mut b.pos, &mut b.vel, b.radius, bounds, policy) {
                BoundaryOutcome::Remove => false,
                // Carry the sweep across the seam with the bullet
                BoundaryOutcome::Adjusted if policy == BoundaryPolicy::Wrap => {
                    b.prev_pos += b.pos - landed;
                    true
                }
                BoundaryOutcome::Adjusted | BoundaryOutcome::Inside => true,
            }
        },
        |b| {
            pool.release(b);
            expired += 1;
        },
    );
    expired
}

/// Turn, thrust, drag, clamp and move a single ship
pub fn integrate_ship(ship: &mut Ship, friction: f32, dt: f32) {
    let max_turn = ship.turn_rate * ship.steering.abs() * dt;
    let turn = match ship.target_heading {
        Some(target) => normalize_angle(finite_or(target, ship.angle) - ship.angle)
            .clamp(-max_turn, max_turn),
        None => ship.steering.signum() * max_turn,
    };
    ship.angle = normalize_angle(ship.angle + turn);

    ship.vel += heading_vector(ship.angle) * (ship.accel * ship.throttle * dt);
    ship.vel *= finite_or(ship.friction.unwrap_or(friction), friction);

    let speed = ship.vel.length();
    if speed > ship.max_speed {
        ship.vel *= ship.max_speed / speed;
    }

    ship.pos += ship.vel * dt;
}

/// Advance ships and apply the ship boundary policy. Returns ships removed at the edge.
fn advance_ships(state: &mut SimulationState, config: &SimConfig, dt: f32, bounds: Bounds) -> u32 {
    let policy = config.boundary.ships;
    let mut removed = 0;

    compact(
        &mut state.ships,
        |ship| {
            ship.sanitize();
            if ship.is_dead() {
                return false;
            }
            integrate_ship(ship, config.friction, dt);
            let outcome = apply_boundary(&mut ship.pos, &mut ship.vel, ship.radius, bounds, policy);
            if outcome == BoundaryOutcome::Remove {
                removed += 1;
                return false;
            }
            true
        },
        |ship| log::debug!("ship {} left the field", ship.id),
    );
    removed
}

/// Broad-phase, narrow-phase and hit resolution for every live bullet
fn resolve_collisions(
    state: &mut SimulationState,
    config: &SimConfig,
    rng: &mut rand_pcg::Pcg32,
    report: &mut StepReport,
) -> Result<(), SimError> {
    if state.ships.is_empty() || state.bullets.is_empty() {
        return Ok(());
    }

    let mut grid = state.grids.acquire(config.cell_size);
    let mut max_radius: f32 = 0.0;
    for (i, ship) in state.ships.iter().enumerate() {
        grid.insert(i, ship.pos);
        max_radius = max_radius.max(ship.radius);
    }

    let mut destroyed = vec![false; state.ships.len()];
    let mut consumed = vec![false; state.bullets.len()];
    let mut candidates = Vec::new();
    let mut result = Ok(());

    for bi in (0..state.bullets.len()).rev() {
        let bullet = state.bullets[bi].clone();

        // Cover the whole swept segment, not just the end point
        let center = (bullet.prev_pos + bullet.pos) * 0.5;
        let reach = bullet.radius + max_radius + bullet.prev_pos.distance(bullet.pos) * 0.5;
        grid.query_radius_into(center, reach, &mut candidates);

        // First qualifying candidate in query order takes the hit
        let target = candidates.iter().copied().find(|&si| {
            let ship = &state.ships[si];
            !destroyed[si] && ship.team != bullet.team && !ship.is_dead() && bullet_hits_ship(&bullet, ship)
        });
        let Some(si) = target else {
            continue;
        };

        consumed[bi] = true;
        report.hits += 1;
        match resolve_hit(state, config, &bullet, si, &mut destroyed, rng) {
            Ok(outcome) => {
                if outcome.killed {
                    report.kills += 1;
                }
            }
            Err(err) => {
                result = Err(err.into());
                break;
            }
        }
    }

    state.grids.release(grid);

    let pool = &mut state.pools.bullets;
    let mut idx = 0;
    compact(
        &mut state.bullets,
        |_| {
            let keep = !consumed[idx];
            idx += 1;
            keep
        },
        |b| {
            pool.release(b);
        },
    );

    let mut idx = 0;
    compact(
        &mut state.ships,
        |_| {
            let keep = !destroyed[idx];
            idx += 1;
            keep
        },
        drop,
    );

    result
}

/// Passive shield regen and derived fields for every survivor
fn regenerate_shields(state: &mut SimulationState, dt: f32) {
    for ship in &mut state.ships {
        if ship.max_shield > 0.0 {
            ship.shield = (ship.shield + ship.shield_regen * dt).clamp(0.0, ship.max_shield);
        }
        ship.refresh_percentages();
    }
}
