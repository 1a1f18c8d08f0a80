//! Carrier fighter launches
//!
//! A carrier's bay counts down between launches. A launch needs the bay to be
//! ready and fewer live fighters tagged with the carrier's id than the bay
//! allows; a ready bay with no room stays ready until a fighter dies.

use std::f32::consts::TAU;

use rand::Rng;
use rand_pcg::Pcg32;

use super::config::SimConfig;
use super::pool::PoolError;
use super::state::{ParticleSpec, ShipStats, SimulationState};
use crate::heading_vector;

/// Launch speed added along the carrier heading
const LAUNCH_KICK: f32 = 40.0;

/// Tick every carrier bay, launching fighters where possible.
///
/// Returns the number of fighters launched.
pub fn update_carriers(
    state: &mut SimulationState,
    config: &SimConfig,
    dt: f32,
    rng: &mut Pcg32,
) -> Result<u32, PoolError> {
    let mut launches = Vec::new();

    for idx in 0..state.ships.len() {
        let Some(bay) = state.ships[idx].carrier else {
            continue;
        };
        let carrier_id = state.ships[idx].id;

        let cooldown = bay.cooldown - dt;
        let launch = cooldown <= 0.0 && (state.live_fighters(carrier_id) as u32) < bay.max_fighters;
        let next = if launch {
            bay.launch_interval.max(0.0)
        } else {
            cooldown.max(0.0)
        };
        if let Some(bay) = state.ships[idx].carrier.as_mut() {
            bay.cooldown = next;
        }
        if launch {
            launches.push(idx);
        }
    }

    let launched = launches.len() as u32;
    for idx in launches {
        launch_fighter(state, config, idx, rng)?;
    }
    Ok(launched)
}

fn launch_fighter(
    state: &mut SimulationState,
    config: &SimConfig,
    carrier_idx: usize,
    rng: &mut Pcg32,
) -> Result<(), PoolError> {
    let carrier = &state.ships[carrier_idx];
    let Some(bay) = carrier.carrier else {
        return Ok(());
    };
    let (carrier_id, team, angle) = (carrier.id, carrier.team, carrier.angle);
    let heading = heading_vector(angle);
    let stats = ShipStats::for_class(bay.fighter);
    let pos = carrier.pos + heading * (carrier.radius + stats.radius);
    let vel = carrier.vel + heading * LAUNCH_KICK;

    let fighter_id = state.spawn_ship(team, &stats, pos, angle);
    if let Some(fighter) = state.ship_mut(fighter_id) {
        fighter.vel = vel.clamp_length_max(fighter.max_speed);
        fighter.parent_id = Some(carrier_id);
    }

    let effects = &config.effects;
    for _ in 0..effects.launch_particles {
        let dir = heading_vector(rng.random_range(0.0..TAU));
        state.spawn_particle(ParticleSpec {
            pos,
            vel: vel * 0.25 + dir * rng.random_range(10.0..40.0),
            life: effects.particle_life * 0.5,
            size: 1.5,
            team,
        })?;
    }

    log::debug!("carrier {} launched fighter {}", carrier_id, fighter_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::PoolConfig;
    use crate::sim::state::ShipClass;
    use glam::Vec2;

    fn carrier_state(cooldown: f32, max_fighters: u32) -> (SimulationState, u32) {
        let mut state = SimulationState::new(3, &PoolConfig::default());
        let mut stats = ShipStats::for_class(ShipClass::Carrier);
        if let Some(bay) = stats.carrier.as_mut() {
            bay.cooldown = cooldown;
            bay.max_fighters = max_fighters;
            bay.launch_interval = 2.0;
        }
        let id = state.spawn_ship(1, &stats, Vec2::new(400.0, 300.0), 0.0);
        (state, id)
    }

    #[test]
    fn test_launch_when_ready() {
        let (mut state, carrier_id) = carrier_state(0.0, 2);
        let config = SimConfig::default();
        let mut rng = state.rng_state.tick_rng(0);

        let launched = update_carriers(&mut state, &config, 0.1, &mut rng).unwrap();
        assert_eq!(launched, 1);
        assert_eq!(state.ships.len(), 2);

        let fighter = &state.ships[1];
        assert_eq!(fighter.class, ShipClass::Fighter);
        assert_eq!(fighter.team, 1);
        assert_eq!(fighter.parent_id, Some(carrier_id));
        assert!(fighter.pos.x > 400.0);
        assert_eq!(state.particles.len(), config.effects.launch_particles as usize);

        let bay = state.ships[0].carrier.unwrap();
        assert_eq!(bay.cooldown, 2.0);
    }

    #[test]
    fn test_cooldown_counts_down() {
        let (mut state, _) = carrier_state(1.0, 2);
        let config = SimConfig::default();
        let mut rng = state.rng_state.tick_rng(0);

        assert_eq!(update_carriers(&mut state, &config, 0.5, &mut rng).unwrap(), 0);
        assert_eq!(state.ships[0].carrier.unwrap().cooldown, 0.5);
        assert_eq!(update_carriers(&mut state, &config, 0.5, &mut rng).unwrap(), 1);
    }

    #[test]
    fn test_full_bay_waits_for_room() {
        let (mut state, carrier_id) = carrier_state(0.0, 1);
        let config = SimConfig::default();
        let mut rng = state.rng_state.tick_rng(0);

        update_carriers(&mut state, &config, 0.1, &mut rng).unwrap();
        assert_eq!(state.live_fighters(carrier_id), 1);

        // Past the interval but the bay is full
        assert_eq!(update_carriers(&mut state, &config, 5.0, &mut rng).unwrap(), 0);
        assert_eq!(state.ships[0].carrier.unwrap().cooldown, 0.0);

        state.ships.retain(|s| s.parent_id.is_none());
        assert_eq!(update_carriers(&mut state, &config, 0.1, &mut rng).unwrap(), 1);
    }
}
