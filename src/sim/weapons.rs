//! Cannon and turret fire
//!
//! Runs before the step, never inside it. Hull cannons fire along the heading
//! while the ship's trigger is held; `Nearest` turrets pick their own target
//! and fire whenever one is in range. Every shot is a pooled bullet.

use glam::Vec2;
use rand::Rng;

use super::pool::PoolError;
use super::state::{BulletSpec, Cannon, Ship, SimulationState, TargetingMode, TeamId, Turret};
use crate::heading_vector;

/// RNG stream reserved for weapon spread
const WEAPON_STREAM: u64 = 1;

/// Lateral gap between parallel hull cannons
const CANNON_SPACING: f32 = 4.0;

/// World-space mount position of a turret
pub fn turret_position(ship: &Ship, turret: &Turret) -> Vec2 {
    ship.pos + Vec2::from_angle(ship.angle).rotate(turret.mount)
}

/// Closest living enemy within `range` of `from`
pub fn nearest_enemy(ships: &[Ship], team: TeamId, from: Vec2, range: f32) -> Option<Vec2> {
    let range_sq = range * range;
    ships
        .iter()
        .filter(|s| s.team != team && !s.is_dead())
        .map(|s| (s.pos, s.pos.distance_squared(from)))
        .filter(|(_, d)| *d <= range_sq)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(pos, _)| pos)
}

/// Tick a cannon's cooldown; true when it fires this tick
fn cycle(cannon: &mut Cannon, dt: f32, trigger: bool) -> bool {
    cannon.cooldown = (cannon.cooldown - dt).max(0.0);
    if trigger && cannon.cooldown <= 0.0 && cannon.fire_rate > 0.0 {
        cannon.cooldown = cannon.interval();
        true
    } else {
        false
    }
}

/// A shot waiting for spread and pool acquisition
struct PendingShot {
    cannon: Cannon,
    muzzle: Vec2,
    aim: f32,
}

/// Fire every ready weapon. Returns the number of bullets spawned.
pub fn fire_weapons(state: &mut SimulationState, dt: f32) -> Result<u32, PoolError> {
    let mut rng = state.rng_state.stream_rng(state.tick, WEAPON_STREAM);
    let mut shots = Vec::new();

    for idx in 0..state.ships.len() {
        if state.ships[idx].is_dead() {
            continue;
        }

        // Turret aims need the whole fleet, resolve them before borrowing mutably
        let mounts: Vec<(Vec2, Option<f32>)> = {
            let ship = &state.ships[idx];
            ship.turrets
                .iter()
                .map(|turret| {
                    let from = turret_position(ship, turret);
                    let aim = match turret.targeting {
                        TargetingMode::Forward => ship.firing.then_some(ship.angle),
                        TargetingMode::Nearest => {
                            nearest_enemy(&state.ships, ship.team, from, turret.range)
                                .map(|target| (target - from).to_angle())
                        }
                    };
                    (from, aim)
                })
                .collect()
        };

        let ship = &mut state.ships[idx];
        let heading = heading_vector(ship.angle);
        let nose = ship.pos + heading * ship.radius;
        let count = ship.cannons.len() as f32;
        let (firing, angle) = (ship.firing, ship.angle);

        let mut pending = Vec::new();
        for (i, cannon) in ship.cannons.iter_mut().enumerate() {
            if cycle(cannon, dt, firing) {
                let offset = (i as f32 - (count - 1.0) * 0.5) * CANNON_SPACING;
                pending.push(PendingShot {
                    cannon: *cannon,
                    muzzle: nose + heading.perp() * offset,
                    aim: angle,
                });
            }
        }
        for (turret, (muzzle, aim)) in ship.turrets.iter_mut().zip(mounts) {
            if let Some(aim) = aim {
                if cycle(&mut turret.cannon, dt, true) {
                    pending.push(PendingShot {
                        cannon: turret.cannon,
                        muzzle,
                        aim,
                    });
                }
            } else {
                cycle(&mut turret.cannon, dt, false);
            }
        }

        let ship = &state.ships[idx];
        for PendingShot { cannon, muzzle, aim } in pending {
            let jitter = if cannon.spread > 0.0 {
                rng.random_range(-cannon.spread..=cannon.spread)
            } else {
                0.0
            };
            shots.push(BulletSpec {
                owner_id: ship.id,
                team: ship.team,
                pos: muzzle,
                vel: ship.vel + heading_vector(aim + jitter) * cannon.muzzle_speed,
                damage: cannon.damage,
                ttl: cannon.bullet_ttl,
                radius: cannon.bullet_radius,
            });
        }
    }

    let fired = shots.len() as u32;
    for spec in shots {
        state.spawn_bullet(spec)?;
    }
    if fired > 0 {
        log::trace!("tick {}: {} shots fired", state.tick, fired);
    }
    Ok(fired)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::PoolConfig;
    use crate::sim::state::{ShipClass, ShipStats};

    fn state_with(class: ShipClass, team: TeamId, pos: Vec2) -> (SimulationState, u32) {
        let mut state = SimulationState::new(11, &PoolConfig::default());
        let id = state.spawn_ship(team, &ShipStats::for_class(class), pos, 0.0);
        (state, id)
    }

    #[test]
    fn test_trigger_fires_hull_cannons() {
        let (mut state, id) = state_with(ShipClass::Corvette, 0, Vec2::new(100.0, 100.0));
        assert_eq!(fire_weapons(&mut state, 0.01).unwrap(), 0);

        state.ships[0].firing = true;
        assert_eq!(fire_weapons(&mut state, 0.01).unwrap(), 2);
        assert_eq!(state.bullets.len(), 2);
        for bullet in &state.bullets {
            assert_eq!(bullet.owner_id, id);
            assert_eq!(bullet.team, 0);
            assert!(bullet.vel.x > 0.0);
            assert!(bullet.pos.x > 100.0);
        }

        // Cooling down
        assert_eq!(fire_weapons(&mut state, 0.01).unwrap(), 0);
    }

    #[test]
    fn test_cannon_respects_fire_rate() {
        let (mut state, _) = state_with(ShipClass::Fighter, 0, Vec2::ZERO);
        state.ships[0].firing = true;
        let mut total = 0;
        // Fighter gun fires 4/s, one second of 60 Hz ticks
        for _ in 0..60 {
            total += fire_weapons(&mut state, 1.0 / 60.0).unwrap();
        }
        assert!((4..=5).contains(&total), "fired {total}");
    }

    #[test]
    fn test_turret_tracks_nearest_enemy() {
        let (mut state, _) = state_with(ShipClass::Frigate, 0, Vec2::new(100.0, 100.0));
        let fighter = ShipStats::for_class(ShipClass::Fighter);
        state.spawn_ship(1, &fighter, Vec2::new(100.0, 200.0), 0.0);
        state.spawn_ship(1, &fighter, Vec2::new(100.0, 340.0), 0.0);

        assert_eq!(fire_weapons(&mut state, 0.01).unwrap(), 1);
        let bullet = &state.bullets[0];
        // Aimed up at the closer fighter, not along the heading
        assert!(bullet.vel.y > bullet.vel.x.abs());
    }

    #[test]
    fn test_turret_idle_without_target() {
        let (mut state, _) = state_with(ShipClass::Frigate, 0, Vec2::new(100.0, 100.0));
        let fighter = ShipStats::for_class(ShipClass::Fighter);
        state.spawn_ship(1, &fighter, Vec2::new(900.0, 900.0), 0.0);
        state.spawn_ship(0, &fighter, Vec2::new(110.0, 100.0), 0.0);
        assert_eq!(fire_weapons(&mut state, 0.01).unwrap(), 0);
    }

    #[test]
    fn test_nearest_enemy_ignores_own_team() {
        let (mut state, _) = state_with(ShipClass::Fighter, 0, Vec2::ZERO);
        let fighter = ShipStats::for_class(ShipClass::Fighter);
        state.spawn_ship(0, &fighter, Vec2::new(5.0, 0.0), 0.0);
        state.spawn_ship(2, &fighter, Vec2::new(50.0, 0.0), 0.0);
        assert_eq!(
            nearest_enemy(&state.ships, 0, Vec2::ZERO, 100.0),
            Some(Vec2::new(50.0, 0.0))
        );
        assert_eq!(nearest_enemy(&state.ships, 0, Vec2::ZERO, 10.0), None);
    }
}
