//! Damage, progression and kill handling
//!
//! Shields soak first and the remainder reaches the hull. The shooter earns XP
//! per point of damage plus a flat bonus per kill; each award can cascade
//! through several level-ups.

use std::f32::consts::TAU;

use rand::Rng;
use rand_pcg::Pcg32;

use super::config::{LevelBoosts, ProgressionConfig, SimConfig};
use super::pool::PoolError;
use super::state::{
    Bullet, DamageEvent, DamageKind, ExplosionSpec, HitSpec, KillEvent, ParticleSpec, Ship,
    SimulationState,
};
use crate::{finite_or, heading_vector};

/// Result of one bullet striking one ship
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    /// Damage soaked by the shield
    pub absorbed: f32,
    /// Damage that reached the hull
    pub hp_damage: f32,
    pub killed: bool,
}

impl HitOutcome {
    pub fn total(&self) -> f32 {
        self.absorbed + self.hp_damage
    }
}

/// Split `damage` into (shield-absorbed, hull) parts
#[inline]
pub fn split_damage(shield: f32, damage: f32) -> (f32, f32) {
    let damage = finite_or(damage, 0.0).max(0.0);
    let absorbed = shield.max(0.0).min(damage);
    (absorbed, damage - absorbed)
}

/// Apply a hit to a ship's shield and hull
pub fn apply_hit(ship: &mut Ship, damage: f32) -> HitOutcome {
    let (absorbed, hp_damage) = split_damage(ship.shield, damage);
    ship.shield -= absorbed;
    ship.hp -= hp_damage;
    ship.refresh_percentages();
    HitOutcome {
        absorbed,
        hp_damage,
        killed: ship.is_dead(),
    }
}

/// Compound one level's worth of boosts onto a ship
pub fn apply_level_boosts(ship: &mut Ship, boosts: &LevelBoosts) {
    let level = ship.level;

    let hp = boosts.hp.factor(level);
    ship.max_hp *= hp;
    ship.hp *= hp;

    let shield = boosts.shield.factor(level);
    ship.max_shield *= shield;
    ship.shield = (ship.shield * shield).min(ship.max_shield);

    let damage = boosts.damage.factor(level);
    for cannon in &mut ship.cannons {
        cannon.damage *= damage;
    }
    for turret in &mut ship.turrets {
        turret.cannon.damage *= damage;
    }

    ship.accel *= boosts.speed.factor(level);
    ship.shield_regen *= boosts.regen.factor(level);
    ship.refresh_percentages();
}

/// Add XP and run the level-up cascade. Returns levels gained.
pub fn award_xp(ship: &mut Ship, amount: f32, progression: &ProgressionConfig) -> u32 {
    let amount = finite_or(amount, 0.0);
    if amount <= 0.0 {
        return 0;
    }
    ship.xp += amount;

    let mut gained = 0;
    loop {
        let threshold = progression.xp_to_level(ship.level);
        if !(threshold.is_finite() && threshold > 0.0) || ship.xp < threshold {
            break;
        }
        ship.xp -= threshold;
        ship.level += 1;
        gained += 1;
        apply_level_boosts(ship, &progression.boosts);
    }

    if gained > 0 {
        log::debug!("ship {} reached level {} (+{})", ship.id, ship.level, gained);
    }
    gained
}

/// Resolve a qualifying hit: damage, effects, events, XP and kill.
///
/// `destroyed` is indexed like `state.ships` and marks ships removed this
/// tick; the victim is flagged here when the hit kills it.
pub fn resolve_hit(
    state: &mut SimulationState,
    config: &SimConfig,
    bullet: &Bullet,
    target_idx: usize,
    destroyed: &mut [bool],
    rng: &mut Pcg32,
) -> Result<HitOutcome, PoolError> {
    let outcome = apply_hit(&mut state.ships[target_idx], bullet.damage);

    let target = &state.ships[target_idx];
    let (target_id, target_team, target_class) = (target.id, target.team, target.class);
    let (target_pos, target_radius, target_vel) = (target.pos, target.radius, target.vel);

    let attacker_idx = state
        .ships
        .iter()
        .enumerate()
        .position(|(i, s)| s.id == bullet.owner_id && !destroyed[i] && !s.is_dead());
    let attacker_id = attacker_idx.map(|i| state.ships[i].id);

    let marker = |amount: f32| HitSpec {
        pos: bullet.pos,
        team: target_team,
        target_id,
        amount,
        life: config.effects.hit_marker_life,
    };
    let event = |kind: DamageKind, amount: f32| DamageEvent {
        target_id,
        kind,
        amount,
        position: bullet.pos,
        team: target_team,
        attacker_id,
    };

    // Events go out before any pooled effect that could fail the step
    if outcome.absorbed > 0.0 {
        state
            .damage_events
            .push(event(DamageKind::Shield, outcome.absorbed));
        state.spawn_shield_hit(marker(outcome.absorbed))?;
    }
    if outcome.hp_damage > 0.0 {
        state
            .damage_events
            .push(event(DamageKind::Hp, outcome.hp_damage));
        state.spawn_health_hit(marker(outcome.hp_damage))?;
    }

    let progression = &config.progression;
    if let Some(ai) = attacker_idx {
        award_xp(
            &mut state.ships[ai],
            progression.xp_per_damage * outcome.total(),
            progression,
        );
    }

    if outcome.killed {
        destroyed[target_idx] = true;
        if let Some(ai) = attacker_idx {
            award_xp(&mut state.ships[ai], progression.xp_per_kill, progression);
        }
        state.kill_events.push(KillEvent {
            victim_id: target_id,
            victim_team: target_team,
            victim_class: target_class,
            attacker_id,
            position: target_pos,
        });
        log::debug!(
            "{} {} destroyed by {:?}",
            target_class.as_str(),
            target_id,
            attacker_id
        );

        let effects = &config.effects;
        state.spawn_explosion(ExplosionSpec {
            pos: target_pos,
            radius: target_radius * effects.explosion_scale,
            life: effects.explosion_life,
            team: target_team,
        })?;
        for _ in 0..effects.debris_particles {
            let dir = heading_vector(rng.random_range(0.0..TAU));
            let speed = effects.debris_speed * rng.random_range(0.3..1.0);
            state.spawn_particle(ParticleSpec {
                pos: target_pos,
                vel: target_vel * 0.5 + dir * speed,
                life: effects.particle_life * rng.random_range(0.6..1.0),
                size: rng.random_range(1.0..3.0),
                team: target_team,
            })?;
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::config::BoostScalar;
    use crate::sim::state::{ShipClass, ShipStats};
    use glam::Vec2;
    use proptest::prelude::*;

    fn corvette() -> Ship {
        Ship::new(1, 0, &ShipStats::for_class(ShipClass::Corvette), Vec2::ZERO, 0.0)
    }

    #[test]
    fn test_shield_then_hp_split() {
        let mut ship = corvette();
        ship.shield = 5.0;
        ship.hp = 20.0;
        let outcome = apply_hit(&mut ship, 8.0);
        assert_eq!(outcome.absorbed, 5.0);
        assert_eq!(outcome.hp_damage, 3.0);
        assert_eq!(ship.shield, 0.0);
        assert_eq!(ship.hp, 17.0);
        assert!(!outcome.killed);
        assert_eq!(ship.shield_percent, 0.0);
        assert_eq!(ship.hp_percent, 17.0 / 40.0 * 100.0);
    }

    #[test]
    fn test_no_shield_takes_full_damage() {
        let mut ship = corvette();
        ship.shield = 0.0;
        let outcome = apply_hit(&mut ship, 6.0);
        assert_eq!(outcome.absorbed, 0.0);
        assert_eq!(outcome.hp_damage, 6.0);
    }

    #[test]
    fn test_shield_soaks_small_hit() {
        let mut ship = corvette();
        let outcome = apply_hit(&mut ship, 4.0);
        assert_eq!(outcome.absorbed, 4.0);
        assert_eq!(outcome.hp_damage, 0.0);
        assert_eq!(ship.hp, ship.max_hp);
    }

    #[test]
    fn test_lethal_hit_reports_kill() {
        let mut ship = Ship::new(1, 0, &ShipStats::for_class(ShipClass::Fighter), Vec2::ZERO, 0.0);
        assert!(apply_hit(&mut ship, 15.0).killed);
    }

    #[test]
    fn test_single_award_cascades_levels() {
        let progression = ProgressionConfig::default();
        let mut ship = corvette();
        // 100 + 150 + 225 = 475 for three levels
        let gained = award_xp(&mut ship, 500.0, &progression);
        assert_eq!(gained, 3);
        assert_eq!(ship.level, 4);
        assert!((ship.xp - 25.0).abs() < 1e-3);
    }

    #[test]
    fn test_below_threshold_keeps_level() {
        let progression = ProgressionConfig::default();
        let mut ship = corvette();
        assert_eq!(award_xp(&mut ship, 99.0, &progression), 0);
        assert_eq!(ship.level, 1);
        assert_eq!(award_xp(&mut ship, f32::NAN, &progression), 0);
        assert_eq!(ship.xp, 99.0);
    }

    #[test]
    fn test_level_boosts_compound() {
        let boosts = LevelBoosts {
            hp: BoostScalar::Constant(0.5),
            shield: BoostScalar::Constant(1.0),
            damage: BoostScalar::Linear {
                base: 0.0,
                per_level: 0.25,
            },
            speed: BoostScalar::Constant(0.0),
            regen: BoostScalar::Constant(0.1),
        };
        let mut ship = corvette();
        ship.hp = 20.0;
        ship.level = 2;
        let base_damage = ship.cannons[0].damage;
        let base_accel = ship.accel;

        apply_level_boosts(&mut ship, &boosts);
        assert_eq!(ship.max_hp, 60.0);
        assert_eq!(ship.hp, 30.0);
        assert_eq!(ship.max_shield, 40.0);
        assert_eq!(ship.shield, 40.0);
        assert_eq!(ship.cannons[0].damage, base_damage * 1.5);
        assert_eq!(ship.accel, base_accel);
        assert_eq!(ship.hp_percent, 50.0);
    }

    proptest! {
        #[test]
        fn prop_damage_is_conserved(shield in 0.0f32..500.0, damage in 0.0f32..500.0) {
            let (absorbed, hp_damage) = split_damage(shield, damage);
            prop_assert_eq!(absorbed, shield.min(damage));
            prop_assert!((absorbed + hp_damage - damage).abs() <= damage * 1e-6);
            prop_assert!(hp_damage >= 0.0);
        }
    }
}
