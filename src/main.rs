//! Void Skirmish entry point
//!
//! Native builds run a headless attract-mode battle and log the outcome.
//! The web build only installs logging; JavaScript drives `WasmSimulation`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("logger init failed: {err}").into());
    }
    log::info!("Void Skirmish ready");
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::f32::consts::PI;

    use glam::Vec2;
    use void_skirmish::sim::{Bounds, ShipClass, SimConfig};
    use void_skirmish::{Session, Settings};

    env_logger::init();

    // Usage: void-skirmish [seed] [config.json]
    let mut args = std::env::args().skip(1);
    let seed = match args.next() {
        Some(arg) => arg.parse::<u64>()?,
        None => 1,
    };
    let mut config = match args.next() {
        Some(path) => SimConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => SimConfig::default(),
    };
    let settings = Settings::load();
    settings.apply_to(&mut config);
    log::info!(
        "quality {}, particles {}",
        settings.quality.as_str(),
        if settings.particles { "on" } else { "off" }
    );
    if log::log_enabled!(log::Level::Debug) {
        log::debug!("effective config:\n{}", config.to_json()?);
    }

    let bounds = Bounds::default();
    let mut session = Session::new(seed, config, bounds);
    session.demo_mode = true;

    let mid = bounds.center();
    session.spawn_fleet(
        0,
        &[ShipClass::Fighter, ShipClass::Frigate, ShipClass::Carrier, ShipClass::Corvette],
        Vec2::new(bounds.width * 0.2, mid.y),
        0.0,
    );
    session.spawn_fleet(
        1,
        &[ShipClass::Corvette, ShipClass::Destroyer, ShipClass::Corvette, ShipClass::Fighter],
        Vec2::new(bounds.width * 0.8, mid.y),
        PI,
    );

    log::info!("Void Skirmish (native) battle starting, seed {}", seed);

    // Three simulated minutes at a jittery ~50 FPS
    let frames = [0.018, 0.021, 0.019, 0.024];
    let mut damage_total = 0.0;
    let mut kills = 0;
    for frame in frames.iter().cycle().take(9000) {
        session.advance(*frame)?;

        let events = session.drain_events();
        damage_total += events.damage.iter().map(|e| e.amount).sum::<f32>();
        for kill in &events.kills {
            kills += 1;
            log::info!(
                "t={:.1}s {} {} (team {}) destroyed by {:?}",
                session.state.time,
                kill.victim_class.as_str(),
                kill.victim_id,
                kill.victim_team,
                kill.attacker_id
            );
        }

        if session.winner().is_some() {
            break;
        }
    }

    let state = &session.state;
    log::info!("battle over after {:.1}s ({} ticks)", state.time, state.tick);
    log::info!("{} kills, {:.0} total damage", kills, damage_total);
    match session.winner() {
        Some(team) => log::info!("team {} holds the field", team),
        None => log::info!("no winner, survivors per team: {:?}", state.team_counts()),
    }
    for stats in state.pools.all_stats() {
        log::info!(
            "pool {}: {} allocated, {} free (cap {}, {:?})",
            stats.kind,
            stats.allocated,
            stats.free,
            stats.capacity,
            stats.policy
        );
    }
    Ok(())
}
