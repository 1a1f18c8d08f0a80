//! wasm-bindgen surface for the browser host

use glam::Vec2;
use wasm_bindgen::prelude::*;

use crate::session::Session;
use crate::settings::Settings;
use crate::sim::{Bounds, ShipStats, SimConfig};

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// One battle driven from JavaScript
#[wasm_bindgen]
pub struct WasmSimulation {
    session: Session,
    settings: Settings,
}

#[wasm_bindgen]
impl WasmSimulation {
    /// `config_json` may be empty for defaults. Stored player settings are
    /// applied on top. A negative or non-finite seed falls back to the clock.
    #[wasm_bindgen(constructor)]
    pub fn new(seed: f64, width: f32, height: f32, config_json: &str) -> Result<WasmSimulation, JsValue> {
        let mut config = if config_json.trim().is_empty() {
            SimConfig::default()
        } else {
            SimConfig::from_json(config_json).map_err(js_err)?
        };
        let settings = Settings::load();
        settings.apply_to(&mut config);

        let seed = if seed.is_finite() && seed >= 0.0 {
            seed as u64
        } else {
            js_sys::Date::now() as u64
        };
        let mut session = Session::new(seed, config, Bounds::new(width, height));
        session.demo_mode = settings.demo_mode;
        Ok(Self { session, settings })
    }

    /// Feed one animation frame; returns the number of fixed steps run
    pub fn advance(&mut self, frame_dt: f32) -> Result<u32, JsValue> {
        self.session.advance(frame_dt).map_err(|err| {
            log::error!("simulation halted: {}", err);
            js_err(err)
        })
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        super::snapshot_json(&self.session).map_err(js_err)
    }

    pub fn drain_events_json(&mut self) -> Result<String, JsValue> {
        super::drain_events_json(&mut self.session).map_err(js_err)
    }

    pub fn pool_stats_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&super::pool_stats(&self.session)).map_err(js_err)
    }

    pub fn spawn_ship(&mut self, team: u8, class: &str, x: f32, y: f32, angle: f32) -> Result<u32, JsValue> {
        let class = super::parse_ship_class(class)
            .ok_or_else(|| JsValue::from_str(&format!("unknown ship class: {class}")))?;
        Ok(self
            .session
            .state
            .spawn_ship(team, &ShipStats::for_class(class), Vec2::new(x, y), angle))
    }

    /// Player controls for one ship. Returns false when the ship is gone.
    pub fn set_controls(&mut self, id: u32, steering: f32, throttle: f32, firing: bool) -> bool {
        let Some(ship) = self.session.state.ship_mut(id) else {
            return false;
        };
        ship.target_heading = None;
        ship.steering = steering;
        ship.throttle = throttle;
        ship.firing = firing;
        true
    }

    /// Toggle AI pilots and remember the choice for the next visit
    pub fn set_demo_mode(&mut self, enabled: bool) {
        self.session.demo_mode = enabled;
        if self.settings.demo_mode != enabled {
            self.settings.demo_mode = enabled;
            self.settings.save();
        }
    }

    pub fn restart(&mut self, seed: f64) {
        self.session.restart(seed as u64);
    }
}
