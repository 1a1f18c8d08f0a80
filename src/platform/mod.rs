//! Platform abstraction layer
//!
//! JSON handoff shared by every host, plus the wasm-bindgen surface used by
//! the browser build.

use crate::session::Session;
use crate::sim::{PoolStats, ShipClass};

#[cfg(target_arch = "wasm32")]
mod web;
#[cfg(target_arch = "wasm32")]
pub use web::WasmSimulation;

/// Parse a hull class name as the host sends it ("Frigate", "frigate")
pub fn parse_ship_class(name: &str) -> Option<ShipClass> {
    match name.trim().to_lowercase().as_str() {
        "fighter" => Some(ShipClass::Fighter),
        "corvette" => Some(ShipClass::Corvette),
        "frigate" => Some(ShipClass::Frigate),
        "destroyer" => Some(ShipClass::Destroyer),
        "carrier" => Some(ShipClass::Carrier),
        _ => None,
    }
}

pub fn snapshot_json(session: &Session) -> serde_json::Result<String> {
    serde_json::to_string(&session.snapshot())
}

/// Drain pending damage and kill events as one JSON document
pub fn drain_events_json(session: &mut Session) -> serde_json::Result<String> {
    serde_json::to_string(&session.drain_events())
}

pub fn pool_stats(session: &Session) -> Vec<PoolStats> {
    session.state.pools.all_stats()
}
