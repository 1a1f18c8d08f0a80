//! Player settings and preferences
//!
//! Persisted in LocalStorage on the web. Settings only touch cosmetic load:
//! particle budgets and debris counts. Battle rules live in `SimConfig`.

use serde::{Deserialize, Serialize};

use crate::sim::{OverflowPolicy, PoolSettings, SimConfig};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle pool capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 128,
            QualityPreset::Medium => 512,
            QualityPreset::High => 2048,
        }
    }

    /// Debris particles thrown by each destroyed ship
    pub fn debris_particles(&self) -> u32 {
        match self {
            QualityPreset::Low => 2,
            QualityPreset::Medium => 6,
            QualityPreset::High => 12,
        }
    }
}

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Graphics quality preset
    pub quality: QualityPreset,
    /// Debris and launch particles
    pub particles: bool,
    /// Start in attract mode with AI pilots
    pub demo_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            demo_mode: true,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle budget
    pub fn max_particles(&self) -> usize {
        if self.particles {
            self.quality.max_particles()
        } else {
            0
        }
    }

    /// Push cosmetic budgets into a simulation config.
    ///
    /// The particle pool is capped and recycles its oldest idle particles;
    /// a zero budget disables particle spawns instead of shrinking the pool
    /// to nothing.
    pub fn apply_to(&self, config: &mut SimConfig) {
        let budget = self.max_particles();
        if budget == 0 {
            config.effects.debris_particles = 0;
            config.effects.launch_particles = 0;
            return;
        }
        config.pools.particles = PoolSettings::new(budget, OverflowPolicy::DiscardOldest);
        config.effects.debris_particles = self.quality.debris_particles();
    }

    /// LocalStorage key
    const STORAGE_KEY: &'static str = "void_skirmish_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match serde_json::from_str(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(err) => log::warn!("Ignoring stored settings: {}", err),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        log::debug!("settings not persisted on native ({})", Self::STORAGE_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_from_str() {
        assert_eq!(QualityPreset::from_str("HIGH"), Some(QualityPreset::High));
        assert_eq!(QualityPreset::from_str("med"), Some(QualityPreset::Medium));
        assert_eq!(QualityPreset::from_str("ultra"), None);
    }

    #[test]
    fn test_preset_names_parse_back() {
        for preset in [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High] {
            assert_eq!(QualityPreset::from_str(preset.as_str()), Some(preset));
        }
    }

    #[test]
    fn test_stored_json_ignores_retired_fields() {
        let settings: Settings =
            serde_json::from_str(r#"{"demo_mode":false,"show_fps":true}"#).unwrap();
        assert!(!settings.demo_mode);
        assert_eq!(settings.quality, QualityPreset::Medium);
    }

    #[test]
    fn test_native_save_does_not_persist() {
        let settings = Settings {
            demo_mode: false,
            ..Settings::default()
        };
        settings.save();
        assert_eq!(Settings::load(), Settings::default());
    }

    #[test]
    fn test_apply_caps_particle_pool() {
        let mut config = SimConfig::default();
        Settings::from_preset(QualityPreset::Low).apply_to(&mut config);
        assert_eq!(config.pools.particles.capacity, 128);
        assert_eq!(config.pools.particles.overflow, OverflowPolicy::DiscardOldest);
        assert_eq!(config.effects.debris_particles, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_particles_off_disables_spawns() {
        let mut config = SimConfig::default();
        let before = config.pools.particles;
        let settings = Settings {
            particles: false,
            ..Settings::default()
        };
        settings.apply_to(&mut config);
        assert_eq!(config.effects.debris_particles, 0);
        assert_eq!(config.effects.launch_particles, 0);
        assert_eq!(config.pools.particles, before);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"quality":"High"}"#).unwrap();
        assert_eq!(settings.quality, QualityPreset::High);
        assert!(settings.particles);
        assert!(settings.demo_mode);
    }
}
