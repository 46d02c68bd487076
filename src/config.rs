//! Startup configuration: TOML file with serde defaults.

use std::error::Error;
use std::path::{Path, PathBuf};

use lode_terrain::{CHUNK_SIZE_X, CHUNK_SIZE_Y};
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// 0 means "roll a random seed at startup".
    pub world_seed: u32,
    /// Horizontal distance within which chunks activate.
    pub activation_radius: f32,
    /// Hard cap on active + pending chunks.
    pub max_chunks: usize,
    /// Simulated seconds of world time per real second.
    pub world_time_scale: f32,
    pub save_root: PathBuf,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_seed: 0,
            activation_radius: 100.0,
            max_chunks: 128,
            world_time_scale: 200.0,
            save_root: PathBuf::from("saves"),
        }
    }
}

impl WorldConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, Box<dyn Error>> {
        Ok(toml::from_str(text)?)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Deactivation happens one chunk footprint beyond activation, a
    /// hysteresis band that keeps border chunks from thrashing.
    pub fn deactivation_radius(&self) -> f32 {
        self.activation_radius + (CHUNK_SIZE_X + CHUNK_SIZE_Y) as f32
    }

    pub fn resolve_seed(&self) -> u32 {
        if self.world_seed == 0 {
            fastrand::u32(1..)
        } else {
            self.world_seed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_keys() {
        let cfg = WorldConfig::from_toml_str("world_seed = 7").unwrap();
        assert_eq!(cfg.world_seed, 7);
        assert_eq!(cfg.activation_radius, 100.0);
        assert_eq!(cfg.max_chunks, 128);
    }

    #[test]
    fn deactivation_radius_leaves_a_hysteresis_band() {
        let cfg = WorldConfig::default();
        assert!(cfg.deactivation_radius() >= cfg.activation_radius + CHUNK_SIZE_X as f32);
    }

    #[test]
    fn zero_seed_rolls_a_nonzero_one() {
        let cfg = WorldConfig::default();
        assert_ne!(cfg.resolve_seed(), 0);
        let fixed = WorldConfig {
            world_seed: 12345,
            ..WorldConfig::default()
        };
        assert_eq!(fixed.resolve_seed(), 12345);
    }
}
