//! Bootstrap configuration.
//!
//! There is no runtime database here — the font file is the only runtime
//! input, and this TOML file carries the bootstrap settings that can't
//! change without a restart: which font to load, which output device to
//! use, and the synchronous-engine knobs (polyphony, attenuation).

use crate::error::{DfxError, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Bootstrap configuration loaded from a TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to the drum-font file to load.
    pub font_path: PathBuf,

    /// Output device name; `None` picks the host's default device.
    #[serde(default)]
    pub output_device: Option<String>,

    /// Maximum concurrent voices.
    #[serde(default = "default_polyphony")]
    pub polyphony: usize,

    /// Fixed output attenuation in dB, applied in the mix callback to avoid
    /// clipping under full polyphony (spec section 4.12).
    #[serde(default = "default_attenuation_db")]
    pub output_attenuation_db: f64,

    /// Output sample rate override; `None` queries the device's default.
    #[serde(default)]
    pub output_rate: Option<u32>,

    /// Robin scale code (spec section 4.8 step 7, supplemented "au
    /// naturale flag"): `true` loads robins at raw scale, `false`
    /// normalizes by each robin's declared `peak`.
    #[serde(default = "default_au_naturale")]
    pub au_naturale: bool,
}

fn default_polyphony() -> usize {
    16
}

fn default_attenuation_db() -> f64 {
    -6.0
}

fn default_au_naturale() -> bool {
    true
}

/// Fully resolved configuration: TOML values with command-line overrides
/// applied, in priority order: CLI > TOML > built-in default.
#[derive(Debug, Clone)]
pub struct Config {
    pub font_path: PathBuf,
    pub output_device: Option<String>,
    pub polyphony: usize,
    pub output_attenuation_db: f64,
    pub output_rate: Option<u32>,
    pub au_naturale: bool,
}

impl Config {
    /// Load the TOML bootstrap file and apply command-line overrides.
    pub fn load(
        config_path: &PathBuf,
        font_path_override: Option<PathBuf>,
        output_device_override: Option<String>,
        polyphony_override: Option<usize>,
        au_naturale_override: Option<bool>,
    ) -> Result<Self> {
        let toml_str = std::fs::read_to_string(config_path)
            .map_err(|e| DfxError::Config(format!("failed to read {}: {}", config_path.display(), e)))?;

        let toml_config: TomlConfig = toml::from_str(&toml_str)
            .map_err(|e| DfxError::Config(format!("failed to parse {}: {}", config_path.display(), e)))?;

        Ok(Config {
            font_path: font_path_override.unwrap_or(toml_config.font_path),
            output_device: output_device_override.or(toml_config.output_device),
            polyphony: polyphony_override.unwrap_or(toml_config.polyphony),
            output_attenuation_db: toml_config.output_attenuation_db,
            output_rate: toml_config.output_rate,
            au_naturale: au_naturale_override.unwrap_or(toml_config.au_naturale),
        })
    }

    /// Convert the configured attenuation in dB to a linear gain multiplier.
    pub fn attenuation_gain(&self) -> f64 {
        10f64.powf(self.output_attenuation_db / 20.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_attenuation_is_minus_6db() {
        assert_eq!(default_attenuation_db(), -6.0);
    }

    #[test]
    fn attenuation_gain_matches_db_formula() {
        let cfg = Config {
            font_path: "kit.dfx".into(),
            output_device: None,
            polyphony: 16,
            output_attenuation_db: -6.0,
            output_rate: None,
            au_naturale: true,
        };
        assert!((cfg.attenuation_gain() - 10f64.powf(-6.0 / 20.0)).abs() < 1e-12);
    }

    #[test]
    fn load_applies_cli_overrides_over_toml() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("dfx-player.toml");
        std::fs::write(
            &toml_path,
            "font_path = \"kit.dfx\"\npolyphony = 8\noutput_attenuation_db = -3.0\n",
        )
        .unwrap();

        let cfg = Config::load(&toml_path, None, Some("Speakers".into()), Some(24), None).unwrap();
        assert_eq!(cfg.font_path, PathBuf::from("kit.dfx"));
        assert_eq!(cfg.output_device.as_deref(), Some("Speakers"));
        assert_eq!(cfg.polyphony, 24);
        assert_eq!(cfg.output_attenuation_db, -3.0);
        assert!(cfg.au_naturale);
    }

    #[test]
    fn load_applies_cli_override_for_au_naturale() {
        let dir = tempfile::tempdir().unwrap();
        let toml_path = dir.path().join("dfx-player.toml");
        std::fs::write(&toml_path, "font_path = \"kit.dfx\"\n").unwrap();

        let cfg = Config::load(&toml_path, None, None, None, Some(false)).unwrap();
        assert!(!cfg.au_naturale);
    }
}
