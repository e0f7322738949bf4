//! Engine configuration.
//!
//! Frame pacing, asset locations, audio and gameplay tunables. Configuration
//! can be loaded from and saved to a TOML file.

use ecosort_gameplay::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Configuration file name.
const CONFIG_FILE: &str = "ecosort.toml";

/// Engine configuration parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // === Frame Settings ===
    /// Target frames per second for wall-clock runs
    pub target_fps: u32,
    /// Fixed per-frame delta in seconds; makes runs deterministic
    pub fixed_delta: Option<f32>,
    /// Stop after this many frames
    pub max_frames: Option<u64>,

    // === Asset Settings ===
    /// Path of the RON asset manifest
    pub asset_manifest: PathBuf,

    // === Audio Settings ===
    /// Directory holding the sound cue files
    pub sound_dir: PathBuf,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,

    // === Debug Settings ===
    /// Log the HUD every time it changes
    pub log_hud: bool,

    // === Gameplay Settings ===
    /// Reach, speeds, camera and hand tunables
    pub gameplay: SessionConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Frame
            target_fps: 60,
            fixed_delta: None,
            max_frames: None,

            // Assets
            asset_manifest: PathBuf::from("assets/manifest.ron"),

            // Audio
            sound_dir: PathBuf::from("assets/sounds"),
            sfx_volume: 1.0,

            // Debug
            log_hud: true,

            // Gameplay
            gameplay: SessionConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the default file location.
    /// Returns default config if file doesn't exist.
    pub fn load() -> Self {
        Self::load_from(Self::config_path())
    }

    /// Load configuration from a specific path.
    /// Returns default config if file doesn't exist or is invalid.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, using defaults");
            return Self::default();
        }

        let mut config: Self = match fs::File::open(path) {
            Ok(mut file) => {
                let mut contents = String::new();
                if let Err(e) = file.read_to_string(&mut contents) {
                    warn!("Failed to read config file: {e}");
                    return Self::default();
                }

                match toml::from_str(&contents) {
                    Ok(config) => {
                        info!("Loaded config from {}", path.display());
                        config
                    },
                    Err(e) => {
                        warn!("Failed to parse config file: {e}");
                        return Self::default();
                    },
                }
            },
            Err(e) => {
                warn!("Failed to open config file: {e}");
                return Self::default();
            },
        };

        config.validate();
        config
    }

    /// Save configuration to a specific path.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let mut file = fs::File::create(path)?;
        file.write_all(contents.as_bytes())?;

        info!("Saved config to {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path.
    fn config_path() -> PathBuf {
        if let Some(config_dir) = dirs_config_path() {
            config_dir.join("ecosort").join(CONFIG_FILE)
        } else {
            PathBuf::from(CONFIG_FILE)
        }
    }

    /// Validate and clamp configuration values to sensible ranges.
    pub fn validate(&mut self) {
        // Frame
        self.target_fps = self.target_fps.clamp(30, 240);
        self.fixed_delta = self.fixed_delta.map(|dt| dt.clamp(0.001, 0.25));

        // Audio
        self.sfx_volume = self.sfx_volume.clamp(0.0, 1.0);

        // Gameplay
        self.gameplay.validate();
    }

    /// Whether runs under this config are reproducible frame for frame.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.fixed_delta.is_some()
    }
}

/// Get platform-specific config directory.
fn dirs_config_path() -> Option<PathBuf> {
    #[cfg(target_os = "macos")]
    {
        std::env::var("HOME")
            .ok()
            .map(|home| PathBuf::from(home).join("Library/Application Support"))
    }

    #[cfg(target_os = "windows")]
    {
        std::env::var("APPDATA").ok().map(PathBuf::from)
    }

    #[cfg(target_os = "linux")]
    {
        std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| std::env::var("HOME").ok().map(|h| PathBuf::from(h).join(".config")))
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}
