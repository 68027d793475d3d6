//! Shared configuration for jankify
//!
//! This crate provides the single source of truth for the tunable values of
//! the vertex perturbation pass. A [`JankConfig`] can only be obtained through
//! validation, so every consumer can rely on its ranges without re-checking.

use std::f32::consts::FRAC_PI_2;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default displacement magnitude multiplier
pub const DEFAULT_JANK_FACTOR: f32 = 0.15;

/// Default exclusion sphere radius as a fraction of neighbor distance
pub const DEFAULT_SPHERE_RATIO: f32 = 0.5;

/// Default maximum displacement as a fraction of neighbor distance
pub const DEFAULT_DISTANCE_RATIO: f32 = 0.5;

/// Default half-angle of the conflict cone (60 degrees)
pub const DEFAULT_ANGLE_THRESHOLD: f32 = std::f32::consts::FRAC_PI_3;

/// Default offset factor. Zero disables the offset pass.
pub const DEFAULT_FAT_FACTOR: f32 = 0.0;

/// Errors raised while building a configuration
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("jank_factor must be finite and >= 0, got {0}")]
    InvalidJankFactor(f32),
    #[error("{name} must be finite and in (0, 1], got {value}")]
    RatioOutOfRange { name: &'static str, value: f32 },
    #[error("angle_threshold must be finite and in (0, pi/2], got {0}")]
    InvalidAngleThreshold(f32),
    #[error("fat_factor must be finite and >= 0, got {0}")]
    InvalidFatFactor(f32),
    #[error("Unknown distance mode: {0}")]
    UnknownDistanceMode(String),
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Which neighbor distance statistic scales the displacement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum DistanceMode {
    /// Mean distance to all neighbors
    #[default]
    Avg = 0,
    /// Distance to the closest neighbor
    Min = 1,
    /// Distance to the farthest neighbor
    Max = 2,
}

impl TryFrom<u8> for DistanceMode {
    type Error = ConfigError;

    /// Legacy numeric codes: 0 = avg, 1 = min, 2 = max.
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::Avg),
            1 => Ok(Self::Min),
            2 => Ok(Self::Max),
            other => Err(ConfigError::UnknownDistanceMode(other.to_string())),
        }
    }
}

impl FromStr for DistanceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "avg" => Ok(Self::Avg),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            _ => Err(ConfigError::UnknownDistanceMode(s.to_string())),
        }
    }
}

impl fmt::Display for DistanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        };
        f.write_str(name)
    }
}

/// Unvalidated settings, as written in a configuration document.
///
/// Missing fields take their defaults. Convert with [`JankSettings::validate`]
/// (or `JankConfig::try_from`) before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JankSettings {
    pub distance_mode: DistanceMode,
    pub jank_factor: f32,
    pub sphere_ratio: f32,
    pub distance_ratio: f32,
    /// Conflict cone half-angle in radians
    pub angle_threshold: f32,
    pub fat_factor: f32,
}

impl Default for JankSettings {
    fn default() -> Self {
        Self {
            distance_mode: DistanceMode::default(),
            jank_factor: DEFAULT_JANK_FACTOR,
            sphere_ratio: DEFAULT_SPHERE_RATIO,
            distance_ratio: DEFAULT_DISTANCE_RATIO,
            angle_threshold: DEFAULT_ANGLE_THRESHOLD,
            fat_factor: DEFAULT_FAT_FACTOR,
        }
    }
}

impl JankSettings {
    /// Check every field and produce an immutable [`JankConfig`].
    pub fn validate(self) -> Result<JankConfig, ConfigError> {
        if !self.jank_factor.is_finite() || self.jank_factor < 0.0 {
            return Err(ConfigError::InvalidJankFactor(self.jank_factor));
        }
        check_ratio("sphere_ratio", self.sphere_ratio)?;
        check_ratio("distance_ratio", self.distance_ratio)?;
        if !self.angle_threshold.is_finite()
            || self.angle_threshold <= 0.0
            || self.angle_threshold > FRAC_PI_2
        {
            return Err(ConfigError::InvalidAngleThreshold(self.angle_threshold));
        }
        if !self.fat_factor.is_finite() || self.fat_factor < 0.0 {
            return Err(ConfigError::InvalidFatFactor(self.fat_factor));
        }

        Ok(JankConfig { settings: self })
    }
}

fn check_ratio(name: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::RatioOutOfRange { name, value })
    }
}

/// Validated, immutable configuration for one batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "JankSettings", into = "JankSettings")]
pub struct JankConfig {
    settings: JankSettings,
}

impl Default for JankConfig {
    fn default() -> Self {
        Self {
            settings: JankSettings::default(),
        }
    }
}

impl TryFrom<JankSettings> for JankConfig {
    type Error = ConfigError;

    fn try_from(settings: JankSettings) -> Result<Self, Self::Error> {
        settings.validate()
    }
}

impl From<JankConfig> for JankSettings {
    fn from(config: JankConfig) -> Self {
        config.settings
    }
}

impl JankConfig {
    /// Create a config with the given mode and jank factor; other fields default.
    pub fn new(distance_mode: DistanceMode, jank_factor: f32) -> Result<Self, ConfigError> {
        JankSettings {
            distance_mode,
            jank_factor,
            ..JankSettings::default()
        }
        .validate()
    }

    /// Load a configuration from a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: JankSettings =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        settings.validate()
    }

    /// Copy of the underlying settings, e.g. to tweak and re-validate.
    pub fn settings(&self) -> JankSettings {
        self.settings
    }

    pub fn distance_mode(&self) -> DistanceMode {
        self.settings.distance_mode
    }

    pub fn jank_factor(&self) -> f32 {
        self.settings.jank_factor
    }

    pub fn sphere_ratio(&self) -> f32 {
        self.settings.sphere_ratio
    }

    pub fn distance_ratio(&self) -> f32 {
        self.settings.distance_ratio
    }

    pub fn angle_threshold(&self) -> f32 {
        self.settings.angle_threshold
    }

    pub fn fat_factor(&self) -> f32 {
        self.settings.fat_factor
    }
}
