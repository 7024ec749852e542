use crate::domain::{AnalysisMethod, Interval, RamanError};
use crate::spectrum::BaselineAnchors;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_G_INTERVAL: Interval = Interval::new(1550.0, 1650.0);
pub const DEFAULT_WIDTH_HEIGHT_PERCENT: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DIntervalPreset {
    Broad,
    Conventional,
}

impl DIntervalPreset {
    pub const fn interval(self) -> Interval {
        match self {
            Self::Broad => Interval::new(1300.0, 1400.0),
            Self::Conventional => Interval::new(1349.0, 1352.0),
        }
    }
}

/// Everything one analysis call needs, passed explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisConfig {
    pub method: AnalysisMethod,
    pub d_interval: Interval,
    pub g_interval: Interval,
    pub d_width_height_percent: f64,
    pub g_width_height_percent: f64,
    /// Gate for the 5-band D-complex fit, which only runs when asked for.
    pub run_expensive_fit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<BaselineAnchors>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            method: AnalysisMethod::Simple,
            d_interval: DIntervalPreset::Broad.interval(),
            g_interval: DEFAULT_G_INTERVAL,
            d_width_height_percent: DEFAULT_WIDTH_HEIGHT_PERCENT,
            g_width_height_percent: DEFAULT_WIDTH_HEIGHT_PERCENT,
            run_expensive_fit: false,
            baseline: None,
        }
    }
}

impl AnalysisConfig {
    /// Switches method. Choosing `voigt` resets both width heights to 50 %.
    pub fn for_method(mut self, method: AnalysisMethod) -> Self {
        self.method = method;
        if method == AnalysisMethod::Voigt {
            self.d_width_height_percent = DEFAULT_WIDTH_HEIGHT_PERCENT;
            self.g_width_height_percent = DEFAULT_WIDTH_HEIGHT_PERCENT;
        }
        self
    }

    pub fn with_d_preset(mut self, preset: DIntervalPreset) -> Self {
        self.d_interval = preset.interval();
        self
    }

    pub fn intervals(&self) -> [Interval; 2] {
        [self.d_interval, self.g_interval]
    }

    /// True when the method is `voigt5d` but the D-complex fit is not enabled,
    /// so every analysis comes back deferred with no peaks.
    pub fn defers_expensive_fit(&self) -> bool {
        self.method == AnalysisMethod::Voigt5d && !self.run_expensive_fit
    }

    pub fn width_fractions(&self) -> [f64; 2] {
        [
            self.d_width_height_percent / 100.0,
            self.g_width_height_percent / 100.0,
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, interval) in [("dInterval", self.d_interval), ("gInterval", self.g_interval)] {
            if !interval.start.is_finite() || !interval.end.is_finite() {
                return Err(ConfigError::Invalid(format!(
                    "{name} bounds must be finite"
                )));
            }
            if interval.is_inverted() {
                return Err(ConfigError::Invalid(format!(
                    "{name} start {} is greater than end {}",
                    interval.start, interval.end
                )));
            }
        }
        for (name, percent) in [
            ("dWidthHeightPercent", self.d_width_height_percent),
            ("gWidthHeightPercent", self.g_width_height_percent),
        ] {
            if !(0.0..=100.0).contains(&percent) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be within 0-100, got {percent}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read analysis config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse analysis config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid analysis config: {0}")]
    Invalid(String),
}

impl From<ConfigError> for RamanError {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Read { .. } => RamanError::io_system("IO.CONFIG_READ", error.to_string()),
            ConfigError::Parse { .. } => {
                RamanError::input_validation("INPUT.CONFIG_PARSE", error.to_string())
            }
            ConfigError::Invalid(_) => {
                RamanError::input_validation("INPUT.CONFIG_INVALID", error.to_string())
            }
        }
    }
}

pub fn load_analysis_config(path: impl AsRef<Path>) -> Result<AnalysisConfig, ConfigError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AnalysisConfig =
        serde_json::from_str(&source).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}
