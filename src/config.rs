//! Engine configuration.
//!
//! Every setting has a default matching the dashboards' historical
//! behaviour; a TOML file only needs to name what it overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation / loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("histogram.bins must be at least 1")]
    ZeroBins,

    #[error("{0} must be at least 1")]
    ZeroCap(&'static str),

    #[error("years.min ({min}) is greater than years.max ({max})")]
    InvertedYears { min: i32, max: i32 },

    #[error("field alias list `{0}` is empty")]
    NoAliases(&'static str),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub fields: FieldNames,

    #[serde(default)]
    pub histogram: HistogramConfig,

    #[serde(default)]
    pub scatter: ScatterConfig,

    #[serde(default)]
    pub years: YearBounds,

    #[serde(default)]
    pub ranking: RankingConfig,
}

/// Names of the well-known record fields.
///
/// `date` and `category` are alias lists tried in order, since the API
/// serves `Fecha` for radiance rows and `fecha` for GDP rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNames {
    #[serde(default = "default_date_fields")]
    pub date: Vec<String>,

    #[serde(default = "default_category_fields")]
    pub category: Vec<String>,

    /// Mean radiance per observation.
    #[serde(default = "default_radiance")]
    pub radiance: String,

    /// Radiance summed over the municipality's pixels.
    #[serde(default = "default_radiance_sum")]
    pub radiance_sum: String,

    /// Municipal GDP.
    #[serde(default = "default_gdp")]
    pub gdp: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            date: default_date_fields(),
            category: default_category_fields(),
            radiance: default_radiance(),
            radiance_sum: default_radiance_sum(),
            gdp: default_gdp(),
        }
    }
}

fn default_date_fields() -> Vec<String> {
    vec!["Fecha".to_string(), "fecha".to_string()]
}

fn default_category_fields() -> Vec<String> {
    vec!["Municipio".to_string(), "municipio".to_string()]
}

fn default_radiance() -> String {
    "Media_de_radianza".to_string()
}

fn default_radiance_sum() -> String {
    "Suma_de_radianza".to_string()
}

fn default_gdp() -> String {
    "pib_mun".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramConfig {
    #[serde(default = "default_bins")]
    pub bins: usize,

    /// Series longer than this are stride-sampled before binning.
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            sample_cap: default_sample_cap(),
        }
    }
}

fn default_bins() -> usize {
    20
}

fn default_sample_cap() -> usize {
    2000
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterConfig {
    #[serde(default = "default_max_points")]
    pub max_points_per_group: usize,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            max_points_per_group: default_max_points(),
        }
    }
}

fn default_max_points() -> usize {
    500
}

/// Inclusive range of years accepted by year extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearBounds {
    #[serde(default = "default_min_year")]
    pub min: i32,

    #[serde(default = "default_max_year")]
    pub max: i32,
}

impl Default for YearBounds {
    fn default() -> Self {
        Self {
            min: default_min_year(),
            max: default_max_year(),
        }
    }
}

impl YearBounds {
    pub fn contains(&self, year: i32) -> bool {
        (self.min..=self.max).contains(&year)
    }
}

fn default_min_year() -> i32 {
    2000
}

fn default_max_year() -> i32 {
    2100
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_top")]
    pub top: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self { top: default_top() }
    }
}

fn default_top() -> usize {
    10
}

impl EngineConfig {
    /// Load and validate a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.histogram.bins == 0 {
            return Err(ConfigError::ZeroBins);
        }
        if self.histogram.sample_cap == 0 {
            return Err(ConfigError::ZeroCap("histogram.sample_cap"));
        }
        if self.scatter.max_points_per_group == 0 {
            return Err(ConfigError::ZeroCap("scatter.max_points_per_group"));
        }
        if self.ranking.top == 0 {
            return Err(ConfigError::ZeroCap("ranking.top"));
        }
        if self.years.min > self.years.max {
            return Err(ConfigError::InvertedYears {
                min: self.years.min,
                max: self.years.max,
            });
        }
        if self.fields.date.is_empty() {
            return Err(ConfigError::NoAliases("fields.date"));
        }
        if self.fields.category.is_empty() {
            return Err(ConfigError::NoAliases("fields.category"));
        }
        Ok(())
    }
}
