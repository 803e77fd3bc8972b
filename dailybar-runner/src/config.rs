//! Bundle configuration (TOML).
//!
//! One file describes a full build: the symbols, the session window, the
//! exchange calendar, the anomaly dates to patch, where raw rows come from
//! and where normalized files go.

use chrono::NaiveDate;
use dailybar_core::calendar::{calendar_by_name, CalendarError};
use dailybar_core::data::{CsvProvider, DataProvider, SyntheticProvider};
use dailybar_core::{AnomalyDates, Normalizer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

pub use crate::writer::OutputFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

/// Where raw rows are read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    /// One vendor CSV export per symbol in `dir`.
    Csv { dir: PathBuf },
    /// Seeded random walk; for demos and dry runs.
    Synthetic {
        #[serde(default)]
        gap_probability: Option<f64>,
    },
}

/// Complete configuration of one bundle build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleConfig {
    pub symbols: Vec<String>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default = "default_calendar")]
    pub calendar: String,
    /// Sessions the calendar source is known to miscount.
    #[serde(default)]
    pub anomaly_dates: Vec<NaiveDate>,
    /// Add anomaly dates the calendar omits as extra sessions.
    #[serde(default = "default_true")]
    pub merge_anomalies_into_calendar: bool,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub format: OutputFormat,
    pub source: SourceConfig,
}

fn default_calendar() -> String {
    "XNYS".to_string()
}

fn default_true() -> bool {
    true
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("bundle")
}

impl BundleConfig {
    /// Load and validate a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Mixed equities, futures and indices over 2010–2024 on the NYSE
    /// calendar, with three dates the calendar data is known to miscount.
    pub fn starter() -> Self {
        let symbols = [
            "AAPL", "NFLX", "NVDA", "JPM", "SPY", "GC=F", "SI=F", "CL=F", "ZW=F", "PL=F", "ZC=F",
            "ZS=F", "KC=F", "CC=F", "^GDAXI", "^GSPC",
        ];
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        Self {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            start: date(2010, 1, 4),
            end: date(2024, 12, 31),
            calendar: default_calendar(),
            anomaly_dates: vec![date(2011, 1, 3), date(2016, 10, 10), date(2016, 11, 11)],
            merge_anomalies_into_calendar: true,
            output_dir: default_output_dir(),
            format: OutputFormat::Csv,
            source: SourceConfig::Csv {
                dir: PathBuf::from("raw"),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.symbols.is_empty() {
            return Err(ConfigError::Invalid("no symbols configured".into()));
        }
        let mut seen = HashSet::new();
        for symbol in &self.symbols {
            if symbol.trim().is_empty() {
                return Err(ConfigError::Invalid("empty symbol name".into()));
            }
            // Symbols become file names under the source and output dirs.
            if symbol.contains(['/', '\\']) || symbol.contains("..") {
                return Err(ConfigError::Invalid(format!(
                    "symbol '{symbol}' is not a plain file name"
                )));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate symbol '{symbol}'")));
            }
        }
        if self.start > self.end {
            return Err(ConfigError::Calendar(CalendarError::InvalidRange {
                start: self.start,
                end: self.end,
            }));
        }
        calendar_by_name(&self.calendar)?;
        if let SourceConfig::Synthetic {
            gap_probability: Some(p),
        } = self.source
        {
            if !(0.0..=1.0).contains(&p) {
                return Err(ConfigError::Invalid(format!(
                    "gap_probability must be within [0, 1], got {p}"
                )));
            }
        }
        for date in &self.anomaly_dates {
            if *date < self.start || *date > self.end {
                warn!(%date, "anomaly date outside the configured window");
            }
        }
        Ok(())
    }

    pub fn anomalies(&self) -> AnomalyDates {
        AnomalyDates::new(self.anomaly_dates.iter().copied())
    }

    /// Resolve the calendar window and build the normalizer for this bundle.
    pub fn build_normalizer(&self) -> Result<Normalizer, ConfigError> {
        let exchange = calendar_by_name(&self.calendar)?;
        let mut calendar = exchange.sessions(self.start, self.end)?;
        let anomalies = self.anomalies();
        if self.merge_anomalies_into_calendar {
            let inside = anomalies
                .iter()
                .filter(|d| *d >= self.start && *d <= self.end);
            calendar = calendar.with_extra_sessions(inside);
        }
        Ok(Normalizer::new(calendar, anomalies))
    }

    pub fn provider(&self) -> Box<dyn DataProvider> {
        match &self.source {
            SourceConfig::Csv { dir } => Box::new(CsvProvider::new(dir)),
            SourceConfig::Synthetic { gap_probability } => {
                let mut provider = SyntheticProvider::default();
                if let Some(p) = gap_probability {
                    provider.gap_probability = *p;
                }
                Box::new(provider)
            }
        }
    }
}
