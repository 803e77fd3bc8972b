//! Bundle manifest export (JSON).
//!
//! Written next to the `daily/` directory after every build so a later
//! `verify` can check the files against what was produced.

use crate::batch::BatchSummary;
use crate::config::BundleConfig;
use crate::writer::OutputFormat;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use dailybar_core::{NormalizeReport, Normalizer, SeriesHash};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolEntry {
    pub symbol: String,
    pub file: String,
    pub rows: usize,
    pub hash: SeriesHash,
    pub report: NormalizeReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEntry {
    pub symbol: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleManifest {
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub calendar: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub sessions: usize,
    pub anomaly_dates: Vec<NaiveDate>,
    pub format: OutputFormat,
    pub symbols: Vec<SymbolEntry>,
    pub failures: Vec<FailureEntry>,
}

impl BundleManifest {
    pub fn from_summary(
        config: &BundleConfig,
        normalizer: &Normalizer,
        summary: &BatchSummary,
    ) -> Self {
        let symbols = summary
            .outcomes
            .iter()
            .map(|o| SymbolEntry {
                symbol: o.symbol.clone(),
                file: o
                    .path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                rows: o.rows,
                hash: o.hash.clone(),
                report: o.report.clone(),
            })
            .collect();
        let failures = summary
            .errors
            .iter()
            .map(|(symbol, e)| FailureEntry {
                symbol: symbol.clone(),
                error: e.to_string(),
            })
            .collect();

        Self {
            created_at: chrono::Utc::now(),
            calendar: config.calendar.to_uppercase(),
            start: normalizer.calendar().first(),
            end: normalizer.calendar().last(),
            sessions: normalizer.calendar().len(),
            anomaly_dates: normalizer.anomalies().iter().collect(),
            format: config.format,
            symbols,
            failures,
        }
    }

    pub fn entry(&self, symbol: &str) -> Option<&SymbolEntry> {
        self.symbols.iter().find(|e| e.symbol == symbol)
    }
}

pub fn write_manifest(path: &Path, manifest: &BundleManifest) -> Result<()> {
    let json = serde_json::to_string_pretty(manifest)
        .context("Failed to serialize bundle manifest")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<BundleManifest> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest from {}", path.display()))?;
    serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse manifest {}", path.display()))
}
