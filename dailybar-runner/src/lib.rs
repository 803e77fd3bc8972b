//! dailybar runner — bundle builds on top of `dailybar-core`.
//!
//! This crate provides:
//! - TOML bundle configuration
//! - Parallel per-symbol batch runs with failure isolation
//! - Per-symbol CSV/Parquet files in bundle layout
//! - A JSON manifest of what was written
//! - Post-build verification

pub mod batch;
pub mod bundle;
pub mod config;
pub mod manifest;
pub mod verify;
pub mod writer;

pub use batch::{
    run_batch, BatchProgress, BatchRunner, BatchSummary, LogProgress, SilentProgress,
    SymbolError, SymbolOutcome,
};
pub use bundle::{build_bundle, verify_from_config, BuildOutcome};
pub use config::{BundleConfig, ConfigError, SourceConfig};
pub use manifest::{read_manifest, write_manifest, BundleManifest, MANIFEST_FILE};
pub use verify::{verify_bundle, Problem, VerifyReport};
pub use writer::{BundleWriter, OutputFormat, WriteError};
