//! End-to-end bundle operations driven by a [`BundleConfig`].

use crate::batch::{run_batch, BatchProgress, BatchSummary};
use crate::config::BundleConfig;
use crate::manifest::{read_manifest, write_manifest, BundleManifest, MANIFEST_FILE};
use crate::verify::{verify_bundle, VerifyReport};
use crate::writer::BundleWriter;
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, warn};

/// What a build produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub summary: BatchSummary,
    pub manifest: BundleManifest,
    pub manifest_path: PathBuf,
}

pub fn writer_for(config: &BundleConfig) -> BundleWriter {
    BundleWriter::new(&config.output_dir, config.format)
}

/// Normalize every configured symbol and write files plus the manifest.
///
/// Per-symbol failures end up in the summary; only setup errors (calendar,
/// output directory, manifest) are returned as `Err`.
pub fn build_bundle(config: &BundleConfig, progress: &dyn BatchProgress) -> Result<BuildOutcome> {
    let normalizer = config
        .build_normalizer()
        .context("Failed to resolve the session calendar")?;
    info!(
        calendar = %config.calendar,
        sessions = normalizer.calendar().len(),
        first = %normalizer.calendar().first(),
        last = %normalizer.calendar().last(),
        anomalies = normalizer.anomalies().len(),
        "calendar resolved"
    );

    let writer = writer_for(config);
    std::fs::create_dir_all(writer.daily_dir()).with_context(|| {
        format!("Failed to create output directory {}", writer.daily_dir().display())
    })?;

    let provider = config.provider();
    info!(provider = provider.name(), symbols = config.symbols.len(), "starting build");
    let summary = run_batch(provider.as_ref(), &normalizer, &writer, &config.symbols, progress);

    let manifest = BundleManifest::from_summary(config, &normalizer, &summary);
    let manifest_path = config.output_dir.join(MANIFEST_FILE);
    write_manifest(&manifest_path, &manifest)?;

    Ok(BuildOutcome {
        summary,
        manifest,
        manifest_path,
    })
}

/// Re-check a built bundle against the config's calendar and its manifest.
pub fn verify_from_config(config: &BundleConfig) -> Result<VerifyReport> {
    let normalizer = config
        .build_normalizer()
        .context("Failed to resolve the session calendar")?;
    let writer = writer_for(config);

    let manifest_path = config.output_dir.join(MANIFEST_FILE);
    let manifest = if manifest_path.exists() {
        Some(read_manifest(&manifest_path)?)
    } else {
        warn!(path = %manifest_path.display(), "no manifest; skipping hash checks");
        None
    };

    Ok(verify_bundle(
        &writer,
        normalizer.calendar(),
        &config.symbols,
        manifest.as_ref(),
    ))
}
