use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::bazel::{self, BazelRunner};
use crate::extract::{self, LicenseFetcher};
use crate::model::{License, LicenseOrigin, Manifest, MavenDependency, MANIFEST_SCHEMA_VERSION};
use crate::validate::GateFailure;
use crate::{coord, intersect, lockfile, reconcile, store, validate};

pub const REPORT_SCHEMA_VERSION: &str = "depledger.report@0.1.0";

#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Path to `maven_install.json`.
    pub lock_file: PathBuf,
    /// Path of the persisted license manifest, read and rewritten in place.
    pub manifest_file: PathBuf,
    /// Whether to re-pin the lock file before querying.
    pub repin: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub schema_version: String,
    pub dependency_count: usize,
    pub license_count: usize,
    /// The first validation gate that found violations, if any. The manifest
    /// on disk is already updated either way.
    pub gate_failure: Option<GateFailure>,
}

/// Runs the whole reconciliation sequentially: re-pin, query the build graph,
/// intersect the lock file against it, scan each reachable dependency's POM,
/// merge against the prior manifest, persist, then validate. Any fetch or
/// subprocess failure aborts the run before the manifest is touched; gate
/// failures are reported only after the manifest has been written.
pub fn generate(
    opts: &GenerateOptions,
    fetcher: &dyn LicenseFetcher,
    runner: &dyn BazelRunner,
) -> Result<RunReport> {
    if opts.repin {
        runner.run_repin().context("re-pin maven dependencies")?;
    }
    let query_lines = runner
        .run_query()
        .context("query reachable maven targets")?;
    let reachable = bazel::reachable_target_names(&query_lines);

    let raw = lockfile::parse_lock_file(&opts.lock_file)?;
    let declared = intersect::intersect(&raw, &reachable)?;

    let mut fresh: Vec<MavenDependency> = Vec::with_capacity(declared.len());
    for dep in &declared {
        let licenses = extract::extract_licenses(fetcher, dep)?;
        fresh.push(MavenDependency {
            index: fresh.len() as u32,
            artifact_name: dep.coord.clone(),
            artifact_version: coord::version_of(&dep.coord)?.to_string(),
            license: licenses,
            origin_of_license: LicenseOrigin::Unknown,
        });
    }

    let prior = store::load(&opts.manifest_file)?;
    let prior_licenses: Vec<License> = prior
        .dependencies
        .iter()
        .flat_map(|dep| dep.license.iter().cloned())
        .collect();
    let fresh_licenses: Vec<License> = fresh
        .iter()
        .flat_map(|dep| dep.license.iter().cloned())
        .collect();
    let merged = reconcile::merge_license_sets(&prior_licenses, &fresh_licenses);
    let dependencies = reconcile::reconcile(&fresh, &merged);

    let manifest = Manifest {
        schema_version: MANIFEST_SCHEMA_VERSION.to_string(),
        dependencies,
    };
    store::save(&opts.manifest_file, &manifest)?;

    let gate_failure = validate::run_gates(&manifest);
    Ok(RunReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        dependency_count: manifest.dependencies.len(),
        license_count: manifest.license_count(),
        gate_failure,
    })
}
