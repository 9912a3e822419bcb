use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::Serialize;

use crate::model::{License, Manifest, MavenDependency, PrimaryLinkType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Gate {
    BrokenLicenseDetails,
    NoOrInvalidLicenseLinks,
    NeedsHumanIntervention,
}

/// The first gate that found violations, with the full human-readable
/// listing. Gates never stop at the first offending entry; they do stop at
/// the first offending gate.
#[derive(Debug, Clone, Serialize)]
pub struct GateFailure {
    pub gate: Gate,
    pub listing: String,
}

/// Gate A: licenses whose details a curator still has to complete, deduplicated
/// by primary link.
pub fn broken_licenses(manifest: &Manifest) -> Vec<&License> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut out = Vec::new();
    for dep in &manifest.dependencies {
        for license in &dep.license {
            if license.is_broken() && seen.insert(license.primary_link.as_str()) {
                out.push(license);
            }
        }
    }
    out
}

/// Gate B: dependencies with no license at all, or with a license whose
/// primary link is known to be invalid.
pub fn deps_with_no_or_invalid_links(manifest: &Manifest) -> Vec<&MavenDependency> {
    manifest
        .dependencies
        .iter()
        .filter(|dep| {
            dep.license.is_empty()
                || dep
                    .license
                    .iter()
                    .any(|l| l.primary_link_type == PrimaryLinkType::InvalidLink)
        })
        .collect()
}

/// Gate C: dependencies carrying a license that needs human intervention.
pub fn deps_needing_intervention(manifest: &Manifest) -> Vec<&MavenDependency> {
    manifest
        .dependencies
        .iter()
        .filter(|dep| {
            dep.license
                .iter()
                .any(|l| l.primary_link_type == PrimaryLinkType::NeedsIntervention)
        })
        .collect()
}

/// Runs the three gates in order. Each gate collects all of its violations;
/// the first non-empty gate is reported and the later gates do not run. The
/// caller is expected to have persisted the manifest already, so a failing
/// run leaves something an operator can hand-edit and rerun against.
pub fn run_gates(manifest: &Manifest) -> Option<GateFailure> {
    let broken = broken_licenses(manifest);
    if !broken.is_empty() {
        return Some(GateFailure {
            gate: Gate::BrokenLicenseDetails,
            listing: broken_license_listing(&broken),
        });
    }

    let missing = deps_with_no_or_invalid_links(manifest);
    if !missing.is_empty() {
        return Some(GateFailure {
            gate: Gate::NoOrInvalidLicenseLinks,
            listing: dependency_listing(
                "Please provide the license links for the following dependencies manually:",
                &missing,
            ),
        });
    }

    let intervention = deps_needing_intervention(manifest);
    if !intervention.is_empty() {
        return Some(GateFailure {
            gate: Gate::NeedsHumanIntervention,
            listing: dependency_listing(
                "The following dependencies need human intervention; find their license \
                 links and coordinate with the maintainers to resolve them:",
                &intervention,
            ),
        });
    }

    None
}

fn broken_license_listing(licenses: &[&License]) -> String {
    let mut out = String::from("Please provide all the details of the following licenses manually:\n");
    for license in licenses {
        let _ = write!(
            out,
            "\nlicense_name: {}\nprimary_link: {}\nprimary_link_type: {}\nsecondary_link: {}\nsecondary_link_type: {}\nsecondary_license_name: {}\n",
            license.license_name,
            license.primary_link,
            license.primary_link_type.as_str(),
            license.secondary_link,
            license.secondary_link_type.as_str(),
            license.secondary_license_name,
        );
    }
    out
}

fn dependency_listing(header: &str, deps: &[&MavenDependency]) -> String {
    let mut out = String::from(header);
    for dep in deps {
        let _ = write!(out, "\n{}", dep.artifact_name);
    }
    out.push('\n');
    out
}
