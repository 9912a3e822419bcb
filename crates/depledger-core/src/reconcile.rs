use std::collections::BTreeMap;

use crate::model::{License, LicenseOrigin, MavenDependency};

/// Union of the prior (curated) and freshly extracted license sets, keyed by
/// primary link. On a shared link the prior record wins wholesale, so manual
/// classifications survive reruns no matter which dependency referenced the
/// link. A link whose upstream display name changed keeps the prior name; see
/// DESIGN.md for why that is preserved as-is.
pub fn merge_license_sets(prior: &[License], fresh: &[License]) -> Vec<License> {
    let mut merged: BTreeMap<String, License> = BTreeMap::new();
    for license in fresh {
        merged.insert(license.primary_link.clone(), license.clone());
    }
    for license in prior {
        merged.insert(license.primary_link.clone(), license.clone());
    }
    merged.into_values().collect()
}

/// Rebuilds each freshly extracted dependency against the merged license set,
/// classifies its license origin, and assigns stable indices over the sorted
/// list. Pure data transformation; never touches the network.
pub fn reconcile(fresh: &[MavenDependency], merged: &[License]) -> Vec<MavenDependency> {
    let by_link: BTreeMap<&str, &License> = merged
        .iter()
        .map(|license| (license.primary_link.as_str(), license))
        .collect();

    let mut out: Vec<MavenDependency> = Vec::with_capacity(fresh.len());
    for dep in fresh {
        let mut licenses: Vec<License> = Vec::with_capacity(dep.license.len());
        let mut manual = 0usize;
        for license in &dep.license {
            let resolved = by_link
                .get(license.primary_link.as_str())
                .map(|found| (*found).clone())
                .unwrap_or_else(|| license.clone());
            if resolved.needs_manual_work() {
                manual += 1;
            }
            licenses.push(resolved);
        }
        let origin = classify_origin(licenses.len(), manual);
        out.push(MavenDependency {
            index: 0,
            artifact_name: dep.artifact_name.clone(),
            artifact_version: dep.artifact_version.clone(),
            license: licenses,
            origin_of_license: origin,
        });
    }

    out.sort_by(|a, b| a.artifact_name.cmp(&b.artifact_name));
    for (i, dep) in out.iter_mut().enumerate() {
        dep.index = i as u32;
    }
    out
}

fn classify_origin(total: usize, manual: usize) -> LicenseOrigin {
    if total == 0 {
        LicenseOrigin::Unknown
    } else if manual == total {
        LicenseOrigin::Manual
    } else if manual == 0 {
        LicenseOrigin::EntirelyFromPom
    } else {
        LicenseOrigin::PartiallyFromPom
    }
}
