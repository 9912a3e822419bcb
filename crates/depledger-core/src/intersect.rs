use std::collections::BTreeSet;

use anyhow::Result;

use crate::coord::normalize_coord;
use crate::lockfile::RawDependency;

/// Keeps the lock-file entries whose normalized coordinate is reachable from
/// the build graph, in sorted coordinate order. Entries the build graph never
/// reaches are dropped silently; they are pinned but unused.
pub fn intersect(
    deps: &[RawDependency],
    reachable: &BTreeSet<String>,
) -> Result<Vec<RawDependency>> {
    let mut sorted: Vec<RawDependency> = deps.to_vec();
    sorted.sort_by(|a, b| a.coord.cmp(&b.coord));

    let mut out = Vec::new();
    for dep in sorted {
        if reachable.contains(&normalize_coord(&dep.coord)?) {
            out.push(dep);
        }
    }
    Ok(out)
}
