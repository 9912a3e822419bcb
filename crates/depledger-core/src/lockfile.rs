use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One entry from the `dependencies` array of `maven_install.json`. Ephemeral:
/// produced fresh each run, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawDependency {
    pub coord: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct LockFile {
    dependency_tree: DependencyTree,
}

#[derive(Debug, Deserialize)]
struct DependencyTree {
    #[serde(default)]
    dependencies: Vec<RawDependency>,
}

/// Reads the pinned dependency list out of `maven_install.json`. A file that
/// does not parse is fatal; there is no partial recovery from a bad lock file.
pub fn parse_lock_file(path: &Path) -> Result<Vec<RawDependency>> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let lock: LockFile = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse maven_install json: {}", path.display()))?;
    Ok(lock.dependency_tree.dependencies)
}
