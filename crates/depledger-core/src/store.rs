use std::path::Path;

use anyhow::{Context, Result};

use crate::model::{Manifest, MANIFEST_SCHEMA_VERSION};

/// Loads the persisted manifest. A missing or empty file is a fresh start and
/// yields an empty manifest; anything else must parse and carry the expected
/// schema version.
pub fn load(path: &Path) -> Result<Manifest> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Manifest::empty()),
        Err(err) => return Err(err).with_context(|| format!("read {}", path.display())),
    };
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Manifest::empty());
    }
    let manifest: Manifest =
        serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))?;
    if manifest.schema_version.trim() != MANIFEST_SCHEMA_VERSION {
        anyhow::bail!(
            "manifest schema_version mismatch: expected {MANIFEST_SCHEMA_VERSION} got {:?} in {}",
            manifest.schema_version,
            path.display()
        );
    }
    Ok(manifest)
}

/// Writes the manifest atomically: full serialization to a sibling temp file,
/// then rename over the target.
pub fn save(path: &Path, manifest: &Manifest) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create dir: {}", parent.display()))?;
        }
    }
    let mut out = serde_json::to_vec_pretty(manifest)?;
    if out.last() != Some(&b'\n') {
        out.push(b'\n');
    }
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &out).with_context(|| format!("write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("rename {} -> {}", tmp.display(), path.display()))?;
    Ok(())
}
