use anyhow::Result;

/// A `group:artifact:version` coordinate split into its parts. Coordinates
/// with extra middle segments (classifier/packaging) keep them inside
/// `artifact`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenCoord {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

pub fn parse_coord(coord: &str) -> Result<MavenCoord> {
    let first = coord.find(':');
    let last = coord.rfind(':');
    let (Some(first), Some(last)) = (first, last) else {
        anyhow::bail!("malformed coordinate (expected group:artifact:version): {coord:?}");
    };
    if first == last {
        anyhow::bail!("malformed coordinate (expected group:artifact:version): {coord:?}");
    }
    let group = &coord[..first];
    let artifact = &coord[first + 1..last];
    let version = &coord[last + 1..];
    if group.is_empty() || artifact.is_empty() || version.is_empty() {
        anyhow::bail!("malformed coordinate (empty segment): {coord:?}");
    }
    Ok(MavenCoord {
        group: group.to_string(),
        artifact: artifact.to_string(),
        version: version.to_string(),
    })
}

/// The rightmost colon-delimited segment of a coordinate.
pub fn version_of(coord: &str) -> Result<&str> {
    let Some(idx) = coord.rfind(':') else {
        anyhow::bail!("malformed coordinate (expected group:artifact:version): {coord:?}");
    };
    Ok(&coord[idx + 1..])
}

/// Normalizes a coordinate into the token Bazel uses for the generated maven
/// target: version stripped, then `.`, `:` and `-` all mapped to `_`.
///
/// Distinct artifacts are expected not to collide after mapping; adversarial
/// names like `a.b:c` vs `a:b-c` do (both become `a_b_c`) and are treated as a
/// correctness bug in the inputs, not handled here.
pub fn normalize_coord(coord: &str) -> Result<String> {
    let Some(idx) = coord.rfind(':') else {
        anyhow::bail!("malformed coordinate (expected group:artifact:version): {coord:?}");
    };
    let stem = &coord[..idx];
    Ok(stem
        .chars()
        .map(|c| if matches!(c, '.' | ':' | '-') { '_' } else { c })
        .collect())
}
