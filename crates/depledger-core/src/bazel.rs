use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};

pub const DEFAULT_QUERY_EXPRESSION: &str =
    "deps(deps(//:app) intersect //third_party/...) intersect @maven//...";

const MAVEN_TARGET_PREFIX: &str = "@maven//:";

/// Narrow capability interface over the build tool, injected into the engine
/// so runs are testable without a real Bazel on the path.
pub trait BazelRunner {
    /// Returns the raw target lines printed by the build-graph query.
    fn run_query(&self) -> Result<Vec<String>>;

    /// Re-pins the maven lock file against the unpinned repository.
    fn run_repin(&self) -> Result<()>;
}

pub struct BazelClient {
    workspace_root: PathBuf,
    query_expression: String,
}

impl BazelClient {
    pub fn new(workspace_root: &Path, query_expression: String) -> Result<Self> {
        if !workspace_root.is_dir() {
            anyhow::bail!(
                "workspace root is not a directory: {}",
                workspace_root.display()
            );
        }
        Ok(BazelClient {
            workspace_root: workspace_root.to_path_buf(),
            query_expression,
        })
    }
}

impl BazelRunner for BazelClient {
    fn run_query(&self) -> Result<Vec<String>> {
        let out = Command::new("bazel")
            .arg("query")
            .arg(&self.query_expression)
            .current_dir(&self.workspace_root)
            .output()
            .with_context(|| format!("run bazel query in {}", self.workspace_root.display()))?;
        // Bazel exits 3 when part of a query expression matches no targets,
        // which is an acceptable outcome for this query.
        let code = out.status.code().unwrap_or(-1);
        if !matches!(code, 0 | 3) {
            anyhow::bail!(
                "bazel query failed (exit {code}): {}\nStandard output:\n{}\nError output:\n{}",
                self.query_expression,
                String::from_utf8_lossy(&out.stdout),
                String::from_utf8_lossy(&out.stderr)
            );
        }
        let stdout = String::from_utf8_lossy(&out.stdout);
        Ok(stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    fn run_repin(&self) -> Result<()> {
        let out = Command::new("bazel")
            .arg("run")
            .arg("@unpinned_maven//:pin")
            .env("REPIN", "1")
            .current_dir(&self.workspace_root)
            .output()
            .with_context(|| format!("run maven re-pin in {}", self.workspace_root.display()))?;
        if !out.status.success() {
            anyhow::bail!(
                "maven re-pin failed (exit {}):\nStandard output:\n{}\nError output:\n{}",
                out.status.code().unwrap_or(-1),
                String::from_utf8_lossy(&out.stdout),
                String::from_utf8_lossy(&out.stderr)
            );
        }
        Ok(())
    }
}

/// Extracts the normalized target names from raw query output, keeping only
/// `@maven//:` targets. Stray output lines are skipped rather than sliced
/// blindly.
pub fn reachable_target_names(lines: &[String]) -> BTreeSet<String> {
    lines
        .iter()
        .filter_map(|line| line.strip_prefix(MAVEN_TARGET_PREFIX))
        .map(String::from)
        .collect()
}
