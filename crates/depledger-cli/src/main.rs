use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use depledger_core::bazel::{BazelClient, DEFAULT_QUERY_EXPRESSION};
use depledger_core::extract::HttpFetcher;
use depledger_core::pipeline::{generate, GenerateOptions};

#[derive(Debug, Parser)]
#[command(name = "depledger")]
#[command(
    about = "Reconciles pinned maven dependencies with curated license metadata.",
    long_about = None
)]
struct Cli {
    /// Workspace root containing the Bazel WORKSPACE.
    #[arg(long)]
    root: PathBuf,

    /// Path to maven_install.json.
    #[arg(long)]
    lock_file: PathBuf,

    /// License manifest to reconcile and rewrite in place.
    #[arg(long)]
    manifest: PathBuf,

    /// Bazel query expression selecting the reachable maven targets.
    #[arg(long, default_value = DEFAULT_QUERY_EXPRESSION)]
    query: String,

    /// Skip re-pinning the lock file before querying.
    #[arg(long)]
    skip_repin: bool,

    /// Print a machine-readable run report instead of plain text.
    #[arg(long)]
    json: bool,

    #[arg(long)]
    quiet: bool,
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let runner = BazelClient::new(&cli.root, cli.query.clone())?;
    let opts = GenerateOptions {
        lock_file: cli.lock_file.clone(),
        manifest_file: cli.manifest.clone(),
        repin: !cli.skip_repin,
    };
    let report = generate(&opts, &HttpFetcher, &runner)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    match &report.gate_failure {
        Some(failure) => {
            if !cli.json {
                eprintln!("{}", failure.listing);
                eprintln!(
                    "validation failed; {} was updated and can be completed by hand before rerunning",
                    cli.manifest.display()
                );
            }
            Ok(ExitCode::from(1))
        }
        None => {
            if !cli.json && !cli.quiet {
                println!(
                    "maven license manifest updated: {} dependencies, {} licenses",
                    report.dependency_count, report.license_count
                );
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
