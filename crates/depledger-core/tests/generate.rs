use std::cell::Cell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use depledger_core::bazel::BazelRunner;
use depledger_core::extract::LicenseFetcher;
use depledger_core::model::{LicenseOrigin, Manifest, PrimaryLinkType};
use depledger_core::pipeline::{generate, GenerateOptions};
use depledger_core::validate::Gate;
use serde_json::json;

const DATA_BINDING_COORD: &str = "androidx.databinding:databinding-adapters:3.4.2";
const DATA_BINDING_JAR: &str = "https://maven.google.com/androidx/databinding/databinding-adapters/3.4.2/databinding-adapters-3.4.2.jar";
const DATA_BINDING_POM: &str = "https://maven.google.com/androidx/databinding/databinding-adapters/3.4.2/databinding-adapters-3.4.2.pom";
const APACHE_LINK: &str = "https://apache.org/LICENSE-2.0";

fn create_temp_dir(prefix: &str) -> PathBuf {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);

    let base = std::env::temp_dir();
    let pid = std::process::id();
    for _ in 0..10_000 {
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = base.join(format!("{prefix}_{pid}_{n}"));
        if std::fs::create_dir(&path).is_ok() {
            return path;
        }
    }
    panic!("failed to create temp dir under {}", base.display());
}

fn write_lock_file(dir: &Path, entries: &[(&str, &str)]) -> PathBuf {
    let deps: Vec<_> = entries
        .iter()
        .map(|(coord, url)| json!({ "coord": coord, "url": url }))
        .collect();
    let lock = json!({ "dependency_tree": { "dependencies": deps } });
    let path = dir.join("maven_install.json");
    std::fs::write(&path, serde_json::to_vec_pretty(&lock).unwrap()).unwrap();
    path
}

struct FakeFetcher {
    docs: BTreeMap<String, String>,
}

impl LicenseFetcher for FakeFetcher {
    fn fetch(&self, url: &str) -> anyhow::Result<String> {
        match self.docs.get(url) {
            Some(doc) => Ok(doc.clone()),
            None => anyhow::bail!("connection refused"),
        }
    }
}

struct FakeRunner {
    query_lines: Vec<String>,
    repins: Cell<u32>,
}

impl FakeRunner {
    fn reporting(targets: &[&str]) -> Self {
        FakeRunner {
            query_lines: targets.iter().map(|t| format!("@maven//:{t}")).collect(),
            repins: Cell::new(0),
        }
    }
}

impl BazelRunner for FakeRunner {
    fn run_query(&self) -> anyhow::Result<Vec<String>> {
        Ok(self.query_lines.clone())
    }

    fn run_repin(&self) -> anyhow::Result<()> {
        self.repins.set(self.repins.get() + 1);
        Ok(())
    }
}

fn apache_pom() -> String {
    format!(
        "<project><licenses><license><name>Apache 2.0</name><url>{APACHE_LINK}</url></license></licenses></project>"
    )
}

#[test]
fn fresh_license_is_persisted_unspecified_and_trips_gate_a() {
    let dir = create_temp_dir("depledger_gen_fresh");
    let lock = write_lock_file(&dir, &[(DATA_BINDING_COORD, DATA_BINDING_JAR)]);
    let manifest_path = dir.join("maven_dependencies.json");

    let fetcher = FakeFetcher {
        docs: BTreeMap::from([(DATA_BINDING_POM.to_string(), apache_pom())]),
    };
    let runner = FakeRunner::reporting(&["androidx_databinding_databinding_adapters"]);

    let opts = GenerateOptions {
        lock_file: lock,
        manifest_file: manifest_path.clone(),
        repin: true,
    };
    let report = generate(&opts, &fetcher, &runner).unwrap();

    assert_eq!(runner.repins.get(), 1);
    assert_eq!(report.dependency_count, 1);
    assert_eq!(report.license_count, 1);
    let failure = report.gate_failure.expect("gate A failure");
    assert_eq!(failure.gate, Gate::BrokenLicenseDetails);
    assert!(failure.listing.contains(APACHE_LINK));

    // The manifest was persisted before validation ran.
    let persisted: Manifest =
        serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
    assert_eq!(persisted.dependencies.len(), 1);
    let dep = &persisted.dependencies[0];
    assert_eq!(dep.artifact_name, DATA_BINDING_COORD);
    assert_eq!(dep.artifact_version, "3.4.2");
    assert_eq!(dep.license[0].primary_link_type, PrimaryLinkType::Unspecified);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn prior_classification_survives_a_rerun_and_all_gates_pass() {
    let dir = create_temp_dir("depledger_gen_prior");
    let lock = write_lock_file(&dir, &[(DATA_BINDING_COORD, DATA_BINDING_JAR)]);
    let manifest_path = dir.join("maven_dependencies.json");

    let prior = json!({
        "schema_version": "depledger.manifest@0.1.0",
        "dependencies": [{
            "index": 0,
            "artifact_name": DATA_BINDING_COORD,
            "artifact_version": "3.4.2",
            "license": [{
                "license_name": "Apache 2.0",
                "primary_link": APACHE_LINK,
                "primary_link_type": "SCRAPE_DIRECTLY"
            }],
            "origin_of_license": "ENTIRELY_FROM_POM"
        }]
    });
    std::fs::write(&manifest_path, serde_json::to_vec_pretty(&prior).unwrap()).unwrap();

    let fetcher = FakeFetcher {
        docs: BTreeMap::from([(DATA_BINDING_POM.to_string(), apache_pom())]),
    };
    let runner = FakeRunner::reporting(&["androidx_databinding_databinding_adapters"]);

    let opts = GenerateOptions {
        lock_file: lock,
        manifest_file: manifest_path.clone(),
        repin: false,
    };
    let report = generate(&opts, &fetcher, &runner).unwrap();

    assert_eq!(runner.repins.get(), 0);
    assert!(report.gate_failure.is_none());

    let persisted: Manifest =
        serde_json::from_slice(&std::fs::read(&manifest_path).unwrap()).unwrap();
    let dep = &persisted.dependencies[0];
    assert_eq!(
        dep.license[0].primary_link_type,
        PrimaryLinkType::ScrapeDirectly
    );
    assert_eq!(dep.origin_of_license, LicenseOrigin::EntirelyFromPom);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn unreachable_pom_aborts_the_run_without_writing_the_manifest() {
    let dir = create_temp_dir("depledger_gen_unreachable");
    let lock = write_lock_file(&dir, &[(DATA_BINDING_COORD, DATA_BINDING_JAR)]);
    let manifest_path = dir.join("maven_dependencies.json");

    let fetcher = FakeFetcher {
        docs: BTreeMap::new(),
    };
    let runner = FakeRunner::reporting(&["androidx_databinding_databinding_adapters"]);

    let opts = GenerateOptions {
        lock_file: lock,
        manifest_file: manifest_path.clone(),
        repin: false,
    };
    let err = generate(&opts, &fetcher, &runner).unwrap_err();
    let text = format!("{err:#}");
    assert!(text.contains("unreachable manifest"));
    assert!(text.contains(DATA_BINDING_POM));
    assert!(text.contains(DATA_BINDING_COORD));
    assert!(!manifest_path.exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn dependencies_outside_the_build_graph_are_dropped_silently() {
    let dir = create_temp_dir("depledger_gen_unreached");
    let lock = write_lock_file(
        &dir,
        &[
            (DATA_BINDING_COORD, DATA_BINDING_JAR),
            (
                "com.example:unused:1.0",
                "https://repo.example/com/example/unused/1.0/unused-1.0.jar",
            ),
        ],
    );
    let manifest_path = dir.join("maven_dependencies.json");

    // Only the databinding artifact is reachable; the unused one has no POM
    // registered and would fail the run if it were fetched.
    let fetcher = FakeFetcher {
        docs: BTreeMap::from([(DATA_BINDING_POM.to_string(), apache_pom())]),
    };
    let runner = FakeRunner::reporting(&["androidx_databinding_databinding_adapters"]);

    let opts = GenerateOptions {
        lock_file: lock,
        manifest_file: manifest_path,
        repin: false,
    };
    let report = generate(&opts, &fetcher, &runner).unwrap();
    assert_eq!(report.dependency_count, 1);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn truncated_pom_is_fatal_and_names_the_dependency() {
    let dir = create_temp_dir("depledger_gen_truncated");
    let lock = write_lock_file(&dir, &[(DATA_BINDING_COORD, DATA_BINDING_JAR)]);
    let manifest_path = dir.join("maven_dependencies.json");

    let fetcher = FakeFetcher {
        docs: BTreeMap::from([(
            DATA_BINDING_POM.to_string(),
            "<licenses><license><name>Apache with no terminator".to_string(),
        )]),
    };
    let runner = FakeRunner::reporting(&["androidx_databinding_databinding_adapters"]);

    let opts = GenerateOptions {
        lock_file: lock,
        manifest_file: manifest_path,
        repin: false,
    };
    let err = generate(&opts, &fetcher, &runner).unwrap_err();
    let text = format!("{err:#}");
    assert!(text.contains("truncated licenses block"));
    assert!(text.contains(DATA_BINDING_COORD));

    let _ = std::fs::remove_dir_all(&dir);
}
