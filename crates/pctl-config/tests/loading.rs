use pctl_config::{load, ConfigError};
use std::path::Path;

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

#[test]
fn load_valid_fixture() {
    let seed = load(fixture("minimal.yaml")).expect("should load without error");
    assert_eq!(seed.cluster.name, "demo-hpc");
    assert_eq!(seed.compute.queues.len(), 1);
    assert_eq!(seed.users.len(), 1);
}

#[test]
fn load_fixture_with_bad_region_reports_validation_error() {
    let err = load(fixture("invalid_region.yaml")).unwrap_err();
    match err {
        ConfigError::Invalid { source, .. } => {
            assert!(source.0.iter().any(|e| e.path == "cluster.region"));
        }
        other => panic!("expected ConfigError::Invalid, got {other:?}"),
    }
}

#[test]
fn missing_file_is_an_io_error() {
    let err = load("/nonexistent/path/does/not/exist.yaml").unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }));
}
