use serial_test::serial;
use std::env;
use std::fs::write;
use swarm_provenance::load_config::load_config;
use swarm_provenance_core::config::ConfigOverrides;
use swarm_provenance_core::ProvenanceError;
use tempfile::NamedTempFile;

const VARS: &[&str] = &[
    "BEE_GATEWAY_URL",
    "DEFAULT_PROVENANCE_STANDARD",
    "DEFAULT_POSTAGE_DEPTH",
    "BEE_POSTAGE_BATCH_ID",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn env_file_values_are_loaded() {
    clear_env();
    let env_file = NamedTempFile::new().expect("temp file");
    write(
        env_file.path(),
        "BEE_GATEWAY_URL=http://localhost:1633\nDEFAULT_PROVENANCE_STANDARD=PROV-V1\nDEFAULT_POSTAGE_DEPTH=21\n",
    )
    .unwrap();

    let config = load_config(Some(env_file.path()), &ConfigOverrides::default())
        .expect("Config should load");

    assert_eq!(config.gateway_url.as_str(), "http://localhost:1633/");
    assert_eq!(config.default_standard, "PROV-V1");
    assert_eq!(config.stamp_depth, 21);
    clear_env();
}

#[test]
#[serial]
fn process_environment_wins_over_env_file() {
    clear_env();
    env::set_var("BEE_GATEWAY_URL", "http://bee.internal:1633");
    let env_file = NamedTempFile::new().expect("temp file");
    write(env_file.path(), "BEE_GATEWAY_URL=http://localhost:1633\n").unwrap();

    let config = load_config(Some(env_file.path()), &ConfigOverrides::default()).unwrap();
    assert_eq!(config.gateway_url.as_str(), "http://bee.internal:1633/");
    clear_env();
}

#[test]
#[serial]
fn cli_override_wins_over_environment() {
    clear_env();
    env::set_var("BEE_GATEWAY_URL", "http://bee.internal:1633");
    let env_file = NamedTempFile::new().expect("temp file");

    let overrides = ConfigOverrides {
        gateway_url: Some("http://127.0.0.1:8080".to_string()),
        ..Default::default()
    };
    let config = load_config(Some(env_file.path()), &overrides).unwrap();
    assert_eq!(config.gateway_url.as_str(), "http://127.0.0.1:8080/");
    clear_env();
}

#[test]
#[serial]
fn missing_env_file_is_a_configuration_error() {
    clear_env();
    let err = load_config(
        Some(std::path::Path::new("/definitely/not/here.env")),
        &ConfigOverrides::default(),
    )
    .unwrap_err();
    let inner = err
        .downcast_ref::<ProvenanceError>()
        .expect("configuration error expected");
    assert!(matches!(inner, ProvenanceError::Configuration(_)));
}

#[test]
#[serial]
fn missing_gateway_url_is_reported() {
    clear_env();
    let env_file = NamedTempFile::new().expect("temp file");
    write(env_file.path(), "DEFAULT_PROVENANCE_STANDARD=PROV-V1\n").unwrap();

    let err = load_config(Some(env_file.path()), &ConfigOverrides::default()).unwrap_err();
    assert!(
        err.to_string().contains("BEE_GATEWAY_URL"),
        "unexpected error: {err}"
    );
    clear_env();
}
