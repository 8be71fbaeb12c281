//! Configuration Integration Tests
//!
//! Builds the whole engine from environment variables, the way the `local`
//! binary does.

use std::env;

use serial_test::serial;
use tempfile::TempDir;

use hyuga_backend::ProjectBackend;
use hyuga_common::{Config, LogFormat};

const KEYS: [&str; 5] = [
    "HYUGA_DATA_DIR",
    "BACKEND_PROVIDER",
    "LOG_LEVEL",
    "RUST_LOG",
    "LOG_FORMAT",
];

fn clear_env() {
    for key in KEYS {
        env::remove_var(key);
    }
}

#[tokio::test]
#[serial]
async fn test_local_engine_from_env() {
    clear_env();
    let dir = TempDir::new().unwrap();
    env::set_var("HYUGA_DATA_DIR", dir.path());
    env::set_var("LOG_FORMAT", "json");

    let config = Config::from_env().unwrap();
    assert_eq!(config.log_format, LogFormat::Json);

    let app = hyuga_app::create_app(&config).unwrap();
    let project = app.catalog.create_project().await.unwrap();
    assert!(dir
        .path()
        .join("projects")
        .join(format!("project-{}", project.id))
        .is_dir());
    clear_env();
}

#[tokio::test]
#[serial]
async fn test_mock_engine_from_env() {
    clear_env();
    env::set_var("HYUGA_DATA_DIR", "/nonexistent/hyuga");
    env::set_var("BACKEND_PROVIDER", "mock");

    let config = Config::from_env().unwrap();
    let app = hyuga_app::create_app(&config).unwrap();
    app.catalog.create_project().await.unwrap();
    assert_eq!(app.backend.list_projects().await.unwrap().len(), 1);
    assert!(!std::path::Path::new("/nonexistent/hyuga").exists());
    clear_env();
}

#[test]
#[serial]
fn test_unknown_provider_fails_at_startup() {
    clear_env();
    env::set_var("HYUGA_DATA_DIR", "/tmp/hyuga-unknown");
    env::set_var("BACKEND_PROVIDER", "s3");

    let config = Config::from_env().unwrap();
    let error = hyuga_app::create_app(&config).err().unwrap();
    assert!(error.to_string().contains("s3"));
    clear_env();
}
