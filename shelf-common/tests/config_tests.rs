//! Unit tests for configuration and root folder resolution
//!
//! Tests that touch SHELF_ROOT_FOLDER are marked #[serial] so they never
//! race each other on the process environment.

use serial_test::serial;
use shelf_common::config::{
    load_or_default, ConfigSource, load_toml_config, RootFolderInitializer, RootFolderResolver, TomlConfig,
    DATABASE_FILE, ROOT_FOLDER_ENV,
};
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = TomlConfig::default();

    assert_eq!(config.logging.level, "info");
    assert_eq!(config.server.bind_address, "127.0.0.1:5740");
    assert_eq!(config.scraper.timeout_secs, 5);
    assert_eq!(config.engagement.review_max_chars, 1000);
    assert_eq!(config.engagement.reviews_page_limit, 10);
    assert!(config.validate().is_ok());
}

#[test]
fn test_partial_toml_keeps_other_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelf.toml");
    std::fs::write(
        &path,
        r#"
root_folder = "/srv/shelf"

[engagement]
review_max_chars = 500
"#,
    )
    .unwrap();

    let config = load_toml_config(&path).unwrap();
    assert_eq!(config.root_folder, Some(PathBuf::from("/srv/shelf")));
    assert_eq!(config.engagement.review_max_chars, 500);
    assert_eq!(config.engagement.reviews_page_limit, 10);
    assert_eq!(config.scraper.timeout_secs, 5);
}

#[test]
fn test_invalid_values_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelf.toml");
    std::fs::write(&path, "[scraper]\ntimeout_secs = 0\n").unwrap();

    assert!(load_toml_config(&path).is_err());
    // Graceful degradation: the loader falls back to defaults
    let (config, source) = load_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
    assert!(matches!(source, ConfigSource::Fallback(_)));
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let (config, source) = load_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
    assert!(matches!(source, ConfigSource::Defaults));
    assert!(matches!(load_or_default(None).1, ConfigSource::Defaults));
}

#[test]
fn test_malformed_toml_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shelf.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();

    let (config, source) = load_or_default(Some(&path));
    assert_eq!(config, TomlConfig::default());
    assert!(matches!(source, ConfigSource::Fallback(_)));
}

#[test]
#[serial]
fn test_cli_arg_has_highest_priority() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/shelf-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/shelf-toml")),
        ..Default::default()
    };

    let resolved = RootFolderResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/shelf-cli")))
        .with_toml(&config)
        .resolve();

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(resolved, PathBuf::from("/tmp/shelf-cli"));
}

#[test]
#[serial]
fn test_env_var_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/shelf-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/shelf-toml")),
        ..Default::default()
    };

    let resolved = RootFolderResolver::new().with_toml(&config).resolve();

    env::remove_var(ROOT_FOLDER_ENV);
    assert_eq!(resolved, PathBuf::from("/tmp/shelf-env"));
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/shelf-toml")),
        ..Default::default()
    };
    assert_eq!(
        RootFolderResolver::new().with_toml(&config).resolve(),
        PathBuf::from("/tmp/shelf-toml")
    );

    let fallback = RootFolderResolver::new().resolve();
    assert!(!fallback.as_os_str().is_empty());
}

#[test]
fn test_initializer_creates_folder() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("a").join("b");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join(DATABASE_FILE));
}
