use std::path::Path;
use std::time::Duration;

use vault_migrator::{CliError, Config, ConfigError};
use vault_migrator_backend::{key, Backend, Entry, KeyPath};
use vault_migrator_core::MigrateError;
use vault_migrator_stores::FileBackend;

fn file_to_file(from: &Path, to: &Path, extra: &str) -> String {
    format!(
        r#"{{
            "from": {{ "name": "file", "config": {{ "path": {from:?} }} }},
            "to": {{ "name": "file", "config": {{ "path": {to:?} }} }}{extra}
        }}"#,
        from = from.to_string_lossy(),
        to = to.to_string_lossy(),
        extra = extra,
    )
}

#[tokio::test]
async fn single_run_copies_file_backend() {
    let source_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let destination_root = target_dir.path().join("copy");

    let source = FileBackend::new(source_dir.path().to_path_buf()).unwrap();
    source.put(Entry::new(key!("a"), "1")).await.unwrap();
    source.put(Entry::new(key!("b/c"), "2")).await.unwrap();
    source
        .put(Entry::new(key!("b/d"), "3").with_metadata("version", "2"))
        .await
        .unwrap();

    let config_path = target_dir.path().join("config.json");
    std::fs::write(
        &config_path,
        file_to_file(source_dir.path(), &destination_root, ""),
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap().validate().unwrap();
    vault_migrator::run(config, std::future::pending()).await.unwrap();

    let destination = FileBackend::new(destination_root).unwrap();
    let mut names = destination.list(&KeyPath::root()).await.unwrap();
    names.sort();
    assert_eq!(names, vec!["a", "b/"]);
    for k in ["a", "b/c", "b/d"] {
        let k = KeyPath::parse(k).unwrap();
        assert_eq!(
            destination.get(&k).await.unwrap(),
            source.get(&k).await.unwrap()
        );
    }
}

#[tokio::test]
async fn single_run_surfaces_backend_failure() {
    let source_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    std::fs::write(source_dir.path().join("_broken"), b"not an entry").unwrap();

    let config = Config::from_json(&file_to_file(source_dir.path(), target_dir.path(), ""))
        .unwrap()
        .validate()
        .unwrap();
    let err = vault_migrator::run(config, std::future::pending())
        .await
        .unwrap_err();

    match err {
        CliError::Migrate(MigrateError::Get { key, .. }) => assert_eq!(key, key!("broken")),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn missing_source_directory_fails_before_copying() {
    let target_dir = tempfile::tempdir().unwrap();
    let config = Config::from_json(&file_to_file(
        &target_dir.path().join("absent"),
        &target_dir.path().join("copy"),
        "",
    ))
    .unwrap()
    .validate()
    .unwrap();

    let err = vault_migrator::run(config, std::future::pending())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CliError::Config(ConfigError::OpenBackend { .. })
    ));
    assert!(!target_dir.path().join("copy").exists());
}

#[tokio::test]
async fn scheduled_run_stops_on_shutdown() {
    let source_dir = tempfile::tempdir().unwrap();
    let target_dir = tempfile::tempdir().unwrap();
    let source = FileBackend::new(source_dir.path().to_path_buf()).unwrap();
    source.put(Entry::new(key!("x"), "v1")).await.unwrap();

    let config = Config::from_json(&file_to_file(
        source_dir.path(),
        target_dir.path(),
        r#", "schedule": "@every 1h""#,
    ))
    .unwrap()
    .validate()
    .unwrap();

    // Shut down once the immediate cycle has written its entry.
    let written = target_dir.path().join("_x");
    let shutdown = async move {
        while !written.exists() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(30), vault_migrator::run(config, shutdown))
        .await
        .expect("scheduled run never shut down")
        .unwrap();

    let destination = FileBackend::new(target_dir.path().to_path_buf()).unwrap();
    let entry = destination.get(&key!("x")).await.unwrap().unwrap();
    assert_eq!(entry.value.as_ref(), b"v1");
}
