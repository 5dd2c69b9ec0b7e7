use cs_core::{Category, ConfigProvider, Coordinate, Scope};
use errors::ErrorKind;
use providers::FilesystemProvider;
use serde_json::json;
use std::path::Path;
use tempfile::TempDir;
use testing::sample_coordinate;

fn write(root: &Path, relative: &str, bytes: &[u8]) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, bytes).unwrap();
}

#[tokio::test]
async fn test_service_values_override_globals() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "configs/retail/globals/v1/dev/values.yml",
        b"name: global\nglobal: g\n",
    );
    write(
        dir.path(),
        "configs/retail/api-customers/v2/dev/values.json",
        br#"{"name": "svc", "service": "s"}"#,
    );

    let result = FilesystemProvider::new(dir.path())
        .fetch_configs(None, &sample_coordinate())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&result.config_properties).unwrap(),
        json!({"name": "svc", "global": "g", "service": "s"})
    );
}

#[tokio::test]
async fn test_yml_wins_over_yaml_and_json() {
    let dir = TempDir::new().unwrap();
    let scope = "configs/retail/globals/v1/dev";
    write(dir.path(), &format!("{scope}/values.yml"), b"from: yml\n");
    write(dir.path(), &format!("{scope}/values.yaml"), b"from: yaml\n");
    write(dir.path(), &format!("{scope}/values.json"), br#"{"from": "json"}"#);

    let props = FilesystemProvider::new(dir.path())
        .fetch_scope(None, &sample_coordinate(), Category::Configs, Scope::Globals)
        .await
        .unwrap();

    assert_eq!(props["from"], json!("yml"));
}

#[tokio::test]
async fn test_globals_certs_only() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "certs/retail/globals/v1/dev/client.keystore",
        &[0x01, 0x02],
    );
    std::fs::create_dir_all(dir.path().join("certs/retail/globals/v1/dev/nested")).unwrap();

    let result = FilesystemProvider::new(dir.path())
        .fetch_certificates(None, &sample_coordinate())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&result.config_properties).unwrap(),
        json!({"client.keystore": "AQI="})
    );
}

#[tokio::test]
async fn test_missing_tree_is_empty() {
    let dir = TempDir::new().unwrap();
    let provider = FilesystemProvider::new(dir.path());

    assert!(provider
        .fetch_configs(None, &sample_coordinate())
        .await
        .unwrap()
        .is_empty());
    assert!(provider
        .fetch_files(None, &sample_coordinate())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_malformed_globals_abort_the_fetch() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "configs/retail/globals/v1/dev/values.yaml",
        b"server: [port\n",
    );
    write(
        dir.path(),
        "configs/retail/api-customers/v2/dev/values.yml",
        b"name: svc\n",
    );

    let err = FilesystemProvider::new(dir.path())
        .fetch_configs(None, &sample_coordinate())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ParseError);
}

#[tokio::test]
async fn test_login_is_pass_through() {
    let provider = FilesystemProvider::new("/light-service-configs");
    assert_eq!(provider.login(None).await.unwrap(), None);
    assert_eq!(
        provider.login(Some("anything")).await.unwrap().as_deref(),
        Some("anything")
    );
    assert!(provider.search_services(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_traversal_coordinate_stays_inside_root() {
    let outer = TempDir::new().unwrap();
    let root = outer.path().join("root");
    write(&root, "files/retail/globals/v1/placeholder", b"p");
    write(outer.path(), "secret/id_rsa", b"PRIVATE");

    let provider = FilesystemProvider::new(&root);
    let escaping = Coordinate::new("retail", "v1", "nosvc", "v1", "../../../../secret");

    let err = provider.fetch_files(None, &escaping).await.unwrap_err();
    assert!(err.is_not_found());

    let err = provider
        .fetch_scope(None, &escaping, Category::Files, Scope::Globals)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let slashed = Coordinate::new("retail", "v1", "a/b", "v1", "dev");
    assert!(provider.fetch_configs(None, &slashed).await.is_err());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_certs_are_read() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "mounted/..data/client.keystore", &[0x01, 0x02]);
    let certs = dir.path().join("certs/retail/globals/v1/dev");
    std::fs::create_dir_all(&certs).unwrap();
    std::os::unix::fs::symlink(
        dir.path().join("mounted/..data/client.keystore"),
        certs.join("client.keystore"),
    )
    .unwrap();
    std::os::unix::fs::symlink(dir.path().join("mounted/gone"), certs.join("dangling")).unwrap();

    let result = FilesystemProvider::new(dir.path())
        .fetch_certificates(None, &sample_coordinate())
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&result.config_properties).unwrap(),
        json!({"client.keystore": "AQI="})
    );
}
