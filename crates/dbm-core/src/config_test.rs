use super::*;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("server: localhost\n").unwrap();
    assert_eq!(config.server.as_deref(), Some("localhost"));
    assert_eq!(config.scripts, "scripts");
    assert!(config.params.is_empty());
    assert!(config.connection_string.is_none());
}

#[test]
fn test_parse_full_config() {
    let yaml = r#"
server: db.internal
database: appdb
user: deploy
password: secret
scripts: ./migrations
settings_table: SchemaSettings
params:
  DbCollation: C
  Owner: app_owner
"#;
    let config: Config = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(config.database.as_deref(), Some("appdb"));
    assert_eq!(config.scripts, "./migrations");
    assert_eq!(config.settings_table.as_deref(), Some("SchemaSettings"));
    assert_eq!(config.params.get("DbCollation").map(String::as_str), Some("C"));
    assert_eq!(config.params.len(), 2);
}

#[test]
fn test_load_from_dir_without_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert!(config.server.is_none());
    assert_eq!(config.scripts, "scripts");
}

#[test]
fn test_load_from_dir_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join(Config::FILE_NAME),
        "connection_string: host=localhost user=postgres\n",
    )
    .unwrap();

    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(
        config.connection_string.as_deref(),
        Some("host=localhost user=postgres")
    );
}
