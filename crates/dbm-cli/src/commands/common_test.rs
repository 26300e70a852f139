use super::*;
use dbm_core::Version;

fn config_with_params(pairs: &[(&str, &str)]) -> Config {
    let mut config = Config::default();
    for (name, value) in pairs {
        config.params.insert(name.to_string(), value.to_string());
    }
    config
}

#[test]
fn test_parse_params_pairs() {
    let params = parse_params(
        &["Owner=app".to_string(), "DbCollation=C".to_string()],
        &Config::default(),
    )
    .unwrap();
    assert_eq!(params.value_of("Owner"), Some("app"));
    assert_eq!(params.value_of("DbCollation"), Some("C"));
}

#[test]
fn test_parse_params_rejects_missing_equals() {
    assert!(parse_params(&["Owner".to_string()], &Config::default()).is_err());
}

#[test]
fn test_parse_params_value_may_contain_equals() {
    let params = parse_params(&["Conn=a=b".to_string()], &Config::default()).unwrap();
    assert_eq!(params.value_of("Conn"), Some("a=b"));
}

#[test]
fn test_parse_params_cli_overrides_config() {
    let config = config_with_params(&[("Owner", "from_config"), ("Extra", "kept")]);
    let params = parse_params(&["Owner=from_cli".to_string()], &config).unwrap();
    assert_eq!(params.value_of("Owner"), Some("from_cli"));
    assert_eq!(params.value_of("Extra"), Some("kept"));
}

#[test]
fn test_build_filter_defaults_to_accept_all() {
    let filter = build_filter(&[], &[]).unwrap();
    assert!(filter.matches("anything", &Version::new(&[1, 0]), 5));
}

#[test]
fn test_build_filter_regex_only() {
    let filter = build_filter(&["^proc".to_string()], &[]).unwrap();
    assert!(filter.matches("Procedures", &Version::new(&[1, 0]), 0));
    assert!(!filter.matches("views", &Version::new(&[1, 0]), 0));
}

#[test]
fn test_build_filter_levels_only() {
    let filter = build_filter(&[], &[0, 1]).unwrap();
    assert!(filter.matches("x", &Version::new(&[1, 0]), 1));
    assert!(!filter.matches("x", &Version::new(&[1, 0]), 2));
}

#[test]
fn test_build_filter_combines_with_or() {
    let filter = build_filter(&["^proc".to_string()], &[0]).unwrap();
    // Accepted by level even though the name does not match.
    assert!(filter.matches("views", &Version::new(&[1, 0]), 0));
    // Accepted by name at a deeper level.
    assert!(filter.matches("procedures", &Version::new(&[1, 0]), 3));
    assert!(!filter.matches("views", &Version::new(&[1, 0]), 3));
}

#[test]
fn test_build_version_manager_disabled() {
    let args = crate::cli::VersioningArgs {
        no_versioning: true,
        default_version: "1.0".to_string(),
        ..Default::default()
    };
    assert!(build_version_manager(&args, &Config::default())
        .unwrap()
        .is_none());
}

#[test]
fn test_build_version_manager_default_settings() {
    let args = crate::cli::VersioningArgs {
        default_version: "1.0".to_string(),
        ..Default::default()
    };
    assert!(build_version_manager(&args, &Config::default())
        .unwrap()
        .is_some());
}

#[test]
fn test_build_version_manager_existing_table() {
    let args = crate::cli::VersioningArgs {
        default_version: "1.0".to_string(),
        version_table: Some("Config".to_string()),
        version_column: Some("SchemaVersion".to_string()),
        missing_as_zero: true,
        ..Default::default()
    };
    assert!(build_version_manager(&args, &Config::default())
        .unwrap()
        .is_some());
}

#[test]
fn test_build_version_manager_invalid_default() {
    let args = crate::cli::VersioningArgs {
        default_version: "droids".to_string(),
        ..Default::default()
    };
    assert!(build_version_manager(&args, &Config::default()).is_err());
}

#[test]
fn test_scripts_path_prefers_argument() {
    let mut config = Config::default();
    config.scripts = "./migrations".to_string();
    assert_eq!(
        scripts_path(Some("./other"), &config),
        PathBuf::from("./other")
    );
    assert_eq!(scripts_path(None, &config), PathBuf::from("./migrations"));
}

#[test]
fn test_build_worker_requires_a_server() {
    let args = crate::cli::ConnectionArgs::default();
    assert!(build_worker(&args, &Config::default()).is_err());
}

#[test]
fn test_build_worker_prefers_connection_string() {
    let args = crate::cli::ConnectionArgs {
        connection_string: Some("host=cs-host user=u".to_string()),
        server: Some("flag-host".to_string()),
        ..Default::default()
    };
    let worker = build_worker(&args, &Config::default()).unwrap();
    assert_eq!(worker.server(), "cs-host");
}

#[test]
fn test_build_worker_falls_back_to_config() {
    let mut config = Config::default();
    config.server = Some("cfg-host".to_string());
    config.database = Some("cfg-db".to_string());
    let worker = build_worker(&crate::cli::ConnectionArgs::default(), &config).unwrap();
    assert_eq!(worker.server(), "cfg-host");
    assert_eq!(worker.database(), Some("cfg-db"));
}

#[test]
fn test_build_worker_flags_override_config() {
    let mut config = Config::default();
    config.server = Some("cfg-host".to_string());
    let args = crate::cli::ConnectionArgs {
        server: Some("flag-host".to_string()),
        ..Default::default()
    };
    let worker = build_worker(&args, &config).unwrap();
    assert_eq!(worker.server(), "flag-host");
}

#[test]
fn test_load_config_explicit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("custom.yml");
    std::fs::write(&path, "server: cfg-host\nscripts: ./sql\n").unwrap();

    let global = crate::cli::GlobalArgs {
        verbose: false,
        config: Some(path.display().to_string()),
    };
    let config = load_config(&global).unwrap();
    assert_eq!(config.server.as_deref(), Some("cfg-host"));
    assert_eq!(config.scripts, "./sql");
}

#[test]
fn test_load_config_missing_explicit_path_fails() {
    let global = crate::cli::GlobalArgs {
        verbose: false,
        config: Some("/nonexistent/dbmigrate.yml".to_string()),
    };
    assert!(load_config(&global).is_err());
}

#[test]
fn test_calculate_column_widths() {
    let widths = calculate_column_widths(
        &["VERSION", "NAME"],
        &[
            vec!["1.2".to_string(), "a long script name".to_string()],
            vec!["10.20.30".to_string(), "x".to_string()],
        ],
    );
    assert_eq!(widths, [8, 18]);
}

#[test]
fn test_exit_code_displays_nothing() {
    assert_eq!(ExitCode(1).to_string(), "");
}
