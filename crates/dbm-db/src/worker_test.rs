use super::*;
use crate::test_utils::{MockConnection, MockVersionManager};
use dbm_core::MigrationScript;

fn script(version: &[u32], sql: &str) -> MigrationScript {
    let version = Version::new(version);
    MigrationScript::from_statements(version, format!("script {}", version), vec![sql.to_string()])
}

fn batch() -> Vec<MigrationScript> {
    vec![
        script(&[1, 0], "CREATE TABLE a (id int)"),
        script(&[1, 1], "CREATE TABLE b (id int)"),
        script(&[1, 2], "CREATE TABLE c (id int)"),
    ]
}

#[tokio::test]
async fn test_applies_all_scripts_in_order() {
    let mut conn = MockConnection::new();
    let manager = MockVersionManager::at(Version::new(&[0, 5]));
    let mut scripts = batch();

    let report = run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), Some(&manager)).await;

    assert!(report.succeeded());
    assert_eq!(report.applied, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(report.handled(), 3);
    assert_eq!(
        conn.statements(),
        [
            "CREATE TABLE a (id int)",
            "CREATE TABLE b (id int)",
            "CREATE TABLE c (id int)"
        ]
    );
    assert_eq!(conn.begins, 3);
    assert_eq!(conn.commits, 3);
    assert_eq!(conn.rollbacks, 0);
    assert_eq!(manager.current(), Version::new(&[1, 2]));
    assert_eq!(
        manager.recorded(),
        [
            Version::new(&[1, 0]),
            Version::new(&[1, 1]),
            Version::new(&[1, 2])
        ]
    );
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let mut conn = MockConnection::new();
    // The database already sits at the batch's final version.
    let manager = MockVersionManager::at(Version::new(&[1, 2]));
    let mut scripts = batch();

    let report = run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), Some(&manager)).await;

    assert!(report.succeeded());
    assert_eq!(report.applied, 0);
    assert_eq!(report.skipped, 3);
    assert_eq!(manager.skipped_count(), 3);
    assert!(conn.statements().is_empty());
    // Each skip commits its empty transaction.
    assert_eq!(conn.commits, 3);
    assert!(manager.recorded().is_empty());
}

#[tokio::test]
async fn test_skip_applies_at_greater_or_equal() {
    let mut conn = MockConnection::new();
    let manager = MockVersionManager::at(Version::new(&[1, 1]));
    let mut scripts = batch();

    let report = run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), Some(&manager)).await;

    assert_eq!(report.skipped, 2);
    assert_eq!(report.applied, 1);
    assert_eq!(conn.statements(), ["CREATE TABLE c (id int)"]);
    assert_eq!(manager.current(), Version::new(&[1, 2]));
}

#[tokio::test]
async fn test_failure_stops_the_run_and_rolls_back() {
    let mut conn = MockConnection::failing_on("BOOM");
    let manager = MockVersionManager::at(Version::new(&[0, 0]));
    let mut scripts = vec![
        script(&[1, 0], "CREATE TABLE a (id int)"),
        script(&[1, 1], "BOOM"),
        script(&[1, 2], "CREATE TABLE c (id int)"),
    ];

    let report = run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), Some(&manager)).await;

    assert!(!report.succeeded());
    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 0);
    // The failing script is reported; later scripts are never attempted.
    assert_eq!(report.results.len(), 2);
    assert_eq!(report.results[1].status, ScriptStatus::Failed);
    assert!(report.results[1]
        .error
        .as_deref()
        .unwrap()
        .contains("forced failure"));
    assert_eq!(conn.statements(), ["CREATE TABLE a (id int)"]);
    assert_eq!(conn.commits, 1);
    assert_eq!(conn.rollbacks, 1);
    // The tracked version reflects the last committed script only.
    assert_eq!(manager.current(), Version::new(&[1, 0]));
    assert_eq!(manager.recorded(), [Version::new(&[1, 0])]);
}

#[tokio::test]
async fn test_undetermined_version_aborts_before_any_statement() {
    let mut conn = MockConnection::new();
    let manager = MockVersionManager::undetermined();
    let mut scripts = batch();

    let report = run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), Some(&manager)).await;

    assert!(!report.succeeded());
    assert_eq!(report.applied, 0);
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].status, ScriptStatus::Failed);
    assert!(report.results[0].error.as_deref().unwrap().contains("[D004]"));
    assert!(conn.statements().is_empty());
    assert_eq!(conn.rollbacks, 1);
}

#[tokio::test]
async fn test_runs_without_a_version_manager() {
    let mut conn = MockConnection::new();
    let mut scripts = batch();

    let report = run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), None).await;

    assert_eq!(report.applied, 3);
    assert_eq!(report.skipped, 0);
    assert_eq!(conn.statements().len(), 3);
}

#[tokio::test]
async fn test_create_database_script_runs_untransacted() {
    let mut conn = MockConnection::new();
    let mut scripts = vec![script(&[0, 0], "CREATE DATABASE \"t1\"")];

    let report = run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), None).await;

    assert_eq!(report.applied, 1);
    assert_eq!(conn.begins, 0);
    assert_eq!(conn.commits, 0);
    assert_eq!(conn.statements(), ["CREATE DATABASE \"t1\""]);
}

#[tokio::test]
async fn test_create_database_bypasses_version_check_but_records() {
    let mut conn = MockConnection::new();
    // Far ahead of the creation script's version; without the bypass the
    // script would be skipped.
    let manager = MockVersionManager::at(Version::new(&[9, 9]));
    let mut scripts = vec![script(&[0, 0], "create database \"t1\"")];

    let report = run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), Some(&manager)).await;

    assert_eq!(report.applied, 1);
    assert_eq!(report.skipped, 0);
    assert_eq!(manager.skipped_count(), 0);
    assert_eq!(manager.recorded(), [Version::new(&[0, 0])]);
}

#[tokio::test]
async fn test_scripts_are_unloaded_after_the_run() {
    let mut conn = MockConnection::failing_on("BOOM");
    let mut scripts = vec![
        script(&[1, 0], "CREATE TABLE a (id int)"),
        script(&[1, 1], "BOOM"),
    ];

    run_scripts(&mut conn, &mut scripts, &ScriptParams::new(), None).await;

    assert!(scripts.iter().all(|s| !s.is_loaded()));
}

#[tokio::test]
async fn test_scanned_files_run_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("1.0 schema.sql"),
        "CREATE TABLE users (id int)\nGO\nCREATE INDEX users_id ON users (id)",
    )
    .unwrap();
    std::fs::write(
        dir.path().join("1.1 seed.sql"),
        "INSERT INTO users VALUES (1) -- $(AppName)",
    )
    .unwrap();

    let mut scripts = dbm_core::load_scripts(dir.path(), &dbm_core::AcceptAll).unwrap();
    let mut conn = MockConnection::new();
    let manager = MockVersionManager::at(Version::new(&[0, 1]));
    let params = ScriptParams::new().with("AppName", "dbmigrate");

    let report = run_scripts(&mut conn, &mut scripts, &params, Some(&manager)).await;

    assert!(report.succeeded());
    assert_eq!(report.applied, 2);
    let statements = conn.statements();
    assert_eq!(statements.len(), 3);
    assert_eq!(statements[0], "CREATE TABLE users (id int)");
    assert!(statements[2].ends_with("-- dbmigrate"));
    assert_eq!(manager.current(), Version::new(&[1, 1]));
}

#[tokio::test]
async fn test_parameters_are_substituted_before_execution() {
    let mut conn = MockConnection::new();
    let mut scripts = vec![script(&[1, 0], "COMMENT ON DATABASE $(DbName) IS '$(AppName)'")];
    let params = ScriptParams::new()
        .with("DbName", "\"appdb\"")
        .with("AppName", "dbmigrate");

    let report = run_scripts(&mut conn, &mut scripts, &params, None).await;

    assert_eq!(report.applied, 1);
    assert_eq!(
        conn.statements(),
        ["COMMENT ON DATABASE \"appdb\" IS 'dbmigrate'"]
    );
}
