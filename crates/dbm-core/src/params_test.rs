use super::*;

#[test]
fn test_derived_placeholder() {
    let p = ScriptParam::new("DbName", "appdb");
    assert_eq!(p.placeholder(), "$(DbName)");
    assert_eq!(p.value(), "appdb");
}

#[test]
fn test_bind_name_sanitizes_non_alphanumerics() {
    assert_eq!(ScriptParam::new("DbVersion", "1.0").bind_name(), ":DbVersion");
    assert_eq!(
        ScriptParam::new("Db-Version", "1.0").bind_name(),
        ":Db_Version"
    );
    assert_eq!(
        ScriptParam::new("schema.owner name", "x").bind_name(),
        ":schema_owner_name"
    );
}

#[test]
fn test_lookup_is_case_insensitive() {
    let params = ScriptParams::new().with("DbName", "appdb");
    assert_eq!(params.value_of("dbname"), Some("appdb"));
    assert_eq!(params.value_of("DBNAME"), Some("appdb"));
    assert_eq!(params.value_of("missing"), None);
}

#[test]
fn test_first_match_wins() {
    let params = ScriptParams::new()
        .with("AppName", "caller")
        .with("AppName", "default");
    assert_eq!(params.value_of("appname"), Some("caller"));
}

#[test]
fn test_value_or_falls_back() {
    let params = ScriptParams::new().with("DbName", "appdb");
    assert_eq!(params.value_or("DbCollation", "C"), "C");
    assert_eq!(params.value_or("DbName", "other"), "appdb");
}

#[test]
fn test_insertion_order_preserved() {
    let params = ScriptParams::new()
        .with("b", "2")
        .with("a", "1")
        .with("c", "3");
    let names: Vec<&str> = params.iter().map(ScriptParam::name).collect();
    assert_eq!(names, ["b", "a", "c"]);
}

#[test]
fn test_from_iter() {
    let params: ScriptParams = vec![("X".to_string(), "1".to_string())]
        .into_iter()
        .collect();
    assert_eq!(params.len(), 1);
    assert_eq!(params.value_of("x"), Some("1"));
}
