use docdedup::config::credentials::Credentials;
use docdedup::config::database::ConnectError;
use docdedup::config::plan::DedupPlan;
use docdedup::modules::dedup::schema::DedupOptions;
use docdedup::config::{ConfigError, Settings, DEFAULT_BATCH_SIZE};
use docdedup::{cleanup, Connector};
use std::collections::HashMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::{NamedTempFile, TempDir};

fn settings_from(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(|key| vars.get(key).cloned())
}

fn write_temp(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_settings_default_without_environment() {
    let settings = settings_from(&[]).unwrap();

    assert_eq!(settings, Settings::default());
    assert_eq!(settings.credentials_path, PathBuf::from("serviceAccountKey.json"));
    assert_eq!(settings.batch_size, DEFAULT_BATCH_SIZE);
    assert!(!settings.dry_run);
}

#[test]
fn test_settings_overrides() {
    let settings = settings_from(&[
        ("DEDUP_CREDENTIALS", "/etc/dedup/creds.json"),
        ("DEDUP_PLAN", "plan.json"),
        ("DEDUP_BATCH_SIZE", "250"),
        ("DEDUP_DRY_RUN", "true"),
    ])
    .unwrap();

    assert_eq!(settings.credentials_path, PathBuf::from("/etc/dedup/creds.json"));
    assert_eq!(settings.plan_path, Some(PathBuf::from("plan.json")));
    assert_eq!(settings.batch_size, 250);
    assert!(settings.dry_run);
}

#[test]
fn test_settings_reject_batch_size_outside_store_limit() {
    for raw in ["0", "501", "lots"] {
        let err = settings_from(&[("DEDUP_BATCH_SIZE", raw)]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSetting("DEDUP_BATCH_SIZE", _)));
    }
    assert_eq!(settings_from(&[("DEDUP_BATCH_SIZE", "500")]).unwrap().batch_size, 500);
}

#[test]
fn test_settings_reject_unknown_dry_run_value() {
    let err = settings_from(&[("DEDUP_DRY_RUN", "maybe")]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidSetting("DEDUP_DRY_RUN", _)));
}

#[test]
fn test_credentials_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("serviceAccountKey.json");

    let err = Credentials::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredentials(ref p) if *p == path));
    assert!(err.to_string().ends_with("serviceAccountKey.json not found"));
}

#[test]
fn test_credentials_load_with_default_database() {
    let file = write_temp(r#"{ "connection_uri": "mongodb://localhost:27017" }"#);

    let creds = Credentials::load(file.path()).unwrap();
    assert_eq!(creds.connection_uri, "mongodb://localhost:27017");
    assert_eq!(creds.database, "portfolio");
    assert_eq!(creds.app_name, None);
}

#[test]
fn test_credentials_invalid_json() {
    let file = write_temp("not json");
    let err = Credentials::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCredentials { .. }));

    let file = write_temp(r#"{ "connection_uri": "  " }"#);
    let err = Credentials::load(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidCredentials { .. }));
}

#[tokio::test]
async fn test_connect_without_credentials_reports_configuration_error() {
    let dir = TempDir::new().unwrap();
    let connector = Connector::new(dir.path().join("serviceAccountKey.json"));

    let err = connector.connect().await.unwrap_err();
    assert!(matches!(err, ConnectError::Config(ConfigError::MissingCredentials(_))));
    assert!(!connector.is_connected());
}

#[tokio::test]
async fn test_cleanup_without_credentials_runs_no_passes() {
    let dir = TempDir::new().unwrap();
    let connector = Connector::new(dir.path().join("serviceAccountKey.json"));

    let result = cleanup(&connector, &DedupPlan::default(), DedupOptions::default()).await;

    // An error in place of a summary means no pass was attempted.
    let err = result.unwrap_err();
    assert!(matches!(err, ConnectError::Config(ConfigError::MissingCredentials(_))));
    assert!(!connector.is_connected());
}

#[tokio::test]
async fn test_connect_is_idempotent() {
    // The driver connects lazily, so building a handle needs no running server.
    let file = write_temp(r#"{ "connection_uri": "mongodb://localhost:27017", "database": "dedup_test" }"#);
    let connector = Connector::new(file.path());

    let first = connector.connect().await.unwrap() as *const _;
    assert!(connector.is_connected());

    // A second connect must not re-read credentials.
    drop(file);
    let second = connector.connect().await.unwrap() as *const _;
    assert_eq!(first, second);
}

#[test]
fn test_default_plan_passes() {
    let plan = DedupPlan::default();
    let passes: Vec<(&str, Vec<&str>)> = plan
        .passes()
        .iter()
        .map(|p| (p.collection.as_str(), p.key_fields.iter().map(String::as_str).collect()))
        .collect();

    assert_eq!(
        passes,
        vec![
            ("projects", vec!["title"]),
            ("achievements", vec!["title", "category"]),
            ("cv_education", vec!["degree", "institution"]),
            ("cv_experience", vec!["job_title", "company"]),
            ("cv_skills", vec!["category"]),
            ("cv_certifications", vec!["name"]),
        ]
    );
}

#[test]
fn test_plan_from_file() {
    let file = write_temp(
        r#"[
            { "collection": "cv_certifications", "key_fields": ["title", "issuer"] }
        ]"#,
    );

    let plan = DedupPlan::load(file.path()).unwrap();
    assert_eq!(plan.passes().len(), 1);
    assert_eq!(plan.passes()[0].key_fields, vec!["title", "issuer"]);
}

#[test]
fn test_plan_rejects_invalid_passes() {
    for raw in [
        r#"[{ "collection": "", "key_fields": ["title"] }]"#,
        r#"[{ "collection": "projects", "key_fields": [] }]"#,
        r#"[{ "collection": "projects", "key_fields": [" "] }]"#,
        r#"{ "collection": "projects" }"#,
    ] {
        let err = DedupPlan::from_json(raw).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPlan(_)), "{}", raw);
    }
}
