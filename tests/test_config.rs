use std::collections::HashMap;
use std::time::Duration;

use tokio;

use gke_cleaner_backend::{
    config::{Config, MAX_CLUSTER_LIFETIME_DAYS},
    services::Credentials,
    Error,
};

const TEST_PRIVATE_KEY: &str = include_str!("fixtures/test_service_account_key.pem");

/// Создает функцию чтения переменных из набора пар
fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn base_vars() -> Vec<(&'static str, &'static str)> {
    vec![("PROJECT", "ci-project"), ("GCP_ACCESS_TOKEN", "ya29.test")]
}

#[tokio::test]
async fn test_config_full_environment() {
    // Тест загрузки полной конфигурации
    let mut vars = base_vars();
    vars.extend([
        ("SERVER_ADDRESS", "127.0.0.1:3001"),
        ("PORT", "9999"),
        ("DATABASE_URL", "sqlite::memory:"),
        ("GCLOUD_POLL_INTERVAL", "30s"),
        ("CLUSTER_LIFETIME_DURATION", "2d"),
        ("GCLOUD_GKE_LABEL_FILTERS", r#"["env=ci","team=infra"]"#),
        ("GKE_API_ENDPOINT", "http://localhost:8085"),
        ("BASIC_AUTH_USERNAME", "admin"),
        ("BASIC_AUTH_PASSWORD", "s3cret"),
    ]);

    let config = Config::from_lookup(lookup(&vars)).unwrap();

    // SERVER_ADDRESS имеет приоритет над PORT
    assert_eq!(config.server_address, "127.0.0.1:3001");
    assert_eq!(config.database_url, "sqlite::memory:");
    assert_eq!(config.poll_interval, Duration::from_secs(30));
    assert_eq!(config.cluster_lifetime, chrono::Duration::days(2));
    assert_eq!(
        config.label_filters.iter().map(ToString::to_string).collect::<Vec<_>>(),
        vec!["env=ci", "team=infra"]
    );
    assert_eq!(config.gke_endpoint, "http://localhost:8085");
    let basic_auth = config.basic_auth.unwrap();
    assert_eq!(basic_auth.username, "admin");
    assert_eq!(basic_auth.password, "s3cret");
}

#[tokio::test]
async fn test_config_database_default() {
    let config = Config::from_lookup(lookup(&base_vars())).unwrap();

    assert_eq!(config.database_url, "sqlite://gke-cleaner.db");
}

#[tokio::test]
async fn test_config_invalid_port() {
    let mut vars = base_vars();
    vars.push(("PORT", "http"));

    let err = Config::from_lookup(lookup(&vars)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("PORT"));
}

#[tokio::test]
async fn test_config_invalid_lifetime() {
    let mut vars = base_vars();
    vars.push(("CLUSTER_LIFETIME_DURATION", "forever"));

    let err = Config::from_lookup(lookup(&vars)).unwrap_err();
    assert!(err.to_string().contains("CLUSTER_LIFETIME_DURATION"));
}

#[tokio::test]
async fn test_config_unrepresentable_lifetime() {
    // Срок жизни, который переполняет DateTime, должен отклоняться при загрузке
    let mut vars = base_vars();
    vars.push(("CLUSTER_LIFETIME_DURATION", "100000000d"));

    let err = Config::from_lookup(lookup(&vars)).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("CLUSTER_LIFETIME_DURATION"));
}

#[tokio::test]
async fn test_config_longest_lifetime_is_accepted() {
    let max = format!("{}d", MAX_CLUSTER_LIFETIME_DAYS);
    let mut vars = base_vars();
    vars.push(("CLUSTER_LIFETIME_DURATION", max.as_str()));

    let config = Config::from_lookup(lookup(&vars)).unwrap();
    assert_eq!(config.cluster_lifetime, chrono::Duration::days(MAX_CLUSTER_LIFETIME_DAYS));
}

#[tokio::test]
async fn test_config_malformed_label_filters() {
    let mut vars = base_vars();
    vars.push(("GCLOUD_GKE_LABEL_FILTERS", "env=ci"));

    let err = Config::from_lookup(lookup(&vars)).unwrap_err();
    assert!(err.to_string().contains("GCLOUD_GKE_LABEL_FILTERS"));
}

#[tokio::test]
async fn test_config_empty_project_is_rejected() {
    let vars = [("PROJECT", ""), ("GCP_ACCESS_TOKEN", "ya29.test")];

    assert!(Config::from_lookup(lookup(&vars)).is_err());
}

#[tokio::test]
async fn test_config_service_account_key_preferred() {
    // Ключ сервисного аккаунта важнее статического токена
    let key = serde_json::json!({
        "type": "service_account",
        "project_id": "ci-project",
        "client_email": "cleaner@ci-project.iam.gserviceaccount.com",
        "private_key": TEST_PRIVATE_KEY
    })
    .to_string();
    let mut vars = base_vars();
    vars.push(("GCP_SERVICE_ACCOUNT_KEY", key.as_str()));

    let config = Config::from_lookup(lookup(&vars)).unwrap();

    match config.credentials {
        Credentials::ServiceAccount(key) => {
            assert_eq!(key.client_email, "cleaner@ci-project.iam.gserviceaccount.com");
            assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
        }
        other => panic!("expected service account credentials, got {:?}", other),
    }
}

#[tokio::test]
async fn test_config_invalid_service_account_key() {
    let mut vars = base_vars();
    vars.push(("GCP_SERVICE_ACCOUNT_KEY", "{not json"));

    let err = Config::from_lookup(lookup(&vars)).unwrap_err();
    assert!(err.to_string().contains("GCP_SERVICE_ACCOUNT_KEY"));
}

#[tokio::test]
async fn test_config_debug_redacts_secrets() {
    let mut vars = base_vars();
    vars.extend([("BASIC_AUTH_USERNAME", "admin"), ("BASIC_AUTH_PASSWORD", "s3cret")]);

    let config = Config::from_lookup(lookup(&vars)).unwrap();
    let debug = format!("{:?}", config);

    assert!(!debug.contains("s3cret"));
    assert!(!debug.contains("ya29.test"));
}
