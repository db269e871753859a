use axum::http::{HeaderMap, HeaderValue};
use base64::{engine::general_purpose, Engine as _};
use tokio;

use gke_cleaner_backend::{auth::AuthService, config::Config, Error};

/// Создает тестовую конфигурацию
fn create_test_config(with_auth: bool) -> Config {
    let mut vars = vec![("PROJECT", "ci-project"), ("GCP_ACCESS_TOKEN", "ya29.test")];
    if with_auth {
        vars.push(("BASIC_AUTH_USERNAME", "admin"));
        vars.push(("BASIC_AUTH_PASSWORD", "s3cret"));
    }
    Config::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.to_string())
    })
    .unwrap()
}

fn headers_with(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Authorization", HeaderValue::from_str(value).unwrap());
    headers
}

fn basic(credentials: &str) -> String {
    format!("Basic {}", general_purpose::STANDARD.encode(credentials))
}

#[tokio::test]
async fn test_auth_service_creation() {
    // Тест создания AuthService из конфигурации
    assert!(AuthService::new(&create_test_config(true)).is_enabled());
    assert!(!AuthService::new(&create_test_config(false)).is_enabled());
}

#[tokio::test]
async fn test_extract_credentials_from_headers() {
    // Тест извлечения логина и пароля из заголовка
    let auth_service = AuthService::new(&create_test_config(true));

    let credentials = auth_service
        .extract_credentials_from_headers(&headers_with(&basic("admin:s3cret")))
        .unwrap();

    assert_eq!(credentials.username, "admin");
    assert_eq!(credentials.password, "s3cret");
}

#[tokio::test]
async fn test_extract_credentials_invalid_headers() {
    let auth_service = AuthService::new(&create_test_config(true));

    for value in ["Basic !!!not-base64", "Basic YWRtaW4=", "Token abc", "admin:s3cret"] {
        let result = auth_service.extract_credentials_from_headers(&headers_with(value));
        assert!(matches!(result, Err(Error::Credentials(_))), "accepted {}", value);
    }
}

#[tokio::test]
async fn test_authorize() {
    let auth_service = AuthService::new(&create_test_config(true));

    assert!(auth_service.authorize(&headers_with(&basic("admin:s3cret"))).is_ok());
    assert!(auth_service.authorize(&headers_with(&basic("admin:"))).is_err());
    assert!(auth_service.authorize(&headers_with(&basic(":s3cret"))).is_err());
    assert!(auth_service.authorize(&headers_with(&basic("ADMIN:s3cret"))).is_err());
}

#[tokio::test]
async fn test_authorize_without_configured_credentials() {
    // Без BASIC_AUTH_* API открыт
    let auth_service = AuthService::new(&create_test_config(false));

    assert!(auth_service.authorize(&HeaderMap::new()).is_ok());
    assert!(auth_service.authorize(&headers_with("Bearer anything")).is_ok());
}
