use std::env;
use std::fmt;
use std::time::Duration;

use tracing::info;

use crate::error::{Error, Result};
use crate::services::credentials::{Credentials, ServiceAccountKey};
use crate::services::diff::LabelFilter;
use crate::services::gke_client::DEFAULT_GKE_ENDPOINT;

/// Keeps `create time + lifetime` far inside the range of `DateTime<Utc>`.
pub const MAX_CLUSTER_LIFETIME_DAYS: i64 = 100 * 365;

#[derive(Clone, PartialEq, Eq)]
pub struct BasicAuthCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for BasicAuthCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub project: String,
    pub poll_interval: Duration,
    pub cluster_lifetime: chrono::Duration,
    pub label_filters: Vec<LabelFilter>,
    pub gke_endpoint: String,
    pub credentials: Credentials,
    pub basic_auth: Option<BasicAuthCredentials>,
}

impl Config {
    pub fn load() -> Result<Self> {
        // .env только если явно указано USE_DOTENV=true
        if env::var("USE_DOTENV").ok().as_deref() == Some("true") {
            dotenv::dotenv().ok();
        }

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any variable lookup; `load` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_address = match (lookup("SERVER_ADDRESS"), lookup("PORT")) {
            (Some(address), _) => address,
            (None, Some(port)) => {
                let port: u16 = port
                    .parse()
                    .map_err(|_| Error::config(format!("failed to parse PORT '{}'", port)))?;
                format!("0.0.0.0:{}", port)
            }
            (None, None) => "0.0.0.0:8080".to_string(),
        };

        let project = lookup("PROJECT")
            .filter(|p| !p.is_empty())
            .ok_or_else(|| Error::config("PROJECT environment variable not found"))?;
        info!(PROJECT = %project, "Loaded");

        let poll_interval_str = lookup("GCLOUD_POLL_INTERVAL").unwrap_or_else(|| "10m".to_string());
        let poll_interval = parse_duration(&poll_interval_str)
            .map_err(|e| Error::config(format!("failed to parse GCLOUD_POLL_INTERVAL: {}", e)))?;
        if poll_interval.is_zero() {
            return Err(Error::config("GCLOUD_POLL_INTERVAL must be greater than zero"));
        }
        info!(GCLOUD_POLL_INTERVAL = %poll_interval_str, "Loaded");

        let lifetime_str = lookup("CLUSTER_LIFETIME_DURATION").unwrap_or_else(|| "24h".to_string());
        let lifetime = parse_duration(&lifetime_str)
            .map_err(|e| Error::config(format!("failed to parse CLUSTER_LIFETIME_DURATION: {}", e)))?;
        let cluster_lifetime = chrono::Duration::from_std(lifetime)
            .ok()
            .filter(|l| *l <= chrono::Duration::days(MAX_CLUSTER_LIFETIME_DAYS))
            .ok_or_else(|| {
                Error::config(format!(
                    "CLUSTER_LIFETIME_DURATION must not exceed {}d",
                    MAX_CLUSTER_LIFETIME_DAYS
                ))
            })?;
        info!(CLUSTER_LIFETIME_DURATION = %lifetime_str, "Loaded");

        let label_filters = match lookup("GCLOUD_GKE_LABEL_FILTERS") {
            Some(raw) => {
                let filters = parse_label_filters(&raw)?;
                info!(GCLOUD_GKE_LABEL_FILTERS = %raw, "Loaded");
                filters
            }
            None => {
                info!("GCLOUD_GKE_LABEL_FILTERS unset, tracking all clusters");
                Vec::new()
            }
        };

        let credentials = match (lookup("GCP_SERVICE_ACCOUNT_KEY"), lookup("GCP_ACCESS_TOKEN")) {
            (Some(key), _) => {
                let key = ServiceAccountKey::from_json(&key)
                    .map_err(|e| Error::config(format!("GCP_SERVICE_ACCOUNT_KEY: {}", e)))?;
                info!(GCP_SERVICE_ACCOUNT_KEY = "<redacted>", "Loaded");
                Credentials::ServiceAccount(key)
            }
            (None, Some(token)) => {
                info!(GCP_ACCESS_TOKEN = "<redacted>", "Loaded");
                Credentials::AccessToken(token)
            }
            (None, None) => {
                return Err(Error::config(
                    "GCP_SERVICE_ACCOUNT_KEY or GCP_ACCESS_TOKEN environment variable not found",
                ))
            }
        };

        let basic_auth = match (lookup("BASIC_AUTH_USERNAME"), lookup("BASIC_AUTH_PASSWORD")) {
            (Some(username), Some(password)) => {
                info!(BASIC_AUTH_USERNAME = "<redacted>", BASIC_AUTH_PASSWORD = "<redacted>", "Loaded");
                Some(BasicAuthCredentials { username, password })
            }
            (None, None) => None,
            _ => {
                return Err(Error::config(
                    "BASIC_AUTH_USERNAME and BASIC_AUTH_PASSWORD must be set together",
                ))
            }
        };

        Ok(Config {
            server_address,
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://gke-cleaner.db".to_string()),
            project,
            poll_interval,
            cluster_lifetime,
            label_filters,
            gke_endpoint: lookup("GKE_API_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_GKE_ENDPOINT.to_string()),
            credentials,
            basic_auth,
        })
    }
}

/// Parse `30s`, `10m`, `24h`, `7d` or a bare number of seconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let (number, unit_secs) = if let Some(days) = s.strip_suffix('d') {
        (days, 86_400)
    } else if let Some(hours) = s.strip_suffix('h') {
        (hours, 3_600)
    } else if let Some(minutes) = s.strip_suffix('m') {
        (minutes, 60)
    } else if let Some(secs) = s.strip_suffix('s') {
        (secs, 1)
    } else {
        (s, 1)
    };

    let n: u64 = number.trim().parse().map_err(|_| {
        Error::config(format!(
            "invalid duration '{}', expected e.g. 24h, 10m, 30s",
            s
        ))
    })?;

    n.checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::config(format!("duration '{}' is too large", s)))
}

/// `GCLOUD_GKE_LABEL_FILTERS` is a JSON array of `key=value` strings.
pub fn parse_label_filters(raw: &str) -> Result<Vec<LabelFilter>> {
    let entries: Vec<String> = serde_json::from_str(raw).map_err(|e| {
        Error::config(format!("failed to parse GCLOUD_GKE_LABEL_FILTERS: {}", e))
    })?;

    entries.iter().map(|entry| entry.parse()).collect()
}
