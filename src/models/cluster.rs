use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Expiration-tracking record persisted per known cluster name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ClusterRecord {
    #[serde(rename = "ID")]
    pub id: i64,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "CreateDate")]
    pub create_date: DateTime<Utc>,
    #[serde(rename = "ExpirationDate")]
    pub expiration_date: DateTime<Utc>,
    #[serde(rename = "Ignore")]
    #[sqlx(rename = "ignored")]
    pub ignore: bool,
}

impl ClusterRecord {
    /// Expired records that are not ignored are deletion candidates.
    pub fn is_deletion_candidate(&self, now: DateTime<Utc>) -> bool {
        !self.ignore && self.expiration_date < now
    }
}

/// A cluster as reported by the GKE API during one poll cycle. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCluster {
    pub name: String,
    pub create_time: DateTime<Utc>,
    pub location: String,
    pub resource_labels: HashMap<String, String>,
}

impl RemoteCluster {
    pub fn new(
        name: impl Into<String>,
        create_time: DateTime<Utc>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            create_time,
            location: location.into(),
            resource_labels: HashMap::new(),
        }
    }

    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.resource_labels.insert(key.into(), value.into());
        self
    }
}
