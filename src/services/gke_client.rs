use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

#[cfg(test)]
use mockall::automock;

use crate::error::{Error, Result};
use crate::models::RemoteCluster;
use crate::services::credentials::{Credentials, TokenSource};

pub const DEFAULT_GKE_ENDPOINT: &str = "https://container.googleapis.com";

/// Remote cluster inventory the reconciler works against.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// All clusters of the project, across every location
    async fn list_clusters(&self, project: &str) -> Result<Vec<RemoteCluster>>;

    /// Delete one cluster given its `projects/{p}/locations/{l}/clusters/{n}` name
    async fn delete_cluster(&self, resource_name: &str) -> Result<()>;
}

pub fn cluster_resource_name(project: &str, location: &str, name: &str) -> String {
    format!("projects/{}/locations/{}/clusters/{}", project, location, name)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListClustersResponse {
    #[serde(default)]
    clusters: Vec<GkeCluster>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GkeCluster {
    name: String,
    create_time: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    resource_labels: HashMap<String, String>,
}

impl TryFrom<GkeCluster> for RemoteCluster {
    type Error = Error;

    fn try_from(cluster: GkeCluster) -> Result<Self> {
        let create_time = DateTime::parse_from_rfc3339(&cluster.create_time)
            .map_err(|e| {
                Error::remote(format!(
                    "cluster {} has invalid createTime '{}': {}",
                    cluster.name, cluster.create_time, e
                ))
            })?
            .with_timezone(&Utc);

        Ok(RemoteCluster {
            name: cluster.name,
            create_time,
            location: cluster.location,
            resource_labels: cluster.resource_labels,
        })
    }
}

/// GKE REST v1 client.
#[derive(Clone)]
pub struct GkeClient {
    client: Client,
    endpoint: String,
    tokens: TokenSource,
}

impl GkeClient {
    pub fn with_endpoint(credentials: Credentials, endpoint: impl Into<String>) -> Self {
        let client = Client::new();
        Self {
            tokens: TokenSource::new(credentials, client.clone()),
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/v1/{}", self.endpoint, resource)
    }
}

#[async_trait]
impl InventoryClient for GkeClient {
    async fn list_clusters(&self, project: &str) -> Result<Vec<RemoteCluster>> {
        let token = self.tokens.access_token().await?;
        let url = self.url(&format!("projects/{}/locations/-/clusters", project));

        let resp = self.client.get(&url).bearer_auth(&token).send().await?;
        if !resp.status().is_success() {
            return Err(Error::remote(format!(
                "failed to list clusters in project {}: HTTP {}",
                project,
                resp.status()
            )));
        }

        let body: ListClustersResponse = resp.json().await?;
        body.clusters.into_iter().map(RemoteCluster::try_from).collect()
    }

    async fn delete_cluster(&self, resource_name: &str) -> Result<()> {
        let token = self.tokens.access_token().await?;

        let resp = self
            .client
            .delete(self.url(resource_name))
            .bearer_auth(&token)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(Error::remote(format!(
                "failed to delete {}: HTTP {}",
                resource_name,
                resp.status()
            )));
        }

        Ok(())
    }
}
