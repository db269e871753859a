//! Label filtering and the three-way inventory diff.
//!
//! Remote clusters and stored records are both reduced to a
//! [`ClusterSnapshot`] before diffing, so a single algorithm covers both sides.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::Error;
use crate::models::{ClusterRecord, RemoteCluster};

/// Name plus creation time: everything the diff needs to know about a cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSnapshot {
    pub name: String,
    pub create_time: DateTime<Utc>,
}

impl From<&RemoteCluster> for ClusterSnapshot {
    fn from(cluster: &RemoteCluster) -> Self {
        Self {
            name: cluster.name.clone(),
            create_time: cluster.create_time,
        }
    }
}

impl From<&ClusterRecord> for ClusterSnapshot {
    fn from(record: &ClusterRecord) -> Self {
        Self {
            name: record.name.clone(),
            create_time: record.create_date,
        }
    }
}

/// Partition of cluster names relative to the stored state.
///
/// `added`, `updated` and `removed` are pairwise disjoint and sorted by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterDiff {
    /// Present remotely, unknown locally
    pub added: Vec<ClusterSnapshot>,
    /// Present on both sides with a different creation time (recreated)
    pub updated: Vec<ClusterSnapshot>,
    /// Known locally, gone remotely
    pub removed: Vec<String>,
}

impl ClusterDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

pub fn diff_clusters(remote: &[ClusterSnapshot], known: &[ClusterSnapshot]) -> ClusterDiff {
    let remote_by_name: BTreeMap<&str, &ClusterSnapshot> =
        remote.iter().map(|c| (c.name.as_str(), c)).collect();
    let known_by_name: BTreeMap<&str, &ClusterSnapshot> =
        known.iter().map(|c| (c.name.as_str(), c)).collect();

    let mut diff = ClusterDiff::default();

    for (name, cluster) in &remote_by_name {
        match known_by_name.get(name) {
            None => diff.added.push((*cluster).clone()),
            Some(record) if record.create_time != cluster.create_time => {
                diff.updated.push((*cluster).clone())
            }
            Some(_) => {}
        }
    }

    diff.removed = known_by_name
        .keys()
        .filter(|name| !remote_by_name.contains_key(*name))
        .map(|name| name.to_string())
        .collect();

    diff
}

/// A single `key=value` predicate on a cluster's resource labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFilter {
    pub key: String,
    pub value: String,
}

impl LabelFilter {
    pub fn matches(&self, cluster: &RemoteCluster) -> bool {
        cluster.resource_labels.get(&self.key) == Some(&self.value)
    }
}

impl FromStr for LabelFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Only the first '=' separates; label values may contain more.
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| Error::config(format!("invalid label filter '{}', expected key=value", s)))?;
        if key.is_empty() {
            return Err(Error::config(format!("invalid label filter '{}': empty key", s)));
        }
        Ok(Self {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for LabelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Keep clusters matching at least one filter. An empty filter list keeps everything.
pub fn filter_clusters(clusters: &[RemoteCluster], filters: &[LabelFilter]) -> Vec<RemoteCluster> {
    if filters.is_empty() {
        return clusters.to_vec();
    }

    clusters
        .iter()
        .filter(|cluster| filters.iter().any(|f| f.matches(cluster)))
        .cloned()
        .collect()
}
