use serde::{Deserialize, Serialize};

use crate::audit::AuditLog;

/// Stored external link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub active: bool,
    pub monitoring_tool_id: i32,
    pub audit: AuditLog,
}

/// Stored link-to-cluster association, addressed by `(link_id, cluster_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCluster {
    pub link_id: i32,
    pub cluster_id: i32,
    pub active: bool,
    pub audit: AuditLog,
}

/// Association row joined with the link it points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLink {
    pub cluster_id: i32,
    pub link: Link,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoringTool {
    pub id: i32,
    pub name: String,
    pub icon: String,
}

/// Monitoring tool as listed to API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringToolView {
    pub id: i32,
    pub name: String,
    pub icon: String,
}

impl From<MonitoringTool> for MonitoringToolView {
    fn from(t: MonitoringTool) -> Self {
        Self { id: t.id, name: t.name, icon: t.icon }
    }
}

/// Create/update payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequest {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub active: bool,
    pub monitoring_tool_id: i32,
    #[serde(default)]
    pub cluster_ids: Vec<i32>,
    /// Acting user; filled from the caller's credentials, never from the body.
    #[serde(skip)]
    pub user_id: Option<i32>,
}

/// One listing entry. An empty `cluster_ids` means the link applies to every cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkResponse {
    pub id: i32,
    pub name: String,
    pub url: String,
    pub active: bool,
    pub monitoring_tool_id: i32,
    pub cluster_ids: Vec<i32>,
}

impl LinkResponse {
    pub fn from_link(link: &Link, cluster_ids: Vec<i32>) -> Self {
        Self {
            id: link.id,
            name: link.name.clone(),
            url: link.url.clone(),
            active: link.active,
            monitoring_tool_id: link.monitoring_tool_id,
            cluster_ids,
        }
    }
}

/// Which association rows a listing draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterFilter {
    /// Every active association, grouped per link.
    All,
    /// Active associations of one cluster, one entry per row.
    Cluster(i32),
}

impl From<i32> for ClusterFilter {
    fn from(cluster_id: i32) -> Self {
        if cluster_id == 0 { ClusterFilter::All } else { ClusterFilter::Cluster(cluster_id) }
    }
}

/// A secondary write that failed and was deliberately not propagated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedWrite {
    pub link_id: i32,
    /// `None` when the association set itself could not be loaded.
    pub cluster_id: Option<i32>,
    pub reason: String,
}

/// Primary result plus the best-effort writes that failed along the way.
///
/// The call succeeded when this is returned; `skipped` lists association
/// cleanup that did not happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<T> {
    pub value: T,
    pub skipped: Vec<SkippedWrite>,
}

impl<T> Outcome<T> {
    pub fn is_clean(&self) -> bool { self.skipped.is_empty() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_camel_case_and_ignores_user_id() {
        let req: LinkRequest = serde_json::from_str(
            r#"{"name":"grafana","url":"https://g/d/1","monitoringToolId":1,"clusterIds":[1,2],"userId":9}"#,
        ).unwrap();
        assert_eq!(req.cluster_ids, vec![1, 2]);
        assert_eq!(req.monitoring_tool_id, 1);
        assert_eq!(req.user_id, None);
        assert_eq!(req.id, 0);
    }

    #[test]
    fn zero_means_every_cluster() {
        assert_eq!(ClusterFilter::from(0), ClusterFilter::All);
        assert_eq!(ClusterFilter::from(3), ClusterFilter::Cluster(3));
    }
}
