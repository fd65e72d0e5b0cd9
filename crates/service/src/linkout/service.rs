use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use super::domain::{
    ClusterFilter, ClusterLink, Link, LinkCluster, LinkRequest, LinkResponse, MonitoringToolView, Outcome, SkippedWrite,
};
use super::repository::{LinkClusterRepository, LinkRepository, MonitoringToolRepository};
use crate::audit::AuditLog;
use crate::errors::ServiceError;

pub const LINK_CREATE_FAILED: &str = "external link failed to create in db";
pub const CLUSTER_CREATE_FAILED: &str = "cluster id failed to create in db";

/// External linkout business service.
///
/// Every operation is a sequence of independent repository calls; nothing is
/// wrapped in a transaction, so a failure part way leaves earlier writes in
/// place. Concurrent updates of the same link are last-writer-wins per row.
pub struct LinkoutService<L, C, T>
where
    L: LinkRepository,
    C: LinkClusterRepository,
    T: MonitoringToolRepository,
{
    links: Arc<L>,
    clusters: Arc<C>,
    tools: Arc<T>,
}

impl<L, C, T> LinkoutService<L, C, T>
where
    L: LinkRepository,
    C: LinkClusterRepository,
    T: MonitoringToolRepository,
{
    pub fn new(links: Arc<L>, clusters: Arc<C>, tools: Arc<T>) -> Self {
        Self { links, clusters, tools }
    }

    /// Persist each request as an active link plus one active association per cluster id.
    ///
    /// Stops at the first storage failure without undoing earlier rows.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::linkout::{LinkoutService, domain::LinkRequest, repository::mock::InMemoryLinkStore};
    /// let store = Arc::new(InMemoryLinkStore::new());
    /// let svc = LinkoutService::new(store.clone(), store.clone(), store.clone());
    /// let req = LinkRequest {
    ///     id: 0, name: "grafana".into(), url: "https://grafana/d/1".into(), active: true,
    ///     monitoring_tool_id: 1, cluster_ids: vec![1, 2], user_id: Some(2),
    /// };
    /// let created = tokio_test::block_on(svc.create(vec![req.clone()])).unwrap();
    /// assert_eq!(created, vec![req]);
    /// assert_eq!(store.mappings().len(), 2);
    /// ```
    #[instrument(skip(self, requests), fields(count = requests.len()))]
    pub async fn create(&self, requests: Vec<LinkRequest>) -> Result<Vec<LinkRequest>, ServiceError> {
        debug!(?requests, "external link create request");
        for request in &requests {
            let audit = AuditLog::created_now(request.user_id);
            let link = Link {
                id: 0,
                name: request.name.clone(),
                url: request.url.clone(),
                active: true,
                monitoring_tool_id: request.monitoring_tool_id,
                audit,
            };
            let saved = self.links.save(link).await.map_err(|e| {
                error!(name = %request.name, err = %e, "error in saving link");
                ServiceError::persist(LINK_CREATE_FAILED, e)
            })?;

            for cluster_id in distinct(&request.cluster_ids) {
                let mapping = LinkCluster { link_id: saved.id, cluster_id, active: true, audit };
                self.clusters.save(&mapping).await.map_err(|e| {
                    error!(link_id = saved.id, cluster_id, err = %e, "error in saving cluster id");
                    ServiceError::persist(CLUSTER_CREATE_FAILED, e)
                })?;
            }
            info!(link_id = saved.id, clusters = request.cluster_ids.len(), "external link created");
        }
        Ok(requests)
    }

    pub async fn get_all_active_tools(&self) -> Result<Vec<MonitoringToolView>, ServiceError> {
        debug!("fetch all monitoring tools");
        let tools = self.tools.find_all_active().await.map_err(|e| {
            error!(err = %e, "error in fetch all tools");
            e
        })?;
        Ok(tools.into_iter().map(MonitoringToolView::from).collect())
    }

    /// List active links for the UI.
    ///
    /// `cluster_id == 0` yields one entry per link carrying all its active
    /// cluster ids; any other value yields one entry per active association
    /// row of that cluster. Links with no active association at all are
    /// appended in both modes with empty `cluster_ids`.
    ///
    /// Grouped entries come out in ascending link id; no other ordering is promised.
    #[instrument(skip(self))]
    pub async fn fetch_all_active_links(&self, cluster_id: i32) -> Result<Vec<LinkResponse>, ServiceError> {
        debug!("fetch all links");
        let all_active = self.clusters.find_all_active().await.map_err(|e| {
            error!(err = %e, "error in fetch all active cluster mappings");
            e
        })?;
        let mapped_ids: Vec<i32> = all_active.iter().map(|row| row.link.id).collect::<BTreeSet<_>>().into_iter().collect();

        let mut responses = match ClusterFilter::from(cluster_id) {
            ClusterFilter::All => group_by_link(all_active),
            ClusterFilter::Cluster(id) => {
                let rows = self.clusters.find_all_active_by_cluster(id).await.map_err(|e| {
                    error!(cluster_id = id, err = %e, "error in fetch links for cluster");
                    e
                })?;
                rows.into_iter().map(|row| LinkResponse::from_link(&row.link, vec![row.cluster_id])).collect()
            }
        };

        // Unmapped links are excluded against associations of *every* cluster,
        // even under a cluster filter. Existing behaviour, kept as is: a link
        // mapped only to another cluster is neither listed nor treated as global.
        let unmapped = self.links.find_all_non_mapped(&mapped_ids).await.map_err(|e| {
            error!(err = %e, "error in fetch unmapped links");
            e
        })?;
        responses.extend(unmapped.iter().map(|link| LinkResponse::from_link(link, Vec::new())));
        Ok(responses)
    }

    /// Overwrite a link and make its active association set equal `request.cluster_ids`.
    ///
    /// Rows for clusters dropped from the request stay behind with `active = false`.
    /// Failures while deactivating the old set are reported in
    /// [`Outcome::skipped`] instead of failing the call.
    #[instrument(skip(self, request), fields(id = request.id))]
    pub async fn update(&self, request: LinkRequest) -> Result<Outcome<LinkRequest>, ServiceError> {
        debug!(?request, "link update request");
        let mut link = self.links.find_one(request.id).await?.ok_or_else(|| {
            error!(id = request.id, "no matching entry found for update");
            ServiceError::not_found("external link")
        })?;
        link.name = request.name.clone();
        link.url = request.url.clone();
        link.active = request.active;
        link.monitoring_tool_id = request.monitoring_tool_id;
        link.audit.touch(request.user_id);
        self.links.update(&link).await.map_err(|e| {
            error!(id = link.id, err = %e, "error in updating link");
            e
        })?;

        let existing = self.clusters.find_all_clusters(request.id).await.map_err(|e| {
            error!(id = request.id, err = %e, "error in fetching link clusters");
            e
        })?;
        let skipped = self.deactivate_all(request.id, &existing, request.user_id).await;

        for cluster_id in distinct(&request.cluster_ids) {
            // creation stamp only lands on inserted rows; updates write the update stamp
            let audit = AuditLog::created_now(request.user_id);
            let mapping = LinkCluster { link_id: request.id, cluster_id, active: true, audit };
            let res = if existing.contains(&cluster_id) {
                self.clusters.update(&mapping).await
            } else {
                self.clusters.save(&mapping).await
            };
            res.map_err(|e| {
                error!(link_id = request.id, cluster_id, err = %e, "error in saving cluster id");
                ServiceError::persist(CLUSTER_CREATE_FAILED, e)
            })?;
        }
        info!(id = request.id, clusters = request.cluster_ids.len(), skipped = skipped.len(), "external link updated");
        Ok(Outcome { value: request, skipped })
    }

    /// Soft-delete a link: deactivate its associations, then the link itself.
    ///
    /// Only the final link write can fail the call.
    #[instrument(skip(self))]
    pub async fn delete_link(&self, id: i32, user_id: Option<i32>) -> Result<Outcome<()>, ServiceError> {
        debug!("link delete request");
        let mut skipped = Vec::new();
        let existing = match self.clusters.find_all_clusters(id).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(id, err = %e, "could not load link clusters; skipping their deactivation");
                skipped.push(SkippedWrite { link_id: id, cluster_id: None, reason: e.to_string() });
                Vec::new()
            }
        };
        skipped.extend(self.deactivate_all(id, &existing, user_id).await);

        self.links.deactivate(id, user_id, Utc::now()).await.map_err(|e| {
            error!(id, err = %e, "error in deleting link");
            e
        })?;
        info!(id, skipped = skipped.len(), "external link deleted");
        Ok(Outcome { value: (), skipped })
    }

    /// Best effort: failures are logged and returned, never raised.
    async fn deactivate_all(&self, link_id: i32, cluster_ids: &[i32], user_id: Option<i32>) -> Vec<SkippedWrite> {
        let mut skipped = Vec::new();
        for &cluster_id in cluster_ids {
            let mapping = LinkCluster { link_id, cluster_id, active: false, audit: AuditLog::created_now(user_id) };
            if let Err(e) = self.clusters.update(&mapping).await {
                warn!(link_id, cluster_id, err = %e, "error in setting cluster mapping inactive");
                skipped.push(SkippedWrite { link_id, cluster_id: Some(cluster_id), reason: e.to_string() });
            }
        }
        skipped
    }
}

/// One entry per link, cluster ids in row order, keyed by link id for stable output.
fn group_by_link(rows: Vec<ClusterLink>) -> Vec<LinkResponse> {
    let mut grouped: BTreeMap<i32, LinkResponse> = BTreeMap::new();
    for row in rows {
        grouped
            .entry(row.link.id)
            .or_insert_with(|| LinkResponse::from_link(&row.link, Vec::new()))
            .cluster_ids
            .push(row.cluster_id);
    }
    grouped.into_values().collect()
}

/// First occurrence of each id, order kept.
fn distinct(ids: &[i32]) -> Vec<i32> {
    let mut seen = BTreeSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkout::repository::mock::{InMemoryLinkStore, Op};

    type Svc = LinkoutService<InMemoryLinkStore, InMemoryLinkStore, InMemoryLinkStore>;

    fn setup() -> (Arc<InMemoryLinkStore>, Svc) {
        let store = Arc::new(InMemoryLinkStore::new());
        let svc = LinkoutService::new(store.clone(), store.clone(), store.clone());
        (store, svc)
    }

    fn request(name: &str, clusters: &[i32]) -> LinkRequest {
        LinkRequest {
            id: 0,
            name: name.to_string(),
            url: format!("https://{}.example.com/d/1", name),
            active: true,
            monitoring_tool_id: 1,
            cluster_ids: clusters.to_vec(),
            user_id: Some(7),
        }
    }

    fn set(ids: &[i32]) -> BTreeSet<i32> { ids.iter().copied().collect() }

    #[tokio::test]
    async fn create_persists_every_link_and_mapping() {
        let (store, svc) = setup();
        let reqs = vec![request("a", &[1, 2, 3]), request("b", &[1, 2, 3]), request("c", &[4, 5, 6])];

        let out = svc.create(reqs.clone()).await.unwrap();

        assert_eq!(out, reqs);
        assert_eq!(store.links().len(), 3);
        assert!(store.links().iter().all(|l| l.active && l.audit.created_by == Some(7)));
        assert_eq!(store.mappings().len(), 9);
        assert!(store.mappings().iter().all(|m| m.active));
    }

    #[tokio::test]
    async fn create_stops_at_failed_mapping_without_rollback() {
        let (store, svc) = setup();
        // 2 mappings per request; the 4th insert is request two's second cluster
        store.fail_nth(Op::ClusterSave, 4);
        let reqs = vec![request("a", &[1, 2]), request("b", &[1, 2]), request("c", &[1, 2])];

        let err = svc.create(reqs).await.unwrap_err();

        assert_eq!(err.user_message(), CLUSTER_CREATE_FAILED);
        assert!(err.to_string().contains("injected failure"));
        let names: Vec<String> = store.links().into_iter().map(|l| l.name).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(store.mappings().len(), 3);
        assert_eq!(store.calls(Op::LinkSave), 2);
    }

    #[tokio::test]
    async fn create_reports_link_failure_with_user_message() {
        let (store, svc) = setup();
        store.fail_always(Op::LinkSave);

        let err = svc.create(vec![request("a", &[1])]).await.unwrap_err();

        assert_eq!(err.user_message(), LINK_CREATE_FAILED);
        assert_eq!(store.calls(Op::ClusterSave), 0);
    }

    #[tokio::test]
    async fn create_ignores_repeated_cluster_ids() {
        let (store, svc) = setup();
        svc.create(vec![request("a", &[3, 3, 1])]).await.unwrap();
        assert_eq!(store.active_clusters(1), set(&[1, 3]));
        assert_eq!(store.mappings().len(), 2);
    }

    #[tokio::test]
    async fn tools_are_projected_and_filtered() {
        let (store, svc) = setup();
        store.add_tool(1, "Grafana", "grafana", true);
        store.add_tool(2, "Kibana", "kibana", false);

        let tools = svc.get_all_active_tools().await.unwrap();

        assert_eq!(tools, vec![MonitoringToolView { id: 1, name: "Grafana".into(), icon: "grafana".into() }]);
    }

    #[tokio::test]
    async fn tools_failure_propagates() {
        let (store, svc) = setup();
        store.fail_always(Op::ToolFindActive);
        assert!(svc.get_all_active_tools().await.is_err());
    }

    #[tokio::test]
    async fn fetch_all_groups_by_link_and_appends_unmapped() {
        let (store, svc) = setup();
        let a = store.seed_link("a", 1, &[1, 2]);
        let b = store.seed_link("b", 1, &[2]);
        let global = store.seed_link("global", 1, &[]);

        let out = svc.fetch_all_active_links(0).await.unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].id, a);
        assert_eq!(out[0].cluster_ids, vec![1, 2]);
        assert_eq!(out[1].id, b);
        assert_eq!(out[1].cluster_ids, vec![2]);
        assert_eq!(out[2].id, global);
        assert!(out[2].cluster_ids.is_empty());
    }

    #[tokio::test]
    async fn fetch_by_cluster_returns_one_entry_per_row() {
        let (store, svc) = setup();
        let a = store.seed_link("a", 1, &[1, 2]);
        let b = store.seed_link("b", 1, &[2]);
        let global = store.seed_link("global", 1, &[]);

        let out = svc.fetch_all_active_links(2).await.unwrap();

        let ids: Vec<i32> = out.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![a, b, global]);
        assert!(out[..2].iter().all(|r| r.cluster_ids == vec![2]));
        assert!(out[2].cluster_ids.is_empty());
    }

    #[tokio::test]
    async fn fetch_by_cluster_computes_unmapped_links_globally() {
        // existing behaviour: a link mapped only to cluster 5 is not listed for
        // cluster 9, while a link mapped nowhere is listed for every cluster
        let (store, svc) = setup();
        store.seed_link("elsewhere", 1, &[5]);
        let global = store.seed_link("global", 1, &[]);

        let out = svc.fetch_all_active_links(9).await.unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].id, global);
        assert!(out[0].cluster_ids.is_empty());
    }

    #[tokio::test]
    async fn fetch_skips_deleted_links_in_unmapped_set() {
        let (store, svc) = setup();
        let gone = store.seed_link("gone", 1, &[1]);
        svc.delete_link(gone, None).await.unwrap();

        let out = svc.fetch_all_active_links(0).await.unwrap();

        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn fetch_propagates_storage_failures() {
        let (store, svc) = setup();
        store.seed_link("a", 1, &[1]);
        store.fail_always(Op::LinkFindNonMapped);
        assert!(svc.fetch_all_active_links(0).await.is_err());

        store.clear_faults();
        store.fail_always(Op::ClusterFindByCluster);
        assert!(svc.fetch_all_active_links(1).await.is_err());
    }

    #[tokio::test]
    async fn cluster_fetch_fails_when_global_mappings_are_unreadable() {
        let (store, svc) = setup();
        store.seed_link("a", 1, &[3]);
        store.fail_always(Op::ClusterFindActive);
        assert!(svc.fetch_all_active_links(3).await.is_err());
        // the per-cluster read is never reached
        assert_eq!(store.calls(Op::ClusterFindByCluster), 0);
    }

    #[tokio::test]
    async fn update_replaces_active_cluster_set() {
        let (store, svc) = setup();
        let id = store.seed_link("a", 1, &[1, 2, 3]);
        let mut req = request("renamed", &[2, 4]);
        req.id = id;
        req.monitoring_tool_id = 3;

        let out = svc.update(req.clone()).await.unwrap();

        assert!(out.is_clean());
        assert_eq!(out.value, req);
        assert_eq!(store.active_clusters(id), set(&[2, 4]));
        assert_eq!(store.mapping(id, 1).map(|m| m.active), Some(false));
        assert_eq!(store.mapping(id, 3).map(|m| m.active), Some(false));
        // 2 updated in place, 4 inserted, nothing duplicated
        assert_eq!(store.mappings().len(), 4);
        assert_eq!(store.calls(Op::ClusterSave), 1);
        let link = store.link(id).unwrap();
        assert_eq!(link.name, "renamed");
        assert_eq!(link.monitoring_tool_id, 3);
        assert_eq!(link.audit.updated_by, Some(7));
    }

    #[tokio::test]
    async fn update_missing_link_is_not_found() {
        let (store, svc) = setup();
        let mut req = request("a", &[1]);
        req.id = 42;

        let err = svc.update(req).await.unwrap_err();

        assert!(matches!(err, ServiceError::NotFound(_)));
        assert_eq!(store.calls(Op::ClusterFindClusters), 0);
    }

    #[tokio::test]
    async fn update_tolerates_failed_deactivation() {
        let (store, svc) = setup();
        let id = store.seed_link("a", 1, &[1, 2, 3]);
        store.fail_nth(Op::ClusterUpdate, 1);
        let mut req = request("a", &[2, 4]);
        req.id = id;

        let out = svc.update(req).await.unwrap();

        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].cluster_id, Some(1));
        // cluster 1 could not be switched off, so it is still active
        assert_eq!(store.active_clusters(id), set(&[1, 2, 4]));
    }

    #[tokio::test]
    async fn update_fails_when_new_mapping_cannot_be_written() {
        let (store, svc) = setup();
        let id = store.seed_link("a", 1, &[1]);
        store.fail_always(Op::ClusterSave);
        let mut req = request("a", &[1, 5]);
        req.id = id;

        let err = svc.update(req).await.unwrap_err();

        assert_eq!(err.user_message(), CLUSTER_CREATE_FAILED);
        // re-activation of 1 happened before the failing insert
        assert_eq!(store.active_clusters(id), set(&[1]));
    }

    #[tokio::test]
    async fn update_propagates_link_write_failure() {
        let (store, svc) = setup();
        let id = store.seed_link("a", 1, &[1]);
        store.fail_always(Op::LinkUpdate);
        let mut req = request("b", &[2]);
        req.id = id;

        assert!(svc.update(req).await.is_err());
        assert_eq!(store.active_clusters(id), set(&[1]));
    }

    #[tokio::test]
    async fn delete_deactivates_mappings_then_link() {
        let (store, svc) = setup();
        let id = store.seed_link("a", 1, &[1, 2]);

        let out = svc.delete_link(id, Some(3)).await.unwrap();

        assert!(out.is_clean());
        assert!(store.active_clusters(id).is_empty());
        assert_eq!(store.mappings().len(), 2);
        let link = store.link(id).unwrap();
        assert!(!link.active);
        assert_eq!(link.audit.updated_by, Some(3));
    }

    #[tokio::test]
    async fn delete_swallows_mapping_failures() {
        let (store, svc) = setup();
        let id = store.seed_link("a", 1, &[1, 2]);
        store.fail_always(Op::ClusterUpdate);

        let out = svc.delete_link(id, None).await.unwrap();

        assert_eq!(out.skipped.len(), 2);
        assert!(!store.link(id).unwrap().active);
        assert_eq!(store.active_clusters(id), set(&[1, 2]));
    }

    #[tokio::test]
    async fn delete_continues_when_cluster_lookup_fails() {
        let (store, svc) = setup();
        let id = store.seed_link("a", 1, &[1]);
        store.fail_always(Op::ClusterFindClusters);

        let out = svc.delete_link(id, None).await.unwrap();

        assert_eq!(out.skipped.len(), 1);
        assert_eq!(out.skipped[0].cluster_id, None);
        assert!(!store.link(id).unwrap().active);
    }

    #[tokio::test]
    async fn delete_propagates_link_failure_after_mapping_cleanup() {
        let (store, svc) = setup();
        let id = store.seed_link("a", 1, &[1, 2]);
        store.fail_always(Op::LinkDeactivate);

        assert!(svc.delete_link(id, None).await.is_err());
        // partial application: mappings are already off, link still on
        assert!(store.active_clusters(id).is_empty());
        assert!(store.link(id).unwrap().active);
    }

    #[tokio::test]
    async fn delete_unknown_link_is_not_found() {
        let (_store, svc) = setup();
        let err = svc.delete_link(99, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn distinct_keeps_first_occurrence() {
        assert_eq!(distinct(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
