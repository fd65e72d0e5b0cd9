use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::domain::{ClusterLink, Link, LinkCluster, MonitoringTool};
use crate::errors::ServiceError;

/// Persistence for external links.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Insert a new row; the returned link carries the storage-assigned id.
    async fn save(&self, link: Link) -> Result<Link, ServiceError>;
    async fn update(&self, link: &Link) -> Result<(), ServiceError>;
    async fn find_one(&self, id: i32) -> Result<Option<Link>, ServiceError>;
    /// Active links whose id is not in `excluded`. An empty slice excludes nothing.
    async fn find_all_non_mapped(&self, excluded: &[i32]) -> Result<Vec<Link>, ServiceError>;
    /// Flip `active` off. `NotFound` when no row has this id.
    async fn deactivate(&self, id: i32, updated_by: Option<i32>, updated_on: DateTime<Utc>) -> Result<(), ServiceError>;
}

/// Persistence for link-to-cluster associations.
#[async_trait]
pub trait LinkClusterRepository: Send + Sync {
    async fn save(&self, mapping: &LinkCluster) -> Result<(), ServiceError>;
    /// Overwrite `active` and the update stamp of the existing `(link_id, cluster_id)` row.
    async fn update(&self, mapping: &LinkCluster) -> Result<(), ServiceError>;
    async fn find_all_active(&self) -> Result<Vec<ClusterLink>, ServiceError>;
    async fn find_all_active_by_cluster(&self, cluster_id: i32) -> Result<Vec<ClusterLink>, ServiceError>;
    /// Every cluster id ever associated with the link, active or not.
    async fn find_all_clusters(&self, link_id: i32) -> Result<Vec<i32>, ServiceError>;
}

#[async_trait]
pub trait MonitoringToolRepository: Send + Sync {
    async fn find_all_active(&self) -> Result<Vec<MonitoringTool>, ServiceError>;
}

/// In-memory store implementing all three repositories, with fault injection for tests and doc examples.
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, BTreeSet, HashMap};
    use std::sync::Mutex;

    use crate::audit::AuditLog;

    /// Repository calls that can be made to fail.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Op {
        LinkSave,
        LinkUpdate,
        LinkFindOne,
        LinkFindNonMapped,
        LinkDeactivate,
        ClusterSave,
        ClusterUpdate,
        ClusterFindActive,
        ClusterFindByCluster,
        ClusterFindClusters,
        ToolFindActive,
    }

    #[derive(Debug, Clone, Copy)]
    enum Fault {
        Always,
        /// 1-based call number
        Nth(usize),
    }

    #[derive(Default)]
    struct State {
        next_link_id: i32,
        links: BTreeMap<i32, Link>,
        mappings: Vec<LinkCluster>,
        tools: Vec<(MonitoringTool, bool)>,
        calls: HashMap<Op, usize>,
        faults: HashMap<Op, Fault>,
    }

    #[derive(Default)]
    pub struct InMemoryLinkStore {
        state: Mutex<State>,
    }

    impl InMemoryLinkStore {
        pub fn new() -> Self { Self::default() }

        /// Every call to `op` fails from now on.
        pub fn fail_always(&self, op: Op) {
            self.state.lock().unwrap().faults.insert(op, Fault::Always);
        }

        /// Only the `n`-th call (1-based, counted from store creation) to `op` fails.
        pub fn fail_nth(&self, op: Op, n: usize) {
            self.state.lock().unwrap().faults.insert(op, Fault::Nth(n));
        }

        pub fn clear_faults(&self) {
            self.state.lock().unwrap().faults.clear();
        }

        pub fn calls(&self, op: Op) -> usize {
            self.state.lock().unwrap().calls.get(&op).copied().unwrap_or(0)
        }

        pub fn add_tool(&self, id: i32, name: &str, icon: &str, active: bool) {
            let tool = MonitoringTool { id, name: name.to_string(), icon: icon.to_string() };
            self.state.lock().unwrap().tools.push((tool, active));
        }

        pub fn links(&self) -> Vec<Link> {
            self.state.lock().unwrap().links.values().cloned().collect()
        }

        pub fn link(&self, id: i32) -> Option<Link> {
            self.state.lock().unwrap().links.get(&id).cloned()
        }

        pub fn mappings(&self) -> Vec<LinkCluster> {
            self.state.lock().unwrap().mappings.clone()
        }

        pub fn mapping(&self, link_id: i32, cluster_id: i32) -> Option<LinkCluster> {
            self.state
                .lock()
                .unwrap()
                .mappings
                .iter()
                .find(|m| m.link_id == link_id && m.cluster_id == cluster_id)
                .cloned()
        }

        pub fn active_clusters(&self, link_id: i32) -> BTreeSet<i32> {
            self.state
                .lock()
                .unwrap()
                .mappings
                .iter()
                .filter(|m| m.link_id == link_id && m.active)
                .map(|m| m.cluster_id)
                .collect()
        }

        /// Seed a link with active associations, bypassing fault injection and call counts.
        pub fn seed_link(&self, name: &str, monitoring_tool_id: i32, cluster_ids: &[i32]) -> i32 {
            let mut st = self.state.lock().unwrap();
            st.next_link_id += 1;
            let id = st.next_link_id;
            let audit = AuditLog::created_now(None);
            st.links.insert(id, Link {
                id,
                name: name.to_string(),
                url: format!("https://{}.example.com", name),
                active: true,
                monitoring_tool_id,
                audit,
            });
            for &cluster_id in cluster_ids {
                st.mappings.push(LinkCluster { link_id: id, cluster_id, active: true, audit });
            }
            id
        }

        fn enter(&self, op: Op) -> Result<std::sync::MutexGuard<'_, State>, ServiceError> {
            let mut st = self.state.lock().unwrap();
            let n = {
                let c = st.calls.entry(op).or_insert(0);
                *c += 1;
                *c
            };
            let failing = match st.faults.get(&op) {
                Some(Fault::Always) => true,
                Some(Fault::Nth(k)) => *k == n,
                None => false,
            };
            if failing {
                return Err(ServiceError::Db(format!("injected failure on {:?} call {}", op, n)));
            }
            Ok(st)
        }

        fn joined(st: &State, filter: impl Fn(&LinkCluster) -> bool) -> Vec<ClusterLink> {
            st.mappings
                .iter()
                .filter(|m| m.active && filter(m))
                .filter_map(|m| st.links.get(&m.link_id).map(|l| ClusterLink { cluster_id: m.cluster_id, link: l.clone() }))
                .collect()
        }
    }

    #[async_trait]
    impl LinkRepository for InMemoryLinkStore {
        async fn save(&self, mut link: Link) -> Result<Link, ServiceError> {
            let mut st = self.enter(Op::LinkSave)?;
            st.next_link_id += 1;
            link.id = st.next_link_id;
            st.links.insert(link.id, link.clone());
            Ok(link)
        }

        async fn update(&self, link: &Link) -> Result<(), ServiceError> {
            let mut st = self.enter(Op::LinkUpdate)?;
            match st.links.get_mut(&link.id) {
                Some(existing) => {
                    *existing = link.clone();
                    Ok(())
                }
                None => Err(ServiceError::not_found("external link")),
            }
        }

        async fn find_one(&self, id: i32) -> Result<Option<Link>, ServiceError> {
            let st = self.enter(Op::LinkFindOne)?;
            Ok(st.links.get(&id).cloned())
        }

        async fn find_all_non_mapped(&self, excluded: &[i32]) -> Result<Vec<Link>, ServiceError> {
            let st = self.enter(Op::LinkFindNonMapped)?;
            Ok(st.links.values().filter(|l| l.active && !excluded.contains(&l.id)).cloned().collect())
        }

        async fn deactivate(&self, id: i32, updated_by: Option<i32>, updated_on: DateTime<Utc>) -> Result<(), ServiceError> {
            let mut st = self.enter(Op::LinkDeactivate)?;
            let link = st.links.get_mut(&id).ok_or_else(|| ServiceError::not_found("external link"))?;
            link.active = false;
            link.audit.updated_on = updated_on;
            link.audit.updated_by = updated_by;
            Ok(())
        }
    }

    #[async_trait]
    impl LinkClusterRepository for InMemoryLinkStore {
        async fn save(&self, mapping: &LinkCluster) -> Result<(), ServiceError> {
            let mut st = self.enter(Op::ClusterSave)?;
            // mirrors the unique (external_link_id, cluster_id) index
            if st.mappings.iter().any(|m| m.link_id == mapping.link_id && m.cluster_id == mapping.cluster_id) {
                return Err(ServiceError::Conflict(format!(
                    "mapping ({}, {}) already exists",
                    mapping.link_id, mapping.cluster_id
                )));
            }
            st.mappings.push(mapping.clone());
            Ok(())
        }

        async fn update(&self, mapping: &LinkCluster) -> Result<(), ServiceError> {
            let mut st = self.enter(Op::ClusterUpdate)?;
            let row = st
                .mappings
                .iter_mut()
                .find(|m| m.link_id == mapping.link_id && m.cluster_id == mapping.cluster_id)
                .ok_or_else(|| ServiceError::not_found("external link cluster mapping"))?;
            row.active = mapping.active;
            row.audit.updated_on = mapping.audit.updated_on;
            row.audit.updated_by = mapping.audit.updated_by;
            Ok(())
        }

        async fn find_all_active(&self) -> Result<Vec<ClusterLink>, ServiceError> {
            let st = self.enter(Op::ClusterFindActive)?;
            Ok(Self::joined(&st, |_| true))
        }

        async fn find_all_active_by_cluster(&self, cluster_id: i32) -> Result<Vec<ClusterLink>, ServiceError> {
            let st = self.enter(Op::ClusterFindByCluster)?;
            Ok(Self::joined(&st, |m| m.cluster_id == cluster_id))
        }

        async fn find_all_clusters(&self, link_id: i32) -> Result<Vec<i32>, ServiceError> {
            let st = self.enter(Op::ClusterFindClusters)?;
            Ok(st.mappings.iter().filter(|m| m.link_id == link_id).map(|m| m.cluster_id).collect())
        }
    }

    #[async_trait]
    impl MonitoringToolRepository for InMemoryLinkStore {
        async fn find_all_active(&self) -> Result<Vec<MonitoringTool>, ServiceError> {
            let st = self.enter(Op::ToolFindActive)?;
            Ok(st.tools.iter().filter(|(_, active)| *active).map(|(t, _)| t.clone()).collect())
        }
    }
}
