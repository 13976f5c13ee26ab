use reqwest::Method;
use serde_json::json;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use crate::errors::ApiError;
use crate::turbo::dto::{
    EntityDto, EntityStatsDto, GroupDto, SupplyChainDto, CLASS_CONTAINER_CLUSTER,
};
use crate::turbo::TurboClient;
use crate::types::Cluster;

const VIRTUAL_MACHINE: &str = "VirtualMachine";
const VM_ASPECT: &str = "virtualMachineAspect";
const VCPU: &str = "VCPU";

/// Resolves every container platform cluster into its worker capacity.
pub struct ClusterResolver<'a> {
    client: &'a TurboClient,
    exclude_groups: &'a [String],
}

/// Active worker nodes of one cluster and their total vCPU count.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WorkerNodes {
    pub ids: HashSet<String>,
    pub num_cores: u32,
}

impl<'a> ClusterResolver<'a> {
    pub fn new(client: &'a TurboClient, exclude_groups: &'a [String]) -> Self {
        Self {
            client,
            exclude_groups,
        }
    }

    /// Builds the cluster id → [`Cluster`] map used for millicore conversion.
    pub async fn resolve(&self) -> Result<HashMap<String, Cluster>, ApiError> {
        let excluded = self.excluded_nodes().await?;

        let mut clusters = HashMap::new();
        let mut search = self.client.search_by_criteria::<EntityDto>(cluster_search_dto());
        while !search.is_complete() {
            for entity in search.next_page().await? {
                let cluster = self.resolve_cluster(&entity, &excluded).await?;
                info!(
                    cluster = %cluster.name,
                    num_cores = cluster.num_cores,
                    total_mhz = cluster.total_mhz,
                    "resolved cluster capacity"
                );
                clusters.insert(cluster.id.clone(), cluster);
            }
        }

        info!("Resolved {} container platform cluster(s)", clusters.len());
        Ok(clusters)
    }

    /// Members of every group whose name matches one of the exclusion
    /// patterns (case-insensitive prefix).
    pub async fn excluded_nodes(&self) -> Result<HashSet<String>, ApiError> {
        let mut excluded = HashSet::new();
        for pattern in self.exclude_groups {
            let mut search = self.client.search_by_criteria::<GroupDto>(group_search_dto(pattern));
            while !search.is_complete() {
                for group in search.next_page().await? {
                    debug!(
                        group = group.display_name.as_deref().unwrap_or(&group.uuid),
                        members = group.member_uuid_list.len(),
                        "excluding group members"
                    );
                    excluded.extend(group.member_uuid_list);
                }
            }
        }
        info!("Excluding {} master/infra node(s) from worker capacity", excluded.len());
        Ok(excluded)
    }

    async fn resolve_cluster(
        &self,
        entity: &EntityDto,
        excluded: &HashSet<String>,
    ) -> Result<Cluster, ApiError> {
        let chains = self
            .client
            .get_supply_chains(&[entity.uuid.as_str()], &[VIRTUAL_MACHINE], &[VM_ASPECT])
            .collect_all()
            .await?;
        let workers = worker_nodes(&chains, excluded);

        let total_mhz = if workers.ids.is_empty() {
            warn!(cluster = %entity.display_name, "cluster has no active worker nodes");
            0.0
        } else {
            let mut stats = self.client.request::<EntityStatsDto>(
                Method::POST,
                "stats",
                &[],
                Some(cluster_vcpu_stats_dto(&entity.uuid)),
            );
            let mut total = 0.0;
            while !stats.is_complete() {
                total += vcpu_capacity(&stats.next_page().await?, &workers.ids);
            }
            total
        };

        Ok(Cluster {
            id: entity.uuid.clone(),
            name: entity.display_name.clone(),
            num_cores: workers.num_cores,
            total_mhz,
        })
    }
}

/// Active virtual machines not in `excluded`, with their summed vCPUs.
pub fn worker_nodes(chains: &[SupplyChainDto], excluded: &HashSet<String>) -> WorkerNodes {
    let mut workers = WorkerNodes::default();
    let nodes = chains
        .iter()
        .filter_map(|chain| chain.se_map.get(VIRTUAL_MACHINE))
        .flat_map(|entry| entry.instances.values());

    for node in nodes {
        if !node.is_active() || excluded.contains(&node.uuid) {
            continue;
        }
        match node.num_vcpus() {
            Some(vcpus) => workers.num_cores += vcpus,
            None => warn!(node = %node.uuid, "worker node has no numVCPUs, counting 0 cores"),
        }
        workers.ids.insert(node.uuid.clone());
    }
    workers
}

/// Sum of `VCPU` `capacity.total` over worker nodes, taken from each
/// entity's first snapshot.
pub fn vcpu_capacity(entities: &[EntityStatsDto], workers: &HashSet<String>) -> f64 {
    entities
        .iter()
        .filter(|e| workers.contains(&e.uuid))
        .filter_map(|e| e.stats.first())
        .flat_map(|snapshot| snapshot.statistics.iter())
        .filter(|stat| stat.name.as_deref() == Some(VCPU))
        .filter_map(|stat| stat.capacity.as_ref().and_then(|c| c.total))
        .sum()
}

pub fn group_search_dto(pattern: &str) -> serde_json::Value {
    json!({
        "criteriaList": [{
            "expType": "RXEQ",
            "expVal": format!("{}.*", pattern),
            "filterType": "groupsByName",
            "caseSensitive": false
        }],
        "logicalOperator": "AND",
        "className": "Group",
        "scope": null
    })
}

pub fn cluster_search_dto() -> serde_json::Value {
    json!({
        "criteriaList": [],
        "logicalOperator": "AND",
        "className": CLASS_CONTAINER_CLUSTER,
        "scope": null
    })
}

pub fn cluster_vcpu_stats_dto(cluster_id: &str) -> serde_json::Value {
    json!({
        "scopes": [cluster_id],
        "period": {"statistics": [{"name": VCPU}]},
        "relatedType": VIRTUAL_MACHINE
    })
}
