use reqwest::Method;
use serde_json::json;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::aggregate::StatAggregator;
use crate::errors::ApiError;
use crate::period::ReportPeriod;
use crate::turbo::dto::{EntityDto, StatSnapshotDto, CLASS_CONTAINER_CLUSTER};
use crate::turbo::TurboClient;
use crate::types::Namespace;

/// Namespaces in enumeration order together with their aggregated stats.
#[derive(Debug, Default)]
pub struct NamespaceInventory {
    pub namespaces: Vec<Namespace>,
    pub stats: StatAggregator,
}

/// Discovers namespaces and folds their monthly statistics.
pub struct NamespaceCollector<'a> {
    client: &'a TurboClient,
    commodities: &'a [String],
    excluded_names: &'a [String],
}

impl<'a> NamespaceCollector<'a> {
    pub fn new(
        client: &'a TurboClient,
        commodities: &'a [String],
        excluded_names: &'a [String],
    ) -> Self {
        Self {
            client,
            commodities,
            excluded_names,
        }
    }

    pub async fn collect(&self, period: &ReportPeriod) -> Result<NamespaceInventory, ApiError> {
        let namespaces = self.discover().await?;
        info!("Collecting statistics for {} namespace(s)", namespaces.len());

        let mut stats = StatAggregator::new();
        for ns in &namespaces {
            self.collect_stats(ns, period, &mut stats).await?;
        }

        Ok(NamespaceInventory { namespaces, stats })
    }

    /// Every namespace whose name contains none of the excluded substrings.
    pub async fn discover(&self) -> Result<Vec<Namespace>, ApiError> {
        let mut selected = Vec::new();
        let mut search = self.client.search::<EntityDto>(&["Namespace"]);
        while !search.is_complete() {
            for entity in search.next_page().await? {
                if is_excluded(&entity.display_name, self.excluded_names) {
                    debug!(namespace = %entity.display_name, "namespace excluded by name");
                    continue;
                }
                let ns = namespace_from_entity(entity);
                if ns.cluster_id.is_none() {
                    warn!(
                        namespace = %ns.name,
                        "namespace has no container platform cluster provider"
                    );
                }
                selected.push(ns);
            }
        }
        Ok(selected)
    }

    async fn collect_stats(
        &self,
        ns: &Namespace,
        period: &ReportPeriod,
        stats: &mut StatAggregator,
    ) -> Result<(), ApiError> {
        let path = format!("stats/{}", ns.id);
        let mut pager = self.client.request::<StatSnapshotDto>(
            Method::POST,
            &path,
            &[("ascending", "false")],
            Some(stats_request_dto(self.commodities, period)),
        );

        let (mut folded, mut skipped) = (0usize, 0usize);
        while !pager.is_complete() {
            for snapshot in pager.next_page().await? {
                if !snapshot.is_historical() {
                    continue;
                }
                for stat in &snapshot.statistics {
                    if stats.fold_stat(&ns.id, &ns.name, stat) {
                        folded += 1;
                    } else {
                        skipped += 1;
                    }
                }
            }
        }

        debug!(
            namespace = %ns.name,
            cluster = ns.cluster_name.as_deref().unwrap_or("-"),
            folded,
            skipped,
            "namespace statistics aggregated"
        );
        Ok(())
    }
}

/// Case-sensitive substring match against the exclusion list.
pub fn is_excluded(name: &str, excluded: &[String]) -> bool {
    excluded.iter().any(|substring| name.contains(substring.as_str()))
}

pub fn namespace_from_entity(entity: EntityDto) -> Namespace {
    let cluster = entity
        .providers
        .iter()
        .find(|p| p.class_name.as_deref() == Some(CLASS_CONTAINER_CLUSTER));

    Namespace {
        id: entity.uuid,
        name: entity.display_name,
        cluster_id: cluster.map(|c| c.uuid.clone()),
        cluster_name: cluster.and_then(|c| c.display_name.clone()),
        tags: normalize_tags(entity.tags),
    }
}

/// Tag values as lists of strings. A scalar value becomes a one-element list.
pub fn normalize_tags(raw: HashMap<String, serde_json::Value>) -> HashMap<String, Vec<String>> {
    raw.into_iter()
        .map(|(key, value)| {
            let values = match value {
                serde_json::Value::Array(items) => {
                    items.into_iter().filter_map(scalar_to_string).collect()
                }
                other => scalar_to_string(other).into_iter().collect(),
            };
            (key, values)
        })
        .collect()
}

fn scalar_to_string(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Body of the per-namespace `POST /stats/<id>` request.
pub fn stats_request_dto(commodities: &[String], period: &ReportPeriod) -> serde_json::Value {
    let statistics: Vec<serde_json::Value> = commodities
        .iter()
        .map(|name| json!({"name": name, "relatedEntityType": "Namespace"}))
        .collect();
    json!({
        "statistics": statistics,
        "startDate": period.start_date(),
        "endDate": period.end_date()
    })
}
