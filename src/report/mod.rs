use std::collections::HashMap;

use crate::aggregate::{CommodityAggregate, StatAggregator};
use crate::collector::NamespaceInventory;
use crate::types::{Cell, Cluster, Metric, Namespace};
use crate::units::{effective_capacity, is_cpu_commodity, mhz_to_millicores};

/// How a metric column is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// The aggregate value in the commodity's native unit.
    Raw,
    /// The raw value converted to millicores (CPU commodities only).
    Millicores,
}

/// One metric column of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumn {
    pub commodity: String,
    pub metric: Metric,
    pub kind: ColumnKind,
}

impl MetricColumn {
    pub fn title(&self) -> String {
        let unit = match self.kind {
            ColumnKind::Millicores => "Millicores",
            ColumnKind::Raw if is_cpu_commodity(&self.commodity) => "Mhz",
            ColumnKind::Raw => "KB",
        };
        format!("{} {} ({})", self.commodity, self.metric.title(), unit)
    }
}

/// Header plus one row per namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// Turns namespace aggregates into report rows.
///
/// Headers and rows both walk the same column plan: commodities in the
/// configured order, and within each commodity the metrics in configured
/// order, with a millicores column right after every raw column of a CPU
/// commodity.
pub struct ReportBuilder<'a> {
    commodities: &'a [String],
    metrics: &'a [Metric],
    tags: &'a [String],
}

impl<'a> ReportBuilder<'a> {
    pub fn new(commodities: &'a [String], metrics: &'a [Metric], tags: &'a [String]) -> Self {
        Self {
            commodities,
            metrics,
            tags,
        }
    }

    pub fn columns(&self) -> Vec<MetricColumn> {
        let mut columns = Vec::new();
        for commodity in self.commodities {
            for metric in self.metrics {
                columns.push(MetricColumn {
                    commodity: commodity.clone(),
                    metric: *metric,
                    kind: ColumnKind::Raw,
                });
                if is_cpu_commodity(commodity) {
                    columns.push(MetricColumn {
                        commodity: commodity.clone(),
                        metric: *metric,
                        kind: ColumnKind::Millicores,
                    });
                }
            }
        }
        columns
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec!["Namespace".to_string(), "Cluster".to_string()];
        headers.extend(self.tags.iter().cloned());
        headers.extend(self.columns().iter().map(MetricColumn::title));
        headers
    }

    pub fn row(
        &self,
        ns: &Namespace,
        cluster: Option<&Cluster>,
        stats: &StatAggregator,
    ) -> Vec<Cell> {
        let mut row = vec![
            Cell::Text(ns.name.clone()),
            Cell::text(ns.cluster_name.as_deref()),
        ];
        row.extend(self.tag_cells(&ns.tags));

        for column in self.columns() {
            let raw = metric_value(stats.get(&ns.id, &column.commodity), column.metric);
            let value = match column.kind {
                ColumnKind::Raw => raw,
                ColumnKind::Millicores => mhz_to_millicores(
                    raw,
                    cluster.map(|c| c.num_cores),
                    cluster.map(|c| c.total_mhz),
                ),
            };
            row.push(Cell::number(value));
        }
        row
    }

    /// First value of each requested tag, `Empty` when absent.
    pub fn tag_cells(&self, tags: &HashMap<String, Vec<String>>) -> Vec<Cell> {
        self.tags
            .iter()
            .map(|key| {
                Cell::text(tags.get(key).and_then(|values| values.first()).map(String::as_str))
            })
            .collect()
    }

    pub fn build(
        &self,
        inventory: &NamespaceInventory,
        clusters: &HashMap<String, Cluster>,
    ) -> ReportTable {
        let rows = inventory
            .namespaces
            .iter()
            .map(|ns| {
                let cluster = ns.cluster_id.as_ref().and_then(|id| clusters.get(id));
                self.row(ns, cluster, &inventory.stats)
            })
            .collect();

        ReportTable {
            headers: self.headers(),
            rows,
        }
    }
}

/// Value of `metric` for an aggregate; `None` means "no data".
pub fn metric_value(aggregate: Option<&CommodityAggregate>, metric: Metric) -> Option<f64> {
    let agg = aggregate?;
    match metric {
        Metric::Average => agg.average(),
        Metric::Capacity => effective_capacity(agg.capacity),
        Metric::Peak => Some(agg.peak),
        Metric::Sum => Some(agg.sum),
        Metric::Count => Some(agg.count as f64),
    }
}
