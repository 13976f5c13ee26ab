use std::collections::HashMap;
use tracing::warn;

use crate::errors::SampleError;
use crate::turbo::dto::StatApiDto;

/// Running totals for one (namespace, commodity) pair over the period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommodityAggregate {
    pub count: u64,
    /// Sum of per-interval averages.
    pub sum: f64,
    /// Highest per-interval maximum.
    pub peak: f64,
    /// Last capacity seen.
    pub capacity: f64,
}

impl CommodityAggregate {
    fn first(sample: &StatSample) -> Self {
        Self {
            count: 1,
            sum: sample.avg,
            peak: sample.max,
            capacity: sample.capacity,
        }
    }

    fn fold(&mut self, sample: &StatSample) {
        self.count += 1;
        self.sum += sample.avg;
        self.peak = self.peak.max(sample.max);
        self.capacity = sample.capacity;
    }

    pub fn average(&self) -> Option<f64> {
        if self.count == 0 {
            None
        } else {
            Some(self.sum / self.count as f64)
        }
    }
}

/// A statistic with every field the fold needs.
#[derive(Debug, Clone, PartialEq)]
pub struct StatSample {
    pub commodity: String,
    pub avg: f64,
    pub max: f64,
    pub capacity: f64,
}

impl TryFrom<&StatApiDto> for StatSample {
    type Error = SampleError;

    fn try_from(stat: &StatApiDto) -> Result<Self, Self::Error> {
        let commodity = stat.name.clone().ok_or(SampleError::MissingField("name"))?;
        let values = stat.values.as_ref().ok_or(SampleError::MissingField("values"))?;
        let avg = values.avg.ok_or(SampleError::MissingField("values.avg"))?;
        let max = values.max.ok_or(SampleError::MissingField("values.max"))?;
        let capacity = stat
            .capacity
            .as_ref()
            .and_then(|c| c.total)
            .ok_or(SampleError::MissingField("capacity.total"))?;
        Ok(Self {
            commodity,
            avg,
            max,
            capacity,
        })
    }
}

/// Aggregates keyed by `(namespace id, commodity name)`.
#[derive(Debug, Default, Clone)]
pub struct StatAggregator {
    stats: HashMap<(String, String), CommodityAggregate>,
}

impl StatAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one validated sample into its aggregate.
    pub fn fold_sample(&mut self, namespace_id: &str, sample: &StatSample) {
        let key = (namespace_id.to_string(), sample.commodity.clone());
        match self.stats.get_mut(&key) {
            Some(agg) => agg.fold(sample),
            None => {
                self.stats.insert(key, CommodityAggregate::first(sample));
            }
        }
    }

    /// Validates and folds a raw statistic. Incomplete statistics are logged
    /// and skipped; the function reports whether the stat was used.
    pub fn fold_stat(
        &mut self,
        namespace_id: &str,
        namespace_name: &str,
        stat: &StatApiDto,
    ) -> bool {
        match StatSample::try_from(stat) {
            Ok(sample) => {
                self.fold_sample(namespace_id, &sample);
                true
            }
            Err(e) => {
                warn!(
                    namespace = %namespace_name,
                    commodity = stat.name.as_deref().unwrap_or("<unnamed>"),
                    error = %e,
                    "skipping statistic sample"
                );
                false
            }
        }
    }

    pub fn get(&self, namespace_id: &str, commodity: &str) -> Option<&CommodityAggregate> {
        self.stats.get(&(namespace_id.to_string(), commodity.to_string()))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }
}
