use tracing::debug;

/// Capacity reported by the platform when a commodity has no defined limit.
pub const UNLIMITED_CAPACITY: f64 = 1e12;

/// Whether a commodity is measured in MHz and gets a millicores column.
pub fn is_cpu_commodity(commodity: &str) -> bool {
    commodity.to_lowercase().contains("vcpu")
}

/// Drops the "no defined capacity" sentinel.
pub fn effective_capacity(capacity: f64) -> Option<f64> {
    if capacity == UNLIMITED_CAPACITY {
        None
    } else {
        Some(capacity)
    }
}

/// Converts a MHz value into millicores using the cluster's aggregate worker
/// capacity: `(value / capacity_mhz) * (num_cores * 1000)`.
pub fn mhz_to_millicores(
    value: Option<f64>,
    num_cores: Option<u32>,
    capacity_mhz: Option<f64>,
) -> Option<f64> {
    match (value, num_cores, capacity_mhz) {
        (Some(v), Some(cores), Some(cap)) if cap != 0.0 && cap.is_finite() => {
            Some((v / cap) * (f64::from(cores) * 1000.0))
        }
        _ => {
            debug!(
                value = ?value,
                capacity_mhz = ?capacity_mhz,
                "cannot determine millicores"
            );
            None
        }
    }
}
