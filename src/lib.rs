// Public modules
pub mod types;
pub mod errors;
pub mod config;
pub mod period;
pub mod units;
pub mod turbo;
pub mod aggregate;
pub mod collector;
pub mod report;
pub mod export;
pub mod mailer;
pub mod delivery;

// Re-export commonly used items
pub use types::*;
pub use errors::{ApiError, ConfigError, ExportError, SampleError};
pub use config::{
    load_config, load_config_with_env, log_config_summary, EnvironmentProvider, MockEnvironment,
    SystemEnvironment,
};
pub use period::ReportPeriod;
pub use units::{effective_capacity, is_cpu_commodity, mhz_to_millicores, UNLIMITED_CAPACITY};
pub use turbo::{TurboClient, Pager};
pub use aggregate::{CommodityAggregate, StatAggregator, StatSample};
pub use collector::{ClusterResolver, NamespaceCollector, NamespaceInventory};
pub use report::{ReportBuilder, ReportTable};
pub use export::write_report;
pub use mailer::send_report;
pub use delivery::deliver;
