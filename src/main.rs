use anyhow::Result;
use chrono::Local;
use tracing::info;
use tracing_subscriber::EnvFilter;

use namespace_reporter::{
    deliver, load_config, log_config_summary, ClusterResolver, NamespaceCollector, ReportBuilder,
    ReportPeriod, TurboClient,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    log_config_summary(&cfg);

    let period = ReportPeriod::previous_month(Local::now().date_naive());
    info!(
        "Pulling data between {} and {}",
        period.start_date(),
        period.end_date()
    );

    // One session for the whole run
    let client = TurboClient::connect(&cfg.turbo).await?;

    let clusters = ClusterResolver::new(&client, &cfg.exclude_master).resolve().await?;
    let inventory = NamespaceCollector::new(&client, &cfg.commodities, &cfg.excluded_names)
        .collect(&period)
        .await?;
    info!("Reporting on {} namespace(s)", inventory.namespaces.len());

    let table = ReportBuilder::new(&cfg.commodities, &cfg.metrics, &cfg.tags)
        .build(&inventory, &clusters);

    deliver(&cfg, &table).await?;

    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("LOGLEVEL")
        .ok()
        .and_then(|level| EnvFilter::try_new(level.to_lowercase()).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_line_number(true)
        .try_init();
}
