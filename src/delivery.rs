use anyhow::{anyhow, Result};
use tracing::{error, info, warn};

use crate::export::write_report;
use crate::mailer::send_report;
use crate::report::ReportTable;
use crate::types::Config;

/// Writes the report and, when email is configured, sends it. The mailer is
/// only reached once the file has been written successfully.
pub async fn deliver(cfg: &Config, table: &ReportTable) -> Result<()> {
    let output = cfg.output_path();
    if let Err(e) = write_report(table, &output, cfg.file_type) {
        error!(error = %e, detail = ?e, "Cannot save to file {}", output.display());
        return Err(anyhow!("report {} was not written, skipping email", output.display()));
    }
    info!("Wrote {} row(s) to {}", table.rows.len(), output.display());

    match &cfg.email {
        Some(email) => send_report(email, &output, cfg.file_type).await,
        None => {
            warn!("NS_SMTP_SERVER not set, skipping email of {}", output.display());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{load_config_with_env, MockEnvironment};
    use crate::types::Cell;
    use chrono::NaiveDate;

    fn config(output_dir: &str, with_email: bool) -> Config {
        let mut env = MockEnvironment::new()
            .with_var("TURBO_HOST", "turbo.example.com")
            .with_var("TURBO_USER", "reporter")
            .with_var("TURBO_PASS", "secret")
            .with_var("NS_OUTPUT_DIR", output_dir);
        if with_email {
            // Nothing listens here; reaching the mailer would fail differently
            env.set_var("NS_SMTP_SERVER", "127.0.0.1")
                .set_var("NS_SMTP_PORT", "1")
                .set_var("NS_FROM_ADDRS", "reports@example.com")
                .set_var("NS_TO_ADDRS", "ops@example.com");
        }
        load_config_with_env(&env, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()).unwrap()
    }

    fn table() -> ReportTable {
        ReportTable {
            headers: vec!["Namespace".to_string(), "Cluster".to_string()],
            rows: vec![vec![Cell::text(Some("payments")), Cell::text(Some("prod"))]],
        }
    }

    #[tokio::test]
    async fn test_unwritable_report_skips_email() {
        let cfg = config("/nonexistent-dir/for/reports", true);
        assert!(cfg.email.is_some());

        let err = deliver(&cfg, &table()).await.unwrap_err();
        assert!(err.to_string().contains("was not written, skipping email"));
        assert!(!cfg.output_path().exists());
    }

    #[tokio::test]
    async fn test_report_written_without_email() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = config(dir.path().to_str().unwrap(), false);

        deliver(&cfg, &table()).await.unwrap();
        let written = std::fs::read_to_string(cfg.output_path()).unwrap();
        assert!(written.starts_with("Namespace,Cluster"));
        assert!(written.contains("payments,prod"));
    }
}
