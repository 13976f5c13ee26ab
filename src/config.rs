use chrono::{Local, NaiveDate};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::errors::ConfigError;
use crate::types::{Config, EmailConfig, FileType, Metric, TurboConfig};

pub const DEFAULT_COMMODITIES: &[&str] = &[
    "VCPU",
    "VCPURequestQuota",
    "VCPULimitQuota",
    "VMem",
    "VMemRequestQuota",
    "VMemLimitQuota",
];
pub const DEFAULT_METRICS: &[&str] = &["average", "peak", "capacity", "sum"];
pub const DEFAULT_EXCLUDED_NAMES: &[&str] = &["default", "kube", "openshift"];
pub const DEFAULT_EXCLUDE_MASTER: &[&str] = &["NodeRole-master", "NodeRole-infra"];
pub const DEFAULT_SMTP_PORT: u16 = 25;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_SUBJECT: &str = "Namespace Utilization Report";

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config, ConfigError> {
    load_config_with_env(&SystemEnvironment, Local::now().date_naive())
}

/// Builds the run configuration. `today` keys the default file name and the
/// date-keyed `NS_FILENAME_<date>.<ext>` override.
pub fn load_config_with_env<E: EnvironmentProvider>(
    env: &E,
    today: NaiveDate,
) -> Result<Config, ConfigError> {
    let turbo = TurboConfig {
        host: required(env, "TURBO_HOST")?,
        username: required(env, "TURBO_USER")?,
        password: required(env, "TURBO_PASS")?,
        verify_ssl: env
            .get_var("TURBO_VERIFY_SSL")
            .map(|v| parse_bool(&v))
            .unwrap_or(false),
        timeout_secs: env
            .get_var("TURBO_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS),
    };

    let commodities = list_or_default(env.get_var("COMMODITIES"), DEFAULT_COMMODITIES);

    let metrics = list_or_default(env.get_var("METRICS"), DEFAULT_METRICS)
        .iter()
        .map(|m| Metric::parse(m))
        .collect::<Result<Vec<_>, _>>()?;

    let tags = env.get_var("TAGS").map(|v| split_list(&v)).unwrap_or_default();

    // Set but empty disables the default exclusions.
    let excluded_names = match env.get_var("EXCLUDED_NAMES") {
        Some(v) => split_list(&v),
        None => to_owned_list(DEFAULT_EXCLUDED_NAMES),
    };

    let exclude_master = list_or_default(env.get_var("EXCLUDE_MASTER"), DEFAULT_EXCLUDE_MASTER);

    let file_type = match env.get_var("NS_FILETYPE") {
        Some(v) if !v.trim().is_empty() => FileType::parse(&v)?,
        _ => FileType::Csv,
    };

    let file_name = resolve_file_name(env, today, file_type);

    let output_dir = env
        .get_var("NS_OUTPUT_DIR")
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);

    let email = load_email_config(env)?;

    Ok(Config {
        turbo,
        commodities,
        metrics,
        tags,
        excluded_names,
        exclude_master,
        file_type,
        file_name,
        output_dir,
        email,
    })
}

fn resolve_file_name<E: EnvironmentProvider>(
    env: &E,
    today: NaiveDate,
    file_type: FileType,
) -> String {
    let date = today.format("%Y-%m-%d");
    let dated_var = format!("NS_FILENAME_{}.{}", date, file_type.extension());
    if let Some(name) = env.get_var(&dated_var).filter(|v| !v.trim().is_empty()) {
        warn!(var = %dated_var, "using date-keyed file name override; prefer NS_FILENAME");
        return name;
    }
    env.get_var("NS_FILENAME")
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| format!("namespaceReport_{}.{}", date, file_type.extension()))
}

fn load_email_config<E: EnvironmentProvider>(env: &E) -> Result<Option<EmailConfig>, ConfigError> {
    let smtp_server = match env.get_var("NS_SMTP_SERVER").filter(|v| !v.trim().is_empty()) {
        Some(server) => server,
        None => return Ok(None),
    };

    let smtp_port = match env.get_var("NS_SMTP_PORT").filter(|v| !v.trim().is_empty()) {
        Some(v) => v.trim().parse::<u16>().map_err(|e| ConfigError::Invalid {
            var: "NS_SMTP_PORT",
            reason: e.to_string(),
        })?,
        None => DEFAULT_SMTP_PORT,
    };

    let from_addr = required(env, "NS_FROM_ADDRS")?;
    let to_addrs = split_list(&required(env, "NS_TO_ADDRS")?);
    if to_addrs.is_empty() {
        return Err(ConfigError::Missing("NS_TO_ADDRS"));
    }

    let tls = env.get_var("NS_TLS").map(|v| parse_bool(&v)).unwrap_or(false);
    let auth = env.get_var("NS_AUTH").map(|v| parse_bool(&v)).unwrap_or(false);
    let credentials = if auth {
        Some((required(env, "NS_USERNAME")?, required(env, "NS_PASSWORD")?))
    } else {
        None
    };

    Ok(Some(EmailConfig {
        smtp_server,
        smtp_port,
        from_addr,
        to_addrs,
        tls,
        credentials,
        subject: env
            .get_var("NS_SUBJECT")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SUBJECT.to_string()),
        body: env.get_var("NS_BODY").filter(|v| !v.is_empty()),
    }))
}

/// Logs the effective configuration at INFO.
pub fn log_config_summary(cfg: &Config) {
    info!("Reporting using the following commodities: {:?}", cfg.commodities);
    info!(
        "Reporting using the following metrics: {:?}",
        cfg.metrics.iter().map(|m| m.to_string()).collect::<Vec<_>>()
    );
    info!("Excluding the following namespace(s): {:?}", cfg.excluded_names);
    info!("Excluding nodes from the following group(s): {:?}", cfg.exclude_master);
    info!("Including the following tag(s) in the report: {:?}", cfg.tags);
    info!(file = %cfg.output_path().display(), file_type = %cfg.file_type, "report output");
}

fn required<E: EnvironmentProvider>(env: &E, key: &'static str) -> Result<String, ConfigError> {
    env.get_var(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(':')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn list_or_default(raw: Option<String>, default: &[&str]) -> Vec<String> {
    let list = raw.map(|v| split_list(&v)).unwrap_or_default();
    if list.is_empty() {
        to_owned_list(default)
    } else {
        list
    }
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn parse_bool(v: &str) -> bool {
    matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "t")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn base_env() -> MockEnvironment {
        MockEnvironment::new()
            .with_var("TURBO_HOST", "turbo.example.com")
            .with_var("TURBO_USER", "reporter")
            .with_var("TURBO_PASS", "secret")
    }

    #[test]
    fn test_config_loading_defaults() {
        let config = load_config_with_env(&base_env(), today()).unwrap();

        assert_eq!(config.turbo.host, "turbo.example.com");
        assert_eq!(config.commodities, DEFAULT_COMMODITIES);
        assert_eq!(
            config.metrics,
            vec![Metric::Average, Metric::Peak, Metric::Capacity, Metric::Sum]
        );
        assert!(config.tags.is_empty());
        assert_eq!(config.excluded_names, vec!["default", "kube", "openshift"]);
        assert_eq!(config.exclude_master, vec!["NodeRole-master", "NodeRole-infra"]);
        assert_eq!(config.file_type, FileType::Csv);
        assert_eq!(config.file_name, "namespaceReport_2024-03-15.csv");
        assert_eq!(config.output_dir, std::env::temp_dir());
        assert!(!config.turbo.verify_ssl);
        assert_eq!(config.turbo.timeout_secs, 120);
        assert!(config.email.is_none());
    }

    #[test]
    fn test_config_loading_missing_required() {
        for key in ["TURBO_HOST", "TURBO_USER", "TURBO_PASS"] {
            let mut env = base_env();
            env.set_var(key, "");
            let result = load_config_with_env(&env, today());
            assert!(result.unwrap_err().to_string().contains(key));
        }
    }

    #[test]
    fn test_colon_separated_lists() {
        let env = base_env()
            .with_var("COMMODITIES", "VCPU:VMem")
            .with_var("METRICS", "AVERAGE:Peak")
            .with_var("TAGS", "owner: cost-center :")
            .with_var("EXCLUDE_MASTER", "NodeRole-control");

        let config = load_config_with_env(&env, today()).unwrap();
        assert_eq!(config.commodities, vec!["VCPU", "VMem"]);
        assert_eq!(config.metrics, vec![Metric::Average, Metric::Peak]);
        assert_eq!(config.tags, vec!["owner", "cost-center"]);
        assert_eq!(config.exclude_master, vec!["NodeRole-control"]);
    }

    #[test]
    fn test_unknown_metric_is_rejected() {
        let env = base_env().with_var("METRICS", "average:median");
        let err = load_config_with_env(&env, today()).unwrap_err();
        assert!(err.to_string().contains("METRICS"));
        assert!(err.to_string().contains("median"));
    }

    #[test]
    fn test_excluded_names_empty_disables_defaults() {
        let env = base_env().with_var("EXCLUDED_NAMES", "");
        let config = load_config_with_env(&env, today()).unwrap();
        assert!(config.excluded_names.is_empty());

        let env = base_env().with_var("EXCLUDED_NAMES", "test:sandbox");
        let config = load_config_with_env(&env, today()).unwrap();
        assert_eq!(config.excluded_names, vec!["test", "sandbox"]);
    }

    #[test]
    fn test_empty_exclude_master_uses_defaults() {
        let env = base_env().with_var("EXCLUDE_MASTER", "");
        let config = load_config_with_env(&env, today()).unwrap();
        assert_eq!(config.exclude_master, vec!["NodeRole-master", "NodeRole-infra"]);
    }

    #[test]
    fn test_file_name_overrides() {
        let env = base_env().with_var("NS_FILETYPE", "XLSX");
        let config = load_config_with_env(&env, today()).unwrap();
        assert_eq!(config.file_type, FileType::Xlsx);
        assert_eq!(config.file_name, "namespaceReport_2024-03-15.xlsx");

        let env = base_env().with_var("NS_FILENAME", "static.csv");
        let config = load_config_with_env(&env, today()).unwrap();
        assert_eq!(config.file_name, "static.csv");

        let env = base_env()
            .with_var("NS_FILENAME", "static.csv")
            .with_var("NS_FILENAME_2024-03-15.csv", "dated.csv")
            .with_var("NS_OUTPUT_DIR", "/var/reports");
        let config = load_config_with_env(&env, today()).unwrap();
        assert_eq!(config.file_name, "dated.csv");
        assert_eq!(config.output_path(), PathBuf::from("/var/reports/dated.csv"));
    }

    #[test]
    fn test_invalid_file_type() {
        let env = base_env().with_var("NS_FILETYPE", "pdf");
        let err = load_config_with_env(&env, today()).unwrap_err();
        assert!(err.to_string().contains("NS_FILETYPE"));
    }

    #[test]
    fn test_email_config() {
        let env = base_env()
            .with_var("NS_SMTP_SERVER", "smtp.example.com")
            .with_var("NS_FROM_ADDRS", "reports@example.com")
            .with_var("NS_TO_ADDRS", "a@example.com:b@example.com")
            .with_var("NS_TLS", "True")
            .with_var("NS_AUTH", "t")
            .with_var("NS_USERNAME", "mailer")
            .with_var("NS_PASSWORD", "pw")
            .with_var("NS_BODY", "Monthly report attached");

        let email = load_config_with_env(&env, today()).unwrap().email.unwrap();
        assert_eq!(email.smtp_server, "smtp.example.com");
        assert_eq!(email.smtp_port, 25);
        assert_eq!(email.to_addrs, vec!["a@example.com", "b@example.com"]);
        assert!(email.tls);
        assert_eq!(email.credentials, Some(("mailer".to_string(), "pw".to_string())));
        assert_eq!(email.subject, DEFAULT_SUBJECT);
        assert_eq!(email.body.as_deref(), Some("Monthly report attached"));
    }

    #[test]
    fn test_email_config_validation() {
        let env = base_env()
            .with_var("NS_SMTP_SERVER", "smtp.example.com")
            .with_var("NS_TO_ADDRS", "a@example.com");
        let err = load_config_with_env(&env, today()).unwrap_err();
        assert!(err.to_string().contains("NS_FROM_ADDRS"));

        let env = base_env()
            .with_var("NS_SMTP_SERVER", "smtp.example.com")
            .with_var("NS_FROM_ADDRS", "reports@example.com")
            .with_var("NS_TO_ADDRS", "a@example.com")
            .with_var("NS_SMTP_PORT", "not-a-port");
        let err = load_config_with_env(&env, today()).unwrap_err();
        assert!(err.to_string().contains("NS_SMTP_PORT"));

        let env = base_env()
            .with_var("NS_SMTP_SERVER", "smtp.example.com")
            .with_var("NS_FROM_ADDRS", "reports@example.com")
            .with_var("NS_TO_ADDRS", "a@example.com")
            .with_var("NS_AUTH", "true");
        let err = load_config_with_env(&env, today()).unwrap_err();
        assert!(err.to_string().contains("NS_USERNAME"));
    }

    #[test]
    fn test_boolean_parsing() {
        for val in ["1", "true", "TRUE", "True", "t", "T"] {
            assert!(parse_bool(val), "Failed for value: {}", val);
        }
        for val in ["0", "false", "no", "off", "", "yes"] {
            assert!(!parse_bool(val), "Failed for value: {}", val);
        }
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = load_config_with_env(&base_env(), today()).unwrap();
        let rendered = format!("{:?}", config.turbo);
        assert!(!rendered.contains("secret"));
    }
}
