use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::errors::ConfigError;

#[derive(Debug, Clone)]
pub struct Config {
    pub turbo: TurboConfig,
    pub commodities: Vec<String>,
    pub metrics: Vec<Metric>,
    pub tags: Vec<String>,
    pub excluded_names: Vec<String>,
    pub exclude_master: Vec<String>,
    pub file_type: FileType,
    pub file_name: String,
    pub output_dir: PathBuf,
    pub email: Option<EmailConfig>,
}

impl Config {
    /// Full path of the report file for this run.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }
}

#[derive(Clone)]
pub struct TurboConfig {
    pub host: String,
    pub username: String,
    pub password: String,
    pub verify_ssl: bool,
    pub timeout_secs: u64,
}

impl fmt::Debug for TurboConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurboConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub from_addr: String,
    pub to_addrs: Vec<String>,
    pub tls: bool,
    pub credentials: Option<(String, String)>,
    pub subject: String,
    pub body: Option<String>,
}

impl fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("from_addr", &self.from_addr)
            .field("to_addrs", &self.to_addrs)
            .field("tls", &self.tls)
            .field("auth", &self.credentials.as_ref().map(|(user, _)| user))
            .field("subject", &self.subject)
            .finish()
    }
}

/// Output format of the report file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Xlsx,
}

impl FileType {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(FileType::Csv),
            "xlsx" => Ok(FileType::Xlsx),
            other => Err(ConfigError::Invalid {
                var: "NS_FILETYPE",
                reason: format!("unsupported file type '{}', expected csv or xlsx", other),
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Xlsx => "xlsx",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            FileType::Csv => "text/csv",
            FileType::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A requested report metric. Each maps onto one field of a
/// [`CommodityAggregate`](crate::aggregate::CommodityAggregate).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Average,
    Peak,
    Capacity,
    Sum,
    Count,
}

impl Metric {
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s.trim().to_lowercase().as_str() {
            "average" => Ok(Metric::Average),
            "peak" => Ok(Metric::Peak),
            "capacity" => Ok(Metric::Capacity),
            "sum" => Ok(Metric::Sum),
            "count" => Ok(Metric::Count),
            other => Err(ConfigError::Invalid {
                var: "METRICS",
                reason: format!("unknown metric '{}'", other),
            }),
        }
    }

    /// Title used in report headers, e.g. `Average`.
    pub fn title(&self) -> &'static str {
        match self {
            Metric::Average => "Average",
            Metric::Peak => "Peak",
            Metric::Capacity => "Capacity",
            Metric::Sum => "Sum",
            Metric::Count => "Count",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title().to_lowercase())
    }
}

/// Worker capacity of a container platform cluster.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub num_cores: u32,
    pub total_mhz: f64,
}

/// A namespace retained for reporting. Stats live in the
/// [`StatAggregator`](crate::aggregate::StatAggregator), keyed by `id`.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub id: String,
    pub name: String,
    pub cluster_id: Option<String>,
    pub cluster_name: Option<String>,
    pub tags: HashMap<String, Vec<String>>,
}

/// One report cell. `Empty` is the "no data" marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    pub fn number(value: Option<f64>) -> Self {
        value.map(Cell::Number).unwrap_or(Cell::Empty)
    }

    pub fn text(value: Option<&str>) -> Self {
        value.map(|s| Cell::Text(s.to_string())).unwrap_or(Cell::Empty)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Field text for CSV output.
    pub fn to_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(v) => v.to_string(),
            Cell::Empty => String::new(),
        }
    }
}
