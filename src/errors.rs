//! Error types shared across the reporter.

use thiserror::Error;

/// Errors raised by the platform API client. All of them abort the run.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, TLS or timeout failures from the HTTP layer
    #[error("transport error calling {path}: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// Login rejected
    #[error("authentication failed for user {0}")]
    Auth(String),

    /// Non-success status from the API
    #[error("{method} {path} returned status {status}: {body}")]
    Status {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// Response body did not match the expected shape
    #[error("failed to decode response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Invalid or missing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} env var must be set")]
    Missing(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

/// A statistic sample that cannot be folded into an aggregate.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SampleError {
    #[error("sample is missing field '{0}'")]
    MissingField(&'static str),
}

/// Failures while writing the report file.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}
