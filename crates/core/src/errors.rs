use thiserror::Error;

/// Unified error type for the entire portfolio-tracker-core library.
/// Every fallible public function returns `Result<T, CoreError>`.
///
/// The reconciliation paths never surface these to their callers; they log
/// and degrade to local data instead.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Storage ─────────────────────────────────────────────────────
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage quota exceeded: {needed} bytes needed, {available} available")]
    QuotaExceeded { needed: usize, available: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── File I/O (native only) ──────────────────────────────────────
    #[error("File I/O error: {0}")]
    FileIO(String),

    // ── Cloud / Network ─────────────────────────────────────────────
    #[error("Cloud storage is not available")]
    CloudUnavailable,

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("API error ({provider}): {message}")]
    Api {
        provider: String,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Import / Export ─────────────────────────────────────────────
    #[error("Invalid import file: {0}")]
    InvalidImport(String),

    #[error("CSV error: {0}")]
    Csv(String),

    // ── Business Logic ──────────────────────────────────────────────
    #[error("Investment validation failed: {0}")]
    ValidationError(String),

    #[error("Investment not found: {0}")]
    InvestmentNotFound(String),
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::FileIO(e.to_string())
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<csv::Error> for CoreError {
    fn from(e: csv::Error) -> Self {
        CoreError::Csv(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // The cloud API key travels in the query string, so strip it from
        // anything that ends up in logs or error messages.
        CoreError::Network(redact_query(&e.to_string()))
    }
}

/// Replace everything after the first `?` with a redaction marker.
pub(crate) fn redact_query(msg: &str) -> String {
    match msg.find('?') {
        Some(idx) => format!("{}?<query redacted>", &msg[..idx]),
        None => msg.to_string(),
    }
}
