use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the enforcement layer answered a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// Forwarded upstream and answered
    Success,
    /// Upstream failed or timed out
    Error,
    /// Answered locally by a domain rule
    Blocked,
}

/// One observed DNS query, as reported by the enforcement layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryLogEntry {
    /// Monotonic id assigned by the producer
    pub id: u64,

    /// When the query was answered
    pub timestamp: DateTime<Utc>,

    /// Queried name
    pub domain: String,

    /// Queried record type mnemonic (`A`, `AAAA`, `MX`, ...)
    pub record_type: String,

    /// Answer records in presentation form
    #[serde(default)]
    pub response_records: Vec<String>,

    /// Time to answer
    pub latency_ms: u64,

    /// Outcome
    pub status: QueryStatus,
}
