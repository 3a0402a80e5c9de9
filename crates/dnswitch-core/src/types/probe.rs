use serde::{Deserialize, Serialize};

/// Connectivity state of one server in the current session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ProbeResult {
    /// Never probed this session
    #[default]
    Unset,
    /// Probe requested, no answer yet
    Testing,
    /// Test query answered
    Success {
        /// Round-trip time of the test query
        latency_ms: u64,
    },
    /// Probe failed
    Failure {
        /// Reason reported by the probe executor
        reason: String,
    },
}

impl ProbeResult {
    /// Returns true while a probe is outstanding
    #[must_use]
    pub const fn is_testing(&self) -> bool {
        matches!(self, Self::Testing)
    }

    /// Latency of a successful probe
    #[must_use]
    pub const fn latency_ms(&self) -> Option<u64> {
        match self {
            Self::Success { latency_ms } => Some(*latency_ms),
            _ => None,
        }
    }
}

/// Raw report from the probe executor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// Whether the test query was answered
    pub success: bool,
    /// Round-trip time in milliseconds
    pub latency_ms: u64,
    /// Failure reason
    #[serde(default)]
    pub error: Option<String>,
}

impl ProbeOutcome {
    /// Successful probe
    #[must_use]
    pub const fn success(latency_ms: u64) -> Self {
        Self {
            success: true,
            latency_ms,
            error: None,
        }
    }

    /// Failed probe
    #[must_use]
    pub fn failure(latency_ms: u64, reason: impl Into<String>) -> Self {
        Self {
            success: false,
            latency_ms,
            error: Some(reason.into()),
        }
    }
}

impl From<ProbeOutcome> for ProbeResult {
    fn from(outcome: ProbeOutcome) -> Self {
        if outcome.success {
            Self::Success {
                latency_ms: outcome.latency_ms,
            }
        } else {
            Self::Failure {
                reason: outcome
                    .error
                    .unwrap_or_else(|| "probe failed".to_string()),
            }
        }
    }
}
