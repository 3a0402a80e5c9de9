use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use uuid::Uuid;

use super::QueryLogEntry;

/// Record type a domain rule answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecordType {
    /// IPv4 address record
    #[default]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Wire mnemonic
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
        }
    }

    /// Answer used when a rule is created without one
    #[must_use]
    pub const fn default_answer(self) -> &'static str {
        match self {
            Self::A => "0.0.0.0",
            Self::Aaaa => "::",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Record type other than `A` or `AAAA`
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported record type: {0} (expected A or AAAA)")]
pub struct ParseRecordTypeError(pub String);

impl FromStr for RecordType {
    type Err = ParseRecordTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::Aaaa),
            _ => Err(ParseRecordTypeError(s.to_string())),
        }
    }
}

/// Opaque rule identifier; never reused once generated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Generate a fresh random identifier
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// The identifier text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RuleId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A static-answer override for an exact domain or a `*.` wildcard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainRule {
    /// Unique identifier
    pub id: RuleId,

    /// Lowercase exact domain or `*.<suffix>`
    #[serde(rename = "domain")]
    pub pattern: String,

    /// Address returned for matching queries
    #[serde(rename = "response")]
    pub answer: String,

    /// Record type answered
    #[serde(default)]
    pub record_type: RecordType,

    /// Disabled rules are kept but never match
    pub enabled: bool,
}

impl DomainRule {
    /// Returns true for `*.` patterns
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.pattern.starts_with("*.")
    }

    /// Suffix a wildcard pattern covers
    #[must_use]
    pub fn wildcard_suffix(&self) -> Option<&str> {
        self.pattern.strip_prefix("*.")
    }

    /// The answer as an address
    #[must_use]
    pub fn answer_ip(&self) -> Option<IpAddr> {
        self.answer.parse().ok()
    }
}

/// Submitted rule contents for an upsert.
///
/// `id: None` creates a new rule with a generated identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDraft {
    /// Rule to replace, if editing
    #[serde(default)]
    pub id: Option<RuleId>,
    /// Domain or wildcard pattern as typed
    pub pattern: String,
    /// Answer as typed
    pub answer: String,
    /// Record type
    #[serde(default)]
    pub record_type: RecordType,
    /// Whether the rule should match
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl RuleDraft {
    /// New enabled `A` rule
    #[must_use]
    pub fn new(pattern: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            id: None,
            pattern: pattern.into(),
            answer: answer.into(),
            record_type: RecordType::A,
            enabled: true,
        }
    }

    /// Set the record type
    #[must_use]
    pub const fn record_type(mut self, record_type: RecordType) -> Self {
        self.record_type = record_type;
        self
    }

    /// Set whether the rule is enabled
    #[must_use]
    pub const fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Target an existing rule
    #[must_use]
    pub fn with_id(mut self, id: RuleId) -> Self {
        self.id = Some(id);
        self
    }

    /// Editable copy of a stored rule
    #[must_use]
    pub fn from_rule(rule: &DomainRule) -> Self {
        Self {
            id: Some(rule.id.clone()),
            pattern: rule.pattern.clone(),
            answer: rule.answer.clone(),
            record_type: rule.record_type,
            enabled: rule.enabled,
        }
    }

    /// Pre-fill a new rule from an observed query.
    ///
    /// Record types other than `A`/`AAAA` fall back to `A`.
    #[must_use]
    pub fn from_log_entry(entry: &QueryLogEntry, answer: Option<&str>) -> Self {
        let record_type = entry.record_type.parse().unwrap_or_default();
        let answer = answer.map_or_else(
            || RecordType::default_answer(record_type).to_string(),
            |a| a.trim().to_string(),
        );
        Self {
            id: Some(RuleId::generate()),
            pattern: entry.domain.trim().trim_end_matches('.').to_lowercase(),
            answer,
            record_type,
            enabled: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryStatus;
    use chrono::Utc;

    fn entry(domain: &str, record_type: &str) -> QueryLogEntry {
        QueryLogEntry {
            id: 4,
            timestamp: Utc::now(),
            domain: domain.to_string(),
            record_type: record_type.to_string(),
            response_records: vec!["93.184.216.34".into()],
            latency_ms: 12,
            status: QueryStatus::Success,
        }
    }

    #[test]
    fn test_record_type_parse() {
        assert_eq!("a".parse::<RecordType>().unwrap(), RecordType::A);
        assert_eq!("AAAA".parse::<RecordType>().unwrap(), RecordType::Aaaa);
        assert!("MX".parse::<RecordType>().is_err());
    }

    #[test]
    fn test_rule_stored_form() {
        let json = r#"{"id":"r1","domain":"*.ads.example.com","response":"0.0.0.0","enabled":true,"record_type":"A"}"#;
        let rule: DomainRule = serde_json::from_str(json).unwrap();
        assert!(rule.is_wildcard());
        assert_eq!(rule.wildcard_suffix(), Some("ads.example.com"));
        assert_eq!(rule.answer_ip(), Some("0.0.0.0".parse().unwrap()));
    }

    #[test]
    fn test_draft_from_log_entry() {
        let draft = RuleDraft::from_log_entry(&entry("Tracker.Example.COM.", "AAAA"), None);
        assert_eq!(draft.pattern, "tracker.example.com");
        assert_eq!(draft.record_type, RecordType::Aaaa);
        assert_eq!(draft.answer, "::");
        assert!(draft.enabled);
        assert!(draft.id.is_some());

        let draft =
            RuleDraft::from_log_entry(&entry("mail.example.com", "MX"), Some(" 127.0.0.1 "));
        assert_eq!(draft.record_type, RecordType::A);
        assert_eq!(draft.answer, "127.0.0.1");
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(RuleId::generate(), RuleId::generate());
    }
}
