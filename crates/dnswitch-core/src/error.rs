use std::fmt;

use thiserror::Error;

use crate::types::{Protocol, RecordType, ServerKey};

/// Result type alias for store-backed operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// A single user-correctable problem with submitted input.
///
/// Validation never stops at the first problem: callers receive every
/// applicable error at once as [`ValidationErrors`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty
    #[error("{field} is required")]
    Required {
        /// Name of the missing field
        field: &'static str,
    },

    /// The server name produced an empty key
    #[error("name must contain at least one letter or digit")]
    EmptyKey,

    /// No endpoint was supplied
    #[error("at least one server is required")]
    NoEndpoints,

    /// More endpoints than the protocol accepts
    #[error("{}", too_many_endpoints(.protocol))]
    TooManyEndpoints {
        /// Protocol whose limit was exceeded
        protocol: Protocol,
        /// Number of endpoints supplied
        count: usize,
    },

    /// A plain DNS endpoint is not a dotted-quad IPv4 literal
    #[error("server {index} is not a valid IP address: {value}")]
    InvalidIpv4 {
        /// 1-based position of the endpoint
        index: usize,
        /// Offending value
        value: String,
    },

    /// A DoH endpoint is not an HTTPS URL
    #[error("not a valid HTTPS URL: {value}")]
    InvalidUrl {
        /// Offending value
        value: String,
    },

    /// A DoH URL embeds a username or password
    #[error("DoH URL must not contain credentials: {value}")]
    UrlCredentials {
        /// Offending value
        value: String,
    },

    /// A DoT/DoQ/DoH3 endpoint lacks its scheme prefix
    #[error("{protocol} address must start with {scheme}:// ({value})")]
    MissingScheme {
        /// Protocol being validated
        protocol: Protocol,
        /// Expected scheme
        scheme: &'static str,
        /// Offending value
        value: String,
    },

    /// Host is neither a domain name nor an IPv4 literal
    #[error("invalid host {host:?}: expected a domain name or IPv4 address")]
    InvalidHost {
        /// Offending host
        host: String,
    },

    /// Port missing, non-numeric or out of range
    #[error("invalid port {port:?}: expected a number between 1 and 65535")]
    InvalidPort {
        /// Offending port text
        port: String,
    },

    /// Bootstrap IP is not an IPv4 literal
    #[error("bootstrap IP is not a valid IPv4 address: {value}")]
    InvalidBootstrapIp {
        /// Offending value
        value: String,
    },

    /// Bootstrap IP given for a plain DNS server
    #[error("bootstrap IP only applies to encrypted protocols")]
    BootstrapNotApplicable,

    /// Rule pattern is neither a domain nor a `*.` wildcard
    #[error("must be a valid domain or wildcard pattern (e.g. *.example.com): {value}")]
    InvalidPattern {
        /// Offending pattern
        value: String,
    },

    /// Rule answer does not parse as an address of the record type
    #[error("must be a valid {} address: {value}", answer_family(.record_type))]
    InvalidAnswer {
        /// Record type of the rule
        record_type: RecordType,
        /// Offending answer
        value: String,
    },

    /// Another rule already overrides the same pattern and record type
    #[error("a {record_type} rule for {pattern} already exists")]
    DuplicateRule {
        /// Normalized pattern
        pattern: String,
        /// Record type
        record_type: RecordType,
    },

    /// Not a syntactically valid domain name
    #[error("not a valid domain name: {value}")]
    InvalidDomain {
        /// Offending value
        value: String,
    },

    /// Quick-pick IP already present
    #[error("{ip} already exists")]
    DuplicateIp {
        /// The duplicated address
        ip: String,
    },
}

fn too_many_endpoints(protocol: &Protocol) -> String {
    match protocol {
        Protocol::Plain => format!(
            "DNS servers can only have a maximum of {} IP addresses",
            protocol.max_endpoints()
        ),
        Protocol::Doh => "DoH only accepts a single URL".to_string(),
        Protocol::Dot | Protocol::Doq | Protocol::Doh3 => {
            format!("{protocol} only accepts a single address")
        }
    }
}

const fn answer_family(record_type: &RecordType) -> &'static str {
    match record_type {
        RecordType::A => "IPv4",
        RecordType::Aaaa => "IPv6",
    }
}

/// Every validation problem found in one submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Create an empty error list
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Record another problem
    pub fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    /// Returns true if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded problems
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over recorded problems
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Returns true if an error equal to `error` was recorded
    #[must_use]
    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    /// Human-readable messages, one per problem
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// `Ok(value)` when empty, otherwise `Err(self)`
    pub fn into_result<T>(self, value: T) -> std::result::Result<T, Self> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.messages().join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self(vec![error])
    }
}

impl IntoIterator for ValidationErrors {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A server name whose derived key is already taken
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("a server with key {key} already exists")]
pub struct DuplicateKeyError {
    /// The colliding key
    pub key: ServerKey,
}

/// Failure reported by a persistence adapter
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored data could not be encoded or decoded
    #[error("storage format error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any other backend failure
    #[error("storage error: {0}")]
    Backend(String),
}

/// Errors from registry mutations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Creation collided with an existing key
    #[error(transparent)]
    Duplicate(#[from] DuplicateKeyError),

    /// Submitted definition is invalid
    #[error("invalid server definition: {0}")]
    Validation(#[from] ValidationErrors),

    /// Write-through failed; in-memory state is unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors from rule-store mutations
#[derive(Error, Debug)]
pub enum RuleError {
    /// Submitted rule is invalid
    #[error("invalid rule: {0}")]
    Validation(#[from] ValidationErrors),

    /// Write-through failed; in-memory state is unchanged
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a mutation addressed by id or key.
///
/// An unknown id is a benign no-op, not an error.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The target existed and the change was applied
    Applied(T),
    /// Nothing matched; state is unchanged
    NotFound,
}

impl<T> Outcome<T> {
    /// Returns true if the change was applied
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied(_))
    }

    /// Returns true if nothing matched
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// The applied value, if any
    #[must_use]
    pub fn applied(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_many_messages_are_protocol_specific() {
        let plain = ValidationError::TooManyEndpoints {
            protocol: Protocol::Plain,
            count: 3,
        };
        assert_eq!(
            plain.to_string(),
            "DNS servers can only have a maximum of 2 IP addresses"
        );

        let doh = ValidationError::TooManyEndpoints {
            protocol: Protocol::Doh,
            count: 2,
        };
        assert_eq!(doh.to_string(), "DoH only accepts a single URL");

        let dot = ValidationError::TooManyEndpoints {
            protocol: Protocol::Dot,
            count: 2,
        };
        assert_eq!(dot.to_string(), "DoT only accepts a single address");
    }

    #[test]
    fn test_errors_display_joined() {
        let mut errors = ValidationErrors::new();
        errors.push(ValidationError::Required { field: "name" });
        errors.push(ValidationError::NoEndpoints);
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors.to_string(),
            "name is required; at least one server is required"
        );
        assert!(errors.into_result(()).is_err());
        assert_eq!(ValidationErrors::new().into_result(7), Ok(7));
    }

    #[test]
    fn test_answer_family_in_message() {
        let err = ValidationError::InvalidAnswer {
            record_type: RecordType::Aaaa,
            value: "1.2.3.4".into(),
        };
        assert_eq!(err.to_string(), "must be a valid IPv6 address: 1.2.3.4");
    }

    #[test]
    fn test_outcome_helpers() {
        let applied: Outcome<u8> = Outcome::Applied(1);
        assert!(applied.is_applied());
        assert_eq!(applied.applied(), Some(1));
        let missing: Outcome<u8> = Outcome::NotFound;
        assert!(missing.is_not_found());
        assert_eq!(missing.applied(), None);
    }
}
