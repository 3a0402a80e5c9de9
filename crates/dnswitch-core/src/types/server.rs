use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Upstream resolver protocol.
///
/// Serialized with the short names used in stored server lists
/// (`dns`, `doh`, `dot`, `doq`, `doh3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Plain DNS over UDP/TCP port 53
    #[serde(rename = "dns", alias = "plain")]
    Plain,
    /// DNS over HTTPS
    #[serde(rename = "doh")]
    Doh,
    /// DNS over TLS
    #[serde(rename = "dot")]
    Dot,
    /// DNS over QUIC
    #[serde(rename = "doq")]
    Doq,
    /// DNS over HTTP/3
    #[serde(rename = "doh3")]
    Doh3,
}

impl Protocol {
    /// Every supported protocol, in display order
    pub const ALL: [Self; 5] = [Self::Plain, Self::Doh, Self::Dot, Self::Doq, Self::Doh3];

    /// Short stored name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "dns",
            Self::Doh => "doh",
            Self::Dot => "dot",
            Self::Doq => "doq",
            Self::Doh3 => "doh3",
        }
    }

    /// Human-facing name
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Plain => "DNS",
            Self::Doh => "DoH",
            Self::Dot => "DoT",
            Self::Doq => "DoQ",
            Self::Doh3 => "DoH3",
        }
    }

    /// URL scheme an endpoint of this protocol starts with
    #[must_use]
    pub const fn scheme(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Doh => Some("https"),
            Self::Dot => Some("tls"),
            Self::Doq => Some("quic"),
            Self::Doh3 => Some("h3"),
        }
    }

    /// Port used when an endpoint does not name one
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Plain => 53,
            Self::Doh | Self::Doh3 => 443,
            Self::Dot | Self::Doq => 853,
        }
    }

    /// Maximum number of endpoints a server of this protocol may list
    #[must_use]
    pub const fn max_endpoints(self) -> usize {
        match self {
            Self::Plain => 2,
            Self::Doh | Self::Dot | Self::Doq | Self::Doh3 => 1,
        }
    }

    /// Returns true for every protocol that reaches its resolver by hostname
    #[must_use]
    pub const fn is_encrypted(self) -> bool {
        !matches!(self, Self::Plain)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Unrecognized protocol name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown protocol: {0} (expected dns, doh, dot, doq or doh3)")]
pub struct ParseProtocolError(pub String);

impl FromStr for Protocol {
    type Err = ParseProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dns" | "plain" | "udp" => Ok(Self::Plain),
            "doh" | "https" => Ok(Self::Doh),
            "dot" | "tls" => Ok(Self::Dot),
            "doq" | "quic" => Ok(Self::Doq),
            "doh3" | "h3" => Ok(Self::Doh3),
            _ => Err(ParseProtocolError(s.to_string())),
        }
    }
}

/// Stable registry identifier derived from a server's name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerKey(String);

impl ServerKey {
    /// Wrap an existing key without re-deriving it
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the key is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ServerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ServerKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ServerKey {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ServerKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A named upstream resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSpec {
    /// Registry key, immutable after creation
    pub key: ServerKey,

    /// Display name
    pub name: String,

    /// Resolver protocol
    #[serde(rename = "type")]
    pub protocol: Protocol,

    /// Protocol-specific addresses, never empty
    #[serde(rename = "servers")]
    pub endpoints: Vec<String>,

    /// Free-form labels in display order
    #[serde(default)]
    pub tags: Vec<String>,

    /// IPv4 used to reach the first endpoint's host without DNS
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_ip: Option<Ipv4Addr>,
}

impl ServerSpec {
    /// The endpoint probes and bootstrap planning act on
    #[must_use]
    pub fn primary_endpoint(&self) -> &str {
        self.endpoints.first().map_or("", String::as_str)
    }

    /// Returns true if the server carries `tag` (case-insensitive)
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
