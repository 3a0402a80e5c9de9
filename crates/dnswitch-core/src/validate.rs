//! Server definition validation and normalization.
//!
//! Every check runs to completion so a caller can show all problems at once:
//!
//! | protocol | endpoints | form |
//! |---|---|---|
//! | DNS | 1–2 | IPv4 literal |
//! | DoH | 1 | `https://` URL |
//! | DoT | 1 | `tls://host:port` |
//! | DoQ | 1 | `quic://host:port` |
//! | DoH3 | 1 | `h3://host:port` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use url::Url;

use crate::error::{ValidationError, ValidationErrors};
use crate::key::generate_key;
use crate::types::{Protocol, ServerSpec};

const MAX_DOMAIN_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

/// Check a domain name against the usual label grammar.
///
/// Labels are 1–63 ASCII alphanumerics with internal hyphens only. The last
/// label may not be purely numeric, so `300.1.1.1` is not taken for a name.
#[must_use]
pub fn is_valid_domain(domain: &str) -> bool {
    if domain.is_empty() || domain.len() > MAX_DOMAIN_LEN {
        return false;
    }
    if !domain.split('.').all(is_valid_label) {
        return false;
    }
    domain
        .rsplit('.')
        .next()
        .is_some_and(|tld| !tld.bytes().all(|b| b.is_ascii_digit()))
}

fn is_valid_label(label: &str) -> bool {
    let bytes = label.as_bytes();
    !bytes.is_empty()
        && bytes.len() <= MAX_LABEL_LEN
        && bytes.iter().all(|b| b.is_ascii_alphanumeric() || *b == b'-')
        && bytes.first() != Some(&b'-')
        && bytes.last() != Some(&b'-')
}

/// Parse a dotted-quad IPv4 literal
#[must_use]
pub fn parse_ipv4(s: &str) -> Option<Ipv4Addr> {
    s.trim().parse().ok()
}

/// Resolver host: a literal address or a name that needs resolving
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Host {
    /// IPv4 literal, reachable without DNS
    Ipv4(Ipv4Addr),
    /// Lowercase domain name
    Domain(String),
}

impl Host {
    /// Parse and lowercase a host
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(ip) = parse_ipv4(s) {
            return Some(Self::Ipv4(ip));
        }
        let lower = s.to_lowercase();
        is_valid_domain(&lower).then_some(Self::Domain(lower))
    }

    /// The name to resolve, if this host is not a literal
    #[must_use]
    pub fn domain(&self) -> Option<&str> {
        match self {
            Self::Ipv4(_) => None,
            Self::Domain(name) => Some(name),
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ipv4(ip) => write!(f, "{ip}"),
            Self::Domain(name) => f.write_str(name),
        }
    }
}

/// Host and port of a DoT/DoQ/DoH3 endpoint
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostPort {
    /// Resolver host
    pub host: Host,
    /// Port, 1–65535
    pub port: u16,
}

/// A parsed, canonical resolver endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Plain DNS server address
    Plain(Ipv4Addr),
    /// DoH URL
    Https(Url),
    /// `tls://host:port`
    Tls(HostPort),
    /// `quic://host:port`
    Quic(HostPort),
    /// `h3://host:port`
    H3(HostPort),
}

impl Endpoint {
    /// Parse an endpoint of a known protocol
    pub fn parse(protocol: Protocol, raw: &str) -> Result<Self, ValidationErrors> {
        validate_endpoint(protocol, raw, 1)
    }

    /// Parse an endpoint, inferring the protocol from its scheme.
    ///
    /// A bare IPv4 literal is plain DNS.
    pub fn detect(raw: &str) -> Result<Self, ValidationErrors> {
        let trimmed = raw.trim();
        let protocol = Protocol::ALL
            .into_iter()
            .filter_map(|p| p.scheme().map(|scheme| (p, scheme)))
            .find(|(_, scheme)| strip_scheme_prefix(trimmed, scheme).is_some())
            .map_or(Protocol::Plain, |(p, _)| p);
        Self::parse(protocol, trimmed)
    }

    /// Protocol this endpoint speaks
    #[must_use]
    pub const fn protocol(&self) -> Protocol {
        match self {
            Self::Plain(_) => Protocol::Plain,
            Self::Https(_) => Protocol::Doh,
            Self::Tls(_) => Protocol::Dot,
            Self::Quic(_) => Protocol::Doq,
            Self::H3(_) => Protocol::Doh3,
        }
    }

    /// Host the client must connect to
    #[must_use]
    pub fn host(&self) -> Host {
        match self {
            Self::Plain(ip) => Host::Ipv4(*ip),
            Self::Https(url) => https_host(url).unwrap_or_else(|| Host::Domain(String::new())),
            Self::Tls(hp) | Self::Quic(hp) | Self::H3(hp) => hp.host.clone(),
        }
    }

    /// Port the client must connect to
    #[must_use]
    pub fn port(&self) -> u16 {
        match self {
            Self::Plain(_) => Protocol::Plain.default_port(),
            Self::Https(url) => url.port_or_known_default().unwrap_or(443),
            Self::Tls(hp) | Self::Quic(hp) | Self::H3(hp) => hp.port,
        }
    }

    /// URL path of a DoH endpoint
    #[must_use]
    pub fn http_path(&self) -> Option<&str> {
        match self {
            Self::Https(url) => Some(url.path()),
            _ => None,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(ip) => write!(f, "{ip}"),
            Self::Https(url) => f.write_str(url.as_str()),
            Self::Tls(hp) => write!(f, "tls://{}:{}", hp.host, hp.port),
            Self::Quic(hp) => write!(f, "quic://{}:{}", hp.host, hp.port),
            Self::H3(hp) => write!(f, "h3://{}:{}", hp.host, hp.port),
        }
    }
}

fn strip_scheme_prefix<'a>(s: &'a str, scheme: &str) -> Option<&'a str> {
    let head = s.get(..scheme.len())?;
    if head.eq_ignore_ascii_case(scheme) {
        s.get(scheme.len()..)?.strip_prefix("://")
    } else {
        None
    }
}

fn validate_endpoint(
    protocol: Protocol,
    raw: &str,
    index: usize,
) -> Result<Endpoint, ValidationErrors> {
    let raw = raw.trim();
    match protocol {
        Protocol::Plain => parse_ipv4(raw).map(Endpoint::Plain).ok_or_else(|| {
            ValidationError::InvalidIpv4 {
                index,
                value: raw.to_string(),
            }
            .into()
        }),
        Protocol::Doh => parse_https(raw),
        Protocol::Dot => parse_host_port(protocol, raw).map(Endpoint::Tls),
        Protocol::Doq => parse_host_port(protocol, raw).map(Endpoint::Quic),
        Protocol::Doh3 => parse_host_port(protocol, raw).map(Endpoint::H3),
    }
}

fn parse_https(raw: &str) -> Result<Endpoint, ValidationErrors> {
    let invalid = || ValidationError::InvalidUrl {
        value: raw.to_string(),
    };
    let url = Url::parse(raw).map_err(|_| invalid())?;
    if url.scheme() != "https" {
        return Err(invalid().into());
    }

    // Host text as typed; the parsed URL may have rewritten it
    let authority = strip_scheme_prefix(raw, "https")
        .and_then(|rest| rest.split(['/', '\\', '?', '#']).next())
        .ok_or_else(invalid)?;
    if authority.contains('@') {
        return Err(ValidationError::UrlCredentials {
            value: raw.to_string(),
        }
        .into());
    }
    let host_text = if authority.starts_with('[') {
        authority
    } else {
        authority.rsplit_once(':').map_or(authority, |(host, _)| host)
    };

    match Host::parse(host_text) {
        Some(host) if https_host(&url).as_ref() == Some(&host) => Ok(Endpoint::Https(url)),
        _ => Err(ValidationError::InvalidHost {
            host: host_text.to_string(),
        }
        .into()),
    }
}

fn https_host(url: &Url) -> Option<Host> {
    match url.host()? {
        url::Host::Ipv4(ip) => Some(Host::Ipv4(ip)),
        url::Host::Domain(name) => Some(Host::Domain(name.to_string())),
        url::Host::Ipv6(_) => None,
    }
}

/// Port text of decimal digits only, 1–65535
fn parse_port(text: &str) -> Option<u16> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok().filter(|p| *p != 0)
}

fn parse_host_port(protocol: Protocol, raw: &str) -> Result<HostPort, ValidationErrors> {
    let scheme = protocol.scheme().unwrap_or_default();
    let Some(rest) = strip_scheme_prefix(raw, scheme) else {
        return Err(ValidationError::MissingScheme {
            protocol,
            scheme,
            value: raw.to_string(),
        }
        .into());
    };
    let rest = rest.strip_suffix('/').unwrap_or(rest);

    let (host_text, port_text) = rest.rsplit_once(':').unwrap_or((rest, ""));
    let mut errors = ValidationErrors::new();

    let host = Host::parse(host_text);
    if host.is_none() {
        errors.push(ValidationError::InvalidHost {
            host: host_text.to_string(),
        });
    }
    let port = parse_port(port_text);
    if port.is_none() {
        errors.push(ValidationError::InvalidPort {
            port: port_text.to_string(),
        });
    }

    match (host, port) {
        (Some(host), Some(port)) => Ok(HostPort { host, port }),
        _ => Err(errors),
    }
}

/// User-submitted server fields, before validation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInput {
    /// Display name; the key is derived from it
    pub name: String,
    /// Raw endpoint strings
    pub endpoints: Vec<String>,
    /// Raw tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Raw bootstrap IP
    #[serde(default)]
    pub bootstrap_ip: Option<String>,
}

impl ServerInput {
    /// New input with just a name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append an endpoint
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    /// Append a tag
    #[must_use]
    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Set the bootstrap IP
    #[must_use]
    pub fn bootstrap_ip(mut self, ip: impl Into<String>) -> Self {
        self.bootstrap_ip = Some(ip.into());
        self
    }

    /// Editable form of a stored server; validating it reproduces the server
    #[must_use]
    pub fn from_spec(spec: &ServerSpec) -> Self {
        Self {
            name: spec.name.clone(),
            endpoints: spec.endpoints.clone(),
            tags: spec.tags.clone(),
            bootstrap_ip: spec.bootstrap_ip.map(|ip| ip.to_string()),
        }
    }
}

/// Validate a server definition and return its canonical stored form.
///
/// The key is derived from the name. On failure every problem found is
/// returned, including per-endpoint syntax errors alongside cardinality ones.
pub fn validate_and_normalize(
    input: &ServerInput,
    protocol: Protocol,
) -> Result<ServerSpec, ValidationErrors> {
    let mut errors = ValidationErrors::new();

    let name = input.name.trim();
    let key = generate_key(name);
    if name.is_empty() {
        errors.push(ValidationError::Required { field: "name" });
    } else if key.is_empty() {
        errors.push(ValidationError::EmptyKey);
    }

    let raw: Vec<&str> = input
        .endpoints
        .iter()
        .map(|e| e.trim())
        .filter(|e| !e.is_empty())
        .collect();
    if raw.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    } else if raw.len() > protocol.max_endpoints() {
        errors.push(ValidationError::TooManyEndpoints {
            protocol,
            count: raw.len(),
        });
    }

    let mut endpoints = Vec::with_capacity(raw.len());
    for (i, endpoint) in raw.iter().enumerate() {
        match validate_endpoint(protocol, endpoint, i + 1) {
            Ok(parsed) => endpoints.push(parsed.to_string()),
            Err(found) => found.into_iter().for_each(|e| errors.push(e)),
        }
    }

    let bootstrap_ip = match input.bootstrap_ip.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(_) if !protocol.is_encrypted() => {
            errors.push(ValidationError::BootstrapNotApplicable);
            None
        }
        Some(value) => {
            let ip = parse_ipv4(value);
            if ip.is_none() {
                errors.push(ValidationError::InvalidBootstrapIp {
                    value: value.to_string(),
                });
            }
            ip
        }
    };

    errors.into_result(ServerSpec {
        key,
        name: name.to_string(),
        protocol,
        endpoints,
        tags: normalize_tags(&input.tags),
        bootstrap_ip,
    })
}

/// Trim tags, drop empties and exact repeats, keep first-seen order
#[must_use]
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags.iter().map(|t| t.as_ref().trim()) {
        if !tag.is_empty() && !out.iter().any(|t| t == tag) {
            out.push(tag.to_string());
        }
    }
    out
}

/// Split a single text field into endpoints.
///
/// Plain DNS takes a comma-separated list; every other protocol takes the
/// whole trimmed value as one endpoint.
#[must_use]
pub fn parse_endpoint_list(protocol: Protocol, raw: &str) -> Vec<String> {
    match protocol {
        Protocol::Plain => split_list(raw),
        Protocol::Doh | Protocol::Dot | Protocol::Doq | Protocol::Doh3 => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Vec::new()
            } else {
                vec![trimmed.to_string()]
            }
        }
    }
}

/// Split a comma-separated field, dropping empty items
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Host and port fields of an endpoint, as shown in an edit form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointParts {
    /// Host, or the whole endpoint for DNS and DoH
    pub host: String,
    /// Port, when the protocol carries one
    pub port: Option<u16>,
}

impl EndpointParts {
    /// Split a stored endpoint into editable fields, stripping the scheme
    #[must_use]
    pub fn from_endpoint(protocol: Protocol, endpoint: &str) -> Self {
        let endpoint = endpoint.trim();
        match protocol {
            Protocol::Plain | Protocol::Doh => Self {
                host: endpoint.to_string(),
                port: None,
            },
            Protocol::Dot | Protocol::Doq | Protocol::Doh3 => {
                let rest = strip_any_scheme(protocol, endpoint);
                let rest = rest.strip_suffix('/').unwrap_or(rest);
                match rest.rsplit_once(':') {
                    Some((host, port)) => match parse_port(port) {
                        Some(port) => Self {
                            host: host.to_string(),
                            port: Some(port),
                        },
                        None => Self {
                            host: rest.to_string(),
                            port: None,
                        },
                    },
                    None => Self {
                        host: rest.to_string(),
                        port: None,
                    },
                }
            }
        }
    }

    /// Recompose an endpoint, filling the protocol's default port if unset
    #[must_use]
    pub fn to_endpoint(&self, protocol: Protocol) -> String {
        let host = self.host.trim();
        match protocol.scheme() {
            Some(scheme) if protocol != Protocol::Doh => {
                let host = strip_any_scheme(protocol, host);
                let port = self.port.unwrap_or_else(|| protocol.default_port());
                format!("{scheme}://{host}:{port}")
            }
            _ => host.to_string(),
        }
    }
}

fn strip_any_scheme(protocol: Protocol, s: &str) -> &str {
    protocol
        .scheme()
        .and_then(|scheme| strip_scheme_prefix(s, scheme))
        .unwrap_or(s)
}
