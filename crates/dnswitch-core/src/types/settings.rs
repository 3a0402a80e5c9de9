use serde::{Deserialize, Serialize};

use super::ServerKey;
use crate::error::{Outcome, ValidationError, ValidationErrors};
use crate::validate::{is_valid_domain, parse_ipv4};

/// Domain queried by connectivity probes unless configured otherwise
pub const DEFAULT_TEST_DOMAIN: &str = "youtube.com";

/// Quick-pick answer offered when creating rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredefinedIp {
    /// Short label, e.g. `Block`
    pub label: String,
    /// IPv4 literal
    pub ip: String,
}

impl PredefinedIp {
    fn new(label: &str, ip: &str) -> Self {
        Self {
            label: label.to_string(),
            ip: ip.to_string(),
        }
    }
}

/// User preferences the core consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Domain resolved by connectivity probes
    #[serde(default = "default_test_domain")]
    pub test_domain: String,

    /// Server used to resolve encrypted resolvers' hostnames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_resolver: Option<ServerKey>,

    /// Quick-pick rule answers
    #[serde(default = "default_predefined_ips")]
    pub predefined_ips: Vec<PredefinedIp>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            test_domain: default_test_domain(),
            bootstrap_resolver: None,
            predefined_ips: default_predefined_ips(),
        }
    }
}

impl Settings {
    /// Change the probe test domain
    pub fn set_test_domain(&mut self, domain: &str) -> Result<(), ValidationErrors> {
        let domain = domain.trim().trim_end_matches('.').to_lowercase();
        if domain.is_empty() {
            return Err(ValidationError::Required {
                field: "test domain",
            }
            .into());
        }
        if !is_valid_domain(&domain) {
            return Err(ValidationError::InvalidDomain { value: domain }.into());
        }
        self.test_domain = domain;
        Ok(())
    }

    /// Add a quick-pick answer; label required, IPv4 only, no duplicate addresses
    pub fn add_predefined_ip(&mut self, label: &str, ip: &str) -> Result<(), ValidationErrors> {
        let label = label.trim();
        let ip = ip.trim();
        let mut errors = ValidationErrors::new();

        if label.is_empty() {
            errors.push(ValidationError::Required { field: "label" });
        }
        match parse_ipv4(ip) {
            None => errors.push(ValidationError::InvalidIpv4 {
                index: 1,
                value: ip.to_string(),
            }),
            Some(_) if self.predefined_ips.iter().any(|p| p.ip == ip) => {
                errors.push(ValidationError::DuplicateIp { ip: ip.to_string() });
            }
            Some(_) => {}
        }

        errors.into_result(())?;
        self.predefined_ips.push(PredefinedIp::new(label, ip));
        Ok(())
    }

    /// Remove a quick-pick answer by address
    pub fn remove_predefined_ip(&mut self, ip: &str) -> Outcome<PredefinedIp> {
        let ip = ip.trim();
        match self.predefined_ips.iter().position(|p| p.ip == ip) {
            Some(index) => Outcome::Applied(self.predefined_ips.remove(index)),
            None => Outcome::NotFound,
        }
    }
}

fn default_test_domain() -> String {
    String::from(DEFAULT_TEST_DOMAIN)
}

fn default_predefined_ips() -> Vec<PredefinedIp> {
    vec![
        PredefinedIp::new("Block", "0.0.0.0"),
        PredefinedIp::new("Localhost", "127.0.0.1"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.test_domain, "youtube.com");
        assert!(settings.bootstrap_resolver.is_none());
        assert_eq!(settings.predefined_ips.len(), 2);
        assert_eq!(settings.predefined_ips[0].ip, "0.0.0.0");
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_set_test_domain() {
        let mut settings = Settings::default();
        settings.set_test_domain(" Example.ORG. ").unwrap();
        assert_eq!(settings.test_domain, "example.org");

        assert!(settings.set_test_domain("").is_err());
        assert!(settings.set_test_domain("-bad-.com").is_err());
        assert_eq!(settings.test_domain, "example.org");
    }

    #[test]
    fn test_add_predefined_ip_accumulates_errors() {
        let mut settings = Settings::default();
        let errors = settings.add_predefined_ip(" ", "300.1.1.1").unwrap_err();
        assert_eq!(errors.len(), 2);

        let errors = settings.add_predefined_ip("Again", "0.0.0.0").unwrap_err();
        assert!(errors.contains(&ValidationError::DuplicateIp {
            ip: "0.0.0.0".into()
        }));

        settings.add_predefined_ip("Sinkhole", "10.0.0.53").unwrap();
        assert_eq!(settings.predefined_ips.len(), 3);
    }

    #[test]
    fn test_remove_predefined_ip() {
        let mut settings = Settings::default();
        assert!(settings.remove_predefined_ip("127.0.0.1").is_applied());
        assert!(settings.remove_predefined_ip("127.0.0.1").is_not_found());
        assert_eq!(settings.predefined_ips.len(), 1);
    }
}
