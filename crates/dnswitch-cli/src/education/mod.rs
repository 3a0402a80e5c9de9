//! Educational features: explanations, tips, and learning resources.

use colored::Colorize;
use dnswitch::Protocol;

/// Command explanation builder.
pub struct Explain {
    title: String,
    description: String,
    operation: Option<String>,
    network: Option<String>,
    what_happens: Vec<String>,
    learn_more: Option<String>,
}

impl Explain {
    fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            description: String::new(),
            operation: None,
            network: None,
            what_happens: Vec::new(),
            learn_more: None,
        }
    }

    fn description(mut self, desc: &str) -> Self {
        self.description = desc.to_string();
        self
    }

    fn operation(mut self, call: &str) -> Self {
        self.operation = Some(call.to_string());
        self
    }

    fn network(mut self, traffic: &str) -> Self {
        self.network = Some(traffic.to_string());
        self
    }

    fn step(mut self, step: &str) -> Self {
        self.what_happens.push(step.to_string());
        self
    }

    fn rfc(mut self, number: u32) -> Self {
        self.learn_more = Some(format!("https://www.rfc-editor.org/rfc/rfc{}", number));
        self
    }

    /// Steps listed under "How it works"
    pub fn steps(&self) -> &[String] {
        &self.what_happens
    }

    /// Print the explanation to stdout.
    pub fn print(&self) {
        println!();
        println!("{}", format!("=== {} ===", self.title).bold().cyan());
        println!("{}", self.description);
        println!();

        if !self.what_happens.is_empty() {
            println!("{}", "How it works:".bold());
            for (i, step) in self.what_happens.iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
            println!();
        }

        if let Some(call) = &self.operation {
            println!("{} {}", "Operation:".bold(), call.dimmed());
        }

        if let Some(traffic) = &self.network {
            println!("{} {}", "Network:".bold(), traffic);
        }

        if let Some(url) = &self.learn_more {
            println!();
            println!("{} {}", "Learn more:".bold(), url.cyan().underline());
        }

        println!();
        println!("{}", "=== Results ===".bold().cyan());
        println!();
    }

    // ========================================================================
    // Factory methods for each command
    // ========================================================================

    pub fn servers_list() -> Self {
        Self::new("List Servers")
            .description("Shows every resolver in your registry, in the order they were added.")
            .operation("Registry::list / Registry::filter")
            .network("None - reads servers.json")
            .step("A missing servers.json means the built-in list is used")
            .step("Keys are derived from names and never change")
    }

    pub fn server_add(protocol: Protocol) -> Self {
        let format = match protocol {
            Protocol::Plain => "one or two IPv4 addresses, e.g. 1.1.1.1,1.0.0.1",
            Protocol::Doh => "one HTTPS URL, e.g. https://dns.google/dns-query",
            Protocol::Dot => "one tls://host:port address, e.g. tls://dns.google:853",
            Protocol::Doq => "one quic://host:port address, e.g. quic://dns.adguard-dns.com:853",
            Protocol::Doh3 => "one h3://host:port address, e.g. h3://cloudflare-dns.com:443",
        };
        let explanation = Self::new("Add Server")
            .description(&format!(
                "Validates and stores a new {} resolver.",
                protocol.display_name()
            ))
            .operation("Registry::create")
            .network("None")
            .step(&format!("Endpoints must be {}", format))
            .step("Every problem is reported at once, not just the first")
            .step("The key is the name upper-cased with runs of other characters turned into _")
            .step("Endpoints are stored trimmed and lowercased");

        match protocol {
            Protocol::Plain => explanation.rfc(1035),
            Protocol::Doh => explanation.rfc(8484),
            Protocol::Dot => explanation.rfc(7858),
            Protocol::Doq => explanation.rfc(9250),
            Protocol::Doh3 => explanation.rfc(9114),
        }
    }

    pub fn server_edit(key: &str) -> Self {
        Self::new("Edit Server")
            .description(&format!(
                "Re-validates {} with your changes and replaces it in place.",
                key
            ))
            .operation("Registry::edit")
            .network("None")
            .step("Fields you do not pass keep their current values")
            .step("The key stays the same even if the name changes")
    }

    pub fn server_remove(key: &str) -> Self {
        Self::new("Remove Server")
            .description(&format!("Deletes {} from the registry.", key))
            .operation("Registry::remove")
            .network("None")
            .step("Unknown keys are reported and nothing changes")
    }

    pub fn servers_reset() -> Self {
        Self::new("Reset Servers")
            .description("Replaces your whole registry with the built-in resolver list.")
            .operation("Registry::reset")
            .network("None")
            .step("Servers you added are discarded")
    }

    pub fn rules_list() -> Self {
        Self::new("List Rules")
            .description("Shows domain override rules in the order they were created.")
            .operation("RuleEngine::list")
            .network("None - reads dns_rules.json")
            .step("Disabled rules are kept but never match")
    }

    pub fn rule_upsert() -> Self {
        Self::new("Save Rule")
            .description("Stores a static answer for a domain or a wildcard of subdomains.")
            .operation("RuleEngine::upsert")
            .network("None")
            .step("example.com matches only that name")
            .step("*.example.com matches a.example.com and a.b.example.com, not example.com itself")
            .step("A rules answer with IPv4, AAAA rules with IPv6")
            .step("One rule per pattern and record type")
    }

    pub fn rule_match(domain: &str) -> Self {
        let mut explanation = Self::new("Match Domain")
            .description(&format!("Finds the rule that would answer queries for {}.", domain))
            .operation("RuleEngine::match_domain")
            .network("None")
            .step("Enabled exact rules are checked first; the earliest wins");

        // Candidate wildcard suffixes, longest first
        let name = domain.trim().trim_end_matches('.').to_lowercase();
        let labels: Vec<&str> = name.split('.').collect();
        for i in 1..labels.len() {
            explanation = explanation.step(&format!("then *.{}", labels[i..].join(".")));
        }

        explanation.step("No match means the query goes to the upstream resolver")
    }

    pub fn rule_delete(id: &str) -> Self {
        Self::new("Delete Rule")
            .description(&format!("Removes rule {}.", id))
            .operation("RuleEngine::delete")
            .network("None")
    }

    pub fn rule_toggle(id: &str) -> Self {
        Self::new("Toggle Rule")
            .description(&format!("Flips rule {} between enabled and disabled.", id))
            .operation("RuleEngine::toggle")
            .network("None")
    }

    pub fn rule_promote(id: u64) -> Self {
        Self::new("Promote Log Entry")
            .description(&format!("Turns query log entry {} into a new override rule.", id))
            .operation("RuleDraft::from_log_entry + RuleEngine::upsert")
            .network("None")
            .step("The queried domain becomes the rule's pattern")
            .step("A and AAAA queries keep their type; anything else becomes A")
            .step("Without --answer the rule blocks (0.0.0.0 or ::)")
    }

    pub fn probe(test_domain: &str) -> Self {
        Self::new("Probe Servers")
            .description(&format!(
                "Asks each selected resolver for {} and measures how long the answer takes.",
                test_domain
            ))
            .operation("HickoryProber via scan")
            .network("One lookup per server, plus bootstrap lookups for hostnames")
            .step("A resolver's hostname is looked up through its bootstrap IP when it has one")
            .step("Otherwise the configured bootstrap resolver answers, falling back to system DNS")
            .step("A single attempt is made with a per-lookup timeout")
            .step("Latency covers only the test query")
            .step("Nothing is cached between probes")
    }

    pub fn bootstrap(key: &str) -> Self {
        Self::new("Bootstrap Plan")
            .description(&format!(
                "Shows how the hostname of {} gets resolved before it can be used.",
                key
            ))
            .operation("resolve_bootstrap")
            .network("None")
            .step("1. The server's own bootstrap IP, if set")
            .step("2. The configured bootstrap resolver, one level deep")
            .step("3. The operating system's resolver")
            .rfc(8310)
    }

    pub fn logs_show() -> Self {
        Self::new("Query Log")
            .description("Lists observed queries from a log export, newest first.")
            .operation("QueryLog::query")
            .network("None")
            .step("The filter is a case-insensitive substring of the domain")
            .step("Use --offset and --limit to page through results")
    }

    pub fn ips() -> Self {
        Self::new("Quick-Pick Addresses")
            .description("Manages the labelled addresses offered as rule answers.")
            .operation("Settings::add_predefined_ip / remove_predefined_ip")
            .network("None - stored in config.toml")
            .step("Labels are required and addresses must be IPv4")
            .step("Each address can appear once")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_match_lists_wildcard_candidates() {
        let explain = Explain::rule_match("A.Ads.Example.com.");
        let steps = explain.steps();
        assert!(steps.contains(&"then *.ads.example.com".to_string()));
        assert!(steps.contains(&"then *.com".to_string()));
        assert!(!steps.iter().any(|s| s == "then *.a.ads.example.com"));
    }

    #[test]
    fn test_server_add_mentions_format() {
        let explain = Explain::server_add(Protocol::Dot);
        assert!(explain.steps()[0].contains("tls://"));
        assert_eq!(explain.learn_more.as_deref(), Some("https://www.rfc-editor.org/rfc/rfc7858"));
    }
}
