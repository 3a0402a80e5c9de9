//! Command-line argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::output::OutputFormat;
use dnswitch::{Protocol, RecordType};

/// Manage DNS resolvers, domain overrides and connectivity probes
///
/// Keep a validated list of plain and encrypted resolvers (DoH, DoT, DoQ,
/// DoH3), answer chosen domains with static addresses, and check which
/// resolvers actually answer from your network.
/// Use --explain on any command to learn what it does.
#[derive(Parser, Debug)]
#[command(name = "dnswitch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, value_enum)]
    pub output: Option<OutputFormat>,

    /// Explain what this command does (educational mode)
    #[arg(long, global = true)]
    pub explain: bool,

    /// Increase verbosity
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Directory holding config.toml, servers.json and dns_rules.json
    #[arg(long, env = "DNSWITCH_HOME", global = true)]
    pub home: Option<PathBuf>,

    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage the resolver registry
    Servers(ServersArgs),

    /// Manage domain override rules
    Rules(RulesArgs),

    /// Check which resolvers answer
    Probe(ProbeArgs),

    /// Show how a resolver's hostname gets resolved
    Bootstrap {
        /// Server key (e.g., CLOUDFLARE_DOH)
        key: String,
    },

    /// Inspect exported query logs
    Logs(LogsArgs),

    /// Manage quick-pick answer addresses
    Ips(IpsArgs),

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ============================================================================
// Servers command
// ============================================================================

#[derive(Args, Debug)]
pub struct ServersArgs {
    #[command(subcommand)]
    pub command: ServersCommands,
}

#[derive(Subcommand, Debug)]
pub enum ServersCommands {
    /// List registered resolvers
    List {
        /// Only show this protocol (dns, doh, dot, doq, doh3)
        #[arg(short, long)]
        protocol: Option<Protocol>,

        /// Only show servers carrying this tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Show one resolver
    Show {
        /// Server key
        key: String,
    },

    /// Add a resolver
    Add(ServerFields),

    /// Edit a resolver in place (its key never changes)
    Edit {
        /// Server key
        key: String,

        #[command(flatten)]
        fields: EditFields,
    },

    /// Remove a resolver
    Remove {
        /// Server key
        key: String,
    },

    /// Replace every resolver with the built-in list
    Reset,
}

#[derive(Args, Debug)]
pub struct ServerFields {
    /// Display name; the key is derived from it
    #[arg(short, long)]
    pub name: String,

    /// Protocol (dns, doh, dot, doq, doh3)
    #[arg(short, long, default_value = "dns")]
    pub protocol: Protocol,

    /// Endpoint; repeat or comma-separate for two plain DNS addresses
    #[arg(short, long = "endpoint", required = true)]
    pub endpoints: Vec<String>,

    /// Label; may be repeated
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// IPv4 address of the endpoint's host, skips bootstrap lookups
    #[arg(short, long)]
    pub bootstrap_ip: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditFields {
    /// New display name
    #[arg(short, long)]
    pub name: Option<String>,

    /// New protocol
    #[arg(short, long)]
    pub protocol: Option<Protocol>,

    /// Replacement endpoints
    #[arg(short, long = "endpoint")]
    pub endpoints: Vec<String>,

    /// Replacement tags
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Drop every tag
    #[arg(long, conflicts_with = "tags")]
    pub clear_tags: bool,

    /// New bootstrap IP
    #[arg(short, long)]
    pub bootstrap_ip: Option<String>,

    /// Drop the bootstrap IP
    #[arg(long, conflicts_with = "bootstrap_ip")]
    pub clear_bootstrap_ip: bool,
}

// ============================================================================
// Rules command
// ============================================================================

#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommands,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommands {
    /// List override rules in evaluation order
    List,

    /// Add a rule
    Add {
        /// Domain (example.com) or wildcard (*.example.com)
        pattern: String,

        /// Address to answer with (defaults to 0.0.0.0 or ::)
        answer: Option<String>,

        /// Record type
        #[arg(short = 't', long = "type", default_value = "A")]
        record_type: RecordType,

        /// Store the rule disabled
        #[arg(long)]
        disabled: bool,
    },

    /// Change a rule
    Edit {
        /// Rule id
        id: String,

        /// New pattern
        #[arg(long)]
        pattern: Option<String>,

        /// New answer
        #[arg(long)]
        answer: Option<String>,

        /// New record type
        #[arg(short = 't', long = "type")]
        record_type: Option<RecordType>,
    },

    /// Delete a rule
    Delete {
        /// Rule id
        id: String,
    },

    /// Enable a disabled rule or disable an enabled one
    Toggle {
        /// Rule id
        id: String,
    },

    /// Show which rule, if any, answers a domain
    Match {
        /// Queried domain
        domain: String,

        /// Only consider rules of this record type
        #[arg(short = 't', long = "type")]
        record_type: Option<RecordType>,
    },

    /// Create a rule from a query log entry
    Promote {
        /// Query log export (JSON array of entries)
        #[arg(short, long)]
        file: PathBuf,

        /// Entry id
        #[arg(long)]
        id: u64,

        /// Answer address (defaults to 0.0.0.0 or ::)
        #[arg(long)]
        answer: Option<String>,
    },
}

// ============================================================================
// Probe command
// ============================================================================

#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Server keys to probe (default: all)
    pub keys: Vec<String>,

    /// Probe every server of this protocol
    #[arg(short, long, conflicts_with = "keys")]
    pub protocol: Option<Protocol>,

    /// Domain to resolve (defaults to the configured test domain)
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Per-lookup timeout in milliseconds
    #[arg(long, default_value = "3000")]
    pub timeout: u64,

    /// Probes in flight at once
    #[arg(short, long, default_value = "8")]
    pub concurrency: usize,
}

// ============================================================================
// Logs command
// ============================================================================

#[derive(Args, Debug)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommands,
}

#[derive(Subcommand, Debug)]
pub enum LogsCommands {
    /// Show entries from a query log export, newest first
    Show {
        /// Query log export (JSON array of entries)
        #[arg(short, long)]
        file: PathBuf,

        /// Case-insensitive domain substring
        #[arg(short = 'F', long, default_value = "")]
        filter: String,

        /// Entries to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Entries to show
        #[arg(short, long)]
        limit: Option<usize>,

        /// Keep only this many newest entries
        #[arg(long, default_value = "1000")]
        capacity: usize,
    },
}

// ============================================================================
// Ips command
// ============================================================================

#[derive(Args, Debug)]
pub struct IpsArgs {
    #[command(subcommand)]
    pub command: IpsCommands,
}

#[derive(Subcommand, Debug)]
pub enum IpsCommands {
    /// List quick-pick addresses
    List,

    /// Add a quick-pick address
    Add {
        /// Short label (e.g., Block)
        label: String,

        /// IPv4 address
        ip: String,
    },

    /// Remove a quick-pick address
    Remove {
        /// IPv4 address
        ip: String,
    },
}

// ============================================================================
// Config command
// ============================================================================

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,

        /// Value to set
        value: String,
    },

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_server_add() {
        let cli = Cli::try_parse_from([
            "dnswitch", "servers", "add", "--name", "Quad9 DoT", "--protocol", "dot",
            "--endpoint", "tls://dns.quad9.net:853", "--tag", "privacy",
        ])
        .unwrap();
        let Commands::Servers(ServersArgs { command: ServersCommands::Add(fields) }) = cli.command
        else {
            panic!("expected servers add");
        };
        assert_eq!(fields.protocol, Protocol::Dot);
        assert_eq!(fields.endpoints, vec!["tls://dns.quad9.net:853"]);
        assert_eq!(fields.tags, vec!["privacy"]);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["dnswitch", "rules", "list", "-o", "json", "--yes"]).unwrap();
        assert_eq!(cli.output, Some(OutputFormat::Json));
        assert!(cli.yes);
    }

    #[test]
    fn test_probe_keys_conflict_with_protocol() {
        let parsed = Cli::try_parse_from(["dnswitch", "probe", "GOOGLE_DNS", "--protocol", "doh"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_rule_type_parses() {
        let cli = Cli::try_parse_from([
            "dnswitch",
            "rules",
            "add",
            "example.com",
            "::1",
            "-t",
            "AAAA",
        ])
        .unwrap();
        let Commands::Rules(RulesArgs { command: RulesCommands::Add { record_type, .. } }) =
            cli.command
        else {
            panic!("expected rules add");
        };
        assert_eq!(record_type, RecordType::Aaaa);
    }
}
