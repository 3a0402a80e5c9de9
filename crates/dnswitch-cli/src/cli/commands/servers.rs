//! `dnswitch servers` - Manage the resolver registry.

use anyhow::Result;
use colored::Colorize;
use dnswitch::validate::split_list;
use dnswitch::{
    parse_endpoint_list, Outcome, Protocol, RegistryError, ServerInput, ServerKey, ServerSpec,
};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::args::{EditFields, ServerFields, ServersArgs, ServersCommands};
use crate::education::Explain;
use crate::output::{print_csv, render_document, truncate, OutputFormat};

#[derive(Tabled)]
struct ServerRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    protocol: String,
    #[tabled(rename = "Endpoints")]
    endpoints: String,
    #[tabled(rename = "Tags")]
    tags: String,
}

/// One CSV line per server
#[derive(Serialize)]
struct ServerRecord<'a> {
    key: &'a str,
    name: &'a str,
    protocol: &'a str,
    endpoints: String,
    tags: String,
    bootstrap_ip: String,
}

impl<'a> From<&'a ServerSpec> for ServerRecord<'a> {
    fn from(s: &'a ServerSpec) -> Self {
        Self {
            key: s.key.as_str(),
            name: &s.name,
            protocol: s.protocol.as_str(),
            endpoints: s.endpoints.join(" "),
            tags: s.tags.join(" "),
            bootstrap_ip: s.bootstrap_ip.map(|ip| ip.to_string()).unwrap_or_default(),
        }
    }
}

pub async fn execute(ctx: Context, args: ServersArgs) -> Result<()> {
    match args.command {
        ServersCommands::List { protocol, tag } => list(&ctx, protocol, tag.as_deref()),
        ServersCommands::Show { key } => show(&ctx, &key),
        ServersCommands::Add(fields) => add(&ctx, fields),
        ServersCommands::Edit { key, fields } => edit(&ctx, &key, fields),
        ServersCommands::Remove { key } => remove(&ctx, &key),
        ServersCommands::Reset => reset(&ctx),
    }
}

fn list(ctx: &Context, protocol: Option<Protocol>, tag: Option<&str>) -> Result<()> {
    if ctx.explain {
        Explain::servers_list().print();
    }

    let registry = ctx.registry()?;
    let servers: Vec<&ServerSpec> = match protocol {
        Some(p) => registry.filter(p).collect(),
        None => registry.list().iter().collect(),
    };
    let servers: Vec<&ServerSpec> = servers
        .into_iter()
        .filter(|s| tag.map_or(true, |t| s.has_tag(t)))
        .collect();

    print_servers(ctx.output_format, &servers)
}

fn print_servers(format: OutputFormat, servers: &[&ServerSpec]) -> Result<()> {
    if let Some(doc) = render_document(format, servers)? {
        println!("{}", doc);
        return Ok(());
    }

    if format == OutputFormat::Csv {
        let records: Vec<ServerRecord> = servers.iter().map(|s| ServerRecord::from(*s)).collect();
        return print_csv(&records);
    }

    if servers.is_empty() {
        println!("{}", "No servers match.".dimmed());
        return Ok(());
    }

    let rows: Vec<ServerRow> = servers
        .iter()
        .map(|s| ServerRow {
            key: s.key.to_string(),
            name: truncate(&s.name, 24),
            protocol: s.protocol.display_name().to_string(),
            endpoints: s.endpoints.join("\n"),
            tags: s.tags.join(", "),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();
    println!("{}", format!("{} servers", servers.len()).dimmed());
    Ok(())
}

fn show(ctx: &Context, key: &str) -> Result<()> {
    let registry = ctx.registry()?;
    let server = registry
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("No server with key {}", key))?;

    if let Some(doc) = render_document(ctx.output_format, server)? {
        println!("{}", doc);
        return Ok(());
    }
    if ctx.output_format == OutputFormat::Csv {
        return print_csv(&[ServerRecord::from(server)]);
    }

    println!("{} {}", "Key:".bold(), server.key.to_string().cyan());
    println!("{} {}", "Name:".bold(), server.name);
    println!("{} {}", "Protocol:".bold(), server.protocol.display_name());
    println!("{}", "Endpoints:".bold());
    for endpoint in &server.endpoints {
        println!("  {}", endpoint);
    }
    if !server.tags.is_empty() {
        println!("{} {}", "Tags:".bold(), server.tags.join(", "));
    }
    if let Some(ip) = server.bootstrap_ip {
        println!("{} {}", "Bootstrap IP:".bold(), ip);
    }
    Ok(())
}

/// Gather repeated and comma-separated endpoint flags
fn collect_endpoints(protocol: Protocol, raw: &[String]) -> Vec<String> {
    raw.iter()
        .flat_map(|r| parse_endpoint_list(protocol, r))
        .collect()
}

fn collect_tags(raw: &[String]) -> Vec<String> {
    raw.iter().flat_map(|r| split_list(r)).collect()
}

fn add(ctx: &Context, fields: ServerFields) -> Result<()> {
    if ctx.explain {
        Explain::server_add(fields.protocol).print();
    }

    let input = ServerInput {
        name: fields.name,
        endpoints: collect_endpoints(fields.protocol, &fields.endpoints),
        tags: collect_tags(&fields.tags),
        bootstrap_ip: fields.bootstrap_ip,
    };

    let mut registry = ctx.registry()?;
    let spec = registry.create(&input, fields.protocol).map_err(describe)?;

    report(ctx, "Added", &spec)
}

/// Merge the flags given on the command line over the stored definition
fn merge_edit(current: &ServerSpec, fields: EditFields) -> (ServerInput, Protocol) {
    let protocol = fields.protocol.unwrap_or(current.protocol);
    let mut input = ServerInput::from_spec(current);

    if let Some(name) = fields.name {
        input.name = name;
    }
    if !fields.endpoints.is_empty() {
        input.endpoints = collect_endpoints(protocol, &fields.endpoints);
    }
    if fields.clear_tags {
        input.tags.clear();
    } else if !fields.tags.is_empty() {
        input.tags = collect_tags(&fields.tags);
    }
    if fields.clear_bootstrap_ip {
        input.bootstrap_ip = None;
    } else if fields.bootstrap_ip.is_some() {
        input.bootstrap_ip = fields.bootstrap_ip;
    }

    (input, protocol)
}

fn edit(ctx: &Context, key: &str, fields: EditFields) -> Result<()> {
    if ctx.explain {
        Explain::server_edit(key).print();
    }

    let mut registry = ctx.registry()?;
    let current = registry
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("No server with key {}", key))?;
    let (input, protocol) = merge_edit(current, fields);

    match registry
        .edit(&ServerKey::new(key), &input, protocol)
        .map_err(describe)?
    {
        Outcome::Applied(spec) => report(ctx, "Updated", &spec),
        Outcome::NotFound => anyhow::bail!("No server with key {}", key),
    }
}

fn remove(ctx: &Context, key: &str) -> Result<()> {
    if ctx.explain {
        Explain::server_remove(key).print();
    }

    let mut registry = ctx.registry()?;
    if !registry.contains(key) {
        anyhow::bail!("No server with key {}", key);
    }
    if !ctx.confirm(&format!("Remove server {}?", key))? {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    match registry.remove(&ServerKey::new(key))? {
        Outcome::Applied(spec) => {
            println!("{} Removed {} ({}).", "Success:".green().bold(), spec.key, spec.name);
            warn_if_bootstrap(ctx, key);
            Ok(())
        }
        Outcome::NotFound => anyhow::bail!("No server with key {}", key),
    }
}

fn reset(ctx: &Context) -> Result<()> {
    if ctx.explain {
        Explain::servers_reset().print();
    }

    if !ctx.confirm("Replace every server with the built-in list?")? {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    let mut registry = ctx.registry()?;
    registry.reset()?;
    println!(
        "{} Restored {} built-in servers.",
        "Success:".green().bold(),
        registry.list().len()
    );
    Ok(())
}

fn warn_if_bootstrap(ctx: &Context, key: &str) {
    if ctx.config.settings.bootstrap_resolver.as_ref().is_some_and(|k| k == key) {
        println!(
            "{}",
            format!(
                "Note: {} is the configured bootstrap resolver; \
                 probes fall back to system DNS until you pick another.",
                key
            )
            .yellow()
        );
    }
}

fn report(ctx: &Context, verb: &str, spec: &ServerSpec) -> Result<()> {
    if let Some(doc) = render_document(ctx.output_format, spec)? {
        println!("{}", doc);
        return Ok(());
    }
    if ctx.output_format == OutputFormat::Csv {
        return print_csv(&[ServerRecord::from(spec)]);
    }
    println!(
        "{} {} {} as {}.",
        "Success:".green().bold(),
        verb,
        spec.name,
        spec.key.to_string().cyan()
    );
    Ok(())
}

/// One line per validation problem
fn describe(err: RegistryError) -> anyhow::Error {
    match err {
        RegistryError::Validation(errors) => {
            let lines: Vec<String> =
                errors.messages().into_iter().map(|m| format!("  - {}", m)).collect();
            anyhow::anyhow!("Invalid server definition:\n{}", lines.join("\n"))
        }
        other => other.into(),
    }
}
