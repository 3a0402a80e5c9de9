//! `dnswitch bootstrap` - Show how a resolver's hostname gets resolved.

use anyhow::Result;
use colored::Colorize;
use dnswitch::{resolve_bootstrap, BootstrapPlan, Endpoint, Host};
use serde::Serialize;

use super::Context;
use crate::education::Explain;
use crate::output::{print_csv, render_document, OutputFormat};

#[derive(Serialize)]
struct PlanReport<'a> {
    key: &'a str,
    endpoint: &'a str,
    needs_lookup: bool,
    plan: &'a BootstrapPlan,
}

#[derive(Serialize)]
struct PlanRecord<'a> {
    key: &'a str,
    endpoint: &'a str,
    kind: &'static str,
    via: String,
}

pub async fn execute(ctx: Context, key: &str) -> Result<()> {
    if ctx.explain {
        Explain::bootstrap(key).print();
    }

    let registry = ctx.registry()?;
    let target = registry
        .get(key)
        .ok_or_else(|| anyhow::anyhow!("No server with key {}", key))?;
    let global_key = ctx.config.settings.bootstrap_resolver.as_ref().map(|k| k.as_str());
    let plan = resolve_bootstrap(target, registry.list(), global_key);

    let endpoint = target.primary_endpoint();
    let needs_lookup = matches!(
        Endpoint::parse(target.protocol, endpoint).map(|e| e.host()),
        Ok(Host::Domain(_))
    );

    let report = PlanReport {
        key: target.key.as_str(),
        endpoint,
        needs_lookup,
        plan: &plan,
    };
    if let Some(doc) = render_document(ctx.output_format, &report)? {
        println!("{}", doc);
        return Ok(());
    }
    if ctx.output_format == OutputFormat::Csv {
        let (kind, via) = summarize(&plan);
        return print_csv(&[PlanRecord {
            key: report.key,
            endpoint,
            kind,
            via,
        }]);
    }

    println!("{} {}", "Server:".bold(), target.key.to_string().cyan());
    println!("{} {}", "Endpoint:".bold(), endpoint);
    if !needs_lookup {
        println!(
            "{}",
            "The endpoint is an IP address; no bootstrap lookup happens.".dimmed()
        );
        return Ok(());
    }

    match &plan {
        BootstrapPlan::Direct(ip) => {
            println!(
                "{} connect to {} (server's bootstrap IP)",
                "Plan:".bold(),
                ip.to_string().green()
            );
        }
        BootstrapPlan::Resolver(via) => {
            println!(
                "{} look up the host through {} ({})",
                "Plan:".bold(),
                via.endpoint.green(),
                via.protocol.display_name()
            );
            if let Some(ip) = via.bootstrap_ip {
                println!("      reaching that resolver at {}", ip);
            }
        }
        BootstrapPlan::System => {
            println!("{} use the operating system's resolver", "Plan:".bold());
            if global_key.is_none() {
                println!(
                    "{}",
                    "Tip: dnswitch config set bootstrap_resolver <KEY> to avoid system DNS".dimmed()
                );
            }
        }
    }
    Ok(())
}

fn summarize(plan: &BootstrapPlan) -> (&'static str, String) {
    match plan {
        BootstrapPlan::Direct(ip) => ("direct", ip.to_string()),
        BootstrapPlan::Resolver(via) => ("resolver", via.endpoint.clone()),
        BootstrapPlan::System => ("system", String::new()),
    }
}
