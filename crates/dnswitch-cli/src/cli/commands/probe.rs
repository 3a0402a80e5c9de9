//! `dnswitch probe` - Check which resolvers answer.

use anyhow::Result;
use colored::Colorize;
use dnswitch::probe::{plan_scan, scan_stream, HickoryProber, ProbeConfig};
use dnswitch::{is_valid_domain, ProbeCoordinator, ProbeResult, ServerSpec};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};
use tracing::debug;

use super::Context;
use crate::cli::args::ProbeArgs;
use crate::education::Explain;
use crate::output::{print_csv, render_document, truncate, OutputFormat};

#[derive(Tabled)]
struct ProbeRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Type")]
    protocol: String,
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "Result")]
    result: String,
}

/// Flat result line for structured output
#[derive(Serialize)]
struct ProbeRecord<'a> {
    key: &'a str,
    name: &'a str,
    protocol: &'a str,
    endpoint: &'a str,
    success: bool,
    latency_ms: Option<u64>,
    error: Option<&'a str>,
}

pub async fn execute(ctx: Context, args: ProbeArgs) -> Result<()> {
    let test_domain = args
        .domain
        .clone()
        .unwrap_or_else(|| ctx.config.settings.test_domain.clone());
    if !is_valid_domain(&test_domain) {
        anyhow::bail!("Invalid test domain: {}", test_domain);
    }

    if ctx.explain {
        Explain::probe(&test_domain).print();
    }

    let registry = ctx.registry()?;
    let targets = select_targets(registry.list(), &args)?;
    if targets.is_empty() {
        println!("{}", "No servers to probe.".dimmed());
        return Ok(());
    }

    let global_key = ctx.config.settings.bootstrap_resolver.as_ref().map(|k| k.as_str());
    let jobs = plan_scan(targets.iter().copied(), registry.list(), global_key);

    let mut coordinator = ProbeCoordinator::new();
    coordinator.mark_testing(jobs.iter().map(|j| &j.key));

    let prober = HickoryProber::with_config(ProbeConfig {
        timeout: Duration::from_millis(args.timeout),
        concurrency: args.concurrency,
    });
    debug!(
        servers = jobs.len(),
        domain = %test_domain,
        timeout_ms = args.timeout,
        "starting probe scan"
    );

    let spinner = spinner(&ctx, jobs.len());
    let mut results = Box::pin(scan_stream(&prober, jobs, &test_domain, args.concurrency));
    while let Some((job, outcome)) = results.next().await {
        spinner.inc(1);
        spinner.set_message(job.key.to_string());
        let updated = coordinator.record_for_endpoint(registry.list(), &job.endpoint, outcome);
        if !updated.contains(&job.key) {
            debug!(key = %job.key, endpoint = %job.endpoint, "probe result matched no server");
        }
    }
    spinner.finish_and_clear();

    print_results(ctx.output_format, &targets, &coordinator, &test_domain)
}

/// Servers named on the command line, one protocol, or everything
fn select_targets<'a>(servers: &'a [ServerSpec], args: &ProbeArgs) -> Result<Vec<&'a ServerSpec>> {
    if !args.keys.is_empty() {
        return args
            .keys
            .iter()
            .map(|key| {
                servers
                    .iter()
                    .find(|s| s.key.as_str().eq_ignore_ascii_case(key))
                    .ok_or_else(|| anyhow::anyhow!("No server with key {}", key))
            })
            .collect();
    }
    Ok(servers
        .iter()
        .filter(|s| args.protocol.map_or(true, |p| s.protocol == p))
        .collect())
}

fn spinner(ctx: &Context, total: usize) -> ProgressBar {
    if ctx.output_format != OutputFormat::Pretty {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} Probing {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn print_results(
    format: OutputFormat,
    targets: &[&ServerSpec],
    coordinator: &ProbeCoordinator,
    test_domain: &str,
) -> Result<()> {
    let records: Vec<ProbeRecord> = targets
        .iter()
        .map(|s| {
            let result = coordinator.get(s.key.as_str());
            ProbeRecord {
                key: s.key.as_str(),
                name: &s.name,
                protocol: s.protocol.as_str(),
                endpoint: s.primary_endpoint(),
                success: result.latency_ms().is_some(),
                latency_ms: result.latency_ms(),
                error: match result {
                    ProbeResult::Failure { reason } => Some(reason.as_str()),
                    _ => None,
                },
            }
        })
        .collect();

    if let Some(doc) = render_document(format, &records)? {
        println!("{}", doc);
        return Ok(());
    }
    if format == OutputFormat::Csv {
        return print_csv(&records);
    }

    println!("{} {}", "Test domain:".bold(), test_domain.cyan());
    println!();

    let rows: Vec<ProbeRow> = targets
        .iter()
        .map(|s| ProbeRow {
            key: s.key.to_string(),
            protocol: s.protocol.display_name().to_string(),
            endpoint: truncate(s.primary_endpoint(), 40),
            result: describe(coordinator.get(s.key.as_str())),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);

    let ok = records.iter().filter(|r| r.success).count();
    println!();
    println!(
        "{}",
        format!("{} of {} servers answered", ok, records.len()).dimmed()
    );
    if let Some(fastest) = records.iter().filter_map(|r| r.latency_ms.map(|l| (l, r.key))).min() {
        println!("{} {} ({} ms)", "Fastest:".bold(), fastest.1.green(), fastest.0);
    }
    Ok(())
}

fn describe(result: &ProbeResult) -> String {
    match result {
        ProbeResult::Success { latency_ms } => format!("{} {} ms", "✓".green(), latency_ms),
        ProbeResult::Failure { reason } => format!("{} {}", "✗".red(), truncate(reason, 50)),
        ProbeResult::Testing => "…".dimmed().to_string(),
        ProbeResult::Unset => "-".dimmed().to_string(),
    }
}
