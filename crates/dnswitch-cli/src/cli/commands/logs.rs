//! `dnswitch logs` - Inspect exported query logs.

use anyhow::Result;
use chrono::Local;
use colored::{ColoredString, Colorize};
use dnswitch::{QueryLogEntry, QueryStatus};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::{load_query_log, Context};
use crate::cli::args::{LogsArgs, LogsCommands};
use crate::education::Explain;
use crate::output::{print_csv, render_document, truncate, OutputFormat};

#[derive(Tabled)]
struct LogRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "Type")]
    record_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Answer")]
    answer: String,
}

#[derive(Serialize)]
struct LogRecord<'a> {
    id: u64,
    timestamp: String,
    domain: &'a str,
    record_type: &'a str,
    status: &'static str,
    latency_ms: u64,
    response: String,
}

impl<'a> From<&'a QueryLogEntry> for LogRecord<'a> {
    fn from(e: &'a QueryLogEntry) -> Self {
        Self {
            id: e.id,
            timestamp: e.timestamp.to_rfc3339(),
            domain: &e.domain,
            record_type: &e.record_type,
            status: status_name(e.status),
            latency_ms: e.latency_ms,
            response: e.response_records.join(" "),
        }
    }
}

pub async fn execute(ctx: Context, args: LogsArgs) -> Result<()> {
    match args.command {
        LogsCommands::Show { file, filter, offset, limit, capacity } => {
            if ctx.explain {
                Explain::logs_show().print();
            }

            let log = load_query_log(&file, capacity)?;
            let entries: Vec<&QueryLogEntry> = log.query(&filter, offset, limit).collect();

            if let Some(doc) = render_document(ctx.output_format, &entries)? {
                println!("{}", doc);
                return Ok(());
            }
            if ctx.output_format == OutputFormat::Csv {
                let records: Vec<LogRecord> = entries.iter().map(|e| LogRecord::from(*e)).collect();
                return print_csv(&records);
            }

            print_table(&entries, log.len(), offset);
            Ok(())
        }
    }
}

fn print_table(entries: &[&QueryLogEntry], total: usize, offset: usize) {
    if entries.is_empty() {
        println!("{}", "No queries match.".dimmed());
        return;
    }

    let rows: Vec<LogRow> = entries
        .iter()
        .map(|e| LogRow {
            id: e.id,
            time: e.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string(),
            domain: truncate(&e.domain, 40),
            record_type: e.record_type.clone(),
            status: status_label(e.status).to_string(),
            latency: format!("{} ms", e.latency_ms),
            answer: truncate(&e.response_records.join(", "), 30),
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    println!();
    println!(
        "{}",
        format!(
            "Showing {}-{} of {} buffered queries",
            offset + 1,
            offset + entries.len(),
            total
        )
        .dimmed()
    );
}

const fn status_name(status: QueryStatus) -> &'static str {
    match status {
        QueryStatus::Success => "success",
        QueryStatus::Error => "error",
        QueryStatus::Blocked => "blocked",
    }
}

fn status_label(status: QueryStatus) -> ColoredString {
    match status {
        QueryStatus::Success => status_name(status).green(),
        QueryStatus::Error => status_name(status).red(),
        QueryStatus::Blocked => status_name(status).yellow(),
    }
}
