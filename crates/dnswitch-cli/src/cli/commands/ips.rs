//! `dnswitch ips` - Manage quick-pick answer addresses.

use anyhow::Result;
use colored::Colorize;
use dnswitch::Outcome;
use tabled::{settings::Style, Table, Tabled};

use super::Context;
use crate::cli::args::{IpsArgs, IpsCommands};
use crate::education::Explain;
use crate::output::{print_csv, render_document, OutputFormat};

#[derive(Tabled)]
struct IpRow {
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "IP")]
    ip: String,
}

pub async fn execute(mut ctx: Context, args: IpsArgs) -> Result<()> {
    if ctx.explain {
        Explain::ips().print();
    }

    match args.command {
        IpsCommands::List => list(&ctx),
        IpsCommands::Add { label, ip } => {
            ctx.config
                .settings
                .add_predefined_ip(&label, &ip)
                .map_err(|e| anyhow::anyhow!("Invalid address: {}", e))?;
            ctx.save_config()?;
            println!(
                "{} Added {} ({}).",
                "Success:".green().bold(),
                ip.trim().cyan(),
                label.trim()
            );
            Ok(())
        }
        IpsCommands::Remove { ip } => match ctx.config.settings.remove_predefined_ip(&ip) {
            Outcome::Applied(removed) => {
                ctx.save_config()?;
                println!(
                    "{} Removed {} ({}).",
                    "Success:".green().bold(),
                    removed.ip,
                    removed.label
                );
                Ok(())
            }
            Outcome::NotFound => anyhow::bail!("{} is not a quick-pick address", ip.trim()),
        },
    }
}

fn list(ctx: &Context) -> Result<()> {
    let ips = &ctx.config.settings.predefined_ips;
    if let Some(doc) = render_document(ctx.output_format, ips)? {
        println!("{}", doc);
        return Ok(());
    }
    if ctx.output_format == OutputFormat::Csv {
        return print_csv(ips);
    }

    let rows: Vec<IpRow> = ips
        .iter()
        .map(|p| IpRow {
            label: p.label.clone(),
            ip: p.ip.clone(),
        })
        .collect();
    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}
