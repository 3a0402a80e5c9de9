//! `dnswitch config` - CLI configuration management.

use anyhow::Result;
use colored::Colorize;

use super::Context;
use crate::cli::args::{ConfigArgs, ConfigCommands};
use crate::config::Config;
use crate::output::OutputFormat;

pub async fn execute(ctx: Context, args: ConfigArgs) -> Result<()> {
    match args.command {
        ConfigCommands::Show => show_config(&ctx),
        ConfigCommands::Set { key, value } => set_config(ctx, &key, &value),
        ConfigCommands::Path => show_path(&ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    match ctx.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(config)?);
        }
        _ => {
            println!("{}", "Current Configuration:".bold());
            println!();

            println!("  {} {}", "output_format:".bold(), config.output_format.unwrap_or_default());
            println!("  {} {}", "explain_by_default:".bold(), config.explain_by_default);
            println!("  {} {}", "test_domain:".bold(), config.settings.test_domain);

            let bootstrap = config
                .settings
                .bootstrap_resolver
                .as_ref()
                .map_or_else(|| "(system DNS)".dimmed().to_string(), ToString::to_string);
            println!("  {} {}", "bootstrap_resolver:".bold(), bootstrap);

            println!("  {}", "predefined_ips:".bold());
            for p in &config.settings.predefined_ips {
                println!("    {} {}", p.ip, p.label.dimmed());
            }
        }
    }

    Ok(())
}

/// Apply one `key = value` change to `config`
fn apply(ctx: &Context, config: &mut Config, key: &str, value: &str) -> Result<String> {
    match key {
        "output_format" | "output" => {
            config.output_format = Some(value.parse()?);
            Ok(format!("Output format set to {}.", value.cyan()))
        }
        "explain_by_default" | "explain" => {
            config.explain_by_default = value.parse()?;
            Ok(format!("explain_by_default set to {}.", value))
        }
        "test_domain" => {
            config
                .settings
                .set_test_domain(value)
                .map_err(|e| anyhow::anyhow!("Invalid test domain: {}", e))?;
            Ok(format!("Test domain set to {}.", config.settings.test_domain.cyan()))
        }
        "bootstrap_resolver" | "bootstrap" => {
            if matches!(value.trim().to_lowercase().as_str(), "" | "none" | "system") {
                config.settings.bootstrap_resolver = None;
                return Ok("Bootstrap resolver cleared; system DNS will be used.".to_string());
            }
            let registry = ctx.registry()?;
            let server = registry
                .list()
                .iter()
                .find(|s| s.key.as_str().eq_ignore_ascii_case(value.trim()))
                .ok_or_else(|| anyhow::anyhow!("No server with key {}", value.trim()))?;
            config.settings.bootstrap_resolver = Some(server.key.clone());
            Ok(format!("Bootstrap resolver set to {}.", server.key.to_string().cyan()))
        }
        _ => {
            anyhow::bail!(
                "Unknown config key: {}\n\n\
                 Available keys:\n  \
                 output_format      - Default output format (pretty/json/csv/yaml)\n  \
                 explain_by_default - Always explain commands (true/false)\n  \
                 test_domain        - Domain resolved by probes\n  \
                 bootstrap_resolver - Server key used to resolve encrypted resolvers (or none)",
                key
            );
        }
    }
}

fn set_config(mut ctx: Context, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config.clone();
    let message = apply(&ctx, &mut config, key, value)?;
    ctx.config = config;
    ctx.save_config()?;
    println!("{} {}", "Success:".green().bold(), message);
    Ok(())
}

fn show_path(ctx: &Context) -> Result<()> {
    println!("{}", ctx.paths.config_file().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Paths;
    use dnswitch::ServerKey;
    use tempfile::TempDir;

    fn context(dir: &TempDir) -> Context {
        Context {
            output_format: OutputFormat::Pretty,
            explain: false,
            verbose: false,
            no_color: true,
            yes: true,
            paths: Paths::under(dir.path()),
            config: Config::default(),
        }
    }

    #[test]
    fn test_apply_known_keys() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut config = Config::default();

        apply(&ctx, &mut config, "output", "json").unwrap();
        apply(&ctx, &mut config, "test_domain", "Example.COM").unwrap();
        apply(&ctx, &mut config, "bootstrap_resolver", "quad9_dns").unwrap();

        assert_eq!(config.output_format, Some(OutputFormat::Json));
        assert_eq!(config.settings.test_domain, "example.com");
        assert_eq!(config.settings.bootstrap_resolver, Some(ServerKey::new("QUAD9_DNS")));

        apply(&ctx, &mut config, "bootstrap", "none").unwrap();
        assert!(config.settings.bootstrap_resolver.is_none());
    }

    #[test]
    fn test_apply_rejects_bad_values() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        let mut config = Config::default();

        assert!(apply(&ctx, &mut config, "bootstrap_resolver", "NOT_A_SERVER").is_err());
        assert!(apply(&ctx, &mut config, "test_domain", "bad_domain!").is_err());
        assert!(apply(&ctx, &mut config, "api_key", "x").is_err());
        assert_eq!(config, Config::default());
    }
}
