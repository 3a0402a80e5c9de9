//! `dnswitch rules` - Manage domain override rules.

use anyhow::Result;
use colored::Colorize;
use dnswitch::{
    DomainRule, Outcome, RecordType, RuleDraft, RuleEngine, RuleError, RuleId, RuleStore,
};
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use super::{load_query_log, Context};
use crate::cli::args::{RulesArgs, RulesCommands};
use crate::education::Explain;
use crate::output::{print_csv, render_document, OutputFormat};

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Pattern")]
    pattern: String,
    #[tabled(rename = "Type")]
    record_type: String,
    #[tabled(rename = "Answer")]
    answer: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

#[derive(Serialize)]
struct RuleRecord<'a> {
    id: &'a str,
    pattern: &'a str,
    record_type: &'a str,
    answer: &'a str,
    enabled: bool,
}

impl<'a> From<&'a DomainRule> for RuleRecord<'a> {
    fn from(r: &'a DomainRule) -> Self {
        Self {
            id: r.id.as_str(),
            pattern: &r.pattern,
            record_type: r.record_type.as_str(),
            answer: &r.answer,
            enabled: r.enabled,
        }
    }
}

pub async fn execute(ctx: Context, args: RulesArgs) -> Result<()> {
    match args.command {
        RulesCommands::List => list(&ctx),
        RulesCommands::Add { pattern, answer, record_type, disabled } => {
            let answer = answer.unwrap_or_else(|| record_type.default_answer().to_string());
            let draft = RuleDraft::new(pattern, answer)
                .record_type(record_type)
                .enabled(!disabled);
            save(&ctx, draft, "Added")
        }
        RulesCommands::Edit { id, pattern, answer, record_type } => {
            edit(&ctx, &id, pattern, answer, record_type)
        }
        RulesCommands::Delete { id } => delete(&ctx, &id),
        RulesCommands::Toggle { id } => toggle(&ctx, &id),
        RulesCommands::Match { domain, record_type } => match_domain(&ctx, &domain, record_type),
        RulesCommands::Promote { file, id, answer } => {
            if ctx.explain {
                Explain::rule_promote(id).print();
            }
            let log = load_query_log(&file, usize::MAX)?;
            let entry = log
                .get(id)
                .ok_or_else(|| anyhow::anyhow!("No entry with id {} in {}", id, file.display()))?;
            save(&ctx, RuleDraft::from_log_entry(entry, answer.as_deref()), "Added")
        }
    }
}

fn list(ctx: &Context) -> Result<()> {
    if ctx.explain {
        Explain::rules_list().print();
    }
    let engine = ctx.rules()?;
    print_rules(ctx.output_format, engine.list())
}

fn print_rules(format: OutputFormat, rules: &[DomainRule]) -> Result<()> {
    if let Some(doc) = render_document(format, rules)? {
        println!("{}", doc);
        return Ok(());
    }
    if format == OutputFormat::Csv {
        let records: Vec<RuleRecord> = rules.iter().map(RuleRecord::from).collect();
        return print_csv(&records);
    }

    if rules.is_empty() {
        println!("{}", "No rules yet. Add one with: dnswitch rules add <domain> [answer]".dimmed());
        return Ok(());
    }

    let rows: Vec<RuleRow> = rules
        .iter()
        .map(|r| RuleRow {
            id: r.id.to_string(),
            pattern: r.pattern.clone(),
            record_type: r.record_type.to_string(),
            answer: r.answer.clone(),
            enabled: if r.enabled { "yes".to_string() } else { "no".to_string() },
        })
        .collect();

    let table = Table::new(&rows).with(Style::rounded()).to_string();
    println!("{}", table);
    Ok(())
}

fn save(ctx: &Context, draft: RuleDraft, verb: &str) -> Result<()> {
    if ctx.explain {
        Explain::rule_upsert().print();
    }

    let mut engine = ctx.rules()?;
    let rule = engine.upsert(draft).map_err(describe)?;
    report(ctx, verb, &rule)
}

fn edit(
    ctx: &Context,
    id: &str,
    pattern: Option<String>,
    answer: Option<String>,
    record_type: Option<RecordType>,
) -> Result<()> {
    let engine = ctx.rules()?;
    let current = find(&engine, id)?;

    let mut draft = RuleDraft::from_rule(current);
    if let Some(pattern) = pattern {
        draft.pattern = pattern;
    }
    if let Some(record_type) = record_type {
        draft.record_type = record_type;
    }
    if let Some(answer) = answer {
        draft.answer = answer;
    }

    save(ctx, draft, "Updated")
}

fn delete(ctx: &Context, id: &str) -> Result<()> {
    if ctx.explain {
        Explain::rule_delete(id).print();
    }

    let mut engine = ctx.rules()?;
    let pattern = find(&engine, id)?.pattern.clone();
    if !ctx.confirm(&format!("Delete rule for {}?", pattern))? {
        println!("{}", "Cancelled.".dimmed());
        return Ok(());
    }

    match engine.delete(&RuleId::from(id))? {
        Outcome::Applied(rule) => {
            println!("{} Deleted rule for {}.", "Success:".green().bold(), rule.pattern);
            Ok(())
        }
        Outcome::NotFound => anyhow::bail!("No rule with id {}", id),
    }
}

fn toggle(ctx: &Context, id: &str) -> Result<()> {
    if ctx.explain {
        Explain::rule_toggle(id).print();
    }

    let mut engine = ctx.rules()?;
    match engine.toggle(&RuleId::from(id))? {
        Outcome::Applied(rule) => {
            let state = if rule.enabled { "enabled".green() } else { "disabled".yellow() };
            println!("{} Rule for {} is now {}.", "Success:".green().bold(), rule.pattern, state);
            Ok(())
        }
        Outcome::NotFound => anyhow::bail!("No rule with id {}", id),
    }
}

fn match_domain(ctx: &Context, domain: &str, record_type: Option<RecordType>) -> Result<()> {
    if ctx.explain {
        Explain::rule_match(domain).print();
    }

    let engine = ctx.rules()?;
    let found = match record_type {
        Some(t) => engine.match_record(domain, t),
        None => engine.match_domain(domain),
    };

    if let Some(doc) = render_document(ctx.output_format, &found)? {
        println!("{}", doc);
        return Ok(());
    }
    if ctx.output_format == OutputFormat::Csv {
        let records: Vec<RuleRecord> = found.into_iter().map(RuleRecord::from).collect();
        return print_csv(&records);
    }

    match found {
        Some(rule) => println!(
            "{} {} {} {} ({})",
            domain.bold(),
            "→".dimmed(),
            rule.answer.cyan(),
            rule.record_type,
            format!("rule {} for {}", rule.id, rule.pattern).dimmed()
        ),
        None => println!("{} {}", domain.bold(), "→ no rule, forwarded upstream".dimmed()),
    }
    Ok(())
}

fn find<'a, S: RuleStore>(engine: &'a RuleEngine<S>, id: &str) -> Result<&'a DomainRule> {
    engine
        .get(&RuleId::from(id))
        .ok_or_else(|| anyhow::anyhow!("No rule with id {}", id))
}

fn report(ctx: &Context, verb: &str, rule: &DomainRule) -> Result<()> {
    if let Some(doc) = render_document(ctx.output_format, rule)? {
        println!("{}", doc);
        return Ok(());
    }
    if ctx.output_format == OutputFormat::Csv {
        return print_csv(&[RuleRecord::from(rule)]);
    }
    println!(
        "{} {} rule {} {} {} ({})",
        "Success:".green().bold(),
        verb,
        rule.pattern,
        "→".dimmed(),
        rule.answer,
        rule.id.to_string().dimmed()
    );
    Ok(())
}

fn describe(err: RuleError) -> anyhow::Error {
    match err {
        RuleError::Validation(errors) => {
            let lines: Vec<String> =
                errors.messages().into_iter().map(|m| format!("  - {}", m)).collect();
            anyhow::anyhow!("Invalid rule:\n{}", lines.join("\n"))
        }
        other => other.into(),
    }
}
