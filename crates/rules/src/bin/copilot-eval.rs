//! copilot-eval: run the copilot rules over a journal and maintain the flag file.
//!
//! Subcommands:
//! - `evaluate`: load rules, evaluate a journal, merge into the flag file
//!   and print a JSON summary (flag counts, score, coverage, suggestions)
//! - `review`: move one stored flag to a new status
//! - `validate`: check a rule file and print the findings

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};

use copilot_core::{config, load_entries, Config, FieldRegistry};
use copilot_rules::audit_log::{AuditLog, ExecutionPhase, LogLevel};
use copilot_rules::evaluator::{coverage_map, coverage_report};
use copilot_rules::heuristics::{detect_emergent_patterns, suggest_rules_from_uncovered};
use copilot_rules::loader::{LoadStatus, RuleFormat};
use copilot_rules::validation::{validate_rule, validate_rule_set};
use copilot_rules::{
    copilot_score, evaluate_builtin_rules, FlagFile, FlagStatus, MergePolicy, RuleEvaluator, RuleLoader,
};

// ── CLI ─────────────────────────────────────────────────────────────

/// Ledger Copilot rule evaluation.
#[derive(Parser, Debug)]
#[command(name = "copilot-eval", version, about)]
struct Cli {
    /// Directory of JSON/YAML rule files.
    #[arg(long, global = true, env = "COPILOT_RULES_DIR")]
    rules_dir: Option<PathBuf>,

    /// JSON file holding the stored flags.
    #[arg(long, global = true, env = "COPILOT_FLAGS_FILE")]
    flags_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate a journal and merge the flags into the flag file.
    Evaluate {
        /// JSON array of journal entries.
        #[arg(long)]
        entries: PathBuf,

        /// `overwrite` or `preserve-review`.
        #[arg(long, env = "COPILOT_MERGE_POLICY")]
        merge: Option<String>,

        /// Print the summary without writing the flag file.
        #[arg(long)]
        dry_run: bool,
    },
    /// Change the status of one stored flag.
    Review {
        flag_id: String,

        /// `open`, `dismissed` or `resolved`.
        status: String,

        #[arg(long, env = "COPILOT_REVIEWER")]
        reviewer: Option<String>,
    },
    /// Validate a rule file without loading it.
    Validate { file: PathBuf },
}

// ── main ────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    config::load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(dir) = cli.rules_dir {
        config.rules.dir = dir;
    }
    if let Some(file) = cli.flags_file {
        config.flags.file = file;
    }
    config.validate().context("invalid configuration")?;
    config.log_summary();

    match cli.command {
        Command::Evaluate {
            entries,
            merge,
            dry_run,
        } => {
            if let Some(policy) = merge {
                config.flags.merge_policy = policy;
            }
            evaluate(&config, &entries, dry_run)
        }
        Command::Review {
            flag_id,
            status,
            reviewer,
        } => {
            let reviewer = reviewer.unwrap_or_else(|| config.flags.reviewer.clone());
            review(&config, &flag_id, &status, &reviewer)
        }
        Command::Validate { file } => validate(&file),
    }
}

fn evaluate(config: &Config, entries_path: &Path, dry_run: bool) -> Result<()> {
    let policy: MergePolicy = config.flags.merge_policy.parse()?;

    let loader = RuleLoader::new(&config.rules.dir);
    let results = loader
        .load_all()
        .with_context(|| format!("failed to scan {}", config.rules.dir.display()))?;
    let failed = results
        .iter()
        .filter(|r| matches!(r.status, LoadStatus::Failed { .. }))
        .count();
    if failed > 0 {
        warn!(failed, "some rule files could not be loaded");
    }
    let rules = loader.rules();

    let entries = load_entries(entries_path)
        .with_context(|| format!("failed to read entries from {}", entries_path.display()))?;

    let now = Utc::now();
    let evaluator = RuleEvaluator::new();
    let log = AuditLog::with_max_entries(config.rules.audit_log_cap);
    for rule in &rules {
        for line in validate_rule(rule, evaluator.registry()).messages() {
            log.record(&rule.id, LogLevel::Warning, ExecutionPhase::Validation, line);
        }
    }
    let mut fresh = evaluator.evaluate_logged(&rules, &entries, now, &log);
    fresh.extend(evaluate_builtin_rules(&entries, now));
    let raised = fresh.len();

    let flag_file = FlagFile::new(&config.flags.file);
    let mut store = flag_file.load();
    let merged = store.merge(fresh, policy);
    if dry_run {
        info!("dry run, flag file left untouched");
    } else {
        flag_file.save(&store)?;
    }

    let flags = store.to_vec();
    let coverage = coverage_map(&evaluator, &rules, &entries);
    let mut suggestions = detect_emergent_patterns(&entries);
    suggestions.extend(suggest_rules_from_uncovered(&entries, &coverage));

    let summary = json!({
        "rules": rules.len(),
        "entries": entries.len(),
        "raised": raised,
        "merge": merged,
        "flags": {
            "open": store.count_by_status(FlagStatus::Open),
            "dismissed": store.count_by_status(FlagStatus::Dismissed),
            "resolved": store.count_by_status(FlagStatus::Resolved),
        },
        "score": copilot_score(&flags, &entries),
        "coverage": coverage_report(&evaluator, &rules, &entries),
        "suggestions": suggestions,
        "rulesWithWarnings": log.rules_at_level(LogLevel::Warning),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn review(config: &Config, flag_id: &str, status: &str, reviewer: &str) -> Result<()> {
    let status: FlagStatus = status.parse().map_err(anyhow::Error::msg)?;

    let flag_file = FlagFile::new(&config.flags.file);
    let mut store = flag_file.load();
    let flag = store.update_status(flag_id, status, reviewer, Utc::now())?.clone();
    flag_file.save(&store)?;

    println!("{}", serde_json::to_string_pretty(&flag)?);
    Ok(())
}

fn validate(file: &Path) -> Result<()> {
    let Some(format) = RuleFormat::from_path(file) else {
        bail!("{} is not a .json, .yml or .yaml file", file.display());
    };
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let rules = format.parse(&text, &file.display().to_string())?;

    let result = validate_rule_set(&rules, &FieldRegistry::journal());
    println!("{}", serde_json::to_string_pretty(&result)?);
    if !result.valid {
        bail!("{} has {} error(s)", file.display(), result.errors.len());
    }
    Ok(())
}
