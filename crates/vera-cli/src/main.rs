//! Vera CLI
//!
//! Command-line front end over JSON files:
//! - Evaluating and validating argumentation frameworks
//! - Predicting and applying contestations
//! - Sealing, contesting and verifying audit traces
//!
//! Results go to stdout as JSON; diagnostics go to stderr.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vera_core::toy_case::toy_trace;
use vera_core::validation::all_passed;
use vera_core::{
    predict_contestation_effect, validate_contestation, validate_framework, validate_invariants,
    validate_trace_invariants, ArgumentationFramework, AuditTrace, AuditTraceInput, Contestation,
    Decision, DfQuad, DirectoryTraceStore, GradualSemantics, TraceId, TraceStore, VeraConfig,
};

#[derive(Parser)]
#[command(name = "vera")]
#[command(author, version, about = "Vera: contestable, hash-sealed audit traces")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON config file (decision policy, recompute policy, trace version)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a framework with DF-QuAD and print the evaluated framework
    Evaluate {
        /// Framework JSON
        framework: PathBuf,
    },

    /// Validate a framework's structure and report named invariants
    Validate {
        /// Framework JSON
        framework: PathBuf,
    },

    /// Predict a contestation's effect on the root without re-evaluating
    Predict {
        /// Framework JSON
        framework: PathBuf,
        /// Contestation JSON
        contestation: PathBuf,
    },

    /// Seal an audit trace from an input document
    Seal {
        /// Audit trace input JSON
        input: PathBuf,
        /// Write the sealed trace here instead of stdout
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Also save the sealed trace into this trace directory
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Contest a sealed trace and seal the recomputed result
    Contest {
        /// Sealed trace JSON
        trace: PathBuf,
        /// Contestation JSON
        contestation: PathBuf,
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long)]
        store: Option<PathBuf>,
    },

    /// Re-hash a sealed trace and check trace invariants
    Verify {
        /// Sealed trace JSON
        trace: PathBuf,
    },

    /// Print the canonical SHA-256 of a JSON file
    Hash {
        file: PathBuf,
        /// Hash the raw bytes instead of the canonical JSON form
        #[arg(long)]
        raw: bool,
    },

    /// Seal and print the built-in synthetic case
    Demo {
        /// Feed the sources in reverse order; hashes must not change
        #[arg(long)]
        reversed_sources: bool,
    },

    /// Print a stored trace and every prior trace it was contested from
    History {
        trace_id: String,
        /// Trace directory
        #[arg(long)]
        store: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))
}

fn emit<T: Serialize>(value: &T, out: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    match out {
        Some(path) => {
            fs::write(path, format!("{text}\n"))
                .with_context(|| format!("write {}", path.display()))?;
            eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn save_to_store(trace: &AuditTrace, dir: Option<&Path>) -> Result<()> {
    if let Some(dir) = dir {
        let store = DirectoryTraceStore::open(dir)?;
        store.save(trace)?;
        eprintln!(
            "{} stored {} in {}",
            "ok".green().bold(),
            trace.trace_id(),
            dir.display()
        );
    }
    Ok(())
}

fn load_verified_trace(path: &Path) -> Result<AuditTrace> {
    let trace: AuditTrace = read_json(path)?;
    let report = trace.verify_integrity()?;
    if !report.valid {
        bail!(
            "trace {} failed integrity verification: {}",
            trace.trace_id(),
            report.mismatches.join(", ")
        );
    }
    Ok(trace)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => VeraConfig::from_json_file(path)?,
        None => VeraConfig::default(),
    };
    debug!(?config, "loaded config");

    match cli.command {
        Commands::Evaluate { framework } => {
            let framework: ArgumentationFramework = read_json(&framework)?;
            let evaluated = DfQuad.evaluate(&framework)?;
            let decision = Decision::from_strength(
                evaluated.final_strength(),
                framework.root().content(),
                &config.decision,
            )?;
            eprintln!(
                "{} root {} = {:.3} ({})",
                "ok".green().bold(),
                framework.root_claim_id(),
                evaluated.final_strength(),
                decision.label()
            );
            emit(&evaluated, None)?;
        }

        Commands::Validate { framework } => {
            let framework: ArgumentationFramework = read_json(&framework)?;
            let report = validate_framework(&framework);
            let invariants = validate_invariants(&framework);
            emit(&json!({ "report": report, "invariants": invariants }), None)?;
            if !report.valid {
                bail!("framework is invalid: {}", report.summary());
            }
            eprintln!("{}", "Valid.".green());
        }

        Commands::Predict {
            framework,
            contestation,
        } => {
            let framework: ArgumentationFramework = read_json(&framework)?;
            let contestation: Contestation = read_json(&contestation)?;
            let problems = validate_contestation(&framework, &contestation);
            let effect = predict_contestation_effect(&framework, &contestation);
            emit(&json!({ "effect": effect, "problems": problems }), None)?;
            if !problems.is_empty() {
                bail!("contestation {} cannot be applied", contestation.id());
            }
        }

        Commands::Seal { input, out, store } => {
            let input: AuditTraceInput = read_json(&input)?;
            let trace = AuditTrace::seal_with(input, &config.decision)?;
            info!(trace_id = %trace.trace_id(), "sealed");
            emit(&trace, out.as_deref())?;
            save_to_store(&trace, store.as_deref())?;
        }

        Commands::Contest {
            trace,
            contestation,
            out,
            store,
        } => {
            let prior = load_verified_trace(&trace)?;
            let contestation: Contestation = read_json(&contestation)?;
            let problems = validate_contestation(prior.framework().framework(), &contestation);
            if !problems.is_empty() {
                let summary: Vec<String> = problems.iter().map(ToString::to_string).collect();
                bail!("contestation rejected: {}", summary.join("; "));
            }
            let next = prior.contest(&contestation, &config.contest_options())?;
            if let Some(meta) = next.recompute_metadata() {
                eprintln!("{} {}", "ok".green().bold(), meta.diff_summary);
            }
            emit(&next, out.as_deref())?;
            save_to_store(&next, store.as_deref())?;
        }

        Commands::Verify { trace } => {
            let trace: AuditTrace = read_json(&trace)?;
            let integrity = trace.verify_integrity()?;
            let invariants = validate_trace_invariants(&trace);
            emit(&json!({ "integrity": integrity, "invariants": invariants }), None)?;
            if !integrity.valid {
                bail!("integrity mismatch: {}", integrity.mismatches.join(", "));
            }
            if !all_passed(&invariants) {
                bail!("trace invariants failed");
            }
            eprintln!("{} {}", "ok".green().bold(), trace.integrity().trace_hash);
        }

        Commands::Hash { file, raw } => {
            let digest = if raw {
                let bytes = fs::read(&file).with_context(|| format!("read {}", file.display()))?;
                vera_integrity::hash_bytes(&bytes)
            } else {
                let value: serde_json::Value = read_json(&file)?;
                vera_integrity::hash(&value)?
            };
            println!("{digest}");
        }

        Commands::Demo { reversed_sources } => {
            let trace = toy_trace(reversed_sources)?;
            emit(&trace, None)?;
        }

        Commands::History { trace_id, store } => {
            let store = DirectoryTraceStore::open(&store)?;
            let lineage = store.lineage(&TraceId::new(trace_id.clone()))?;
            if lineage.is_empty() {
                bail!("trace {trace_id} not found in {}", store.root().display());
            }
            emit(&lineage, None)?;
        }
    }

    Ok(())
}
