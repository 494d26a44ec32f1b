use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

use unit_peek::{Condition, ConditionConfig, State, StaticDump, UnitRecord, classify};

#[derive(Parser, Debug)]
#[command(name = "peek")]
#[command(version)]
#[command(about = "Filter a saved unit dump the same way a Condition does")]
#[command(long_about = None)]
struct Cli {
    /// Dump file to read (stdin when omitted)
    dump: Option<PathBuf>,

    /// Keep units in any of these states (e.g. waiting-lock, sleeping)
    #[arg(long = "state", value_name = "STATE", value_parser = str::parse::<State>)]
    states: Vec<State>,

    /// Drop units in this state (repeatable)
    #[arg(long = "not-state", value_name = "STATE", value_parser = str::parse::<State>)]
    not_states: Vec<State>,

    /// Regex the creating function must match
    #[arg(long, value_name = "REGEX")]
    created_by: Option<String>,

    /// Regex any call frame's function must match
    #[arg(long, value_name = "REGEX")]
    in_function: Option<String>,

    /// Keep only units holding a lock
    #[arg(long)]
    locked: bool,

    /// Require exactly N matching units
    #[arg(long, value_name = "N")]
    count_eq: Option<usize>,

    /// Require more than N matching units
    #[arg(long, value_name = "N")]
    count_gt: Option<usize>,

    /// Require fewer than N matching units
    #[arg(long, value_name = "N")]
    count_lt: Option<usize>,

    /// Print matches as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Serialize)]
struct Match<'a> {
    #[serde(flatten)]
    unit: &'a UnitRecord,
    state: &'static str,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        "peek=debug,unit_peek=trace"
    } else {
        "warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let raw = read_dump(cli.dump.as_deref())?;
    debug!("read {} bytes of dump", raw.len());

    let config = ConditionConfig::from_env().context("Failed to load UNIT_PEEK_* settings")?;
    let mut cond = Condition::with_config(StaticDump::new(raw), &config);
    apply_filters(&cli, &mut cond)?;
    debug!("evaluating {} filters", cond.len());

    let units = cond.eval().context("Failed to evaluate dump")?;
    if cli.json {
        let matches: Vec<Match<'_>> = units
            .iter()
            .map(|unit| Match {
                unit,
                state: classify(&unit.reason).as_str(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&matches)?);
    } else {
        print!("{}", format_text(&units));
    }

    if units.is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

fn read_dump(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("Failed to read dump from {}", path.display())),
        None => {
            let mut raw = Vec::new();
            std::io::stdin()
                .read_to_end(&mut raw)
                .context("Failed to read dump from stdin")?;
            Ok(raw)
        }
    }
}

fn apply_filters(cli: &Cli, cond: &mut Condition<StaticDump>) -> Result<()> {
    if let Some(pattern) = &cli.created_by {
        cond.created_by_matching(pattern)
            .with_context(|| format!("Bad --created-by pattern {pattern:?}"))?;
    }
    if let Some(pattern) = &cli.in_function {
        cond.in_function(pattern)
            .with_context(|| format!("Bad --in-function pattern {pattern:?}"))?;
    }
    if !cli.states.is_empty() {
        cond.state_in(&cli.states);
    }
    for state in &cli.not_states {
        cond.state_is_not(*state);
    }
    if cli.locked {
        cond.holding_lock();
    }
    if let Some(v) = cli.count_eq {
        cond.count_eq(v);
    }
    if let Some(v) = cli.count_gt {
        cond.count_gt(v);
    }
    if let Some(v) = cli.count_lt {
        cond.count_lt(v);
    }
    Ok(())
}

fn format_text(units: &[UnitRecord]) -> String {
    let mut out = String::new();
    for unit in units {
        let locked = if unit.locked { ", locked" } else { "" };
        out.push_str(&format!(
            "{} [{}{}] {}\n",
            unit.id,
            unit.reason,
            locked,
            classify(&unit.reason)
        ));
        for frame in &unit.frames {
            out.push_str(&format!("    at {frame}\n"));
        }
        if let Some(creator) = &unit.created_by {
            out.push_str(&format!("    created by {creator}\n"));
        }
    }
    out
}
