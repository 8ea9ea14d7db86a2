//! `loopsh`: consult programs and answer queries against them.

use anyhow::{Context, Result};
use clap::Parser;
use loops_vm::{Answer, EngineConfig, LoopMode, Machine};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Consult a program file before anything else (repeatable)
    #[arg(short = 'l', long = "load", value_name = "FILE")]
    pub load: Vec<PathBuf>,

    /// Answer the provided query and exit (non-interactive)
    #[arg(short = 'e', long = "exec", value_name = "QUERY")]
    pub exec: Option<String>,

    /// Answer every query in the provided file and exit, one per line
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Run loops directly instead of generating procedures
    #[arg(long = "interpret")]
    pub interpret: bool,

    /// Compile loops only when they are called
    #[arg(long = "no-expand")]
    pub no_expand: bool,

    /// Stop after the first answer of each query
    #[arg(short = '1', long = "once")]
    pub once: bool,

    /// Maximum call depth
    #[arg(long = "depth-limit", value_name = "N")]
    pub depth_limit: Option<usize>,

    /// Print the generated loop procedures before exiting
    #[arg(long = "listing")]
    pub listing: bool,
}

impl Args {
    pub fn config(&self) -> EngineConfig {
        let mode = if self.interpret {
            LoopMode::Interpreted
        } else {
            LoopMode::Compiled
        };
        let config = EngineConfig::default()
            .with_loop_mode(mode)
            .with_expand_ahead(!self.no_expand);
        match self.depth_limit {
            Some(limit) => config.with_depth_limit(limit),
            None => config,
        }
    }
}

pub fn help_message() -> String {
    "Available commands:".to_string()
        + "\n  .help - Show this help message"
        + "\n  .consult <file> - Add the clauses of a file to the program"
        + "\n  .listing - Show the generated loop procedures"
        + "\n  .quit - Exit the shell"
        + "\n  Anything else is read as a query, e.g. (for(I, 1, 3) do writeln(I))"
}

/// Log to stderr when `LOOPS_LOG` holds a filter such as `debug` or
/// `loops_compiler=trace`.
pub fn init_logging() {
    if let Ok(filter) = EnvFilter::try_from_env("LOOPS_LOG") {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
        tracing::debug!("tracing initialized");
    }
}

/// Render answers the way the shell prints them.
pub fn format_answers(answers: &[Answer]) -> String {
    if answers.is_empty() {
        return "false.\n".to_string();
    }
    answers.iter().map(|answer| format!("{answer}.\n")).collect()
}

pub fn run(args: Args, input: impl BufRead, out: &mut impl Write) -> Result<()> {
    let mut machine = Machine::new(args.config())?;
    for path in &args.load {
        consult_file(&mut machine, path, out)?;
    }

    if let Some(query) = &args.exec {
        answer(&mut machine, query, args.once, out)?;
    } else if let Some(path) = &args.file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        for query in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            writeln!(out, "?- {query}")?;
            answer(&mut machine, query, args.once, out)?;
        }
    } else {
        interact(&mut machine, input, args.once, out)?;
    }

    if args.listing {
        for clause in machine.listing() {
            writeln!(out, "{clause}")?;
        }
    }
    Ok(())
}

fn interact(
    machine: &mut Machine,
    input: impl BufRead,
    once: bool,
    out: &mut impl Write,
) -> Result<()> {
    for line in input.lines() {
        let line = line?;
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            ("", _) => {}
            (".quit", _) => break,
            (".help", _) => writeln!(out, "{}", help_message())?,
            (".listing", _) => {
                for clause in machine.listing() {
                    writeln!(out, "{clause}")?;
                }
            }
            (".consult", path) => {
                if let Err(err) = consult_file(machine, Path::new(path.trim()), out) {
                    writeln!(out, "error: {err:#}")?;
                }
            }
            _ => {
                if let Err(err) = answer(machine, line, once, out) {
                    writeln!(out, "error: {err:#}")?;
                }
            }
        }
        out.flush()?;
    }
    Ok(())
}

fn consult_file(machine: &mut Machine, path: &Path, out: &mut impl Write) -> Result<()> {
    let text =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let added = machine
        .consult(&text)
        .with_context(|| format!("consulting {}", path.display()))?;
    tracing::info!(path = %path.display(), added, "consulted");
    flush_side_effects(machine, out)
}

fn answer(machine: &mut Machine, query: &str, once: bool, out: &mut impl Write) -> Result<()> {
    let answers = if once {
        machine.query_once(query)?.into_iter().collect()
    } else {
        machine.query(query)?
    };
    flush_side_effects(machine, out)?;
    out.write_all(format_answers(&answers).as_bytes())?;
    Ok(())
}

/// Print what the machine wrote, then its loop warnings.
fn flush_side_effects(machine: &mut Machine, out: &mut impl Write) -> Result<()> {
    let written = machine.take_output();
    out.write_all(written.as_bytes())?;
    if !written.is_empty() && !written.ends_with('\n') {
        writeln!(out)?;
    }
    for warning in machine.take_warnings() {
        writeln!(out, "warning: {warning}")?;
    }
    Ok(())
}
