//! CLI argument definitions and the command runner.
//!
//! hanwrap operates on explicitly named files; it never walks the project
//! tree on its own. The intended host is a build pipeline or lint-staged
//! hook that already knows which files changed.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;

use crate::config::{self, CONFIG_FILE_NAME};
use crate::engine::{Engine, FileOutput};
use crate::report::{self, Warning, WarningKind};

/// Exit status for CLI commands.
///
/// - `Success` (0): Command completed, every translatable text resolved
/// - `Failure` (1): Command completed but some texts had no dictionary entry
/// - `Error` (2): Command failed (config error, unreadable file, etc.)
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    Error,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => ExitCode::from(0),
            ExitStatus::Failure => ExitCode::from(1),
            ExitStatus::Error => ExitCode::from(2),
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite CJK literals in the given files into translation calls
    Rewrite(RewriteCommand),
    /// Initialize a hanwrap configuration file
    Init,
}

#[derive(Debug, Args)]
pub struct RewriteCommand {
    /// Files to rewrite
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Translation function name (overrides config file)
    #[arg(long)]
    pub function: Option<String>,

    /// Module specifier the translation function is imported from
    /// (overrides config file)
    #[arg(long)]
    pub import_from: Option<String>,

    /// Dictionary JSON file (overrides config file)
    #[arg(long, env = "HANWRAP_DICT")]
    pub dict: Option<PathBuf>,

    /// Keep the original text as a trailing call argument
    #[arg(long)]
    pub raw: bool,

    /// Enable an additional transform (repeatable)
    #[arg(long = "transform")]
    pub transforms: Vec<String>,

    /// Write rewritten files in place (default: report only)
    #[arg(long)]
    pub write: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run_cli(args: Arguments) -> Result<ExitCode> {
    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success.into());
    };
    match args.command {
        Some(Command::Init) => run_init(),
        Some(Command::Rewrite(cmd)) => run_rewrite(cmd),
        None => Ok(ExitStatus::Success.into()),
    }
}

fn run_init() -> Result<ExitCode> {
    let path = PathBuf::from(CONFIG_FILE_NAME);
    if path.exists() {
        println!("{} already exists", CONFIG_FILE_NAME);
        return Ok(ExitStatus::Success.into());
    }
    fs::write(&path, config::default_config_json()?)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;
    println!("Created {}", CONFIG_FILE_NAME);
    Ok(ExitStatus::Success.into())
}

fn run_rewrite(cmd: RewriteCommand) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("Failed to resolve working directory")?;
    let loaded = config::load_config(&cwd)?;
    let mut config = loaded.config;
    if let Some(function) = cmd.function {
        config.i18n_function = function;
    }
    if let Some(import) = cmd.import_from {
        config.i18n_import = import;
    }
    if let Some(dict) = cmd.dict {
        config.dict = Some(dict.to_string_lossy().into_owned());
    }
    if cmd.raw {
        config.raw = true;
    }
    config.transforms.extend(cmd.transforms);
    let engine = Engine::new(config.into_options()?);

    if cmd.verbose && loaded.from_file {
        println!("Using configuration from {}", CONFIG_FILE_NAME);
    }

    let outputs: Vec<(PathBuf, FileOutput)> = cmd
        .files
        .par_iter()
        .map(|path| (path.clone(), process_file(&engine, path, cmd.write)))
        .collect();

    let mut changed = 0usize;
    let mut translated = 0usize;
    let mut missed = 0usize;
    let mut io_errors = 0usize;
    for (path, output) in &outputs {
        let file = path.to_string_lossy();
        report::print_file_summary(&file, &output.translated(), &output.missed());
        report::print_warnings(&output.warnings);
        if output.code.is_some() {
            changed += 1;
        }
        translated += output.translated().len();
        missed += output.missed().len();
        io_errors += output
            .warnings
            .iter()
            .filter(|w| w.kind == WarningKind::Io)
            .count();
    }

    let action = if cmd.write { "rewrote" } else { "would rewrite" };
    println!(
        "{} {} of {} file(s): {} translated, {} without dictionary entry",
        action.bold(),
        changed,
        outputs.len(),
        translated.to_string().green(),
        missed.to_string().yellow(),
    );

    if io_errors > 0 {
        Ok(ExitStatus::Error.into())
    } else if missed > 0 {
        Ok(ExitStatus::Failure.into())
    } else {
        Ok(ExitStatus::Success.into())
    }
}

/// Transforms one file, folding read/write failures into its output so one
/// bad path never aborts the batch.
fn process_file(engine: &Engine, path: &Path, write: bool) -> FileOutput {
    let file = path.to_string_lossy();
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            return FileOutput {
                code: None,
                map: None,
                records: Vec::new(),
                warnings: vec![Warning::new(
                    WarningKind::Io,
                    &file,
                    format!("failed to read: {}", err),
                )],
            };
        }
    };
    let mut output = engine.transform(&file, &source);
    if write {
        if let Some(code) = &output.code {
            if let Err(err) = fs::write(path, code) {
                output.warnings.push(Warning::new(
                    WarningKind::Io,
                    &file,
                    format!("failed to write: {}", err),
                ));
            }
        }
    }
    output
}
