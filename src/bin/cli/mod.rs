//! kvprobe CLI - exercises a key-value store one command per invocation
//!
//! # Output Formats
//!
//! - `text` (default): human-readable output
//! - `json`: one JSON object per invocation, for scripting
//!
//! Use `--format` / `-o` to pick the format, `--quiet` / `-q` to suppress
//! informational lines and `-v` (repeatable) to raise the log level.

pub mod commands;
pub mod utils;

use clap::{Arg, ArgAction, ArgMatches, Command};
use kvprobe::Harness;

use crate::cli::utils::CliResult;

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}. Use 'text' or 'json'.", s)),
        }
    }
}

/// Global CLI options that apply to all commands
#[derive(Debug, Clone)]
pub struct GlobalOptions {
    pub output_format: OutputFormat,
    pub quiet: bool,
    pub verbosity: u8,
}

impl GlobalOptions {
    /// Extract global options from argument matches
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let output_format = matches
            .get_one::<String>("format")
            .map(|s| s.parse().unwrap_or_default())
            .unwrap_or_default();

        GlobalOptions {
            output_format,
            quiet: matches.get_flag("quiet"),
            verbosity: matches.get_count("verbose"),
        }
    }

    pub fn is_json(&self) -> bool {
        self.output_format == OutputFormat::Json
    }

    /// Informational lines are shown in text mode unless `--quiet`
    pub fn chatty(&self) -> bool {
        !self.is_json() && !self.quiet
    }
}

/// Build the CLI command structure
pub fn build_cli() -> Command {
    Command::new("kvprobe")
        .about("Key-value store test utility")
        .version(env!("CARGO_PKG_VERSION"))
        .subcommand_required(true)
        .arg_required_else_help(true)
        .after_help(
            "Examples:\n  \
             kvprobe ./testdb put hello world\n  \
             kvprobe ./testdb get hello\n  \
             kvprobe ./testdb scan\n  \
             kvprobe ./testdb scan user: user:9999 10\n  \
             kvprobe ./testdb batch records.txt\n  \
             kvprobe ./testdb perf 1000",
        )
        .arg(
            Arg::new("path")
                .help("Database directory (created if missing)")
                .value_name("DB_PATH")
                .required(true)
                .index(1),
        )
        // Global options
        .arg(
            Arg::new("format")
                .help("Output format: text (default) or json")
                .short('o')
                .long("format")
                .global(true)
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            Arg::new("quiet")
                .help("Suppress informational output (errors still shown)")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .help("Increase log verbosity (-v info, -vv debug, -vvv trace)")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::Count),
        )
        // Key-Value commands
        .subcommand(commands::kv::put_command())
        .subcommand(commands::kv::get_command())
        .subcommand(commands::kv::delete_command())
        .subcommand(commands::kv::scan_command())
        .subcommand(commands::batch::batch_command())
        // Admin commands
        .subcommand(commands::admin::stats_command())
        // Benchmark
        .subcommand(commands::bench::perf_command())
}

/// Dispatch to appropriate command handler
pub fn run(
    harness: &Harness,
    global: &GlobalOptions,
    name: &str,
    sub: &ArgMatches,
) -> CliResult<()> {
    match name {
        "put" => commands::kv::run_put(harness, global, sub),
        "get" => commands::kv::run_get(harness, global, sub),
        "delete" => commands::kv::run_delete(harness, global, sub),
        "scan" => commands::kv::run_scan(harness, global, sub),
        "batch" => commands::batch::run_batch(harness, global, sub),
        "stats" => commands::admin::run_stats(harness, global, sub),
        "perf" => commands::bench::run_perf(harness, global, sub),
        other => Err(utils::CliError::Usage(format!("Unknown command: {}", other))),
    }
}
