//! Administrative commands

use clap::{ArgMatches, Command};
use kvprobe::Harness;

use crate::cli::utils::{format_bytes, json_success, CliResult};
use crate::cli::GlobalOptions;

/// Build the 'stats' subcommand
pub fn stats_command() -> Command {
    Command::new("stats").about("Show database statistics")
}

/// Execute the 'stats' command
///
/// Properties the store does not report are skipped in text output and
/// `null` in JSON output.
pub fn run_stats(harness: &Harness, global: &GlobalOptions, _matches: &ArgMatches) -> CliResult<()> {
    let stats = harness.stats();

    if global.is_json() {
        json_success("stats")
            .add_opt_str("report", stats.report.as_deref())
            .add_opt_str("memory_usage", stats.memory_usage.as_deref())
            .add_opt_str("num_entries", stats.num_entries.as_deref())
            .print();
        return Ok(());
    }

    if let Some(report) = &stats.report {
        println!("Database statistics:\n{}", report);
    }
    if let Some(usage) = &stats.memory_usage {
        match usage.parse::<u64>() {
            Ok(bytes) => println!(
                "Approximate memory usage: {} bytes ({})",
                bytes,
                format_bytes(bytes)
            ),
            Err(_) => println!("Approximate memory usage: {} bytes", usage),
        }
    }
    if let Some(entries) = &stats.num_entries {
        println!("Live entries: {}", entries);
    }
    Ok(())
}
