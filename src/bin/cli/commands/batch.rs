//! Bulk load command

use clap::{Arg, ArgMatches, Command};
use kvprobe::Harness;

use crate::cli::utils::{json_success, print_success, validate_batch_file, CliResult};
use crate::cli::GlobalOptions;

/// Build the 'batch' subcommand
pub fn batch_command() -> Command {
    Command::new("batch")
        .about("Batch load from file (key value per line)")
        .arg(
            Arg::new("file")
                .help("Input file; the key ends at the first space or tab")
                .required(true)
                .index(1),
        )
}

/// Execute the 'batch' command
///
/// The whole file is applied as a single atomic batch; a malformed line
/// rejects it before anything is written.
pub fn run_batch(
    harness: &Harness,
    global: &GlobalOptions,
    matches: &ArgMatches,
) -> CliResult<()> {
    let file = matches
        .get_one::<String>("file")
        .ok_or("file argument is required")?;

    validate_batch_file(file)?;
    let report = harness.load_file(file)?;

    if global.is_json() {
        json_success("batch")
            .add_str("file", file)
            .add_uint("records", report.records as u64)
            .print();
    } else if !global.quiet {
        print_success(&format!("Loaded {} records from {}", report.records, file));
    }
    Ok(())
}
