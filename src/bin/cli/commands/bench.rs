//! Performance benchmark command

use clap::{value_parser, Arg, ArgMatches, Command};
use kvprobe::{Harness, PhaseTiming};

use crate::cli::utils::{json_success, CliResult, JsonOutput};
use crate::cli::GlobalOptions;

/// Build the 'perf' subcommand
pub fn perf_command() -> Command {
    Command::new("perf")
        .about("Run performance test (sequential writes, then reads)")
        .arg(
            Arg::new("count")
                .help("Number of records to write and read back")
                .index(1)
                .value_parser(value_parser!(u64))
                .default_value("10000"),
        )
}

fn timing_line(label: &str, timing: &PhaseTiming) -> String {
    let rate = match timing.ops_per_sec() {
        Some(rate) => format!("{:.2} ops/sec", rate),
        None => "elapsed time too small to measure".to_string(),
    };
    format!(
        "  {:<6} {} ops in {}ms ({})",
        format!("{}:", label),
        timing.operations,
        timing.elapsed_ms(),
        rate
    )
}

fn timing_json(timing: &PhaseTiming) -> JsonOutput {
    let mut output = JsonOutput::new();
    output
        .add_uint("operations", timing.operations)
        .add_uint("elapsed_ms", timing.elapsed_ms() as u64)
        .add_opt_float("ops_per_sec", timing.ops_per_sec());
    output
}

/// Execute the 'perf' command
///
/// A failed write or read ends the run without printing any timing.
pub fn run_perf(harness: &Harness, global: &GlobalOptions, matches: &ArgMatches) -> CliResult<()> {
    let count = *matches
        .get_one::<u64>("count")
        .ok_or("count argument is required")?;

    if global.chatty() {
        println!("Starting performance test with {} operations...", count);
    }

    let report = harness.perf(count)?;

    if global.is_json() {
        json_success("perf")
            .add_uint("operations", report.operations)
            .add_object("write", timing_json(&report.write))
            .add_object("read", timing_json(&report.read))
            .print();
    } else {
        if !global.quiet {
            println!("Performance test results:");
        }
        println!("{}", timing_line("Write", &report.write));
        println!("{}", timing_line("Read", &report.read));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_timing_line() {
        let timing = PhaseTiming {
            operations: 1000,
            elapsed: Duration::from_millis(500),
        };
        assert_eq!(
            timing_line("Write", &timing),
            "  Write: 1000 ops in 500ms (2000.00 ops/sec)"
        );

        let instant = PhaseTiming {
            operations: 10,
            elapsed: Duration::ZERO,
        };
        assert_eq!(
            timing_line("Read", &instant),
            "  Read:  10 ops in 0ms (elapsed time too small to measure)"
        );
    }

    #[test]
    fn test_timing_json_without_rate() {
        let instant = PhaseTiming {
            operations: 10,
            elapsed: Duration::ZERO,
        };
        let value = timing_json(&instant).to_value();
        assert_eq!(value["operations"], 10);
        assert!(value["ops_per_sec"].is_null());
    }
}
