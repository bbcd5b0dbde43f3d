//! kvprobe - drive a key-value store from the command line
//!
//! ```text
//! kvprobe [OPTIONS] <DB_PATH> <COMMAND>
//! ```
//!
//! Each invocation opens the store at `DB_PATH`, runs one command and closes
//! the store again before the process exits.

mod cli;

use clap::ArgMatches;
use kvprobe::{Harness, StoreOptions};
use tracing::debug;

use cli::utils::logging::init_logging;
use cli::utils::{exit_codes, print_error, validate_db_path, CliResult};
use cli::GlobalOptions;

fn main() {
    let code = run();
    std::process::exit(code);
}

fn run() -> i32 {
    let matches = match cli::build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => {
            // Help and version go to stdout; every parse failure is a usage error
            let _ = e.print();
            return if e.use_stderr() {
                exit_codes::USAGE_ERROR
            } else {
                exit_codes::SUCCESS
            };
        }
    };

    let (Some(path), Some((name, sub))) = (matches.get_one::<String>("path"), matches.subcommand())
    else {
        let _ = cli::build_cli().print_help();
        return exit_codes::USAGE_ERROR;
    };

    let global = GlobalOptions::from_matches(sub);
    init_logging(global.verbosity, global.is_json());

    match execute(path, name, sub, &global) {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            debug!(category = e.category(), command = name, "command failed");
            print_error(&e.to_string());
            e.exit_code()
        }
    }
}

/// Open, run one command, close. The harness is dropped on return.
fn execute(path: &str, name: &str, sub: &ArgMatches, global: &GlobalOptions) -> CliResult<()> {
    validate_db_path(path)?;
    let harness = Harness::open(path, StoreOptions::default())?;
    cli::run(&harness, global, name, sub)
}
