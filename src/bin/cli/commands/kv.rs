//! Key-value operation commands

use std::ffi::OsString;

use clap::{value_parser, Arg, ArgMatches, Command};
use kvprobe::{Harness, HarnessError, ScanWindow};

use crate::cli::utils::{
    format_kv, format_value, json_error, json_success, print_success, CliResult,
};
use crate::cli::GlobalOptions;

/// Keys and values are taken from argv as raw bytes, UTF-8 or not
fn bytes_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .help(help)
        .value_parser(value_parser!(OsString))
}

fn arg_bytes<'a>(matches: &'a ArgMatches, name: &str) -> Option<&'a [u8]> {
    matches
        .get_one::<OsString>(name)
        .map(|arg| arg.as_encoded_bytes())
}

/// Build the 'put' subcommand
pub fn put_command() -> Command {
    Command::new("put")
        .about("Put a key-value pair")
        .arg(bytes_arg("key", "Key to store").required(true).index(1))
        .arg(bytes_arg("value", "Value to store").required(true).index(2))
}

/// Execute the 'put' command
pub fn run_put(harness: &Harness, global: &GlobalOptions, matches: &ArgMatches) -> CliResult<()> {
    let key = arg_bytes(matches, "key").ok_or("key argument is required")?;
    let value = arg_bytes(matches, "value").ok_or("value argument is required")?;

    harness.put(key, value)?;

    if global.is_json() {
        json_success("put")
            .add_bytes("key", key)
            .add_uint("value_size", value.len() as u64)
            .print();
    } else if !global.quiet {
        print_success(&format!("Put successful: {}", format_kv(key, value)));
    }
    Ok(())
}

/// Build the 'get' subcommand
pub fn get_command() -> Command {
    Command::new("get")
        .about("Get value by key")
        .arg(bytes_arg("key", "Key to retrieve").required(true).index(1))
}

/// Execute the 'get' command
///
/// A missing key is a normal outcome, not a failure.
pub fn run_get(harness: &Harness, global: &GlobalOptions, matches: &ArgMatches) -> CliResult<()> {
    let key = arg_bytes(matches, "key").ok_or("key argument is required")?;

    let value = harness.get(key)?;

    if global.is_json() {
        let mut output = json_success("get");
        output.add_bytes("key", key).add_bool("found", value.is_some());
        if let Some(value) = &value {
            output.add_bytes("value", value).add_uint("size", value.len() as u64);
        }
        output.print();
        return Ok(());
    }

    match value {
        Some(value) => println!("{}", format_kv(key, &value)),
        None => println!("Key not found: {}", format_value(key)),
    }
    Ok(())
}

/// Build the 'delete' subcommand
pub fn delete_command() -> Command {
    Command::new("delete")
        .about("Delete a key")
        .arg(bytes_arg("key", "Key to delete").required(true).index(1))
}

/// Execute the 'delete' command
pub fn run_delete(
    harness: &Harness,
    global: &GlobalOptions,
    matches: &ArgMatches,
) -> CliResult<()> {
    let key = arg_bytes(matches, "key").ok_or("key argument is required")?;

    harness.delete(key)?;

    if global.is_json() {
        json_success("delete").add_bytes("key", key).print();
    } else if !global.quiet {
        print_success(&format!("Delete successful: {}", format_value(key)));
    }
    Ok(())
}

/// Build the 'scan' subcommand
pub fn scan_command() -> Command {
    Command::new("scan")
        .about("Scan database in key order")
        .allow_negative_numbers(true)
        .arg(bytes_arg("start", "First key to visit (empty: from the beginning)").index(1))
        .arg(bytes_arg("end", "Last key to visit, inclusive (empty: no upper bound)").index(2))
        .arg(
            Arg::new("count")
                .help("Maximum number of records (zero or less: none)")
                .index(3)
                .value_parser(value_parser!(i64))
                .default_value("100"),
        )
}

/// Execute the 'scan' command
///
/// Text output streams records as they are visited; on an iterator error
/// the records already printed stay printed and the total is still shown.
pub fn run_scan(harness: &Harness, global: &GlobalOptions, matches: &ArgMatches) -> CliResult<()> {
    let start = arg_bytes(matches, "start").unwrap_or_default();
    let end = arg_bytes(matches, "end").unwrap_or_default();
    let count = *matches
        .get_one::<i64>("count")
        .ok_or("count argument is required")?;

    let window = ScanWindow::new(start, end, count);

    if global.is_json() {
        let mut records = Vec::new();
        let result = harness.scan(&window, |k, v| records.push((k.to_vec(), v.to_vec())));

        let mut output = match &result {
            Ok(_) => json_success("scan"),
            Err(err) => json_error(&err.to_string()),
        };
        output
            .add_uint("count", records.len() as u64)
            .add_kv_array("records", &records)
            .print();
        result?;
        return Ok(());
    }

    if !global.quiet {
        println!("Scanning database:");
    }
    let result = harness.scan(&window, |k, v| println!("  {}", format_kv(k, v)));
    let emitted = match &result {
        Ok(report) => report.emitted,
        Err(HarnessError::Iterator { emitted, .. }) => *emitted,
        Err(_) => 0,
    };
    if !global.quiet {
        println!("Total {} records scanned.", emitted);
    }
    result?;
    Ok(())
}
