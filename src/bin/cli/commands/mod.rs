//! CLI command modules
//!
//! - kv: point operations and range scans (put, get, delete, scan)
//! - batch: bulk load from a file
//! - admin: store statistics
//! - bench: write/read throughput test

pub mod admin;
pub mod batch;
pub mod bench;
pub mod kv;
