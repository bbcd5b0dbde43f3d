//! CLI utilities module
//!
//! Shared validation, display formatting, error handling and logging
//! setup for CLI commands.

pub mod display;
pub mod error;
pub mod logging;
pub mod validation;

pub use display::*;
pub use error::*;
pub use validation::*;
