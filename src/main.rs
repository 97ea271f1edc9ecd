//! Myrmex - a command-line driver for declarative builds
//!
//! Parses single-dash flags, locates the build description, wires loggers
//! and listeners to the engine and runs the requested targets.
//!
//! ## Architecture
//!
//! ```text
//! cli → launcher → logging/loader → engine (project, helper) → catalog
//! ```

mod catalog;
mod cli;
mod config;
mod engine;
mod error;
mod launcher;
mod loader;
mod logging;
mod output;
mod utils;
mod version;

use std::env;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    match launcher::start(&args, None, None) {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}
