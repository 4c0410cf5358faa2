#![forbid(unsafe_code)]

//! `shelf-layout` binary entry point.
//!
//! Reads one detection batch, lays it out, and writes the display text (or a
//! JSON payload) to stdout. Logs go to stderr.

mod batch;
mod cli;

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "SHELF_LOG";
const LOG_JSON_ENV: &str = "SHELF_LOG_JSON";
const DEFAULT_LOG_FILTER: &str = "warn";

fn main() {
    let opts = cli::Opts::parse();
    init_tracing();
    debug!(config = %opts.config.summary_short(), "configuration resolved");

    let input = match read_input(opts.input.as_deref()) {
        Ok(input) => input,
        Err(e) => {
            let source = opts.input.as_deref().unwrap_or("stdin");
            error!(source, error = %e, "failed to read input");
            eprintln!("Failed to read {source}: {e}");
            process::exit(1);
        }
    };

    match batch::run(&opts, &input) {
        Ok(output) => println!("{output}"),
        Err(e) => {
            error!(error = %e, "layout failed");
            eprintln!("{e}");
            process::exit(1);
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let json = env::var(LOG_JSON_ENV)
        .is_ok_and(|val| val == "1" || val.eq_ignore_ascii_case("true"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) if path != "-" => fs::read_to_string(path),
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
