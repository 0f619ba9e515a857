//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `entity_core` linkage and print how canon inputs parse.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `entity_cli [--log-dir <abs-dir>] [canon...]`

use entity_core::{core_version, default_log_level, init_logging, Canon, CanonShape};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1).peekable();
    if args.peek().map(String::as_str) == Some("--log-dir") {
        args.next();
        let Some(dir) = args.next() else {
            eprintln!("--log-dir requires a directory");
            return ExitCode::FAILURE;
        };
        if let Err(err) = init_logging(default_log_level(), &dir) {
            eprintln!("{err}");
            return ExitCode::FAILURE;
        }
    }

    println!("entity_core version={}", core_version());

    let mut status = ExitCode::SUCCESS;
    for input in args {
        match Canon::parse(&input) {
            Ok(canon) => println!(
                "{input} => string={} triple={} object={}",
                canon,
                canon.format(CanonShape::Triple),
                canon.format(CanonShape::Object)
            ),
            Err(err) => {
                eprintln!("{err}");
                status = ExitCode::FAILURE;
            }
        }
    }
    status
}
