//! pytrace — execute a compiled container and write an instruction trace.
//!
//! Exit codes:
//! - 0: Success
//! - 1: Usage, input, or trace output error
//! - 2: Container format error
//! - 3: Traced program failed at runtime

mod commands;

use std::process;

fn main() {
    let args: Vec<String> = std::env::args().collect();

    if args.len() >= 2 && matches!(args[1].as_str(), "--help" | "-h" | "help") {
        print_usage();
        process::exit(0);
    }
    if args.len() < 3 {
        print_usage();
        process::exit(1);
    }

    if let Err(code) = commands::trace(&args[1..]) {
        process::exit(code);
    }
}

fn print_usage() {
    eprintln!("Usage: pytrace <input.pyc> <trace-file> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --trace all|only   Trace every code object, or one by name (default: all)");
    eprintln!("  --name NAME        Code object name to trace (required with --trace only)");
    eprintln!("  --resolve          Resolve operands against the symbol tables");
}
