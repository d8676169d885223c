//! CLI command implementation.

use std::fs;
use std::io::BufWriter;

use pytrace_tracer::{TraceFilter, TraceWriter, Tracer};
use pytrace_vm::{HookError, Machine, RuntimeError};

struct Options {
    input: String,
    output: String,
    filter: TraceFilter,
    resolve: bool,
}

/// Parse the argument list. Option errors are reported here, before any
/// file is touched.
fn parse(args: &[String]) -> Result<Options, i32> {
    let mut positional: Vec<&String> = Vec::new();
    let mut mode = "all".to_string();
    let mut name: Option<String> = None;
    let mut resolve = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--trace" => {
                i += 1;
                mode = args.get(i).cloned().ok_or_else(|| {
                    eprintln!("error: --trace requires a value (all|only)");
                    1
                })?;
            }
            "--name" => {
                i += 1;
                name = Some(args.get(i).cloned().ok_or_else(|| {
                    eprintln!("error: --name requires a value");
                    1
                })?);
            }
            "--resolve" => resolve = true,
            other if other.starts_with('-') => {
                eprintln!("error: unknown option '{other}'");
                return Err(1);
            }
            _ => positional.push(&args[i]),
        }
        i += 1;
    }

    if positional.len() != 2 {
        eprintln!("error: expected an input file and a trace file");
        return Err(1);
    }

    let filter = match mode.as_str() {
        "all" => TraceFilter::All,
        "only" => match name {
            Some(name) => TraceFilter::Only(name),
            None => {
                eprintln!("error: --trace only requires --name");
                return Err(1);
            }
        },
        other => {
            eprintln!("error: invalid trace mode '{other}' (expected all|only)");
            return Err(1);
        }
    };

    Ok(Options {
        input: positional[0].clone(),
        output: positional[1].clone(),
        filter,
        resolve,
    })
}

/// Load a container, execute it, and write the trace.
pub fn trace(args: &[String]) -> Result<(), i32> {
    let opts = parse(args)?;

    // The container is loaded in full before the trace file is created, so
    // a format error leaves no output behind.
    let bytes = fs::read(&opts.input).map_err(|e| {
        eprintln!("error: cannot read '{}': {e}", opts.input);
        1
    })?;
    let code = pytrace_loader::load(&bytes).map_err(|e| {
        eprintln!("error: {e}");
        2
    })?;

    let out = fs::File::create(&opts.output).map_err(|e| {
        eprintln!("error: cannot create '{}': {e}", opts.output);
        1
    })?;
    let mut tracer = Tracer::new(
        TraceWriter::new(BufWriter::new(out)),
        opts.filter,
        opts.resolve,
    );

    let result = Machine::new().with_hook(&mut tracer).run(&code);

    // Whatever was traced up to this point stays valid, on every path.
    let flushed = tracer.flush();

    match result {
        // A decode fault in the hook means the container's instruction
        // stream is malformed, not that the trace sink failed.
        Err(RuntimeError::Hook(HookError::Decode(e))) => {
            eprintln!("error: {e}");
            Err(2)
        }
        Err(RuntimeError::Hook(HookError::Output(e))) => {
            eprintln!("error: cannot write trace: {e}");
            Err(1)
        }
        Err(e) => {
            eprintln!("runtime error: {e}");
            Err(3)
        }
        Ok(_) => flushed.map_err(|e| {
            eprintln!("error: cannot write trace: {e}");
            1
        }),
    }
}
