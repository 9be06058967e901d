//! `mder`: build DER from a text specification plus string parameters.

use clap::Parser;
use der_text::text::{build, Value};
use std::io::{Read, Write};
use std::process::ExitCode;

/// Build a DER object from a text specification. Trailing arguments are
/// bound as string parameters to `%0`, `%1`, …
#[derive(Parser)]
#[command(name = "mder", version, about)]
struct Args {
    /// Specification file; `-` reads stdin
    input: String,

    /// Output file for the DER bytes; `-` writes stdout
    output: String,

    /// String parameters for `%0`, `%1`, …
    params: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("mder: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let spec = read_input(&args.input)?;
    let spec = String::from_utf8(spec).map_err(|_| "specification is not UTF-8".to_string())?;
    let params: Vec<Value> = args.params.iter().map(|s| Value::from(s.as_str())).collect();
    let element = build(&spec, &params)
        .map_err(|e| e.to_string())?
        .ok_or("specification built no object")?;
    write_output(&args.output, &element.to_der())
}

fn read_input(file: &str) -> Result<Vec<u8>, String> {
    if file == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .map_err(|e| e.to_string())?;
        Ok(buf)
    } else {
        std::fs::read(file).map_err(|e| e.to_string())
    }
}

fn write_output(file: &str, bytes: &[u8]) -> Result<(), String> {
    if file == "-" {
        std::io::stdout()
            .write_all(bytes)
            .map_err(|e| e.to_string())
    } else {
        std::fs::write(file, bytes).map_err(|e| e.to_string())
    }
}
