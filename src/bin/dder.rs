//! `dder`: decode BER/DER files and pretty-print them as text.

use clap::Parser;
use der_text::text::{pretty_with, PrettyOptions};
use der_text::{ber, sniff};
use std::io::Read;
use std::process::ExitCode;

/// Decode DER/BER objects (raw, Base64 or PEM) and print them in the
/// parenthesised text format.
#[derive(Parser)]
#[command(name = "dder", version, about)]
struct Args {
    /// Print OIDs numerically instead of by name
    #[arg(short = 'n')]
    numeric: bool,

    /// Indentation prefix per nesting level, or "none" for single-line
    /// output without comments
    #[arg(short = 'i', default_value = "    ")]
    indent: String,

    /// Input files; `-` or no file reads stdin
    files: Vec<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    let options = PrettyOptions {
        numeric_oid: args.numeric,
        indent: if args.indent == "none" {
            None
        } else {
            Some(args.indent.clone())
        },
    };
    let files = if args.files.is_empty() {
        vec!["-".to_string()]
    } else {
        args.files.clone()
    };
    for file in &files {
        if let Err(message) = dump(file, &options) {
            eprintln!("dder: {}: {}", file, message);
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

fn dump(file: &str, options: &PrettyOptions) -> Result<(), String> {
    let raw = read_input(file)?;
    let ber_bytes = sniff::extract_ber(&raw).ok_or("no BER object found")?;
    let element = ber::decode(&ber_bytes).map_err(|e| e.to_string())?;
    let text = pretty_with(&element, options).map_err(|e| e.to_string())?;
    println!("{}", text);
    Ok(())
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
