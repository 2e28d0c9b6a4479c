//! Hack assembler entry point.
//!
//! # Usage
//! ```bash
//! hack-assembler <input.asm> [output.hack]
//! ```
//!
//! The output path defaults to the input path with its extension replaced
//! by `.hack`. Exits non-zero on any parse or encode failure.

#![warn(clippy::all, clippy::pedantic)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if !(2..=3).contains(&args.len()) {
        eprintln!("Usage: {} <input.asm> [output.hack]", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);
    let output = args
        .get(2)
        .map_or_else(|| input.with_extension("hack"), PathBuf::from);

    if let Err(e) = run(input, &output) {
        eprintln!("error: {e}");
        process::exit(1);
    }

    println!("Assembled {} -> {}", input.display(), output.display());
}

fn run(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(input)?;
    let binary = hack_assembler::assemble(&source)?;
    fs::write(output, binary)?;
    Ok(())
}
