//! Jack compiler entry point.
//!
//! # Usage
//! ```bash
//! jack-compiler <input.jack>   # compiles one class to <input>.vm
//! jack-compiler <directory>    # compiles every .jack file in the directory
//! ```
//!
//! Each `.jack` file produces a `.vm` file beside it. Exits non-zero on
//! the first failing file.

#![warn(clippy::all, clippy::pedantic)]

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.jack | directory>", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);
    let files = match collect_inputs(input) {
        Ok(files) => files,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    for file in files {
        if let Err(e) = compile_file(&file) {
            eprintln!("error: {}: {e}", file.display());
            process::exit(1);
        }
        println!(
            "Compiled {} -> {}",
            file.display(),
            file.with_extension("vm").display()
        );
    }
}

/// One `.jack` file, or every `.jack` file in a directory, sorted by name.
fn collect_inputs(input: &Path) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    if !input.is_dir() {
        return Ok(vec![input.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = fs::read_dir(input)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension() == Some(OsStr::new("jack")))
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(format!("no .jack files in {}", input.display()).into());
    }
    Ok(files)
}

fn compile_file(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let source = fs::read_to_string(path)?;
    let mut out = Vec::new();
    jack_compiler::compile(&source, &mut out)?;
    fs::write(path.with_extension("vm"), out)?;
    Ok(())
}
