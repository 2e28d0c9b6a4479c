//! VM translator entry point.
//!
//! # Usage
//! ```bash
//! vm-translator <input.vm>     # translates one file to <input>.asm
//! vm-translator <directory>    # concatenates all .vm files into <dirname>.asm
//! ```
//!
//! Directory mode prepends the bootstrap when one of the inputs defines
//! `Sys.init`. Exits non-zero on the first parse failure.

#![warn(clippy::all, clippy::pedantic)]

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: {} <input.vm | directory>", args[0]);
        process::exit(1);
    }

    let input = Path::new(&args[1]);
    match run(input) {
        Ok(output) => println!("Translated {} -> {}", input.display(), output.display()),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn run(input: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let directory_mode = input.is_dir();
    let (units, output) = if directory_mode {
        (collect_directory(input)?, directory_output(input))
    } else {
        let stem = file_stem(input)?;
        let source = fs::read_to_string(input)?;
        (vec![(stem, source)], input.with_extension("asm"))
    };

    let asm = vm_translator::translate(&units, directory_mode)?;
    fs::write(&output, asm)?;
    Ok(output)
}

/// Reads every `.vm` file in the directory, sorted by name so the output
/// is deterministic.
fn collect_directory(dir: &Path) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension() == Some(OsStr::new("vm")))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(format!("no .vm files in {}", dir.display()).into());
    }

    let mut units = Vec::with_capacity(paths.len());
    for path in paths {
        units.push((file_stem(&path)?, fs::read_to_string(&path)?));
    }
    Ok(units)
}

/// Output path for directory mode: `<dir>/<dirname>.asm`.
fn directory_output(dir: &Path) -> PathBuf {
    let name = dir
        .file_name()
        .map_or_else(|| "out".to_string(), |n| n.to_string_lossy().into_owned());
    dir.join(format!("{name}.asm"))
}

fn file_stem(path: &Path) -> Result<String, Box<dyn std::error::Error>> {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| format!("cannot derive file stem from {}", path.display()).into())
}
