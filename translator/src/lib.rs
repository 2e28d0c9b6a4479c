//! VM-to-Hack translator.
//!
//! Lowers the stack-machine intermediate representation (`.vm`) to Hack
//! assembly (`.asm`).
//!
//! # Architecture
//!
//! - [`parser`]: turns each VM line into a typed [`Command`]
//! - [`code_writer`]: emits the Hack expansion of each command and owns
//!   the translation state (static prefix, function scope, label counter)
//!
//! Every translation unit is parsed completely before any assembly is
//! emitted; a parse error therefore produces no output at all. In
//! directory mode the boot sequence (`SP = 256; call Sys.init 0`) is
//! prepended, but only when one of the units actually defines `Sys.init`.
//!
//! # Example
//!
//! ```rust
//! let asm = vm_translator::translate(
//!     &[("Main".to_string(), "push constant 7\npush constant 8\nadd\n".to_string())],
//!     false,
//! )
//! .unwrap();
//! assert!(asm.contains("M=D+M"));
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod code_writer;
pub mod parser;

use std::fmt;
use std::io;

pub use code_writer::CodeWriter;
pub use parser::{Arithmetic, Command, Segment, VmParseError};

/// A translation failure: either a malformed command (attributed to its
/// file) or an output stream error.
#[derive(Debug)]
pub enum TranslateError {
    Parse { file: String, error: VmParseError },
    Io(io::Error),
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { file, error } => write!(f, "{file}: {error}"),
            Self::Io(e) => write!(f, "output error: {e}"),
        }
    }
}

impl std::error::Error for TranslateError {}

impl From<io::Error> for TranslateError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// Translates a set of `(stem, source)` units into one assembly text.
///
/// `directory_mode` selects the multi-file contract: units are emitted in
/// the given order and the bootstrap is prepended when some unit defines
/// `Sys.init`. Single-file mode never emits the bootstrap.
///
/// # Errors
/// Returns the first parse error (attributed to its unit) or an output
/// error.
pub fn translate(units: &[(String, String)], directory_mode: bool) -> Result<String, TranslateError> {
    // Parse everything first; emission starts only on fully valid input
    let mut parsed = Vec::with_capacity(units.len());
    for (stem, source) in units {
        let commands = parser::parse_source(source).map_err(|error| TranslateError::Parse {
            file: stem.clone(),
            error,
        })?;
        parsed.push((stem, commands));
    }

    let bootstrap = directory_mode
        && parsed.iter().any(|(_, commands)| {
            commands
                .iter()
                .any(|c| matches!(c, Command::Function(name, _) if name == "Sys.init"))
        });

    let mut out = Vec::new();
    let mut writer = CodeWriter::new(&mut out);
    if bootstrap {
        writer.write_bootstrap()?;
    }
    for (stem, commands) in &parsed {
        writer.set_filename(stem);
        for command in commands {
            writer.write_command(command)?;
        }
    }
    writer.close()?;

    Ok(String::from_utf8(out).expect("emitted assembly is ASCII"))
}
