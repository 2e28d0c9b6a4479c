//! Jack compiler.
//!
//! Translates the Jack language (`.jack`) into stack-machine VM commands
//! (`.vm`), one class per file.
//!
//! # Architecture
//!
//! - [`tokenizer`]: lexes source into keywords, symbols, constants and
//!   identifiers
//! - [`symbol_table`]: two-scope identifier table with per-kind indices
//! - [`vm_writer`]: emits well-formed VM command lines
//! - [`engine`]: recursive-descent parser driving the other three
//!
//! # Example
//!
//! ```rust
//! let mut out = Vec::new();
//! jack_compiler::compile("class Main { function int main() { return 1 + 2; } }", &mut out)
//!     .unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "function Main.main 0\npush constant 1\npush constant 2\nadd\nreturn\n"
//! );
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod engine;
pub mod symbol_table;
pub mod tokenizer;
pub mod vm_writer;

pub use engine::{CompilationEngine, CompileError, compile};
pub use symbol_table::{Kind, SymbolTable};
pub use tokenizer::{Keyword, LexError, Token, Tokenizer};
pub use vm_writer::{Segment, VmWriter};
