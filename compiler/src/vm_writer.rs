//! VM intermediate-representation emitter.
//!
//! One method per command shape; each writes a single well-formed line.
//! The engine never concatenates IR text by hand.

use std::fmt;
use std::io::{self, Write};

/// The eight VM memory segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Constant => "constant",
            Self::Argument => "argument",
            Self::Local => "local",
            Self::Static => "static",
            Self::This => "this",
            Self::That => "that",
            Self::Pointer => "pointer",
            Self::Temp => "temp",
        })
    }
}

/// The nine stack arithmetic and logic commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arithmetic {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Arithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        })
    }
}

/// Writes VM commands to an output stream.
pub struct VmWriter<W: Write> {
    out: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(out: W) -> Self {
        VmWriter { out }
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        writeln!(self.out, "push {segment} {index}")
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        writeln!(self.out, "pop {segment} {index}")
    }

    pub fn write_arithmetic(&mut self, command: Arithmetic) -> io::Result<()> {
        writeln!(self.out, "{command}")
    }

    pub fn write_label(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "label {label}")
    }

    pub fn write_goto(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "goto {label}")
    }

    pub fn write_if(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "if-goto {label}")
    }

    pub fn write_call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        writeln!(self.out, "call {name} {n_args}")
    }

    pub fn write_function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        writeln!(self.out, "function {name} {n_locals}")
    }

    pub fn write_return(&mut self) -> io::Result<()> {
        writeln!(self.out, "return")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture(write: impl FnOnce(&mut VmWriter<&mut Vec<u8>>)) -> String {
        let mut out = Vec::new();
        let mut writer = VmWriter::new(&mut out);
        write(&mut writer);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_command_wire_format() {
        let text = capture(|w| {
            w.write_push(Segment::Constant, 17).unwrap();
            w.write_pop(Segment::Local, 2).unwrap();
            w.write_arithmetic(Arithmetic::Add).unwrap();
            w.write_label("LOOP_0").unwrap();
            w.write_goto("LOOP_0").unwrap();
            w.write_if("ENDLOOP_0").unwrap();
            w.write_call("Math.multiply", 2).unwrap();
            w.write_function("Main.main", 3).unwrap();
            w.write_return().unwrap();
        });
        assert_eq!(
            text,
            "push constant 17\n\
             pop local 2\n\
             add\n\
             label LOOP_0\n\
             goto LOOP_0\n\
             if-goto ENDLOOP_0\n\
             call Math.multiply 2\n\
             function Main.main 3\n\
             return\n"
        );
    }

    #[test]
    fn test_segment_names() {
        let text = capture(|w| {
            for segment in [
                Segment::Constant,
                Segment::Argument,
                Segment::Local,
                Segment::Static,
                Segment::This,
                Segment::That,
                Segment::Pointer,
                Segment::Temp,
            ] {
                w.write_push(segment, 0).unwrap();
            }
        });
        assert_eq!(
            text,
            "push constant 0\npush argument 0\npush local 0\npush static 0\n\
             push this 0\npush that 0\npush pointer 0\npush temp 0\n"
        );
    }
}
