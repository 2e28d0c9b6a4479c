//! Emission of Hack assembly for VM commands.
//!
//! The writer owns the output stream and the translation state: the
//! current file name (for `static` symbols), the current function name
//! (for label scoping) and a counter for generated labels. Each command's
//! expansion is preceded by a `// <command>` comment line; the assembler
//! ignores comments, so the annotated output assembles unchanged.

use crate::parser::{Arithmetic, Command, Segment};
use std::io::{self, Write};

// Emits a block of fixed assembly lines.
macro_rules! write_asm {
    ($writer:expr, $($line:literal)*) => {
        $writer.write_all(concat!($($line, "\n"),*).as_bytes())
    };
}

/// Base RAM address of the `temp` segment (R5..R12).
const TEMP_BASE: u16 = 5;

pub struct CodeWriter<W: Write> {
    out: W,
    /// Stem of the file being translated, prefixed onto static symbols
    filename: String,
    /// Enclosing `function` name, prefixed onto branch labels
    function: String,
    label_counter: usize,
}

impl<W: Write> CodeWriter<W> {
    pub fn new(out: W) -> Self {
        CodeWriter {
            out,
            filename: String::new(),
            function: String::new(),
            label_counter: 0,
        }
    }

    /// Announces the translation unit; `static i` lowers to `@{stem}.{i}`.
    pub fn set_filename(&mut self, stem: &str) {
        self.filename.clear();
        self.filename.push_str(stem);
    }

    /// Writes the boot sequence: `SP = 256` then `call Sys.init 0`.
    pub fn write_bootstrap(&mut self) -> io::Result<()> {
        writeln!(self.out, "// bootstrap")?;
        write_asm!(self.out,
            "@256"
            "D=A"
            "@SP"
            "M=D"
        )?;
        self.write_call("Sys.init", 0)
    }

    /// Translates one command.
    pub fn write_command(&mut self, command: &Command) -> io::Result<()> {
        writeln!(self.out, "// {command}")?;
        match command {
            Command::Arithmetic(op) => self.write_arithmetic(*op),
            Command::Push(segment, index) => self.write_push(*segment, *index),
            Command::Pop(segment, index) => self.write_pop(*segment, *index),
            Command::Label(label) => self.write_label(label),
            Command::Goto(label) => self.write_goto(label),
            Command::IfGoto(label) => self.write_if_goto(label),
            Command::Function(name, n_locals) => self.write_function(name, *n_locals),
            Command::Call(name, n_args) => self.write_call(name, *n_args),
            Command::Return => self.write_return(),
        }
    }

    /// Flushes the underlying stream.
    pub fn close(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    fn write_arithmetic(&mut self, op: Arithmetic) -> io::Result<()> {
        match op {
            // Binary ops compute in place at the new stack top, with y in D
            Arithmetic::Add => self.write_binary("M=D+M"),
            Arithmetic::Sub => self.write_binary("M=M-D"),
            Arithmetic::And => self.write_binary("M=D&M"),
            Arithmetic::Or => self.write_binary("M=D|M"),
            // Unary ops rewrite the top slot directly
            Arithmetic::Neg => self.write_unary("M=-M"),
            Arithmetic::Not => self.write_unary("M=!M"),
            Arithmetic::Eq => self.write_comparison("EQ", "JEQ"),
            Arithmetic::Gt => self.write_comparison("GT", "JGT"),
            Arithmetic::Lt => self.write_comparison("LT", "JLT"),
        }
    }

    fn write_binary(&mut self, operation: &str) -> io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "AM=M-1"
            "D=M"
            "A=A-1"
        )?;
        writeln!(self.out, "{operation}")
    }

    fn write_unary(&mut self, operation: &str) -> io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "A=M-1"
        )?;
        writeln!(self.out, "{operation}")
    }

    /// Compares x (below) to y (top): computes x-y, branches on the signed
    /// condition and stores all-ones for true, zero for false.
    fn write_comparison(&mut self, prefix: &str, jump: &str) -> io::Result<()> {
        let true_label = self.fresh_label(prefix, "TRUE");
        let end_label = self.fresh_label(prefix, "END");
        self.label_counter += 1;

        write_asm!(self.out,
            "@SP"
            "AM=M-1"
            "D=M"
            "A=A-1"
            "D=M-D"
        )?;
        writeln!(self.out, "@{true_label}")?;
        writeln!(self.out, "D;{jump}")?;
        write_asm!(self.out,
            "@SP"
            "A=M-1"
            "M=0"
        )?;
        writeln!(self.out, "@{end_label}")?;
        writeln!(self.out, "0;JMP")?;
        writeln!(self.out, "({true_label})")?;
        write_asm!(self.out,
            "@SP"
            "A=M-1"
            "M=-1"
        )?;
        writeln!(self.out, "({end_label})")
    }

    fn write_push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        match segment {
            Segment::Constant => {
                writeln!(self.out, "@{index}")?;
                writeln!(self.out, "D=A")?;
            }
            Segment::Argument | Segment::Local | Segment::This | Segment::That => {
                writeln!(self.out, "@{}", base_register(segment))?;
                writeln!(self.out, "D=M")?;
                writeln!(self.out, "@{index}")?;
                writeln!(self.out, "A=D+A")?;
                writeln!(self.out, "D=M")?;
            }
            Segment::Temp => {
                writeln!(self.out, "@{}", TEMP_BASE + index)?;
                writeln!(self.out, "D=M")?;
            }
            Segment::Pointer => {
                writeln!(self.out, "@{}", pointer_register(index))?;
                writeln!(self.out, "D=M")?;
            }
            Segment::Static => {
                writeln!(self.out, "@{}.{index}", self.filename)?;
                writeln!(self.out, "D=M")?;
            }
        }
        self.write_push_d()
    }

    fn write_pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        match segment {
            Segment::Argument | Segment::Local | Segment::This | Segment::That => {
                // Target address first, via R13, so the pop is one pass
                writeln!(self.out, "@{}", base_register(segment))?;
                writeln!(self.out, "D=M")?;
                writeln!(self.out, "@{index}")?;
                writeln!(self.out, "D=D+A")?;
                write_asm!(self.out,
                    "@R13"
                    "M=D"
                )?;
                self.write_pop_to_d()?;
                write_asm!(self.out,
                    "@R13"
                    "A=M"
                    "M=D"
                )
            }
            Segment::Temp => {
                self.write_pop_to_d()?;
                writeln!(self.out, "@{}", TEMP_BASE + index)?;
                writeln!(self.out, "M=D")
            }
            Segment::Pointer => {
                self.write_pop_to_d()?;
                writeln!(self.out, "@{}", pointer_register(index))?;
                writeln!(self.out, "M=D")
            }
            Segment::Static => {
                self.write_pop_to_d()?;
                writeln!(self.out, "@{}.{index}", self.filename)?;
                writeln!(self.out, "M=D")
            }
            Segment::Constant => unreachable!("rejected by the parser"),
        }
    }

    fn write_label(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "({}${label})", self.function)
    }

    fn write_goto(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.out, "@{}${label}", self.function)?;
        writeln!(self.out, "0;JMP")
    }

    /// Pops the stack top and jumps when it is nonzero.
    fn write_if_goto(&mut self, label: &str) -> io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "AM=M-1"
            "D=M"
        )?;
        writeln!(self.out, "@{}${label}", self.function)?;
        writeln!(self.out, "D;JNE")
    }

    fn write_function(&mut self, name: &str, n_locals: u16) -> io::Result<()> {
        self.function.clear();
        self.function.push_str(name);
        writeln!(self.out, "({name})")?;
        for _ in 0..n_locals {
            write_asm!(self.out,
                "@SP"
                "A=M"
                "M=0"
                "@SP"
                "M=M+1"
            )?;
        }
        Ok(())
    }

    /// Saves the five-word frame `[RET, LCL, ARG, THIS, THAT]`, repositions
    /// ARG and LCL, and jumps to the callee.
    fn write_call(&mut self, name: &str, n_args: u16) -> io::Result<()> {
        let return_label = self.fresh_label("RET", "");
        self.label_counter += 1;

        // Push the return address (a code location, hence D=A)
        writeln!(self.out, "@{return_label}")?;
        writeln!(self.out, "D=A")?;
        self.write_push_d()?;

        // Push the caller's pointers
        for register in ["LCL", "ARG", "THIS", "THAT"] {
            writeln!(self.out, "@{register}")?;
            writeln!(self.out, "D=M")?;
            self.write_push_d()?;
        }

        // ARG = SP - 5 - n_args
        write_asm!(self.out,
            "@SP"
            "D=M"
            "@5"
            "D=D-A"
        )?;
        writeln!(self.out, "@{n_args}")?;
        write_asm!(self.out,
            "D=D-A"
            "@ARG"
            "M=D"
        )?;

        // LCL = SP
        write_asm!(self.out,
            "@SP"
            "D=M"
            "@LCL"
            "M=D"
        )?;

        writeln!(self.out, "@{name}")?;
        writeln!(self.out, "0;JMP")?;
        writeln!(self.out, "({return_label})")
    }

    /// Unwinds the frame saved by `write_call`.
    ///
    /// R13 holds the frame base while it is consumed, R14 the return
    /// address (which `*ARG = pop()` may overwrite when the callee took no
    /// arguments).
    fn write_return(&mut self) -> io::Result<()> {
        self.function.clear();
        write_asm!(self.out,
            // R13 = frame
            "@LCL"
            "D=M"
            "@R13"
            "M=D"
            // R14 = *(frame - 5)
            "@5"
            "A=D-A"
            "D=M"
            "@R14"
            "M=D"
            // *ARG = pop()
            "@SP"
            "AM=M-1"
            "D=M"
            "@ARG"
            "A=M"
            "M=D"
            // SP = ARG + 1
            "@ARG"
            "D=M+1"
            "@SP"
            "M=D"
            // THAT = *(frame - 1)
            "@R13"
            "AM=M-1"
            "D=M"
            "@THAT"
            "M=D"
            // THIS = *(frame - 2)
            "@R13"
            "AM=M-1"
            "D=M"
            "@THIS"
            "M=D"
            // ARG = *(frame - 3)
            "@R13"
            "AM=M-1"
            "D=M"
            "@ARG"
            "M=D"
            // LCL = *(frame - 4)
            "@R13"
            "AM=M-1"
            "D=M"
            "@LCL"
            "M=D"
            // jump to R14
            "@R14"
            "A=M"
            "0;JMP"
        )
    }

    /// Pushes D and advances SP.
    fn write_push_d(&mut self) -> io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "A=M"
            "M=D"
            "@SP"
            "M=M+1"
        )
    }

    /// Pops the stack top into D.
    fn write_pop_to_d(&mut self) -> io::Result<()> {
        write_asm!(self.out,
            "@SP"
            "AM=M-1"
            "D=M"
        )
    }

    /// A label unique within this output, e.g. `EQ_TRUE_3` or `RET_7`.
    ///
    /// The caller bumps `label_counter` once per command so paired labels
    /// share a number.
    fn fresh_label(&self, prefix: &str, role: &str) -> String {
        if role.is_empty() {
            format!("{prefix}_{}", self.label_counter)
        } else {
            format!("{prefix}_{role}_{}", self.label_counter)
        }
    }
}

/// Register holding the base of a pointer-backed segment.
const fn base_register(segment: Segment) -> &'static str {
    match segment {
        Segment::Argument => "ARG",
        Segment::Local => "LCL",
        Segment::This => "THIS",
        Segment::That => "THAT",
        _ => unreachable!(),
    }
}

/// `pointer 0` is THIS, `pointer 1` is THAT.
const fn pointer_register(index: u16) -> &'static str {
    match index {
        0 => "THIS",
        _ => "THAT",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    /// Translates a VM snippet into ASM text, without bootstrap.
    fn translate(source: &str) -> String {
        let mut out = Vec::new();
        let mut writer = CodeWriter::new(&mut out);
        writer.set_filename("Test");
        for command in parse_source(source).unwrap() {
            writer.write_command(&command).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    /// The ASM lines of a snippet, with comment lines removed.
    fn asm_lines(source: &str) -> Vec<String> {
        translate(source)
            .lines()
            .filter(|l| !l.starts_with("//"))
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_push_constant() {
        assert_eq!(
            asm_lines("push constant 7"),
            ["@7", "D=A", "@SP", "A=M", "M=D", "@SP", "M=M+1"]
        );
    }

    #[test]
    fn test_push_local() {
        assert_eq!(
            asm_lines("push local 3"),
            ["@LCL", "D=M", "@3", "A=D+A", "D=M", "@SP", "A=M", "M=D", "@SP", "M=M+1"]
        );
    }

    #[test]
    fn test_pop_argument() {
        assert_eq!(
            asm_lines("pop argument 2"),
            [
                "@ARG", "D=M", "@2", "D=D+A", "@R13", "M=D", "@SP", "AM=M-1", "D=M", "@R13",
                "A=M", "M=D"
            ]
        );
    }

    #[test]
    fn test_temp_window_uses_r5_base() {
        assert_eq!(
            asm_lines("push temp 0")[0],
            "@5",
            "temp 0 must resolve to R5"
        );
        assert_eq!(asm_lines("push temp 7")[0], "@12");
        assert_eq!(asm_lines("pop temp 3")[3], "@8");
    }

    #[test]
    fn test_pointer_window() {
        assert_eq!(asm_lines("push pointer 0")[0], "@THIS");
        assert_eq!(asm_lines("push pointer 1")[0], "@THAT");
        assert_eq!(asm_lines("pop pointer 1")[3], "@THAT");
    }

    #[test]
    fn test_static_uses_file_stem() {
        assert_eq!(asm_lines("push static 4")[0], "@Test.4");
        assert_eq!(asm_lines("pop static 0")[3], "@Test.0");
    }

    #[test]
    fn test_add_in_place() {
        assert_eq!(
            asm_lines("add"),
            ["@SP", "AM=M-1", "D=M", "A=A-1", "M=D+M"]
        );
    }

    #[test]
    fn test_unary_in_place() {
        assert_eq!(asm_lines("neg"), ["@SP", "A=M-1", "M=-M"]);
        assert_eq!(asm_lines("not"), ["@SP", "A=M-1", "M=!M"]);
    }

    #[test]
    fn test_comparison_labels_unique() {
        let asm = translate("eq\neq\nlt\n");
        assert!(asm.contains("(EQ_TRUE_0)"));
        assert!(asm.contains("(EQ_TRUE_1)"));
        assert!(asm.contains("(LT_TRUE_2)"));
        // No label is defined twice
        let mut defined: Vec<&str> = asm.lines().filter(|l| l.starts_with('(')).collect();
        let total = defined.len();
        defined.sort_unstable();
        defined.dedup();
        assert_eq!(defined.len(), total);
    }

    #[test]
    fn test_labels_scoped_by_function() {
        let asm = translate("function Foo.bar 0\nlabel WHILE\ngoto WHILE\nif-goto WHILE\n");
        assert!(asm.contains("(Foo.bar$WHILE)"));
        assert!(asm.contains("@Foo.bar$WHILE"));
    }

    #[test]
    fn test_function_scope_resets_on_return() {
        let asm = translate("function Foo.bar 0\nreturn\nlabel AFTER\n");
        assert!(asm.contains("($AFTER)"));
    }

    #[test]
    fn test_function_initializes_locals() {
        let lines = asm_lines("function Foo.bar 2");
        assert_eq!(lines[0], "(Foo.bar)");
        // Two locals pushed as zeros
        assert_eq!(lines[1..].iter().filter(|l| *l == "M=0").count(), 2);
    }

    #[test]
    fn test_call_frame_order() {
        let asm = translate("call Foo.bar 2");
        // Return address first, then LCL, ARG, THIS, THAT
        let pushes: Vec<usize> = ["@RET_0", "@LCL", "@ARG", "@THIS", "@THAT"]
            .iter()
            .map(|needle| asm.find(*needle).unwrap())
            .collect();
        assert!(pushes.windows(2).all(|w| w[0] < w[1]));
        assert!(asm.contains("(RET_0)"));
        assert!(asm.ends_with("(RET_0)\n"));
    }

    #[test]
    fn test_if_goto_pops_and_tests_nonzero() {
        let lines = asm_lines("function F 0\nif-goto X");
        let tail = &lines[lines.len() - 5..];
        assert_eq!(tail, ["@SP", "AM=M-1", "D=M", "@F$X", "D;JNE"]);
    }

    #[test]
    fn test_bootstrap_sets_sp_then_calls_sys_init() {
        let mut out = Vec::new();
        let mut writer = CodeWriter::new(&mut out);
        writer.write_bootstrap().unwrap();
        let asm = String::from_utf8(out).unwrap();
        let sp = asm.find("@256").unwrap();
        let call = asm.find("@Sys.init").unwrap();
        assert!(sp < call);
    }
}
