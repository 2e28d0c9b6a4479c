//! Parsing of VM intermediate-representation lines.
//!
//! Each significant line becomes one typed [`Command`]. A whole file is
//! parsed up front; code emission never starts on a partially parsed
//! input.

use std::fmt;

/// The eight virtual memory segments.
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

impl Segment {
    fn from_str(name: &str) -> Option<Self> {
        match name {
            "constant" => Some(Self::Constant),
            "argument" => Some(Self::Argument),
            "local" => Some(Self::Local),
            "static" => Some(Self::Static),
            "this" => Some(Self::This),
            "that" => Some(Self::That),
            "pointer" => Some(Self::Pointer),
            "temp" => Some(Self::Temp),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Argument => "argument",
            Self::Local => "local",
            Self::Static => "static",
            Self::This => "this",
            Self::That => "that",
            Self::Pointer => "pointer",
            Self::Temp => "temp",
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The nine stack arithmetic and logic operations.
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

impl Arithmetic {
    fn from_str(verb: &str) -> Option<Self> {
        match verb {
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "neg" => Some(Self::Neg),
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            _ => None,
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
        }
    }
}

impl fmt::Display for Arithmetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One VM command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Arithmetic(Arithmetic),
    Push(Segment, u16),
    Pop(Segment, u16),
    Label(String),
    Goto(String),
    IfGoto(String),
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl fmt::Display for Command {
    /// Renders the command in its wire format, e.g. `push constant 17`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arithmetic(op) => write!(f, "{op}"),
            Self::Push(segment, index) => write!(f, "push {segment} {index}"),
            Self::Pop(segment, index) => write!(f, "pop {segment} {index}"),
            Self::Label(label) => write!(f, "label {label}"),
            Self::Goto(label) => write!(f, "goto {label}"),
            Self::IfGoto(label) => write!(f, "if-goto {label}"),
            Self::Function(name, n_locals) => write!(f, "function {name} {n_locals}"),
            Self::Call(name, n_args) => write!(f, "call {name} {n_args}"),
            Self::Return => f.write_str("return"),
        }
    }
}

/// Errors raised while parsing VM source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmParseError {
    UnknownCommand(String),
    UnknownSegment(String),
    MissingArgument(String),
    InvalidIndex(String),
    TrailingTokens(String),
    /// `pointer`/`temp` index outside its fixed RAM window
    IndexOutOfRange(Segment, u16),
    /// `pop constant` has no meaning
    PopConstant,
}

impl fmt::Display for VmParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand(verb) => write!(f, "unknown VM command `{verb}`"),
            Self::UnknownSegment(name) => write!(f, "unknown segment `{name}`"),
            Self::MissingArgument(line) => write!(f, "missing argument in `{line}`"),
            Self::InvalidIndex(token) => write!(f, "invalid numeric argument `{token}`"),
            Self::TrailingTokens(line) => write!(f, "trailing tokens in `{line}`"),
            Self::IndexOutOfRange(segment, index) => {
                write!(f, "index {index} out of range for segment `{segment}`")
            }
            Self::PopConstant => f.write_str("cannot pop to the constant segment"),
        }
    }
}

impl std::error::Error for VmParseError {}

/// Parses a whole VM source text into its command sequence.
///
/// Blank lines and `//` comments are skipped.
///
/// # Errors
/// Returns the first [`VmParseError`] encountered.
pub fn parse_source(source: &str) -> Result<Vec<Command>, VmParseError> {
    source
        .lines()
        .filter_map(|line| {
            let code = line.split("//").next().unwrap_or("").trim();
            if code.is_empty() {
                None
            } else {
                Some(parse_line(code))
            }
        })
        .collect()
}

/// Parses one trimmed, comment-free line.
fn parse_line(line: &str) -> Result<Command, VmParseError> {
    let mut tokens = line.split_whitespace();
    let verb = tokens.next().expect("caller skips blank lines");

    let command = if let Some(op) = Arithmetic::from_str(verb) {
        Command::Arithmetic(op)
    } else {
        match verb {
            "push" | "pop" => {
                let segment = tokens
                    .next()
                    .ok_or_else(|| VmParseError::MissingArgument(line.to_string()))?;
                let segment = Segment::from_str(segment)
                    .ok_or_else(|| VmParseError::UnknownSegment(segment.to_string()))?;
                let index = parse_index(&mut tokens, line)?;
                check_window(segment, index)?;
                if verb == "push" {
                    Command::Push(segment, index)
                } else if segment == Segment::Constant {
                    return Err(VmParseError::PopConstant);
                } else {
                    Command::Pop(segment, index)
                }
            }
            "label" | "goto" | "if-goto" => {
                let label = tokens
                    .next()
                    .ok_or_else(|| VmParseError::MissingArgument(line.to_string()))?
                    .to_string();
                match verb {
                    "label" => Command::Label(label),
                    "goto" => Command::Goto(label),
                    _ => Command::IfGoto(label),
                }
            }
            "function" | "call" => {
                let name = tokens
                    .next()
                    .ok_or_else(|| VmParseError::MissingArgument(line.to_string()))?
                    .to_string();
                let count = parse_index(&mut tokens, line)?;
                if verb == "function" {
                    Command::Function(name, count)
                } else {
                    Command::Call(name, count)
                }
            }
            "return" => Command::Return,
            _ => return Err(VmParseError::UnknownCommand(verb.to_string())),
        }
    };

    if tokens.next().is_some() {
        return Err(VmParseError::TrailingTokens(line.to_string()));
    }
    Ok(command)
}

fn parse_index<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    line: &str,
) -> Result<u16, VmParseError> {
    let token = tokens
        .next()
        .ok_or_else(|| VmParseError::MissingArgument(line.to_string()))?;
    token
        .parse()
        .map_err(|_| VmParseError::InvalidIndex(token.to_string()))
}

/// `pointer` and `temp` index fixed register windows.
fn check_window(segment: Segment, index: u16) -> Result<(), VmParseError> {
    let in_range = match segment {
        Segment::Pointer => index <= 1,
        Segment::Temp => index <= 7,
        _ => true,
    };
    if in_range {
        Ok(())
    } else {
        Err(VmParseError::IndexOutOfRange(segment, index))
    }
}
