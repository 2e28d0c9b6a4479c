//! Jack lexer.
//!
//! A cursor over the source text: [`Tokenizer::advance`] strips
//! whitespace and comments, then selects the next token by longest match.
//! Keywords are recognized only as whole words, so `classified` lexes as
//! one identifier rather than `class` + `ified`.

use phf::phf_map;
use std::fmt;

/// The reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "constructor" => Keyword::Constructor,
    "function" => Keyword::Function,
    "method" => Keyword::Method,
    "field" => Keyword::Field,
    "static" => Keyword::Static,
    "var" => Keyword::Var,
    "int" => Keyword::Int,
    "char" => Keyword::Char,
    "boolean" => Keyword::Boolean,
    "void" => Keyword::Void,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
};

impl Keyword {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Constructor => "constructor",
            Self::Function => "function",
            Self::Method => "method",
            Self::Field => "field",
            Self::Static => "static",
            Self::Var => "var",
            Self::Int => "int",
            Self::Char => "char",
            Self::Boolean => "boolean",
            Self::Void => "void",
            Self::True => "true",
            Self::False => "false",
            Self::Null => "null",
            Self::This => "this",
            Self::Let => "let",
            Self::Do => "do",
            Self::If => "if",
            Self::Else => "else",
            Self::While => "while",
            Self::Return => "return",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Characters that form single-character symbol tokens.
const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~";

/// Largest Jack integer constant.
pub const MAX_INT: u16 = 32767;

/// One lexical token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Keyword(Keyword),
    Symbol(char),
    IntConst(u16),
    StringConst(String),
    Identifier(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(k) => write!(f, "keyword `{k}`"),
            Self::Symbol(c) => write!(f, "symbol `{c}`"),
            Self::IntConst(n) => write!(f, "integer constant {n}"),
            Self::StringConst(s) => write!(f, "string constant \"{s}\""),
            Self::Identifier(s) => write!(f, "identifier `{s}`"),
        }
    }
}

/// Lexing failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    /// A character no token rule matches
    UnexpectedChar(char),
    /// A string constant with no closing quote on its line
    UnterminatedString,
    /// A `/*` comment with no closing `*/`
    UnterminatedComment,
    /// An integer literal above [`MAX_INT`]
    IntOutOfRange(String),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedChar(c) => write!(f, "unexpected character `{c}`"),
            Self::UnterminatedString => f.write_str("unterminated string constant"),
            Self::UnterminatedComment => f.write_str("unterminated comment"),
            Self::IntOutOfRange(lit) => {
                write!(f, "integer constant {lit} exceeds {MAX_INT}")
            }
        }
    }
}

impl std::error::Error for LexError {}

/// Cursor over Jack source.
///
/// `current` holds the token under the cursor; `advance` replaces it with
/// the next one, or `None` at end of input. Tokens are handed out once
/// and consumed by the parser.
pub struct Tokenizer<'a> {
    rest: &'a str,
    current: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    /// Creates a cursor positioned on the first token.
    pub fn new(source: &'a str) -> Result<Self, LexError> {
        let mut tokenizer = Tokenizer {
            rest: source,
            current: None,
        };
        tokenizer.advance()?;
        Ok(tokenizer)
    }

    /// The token under the cursor, or `None` past the end.
    #[must_use]
    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    /// Takes the current token, moving the cursor forward.
    pub fn take(&mut self) -> Result<Option<Token>, LexError> {
        let token = self.current.take();
        self.advance()?;
        Ok(token)
    }

    /// Moves the cursor to the next token.
    pub fn advance(&mut self) -> Result<(), LexError> {
        self.skip_trivia()?;
        if self.rest.is_empty() {
            self.current = None;
            return Ok(());
        }

        let ch = self.rest.chars().next().expect("rest is non-empty");
        self.current = Some(if SYMBOLS.contains(ch) {
            self.rest = &self.rest[ch.len_utf8()..];
            Token::Symbol(ch)
        } else if ch.is_ascii_digit() {
            self.lex_int()?
        } else if ch == '"' {
            self.lex_string()?
        } else if ch == '_' || ch.is_ascii_alphabetic() {
            self.lex_word()
        } else {
            return Err(LexError::UnexpectedChar(ch));
        });
        Ok(())
    }

    /// Skips whitespace and both comment forms (`//` and `/* .. */`,
    /// which covers `/** doc */` as well).
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            self.rest = self.rest.trim_start();
            if let Some(after) = self.rest.strip_prefix("//") {
                self.rest = after.split_once('\n').map_or("", |(_, tail)| tail);
            } else if let Some(after) = self.rest.strip_prefix("/*") {
                let end = after.find("*/").ok_or(LexError::UnterminatedComment)?;
                self.rest = &after[end + 2..];
            } else {
                return Ok(());
            }
        }
    }

    fn lex_int(&mut self) -> Result<Token, LexError> {
        let len = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        let digits = &self.rest[..len];
        let value = digits
            .parse::<u16>()
            .ok()
            .filter(|&v| v <= MAX_INT)
            .ok_or_else(|| LexError::IntOutOfRange(digits.to_string()))?;
        self.rest = &self.rest[len..];
        Ok(Token::IntConst(value))
    }

    fn lex_string(&mut self) -> Result<Token, LexError> {
        let body = &self.rest[1..];
        let end = body
            .find(['"', '\n'])
            .filter(|&i| body.as_bytes()[i] == b'"')
            .ok_or(LexError::UnterminatedString)?;
        let value = body[..end].to_string();
        self.rest = &body[end + 1..];
        Ok(Token::StringConst(value))
    }

    fn lex_word(&mut self) -> Token {
        let len = self
            .rest
            .find(|c: char| !(c == '_' || c.is_ascii_alphanumeric()))
            .unwrap_or(self.rest.len());
        let word = &self.rest[..len];
        self.rest = &self.rest[len..];
        KEYWORDS
            .get(word)
            .map_or_else(|| Token::Identifier(word.to_string()), |&k| Token::Keyword(k))
    }
}

/// Lexes a whole source into a token list. Test and tooling convenience;
/// the compilation engine drives the cursor directly.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut tokenizer = Tokenizer::new(source)?;
    let mut tokens = Vec::new();
    while let Some(token) = tokenizer.take()? {
        tokens.push(token);
    }
    Ok(tokens)
}
