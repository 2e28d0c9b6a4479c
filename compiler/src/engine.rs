//! Recursive-descent compilation of Jack to VM commands.
//!
//! The engine owns the token cursor, the symbol table and the VM writer;
//! each `compile_*` method consumes the tokens of one grammar production
//! and emits its translation. Expressions evaluate strictly left to
//! right; there is no operator precedence.

use crate::symbol_table::{AlreadyDefined, Entry, Kind, SymbolTable};
use crate::tokenizer::{Keyword, LexError, Token, Tokenizer};
use crate::vm_writer::{Arithmetic, Segment, VmWriter};
use std::fmt;
use std::io::{self, Write};

/// Compilation failures.
///
/// Lexer and I/O errors pass through unchanged; the engine's own failures
/// carry what was expected against what was found.
#[derive(Debug)]
pub enum CompileError {
    Lex(LexError),
    Io(io::Error),
    Unexpected { expected: String, found: String },
    Undeclared(String),
    Redefined(String),
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lex(e) => write!(f, "{e}"),
            Self::Io(e) => write!(f, "{e}"),
            Self::Unexpected { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::Undeclared(name) => write!(f, "undeclared identifier `{name}`"),
            Self::Redefined(name) => {
                write!(f, "`{name}` is declared twice in the same scope")
            }
        }
    }
}

impl std::error::Error for CompileError {}

impl From<LexError> for CompileError {
    fn from(error: LexError) -> Self {
        Self::Lex(error)
    }
}

impl From<io::Error> for CompileError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// Compiles one Jack class into VM commands on `out`.
///
/// # Errors
/// The first [`CompileError`]; output may be partially written when
/// compilation aborts, so callers should discard it on error.
pub fn compile<W: Write>(source: &str, out: W) -> Result<(), CompileError> {
    CompilationEngine::new(source, out)?.compile_class()
}

pub struct CompilationEngine<'a, W: Write> {
    tokens: Tokenizer<'a>,
    writer: VmWriter<W>,
    symbols: SymbolTable,
    class_name: String,
    if_counter: u16,
    while_counter: u16,
}

impl<'a, W: Write> CompilationEngine<'a, W> {
    pub fn new(source: &'a str, out: W) -> Result<Self, CompileError> {
        Ok(CompilationEngine {
            tokens: Tokenizer::new(source)?,
            writer: VmWriter::new(out),
            symbols: SymbolTable::new(),
            class_name: String::new(),
            if_counter: 0,
            while_counter: 0,
        })
    }

    /// `class NAME { classVarDec* subroutineDec* }`
    pub fn compile_class(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Class)?;
        self.class_name = self.expect_identifier("a class name")?;
        self.expect_symbol('{')?;

        while self.at_keyword(Keyword::Static) || self.at_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }
        while self.at_keyword(Keyword::Constructor)
            || self.at_keyword(Keyword::Function)
            || self.at_keyword(Keyword::Method)
        {
            self.compile_subroutine()?;
        }

        self.expect_symbol('}')?;
        if self.tokens.current().is_some() {
            return Err(self.unexpected("end of file"));
        }
        self.writer.flush()?;
        Ok(())
    }

    /// `(static | field) type name (, name)* ;`
    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        let kind = if self.at_keyword(Keyword::Static) {
            Kind::Static
        } else {
            Kind::Field
        };
        self.advance()?;

        let ty = self.parse_type(false)?;
        loop {
            let name = self.expect_identifier("a variable name")?;
            self.define(&name, &ty, kind)?;
            if !self.take_symbol_if(',')? {
                break;
            }
        }
        self.expect_symbol(';')
    }

    /// `(constructor | function | method) type name ( params ) { vars stmts }`
    fn compile_subroutine(&mut self) -> Result<(), CompileError> {
        let kind = match self.tokens.current() {
            Some(Token::Keyword(k @ (Keyword::Constructor | Keyword::Function | Keyword::Method))) => *k,
            _ => return Err(self.unexpected("`constructor`, `function` or `method`")),
        };
        self.advance()?;

        // The return type does not affect lowering: a bare `return` pushes
        // constant 0 whatever the declaration says
        self.parse_type(true)?;
        let name = self.expect_identifier("a subroutine name")?;

        self.symbols.start_subroutine();
        if kind == Keyword::Method {
            // The receiver occupies argument 0
            let class_name = self.class_name.clone();
            self.define("this", &class_name, Kind::Argument)?;
        }

        self.expect_symbol('(')?;
        self.compile_parameter_list()?;
        self.expect_symbol(')')?;
        self.expect_symbol('{')?;
        while self.at_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let full_name = format!("{}.{name}", self.class_name);
        self.writer
            .write_function(&full_name, self.symbols.var_count(Kind::Var))?;
        match kind {
            Keyword::Constructor => {
                // Allocate the object and aim `this` at it
                self.writer
                    .write_push(Segment::Constant, self.symbols.var_count(Kind::Field))?;
                self.writer.write_call("Memory.alloc", 1)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            Keyword::Method => {
                self.writer.write_push(Segment::Argument, 0)?;
                self.writer.write_pop(Segment::Pointer, 0)?;
            }
            _ => {}
        }

        self.compile_statements()?;
        self.expect_symbol('}')
    }

    /// `((type name) (, type name)*)?` up to the closing parenthesis.
    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.at_symbol(')') {
            return Ok(());
        }
        loop {
            let ty = self.parse_type(false)?;
            let name = self.expect_identifier("a parameter name")?;
            self.define(&name, &ty, Kind::Argument)?;
            if !self.take_symbol_if(',')? {
                return Ok(());
            }
        }
    }

    /// `var type name (, name)* ;`
    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Var)?;
        let ty = self.parse_type(false)?;
        loop {
            let name = self.expect_identifier("a variable name")?;
            self.define(&name, &ty, Kind::Var)?;
            if !self.take_symbol_if(',')? {
                break;
            }
        }
        self.expect_symbol(';')
    }

    fn compile_statements(&mut self) -> Result<(), CompileError> {
        loop {
            match self.tokens.current() {
                Some(Token::Keyword(Keyword::Let)) => self.compile_let()?,
                Some(Token::Keyword(Keyword::If)) => self.compile_if()?,
                Some(Token::Keyword(Keyword::While)) => self.compile_while()?,
                Some(Token::Keyword(Keyword::Do)) => self.compile_do()?,
                Some(Token::Keyword(Keyword::Return)) => self.compile_return()?,
                _ => return Ok(()),
            }
        }
    }

    /// `let name ([idx])? = expr ;`
    ///
    /// For the indexed form the target address is computed before the
    /// right-hand side and parked below it, then swapped through temp 0,
    /// so evaluating the right-hand side cannot clobber `pointer 1`.
    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Let)?;
        let name = self.expect_identifier("a variable name")?;
        let entry = self.lookup(&name)?;

        if self.take_symbol_if('[')? {
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.writer.write_push(entry.kind.segment(), entry.index)?;
            self.writer.write_arithmetic(Arithmetic::Add)?;

            self.expect_symbol('=')?;
            self.compile_expression()?;

            self.writer.write_pop(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::Temp, 0)?;
            self.writer.write_pop(Segment::That, 0)?;
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.writer.write_pop(entry.kind.segment(), entry.index)?;
        }
        self.expect_symbol(';')
    }

    /// `if (cond) { s1 } (else { s2 })?`
    fn compile_if(&mut self) -> Result<(), CompileError> {
        let k = self.if_counter;
        self.if_counter += 1;
        let else_label = format!("ELSE_{k}");
        let end_label = format!("ENDIF_{k}");

        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.write_arithmetic(Arithmetic::Not)?;
        self.writer.write_if(&else_label)?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.writer.write_goto(&end_label)?;
        self.writer.write_label(&else_label)?;

        if self.at_keyword(Keyword::Else) {
            self.advance()?;
            self.expect_symbol('{')?;
            self.compile_statements()?;
            self.expect_symbol('}')?;
        }
        Ok(self.writer.write_label(&end_label)?)
    }

    /// `while (cond) { body }`
    fn compile_while(&mut self) -> Result<(), CompileError> {
        let k = self.while_counter;
        self.while_counter += 1;
        let loop_label = format!("LOOP_{k}");
        let end_label = format!("ENDLOOP_{k}");

        self.expect_keyword(Keyword::While)?;
        self.writer.write_label(&loop_label)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.write_arithmetic(Arithmetic::Not)?;
        self.writer.write_if(&end_label)?;

        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        self.writer.write_goto(&loop_label)?;
        Ok(self.writer.write_label(&end_label)?)
    }

    /// `do callsite ;` — the result is discarded into temp 0.
    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Do)?;
        let name = self.expect_identifier("a subroutine call")?;
        self.compile_call(&name)?;
        self.expect_symbol(';')?;
        self.writer.write_pop(Segment::Temp, 0)?;
        Ok(())
    }

    /// `return expr? ;` — a bare return pushes constant 0 so every
    /// subroutine leaves exactly one value for its caller.
    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.expect_keyword(Keyword::Return)?;
        if self.at_symbol(';') {
            self.writer.write_push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;
        self.writer.write_return()?;
        Ok(())
    }

    /// `term (op term)*`, evaluated left to right.
    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;
        loop {
            let op = match self.tokens.current() {
                Some(Token::Symbol(c)) if "+-*/&|<>=".contains(*c) => *c,
                _ => return Ok(()),
            };
            self.advance()?;
            self.compile_term()?;
            match op {
                '+' => self.writer.write_arithmetic(Arithmetic::Add)?,
                '-' => self.writer.write_arithmetic(Arithmetic::Sub)?,
                '&' => self.writer.write_arithmetic(Arithmetic::And)?,
                '|' => self.writer.write_arithmetic(Arithmetic::Or)?,
                '<' => self.writer.write_arithmetic(Arithmetic::Lt)?,
                '>' => self.writer.write_arithmetic(Arithmetic::Gt)?,
                '=' => self.writer.write_arithmetic(Arithmetic::Eq)?,
                '*' => self.writer.write_call("Math.multiply", 2)?,
                '/' => self.writer.write_call("Math.divide", 2)?,
                _ => unreachable!(),
            }
        }
    }

    fn compile_term(&mut self) -> Result<(), CompileError> {
        let token = self.tokens.current().cloned();
        match token {
            Some(Token::IntConst(n)) => {
                self.advance()?;
                self.writer.write_push(Segment::Constant, n)?;
            }
            Some(Token::StringConst(s)) => {
                self.advance()?;
                self.compile_string(&s)?;
            }
            Some(Token::Keyword(Keyword::True)) => {
                self.advance()?;
                // 0xFFFF; `neg` of 1 would also work but `not` is canonical
                self.writer.write_push(Segment::Constant, 0)?;
                self.writer.write_arithmetic(Arithmetic::Not)?;
            }
            Some(Token::Keyword(Keyword::False | Keyword::Null)) => {
                self.advance()?;
                self.writer.write_push(Segment::Constant, 0)?;
            }
            Some(Token::Keyword(Keyword::This)) => {
                self.advance()?;
                self.writer.write_push(Segment::Pointer, 0)?;
            }
            Some(Token::Symbol('(')) => {
                self.advance()?;
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            Some(Token::Symbol('-')) => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(Arithmetic::Neg)?;
            }
            Some(Token::Symbol('~')) => {
                self.advance()?;
                self.compile_term()?;
                self.writer.write_arithmetic(Arithmetic::Not)?;
            }
            Some(Token::Identifier(name)) => {
                self.advance()?;
                if self.take_symbol_if('[')? {
                    // Array read: *(base + idx)
                    let entry = self.lookup(&name)?;
                    self.writer.write_push(entry.kind.segment(), entry.index)?;
                    self.compile_expression()?;
                    self.expect_symbol(']')?;
                    self.writer.write_arithmetic(Arithmetic::Add)?;
                    self.writer.write_pop(Segment::Pointer, 1)?;
                    self.writer.write_push(Segment::That, 0)?;
                } else if self.at_symbol('(') || self.at_symbol('.') {
                    self.compile_call(&name)?;
                } else {
                    let entry = self.lookup(&name)?;
                    self.writer.write_push(entry.kind.segment(), entry.index)?;
                }
            }
            _ => return Err(self.unexpected("a term")),
        }
        Ok(())
    }

    /// A string constant builds a `String` object character by character.
    fn compile_string(&mut self, s: &str) -> Result<(), CompileError> {
        let length = u16::try_from(s.chars().count()).expect("string constant length fits u16");
        self.writer.write_push(Segment::Constant, length)?;
        self.writer.write_call("String.new", 1)?;
        for ch in s.chars() {
            self.writer.write_push(Segment::Constant, ch as u16)?;
            self.writer.write_call("String.appendChar", 2)?;
        }
        Ok(())
    }

    /// A callsite whose leading identifier is already consumed.
    ///
    /// Three shapes: `name(args)` is a method call on the current object;
    /// `x.y(args)` is a method call when `x` is a variable (its type names
    /// the class) and a plain function call when it is a class name.
    fn compile_call(&mut self, name: &str) -> Result<(), CompileError> {
        if self.take_symbol_if('.')? {
            let subroutine = self.expect_identifier("a subroutine name")?;
            self.expect_symbol('(')?;
            if let Some(entry) = self.symbols.find(name).cloned() {
                self.writer.write_push(entry.kind.segment(), entry.index)?;
                let n_args = self.compile_expression_list()? + 1;
                self.expect_symbol(')')?;
                self.writer
                    .write_call(&format!("{}.{subroutine}", entry.ty), n_args)?;
            } else {
                let n_args = self.compile_expression_list()?;
                self.expect_symbol(')')?;
                self.writer.write_call(&format!("{name}.{subroutine}"), n_args)?;
            }
        } else {
            self.expect_symbol('(')?;
            self.writer.write_push(Segment::Pointer, 0)?;
            let n_args = self.compile_expression_list()? + 1;
            self.expect_symbol(')')?;
            self.writer
                .write_call(&format!("{}.{name}", self.class_name), n_args)?;
        }
        Ok(())
    }

    /// `(expr (, expr)*)?` up to the closing parenthesis; returns the
    /// number of expressions compiled.
    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        let mut n_args = 0;
        if !self.at_symbol(')') {
            loop {
                self.compile_expression()?;
                n_args += 1;
                if !self.take_symbol_if(',')? {
                    break;
                }
            }
        }
        Ok(n_args)
    }

    /// `int | char | boolean | CLASSNAME`, plus `void` where allowed.
    fn parse_type(&mut self, allow_void: bool) -> Result<String, CompileError> {
        let ty = match self.tokens.current() {
            Some(Token::Keyword(k @ (Keyword::Int | Keyword::Char | Keyword::Boolean))) => {
                k.as_str().to_string()
            }
            Some(Token::Keyword(Keyword::Void)) if allow_void => "void".to_string(),
            Some(Token::Identifier(name)) => name.clone(),
            _ => {
                return Err(self.unexpected(if allow_void { "a return type" } else { "a type" }));
            }
        };
        self.advance()?;
        Ok(ty)
    }

    fn define(&mut self, name: &str, ty: &str, kind: Kind) -> Result<(), CompileError> {
        self.symbols
            .define(name, ty, kind)
            .map_err(|AlreadyDefined| CompileError::Redefined(name.to_string()))
    }

    fn lookup(&self, name: &str) -> Result<Entry, CompileError> {
        self.symbols
            .find(name)
            .cloned()
            .ok_or_else(|| CompileError::Undeclared(name.to_string()))
    }

    fn advance(&mut self) -> Result<(), CompileError> {
        self.tokens.advance().map_err(Into::into)
    }

    fn at_symbol(&self, symbol: char) -> bool {
        matches!(self.tokens.current(), Some(Token::Symbol(c)) if *c == symbol)
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        matches!(self.tokens.current(), Some(Token::Keyword(k)) if *k == keyword)
    }

    fn take_symbol_if(&mut self, symbol: char) -> Result<bool, CompileError> {
        if self.at_symbol(symbol) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> Result<(), CompileError> {
        if self.at_symbol(symbol) {
            self.advance()
        } else {
            Err(self.unexpected(format!("symbol `{symbol}`")))
        }
    }

    fn expect_keyword(&mut self, keyword: Keyword) -> Result<(), CompileError> {
        if self.at_keyword(keyword) {
            self.advance()
        } else {
            Err(self.unexpected(format!("keyword `{keyword}`")))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, CompileError> {
        match self.tokens.current() {
            Some(Token::Identifier(name)) => {
                let name = name.clone();
                self.advance()?;
                Ok(name)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    fn unexpected(&self, expected: impl Into<String>) -> CompileError {
        CompileError::Unexpected {
            expected: expected.into(),
            found: self
                .tokens
                .current()
                .map_or_else(|| "end of input".to_string(), ToString::to_string),
        }
    }
}
