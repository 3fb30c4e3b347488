//! Single-pass compilation engine.
//!
//! Every grammar production is a method that consumes tokens, reads or
//! writes the symbol table and emits VM code immediately. There is no AST
//! and no backtracking: each decision uses the current token, plus one
//! peeked token after an identifier.

mod expressions;
mod statements;

use std::iter::Peekable;

use tokenizer::{Keyword, Pos, Span, Token, TokenKind, XmlTreeWriter};
use vmcode::{InstructionSink, Segment, VmWriter};

use crate::error::{CompileError, ErrorKind};
use crate::options::CompileOptions;
use crate::symbols::{SymbolKind, SymbolTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

impl SubroutineKind {
    fn from_keyword(kw: Keyword) -> Option<Self> {
        match kw {
            Keyword::Constructor => Some(Self::Constructor),
            Keyword::Function => Some(Self::Function),
            Keyword::Method => Some(Self::Method),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Constructor => "constructor",
            Self::Function => "function",
            Self::Method => "method",
        }
    }
}

/// Compiles one class from a token stream into a sink.
///
/// All parse state (token cursor, symbol table, label counter) belongs to
/// the instance, so independent units can be compiled side by side with
/// separate engines.
pub struct CompilationEngine<'o, I: Iterator<Item = Token>, S: InstructionSink> {
    tokens: Peekable<I>,
    writer: VmWriter<S>,
    symbols: SymbolTable,
    options: &'o CompileOptions,
    class_name: String,
    subroutine_kind: SubroutineKind,
    /// Shared by every `if` and `while` in the class.
    label_counter: usize,
    last_span: Span,
    /// Parse-tree listing, recorded only when requested.
    tree: Option<XmlTreeWriter>,
}

impl<'o, I: Iterator<Item = Token>, S: InstructionSink> CompilationEngine<'o, I, S> {
    pub fn new(tokens: I, sink: S, options: &'o CompileOptions) -> Self {
        Self {
            tokens: tokens.peekable(),
            writer: VmWriter::new(sink),
            symbols: SymbolTable::new(),
            options,
            class_name: String::new(),
            subroutine_kind: SubroutineKind::Function,
            label_counter: 0,
            last_span: Span::point(Pos::origin()),
            tree: None,
        }
    }

    pub fn into_sink(self) -> S {
        self.writer.into_sink()
    }

    /// Also record the parse tree of everything compiled from here on.
    pub fn record_tree(&mut self) {
        self.tree = Some(XmlTreeWriter::new());
    }

    /// The recorded parse tree as XML, if recording was requested.
    pub fn take_tree(&mut self) -> Option<String> {
        self.tree.take().map(XmlTreeWriter::finish)
    }

    // ── Token cursor ────────────────────────────────────────────────

    fn peek_kind(&mut self) -> &TokenKind {
        match self.tokens.peek() {
            Some(tok) => &tok.kind,
            None => &TokenKind::Eof,
        }
    }

    fn peek_span(&mut self) -> Span {
        match self.tokens.peek() {
            Some(tok) => tok.span,
            None => self.last_span,
        }
    }

    /// Consume the current token without inspecting it.
    fn bump(&mut self) -> Token {
        match self.tokens.next() {
            Some(tok) => {
                self.last_span = tok.span;
                if let Some(tree) = &mut self.tree {
                    tree.token(&tok);
                }
                tok
            }
            None => Token::new(TokenKind::Eof, self.last_span, ""),
        }
    }

    /// Error for the current token not matching `expected`.
    fn unexpected(&mut self, expected: &str) -> CompileError {
        let span = self.peek_span();
        match self.tokens.peek() {
            Some(Token {
                kind: TokenKind::Error(message),
                ..
            }) => CompileError::new(ErrorKind::Lex, message.clone(), span),
            Some(tok) => CompileError::new(
                ErrorKind::UnexpectedToken,
                format!("expected {expected}, found {}", tok.describe()),
                span,
            ),
            None => CompileError::new(
                ErrorKind::UnexpectedToken,
                format!("expected {expected}, found end of input"),
                span,
            ),
        }
    }

    fn check_symbol(&mut self, c: char) -> bool {
        matches!(self.peek_kind(), TokenKind::Symbol(s) if *s == c)
    }

    fn check_keyword(&mut self, kw: Keyword) -> bool {
        matches!(self.peek_kind(), TokenKind::Keyword(k) if *k == kw)
    }

    fn eat_symbol(&mut self, c: char) -> bool {
        let found = self.check_symbol(c);
        if found {
            self.bump();
        }
        found
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        let found = self.check_keyword(kw);
        if found {
            self.bump();
        }
        found
    }

    fn expect_symbol(&mut self, c: char) -> Result<Span, CompileError> {
        if self.check_symbol(c) {
            Ok(self.bump().span)
        } else {
            Err(self.unexpected(&format!("`{c}`")))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword) -> Result<Span, CompileError> {
        if self.check_keyword(kw) {
            Ok(self.bump().span)
        } else {
            Err(self.unexpected(&format!("`{kw}`")))
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span), CompileError> {
        if !matches!(self.peek_kind(), TokenKind::Identifier(_)) {
            return Err(self.unexpected("identifier"));
        }
        let tok = self.bump();
        match tok.kind {
            TokenKind::Identifier(name) => Ok((name, tok.span)),
            _ => unreachable!(),
        }
    }

    fn open_node(&mut self, tag: &str) {
        if let Some(tree) = &mut self.tree {
            tree.open(tag);
        }
    }

    fn close_node(&mut self, tag: &str) {
        if let Some(tree) = &mut self.tree {
            tree.close(tag);
        }
    }

    // ── Context ─────────────────────────────────────────────────────

    fn next_label_id(&mut self) -> usize {
        let id = self.label_counter;
        self.label_counter += 1;
        id
    }

    fn define(
        &mut self,
        name: &str,
        ty: &str,
        kind: SymbolKind,
        span: Span,
    ) -> Result<u16, CompileError> {
        self.symbols
            .define(name, ty, kind)
            .map_err(|e| e.or_span(span))
    }

    // ── Class structure ─────────────────────────────────────────────

    /// `'class' className '{' classVarDec* subroutineDec* '}'`
    ///
    /// Returns the class name. Trailing tokens after the closing brace are
    /// an error.
    pub fn compile_class(&mut self) -> Result<String, CompileError> {
        self.open_node("class");
        self.expect_keyword(Keyword::Class)?;
        let (name, _) = self.expect_identifier()?;
        log::debug!("compiling class {name}");
        self.class_name = name;
        self.expect_symbol('{')?;

        while self.check_keyword(Keyword::Static) || self.check_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }

        loop {
            let kind = match self.peek_kind() {
                TokenKind::Keyword(kw) => SubroutineKind::from_keyword(*kw),
                _ => None,
            };
            let Some(kind) = kind else { break };
            self.open_node("subroutineDec");
            self.bump();
            self.compile_subroutine(kind)?;
            self.close_node("subroutineDec");
        }

        if !self.check_symbol('}') {
            return Err(self.unexpected("subroutine declaration or `}`"));
        }
        self.bump();
        self.close_node("class");
        if !matches!(self.peek_kind(), TokenKind::Eof) {
            return Err(self.unexpected("end of input"));
        }
        Ok(self.class_name.clone())
    }

    /// `('static' | 'field') type varName (',' varName)* ';'`
    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        self.open_node("classVarDec");
        let kind = if self.eat_keyword(Keyword::Static) {
            SymbolKind::Static
        } else {
            self.expect_keyword(Keyword::Field)?;
            SymbolKind::Field
        };
        let ty = self.compile_type()?;
        self.compile_name_list(&ty, kind)?;
        self.expect_symbol(';')?;
        self.close_node("classVarDec");
        Ok(())
    }

    /// `varName (',' varName)*`, all declared with the same type.
    fn compile_name_list(&mut self, ty: &str, kind: SymbolKind) -> Result<(), CompileError> {
        loop {
            let (name, span) = self.expect_identifier()?;
            self.define(&name, ty, kind, span)?;
            if !self.eat_symbol(',') {
                return Ok(());
            }
        }
    }

    /// `'int' | 'char' | 'boolean' | className`
    fn compile_type(&mut self) -> Result<String, CompileError> {
        match self.peek_kind().clone() {
            TokenKind::Keyword(kw @ (Keyword::Int | Keyword::Char | Keyword::Boolean)) => {
                self.bump();
                Ok(kw.as_str().to_string())
            }
            TokenKind::Identifier(name) => {
                self.bump();
                Ok(name)
            }
            _ => Err(self.unexpected("type")),
        }
    }

    /// Everything after the subroutine keyword:
    /// `('void' | type) subroutineName '(' parameterList ')' subroutineBody`
    fn compile_subroutine(&mut self, kind: SubroutineKind) -> Result<(), CompileError> {
        if !self.eat_keyword(Keyword::Void) {
            self.compile_type()?;
        }
        let (name, _) = self.expect_identifier()?;
        let qualified = format!("{}.{}", self.class_name, name);

        self.subroutine_kind = kind;
        self.symbols.start_subroutine();
        if kind == SubroutineKind::Method {
            let class_name = self.class_name.clone();
            self.symbols
                .define("this", &class_name, SymbolKind::Argument)?;
        }

        self.expect_symbol('(')?;
        self.open_node("parameterList");
        self.compile_parameter_list()?;
        self.close_node("parameterList");
        self.expect_symbol(')')?;

        self.open_node("subroutineBody");
        self.expect_symbol('{')?;
        while self.check_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }
        let locals = self.symbols.count(SymbolKind::Local);
        log::debug!("compiling {} {qualified} ({locals} locals)", kind.name());
        self.writer.function(qualified.as_str(), locals);

        match kind {
            SubroutineKind::Constructor => {
                let fields = self.symbols.count(SymbolKind::Field);
                self.writer.push(Segment::Constant, fields);
                self.writer.call(self.options.runtime.alloc.as_str(), 1);
                self.writer.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Method => {
                self.writer.push(Segment::Argument, 0);
                self.writer.pop(Segment::Pointer, 0);
            }
            SubroutineKind::Function => {}
        }

        let returned = self.compile_statements()?;
        if !returned && kind != SubroutineKind::Constructor {
            return Err(CompileError::new(
                ErrorKind::UnexpectedToken,
                format!(
                    "expected `return` before the end of {} `{qualified}`",
                    kind.name()
                ),
                self.peek_span(),
            ));
        }
        self.expect_symbol('}')?;
        self.close_node("subroutineBody");

        if !returned {
            log::debug!("implicit `return this` for {qualified}");
            self.writer.push(Segment::Pointer, 0);
            self.writer.return_();
        }
        Ok(())
    }

    /// `((type varName) (',' type varName)*)?`
    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.check_symbol(')') {
            return Ok(());
        }
        loop {
            let ty = self.compile_type()?;
            let (name, span) = self.expect_identifier()?;
            self.define(&name, &ty, SymbolKind::Argument, span)?;
            if !self.eat_symbol(',') {
                return Ok(());
            }
        }
    }

    /// `'var' type varName (',' varName)* ';'`
    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.open_node("varDec");
        self.expect_keyword(Keyword::Var)?;
        let ty = self.compile_type()?;
        self.compile_name_list(&ty, SymbolKind::Local)?;
        self.expect_symbol(';')?;
        self.close_node("varDec");
        Ok(())
    }

    /// Segment and index of a declared variable.
    fn resolve_variable(&self, name: &str, span: Span) -> Result<(Segment, u16), CompileError> {
        match self.symbols.lookup(name) {
            Some(sym) => Ok((sym.kind.segment(), sym.index)),
            None => Err(CompileError::new(
                ErrorKind::UnresolvedSymbol,
                format!("`{name}` is not declared in `{}`", self.class_name),
                span,
            )),
        }
    }
}
