use tokenizer::{Keyword, Span, Token, TokenKind};
use vmcode::{InstructionSink, Op, Segment};

use super::{CompilationEngine, SubroutineKind};
use crate::error::{CompileError, ErrorKind};

/// Binary operators. `*` and `/` are library calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Native(Op),
    Multiply,
    Divide,
}

impl BinaryOp {
    fn from_symbol(c: char) -> Option<Self> {
        let op = match c {
            '+' => Self::Native(Op::Add),
            '-' => Self::Native(Op::Sub),
            '&' => Self::Native(Op::And),
            '|' => Self::Native(Op::Or),
            '<' => Self::Native(Op::Lt),
            '>' => Self::Native(Op::Gt),
            '=' => Self::Native(Op::Eq),
            '*' => Self::Multiply,
            '/' => Self::Divide,
            _ => return None,
        };
        Some(op)
    }
}

fn unary_op(c: char) -> Option<Op> {
    match c {
        '-' => Some(Op::Neg),
        '~' => Some(Op::Not),
        '^' => Some(Op::ShiftLeft),
        '#' => Some(Op::ShiftRight),
        _ => None,
    }
}

fn too_many_arguments(span: Span) -> CompileError {
    CompileError::new(
        ErrorKind::UnexpectedToken,
        format!("more than {} arguments in one call", u16::MAX),
        span,
    )
}

/// Who receives a subroutine call, decided from the callee name alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CallTarget {
    /// `name(...)`: a method of the current class on the current object.
    UnqualifiedThis,
    /// `var.name(...)`: a method on the object stored in `var`.
    QualifiedVariable {
        segment: Segment,
        index: u16,
        class: String,
    },
    /// `Class.name(...)`: a function or constructor, no receiver.
    QualifiedClass { class: String },
}

impl CallTarget {
    /// Arguments passed on top of the explicit ones.
    pub(super) fn implicit_args(&self) -> u16 {
        match self {
            Self::QualifiedClass { .. } => 0,
            Self::UnqualifiedThis | Self::QualifiedVariable { .. } => 1,
        }
    }
}

impl<I: Iterator<Item = Token>, S: InstructionSink> CompilationEngine<'_, I, S> {
    /// `term (op term)*`
    ///
    /// No precedence: operators apply left to right as they are read, each
    /// one emitted after its right operand.
    pub(super) fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.open_node("expression");
        self.compile_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Symbol(c) => BinaryOp::from_symbol(*c),
                _ => None,
            };
            let Some(op) = op else { break };
            self.bump();
            self.compile_term()?;
            match op {
                BinaryOp::Native(op) => self.writer.arithmetic(op),
                BinaryOp::Multiply => {
                    self.writer.call(self.options.runtime.multiply.as_str(), 2)
                }
                BinaryOp::Divide => {
                    self.writer.call(self.options.runtime.divide.as_str(), 2)
                }
            }
        }
        self.close_node("expression");
        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), CompileError> {
        self.open_node("term");
        let span = self.peek_span();
        match self.peek_kind().clone() {
            TokenKind::Integer(value) => {
                self.bump();
                let max = self.options.max_int_constant;
                let value = u16::try_from(value)
                    .ok()
                    .filter(|v| *v <= max)
                    .ok_or_else(|| {
                        CompileError::new(
                            ErrorKind::UnexpectedToken,
                            format!("integer constant {value} is larger than {max}"),
                            span,
                        )
                    })?;
                self.writer.push(Segment::Constant, value);
            }
            TokenKind::String(text) => {
                self.bump();
                self.compile_string(&text, span)?;
            }
            TokenKind::Keyword(kw) => {
                match kw {
                    Keyword::True => {
                        self.writer.push(Segment::Constant, 0);
                        self.writer.arithmetic(Op::Not);
                    }
                    Keyword::False | Keyword::Null => {
                        self.writer.push(Segment::Constant, 0);
                    }
                    Keyword::This => {
                        if self.subroutine_kind == SubroutineKind::Function {
                            log::warn!(
                                "{}:{}: `this` used inside function of `{}`",
                                span.start.line,
                                span.start.column,
                                self.class_name
                            );
                        }
                        self.writer.push(Segment::Pointer, 0);
                    }
                    _ => return Err(self.unexpected("term")),
                }
                self.bump();
            }
            TokenKind::Symbol('(') => {
                self.bump();
                self.compile_expression()?;
                self.expect_symbol(')')?;
            }
            TokenKind::Symbol(c) if unary_op(c).is_some() => {
                self.bump();
                self.compile_term()?;
                if let Some(op) = unary_op(c) {
                    self.writer.arithmetic(op);
                }
            }
            TokenKind::Identifier(name) => {
                self.bump();
                if self.eat_symbol('[') {
                    let (segment, index) = self.resolve_variable(&name, span)?;
                    self.compile_expression()?;
                    self.expect_symbol(']')?;
                    self.writer.push(segment, index);
                    self.writer.arithmetic(Op::Add);
                    self.writer.pop(Segment::Pointer, 1);
                    self.writer.push(Segment::That, 0);
                } else if self.check_symbol('(') || self.check_symbol('.') {
                    self.compile_subroutine_call(name, span)?;
                } else {
                    let (segment, index) = self.resolve_variable(&name, span)?;
                    self.writer.push(segment, index);
                }
            }
            _ => return Err(self.unexpected("term")),
        }
        self.close_node("term");
        Ok(())
    }

    /// `String.new(len)` followed by one `appendChar` per character.
    fn compile_string(&mut self, text: &str, span: Span) -> Result<(), CompileError> {
        let unrepresentable = |what: String| {
            CompileError::new(ErrorKind::UnexpectedToken, what, span)
        };
        let len = u16::try_from(text.chars().count())
            .map_err(|_| unrepresentable("string constant is too long".into()))?;

        let runtime = &self.options.runtime;
        self.writer.push(Segment::Constant, len);
        self.writer.call(runtime.string_new.as_str(), 1);
        for c in text.chars() {
            let code = u16::try_from(u32::from(c)).map_err(|_| {
                unrepresentable(format!("character {c:?} has no 16-bit code"))
            })?;
            self.writer.push(Segment::Constant, code);
            self.writer.call(runtime.string_append_char.as_str(), 2);
        }
        Ok(())
    }

    /// `'(' (expression (',' expression)*)? ')'`, returning the count.
    fn compile_expression_list(&mut self) -> Result<u16, CompileError> {
        self.expect_symbol('(')?;
        self.open_node("expressionList");
        let mut count: u16 = 0;
        if !self.check_symbol(')') {
            loop {
                let span = self.peek_span();
                self.compile_expression()?;
                count = count.checked_add(1).ok_or_else(|| too_many_arguments(span))?;
                if !self.eat_symbol(',') {
                    break;
                }
            }
        }
        self.close_node("expressionList");
        self.expect_symbol(')')?;
        Ok(count)
    }

    /// Classify the callee of a call whose first name has been consumed.
    ///
    /// Consumes `.subroutineName` when present and returns the target with
    /// the fully-qualified callee name.
    pub(super) fn resolve_call_target(
        &mut self,
        first: String,
    ) -> Result<(CallTarget, String), CompileError> {
        if !self.eat_symbol('.') {
            let callee = format!("{}.{}", self.class_name, first);
            return Ok((CallTarget::UnqualifiedThis, callee));
        }
        let (sub, _) = self.expect_identifier()?;
        let (target, callee) = match self.symbols.lookup(&first) {
            Some(sym) => {
                let callee = format!("{}.{sub}", sym.ty);
                let target = CallTarget::QualifiedVariable {
                    segment: sym.kind.segment(),
                    index: sym.index,
                    class: sym.ty.clone(),
                };
                (target, callee)
            }
            None => {
                let callee = format!("{first}.{sub}");
                (CallTarget::QualifiedClass { class: first }, callee)
            }
        };
        Ok((target, callee))
    }

    /// `subroutineName '(' expressionList ')'`
    /// `| (className | varName) '.' subroutineName '(' expressionList ')'`
    ///
    /// `first` is the already-consumed leading name.
    pub(super) fn compile_subroutine_call(
        &mut self,
        first: String,
        span: Span,
    ) -> Result<(), CompileError> {
        let (target, callee) = self.resolve_call_target(first)?;
        match &target {
            CallTarget::UnqualifiedThis => {
                if self.subroutine_kind == SubroutineKind::Function {
                    log::warn!(
                        "{}:{}: `{callee}` called without receiver inside a function",
                        span.start.line,
                        span.start.column
                    );
                }
                self.writer.push(Segment::Pointer, 0);
            }
            CallTarget::QualifiedVariable { segment, index, .. } => {
                self.writer.push(*segment, *index);
            }
            CallTarget::QualifiedClass { .. } => {}
        }
        let args = self
            .compile_expression_list()?
            .checked_add(target.implicit_args())
            .ok_or_else(|| too_many_arguments(self.last_span))?;
        log::trace!("call {callee} resolved as {target:?}");
        self.writer.call(callee, args);
        Ok(())
    }
}
