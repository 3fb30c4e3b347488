use tokenizer::{Keyword, Token, TokenKind};
use vmcode::{InstructionSink, Op, Segment};

use super::CompilationEngine;
use crate::error::CompileError;

impl<I: Iterator<Item = Token>, S: InstructionSink> CompilationEngine<'_, I, S> {
    /// `statement*`, up to (not including) the closing `}`.
    ///
    /// Returns whether the last statement compiled was a `return`.
    pub(super) fn compile_statements(&mut self) -> Result<bool, CompileError> {
        self.open_node("statements");
        let mut returned = false;
        loop {
            let kw = match self.peek_kind() {
                TokenKind::Keyword(kw) => *kw,
                TokenKind::Symbol('}') => break,
                _ => return Err(self.unexpected("statement or `}`")),
            };
            returned = false;
            match kw {
                Keyword::Let => self.compile_let()?,
                Keyword::If => self.compile_if()?,
                Keyword::While => self.compile_while()?,
                Keyword::Do => self.compile_do()?,
                Keyword::Return => {
                    self.compile_return()?;
                    returned = true;
                }
                _ => return Err(self.unexpected("statement or `}`")),
            }
        }
        self.close_node("statements");
        Ok(returned)
    }

    /// `'{' statements '}'`
    fn compile_block(&mut self) -> Result<(), CompileError> {
        self.expect_symbol('{')?;
        self.compile_statements()?;
        self.expect_symbol('}')?;
        Ok(())
    }

    /// `'let' varName ('[' expression ']')? '=' expression ';'`
    ///
    /// For an indexed target the element address stays on the stack while
    /// the value is computed; the value then goes through `temp 0` so the
    /// address can be moved into `pointer 1`.
    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.open_node("letStatement");
        self.expect_keyword(Keyword::Let)?;
        let (name, span) = self.expect_identifier()?;
        let (segment, index) = self.resolve_variable(&name, span)?;

        if self.eat_symbol('[') {
            self.compile_expression()?;
            self.expect_symbol(']')?;
            self.writer.push(segment, index);
            self.writer.arithmetic(Op::Add);

            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;

            self.writer.pop(Segment::Temp, 0);
            self.writer.pop(Segment::Pointer, 1);
            self.writer.push(Segment::Temp, 0);
            self.writer.pop(Segment::That, 0);
        } else {
            self.expect_symbol('=')?;
            self.compile_expression()?;
            self.expect_symbol(';')?;
            self.writer.pop(segment, index);
        }
        self.close_node("letStatement");
        Ok(())
    }

    /// `'if' '(' expression ')' '{' statements '}' ('else' '{' statements '}')?`
    fn compile_if(&mut self) -> Result<(), CompileError> {
        let id = self.next_label_id();
        let else_label = format!("IF_FALSE{id}");
        let end_label = format!("IF_END{id}");

        self.open_node("ifStatement");
        self.expect_keyword(Keyword::If)?;
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.arithmetic(Op::Not);
        self.writer.if_goto(else_label.as_str());

        self.compile_block()?;
        self.writer.goto(end_label.as_str());
        self.writer.label(else_label);

        if self.eat_keyword(Keyword::Else) {
            self.compile_block()?;
        }
        self.writer.label(end_label);
        self.close_node("ifStatement");
        Ok(())
    }

    /// `'while' '(' expression ')' '{' statements '}'`
    fn compile_while(&mut self) -> Result<(), CompileError> {
        let id = self.next_label_id();
        let top_label = format!("WHILE_EXP{id}");
        let end_label = format!("WHILE_END{id}");

        self.open_node("whileStatement");
        self.expect_keyword(Keyword::While)?;
        self.writer.label(top_label.as_str());
        self.expect_symbol('(')?;
        self.compile_expression()?;
        self.expect_symbol(')')?;
        self.writer.arithmetic(Op::Not);
        self.writer.if_goto(end_label.as_str());

        self.compile_block()?;
        self.writer.goto(top_label);
        self.writer.label(end_label);
        self.close_node("whileStatement");
        Ok(())
    }

    /// `'do' subroutineCall ';'`
    ///
    /// Every call leaves a value on the stack, void or not; it is dropped
    /// into `temp 0`.
    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.open_node("doStatement");
        self.expect_keyword(Keyword::Do)?;
        let (name, span) = self.expect_identifier()?;
        self.compile_subroutine_call(name, span)?;
        self.expect_symbol(';')?;
        self.writer.pop(Segment::Temp, 0);
        self.close_node("doStatement");
        Ok(())
    }

    /// `'return' expression? ';'`
    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.open_node("returnStatement");
        self.expect_keyword(Keyword::Return)?;
        if self.check_symbol(';') {
            self.writer.push(Segment::Constant, 0);
        } else {
            self.compile_expression()?;
        }
        self.expect_symbol(';')?;
        self.writer.return_();
        self.close_node("returnStatement");
        Ok(())
    }
}
