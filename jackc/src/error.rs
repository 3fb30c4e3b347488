use tokenizer::Span;

/// The four fatal error classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unrecognized or malformed token text.
    Lex,
    /// A production saw a token it cannot consume.
    UnexpectedToken,
    /// Identifier not found in subroutine or class scope.
    UnresolvedSymbol,
    /// Name declared twice in one scope.
    DuplicateSymbol,
}

impl ErrorKind {
    pub fn name(self) -> &'static str {
        match self {
            ErrorKind::Lex => "lexical error",
            ErrorKind::UnexpectedToken => "unexpected token",
            ErrorKind::UnresolvedSymbol => "unresolved symbol",
            ErrorKind::DuplicateSymbol => "duplicate symbol",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub kind: ErrorKind,
    pub message: String,
    pub span: Option<Span>,
}

impl CompileError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn no_span(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    /// Attach a span if the error does not carry one yet.
    pub fn or_span(mut self, span: Span) -> Self {
        self.span.get_or_insert(span);
        self
    }

    /// Render the error with the offending source line and a caret marker.
    pub fn render(&self, source: &str) -> String {
        let mut out = format!("error: {}: {}", self.kind.name(), self.message);
        let Some(span) = self.span else {
            return out;
        };
        let line_no = span.start.line;
        let line = source.lines().nth(line_no.saturating_sub(1)).unwrap_or("");
        let col = span.start.column;
        let width = if span.end.line == span.start.line {
            span.len().max(1)
        } else {
            1
        };
        let gutter = line_no.to_string().len();
        out.push_str(&format!("\n{:>gutter$}--> line {line_no}, col {col}", ""));
        out.push_str(&format!("\n{:>gutter$} |", ""));
        out.push_str(&format!("\n{line_no} | {line}"));
        out.push_str(&format!(
            "\n{:>gutter$} | {}{}",
            "",
            " ".repeat(col.saturating_sub(1)),
            "^".repeat(width)
        ));
        out
    }
}

impl std::fmt::Display for CompileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.span {
            Some(span) => write!(
                f,
                "{}:{}: {}: {}",
                span.start.line,
                span.start.column,
                self.kind.name(),
                self.message
            ),
            None => write!(f, "{}: {}", self.kind.name(), self.message),
        }
    }
}

impl std::error::Error for CompileError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tokenizer::Pos;

    fn span(line: usize, col: usize, len: usize) -> Span {
        Span::new(Pos::new(0, line, col), Pos::new(len, line, col + len))
    }

    #[test]
    fn display_includes_position() {
        let err = CompileError::new(ErrorKind::UnresolvedSymbol, "`x`", span(3, 7, 1));
        assert_eq!(err.to_string(), "3:7: unresolved symbol: `x`");
    }

    #[test]
    fn render_points_at_column() {
        let src = "class Main {\n  let y = x;\n}";
        let err = CompileError::new(ErrorKind::UnresolvedSymbol, "`y`", span(2, 7, 1));
        let rendered = err.render(src);
        assert!(rendered.contains("2 |   let y = x;"));
        assert!(rendered.ends_with("  |       ^"));
    }

    #[test]
    fn or_span_keeps_existing() {
        let first = span(1, 1, 1);
        let err = CompileError::new(ErrorKind::Lex, "bad", first).or_span(span(9, 9, 9));
        assert_eq!(err.span, Some(first));
        let err = CompileError::no_span(ErrorKind::Lex, "bad").or_span(first);
        assert_eq!(err.span, Some(first));
    }
}
