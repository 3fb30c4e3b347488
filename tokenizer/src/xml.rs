//! XML renderings of Jack source: the flat `<tokens>` listing and the
//! indented parse tree.

use std::fmt::Write;

use crate::token::{Token, TokenKind};

/// A lexical error hit while producing the listing.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlError {
    pub message: String,
    pub token: Token,
}

impl std::fmt::Display for XmlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.token.span.start)
    }
}

impl std::error::Error for XmlError {}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}

/// Tag and escaped text for a terminal, `None` for `Eof` and errors.
fn element(kind: &TokenKind) -> Option<(&'static str, String)> {
    let (tag, text) = match kind {
        TokenKind::Keyword(kw) => ("keyword", kw.as_str().to_string()),
        TokenKind::Symbol(c) => ("symbol", c.to_string()),
        TokenKind::Integer(v) => ("integerConstant", v.to_string()),
        TokenKind::String(s) => ("stringConstant", s.clone()),
        TokenKind::Identifier(name) => ("identifier", name.clone()),
        TokenKind::Eof | TokenKind::Error(_) => return None,
    };
    Some((tag, escape(&text)))
}

/// Render `tokens` as one element per line inside `<tokens>`.
///
/// Stops at the first error token.
pub fn write_token_xml(
    tokens: impl IntoIterator<Item = Token>,
) -> Result<String, XmlError> {
    let mut out = String::from("<tokens>\n");
    for token in tokens {
        if let TokenKind::Error(message) = &token.kind {
            return Err(XmlError {
                message: message.clone(),
                token,
            });
        }
        let Some((tag, text)) = element(&token.kind) else {
            break;
        };
        // Writing into a String cannot fail.
        let _ = writeln!(out, "<{tag}> {text} </{tag}>");
    }
    out.push_str("</tokens>\n");
    Ok(out)
}

/// Builds the parse-tree listing as a parser walks its productions.
///
/// Nonterminals are opened and closed by the caller; terminals are added
/// as they are consumed. Children are indented two spaces per level and an
/// empty nonterminal still takes two lines.
#[derive(Debug, Default)]
pub struct XmlTreeWriter {
    out: String,
    depth: usize,
}

impl XmlTreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.out.push_str("  ");
        }
    }

    pub fn open(&mut self, tag: &str) {
        self.indent();
        let _ = writeln!(self.out, "<{tag}>");
        self.depth += 1;
    }

    pub fn close(&mut self, tag: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.indent();
        let _ = writeln!(self.out, "</{tag}>");
    }

    /// Add a consumed token. `Eof` and error tokens are not part of the tree.
    pub fn token(&mut self, token: &Token) {
        if let Some((tag, text)) = element(&token.kind) {
            self.indent();
            let _ = writeln!(self.out, "<{tag}> {text} </{tag}>");
        }
    }

    /// Nesting depth of the currently open nonterminal.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Lexer;

    #[test]
    fn listing_escapes_symbols() {
        let xml = write_token_xml(Lexer::from_str("if (a < b) {}")).unwrap();
        assert_eq!(
            xml,
            "<tokens>\n\
             <keyword> if </keyword>\n\
             <symbol> ( </symbol>\n\
             <identifier> a </identifier>\n\
             <symbol> &lt; </symbol>\n\
             <identifier> b </identifier>\n\
             <symbol> ) </symbol>\n\
             <symbol> { </symbol>\n\
             <symbol> } </symbol>\n\
             </tokens>\n"
        );
    }

    #[test]
    fn listing_constants() {
        let xml = write_token_xml(Lexer::from_str("7 \"a & b\"")).unwrap();
        assert!(xml.contains("<integerConstant> 7 </integerConstant>"));
        assert!(xml.contains("<stringConstant> a &amp; b </stringConstant>"));
    }

    #[test]
    fn listing_stops_at_error() {
        let err = write_token_xml(Lexer::from_str("x ?")).unwrap_err();
        assert_eq!(err.token.lexeme, "?");
    }

    #[test]
    fn tree_nests_and_indents() {
        let mut tokens = Lexer::from_str("return x < 1;");
        let mut tree = XmlTreeWriter::new();
        tree.open("returnStatement");
        tree.token(&tokens.next().unwrap());
        tree.open("expression");
        tree.open("term");
        tree.token(&tokens.next().unwrap());
        tree.close("term");
        tree.token(&tokens.next().unwrap());
        tree.open("term");
        tree.token(&tokens.next().unwrap());
        tree.close("term");
        tree.close("expression");
        tree.token(&tokens.next().unwrap());
        tree.token(&tokens.next().unwrap());
        tree.close("returnStatement");
        assert_eq!(tree.depth(), 0);
        assert_eq!(
            tree.finish(),
            "<returnStatement>\n\
             \x20 <keyword> return </keyword>\n\
             \x20 <expression>\n\
             \x20   <term>\n\
             \x20     <identifier> x </identifier>\n\
             \x20   </term>\n\
             \x20   <symbol> &lt; </symbol>\n\
             \x20   <term>\n\
             \x20     <integerConstant> 1 </integerConstant>\n\
             \x20   </term>\n\
             \x20 </expression>\n\
             \x20 <symbol> ; </symbol>\n\
             </returnStatement>\n"
        );
    }

    #[test]
    fn tree_empty_nonterminal_takes_two_lines() {
        let mut tree = XmlTreeWriter::new();
        tree.open("parameterList");
        tree.close("parameterList");
        assert_eq!(tree.finish(), "<parameterList>\n</parameterList>\n");
    }
}
