/// Token types produced by the Jack lexer.
use crate::span::Span;

/// The 21 reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
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

impl Keyword {
    /// Look up a scanned word; `None` means it is an ordinary identifier.
    pub fn from_word(word: &str) -> Option<Self> {
        let kw = match word {
            "class" => Self::Class,
            "constructor" => Self::Constructor,
            "function" => Self::Function,
            "method" => Self::Method,
            "field" => Self::Field,
            "static" => Self::Static,
            "var" => Self::Var,
            "int" => Self::Int,
            "char" => Self::Char,
            "boolean" => Self::Boolean,
            "void" => Self::Void,
            "true" => Self::True,
            "false" => Self::False,
            "null" => Self::Null,
            "this" => Self::This,
            "let" => Self::Let,
            "do" => Self::Do,
            "if" => Self::If,
            "else" => Self::Else,
            "while" => Self::While,
            "return" => Self::Return,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(&self) -> &'static str {
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

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Single-character symbols, including the `^`/`#` shift operators.
pub const SYMBOLS: &[char] = &[
    '{', '}', '(', ')', '[', ']', '.', ',', ';', '+', '-', '*', '/', '&', '|',
    '<', '>', '=', '~', '^', '#',
];

pub fn is_symbol(c: char) -> bool {
    SYMBOLS.contains(&c)
}

/// The kind of a lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A reserved word, e.g. `class`, `while`, `this`.
    Keyword(Keyword),
    /// A one-character symbol, e.g. `{`, `+`, `~`.
    Symbol(char),
    /// Decimal integer literal. Not range-checked here.
    Integer(u64),
    /// String literal body, without the surrounding quotes.
    String(std::string::String),
    /// A name that is not a reserved word.
    Identifier(std::string::String),

    /// End of input.
    Eof,
    /// An unrecognized character or malformed token.
    Error(std::string::String),
}

impl TokenKind {
    /// Human-readable name for error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Keyword(_) => "keyword",
            Self::Symbol(_) => "symbol",
            Self::Integer(_) => "integer constant",
            Self::String(_) => "string constant",
            Self::Identifier(_) => "identifier",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }
}

/// A token with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// The original source text of this token.
    pub lexeme: std::string::String,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        span: Span,
        lexeme: impl Into<std::string::String>,
    ) -> Self {
        Self {
            kind,
            span,
            lexeme: lexeme.into(),
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Describe the token for "expected X, found Y" messages.
    pub fn describe(&self) -> std::string::String {
        match &self.kind {
            TokenKind::Eof => "end of input".into(),
            TokenKind::String(_) => format!("string constant {}", self.lexeme),
            kind => format!("{} `{}`", kind.name(), self.lexeme),
        }
    }
}
