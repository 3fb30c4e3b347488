//! # Tokenizer
//!
//! A streaming lexer for Jack source text.
//!
//! ```text
//!  impl Read (file, &[u8], …)
//!      │
//!      ▼
//!  ┌────────┐    Token stream
//!  │ Lexer  │ ──────────────────▶  (impl Iterator, ends with Eof)
//!  └────────┘
//! ```
//!
//! ```rust
//! use tokenizer::{Lexer, TokenKind};
//!
//! for token in Lexer::from_str("class Main { }") {
//!     if let TokenKind::Error(message) = &token.kind {
//!         eprintln!("{} at {}", message, token.span);
//!     }
//! }
//! ```

pub mod lexer;
pub mod span;
pub mod token;
pub mod xml;

pub use lexer::Lexer;
pub use span::{Pos, Span};
pub use token::{Keyword, Token, TokenKind};
pub use xml::{XmlError, XmlTreeWriter, write_token_xml};
