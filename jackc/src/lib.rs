//! # jackc
//!
//! Single-pass compiler from Jack classes to stack-machine VM code.
//!
//! ```text
//!  source ──▶ tokenizer::Lexer ──▶ CompilationEngine ──▶ vmcode::VmWriter ──▶ sink
//!                                      │
//!                                      ▼
//!                                 SymbolTable
//! ```
//!
//! One class per compilation unit. Units share nothing but a read-only
//! [`CompileOptions`], so they can be compiled on separate threads.
//!
//! ```rust
//! use jackc::{CompileOptions, compile_to_vm};
//!
//! let vm = compile_to_vm(
//!     "class Main { function void main() { return; } }",
//!     &CompileOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(vm, "function Main.main 0\npush constant 0\nreturn\n");
//! ```

pub mod engine;
pub mod error;
pub mod options;
pub mod symbols;

pub use engine::{CompilationEngine, SubroutineKind};
pub use error::{CompileError, ErrorKind};
pub use options::{CompileOptions, RuntimeNames};
pub use symbols::{Symbol, SymbolKind, SymbolTable};

use tokenizer::Lexer;
use vmcode::{Instruction, InstructionSink};

/// Compile one class from `source`, emitting into `sink`.
///
/// Returns the class name. On error the sink keeps whatever was emitted
/// before the failure.
pub fn compile_class<S: InstructionSink>(
    source: &str,
    sink: S,
    options: &CompileOptions,
) -> Result<String, CompileError> {
    let mut engine = CompilationEngine::new(Lexer::from_str(source), sink, options);
    engine.compile_class()
}

/// Compile one class to VM text, one instruction per line.
pub fn compile_to_vm(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let mut out = String::new();
    compile_class(source, &mut out, options)?;
    Ok(out)
}

/// Compile one class and return its parse tree as indented XML.
///
/// The tree comes from the same pass that generates code, so a class must
/// compile cleanly to produce one.
pub fn compile_to_xml(source: &str, options: &CompileOptions) -> Result<String, CompileError> {
    let sink: Vec<Instruction> = Vec::new();
    let mut engine = CompilationEngine::new(Lexer::from_str(source), sink, options);
    engine.record_tree();
    engine.compile_class()?;
    Ok(engine.take_tree().unwrap_or_default())
}
