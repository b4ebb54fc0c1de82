//! Core analysis pipeline for the Semilla teaching language.
//!
//! The pipeline is roughly:
//!
//!   source text
//!     -> lexer      (tokens, fatal pre-pass for open comments/strings)
//!     -> parser     (typed AST, stops at the first syntax error)
//!     -> typecheck  (scopes, symbol table, type rules; reports everything)
//!
//! Front ends (the CLI, an editor integration, ...) should depend on this
//! crate and branch on the diagnostics it returns rather than
//! reimplementing any stage.

// ---------------------------------------------------------------------
// Error handling and diagnostics
// ---------------------------------------------------------------------

pub mod diagnostic;
pub mod error;

// ---------------------------------------------------------------------
// Front-end: lexing and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod token_summary;
pub mod parser;
pub mod ast;

// ---------------------------------------------------------------------
// Semantic layers: types, symbols, type checking
// ---------------------------------------------------------------------

pub mod types;
pub mod symbols;
pub mod typecheck;

// ---------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------

pub mod pipeline;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use diagnostic::{Diagnostic, Phase};
pub use error::CoreError;
pub use lexer::{Token, TokenKind, lexical_errors, tokenize};
pub use parser::{ParseResult, parse};
pub use pipeline::{Analysis, analyze};
pub use symbols::{FunctionRegistry, Symbol, SymbolCategory, SymbolTable};
pub use token_summary::{SummaryEntry, TokenCategory, summarize};
pub use typecheck::{TypeCheckResult, typecheck_program};
pub use types::Type;
