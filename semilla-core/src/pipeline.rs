//! Pipeline orchestration: source text to symbol table.
//!
//! ```text
//! source -> tokenize -> lexical_errors -> parse -> typecheck_program
//! ```
//!
//! Lexical and syntax problems stop the pipeline and come back as a
//! [`CoreError`]. Semantic problems never stop it; they are returned
//! in [`Analysis::diagnostics`] next to the symbol table.

use log::debug;

use crate::ast::Program;
use crate::diagnostic::Diagnostic;
use crate::error::CoreError;
use crate::lexer::{Token, lexical_errors, tokenize};
use crate::parser::parse;
use crate::symbols::{FunctionRegistry, SymbolTable};
use crate::typecheck::typecheck_program;

/// Everything produced by a run that reached semantic analysis.
#[derive(Debug)]
pub struct Analysis {
    pub tokens: Vec<Token>,
    pub program: Program,
    /// Semantic diagnostics in traversal order.
    pub diagnostics: Vec<Diagnostic>,
    pub symbols: SymbolTable,
    pub functions: FunctionRegistry,
}

impl Analysis {
    /// Whether the program passed every stage without a diagnostic.
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub fn analyze(source: &str) -> Result<Analysis, CoreError> {
    let tokens = tokenize(source).map_err(|fatal| CoreError::Lexical(vec![fatal]))?;

    let errors = lexical_errors(&tokens);
    if !errors.is_empty() {
        debug!("halting after {} unrecognized characters", errors.len());
        return Err(CoreError::Lexical(errors));
    }

    let program = parse(&tokens).into_program().map_err(|diagnostics| {
        debug!("halting after {} syntax diagnostics", diagnostics.len());
        CoreError::Syntax(diagnostics)
    })?;

    let checked = typecheck_program(&program);
    Ok(Analysis {
        tokens,
        program,
        diagnostics: checked.diagnostics,
        symbols: checked.symbols,
        functions: checked.functions,
    })
}
