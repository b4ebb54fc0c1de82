use thiserror::Error;

use crate::diagnostic::Diagnostic;

/// Reasons the pipeline stopped before reaching semantic analysis.
///
/// Semantic diagnostics are never reported through this type: once the
/// analyzer runs, its findings travel with the symbol table in
/// [`crate::pipeline::Analysis`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("lexical analysis failed: {}", first_message(.0))]
    Lexical(Vec<Diagnostic>),
    #[error("syntax analysis failed: {}", first_message(.0))]
    Syntax(Vec<Diagnostic>),
}

impl CoreError {
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CoreError::Lexical(diagnostics) | CoreError::Syntax(diagnostics) => diagnostics,
        }
    }
}

fn first_message(diagnostics: &[Diagnostic]) -> String {
    match diagnostics {
        [] => "no diagnostics recorded".to_string(),
        [only] => only.to_string(),
        [first, rest @ ..] => format!("{first} (and {} more)", rest.len()),
    }
}
