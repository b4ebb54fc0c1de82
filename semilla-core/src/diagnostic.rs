//! Diagnostics shared by every stage of the pipeline.
//!
//! A diagnostic is plain data: the stage that produced it, a message,
//! the 1-based source line it points at, and an optional detail line
//! for the presentation layer to show underneath the message.

use std::fmt;

/// Pipeline stage that reported a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Lexical,
    Syntactic,
    Semantic,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Lexical => "lexical",
            Phase::Syntactic => "syntactic",
            Phase::Semantic => "semantic",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,
    pub line: u32,
    pub detail: Option<String>,
}

impl Diagnostic {
    pub fn new(phase: Phase, message: impl Into<String>, line: u32) -> Self {
        Diagnostic {
            phase,
            message: message.into(),
            line,
            detail: None,
        }
    }

    pub fn lexical(message: impl Into<String>, line: u32) -> Self {
        Self::new(Phase::Lexical, message, line)
    }

    pub fn syntactic(message: impl Into<String>, line: u32) -> Self {
        Self::new(Phase::Syntactic, message, line)
    }

    pub fn semantic(message: impl Into<String>, line: u32) -> Self {
        Self::new(Phase::Semantic, message, line)
    }

    /// Attach an explanatory detail line.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] line {}: {}", self.phase, self.line, self.message)?;
        if let Some(detail) = &self.detail {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_detail_when_present() {
        let diag = Diagnostic::semantic("variable 'x' is not declared", 4)
            .with_detail("declare the variable before using it");
        assert_eq!(
            diag.to_string(),
            "[semantic] line 4: variable 'x' is not declared (declare the variable before using it)"
        );
    }

    #[test]
    fn display_without_detail() {
        let diag = Diagnostic::lexical("unexpected character '@'", 1);
        assert_eq!(diag.to_string(), "[lexical] line 1: unexpected character '@'");
    }
}
