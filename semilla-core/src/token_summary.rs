//! Token occurrence summary for the presentation layer.
//!
//! Tokens are grouped by their lexeme and a coarse display category,
//! and counted. Groups keep the order in which they first appear.

use std::collections::HashMap;
use std::fmt;

use crate::lexer::{Token, TokenKind};

/// Coarse grouping of token kinds for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenCategory {
    Operator,
    Sign,
    ReservedWord,
    Identifier,
    Integer,
    Decimal,
    String,
    Error,
}

impl TokenCategory {
    pub fn of(kind: TokenKind) -> TokenCategory {
        use TokenKind::*;

        match kind {
            Assign | Plus | Minus | Star | Slash | Percent | EqEq | NotEq | LessEq | GreaterEq
            | Less | Greater => TokenCategory::Operator,
            LParen | RParen | LBrace | RBrace | Semi | Comma | Dot => TokenCategory::Sign,
            Keyword(_) => TokenCategory::ReservedWord,
            Ident => TokenCategory::Identifier,
            IntLiteral => TokenCategory::Integer,
            DecimalLiteral => TokenCategory::Decimal,
            StringLiteral => TokenCategory::String,
            Error => TokenCategory::Error,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TokenCategory::Operator => "operator",
            TokenCategory::Sign => "sign",
            TokenCategory::ReservedWord => "reserved word",
            TokenCategory::Identifier => "identifier",
            TokenCategory::Integer => "integer",
            TokenCategory::Decimal => "decimal",
            TokenCategory::String => "string",
            TokenCategory::Error => "error",
        }
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryEntry {
    pub lexeme: String,
    pub category: TokenCategory,
    pub count: usize,
}

pub fn summarize(tokens: &[Token]) -> Vec<SummaryEntry> {
    let mut entries: Vec<SummaryEntry> = Vec::new();
    let mut positions: HashMap<(&str, TokenCategory), usize> = HashMap::new();

    for token in tokens {
        let category = TokenCategory::of(token.kind);
        match positions.get(&(token.lexeme.as_str(), category)) {
            Some(&at) => entries[at].count += 1,
            None => {
                positions.insert((token.lexeme.as_str(), category), entries.len());
                entries.push(SummaryEntry {
                    lexeme: token.lexeme.clone(),
                    category,
                    count: 1,
                });
            }
        }
    }

    entries
}
