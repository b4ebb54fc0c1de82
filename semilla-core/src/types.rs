//! Primitive types and the compatibility rules between them.
//!
//! There are no user-defined types. The only implicit conversion is
//! widening an integer into a decimal, and only in that direction.

use std::fmt;

use crate::ast::{BinaryOp, Literal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Integer,
    Decimal,
    Boolean,
    String,
}

/// Source spelling of every valid type name, for diagnostics.
pub const TYPE_NAMES: [&str; 4] = ["entero", "decimal", "booleano", "cadena"];

impl Type {
    /// Resolve a type name as written in the source.
    pub fn from_name(name: &str) -> Option<Type> {
        match name {
            "entero" => Some(Type::Integer),
            "decimal" => Some(Type::Decimal),
            "booleano" => Some(Type::Boolean),
            "cadena" => Some(Type::String),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Type::Integer => "entero",
            Type::Decimal => "decimal",
            Type::Boolean => "booleano",
            Type::String => "cadena",
        }
    }

    pub fn of_literal(literal: &Literal) -> Type {
        match literal {
            Literal::Integer(_) => Type::Integer,
            Literal::Decimal(_) => Type::Decimal,
            Literal::String(_) => Type::String,
            Literal::Bool(_) => Type::Boolean,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a value of type `value` may be stored in a slot of type
/// `target`: identical types, or an integer widening into a decimal.
pub fn is_assignable(target: Type, value: Type) -> bool {
    target == value || (target == Type::Decimal && value == Type::Integer)
}

/// Result type of `lhs op rhs`, or `None` when the table has no entry.
///
/// | lhs      | rhs      | operators        | result   |
/// |----------|----------|------------------|----------|
/// | entero   | entero   | `+ - * / %`      | entero   |
/// | decimal  | decimal  | `+ - * /`        | decimal  |
/// | entero   | decimal  | `+ - * /`        | decimal  |
/// | decimal  | entero   | `+ - * /`        | decimal  |
/// | cadena   | cadena   | `+`              | cadena   |
/// | booleano | booleano | none             |          |
pub fn binary_result(lhs: Type, op: BinaryOp, rhs: Type) -> Option<Type> {
    use Type::*;

    match (lhs, rhs) {
        (Integer, Integer) => Some(Integer),
        (Decimal, Decimal) | (Integer, Decimal) | (Decimal, Integer) => {
            (op != BinaryOp::Rem).then_some(Decimal)
        }
        (String, String) => (op == BinaryOp::Add).then_some(String),
        _ => None,
    }
}

/// Whether two operands may appear on either side of a comparator.
pub fn is_comparable(lhs: Type, rhs: Type) -> bool {
    lhs == rhs
        || matches!(
            (lhs, rhs),
            (Type::Integer, Type::Decimal) | (Type::Decimal, Type::Integer)
        )
}
