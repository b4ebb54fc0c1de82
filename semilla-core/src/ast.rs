//! Abstract syntax tree produced by the parser.
//!
//! The tree is owned top-down: every node owns its children and there
//! are no back-pointers. Name-binding positions (the declared name of a
//! variable, function or parameter, and an assignment target) are
//! [`Ident`] fields, separate from name *uses* inside expressions
//! ([`ExprKind::Ident`]), so consumers never confuse the two.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

/// A name in a binding position, with the line it was written on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub line: u32,
}

/// A type name exactly as written in the source.
///
/// The parser only accepts the four type keywords here, but the tree
/// keeps the text so the analyzer can validate trees built by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeName {
    pub name: String,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    VarDecl(VarDecl),
    FuncDecl(FuncDecl),
    Assign(Assign),
    If(IfStmt),
    While(WhileStmt),
    DoWhile(DoWhileStmt),
}

impl Stmt {
    pub fn line(&self) -> u32 {
        match self {
            Stmt::VarDecl(decl) => decl.line,
            Stmt::FuncDecl(decl) => decl.line,
            Stmt::Assign(assign) => assign.line,
            Stmt::If(stmt) => stmt.line,
            Stmt::While(stmt) => stmt.line,
            Stmt::DoWhile(stmt) => stmt.line,
        }
    }
}

/// `TYPE IDENT '=' expression ';'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarDecl {
    pub ty: TypeName,
    pub name: Ident,
    pub init: Expr,
    pub line: u32,
}

/// `TYPE IDENT '(' params ')' block`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub return_ty: TypeName,
    pub name: Ident,
    pub params: Vec<Param>,
    pub body: Block,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub ty: TypeName,
    pub name: Ident,
    pub line: u32,
}

/// `IDENT '=' expression ';'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assign {
    pub target: Ident,
    pub value: Expr,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStmt {
    pub cond: Condition,
    pub then_block: Block,
    pub else_block: Option<Block>,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileStmt {
    pub cond: Condition,
    pub body: Block,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoWhileStmt {
    pub body: Block,
    pub cond: Condition,
    pub line: u32,
}

/// `'{' declaration* '}'`; `line` is the line of the opening brace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub statements: Vec<Stmt>,
    pub line: u32,
}

/// `expression comparator expression`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub lhs: Expr,
    pub op: Comparator,
    pub rhs: Expr,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl Comparator {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparator::Eq => "==",
            Comparator::NotEq => "!=",
            Comparator::Less => "<",
            Comparator::Greater => ">",
            Comparator::LessEq => "<=",
            Comparator::GreaterEq => ">=",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub kind: ExprKind,
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprKind {
    Literal(Literal),
    Ident(String),
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// Literal values keep their source text; nothing downstream needs the
/// numeric value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    Integer(String),
    Decimal(String),
    String(String),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
        }
    }
}

// ---------------------------------------------------------------------
// Outline rendering
// ---------------------------------------------------------------------

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "program")?;
        for stmt in &self.statements {
            write_stmt(f, stmt, 1)?;
        }
        Ok(())
    }
}

fn indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    write!(f, "{:width$}", "", width = depth * 2)
}

fn write_stmt(f: &mut fmt::Formatter<'_>, stmt: &Stmt, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match stmt {
        Stmt::VarDecl(decl) => {
            writeln!(f, "var {} {} @{}", decl.ty.name, decl.name.name, decl.line)?;
            write_expr(f, &decl.init, depth + 1)
        }
        Stmt::FuncDecl(decl) => {
            let params: Vec<String> = decl
                .params
                .iter()
                .map(|param| format!("{} {}", param.ty.name, param.name.name))
                .collect();
            writeln!(
                f,
                "function {} {}({}) @{}",
                decl.return_ty.name,
                decl.name.name,
                params.join(", "),
                decl.line
            )?;
            write_block(f, &decl.body, depth + 1)
        }
        Stmt::Assign(assign) => {
            writeln!(f, "assign {} @{}", assign.target.name, assign.line)?;
            write_expr(f, &assign.value, depth + 1)
        }
        Stmt::If(stmt) => {
            writeln!(f, "si @{}", stmt.line)?;
            write_condition(f, &stmt.cond, depth + 1)?;
            write_block(f, &stmt.then_block, depth + 1)?;
            if let Some(else_block) = &stmt.else_block {
                indent(f, depth)?;
                writeln!(f, "sino")?;
                write_block(f, else_block, depth + 1)?;
            }
            Ok(())
        }
        Stmt::While(stmt) => {
            writeln!(f, "mientras @{}", stmt.line)?;
            write_condition(f, &stmt.cond, depth + 1)?;
            write_block(f, &stmt.body, depth + 1)
        }
        Stmt::DoWhile(stmt) => {
            writeln!(f, "hacer @{}", stmt.line)?;
            write_block(f, &stmt.body, depth + 1)?;
            write_condition(f, &stmt.cond, depth + 1)
        }
    }
}

fn write_block(f: &mut fmt::Formatter<'_>, block: &Block, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    writeln!(f, "block @{}", block.line)?;
    for stmt in &block.statements {
        write_stmt(f, stmt, depth + 1)?;
    }
    Ok(())
}

fn write_condition(f: &mut fmt::Formatter<'_>, cond: &Condition, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    writeln!(f, "condition {} @{}", cond.op.as_str(), cond.line)?;
    write_expr(f, &cond.lhs, depth + 1)?;
    write_expr(f, &cond.rhs, depth + 1)
}

fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expr, depth: usize) -> fmt::Result {
    indent(f, depth)?;
    match &expr.kind {
        ExprKind::Literal(Literal::Integer(text)) => writeln!(f, "integer {text}"),
        ExprKind::Literal(Literal::Decimal(text)) => writeln!(f, "decimal {text}"),
        ExprKind::Literal(Literal::String(text)) => writeln!(f, "string {text}"),
        ExprKind::Literal(Literal::Bool(value)) => writeln!(f, "boolean {value}"),
        ExprKind::Ident(name) => writeln!(f, "ident {name}"),
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(f, "binary {}", op.as_str())?;
            write_expr(f, lhs, depth + 1)?;
            write_expr(f, rhs, depth + 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outline_lists_children_in_order() {
        let program = Program {
            statements: vec![Stmt::VarDecl(VarDecl {
                ty: TypeName { name: "entero".into(), line: 1 },
                name: Ident { name: "x".into(), line: 1 },
                init: Expr {
                    kind: ExprKind::Binary {
                        op: BinaryOp::Add,
                        lhs: Box::new(Expr {
                            kind: ExprKind::Literal(Literal::Integer("1".into())),
                            line: 1,
                        }),
                        rhs: Box::new(Expr {
                            kind: ExprKind::Ident("y".into()),
                            line: 1,
                        }),
                    },
                    line: 1,
                },
                line: 1,
            })],
        };

        assert_eq!(
            program.to_string(),
            "program\n  var entero x @1\n    binary +\n      integer 1\n      ident y\n"
        );
    }
}
