//! Recursive-descent parser.
//!
//! ```text
//! program        := declaration*
//! declaration    := varOrFuncDecl | controlStructure | assignment
//! varOrFuncDecl  := TYPE IDENT ( '(' paramList ')' block | '=' expression ';' )
//! paramList      := (TYPE IDENT (',' TYPE IDENT)*)?
//! assignment     := IDENT '=' expression ';'
//! controlStruct  := ifStmt | whileStmt | doWhileStmt
//! ifStmt         := 'si' '(' condition ')' block ('sino' block)?
//! whileStmt      := 'mientras' '(' condition ')' block
//! doWhileStmt    := 'hacer' block 'mientras' '(' condition ')'
//! block          := '{' declaration* '}'
//! condition      := expression comparator expression
//! expression     := term (('+'|'-') term)*
//! term           := factor (('*'|'/'|'%') factor)*
//! factor         := INT | DECIMAL | IDENT | STRING | 'verdadero' | 'falso' | '(' expression ')'
//! ```
//!
//! Recovery is deliberately shallow. As soon as one diagnostic is
//! recorded, the enclosing program or block loop stops taking new
//! declarations. A block still looks for its closing `}`; when it is
//! not there, every diagnostic recorded so far is dropped and replaced
//! by a single "missing '}'" diagnostic at the line the block opened.
//!
//! Diagnostics for a missing `;` or `)` point at the line of the last
//! consumed token, where the punctuation should have been written.

use log::debug;

use crate::ast::{
    Assign, BinaryOp, Block, Comparator, Condition, DoWhileStmt, Expr, ExprKind, FuncDecl, Ident,
    IfStmt, Literal, Param, Program, Stmt, TypeName, VarDecl, WhileStmt,
};
use crate::diagnostic::Diagnostic;
use crate::lexer::{Keyword, Token, TokenKind};

/// Deepest nesting accepted before parsing is abandoned. Blocks,
/// parentheses and binary operators each count as one level.
const MAX_NESTING: usize = 256;

pub(crate) const VALID_TYPES_HINT: &str = "valid types are: entero, decimal, cadena, booleano";

/// Output of [`parse`].
///
/// `program` is `None` only when parsing was abandoned because of an
/// internal fault. Any diagnostic means the tree must not be analyzed.
#[derive(Debug)]
pub struct ParseResult {
    pub program: Option<Program>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// The tree, if it was produced without diagnostics.
    pub fn into_program(self) -> Result<Program, Vec<Diagnostic>> {
        match self.program {
            Some(program) if self.diagnostics.is_empty() => Ok(program),
            _ => Err(self.diagnostics),
        }
    }
}

pub fn parse(tokens: &[Token]) -> ParseResult {
    let mut parser = Parser {
        tokens,
        position: 0,
        depth: 0,
        diagnostics: Vec::new(),
        fault: None,
    };
    let program = parser.program();

    if let Some(reason) = parser.fault.take() {
        let line = parser.current_line();
        debug!("parser fault at line {line}: {reason}");
        return ParseResult {
            program: None,
            diagnostics: vec![
                Diagnostic::syntactic("unexpected failure during syntax analysis", line)
                    .with_detail(reason),
            ],
        };
    }

    debug!(
        "parsed {} top-level declarations with {} diagnostics",
        program.statements.len(),
        parser.diagnostics.len()
    );
    ParseResult {
        program: Some(program),
        diagnostics: parser.diagnostics,
    }
}

struct Parser<'t> {
    tokens: &'t [Token],
    position: usize,
    depth: usize,
    diagnostics: Vec<Diagnostic>,
    fault: Option<String>,
}

impl<'t> Parser<'t> {
    // -----------------------------------------------------------------
    // Grammar rules
    // -----------------------------------------------------------------

    fn program(&mut self) -> Program {
        let mut statements = Vec::new();
        while self.current().is_some() && !self.halted() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        Program { statements }
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let token = self.current()?;

        match token.kind {
            TokenKind::Keyword(keyword) if keyword.is_type() => self.var_or_func_decl(),
            TokenKind::Keyword(Keyword::If) => self.if_stmt(),
            TokenKind::Keyword(Keyword::While) => self.while_stmt(),
            TokenKind::Keyword(Keyword::Do) => self.do_while_stmt(),
            TokenKind::Ident => {
                // `IDENT IDENT` reads like a declaration with a misspelled type.
                if self.peek_next_kind() == Some(TokenKind::Ident) {
                    self.push(
                        Diagnostic::syntactic(format!("invalid type name '{}'", token.lexeme), token.line)
                            .with_detail(VALID_TYPES_HINT),
                    );
                    self.advance();
                    return None;
                }
                self.assignment()
            }
            _ => {
                self.push(
                    Diagnostic::syntactic(
                        "unexpected statement: expected a type name or a control keyword",
                        token.line,
                    )
                    .with_detail(format!("found '{}'", token.lexeme)),
                );
                self.advance();
                None
            }
        }
    }

    fn var_or_func_decl(&mut self) -> Option<Stmt> {
        let type_token = self.advance()?;
        let line = type_token.line;
        let ty = TypeName {
            name: type_token.lexeme.clone(),
            line,
        };

        let Some(name_token) = self.current().filter(|t| t.kind == TokenKind::Ident) else {
            self.error(
                format!("expected an identifier after type '{}'", ty.name),
                self.current_line(),
            );
            return None;
        };
        self.advance();
        let name = Ident {
            name: name_token.lexeme.clone(),
            line: name_token.line,
        };

        match self.peek_kind() {
            Some(TokenKind::LParen) => self.function_decl(ty, name, line),
            Some(TokenKind::Assign) => self.variable_decl(ty, name, line),
            _ => {
                self.push(
                    Diagnostic::syntactic(
                        format!("expected '=' or '(' after identifier '{}'", name.name),
                        self.current_line(),
                    )
                    .with_detail(self.found()),
                );
                None
            }
        }
    }

    fn variable_decl(&mut self, ty: TypeName, name: Ident, line: u32) -> Option<Stmt> {
        self.advance(); // '='
        let init = self.expression()?;

        if let Some(token) = self.current() {
            if matches!(
                token.kind,
                TokenKind::IntLiteral | TokenKind::DecimalLiteral | TokenKind::Ident
            ) {
                self.push(
                    Diagnostic::syntactic(
                        format!("missing operator in the expression of variable '{}'", name.name),
                        token.line,
                    )
                    .with_detail(format!(
                        "found '{}' without a preceding operator; check that the operators (+, -, *, /, %) are present",
                        token.lexeme
                    )),
                );
                return None;
            }
        }

        self.expect_closing(
            TokenKind::Semi,
            format!("expected ';' at the end of the declaration of variable '{}'", name.name),
        )?;

        Some(Stmt::VarDecl(VarDecl {
            ty,
            name,
            init,
            line,
        }))
    }

    fn assignment(&mut self) -> Option<Stmt> {
        let target_token = self.advance()?;
        let line = target_token.line;
        let target = Ident {
            name: target_token.lexeme.clone(),
            line,
        };

        self.expect(TokenKind::Assign, format!("expected '=' after '{}'", target.name))?;
        let value = self.expression()?;
        self.expect_closing(
            TokenKind::Semi,
            format!("expected ';' at the end of the assignment to '{}'", target.name),
        )?;

        Some(Stmt::Assign(Assign {
            target,
            value,
            line,
        }))
    }

    /// Parameter count is not checked here; arity is a semantic rule.
    fn function_decl(&mut self, return_ty: TypeName, name: Ident, line: u32) -> Option<Stmt> {
        self.advance(); // '('
        let params = self.parameters();
        if self.halted() {
            return None;
        }

        self.expect_closing(
            TokenKind::RParen,
            format!("expected ')' in function '{}'", name.name),
        )?;
        let body = self.block()?;

        Some(Stmt::FuncDecl(FuncDecl {
            return_ty,
            name,
            params,
            body,
            line,
        }))
    }

    fn parameters(&mut self) -> Vec<Param> {
        let mut params = Vec::new();
        if self.check(TokenKind::RParen) {
            return params;
        }

        match self.parameter() {
            Some(param) => params.push(param),
            None => return params,
        }
        while self.check(TokenKind::Comma) {
            self.advance();
            match self.parameter() {
                Some(param) => params.push(param),
                None => break,
            }
        }

        params
    }

    fn parameter(&mut self) -> Option<Param> {
        let line = self.current_line();

        let Some(type_token) = self
            .current()
            .filter(|t| matches!(t.kind, TokenKind::Keyword(_)))
        else {
            self.error("expected a type name for the parameter", line);
            return None;
        };
        if !matches!(type_token.kind, TokenKind::Keyword(keyword) if keyword.is_type()) {
            self.push(
                Diagnostic::syntactic(
                    format!("invalid type in parameter: '{}'", type_token.lexeme),
                    line,
                )
                .with_detail(VALID_TYPES_HINT),
            );
            return None;
        }
        self.advance();

        let Some(name_token) = self.current().filter(|t| t.kind == TokenKind::Ident) else {
            self.error("expected an identifier for the parameter", self.current_line());
            return None;
        };
        self.advance();

        Some(Param {
            ty: TypeName {
                name: type_token.lexeme.clone(),
                line,
            },
            name: Ident {
                name: name_token.lexeme.clone(),
                line: name_token.line,
            },
            line,
        })
    }

    fn if_stmt(&mut self) -> Option<Stmt> {
        let line = self.current_line();
        self.advance(); // 'si'

        self.expect(TokenKind::LParen, "expected '(' after 'si'")?;
        let cond = self.condition()?;
        self.expect_closing(TokenKind::RParen, "expected ')' after the condition")?;
        let then_block = self.block()?;

        let else_block = if self.check_keyword(Keyword::Else) {
            self.advance();
            Some(self.block()?)
        } else {
            None
        };

        Some(Stmt::If(IfStmt {
            cond,
            then_block,
            else_block,
            line,
        }))
    }

    fn while_stmt(&mut self) -> Option<Stmt> {
        let line = self.current_line();
        self.advance(); // 'mientras'

        self.expect(TokenKind::LParen, "expected '(' after 'mientras'")?;
        let cond = self.condition()?;
        self.expect_closing(TokenKind::RParen, "expected ')' after the condition")?;
        let body = self.block()?;

        Some(Stmt::While(WhileStmt { cond, body, line }))
    }

    fn do_while_stmt(&mut self) -> Option<Stmt> {
        let line = self.current_line();
        self.advance(); // 'hacer'

        let body = self.block()?;
        let closing_line = self.previous_line();

        if !self.check_keyword(Keyword::While) {
            self.push(
                Diagnostic::syntactic("expected 'mientras' after the body of 'hacer'", closing_line)
                    .with_detail("the expected form is: hacer { ... } mientras (condition)"),
            );
            return None;
        }
        self.advance();

        self.expect(TokenKind::LParen, "expected '(' after 'mientras'")?;
        let cond = self.condition()?;
        self.expect_closing(TokenKind::RParen, "expected ')' after the condition")?;

        Some(Stmt::DoWhile(DoWhileStmt { body, cond, line }))
    }

    fn block(&mut self) -> Option<Block> {
        let line = self.current_line();
        if !self.enter() {
            return None;
        }
        let block = self.block_contents(line);
        self.depth -= 1;
        block
    }

    fn block_contents(&mut self, line: u32) -> Option<Block> {
        self.expect(TokenKind::LBrace, "expected '{' at the start of the block");

        let mut statements = Vec::new();
        while !self.halted() && !self.check(TokenKind::RBrace) && self.current().is_some() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        if !self.check(TokenKind::RBrace) {
            if !self.diagnostics.is_empty() {
                debug!(
                    "dropping {} diagnostics in favour of the unclosed block at line {line}",
                    self.diagnostics.len()
                );
                self.diagnostics.clear();
            }
            self.push(
                Diagnostic::syntactic(format!("missing '}}' for the block opened at line {line}"), line)
                    .with_detail(format!("the block opened at line {line} is never closed")),
            );
            return None;
        }
        self.advance();

        if self.halted() {
            return None;
        }
        Some(Block { statements, line })
    }

    fn condition(&mut self) -> Option<Condition> {
        let line = self.current_line();
        let lhs = self.expression()?;

        let op = match self.peek_kind() {
            Some(TokenKind::EqEq) => Comparator::Eq,
            Some(TokenKind::NotEq) => Comparator::NotEq,
            Some(TokenKind::Less) => Comparator::Less,
            Some(TokenKind::Greater) => Comparator::Greater,
            Some(TokenKind::LessEq) => Comparator::LessEq,
            Some(TokenKind::GreaterEq) => Comparator::GreaterEq,
            _ => {
                self.push(
                    Diagnostic::syntactic(
                        "expected a comparator (==, !=, <, >, <=, >=)",
                        self.current_line(),
                    )
                    .with_detail(self.found()),
                );
                return None;
            }
        };
        self.advance();

        // A stray '=' after the comparator, as in `===`.
        if self.check(TokenKind::Assign) {
            self.push(
                Diagnostic::syntactic(
                    format!("invalid comparator: '{}=' is not valid", op.as_str()),
                    self.current_line(),
                )
                .with_detail("valid comparators are ==, !=, <, >, <=, >=; do not write three '=' in a row"),
            );
            return None;
        }

        let rhs = self.expression()?;
        Some(Condition { lhs, op, rhs, line })
    }

    fn expression(&mut self) -> Option<Expr> {
        self.binary_chain(Self::term, additive_op)
    }

    fn term(&mut self) -> Option<Expr> {
        self.binary_chain(Self::factor, multiplicative_op)
    }

    /// `operand (operator operand)*`, folded to the left.
    ///
    /// Every operator adds one level to the tree, so each one counts
    /// against the nesting limit until the chain is finished.
    fn binary_chain(
        &mut self,
        operand: fn(&mut Self) -> Option<Expr>,
        operator: fn(TokenKind) -> Option<BinaryOp>,
    ) -> Option<Expr> {
        let line = self.current_line();
        let mut lhs = operand(self)?;
        let outer_depth = self.depth;

        let chain = loop {
            let Some(op) = self.peek_kind().and_then(operator) else {
                break Some(lhs);
            };
            if !self.enter() {
                break None;
            }
            self.advance();
            let Some(rhs) = operand(self) else {
                break None;
            };
            lhs = Expr {
                kind: ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                line,
            };
        };

        self.depth = outer_depth;
        chain
    }

    fn factor(&mut self) -> Option<Expr> {
        let Some(token) = self.current() else {
            self.push(
                Diagnostic::syntactic("unexpected factor in expression", self.current_line())
                    .with_detail("reached end of input"),
            );
            return None;
        };

        let kind = match token.kind {
            TokenKind::IntLiteral => ExprKind::Literal(Literal::Integer(token.lexeme.clone())),
            TokenKind::DecimalLiteral => ExprKind::Literal(Literal::Decimal(token.lexeme.clone())),
            TokenKind::StringLiteral => ExprKind::Literal(Literal::String(token.lexeme.clone())),
            TokenKind::Keyword(Keyword::True) => ExprKind::Literal(Literal::Bool(true)),
            TokenKind::Keyword(Keyword::False) => ExprKind::Literal(Literal::Bool(false)),
            TokenKind::Ident => ExprKind::Ident(token.lexeme.clone()),
            TokenKind::LParen => return self.parenthesized(),
            _ => {
                self.push(
                    Diagnostic::syntactic("unexpected factor in expression", token.line)
                        .with_detail(format!("found '{}'", token.lexeme)),
                );
                return None;
            }
        };
        self.advance();

        Some(Expr {
            kind,
            line: token.line,
        })
    }

    fn parenthesized(&mut self) -> Option<Expr> {
        if !self.enter() {
            return None;
        }
        self.advance(); // '('
        let inner = self.expression();
        self.depth -= 1;
        let inner = inner?;

        self.expect_closing(TokenKind::RParen, "expected ')' after the expression")?;
        Some(inner)
    }

    // -----------------------------------------------------------------
    // Token cursor
    // -----------------------------------------------------------------

    fn current(&self) -> Option<&'t Token> {
        self.tokens.get(self.position)
    }

    fn peek_kind(&self) -> Option<TokenKind> {
        self.current().map(|token| token.kind)
    }

    fn peek_next_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.position + 1).map(|token| token.kind)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    fn check_keyword(&self, keyword: Keyword) -> bool {
        self.check(TokenKind::Keyword(keyword))
    }

    fn advance(&mut self) -> Option<&'t Token> {
        let token = self.current()?;
        self.position += 1;
        Some(token)
    }

    /// Line of the current token; at end of input, the last token's line.
    fn current_line(&self) -> u32 {
        self.current()
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.line)
    }

    /// Line of the most recently consumed token.
    fn previous_line(&self) -> u32 {
        match self.position.checked_sub(1).and_then(|at| self.tokens.get(at)) {
            Some(token) => token.line,
            None => self.current_line(),
        }
    }

    fn found(&self) -> String {
        match self.current() {
            Some(token) => format!("found '{}'", token.lexeme),
            None => "reached end of input".to_string(),
        }
    }

    /// Consume a token of `kind` or report `message` at the current line.
    fn expect(&mut self, kind: TokenKind, message: impl Into<String>) -> Option<&'t Token> {
        if self.check(kind) {
            return self.advance();
        }
        let diag = Diagnostic::syntactic(message, self.current_line()).with_detail(self.found());
        self.push(diag);
        None
    }

    /// Like [`Parser::expect`], but a failure is reported at the line of
    /// the previous token, where the missing punctuation belongs.
    fn expect_closing(&mut self, kind: TokenKind, message: impl Into<String>) -> Option<&'t Token> {
        if self.check(kind) {
            return self.advance();
        }
        let diag = Diagnostic::syntactic(message, self.previous_line()).with_detail(self.found());
        self.push(diag);
        None
    }

    // -----------------------------------------------------------------
    // Diagnostics and nesting
    // -----------------------------------------------------------------

    fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn error(&mut self, message: impl Into<String>, line: u32) {
        self.push(Diagnostic::syntactic(message, line));
    }

    fn halted(&self) -> bool {
        !self.diagnostics.is_empty() || self.fault.is_some()
    }

    fn enter(&mut self) -> bool {
        if self.depth >= MAX_NESTING {
            if self.fault.is_none() {
                self.fault = Some(format!("nesting exceeds {MAX_NESTING} levels"));
            }
            return false;
        }
        self.depth += 1;
        true
    }
}

fn additive_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

fn multiplicative_op(kind: TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        TokenKind::Percent => Some(BinaryOp::Rem),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;
    use test_log::test;

    fn parse_source(source: &str) -> ParseResult {
        parse(&tokenize(source).expect("tokenize"))
    }

    fn single_diagnostic(source: &str) -> Diagnostic {
        let result = parse_source(source);
        assert_eq!(result.diagnostics.len(), 1, "diagnostics: {:#?}", result.diagnostics);
        result.diagnostics.into_iter().next().expect("one diagnostic")
    }

    #[test]
    fn parses_variable_declarations() {
        let program = parse_source("entero x = 5; decimal y = x + 2.5;")
            .into_program()
            .expect("parse");
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(&program.statements[0], Stmt::VarDecl(decl) if decl.name.name == "x"));
        let Stmt::VarDecl(decl) = &program.statements[1] else {
            panic!("unexpected statement");
        };
        assert_eq!(decl.ty.name, "decimal");
        assert!(matches!(
            decl.init.kind,
            ExprKind::Binary { op: BinaryOp::Add, .. }
        ));
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let program = parse_source("entero x = 1 + 2 * 3;").into_program().expect("parse");
        let Stmt::VarDecl(decl) = &program.statements[0] else {
            panic!("unexpected statement");
        };
        let ExprKind::Binary { op, rhs, .. } = &decl.init.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(rhs.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
    }

    #[test]
    fn parentheses_group_without_a_node() {
        let program = parse_source("entero x = (1 + 2) * 3;").into_program().expect("parse");
        let Stmt::VarDecl(decl) = &program.statements[0] else {
            panic!("unexpected statement");
        };
        let ExprKind::Binary { op, lhs, .. } = &decl.init.kind else {
            panic!("expected binary expression");
        };
        assert_eq!(*op, BinaryOp::Mul);
        assert!(matches!(lhs.kind, ExprKind::Binary { op: BinaryOp::Add, .. }));
    }

    #[test]
    fn parses_function_with_any_parameter_count() {
        let program = parse_source("entero suma(entero a) { entero r = a; }")
            .into_program()
            .expect("parse");
        let Stmt::FuncDecl(func) = &program.statements[0] else {
            panic!("unexpected statement");
        };
        assert_eq!(func.name.name, "suma");
        assert_eq!(func.params.len(), 1);
        assert_eq!(func.body.statements.len(), 1);
    }

    #[test]
    fn parses_control_structures() {
        let source = "\
entero i = 0;
si (i < 10) { i = i + 1; } sino { i = 0; }
mientras (i != 0) { i = i - 1; }
hacer { i = i + 2; } mientras (i <= 8)
";
        let program = parse_source(source).into_program().expect("parse");
        assert_eq!(program.statements.len(), 4);
        let Stmt::If(stmt) = &program.statements[1] else {
            panic!("expected si");
        };
        assert_eq!(stmt.cond.op, Comparator::Less);
        assert!(stmt.else_block.is_some());
        assert!(matches!(program.statements[2], Stmt::While(_)));
        let Stmt::DoWhile(stmt) = &program.statements[3] else {
            panic!("expected hacer");
        };
        assert_eq!(stmt.cond.op, Comparator::LessEq);
    }

    #[test]
    fn missing_semicolon_points_at_previous_line() {
        let diag = single_diagnostic("entero x = 5\nentero y = 6;");
        // `entero` on line 2 is not an operand, so this is the terminator rule.
        assert_eq!(diag.line, 1);
        assert!(diag.message.contains("expected ';'"));
    }

    #[test]
    fn missing_operator_is_reported_at_the_operand() {
        let diag = single_diagnostic("entero x = 5\n3;");
        assert!(diag.message.contains("missing operator"));
        assert_eq!(diag.line, 2);
    }

    #[test]
    fn identifier_followed_by_identifier_is_an_invalid_type() {
        let diag = single_diagnostic("numero x = 5;");
        assert_eq!(diag.message, "invalid type name 'numero'");
        assert_eq!(diag.detail.as_deref(), Some(VALID_TYPES_HINT));
    }

    #[test]
    fn stops_after_the_first_top_level_error() {
        let result = parse_source("x = ;\ny = ;\n");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].line, 1);
    }

    #[test]
    fn stray_equals_after_comparator() {
        let diag = single_diagnostic("si (a === b) { a = 1; }");
        assert_eq!(diag.message, "invalid comparator: '===' is not valid");
    }

    #[test]
    fn unclosed_block_replaces_interior_diagnostics() {
        let source = "\
entero x = 0;
mientras (x < 10) {
    x = x + 1
";
        let diag = single_diagnostic(source);
        assert_eq!(diag.message, "missing '}' for the block opened at line 2");
        assert_eq!(diag.line, 2);
    }

    #[test]
    fn closed_block_keeps_interior_diagnostic() {
        let diag = single_diagnostic("si (a < b) {\n a = 1\n}");
        assert!(diag.message.contains("expected ';'"));
        assert_eq!(diag.line, 2);
    }

    #[test]
    fn missing_mientras_after_hacer_reports_closing_brace_line() {
        let diag = single_diagnostic("hacer {\n x = 1;\n}\nx = 2;");
        assert_eq!(diag.message, "expected 'mientras' after the body of 'hacer'");
        assert_eq!(diag.line, 3);
    }

    #[test]
    fn missing_paren_after_condition_points_at_last_token() {
        let diag = single_diagnostic("si (a < b\n{ a = 1; }");
        assert_eq!(diag.message, "expected ')' after the condition");
        assert_eq!(diag.line, 1);
    }

    #[test]
    fn unexpected_statement() {
        let diag = single_diagnostic("; entero x = 1;");
        assert!(diag.message.starts_with("unexpected statement"));
        assert_eq!(diag.detail.as_deref(), Some("found ';'"));
    }

    #[test]
    fn invalid_parameter_type() {
        let diag = single_diagnostic("entero f(si a, entero b) { }");
        assert_eq!(diag.message, "invalid type in parameter: 'si'");
    }

    #[test]
    fn excessive_nesting_becomes_a_single_fault() {
        let source = format!("entero x = {}1{};", "(".repeat(300), ")".repeat(300));
        let result = parse_source(&source);
        assert!(result.program.is_none());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "unexpected failure during syntax analysis");
    }

    #[test]
    fn long_operator_chain_becomes_a_single_fault() {
        let source = format!("entero x = 1{};", " + 1".repeat(5_000));
        let result = parse_source(&source);
        assert!(result.program.is_none());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].message, "unexpected failure during syntax analysis");
        assert_eq!(
            result.diagnostics[0].detail.as_deref(),
            Some("nesting exceeds 256 levels")
        );
    }

    #[test]
    fn moderate_operator_chain_still_parses() {
        let source = format!("entero x = 1{};", " * 2 + 1".repeat(100));
        let program = parse_source(&source).into_program().expect("parse");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn failed_operand_is_the_only_diagnostic() {
        for source in [
            "entero x = * 3;",
            "x = + 1;",
            "si (+ a < b) { a = 1; }",
            "si (a < * b) { a = 1; }",
            "entero y = (* 2);",
        ] {
            let diag = single_diagnostic(source);
            assert_eq!(diag.message, "unexpected factor in expression", "{source}");
            assert_eq!(diag.line, 1);
        }
    }

    #[test]
    fn empty_input_is_an_empty_program() {
        let program = parse(&[]).into_program().expect("parse");
        assert!(program.statements.is_empty());
    }
}
