//! Semantic analysis: scopes, name resolution and type checking.
//!
//! The checker walks the whole tree once and never stops early. Every
//! handler receives the diagnostics list explicitly, so the only state
//! carried between calls is the symbol table and the scope stack.
//!
//! Scoping is deliberately shallow: the global scope plus one flat
//! scope per function. Blocks inside a function share its scope.

use log::{debug, trace};

use crate::ast::{
    Assign, Block, Condition, Expr, ExprKind, FuncDecl, Program, Stmt, VarDecl,
};
use crate::diagnostic::Diagnostic;
use crate::parser::VALID_TYPES_HINT;
use crate::symbols::{
    FunctionRegistry, FunctionSignature, ParamSignature, ScopeId, Symbol, SymbolCategory,
    SymbolTable,
};
use crate::types::{Type, binary_result, is_assignable, is_comparable};

/// Fewest parameters a function may declare.
pub const MIN_PARAMS: usize = 2;

#[derive(Debug)]
pub struct TypeCheckResult {
    pub diagnostics: Vec<Diagnostic>,
    pub symbols: SymbolTable,
    pub functions: FunctionRegistry,
}

impl TypeCheckResult {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

pub fn typecheck_program(program: &Program) -> TypeCheckResult {
    let mut checker = TypeChecker::new();
    let mut diagnostics = Vec::new();

    for stmt in &program.statements {
        checker.check_stmt(stmt, &mut diagnostics);
    }

    debug!(
        "semantic analysis: {} symbols, {} functions, {} diagnostics",
        checker.symbols.len(),
        checker.functions.len(),
        diagnostics.len()
    );
    TypeCheckResult {
        diagnostics,
        symbols: checker.symbols,
        functions: checker.functions,
    }
}

struct TypeChecker {
    symbols: SymbolTable,
    functions: FunctionRegistry,
    /// Scopes currently open, innermost last. Never empty.
    scopes: Vec<ScopeId>,
}

impl TypeChecker {
    fn new() -> Self {
        TypeChecker {
            symbols: SymbolTable::new(),
            functions: FunctionRegistry::default(),
            scopes: vec![ScopeId::GLOBAL],
        }
    }

    fn current_scope(&self) -> ScopeId {
        self.scopes.last().copied().unwrap_or(ScopeId::GLOBAL)
    }

    fn enter_scope(&mut self, name: &str) -> ScopeId {
        let id = self.symbols.create_scope(name);
        self.scopes.push(id);
        id
    }

    fn exit_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn resolve(&self, name: &str) -> Option<&Symbol> {
        self.symbols.resolve(&self.scopes, name)
    }

    // -----------------------------------------------------------------
    // Statements
    // -----------------------------------------------------------------

    fn check_stmt(&mut self, stmt: &Stmt, diags: &mut Vec<Diagnostic>) {
        trace!("checking statement at line {}", stmt.line());
        match stmt {
            Stmt::VarDecl(decl) => self.check_var_decl(decl, diags),
            Stmt::FuncDecl(decl) => self.check_func_decl(decl, diags),
            Stmt::Assign(assign) => self.check_assign(assign, diags),
            Stmt::If(stmt) => {
                self.check_condition(&stmt.cond, diags);
                self.check_block(&stmt.then_block, diags);
                if let Some(else_block) = &stmt.else_block {
                    self.check_block(else_block, diags);
                }
            }
            Stmt::While(stmt) => {
                self.check_condition(&stmt.cond, diags);
                self.check_block(&stmt.body, diags);
            }
            Stmt::DoWhile(stmt) => {
                self.check_block(&stmt.body, diags);
                self.check_condition(&stmt.cond, diags);
            }
        }
    }

    fn check_block(&mut self, block: &Block, diags: &mut Vec<Diagnostic>) {
        for stmt in &block.statements {
            self.check_stmt(stmt, diags);
        }
    }

    fn check_var_decl(&mut self, decl: &VarDecl, diags: &mut Vec<Diagnostic>) {
        let name = decl.name.name.as_str();

        let Some(ty) = Type::from_name(&decl.ty.name) else {
            diags.push(
                Diagnostic::semantic(format!("invalid type name '{}'", decl.ty.name), decl.line)
                    .with_detail(VALID_TYPES_HINT),
            );
            self.check_expr(&decl.init, diags);
            return;
        };

        let scope = self.current_scope();
        if let Some(existing) = self.symbols.lookup_in(scope, name) {
            diags.push(
                Diagnostic::semantic(
                    format!("variable '{name}' is already declared in this scope"),
                    decl.line,
                )
                .with_detail(format!("first declared at line {}", existing.line)),
            );
            self.check_expr(&decl.init, diags);
            return;
        }

        // The new name is not visible inside its own initializer.
        if let Some(value_ty) = self.check_expr(&decl.init, diags) {
            if !is_assignable(ty, value_ty) {
                diags.push(
                    Diagnostic::semantic(
                        format!("type mismatch in the declaration of '{name}'"),
                        decl.line,
                    )
                    .with_detail(format!(
                        "expected '{ty}' but the expression has type '{value_ty}'"
                    )),
                );
                return;
            }
        }

        let inserted = self.symbols.insert(Symbol {
            name: name.to_string(),
            ty,
            category: SymbolCategory::Variable,
            scope,
            line: decl.line,
        });
        debug_assert!(inserted.is_ok(), "'{name}' was already free in its scope");
    }

    fn check_assign(&mut self, assign: &Assign, diags: &mut Vec<Diagnostic>) {
        let name = assign.target.name.as_str();

        let Some(target_ty) = self.resolve(name).map(|symbol| symbol.ty) else {
            diags.push(
                Diagnostic::semantic(format!("variable '{name}' is not declared"), assign.line)
                    .with_detail("cannot assign to a variable that does not exist"),
            );
            self.check_expr(&assign.value, diags);
            return;
        };

        if let Some(value_ty) = self.check_expr(&assign.value, diags) {
            if !is_assignable(target_ty, value_ty) {
                diags.push(
                    Diagnostic::semantic(
                        format!("type mismatch in the assignment to '{name}'"),
                        assign.line,
                    )
                    .with_detail(format!(
                        "the variable has type '{target_ty}' but the expression has type '{value_ty}'"
                    )),
                );
            }
        }
    }

    fn check_func_decl(&mut self, decl: &FuncDecl, diags: &mut Vec<Diagnostic>) {
        let name = decl.name.name.as_str();

        if let Some(existing) = self.functions.get(name) {
            diags.push(
                Diagnostic::semantic(format!("function '{name}' is already declared"), decl.line)
                    .with_detail(format!("first declared at line {}", existing.line)),
            );
            return;
        }

        let return_ty = Type::from_name(&decl.return_ty.name);
        if return_ty.is_none() {
            diags.push(
                Diagnostic::semantic(
                    format!(
                        "invalid return type in function '{name}': '{}'",
                        decl.return_ty.name
                    ),
                    decl.line,
                )
                .with_detail(VALID_TYPES_HINT),
            );
        }

        let mut seen: Vec<&str> = Vec::new();
        let mut params = Vec::new();
        for param in &decl.params {
            let param_name = param.name.name.as_str();
            if seen.contains(&param_name) {
                diags.push(Diagnostic::semantic(
                    format!("duplicate parameter in function '{name}': '{param_name}'"),
                    param.line,
                ));
                continue;
            }
            seen.push(param_name);

            match Type::from_name(&param.ty.name) {
                Some(ty) => params.push((ParamSignature {
                    name: param_name.to_string(),
                    ty,
                }, param.line)),
                None => diags.push(
                    Diagnostic::semantic(
                        format!(
                            "invalid type name '{}' for parameter '{param_name}'",
                            param.ty.name
                        ),
                        param.line,
                    )
                    .with_detail(VALID_TYPES_HINT),
                ),
            }
        }

        if seen.len() < MIN_PARAMS {
            diags.push(
                Diagnostic::semantic(
                    format!("function '{name}' must have at least {MIN_PARAMS} parameters"),
                    decl.line,
                )
                .with_detail(format!("found {} parameter(s)", seen.len())),
            );
        }

        if let Some(return_ty) = return_ty {
            self.functions.insert(FunctionSignature {
                name: name.to_string(),
                return_type: return_ty,
                params: params.iter().map(|(param, _)| param.clone()).collect(),
                line: decl.line,
            });

            // Functions live in the global scope wherever they are written.
            let inserted = self.symbols.insert(Symbol {
                name: name.to_string(),
                ty: return_ty,
                category: SymbolCategory::Function,
                scope: ScopeId::GLOBAL,
                line: decl.line,
            });
            if let Err(existing) = inserted {
                diags.push(
                    Diagnostic::semantic(
                        format!("name '{name}' is already declared in the global scope"),
                        decl.line,
                    )
                    .with_detail(format!("first declared at line {}", existing.line)),
                );
            }
        }

        let scope = self.enter_scope(name);
        trace!("entered scope '{name}' with {} parameters", params.len());
        for (param, line) in params {
            let inserted = self.symbols.insert(Symbol {
                name: param.name,
                ty: param.ty,
                category: SymbolCategory::Parameter,
                scope,
                line,
            });
            debug_assert!(inserted.is_ok(), "parameter names are unique");
        }
        self.check_block(&decl.body, diags);
        self.exit_scope();
        trace!("left scope '{name}'");
    }

    fn check_condition(&self, cond: &Condition, diags: &mut Vec<Diagnostic>) {
        let lhs = self.check_expr(&cond.lhs, diags);
        let rhs = self.check_expr(&cond.rhs, diags);

        if let (Some(lhs), Some(rhs)) = (lhs, rhs) {
            if !is_comparable(lhs, rhs) {
                diags.push(
                    Diagnostic::semantic(
                        format!("cannot compare '{lhs}' with '{rhs}'"),
                        cond.line,
                    )
                    .with_detail(format!(
                        "operator '{}' needs operands of compatible types",
                        cond.op.as_str()
                    )),
                );
            }
        }
    }

    // -----------------------------------------------------------------
    // Expressions
    // -----------------------------------------------------------------

    /// Report every problem inside `expr` and infer its type.
    ///
    /// `None` means the type is unknown because something below was
    /// already reported; callers skip their own checks in that case.
    fn check_expr(&self, expr: &Expr, diags: &mut Vec<Diagnostic>) -> Option<Type> {
        match &expr.kind {
            ExprKind::Literal(literal) => Some(Type::of_literal(literal)),
            ExprKind::Ident(name) => match self.resolve(name) {
                Some(symbol) => Some(symbol.ty),
                None => {
                    diags.push(
                        Diagnostic::semantic(format!("variable '{name}' is not declared"), expr.line)
                            .with_detail("declare it before using it"),
                    );
                    None
                }
            },
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.check_expr(lhs, diags);
                let rhs_ty = self.check_expr(rhs, diags);
                let (lhs_ty, rhs_ty) = (lhs_ty?, rhs_ty?);

                let result = binary_result(lhs_ty, *op, rhs_ty);
                if result.is_none() {
                    diags.push(
                        Diagnostic::semantic(
                            format!(
                                "operation '{}' is not allowed between '{lhs_ty}' and '{rhs_ty}'",
                                op.as_str()
                            ),
                            expr.line,
                        )
                        .with_detail("the operand types do not support this operator"),
                    );
                }
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Ident, Literal, TypeName};
    use crate::lexer::tokenize;
    use crate::parser::parse;
    use test_log::test;

    fn check(source: &str) -> TypeCheckResult {
        let tokens = tokenize(source).expect("tokenize");
        let program = parse(&tokens).into_program().expect("parse");
        typecheck_program(&program)
    }

    fn messages(result: &TypeCheckResult) -> Vec<&str> {
        result.diagnostics.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn widening_declaration_is_clean() {
        let result = check("entero x = 5;\ndecimal y = x + 2.5;");
        assert!(result.is_clean(), "{:?}", result.diagnostics);

        let keys: Vec<String> = result.symbols.entries().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["global:x", "global:y"]);
        assert_eq!(result.symbols.get("global:y").map(|s| s.ty), Some(Type::Decimal));
    }

    #[test]
    fn narrowing_is_rejected_once() {
        let result = check("entero z = 3.0;");
        assert_eq!(messages(&result), vec!["type mismatch in the declaration of 'z'"]);
        assert_eq!(
            result.diagnostics[0].detail.as_deref(),
            Some("expected 'entero' but the expression has type 'decimal'")
        );
        assert!(result.symbols.get("global:z").is_none());
    }

    #[test]
    fn redeclaration_cites_first_line() {
        let result = check("entero x = 1;\n\nentero x = 2;");
        assert_eq!(result.diagnostics.len(), 1);
        let diag = &result.diagnostics[0];
        assert_eq!(diag.line, 3);
        assert_eq!(diag.detail.as_deref(), Some("first declared at line 1"));
    }

    #[test]
    fn function_scopes_are_separate() {
        let source = "\
entero x = 1;
entero f(entero a, entero b) { entero x = a; }
entero g(entero a, entero b) { entero x = b; }
";
        let result = check(source);
        assert!(result.is_clean(), "{:?}", result.diagnostics);
        assert!(result.symbols.get("f:x").is_some());
        assert!(result.symbols.get("g:a").is_some());
        assert_eq!(
            result.symbols.get("global:f").map(|s| s.category),
            Some(SymbolCategory::Function)
        );
    }

    #[test]
    fn arity_below_two_is_one_diagnostic() {
        let result = check("entero suma(entero a) { entero r = a; }");
        assert_eq!(messages(&result), vec!["function 'suma' must have at least 2 parameters"]);
        assert_eq!(result.diagnostics[0].detail.as_deref(), Some("found 1 parameter(s)"));
    }

    #[test]
    fn duplicate_parameters_are_dropped_from_the_signature() {
        let result = check("entero f(entero a, decimal a, entero b) { }");
        assert_eq!(
            messages(&result),
            vec!["duplicate parameter in function 'f': 'a'"]
        );
        let params = &result.functions.get("f").expect("registered").params;
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn parameters_do_not_leak_out_of_their_function() {
        let result = check("entero f(entero a, entero b) { a = b; }\na = 1;");
        assert_eq!(messages(&result), vec!["variable 'a' is not declared"]);
        assert_eq!(result.diagnostics[0].line, 2);
    }

    #[test]
    fn parameter_may_shadow_a_global() {
        let source = "cadena a = \"hola\";\nentero f(entero a, entero b) { entero c = a + b; }";
        let result = check(source);
        assert!(result.is_clean(), "{:?}", result.diagnostics);
        assert_eq!(result.symbols.get("f:c").map(|s| s.ty), Some(Type::Integer));
    }

    #[test]
    fn function_redeclaration_skips_the_body() {
        let source = "\
entero f(entero a, entero b) { }
entero f(entero a, entero b) { entero x = nada; }
";
        let result = check(source);
        assert_eq!(messages(&result), vec!["function 'f' is already declared"]);
        assert_eq!(result.diagnostics[0].detail.as_deref(), Some("first declared at line 1"));
    }

    #[test]
    fn undeclared_uses_are_each_reported() {
        let result = check("entero x = a + b;");
        assert_eq!(
            messages(&result),
            vec!["variable 'a' is not declared", "variable 'b' is not declared"]
        );
        assert!(result.symbols.get("global:x").is_none());
    }

    #[test]
    fn declaration_is_not_visible_in_its_own_initializer() {
        let result = check("entero x = x + 1;");
        assert_eq!(messages(&result), vec!["variable 'x' is not declared"]);
    }

    #[test]
    fn invalid_operations_are_reported_at_the_innermost_node() {
        let result = check("cadena s = \"a\" - \"b\";\ndecimal d = 1.5 % 2;\nentero n = (verdadero + falso) * 2;");
        assert_eq!(
            messages(&result),
            vec![
                "operation '-' is not allowed between 'cadena' and 'cadena'",
                "operation '%' is not allowed between 'decimal' and 'entero'",
                "operation '+' is not allowed between 'booleano' and 'booleano'",
            ]
        );
    }

    #[test]
    fn assignment_checks_target_and_type() {
        let source = "\
entero n = 1;
decimal d = 0.5;
d = n;
n = d;
m = 2;
";
        let result = check(source);
        assert_eq!(
            messages(&result),
            vec![
                "type mismatch in the assignment to 'n'",
                "variable 'm' is not declared",
            ]
        );
        assert_eq!(result.diagnostics[0].line, 4);
        assert_eq!(result.diagnostics[1].line, 5);
    }

    #[test]
    fn conditions_allow_numeric_mixing_only() {
        let source = "\
entero i = 0;
cadena s = \"x\";
mientras (i < 2.5) { i = i + 1; }
si (s == i) { s = \"y\"; } sino { s = \"z\"; }
hacer { i = i - 1; } mientras (i >= 0)
";
        let result = check(source);
        assert_eq!(messages(&result), vec!["cannot compare 'cadena' with 'entero'"]);
        assert_eq!(result.diagnostics[0].line, 4);
    }

    #[test]
    fn blocks_share_their_function_scope() {
        let source = "\
entero f(entero a, entero b) {
  si (a > b) { entero t = a; }
  entero t = b;
}
";
        let result = check(source);
        assert_eq!(messages(&result), vec!["variable 't' is already declared in this scope"]);
        assert_eq!(result.diagnostics[0].detail.as_deref(), Some("first declared at line 2"));
    }

    #[test]
    fn function_name_collides_with_global_variable() {
        let result = check("entero f = 1;\nentero f(entero a, entero b) { }");
        assert_eq!(
            messages(&result),
            vec!["name 'f' is already declared in the global scope"]
        );
    }

    #[test]
    fn function_named_global_keeps_its_own_keys() {
        let source = "entero x = 1;\ncadena global(entero x, cadena s) { cadena t = s; }";
        let result = check(source);
        assert!(result.is_clean(), "{:?}", result.diagnostics);

        assert_eq!(result.symbols.get("global:x").map(|s| s.ty), Some(Type::Integer));
        assert_eq!(
            result.symbols.get("global#1:x").map(|s| s.category),
            Some(SymbolCategory::Parameter)
        );
        let keys: Vec<String> = result.symbols.entries().map(|(key, _)| key).collect();
        assert_eq!(
            keys,
            vec!["global:x", "global:global", "global#1:x", "global#1:s", "global#1:t"]
        );
    }

    #[test]
    fn invalid_type_names_in_hand_built_trees() {
        let line = 1;
        let program = Program {
            statements: vec![Stmt::VarDecl(VarDecl {
                ty: TypeName { name: "numero".into(), line },
                name: Ident { name: "x".into(), line },
                init: Expr {
                    kind: ExprKind::Literal(Literal::Integer("1".into())),
                    line,
                },
                line,
            })],
        };

        let result = typecheck_program(&program);
        assert_eq!(messages(&result), vec!["invalid type name 'numero'"]);
        assert!(result.symbols.is_empty());
    }
}
