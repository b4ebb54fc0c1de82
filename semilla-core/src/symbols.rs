//! Symbol table and function registry built by the type checker.
//!
//! Scopes are addressed by [`ScopeId`]: an index into the table's scope
//! list, never an owning handle. Scope 0 is `global`; every analyzed
//! function gets one flat scope of its own. Blocks do not open scopes.
//!
//! Scopes are small, so lookups are linear scans over insertion order.

use std::fmt;

use log::trace;

use crate::types::Type;

pub const GLOBAL_SCOPE_NAME: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(usize);

impl ScopeId {
    pub const GLOBAL: ScopeId = ScopeId(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolCategory {
    Variable,
    Parameter,
    Function,
}

impl SymbolCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolCategory::Variable => "variable",
            SymbolCategory::Parameter => "parameter",
            SymbolCategory::Function => "function",
        }
    }
}

impl fmt::Display for SymbolCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,
    pub ty: Type,
    pub category: SymbolCategory,
    pub scope: ScopeId,
    /// Line of the declaration.
    pub line: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub id: ScopeId,
    pub name: String,
    symbols: Vec<Symbol>,
}

impl Scope {
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|symbol| symbol.name == name)
    }
}

/// Every scope created during one analysis, with its symbols.
///
/// Entries are only ever added; nothing is updated or removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope {
                id: ScopeId::GLOBAL,
                name: GLOBAL_SCOPE_NAME.to_string(),
                symbols: Vec::new(),
            }],
        }
    }

    /// Open a new scope named `name`.
    ///
    /// Scope names key the `scope:name` entries, so they are unique: a
    /// name already taken (a function called `global`, say) gets the
    /// scope's index appended, as in `global#1`.
    pub fn create_scope(&mut self, name: impl Into<String>) -> ScopeId {
        let id = ScopeId(self.scopes.len());
        let mut name = name.into();
        if self.scopes.iter().any(|scope| scope.name == name) {
            name = format!("{name}#{}", id.0);
        }
        trace!("created scope #{} '{name}'", id.0);
        self.scopes.push(Scope {
            id,
            name,
            symbols: Vec::new(),
        });
        id
    }

    pub fn scope(&self, id: ScopeId) -> Option<&Scope> {
        self.scopes.get(id.0)
    }

    /// Look `name` up in exactly one scope.
    pub fn lookup_in(&self, scope: ScopeId, name: &str) -> Option<&Symbol> {
        self.scope(scope)?.get(name)
    }

    /// Look `name` up through a scope stack, innermost (last) first.
    pub fn resolve(&self, stack: &[ScopeId], name: &str) -> Option<&Symbol> {
        stack.iter().rev().find_map(|&scope| self.lookup_in(scope, name))
    }

    /// Add a symbol to its scope.
    ///
    /// Returns the symbol already holding that name in the same scope
    /// when there is one; the table is left unchanged in that case.
    pub fn insert(&mut self, symbol: Symbol) -> Result<(), &Symbol> {
        let Some(scope) = self.scopes.get_mut(symbol.scope.0) else {
            return Ok(());
        };
        if let Some(at) = scope.symbols.iter().position(|s| s.name == symbol.name) {
            return Err(&scope.symbols[at]);
        }
        trace!(
            "declared {} '{}' : {} in scope '{}'",
            symbol.category, symbol.name, symbol.ty, scope.name
        );
        scope.symbols.push(symbol);
        Ok(())
    }

    /// Look a symbol up by its `scope:name` key.
    pub fn get(&self, key: &str) -> Option<&Symbol> {
        let (scope_name, name) = key.split_once(':')?;
        self.scopes
            .iter()
            .find(|scope| scope.name == scope_name)?
            .get(name)
    }

    /// Every symbol with its `scope:name` key, scope by scope in
    /// creation order.
    pub fn entries(&self) -> impl Iterator<Item = (String, &Symbol)> + '_ {
        self.scopes.iter().flat_map(|scope| {
            scope
                .symbols
                .iter()
                .map(move |symbol| (format!("{}:{}", scope.name, symbol.name), symbol))
        })
    }

    pub fn len(&self) -> usize {
        self.scopes.iter().map(|scope| scope.symbols.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSignature {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub return_type: Type,
    pub params: Vec<ParamSignature>,
    pub line: u32,
}

/// Program-wide function namespace. One flat level, no overloading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionRegistry {
    functions: Vec<FunctionSignature>,
}

impl FunctionRegistry {
    pub fn get(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.iter().find(|function| function.name == name)
    }

    /// Register a signature unless its name is taken.
    pub fn insert(&mut self, signature: FunctionSignature) -> bool {
        if self.get(&signature.name).is_some() {
            return false;
        }
        self.functions.push(signature);
        true
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.iter()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
