//! Symbols and the scope-tree symbol table.

use indexmap::IndexMap;

use palisade_common::Span;

use crate::ids::{IdCounter, ScopeId, SymbolId};
use crate::label::Label;
use crate::ty::Type;

/// A declaration: a name, its (initially unresolved) type, the label the
/// programmer wrote (or the `High` default for inferred locals), and the
/// span of its defining occurrence.
///
/// Symbols are compared by [`SymbolId`] identity, never by name — two `let x`
/// in sibling scopes are different symbols even though they print the same.
/// `decl_label` is the *declaration* label: fixed at symbolisation time and
/// never mutated again. Every label the later passes compute (flow-sensitive
/// or not) lives in the type annotator's per-symbol `ty` field or, for
/// flow-sensitive labels, in a [`crate::context::SecurityContext`] (see
/// `palisade-checker`) — never by overwriting this field.
#[derive(Clone, Debug)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub ty: Type,
    pub decl_label: Label,
    pub span: Span,
}

/// Owns every [`Symbol`] created while symbolising a file.
#[derive(Default)]
pub struct SymbolArena {
    symbols: Vec<Symbol>,
    counter: IdCounter,
}

impl SymbolArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declare(&mut self, name: impl Into<String>, decl_label: Label, span: Span) -> SymbolId {
        let id = SymbolId(self.counter.next());
        self.symbols.push(Symbol {
            id,
            name: name.into(),
            ty: Type::Unresolved,
            decl_label,
            span,
        });
        id
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.index()]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.index()]
    }

    pub fn set_type(&mut self, id: SymbolId, ty: Type) {
        self.get_mut(id).ty = ty;
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

/// One lexical scope: its local bindings (in declaration order, for
/// deterministic diagnostics and decorated-AST output) plus a pointer to the
/// enclosing scope.
///
/// The specification describes this pointer as "a weak reference to its
/// parent." Since every `Scope` actually lives in a single [`ScopeArena`]
/// owned by the file being compiled, there is no ownership cycle to break —
/// an `Option<ScopeId>` index is the non-owning pointer the spec calls for,
/// without the runtime cost of `Weak`'s upgrade-and-check.
#[derive(Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    locals: IndexMap<String, SymbolId>,
}

/// The symbol-table tree for an entire file: one arena of [`Scope`]s, rooted
/// at the file-level scope created by [`ScopeArena::new`].
pub struct ScopeArena {
    scopes: Vec<Scope>,
    pub root: ScopeId,
}

impl ScopeArena {
    pub fn new() -> Self {
        let root = Scope::default();
        ScopeArena {
            scopes: vec![root],
            root: ScopeId(0),
        }
    }

    pub fn child_of(&mut self, parent: ScopeId) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            parent: Some(parent),
            locals: IndexMap::new(),
        });
        id
    }

    /// Register `name` in `scope`. Fails (returns `None`) if `name` is
    /// already bound in `scope`'s own locals — shadowing an *outer* binding
    /// is always allowed, including a function parameter shadowing a global.
    pub fn register(&mut self, scope: ScopeId, name: &str, symbol: SymbolId) -> Option<SymbolId> {
        let locals = &mut self.scopes[scope.index()].locals;
        if locals.contains_key(name) {
            return None;
        }
        locals.insert(name.to_string(), symbol);
        Some(symbol)
    }

    /// Returns the symbol already bound to `name` in `scope`, if any — used
    /// to produce the "previously defined here" note on a redefinition.
    pub fn local(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        self.scopes[scope.index()].locals.get(name).copied()
    }

    /// Walks from `scope` to the root looking for `name`.
    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let s = &self.scopes[id.index()];
            if let Some(&sym) = s.locals.get(name) {
                return Some(sym);
            }
            current = s.parent;
        }
        None
    }

    pub fn parent(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.index()].parent
    }
}

impl Default for ScopeArena {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_common::Span;

    #[test]
    fn lookup_walks_to_root() {
        let mut scopes = ScopeArena::new();
        let mut symbols = SymbolArena::new();
        let x = symbols.declare("x", Label::Low, Span::dummy());
        scopes.register(scopes.root, "x", x);
        let child = scopes.child_of(scopes.root);
        assert_eq!(scopes.lookup(child, "x"), Some(x));
    }

    #[test]
    fn shadowing_in_child_scope_is_allowed() {
        let mut scopes = ScopeArena::new();
        let mut symbols = SymbolArena::new();
        let outer = symbols.declare("x", Label::Low, Span::dummy());
        scopes.register(scopes.root, "x", outer);
        let child = scopes.child_of(scopes.root);
        let inner = symbols.declare("x", Label::High, Span::dummy());
        assert!(scopes.register(child, "x", inner).is_some());
        assert_eq!(scopes.lookup(child, "x"), Some(inner));
    }

    #[test]
    fn redefinition_in_same_scope_fails() {
        let mut scopes = ScopeArena::new();
        let mut symbols = SymbolArena::new();
        let a = symbols.declare("x", Label::Low, Span::dummy());
        let b = symbols.declare("x", Label::Low, Span::dummy());
        assert!(scopes.register(scopes.root, "x", a).is_some());
        assert!(scopes.register(scopes.root, "x", b).is_none());
    }
}
