//! Arena index types.
//!
//! Symbols, scopes, and function definitions are all owned by arenas on the
//! `File` rather than by `Rc`/`RefCell`, so that `Type::Fn`'s back-pointer to
//! its `FnDef` and a scope's pointer to its parent can be plain `Copy` indices
//! instead of a cyclic reference-counted graph.

use std::cell::Cell;

macro_rules! arena_id {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            #[inline]
            #[must_use]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(SymbolId);
arena_id!(ScopeId);
arena_id!(FnDefId);

impl SymbolId {
    /// Placeholder written by the parser into `FnDef::symbol`, which has no
    /// `Option` to spare since `Type::Fn::def` needs a concrete `FnDefId`
    /// regardless. The binder's `SFnDef` rule overwrites it with a real
    /// symbol before any other pass can observe it, the same way a fresh
    /// `Expr` starts `Unresolved`/`Invalid` until its pass runs.
    pub const PLACEHOLDER: SymbolId = SymbolId(u32::MAX);
}

/// A process-unique counter used to hand out [`SymbolId`]s that stay
/// comparable by identity even across symbols created during re-analysis of
/// a function body at a call site (see the flow analyser's per-call
/// `SecurityContext`).
/// Single-threaded: the compiler never suspends mid-pass (§5), so a `Cell`
/// is enough — there is no reader racing a writer.
#[derive(Default)]
pub struct IdCounter(Cell<u32>);

impl IdCounter {
    pub fn next(&self) -> u32 {
        let id = self.0.get();
        self.0.set(id + 1);
        id
    }
}
