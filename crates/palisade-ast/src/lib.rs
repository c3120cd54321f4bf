//! The AST, symbol model, type model, and label lattice shared by every pass
//! of the Palisade compiler: symboliser, type annotator/checker, security
//! labeller, explicit-flow checker, and flow analyser.

pub mod ids;
pub mod label;
pub mod ty;
pub mod symbol;
pub mod ast;
pub mod walk;

pub use ast::*;
pub use ids::{FnDefId, ScopeId, SymbolId};
pub use label::{join, join2, Label};
pub use symbol::{Scope, ScopeArena, Symbol, SymbolArena};
pub use ty::Type;
