//! The decorated abstract syntax tree.
//!
//! Two families, `Expr` and `Stmt`, each a thin `{ kind, span }` wrapper
//! around a payload enum, plus `File` at the root. Every `Expr` additionally
//! carries a `ty: Type` and a `secure: Label`, both `Unresolved`/`Invalid`
//! until the corresponding pass has run; the invariant in §3 of the
//! specification is only guaranteed *after* the full pipeline.

use palisade_common::{Span, Spanned};

use crate::ids::{FnDefId, ScopeId, SymbolId};
use crate::label::Label;
use crate::symbol::{ScopeArena, SymbolArena};
use crate::ty::Type;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Plus,
    Not,
    BitNot,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    BitXor,
    BitOr,
    BitAnd,
    Shl,
    Shr,
    Or,
    And,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
}

impl BinOp {
    /// The three operator precedence groups that determine which operand
    /// types an operator accepts (§4.4).
    #[must_use]
    pub fn group(self) -> OpGroup {
        use BinOp::*;
        match self {
            Add | Sub | Mul | Div | Mod | BitXor | BitOr | BitAnd | Shl | Shr => OpGroup::Arithmetic,
            Or | And => OpGroup::Boolean,
            Lt | Gt | Le | Ge | Eq | Ne => OpGroup::Comparison,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpGroup {
    Arithmetic,
    Boolean,
    Comparison,
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub ty: Type,
    pub secure: Label,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr {
            kind,
            ty: Type::Unresolved,
            secure: Label::Invalid,
            span,
        }
    }
}

impl Spanned for Expr {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Id {
        name: String,
        symbol: Option<SymbolId>,
    },
    Int(i64),
    Bool(bool),
    /// `a[i]` — indexing, not to be confused with an array literal.
    Index {
        name: String,
        symbol: Option<SymbolId>,
        index: Box<Expr>,
    },
    ArrayLiteral(Vec<Expr>),
    UnOp {
        op: UnOp,
        operand: Box<Expr>,
    },
    BinOp {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        name: String,
        symbol: Option<SymbolId>,
        args: Vec<Expr>,
    },
    /// The single escape hatch: forces the result back to `Low`. Requires
    /// `operand.secure == High` once the flow analyser has re-derived it —
    /// declassifying an already-public value is itself a security error.
    Declassify(Box<Expr>),
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Stmt { kind, span }
    }
}

impl Spanned for Stmt {
    fn span(&self) -> Span {
        self.span
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalDirection {
    In,
    Out,
}

#[derive(Clone, Debug)]
pub enum AssignTarget {
    Scalar {
        name: String,
        symbol: Option<SymbolId>,
    },
    Index {
        name: String,
        symbol: Option<SymbolId>,
        index: Expr,
    },
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Scope(Vec<Stmt>),
    /// `x := e;` or `x[n] := [e1, ..., en];`. `array_length` is `Some(n)`
    /// only for the array form; its literal element count must equal `n`.
    VarDef {
        name: String,
        symbol: Option<SymbolId>,
        array_length: Option<u32>,
        value: Expr,
    },
    FnDef(FnDefId),
    Assign {
        target: AssignTarget,
        value: Expr,
    },
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    TryCatch {
        try_block: Box<Stmt>,
        catch_block: Box<Stmt>,
    },
    Throw,
    Return(Expr),
    Debug(Expr),
    /// An `in { ... }` / `out { ... }` member; surfaced again, by symbol, on
    /// `File::inputs`/`File::outputs` for the flow analyser's whole-file
    /// pre/post-condition checks.
    Global {
        name: String,
        symbol: Option<SymbolId>,
        direction: GlobalDirection,
        decl_label: Label,
        ty: Type,
        array_length: Option<u32>,
    },
}

/// A function parameter: name, explicit label, explicit type.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub symbol: Option<SymbolId>,
    pub label: Label,
    pub ty: Type,
    pub span: Span,
}

/// A function definition, owned by the file's `FnDefArena` and referred to
/// by [`FnDefId`] from both `StmtKind::FnDef` and `Type::Fn`. Centralizing
/// ownership here (rather than inline in the `Stmt` tree) is what lets the
/// function's own `Type::Fn` point back at it without a reference cycle.
#[derive(Clone, Debug)]
pub struct FnDef {
    pub name: String,
    pub symbol: SymbolId,
    pub params: Vec<Param>,
    pub ret_label: Label,
    pub ret_ty: Type,
    pub body: Stmt,
    pub span: Span,
}

#[derive(Default)]
pub struct FnDefArena {
    defs: Vec<FnDef>,
}

impl FnDefArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, def: FnDef) -> FnDefId {
        let id = FnDefId(self.defs.len() as u32);
        self.defs.push(def);
        id
    }

    pub fn get(&self, id: FnDefId) -> &FnDef {
        &self.defs[id.index()]
    }

    pub fn get_mut(&mut self, id: FnDefId) -> &mut FnDef {
        &mut self.defs[id.index()]
    }
}

/// The whole program: top-level statements, the `in`/`out` global lists,
/// and the arenas that own every symbol, scope, and function definition
/// created while parsing and analysing it.
pub struct File {
    pub statements: Vec<Stmt>,
    pub inputs: Vec<SymbolId>,
    pub outputs: Vec<SymbolId>,
    pub symbols: SymbolArena,
    pub scopes: ScopeArena,
    pub fn_defs: FnDefArena,
    pub file_scope: ScopeId,
}

impl File {
    pub fn new() -> Self {
        let scopes = ScopeArena::new();
        let file_scope = scopes.root;
        File {
            statements: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            symbols: SymbolArena::new(),
            scopes,
            fn_defs: FnDefArena::new(),
            file_scope,
        }
    }
}

impl Default for File {
    fn default() -> Self {
        Self::new()
    }
}
