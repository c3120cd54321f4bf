//! The symboliser (§4.3): binds every identifier use to a declaration.
//!
//! Consumes the parser's untyped [`File`] and functionally rewrites its
//! statement tree, attaching a [`palisade_ast::SymbolId`] to every `EId`,
//! `EArray`, and `ECall`, and to every declaration. The parser only ever
//! allocates the file's root scope; every child scope (a `{}` block, a
//! function body) is opened here, as its statements are visited, which is
//! also where each scope's local bindings get populated.
//!
//! The one rewrite this pass performs on the tree shape itself is resolving
//! the parser's ambiguous `StmtKind::VarDef` (see `palisade-parser`'s module
//! doc comment): a full scope-chain lookup decides whether it is a fresh
//! declaration or a reassignment, and in the latter case the node becomes a
//! `StmtKind::Assign`.

mod bind;

use palisade_ast::File;
use palisade_common::Sink;

/// Binds `file` in place, replacing its statement list with the bound (and,
/// where `:=` turned out to be a reassignment, rewritten) tree.
pub fn bind(file: &mut File, sink: &Sink) {
    let _span = tracing::debug_span!("bind").entered();
    let scope = file.file_scope;
    let statements = std::mem::take(&mut file.statements);
    file.statements = bind::bind_stmts(statements, scope, file, sink);
    tracing::debug!(symbols = file.symbols.len(), "symbolisation complete");
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_ast::{AssignTarget, ExprKind, GlobalDirection, StmtKind};
    use palisade_common::SourceFile;

    fn bound(src: &str) -> File {
        let source = SourceFile::new("t.pls", src);
        let sink = palisade_common::Sink::new(&source).without_color();
        let mut file = palisade_parser::parse(&source, &sink);
        bind(&mut file, &sink);
        file
    }

    #[test]
    fn reassignment_of_a_global_rewrites_to_assign() {
        let file = bound("in{low x:int;} out{low y:int;} y := x + 1;");
        assert!(matches!(&file.statements[0].kind, StmtKind::Global { .. }));
        assert!(matches!(&file.statements[1].kind, StmtKind::Global { .. }));
        match &file.statements[2].kind {
            StmtKind::Assign { target: AssignTarget::Scalar { symbol: Some(sym), .. }, .. } => {
                let StmtKind::Global { symbol: Some(y_sym), .. } = &file.statements[1].kind else {
                    panic!("expected y to be bound");
                };
                assert_eq!(sym, y_sym);
            }
            other => panic!("expected a rewritten assignment, got {other:?}"),
        }
    }

    #[test]
    fn fresh_declaration_in_a_block_stays_a_var_def() {
        let file = bound("{ z := 1; }");
        let StmtKind::Scope(inner) = &file.statements[0].kind else {
            panic!("expected a scope");
        };
        assert!(matches!(&inner[0].kind, StmtKind::VarDef { array_length: None, symbol: Some(_), .. }));
    }

    #[test]
    fn function_can_call_itself() {
        let file = bound("fn f(low n:int) low int { return f(n); }");
        let StmtKind::FnDef(id) = &file.statements[0].kind else {
            panic!("expected a function definition");
        };
        let def = file.fn_defs.get(*id);
        let StmtKind::Scope(body) = &def.body.kind else {
            panic!("expected a scope body");
        };
        let StmtKind::Return(call) = &body[0].kind else {
            panic!("expected a return statement");
        };
        let ExprKind::Call { symbol: Some(called), .. } = &call.kind else {
            panic!("expected a resolved call");
        };
        assert_eq!(*called, def.symbol);
    }

    #[test]
    fn nested_reassignment_of_an_outer_name_does_not_redefine_it() {
        // A bare `name := expr;` never hits the redefinition path for a
        // scalar: if `name` already resolves anywhere in the enclosing
        // chain, binding rewrites it to an `Assign` instead of declaring a
        // new symbol, so the same name can be "redefined" from an inner
        // scope any number of times. `declare_and_register`'s redefinition
        // check only fires for forms that always declare fresh — globals,
        // function names/parameters, and array declarations — which is
        // covered by the scope-arena unit tests in `palisade-ast` directly
        // against `register`, since `terminate`/`error` call `process::exit`
        // and can't be exercised in-process here.
        let file = bound("x := 1; { x := 2; }");
        let StmtKind::VarDef { symbol: Some(outer), .. } = &file.statements[0].kind else {
            panic!("expected a fresh declaration of x");
        };
        let StmtKind::Scope(inner) = &file.statements[1].kind else {
            panic!("expected a scope");
        };
        match &inner[0].kind {
            StmtKind::Assign { target: AssignTarget::Scalar { symbol: Some(sym), .. }, .. } => {
                assert_eq!(sym, outer);
            }
            other => panic!("expected a rewritten assignment, got {other:?}"),
        }
    }

    #[test]
    fn array_declaration_binds_and_globals_are_not_reassignable_targets() {
        let file = bound("in{low a:int[3];low i:int;} a[i] := 42;");
        match &file.statements.last().unwrap().kind {
            StmtKind::Assign { target: AssignTarget::Index { symbol: Some(_), .. }, .. } => {}
            other => panic!("expected an index assignment, got {other:?}"),
        }
        let _ = GlobalDirection::In;
    }
}
