//! The explicit-flow checker (§4.6): a flow-*insensitive* pass over the
//! bottom-up labels the security labeller just computed. It rejects any
//! declaration or assignment whose right-hand side is statically `High`
//! while its target's *declaration* label is `Low` — the direct, syntactic
//! form of an explicit leak. Flow-sensitive leaks (through branching or
//! array aliasing) are the flow analyser's job (§4.7).

use palisade_ast::{AssignTarget, File, Label, Stmt, StmtKind};
use palisade_common::{Sink, Spanned};

pub fn check_stmts(stmts: &[Stmt], file: &File, sink: &Sink) {
    for stmt in stmts {
        check_stmt(stmt, file, sink);
    }
}

fn check_stmt(stmt: &Stmt, file: &File, sink: &Sink) {
    match &stmt.kind {
        StmtKind::Scope(inner) => check_stmts(inner, file, sink),

        StmtKind::VarDef { name, symbol, value, .. } => {
            check_leak(file.symbols.get(symbol.expect("bound")).decl_label, value.secure, name, value.span(), sink);
        }

        StmtKind::FnDef(id) => check_stmt(&file.fn_defs.get(*id).body, file, sink),

        StmtKind::Assign { target, value } => {
            let (name, decl_label) = match target {
                AssignTarget::Scalar { name, symbol } => {
                    (name.as_str(), file.symbols.get(symbol.expect("bound")).decl_label)
                }
                AssignTarget::Index { name, symbol, .. } => {
                    (name.as_str(), file.symbols.get(symbol.expect("bound")).decl_label)
                }
            };
            check_leak(decl_label, value.secure, name, value.span(), sink);
        }

        StmtKind::If { then_branch, else_branch, .. } => {
            check_stmt(then_branch, file, sink);
            if let Some(e) = else_branch {
                check_stmt(e, file, sink);
            }
        }
        StmtKind::While { body, .. } => check_stmt(body, file, sink),
        StmtKind::TryCatch { try_block, catch_block } => {
            check_stmt(try_block, file, sink);
            check_stmt(catch_block, file, sink);
        }
        StmtKind::Throw | StmtKind::Return(_) | StmtKind::Debug(_) | StmtKind::Global { .. } => {}
    }
}

fn check_leak(decl_label: Label, value_secure: Label, name: &str, span: palisade_common::Span, sink: &Sink) {
    if decl_label == Label::Low && value_secure == Label::High {
        sink.security_error(format!("explicit flow: confidential value assigned to public `{name}`"), span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_common::SourceFile;

    fn check(src: &str) {
        let source = SourceFile::new("t.pls", src);
        let sink = Sink::new(&source).without_color();
        let mut file = palisade_parser::parse(&source, &sink);
        palisade_binder::bind(&mut file, &sink);
        let statements = std::mem::take(&mut file.statements);
        file.statements = crate::type_check::check_stmts(statements, &mut file, &sink);
        let statements = std::mem::take(&mut file.statements);
        file.statements = crate::label::label_stmts(statements, &mut file, &sink);
        check_stmts(&file.statements, &file, &sink);
    }

    #[test]
    fn declassified_high_value_into_low_output_is_accepted() {
        check("in{high s:int;} out{low y:int;} y := declassify (s);");
    }
}
