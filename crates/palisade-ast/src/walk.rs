//! Generic child-visiting helpers over `Expr`/`Stmt`.
//!
//! These are the four operations from §4.2 of the specification: `map`
//! rebuilds a tree bottom-up, `walk` visits every node for its side effects,
//! `fold` threads an accumulator without rebuilding, and
//! `traverse_with_accumulator` does both at once. Visit order is left-to-right
//! pre-order for anything `walk` does as a side effect; `map`/`fold`/`traverse`
//! recurse into children first so `f` always sees an already-rebuilt subtree,
//! matching the security labeller's purely bottom-up pass (§4.5).
//!
//! The flow analyser (§4.7) does not use these: it needs to thread a `pc`
//! label and a mutable `SecurityContext` through statement-specific rules
//! (different behavior per branch, re-analysis of callees, etc.) that don't
//! fit a single child-shape-agnostic helper, so it hand-rolls its own
//! recursion instead. These helpers are used by the security labeller and by
//! any pass (like the decorated-AST printer) whose behavior per node really
//! is uniform.

use crate::ast::{AssignTarget, Expr, ExprKind, Stmt, StmtKind};

/// Rebuild `expr`, recursing into children first (so `f` sees already-mapped
/// subexpressions), then applying `f` to the rebuilt node.
pub fn map_expr(expr: Expr, f: &mut impl FnMut(Expr) -> Expr) -> Expr {
    let Expr { kind, ty, secure, span } = expr;
    let kind = match kind {
        ExprKind::Index { name, symbol, index } => ExprKind::Index {
            name,
            symbol,
            index: Box::new(map_expr(*index, f)),
        },
        ExprKind::ArrayLiteral(items) => {
            ExprKind::ArrayLiteral(items.into_iter().map(|e| map_expr(e, f)).collect())
        }
        ExprKind::UnOp { op, operand } => ExprKind::UnOp {
            op,
            operand: Box::new(map_expr(*operand, f)),
        },
        ExprKind::BinOp { op, lhs, rhs } => ExprKind::BinOp {
            op,
            lhs: Box::new(map_expr(*lhs, f)),
            rhs: Box::new(map_expr(*rhs, f)),
        },
        ExprKind::Call { name, symbol, args } => ExprKind::Call {
            name,
            symbol,
            args: args.into_iter().map(|e| map_expr(e, f)).collect(),
        },
        ExprKind::Declassify(inner) => ExprKind::Declassify(Box::new(map_expr(*inner, f))),
        leaf @ (ExprKind::Id { .. } | ExprKind::Int(_) | ExprKind::Bool(_)) => leaf,
    };
    f(Expr { kind, ty, secure, span })
}

/// Visit `expr` and every descendant, pre-order left-to-right, for side
/// effects only.
pub fn walk_expr(expr: &Expr, f: &mut impl FnMut(&Expr)) {
    f(expr);
    match &expr.kind {
        ExprKind::Id { .. } | ExprKind::Int(_) | ExprKind::Bool(_) => {}
        ExprKind::Index { index, .. } => walk_expr(index, f),
        ExprKind::ArrayLiteral(items) => items.iter().for_each(|e| walk_expr(e, f)),
        ExprKind::UnOp { operand, .. } => walk_expr(operand, f),
        ExprKind::BinOp { lhs, rhs, .. } => {
            walk_expr(lhs, f);
            walk_expr(rhs, f);
        }
        ExprKind::Call { args, .. } => args.iter().for_each(|e| walk_expr(e, f)),
        ExprKind::Declassify(inner) => walk_expr(inner, f),
    }
}

/// Thread an accumulator through `expr` and its children without rebuilding,
/// left-to-right, returning only the final accumulator.
pub fn fold_expr<A>(acc: A, expr: &Expr, f: &mut impl FnMut(A, &Expr) -> A) -> A {
    let acc = match &expr.kind {
        ExprKind::Id { .. } | ExprKind::Int(_) | ExprKind::Bool(_) => acc,
        ExprKind::Index { index, .. } => fold_expr(acc, index, f),
        ExprKind::ArrayLiteral(items) => items.iter().fold(acc, |acc, e| fold_expr(acc, e, f)),
        ExprKind::UnOp { operand, .. } => fold_expr(acc, operand, f),
        ExprKind::BinOp { lhs, rhs, .. } => {
            let acc = fold_expr(acc, lhs, f);
            fold_expr(acc, rhs, f)
        }
        ExprKind::Call { args, .. } => args.iter().fold(acc, |acc, e| fold_expr(acc, e, f)),
        ExprKind::Declassify(inner) => fold_expr(acc, inner, f),
    };
    f(acc, expr)
}

/// Both map and fold in one pass: rebuild the tree while threading an
/// accumulator, children first.
pub fn traverse_with_accumulator<A>(
    acc: A,
    expr: Expr,
    f: &mut impl FnMut(A, Expr) -> (A, Expr),
) -> (A, Expr) {
    let Expr { kind, ty, secure, span } = expr;
    let (acc, kind) = match kind {
        ExprKind::Index { name, symbol, index } => {
            let (acc, index) = traverse_with_accumulator(acc, *index, f);
            (
                acc,
                ExprKind::Index {
                    name,
                    symbol,
                    index: Box::new(index),
                },
            )
        }
        ExprKind::ArrayLiteral(items) => {
            let mut acc = acc;
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                let (next_acc, item) = traverse_with_accumulator(acc, item, f);
                acc = next_acc;
                out.push(item);
            }
            (acc, ExprKind::ArrayLiteral(out))
        }
        ExprKind::UnOp { op, operand } => {
            let (acc, operand) = traverse_with_accumulator(acc, *operand, f);
            (acc, ExprKind::UnOp { op, operand: Box::new(operand) })
        }
        ExprKind::BinOp { op, lhs, rhs } => {
            let (acc, lhs) = traverse_with_accumulator(acc, *lhs, f);
            let (acc, rhs) = traverse_with_accumulator(acc, *rhs, f);
            (
                acc,
                ExprKind::BinOp {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            )
        }
        ExprKind::Call { name, symbol, args } => {
            let mut acc = acc;
            let mut out = Vec::with_capacity(args.len());
            for arg in args {
                let (next_acc, arg) = traverse_with_accumulator(acc, arg, f);
                acc = next_acc;
                out.push(arg);
            }
            (acc, ExprKind::Call { name, symbol, args: out })
        }
        ExprKind::Declassify(inner) => {
            let (acc, inner) = traverse_with_accumulator(acc, *inner, f);
            (acc, ExprKind::Declassify(Box::new(inner)))
        }
        leaf @ (ExprKind::Id { .. } | ExprKind::Int(_) | ExprKind::Bool(_)) => (acc, leaf),
    };
    f(acc, Expr { kind, ty, secure, span })
}

/// Visit every expression reachable from `stmt`, including nested
/// statements' conditions and assigned values, pre-order.
pub fn walk_stmt_exprs(stmt: &Stmt, f: &mut impl FnMut(&Expr)) {
    match &stmt.kind {
        StmtKind::Scope(stmts) => stmts.iter().for_each(|s| walk_stmt_exprs(s, f)),
        StmtKind::VarDef { value, .. } => walk_expr(value, f),
        StmtKind::FnDef(_) => {}
        StmtKind::Assign { target, value } => {
            if let AssignTarget::Index { index, .. } = target {
                walk_expr(index, f);
            }
            walk_expr(value, f);
        }
        StmtKind::If { cond, then_branch, else_branch } => {
            walk_expr(cond, f);
            walk_stmt_exprs(then_branch, f);
            if let Some(else_branch) = else_branch {
                walk_stmt_exprs(else_branch, f);
            }
        }
        StmtKind::While { cond, body } => {
            walk_expr(cond, f);
            walk_stmt_exprs(body, f);
        }
        StmtKind::TryCatch { try_block, catch_block } => {
            walk_stmt_exprs(try_block, f);
            walk_stmt_exprs(catch_block, f);
        }
        StmtKind::Throw => {}
        StmtKind::Return(e) | StmtKind::Debug(e) => walk_expr(e, f),
        StmtKind::Global { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;
    use crate::ty::Type;
    use palisade_common::Span;

    fn int(n: i64) -> Expr {
        let mut e = Expr::new(ExprKind::Int(n), Span::dummy());
        e.ty = Type::Int;
        e.secure = Label::Low;
        e
    }

    #[test]
    fn fold_counts_leaves() {
        let tree = Expr::new(
            ExprKind::BinOp {
                op: crate::ast::BinOp::Add,
                lhs: Box::new(int(1)),
                rhs: Box::new(int(2)),
            },
            Span::dummy(),
        );
        let count = fold_expr(0, &tree, &mut |acc, _| acc + 1);
        assert_eq!(count, 3); // two leaves + the BinOp itself
    }

    #[test]
    fn map_rebuilds_bottom_up() {
        let tree = Expr::new(
            ExprKind::UnOp {
                op: crate::ast::UnOp::Neg,
                operand: Box::new(int(5)),
            },
            Span::dummy(),
        );
        let mut seen = Vec::new();
        let mapped = map_expr(tree, &mut |e| {
            if let ExprKind::Int(n) = e.kind {
                seen.push(n);
            }
            e
        });
        assert_eq!(seen, vec![5]);
        assert!(matches!(mapped.kind, ExprKind::UnOp { .. }));
    }
}
