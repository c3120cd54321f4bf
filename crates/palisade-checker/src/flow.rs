//! The flow analyser (§4.7): a path-sensitive, `pc`-threaded second labelling
//! pass. Where the security labeller (§4.5) is a purely bottom-up,
//! flow-*insensitive* over-approximation, this pass re-derives every
//! expression's `secure` field from a [`SecurityContext`] that is mutated as
//! control flow is walked, catching leaks the bottom-up pass cannot see:
//! a `low` variable assigned under a tainted branch, a `while` guard that
//! becomes confidential only after its own body runs, a write through a
//! dynamically-indexed array, or a function whose result depends on which
//! labels its arguments carried at a particular call site.
//!
//! Functions are never summarised. Each `ECall` re-analyses the callee body
//! in a fresh [`SecurityContext`] built from that call's argument labels
//! (§4.9 design notes); direct recursion is broken by treating a call that
//! re-enters its own `(FnDefId, argument labels)` key as conservatively
//! `High` until the outer call completes, then caching the real result.

use rustc_hash::{FxHashMap, FxHashSet};

use palisade_ast::{
    join, AssignTarget, Expr, ExprKind, File, FnDefId, Label, Stmt, StmtKind, SymbolId, Type,
};
use palisade_common::{Sink, Span, Spanned};

use crate::context::SecurityContext;

/// Runs the flow analyser over `file` in place and checks the whole-file
/// postcondition: every declared `output` must end up no more confidential
/// than its declaration.
pub fn analyze(file: &mut File, sink: &Sink) {
    let _span = tracing::debug_span!("flow_analyze").entered();

    let mut flow = Flow {
        file,
        sink,
        cache: FxHashMap::default(),
        active: FxHashSet::default(),
        returns: Vec::new(),
    };
    let mut ctx = SecurityContext::new();
    let statements = std::mem::take(&mut flow.file.statements);
    flow.file.statements = flow.analyze_stmts(statements, Label::Low, &mut ctx);

    for &sym in &flow.file.outputs.clone() {
        let symbol = flow.file.symbols.get(sym);
        let decl_label = symbol.decl_label;
        let name = symbol.name.clone();
        let span = symbol.span;
        let actual = ctx.label_of_var(sym, decl_label);
        if !actual.flows_to(decl_label) {
            sink.security_error(
                format!("insecure implicit flow: output `{name}` ends up confidential but is declared public"),
                span,
            );
        }
    }
}

struct Flow<'a> {
    file: &'a mut File,
    sink: &'a Sink<'a>,
    /// Memoised call-site results, keyed by the callee and the labels its
    /// arguments carried. Re-analysing the same `(FnDefId, args)` pair twice
    /// (e.g. the same call inside a loop body) reuses the first result.
    cache: FxHashMap<(FnDefId, Vec<Label>), Label>,
    /// Keys currently being computed, used only to detect and break direct
    /// or mutual recursion.
    active: FxHashSet<(FnDefId, Vec<Label>)>,
    /// Every `SReturn.secure` reached during the analysis of the function
    /// body currently being (re-)analysed; swapped out per call in
    /// [`Flow::analyze_call`].
    returns: Vec<Label>,
}

impl<'a> Flow<'a> {
    fn analyze_stmts(&mut self, stmts: Vec<Stmt>, pc: Label, ctx: &mut SecurityContext) -> Vec<Stmt> {
        stmts.into_iter().map(|stmt| self.analyze_stmt(stmt, pc, ctx)).collect()
    }

    fn analyze_stmt(&mut self, stmt: Stmt, pc: Label, ctx: &mut SecurityContext) -> Stmt {
        let Stmt { kind, span } = stmt;
        let kind = match kind {
            StmtKind::Scope(inner) => StmtKind::Scope(self.analyze_stmts(inner, pc, ctx)),

            StmtKind::VarDef { name, symbol, array_length, value } => {
                let value = self.analyze_expr(value, pc, ctx);
                let sym = symbol.expect("bound");
                match array_length {
                    Some(n) => ctx.register_array(sym, self.array_literal_labels(&value, n, ctx)),
                    None => ctx.register_var(sym, value.secure),
                }
                StmtKind::VarDef { name, symbol, array_length, value }
            }

            // Bodies are re-analysed lazily, once per call site (see
            // `analyze_call`); nothing to do for the declaration itself.
            StmtKind::FnDef(id) => StmtKind::FnDef(id),

            StmtKind::Assign { target, value } => {
                let value = self.analyze_expr(value, pc, ctx);
                let target = self.analyze_assign_target(target, &value, pc, ctx);
                StmtKind::Assign { target, value }
            }

            StmtKind::If { cond, then_branch, else_branch } => {
                let cond = self.analyze_expr(cond, pc, ctx);
                let branch_pc = join([pc, cond.secure]);
                let mut else_ctx = ctx.copy();
                let then_branch = Box::new(self.analyze_stmt(*then_branch, branch_pc, ctx));
                let else_branch = else_branch.map(|e| Box::new(self.analyze_stmt(*e, branch_pc, &mut else_ctx)));
                ctx.merge(&else_ctx);
                StmtKind::If { cond, then_branch, else_branch }
            }

            StmtKind::While { cond, body } => {
                let before = self.analyze_expr(cond.clone(), pc, ctx);
                let pc_before = join([pc, before.secure]);
                if pc_before == Label::High {
                    self.sink.security_error(
                        "insecure implicit flow: while loop with a high guard",
                        before.span(),
                    );
                }
                let body = Box::new(self.analyze_stmt(*body, pc_before, ctx));
                // Re-evaluated after the body runs: the body may itself have
                // raised a variable the guard reads, which a single
                // before-body check would miss.
                let after = self.analyze_expr(cond, pc, ctx);
                let pc_after = join([pc, after.secure]);
                if pc_after == Label::High {
                    self.sink.security_error(
                        "insecure implicit flow: while loop with a high guard after iteration",
                        after.span(),
                    );
                }
                StmtKind::While { cond: after, body }
            }

            StmtKind::TryCatch { try_block, catch_block } => {
                let mut catch_ctx = ctx.copy();
                let try_block = Box::new(self.analyze_stmt(*try_block, pc, ctx));
                let catch_block = Box::new(self.analyze_stmt(*catch_block, pc, &mut catch_ctx));
                ctx.merge(&catch_ctx);
                StmtKind::TryCatch { try_block, catch_block }
            }

            StmtKind::Throw => {
                if pc == Label::High {
                    self.sink.security_error("throw in a high context", span);
                }
                StmtKind::Throw
            }

            StmtKind::Return(e) => {
                let mut e = self.analyze_expr(e, pc, ctx);
                e.secure = join([pc, e.secure]);
                self.returns.push(e.secure);
                StmtKind::Return(e)
            }

            StmtKind::Debug(e) => {
                let e = self.analyze_expr(e, pc, ctx);
                self.report_debug(&e);
                StmtKind::Debug(e)
            }

            StmtKind::Global { name, symbol, direction, decl_label, ty, array_length } => {
                let sym = symbol.expect("bound");
                match array_length {
                    Some(n) => ctx.register_array(sym, vec![decl_label; n as usize]),
                    None => ctx.register_var(sym, decl_label),
                }
                StmtKind::Global { name, symbol, direction, decl_label, ty, array_length }
            }
        };
        Stmt::new(kind, span)
    }

    fn analyze_assign_target(
        &mut self,
        target: AssignTarget,
        value: &Expr,
        pc: Label,
        ctx: &mut SecurityContext,
    ) -> AssignTarget {
        match target {
            AssignTarget::Scalar { name, symbol } => {
                let sym = symbol.expect("bound");
                let decl_label = self.file.symbols.get(sym).decl_label;
                let new_label = join([pc, value.secure]);
                self.check_low_target(decl_label, new_label, &name, value.span());
                if ctx.relabel_var(sym, new_label) {
                    self.sink.note(format!("label of `{name}` raised to {new_label:?}"), value.span());
                }
                AssignTarget::Scalar { name, symbol }
            }
            AssignTarget::Index { name, symbol, index } => {
                let index = self.analyze_expr(index, pc, ctx);
                let sym = symbol.expect("bound");
                let decl_label = self.file.symbols.get(sym).decl_label;
                match literal_index(&index) {
                    Some(i) => {
                        let new_label = join([pc, value.secure]);
                        self.check_low_target(decl_label, new_label, &name, value.span());
                        if ctx.relabel_array_index(sym, i, new_label) {
                            self.sink.note(
                                format!("label of `{name}[{i}]` raised to {new_label:?}"),
                                value.span(),
                            );
                        }
                    }
                    // The written index is not statically known: every
                    // element might be the one just written, so the whole
                    // array is raised (§4.7). A confidential write can never
                    // soundly lower any element, so nothing happens unless
                    // the combined label is `High`.
                    None => {
                        let write_label = join([pc, index.secure, value.secure]);
                        if write_label == Label::High {
                            self.check_low_target(decl_label, write_label, &name, value.span());
                            if ctx.relabel_array(sym, Label::High) {
                                self.sink.note(
                                    format!("dynamic write raised every element of `{name}` to High"),
                                    value.span(),
                                );
                            }
                        }
                    }
                }
                AssignTarget::Index { name, symbol, index }
            }
        }
    }

    /// Property #2 of the specification's testable properties: for every
    /// assignment to a declared-`Low` target, the label actually reaching it
    /// — whether tainted by a `High` program counter or by a flow-sensitive
    /// value the static explicit-flow pass (§4.6) could not see — must stay
    /// `Low`. `explicit_flow` already rejects the purely static case before
    /// this pass ever runs, so by the time this fires the cause is always
    /// either implicit (a tainted `pc`) or a context label that rose after
    /// declaration.
    fn check_low_target(&self, decl_label: Label, reaching_label: Label, name: &str, span: Span) {
        if decl_label == Label::Low && reaching_label == Label::High {
            self.sink.security_error(
                format!("insecure flow: confidential value reaches public `{name}`"),
                span,
            );
        }
    }

    /// Prints a `debug expr;` statement's type and flow-sensitive label
    /// through the sink, non-fatally, using the expression's final
    /// (post-flow-analysis) `secure` value.
    fn report_debug(&self, e: &Expr) {
        let subject = match &e.kind {
            ExprKind::Id { name, .. } => format!("variable `{name}`"),
            ExprKind::BinOp { .. } => "expression with binary operator".to_string(),
            ExprKind::UnOp { .. } => "expression with unary operator".to_string(),
            ExprKind::Call { name, .. } => format!("call to `{name}`"),
            _ => "expression".to_string(),
        };
        let epilogue = format!("type {}, label {:?}", e.ty, e.secure);
        self.sink.debug(subject, e.span(), Some(&epilogue));
    }

    /// The per-element labels for an array declaration: the labels of an
    /// `EArrayLiteral`'s own elements, or (when the declaration copies
    /// another array by identifier, e.g. `b[3] := a;` is not legal syntax
    /// here but a future alias form would read this way) the source array's
    /// current per-element labels, falling back to its declared label for
    /// any element the context has not yet tracked.
    fn array_literal_labels(&self, value: &Expr, length: u32, ctx: &SecurityContext) -> Vec<Label> {
        match &value.kind {
            ExprKind::ArrayLiteral(items) => items.iter().map(|e| e.secure).collect(),
            ExprKind::Id { symbol: Some(src), .. } => {
                let decl = self.file.symbols.get(*src).decl_label;
                match ctx.labels_of_array(*src) {
                    Some(labels) => labels.to_vec(),
                    None => vec![decl; length as usize],
                }
            }
            _ => vec![value.secure; length as usize],
        }
    }

    fn analyze_expr(&mut self, expr: Expr, pc: Label, ctx: &mut SecurityContext) -> Expr {
        let Expr { kind, ty, span, .. } = expr;
        let (kind, secure) = match kind {
            ExprKind::Int(n) => (ExprKind::Int(n), Label::Low),
            ExprKind::Bool(b) => (ExprKind::Bool(b), Label::Low),

            ExprKind::Id { name, symbol } => {
                let sym = symbol.expect("bound");
                let decl = self.file.symbols.get(sym).decl_label;
                let secure = ctx.label_of_var(sym, decl);
                (ExprKind::Id { name, symbol }, secure)
            }

            ExprKind::Index { name, symbol, index } => {
                let index = Box::new(self.analyze_expr(*index, pc, ctx));
                let sym = symbol.expect("bound");
                let decl = self.file.symbols.get(sym).decl_label;
                // A literal index can read the precise per-element label;
                // a dynamic one must assume any element could be the one
                // read, so it joins over all of them.
                let elem_label = match literal_index(&index) {
                    Some(i) => ctx.label_of_array_index(sym, i, decl),
                    None => match ctx.labels_of_array(sym) {
                        Some(labels) => join(labels.iter().copied()),
                        None => decl,
                    },
                };
                let secure = join([index.secure, elem_label]);
                (ExprKind::Index { name, symbol, index }, secure)
            }

            ExprKind::ArrayLiteral(items) => {
                let items: Vec<Expr> = items.into_iter().map(|e| self.analyze_expr(e, pc, ctx)).collect();
                let secure = join(items.iter().map(|e| e.secure));
                (ExprKind::ArrayLiteral(items), secure)
            }

            ExprKind::UnOp { op, operand } => {
                let operand = Box::new(self.analyze_expr(*operand, pc, ctx));
                let secure = operand.secure;
                (ExprKind::UnOp { op, operand }, secure)
            }

            ExprKind::BinOp { op, lhs, rhs } => {
                let lhs = Box::new(self.analyze_expr(*lhs, pc, ctx));
                let rhs = Box::new(self.analyze_expr(*rhs, pc, ctx));
                let secure = join([lhs.secure, rhs.secure]);
                (ExprKind::BinOp { op, lhs, rhs }, secure)
            }

            ExprKind::Call { name, symbol, args } => {
                let sym = symbol.expect("bound");
                let args: Vec<Expr> = args.into_iter().map(|a| self.analyze_expr(a, pc, ctx)).collect();
                let secure = self.analyze_call(sym, &args, pc, span);
                (ExprKind::Call { name, symbol, args }, secure)
            }

            ExprKind::Declassify(inner) => {
                let inner = Box::new(self.analyze_expr(*inner, pc, ctx));
                // Declassifying a value the flow-sensitive analysis now
                // considers already-public means the programmer's model of
                // what's confidential has diverged from the analyser's —
                // treated as a fatal error rather than silently accepted.
                if inner.secure != Label::High {
                    self.sink.security_error(
                        "declassify of an expression that is not confidential",
                        inner.span(),
                    );
                }
                (ExprKind::Declassify(inner), Label::Low)
            }
        };
        Expr { kind, ty, secure, span }
    }

    /// Re-analyses `fn_sym`'s body in a fresh context seeded from `args`'
    /// labels, returning the join of every `SReturn` reached. Memoised by
    /// `(FnDefId, argument labels)`; a re-entrant call to the same key (as
    /// for a directly or mutually recursive function) returns `High`
    /// without recursing further, which is always a safe over-approximation
    /// of whatever the true fixed point turns out to be.
    fn analyze_call(&mut self, fn_sym: SymbolId, args: &[Expr], pc: Label, span: Span) -> Label {
        let def_id = match &self.file.symbols.get(fn_sym).ty {
            Type::Fn { def, .. } => *def,
            _ => self.sink.error("call to a non-function", span),
        };
        let arg_labels: Vec<Label> = args.iter().map(|a| a.secure).collect();
        let key = (def_id, arg_labels.clone());

        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }
        if self.active.contains(&key) {
            return Label::High;
        }
        self.active.insert(key.clone());

        let mut call_ctx = SecurityContext::new();
        let param_count = self.file.fn_defs.get(def_id).params.len();
        for i in 0..param_count {
            let psym = self.file.fn_defs.get(def_id).params[i].symbol.expect("bound");
            call_ctx.register_var(psym, arg_labels[i]);
        }

        let body = std::mem::replace(
            &mut self.file.fn_defs.get_mut(def_id).body,
            Stmt::new(StmtKind::Throw, Span::dummy()),
        );
        let saved_returns = std::mem::take(&mut self.returns);
        let body = self.analyze_stmt(body, pc, &mut call_ctx);
        let returns = std::mem::replace(&mut self.returns, saved_returns);
        self.file.fn_defs.get_mut(def_id).body = body;

        let result = join(returns);
        self.active.remove(&key);
        self.cache.insert(key, result);
        result
    }
}

/// A non-negative integer literal used as a statically-known array index.
fn literal_index(expr: &Expr) -> Option<usize> {
    match &expr.kind {
        ExprKind::Int(n) if *n >= 0 => Some(*n as usize),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_common::SourceFile;

    fn run(src: &str) -> File {
        let source = SourceFile::new("t.pls", src);
        let sink = Sink::new(&source).without_color();
        let mut file = palisade_parser::parse(&source, &sink);
        palisade_binder::bind(&mut file, &sink);
        crate::check(&mut file, &sink);
        file
    }

    fn last_assign_value(file: &File) -> &Expr {
        match &file.statements.last().unwrap().kind {
            StmtKind::Assign { value, .. } => value,
            StmtKind::VarDef { value, .. } => value,
            other => panic!("expected an assignment or var def, got {other:?}"),
        }
    }

    #[test]
    fn declassified_call_result_is_accepted() {
        let file = run("in{high s:int;} out{low y:int;} y := declassify (s + 1);");
        assert_eq!(last_assign_value(&file).secure, Label::Low);
    }

    #[test]
    fn literal_indexed_write_changes_only_that_element() {
        // `x` is a local array, always registered with decl_label `High`
        // (§4.3), so writing a `High` value through a literal index never
        // trips the low-target guard; index 2 is left exactly as the
        // original (`Low`-labelled) literal put it.
        let file = run(
            "in{high h:int;} x[3] := [1, h, 2]; x[0] := h; \
             out{high y0:int; high y1:int; high y2:int;} \
             y0 := x[0]; y1 := x[1]; y2 := x[2];",
        );
        let StmtKind::Assign { value: y0, .. } = &file.statements[file.statements.len() - 3].kind else {
            panic!("expected an assignment");
        };
        let StmtKind::Assign { value: y1, .. } = &file.statements[file.statements.len() - 2].kind else {
            panic!("expected an assignment");
        };
        let y2 = last_assign_value(&file);
        assert_eq!(y0.secure, Label::High);
        assert_eq!(y1.secure, Label::High);
        assert_eq!(y2.secure, Label::Low);
    }

    #[test]
    fn dynamic_write_with_a_confidential_index_raises_the_whole_array() {
        // The value written is `Low`, but the index is `High`: observing
        // which element changed would leak the index itself, so the whole
        // array (a local, decl_label `High`) is conservatively raised rather
        // than rejected outright.
        let file = run(
            "in{high h:int;} x[2] := [1, 2]; i := h; x[i] := 1; \
             out{high y:int;} y := x[0];",
        );
        assert_eq!(last_assign_value(&file).secure, Label::High);
    }

    #[test]
    fn recursive_function_call_terminates() {
        // Must not hang: direct recursion is broken by the in-progress guard.
        let file = run("fn f(low n:int) low int { return f(n); } out{low y:int;} y := f(1);");
        assert!(!file.statements.is_empty());
    }

    #[test]
    fn function_result_label_follows_the_actual_argument_at_the_call_site() {
        let file = run(
            "fn ident(low n:int) low int { return n; } \
             in{high s:int;} out{low y:int;} y := declassify(ident(s));",
        );
        assert_eq!(last_assign_value(&file).secure, Label::Low);
    }
}
