//! Renders the decorated AST to stdout after a successful compile (§7: "a
//! printed decorated AST or the result of `debug` statements; the exact
//! human format is not part of the specification").
//!
//! Every symbol use, static type, and security label the pipeline attached
//! is printed inline, so the output doubles as a manual trace of what each
//! pass did to the tree.

use std::fmt::Write as _;

use palisade_ast::{AssignTarget, Expr, ExprKind, File, GlobalDirection, Stmt, StmtKind};

pub fn print_file(file: &File) {
    let mut out = String::new();
    for stmt in &file.statements {
        print_stmt(stmt, file, 0, &mut out);
    }
    print!("{out}");
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn print_stmt(stmt: &Stmt, file: &File, depth: usize, out: &mut String) {
    indent(out, depth);
    match &stmt.kind {
        StmtKind::Scope(stmts) => {
            out.push_str("{\n");
            for s in stmts {
                print_stmt(s, file, depth + 1, out);
            }
            indent(out, depth);
            out.push_str("}\n");
        }
        StmtKind::VarDef { name, array_length, value, .. } => {
            match array_length {
                Some(n) => writeln!(out, "{name}[{n}] := {} [{:?}]", format_expr(value, file), value.secure).unwrap(),
                None => writeln!(out, "{name} := {} [{:?}]", format_expr(value, file), value.secure).unwrap(),
            }
        }
        StmtKind::FnDef(id) => {
            let def = file.fn_defs.get(*id);
            let params = def
                .params
                .iter()
                .map(|p| format!("{:?} {}:{}", p.label, p.name, p.ty))
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(out, "fn {}({params}) {:?} {} {{", def.name, def.ret_label, def.ret_ty).unwrap();
            print_stmt(&def.body, file, depth + 1, out);
            indent(out, depth);
            out.push_str("}\n");
        }
        StmtKind::Assign { target, value } => match target {
            AssignTarget::Scalar { name, .. } => {
                writeln!(out, "{name} := {} [{:?}]", format_expr(value, file), value.secure).unwrap();
            }
            AssignTarget::Index { name, index, .. } => {
                writeln!(
                    out,
                    "{name}[{}] := {} [{:?}]",
                    format_expr(index, file),
                    format_expr(value, file),
                    value.secure
                )
                .unwrap();
            }
        },
        StmtKind::If { cond, then_branch, else_branch } => {
            writeln!(out, "if ({}) [{:?}]", format_expr(cond, file), cond.secure).unwrap();
            print_stmt(then_branch, file, depth, out);
            if let Some(else_branch) = else_branch {
                indent(out, depth);
                out.push_str("else\n");
                print_stmt(else_branch, file, depth, out);
            }
        }
        StmtKind::While { cond, body } => {
            writeln!(out, "while ({}) [{:?}]", format_expr(cond, file), cond.secure).unwrap();
            print_stmt(body, file, depth, out);
        }
        StmtKind::TryCatch { try_block, catch_block } => {
            out.push_str("try\n");
            print_stmt(try_block, file, depth, out);
            indent(out, depth);
            out.push_str("catch\n");
            print_stmt(catch_block, file, depth, out);
        }
        StmtKind::Throw => out.push_str("throw;\n"),
        StmtKind::Return(e) => writeln!(out, "return {} [{:?}];", format_expr(e, file), e.secure).unwrap(),
        StmtKind::Debug(e) => writeln!(out, "debug {} [{:?}];", format_expr(e, file), e.secure).unwrap(),
        StmtKind::Global { name, direction, decl_label, ty, array_length, .. } => {
            let dir = match direction {
                GlobalDirection::In => "in",
                GlobalDirection::Out => "out",
            };
            let shape = match array_length {
                Some(n) => format!("{ty}[{n}]"),
                None => ty.to_string(),
            };
            writeln!(out, "{dir} {:?} {name}: {shape}", decl_label).unwrap();
        }
    }
}

fn format_expr(expr: &Expr, file: &File) -> String {
    match &expr.kind {
        ExprKind::Int(n) => n.to_string(),
        ExprKind::Bool(b) => b.to_string(),
        ExprKind::Id { name, .. } => name.clone(),
        ExprKind::Index { name, index, .. } => format!("{name}[{}]", format_expr(index, file)),
        ExprKind::ArrayLiteral(items) => {
            let items = items.iter().map(|e| format_expr(e, file)).collect::<Vec<_>>().join(", ");
            format!("[{items}]")
        }
        ExprKind::UnOp { op, operand } => format!("{op:?}({})", format_expr(operand, file)),
        ExprKind::BinOp { op, lhs, rhs } => {
            format!("({} {op:?} {})", format_expr(lhs, file), format_expr(rhs, file))
        }
        ExprKind::Call { name, args, .. } => {
            let args = args.iter().map(|e| format_expr(e, file)).collect::<Vec<_>>().join(", ");
            format!("{name}({args})")
        }
        ExprKind::Declassify(inner) => format!("declassify({})", format_expr(inner, file)),
    }
}
