//! Statement, global-block, function-definition, and type grammar.

use palisade_ast::{
    AssignTarget, Expr, ExprKind, File, FnDef, GlobalDirection, Label, Param, Stmt, StmtKind,
    SymbolId, Type,
};
use palisade_common::{Sink, Span, Spanned};
use palisade_lexer::TokenKind;

use crate::cursor::Cursor;
use crate::expr::parse_expr;
use crate::{expect, expect_ident};

/// `in { decls } out { decls } stmt*` — both global blocks are optional, but
/// if present must appear before any other top-level statement.
pub fn parse_file(cursor: &mut Cursor, sink: &Sink, file: &mut File) {
    if cursor.at(TokenKind::In) {
        parse_global_block(cursor, sink, file, GlobalDirection::In);
    }
    if cursor.at(TokenKind::Out) {
        parse_global_block(cursor, sink, file, GlobalDirection::Out);
    }
    while !cursor.at(TokenKind::Eof) {
        file.statements.push(parse_stmt(cursor, sink, file));
    }
}

fn parse_global_block(cursor: &mut Cursor, sink: &Sink, file: &mut File, direction: GlobalDirection) {
    let keyword = if direction == GlobalDirection::In { TokenKind::In } else { TokenKind::Out };
    expect(cursor, sink, keyword, "`in`/`out`");
    expect(cursor, sink, TokenKind::LBrace, "`{`");
    while !cursor.at(TokenKind::RBrace) {
        file.statements.push(parse_global_decl(cursor, sink, direction));
    }
    expect(cursor, sink, TokenKind::RBrace, "`}`");
}

fn parse_global_decl(cursor: &mut Cursor, sink: &Sink, direction: GlobalDirection) -> Stmt {
    let start = cursor.peek().span.start;
    let decl_label = parse_label(cursor, sink);
    let (name, _) = expect_ident(cursor, sink);
    expect(cursor, sink, TokenKind::Colon, "`:`");
    let ty = parse_type(cursor, sink);
    let array_length = array_length_of(&ty);
    let end = expect(cursor, sink, TokenKind::Semi, "`;`").span.end;
    let stmt = Stmt::new(
        StmtKind::Global {
            name,
            symbol: None,
            direction,
            decl_label,
            ty,
            array_length,
        },
        Span::new(start, end),
    );
    stmt
}

fn array_length_of(ty: &Type) -> Option<u32> {
    match ty {
        Type::Array { length, .. } => Some(*length),
        _ => None,
    }
}

fn parse_label(cursor: &mut Cursor, sink: &Sink) -> Label {
    match cursor.peek_kind() {
        TokenKind::High => {
            cursor.bump();
            Label::High
        }
        TokenKind::Low => {
            cursor.bump();
            Label::Low
        }
        other => sink.error(format!("expected `high` or `low`, found {other:?}"), cursor.peek().span),
    }
}

/// `int` | `bool` | `T[n]` — array nesting is syntactically allowed even
/// though nothing in the source material nests arrays in practice.
fn parse_type(cursor: &mut Cursor, sink: &Sink) -> Type {
    let (name, span) = expect_ident(cursor, sink);
    let mut ty = match name.as_str() {
        "int" => Type::Int,
        "bool" => Type::Bool,
        other => sink.error(format!("unknown type `{other}`"), span),
    };
    while cursor.eat(TokenKind::LBracket).is_some() {
        let len_tok = expect(cursor, sink, TokenKind::IntLiteral, "an array length");
        let length: u32 = cursor
            .text(len_tok.span)
            .parse()
            .unwrap_or_else(|_| sink.error("array length out of range", len_tok.span));
        expect(cursor, sink, TokenKind::RBracket, "`]`");
        ty = Type::array(ty, length);
    }
    ty
}

fn parse_stmt(cursor: &mut Cursor, sink: &Sink, file: &mut File) -> Stmt {
    match cursor.peek_kind() {
        TokenKind::LBrace => parse_scope(cursor, sink, file),
        TokenKind::Fn => parse_fn_def(cursor, sink, file),
        TokenKind::If => parse_if(cursor, sink, file),
        TokenKind::While => parse_while(cursor, sink, file),
        TokenKind::Try => parse_try_catch(cursor, sink, file),
        TokenKind::Throw => {
            let start = cursor.bump().span.start;
            let end = expect(cursor, sink, TokenKind::Semi, "`;`").span.end;
            Stmt::new(StmtKind::Throw, Span::new(start, end))
        }
        TokenKind::Return => {
            let start = cursor.bump().span.start;
            let value = parse_expr(cursor, sink);
            let end = expect(cursor, sink, TokenKind::Semi, "`;`").span.end;
            Stmt::new(StmtKind::Return(value), Span::new(start, end))
        }
        TokenKind::Debug => {
            let start = cursor.bump().span.start;
            let value = parse_expr(cursor, sink);
            let end = expect(cursor, sink, TokenKind::Semi, "`;`").span.end;
            Stmt::new(StmtKind::Debug(value), Span::new(start, end))
        }
        TokenKind::Ident => parse_var_def_or_assign(cursor, sink),
        other => sink.error(format!("expected a statement, found {other:?}"), cursor.peek().span),
    }
}

fn parse_scope(cursor: &mut Cursor, sink: &Sink, file: &mut File) -> Stmt {
    let start = expect(cursor, sink, TokenKind::LBrace, "`{`").span.start;
    let mut stmts = Vec::new();
    while !cursor.at(TokenKind::RBrace) {
        stmts.push(parse_stmt(cursor, sink, file));
    }
    let end = expect(cursor, sink, TokenKind::RBrace, "`}`").span.end;
    Stmt::new(StmtKind::Scope(stmts), Span::new(start, end))
}

fn parse_fn_def(cursor: &mut Cursor, sink: &Sink, file: &mut File) -> Stmt {
    let start = expect(cursor, sink, TokenKind::Fn, "`fn`").span.start;
    let (name, _) = expect_ident(cursor, sink);
    expect(cursor, sink, TokenKind::LParen, "`(`");
    let mut params = Vec::new();
    if !cursor.at(TokenKind::RParen) {
        params.push(parse_param(cursor, sink));
        while cursor.eat(TokenKind::Comma).is_some() {
            params.push(parse_param(cursor, sink));
        }
    }
    expect(cursor, sink, TokenKind::RParen, "`)`");
    let ret_label = parse_label(cursor, sink);
    let ret_ty = parse_type(cursor, sink);
    let body = parse_scope(cursor, sink, file);
    let end = body.span().end;

    let def = FnDef {
        name,
        symbol: SymbolId::PLACEHOLDER,
        params,
        ret_label,
        ret_ty,
        body,
        span: Span::new(start, end),
    };
    let fn_def_id = file.fn_defs.insert(def);
    Stmt::new(StmtKind::FnDef(fn_def_id), Span::new(start, end))
}

fn parse_param(cursor: &mut Cursor, sink: &Sink) -> Param {
    let start = cursor.peek().span.start;
    let label = parse_label(cursor, sink);
    let (name, _) = expect_ident(cursor, sink);
    expect(cursor, sink, TokenKind::Colon, "`:`");
    let ty = parse_type(cursor, sink);
    let end = cursor.prev_end();
    Param {
        name,
        symbol: None,
        label,
        ty,
        span: Span::new(start, end),
    }
}

fn parse_if(cursor: &mut Cursor, sink: &Sink, file: &mut File) -> Stmt {
    let start = expect(cursor, sink, TokenKind::If, "`if`").span.start;
    expect(cursor, sink, TokenKind::LParen, "`(`");
    let cond = parse_expr(cursor, sink);
    expect(cursor, sink, TokenKind::RParen, "`)`");
    let then_branch = Box::new(parse_scope(cursor, sink, file));
    let mut end = then_branch.span().end;
    let else_branch = if cursor.eat(TokenKind::Else).is_some() {
        let else_stmt = if cursor.at(TokenKind::If) {
            parse_if(cursor, sink, file)
        } else {
            parse_scope(cursor, sink, file)
        };
        end = else_stmt.span().end;
        Some(Box::new(else_stmt))
    } else {
        None
    };
    Stmt::new(
        StmtKind::If { cond, then_branch, else_branch },
        Span::new(start, end),
    )
}

fn parse_while(cursor: &mut Cursor, sink: &Sink, file: &mut File) -> Stmt {
    let start = expect(cursor, sink, TokenKind::While, "`while`").span.start;
    expect(cursor, sink, TokenKind::LParen, "`(`");
    let cond = parse_expr(cursor, sink);
    expect(cursor, sink, TokenKind::RParen, "`)`");
    let body = Box::new(parse_scope(cursor, sink, file));
    let end = body.span().end;
    Stmt::new(StmtKind::While { cond, body }, Span::new(start, end))
}

fn parse_try_catch(cursor: &mut Cursor, sink: &Sink, file: &mut File) -> Stmt {
    let start = expect(cursor, sink, TokenKind::Try, "`try`").span.start;
    let try_block = Box::new(parse_scope(cursor, sink, file));
    expect(cursor, sink, TokenKind::Catch, "`catch`");
    let catch_block = Box::new(parse_scope(cursor, sink, file));
    let end = catch_block.span().end;
    Stmt::new(
        StmtKind::TryCatch { try_block, catch_block },
        Span::new(start, end),
    )
}

/// `name := expr;`, `name[n] := [e1, ..., en];`, or `name[index] := expr;`.
///
/// The first two forms are syntactically identical until the token after
/// `:=`: an array *declaration* always supplies an array literal on the
/// right, so seeing anything other than `[` there means this was really an
/// index *write* (`a[k] := scalar;`), which the parser can represent
/// directly as `StmtKind::Assign` since indexed assignment is never
/// ambiguous with declaration. A bare `name := expr;` is always emitted as
/// the neutral `VarDef` shape described in the module doc comment.
fn parse_var_def_or_assign(cursor: &mut Cursor, sink: &Sink) -> Stmt {
    let (name, name_span) = expect_ident(cursor, sink);

    if cursor.eat(TokenKind::LBracket).is_some() {
        let index = parse_expr(cursor, sink);
        expect(cursor, sink, TokenKind::RBracket, "`]`");
        expect(cursor, sink, TokenKind::ColonEq, "`:=`");
        if cursor.at(TokenKind::LBracket) {
            let literal = crate::expr::parse_array_literal(cursor, sink);
            let length = index_as_literal_length(&index, sink);
            let end = expect(cursor, sink, TokenKind::Semi, "`;`").span.end;
            return Stmt::new(
                StmtKind::VarDef {
                    name,
                    symbol: None,
                    array_length: Some(length),
                    value: literal,
                },
                Span::new(name_span.start, end),
            );
        }
        let value = parse_expr(cursor, sink);
        let end = expect(cursor, sink, TokenKind::Semi, "`;`").span.end;
        return Stmt::new(
            StmtKind::Assign {
                target: AssignTarget::Index { name, symbol: None, index },
                value,
            },
            Span::new(name_span.start, end),
        );
    }

    expect(cursor, sink, TokenKind::ColonEq, "`:=`");
    let value = parse_expr(cursor, sink);
    let end = expect(cursor, sink, TokenKind::Semi, "`;`").span.end;
    Stmt::new(
        StmtKind::VarDef { name, symbol: None, array_length: None, value },
        Span::new(name_span.start, end),
    )
}

fn index_as_literal_length(index: &Expr, sink: &Sink) -> u32 {
    match &index.kind {
        ExprKind::Int(n) if *n >= 0 => *n as u32,
        _ => sink.error(
            "an array declaration's length must be a non-negative integer literal",
            index.span(),
        ),
    }
}
