//! Expression grammar: precedence climbing over the operator groups from
//! the external interface spec.
//!
//! Intra-group precedence (e.g. that `*` binds tighter than `+`, or that
//! `&` binds tighter than `|`) is not dictated by the source material — it
//! only groups operators by the *type* they require. We pick the
//! conventional C-family ladder, loosest to tightest:
//! `|| , && , comparison , | , ^ , & , shift , + - , * / % , unary`.
//! This makes the one documented auto-resolution rule — comparison binds
//! looser than arithmetic/bitwise/shift, so `a + b < c` parses as
//! `(a + b) < c` — fall out for free, since comparison sits strictly
//! between the boolean and the arithmetic tiers.

use palisade_ast::{BinOp, Expr, ExprKind, UnOp};
use palisade_common::{Sink, Span, Spanned};
use palisade_lexer::TokenKind;

use crate::cursor::Cursor;
use crate::{expect, expect_ident};

pub fn parse_expr(cursor: &mut Cursor, sink: &Sink) -> Expr {
    parse_or(cursor, sink)
}

fn parse_or(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let mut lhs = parse_and(cursor, sink);
    while cursor.at(TokenKind::PipePipe) {
        cursor.bump();
        let rhs = parse_and(cursor, sink);
        lhs = binop(BinOp::Or, lhs, rhs);
    }
    lhs
}

fn parse_and(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let mut lhs = parse_comparison(cursor, sink);
    while cursor.at(TokenKind::AmpAmp) {
        cursor.bump();
        let rhs = parse_comparison(cursor, sink);
        lhs = binop(BinOp::And, lhs, rhs);
    }
    lhs
}

fn parse_comparison(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let lhs = parse_bitor(cursor, sink);
    let op = match cursor.peek_kind() {
        TokenKind::Lt => BinOp::Lt,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::Le => BinOp::Le,
        TokenKind::Ge => BinOp::Ge,
        TokenKind::EqEq => BinOp::Eq,
        TokenKind::Ne => BinOp::Ne,
        _ => return lhs,
    };
    cursor.bump();
    let rhs = parse_bitor(cursor, sink);
    binop(op, lhs, rhs)
}

fn parse_bitor(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let mut lhs = parse_bitxor(cursor, sink);
    while cursor.at(TokenKind::Pipe) {
        cursor.bump();
        let rhs = parse_bitxor(cursor, sink);
        lhs = binop(BinOp::BitOr, lhs, rhs);
    }
    lhs
}

fn parse_bitxor(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let mut lhs = parse_bitand(cursor, sink);
    while cursor.at(TokenKind::Caret) {
        cursor.bump();
        let rhs = parse_bitand(cursor, sink);
        lhs = binop(BinOp::BitXor, lhs, rhs);
    }
    lhs
}

fn parse_bitand(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let mut lhs = parse_shift(cursor, sink);
    while cursor.at(TokenKind::Amp) {
        cursor.bump();
        let rhs = parse_shift(cursor, sink);
        lhs = binop(BinOp::BitAnd, lhs, rhs);
    }
    lhs
}

fn parse_shift(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let mut lhs = parse_additive(cursor, sink);
    loop {
        let op = match cursor.peek_kind() {
            TokenKind::Shl => BinOp::Shl,
            TokenKind::Shr => BinOp::Shr,
            _ => break,
        };
        cursor.bump();
        let rhs = parse_additive(cursor, sink);
        lhs = binop(op, lhs, rhs);
    }
    lhs
}

fn parse_additive(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let mut lhs = parse_multiplicative(cursor, sink);
    loop {
        let op = match cursor.peek_kind() {
            TokenKind::Plus => BinOp::Add,
            TokenKind::Minus => BinOp::Sub,
            _ => break,
        };
        cursor.bump();
        let rhs = parse_multiplicative(cursor, sink);
        lhs = binop(op, lhs, rhs);
    }
    lhs
}

fn parse_multiplicative(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let mut lhs = parse_unary(cursor, sink);
    loop {
        let op = match cursor.peek_kind() {
            TokenKind::Star => BinOp::Mul,
            TokenKind::Slash => BinOp::Div,
            TokenKind::Percent => BinOp::Mod,
            _ => break,
        };
        cursor.bump();
        let rhs = parse_unary(cursor, sink);
        lhs = binop(op, lhs, rhs);
    }
    lhs
}

fn parse_unary(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let op = match cursor.peek_kind() {
        TokenKind::Minus => Some(UnOp::Neg),
        TokenKind::Plus => Some(UnOp::Plus),
        TokenKind::Bang => Some(UnOp::Not),
        TokenKind::Tilde => Some(UnOp::BitNot),
        _ => None,
    };
    let Some(op) = op else {
        return parse_primary(cursor, sink);
    };
    let start = cursor.peek().span.start;
    cursor.bump();
    let operand = parse_unary(cursor, sink);
    let span = Span::new(start, operand.span().end);
    Expr::new(
        ExprKind::UnOp { op, operand: Box::new(operand) },
        span,
    )
}

fn parse_primary(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let tok = cursor.peek();
    match tok.kind {
        TokenKind::IntLiteral => {
            cursor.bump();
            let value = parse_int_literal(cursor.text(tok.span), sink, tok.span);
            Expr::new(ExprKind::Int(value), tok.span)
        }
        TokenKind::True => {
            cursor.bump();
            Expr::new(ExprKind::Bool(true), tok.span)
        }
        TokenKind::False => {
            cursor.bump();
            Expr::new(ExprKind::Bool(false), tok.span)
        }
        TokenKind::LParen => {
            cursor.bump();
            let inner = parse_expr(cursor, sink);
            expect(cursor, sink, TokenKind::RParen, "`)`");
            inner
        }
        TokenKind::LBracket => parse_array_literal(cursor, sink),
        TokenKind::Declassify => {
            cursor.bump();
            let inner = parse_expr(cursor, sink);
            let span = Span::new(tok.span.start, inner.span().end);
            Expr::new(ExprKind::Declassify(Box::new(inner)), span)
        }
        TokenKind::Ident => parse_ident_expr(cursor, sink),
        _ => sink.error(format!("expected an expression, found {:?}", tok.kind), tok.span),
    }
}

pub(crate) fn parse_array_literal(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let start = expect(cursor, sink, TokenKind::LBracket, "`[`").span.start;
    let mut items = Vec::new();
    if !cursor.at(TokenKind::RBracket) {
        items.push(parse_expr(cursor, sink));
        while cursor.eat(TokenKind::Comma).is_some() {
            if cursor.at(TokenKind::RBracket) {
                break;
            }
            items.push(parse_expr(cursor, sink));
        }
    }
    let end = expect(cursor, sink, TokenKind::RBracket, "`]`").span.end;
    Expr::new(ExprKind::ArrayLiteral(items), Span::new(start, end))
}

fn parse_ident_expr(cursor: &mut Cursor, sink: &Sink) -> Expr {
    let (name, name_span) = expect_ident(cursor, sink);
    if cursor.eat(TokenKind::LParen).is_some() {
        let mut args = Vec::new();
        if !cursor.at(TokenKind::RParen) {
            args.push(parse_expr(cursor, sink));
            while cursor.eat(TokenKind::Comma).is_some() {
                args.push(parse_expr(cursor, sink));
            }
        }
        let end = expect(cursor, sink, TokenKind::RParen, "`)`").span.end;
        return Expr::new(
            ExprKind::Call { name, symbol: None, args },
            Span::new(name_span.start, end),
        );
    }
    if cursor.eat(TokenKind::LBracket).is_some() {
        let index = parse_expr(cursor, sink);
        let end = expect(cursor, sink, TokenKind::RBracket, "`]`").span.end;
        return Expr::new(
            ExprKind::Index { name, symbol: None, index: Box::new(index) },
            Span::new(name_span.start, end),
        );
    }
    Expr::new(ExprKind::Id { name, symbol: None }, name_span)
}

fn binop(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    let span = Span::new(lhs.span().start, rhs.span().end);
    Expr::new(
        ExprKind::BinOp { op, lhs: Box::new(lhs), rhs: Box::new(rhs) },
        span,
    )
}

/// Parses the token text of an `IntLiteral` token into its value, enforcing
/// the two lexical restrictions the lexer itself does not check because it
/// only needs to recognise digit runs, not evaluate them: overflow of `i64`.
fn parse_int_literal(text: &str, sink: &Sink, span: Span) -> i64 {
    let text = text.replace('_', "");
    let (digits, radix) = if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        (rest, 16)
    } else if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        (rest, 8)
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        (rest, 2)
    } else {
        (text.as_str(), 10)
    };
    match i64::from_str_radix(digits, radix) {
        Ok(value) => value,
        Err(_) => sink.error("integer literal out of range", span),
    }
}
