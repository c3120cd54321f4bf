//! Recursive-descent parser producing the untyped Palisade [`File`].
//!
//! The parser never consults a symbol table — that's the binder's job, run
//! after this pass. The only ambiguity this creates is `name := expr;`: it
//! could be a fresh local declaration or a reassignment of an
//! already-declared name. The grammar is genuinely ambiguous without
//! scope information, so the parser always emits the neutral
//! [`StmtKind::VarDef`] shape for it with `array_length: None`; the binder
//! rewrites it into a `StmtKind::Assign` when the name already resolves in
//! an enclosing scope.

mod cursor;
mod expr;
mod stmt;

use palisade_ast::File;
use palisade_common::{SourceFile, Sink};
use palisade_lexer::{Lexer, Token, TokenKind};

use cursor::Cursor;

pub fn parse<'a>(source: &'a SourceFile, sink: &'a Sink<'a>) -> File {
    let tokens: Vec<Token> = Lexer::new(source, sink).tokenize();
    let mut cursor = Cursor::new(source, tokens);
    let mut file = File::new();
    stmt::parse_file(&mut cursor, sink, &mut file);
    file
}

fn expect(cursor: &mut Cursor, sink: &Sink, kind: TokenKind, what: &str) -> Token {
    if let Some(tok) = cursor.eat(kind) {
        tok
    } else {
        let found = cursor.peek();
        sink.error(format!("expected {what}, found {:?}", found.kind), found.span)
    }
}

fn expect_ident<'a>(cursor: &mut Cursor<'a>, sink: &Sink) -> (String, palisade_common::Span) {
    let tok = expect(cursor, sink, TokenKind::Ident, "an identifier");
    (cursor.text(tok.span).to_string(), tok.span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use palisade_ast::{GlobalDirection, StmtKind};

    fn parse_ok(src: &str) -> File {
        let source = SourceFile::new("t.pls", src);
        let sink = Sink::new(&source).without_color();
        parse(&source, &sink)
    }

    #[test]
    fn parses_global_blocks_and_reassignment() {
        let file = parse_ok("in{low x:int;} out{low y:int;} y := x + 1;");
        assert_eq!(file.statements.len(), 3);
        assert!(matches!(
            &file.statements[0].kind,
            StmtKind::Global { direction: GlobalDirection::In, name, .. } if name == "x"
        ));
        assert!(matches!(
            &file.statements[1].kind,
            StmtKind::Global { direction: GlobalDirection::Out, name, .. } if name == "y"
        ));
        assert!(matches!(&file.statements[2].kind, StmtKind::VarDef { array_length: None, .. }));
    }

    #[test]
    fn parses_array_declaration_and_index_write() {
        let file = parse_ok("in{low a:int[3];low i:int;} a[i] := 42;");
        let last = file.statements.last().unwrap();
        assert!(matches!(&last.kind, StmtKind::Assign { .. }));
    }

    #[test]
    fn parses_fn_def_and_call() {
        let file = parse_ok(
            "fn add(low a:int, low b:int) low int { return a + b; } out{low y:int;} y := add(1, 2);",
        );
        assert!(matches!(&file.statements[0].kind, StmtKind::FnDef(_)));
    }

    #[test]
    fn comparison_binds_looser_than_arithmetic() {
        let file = parse_ok("in{low a:int;low b:int;low c:int;} while (a + b < c) { a := a - 1; }");
        let StmtKind::While { cond, .. } = &file.statements.last().unwrap().kind else {
            panic!("expected a while statement");
        };
        let palisade_ast::ExprKind::BinOp { op, lhs, .. } = &cond.kind else {
            panic!("expected a top-level comparison");
        };
        assert_eq!(*op, palisade_ast::BinOp::Lt);
        assert!(matches!(lhs.kind, palisade_ast::ExprKind::BinOp { op: palisade_ast::BinOp::Add, .. }));
    }

    #[test]
    fn declassify_parses_as_an_expression() {
        let file = parse_ok("in{high s:int;low x:int;} out{low y:int;} y := declassify (s + x);");
        let StmtKind::VarDef { value, .. } = &file.statements.last().unwrap().kind else {
            panic!("expected a var def");
        };
        assert!(matches!(value.kind, palisade_ast::ExprKind::Declassify(_)));
    }
}
