//! A thin, panic-free cursor over a token slice.

use palisade_common::{SourceFile, Span};
use palisade_lexer::{Token, TokenKind};

pub struct Cursor<'a> {
    source: &'a SourceFile,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(source: &'a SourceFile, tokens: Vec<Token>) -> Self {
        Cursor { source, tokens, pos: 0 }
    }

    pub fn peek(&self) -> Token {
        self.tokens[self.pos]
    }

    pub fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub fn bump(&mut self) -> Token {
        let tok = self.peek();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    pub fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            Some(self.bump())
        } else {
            None
        }
    }

    pub fn text(&self, span: Span) -> &'a str {
        self.source.slice(span)
    }

    pub fn prev_end(&self) -> u32 {
        if self.pos == 0 {
            0
        } else {
            self.tokens[self.pos - 1].span.end
        }
    }
}
