//! The tokeniser: turns source text into a flat `Vec<Token>`.
//!
//! Handles identifiers/keywords, integer literals in all four bases, the
//! operator/punctuation set, and `//` line comments. Lexical errors
//! (a stray leading zero, an empty-prefix literal like `0x`) are fatal,
//! reported through the [`Sink`] exactly like every other pass.

use palisade_common::{Sink, Span, SourceFile};

use crate::token::{Token, TokenKind, KEYWORDS};

pub struct Lexer<'a> {
    source: &'a SourceFile,
    sink: &'a Sink<'a>,
    bytes: &'a [u8],
    pos: u32,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a SourceFile, sink: &'a Sink<'a>) -> Self {
        Lexer {
            source,
            sink,
            bytes: source.text.as_bytes(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(c) = self.peek() else {
                tokens.push(Token {
                    kind: TokenKind::Eof,
                    span: Span::at(start),
                });
                break;
            };
            let kind = if c.is_ascii_digit() {
                self.lex_number()
            } else if c == b'_' || c.is_ascii_alphabetic() {
                self.lex_ident_or_keyword()
            } else {
                self.lex_operator()
            };
            tokens.push(Token {
                kind,
                span: Span::new(start, self.pos),
            });
        }
        tokens
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                Some(b'/') if self.peek_at(1) == Some(b'/') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn lex_ident_or_keyword(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c == b'_' || c.is_ascii_alphanumeric() {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = &self.source.text[start as usize..self.pos as usize];
        KEYWORDS
            .iter()
            .find(|(kw, _)| *kw == text)
            .map(|(_, kind)| *kind)
            .unwrap_or(TokenKind::Ident)
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'x' | b'X')) {
            self.pos += 2;
            self.consume_digits(|c| c.is_ascii_hexdigit());
            if self.pos == start + 2 {
                self.sink.error("empty hexadecimal literal", Span::new(start, self.pos));
            }
        } else if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'o' | b'O')) {
            self.pos += 2;
            self.consume_digits(|c| (b'0'..=b'7').contains(&c));
            if self.pos == start + 2 {
                self.sink.error("empty octal literal", Span::new(start, self.pos));
            }
        } else if self.peek() == Some(b'0') && matches!(self.peek_at(1), Some(b'b' | b'B')) {
            self.pos += 2;
            self.consume_digits(|c| c == b'0' || c == b'1');
            if self.pos == start + 2 {
                self.sink.error("empty binary literal", Span::new(start, self.pos));
            }
        } else {
            self.consume_digits(|c| c.is_ascii_digit());
            let text = &self.source.text[start as usize..self.pos as usize];
            if text.len() > 1 && text.starts_with('0') {
                self.sink.error(
                    "a leading zero is not allowed in a decimal literal",
                    Span::new(start, self.pos),
                );
            }
        }
        TokenKind::IntLiteral
    }

    fn consume_digits(&mut self, pred: impl Fn(u8) -> bool) {
        while let Some(c) = self.peek() {
            if pred(c) || c == b'_' {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    fn lex_operator(&mut self) -> TokenKind {
        let start = self.pos;
        let c = self.bump().unwrap();
        use TokenKind::*;
        match c {
            b'(' => LParen,
            b')' => RParen,
            b'{' => LBrace,
            b'}' => RBrace,
            b'[' => LBracket,
            b']' => RBracket,
            b';' => Semi,
            b',' => Comma,
            b':' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    ColonEq
                } else {
                    Colon
                }
            }
            b'+' => Plus,
            b'-' => Minus,
            b'*' => Star,
            b'/' => Slash,
            b'%' => Percent,
            b'^' => Caret,
            b'~' => Tilde,
            b'|' => {
                if self.peek() == Some(b'|') {
                    self.pos += 1;
                    PipePipe
                } else {
                    Pipe
                }
            }
            b'&' => {
                if self.peek() == Some(b'&') {
                    self.pos += 1;
                    AmpAmp
                } else {
                    Amp
                }
            }
            b'<' => {
                if self.peek() == Some(b'<') {
                    self.pos += 1;
                    Shl
                } else if self.peek() == Some(b'=') {
                    self.pos += 1;
                    Le
                } else {
                    Lt
                }
            }
            b'>' => {
                if self.peek() == Some(b'>') {
                    self.pos += 1;
                    Shr
                } else if self.peek() == Some(b'=') {
                    self.pos += 1;
                    Ge
                } else {
                    Gt
                }
            }
            b'=' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    EqEq
                } else {
                    self.sink.error("unexpected character '='", Span::new(start, self.pos));
                }
            }
            b'!' => {
                if self.peek() == Some(b'=') {
                    self.pos += 1;
                    Ne
                } else {
                    Bang
                }
            }
            other => self.sink.error(
                format!("unexpected character '{}'", other as char),
                Span::new(start, self.pos),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(src: &str) -> Vec<TokenKind> {
        let source = SourceFile::new("t.pls", src);
        let sink = Sink::new(&source).without_color();
        Lexer::new(&source, &sink)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn lexes_var_def() {
        let kinds = tokenize("x := 1;");
        assert_eq!(
            kinds,
            vec![
                TokenKind::Ident,
                TokenKind::ColonEq,
                TokenKind::IntLiteral,
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_all_integer_bases() {
        let kinds = tokenize("0xFF 0o17 0b101 42");
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral,
                TokenKind::IntLiteral,
                TokenKind::IntLiteral,
                TokenKind::IntLiteral,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_keywords_and_comments() {
        let kinds = tokenize("if true { } // trailing comment\n");
        assert_eq!(
            kinds,
            vec![
                TokenKind::If,
                TokenKind::True,
                TokenKind::LBrace,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }
}
