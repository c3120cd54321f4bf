use palisade_common::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // Literals & identifiers
    Ident,
    IntLiteral,
    True,
    False,

    // Keywords
    If,
    Else,
    While,
    Debug,
    Declassify,
    Try,
    Catch,
    Throw,
    High,
    Low,
    Fn,
    In,
    Out,
    Return,

    // Punctuation
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Semi,
    Colon,
    Comma,
    ColonEq, // `:=`

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,
    Pipe,
    Amp,
    Shl,
    Shr,
    PipePipe,
    AmpAmp,
    Bang,
    Tilde,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,

    Eof,
}

#[derive(Clone, Copy, Debug)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

pub const KEYWORDS: &[(&str, TokenKind)] = &[
    ("if", TokenKind::If),
    ("else", TokenKind::Else),
    ("while", TokenKind::While),
    ("debug", TokenKind::Debug),
    ("declassify", TokenKind::Declassify),
    ("try", TokenKind::Try),
    ("catch", TokenKind::Catch),
    ("throw", TokenKind::Throw),
    ("true", TokenKind::True),
    ("false", TokenKind::False),
    ("high", TokenKind::High),
    ("low", TokenKind::Low),
    ("fn", TokenKind::Fn),
    ("in", TokenKind::In),
    ("out", TokenKind::Out),
    ("return", TokenKind::Return),
];
