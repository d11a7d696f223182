use std::collections::HashMap;
use std::fmt::Display;
use std::ops::Range;
use std::sync::LazyLock;

/// The hashmap for keywords
pub static KEYWORD_HASHMAP: LazyLock<HashMap<&'static str, TokenKind>> = LazyLock::new(|| {
    let mut map = HashMap::new();
    map.insert("break", TokenKind::KeywordBreak);
    map.insert("const", TokenKind::KeywordConst);
    map.insert("continue", TokenKind::KeywordContinue);
    map.insert("else", TokenKind::KeywordElse);
    map.insert("false", TokenKind::KeywordFalse);
    map.insert("for", TokenKind::KeywordFor);
    map.insert("function", TokenKind::KeywordFunction);
    map.insert("if", TokenKind::KeywordIf);
    map.insert("let", TokenKind::KeywordLet);
    map.insert("null", TokenKind::KeywordNull);
    map.insert("return", TokenKind::KeywordReturn);
    map.insert("true", TokenKind::KeywordTrue);
    map.insert("undefined", TokenKind::KeywordUndefined);
    map.insert("var", TokenKind::KeywordVar);
    map.insert("while", TokenKind::KeywordWhile);
    map
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// The byte position of the start of the token.
    pub start: u32,
    /// The length of the token in bytes.
    pub length: u32,
}

impl Span {
    pub fn new(start: usize, length: usize) -> Self {
        Self {
            start: start as u32,
            length: length as u32,
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end() as usize
    }

    pub fn end(&self) -> u32 {
        self.start + self.length
    }

    pub fn merge(&self, other: &Span) -> Span {
        let start = self.start.min(other.start);
        let end = self.end().max(other.end());
        Span {
            start,
            length: end - start,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Brackets
    LeftParenthesis,
    RightParenthesis,
    LeftBrace,
    RightBrace,
    LeftBracket,
    RightBracket,
    // Miscellaneous
    Comma,
    Dot,
    Semicolon,
    Colon,
    // Operators
    Minus,
    Plus,
    Star,
    Slash,
    Percent,
    Bang,
    BangEqual,
    BangEqualEqual,
    Equal,
    EqualEqual,
    EqualEqualEqual,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    AmpersandAmpersand,
    PipePipe,

    // Literals
    NumericLiteral,
    StringLiteral,
    Ident,

    // Keywords
    KeywordBreak,
    KeywordConst,
    KeywordContinue,
    KeywordElse,
    KeywordFalse,
    KeywordFor,
    KeywordFunction,
    KeywordIf,
    KeywordLet,
    KeywordNull,
    KeywordReturn,
    KeywordTrue,
    KeywordUndefined,
    KeywordVar,
    KeywordWhile,

    // End of file.
    Eof,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::LeftParenthesis => write!(f, "`(`"),
            TokenKind::RightParenthesis => write!(f, "`)`"),
            TokenKind::LeftBrace => write!(f, "`{{`"),
            TokenKind::RightBrace => write!(f, "`}}`"),
            TokenKind::LeftBracket => write!(f, "`[`"),
            TokenKind::RightBracket => write!(f, "`]`"),
            TokenKind::Comma => write!(f, "`,`"),
            TokenKind::Dot => write!(f, "`.`"),
            TokenKind::Semicolon => write!(f, "`;`"),
            TokenKind::Colon => write!(f, "`:`"),
            TokenKind::Minus => write!(f, "`-`"),
            TokenKind::Plus => write!(f, "`+`"),
            TokenKind::Star => write!(f, "`*`"),
            TokenKind::Slash => write!(f, "`/`"),
            TokenKind::Percent => write!(f, "`%`"),
            TokenKind::Bang => write!(f, "`!`"),
            TokenKind::BangEqual => write!(f, "`!=`"),
            TokenKind::BangEqualEqual => write!(f, "`!==`"),
            TokenKind::Equal => write!(f, "`=`"),
            TokenKind::EqualEqual => write!(f, "`==`"),
            TokenKind::EqualEqualEqual => write!(f, "`===`"),
            TokenKind::LessThan => write!(f, "`<`"),
            TokenKind::LessThanEqual => write!(f, "`<=`"),
            TokenKind::GreaterThan => write!(f, "`>`"),
            TokenKind::GreaterThanEqual => write!(f, "`>=`"),
            TokenKind::AmpersandAmpersand => write!(f, "`&&`"),
            TokenKind::PipePipe => write!(f, "`||`"),
            TokenKind::NumericLiteral => write!(f, "number"),
            TokenKind::StringLiteral => write!(f, "string"),
            TokenKind::Ident => write!(f, "identifier"),
            TokenKind::KeywordBreak => write!(f, "`break`"),
            TokenKind::KeywordConst => write!(f, "`const`"),
            TokenKind::KeywordContinue => write!(f, "`continue`"),
            TokenKind::KeywordElse => write!(f, "`else`"),
            TokenKind::KeywordFalse => write!(f, "`false`"),
            TokenKind::KeywordFor => write!(f, "`for`"),
            TokenKind::KeywordFunction => write!(f, "`function`"),
            TokenKind::KeywordIf => write!(f, "`if`"),
            TokenKind::KeywordLet => write!(f, "`let`"),
            TokenKind::KeywordNull => write!(f, "`null`"),
            TokenKind::KeywordReturn => write!(f, "`return`"),
            TokenKind::KeywordTrue => write!(f, "`true`"),
            TokenKind::KeywordUndefined => write!(f, "`undefined`"),
            TokenKind::KeywordVar => write!(f, "`var`"),
            TokenKind::KeywordWhile => write!(f, "`while`"),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub line: u32,
}
