mod cursor;
mod error;
mod token;

use cursor::{SourceChar, SourceCursor};
pub use error::{LexicalError, LexicalErrorKind};
pub use token::{Span, Token, TokenKind, KEYWORD_HASHMAP};

#[derive(Debug)]
pub struct Lexer<'src> {
    source: &'src str,
    cursor: SourceCursor<'src>,
    finished: bool,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            cursor: SourceCursor::new(source),
            finished: false,
        }
    }

    pub fn get_source(&self) -> &'src str {
        self.source
    }

    pub fn get_lexeme(&self, span: &Span) -> Option<&'src str> {
        self.source.get(span.range())
    }
}

impl<'src> Lexer<'src> {
    fn next_char(&mut self) -> Option<SourceChar> {
        self.cursor.advance()
    }

    fn put_back_char(&mut self, c: SourceChar) {
        self.cursor.put_back(c);
    }

    fn peek_char(&mut self) -> Option<char> {
        self.cursor.peek()
    }

    fn eat_if(&mut self, expected: char) -> Option<SourceChar> {
        let c = self.next_char()?;
        if c.value == expected {
            Some(c)
        } else {
            self.put_back_char(c);
            None
        }
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) -> usize {
        let mut end = self.offset_of_next();
        while let Some(c) = self.next_char() {
            if !predicate(c.value) {
                self.put_back_char(c);
                break;
            }
            end = c.next_offset();
        }
        end
    }

    fn offset_of_next(&self) -> usize {
        self.cursor.offset()
    }

    fn make_token(&self, kind: TokenKind, start: &SourceChar, end: usize) -> Token {
        Token {
            kind,
            span: Span::new(start.offset, end - start.offset),
            line: start.line,
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(c) = self.next_char() {
            if c.value == '\n' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self, start: &SourceChar) -> Result<(), LexicalError> {
        while let Some(c) = self.next_char() {
            if c.value == '*' && self.eat_if('/').is_some() {
                return Ok(());
            }
        }
        Err(LexicalError {
            kind: LexicalErrorKind::UnclosedComment,
            span: Span::new(start.offset, self.source.len() - start.offset),
            line: start.line,
        })
    }

    fn lex_string(&mut self, start: &SourceChar) -> Result<Token, LexicalError> {
        let quote = start.value;
        loop {
            let Some(c) = self.next_char() else {
                break;
            };
            match c.value {
                '\\' => {
                    // Escapes are decoded by the parser; only skip the escaped character here.
                    match self.next_char() {
                        Some(escaped) if escaped.value != '\n' => {}
                        _ => break,
                    }
                }
                '\n' => break,
                value if value == quote => {
                    return Ok(self.make_token(TokenKind::StringLiteral, start, c.next_offset()));
                }
                _ => {}
            }
        }
        Err(LexicalError {
            kind: LexicalErrorKind::UnclosedString,
            span: Span::new(start.offset, self.offset_of_next() - start.offset),
            line: start.line,
        })
    }

    fn lex_number(&mut self, start: &SourceChar) -> Token {
        let mut end = self.eat_while(|c| c.is_ascii_digit());
        if let Some(dot) = self.eat_if('.') {
            match self.peek_char() {
                Some(c) if c.is_ascii_digit() => {
                    end = self.eat_while(|c| c.is_ascii_digit());
                }
                _ => self.put_back_char(dot),
            }
        }
        self.make_token(TokenKind::NumericLiteral, start, end.max(start.next_offset()))
    }

    fn lex_identifier(&mut self, start: &SourceChar) -> Token {
        let end = self
            .eat_while(is_identifier_continue)
            .max(start.next_offset());
        let lexeme = &self.source[start.offset..end];
        let kind = KEYWORD_HASHMAP
            .get(lexeme)
            .copied()
            .unwrap_or(TokenKind::Ident);
        self.make_token(kind, start, end)
    }

    /// Lexes one of `op`, `op=` or `op==`.
    fn lex_equality(
        &mut self,
        start: &SourceChar,
        single: TokenKind,
        double: TokenKind,
        triple: TokenKind,
    ) -> Token {
        let Some(second) = self.eat_if('=') else {
            return self.make_token(single, start, start.next_offset());
        };
        match self.eat_if('=') {
            Some(third) => self.make_token(triple, start, third.next_offset()),
            None => self.make_token(double, start, second.next_offset()),
        }
    }

    fn lex_pair(
        &mut self,
        start: &SourceChar,
        second: char,
        kind: TokenKind,
    ) -> Result<Token, LexicalError> {
        match self.eat_if(second) {
            Some(c) => Ok(self.make_token(kind, start, c.next_offset())),
            None => Err(LexicalError {
                kind: LexicalErrorKind::Unrecognized(start.value),
                span: Span::new(start.offset, start.value.len_utf8()),
                line: start.line,
            }),
        }
    }

    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        loop {
            let Some(c) = self.next_char() else {
                self.finished = true;
                return Ok(Token {
                    kind: TokenKind::Eof,
                    span: Span::new(self.source.len(), 0),
                    line: self.cursor.line(),
                });
            };

            let single = |kind: TokenKind| Token {
                kind,
                span: Span::new(c.offset, c.value.len_utf8()),
                line: c.line,
            };

            let token = match c.value {
                value if value.is_whitespace() => continue,
                '/' => match self.peek_char() {
                    Some('/') => {
                        self.skip_line_comment();
                        continue;
                    }
                    Some('*') => {
                        let _ = self.next_char();
                        self.skip_block_comment(&c)?;
                        continue;
                    }
                    _ => single(TokenKind::Slash),
                },
                '(' => single(TokenKind::LeftParenthesis),
                ')' => single(TokenKind::RightParenthesis),
                '{' => single(TokenKind::LeftBrace),
                '}' => single(TokenKind::RightBrace),
                '[' => single(TokenKind::LeftBracket),
                ']' => single(TokenKind::RightBracket),
                ',' => single(TokenKind::Comma),
                '.' => single(TokenKind::Dot),
                ';' => single(TokenKind::Semicolon),
                ':' => single(TokenKind::Colon),
                '-' => single(TokenKind::Minus),
                '+' => single(TokenKind::Plus),
                '*' => single(TokenKind::Star),
                '%' => single(TokenKind::Percent),
                '!' => self.lex_equality(
                    &c,
                    TokenKind::Bang,
                    TokenKind::BangEqual,
                    TokenKind::BangEqualEqual,
                ),
                '=' => self.lex_equality(
                    &c,
                    TokenKind::Equal,
                    TokenKind::EqualEqual,
                    TokenKind::EqualEqualEqual,
                ),
                '<' => match self.eat_if('=') {
                    Some(next) => self.make_token(TokenKind::LessThanEqual, &c, next.next_offset()),
                    None => single(TokenKind::LessThan),
                },
                '>' => match self.eat_if('=') {
                    Some(next) => {
                        self.make_token(TokenKind::GreaterThanEqual, &c, next.next_offset())
                    }
                    None => single(TokenKind::GreaterThan),
                },
                '&' => self.lex_pair(&c, '&', TokenKind::AmpersandAmpersand)?,
                '|' => self.lex_pair(&c, '|', TokenKind::PipePipe)?,
                '"' | '\'' => self.lex_string(&c)?,
                value if value.is_ascii_digit() => self.lex_number(&c),
                value if is_identifier_start(value) => self.lex_identifier(&c),
                value => {
                    return Err(LexicalError {
                        kind: LexicalErrorKind::Unrecognized(value),
                        span: Span::new(c.offset, value.len_utf8()),
                        line: c.line,
                    })
                }
            };
            return Ok(token);
        }
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Result<Token, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        if token.is_err() {
            self.finished = true;
        }
        Some(token)
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '$'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

/// Decodes the escape sequences of a string literal lexeme, quotes included.
pub fn decode_string_literal(lexeme: &str) -> String {
    let inner = lexeme
        .get(1..lexeme.len().saturating_sub(1))
        .unwrap_or_default();
    let mut decoded = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => decoded.push('\n'),
            Some('t') => decoded.push('\t'),
            Some('r') => decoded.push('\r'),
            Some('0') => decoded.push('\0'),
            Some(other) => decoded.push(other),
            None => {}
        }
    }
    decoded
}
