use std::str::Chars;

/// A character together with where it sits in the source.
#[derive(Debug, Clone, Copy)]
pub struct SourceChar {
    pub value: char,
    pub offset: usize,
    pub line: u32,
}

impl SourceChar {
    pub fn next_offset(&self) -> usize {
        self.offset + self.value.len_utf8()
    }
}

#[derive(Debug)]
enum LookAhead {
    None,
    Single(SourceChar),
    Double(SourceChar, SourceChar),
}

/// Walks the source one character at a time, counting lines as it goes.
/// Up to two characters can be put back.
#[derive(Debug)]
pub struct SourceCursor<'src> {
    chars: Chars<'src>,
    offset: usize,
    line: u32,
    lookahead: LookAhead,
}

impl<'src> SourceCursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            chars: source.chars(),
            offset: 0,
            line: 1,
            lookahead: LookAhead::None,
        }
    }

    /// Line of the next unread character.
    pub fn line(&self) -> u32 {
        match self.lookahead {
            LookAhead::None => self.line,
            LookAhead::Single(c) | LookAhead::Double(c, _) => c.line,
        }
    }

    /// Byte offset of the next unread character.
    pub fn offset(&self) -> usize {
        match self.lookahead {
            LookAhead::None => self.offset,
            LookAhead::Single(c) | LookAhead::Double(c, _) => c.offset,
        }
    }

    pub fn advance(&mut self) -> Option<SourceChar> {
        match self.lookahead {
            LookAhead::None => {
                let value = self.chars.next()?;
                let current = SourceChar {
                    value,
                    offset: self.offset,
                    line: self.line,
                };
                if value == '\n' {
                    self.line += 1;
                }
                self.offset += value.len_utf8();
                Some(current)
            }
            LookAhead::Single(c) => {
                self.lookahead = LookAhead::None;
                Some(c)
            }
            LookAhead::Double(first, second) => {
                self.lookahead = LookAhead::Single(second);
                Some(first)
            }
        }
    }

    pub fn put_back(&mut self, c: SourceChar) {
        self.lookahead = match self.lookahead {
            LookAhead::None => LookAhead::Single(c),
            LookAhead::Single(next) => LookAhead::Double(c, next),
            LookAhead::Double(..) => {
                unreachable!("The lexer only ever needs two characters of lookahead.")
            }
        };
    }

    pub fn peek(&mut self) -> Option<char> {
        let c = self.advance()?;
        self.put_back(c);
        Some(c.value)
    }
}
