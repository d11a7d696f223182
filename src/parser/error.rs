use crate::interpreter::InitializationError;
use crate::lexer::{LexicalError, Span, TokenKind};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParserErrorKind {
    #[error("Unexpected token {actual}, expected {expected}")]
    UnexpectedToken {
        actual: TokenKind,
        expected: TokenKind,
    },
    #[error("Unexpected token {0}")]
    NonExpression(TokenKind),
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token {0}, expected a property name")]
    InvalidPropertyName(TokenKind),
    #[error("Invalid left-hand side in assignment")]
    InvalidLValue,
    #[error("Missing initializer in const declaration")]
    MissingInitializer,
    #[error("Illegal break statement")]
    IllegalBreak,
    #[error("Illegal continue statement: no surrounding iteration statement")]
    IllegalContinue,
    #[error("Illegal return statement")]
    IllegalReturn,
    #[error("{0}")]
    LexicalError(#[from] LexicalError),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("[line {line}] SyntaxError: {kind}")]
pub struct ParserError {
    #[source]
    pub kind: ParserErrorKind,
    pub span: Span,
    pub line: u32,
}

impl ParserError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            ParserErrorKind::UnexpectedToken { .. } => "SE001",
            ParserErrorKind::NonExpression(_) => "SE002",
            ParserErrorKind::UnexpectedEof => "SE003",
            ParserErrorKind::InvalidPropertyName(_) => "SE004",
            ParserErrorKind::InvalidLValue => "SE005",
            ParserErrorKind::MissingInitializer => "SE006",
            ParserErrorKind::IllegalBreak => "SE007",
            ParserErrorKind::IllegalContinue => "SE008",
            ParserErrorKind::IllegalReturn => "SE009",
            ParserErrorKind::LexicalError(_) => "LX001",
        }
    }

    /// The message without the line prefix.
    pub fn message(&self) -> String {
        format!("SyntaxError: {}", self.kind)
    }
}

impl From<LexicalError> for ParserError {
    fn from(value: LexicalError) -> Self {
        Self {
            span: value.span,
            line: value.line,
            kind: ParserErrorKind::LexicalError(value),
        }
    }
}

impl From<ParserError> for InitializationError {
    fn from(error: ParserError) -> Self {
        Self {
            message: error.message(),
            code: error.code(),
            line: error.line,
            span: error.span.range(),
        }
    }
}
