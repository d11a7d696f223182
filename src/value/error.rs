use compact_str::CompactString;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RuntimeErrorKind {
    #[error("ReferenceError: {0} is not defined")]
    Undeclared(CompactString),
    #[error("TypeError: Assignment to constant variable.")]
    AssignToConstant(CompactString),
    #[error("SyntaxError: Identifier '{0}' has already been declared")]
    Redeclaration(CompactString),
    #[error("TypeError: Cannot apply `{operator}` to {lhs} and {rhs}")]
    NonNumerics {
        operator: &'static str,
        lhs: &'static str,
        rhs: &'static str,
    },
    #[error("TypeError: Cannot apply unary `-` to {0}")]
    NonNumeric(&'static str),
    #[error("TypeError: {0} is not a function")]
    InvalidCallee(CompactString),
    #[error("TypeError: Cannot read properties of {object} (reading '{name}')")]
    PropertyOfNothing {
        object: &'static str,
        name: CompactString,
    },
    #[error("TypeError: Cannot set properties of {object} (setting '{name}')")]
    SetPropertyOfNothing {
        object: &'static str,
        name: CompactString,
    },
    #[error("TypeError: Cannot create property '{name}' on {object}")]
    SetPropertyOfPrimitive {
        object: &'static str,
        name: CompactString,
    },
    #[error("RangeError: Invalid array index {0}")]
    InvalidIndex(CompactString),
    #[error("RangeError: Maximum call stack size exceeded")]
    StackOverflow,
    #[error("InternalError: {0}")]
    Internal(CompactString),
}

#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind}")]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub line: Option<u32>,
}

impl RuntimeError {
    pub fn code(&self) -> &'static str {
        match self.kind {
            RuntimeErrorKind::Undeclared(_) => "RT001",
            RuntimeErrorKind::AssignToConstant(_) => "RT002",
            RuntimeErrorKind::Redeclaration(_) => "RT003",
            RuntimeErrorKind::NonNumerics { .. } => "RT004",
            RuntimeErrorKind::NonNumeric(_) => "RT005",
            RuntimeErrorKind::InvalidCallee(_) => "RT006",
            RuntimeErrorKind::PropertyOfNothing { .. } => "RT007",
            RuntimeErrorKind::SetPropertyOfNothing { .. } => "RT008",
            RuntimeErrorKind::SetPropertyOfPrimitive { .. } => "RT009",
            RuntimeErrorKind::InvalidIndex(_) => "RT010",
            RuntimeErrorKind::StackOverflow => "RT011",
            RuntimeErrorKind::Internal(_) => "RT012",
        }
    }
}
