pub mod formatter;
mod marshal;

use compact_str::CompactString;
pub use marshal::{DisplayValue, Marshalled};
use std::ops::Range;
use thiserror::Error;

/// Receives one entry per output call made by a running program.
pub trait ConsoleSink {
    fn writeln(&mut self, text: &str);
}

/// The source could not be turned into a runnable program.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("[line {line}] {message}")]
pub struct InitializationError {
    pub message: String,
    pub code: &'static str,
    pub line: u32,
    pub span: Range<usize>,
}

/// A failure raised while executing a single step.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{message}")]
pub struct RuntimeFault {
    pub message: String,
    pub line: Option<u32>,
}

/// One lexical scope, walked from the innermost scope outwards.
pub trait ScopeNode: Sized {
    type Value;

    /// Bindings in declaration order.
    fn bindings(&self) -> Vec<(CompactString, Self::Value)>;
    fn parent(&self) -> Option<Self>;
}

/// An interpreter that can be driven one unit of work at a time.
pub trait Interpreter: Sized {
    type Value;
    type Scope<'a>: ScopeNode<Value = Self::Value>
    where
        Self: 'a;

    fn initialize(source: &str, console: Box<dyn ConsoleSink>) -> Result<Self, InitializationError>;

    /// Executes one unit of work and reports whether any code remains.
    fn step(&mut self) -> Result<bool, RuntimeFault>;

    /// The line of the next unit to execute, if any.
    fn current_line(&self) -> Option<u32>;

    fn scope_chain(&self) -> Option<Self::Scope<'_>>;

    /// Converts a value into display data, unfolding containers one level.
    fn marshal(&self, value: &Self::Value) -> Marshalled<Self::Value>;
}
