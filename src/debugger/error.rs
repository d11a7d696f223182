use super::controller::ControllerState;
use crate::interpreter::InitializationError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DebuggerError {
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    #[error("cannot {operation} while the debugger is {state}")]
    InvalidOperation {
        operation: &'static str,
        state: ControllerState,
    },
    #[error("line {0} cannot hold a breakpoint, lines start at 1")]
    InvalidBreakpointLine(u32),
}

impl DebuggerError {
    pub fn code(&self) -> &'static str {
        match self {
            DebuggerError::Initialization(error) => error.code,
            DebuggerError::InvalidOperation { .. } => "DB001",
            DebuggerError::InvalidBreakpointLine(_) => "DB002",
        }
    }
}
