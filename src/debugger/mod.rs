//! Breakpoint-driven execution control over any [`Interpreter`].
//!
//! [`Interpreter`]: crate::interpreter::Interpreter

pub mod breakpoints;
pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod snapshot;

pub use breakpoints::BreakpointStore;
pub use config::{DebuggerConfig, DEFAULT_STEP_LIMIT};
pub use console::ConsoleLog;
pub use controller::{ControllerState, ExecutionController, ObservableState};
pub use error::DebuggerError;
pub use snapshot::{ScopeSnapshot, ScopeSnapshotter, SnapshotLimits};

/// A debugger for StepScript programs.
pub type ScriptDebugger = ExecutionController<crate::machine::Machine>;
