use super::breakpoints::BreakpointStore;
use super::config::DebuggerConfig;
use super::console::ConsoleLog;
use super::error::DebuggerError;
use super::snapshot::{ScopeSnapshot, ScopeSnapshotter};
use crate::interpreter::Interpreter;
use serde::Serialize;
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Initializing,
    Running,
    Paused,
    /// Also covers sessions that ended in a fault or hit the step limit.
    Finished,
}

impl Display for ControllerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerState::Idle => write!(f, "idle"),
            ControllerState::Initializing => write!(f, "initializing"),
            ControllerState::Running => write!(f, "running"),
            ControllerState::Paused => write!(f, "paused"),
            ControllerState::Finished => write!(f, "finished"),
        }
    }
}

/// What a host shows after every operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservableState {
    pub is_paused: bool,
    pub is_finished: bool,
    /// `-1` when no line is active.
    pub active_line: i64,
    pub scope: Option<ScopeSnapshot>,
    pub console_output: Vec<String>,
}

impl Default for ObservableState {
    fn default() -> Self {
        Self {
            is_paused: false,
            is_finished: false,
            active_line: -1,
            scope: None,
            console_output: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    /// Run until a breakpoint line is entered.
    Continue,
    /// Run until any line is entered.
    Step,
}

struct Session<I> {
    interpreter: I,
    console: ConsoleLog,
    total_steps: u64,
    transitions: u64,
    last_line: Option<u32>,
    active_line: Option<u32>,
    scope: Option<ScopeSnapshot>,
    fault: Option<String>,
    is_paused: bool,
    is_finished: bool,
}

impl<I: Interpreter> Session<I> {
    fn new(interpreter: I, console: ConsoleLog) -> Self {
        Self {
            interpreter,
            console,
            total_steps: 0,
            transitions: 0,
            last_line: None,
            active_line: None,
            scope: None,
            fault: None,
            is_paused: false,
            is_finished: false,
        }
    }

    fn pause(&mut self, line: Option<u32>, snapshotter: &ScopeSnapshotter) {
        self.is_paused = true;
        self.active_line = line;
        self.scope = Some(snapshotter.snapshot(&self.interpreter));
    }

    fn finish(&mut self, line: Option<u32>, snapshotter: &ScopeSnapshotter) {
        self.is_finished = true;
        self.pause(line, snapshotter);
    }

    fn observe(&self) -> ObservableState {
        ObservableState {
            is_paused: self.is_paused,
            is_finished: self.is_finished,
            active_line: self.active_line.map(i64::from).unwrap_or(-1),
            scope: self.scope.clone(),
            console_output: self.console.entries(),
        }
    }
}

/// Drives an [`Interpreter`] through a program, pausing on breakpoints and
/// line steps.
///
/// Every operation runs at most one bounded burst of work and returns, so a
/// host stays responsive even for programs that never terminate.
pub struct ExecutionController<I: Interpreter> {
    config: DebuggerConfig,
    breakpoints: BreakpointStore,
    snapshotter: ScopeSnapshotter,
    source: Option<String>,
    session: Option<Session<I>>,
    state: ControllerState,
}

impl<I: Interpreter> Default for ExecutionController<I> {
    fn default() -> Self {
        Self::new(DebuggerConfig::default())
    }
}

impl<I: Interpreter> ExecutionController<I> {
    pub fn new(config: DebuggerConfig) -> Self {
        Self {
            config,
            breakpoints: BreakpointStore::new(),
            snapshotter: ScopeSnapshotter::new(config.snapshot),
            source: None,
            session: None,
            state: ControllerState::Idle,
        }
    }

    pub fn config(&self) -> &DebuggerConfig {
        &self.config
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The source the next `restart` runs.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn observable(&self) -> ObservableState {
        self.session
            .as_ref()
            .map(Session::observe)
            .unwrap_or_default()
    }

    /// Units executed by the current session across all bursts.
    pub fn total_steps(&self) -> Option<u64> {
        self.session.as_ref().map(|session| session.total_steps)
    }

    /// Source lines entered by the current session.
    pub fn line_transitions(&self) -> Option<u64> {
        self.session.as_ref().map(|session| session.transitions)
    }

    /// The runtime fault that ended the current session, if any.
    pub fn fault(&self) -> Option<&str> {
        self.session.as_ref()?.fault.as_deref()
    }

    pub fn interpreter(&self) -> Option<&I> {
        self.session.as_ref().map(|session| &session.interpreter)
    }
}

// Breakpoints
impl<I: Interpreter> ExecutionController<I> {
    pub fn toggle_breakpoint(&mut self, line: u32) -> Result<bool, DebuggerError> {
        if line == 0 {
            return Err(DebuggerError::InvalidBreakpointLine(line));
        }
        Ok(self.breakpoints.toggle(line))
    }

    pub fn has_breakpoint(&self, line: u32) -> bool {
        self.breakpoints.contains(line)
    }

    pub fn breakpoints(&self) -> &BreakpointStore {
        &self.breakpoints
    }
}

// Session lifecycle
impl<I: Interpreter> ExecutionController<I> {
    /// Replaces any running session with a fresh one for `source` and runs it
    /// until the first pause.
    pub fn start(&mut self, source: impl Into<String>) -> Result<ObservableState, DebuggerError> {
        self.drop_session();
        let source = source.into();
        self.source = Some(source.clone());
        self.state = ControllerState::Initializing;

        let console = ConsoleLog::new();
        let interpreter = match I::initialize(&source, console.sink()) {
            Ok(interpreter) => interpreter,
            Err(error) => {
                tracing::warn!(
                    code = error.code,
                    line = error.line,
                    "failed to initialize program"
                );
                self.state = ControllerState::Idle;
                return Err(error.into());
            }
        };
        tracing::info!(breakpoints = self.breakpoints.len(), "started session");
        self.session = Some(Session::new(interpreter, console));
        self.run(RunMode::Continue);
        Ok(self.observable())
    }

    pub fn continue_execution(&mut self) -> Result<ObservableState, DebuggerError> {
        self.ensure_paused("continue")?;
        self.run(RunMode::Continue);
        Ok(self.observable())
    }

    pub fn step(&mut self) -> Result<ObservableState, DebuggerError> {
        self.ensure_paused("step")?;
        self.run(RunMode::Step);
        Ok(self.observable())
    }

    /// Discards the session. Valid in every state.
    pub fn stop(&mut self) -> ObservableState {
        self.drop_session();
        ObservableState::default()
    }

    /// Starts over on the current source, keeping breakpoints.
    pub fn restart(&mut self) -> Result<ObservableState, DebuggerError> {
        let Some(source) = self.source.clone() else {
            return Err(DebuggerError::InvalidOperation {
                operation: "restart",
                state: self.state,
            });
        };
        self.stop();
        self.start(source)
    }

    /// Records edited source for the next `restart`. A live session keeps
    /// running the source it started with.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    fn ensure_paused(&self, operation: &'static str) -> Result<(), DebuggerError> {
        let is_resumable = self
            .session
            .as_ref()
            .is_some_and(|session| session.is_paused && !session.is_finished);
        if self.state != ControllerState::Paused || !is_resumable {
            return Err(DebuggerError::InvalidOperation {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn drop_session(&mut self) {
        if let Some(session) = self.session.take() {
            tracing::info!(
                steps = session.total_steps,
                transitions = session.transitions,
                "dropped session"
            );
        }
        self.state = ControllerState::Idle;
    }
}

// Run loop
impl<I: Interpreter> ExecutionController<I> {
    fn run(&mut self, mode: RunMode) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.state = ControllerState::Running;
        session.is_paused = false;
        let step_limit = self.config.step_limit;
        let mut burst: u64 = 0;

        loop {
            let line_before = session.interpreter.current_line().or(session.last_line);
            let result = session.interpreter.step();
            burst += 1;
            session.total_steps += 1;

            let has_more = match result {
                Ok(has_more) => has_more,
                Err(fault) => {
                    tracing::debug!(message = %fault.message, line = ?fault.line, "runtime fault");
                    session.console.push(format!("ERROR: {}", fault.message));
                    session.fault = Some(fault.message);
                    session.finish(fault.line.or(line_before), &self.snapshotter);
                    self.state = ControllerState::Finished;
                    return;
                }
            };

            let line = session.interpreter.current_line();
            if has_more && line != session.last_line {
                session.last_line = line;
                if line.is_some() {
                    session.transitions += 1;
                }
                let should_pause = match mode {
                    RunMode::Continue => line.is_some_and(|line| self.breakpoints.contains(line)),
                    RunMode::Step => true,
                };
                if should_pause {
                    tracing::debug!(?line, burst, ?mode, "paused");
                    session.pause(line, &self.snapshotter);
                    self.state = ControllerState::Paused;
                    return;
                }
            }

            if !has_more {
                tracing::debug!(burst, total = session.total_steps, "program finished");
                session.finish(None, &self.snapshotter);
                self.state = ControllerState::Finished;
                return;
            }

            // Counted over the whole session, across pauses.
            if session.total_steps > step_limit {
                tracing::warn!(step_limit, burst, "step limit reached");
                session.console.push(format!(
                    "WARNING: execution halted after {step_limit} steps (possible infinite loop)"
                ));
                session.finish(line.or(line_before), &self.snapshotter);
                self.state = ControllerState::Finished;
                return;
            }
        }
    }
}
