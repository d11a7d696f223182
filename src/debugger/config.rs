use super::snapshot::SnapshotLimits;

/// Units a session may execute, across all of its bursts, before it is
/// stopped as a likely infinite loop.
pub const DEFAULT_STEP_LIMIT: u64 = 50_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebuggerConfig {
    pub step_limit: u64,
    pub snapshot: SnapshotLimits,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            snapshot: SnapshotLimits::default(),
        }
    }
}

impl DebuggerConfig {
    pub fn with_step_limit(mut self, step_limit: u64) -> Self {
        self.step_limit = step_limit;
        self
    }

    pub fn with_snapshot_limits(mut self, snapshot: SnapshotLimits) -> Self {
        self.snapshot = snapshot;
        self
    }
}
