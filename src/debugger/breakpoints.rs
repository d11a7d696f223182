use std::collections::BTreeSet;

/// Line numbers at which continuous execution pauses.
///
/// The store is independent of any session, so breakpoints survive `stop`
/// and `restart`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BreakpointStore {
    lines: BTreeSet<u32>,
}

impl BreakpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flips the membership of `line` and returns whether it is now set.
    pub fn toggle(&mut self, line: u32) -> bool {
        let is_set = if self.lines.remove(&line) {
            false
        } else {
            self.lines.insert(line)
        };
        tracing::debug!(line, is_set, "toggled breakpoint");
        is_set
    }

    pub fn contains(&self, line: u32) -> bool {
        self.lines.contains(&line)
    }

    /// Breakpoints in ascending line order.
    pub fn lines(&self) -> impl Iterator<Item = u32> + '_ {
        self.lines.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl FromIterator<u32> for BreakpointStore {
    fn from_iter<T: IntoIterator<Item = u32>>(iter: T) -> Self {
        Self {
            lines: iter.into_iter().collect(),
        }
    }
}
