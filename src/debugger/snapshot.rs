use crate::interpreter::{DisplayValue, Interpreter, Marshalled, ScopeNode};
use compact_str::{format_compact, CompactString};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

pub const DEFAULT_MAX_DEPTH: usize = 4;
pub const DEFAULT_MAX_ITEMS: usize = 100;
pub const DEFAULT_MAX_NODES: usize = 10_000;

const CIRCULAR: &str = "[Circular]";
const ELIDED: &str = "[...]";

/// Bounds on how much of a scope a snapshot copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotLimits {
    /// Containers nested deeper than this are replaced by a placeholder.
    pub max_depth: usize,
    /// Entries shown per container.
    pub max_items: usize,
    /// Display nodes per snapshot.
    pub max_nodes: usize,
}

impl Default for SnapshotLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_items: DEFAULT_MAX_ITEMS,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

/// Visible variables at one pause, innermost binding first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeSnapshot {
    entries: Vec<(CompactString, DisplayValue)>,
}

impl ScopeSnapshot {
    pub fn get(&self, name: &str) -> Option<&DisplayValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for ScopeSnapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in self.entries.iter() {
            map.serialize_entry(key.as_str(), value)?;
        }
        map.end()
    }
}

/// Deep-copies a live scope chain into display data.
#[derive(Debug, Clone, Default)]
pub struct ScopeSnapshotter {
    limits: SnapshotLimits,
}

struct CopyState {
    path: Vec<usize>,
    remaining: usize,
}

impl ScopeSnapshotter {
    pub fn new(limits: SnapshotLimits) -> Self {
        Self { limits }
    }

    pub fn snapshot<I: Interpreter>(&self, interpreter: &I) -> ScopeSnapshot {
        let mut snapshot = ScopeSnapshot::default();
        let mut state = CopyState {
            path: Vec::new(),
            remaining: self.limits.max_nodes,
        };

        let mut scope = interpreter.scope_chain();
        while let Some(node) = scope {
            for (name, value) in node.bindings() {
                // Inner bindings shadow outer ones.
                if snapshot.contains(&name) {
                    continue;
                }
                let value = self.copy(interpreter, &value, 1, &mut state);
                snapshot.entries.push((name, value));
            }
            scope = node.parent();
        }

        tracing::debug!(
            bindings = snapshot.len(),
            nodes = self.limits.max_nodes - state.remaining,
            "took scope snapshot"
        );
        snapshot
    }

    fn copy<I: Interpreter>(
        &self,
        interpreter: &I,
        value: &I::Value,
        depth: usize,
        state: &mut CopyState,
    ) -> DisplayValue {
        if state.remaining == 0 {
            return DisplayValue::Placeholder(ELIDED.into());
        }
        state.remaining -= 1;

        match interpreter.marshal(value) {
            Marshalled::Display(value) => value,
            Marshalled::List { identity, items } => {
                if state.path.contains(&identity) {
                    return DisplayValue::Placeholder(CIRCULAR.into());
                }
                if depth > self.limits.max_depth {
                    return DisplayValue::Placeholder("[Array]".into());
                }
                state.path.push(identity);
                let mut copied: Vec<DisplayValue> = items
                    .iter()
                    .take(self.limits.max_items)
                    .map(|item| self.copy(interpreter, item, depth + 1, state))
                    .collect();
                if let Some(hidden) = self.hidden_count(items.len()) {
                    copied.push(hidden);
                }
                state.path.pop();
                DisplayValue::Array(copied)
            }
            Marshalled::Record { identity, entries } => {
                if state.path.contains(&identity) {
                    return DisplayValue::Placeholder(CIRCULAR.into());
                }
                if depth > self.limits.max_depth {
                    return DisplayValue::Placeholder("[Object]".into());
                }
                state.path.push(identity);
                let mut copied: Vec<(CompactString, DisplayValue)> = entries
                    .iter()
                    .take(self.limits.max_items)
                    .map(|(key, item)| {
                        (key.clone(), self.copy(interpreter, item, depth + 1, state))
                    })
                    .collect();
                if let Some(hidden) = self.hidden_count(entries.len()) {
                    copied.push(("...".into(), hidden));
                }
                state.path.pop();
                DisplayValue::Object(copied)
            }
        }
    }

    fn hidden_count(&self, len: usize) -> Option<DisplayValue> {
        let hidden = len.checked_sub(self.limits.max_items).filter(|n| *n > 0)?;
        Some(DisplayValue::Placeholder(format_compact!("... {hidden} more items")))
    }
}
