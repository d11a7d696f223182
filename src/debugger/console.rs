use crate::interpreter::ConsoleSink;
use std::cell::RefCell;
use std::rc::Rc;

/// The ordered output of one session.
///
/// The interpreter writes through the boxed sink from [`ConsoleLog::sink`]
/// while the controller keeps a handle to the same log.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl ConsoleLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that appends into this log.
    pub fn sink(&self) -> Box<dyn ConsoleSink> {
        Box::new(SessionSink {
            entries: Rc::clone(&self.entries),
        })
    }

    pub(crate) fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    /// A copy of every entry so far, in call order.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }
}

struct SessionSink {
    entries: Rc<RefCell<Vec<String>>>,
}

impl ConsoleSink for SessionSink {
    fn writeln(&mut self, text: &str) {
        tracing::trace!(text, "program output");
        self.entries.borrow_mut().push(text.to_string());
    }
}
