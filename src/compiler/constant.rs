use compact_str::CompactString;
use std::collections::HashMap;
use std::fmt::Write;

use super::WRITE_FMT_MSG;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstRef(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Number(f64),
    String(CompactString),
    Bool(bool),
    Null,
    Undefined,
}

impl std::fmt::Display for Constant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Constant::Number(value) => write!(f, "{value}"),
            Constant::String(value) => write!(f, "{value:?}"),
            Constant::Bool(value) => write!(f, "{value}"),
            Constant::Null => write!(f, "null"),
            Constant::Undefined => write!(f, "undefined"),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConstantPool {
    data: Vec<Constant>,
    interned_strings: HashMap<CompactString, ConstRef>,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, handle: ConstRef) -> Option<&Constant> {
        self.data.get(handle.0 as usize)
    }

    pub fn get_string(&self, handle: ConstRef) -> Option<&CompactString> {
        match self.get(handle)? {
            Constant::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn push_constant(&mut self, value: Constant) -> ConstRef {
        if let Constant::String(ref text) = value {
            return self.push_str(text);
        }
        self.data.push(value);
        ConstRef((self.data.len() - 1) as u32)
    }

    /// Strings are interned so repeated names share one slot.
    pub fn push_str(&mut self, text: &str) -> ConstRef {
        if let Some(handle) = self.interned_strings.get(text) {
            return *handle;
        }
        self.data.push(Constant::String(text.into()));
        let handle = ConstRef((self.data.len() - 1) as u32);
        self.interned_strings.insert(text.into(), handle);
        handle
    }

    pub fn format_constant(&self, handle: ConstRef, buffer: &mut String) {
        let Some(value) = self.get(handle) else {
            buffer.push_str("INVALID_CONSTANT_HANDLE");
            return;
        };
        write!(buffer, "{value}").expect(WRITE_FMT_MSG);
    }
}
