use compact_str::CompactString;
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use std::fmt::Display;

/// Plain display data, detached from any interpreter.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(CompactString),
    Array(Vec<DisplayValue>),
    Object(Vec<(CompactString, DisplayValue)>),
    Placeholder(CompactString),
}

/// A value as seen by the snapshotter: either final display data, or a
/// container whose children still need converting.
#[derive(Debug, Clone)]
pub enum Marshalled<V> {
    Display(DisplayValue),
    List {
        identity: usize,
        items: Vec<V>,
    },
    Record {
        identity: usize,
        entries: Vec<(CompactString, V)>,
    },
}

/// Integers beyond this lose precision as JSON numbers.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

impl Serialize for DisplayValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DisplayValue::Undefined | DisplayValue::Null => serializer.serialize_unit(),
            DisplayValue::Bool(value) => serializer.serialize_bool(*value),
            DisplayValue::Number(value) => {
                if !value.is_finite() {
                    serializer.serialize_unit()
                } else if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
                    serializer.serialize_i64(*value as i64)
                } else {
                    serializer.serialize_f64(*value)
                }
            }
            DisplayValue::String(value) | DisplayValue::Placeholder(value) => {
                serializer.serialize_str(value)
            }
            DisplayValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DisplayValue::Object(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key.as_str(), value)?;
                }
                map.end()
            }
        }
    }
}

impl Display for DisplayValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DisplayValue::Undefined => write!(f, "undefined"),
            DisplayValue::Null => write!(f, "null"),
            DisplayValue::Bool(value) => write!(f, "{value}"),
            DisplayValue::Number(value) => {
                if value.is_nan() {
                    write!(f, "NaN")
                } else if value.is_infinite() {
                    write!(f, "{}Infinity", if *value < 0.0 { "-" } else { "" })
                } else if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
                    write!(f, "{}", *value as i64)
                } else {
                    write!(f, "{value}")
                }
            }
            DisplayValue::String(value) => write!(f, "{value:?}"),
            DisplayValue::Placeholder(value) => write!(f, "{value}"),
            DisplayValue::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            DisplayValue::Object(entries) => {
                if entries.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (index, (key, value)) in entries.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, " }}")
            }
        }
    }
}
