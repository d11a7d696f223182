pub mod error;
pub mod formatter;

use crate::compiler::FunctionProto;
use crate::environment::ScopeId;
use crate::interpreter::ConsoleSink;
use crate::machine::heap::{Heap, ObjectRef};
use compact_str::{format_compact, CompactString, CompactStringExt};
use error::RuntimeErrorKind;
use std::rc::Rc;

pub trait NativeFunction: std::fmt::Debug {
    fn get_name(&self) -> &str;
    fn call(
        &self,
        arguments: &[ScriptValue],
        heap: &mut Heap,
        console: &mut dyn ConsoleSink,
    ) -> Result<ScriptValue, RuntimeErrorKind>;
}

#[derive(Debug)]
pub struct ScriptFunction {
    pub proto: Rc<FunctionProto>,
    pub closure: ScopeId,
}

#[derive(Debug, Clone)]
pub enum ScriptValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(CompactString),
    Array(ObjectRef),
    Object(ObjectRef),
    Function(Rc<ScriptFunction>),
    Native(Rc<dyn NativeFunction>),
}

impl ScriptValue {
    /// The name used for this kind of value in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ScriptValue::Undefined => "undefined",
            ScriptValue::Null => "null",
            ScriptValue::Bool(_) => "boolean",
            ScriptValue::Number(_) => "number",
            ScriptValue::String(_) => "string",
            ScriptValue::Array(_) => "array",
            ScriptValue::Object(_) => "object",
            ScriptValue::Function(_) | ScriptValue::Native(_) => "function",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, ScriptValue::Undefined | ScriptValue::Null)
    }

    /// A short description used when a value is called but is not callable.
    pub fn describe(&self) -> CompactString {
        match self {
            ScriptValue::String(value) => format_compact!("\"{value}\""),
            ScriptValue::Number(value) => formatter::format_number(*value),
            ScriptValue::Bool(value) => format_compact!("{value}"),
            other => other.type_name().into(),
        }
    }
}

// Unary operators
impl ScriptValue {
    pub fn is_truthy(&self) -> bool {
        match self {
            ScriptValue::Undefined | ScriptValue::Null | ScriptValue::Bool(false) => false,
            ScriptValue::Number(value) => *value != 0.0 && !value.is_nan(),
            ScriptValue::String(value) => !value.is_empty(),
            _ => true,
        }
    }

    pub fn logical_not(&self) -> bool {
        !self.is_truthy()
    }

    pub fn numeric_negate(&self) -> Result<ScriptValue, RuntimeErrorKind> {
        match self {
            ScriptValue::Number(v) => Ok(ScriptValue::Number(-v)),
            v => Err(RuntimeErrorKind::NonNumeric(v.type_name())),
        }
    }
}

impl ScriptValue {
    fn numeric_operands(
        &self,
        other: &ScriptValue,
        operator: &'static str,
    ) -> Result<(f64, f64), RuntimeErrorKind> {
        match (self, other) {
            (ScriptValue::Number(lhs), ScriptValue::Number(rhs)) => Ok((*lhs, *rhs)),
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics {
                operator,
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            }),
        }
    }

    /// Arithmetic, or concatenation when either side is a string.
    pub fn add(&self, other: &ScriptValue, heap: &Heap) -> Result<ScriptValue, RuntimeErrorKind> {
        match (self, other) {
            (ScriptValue::Number(lhs), ScriptValue::Number(rhs)) => {
                Ok(ScriptValue::Number(lhs + rhs))
            }
            (ScriptValue::String(_), _) | (_, ScriptValue::String(_)) => {
                let lhs = formatter::to_display_string(self, heap);
                let rhs = formatter::to_display_string(other, heap);
                Ok(ScriptValue::String([lhs, rhs].concat_compact()))
            }
            (lhs, rhs) => Err(RuntimeErrorKind::NonNumerics {
                operator: "+",
                lhs: lhs.type_name(),
                rhs: rhs.type_name(),
            }),
        }
    }

    pub fn subtract(&self, other: &ScriptValue) -> Result<ScriptValue, RuntimeErrorKind> {
        let (lhs, rhs) = self.numeric_operands(other, "-")?;
        Ok(ScriptValue::Number(lhs - rhs))
    }

    pub fn multiply(&self, other: &ScriptValue) -> Result<ScriptValue, RuntimeErrorKind> {
        let (lhs, rhs) = self.numeric_operands(other, "*")?;
        Ok(ScriptValue::Number(lhs * rhs))
    }

    pub fn divide(&self, other: &ScriptValue) -> Result<ScriptValue, RuntimeErrorKind> {
        let (lhs, rhs) = self.numeric_operands(other, "/")?;
        Ok(ScriptValue::Number(lhs / rhs))
    }

    pub fn modulo(&self, other: &ScriptValue) -> Result<ScriptValue, RuntimeErrorKind> {
        let (lhs, rhs) = self.numeric_operands(other, "%")?;
        Ok(ScriptValue::Number(lhs % rhs))
    }

    // Comparison
    fn compare(
        &self,
        other: &ScriptValue,
        operator: &'static str,
        numbers: fn(f64, f64) -> bool,
        strings: fn(&str, &str) -> bool,
    ) -> Result<ScriptValue, RuntimeErrorKind> {
        match (self, other) {
            (ScriptValue::String(lhs), ScriptValue::String(rhs)) => {
                Ok(ScriptValue::Bool(strings(lhs, rhs)))
            }
            (lhs, rhs) => {
                let (lhs, rhs) = lhs.numeric_operands(rhs, operator)?;
                Ok(ScriptValue::Bool(numbers(lhs, rhs)))
            }
        }
    }

    pub fn less_than(&self, other: &ScriptValue) -> Result<ScriptValue, RuntimeErrorKind> {
        self.compare(other, "<", |l, r| l < r, |l, r| l < r)
    }

    pub fn less_than_or_equal(&self, other: &ScriptValue) -> Result<ScriptValue, RuntimeErrorKind> {
        self.compare(other, "<=", |l, r| l <= r, |l, r| l <= r)
    }

    pub fn greater_than(&self, other: &ScriptValue) -> Result<ScriptValue, RuntimeErrorKind> {
        self.compare(other, ">", |l, r| l > r, |l, r| l > r)
    }

    pub fn greater_than_or_equal(
        &self,
        other: &ScriptValue,
    ) -> Result<ScriptValue, RuntimeErrorKind> {
        self.compare(other, ">=", |l, r| l >= r, |l, r| l >= r)
    }

    // Equality
    pub fn strict_equals(&self, other: &ScriptValue) -> bool {
        match (self, other) {
            (ScriptValue::Undefined, ScriptValue::Undefined) => true,
            (ScriptValue::Null, ScriptValue::Null) => true,
            (ScriptValue::Bool(lhs), ScriptValue::Bool(rhs)) => lhs == rhs,
            (ScriptValue::Number(lhs), ScriptValue::Number(rhs)) => lhs == rhs,
            (ScriptValue::String(lhs), ScriptValue::String(rhs)) => lhs == rhs,
            (ScriptValue::Array(lhs), ScriptValue::Array(rhs)) => lhs == rhs,
            (ScriptValue::Object(lhs), ScriptValue::Object(rhs)) => lhs == rhs,
            (ScriptValue::Function(lhs), ScriptValue::Function(rhs)) => Rc::ptr_eq(lhs, rhs),
            (ScriptValue::Native(lhs), ScriptValue::Native(rhs)) => {
                std::ptr::addr_eq(Rc::as_ptr(lhs), Rc::as_ptr(rhs))
            }
            _ => false,
        }
    }

    /// Strict equality, except that `null` and `undefined` equal each other.
    pub fn loose_equals(&self, other: &ScriptValue) -> bool {
        (self.is_nullish() && other.is_nullish()) || self.strict_equals(other)
    }
}
