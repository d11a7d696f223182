use super::heap::{Heap, ObjectRef};
use crate::interpreter::ConsoleSink;
use crate::value::{
    error::RuntimeErrorKind, formatter::format_console_arguments, NativeFunction, ScriptValue,
};
use compact_str::format_compact;

/// `console.log` and its aliases. Every level writes to the same sink.
#[derive(Debug)]
pub struct ConsoleMethod {
    pub name: &'static str,
}

impl NativeFunction for ConsoleMethod {
    fn get_name(&self) -> &str {
        self.name
    }

    fn call(
        &self,
        arguments: &[ScriptValue],
        heap: &mut Heap,
        console: &mut dyn ConsoleSink,
    ) -> Result<ScriptValue, RuntimeErrorKind> {
        console.writeln(&format_console_arguments(arguments, heap));
        Ok(ScriptValue::Undefined)
    }
}

/// `array.push(...)`, bound to the array it was read from.
#[derive(Debug)]
pub struct ArrayPush {
    pub target: ObjectRef,
}

impl NativeFunction for ArrayPush {
    fn get_name(&self) -> &str {
        "push"
    }

    fn call(
        &self,
        arguments: &[ScriptValue],
        heap: &mut Heap,
        _console: &mut dyn ConsoleSink,
    ) -> Result<ScriptValue, RuntimeErrorKind> {
        let items = heap.array_mut(self.target).ok_or_else(|| {
            RuntimeErrorKind::Internal(format_compact!(
                "push target {:?} is not an array",
                self.target
            ))
        })?;
        items.extend_from_slice(arguments);
        Ok(ScriptValue::Number(items.len() as f64))
    }
}
