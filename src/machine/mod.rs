pub mod heap;
mod native;

use crate::{
    compiler::{Compiler, Constant, ConstRef, FunctionProto, Opcode},
    environment::{BindingKind, EnvironmentError, ScopeArena, ScopeId},
    interpreter::{
        ConsoleSink, DisplayValue, InitializationError, Interpreter, Marshalled, RuntimeFault,
        ScopeNode,
    },
    parser::parse_program,
    value::{
        error::{RuntimeError, RuntimeErrorKind},
        formatter::{function_label, to_display_string},
        ScriptFunction, ScriptValue,
    },
};
use compact_str::{format_compact, CompactString};
use heap::Heap;
use native::{ArrayPush, ConsoleMethod};
use std::fmt::Write;
use std::rc::Rc;

const WRITE_FMT_MSG: &str =
    "Encountered an error while attempting to write format string to buffer.";

/// Script function frames allowed on top of the program frame.
pub const MAX_CALL_DEPTH: usize = 256;

/// Sparse array writes further than this past the end are rejected.
const MAX_ARRAY_GROWTH: usize = 1 << 20;

#[derive(Debug)]
struct Frame {
    proto: Rc<FunctionProto>,
    ip: usize,
    scope: ScopeId,
    stack_base: usize,
}

pub struct Machine {
    frames: Vec<Frame>,
    stack: Vec<ScriptValue>,
    scopes: ScopeArena,
    heap: Heap,
    intrinsics: Vec<(CompactString, ScriptValue)>,
    console: Box<dyn ConsoleSink>,
    halted: bool,
}

impl From<&Constant> for ScriptValue {
    fn from(value: &Constant) -> Self {
        match value {
            Constant::Number(value) => Self::Number(*value),
            Constant::String(value) => Self::String(value.clone()),
            Constant::Bool(value) => Self::Bool(*value),
            Constant::Null => Self::Null,
            Constant::Undefined => Self::Undefined,
        }
    }
}

impl Machine {
    pub fn new(program: FunctionProto, console: Box<dyn ConsoleSink>) -> Self {
        let mut heap = Heap::new();
        let console_object = heap.allocate_object(
            ["log", "info", "warn", "error", "debug"]
                .into_iter()
                .map(|name| {
                    let method: ScriptValue = ScriptValue::Native(Rc::new(ConsoleMethod { name }));
                    (CompactString::from(name), method)
                })
                .collect(),
        );
        let scopes = ScopeArena::new();
        let frames = vec![Frame {
            proto: Rc::new(program),
            ip: 0,
            scope: scopes.global(),
            stack_base: 0,
        }];

        Self {
            frames,
            stack: Vec::new(),
            scopes,
            heap,
            intrinsics: vec![("console".into(), console_object)],
            console,
            halted: false,
        }
    }

    /// Looks a name up in the user scopes, then among the intrinsics.
    fn lookup(&self, name: &str) -> Option<&ScriptValue> {
        self.scopes
            .access(self.current_scope(), name)
            .or_else(|| {
                self.intrinsics
                    .iter()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value)
            })
    }

    fn current_scope(&self) -> ScopeId {
        self.frames
            .last()
            .map(|frame| frame.scope)
            .unwrap_or(self.scopes.global())
    }

    fn print_stack(&self) -> String {
        const INDENT: &str = "  ";
        let mut buffer = String::new();
        for (index, value) in self.stack.iter().enumerate().rev() {
            writeln!(buffer, "{INDENT}{index:02}: {}", to_display_string(value, &self.heap))
                .expect(WRITE_FMT_MSG);
        }
        buffer
    }
}

impl Machine {
    fn pop(&mut self) -> Result<ScriptValue, RuntimeErrorKind> {
        self.stack
            .pop()
            .ok_or_else(|| RuntimeErrorKind::Internal("value stack underflow".into()))
    }

    fn peek(&self) -> Result<&ScriptValue, RuntimeErrorKind> {
        self.stack
            .last()
            .ok_or_else(|| RuntimeErrorKind::Internal("value stack underflow".into()))
    }

    fn frame_mut(&mut self) -> Result<&mut Frame, RuntimeErrorKind> {
        self.frames
            .last_mut()
            .ok_or_else(|| RuntimeErrorKind::Internal("no active frame".into()))
    }

    fn name(proto: &FunctionProto, handle: ConstRef) -> Result<CompactString, RuntimeErrorKind> {
        proto
            .chunk
            .get_string(handle)
            .cloned()
            .ok_or_else(|| {
                RuntimeErrorKind::Internal(format_compact!("bad name constant {}", handle.0))
            })
    }

    fn jump(&mut self, offset: i32) -> Result<(), RuntimeErrorKind> {
        let frame = self.frame_mut()?;
        frame.ip = (frame.ip as i64 + offset as i64) as usize;
        Ok(())
    }

    fn binary(
        &mut self,
        operation: impl FnOnce(
            &ScriptValue,
            &ScriptValue,
            &Heap,
        ) -> Result<ScriptValue, RuntimeErrorKind>,
    ) -> Result<(), RuntimeErrorKind> {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        let result = operation(&lhs, &rhs, &self.heap)?;
        self.stack.push(result);
        Ok(())
    }

    fn get_property(
        &self,
        object: &ScriptValue,
        name: &str,
    ) -> Result<ScriptValue, RuntimeErrorKind> {
        let value = match object {
            ScriptValue::Undefined | ScriptValue::Null => {
                return Err(RuntimeErrorKind::PropertyOfNothing {
                    object: object.type_name(),
                    name: name.into(),
                })
            }
            ScriptValue::Object(handle) => self
                .heap
                .get_property(*handle, name)
                .cloned()
                .unwrap_or(ScriptValue::Undefined),
            ScriptValue::Array(handle) => match name {
                "length" => ScriptValue::Number(
                    self.heap.array(*handle).map(<[_]>::len).unwrap_or(0) as f64,
                ),
                "push" => ScriptValue::Native(Rc::new(ArrayPush { target: *handle })),
                _ => match name.parse::<usize>() {
                    Ok(index) => self.array_item(*handle, index),
                    Err(_) => ScriptValue::Undefined,
                },
            },
            ScriptValue::String(text) if name == "length" => {
                ScriptValue::Number(text.encode_utf16().count() as f64)
            }
            _ => ScriptValue::Undefined,
        };
        Ok(value)
    }

    fn array_item(&self, handle: heap::ObjectRef, index: usize) -> ScriptValue {
        self.heap
            .array(handle)
            .and_then(|items| items.get(index))
            .cloned()
            .unwrap_or(ScriptValue::Undefined)
    }

    fn set_property(
        &mut self,
        object: &ScriptValue,
        name: &str,
        value: ScriptValue,
    ) -> Result<(), RuntimeErrorKind> {
        match object {
            ScriptValue::Undefined | ScriptValue::Null => {
                Err(RuntimeErrorKind::SetPropertyOfNothing {
                    object: object.type_name(),
                    name: name.into(),
                })
            }
            ScriptValue::Object(handle) => {
                self.heap.set_property(*handle, name, value);
                Ok(())
            }
            ScriptValue::Array(handle) => match name.parse::<usize>() {
                Ok(index) => self.set_array_item(*handle, index, value),
                Err(_) => Err(RuntimeErrorKind::SetPropertyOfPrimitive {
                    object: "array",
                    name: name.into(),
                }),
            },
            other => Err(RuntimeErrorKind::SetPropertyOfPrimitive {
                object: other.type_name(),
                name: name.into(),
            }),
        }
    }

    fn set_array_item(
        &mut self,
        handle: heap::ObjectRef,
        index: usize,
        value: ScriptValue,
    ) -> Result<(), RuntimeErrorKind> {
        let items = self
            .heap
            .array_mut(handle)
            .ok_or_else(|| RuntimeErrorKind::Internal("array handle is not an array".into()))?;
        if index >= items.len() + MAX_ARRAY_GROWTH {
            return Err(RuntimeErrorKind::InvalidIndex(format_compact!("{index}")));
        }
        if index >= items.len() {
            items.resize(index + 1, ScriptValue::Undefined);
        }
        items[index] = value;
        Ok(())
    }

    /// Converts an index operand into an array position or a property key.
    fn index_key(&self, index: &ScriptValue) -> Result<usize, CompactString> {
        match index {
            ScriptValue::Number(value) if *value >= 0.0 && value.fract() == 0.0 => {
                Ok(*value as usize)
            }
            other => Err(to_display_string(other, &self.heap)),
        }
    }

    fn call(&mut self, argument_count: usize) -> Result<(), RuntimeErrorKind> {
        let split = self
            .stack
            .len()
            .checked_sub(argument_count)
            .ok_or_else(|| RuntimeErrorKind::Internal("value stack underflow".into()))?;
        let arguments = self.stack.split_off(split);
        let callee = self.pop()?;

        match callee {
            ScriptValue::Function(function) => {
                if self.frames.len() > MAX_CALL_DEPTH {
                    return Err(RuntimeErrorKind::StackOverflow);
                }
                let scope = self.scopes.new_scope(function.closure);
                let mut arguments = arguments.into_iter();
                for parameter in function.proto.parameters.iter() {
                    let value = arguments.next().unwrap_or(ScriptValue::Undefined);
                    self.scopes
                        .declare(scope, parameter, value, BindingKind::Parameter)
                        .map_err(|_| RuntimeErrorKind::Redeclaration(parameter.clone()))?;
                }
                self.frames.push(Frame {
                    proto: Rc::clone(&function.proto),
                    ip: 0,
                    scope,
                    stack_base: self.stack.len(),
                });
                Ok(())
            }
            ScriptValue::Native(native) => {
                let result = native.call(&arguments, &mut self.heap, self.console.as_mut())?;
                self.stack.push(result);
                Ok(())
            }
            other => Err(RuntimeErrorKind::InvalidCallee(other.describe())),
        }
    }

    fn execute(&mut self, opcode: Opcode, proto: &FunctionProto) -> Result<(), RuntimeErrorKind> {
        match opcode {
            Opcode::Enter => {}
            Opcode::Halt => {
                tracing::trace!(stack = %self.print_stack(), "program halted");
                self.halted = true;
                self.frames.clear();
                self.stack.clear();
            }
            Opcode::Constant(handle) => {
                let value = proto.chunk.get_constant(handle).ok_or_else(|| {
                    RuntimeErrorKind::Internal(format_compact!("bad constant {}", handle.0))
                })?;
                self.stack.push(value.into());
            }
            Opcode::Pop => {
                self.pop()?;
            }
            Opcode::Declare { name, kind } => {
                let name = Self::name(proto, name)?;
                let value = self.pop()?;
                let scope = self.current_scope();
                self.scopes
                    .declare(scope, &name, value, kind)
                    .map_err(|_| RuntimeErrorKind::Redeclaration(name))?;
            }
            Opcode::Get(name) => {
                let name = Self::name(proto, name)?;
                let value = self
                    .lookup(&name)
                    .cloned()
                    .ok_or(RuntimeErrorKind::Undeclared(name))?;
                self.stack.push(value);
            }
            Opcode::Set(name) => {
                let name = Self::name(proto, name)?;
                let value = self.peek()?.clone();
                let scope = self.current_scope();
                self.scopes
                    .assign(scope, &name, value)
                    .map_err(|error| match error {
                        EnvironmentError::AssignToConstant => {
                            RuntimeErrorKind::AssignToConstant(name)
                        }
                        EnvironmentError::Undeclared | EnvironmentError::AlreadyDeclared => {
                            RuntimeErrorKind::Undeclared(name)
                        }
                    })?;
            }
            Opcode::GetProperty(name) => {
                let name = Self::name(proto, name)?;
                let object = self.pop()?;
                let value = self.get_property(&object, &name)?;
                self.stack.push(value);
            }
            Opcode::SetProperty(name) => {
                let name = Self::name(proto, name)?;
                let value = self.pop()?;
                let object = self.pop()?;
                self.set_property(&object, &name, value.clone())?;
                self.stack.push(value);
            }
            Opcode::GetIndex => {
                let index = self.pop()?;
                let object = self.pop()?;
                let value = match (&object, self.index_key(&index)) {
                    (ScriptValue::Array(handle), Ok(position)) => self.array_item(*handle, position),
                    (ScriptValue::String(text), Ok(position)) => string_unit(text, position)
                        .map(ScriptValue::String)
                        .unwrap_or(ScriptValue::Undefined),
                    (object, Ok(position)) => {
                        self.get_property(object, &format_compact!("{position}"))?
                    }
                    (object, Err(key)) => self.get_property(object, &key)?,
                };
                self.stack.push(value);
            }
            Opcode::SetIndex => {
                let value = self.pop()?;
                let index = self.pop()?;
                let object = self.pop()?;
                match (&object, self.index_key(&index)) {
                    (ScriptValue::Array(handle), Ok(position)) => {
                        self.set_array_item(*handle, position, value.clone())?
                    }
                    (ScriptValue::Array(_), Err(key)) => {
                        return Err(RuntimeErrorKind::InvalidIndex(key));
                    }
                    (object, Ok(position)) => {
                        self.set_property(object, &format_compact!("{position}"), value.clone())?
                    }
                    (object, Err(key)) => self.set_property(object, &key, value.clone())?,
                }
                self.stack.push(value);
            }
            Opcode::MakeArray(count) => {
                let split = self
                    .stack
                    .len()
                    .checked_sub(count as usize)
                    .ok_or_else(|| RuntimeErrorKind::Internal("value stack underflow".into()))?;
                let items = self.stack.split_off(split);
                let array = self.heap.allocate_array(items);
                self.stack.push(array);
            }
            Opcode::MakeObject(count) => {
                let split = self
                    .stack
                    .len()
                    .checked_sub(2 * count as usize)
                    .ok_or_else(|| RuntimeErrorKind::Internal("value stack underflow".into()))?;
                let flat = self.stack.split_off(split);
                let object = self.heap.allocate_object(Vec::with_capacity(count as usize));
                if let ScriptValue::Object(handle) = object {
                    for pair in flat.chunks_exact(2) {
                        let key = to_display_string(&pair[0], &self.heap);
                        self.heap.set_property(handle, &key, pair[1].clone());
                    }
                }
                self.stack.push(object);
            }
            Opcode::Closure(handle) => {
                let function = proto.chunk.get_function(handle).ok_or_else(|| {
                    RuntimeErrorKind::Internal(format_compact!("bad function {}", handle.0))
                })?;
                self.stack.push(ScriptValue::Function(Rc::new(ScriptFunction {
                    proto: Rc::clone(function),
                    closure: self.current_scope(),
                })));
            }
            Opcode::Call(count) => self.call(count as usize)?,
            Opcode::Return => {
                let value = self.pop()?;
                let frame = self
                    .frames
                    .pop()
                    .ok_or_else(|| RuntimeErrorKind::Internal("return without a frame".into()))?;
                self.stack.truncate(frame.stack_base);
                self.stack.push(value);
                if self.frames.is_empty() {
                    self.halted = true;
                }
            }
            Opcode::Add => self.binary(|lhs, rhs, heap| lhs.add(rhs, heap))?,
            Opcode::Subtract => self.binary(|lhs, rhs, _| lhs.subtract(rhs))?,
            Opcode::Multiply => self.binary(|lhs, rhs, _| lhs.multiply(rhs))?,
            Opcode::Divide => self.binary(|lhs, rhs, _| lhs.divide(rhs))?,
            Opcode::Modulo => self.binary(|lhs, rhs, _| lhs.modulo(rhs))?,
            Opcode::LessThan => self.binary(|lhs, rhs, _| lhs.less_than(rhs))?,
            Opcode::LessThanEqual => self.binary(|lhs, rhs, _| lhs.less_than_or_equal(rhs))?,
            Opcode::GreaterThan => self.binary(|lhs, rhs, _| lhs.greater_than(rhs))?,
            Opcode::GreaterThanEqual => {
                self.binary(|lhs, rhs, _| lhs.greater_than_or_equal(rhs))?
            }
            Opcode::Equals => {
                self.binary(|lhs, rhs, _| Ok(ScriptValue::Bool(lhs.loose_equals(rhs))))?
            }
            Opcode::StrictEquals => {
                self.binary(|lhs, rhs, _| Ok(ScriptValue::Bool(lhs.strict_equals(rhs))))?
            }
            Opcode::Negate => {
                let value = self.pop()?.numeric_negate()?;
                self.stack.push(value);
            }
            Opcode::Not => {
                let value = self.pop()?;
                self.stack.push(ScriptValue::Bool(value.logical_not()));
            }
            Opcode::Jump(offset) => self.jump(offset.0)?,
            Opcode::JumpIfFalse(offset) => {
                if !self.pop()?.is_truthy() {
                    self.jump(offset.0)?;
                }
            }
            Opcode::JumpIfFalseOrPop(offset) => {
                if self.peek()?.is_truthy() {
                    self.pop()?;
                } else {
                    self.jump(offset.0)?;
                }
            }
            Opcode::JumpIfTrueOrPop(offset) => {
                if self.peek()?.is_truthy() {
                    self.jump(offset.0)?;
                } else {
                    self.pop()?;
                }
            }
            Opcode::PushScope => {
                let scope = self.current_scope();
                let child = self.scopes.new_scope(scope);
                self.frame_mut()?.scope = child;
            }
            Opcode::PopScope => {
                let scope = self.current_scope();
                let parent = self
                    .scopes
                    .parent(scope)
                    .ok_or_else(|| RuntimeErrorKind::Internal("popped the global scope".into()))?;
                self.frame_mut()?.scope = parent;
            }
        }
        Ok(())
    }
}

impl Interpreter for Machine {
    type Value = ScriptValue;
    type Scope<'a> = MachineScope<'a>;

    fn initialize(
        source: &str,
        console: Box<dyn ConsoleSink>,
    ) -> Result<Self, InitializationError> {
        let program = parse_program(source)?;
        let program = Compiler::compile_program(&program);
        Ok(Machine::new(program, console))
    }

    fn step(&mut self) -> Result<bool, RuntimeFault> {
        if self.halted {
            return Ok(false);
        }
        let Some(frame) = self.frames.last_mut() else {
            self.halted = true;
            return Ok(false);
        };
        let proto = Rc::clone(&frame.proto);
        let ip = frame.ip;
        let line = proto.chunk.line_at(ip).filter(|line| *line > 0);

        let fault = |kind: RuntimeErrorKind| {
            let error = RuntimeError { kind, line };
            RuntimeFault {
                message: error.to_string(),
                line: error.line,
            }
        };

        let (opcode, next) = match proto.chunk.decode_at(ip) {
            Ok(Some(decoded)) => decoded,
            Ok(None) => {
                self.halted = true;
                return Ok(false);
            }
            Err(error) => {
                return Err(fault(RuntimeErrorKind::Internal(format_compact!("{error}"))));
            }
        };
        frame.ip = next;

        self.execute(opcode, &proto).map_err(fault)?;
        Ok(!self.halted)
    }

    fn current_line(&self) -> Option<u32> {
        if self.halted {
            return None;
        }
        let frame = self.frames.last()?;
        frame
            .proto
            .chunk
            .line_at(frame.ip)
            .filter(|line| *line > 0)
    }

    fn scope_chain(&self) -> Option<Self::Scope<'_>> {
        Some(MachineScope {
            scopes: &self.scopes,
            id: self.current_scope(),
        })
    }

    fn marshal(&self, value: &Self::Value) -> Marshalled<Self::Value> {
        match value {
            ScriptValue::Undefined => Marshalled::Display(DisplayValue::Undefined),
            ScriptValue::Null => Marshalled::Display(DisplayValue::Null),
            ScriptValue::Bool(value) => Marshalled::Display(DisplayValue::Bool(*value)),
            ScriptValue::Number(value) => Marshalled::Display(DisplayValue::Number(*value)),
            ScriptValue::String(value) => Marshalled::Display(DisplayValue::String(value.clone())),
            ScriptValue::Array(handle) => Marshalled::List {
                identity: handle.index(),
                items: self.heap.array(*handle).unwrap_or_default().to_vec(),
            },
            ScriptValue::Object(handle) => Marshalled::Record {
                identity: handle.index(),
                entries: self.heap.entries(*handle).unwrap_or_default().to_vec(),
            },
            function => Marshalled::Display(DisplayValue::Placeholder(
                function_label(function).unwrap_or_else(|| "[Function]".into()),
            )),
        }
    }
}

/// The UTF-16 unit at `position`, the same unit `length` counts. Half of a
/// surrogate pair reads as U+FFFD.
fn string_unit(text: &str, position: usize) -> Option<CompactString> {
    let unit = text.encode_utf16().nth(position)?;
    let c = char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER);
    Some(CompactString::from(&*c.encode_utf8(&mut [0; 4])))
}

/// A view of one scope in a machine's scope arena.
#[derive(Clone, Copy)]
pub struct MachineScope<'a> {
    scopes: &'a ScopeArena,
    id: ScopeId,
}

impl<'a> ScopeNode for MachineScope<'a> {
    type Value = ScriptValue;

    fn bindings(&self) -> Vec<(CompactString, ScriptValue)> {
        self.scopes
            .bindings(self.id)
            .iter()
            .map(|binding| (binding.name.clone(), binding.value.clone()))
            .collect()
    }

    fn parent(&self) -> Option<Self> {
        Some(MachineScope {
            scopes: self.scopes,
            id: self.scopes.parent(self.id)?,
        })
    }
}
