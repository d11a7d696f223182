use thiserror::Error;

use super::{Chunk, ConstRef, IncompleteChunk, WRITE_FMT_MSG};
use crate::environment::BindingKind;
use std::fmt::Write;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Encountered invalid opcode {value}.")]
    InvalidOpcode { value: u8 },
    #[error("Incomplete operand for opcode {opcode:?}.")]
    IncompleteOperand { opcode: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionOffset(pub i32);
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionRef(pub u32);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Opcode {
    Enter,
    Halt,
    Constant(ConstRef),
    Pop,
    Declare { name: ConstRef, kind: BindingKind },
    Get(ConstRef),
    Set(ConstRef),
    GetProperty(ConstRef),
    SetProperty(ConstRef),
    GetIndex,
    SetIndex,
    MakeArray(u32),
    MakeObject(u32),
    Closure(FunctionRef),
    Call(u32),
    Return,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    Not,
    Equals,
    StrictEquals,
    LessThan,
    LessThanEqual,
    GreaterThan,
    GreaterThanEqual,
    Jump(InstructionOffset),
    JumpIfFalse(InstructionOffset),
    JumpIfFalseOrPop(InstructionOffset),
    JumpIfTrueOrPop(InstructionOffset),
    PushScope,
    PopScope,
}

impl Opcode {
    // Opcode table
    pub const C_ENTER: u8 = 0x01;
    pub const C_HALT: u8 = 0x02;
    pub const C_CONST: u8 = 0x03;
    pub const C_POP: u8 = 0x04;
    pub const C_DECLARE: u8 = 0x05;
    pub const C_GET: u8 = 0x06;
    pub const C_SET: u8 = 0x07;
    pub const C_GET_PROPERTY: u8 = 0x08;
    pub const C_SET_PROPERTY: u8 = 0x09;
    pub const C_GET_INDEX: u8 = 0x0A;
    pub const C_SET_INDEX: u8 = 0x0B;
    pub const C_MAKE_ARRAY: u8 = 0x0C;
    pub const C_MAKE_OBJECT: u8 = 0x0D;
    pub const C_CLOSURE: u8 = 0x0E;
    pub const C_CALL: u8 = 0x0F;
    pub const C_RETURN: u8 = 0x10;
    pub const C_ADD: u8 = 0x11;
    pub const C_SUBTRACT: u8 = 0x12;
    pub const C_MULTIPLY: u8 = 0x13;
    pub const C_DIVIDE: u8 = 0x14;
    pub const C_MODULO: u8 = 0x15;
    pub const C_NEGATE: u8 = 0x16;
    pub const C_NOT: u8 = 0x17;
    pub const C_EQUAL: u8 = 0x18;
    pub const C_STRICT_EQUAL: u8 = 0x19;
    pub const C_LESS_THAN: u8 = 0x1A;
    pub const C_LESS_THAN_EQUAL: u8 = 0x1B;
    pub const C_GREATER_THAN: u8 = 0x1C;
    pub const C_GREATER_THAN_EQUAL: u8 = 0x1D;
    pub const C_JUMP: u8 = 0x1E;
    pub const C_JUMP_IF_FALSE: u8 = 0x1F;
    pub const C_JUMP_IF_FALSE_OR_POP: u8 = 0x20;
    pub const C_JUMP_IF_TRUE_OR_POP: u8 = 0x21;
    pub const C_PUSH_SCOPE: u8 = 0x22;
    pub const C_POP_SCOPE: u8 = 0x23;

    /// Size in bytes of an opcode carrying a single 32-bit operand.
    pub const WIDE_SIZE: usize = 5;

    pub fn decode_at(data: &[u8], index: usize) -> Result<Option<(Opcode, usize)>, DecodeError> {
        let Some(first) = data.get(index) else {
            return Ok(None);
        };

        let parse_bytes = |code: u8| -> Result<[u8; 4], DecodeError> {
            let handle_bytes = data
                .get(index + 1..index + 5)
                .ok_or(DecodeError::IncompleteOperand { opcode: code })?;
            let [first, second, third, fourth] = handle_bytes else {
                return Err(DecodeError::IncompleteOperand { opcode: code });
            };
            Ok([*first, *second, *third, *fourth])
        };
        let parse_u32 = |code: u8| parse_bytes(code).map(u32::from_le_bytes);
        let parse_i32 = |code: u8| parse_bytes(code).map(i32::from_le_bytes);
        let wide = index + Self::WIDE_SIZE;

        let (opcode, rest) = match *first {
            Opcode::C_CONST => (Opcode::Constant(ConstRef(parse_u32(*first)?)), wide),
            Opcode::C_DECLARE => {
                let name = ConstRef(parse_u32(*first)?);
                let kind = data
                    .get(wide)
                    .copied()
                    .and_then(BindingKind::from_u8)
                    .ok_or(DecodeError::IncompleteOperand { opcode: *first })?;
                (Opcode::Declare { name, kind }, wide + 1)
            }
            Opcode::C_GET => (Opcode::Get(ConstRef(parse_u32(*first)?)), wide),
            Opcode::C_SET => (Opcode::Set(ConstRef(parse_u32(*first)?)), wide),
            Opcode::C_GET_PROPERTY => (Opcode::GetProperty(ConstRef(parse_u32(*first)?)), wide),
            Opcode::C_SET_PROPERTY => (Opcode::SetProperty(ConstRef(parse_u32(*first)?)), wide),
            Opcode::C_MAKE_ARRAY => (Opcode::MakeArray(parse_u32(*first)?), wide),
            Opcode::C_MAKE_OBJECT => (Opcode::MakeObject(parse_u32(*first)?), wide),
            Opcode::C_CLOSURE => (Opcode::Closure(FunctionRef(parse_u32(*first)?)), wide),
            Opcode::C_CALL => (Opcode::Call(parse_u32(*first)?), wide),
            Opcode::C_JUMP => (Opcode::Jump(InstructionOffset(parse_i32(*first)?)), wide),
            Opcode::C_JUMP_IF_FALSE => (
                Opcode::JumpIfFalse(InstructionOffset(parse_i32(*first)?)),
                wide,
            ),
            Opcode::C_JUMP_IF_FALSE_OR_POP => (
                Opcode::JumpIfFalseOrPop(InstructionOffset(parse_i32(*first)?)),
                wide,
            ),
            Opcode::C_JUMP_IF_TRUE_OR_POP => (
                Opcode::JumpIfTrueOrPop(InstructionOffset(parse_i32(*first)?)),
                wide,
            ),
            Opcode::C_ENTER => (Opcode::Enter, index + 1),
            Opcode::C_HALT => (Opcode::Halt, index + 1),
            Opcode::C_POP => (Opcode::Pop, index + 1),
            Opcode::C_GET_INDEX => (Opcode::GetIndex, index + 1),
            Opcode::C_SET_INDEX => (Opcode::SetIndex, index + 1),
            Opcode::C_RETURN => (Opcode::Return, index + 1),
            Opcode::C_ADD => (Opcode::Add, index + 1),
            Opcode::C_SUBTRACT => (Opcode::Subtract, index + 1),
            Opcode::C_MULTIPLY => (Opcode::Multiply, index + 1),
            Opcode::C_DIVIDE => (Opcode::Divide, index + 1),
            Opcode::C_MODULO => (Opcode::Modulo, index + 1),
            Opcode::C_NEGATE => (Opcode::Negate, index + 1),
            Opcode::C_NOT => (Opcode::Not, index + 1),
            Opcode::C_EQUAL => (Opcode::Equals, index + 1),
            Opcode::C_STRICT_EQUAL => (Opcode::StrictEquals, index + 1),
            Opcode::C_LESS_THAN => (Opcode::LessThan, index + 1),
            Opcode::C_LESS_THAN_EQUAL => (Opcode::LessThanEqual, index + 1),
            Opcode::C_GREATER_THAN => (Opcode::GreaterThan, index + 1),
            Opcode::C_GREATER_THAN_EQUAL => (Opcode::GreaterThanEqual, index + 1),
            Opcode::C_PUSH_SCOPE => (Opcode::PushScope, index + 1),
            Opcode::C_POP_SCOPE => (Opcode::PopScope, index + 1),
            opcode => {
                return Err(DecodeError::InvalidOpcode { value: opcode });
            }
        };
        Ok(Some((opcode, rest)))
    }

    pub fn encode(&self, chunk: &mut IncompleteChunk) {
        match self {
            Opcode::Constant(handle) => {
                chunk.emit_u8(Opcode::C_CONST);
                chunk.emit_u32(handle.0);
            }
            Opcode::Declare { name, kind } => {
                chunk.emit_u8(Opcode::C_DECLARE);
                chunk.emit_u32(name.0);
                chunk.emit_u8(kind.to_u8());
            }
            Opcode::Get(handle) => {
                chunk.emit_u8(Opcode::C_GET);
                chunk.emit_u32(handle.0);
            }
            Opcode::Set(handle) => {
                chunk.emit_u8(Opcode::C_SET);
                chunk.emit_u32(handle.0);
            }
            Opcode::GetProperty(handle) => {
                chunk.emit_u8(Opcode::C_GET_PROPERTY);
                chunk.emit_u32(handle.0);
            }
            Opcode::SetProperty(handle) => {
                chunk.emit_u8(Opcode::C_SET_PROPERTY);
                chunk.emit_u32(handle.0);
            }
            Opcode::MakeArray(count) => {
                chunk.emit_u8(Opcode::C_MAKE_ARRAY);
                chunk.emit_u32(*count);
            }
            Opcode::MakeObject(count) => {
                chunk.emit_u8(Opcode::C_MAKE_OBJECT);
                chunk.emit_u32(*count);
            }
            Opcode::Closure(handle) => {
                chunk.emit_u8(Opcode::C_CLOSURE);
                chunk.emit_u32(handle.0);
            }
            Opcode::Call(count) => {
                chunk.emit_u8(Opcode::C_CALL);
                chunk.emit_u32(*count);
            }
            Opcode::Jump(offset) => {
                chunk.emit_u8(Opcode::C_JUMP);
                chunk.emit_i32(offset.0);
            }
            Opcode::JumpIfFalse(offset) => {
                chunk.emit_u8(Opcode::C_JUMP_IF_FALSE);
                chunk.emit_i32(offset.0);
            }
            Opcode::JumpIfFalseOrPop(offset) => {
                chunk.emit_u8(Opcode::C_JUMP_IF_FALSE_OR_POP);
                chunk.emit_i32(offset.0);
            }
            Opcode::JumpIfTrueOrPop(offset) => {
                chunk.emit_u8(Opcode::C_JUMP_IF_TRUE_OR_POP);
                chunk.emit_i32(offset.0);
            }
            Opcode::Enter => chunk.emit_u8(Opcode::C_ENTER),
            Opcode::Halt => chunk.emit_u8(Opcode::C_HALT),
            Opcode::Pop => chunk.emit_u8(Opcode::C_POP),
            Opcode::GetIndex => chunk.emit_u8(Opcode::C_GET_INDEX),
            Opcode::SetIndex => chunk.emit_u8(Opcode::C_SET_INDEX),
            Opcode::Return => chunk.emit_u8(Opcode::C_RETURN),
            Opcode::Add => chunk.emit_u8(Opcode::C_ADD),
            Opcode::Subtract => chunk.emit_u8(Opcode::C_SUBTRACT),
            Opcode::Multiply => chunk.emit_u8(Opcode::C_MULTIPLY),
            Opcode::Divide => chunk.emit_u8(Opcode::C_DIVIDE),
            Opcode::Modulo => chunk.emit_u8(Opcode::C_MODULO),
            Opcode::Negate => chunk.emit_u8(Opcode::C_NEGATE),
            Opcode::Not => chunk.emit_u8(Opcode::C_NOT),
            Opcode::Equals => chunk.emit_u8(Opcode::C_EQUAL),
            Opcode::StrictEquals => chunk.emit_u8(Opcode::C_STRICT_EQUAL),
            Opcode::LessThan => chunk.emit_u8(Opcode::C_LESS_THAN),
            Opcode::LessThanEqual => chunk.emit_u8(Opcode::C_LESS_THAN_EQUAL),
            Opcode::GreaterThan => chunk.emit_u8(Opcode::C_GREATER_THAN),
            Opcode::GreaterThanEqual => chunk.emit_u8(Opcode::C_GREATER_THAN_EQUAL),
            Opcode::PushScope => chunk.emit_u8(Opcode::C_PUSH_SCOPE),
            Opcode::PopScope => chunk.emit_u8(Opcode::C_POP_SCOPE),
        }
    }

    pub fn format(&self, buffer: &mut String, chunk: &Chunk) {
        let with_constant = |buffer: &mut String, mnemonic: &str, handle: &ConstRef| {
            buffer.push_str(mnemonic);
            write!(buffer, " {:<width$}${} = ", " ", handle.0, width = 4).expect(WRITE_FMT_MSG);
            chunk.constants.format_constant(*handle, buffer);
        };
        let with_offset = |buffer: &mut String, mnemonic: &str, offset: &InstructionOffset| {
            buffer.push_str(mnemonic);
            write!(buffer, " {:<width$}{:+}", " ", offset.0, width = 4).expect(WRITE_FMT_MSG);
        };
        let with_count = |buffer: &mut String, mnemonic: &str, count: &u32| {
            buffer.push_str(mnemonic);
            write!(buffer, " {:<width$}#{}", " ", count, width = 4).expect(WRITE_FMT_MSG);
        };

        match self {
            Opcode::Constant(handle) => with_constant(buffer, "ldc", handle),
            Opcode::Declare { name, kind } => {
                with_constant(buffer, "dcl", name);
                write!(buffer, " ({kind})").expect(WRITE_FMT_MSG);
            }
            Opcode::Get(handle) => with_constant(buffer, "get", handle),
            Opcode::Set(handle) => with_constant(buffer, "set", handle),
            Opcode::GetProperty(handle) => with_constant(buffer, "gpr", handle),
            Opcode::SetProperty(handle) => with_constant(buffer, "spr", handle),
            Opcode::MakeArray(count) => with_count(buffer, "arr", count),
            Opcode::MakeObject(count) => with_count(buffer, "obj", count),
            Opcode::Closure(handle) => {
                buffer.push_str("fun");
                let name = chunk
                    .get_function(*handle)
                    .map(|proto| proto.display_name())
                    .unwrap_or("INVALID_FUNCTION_HANDLE");
                write!(buffer, " {:<width$}@{} = <{}>", " ", handle.0, name, width = 4)
                    .expect(WRITE_FMT_MSG);
            }
            Opcode::Call(count) => with_count(buffer, "call", count),
            Opcode::Jump(offset) => with_offset(buffer, "jpa", offset),
            Opcode::JumpIfFalse(offset) => with_offset(buffer, "jif", offset),
            Opcode::JumpIfFalseOrPop(offset) => with_offset(buffer, "jfp", offset),
            Opcode::JumpIfTrueOrPop(offset) => with_offset(buffer, "jtp", offset),
            Opcode::Enter => buffer.push_str("enter"),
            Opcode::Halt => buffer.push_str("halt"),
            Opcode::Pop => buffer.push_str("pop"),
            Opcode::GetIndex => buffer.push_str("gix"),
            Opcode::SetIndex => buffer.push_str("six"),
            Opcode::Return => buffer.push_str("ret"),
            Opcode::Add => buffer.push_str("add"),
            Opcode::Subtract => buffer.push_str("sub"),
            Opcode::Multiply => buffer.push_str("mul"),
            Opcode::Divide => buffer.push_str("div"),
            Opcode::Modulo => buffer.push_str("mod"),
            Opcode::Negate => buffer.push_str("neg"),
            Opcode::Not => buffer.push_str("not"),
            Opcode::Equals => buffer.push_str("eq"),
            Opcode::StrictEquals => buffer.push_str("seq"),
            Opcode::LessThan => buffer.push_str("lt"),
            Opcode::LessThanEqual => buffer.push_str("le"),
            Opcode::GreaterThan => buffer.push_str("gt"),
            Opcode::GreaterThanEqual => buffer.push_str("ge"),
            Opcode::PushScope => buffer.push_str("psc"),
            Opcode::PopScope => buffer.push_str("ppc"),
        }
    }
}
