mod constant;
mod opcode;

use crate::environment::BindingKind;
use crate::parser::expression::{
    AssignmentTarget, Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode,
    ExpressionNodeRef, InfixOperator, InfixShortCircuitOperator, PrefixOperator,
};
use crate::parser::statement::{FunctionDecl, Program, Statement, VariableKind};
use compact_str::CompactString;
pub use constant::{ConstRef, Constant, ConstantPool};
pub use opcode::{DecodeError, FunctionRef, InstructionOffset, Opcode};
use std::fmt::Write;
use std::rc::Rc;

pub(crate) const WRITE_FMT_MSG: &str =
    "Encountered an error while attempting to write format string to buffer.";

/// A compiled function body, or the top level program.
#[derive(Debug)]
pub struct FunctionProto {
    pub name: Option<CompactString>,
    pub parameters: Vec<CompactString>,
    pub chunk: Chunk,
    pub line: u32,
}

impl FunctionProto {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("anonymous")
    }
}

pub struct IncompleteChunk {
    name: CompactString,
    data: Vec<u8>,
    lines: Vec<(u32, u32)>,
    constants: ConstantPool,
    functions: Vec<Rc<FunctionProto>>,
}

impl IncompleteChunk {
    pub fn new(name: CompactString) -> Self {
        Self {
            name,
            data: Vec::new(),
            lines: Vec::new(),
            constants: ConstantPool::new(),
            functions: Vec::new(),
        }
    }

    pub fn emit_u8(&mut self, byte: u8) {
        self.data.push(byte);
    }

    pub fn emit_u32(&mut self, value: u32) {
        // Little endian
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    pub fn emit_i32(&mut self, value: i32) {
        self.data.extend_from_slice(&value.to_le_bytes());
    }

    /// Emits an instruction attributed to `line`, returning its offset.
    pub fn emit(&mut self, opcode: Opcode, line: u32) -> usize {
        let offset = self.data.len();
        self.lines.push((offset as u32, line));
        opcode.encode(self);
        offset
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Points the jump instruction at `start` to the current end of the chunk.
    pub fn patch_jump(&mut self, start: usize) {
        let offset = (self.data.len() - (start + Opcode::WIDE_SIZE)) as i32;
        self.data[start + 1..start + Opcode::WIDE_SIZE].copy_from_slice(&offset.to_le_bytes());
    }

    pub fn emit_loop(&mut self, target: usize, line: u32) {
        let offset = target as i64 - (self.data.len() + Opcode::WIDE_SIZE) as i64;
        self.emit(Opcode::Jump(InstructionOffset(offset as i32)), line);
    }

    pub fn push_function(&mut self, function: FunctionProto) -> FunctionRef {
        self.functions.push(Rc::new(function));
        FunctionRef((self.functions.len() - 1) as u32)
    }

    pub fn finish(self) -> Chunk {
        Chunk {
            name: self.name,
            data: self.data.into(),
            lines: self.lines.into(),
            constants: self.constants,
            functions: self.functions,
        }
    }
}

#[derive(Debug)]
pub struct Chunk {
    name: CompactString,
    data: Rc<[u8]>,
    lines: Rc<[(u32, u32)]>,
    constants: ConstantPool,
    functions: Vec<Rc<FunctionProto>>,
}

pub struct OpcodeIterator<'a> {
    chunk: &'a Chunk,
    index: usize,
}

impl<'a> std::iter::Iterator for OpcodeIterator<'a> {
    type Item = (usize, Opcode);

    fn next(&mut self) -> Option<Self::Item> {
        let (opcode, next) = self.chunk.decode_at(self.index).ok()??;
        let offset = self.index;
        self.index = next;
        Some((offset, opcode))
    }
}

impl Chunk {
    pub fn iter(&self) -> OpcodeIterator<'_> {
        OpcodeIterator {
            chunk: self,
            index: 0,
        }
    }

    pub fn decode_at(&self, index: usize) -> Result<Option<(Opcode, usize)>, DecodeError> {
        Opcode::decode_at(&self.data, index)
    }

    pub fn line_at(&self, offset: usize) -> Option<u32> {
        let index = self
            .lines
            .binary_search_by_key(&(offset as u32), |(start, _)| *start)
            .ok()?;
        Some(self.lines[index].1)
    }

    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    pub fn get_constant(&self, handle: ConstRef) -> Option<&Constant> {
        self.constants.get(handle)
    }

    pub fn get_string(&self, handle: ConstRef) -> Option<&CompactString> {
        self.constants.get_string(handle)
    }

    pub fn get_function(&self, handle: FunctionRef) -> Option<&Rc<FunctionProto>> {
        self.functions.get(handle.0 as usize)
    }

    pub fn disassemble(&self) -> String {
        const INDENT: &str = "  ";
        let max_line = self.lines.iter().map(|(_, line)| *line).max().unwrap_or(1);
        let num_digits = 4usize.max((max_line.checked_ilog10().unwrap_or(0) + 1) as usize);

        let mut buffer = String::new();
        writeln!(buffer, "Chunk <{}>:", self.name).expect(WRITE_FMT_MSG);
        let mut previous_line_number: Option<u32> = None;
        for (offset, opcode) in self.iter() {
            let line_number = self.line_at(offset).unwrap_or(0);
            write!(buffer, "{INDENT}{offset:04x}:").expect(WRITE_FMT_MSG);

            if previous_line_number == Some(line_number) {
                write!(buffer, "{:>width$}| ", " ", width = num_digits).expect(WRITE_FMT_MSG);
            } else {
                write!(buffer, "{:>width$}{line_number} ", "L", width = num_digits)
                    .expect(WRITE_FMT_MSG);
            }
            opcode.format(&mut buffer, self);
            buffer.push('\n');

            previous_line_number = Some(line_number);
        }
        buffer.push('\n');
        for function in self.functions.iter() {
            buffer.push_str(&function.chunk.disassemble());
        }
        buffer
    }
}

#[derive(Debug)]
struct LoopContext {
    scope_depth: u32,
    continue_target: Option<usize>,
    continue_patches: Vec<usize>,
    break_patches: Vec<usize>,
}

pub struct Compiler {
    chunk: IncompleteChunk,
    line: u32,
    scope_depth: u32,
    loops: Vec<LoopContext>,
}

impl Compiler {
    fn new(name: CompactString, line: u32) -> Self {
        Self {
            chunk: IncompleteChunk::new(name),
            line,
            scope_depth: 0,
            loops: Vec::new(),
        }
    }

    /// Compiles the top level program. Its entry is attributed to line 1, its
    /// exit to no line at all.
    pub fn compile_program(program: &Program) -> FunctionProto {
        let mut compiler = Compiler::new("PROGRAM".into(), 1);
        compiler.emit(Opcode::Enter);
        compiler.hoist_functions(program.iter());
        for stmt in program.iter() {
            compiler.compile_stmt(stmt);
        }
        compiler.line = 0;
        compiler.emit(Opcode::Halt);

        FunctionProto {
            name: None,
            parameters: Vec::new(),
            chunk: compiler.chunk.finish(),
            line: 1,
        }
    }

    fn compile_function(decl: &FunctionDecl) -> FunctionProto {
        let name = decl.name.clone().unwrap_or_else(|| "anonymous".into());
        let mut compiler = Compiler::new(name, decl.line);
        compiler.hoist_functions(decl.body.iter());
        for stmt in decl.body.iter() {
            compiler.compile_stmt(stmt);
        }
        compiler.emit_constant(Constant::Undefined);
        compiler.emit(Opcode::Return);

        FunctionProto {
            name: decl.name.clone(),
            parameters: decl.parameters.clone(),
            chunk: compiler.chunk.finish(),
            line: decl.line,
        }
    }

    fn emit(&mut self, opcode: Opcode) -> usize {
        self.chunk.emit(opcode, self.line)
    }

    fn emit_constant(&mut self, value: Constant) {
        let handle = self.chunk.constants.push_constant(value);
        self.emit(Opcode::Constant(handle));
    }

    fn emit_loop(&mut self, target: usize) {
        self.chunk.emit_loop(target, self.line);
    }

    fn name_constant(&mut self, name: &str) -> ConstRef {
        self.chunk.constants.push_str(name)
    }

    fn declare_function(&mut self, decl: &FunctionDecl) {
        let Some(ref name) = decl.name else {
            return;
        };
        self.line = decl.line;
        let function = self.chunk.push_function(Self::compile_function(decl));
        self.emit(Opcode::Closure(function));
        let name = self.name_constant(name);
        self.emit(Opcode::Declare {
            name,
            kind: BindingKind::Function,
        });
    }

    /// Function declarations are bound on entry to their enclosing scope.
    fn hoist_functions<'a>(&mut self, statements: impl Iterator<Item = &'a Statement>) {
        for stmt in statements {
            if let Statement::FunctionDecl(decl) = stmt {
                self.declare_function(decl);
            }
        }
    }

    fn pop_scopes_to(&mut self, depth: u32) {
        for _ in depth..self.scope_depth {
            self.emit(Opcode::PopScope);
        }
    }
}

// Statement compilation
impl Compiler {
    fn compile_stmt(&mut self, stmt: &Statement) {
        self.line = stmt.line();
        match stmt {
            Statement::VariableDecl(decl) => {
                match decl.initial {
                    Some(ref initial) => self.compile_expression(initial),
                    None => self.emit_constant(Constant::Undefined),
                }
                let name = self.name_constant(&decl.name);
                let kind = match decl.kind {
                    VariableKind::Let => BindingKind::Let,
                    VariableKind::Const => BindingKind::Const,
                    VariableKind::Var => BindingKind::Var,
                };
                self.emit(Opcode::Declare { name, kind });
            }
            // Hoisted when the enclosing scope was entered.
            Statement::FunctionDecl(_) => {}
            Statement::Expression(stmt) => {
                self.compile_expression(&stmt.expr);
                self.emit(Opcode::Pop);
            }
            Statement::Block(block) => {
                self.emit(Opcode::PushScope);
                self.scope_depth += 1;
                self.hoist_functions(block.statements.iter());
                for stmt in block.statements.iter() {
                    self.compile_stmt(stmt);
                }
                self.emit(Opcode::PopScope);
                self.scope_depth -= 1;
            }
            Statement::If(stmt) => {
                self.compile_expression(&stmt.condition);
                let skip_success = self.emit(Opcode::JumpIfFalse(InstructionOffset(0)));
                self.compile_body(&stmt.success);
                match stmt.failure {
                    Some(ref failure) => {
                        let skip_failure = self.emit(Opcode::Jump(InstructionOffset(0)));
                        self.chunk.patch_jump(skip_success);
                        self.compile_body(failure);
                        self.chunk.patch_jump(skip_failure);
                    }
                    None => self.chunk.patch_jump(skip_success),
                }
            }
            Statement::While(stmt) => {
                let header = stmt.line;
                let loop_start = self.chunk.len();
                self.compile_expression(&stmt.condition);
                let exit = self.emit(Opcode::JumpIfFalse(InstructionOffset(0)));
                self.loops.push(LoopContext {
                    scope_depth: self.scope_depth,
                    continue_target: Some(loop_start),
                    continue_patches: Vec::new(),
                    break_patches: Vec::new(),
                });
                self.compile_body(&stmt.body);
                self.line = header;
                self.emit_loop(loop_start);
                self.chunk.patch_jump(exit);
                self.finish_loop();
            }
            Statement::For(stmt) => {
                let header = stmt.line;
                self.emit(Opcode::PushScope);
                self.scope_depth += 1;
                if let Some(ref initializer) = stmt.initializer {
                    self.compile_stmt(initializer);
                }
                self.line = header;
                let loop_start = self.chunk.len();
                let exit = stmt.condition.as_ref().map(|condition| {
                    self.compile_expression(condition);
                    self.emit(Opcode::JumpIfFalse(InstructionOffset(0)))
                });
                self.loops.push(LoopContext {
                    scope_depth: self.scope_depth,
                    continue_target: None,
                    continue_patches: Vec::new(),
                    break_patches: Vec::new(),
                });
                self.compile_body(&stmt.body);
                self.line = header;
                let continues = self
                    .loops
                    .last_mut()
                    .map(|context| std::mem::take(&mut context.continue_patches))
                    .unwrap_or_default();
                for patch in continues {
                    self.chunk.patch_jump(patch);
                }
                if let Some(ref increment) = stmt.increment {
                    self.compile_expression(increment);
                    self.emit(Opcode::Pop);
                }
                self.emit_loop(loop_start);
                if let Some(exit) = exit {
                    self.chunk.patch_jump(exit);
                }
                self.finish_loop();
                self.emit(Opcode::PopScope);
                self.scope_depth -= 1;
            }
            Statement::Return(stmt) => {
                match stmt.value {
                    Some(ref value) => self.compile_expression(value),
                    None => self.emit_constant(Constant::Undefined),
                }
                self.emit(Opcode::Return);
            }
            Statement::Break { .. } => {
                let depth = self.loops.last().map(|context| context.scope_depth);
                if let Some(depth) = depth {
                    self.pop_scopes_to(depth);
                    let jump = self.emit(Opcode::Jump(InstructionOffset(0)));
                    if let Some(context) = self.loops.last_mut() {
                        context.break_patches.push(jump);
                    }
                }
            }
            Statement::Continue { .. } => {
                let context = self
                    .loops
                    .last()
                    .map(|context| (context.scope_depth, context.continue_target));
                if let Some((depth, target)) = context {
                    self.pop_scopes_to(depth);
                    match target {
                        Some(target) => self.emit_loop(target),
                        None => {
                            let jump = self.emit(Opcode::Jump(InstructionOffset(0)));
                            if let Some(context) = self.loops.last_mut() {
                                context.continue_patches.push(jump);
                            }
                        }
                    }
                }
            }
            Statement::Empty { .. } => {}
        }
    }

    /// Compiles the body of a control flow statement.
    fn compile_body(&mut self, stmt: &Statement) {
        match stmt {
            Statement::FunctionDecl(decl) => self.declare_function(decl),
            stmt => self.compile_stmt(stmt),
        }
    }

    fn finish_loop(&mut self) {
        if let Some(context) = self.loops.pop() {
            for patch in context.break_patches {
                self.chunk.patch_jump(patch);
            }
        }
    }
}

// Expression compilation
impl Compiler {
    fn compile_expression(&mut self, expr: &Expression) {
        self.compile_expression_node(expr, expr.get_root_ref())
    }

    fn compile_expression_node(&mut self, expr: &Expression, node: ExpressionNodeRef) {
        let current_node = expr
            .get_node(node)
            .expect("Node ref came from the tree so it must exist.");
        match current_node {
            ExpressionNode::Atom(atom) => self.compile_expression_atom(atom),
            ExpressionNode::Group { inner } => {
                self.compile_expression_node(expr, *inner);
            }
            ExpressionNode::Prefix { operator, rhs } => {
                self.compile_expression_node(expr, *rhs);
                match operator {
                    PrefixOperator::Bang => self.emit(Opcode::Not),
                    PrefixOperator::Minus => self.emit(Opcode::Negate),
                };
            }
            ExpressionNode::Infix { operator, lhs, rhs } => {
                self.compile_expression_node(expr, *lhs);
                self.compile_expression_node(expr, *rhs);
                match operator {
                    InfixOperator::Multiply => self.emit(Opcode::Multiply),
                    InfixOperator::Divide => self.emit(Opcode::Divide),
                    InfixOperator::Modulo => self.emit(Opcode::Modulo),
                    InfixOperator::Add => self.emit(Opcode::Add),
                    InfixOperator::Subtract => self.emit(Opcode::Subtract),
                    InfixOperator::LessThan => self.emit(Opcode::LessThan),
                    InfixOperator::LessThanEqual => self.emit(Opcode::LessThanEqual),
                    InfixOperator::GreaterThan => self.emit(Opcode::GreaterThan),
                    InfixOperator::GreaterThanEqual => self.emit(Opcode::GreaterThanEqual),
                    InfixOperator::EqualEqual => self.emit(Opcode::Equals),
                    InfixOperator::StrictEqual => self.emit(Opcode::StrictEquals),
                    InfixOperator::BangEqual => {
                        self.emit(Opcode::Equals);
                        self.emit(Opcode::Not)
                    }
                    InfixOperator::StrictNotEqual => {
                        self.emit(Opcode::StrictEquals);
                        self.emit(Opcode::Not)
                    }
                };
            }
            ExpressionNode::InfixShortCircuit { operator, lhs, rhs } => {
                self.compile_expression_node(expr, *lhs);
                let skip = match operator {
                    InfixShortCircuitOperator::And => {
                        self.emit(Opcode::JumpIfFalseOrPop(InstructionOffset(0)))
                    }
                    InfixShortCircuitOperator::Or => {
                        self.emit(Opcode::JumpIfTrueOrPop(InstructionOffset(0)))
                    }
                };
                self.compile_expression_node(expr, *rhs);
                self.chunk.patch_jump(skip);
            }
            ExpressionNode::Assignment { target, value } => match target {
                AssignmentTarget::Identifier(name) => {
                    self.compile_expression_node(expr, *value);
                    let name = self.name_constant(name);
                    self.emit(Opcode::Set(name));
                }
                AssignmentTarget::Property { object, name } => {
                    self.compile_expression_node(expr, *object);
                    self.compile_expression_node(expr, *value);
                    let name = self.name_constant(name);
                    self.emit(Opcode::SetProperty(name));
                }
                AssignmentTarget::Index { object, index } => {
                    self.compile_expression_node(expr, *object);
                    self.compile_expression_node(expr, *index);
                    self.compile_expression_node(expr, *value);
                    self.emit(Opcode::SetIndex);
                }
            },
            ExpressionNode::Call { callee, arguments } => {
                self.compile_expression_node(expr, *callee);
                for argument in arguments.iter() {
                    self.compile_expression_node(expr, *argument);
                }
                self.emit(Opcode::Call(arguments.len() as u32));
            }
            ExpressionNode::Get { object, name } => {
                self.compile_expression_node(expr, *object);
                let name = self.name_constant(name);
                self.emit(Opcode::GetProperty(name));
            }
            ExpressionNode::Index { object, index } => {
                self.compile_expression_node(expr, *object);
                self.compile_expression_node(expr, *index);
                self.emit(Opcode::GetIndex);
            }
            ExpressionNode::Array { elements } => {
                for element in elements.iter() {
                    self.compile_expression_node(expr, *element);
                }
                self.emit(Opcode::MakeArray(elements.len() as u32));
            }
            ExpressionNode::Object { entries } => {
                for (key, value) in entries.iter() {
                    let key = self.name_constant(key);
                    self.emit(Opcode::Constant(key));
                    self.compile_expression_node(expr, *value);
                }
                self.emit(Opcode::MakeObject(entries.len() as u32));
            }
            ExpressionNode::Function(decl) => {
                let function = self.chunk.push_function(Self::compile_function(decl));
                self.emit(Opcode::Closure(function));
            }
        }
    }

    fn compile_expression_atom(&mut self, atom: &ExpressionAtom) {
        match &atom.kind {
            ExpressionAtomKind::Number(value) => self.emit_constant(Constant::Number(*value)),
            ExpressionAtomKind::Bool(value) => self.emit_constant(Constant::Bool(*value)),
            ExpressionAtomKind::Null => self.emit_constant(Constant::Null),
            ExpressionAtomKind::Undefined => self.emit_constant(Constant::Undefined),
            ExpressionAtomKind::StringLiteral(value) => {
                self.emit_constant(Constant::String(value.clone()))
            }
            ExpressionAtomKind::Identifier(name) => {
                let name = self.name_constant(name);
                self.emit(Opcode::Get(name));
            }
        }
    }
}

/// Parses and compiles `source`, for the CLI's listing.
pub fn disassemble_source(source: &str) -> Result<String, crate::parser::ParserError> {
    let program = crate::parser::parse_program(source)?;
    Ok(Compiler::compile_program(&program).chunk.disassemble())
}
