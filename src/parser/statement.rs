use compact_str::CompactString;
use std::rc::Rc;

use super::expression::Expression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Let,
    Const,
    Var,
}

impl std::fmt::Display for VariableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VariableKind::Let => write!(f, "let"),
            VariableKind::Const => write!(f, "const"),
            VariableKind::Var => write!(f, "var"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub kind: VariableKind,
    pub name: CompactString,
    pub initial: Option<Expression>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Option<CompactString>,
    pub parameters: Vec<CompactString>,
    pub body: Vec<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expr: Expression,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub condition: Expression,
    pub success: Box<Statement>,
    pub failure: Option<Box<Statement>>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub condition: Expression,
    pub body: Box<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct ForStatement {
    pub initializer: Option<Box<Statement>>,
    pub condition: Option<Expression>,
    pub increment: Option<Expression>,
    pub body: Box<Statement>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub value: Option<Expression>,
    pub line: u32,
}

#[derive(Debug, Clone)]
pub enum Statement {
    // Declarations
    VariableDecl(VariableDecl),
    FunctionDecl(Rc<FunctionDecl>),
    // Non-declarations
    Expression(ExpressionStatement),
    Block(BlockStatement),
    If(IfStatement),
    While(WhileStatement),
    For(ForStatement),
    Return(ReturnStatement),
    Break { line: u32 },
    Continue { line: u32 },
    Empty { line: u32 },
}

impl Statement {
    pub fn line(&self) -> u32 {
        match self {
            Statement::VariableDecl(decl) => decl.line,
            Statement::FunctionDecl(decl) => decl.line,
            Statement::Expression(stmt) => stmt.line,
            Statement::Block(stmt) => stmt.line,
            Statement::If(stmt) => stmt.line,
            Statement::While(stmt) => stmt.line,
            Statement::For(stmt) => stmt.line,
            Statement::Return(stmt) => stmt.line,
            Statement::Break { line }
            | Statement::Continue { line }
            | Statement::Empty { line } => *line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Program {
    statements: Vec<Statement>,
}

impl Program {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self { statements }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Statement> {
        self.statements.iter()
    }

    pub fn get_statement(&self, index: usize) -> Option<&Statement> {
        self.statements.get(index)
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
