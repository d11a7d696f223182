use compact_str::CompactString;
use std::rc::Rc;

use crate::lexer::Span;
use crate::parser::statement::FunctionDecl;

use super::{InfixOperator, InfixShortCircuitOperator, PrefixOperator};

#[derive(Debug, Clone, PartialEq)]
pub enum ExpressionAtomKind {
    Number(f64),
    Bool(bool),
    Null,
    Undefined,
    Identifier(CompactString),
    StringLiteral(CompactString),
}

#[derive(Debug, Clone)]
pub struct ExpressionAtom {
    pub kind: ExpressionAtomKind,
    pub span: Span,
    pub line: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpressionNodeRef(pub u32);

/// The place written to by an assignment.
#[derive(Debug, Clone)]
pub enum AssignmentTarget {
    Identifier(CompactString),
    Property {
        object: ExpressionNodeRef,
        name: CompactString,
    },
    Index {
        object: ExpressionNodeRef,
        index: ExpressionNodeRef,
    },
}

#[derive(Debug, Clone)]
pub enum ExpressionNode {
    Atom(ExpressionAtom),
    Group {
        inner: ExpressionNodeRef,
    },
    Prefix {
        operator: PrefixOperator,
        rhs: ExpressionNodeRef,
    },
    Infix {
        operator: InfixOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    InfixShortCircuit {
        operator: InfixShortCircuitOperator,
        lhs: ExpressionNodeRef,
        rhs: ExpressionNodeRef,
    },
    Assignment {
        target: AssignmentTarget,
        value: ExpressionNodeRef,
    },
    Call {
        callee: ExpressionNodeRef,
        arguments: Vec<ExpressionNodeRef>,
    },
    Get {
        object: ExpressionNodeRef,
        name: CompactString,
    },
    Index {
        object: ExpressionNodeRef,
        index: ExpressionNodeRef,
    },
    Array {
        elements: Vec<ExpressionNodeRef>,
    },
    Object {
        entries: Vec<(CompactString, ExpressionNodeRef)>,
    },
    Function(Rc<FunctionDecl>),
}

impl ExpressionNode {
    /// Converts the node into an assignment target if it names a writable place.
    pub fn as_assignment_target(&self) -> Option<AssignmentTarget> {
        match self {
            ExpressionNode::Atom(ExpressionAtom {
                kind: ExpressionAtomKind::Identifier(name),
                ..
            }) => Some(AssignmentTarget::Identifier(name.clone())),
            ExpressionNode::Get { object, name } => Some(AssignmentTarget::Property {
                object: *object,
                name: name.clone(),
            }),
            ExpressionNode::Index { object, index } => Some(AssignmentTarget::Index {
                object: *object,
                index: *index,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IncompleteExpression {
    nodes: Vec<ExpressionNode>,
}

#[derive(Debug, Clone)]
pub struct Expression {
    nodes: Vec<ExpressionNode>,
    root: ExpressionNodeRef,
}

impl IncompleteExpression {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    pub fn push(&mut self, node: ExpressionNode) -> ExpressionNodeRef {
        self.nodes.push(node);
        ExpressionNodeRef(self.nodes.len() as u32 - 1)
    }

    pub fn get_node(&self, index: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(index.0 as usize)
    }

    pub fn finish(self, root: ExpressionNodeRef) -> Option<Expression> {
        if !(0..self.nodes.len()).contains(&(root.0 as usize)) {
            None
        } else {
            Some(Expression {
                nodes: self.nodes,
                root,
            })
        }
    }
}

impl Default for IncompleteExpression {
    fn default() -> Self {
        Self::new()
    }
}

impl Expression {
    pub fn get_root_ref(&self) -> ExpressionNodeRef {
        self.root
    }

    pub fn get_root(&self) -> &ExpressionNode {
        self.get_node(self.get_root_ref())
            .expect("The root exists within the tree.")
    }

    pub fn get_node(&self, node: ExpressionNodeRef) -> Option<&ExpressionNode> {
        self.nodes.get(node.0 as usize)
    }
}
