mod error;
pub mod expression;
pub mod statement;

use crate::lexer::{decode_string_literal, Lexer, Token, TokenKind};
pub use error::{ParserError, ParserErrorKind};
use compact_str::CompactString;
use expression::{
    Expression, ExpressionAtom, ExpressionAtomKind, ExpressionNode, ExpressionNodeRef,
    IncompleteExpression, InfixAssignmentOperator, InfixOperator, InfixShortCircuitOperator,
    PostfixOperator, PrefixOperator,
};
use statement::{
    BlockStatement, ExpressionStatement, ForStatement, FunctionDecl, IfStatement, Program,
    ReturnStatement, Statement, VariableDecl, VariableKind, WhileStatement,
};
use std::rc::Rc;

pub struct Parser<'src> {
    lexer: Lexer<'src>,
    lookahead: Option<Result<Token, ParserError>>,
    previous_line: u32,
    loop_depth: u32,
    function_depth: u32,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Lexer::new(source),
            lookahead: None,
            previous_line: 1,
            loop_depth: 0,
            function_depth: 0,
        }
    }

    fn peek(&mut self) -> Result<Token, ParserError> {
        match self.lookahead {
            Some(ref token_or_error) => token_or_error.clone(),
            None => {
                let next_token = self.lexer.next_token().map_err(ParserError::from);
                self.lookahead = Some(next_token.clone());
                next_token
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, ParserError> {
        let token = match self.lookahead.take() {
            Some(token_or_error) => token_or_error,
            None => self.lexer.next_token().map_err(ParserError::from),
        }?;
        self.previous_line = token.line;
        Ok(token)
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, ParserError> {
        let next_token = self.next_token()?;
        if next_token.kind != expected {
            Err(Self::unexpected(next_token, expected))
        } else {
            Ok(next_token)
        }
    }

    fn eat_if(&mut self, next: TokenKind) -> Result<Option<Token>, ParserError> {
        let next_token = self.peek()?;
        if next_token.kind != next {
            Ok(None)
        } else {
            let _ = self.next_token()?;
            Ok(Some(next_token))
        }
    }

    fn expect_identifier(&mut self) -> Result<CompactString, ParserError> {
        let token = self.expect(TokenKind::Ident)?;
        Ok(self.lexeme(&token).into())
    }

    fn lexeme(&self, token: &Token) -> &'src str {
        self.lexer
            .get_lexeme(&token.span)
            .expect("Lexed tokens have a valid span.")
    }

    fn unexpected(token: Token, expected: TokenKind) -> ParserError {
        let kind = match token.kind {
            TokenKind::Eof => ParserErrorKind::UnexpectedEof,
            actual => ParserErrorKind::UnexpectedToken { actual, expected },
        };
        ParserError {
            kind,
            span: token.span,
            line: token.line,
        }
    }

    /// Ends a statement at `;`, or implicitly before `}`, the end of input or a line break.
    fn end_statement(&mut self) -> Result<(), ParserError> {
        let next = self.peek()?;
        match next.kind {
            TokenKind::Semicolon => {
                let _ = self.next_token()?;
                Ok(())
            }
            TokenKind::RightBrace | TokenKind::Eof => Ok(()),
            _ if next.line > self.previous_line => Ok(()),
            _ => Err(Self::unexpected(next, TokenKind::Semicolon)),
        }
    }
}

// Pratt parser for expressions
impl<'src> Parser<'src> {
    pub fn parse_expression(&mut self) -> Result<Expression, ParserError> {
        let mut tree = IncompleteExpression::new();
        let root = self.parse_expression_pratt(0, &mut tree)?;

        Ok(tree
            .finish(root)
            .expect("Root was obtained from the tree itself so it must be valid."))
    }

    fn push_atom(
        tree: &mut IncompleteExpression,
        kind: ExpressionAtomKind,
        token: &Token,
    ) -> ExpressionNodeRef {
        tree.push(ExpressionNode::Atom(ExpressionAtom {
            kind,
            span: token.span,
            line: token.line,
        }))
    }

    fn expect_left_expression(
        &mut self,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let token = self.next_token()?;
        let lexeme = self.lexeme(&token);

        let node = match token.kind {
            TokenKind::Eof => {
                return Err(ParserError {
                    kind: ParserErrorKind::UnexpectedEof,
                    span: token.span,
                    line: token.line,
                });
            }
            TokenKind::NumericLiteral => {
                let value = lexeme
                    .parse()
                    .expect("Numeric literal tokens are valid `f64`.");
                Self::push_atom(tree, ExpressionAtomKind::Number(value), &token)
            }
            TokenKind::Ident => {
                Self::push_atom(tree, ExpressionAtomKind::Identifier(lexeme.into()), &token)
            }
            TokenKind::StringLiteral => {
                let value = decode_string_literal(lexeme);
                Self::push_atom(tree, ExpressionAtomKind::StringLiteral(value.into()), &token)
            }
            TokenKind::KeywordNull => Self::push_atom(tree, ExpressionAtomKind::Null, &token),
            TokenKind::KeywordUndefined => {
                Self::push_atom(tree, ExpressionAtomKind::Undefined, &token)
            }
            TokenKind::KeywordTrue => Self::push_atom(tree, ExpressionAtomKind::Bool(true), &token),
            TokenKind::KeywordFalse => {
                Self::push_atom(tree, ExpressionAtomKind::Bool(false), &token)
            }
            // Unary operators
            kind if PrefixOperator::from_token(kind).is_some() => {
                let operator =
                    PrefixOperator::from_token(kind).expect("Just checked it is a prefix.");
                let rbp = operator.get_binding_power();
                let rhs = self.parse_expression_pratt(rbp, tree)?;
                tree.push(ExpressionNode::Prefix { operator, rhs })
            }
            // Bracketed expression
            TokenKind::LeftParenthesis => {
                let inner = self.parse_expression_pratt(0, tree)?;
                self.expect(TokenKind::RightParenthesis)?;
                tree.push(ExpressionNode::Group { inner })
            }
            TokenKind::LeftBracket => {
                let elements = self.parse_arguments(tree, TokenKind::RightBracket)?;
                tree.push(ExpressionNode::Array { elements })
            }
            TokenKind::LeftBrace => {
                let entries = self.parse_object_entries(tree)?;
                tree.push(ExpressionNode::Object { entries })
            }
            TokenKind::KeywordFunction => {
                let name = match self.peek()?.kind {
                    TokenKind::Ident => Some(self.expect_identifier()?),
                    _ => None,
                };
                let function = self.parse_function_rest(name, token.line)?;
                tree.push(ExpressionNode::Function(function))
            }
            kind => {
                return Err(ParserError {
                    kind: ParserErrorKind::NonExpression(kind),
                    span: token.span,
                    line: token.line,
                })
            }
        };
        Ok(node)
    }

    /// Parses comma separated expressions up to and including `terminator`.
    fn parse_arguments(
        &mut self,
        tree: &mut IncompleteExpression,
        terminator: TokenKind,
    ) -> Result<Vec<ExpressionNodeRef>, ParserError> {
        let mut arguments = Vec::new();
        loop {
            if self.eat_if(terminator)?.is_some() {
                break;
            }
            arguments.push(self.parse_expression_pratt(0, tree)?);
            if self.eat_if(TokenKind::Comma)?.is_none() {
                self.expect(terminator)?;
                break;
            }
        }
        Ok(arguments)
    }

    fn parse_object_entries(
        &mut self,
        tree: &mut IncompleteExpression,
    ) -> Result<Vec<(CompactString, ExpressionNodeRef)>, ParserError> {
        let mut entries = Vec::new();
        loop {
            if self.eat_if(TokenKind::RightBrace)?.is_some() {
                break;
            }
            let key_token = self.next_token()?;
            let key: CompactString = match key_token.kind {
                TokenKind::Ident | TokenKind::NumericLiteral => self.lexeme(&key_token).into(),
                TokenKind::StringLiteral => decode_string_literal(self.lexeme(&key_token)).into(),
                kind => {
                    return Err(ParserError {
                        kind: ParserErrorKind::InvalidPropertyName(kind),
                        span: key_token.span,
                        line: key_token.line,
                    })
                }
            };
            let value = if self.eat_if(TokenKind::Colon)?.is_some() {
                self.parse_expression_pratt(0, tree)?
            } else if key_token.kind == TokenKind::Ident {
                // Shorthand `{ name }`
                Self::push_atom(tree, ExpressionAtomKind::Identifier(key.clone()), &key_token)
            } else {
                let next = self.next_token()?;
                return Err(Self::unexpected(next, TokenKind::Colon));
            };
            entries.push((key, value));
            if self.eat_if(TokenKind::Comma)?.is_none() {
                self.expect(TokenKind::RightBrace)?;
                break;
            }
        }
        Ok(entries)
    }

    fn parse_postfix(
        &mut self,
        operator: PostfixOperator,
        lhs: ExpressionNodeRef,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let node = match operator {
            PostfixOperator::Call => {
                let arguments = self.parse_arguments(tree, TokenKind::RightParenthesis)?;
                ExpressionNode::Call {
                    callee: lhs,
                    arguments,
                }
            }
            PostfixOperator::Get => {
                let token = self.next_token()?;
                // Keywords are valid property names.
                let is_name = token.kind == TokenKind::Ident
                    || crate::lexer::KEYWORD_HASHMAP.contains_key(self.lexeme(&token));
                if !is_name {
                    return Err(ParserError {
                        kind: ParserErrorKind::InvalidPropertyName(token.kind),
                        span: token.span,
                        line: token.line,
                    });
                }
                ExpressionNode::Get {
                    object: lhs,
                    name: self.lexeme(&token).into(),
                }
            }
            PostfixOperator::Index => {
                let index = self.parse_expression_pratt(0, tree)?;
                self.expect(TokenKind::RightBracket)?;
                ExpressionNode::Index { object: lhs, index }
            }
        };
        Ok(tree.push(node))
    }

    fn parse_expression_pratt(
        &mut self,
        min_bp: u8,
        tree: &mut IncompleteExpression,
    ) -> Result<ExpressionNodeRef, ParserError> {
        let mut lhs = self.expect_left_expression(tree)?;

        loop {
            let token = self.peek()?;

            if let Some(operator) = PostfixOperator::from_token(token.kind) {
                let lbp = operator.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                let _ = self.next_token()?;
                lhs = self.parse_postfix(operator, lhs, tree)?;
                continue;
            }

            if let Some(operator) = InfixOperator::from_token(token.kind) {
                let (lbp, rbp) = operator.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                let _ = self.next_token()?;
                let rhs = self.parse_expression_pratt(rbp, tree)?;
                lhs = tree.push(ExpressionNode::Infix { operator, lhs, rhs });
                continue;
            }

            if let Some(operator) = InfixShortCircuitOperator::from_token(token.kind) {
                let (lbp, rbp) = operator.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                let _ = self.next_token()?;
                let rhs = self.parse_expression_pratt(rbp, tree)?;
                lhs = tree.push(ExpressionNode::InfixShortCircuit { operator, lhs, rhs });
                continue;
            }

            if token.kind == TokenKind::Equal {
                let (lbp, rbp) = InfixAssignmentOperator::Assign.get_binding_power();
                if lbp < min_bp {
                    break;
                }
                let _ = self.next_token()?;
                let target = tree
                    .get_node(lhs)
                    .and_then(ExpressionNode::as_assignment_target)
                    .ok_or(ParserError {
                        kind: ParserErrorKind::InvalidLValue,
                        span: token.span,
                        line: token.line,
                    })?;
                let value = self.parse_expression_pratt(rbp, tree)?;
                lhs = tree.push(ExpressionNode::Assignment { target, value });
                continue;
            }

            break;
        }
        Ok(lhs)
    }
}

// Parse program/statements
impl<'src> Parser<'src> {
    pub fn parse(&mut self) -> Result<Program, ParserError> {
        let mut statements = Vec::new();

        while self.peek()?.kind != TokenKind::Eof {
            statements.push(self.parse_statement()?);
        }

        Ok(Program::new(statements))
    }

    fn parse_statement(&mut self) -> Result<Statement, ParserError> {
        let first = self.peek()?;
        let line = first.line;
        match first.kind {
            TokenKind::KeywordLet => self.parse_variable_decl(VariableKind::Let, true),
            TokenKind::KeywordConst => self.parse_variable_decl(VariableKind::Const, true),
            TokenKind::KeywordVar => self.parse_variable_decl(VariableKind::Var, true),
            TokenKind::KeywordFunction => {
                let _ = self.next_token()?;
                let name = self.expect_identifier()?;
                let function = self.parse_function_rest(Some(name), line)?;
                Ok(Statement::FunctionDecl(function))
            }
            TokenKind::LeftBrace => {
                let statements = self.parse_block()?;
                Ok(Statement::Block(BlockStatement { statements, line }))
            }
            TokenKind::KeywordIf => self.parse_if(),
            TokenKind::KeywordWhile => self.parse_while(),
            TokenKind::KeywordFor => self.parse_for(),
            TokenKind::KeywordReturn => {
                let token = self.next_token()?;
                if self.function_depth == 0 {
                    return Err(ParserError {
                        kind: ParserErrorKind::IllegalReturn,
                        span: token.span,
                        line,
                    });
                }
                let next = self.peek()?;
                let has_value = !matches!(
                    next.kind,
                    TokenKind::Semicolon | TokenKind::RightBrace | TokenKind::Eof
                ) && next.line == line;
                let value = if has_value {
                    Some(self.parse_expression()?)
                } else {
                    None
                };
                self.end_statement()?;
                Ok(Statement::Return(ReturnStatement { value, line }))
            }
            TokenKind::KeywordBreak | TokenKind::KeywordContinue => {
                let token = self.next_token()?;
                if self.loop_depth == 0 {
                    let kind = match token.kind {
                        TokenKind::KeywordBreak => ParserErrorKind::IllegalBreak,
                        _ => ParserErrorKind::IllegalContinue,
                    };
                    return Err(ParserError {
                        kind,
                        span: token.span,
                        line,
                    });
                }
                self.end_statement()?;
                match token.kind {
                    TokenKind::KeywordBreak => Ok(Statement::Break { line }),
                    _ => Ok(Statement::Continue { line }),
                }
            }
            TokenKind::Semicolon => {
                let _ = self.next_token()?;
                Ok(Statement::Empty { line })
            }
            _ => {
                let expr = self.parse_expression()?;
                self.end_statement()?;
                Ok(Statement::Expression(ExpressionStatement { expr, line }))
            }
        }
    }

    fn parse_variable_decl(
        &mut self,
        kind: VariableKind,
        terminated: bool,
    ) -> Result<Statement, ParserError> {
        let keyword = self.next_token()?;
        let name = self.expect_identifier()?;

        let initial = match self.eat_if(TokenKind::Equal)? {
            Some(_) => Some(self.parse_expression()?),
            None => None,
        };

        if kind == VariableKind::Const && initial.is_none() {
            return Err(ParserError {
                kind: ParserErrorKind::MissingInitializer,
                span: keyword.span,
                line: keyword.line,
            });
        }

        if terminated {
            self.end_statement()?;
        }

        Ok(Statement::VariableDecl(VariableDecl {
            kind,
            name,
            initial,
            line: keyword.line,
        }))
    }

    fn parse_block(&mut self) -> Result<Vec<Statement>, ParserError> {
        self.expect(TokenKind::LeftBrace)?;
        let mut statements = Vec::new();
        loop {
            let next = self.peek()?;
            match next.kind {
                TokenKind::RightBrace => {
                    let _ = self.next_token()?;
                    break;
                }
                TokenKind::Eof => return Err(Self::unexpected(next, TokenKind::RightBrace)),
                _ => statements.push(self.parse_statement()?),
            }
        }
        Ok(statements)
    }

    /// Parses the parameter list and body following `function name?`.
    fn parse_function_rest(
        &mut self,
        name: Option<CompactString>,
        line: u32,
    ) -> Result<Rc<FunctionDecl>, ParserError> {
        self.expect(TokenKind::LeftParenthesis)?;
        let mut parameters = Vec::new();
        loop {
            if self.eat_if(TokenKind::RightParenthesis)?.is_some() {
                break;
            }
            parameters.push(self.expect_identifier()?);
            if self.eat_if(TokenKind::Comma)?.is_none() {
                self.expect(TokenKind::RightParenthesis)?;
                break;
            }
        }

        let enclosing_loops = std::mem::take(&mut self.loop_depth);
        self.function_depth += 1;
        let body = self.parse_block();
        self.function_depth -= 1;
        self.loop_depth = enclosing_loops;

        Ok(Rc::new(FunctionDecl {
            name,
            parameters,
            body: body?,
            line,
        }))
    }

    fn parse_if(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordIf)?;
        self.expect(TokenKind::LeftParenthesis)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParenthesis)?;
        let success = Box::new(self.parse_statement()?);
        let failure = match self.eat_if(TokenKind::KeywordElse)? {
            Some(_) => Some(Box::new(self.parse_statement()?)),
            None => None,
        };
        Ok(Statement::If(IfStatement {
            condition,
            success,
            failure,
            line: keyword.line,
        }))
    }

    fn parse_loop_body(&mut self) -> Result<Box<Statement>, ParserError> {
        self.loop_depth += 1;
        let body = self.parse_statement();
        self.loop_depth -= 1;
        Ok(Box::new(body?))
    }

    fn parse_while(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordWhile)?;
        self.expect(TokenKind::LeftParenthesis)?;
        let condition = self.parse_expression()?;
        self.expect(TokenKind::RightParenthesis)?;
        let body = self.parse_loop_body()?;
        Ok(Statement::While(WhileStatement {
            condition,
            body,
            line: keyword.line,
        }))
    }

    fn parse_for(&mut self) -> Result<Statement, ParserError> {
        let keyword = self.expect(TokenKind::KeywordFor)?;
        self.expect(TokenKind::LeftParenthesis)?;

        let next = self.peek()?;
        let initializer = match next.kind {
            TokenKind::Semicolon => None,
            TokenKind::KeywordLet => Some(self.parse_variable_decl(VariableKind::Let, false)?),
            TokenKind::KeywordConst => {
                Some(self.parse_variable_decl(VariableKind::Const, false)?)
            }
            TokenKind::KeywordVar => Some(self.parse_variable_decl(VariableKind::Var, false)?),
            _ => Some(Statement::Expression(ExpressionStatement {
                expr: self.parse_expression()?,
                line: next.line,
            })),
        };
        self.expect(TokenKind::Semicolon)?;

        let condition = match self.peek()?.kind {
            TokenKind::Semicolon => None,
            _ => Some(self.parse_expression()?),
        };
        self.expect(TokenKind::Semicolon)?;

        let increment = match self.peek()?.kind {
            TokenKind::RightParenthesis => None,
            _ => Some(self.parse_expression()?),
        };
        self.expect(TokenKind::RightParenthesis)?;

        let body = self.parse_loop_body()?;
        Ok(Statement::For(ForStatement {
            initializer: initializer.map(Box::new),
            condition,
            increment,
            body,
            line: keyword.line,
        }))
    }
}

/// Parses a whole source text.
pub fn parse_program(source: &str) -> Result<Program, ParserError> {
    Parser::new(source).parse()
}
