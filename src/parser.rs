// ABOUTME: Recursive-descent parser turning a token stream into a Program AST

use crate::ast::{AssignTarget, BinaryOp, Expr, IncDecOp, Position, Program, Stmt, UnaryOp};
use crate::error::ScriptError;
use crate::lexer::{Keyword, Lexer, NumberLiteral, Token, TokenKind};
use log::debug;

/// Parses a complete source file into a [`Program`].
pub fn parse(source: &str) -> Result<Program, ScriptError> {
    let tokens = Lexer::tokenize(source)?;
    Parser::new(tokens).parse_program()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

#[derive(Clone, Copy)]
enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, pos: 0 }
    }

    fn parse_program(mut self) -> Result<Program, ScriptError> {
        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.statement()?);
        }
        debug!("parsing done, {} top-level statement(s)", statements.len());
        Ok(Program { statements })
    }

    // ----- token stream helpers -----

    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn peek_pos(&self) -> Position {
        let t = self.peek();
        Position::new(t.line, t.column)
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ScriptError> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!(
                "expected {}, found '{}'",
                what,
                self.peek().lexeme
            )))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, ScriptError> {
        match self.peek().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error(format!(
                "expected identifier, found '{}'",
                self.peek().lexeme
            ))),
        }
    }

    fn error(&self, message: impl Into<String>) -> ScriptError {
        let t = self.peek();
        ScriptError::syntax(message, t.line, t.column)
    }

    // ----- statements -----

    fn statement(&mut self) -> Result<Stmt, ScriptError> {
        match &self.peek().kind {
            TokenKind::Keyword(Keyword::Let) => self.let_decl(),
            TokenKind::Keyword(Keyword::If) => self.if_stmt(),
            TokenKind::Keyword(Keyword::While) => self.while_stmt(),
            TokenKind::Keyword(Keyword::For) => self.for_stmt(),
            TokenKind::Keyword(Keyword::Break) => {
                let pos = self.peek_pos();
                self.advance();
                self.expect(TokenKind::Semicolon, "';'")?;
                Ok(Stmt::Break(pos))
            }
            TokenKind::Keyword(Keyword::Continue) => {
                let pos = self.peek_pos();
                self.advance();
                self.expect(TokenKind::Semicolon, "';'")?;
                Ok(Stmt::Continue(pos))
            }
            TokenKind::Keyword(Keyword::Def) => self.func_def(),
            TokenKind::Keyword(Keyword::Return) => self.return_stmt(),
            TokenKind::LBrace => {
                let pos = self.peek_pos();
                let statements = self.brace_block()?;
                Ok(Stmt::Block { statements, pos })
            }
            _ => self.assign_or_expr_stmt(),
        }
    }

    fn let_decl(&mut self) -> Result<Stmt, ScriptError> {
        let pos = self.peek_pos();
        self.advance();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::Assign, "'='")?;
        let value = self.expr()?;
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Let { name, value, pos })
    }

    fn if_stmt(&mut self) -> Result<Stmt, ScriptError> {
        let pos = self.peek_pos();
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        let then_branch = self.block()?;
        let else_branch = if self.check(&TokenKind::Keyword(Keyword::Else)) {
            self.advance();
            Some(self.block()?)
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_branch,
            else_branch,
            pos,
        })
    }

    fn while_stmt(&mut self) -> Result<Stmt, ScriptError> {
        let pos = self.peek_pos();
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;
        let cond = self.expr()?;
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.block()?;
        Ok(Stmt::While { cond, body, pos })
    }

    fn for_stmt(&mut self) -> Result<Stmt, ScriptError> {
        let pos = self.peek_pos();
        self.advance();
        self.expect(TokenKind::LParen, "'('")?;

        let init = if self.check(&TokenKind::Semicolon) {
            self.advance();
            None
        } else {
            let stmt = if self.check(&TokenKind::Keyword(Keyword::Let)) {
                self.let_decl()?
            } else {
                self.assign_or_expr_stmt()?
            };
            Some(Box::new(stmt))
        };

        let cond = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::Semicolon, "';'")?;

        let increment = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(Box::new(self.assign_or_expr_inner(false)?))
        };
        self.expect(TokenKind::RParen, "')'")?;

        let body = self.block()?;
        Ok(Stmt::For {
            init,
            cond,
            increment,
            body,
            pos,
        })
    }

    fn func_def(&mut self) -> Result<Stmt, ScriptError> {
        let pos = self.peek_pos();
        self.advance();
        let name = self.expect_identifier()?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            params.push(self.expect_identifier()?);
            while self.check(&TokenKind::Comma) {
                self.advance();
                params.push(self.expect_identifier()?);
            }
        }
        self.expect(TokenKind::RParen, "')'")?;
        let body = self.body_statements()?;
        Ok(Stmt::FunctionDef {
            name,
            params,
            body,
            pos,
        })
    }

    fn return_stmt(&mut self) -> Result<Stmt, ScriptError> {
        let pos = self.peek_pos();
        self.advance();
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expr()?)
        };
        self.expect(TokenKind::Semicolon, "';'")?;
        Ok(Stmt::Return { value, pos })
    }

    /// `block := '{' statement* '}' | statement` — returns the boxed body as
    /// a `Stmt::Block` either way, so callers never special-case arity.
    fn block(&mut self) -> Result<Box<Stmt>, ScriptError> {
        let pos = self.peek_pos();
        let statements = self.body_statements()?;
        Ok(Box::new(Stmt::Block { statements, pos }))
    }

    fn body_statements(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        if self.check(&TokenKind::LBrace) {
            self.brace_block()
        } else {
            Ok(vec![self.statement()?])
        }
    }

    fn brace_block(&mut self) -> Result<Vec<Stmt>, ScriptError> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            statements.push(self.statement()?);
        }
        self.expect(TokenKind::RBrace, "'}'")?;
        Ok(statements)
    }

    /// `IDENT ('[' expr ']')? ('=' | '+=' | ...) expr ';' | expr ';'`
    ///
    /// Looks one identifier ahead to decide between the two alternatives,
    /// backtracking to the checkpoint when the assignment-operator test
    /// fails (the only backtrack the grammar requires).
    fn assign_or_expr_stmt(&mut self) -> Result<Stmt, ScriptError> {
        let stmt = self.assign_or_expr_inner(true)?;
        Ok(stmt)
    }

    fn assign_or_expr_inner(&mut self, consume_semicolon: bool) -> Result<Stmt, ScriptError> {
        if let TokenKind::Identifier(name) = self.peek().kind.clone() {
            let checkpoint = self.pos;
            let pos = self.peek_pos();
            self.advance();

            let index = if self.check(&TokenKind::LBracket) {
                self.advance();
                let idx = self.expr()?;
                self.expect(TokenKind::RBracket, "']'")?;
                Some(idx)
            } else {
                None
            };

            if let Some(op) = self.match_assign_op() {
                let rhs = self.expr()?;
                if consume_semicolon {
                    self.expect(TokenKind::Semicolon, "';'")?;
                }

                let target = match &index {
                    Some(idx) => AssignTarget::Index(name.clone(), idx.clone()),
                    None => AssignTarget::Variable(name.clone()),
                };
                let value = self.desugar_assign(op, &name, &index, rhs, pos);
                return Ok(Stmt::Assign { target, value, pos });
            }

            // Not an assignment after all — rewind and parse as an expression.
            self.pos = checkpoint;
        }

        let expr = self.expr()?;
        let pos = expr.position();
        if consume_semicolon {
            self.expect(TokenKind::Semicolon, "';'")?;
        }
        Ok(Stmt::ExprStmt { expr, pos })
    }

    fn desugar_assign(
        &self,
        op: AssignOp,
        name: &str,
        index: &Option<Expr>,
        rhs: Expr,
        pos: Position,
    ) -> Expr {
        let binop = match op {
            AssignOp::Assign => return rhs,
            AssignOp::Add => BinaryOp::Add,
            AssignOp::Sub => BinaryOp::Sub,
            AssignOp::Mul => BinaryOp::Mul,
            AssignOp::Div => BinaryOp::Div,
            AssignOp::Mod => BinaryOp::Mod,
        };
        let lhs = match index {
            Some(idx) => Expr::Index(
                Box::new(Expr::Variable(name.to_string(), pos)),
                Box::new(idx.clone()),
                pos,
            ),
            None => Expr::Variable(name.to_string(), pos),
        };
        Expr::Binary(binop, Box::new(lhs), Box::new(rhs), pos)
    }

    fn match_assign_op(&mut self) -> Option<AssignOp> {
        let op = match self.peek().kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::PlusEq => AssignOp::Add,
            TokenKind::MinusEq => AssignOp::Sub,
            TokenKind::StarEq => AssignOp::Mul,
            TokenKind::SlashEq => AssignOp::Div,
            TokenKind::PercentEq => AssignOp::Mod,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    // ----- expressions (precedence low to high) -----

    fn expr(&mut self) -> Result<Expr, ScriptError> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.and_expr()?;
        while self.check(&TokenKind::OrOr) {
            let pos = self.peek_pos();
            self.advance();
            let right = self.and_expr()?;
            left = Expr::Binary(BinaryOp::Or, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.equality()?;
        while self.check(&TokenKind::AndAnd) {
            let pos = self.peek_pos();
            self.advance();
            let right = self.equality()?;
            left = Expr::Binary(BinaryOp::And, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            let pos = self.peek_pos();
            self.advance();
            let right = self.comparison()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            let pos = self.peek_pos();
            self.advance();
            let right = self.additive()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let pos = self.peek_pos();
            self.advance();
            let right = self.multiplicative()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expr, ScriptError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let pos = self.peek_pos();
            self.advance();
            let right = self.unary()?;
            left = Expr::Binary(op, Box::new(left), Box::new(right), pos);
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr, ScriptError> {
        let pos = self.peek_pos();
        match self.peek().kind {
            TokenKind::Bang => {
                self.advance();
                let operand = self.unary()?;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(operand), pos))
            }
            TokenKind::Minus => {
                self.advance();
                let operand = self.unary()?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand), pos))
            }
            TokenKind::PlusPlus => {
                self.advance();
                let operand = self.unary()?;
                Ok(Expr::PreIncDec(IncDecOp::Inc, Box::new(operand), pos))
            }
            TokenKind::MinusMinus => {
                self.advance();
                let operand = self.unary()?;
                Ok(Expr::PreIncDec(IncDecOp::Dec, Box::new(operand), pos))
            }
            _ => self.postfix(),
        }
    }

    fn postfix(&mut self) -> Result<Expr, ScriptError> {
        let mut expr = self.primary()?;
        loop {
            match self.peek().kind {
                TokenKind::PlusPlus => {
                    let pos = self.peek_pos();
                    self.advance();
                    expr = Expr::PostIncDec(IncDecOp::Inc, Box::new(expr), pos);
                }
                TokenKind::MinusMinus => {
                    let pos = self.peek_pos();
                    self.advance();
                    expr = Expr::PostIncDec(IncDecOp::Dec, Box::new(expr), pos);
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expr, ScriptError> {
        let pos = self.peek_pos();
        match self.peek().kind.clone() {
            TokenKind::Number(NumberLiteral::Int(i)) => {
                self.advance();
                Ok(Expr::Int(i, pos))
            }
            TokenKind::Number(NumberLiteral::Float(f)) => {
                self.advance();
                Ok(Expr::Float(f, pos))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::Str(s, pos))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Expr::Bool(true, pos))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Expr::Bool(false, pos))
            }
            TokenKind::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    items.push(self.expr()?);
                    while self.check(&TokenKind::Comma) {
                        self.advance();
                        items.push(self.expr()?);
                    }
                }
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(Expr::Array(items, pos))
            }
            TokenKind::Identifier(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        args.push(self.expr()?);
                        while self.check(&TokenKind::Comma) {
                            self.advance();
                            args.push(self.expr()?);
                        }
                    }
                    self.expect(TokenKind::RParen, "')'")?;
                    let mut call = Expr::Call(name, args, pos);
                    if self.check(&TokenKind::LBracket) {
                        self.advance();
                        let idx = self.expr()?;
                        self.expect(TokenKind::RBracket, "']'")?;
                        call = Expr::Index(Box::new(call), Box::new(idx), pos);
                    }
                    Ok(call)
                } else if self.check(&TokenKind::LBracket) {
                    self.advance();
                    let idx = self.expr()?;
                    self.expect(TokenKind::RBracket, "']'")?;
                    Ok(Expr::Index(
                        Box::new(Expr::Variable(name, pos)),
                        Box::new(idx),
                        pos,
                    ))
                } else {
                    Ok(Expr::Variable(name, pos))
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.expr()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            _ => Err(self.error(format!("expected expression, found '{}'", self.peek().lexeme))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_let_and_print_expression_statement() {
        let program = parse("let x = 2; print(x);").unwrap();
        assert_eq!(program.statements.len(), 2);
        assert!(matches!(program.statements[0], Stmt::Let { .. }));
        assert!(matches!(program.statements[1], Stmt::ExprStmt { .. }));
    }

    #[test]
    fn left_associativity_of_additive_ops() {
        let program = parse("1 - 2 - 3;").unwrap();
        match &program.statements[0] {
            Stmt::ExprStmt { expr, .. } => match expr {
                Expr::Binary(BinaryOp::Sub, left, _, _) => {
                    assert!(matches!(**left, Expr::Binary(BinaryOp::Sub, _, _, _)));
                }
                other => panic!("unexpected expr {:?}", other),
            },
            other => panic!("unexpected stmt {:?}", other),
        }
    }

    #[test]
    fn compound_assignment_desugars_to_binary_op() {
        let program = parse("a += 1;").unwrap();
        match &program.statements[0] {
            Stmt::Assign { value, .. } => {
                assert!(matches!(value, Expr::Binary(BinaryOp::Add, _, _, _)));
            }
            other => panic!("unexpected stmt {:?}", other),
        }
    }

    #[test]
    fn index_assignment_parses() {
        let program = parse("a[0] = 1;").unwrap();
        match &program.statements[0] {
            Stmt::Assign {
                target: AssignTarget::Index(name, _),
                ..
            } => assert_eq!(name, "a"),
            other => panic!("unexpected stmt {:?}", other),
        }
    }

    #[test]
    fn for_loop_with_assignment_increment() {
        let program =
            parse("for (let i = 0; i < 5; i = i + 1) { print(i); }").unwrap();
        match &program.statements[0] {
            Stmt::For { increment, .. } => assert!(increment.is_some()),
            other => panic!("unexpected stmt {:?}", other),
        }
    }

    #[test]
    fn single_statement_block_bodies_allowed() {
        let program = parse("if (true) print(1); else print(2);").unwrap();
        match &program.statements[0] {
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                assert!(matches!(**then_branch, Stmt::Block { .. }));
                assert!(else_branch.is_some());
            }
            other => panic!("unexpected stmt {:?}", other),
        }
    }

    #[test]
    fn function_definition_with_params() {
        let program = parse("def add(a, b) { return a + b; }").unwrap();
        match &program.statements[0] {
            Stmt::FunctionDef { name, params, .. } => {
                assert_eq!(name, "add");
                assert_eq!(params, &vec!["a".to_string(), "b".to_string()]);
            }
            other => panic!("unexpected stmt {:?}", other),
        }
    }

    #[test]
    fn array_literal_and_index() {
        let program = parse("let a = [1, 2, 3]; a[1];").unwrap();
        assert!(matches!(program.statements[0], Stmt::Let { .. }));
        match &program.statements[1] {
            Stmt::ExprStmt {
                expr: Expr::Index(..),
                ..
            } => {}
            other => panic!("unexpected stmt {:?}", other),
        }
    }

    #[test]
    fn missing_semicolon_is_parse_error() {
        let err = parse("let x = 1").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { .. }));
    }

    #[test]
    fn prefix_and_postfix_incdec() {
        let program = parse("++x; y--;").unwrap();
        match &program.statements[0] {
            Stmt::ExprStmt {
                expr: Expr::PreIncDec(IncDecOp::Inc, _, _),
                ..
            } => {}
            other => panic!("unexpected stmt {:?}", other),
        }
        match &program.statements[1] {
            Stmt::ExprStmt {
                expr: Expr::PostIncDec(IncDecOp::Dec, _, _),
                ..
            } => {}
            other => panic!("unexpected stmt {:?}", other),
        }
    }
}
