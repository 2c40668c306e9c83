//! Statement parsing (§4.2 "Statement parsing"): dispatches on the leading
//! token, recursive descent all the way down.

use super::{PResult, Parser};
use crate::ast::{NodeId, NodeKind};
use crate::lexer::{Keyword, Operator, TokenKind};

impl Parser {
    pub(super) fn parse_statement(&mut self) -> PResult<NodeId> {
        if self.eat_op(Operator::Semicolon) {
            let span = self.peek().location;
            return Ok(self.push(NodeKind::EmptyStmt, span));
        }

        match &self.peek().kind {
            TokenKind::Operator(Operator::LBrace) => self.parse_block(),
            TokenKind::Keyword(Keyword::If) => self.parse_if(),
            TokenKind::Keyword(Keyword::While) => self.parse_while(),
            TokenKind::Keyword(Keyword::For) => self.parse_for(),
            TokenKind::Keyword(Keyword::Foreach) => self.parse_foreach(),
            TokenKind::Keyword(Keyword::Return) => self.parse_return(),
            TokenKind::Keyword(Keyword::Let) => self.parse_local_let(),
            _ => self.parse_expr_statement(),
        }
    }

    pub(super) fn parse_block(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.expect_op(Operator::LBrace)?;
        let mut statements = Vec::new();
        while !self.check_op(Operator::RBrace) && !self.cursor_is_at_end() {
            statements.push(self.parse_statement()?);
        }
        self.expect_op(Operator::RBrace)?;
        Ok(self.push(NodeKind::Block { statements }, start))
    }

    fn cursor_is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn parse_if(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `if`
        self.expect_op(Operator::LParen)?;
        let condition = self.parse_expression()?;
        self.expect_op(Operator::RParen)?;
        let then_branch = self.parse_statement()?;

        let else_branch = if self.check_kw(Keyword::Else) {
            self.advance();
            self.parse_statement()?
        } else {
            self.push(NodeKind::Empty, start)
        };

        Ok(self.push(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            start,
        ))
    }

    fn parse_while(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `while`
        self.expect_op(Operator::LParen)?;
        let condition = self.parse_expression()?;
        self.expect_op(Operator::RParen)?;
        let body = self.parse_statement()?;
        Ok(self.push(NodeKind::While { condition, body }, start))
    }

    /// `for (init , end , step) body` (§4.2 "For-loop condition"): `init`
    /// must be empty or a variable definition; an omitted `end` defaults to
    /// `true`; an omitted `init`/`step` becomes the empty expression.
    fn parse_for(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `for`
        self.expect_op(Operator::LParen)?;

        let init = if self.check_op(Operator::Comma) {
            self.push(NodeKind::Empty, start)
        } else if self.check_kw(Keyword::Let) {
            self.parse_variable_def()?
        } else {
            self.push(NodeKind::Empty, start)
        };
        self.expect_op(Operator::Comma)?;

        let end = if self.check_op(Operator::Comma) {
            self.push(NodeKind::BoolLiteral { value: true }, start)
        } else {
            self.parse_expression()?
        };
        self.expect_op(Operator::Comma)?;

        let step = if self.check_op(Operator::RParen) {
            self.push(NodeKind::Empty, start)
        } else {
            self.parse_expression()?
        };
        self.expect_op(Operator::RParen)?;

        let body = self.parse_statement()?;

        Ok(self.push(NodeKind::For { init, end, step, body }, start))
    }

    /// `foreach (item in expr) body`, parsed but rejected at IR generation
    /// (§9 Open Questions).
    fn parse_foreach(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `foreach`
        self.expect_op(Operator::LParen)?;
        let (binding, _) = self.expect_identifier()?;
        self.expect_kw(Keyword::In)?;
        let iterable = self.parse_expression()?;
        self.expect_op(Operator::RParen)?;
        let body = self.parse_statement()?;

        Ok(self.push(NodeKind::ForEach { binding, iterable, body }, start))
    }

    fn parse_return(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `return`
        let value = if self.check_op(Operator::Semicolon) {
            self.push(NodeKind::Empty, start)
        } else {
            self.parse_expression()?
        };
        self.expect_op(Operator::Semicolon)?;
        Ok(self.push(NodeKind::Return { value }, start))
    }

    fn parse_local_let(&mut self) -> PResult<NodeId> {
        let def = self.parse_variable_def()?;
        self.expect_op(Operator::Semicolon)?;
        Ok(def)
    }

    /// `let [mut] name [: type] = init` shared by local and global `let`
    /// (the global form wraps this in `GlobalVariableDef`, §3).
    pub(super) fn parse_variable_def(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `let`
        let is_mutable = self.check_kw(Keyword::Mut);
        if is_mutable {
            self.advance();
        }
        let (name, _) = self.expect_identifier()?;

        let type_name = if self.eat_op(Operator::Colon) {
            let (type_name, _) = self.expect_identifier()?;
            Some(type_name)
        } else {
            None
        };

        self.expect_op(Operator::Assign)?;
        let init = self.parse_expression()?;

        Ok(self.push(
            NodeKind::VariableDef {
                name,
                type_name,
                is_mutable,
                init,
            },
            start,
        ))
    }

    fn parse_expr_statement(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        let expr = self.parse_expression()?;
        self.expect_op(Operator::Semicolon)?;
        Ok(self.push(NodeKind::ExprStmt { expr }, start))
    }
}
