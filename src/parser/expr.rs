//! Expression parsing: recursive descent down to primaries, a shunting-yard
//! sweep across binary operators, and a right-associative assignment layer
//! underneath it all (§4.2 "Expression precedence").

use super::{PResult, Parser};
use crate::ast::{AssignOperator, BinaryOperator, NodeId, NodeKind, SubscriptKind, UnaryOperator};
use crate::lexer::{Keyword, Operator, TokenKind};
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// `(precedence, associativity)` for every binary operator, matching the
/// table in §4.2 (`||`=10 up to `instanceof`=130).
fn precedence(op: BinaryOperator) -> (u8, Assoc) {
    use BinaryOperator::*;
    match op {
        Or => (10, Assoc::Left),
        And => (20, Assoc::Left),
        Eq | NotEq => (70, Assoc::Left),
        Lt | LtEq | Gt | GtEq => (80, Assoc::Left),
        Add | Sub => (90, Assoc::Left),
        Mul | Div | Mod | Rem => (100, Assoc::Left),
        Pow => (110, Assoc::Right),
        Dot => (120, Assoc::Left),
        Instanceof => (130, Assoc::Left),
    }
}

/// The binary operator a token starting a binary expression denotes, if
/// any. `+`/`-` are handled by the caller since they are ambiguous with
/// their unary forms.
fn binary_operator(kind: &TokenKind) -> Option<BinaryOperator> {
    use BinaryOperator as B;
    Some(match kind {
        TokenKind::Operator(Operator::PipePipe) => B::Or,
        TokenKind::Keyword(Keyword::Or) => B::Or,
        TokenKind::Operator(Operator::AmpAmp) => B::And,
        TokenKind::Keyword(Keyword::And) => B::And,
        TokenKind::Operator(Operator::EqEq) => B::Eq,
        TokenKind::Operator(Operator::BangEq) => B::NotEq,
        TokenKind::Operator(Operator::Lt) => B::Lt,
        TokenKind::Operator(Operator::LtEq) => B::LtEq,
        TokenKind::Operator(Operator::Gt) => B::Gt,
        TokenKind::Operator(Operator::GtEq) => B::GtEq,
        TokenKind::Operator(Operator::Plus) => B::Add,
        TokenKind::Operator(Operator::Minus) => B::Sub,
        TokenKind::Operator(Operator::Star) => B::Mul,
        TokenKind::Operator(Operator::Slash) => B::Div,
        TokenKind::Operator(Operator::Percent) => B::Mod,
        TokenKind::Keyword(Keyword::Rem) => B::Rem,
        TokenKind::Operator(Operator::Caret) => B::Pow,
        TokenKind::Operator(Operator::Dot) => B::Dot,
        TokenKind::Keyword(Keyword::Instanceof) => B::Instanceof,
        _ => return None,
    })
}

fn assign_operator(kind: &TokenKind) -> Option<AssignOperator> {
    use AssignOperator as A;
    Some(match kind {
        TokenKind::Operator(Operator::Assign) => A::Assign,
        TokenKind::Operator(Operator::PlusAssign) => A::AddAssign,
        TokenKind::Operator(Operator::MinusAssign) => A::SubAssign,
        TokenKind::Operator(Operator::StarAssign) => A::MulAssign,
        TokenKind::Operator(Operator::SlashAssign) => A::DivAssign,
        TokenKind::Operator(Operator::PercentAssign) => A::ModAssign,
        _ => return None,
    })
}

impl Parser {
    /// Assignment sits below every binary operator and is right-associative
    /// (§4.2): `a = b = c` parses as `a = (b = c)`.
    pub(super) fn parse_expression(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        let lhs = self.parse_binary_expression()?;

        if let Some(op) = assign_operator(&self.peek().kind) {
            self.advance();
            let rhs = self.parse_expression()?;
            let span = start;
            return Ok(self.push(
                NodeKind::AssignOp {
                    op,
                    target: lhs,
                    value: rhs,
                },
                span,
            ));
        }

        Ok(lhs)
    }

    /// Classic two-stack shunting-yard over everything above assignment
    /// precedence (§4.2, §9 "the literal two-stack algorithm").
    fn parse_binary_expression(&mut self) -> PResult<NodeId> {
        let mut operands: Vec<NodeId> = vec![self.parse_unary()?];
        let mut operators: Vec<(BinaryOperator, Span)> = Vec::new();

        loop {
            let Some(op) = binary_operator(&self.peek().kind) else {
                break;
            };
            let op_span = self.peek().location;
            let (prec, assoc) = precedence(op);

            while let Some(&(top_op, _)) = operators.last() {
                let (top_prec, _) = precedence(top_op);
                let should_reduce = match assoc {
                    Assoc::Left => top_prec >= prec,
                    Assoc::Right => top_prec > prec,
                };
                if !should_reduce {
                    break;
                }
                Self::reduce_one(&mut operands, &mut operators, self);
            }

            self.advance();
            operators.push((op, op_span));
            operands.push(self.parse_unary()?);
        }

        while !operators.is_empty() {
            Self::reduce_one(&mut operands, &mut operators, self);
        }

        Ok(operands.pop().expect("shunting-yard leaves exactly one operand"))
    }

    fn reduce_one(operands: &mut Vec<NodeId>, operators: &mut Vec<(BinaryOperator, Span)>, parser: &mut Parser) {
        let (op, op_span) = operators.pop().expect("reduce called with an empty operator stack");
        let rhs = operands.pop().expect("binary op missing rhs operand");
        let lhs = operands.pop().expect("binary op missing lhs operand");
        let span = Span::new(op_span.file, op_span.line, op_span.column, op_span.offset, op_span.length);
        let node = parser.push(NodeKind::BinaryOp { op, lhs, rhs }, span);
        operands.push(node);
    }

    /// Prefix unary operators (§4.2): `+`/`-` are retagged unary here since
    /// `parse_binary_expression` only calls this at the start of an operand.
    fn parse_unary(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        let unary_op = match &self.peek().kind {
            TokenKind::Operator(Operator::Plus) => Some(UnaryOperator::Plus),
            TokenKind::Operator(Operator::Minus) => Some(UnaryOperator::Minus),
            TokenKind::Operator(Operator::Bang) => Some(UnaryOperator::Not),
            TokenKind::Keyword(Keyword::Not) => Some(UnaryOperator::Not),
            TokenKind::Keyword(Keyword::Sizeof) => Some(UnaryOperator::Sizeof),
            TokenKind::Keyword(Keyword::Typeof) => Some(UnaryOperator::Typeof),
            TokenKind::Keyword(Keyword::Addressof) => Some(UnaryOperator::Addressof),
            _ => None,
        };

        let Some(op) = unary_op else {
            return self.parse_postfix();
        };

        self.advance();
        let operand = self.parse_unary()?;
        let span = start;
        Ok(self.push(NodeKind::UnaryOp { op, operand }, span))
    }

    /// Postfix chain on top of a primary: calls, subscripts, and `as`
    /// casts, each of which may repeat (`f()()`, `a[0][1]`).
    fn parse_postfix(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        let mut node = self.parse_primary()?;

        loop {
            if self.eat_op(Operator::LParen) {
                let mut args = Vec::new();
                if !self.check_op(Operator::RParen) {
                    loop {
                        args.push(self.parse_expression()?);
                        if !self.eat_op(Operator::Comma) {
                            break;
                        }
                    }
                }
                self.expect_op(Operator::RParen)?;
                let span = start;
                node = self.push(NodeKind::Call { callee: node, args }, span);
                continue;
            }

            if self.eat_op(Operator::LBracket) {
                let index = self.parse_expression()?;
                if self.eat_op(Operator::DotDot) {
                    let range_end = self.parse_expression()?;
                    self.expect_op(Operator::RBracket)?;
                    let span = start;
                    node = self.push(
                        NodeKind::Subscript {
                            kind: SubscriptKind::Range,
                            base: node,
                            index,
                            range_end: Some(range_end),
                        },
                        span,
                    );
                } else {
                    self.expect_op(Operator::RBracket)?;
                    let span = start;
                    node = self.push(
                        NodeKind::Subscript {
                            kind: SubscriptKind::Index,
                            base: node,
                            index,
                            range_end: None,
                        },
                        span,
                    );
                }
                continue;
            }

            if self.check_kw(Keyword::As) {
                self.advance();
                let (type_name, _) = self.expect_identifier()?;
                let span = start;
                node = self.push(NodeKind::Cast { value: node, type_name }, span);
                continue;
            }

            break;
        }

        Ok(node)
    }

    /// `cast<Type>(expr)`, parenthesized expressions, literals, identifiers.
    fn parse_primary(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;

        if self.check_kw(Keyword::Cast) {
            self.advance();
            self.expect_op(Operator::Lt)?;
            let (type_name, _) = self.expect_identifier()?;
            self.expect_op(Operator::Gt)?;
            self.expect_op(Operator::LParen)?;
            let value = self.parse_expression()?;
            self.expect_op(Operator::RParen)?;
            let span = start;
            return Ok(self.push(NodeKind::Cast { value, type_name }, span));
        }

        if self.eat_op(Operator::LParen) {
            let inner = self.parse_expression()?;
            self.expect_op(Operator::RParen)?;
            return Ok(inner);
        }

        let tok = self.peek().clone();
        let kind = match tok.kind {
            TokenKind::Integer { value, meta } => NodeKind::IntegerLiteral { value, meta },
            TokenKind::Float { value, meta } => NodeKind::FloatLiteral { value, meta },
            TokenKind::Str { value, kind } => NodeKind::StringLiteral { value, kind },
            TokenKind::Char { value, kind } => NodeKind::CharLiteral { value, kind },
            TokenKind::Bool(value) => NodeKind::BoolLiteral { value },
            TokenKind::Identifier(name) => NodeKind::VariableRef { name },
            _ => return Err(self.unexpected("an expression")),
        };
        self.advance();
        Ok(self.push(kind, tok.location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::VecSink;
    use crate::source::SourceCache;

    fn parse_expr_ast(src: &str) -> crate::ast::Ast {
        let cache = SourceCache::new();
        let file = cache.insert("e.va", src.to_owned());
        let mut sink = VecSink::new();
        let (tokens, _) = crate::lexer::lex(file, src, &mut sink);
        let mut parser = Parser::new(file, tokens);
        let expr = parser.parse_expression().expect("expression should parse");
        parser.builder.finish(expr)
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let ast = parse_expr_ast("1 + 2 * 3");
        let NodeKind::BinaryOp { op, lhs, rhs } = &ast.node(ast.global_block()).kind else {
            panic!("expected a binary op root");
        };
        assert_eq!(*op, BinaryOperator::Add);
        assert!(matches!(ast.node(*lhs).kind, NodeKind::IntegerLiteral { value: 1, .. }));
        assert!(matches!(ast.node(*rhs).kind, NodeKind::BinaryOp { op: BinaryOperator::Mul, .. }));
    }

    #[test]
    fn pow_is_right_associative() {
        let ast = parse_expr_ast("2 ^ 3 ^ 2");
        let NodeKind::BinaryOp { op, rhs, .. } = &ast.node(ast.global_block()).kind else {
            panic!("expected a binary op root");
        };
        assert_eq!(*op, BinaryOperator::Pow);
        assert!(matches!(ast.node(*rhs).kind, NodeKind::BinaryOp { op: BinaryOperator::Pow, .. }));
    }

    #[test]
    fn assignment_is_right_associative_and_lowest_precedence() {
        let ast = parse_expr_ast("a = b = 1 + 1");
        let NodeKind::AssignOp { op, value, .. } = &ast.node(ast.global_block()).kind else {
            panic!("expected an assign op root");
        };
        assert_eq!(*op, AssignOperator::Assign);
        assert!(matches!(ast.node(*value).kind, NodeKind::AssignOp { .. }));
    }

    #[test]
    fn unary_minus_binds_before_binary_plus() {
        let ast = parse_expr_ast("-1 + 2");
        let NodeKind::BinaryOp { lhs, .. } = &ast.node(ast.global_block()).kind else {
            panic!("expected a binary op root");
        };
        assert!(matches!(ast.node(*lhs).kind, NodeKind::UnaryOp { op: UnaryOperator::Minus, .. }));
    }

    #[test]
    fn call_with_arguments() {
        let ast = parse_expr_ast("add(1, 2)");
        let NodeKind::Call { args, .. } = &ast.node(ast.global_block()).kind else {
            panic!("expected a call root");
        };
        assert_eq!(args.len(), 2);
    }

    #[test]
    fn cast_generic_syntax() {
        let ast = parse_expr_ast("cast<i64>(1)");
        assert!(matches!(ast.node(ast.global_block()).kind, NodeKind::Cast { .. }));
    }

    #[test]
    fn cast_as_syntax() {
        let ast = parse_expr_ast("1 as i64");
        assert!(matches!(ast.node(ast.global_block()).kind, NodeKind::Cast { .. }));
    }

    #[test]
    fn range_subscript_is_parsed() {
        let ast = parse_expr_ast("a[0..1]");
        let NodeKind::Subscript { kind, range_end, .. } = &ast.node(ast.global_block()).kind else {
            panic!("expected a subscript root");
        };
        assert_eq!(*kind, SubscriptKind::Range);
        assert!(range_end.is_some());
    }

    #[test]
    fn unbalanced_parens_is_an_error() {
        let cache = SourceCache::new();
        let file = cache.insert("e.va", "(1 + 2".to_owned());
        let mut sink = VecSink::new();
        let (tokens, _) = crate::lexer::lex(file, "(1 + 2", &mut sink);
        let mut parser = Parser::new(file, tokens);
        assert!(parser.parse_expression().is_err());
    }
}
