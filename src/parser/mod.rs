//! Recursive-descent statement/top-level parser combined with a
//! shunting-yard expression parser (§4.2).

mod cursor;
mod expr;
mod stmt;
mod toplevel;

pub use cursor::TokenCursor;

use crate::ast::{Ast, AstBuilder, NodeId, NodeKind};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::ParseError as ParseErrorStage;
use crate::lexer::{Operator, Token, TokenKind};
use crate::source::{FileId, Span};

pub(crate) struct Parser {
    cursor: TokenCursor,
    builder: AstBuilder,
}

type PResult<T> = Result<T, Diagnostic>;

impl Parser {
    fn new(_file: FileId, tokens: Vec<Token>) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            builder: AstBuilder::new(),
        }
    }

    fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        self.builder.push(kind, span)
    }

    fn peek(&self) -> &Token {
        self.cursor.peek()
    }

    fn peek_at(&self, n: usize) -> &Token {
        self.cursor.peek_at(n)
    }

    fn advance(&mut self) -> Token {
        self.cursor.advance()
    }

    fn check_op(&self, op: Operator) -> bool {
        matches!(&self.peek().kind, TokenKind::Operator(o) if *o == op)
    }

    fn check_kw(&self, kw: crate::lexer::Keyword) -> bool {
        matches!(&self.peek().kind, TokenKind::Keyword(k) if *k == kw)
    }

    fn eat_op(&mut self, op: Operator) -> bool {
        if self.check_op(op) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: Operator) -> PResult<Span> {
        let tok = self.peek().clone();
        if self.eat_op(op) {
            Ok(tok.location)
        } else {
            Err(self.unexpected(&format!("'{}'", op.lexeme())))
        }
    }

    fn expect_kw(&mut self, kw: crate::lexer::Keyword) -> PResult<Span> {
        let tok = self.peek().clone();
        if self.check_kw(kw) {
            self.advance();
            Ok(tok.location)
        } else {
            Err(self.unexpected(&format!("'{kw}'")))
        }
    }

    fn expect_identifier(&mut self) -> PResult<(String, Span)> {
        let tok = self.peek().clone();
        if let TokenKind::Identifier(name) = tok.kind {
            self.advance();
            Ok((name, tok.location))
        } else {
            Err(self.unexpected("an identifier"))
        }
    }

    fn unexpected(&self, what: &str) -> Diagnostic {
        let tok = self.peek();
        Diagnostic::error(
            format!("unexpected token '{}', expected {what}", tok.kind),
            tok.location,
        )
    }

    fn synthetic_span(&self) -> Span {
        self.peek().location
    }

    /// Parse the whole token stream into an AST. Errors are recoverable at
    /// the top level (§4.2): the first error during a single top-level
    /// item is reported and the cursor advances past it so that later
    /// declarations can still be parsed and reported in the same run.
    pub fn parse(file: FileId, tokens: Vec<Token>, sink: &mut dyn DiagnosticSink) -> Result<Ast, ParseErrorStage> {
        let mut parser = Parser::new(file, tokens);
        let mut statements = Vec::new();
        let mut had_error = false;

        while !parser.cursor.is_at_end() {
            if parser.eat_op(Operator::Semicolon) {
                sink.report(Diagnostic::warning("empty statement", parser.peek().location));
                continue;
            }

            let before = parser.cursor.position();
            match parser.parse_top_level_item() {
                Ok(id) => statements.push(id),
                Err(diag) => {
                    had_error = true;
                    sink.report(diag);
                    if parser.cursor.position() == before {
                        parser.advance();
                    }
                    parser.recover_to_next_top_level_item();
                }
            }
        }

        let global_span = parser.synthetic_span();
        let global = parser.push(
            NodeKind::Block {
                statements,
            },
            global_span,
        );
        let ast = parser.builder.finish(global);

        if had_error {
            return Err(ParseErrorStage(Diagnostic::without_location(
                crate::diagnostics::Severity::Error,
                "one or more syntax errors occurred",
            )));
        }

        Ok(ast)
    }

    /// Advance the cursor until a token that plausibly starts a new
    /// top-level item, so one bad declaration doesn't swallow the rest of
    /// the file.
    fn recover_to_next_top_level_item(&mut self) {
        use crate::lexer::Keyword::*;
        loop {
            if self.cursor.is_at_end() {
                return;
            }
            match &self.peek().kind {
                TokenKind::Keyword(Import | Module | Use | Let | Def | Export) => return,
                TokenKind::Operator(Operator::Semicolon) => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::VecSink;
    use crate::source::SourceCache;

    #[test]
    fn parse_error_recovery_reports_one_error_and_continues() {
        let src = "let x = ; def g() {}";
        let cache = SourceCache::new();
        let file = cache.insert("t.va", src.to_owned());
        let mut sink = VecSink::new();
        let (tokens, _) = crate::lexer::lex(file, src, &mut sink);
        let result = Parser::parse(file, tokens, &mut sink);

        assert!(result.is_err());
        assert_eq!(sink.errors().count(), 1);
    }

    #[test]
    fn well_formed_function_parses_without_error() {
        let src = "def main() -> i32 { return 0; }";
        let cache = SourceCache::new();
        let file = cache.insert("t.va", src.to_owned());
        let mut sink = VecSink::new();
        let (tokens, _) = crate::lexer::lex(file, src, &mut sink);
        let ast = Parser::parse(file, tokens, &mut sink).expect("should parse");

        assert!(!sink.has_errors());
        assert_eq!(ast.top_level_statements().len(), 1);
    }

    #[test]
    fn foreach_parses_into_a_foreach_node() {
        let src = "def f() { foreach (item in xs) { return; } }";
        let cache = SourceCache::new();
        let file = cache.insert("t.va", src.to_owned());
        let mut sink = VecSink::new();
        let (tokens, _) = crate::lexer::lex(file, src, &mut sink);
        let ast = Parser::parse(file, tokens, &mut sink).expect("should parse");

        assert!(!sink.has_errors());

        let body = match &ast.node(*ast.top_level_statements().first().unwrap()).kind {
            NodeKind::FunctionDef { body, .. } => *body,
            other => panic!("expected a FunctionDef, got {other:?}"),
        };
        let NodeKind::Block { statements } = &ast.node(body).kind else {
            panic!("function body is always a Block");
        };
        assert!(matches!(
            &ast.node(statements[0]).kind,
            NodeKind::ForEach { binding, .. } if binding == "item"
        ));
    }

    #[test]
    fn empty_statement_is_a_warning_not_an_error() {
        let src = ";";
        let cache = SourceCache::new();
        let file = cache.insert("t.va", src.to_owned());
        let mut sink = VecSink::new();
        let (tokens, _) = crate::lexer::lex(file, src, &mut sink);
        let result = Parser::parse(file, tokens, &mut sink);

        assert!(result.is_ok());
        assert!(!sink.has_errors());
    }
}
