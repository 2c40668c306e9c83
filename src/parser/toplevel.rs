//! Top-level declaration parsing (§4.2 "Top-level forms accepted"):
//! `import`, `module`, `use`, `let`, `def`, `export […] (let|def)`.

use super::{PResult, Parser};
use crate::ast::{ImportForm, ImportKind, NodeId, NodeKind};
use crate::lexer::{Keyword, Operator, TokenKind};

impl Parser {
    pub(super) fn parse_top_level_item(&mut self) -> PResult<NodeId> {
        match &self.peek().kind {
            TokenKind::Keyword(Keyword::Import) => self.parse_import(),
            TokenKind::Keyword(Keyword::Module) => self.parse_module(),
            TokenKind::Keyword(Keyword::Use) => self.parse_alias(),
            TokenKind::Keyword(Keyword::Let) => self.parse_global_let(),
            TokenKind::Keyword(Keyword::Def) => self.parse_function(false),
            TokenKind::Keyword(Keyword::Export) => self.parse_export(),
            _ => Err(self.unexpected("a top-level declaration")),
        }
    }

    /// `a.b.c` or `a` — a dot-joined identifier path, used by both `import`
    /// and `module` (grounded on the original's identical loop over
    /// identifier/`.` pairs).
    fn parse_dotted_name(&mut self) -> PResult<String> {
        let (mut name, _) = self.expect_identifier()?;
        while self.check_op(Operator::Dot) {
            self.advance();
            let (segment, _) = self.expect_identifier()?;
            name.push('.');
            name.push_str(&segment);
        }
        Ok(name)
    }

    fn parse_import(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `import`

        let kind = if self.check_kw(Keyword::Module) {
            self.advance();
            ImportKind::Module
        } else {
            ImportKind::Unspecified
        };

        let (name, form) = if let TokenKind::Str { value, .. } = self.peek().kind.clone() {
            self.advance();
            (value, ImportForm::Path)
        } else {
            (self.parse_dotted_name()?, ImportForm::Dotted)
        };

        self.expect_op(Operator::Semicolon)?;
        Ok(self.push(NodeKind::Import { name, form, kind }, start))
    }

    fn parse_module(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `module`
        let name = self.parse_dotted_name()?;
        self.expect_op(Operator::Semicolon)?;
        Ok(self.push(NodeKind::Module { name }, start))
    }

    /// `use new_name = existing_name;`.
    fn parse_alias(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `use`
        let (new_name, _) = self.expect_identifier()?;
        self.expect_op(Operator::Assign)?;
        let (existing_name, _) = self.expect_identifier()?;
        self.expect_op(Operator::Semicolon)?;
        Ok(self.push(
            NodeKind::Alias {
                new_name,
                existing_name,
            },
            start,
        ))
    }

    fn parse_global_let(&mut self) -> PResult<NodeId> {
        let start = self.peek().location;
        let inner = self.parse_variable_def()?;
        self.expect_op(Operator::Semicolon)?;
        Ok(self.push(NodeKind::GlobalVariableDef { inner }, start))
    }

    fn parse_export(&mut self) -> PResult<NodeId> {
        self.advance(); // `export`
        let mangle = !self.check_kw(Keyword::Nomangle);
        if !mangle {
            self.advance();
        }

        let id = if self.check_kw(Keyword::Def) {
            self.parse_function(!mangle)?
        } else if self.check_kw(Keyword::Let) {
            self.parse_global_let()?
        } else {
            return Err(self.unexpected("'let' or 'def' after 'export'"));
        };

        self.builder.node_mut(id).is_export = true;
        Ok(id)
    }

    /// `name ( [param (, param)*] ) [ -> return-type ] ( ';' | block )`
    /// (§4.2 "Function prototype"). `suppress_mangle` threads the `export
    /// nomangle` prefix down into the prototype's `mangle` flag.
    fn parse_function(&mut self, suppress_mangle: bool) -> PResult<NodeId> {
        let start = self.peek().location;
        self.advance(); // `def`

        let (name, _) = self.expect_identifier()?;
        self.expect_op(Operator::LParen)?;

        let mut params = Vec::new();
        let mut position = 1u32;
        if !self.check_op(Operator::RParen) {
            loop {
                params.push(self.parse_param(position)?);
                position += 1;
                if !self.eat_op(Operator::Comma) {
                    break;
                }
            }
        }
        self.expect_op(Operator::RParen)?;

        let return_type = if self.eat_op(Operator::Arrow) {
            let (type_name, _) = self.expect_identifier()?;
            Some(type_name)
        } else {
            None
        };

        let is_main = name == "main";
        let prototype = self.push(
            NodeKind::Prototype {
                name,
                return_type,
                params,
                is_main,
                mangle: !suppress_mangle,
            },
            start,
        );

        let (body, is_declaration) = if self.eat_op(Operator::Semicolon) {
            (self.push(NodeKind::Block { statements: vec![] }, start), true)
        } else {
            (self.parse_block()?, false)
        };

        Ok(self.push(
            NodeKind::FunctionDef {
                prototype,
                body,
                is_declaration,
            },
            start,
        ))
    }

    /// `name : type`, no default-value sugar (§4.3 "Function": arity is
    /// checked exactly against the declared parameter list).
    fn parse_param(&mut self, position: u32) -> PResult<NodeId> {
        let start = self.peek().location;
        let (name, _) = self.expect_identifier()?;
        self.expect_op(Operator::Colon)?;
        let (type_name, _) = self.expect_identifier()?;
        let empty_init = self.push(NodeKind::Empty, start);
        let def = self.push(
            NodeKind::VariableDef {
                name,
                type_name: Some(type_name),
                is_mutable: false,
                init: empty_init,
            },
            start,
        );
        Ok(self.push(NodeKind::Param { def, position }, start))
    }
}
