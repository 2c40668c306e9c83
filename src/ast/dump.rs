//! Textual AST dump (§6): an indented tree, one node per line, prefixed
//! with a depth-encoded rule. A function of the AST alone — no dependence
//! on symbol or type state (§8 round-trip law).

use std::fmt::Write;

use super::node::{Ast, NodeId, NodeKind};

impl Ast {
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.global_block(), 0, &mut out);
        out
    }

    fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let prefix = "  ".repeat(depth);
        let detail = describe(&node.kind);
        let _ = writeln!(out, "{prefix}\\-- {}: {}", node.kind.tag(), detail);
        for child in node.kind.children() {
            self.dump_node(child, depth + 1, out);
        }
    }
}

fn describe(kind: &NodeKind) -> String {
    match kind {
        NodeKind::Identifier { name } | NodeKind::VariableRef { name } => name.clone(),
        NodeKind::IntegerLiteral { value, .. } => value.to_string(),
        NodeKind::FloatLiteral { value, .. } => value.to_string(),
        NodeKind::StringLiteral { value, .. } => format!("{value:?}"),
        NodeKind::CharLiteral { value, .. } => format!("{value:?}"),
        NodeKind::BoolLiteral { value } => value.to_string(),
        NodeKind::VariableDef {
            name,
            type_name,
            is_mutable,
            ..
        } => format!(
            "{}{name}{}",
            if *is_mutable { "mut " } else { "" },
            type_name
                .as_ref()
                .map(|t| format!(": {t}"))
                .unwrap_or_default()
        ),
        NodeKind::BinaryOp { op, .. } => format!("{op:?}"),
        NodeKind::UnaryOp { op, .. } => format!("{op:?}"),
        NodeKind::AssignOp { op, .. } => format!("{op:?}"),
        NodeKind::Call { args, .. } => format!("{} arg(s)", args.len()),
        NodeKind::Subscript { kind, .. } => format!("{kind:?}"),
        NodeKind::Cast { type_name, .. } => type_name.clone(),
        NodeKind::Import { name, form, kind } => format!("{name} ({form:?}, {kind:?})"),
        NodeKind::Module { name } => name.clone(),
        NodeKind::Alias {
            new_name,
            existing_name,
        } => format!("{new_name} = {existing_name}"),
        NodeKind::Param { position, .. } => format!("#{position}"),
        NodeKind::Prototype {
            name,
            return_type,
            is_main,
            mangle,
            ..
        } => format!(
            "{name} -> {}{}{}",
            return_type.as_deref().unwrap_or("void"),
            if *is_main { " [main]" } else { "" },
            if !mangle { " [nomangle]" } else { "" }
        ),
        NodeKind::FunctionDef { is_declaration, .. } => {
            if *is_declaration {
                "declaration".to_owned()
            } else {
                "definition".to_owned()
            }
        }
        NodeKind::ForEach { binding, .. } => binding.clone(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::node::{AstBuilder, NodeKind};
    use crate::source::{SourceCache, Span};

    #[test]
    fn dump_is_indented_and_tagged() {
        let cache = SourceCache::new();
        let file = cache.insert("a.va", "".to_owned());
        let span = Span::zero(file, 1, 1, 0);

        let mut builder = AstBuilder::new();
        let lit = builder.push(
            NodeKind::IntegerLiteral {
                value: 0,
                meta: Default::default(),
            },
            span,
        );
        let ret = builder.push(NodeKind::Return { value: lit }, span);
        let block = builder.push(
            NodeKind::Block {
                statements: vec![ret],
            },
            span,
        );
        let ast = builder.finish(block);

        let dump = ast.dump();
        assert!(dump.starts_with("\\-- Block:"));
        assert!(dump.contains("  \\-- Return:"));
        assert!(dump.contains("    \\-- IntegerLiteral: 0"));
    }
}
