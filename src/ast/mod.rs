//! AST node definitions, parent linkage, and the textual dump (§3, §9).

mod dump;
mod node;

pub use node::*;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceCache, Span};

    #[test]
    fn every_reachable_node_has_a_parent_except_the_global_block() {
        let cache = SourceCache::new();
        let file = cache.insert("a.va", "".to_owned());
        let span = Span::zero(file, 1, 1, 0);

        let mut builder = AstBuilder::new();
        let lit = builder.push(
            NodeKind::IntegerLiteral {
                value: 1,
                meta: Default::default(),
            },
            span,
        );
        let stmt = builder.push(NodeKind::ExprStmt { expr: lit }, span);
        let block = builder.push(
            NodeKind::Block {
                statements: vec![stmt],
            },
            span,
        );
        let ast = builder.finish(block);

        assert_eq!(ast.node(block).parent, None);
        assert_eq!(ast.node(stmt).parent, Some(block));
        assert_eq!(ast.node(lit).parent, Some(stmt));
    }

    #[test]
    fn enclosing_function_is_found_by_index_walk() {
        let cache = SourceCache::new();
        let file = cache.insert("a.va", "".to_owned());
        let span = Span::zero(file, 1, 1, 0);

        let mut builder = AstBuilder::new();
        let value = builder.push(
            NodeKind::IntegerLiteral {
                value: 0,
                meta: Default::default(),
            },
            span,
        );
        let ret = builder.push(NodeKind::Return { value }, span);
        let body = builder.push(
            NodeKind::Block {
                statements: vec![ret],
            },
            span,
        );
        let proto = builder.push(
            NodeKind::Prototype {
                name: "main".into(),
                return_type: Some("i32".into()),
                params: vec![],
                is_main: true,
                mangle: true,
            },
            span,
        );
        let def = builder.push(
            NodeKind::FunctionDef {
                prototype: proto,
                body,
                is_declaration: false,
            },
            span,
        );
        let global = builder.push(
            NodeKind::Block {
                statements: vec![def],
            },
            span,
        );
        let ast = builder.finish(global);

        assert_eq!(ast.enclosing_function(ret), Some(def));
        assert_eq!(ast.enclosing_function(def), None);
    }
}
