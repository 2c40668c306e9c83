//! The arena-based AST (§3 "AST node", §9 "arena indices").
//!
//! Rather than boxed nodes with raw parent back-pointers, every node lives
//! in a flat `Vec` owned by [`Ast`] and is addressed by a small [`NodeId`].
//! "Parent" and "enclosing function" become index lookups; cloning a whole
//! tree (needed when reconstructing an import-only AST from a module
//! interface) is a cheap `Vec` clone.

use crate::lexer::{CharKind, FloatLiteralMeta, IntLiteralMeta, StringKind};
use crate::source::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Rem,
    Pow,
    And,
    Or,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Instanceof,
    /// `.` (member access). No source-language type defines an operation
    /// for it (§1 non-goals: no structs/classes); parsed for precedence
    /// fidelity, rejected at type-check time.
    Dot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Plus,
    Minus,
    Not,
    Sizeof,
    Typeof,
    Addressof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOperator {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
}

impl AssignOperator {
    /// The binary operator a compound assignment decomposes to (§4.3:
    /// "Compound assignment `+=` etc. decomposes to binary op + store").
    /// `None` for plain `=`.
    pub fn underlying_binary(self) -> Option<BinaryOperator> {
        Some(match self {
            AssignOperator::Assign => return None,
            AssignOperator::AddAssign => BinaryOperator::Add,
            AssignOperator::SubAssign => BinaryOperator::Sub,
            AssignOperator::MulAssign => BinaryOperator::Mul,
            AssignOperator::DivAssign => BinaryOperator::Div,
            AssignOperator::ModAssign => BinaryOperator::Mod,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptKind {
    Index,
    /// `a[lo..hi]`, parsed but rejected at IR generation (§9 Open Questions).
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportForm {
    /// `import a.b.c;`
    Dotted,
    /// `import "path/to/file";`
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Unspecified,
    Module,
    Package,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    // --- expressions ---
    Empty,
    Identifier {
        name: String,
    },
    VariableRef {
        name: String,
    },
    IntegerLiteral {
        value: u64,
        meta: IntLiteralMeta,
    },
    FloatLiteral {
        value: f64,
        meta: FloatLiteralMeta,
    },
    StringLiteral {
        value: String,
        kind: StringKind,
    },
    CharLiteral {
        value: u32,
        kind: CharKind,
    },
    BoolLiteral {
        value: bool,
    },
    VariableDef {
        name: String,
        type_name: Option<String>,
        is_mutable: bool,
        init: NodeId,
    },
    /// Wraps a `VariableDef` (§3).
    GlobalVariableDef {
        inner: NodeId,
    },
    BinaryOp {
        op: BinaryOperator,
        lhs: NodeId,
        rhs: NodeId,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: NodeId,
    },
    AssignOp {
        op: AssignOperator,
        target: NodeId,
        value: NodeId,
    },
    /// Arbitrary-arity op: a function call, or — if `callee` resolves to a
    /// type name rather than a function symbol — constructor-like cast
    /// syntax, which the IR generator rejects as unimplemented (§9 Open
    /// Questions); the two are syntactically identical until name
    /// resolution.
    Call {
        callee: NodeId,
        args: Vec<NodeId>,
    },
    Subscript {
        kind: SubscriptKind,
        base: NodeId,
        index: NodeId,
        range_end: Option<NodeId>,
    },
    /// An explicit cast, written either `cast<Type>(expr)` or `expr as
    /// Type` (§4.3 "Cast lattice": explicit mode). Which lattice
    /// transition it realizes (widen/truncate/bit-reinterpret) is decided
    /// from the source and target `TypeKind` at IR generation, not here.
    Cast {
        value: NodeId,
        type_name: String,
    },

    // --- statements ---
    EmptyStmt,
    Block {
        statements: Vec<NodeId>,
    },
    ExprStmt {
        expr: NodeId,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: NodeId,
    },
    For {
        init: NodeId,
        end: NodeId,
        step: NodeId,
        body: NodeId,
    },
    /// `foreach (item in expr) body`, parsed but rejected at IR generation
    /// (§9 Open Questions).
    ForEach {
        binding: String,
        iterable: NodeId,
        body: NodeId,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    Return {
        value: NodeId,
    },
    Import {
        name: String,
        form: ImportForm,
        kind: ImportKind,
    },
    Module {
        name: String,
    },
    Alias {
        new_name: String,
        existing_name: String,
    },
    Param {
        def: NodeId,
        position: u32,
    },
    Prototype {
        name: String,
        return_type: Option<String>,
        params: Vec<NodeId>,
        is_main: bool,
        mangle: bool,
    },
    FunctionDef {
        prototype: NodeId,
        body: NodeId,
        is_declaration: bool,
    },
}

impl NodeKind {
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Empty => "Empty",
            NodeKind::Identifier { .. } => "Identifier",
            NodeKind::VariableRef { .. } => "VariableRef",
            NodeKind::IntegerLiteral { .. } => "IntegerLiteral",
            NodeKind::FloatLiteral { .. } => "FloatLiteral",
            NodeKind::StringLiteral { .. } => "StringLiteral",
            NodeKind::CharLiteral { .. } => "CharLiteral",
            NodeKind::BoolLiteral { .. } => "BoolLiteral",
            NodeKind::VariableDef { .. } => "VariableDef",
            NodeKind::GlobalVariableDef { .. } => "GlobalVariableDef",
            NodeKind::BinaryOp { .. } => "BinaryOp",
            NodeKind::UnaryOp { .. } => "UnaryOp",
            NodeKind::AssignOp { .. } => "AssignOp",
            NodeKind::Call { .. } => "Call",
            NodeKind::Subscript { .. } => "Subscript",
            NodeKind::Cast { .. } => "Cast",
            NodeKind::EmptyStmt => "EmptyStmt",
            NodeKind::Block { .. } => "Block",
            NodeKind::ExprStmt { .. } => "ExprStmt",
            NodeKind::If { .. } => "If",
            NodeKind::For { .. } => "For",
            NodeKind::ForEach { .. } => "ForEach",
            NodeKind::While { .. } => "While",
            NodeKind::Return { .. } => "Return",
            NodeKind::Import { .. } => "Import",
            NodeKind::Module { .. } => "Module",
            NodeKind::Alias { .. } => "Alias",
            NodeKind::Param { .. } => "Param",
            NodeKind::Prototype { .. } => "Prototype",
            NodeKind::FunctionDef { .. } => "FunctionDef",
        }
    }

    /// The direct child node ids of this node, in source order. Used by
    /// parent-solving and by the dump writer.
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;
        match self {
            Empty | Identifier { .. } | VariableRef { .. } | IntegerLiteral { .. }
            | FloatLiteral { .. } | StringLiteral { .. } | CharLiteral { .. }
            | BoolLiteral { .. } | EmptyStmt | Import { .. } | Module { .. } | Alias { .. } => {
                vec![]
            }
            VariableDef { init, .. } => vec![*init],
            GlobalVariableDef { inner } => vec![*inner],
            BinaryOp { lhs, rhs, .. } => vec![*lhs, *rhs],
            UnaryOp { operand, .. } => vec![*operand],
            AssignOp { target, value, .. } => vec![*target, *value],
            Call { callee, args } => {
                let mut v = vec![*callee];
                v.extend(args);
                v
            }
            Subscript {
                base,
                index,
                range_end,
                ..
            } => {
                let mut v = vec![*base, *index];
                if let Some(end) = range_end {
                    v.push(*end);
                }
                v
            }
            Cast { value, .. } => vec![*value],
            Block { statements } => statements.clone(),
            ExprStmt { expr } => vec![*expr],
            If {
                condition,
                then_branch,
                else_branch,
            } => vec![*condition, *then_branch, *else_branch],
            For {
                init,
                end,
                step,
                body,
            } => vec![*init, *end, *step, *body],
            ForEach { iterable, body, .. } => vec![*iterable, *body],
            While { condition, body } => vec![*condition, *body],
            Return { value } => vec![*value],
            Param { def, .. } => vec![*def],
            Prototype { params, .. } => params.clone(),
            FunctionDef {
                prototype, body, ..
            } => vec![*prototype, *body],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
    pub parent: Option<NodeId>,
    pub is_export: bool,
}

/// An AST: an arena of nodes plus the id of the top-level global block.
#[derive(Debug, Clone, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
    global_block: NodeId,
}

impl Ast {
    /// Build an AST whose global block contains `top_level` statements
    /// pushed in source order; `push` must have already been used to
    /// create every node including those in `top_level`.
    pub fn new(nodes: Vec<Node>, global_block: NodeId) -> Self {
        Self { nodes, global_block }
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn global_block(&self) -> NodeId {
        self.global_block
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn top_level_statements(&self) -> &[NodeId] {
        match &self.node(self.global_block).kind {
            NodeKind::Block { statements } => statements,
            _ => &[],
        }
    }

    /// Walk the tree from the global block and assign every reachable
    /// node's parent pointer (§4.2 "Parent linkage", §8 invariant: every
    /// node after parent solving has a parent except the global block).
    pub fn solve_parents(&mut self) {
        let root = self.global_block;
        self.node_mut(root).parent = None;
        self.solve_children(root);
    }

    fn solve_children(&mut self, id: NodeId) {
        let children = self.node(id).kind.children();
        for child in children {
            self.node_mut(child).parent = Some(id);
            self.solve_children(child);
        }
    }

    /// Walk up from `id` to the nearest enclosing `FunctionDef` node, an
    /// O(depth) index walk rather than a stored back-pointer (§9).
    pub fn enclosing_function(&self, id: NodeId) -> Option<NodeId> {
        let mut current = self.node(id).parent;
        while let Some(candidate) = current {
            if matches!(self.node(candidate).kind, NodeKind::FunctionDef { .. }) {
                return Some(candidate);
            }
            current = self.node(candidate).parent;
        }
        None
    }
}

/// Builder used by the parser to append nodes while tracking the arena.
#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node {
            kind,
            span,
            parent: None,
            is_export: false,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    pub fn finish(self, global_block: NodeId) -> Ast {
        let mut ast = Ast::new(self.nodes, global_block);
        ast.solve_parents();
        ast
    }
}
