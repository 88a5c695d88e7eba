//! Structural traversal over the AST.
//!
//! [`Node`] is a borrowed view of any tree element with a stable child
//! order. [`walk`] visits every node reachable from a root exactly once, in
//! pre-order, handing the visitor a [`Cursor`] that addresses the node and
//! its ancestry. The walk is iterative, so deeply nested trees cannot
//! overflow the host stack.

use crate::ast::{Expr, FunctionDef, Program, Stmt};

/// A borrowed reference to any node in the tree.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Program(&'a Program),
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> Node<'a> {
    /// Immediate children, in source order.
    pub fn children(&self) -> Vec<Node<'a>> {
        match *self {
            Node::Program(program) => program.stmts.iter().map(Node::Stmt).collect(),
            Node::Stmt(stmt) => stmt_children(stmt),
            Node::Expr(expr) => expr_children(expr),
        }
    }

    /// Node kind name, for diagnostics and logging.
    pub fn kind(&self) -> &'static str {
        match *self {
            Node::Program(_) => "Program",
            Node::Stmt(stmt) => match stmt {
                Stmt::Expr(_) => "ExprStmt",
                Stmt::VarDef { .. } => "VarDef",
                Stmt::ArrayDef { .. } => "ArrayDef",
                Stmt::Printf(_) => "Printf",
                Stmt::Return(_) => "Return",
                Stmt::If { .. } => "If",
                Stmt::While { .. } => "While",
                Stmt::Block(_) => "Block",
                Stmt::Seq(_) => "Seq",
                Stmt::Function(_) => "Function",
            },
            Node::Expr(expr) => match expr {
                Expr::Literal(_) => "Literal",
                Expr::Var(_) => "Var",
                Expr::BinOp { .. } => "BinOp",
                Expr::And { .. } => "And",
                Expr::Or { .. } => "Or",
                Expr::Unary { .. } => "UnaryOp",
                Expr::Assign { .. } => "Assign",
                Expr::Call { .. } => "Call",
                Expr::ArrayAccess { .. } => "ArrayAccess",
                Expr::ArrayAssign { .. } => "ArrayAssign",
            },
        }
    }

    /// The function declared by this node, if it is a function statement.
    pub fn as_function(&self) -> Option<&'a FunctionDef> {
        match *self {
            Node::Stmt(Stmt::Function(def)) => Some(def),
            _ => None,
        }
    }
}

fn stmt_children(stmt: &Stmt) -> Vec<Node<'_>> {
    match stmt {
        Stmt::Expr(expr) | Stmt::Printf(expr) => vec![Node::Expr(expr)],
        Stmt::VarDef { value, .. } => value.iter().map(Node::Expr).collect(),
        Stmt::ArrayDef { init, .. } => init.iter().flatten().map(Node::Expr).collect(),
        Stmt::Return(value) => value.iter().map(Node::Expr).collect(),
        Stmt::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let mut out = vec![Node::Expr(cond), Node::Stmt(then_branch)];
            if let Some(else_branch) = else_branch {
                out.push(Node::Stmt(else_branch));
            }
            out
        }
        Stmt::While { cond, body } => vec![Node::Expr(cond), Node::Stmt(body)],
        Stmt::Block(block) => block.stmts.iter().map(Node::Stmt).collect(),
        Stmt::Seq(stmts) => stmts.iter().map(Node::Stmt).collect(),
        Stmt::Function(def) => vec![Node::Stmt(&def.body)],
    }
}

fn expr_children(expr: &Expr) -> Vec<Node<'_>> {
    match expr {
        Expr::Literal(_) | Expr::Var(_) => Vec::new(),
        Expr::BinOp { left, right, .. } | Expr::And { left, right } | Expr::Or { left, right } => {
            vec![Node::Expr(left), Node::Expr(right)]
        }
        Expr::Unary { operand, .. } => vec![Node::Expr(operand)],
        Expr::Assign { value, .. } => vec![Node::Expr(value)],
        Expr::Call { callee, args } => std::iter::once(Node::Expr(&**callee))
            .chain(args.iter().map(Node::Expr))
            .collect(),
        Expr::ArrayAccess { array, index } => vec![Node::Expr(array), Node::Expr(index)],
        Expr::ArrayAssign {
            array,
            index,
            value,
        } => vec![Node::Expr(array), Node::Expr(index), Node::Expr(value)],
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Cursor
// ══════════════════════════════════════════════════════════════════════════════

/// Position of a node in the tree: the path from the root down to it.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    path: Vec<Node<'a>>,
}

impl<'a> Cursor<'a> {
    fn new(root: Node<'a>) -> Self {
        Self { path: vec![root] }
    }

    /// The node this cursor points at.
    pub fn node(&self) -> Node<'a> {
        // The path always holds at least the root.
        self.path[self.path.len() - 1]
    }

    /// Direct parent, `None` at the root.
    pub fn parent(&self) -> Option<Node<'a>> {
        self.ancestors().next()
    }

    /// Ancestors, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = Node<'a>> + '_ {
        self.path[..self.path.len() - 1].iter().rev().copied()
    }

    /// Distance from the root (the root is at depth 0).
    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// The innermost function whose body contains this node.
    pub fn enclosing_function(&self) -> Option<&'a FunctionDef> {
        self.ancestors().find_map(|node| node.as_function())
    }
}

/// Visit every node under `root` once, pre-order, stopping at the first
/// error the visitor returns.
pub fn walk<'a, E>(
    root: Node<'a>,
    mut visit: impl FnMut(&Cursor<'a>) -> Result<(), E>,
) -> Result<(), E> {
    let mut cursor = Cursor::new(root);
    visit(&cursor)?;

    // (node, depth) pairs; children pushed in reverse so they pop in order.
    let mut pending: Vec<(Node<'a>, usize)> = Vec::new();
    push_children(&mut pending, root, 1);

    while let Some((node, depth)) = pending.pop() {
        cursor.path.truncate(depth);
        cursor.path.push(node);
        visit(&cursor)?;
        push_children(&mut pending, node, depth + 1);
    }
    Ok(())
}

fn push_children<'a>(pending: &mut Vec<(Node<'a>, usize)>, node: Node<'a>, depth: usize) {
    pending.extend(node.children().into_iter().rev().map(|child| (child, depth)));
}
