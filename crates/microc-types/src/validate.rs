//! Static validation run once over the whole tree before evaluation.
//!
//! Each node kind has a local check ([`validate_self`]); [`validate_tree`]
//! walks the tree and stops at the first failure.

use std::collections::HashSet;

use crate::ast::{Expr, FunctionDef, Program, Stmt};
use crate::error::SemanticError;
use crate::tree::{walk, Cursor, Node};

/// Tokens that may never name a variable, array, parameter or function.
pub const RESERVED: &[&str] = &[
    "NULL", "return", "if", "else", "while", "for", "&&", "||", "void", "int", "char",
];

pub fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Validate every node reachable from `root`.
pub fn validate_tree(root: Node<'_>) -> Result<(), SemanticError> {
    tracing::debug!(root = root.kind(), "validating tree");
    let result = walk(root, validate_self);
    if let Err(err) = &result {
        tracing::debug!(%err, "validation failed");
    }
    result
}

/// Validate a whole program.
pub fn validate_program(program: &Program) -> Result<(), SemanticError> {
    validate_tree(Node::Program(program))
}

/// The local check for the node under `cursor`.
pub fn validate_self(cursor: &Cursor<'_>) -> Result<(), SemanticError> {
    match cursor.node() {
        Node::Program(_) => Ok(()),
        Node::Stmt(stmt) => validate_stmt(stmt),
        Node::Expr(expr) => validate_expr(expr),
    }
}

fn validate_stmt(stmt: &Stmt) -> Result<(), SemanticError> {
    match stmt {
        Stmt::VarDef { name, .. } | Stmt::ArrayDef { name, .. } => check_name(name),
        Stmt::Block(block) => check_unique_locals(&block.stmts),
        Stmt::Function(def) => validate_function(def),
        Stmt::Seq(_)
        | Stmt::Expr(_)
        | Stmt::Printf(_)
        | Stmt::Return(_)
        | Stmt::If { .. }
        | Stmt::While { .. } => Ok(()),
    }
}

fn validate_expr(expr: &Expr) -> Result<(), SemanticError> {
    match expr {
        Expr::Var(name) | Expr::Assign { name, .. } => check_name(name),
        _ => Ok(()),
    }
}

fn check_name(name: &str) -> Result<(), SemanticError> {
    if is_reserved(name) {
        return Err(SemanticError::reserved_name(name));
    }
    Ok(())
}

/// Variables and arrays declared directly in one block must be distinct.
fn check_unique_locals(stmts: &[Stmt]) -> Result<(), SemanticError> {
    let mut seen = HashSet::new();
    for name in stmts.iter().filter_map(local_name) {
        if !seen.insert(name) {
            return Err(SemanticError::duplicate_variable(name));
        }
    }
    Ok(())
}

/// A loop header spliced in by `for` may redeclare its variable, so only
/// direct declarations count.
fn local_name(stmt: &Stmt) -> Option<&str> {
    match stmt {
        Stmt::VarDef { name, .. } | Stmt::ArrayDef { name, .. } => Some(name),
        _ => None,
    }
}

fn validate_function(def: &FunctionDef) -> Result<(), SemanticError> {
    check_name(&def.name)?;

    let mut params = HashSet::new();
    for name in def.param_names() {
        check_name(name)?;
        if !params.insert(name) {
            return Err(SemanticError::duplicate_parameter(name));
        }
    }

    // Only the body's own top level, including what `for` splices into it,
    // shares the parameters' scope; nested blocks may shadow them.
    let mut locals = Vec::new();
    spliced_locals(def.body_stmts(), &mut locals);
    for name in locals {
        if params.contains(name) {
            return Err(SemanticError::parameter_collision(name));
        }
    }
    Ok(())
}

/// Names declared directly in `stmts` or in sequences spliced into them.
fn spliced_locals<'a>(stmts: &'a [Stmt], out: &mut Vec<&'a str>) {
    for stmt in stmts {
        match stmt {
            Stmt::Seq(inner) => spliced_locals(inner, out),
            other => out.extend(local_name(other)),
        }
    }
}
