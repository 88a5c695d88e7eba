//! AST node types for the MicroC language.
//!
//! The tree is closed: every expression is an [`Expr`] variant and every
//! statement a [`Stmt`] variant, so each pass (validation, evaluation) is a
//! single exhaustive `match`. Nodes own their children; the only shared
//! node is [`FunctionDef`], which function values keep alive after the tree
//! that declared them is gone.
//!
//! `for` and `do/while` have no node of their own. They are desugared by
//! [`Stmt::for_loop`] and [`Stmt::do_while`] while the tree is built.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete MicroC program: top-level statements in source order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub stmts: Vec<Stmt>,
}

impl Program {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Deserialize a tree produced by an external front end.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Types & Literals
// ══════════════════════════════════════════════════════════════════════════════

/// A declared type: `int`, `char` or `void`.
///
/// Only drives coercion at declaration and assignment sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Char,
    Void,
}

impl Type {
    pub fn as_str(&self) -> &'static str {
        match self {
            Type::Int => "int",
            Type::Char => "char",
            Type::Void => "void",
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A literal value stored directly in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lit {
    /// `NULL`
    Null,
    /// `42`
    Int(i64),
    /// `'a'`, `'\0'`
    Char(char),
    /// Only produced by desugaring (the defaulted `for` condition).
    Bool(bool),
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

/// An expression: anything that evaluates to a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// `42`, `'a'`, `NULL`
    Literal(Lit),
    /// `x`
    Var(String),
    /// `a + b`, `a == b`, ...
    BinOp {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    /// `a && b`
    And { left: Box<Expr>, right: Box<Expr> },
    /// `a || b`
    Or { left: Box<Expr>, right: Box<Expr> },
    /// `-x`, `!x`, `++x`, `x--`
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        postfix: bool,
    },
    /// `x = expr`
    Assign { name: String, value: Box<Expr> },
    /// `f(a, b)`
    Call { callee: Box<Expr>, args: Vec<Expr> },
    /// `v[i]`
    ArrayAccess { array: Box<Expr>, index: Box<Expr> },
    /// `v[i] = expr`
    ArrayAssign {
        array: Box<Expr>,
        index: Box<Expr>,
        value: Box<Expr>,
    },
}

impl Expr {
    pub fn int(n: i64) -> Self {
        Expr::Literal(Lit::Int(n))
    }

    pub fn char(c: char) -> Self {
        Expr::Literal(Lit::Char(c))
    }

    pub fn null() -> Self {
        Expr::Literal(Lit::Null)
    }

    pub fn bool(b: bool) -> Self {
        Expr::Literal(Lit::Bool(b))
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn binary(left: Expr, op: BinOp, right: Expr) -> Self {
        Expr::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            postfix: false,
        }
    }

    /// `x++` / `x--`
    pub fn postfix(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
            postfix: true,
        }
    }

    pub fn assign(name: impl Into<String>, value: Expr) -> Self {
        Expr::Assign {
            name: name.into(),
            value: Box::new(value),
        }
    }

    /// `x += e` and friends, desugared to `x = x op e`.
    pub fn compound_assign(name: impl Into<String>, op: BinOp, value: Expr) -> Self {
        let name = name.into();
        let current = Expr::Var(name.clone());
        Expr::assign(name, Expr::binary(current, op, value))
    }

    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::Call {
            callee: Box::new(callee),
            args,
        }
    }

    pub fn index(array: Expr, index: Expr) -> Self {
        Expr::ArrayAccess {
            array: Box::new(array),
            index: Box::new(index),
        }
    }

    pub fn index_assign(array: Expr, index: Expr, value: Expr) -> Self {
        Expr::ArrayAssign {
            array: Box::new(array),
            index: Box::new(index),
            value: Box::new(value),
        }
    }

    /// Short label used in runtime error messages.
    pub fn describe(&self) -> String {
        match self {
            Expr::Var(name) => name.clone(),
            Expr::Literal(Lit::Null) => "NULL".to_string(),
            Expr::Literal(Lit::Int(n)) => n.to_string(),
            Expr::Literal(Lit::Char(c)) => format!("'{}'", c.escape_default()),
            Expr::Literal(Lit::Bool(b)) => b.to_string(),
            Expr::Call { callee, .. } => format!("{}(...)", callee.describe()),
            Expr::ArrayAccess { array, .. } => format!("{}[...]", array.describe()),
            _ => "expression".to_string(),
        }
    }
}

// ── Binary Operators ──────────────────────────────────────────────────────────

/// Binary operators. `&&` and `||` are separate nodes because they
/// short-circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    // Comparison
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl BinOp {
    /// Returns the operator symbol for error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Gt => ">",
            BinOp::Le => "<=",
            BinOp::Ge => ">=",
        }
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `++x` / `x++`
    Inc,
    /// `--x` / `x--`
    Dec,
}

impl UnaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Inc => "++",
            UnaryOp::Dec => "--",
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

/// A statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Stmt {
    /// `expr;`
    Expr(Expr),
    /// `int x = expr;` / `char c;`
    VarDef {
        ty: Type,
        name: String,
        value: Option<Expr>,
    },
    /// `int v[3] = {1, 2};` / `char s[10];`
    ArrayDef {
        ty: Type,
        name: String,
        size: usize,
        init: Option<Vec<Expr>>,
    },
    /// `printf(expr);`
    Printf(Expr),
    /// `return;` / `return expr;`
    Return(Option<Expr>),
    /// `if (cond) stmt [else stmt]`
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (cond) stmt`
    While { cond: Expr, body: Box<Stmt> },
    /// `{ stmts... }`
    Block(Block),
    /// Statements spliced into the enclosing scope. Produced by desugaring.
    Seq(Vec<Stmt>),
    /// `int f(int a, int b) { ... }`
    Function(Rc<FunctionDef>),
}

impl Stmt {
    pub fn expr(expr: Expr) -> Self {
        Stmt::Expr(expr)
    }

    pub fn var_def(ty: Type, name: impl Into<String>, value: Option<Expr>) -> Self {
        Stmt::VarDef {
            ty,
            name: name.into(),
            value,
        }
    }

    pub fn array_def(
        ty: Type,
        name: impl Into<String>,
        size: usize,
        init: Option<Vec<Expr>>,
    ) -> Self {
        Stmt::ArrayDef {
            ty,
            name: name.into(),
            size,
            init,
        }
    }

    pub fn printf(expr: Expr) -> Self {
        Stmt::Printf(expr)
    }

    pub fn ret(value: Option<Expr>) -> Self {
        Stmt::Return(value)
    }

    pub fn if_else(cond: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Self {
        Stmt::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }
    }

    pub fn while_loop(cond: Expr, body: Stmt) -> Self {
        Stmt::While {
            cond,
            body: Box::new(body),
        }
    }

    pub fn block(stmts: Vec<Stmt>) -> Self {
        Stmt::Block(Block::new(stmts))
    }

    pub fn function(def: FunctionDef) -> Self {
        Stmt::Function(Rc::new(def))
    }

    /// `for (init; cond; incr) body`
    ///
    /// Becomes `init; while (cond) { body; incr; }` run in the enclosing
    /// scope, so `init`'s variable outlives the loop. A missing condition
    /// is `true`.
    pub fn for_loop(
        init: Option<Stmt>,
        cond: Option<Expr>,
        incr: Option<Expr>,
        body: Stmt,
    ) -> Self {
        let cond = cond.unwrap_or_else(|| Expr::bool(true));
        let mut loop_body = vec![body];
        if let Some(incr) = incr {
            loop_body.push(Stmt::Expr(incr));
        }
        let mut stmts = Vec::with_capacity(2);
        if let Some(init) = init {
            stmts.push(init);
        }
        stmts.push(Stmt::while_loop(cond, Stmt::block(loop_body)));
        Stmt::Seq(stmts)
    }

    /// `do body while (cond);` becomes `body; while (cond) body`.
    pub fn do_while(body: Stmt, cond: Expr) -> Self {
        let again = body.clone();
        Stmt::Seq(vec![body, Stmt::while_loop(cond, again)])
    }
}

/// `{ statements... }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { stmts }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Functions
// ══════════════════════════════════════════════════════════════════════════════

/// A function declaration: `ret name(params) body`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDef {
    pub ret: Type,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Stmt,
}

impl FunctionDef {
    pub fn new(ret: Type, name: impl Into<String>, params: Vec<Param>, body: Stmt) -> Self {
        Self {
            ret,
            name: name.into(),
            params,
            body,
        }
    }

    /// Statements run in the call scope. A block body is flattened so its
    /// locals share the scope of the parameters.
    pub fn body_stmts(&self) -> &[Stmt] {
        match &self.body {
            Stmt::Block(block) => &block.stmts,
            other => std::slice::from_ref(other),
        }
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}

/// A parameter: `int a`, `char s[]`, or a bare name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub name: String,
    /// Declared type; `None` leaves arguments uncoerced.
    pub ty: Option<Type>,
}

impl Param {
    pub fn new(ty: Type, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
        }
    }

    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
        }
    }
}
