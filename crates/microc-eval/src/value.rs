//! Runtime values for the evaluator.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use microc_types::ast::{FunctionDef, Param, Stmt, Type};

use crate::env::Ctx;
use crate::error::EvalResult;

/// Shared, mutable, fixed-length array storage.
pub type ArrayRef = Rc<RefCell<Vec<Value>>>;

/// Runtime value.
#[derive(Clone)]
pub enum Value {
    /// `NULL`, and the result of a call that never returns a value
    Null,
    /// 64-bit signed integer
    Int(i64),
    /// Single character; `'\0'` is the string terminator
    Char(char),
    /// Result of comparisons
    Bool(bool),
    /// Fixed-length array, shared by reference
    Array(ArrayRef),
    /// User-defined function with its closure
    Function(Rc<Function>),
    /// Host-provided callable
    Native(NativeFn),
    /// Constructor marker: calling it creates an [`Instance`]
    Class(Rc<Class>),
    /// Object created by calling a class marker
    Instance(Rc<Instance>),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// A char array holding `s`, without an added terminator.
    pub fn chars(s: &str) -> Self {
        Value::array(s.chars().map(Value::Char).collect())
    }

    /// Get the kind name of this value.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Char(_) => "char",
            Value::Bool(_) => "bool",
            Value::Array(_) => "array",
            Value::Function(_) => "function",
            Value::Native(_) => "native function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }

    /// Truthiness used by every condition and logical operator: null,
    /// `false`, integer zero and the NUL character are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Char(c) => *c != '\0',
            _ => true,
        }
    }

    /// Integer view for arithmetic; booleans count as 0/1.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_char(&self) -> Option<char> {
        match self {
            Value::Char(c) => Some(*c),
            _ => None,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Native(_) | Value::Class(_)
        )
    }

    /// Text written by `printf`.
    ///
    /// A non-empty array made only of chars prints as a C string, cut at the
    /// first NUL; any other array prints as `<array>`.
    pub fn show(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(n) => n.to_string(),
            Value::Char(c) => c.to_string(),
            Value::Bool(b) => if *b { "true" } else { "false" }.to_string(),
            Value::Array(items) => {
                let items = items.borrow();
                if !items.is_empty() && items.iter().all(|v| matches!(v, Value::Char(_))) {
                    items
                        .iter()
                        .filter_map(Value::as_char)
                        .take_while(|c| *c != '\0')
                        .collect()
                } else {
                    "<array>".to_string()
                }
            }
            Value::Function(f) => format!("<fn {}>", f.name()),
            Value::Native(_) => "<native fn>".to_string(),
            Value::Class(class) => format!("<class {}>", class.name),
            Value::Instance(instance) => format!("<{} instance>", instance.class.name),
        }
    }

    /// Like [`show`](Self::show), but chars are quoted.
    pub fn show_repr(&self) -> String {
        match self {
            Value::Char(c) => format!("'{}'", c.escape_default()),
            other => other.show(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.show())
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Array(items) => f.debug_list().entries(items.borrow().iter()).finish(),
            other => f.write_str(&other.show_repr()),
        }
    }
}

impl PartialEq for Value {
    /// Structural equality for plain data, identity for callables and
    /// objects. Values of different kinds are never equal.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(&a.func, &b.func),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Self {
        Value::Char(c)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Callables
// ══════════════════════════════════════════════════════════════════════════════

/// A user-defined function: its declaration plus the environment it was
/// defined in.
///
/// The closure is the live scope chain, not a snapshot, so later changes to
/// those bindings are visible inside the function.
pub struct Function {
    def: Rc<FunctionDef>,
    closure: Ctx,
}

impl Function {
    pub fn new(def: Rc<FunctionDef>, closure: Ctx) -> Self {
        Self { def, closure }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    /// Declared return type.
    pub fn ret(&self) -> Type {
        self.def.ret
    }

    pub fn params(&self) -> &[Param] {
        &self.def.params
    }

    pub fn body(&self) -> &[Stmt] {
        self.def.body_stmts()
    }

    pub fn closure(&self) -> &Ctx {
        &self.closure
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The closure may contain this very function.
        f.debug_struct("Function")
            .field("name", &self.def.name)
            .field("ret", &self.def.ret)
            .field("params", &self.def.params)
            .finish_non_exhaustive()
    }
}

type NativeImpl = dyn Fn(&[Value]) -> EvalResult<Value>;

/// A host function exposed to MicroC code.
#[derive(Clone)]
pub struct NativeFn {
    name: Rc<str>,
    func: Rc<NativeImpl>,
}

impl NativeFn {
    pub fn new(
        name: impl Into<Rc<str>>,
        func: impl Fn(&[Value]) -> EvalResult<Value> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            func: Rc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn call(&self, args: &[Value]) -> EvalResult<Value> {
        (self.func)(args)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFn({})", self.name)
    }
}

/// A class marker injected by the host.
#[derive(Debug)]
pub struct Class {
    pub name: String,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Rc<Self> {
        Rc::new(Self { name: name.into() })
    }
}

/// An object created from a [`Class`].
#[derive(Debug)]
pub struct Instance {
    pub class: Rc<Class>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn show_scalars() {
        assert_eq!(Value::Null.show(), "NULL");
        assert_eq!(Value::Int(-42).show(), "-42");
        assert_eq!(Value::Char('x').show(), "x");
        assert_eq!(Value::Bool(true).show(), "true");
        assert_eq!(Value::Bool(false).show(), "false");
    }

    #[test]
    fn show_char_array_stops_at_nul() {
        let v = Value::array(vec![
            Value::Char('h'),
            Value::Char('i'),
            Value::Char('\0'),
            Value::Char('x'),
        ]);
        assert_eq!(v.show(), "hi");
        assert_eq!(Value::chars("hello").show(), "hello");
    }

    #[test]
    fn show_other_arrays_are_opaque() {
        assert_eq!(Value::array(vec![Value::Int(1)]).show(), "<array>");
        assert_eq!(Value::array(vec![]).show(), "<array>");
        assert_eq!(
            Value::array(vec![Value::Char('a'), Value::Int(1)]).show(),
            "<array>"
        );
    }

    #[test]
    fn show_callables() {
        let native = Value::Native(NativeFn::new("len", |_| Ok(Value::Null)));
        assert_eq!(native.show(), "<native fn>");

        let class = Class::new("Point");
        assert_eq!(Value::Class(class.clone()).show(), "<class Point>");
        let instance = Value::Instance(Rc::new(Instance { class }));
        assert_eq!(instance.show(), "<Point instance>");
    }

    #[test]
    fn truthiness() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(!Value::Char('\0').is_truthy());
        assert!(Value::Int(-1).is_truthy());
        assert!(Value::Char('0').is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn equality_never_crosses_kinds() {
        assert_eq!(Value::Int(65), Value::Int(65));
        assert_ne!(Value::Int(65), Value::Char('A'));
        assert_ne!(Value::Int(1), Value::Bool(true));
        assert_ne!(Value::Null, Value::Int(0));
    }

    #[test]
    fn arrays_share_storage() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = a.clone();
        if let Value::Array(items) = &a {
            items.borrow_mut()[0] = Value::Int(9);
        }
        assert_eq!(b, Value::array(vec![Value::Int(9)]));
    }
}
