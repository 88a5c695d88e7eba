//! Scoped variable environment for the MicroC evaluator.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use microc_types::ast::Type;

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// A name's declared type (if any) and current value.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub ty: Option<Type>,
    pub value: Value,
}

impl Binding {
    pub fn new(ty: Option<Type>, value: Value) -> Self {
        Self { ty, value }
    }
}

/// The bindings of a single scope level.
pub type Scope = BTreeMap<String, Binding>;

struct Frame {
    scope: RefCell<Scope>,
    parent: Option<Rc<Frame>>,
}

/// A chain of scopes, innermost first.
///
/// Cloning a `Ctx` shares the scopes, which is how closures see later
/// mutations of the bindings they captured. Lookups walk outward from the
/// innermost scope; [`var_def`](Self::var_def) always writes the innermost
/// one; [`set`](Self::set) updates the nearest scope that binds the name.
#[derive(Clone)]
pub struct Ctx {
    frame: Rc<Frame>,
}

impl Ctx {
    /// Create an environment with one empty root scope.
    pub fn new() -> Self {
        Self::with_scope(Scope::new(), None)
    }

    /// Create a root environment from untyped name → value pairs.
    pub fn from_values<K: Into<String>>(values: impl IntoIterator<Item = (K, Value)>) -> Self {
        let scope = values
            .into_iter()
            .map(|(name, value)| (name.into(), Binding::new(None, value)))
            .collect();
        Self::with_scope(scope, None)
    }

    fn with_scope(scope: Scope, parent: Option<Rc<Frame>>) -> Self {
        Self {
            frame: Rc::new(Frame {
                scope: RefCell::new(scope),
                parent,
            }),
        }
    }

    /// A new environment with one more innermost scope, pre-filled with
    /// `bindings`. `self` is left untouched.
    pub fn push(&self, bindings: Scope) -> Ctx {
        Self::with_scope(bindings, Some(Rc::clone(&self.frame)))
    }

    /// Drop the innermost scope, returning the enclosing environment and
    /// the contents of the removed scope.
    pub fn pop(&self) -> EvalResult<(Ctx, Scope)> {
        let parent = self
            .frame
            .parent
            .as_ref()
            .ok_or_else(|| EvalError::Scope("cannot pop the root scope".to_string()))?;
        let scope = self.frame.scope.borrow().clone();
        Ok((
            Ctx {
                frame: Rc::clone(parent),
            },
            scope,
        ))
    }

    /// Bind `name` in the innermost scope, replacing only a binding of that
    /// same scope.
    pub fn var_def(&self, ty: Option<Type>, name: impl Into<String>, value: Value) {
        self.frame
            .scope
            .borrow_mut()
            .insert(name.into(), Binding::new(ty, value));
    }

    /// Look up a binding, searching from innermost to outermost scope.
    pub fn lookup(&self, name: &str) -> Option<Binding> {
        self.frames()
            .find_map(|frame| frame.scope.borrow().get(name).cloned())
    }

    /// Current value of `name`.
    pub fn get(&self, name: &str) -> EvalResult<Value> {
        self.lookup(name)
            .map(|b| b.value)
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    /// Declared type of `name`, resolved like [`get`](Self::get).
    pub fn get_type(&self, name: &str) -> EvalResult<Option<Type>> {
        self.lookup(name)
            .map(|b| b.ty)
            .ok_or_else(|| EvalError::UndefinedVariable(name.to_string()))
    }

    /// Update `name` in the nearest scope that binds it.
    pub fn set(&self, name: &str, value: Value) -> EvalResult<()> {
        for frame in self.frames() {
            let mut scope = frame.scope.borrow_mut();
            if let Some(binding) = scope.get_mut(name) {
                binding.value = value;
                return Ok(());
            }
        }
        Err(EvalError::UndefinedVariable(name.to_string()))
    }

    /// Check if a name is bound anywhere in the chain.
    pub fn contains(&self, name: &str) -> bool {
        self.frames()
            .any(|frame| frame.scope.borrow().contains_key(name))
    }

    /// True when this environment has no enclosing scope.
    pub fn is_root(&self) -> bool {
        self.frame.parent.is_none()
    }

    /// Number of scopes in the chain (the root alone is 1).
    pub fn depth(&self) -> usize {
        self.frames().count()
    }

    /// Snapshot of the outermost scope.
    pub fn root_scope(&self) -> Scope {
        match self.frames().last() {
            Some(frame) => frame.scope.borrow().clone(),
            None => Scope::new(),
        }
    }

    fn frames(&self) -> impl Iterator<Item = &Frame> {
        std::iter::successors(Some(&*self.frame), |frame| frame.parent.as_deref())
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self::new()
    }
}

/// Lists the root scope, one `name: type = value` per line, sorted by
/// name.
impl fmt::Display for Ctx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.root_scope();
        if root.is_empty() {
            return f.write_str("(empty)");
        }
        for (i, (name, binding)) in root.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            match binding.ty {
                Some(ty) => write!(f, "{name}: {ty} = {}", binding.value.show_repr())?,
                None => write!(f, "{name} = {}", binding.value.show_repr())?,
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Ctx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ctx")
            .field("depth", &self.depth())
            .field("scope", &self.frame.scope.borrow().keys().collect::<Vec<_>>())
            .finish()
    }
}
