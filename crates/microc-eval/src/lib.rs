//! MicroC tree-walking evaluator.
//!
//! Executes MicroC programs directly from the AST built by
//! [`microc_types::ast`]. A run validates the tree, then evaluates it
//! against a [`Ctx`], writing `printf` lines to an [`Output`].
//!
//! ```ignore
//! let ctx = Ctx::new();
//! let mut eval = Evaluator::new(EvalOptions::default().with_capture_output(true));
//! eval.run(&program, &ctx)?;
//! assert_eq!(eval.output(), ["8"]);
//! ```

pub mod env;
pub mod error;
pub mod evaluator;
pub mod options;
pub mod output;
pub mod runtime;
pub mod value;

pub use env::{Binding, Ctx, Scope};
pub use error::{ErrorKind, EvalError, EvalResult};
pub use evaluator::{Evaluator, Flow};
pub use options::{EvalOptions, DEFAULT_MAX_CALL_DEPTH};
pub use output::Output;
pub use value::{ArrayRef, Class, Function, Instance, NativeFn, Value};

use microc_types::ast::{Expr, Program};

/// Run a program with default options; `printf` goes to stdout.
pub fn run(program: &Program, ctx: &Ctx) -> EvalResult<Value> {
    Evaluator::new(EvalOptions::default()).run(program, ctx)
}

/// Evaluate a bare expression with default options.
pub fn eval(expr: &Expr, ctx: &Ctx) -> EvalResult<Value> {
    Evaluator::new(EvalOptions::default()).eval(expr, ctx)
}
