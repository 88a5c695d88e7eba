//! Tests for the top-level error report.
//!
//! A failed run logs one `error!` event carrying the error and a dump of
//! the root environment, then hands the error back unchanged.

use std::io;
use std::sync::{Arc, Mutex};

use microc_eval::{Ctx, EvalError, EvalOptions, Evaluator, Value};
use microc_types::ast::*;

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

/// Log sink shared between the subscriber and the test.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        let bytes = self.0.lock().map(|b| b.clone()).unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Ok(mut bytes) = self.0.lock() {
            bytes.extend_from_slice(buf);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with error-level events written to the returned sink.
fn with_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let sink = Captured::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_max_level(tracing::Level::ERROR)
        .with_ansi(false)
        .without_time()
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, sink.text())
}

fn evaluator() -> Evaluator {
    Evaluator::new(EvalOptions::default().with_capture_output(true))
}

// ══════════════════════════════════════════════════════════════════════════════
// Reports
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn dynamic_error_is_logged_with_root_environment() {
    let ctx = Ctx::new();
    let program = Program::new(vec![
        Stmt::var_def(Type::Int, "x", Some(Expr::int(7))),
        Stmt::var_def(Type::Char, "c", Some(Expr::char('q'))),
        Stmt::block(vec![
            Stmt::var_def(Type::Int, "hidden", None),
            Stmt::expr(Expr::binary(Expr::var("x"), BinOp::Div, Expr::int(0))),
        ]),
    ]);

    let (result, logs) = with_logs(|| evaluator().run(&program, &ctx));

    assert_eq!(
        result,
        Err(EvalError::Arithmetic("division by zero".to_string()))
    );
    assert!(logs.contains("ERROR"), "{logs}");
    assert!(logs.contains("evaluation failed"), "{logs}");
    assert!(logs.contains("division by zero"), "{logs}");
    assert!(logs.contains("kind=arithmetic"), "{logs}");
    assert!(logs.contains("c: char = 'q'"), "{logs}");
    assert!(logs.contains("x: int = 7"), "{logs}");
    assert!(!logs.contains("hidden"), "{logs}");
}

#[test]
fn bare_expression_error_is_logged() {
    let ctx = Ctx::from_values([("n", Value::Int(1))]);
    let (result, logs) = with_logs(|| evaluator().eval(&Expr::var("ghost"), &ctx));

    assert_eq!(result, Err(EvalError::UndefinedVariable("ghost".to_string())));
    assert!(logs.contains("undefined variable: ghost"), "{logs}");
    assert!(logs.contains("n = 1"), "{logs}");
}

#[test]
fn successful_run_logs_nothing() {
    let ctx = Ctx::new();
    let program = Program::new(vec![Stmt::printf(Expr::int(1))]);
    let (result, logs) = with_logs(|| evaluator().run(&program, &ctx));

    assert_eq!(result, Ok(Value::Null));
    assert!(logs.is_empty(), "{logs}");
}

#[test]
fn validation_error_is_returned_without_report() {
    let ctx = Ctx::new();
    let program = Program::new(vec![Stmt::var_def(Type::Int, "while", None)]);
    let (result, logs) = with_logs(|| evaluator().run(&program, &ctx));

    assert!(matches!(result, Err(EvalError::Validation(_))));
    assert!(!logs.contains("evaluation failed"), "{logs}");
}
