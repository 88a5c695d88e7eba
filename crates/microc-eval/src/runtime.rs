//! Operator implementations and declared-type coercion.
//!
//! Arithmetic works on integers (booleans count as 0/1) with C semantics:
//! `/` truncates toward zero and `%` keeps the dividend's sign. Ordering
//! compares integers with integers and chars with chars. `==`/`!=` accept
//! any pair of values and are never true across kinds; arrays are equal
//! only to themselves.

use std::rc::Rc;

use microc_types::ast::{BinOp, Type};

use crate::error::{EvalError, EvalResult};
use crate::value::Value;

/// Apply a (non short-circuit) binary operator.
pub fn binary(op: BinOp, lv: &Value, rv: &Value) -> EvalResult<Value> {
    match op {
        BinOp::Add => arith(lv, rv, op, i64::checked_add),
        BinOp::Sub => arith(lv, rv, op, i64::checked_sub),
        BinOp::Mul => arith(lv, rv, op, i64::checked_mul),
        BinOp::Div => {
            check_divisor(lv, rv, op, "division by zero")?;
            arith(lv, rv, op, i64::checked_div)
        }
        BinOp::Mod => {
            check_divisor(lv, rv, op, "modulo by zero")?;
            arith(lv, rv, op, i64::checked_rem)
        }
        BinOp::Eq => Ok(Value::Bool(eq(lv, rv))),
        BinOp::Ne => Ok(Value::Bool(ne(lv, rv))),
        BinOp::Lt => compare(lv, rv, op, |o| o.is_lt()),
        BinOp::Gt => compare(lv, rv, op, |o| o.is_gt()),
        BinOp::Le => compare(lv, rv, op, |o| o.is_le()),
        BinOp::Ge => compare(lv, rv, op, |o| o.is_ge()),
    }
}

/// Values of different kinds are never equal. Arrays compare by identity,
/// like C array addresses.
pub fn eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => Rc::ptr_eq(x, y),
        _ => a == b,
    }
}

/// Values of different kinds are always different.
pub fn ne(a: &Value, b: &Value) -> bool {
    !eq(a, b)
}

fn int_operands(lv: &Value, rv: &Value, op: BinOp) -> EvalResult<(i64, i64)> {
    match (lv.as_int(), rv.as_int()) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(EvalError::type_mismatch(format!(
            "cannot apply '{}' to {} and {}",
            op.as_str(),
            lv.type_name(),
            rv.type_name()
        ))),
    }
}

fn check_divisor(lv: &Value, rv: &Value, op: BinOp, msg: &str) -> EvalResult<()> {
    let (_, b) = int_operands(lv, rv, op)?;
    if b == 0 {
        return Err(EvalError::Arithmetic(msg.to_string()));
    }
    Ok(())
}

fn arith(
    lv: &Value,
    rv: &Value,
    op: BinOp,
    apply: fn(i64, i64) -> Option<i64>,
) -> EvalResult<Value> {
    let (a, b) = int_operands(lv, rv, op)?;
    apply(a, b).map(Value::Int).ok_or_else(|| {
        EvalError::Arithmetic(format!("integer overflow in {a} {} {b}", op.as_str()))
    })
}

fn compare(
    lv: &Value,
    rv: &Value,
    op: BinOp,
    test: fn(std::cmp::Ordering) -> bool,
) -> EvalResult<Value> {
    let ordering = match (lv, rv) {
        (Value::Char(a), Value::Char(b)) => a.cmp(b),
        _ => {
            let (a, b) = int_operands(lv, rv, op)?;
            a.cmp(&b)
        }
    };
    Ok(Value::Bool(test(ordering)))
}

// ── Unary ─────────────────────────────────────────────────────────────────────

pub fn negate(value: &Value) -> EvalResult<Value> {
    match value.as_int() {
        Some(n) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::Arithmetic(format!("integer overflow in -{n}"))),
        None => Err(EvalError::type_mismatch(format!(
            "cannot negate {}",
            value.type_name()
        ))),
    }
}

/// Logical not, normalized to 1/0.
pub fn not(value: &Value) -> Value {
    Value::Int(i64::from(!value.is_truthy()))
}

/// `n + 1`; integers only.
pub fn increment(value: &Value) -> EvalResult<Value> {
    step(value, "increment", i64::checked_add)
}

/// `n - 1`; integers only.
pub fn decrement(value: &Value) -> EvalResult<Value> {
    step(value, "decrement", i64::checked_sub)
}

fn step(value: &Value, what: &str, apply: fn(i64, i64) -> Option<i64>) -> EvalResult<Value> {
    let Value::Int(n) = value else {
        return Err(EvalError::type_mismatch(format!(
            "{what} expects int, got {}",
            value.type_name()
        )));
    };
    apply(*n, 1)
        .map(Value::Int)
        .ok_or_else(|| EvalError::Arithmetic(format!("integer overflow in {what}")))
}

// ── Coercion ──────────────────────────────────────────────────────────────────

/// Convert a value for storage in a slot of declared type `ty`.
///
/// `int` slots turn chars into their code point and booleans into 1/0;
/// `char` slots turn integers into the character with that code point.
/// Everything else is stored unchanged.
pub fn coerce(ty: Option<Type>, value: Value) -> EvalResult<Value> {
    match (ty, value) {
        (Some(Type::Int), Value::Char(c)) => Ok(Value::Int(i64::from(u32::from(c)))),
        (Some(Type::Int), Value::Bool(b)) => Ok(Value::Int(i64::from(b))),
        (Some(Type::Char), Value::Int(n)) => int_to_char(n).map(Value::Char),
        (_, value) => Ok(value),
    }
}

/// Convert a value for storage in an array element of kind `ty`.
///
/// Elements hold only ints and chars, so an array never contains an array.
pub fn coerce_element(ty: Option<Type>, value: Value) -> EvalResult<Value> {
    match value {
        Value::Int(_) | Value::Char(_) | Value::Bool(_) => coerce(ty, value),
        other => Err(EvalError::type_mismatch(format!(
            "array elements must be int or char, got {}",
            other.type_name()
        ))),
    }
}

/// The character with code point `n`.
pub fn int_to_char(n: i64) -> EvalResult<char> {
    u32::try_from(n)
        .ok()
        .and_then(char::from_u32)
        .ok_or(EvalError::InvalidChar(n))
}
