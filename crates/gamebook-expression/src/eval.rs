//! Tree-walking evaluation against the story variables.

use gamebook_core::value::format_number;
use gamebook_core::{EvalError, Value, Variables};

use crate::ast::{BinaryOp, Expr, LogicalOp, UnaryOp};

/// Evaluates statements in order and returns the value of the last one.
///
/// # Errors
///
/// Returns the first `EvalError` any statement produces. Writes made by
/// earlier statements are kept.
pub fn run(statements: &[Expr], variables: &mut Variables) -> Result<Value, EvalError> {
    let mut last = Value::Null;
    for statement in statements {
        last = evaluate(statement, variables)?;
    }
    Ok(last)
}

fn evaluate(expr: &Expr, variables: &mut Variables) -> Result<Value, EvalError> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::List(items) => items
            .iter()
            .map(|item| evaluate(item, variables))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        Expr::Variable(name) => Ok(variables.get(name).cloned().unwrap_or_default()),
        Expr::Identifier(name) => Err(EvalError::UnknownIdentifier(name.clone())),
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, variables)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Negate => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            })
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, variables)?;
            let right = evaluate(right, variables)?;
            Ok(binary(*op, &left, &right))
        }
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, variables)?;
            match (op, left.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => evaluate(right, variables),
            }
        }
        Expr::Conditional {
            condition,
            then,
            otherwise,
        } => {
            if evaluate(condition, variables)?.is_truthy() {
                evaluate(then, variables)
            } else {
                evaluate(otherwise, variables)
            }
        }
        Expr::Assign { target, op, value } => {
            let value = evaluate(value, variables)?;
            let result = match op.binary() {
                None => value,
                Some(arithmetic) => {
                    let previous = variables.get(target).cloned().unwrap_or_default();
                    binary(arithmetic, &previous, &value)
                }
            };
            variables.set(target, result.clone());
            Ok(result)
        }
        Expr::Step { target, delta } => {
            let previous = variables
                .get(target)
                .map_or(Value::Number(f64::NAN), |value| Value::Number(value.to_number()));
            variables.set(target, Value::Number(previous.to_number() + delta));
            Ok(previous)
        }
        Expr::Member { target, name } => {
            let target = evaluate(target, variables)?;
            member(&target, name)
        }
        Expr::Call {
            target,
            method,
            args,
        } => {
            let target = evaluate(target, variables)?;
            let args = args
                .iter()
                .map(|arg| evaluate(arg, variables))
                .collect::<Result<Vec<_>, _>>()?;
            call(&target, method, &args)
        }
        Expr::Index { target, index } => {
            let target = evaluate(target, variables)?;
            let index = evaluate(index, variables)?;
            index_into(&target, &index)
        }
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Subtract => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Multiply => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Divide => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Remainder => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Less => Value::Bool(compare(left, right, |o| o.is_lt())),
        BinaryOp::LessEq => Value::Bool(compare(left, right, |o| o.is_le())),
        BinaryOp::Greater => Value::Bool(compare(left, right, |o| o.is_gt())),
        BinaryOp::GreaterEq => Value::Bool(compare(left, right, |o| o.is_ge())),
        BinaryOp::LooseEq => Value::Bool(loose_eq(left, right)),
        BinaryOp::LooseNotEq => Value::Bool(!loose_eq(left, right)),
        BinaryOp::StrictEq => Value::Bool(strict_eq(left, right)),
        BinaryOp::StrictNotEq => Value::Bool(!strict_eq(left, right)),
    }
}

fn concatenates(value: &Value) -> bool {
    matches!(value, Value::Text(_) | Value::List(_))
}

fn add(left: &Value, right: &Value) -> Value {
    if concatenates(left) || concatenates(right) {
        Value::Text(format!("{left}{right}"))
    } else {
        Value::Number(left.to_number() + right.to_number())
    }
}

fn compare(left: &Value, right: &Value, test: fn(std::cmp::Ordering) -> bool) -> bool {
    if let (Value::Text(a), Value::Text(b)) = (left, right) {
        return test(a.cmp(b));
    }
    left.to_number()
        .partial_cmp(&right.to_number())
        .is_some_and(test)
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a == b,
        _ => left == right,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Null, Value::Null) => true,
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::Text(a), Value::Text(b)) => a == b,
        (Value::List(_), Value::List(_)) => left == right,
        (Value::List(_), _) | (_, Value::List(_)) => left.to_string() == right.to_string(),
        _ => left.to_number() == right.to_number(),
    }
}

fn member(target: &Value, name: &str) -> Result<Value, EvalError> {
    match (target, name) {
        (Value::Null, _) => Err(EvalError::Type(format!(
            "cannot read `{name}` of a missing value"
        ))),
        (Value::Text(text), "length") => Ok(length(text.chars().count())),
        (Value::List(items), "length") => Ok(length(items.len())),
        _ => Ok(Value::Null),
    }
}

#[allow(clippy::cast_precision_loss)]
fn length(len: usize) -> Value {
    Value::Number(len as f64)
}

fn call(target: &Value, method: &str, args: &[Value]) -> Result<Value, EvalError> {
    let needle = args.first().cloned().unwrap_or_default();
    match (target, method) {
        (Value::List(items), "includes") => {
            Ok(Value::Bool(items.iter().any(|item| strict_eq(item, &needle))))
        }
        (Value::Text(text), "includes") => Ok(Value::Bool(text.contains(&needle.to_string()))),
        (Value::List(items), "indexOf") => Ok(items
            .iter()
            .position(|item| strict_eq(item, &needle))
            .map_or(Value::Number(-1.0), position)),
        (Value::Text(text), "toUpperCase") => Ok(Value::Text(text.to_uppercase())),
        (Value::Text(text), "toLowerCase") => Ok(Value::Text(text.to_lowercase())),
        (Value::Number(value), "toString") => Ok(Value::Text(format_number(*value))),
        _ => Err(EvalError::Type(format!("`{method}` is not a method here"))),
    }
}

#[allow(clippy::cast_precision_loss)]
fn position(index: usize) -> Value {
    Value::Number(index as f64)
}

fn index_into(target: &Value, index: &Value) -> Result<Value, EvalError> {
    if target.is_null() {
        return Err(EvalError::Type("cannot index a missing value".to_owned()));
    }
    let number = index.to_number();
    if number.fract() != 0.0 || number < 0.0 {
        return Ok(Value::Null);
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let slot = number as usize;
    Ok(match target {
        Value::List(items) => items.get(slot).cloned().unwrap_or_default(),
        Value::Text(text) => text
            .chars()
            .nth(slot)
            .map_or(Value::Null, |c| Value::Text(c.to_string())),
        _ => Value::Null,
    })
}
