// ABOUTME: Shared argument-checking helpers used by the built-in procedures

use crate::error::ScriptError;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

pub fn arity_error(name: &str, expected: &str, got: usize) -> ScriptError {
    ScriptError::runtime(format!(
        "{}: expected {} argument(s), got {}",
        name, expected, got
    ))
}

pub fn type_error(name: &str, expected: &str, got: &Value) -> ScriptError {
    ScriptError::runtime(format!(
        "{}: expected {}, got {}",
        name,
        expected,
        got.type_name()
    ))
}

pub fn require_range(name: &str, args: &[Value], min: usize, max: usize) -> Result<(), ScriptError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            min.to_string()
        } else {
            format!("{}-{}", min, max)
        };
        return Err(arity_error(name, &expected, args.len()));
    }
    Ok(())
}

pub fn expect_number(name: &str, v: &Value) -> Result<f64, ScriptError> {
    v.as_f64().ok_or_else(|| type_error(name, "a number", v))
}

pub fn expect_int(name: &str, v: &Value) -> Result<i64, ScriptError> {
    match v {
        Value::Int(i) => Ok(*i),
        Value::Float(f) if f.fract() == 0.0 => Ok(*f as i64),
        _ => Err(type_error(name, "an integer", v)),
    }
}

pub fn expect_string<'a>(name: &str, v: &'a Value) -> Result<&'a str, ScriptError> {
    match v {
        Value::Str(s) => Ok(s.as_str()),
        _ => Err(type_error(name, "a string", v)),
    }
}

pub fn expect_array(name: &str, v: &Value) -> Result<Rc<RefCell<Vec<Value>>>, ScriptError> {
    match v {
        Value::Array(a) => Ok(a.clone()),
        _ => Err(type_error(name, "an array", v)),
    }
}

pub fn compare_values(name: &str, a: &Value, b: &Value) -> Result<std::cmp::Ordering, ScriptError> {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => Ok(x.as_str().cmp(y.as_str())),
        _ => {
            let x = expect_number(name, a)?;
            let y = expect_number(name, b)?;
            x.partial_cmp(&y)
                .ok_or_else(|| ScriptError::runtime(format!("{}: cannot compare NaN", name)))
        }
    }
}
