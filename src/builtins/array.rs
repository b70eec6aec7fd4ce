// ABOUTME: Array built-ins: push/append, pop, join, slice, range

use super::define_builtin;
use super::support::{arity_error, expect_array, expect_int, require_range, type_error};
use crate::env::Environment;
use crate::error::ScriptError;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    define_builtin(env, "push", push_impl);
    define_builtin(env, "append", push_impl);

    define_builtin(env, "pop", |args: &[Value]| {
        require_range("pop", args, 1, 1)?;
        let arr = expect_array("pop", &args[0])?;
        arr.borrow_mut()
            .pop()
            .ok_or_else(|| ScriptError::runtime("pop: array is empty"))
    });

    define_builtin(env, "join", |args: &[Value]| {
        require_range("join", args, 1, 2)?;
        let arr = expect_array("join", &args[0])?;
        let sep = match args.get(1) {
            Some(v) => v.display_string(),
            None => String::new(),
        };
        let rendered: Vec<String> = arr.borrow().iter().map(Value::display_string).collect();
        Ok(Value::string(rendered.join(&sep)))
    });

    define_builtin(env, "slice", |args: &[Value]| {
        require_range("slice", args, 1, 3)?;
        let arr = expect_array("slice", &args[0])?;
        let len = arr.borrow().len() as i64;

        let start = match args.get(1) {
            Some(v) => expect_int("slice", v)?,
            None => 0,
        };
        let end = match args.get(2) {
            Some(v) => expect_int("slice", v)?,
            None => len,
        };

        let start = start.clamp(0, len) as usize;
        let end = end.clamp(0, len) as usize;
        if start >= end {
            return Ok(Value::array(Vec::new()));
        }
        Ok(Value::array(arr.borrow()[start..end].to_vec()))
    });

    define_builtin(env, "range", |args: &[Value]| {
        require_range("range", args, 1, 3)?;
        let a = expect_int("range", &args[0])?;
        let (start, end) = match args.get(1) {
            Some(v) => (a, expect_int("range", v)?),
            None => (0, a),
        };
        let step = match args.get(2) {
            Some(v) => expect_int("range", v)?,
            None => 1,
        };
        if step == 0 {
            return Err(ScriptError::runtime("range: step cannot be zero"));
        }

        let mut items = Vec::new();
        if step > 0 {
            let mut i = start;
            while i < end {
                items.push(Value::Int(i));
                i += step;
            }
        } else {
            let mut i = start;
            while i > end {
                items.push(Value::Int(i));
                i += step;
            }
        }
        Ok(Value::array(items))
    });
}

fn push_impl(args: &[Value]) -> Result<Value, ScriptError> {
    if args.len() != 2 {
        return Err(arity_error("push", "2", args.len()));
    }
    let arr = match &args[0] {
        Value::Array(a) => a.clone(),
        other => return Err(type_error("push", "an array", other)),
    };
    arr.borrow_mut().push(args[1].clone());
    Ok(args[0].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_builtins;
    use crate::builtins::StdIoHost;

    fn fresh_env() -> Rc<Environment> {
        let env = Environment::root();
        register_builtins(&env, StdIoHost::shared());
        env
    }

    fn call(env: &Rc<Environment>, name: &str, args: &[Value]) -> Result<Value, ScriptError> {
        match env.get(name).unwrap() {
            Value::HostFn(b) => (b.func)(args),
            _ => panic!("{} should be a host-callable", name),
        }
    }

    #[test]
    fn push_mutates_and_returns_same_array() {
        let env = fresh_env();
        let arr = Value::array(vec![Value::Int(1)]);
        let result = call(&env, "push", &[arr.clone(), Value::Int(2)]).unwrap();
        assert_eq!(result, arr);
        match arr {
            Value::Array(a) => assert_eq!(a.borrow().len(), 2),
            _ => unreachable!(),
        }
    }

    #[test]
    fn pop_empty_array_errors() {
        let env = fresh_env();
        let err = call(&env, "pop", &[Value::array(vec![])]).unwrap_err();
        assert!(format!("{}", err).contains("empty"));
    }

    #[test]
    fn join_default_separator_is_empty() {
        let env = fresh_env();
        let arr = Value::array(vec![Value::Int(1), Value::Int(2)]);
        let result = call(&env, "join", &[arr]).unwrap();
        assert_eq!(result, Value::string("12"));
    }

    #[test]
    fn slice_half_open_defaults() {
        let env = fresh_env();
        let arr = Value::array(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let result = call(&env, "slice", &[arr, Value::Int(1)]).unwrap();
        assert_eq!(result, Value::array(vec![Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn range_single_arg_starts_at_zero() {
        let env = fresh_env();
        let result = call(&env, "range", &[Value::Int(3)]).unwrap();
        assert_eq!(
            result,
            Value::array(vec![Value::Int(0), Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn range_len_matches_len_n_invariant() {
        let env = fresh_env();
        for n in [0, 1, 5] {
            let result = call(&env, "range", &[Value::Int(n)]).unwrap();
            let len_result = call(&env, "len", &[result]).unwrap();
            assert_eq!(len_result, Value::Int(n.max(0)));
        }
    }
}
