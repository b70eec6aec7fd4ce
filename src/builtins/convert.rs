// ABOUTME: Coercion and introspection built-ins: len, str, int, bool, type

use super::define_builtin;
use super::support::{arity_error, require_range, type_error};
use crate::env::Environment;
use crate::error::ScriptError;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    define_builtin(env, "len", |args: &[Value]| {
        require_range("len", args, 1, 1)?;
        match &args[0] {
            Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
            Value::Array(a) => Ok(Value::Int(a.borrow().len() as i64)),
            other => Err(type_error("len", "a string or array", other)),
        }
    });

    define_builtin(env, "str", |args: &[Value]| {
        require_range("str", args, 1, 1)?;
        Ok(Value::string(args[0].display_string()))
    });

    define_builtin(env, "int", |args: &[Value]| {
        require_range("int", args, 1, 1)?;
        match &args[0] {
            Value::Int(i) => Ok(Value::Int(*i)),
            // Host behavior: truncate toward zero, not round or floor.
            Value::Float(f) => Ok(Value::Int(f.trunc() as i64)),
            Value::Bool(b) => Ok(Value::Int(if *b { 1 } else { 0 })),
            Value::Str(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| ScriptError::runtime(format!("int: cannot convert '{}' to int", s))),
            other => Err(type_error("int", "a number, bool, or string", other)),
        }
    });

    define_builtin(env, "bool", |args: &[Value]| {
        require_range("bool", args, 1, 1)?;
        Ok(Value::Bool(args[0].is_truthy()))
    });

    define_builtin(env, "type", |args: &[Value]| {
        if args.len() != 1 {
            return Err(arity_error("type", "1", args.len()));
        }
        Ok(Value::string(args[0].type_name()))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::{register_builtins, StdIoHost};

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
    fn int_truncates_float_toward_zero() {
        let env = fresh_env();
        assert_eq!(call(&env, "int", &[Value::Float(3.7)]).unwrap(), Value::Int(3));
        assert_eq!(
            call(&env, "int", &[Value::Float(-3.7)]).unwrap(),
            Value::Int(-3)
        );
    }

    #[test]
    fn int_parses_integer_strings() {
        let env = fresh_env();
        assert_eq!(
            call(&env, "int", &[Value::string("42")]).unwrap(),
            Value::Int(42)
        );
    }

    #[test]
    fn int_rejects_float_formatted_strings() {
        let env = fresh_env();
        assert!(call(&env, "int", &[Value::string("3.7")]).is_err());
    }

    #[test]
    fn int_rejects_garbage_strings() {
        let env = fresh_env();
        assert!(call(&env, "int", &[Value::string("abc")]).is_err());
    }
}
