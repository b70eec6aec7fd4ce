// ABOUTME: String built-ins: substring, replace, split, tolower, toupper, startswith, endswith

use super::define_builtin;
use super::support::{expect_int, expect_string, require_range};
use crate::env::Environment;
use crate::error::ScriptError;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    define_builtin(env, "substring", |args: &[Value]| {
        require_range("substring", args, 2, 3)?;
        let s = expect_string("substring", &args[0])?;
        let chars: Vec<char> = s.chars().collect();
        let len = chars.len() as i64;
        let start = expect_int("substring", &args[1])?.clamp(0, len) as usize;
        let end = match args.get(2) {
            Some(v) => expect_int("substring", v)?.clamp(0, len) as usize,
            None => len as usize,
        };
        if start >= end {
            return Ok(Value::string(""));
        }
        Ok(Value::string(chars[start..end].iter().collect::<String>()))
    });

    define_builtin(env, "replace", |args: &[Value]| {
        require_range("replace", args, 3, 3)?;
        let s = expect_string("replace", &args[0])?;
        let from = expect_string("replace", &args[1])?;
        let to = expect_string("replace", &args[2])?;
        Ok(Value::string(s.replace(from, to)))
    });

    define_builtin(env, "split", |args: &[Value]| {
        require_range("split", args, 1, 2)?;
        let s = expect_string("split", &args[0])?;
        let sep = match args.get(1) {
            Some(v) => expect_string("split", v)?.to_string(),
            None => " ".to_string(),
        };
        let parts: Vec<Value> = if sep.is_empty() {
            s.chars().map(|c| Value::string(c.to_string())).collect()
        } else {
            s.split(sep.as_str()).map(Value::string).collect()
        };
        Ok(Value::array(parts))
    });

    define_builtin(env, "tolower", |args: &[Value]| {
        require_range("tolower", args, 1, 1)?;
        let s = expect_string("tolower", &args[0])?;
        Ok(Value::string(s.to_lowercase()))
    });

    define_builtin(env, "toupper", |args: &[Value]| {
        require_range("toupper", args, 1, 1)?;
        let s = expect_string("toupper", &args[0])?;
        Ok(Value::string(s.to_uppercase()))
    });

    define_builtin(env, "startswith", |args: &[Value]| {
        require_range("startswith", args, 2, 2)?;
        let s = expect_string("startswith", &args[0])?;
        let prefix = expect_string("startswith", &args[1])?;
        Ok(Value::Bool(s.starts_with(prefix)))
    });

    define_builtin(env, "endswith", |args: &[Value]| {
        require_range("endswith", args, 2, 2)?;
        let s = expect_string("endswith", &args[0])?;
        let suffix = expect_string("endswith", &args[1])?;
        Ok(Value::Bool(s.ends_with(suffix)))
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
    fn substring_half_open_defaults_to_end() {
        let env = fresh_env();
        let result = call(&env, "substring", &[Value::string("hello"), Value::Int(1)]).unwrap();
        assert_eq!(result, Value::string("ello"));
    }

    #[test]
    fn replace_all_occurrences() {
        let env = fresh_env();
        let result = call(
            &env,
            "replace",
            &[
                Value::string("a-b-c"),
                Value::string("-"),
                Value::string("+"),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::string("a+b+c"));
    }

    #[test]
    fn split_on_separator() {
        let env = fresh_env();
        let result = call(
            &env,
            "split",
            &[Value::string("a,b,c"), Value::string(",")],
        )
        .unwrap();
        assert_eq!(
            result,
            Value::array(vec![
                Value::string("a"),
                Value::string("b"),
                Value::string("c")
            ])
        );
    }

    #[test]
    fn case_conversions() {
        let env = fresh_env();
        assert_eq!(
            call(&env, "toupper", &[Value::string("abc")]).unwrap(),
            Value::string("ABC")
        );
        assert_eq!(
            call(&env, "tolower", &[Value::string("ABC")]).unwrap(),
            Value::string("abc")
        );
    }

    #[test]
    fn starts_and_ends_with() {
        let env = fresh_env();
        assert_eq!(
            call(
                &env,
                "startswith",
                &[Value::string("hello"), Value::string("he")]
            )
            .unwrap(),
            Value::Bool(true)
        );
        assert_eq!(
            call(
                &env,
                "endswith",
                &[Value::string("hello"), Value::string("lo")]
            )
            .unwrap(),
            Value::Bool(true)
        );
    }
}
