// ABOUTME: Numeric built-ins: abs, pow, sqrt, floor, ceil, round, min, max

use super::define_builtin;
use super::support::{arity_error, compare_values, expect_number, require_range};
use crate::env::Environment;
use crate::error::ScriptError;
use crate::value::Value;
use std::rc::Rc;

pub fn register(env: &Rc<Environment>) {
    define_builtin(env, "abs", |args: &[Value]| {
        require_range("abs", args, 1, 1)?;
        match &args[0] {
            Value::Int(i) => Ok(Value::Int(i.abs())),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            other => Err(super::support::type_error("abs", "a number", other)),
        }
    });

    define_builtin(env, "pow", |args: &[Value]| {
        require_range("pow", args, 2, 2)?;
        if let (Value::Int(base), Value::Int(exp)) = (&args[0], &args[1]) {
            if *exp >= 0 {
                // Stay integer only when the exponent fits a u32 and the
                // result doesn't overflow i64; otherwise fall back to the
                // float path rather than panicking on either edge.
                if let Some(result) = u32::try_from(*exp)
                    .ok()
                    .and_then(|e| base.checked_pow(e))
                {
                    return Ok(Value::Int(result));
                }
                return Ok(Value::Float((*base as f64).powf(*exp as f64)));
            }
        }
        let base = expect_number("pow", &args[0])?;
        let exp = expect_number("pow", &args[1])?;
        Ok(Value::Float(base.powf(exp)))
    });

    define_builtin(env, "sqrt", |args: &[Value]| {
        require_range("sqrt", args, 1, 1)?;
        let v = expect_number("sqrt", &args[0])?;
        Ok(Value::Float(v.sqrt()))
    });

    define_builtin(env, "floor", |args: &[Value]| {
        require_range("floor", args, 1, 1)?;
        let v = expect_number("floor", &args[0])?;
        Ok(Value::Int(v.floor() as i64))
    });

    define_builtin(env, "ceil", |args: &[Value]| {
        require_range("ceil", args, 1, 1)?;
        let v = expect_number("ceil", &args[0])?;
        Ok(Value::Int(v.ceil() as i64))
    });

    define_builtin(env, "round", |args: &[Value]| {
        require_range("round", args, 1, 2)?;
        let v = expect_number("round", &args[0])?;
        match args.get(1) {
            None => Ok(Value::Int(v.round() as i64)),
            Some(ndigits) => {
                let n = super::support::expect_int("round", ndigits)?;
                let factor = 10f64.powi(n as i32);
                Ok(Value::Float((v * factor).round() / factor))
            }
        }
    });

    define_builtin(env, "min", |args: &[Value]| {
        if args.is_empty() {
            return Err(arity_error("min", "at least 1", 0));
        }
        fold_extreme("min", args, std::cmp::Ordering::Less)
    });

    define_builtin(env, "max", |args: &[Value]| {
        if args.is_empty() {
            return Err(arity_error("max", "at least 1", 0));
        }
        fold_extreme("max", args, std::cmp::Ordering::Greater)
    });
}

fn fold_extreme(
    name: &str,
    args: &[Value],
    wanted: std::cmp::Ordering,
) -> Result<Value, ScriptError> {
    let mut best = args[0].clone();
    for candidate in &args[1..] {
        if compare_values(name, candidate, &best)? == wanted {
            best = candidate.clone();
        }
    }
    Ok(best)
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
    fn abs_handles_int_and_float() {
        let env = fresh_env();
        assert_eq!(call(&env, "abs", &[Value::Int(-4)]).unwrap(), Value::Int(4));
        assert_eq!(
            call(&env, "abs", &[Value::Float(-1.5)]).unwrap(),
            Value::Float(1.5)
        );
    }

    #[test]
    fn pow_stays_integer_for_nonnegative_int_exponents() {
        let env = fresh_env();
        assert_eq!(
            call(&env, "pow", &[Value::Int(2), Value::Int(10)]).unwrap(),
            Value::Int(1024)
        );
    }

    #[test]
    fn pow_falls_back_to_float_on_int_overflow_instead_of_panicking() {
        let env = fresh_env();
        assert_eq!(
            call(&env, "pow", &[Value::Int(2), Value::Int(64)]).unwrap(),
            Value::Float(2f64.powf(64.0))
        );
    }

    #[test]
    fn pow_handles_exponents_that_overflow_u32_without_truncating() {
        let env = fresh_env();
        assert_eq!(
            call(&env, "pow", &[Value::Int(2), Value::Int(4_294_967_297)]).unwrap(),
            Value::Float(2f64.powf(4_294_967_297.0))
        );
    }

    #[test]
    fn round_with_ndigits() {
        let env = fresh_env();
        assert_eq!(
            call(&env, "round", &[Value::Float(3.14159), Value::Int(2)]).unwrap(),
            Value::Float(3.14)
        );
    }

    #[test]
    fn min_max_variadic() {
        let env = fresh_env();
        let nums = vec![Value::Int(3), Value::Int(1), Value::Int(7), Value::Int(2)];
        assert_eq!(call(&env, "min", &nums).unwrap(), Value::Int(1));
        assert_eq!(call(&env, "max", &nums).unwrap(), Value::Int(7));
    }

    #[test]
    fn min_requires_at_least_one_argument() {
        let env = fresh_env();
        assert!(call(&env, "min", &[]).is_err());
    }
}
