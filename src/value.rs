// ABOUTME: Dynamic value representation shared across the evaluator and built-ins

use crate::ast::Stmt;
use crate::env::Environment;
use crate::error::ScriptError;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

#[derive(Clone)]
pub struct FunctionValue {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub closure: Rc<Environment>,
}

pub type BuiltinImpl = Rc<dyn Fn(&[Value]) -> Result<Value, ScriptError>>;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinImpl,
}

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<String>),
    Array(Rc<RefCell<Vec<Value>>>),
    Function(Rc<FunctionValue>),
    HostFn(Rc<Builtin>),
}

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::Str(Rc::new(s.into()))
    }

    pub fn array(items: Vec<Value>) -> Value {
        Value::Array(Rc::new(RefCell::new(items)))
    }

    /// The seven `type()` tags from the built-in registry, plus "object" for
    /// anything reachable that doesn't fit the other six (unused today, kept
    /// because `type()` promises it as a possible result).
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) | Value::Float(_) => "number",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Function(_) | Value::HostFn(_) => "function",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Array(_) | Value::Function(_) | Value::HostFn(_) => true,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Float(_))
    }

    /// The textual form used by string concatenation (`+`) and `print`.
    pub fn display_string(&self) -> String {
        let mut seen = HashSet::new();
        self.display_with_seen(&mut seen)
    }

    /// `display_string`, tracking the arrays currently on the path from the
    /// root so a self-referential array (built via `push(a, a)`) renders as
    /// `[...]` on the cycle instead of recursing until the stack overflows.
    fn display_with_seen(&self, seen: &mut HashSet<*const RefCell<Vec<Value>>>) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => (**s).clone(),
            Value::Array(items) => {
                let ptr = Rc::as_ptr(items);
                if !seen.insert(ptr) {
                    return "[...]".to_string();
                }
                let rendered: Vec<String> = items
                    .borrow()
                    .iter()
                    .map(|v| v.repr_with_seen(seen))
                    .collect();
                seen.remove(&ptr);
                format!("[{}]", rendered.join(", "))
            }
            Value::Function(f) => format!("<function {}>", f.name),
            Value::HostFn(b) => format!("<built-in {}>", b.name),
        }
    }

    /// Like `display_with_seen` but quotes strings, used when rendering array elements.
    fn repr_with_seen(&self, seen: &mut HashSet<*const RefCell<Vec<Value>>>) -> String {
        match self {
            Value::Str(s) => format!("\"{}\"", s),
            other => other.display_with_seen(seen),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_nan() {
        "nan".to_string()
    } else if f.is_infinite() {
        if f > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        }
    } else {
        format!("{}", f)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                (*a as f64) == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::HostFn(a), Value::HostFn(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness_matches_spec() {
        assert!(!Value::Null.is_truthy());
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(1).is_truthy());
        assert!(!Value::string("").is_truthy());
        assert!(Value::string("x").is_truthy());
        assert!(Value::array(vec![]).is_truthy());
    }

    #[test]
    fn array_equality_is_reference_identity() {
        let a = Value::array(vec![Value::Int(1)]);
        let b = Value::array(vec![Value::Int(1)]);
        assert_ne!(a, b);
        let c = a.clone();
        assert_eq!(a, c);
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
    }

    #[test]
    fn display_string_does_not_overflow_on_self_referential_array() {
        let a = Value::array(vec![Value::Int(1)]);
        if let Value::Array(items) = &a {
            items.borrow_mut().push(a.clone());
        }
        assert_eq!(a.display_string(), "[1, [...]]");
    }

    #[test]
    fn type_name_tags() {
        assert_eq!(Value::Null.type_name(), "null");
        assert_eq!(Value::Bool(true).type_name(), "boolean");
        assert_eq!(Value::Int(1).type_name(), "number");
        assert_eq!(Value::Float(1.0).type_name(), "number");
        assert_eq!(Value::string("x").type_name(), "string");
        assert_eq!(Value::array(vec![]).type_name(), "array");
    }
}
