// ABOUTME: Lexical scope chain used by the evaluator

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates the root environment for a program, with no parent.
    pub fn root() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment, used for blocks and function calls.
    pub fn child(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Unconditionally creates/overwrites a binding in this frame, shadowing
    /// any binding of the same name in an enclosing frame.
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Walks this frame and its ancestors looking for `name`.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Rebinds the nearest enclosing frame that already defines `name`. If no
    /// such frame exists anywhere in the chain, defines `name` in the current
    /// (innermost) frame instead — assignment to an undeclared name is
    /// permissive, not an error.
    pub fn set(&self, name: &str, value: Value) {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return;
        }

        if let Some(parent) = &self.parent {
            if parent.defines(name) {
                parent.set(name, value);
                return;
            }
        }

        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    fn defines(&self, name: &str) -> bool {
        if self.bindings.borrow().contains_key(name) {
            return true;
        }
        self.parent.as_ref().map_or(false, |p| p.defines(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::root();
        env.define("x", Value::Int(42));
        assert_eq!(env.get("x"), Some(Value::Int(42)));
    }

    #[test]
    fn undefined_lookup_is_none() {
        let env = Environment::root();
        assert_eq!(env.get("missing"), None);
    }

    #[test]
    fn child_shadows_parent() {
        let parent = Environment::root();
        parent.define("x", Value::Int(1));
        let child = Environment::child(parent.clone());
        child.define("x", Value::Int(2));
        assert_eq!(child.get("x"), Some(Value::Int(2)));
        assert_eq!(parent.get("x"), Some(Value::Int(1)));
    }

    #[test]
    fn child_sees_parent_bindings() {
        let parent = Environment::root();
        parent.define("x", Value::Int(7));
        let child = Environment::child(parent);
        assert_eq!(child.get("x"), Some(Value::Int(7)));
    }

    #[test]
    fn set_rebinds_nearest_enclosing_frame() {
        let parent = Environment::root();
        parent.define("x", Value::Int(1));
        let child = Environment::child(parent.clone());
        child.set("x", Value::Int(99));
        assert_eq!(parent.get("x"), Some(Value::Int(99)));
        assert!(!child
            .bindings
            .borrow()
            .contains_key("x"));
    }

    #[test]
    fn set_on_unbound_name_creates_in_current_frame() {
        let parent = Environment::root();
        let child = Environment::child(parent.clone());
        child.set("y", Value::Int(5));
        assert_eq!(child.get("y"), Some(Value::Int(5)));
        assert_eq!(parent.get("y"), None);
    }
}
