// ABOUTME: print/input built-ins, driven through the injectable IoHost capability

use super::IoHost;
use crate::env::Environment;
use crate::error::ScriptError;
use crate::value::Value;
use std::cell::RefCell;
use std::rc::Rc;

use super::define_builtin;

pub fn register(env: &Rc<Environment>, io: Rc<RefCell<dyn IoHost>>) {
    let print_io = io.clone();
    define_builtin(env, "print", move |args: &[Value]| {
        let line = args
            .iter()
            .map(Value::display_string)
            .collect::<Vec<_>>()
            .join(" ");
        print_io.borrow_mut().print_line(&line);
        Ok(Value::Null)
    });

    let input_io = io;
    define_builtin(env, "input", move |args: &[Value]| {
        if args.len() > 1 {
            return Err(super::support::arity_error("input", "0-1", args.len()));
        }
        let prompt = match args.first() {
            Some(v) => v.display_string(),
            None => String::new(),
        };
        input_io
            .borrow_mut()
            .read_line(&prompt)
            .map(Value::string)
            .map_err(|e| ScriptError::runtime(format!("input: {}", e)))
    });
}
