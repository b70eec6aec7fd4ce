// ABOUTME: Built-in procedure registry, organized into categories with one register fn each

use crate::env::Environment;
use crate::value::{Builtin, Value};
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

pub mod array;
pub mod convert;
pub mod io;
pub mod numeric;
pub mod string;
pub mod support;

/// I/O capability consumed by the `print`/`input` built-ins. Kept as a trait so
/// tests can swap in an in-memory host instead of the real terminal streams
/// (§6 of the spec names stdin/stdout as an external collaborator).
pub trait IoHost {
    fn print_line(&mut self, line: &str);
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;
}

/// The real terminal-backed `IoHost` used by the CLI binary.
pub struct StdIoHost;

impl StdIoHost {
    pub fn shared() -> Rc<RefCell<dyn IoHost>> {
        Rc::new(RefCell::new(StdIoHost))
    }
}

impl IoHost for StdIoHost {
    fn print_line(&mut self, line: &str) {
        println!("{}", line);
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        if !prompt.is_empty() {
            print!("{}", prompt);
            io::stdout().flush()?;
        }
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        if line.ends_with('\n') {
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
        }
        Ok(line)
    }
}

/// Wraps a closure as a `Value::HostFn` binding. All built-in registration
/// goes through this so call sites never distinguish a host-callable from a
/// user function (§4.5/§9 "keep the call site variant-agnostic").
pub fn define_builtin<F>(env: &Rc<Environment>, name: &'static str, func: F)
where
    F: Fn(&[Value]) -> Result<Value, crate::error::ScriptError> + 'static,
{
    env.define(
        name,
        Value::HostFn(Rc::new(Builtin {
            name,
            func: Rc::new(func),
        })),
    );
}

/// Registers every built-in procedure in the root environment (§4.5). Called
/// once at evaluator construction; every binding here is a regular variable,
/// so user scripts may shadow or overwrite it like any other name.
pub fn register_builtins(env: &Rc<Environment>, io: Rc<RefCell<dyn IoHost>>) {
    self::io::register(env, io);
    convert::register(env);
    array::register(env);
    numeric::register(env);
    string::register(env);
}
