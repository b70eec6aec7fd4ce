// ABOUTME: CLI entry point — reads a source file, drives the pipeline, maps results to exit codes

mod ast;
mod builtins;
mod env;
mod error;
mod eval;
mod lexer;
mod parser;
mod value;

use builtins::StdIoHost;
use clap::{Parser, ValueEnum};
use env::Environment;
use error::ScriptError;
use eval::Interpreter;
use log::debug;
use std::path::PathBuf;
use std::process::ExitCode;

/// A small imperative scripting language: lex, parse, evaluate a source file.
#[derive(Parser, Debug)]
#[command(name = "scriptlang")]
#[command(author, version, about)]
struct Cli {
    /// Path to the source file to run.
    script: PathBuf,

    /// Logging verbosity for pipeline-stage diagnostics (stderr only; never
    /// affects the script's own `print` output on stdout).
    #[arg(short, long, value_enum, default_value_t = LogLevel::Error)]
    verbosity: LogLevel,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default)]
enum LogLevel {
    #[default]
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _ = simple_logger::init_with_level(cli.verbosity.into());

    match run(&cli.script) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

/// Reads, trims a leading shebang line from, and runs a source file,
/// returning the already-formatted diagnostic line on failure (§6).
fn run(path: &PathBuf) -> Result<(), String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| format!("Error: cannot read '{}': {}", path.display(), e))?;
    let source = strip_shebang(&raw);

    let program = parser::parse(&source).map_err(|e| diagnostic(&e))?;

    let env = Environment::root();
    builtins::register_builtins(&env, StdIoHost::shared());

    debug!("interpretation starting");
    Interpreter::new()
        .interpret(&program, &env)
        .map(|_| ())
        .map_err(|e| diagnostic(&e))
}

/// If the first line begins with `#!`, replace it with a blank line so every
/// subsequent line number still matches the original file (§4.6).
fn strip_shebang(source: &str) -> String {
    if let Some(rest) = source.strip_prefix("#!") {
        let first_newline = rest.find('\n');
        match first_newline {
            Some(idx) => format!("\n{}", &rest[idx + 1..]),
            None => String::new(),
        }
    } else {
        source.to_string()
    }
}

fn diagnostic(err: &ScriptError) -> String {
    err.diagnostic_line()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shebang_is_replaced_with_blank_line_preserving_numbering() {
        let source = "#!/usr/bin/env scriptlang\nlet x = 1;\n";
        let stripped = strip_shebang(source);
        assert_eq!(stripped, "\nlet x = 1;\n");
    }

    #[test]
    fn source_without_shebang_is_untouched() {
        let source = "let x = 1;\n";
        assert_eq!(strip_shebang(source), source);
    }

    #[test]
    fn shebang_only_file_strips_to_empty() {
        assert_eq!(strip_shebang("#!/usr/bin/env scriptlang"), "");
    }
}
