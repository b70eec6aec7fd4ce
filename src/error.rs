// ABOUTME: Error types shared by the lexer, parser and evaluator

use thiserror::Error;

/// A single diagnostic produced anywhere in the pipeline.
///
/// `Syntax` covers both lexer and parser failures (the spec treats them as
/// one kind, distinguished only by the message); `Runtime` covers anything
/// raised while walking the AST.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScriptError {
    #[error("{message} at line {line}, column {column}")]
    Syntax {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("{message}")]
    Runtime { message: String },
}

impl ScriptError {
    pub fn syntax(message: impl Into<String>, line: usize, column: usize) -> Self {
        ScriptError::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        ScriptError::Runtime {
            message: message.into(),
        }
    }

    /// The prefix the CLI uses when reporting this error (§6 of the spec).
    pub fn diagnostic_line(&self) -> String {
        match self {
            ScriptError::Syntax { .. } => format!("Syntax Error: {}", self),
            ScriptError::Runtime { .. } => format!("Runtime Error: {}", self),
        }
    }
}
