use std::io;

use thiserror::Error;

/// Failure while splitting a line into tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated quote {quote} starting at column {column}")]
    UnterminatedQuote { quote: char, column: usize },
}

/// Failure while turning tokens into segments and command units.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty segment")]
    EmptySegment,
    #[error("empty command in pipeline")]
    EmptyPipelineCommand,
    #[error("empty command")]
    EmptyCommand,
    #[error("expected filename after {0}")]
    MissingRedirectTarget(char),
    #[error("unexpected token {0:?}")]
    UnexpectedToken(String),
}

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("{path}: {source}")]
    Redirect {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("pipe: {0}")]
    Pipe(#[source] io::Error),
    #[error("{name}: {message}")]
    Builtin { name: &'static str, message: String },
    #[error("{name}: {source}")]
    BuiltinIo {
        name: &'static str,
        #[source]
        source: io::Error,
    },
    #[error("builtin {0} panicked")]
    TaskPanicked(String),
}

impl ExecError {
    pub(crate) fn builtin(name: &'static str, message: impl Into<String>) -> Self {
        ExecError::Builtin {
            name,
            message: message.into(),
        }
    }
}

/// Errors that abandon a whole input line before anything runs.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("tokenize: {0}")]
    Lex(#[from] LexError),
    #[error("parse: {0}")]
    Parse(#[from] ParseError),
}
