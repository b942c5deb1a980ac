use std::fs::File;
use std::io::{self, Read, Write};
use std::process::Stdio;

use os_pipe::{PipeReader, PipeWriter};

use crate::shell::error::ExecError;

/// Where a stage reads its standard input from.
pub enum Input {
    Inherit,
    File(File),
    Pipe(PipeReader),
}

impl Input {
    /// Opens `path` for reading, or inherits the shell's stdin.
    pub fn open(path: Option<&str>) -> Result<Self, ExecError> {
        match path {
            None => Ok(Input::Inherit),
            Some(path) => File::open(path)
                .map(Input::File)
                .map_err(|source| ExecError::Redirect {
                    path: path.to_string(),
                    source,
                }),
        }
    }

    pub fn into_stdio(self) -> Stdio {
        match self {
            Input::Inherit => Stdio::inherit(),
            Input::File(file) => file.into(),
            Input::Pipe(reader) => reader.into(),
        }
    }

    pub fn into_reader(self) -> Box<dyn Read + Send> {
        match self {
            Input::Inherit => Box::new(io::stdin()),
            Input::File(file) => Box::new(file),
            Input::Pipe(reader) => Box::new(reader),
        }
    }
}

/// Where a stage writes its standard output to.
pub enum Output {
    Inherit,
    File(File),
    Pipe(PipeWriter),
}

impl Output {
    /// Creates (or truncates) `path`, or inherits the shell's stdout.
    pub fn create(path: Option<&str>) -> Result<Self, ExecError> {
        match path {
            None => Ok(Output::Inherit),
            Some(path) => File::create(path)
                .map(Output::File)
                .map_err(|source| ExecError::Redirect {
                    path: path.to_string(),
                    source,
                }),
        }
    }

    pub fn into_stdio(self) -> Stdio {
        match self {
            Output::Inherit => Stdio::inherit(),
            Output::File(file) => file.into(),
            Output::Pipe(writer) => writer.into(),
        }
    }

    pub fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            Output::Inherit => Box::new(io::stdout()),
            Output::File(file) => Box::new(file),
            Output::Pipe(writer) => Box::new(writer),
        }
    }
}
