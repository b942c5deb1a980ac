use std::collections::HashMap;
use std::env;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{self, Command, Stdio};

use log::debug;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

use super::executor::CommandResult;
use crate::shell::error::ExecError;

/// Signature shared by every builtin: arguments (without the command name),
/// input stream and output stream.
pub type BuiltinFn = fn(&[String], &mut dyn Read, &mut dyn Write) -> Result<i32, ExecError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    handler: BuiltinFn,
}

impl Builtin {
    pub fn run(&self, args: &[String], input: &mut dyn Read, output: &mut dyn Write) -> CommandResult {
        debug!("执行内建命令: {} {:?}", self.name, args);
        let result = (self.handler)(args, input, output).and_then(|status| {
            output.flush().map_err(io_error(self.name))?;
            Ok(status)
        });

        match result {
            // the reading side of a pipeline went away first
            Err(ExecError::BuiltinIo { source, .. }) if source.kind() == io::ErrorKind::BrokenPipe => {
                CommandResult::success()
            }
            other => CommandResult::from(other),
        }
    }
}

pub struct Builtins {
    table: HashMap<&'static str, Builtin>,
}

impl Builtins {
    pub fn new() -> Self {
        let builtins = [
            Builtin { name: "cd", handler: builtin_cd },
            Builtin { name: "pwd", handler: builtin_pwd },
            Builtin { name: "echo", handler: builtin_echo },
            Builtin { name: "kill", handler: builtin_kill },
            Builtin { name: "ps", handler: builtin_ps },
            Builtin { name: "exit", handler: builtin_exit },
        ];
        Self {
            table: builtins.into_iter().map(|b| (b.name, b)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Builtin> {
        self.table.get(name).copied()
    }
}

impl Default for Builtins {
    fn default() -> Self {
        Self::new()
    }
}

fn io_error(name: &'static str) -> impl Fn(io::Error) -> ExecError {
    move |source| ExecError::BuiltinIo { name, source }
}

fn builtin_cd(args: &[String], _input: &mut dyn Read, _output: &mut dyn Write) -> Result<i32, ExecError> {
    let home = env::var("HOME").ok().filter(|home| !home.is_empty());
    let target = match args.first() {
        None => home.unwrap_or_else(|| "/".to_string()),
        Some(dir) => match dir.strip_prefix('~') {
            Some(rest) => {
                let home = home.ok_or_else(|| ExecError::builtin("cd", "HOME not set"))?;
                Path::new(&home)
                    .join(rest.trim_start_matches('/'))
                    .to_string_lossy()
                    .into_owned()
            }
            None => dir.clone(),
        },
    };

    env::set_current_dir(&target)
        .map_err(|e| ExecError::builtin("cd", format!("{}: {}", target, e)))?;
    debug!("工作目录切换到 {}", target);
    Ok(0)
}

fn builtin_pwd(_args: &[String], _input: &mut dyn Read, output: &mut dyn Write) -> Result<i32, ExecError> {
    let cwd = env::current_dir().map_err(io_error("pwd"))?;
    writeln!(output, "{}", cwd.display()).map_err(io_error("pwd"))?;
    Ok(0)
}

fn builtin_echo(args: &[String], _input: &mut dyn Read, output: &mut dyn Write) -> Result<i32, ExecError> {
    writeln!(output, "{}", args.join(" ")).map_err(io_error("echo"))?;
    Ok(0)
}

fn builtin_kill(args: &[String], _input: &mut dyn Read, _output: &mut dyn Write) -> Result<i32, ExecError> {
    let (signal, pid) = match args {
        [] => return Err(ExecError::builtin("kill", "missing pid")),
        [flag, pid, ..] if flag.starts_with('-') => (parse_signal(&flag[1..])?, pid),
        [pid, ..] => (Some(Signal::SIGTERM), pid),
    };
    let pid: i32 = pid
        .parse()
        .map_err(|_| ExecError::builtin("kill", format!("invalid pid: {}", pid)))?;

    kill(Pid::from_raw(pid), signal)
        .map_err(|e| ExecError::builtin("kill", format!("({}): {}", pid, e)))?;
    Ok(0)
}

/// `0` probes the target without delivering anything.
fn parse_signal(number: &str) -> Result<Option<Signal>, ExecError> {
    let invalid = || ExecError::builtin("kill", format!("invalid signal: {}", number));
    match number.parse::<i32>().map_err(|_| invalid())? {
        0 => Ok(None),
        n => Signal::try_from(n).map(Some).map_err(|_| invalid()),
    }
}

fn builtin_ps(_args: &[String], _input: &mut dyn Read, output: &mut dyn Write) -> Result<i32, ExecError> {
    let spawn_error = |source| ExecError::Spawn {
        program: "ps".to_string(),
        source,
    };
    let mut child = Command::new("ps")
        .args(["-e", "-o", "pid,ppid,comm"])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(spawn_error)?;

    let copied = match child.stdout.take() {
        Some(mut stdout) => io::copy(&mut stdout, output).map(|_| ()),
        None => Ok(()),
    };
    let status = child.wait().map_err(|source| ExecError::Wait {
        program: "ps".to_string(),
        source,
    })?;
    copied.map_err(io_error("ps"))?;

    match status.code() {
        Some(0) => Ok(0),
        Some(code) => Err(ExecError::builtin("ps", format!("exited with status {}", code))),
        None => Err(ExecError::builtin("ps", format!("terminated: {}", status))),
    }
}

fn builtin_exit(_args: &[String], _input: &mut dyn Read, _output: &mut dyn Write) -> Result<i32, ExecError> {
    debug!("退出 tinysh...");
    process::exit(0);
}
