use std::os::unix::process::ExitStatusExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;

use log::{debug, error, warn};

use super::builtins::Builtins;
use super::redirect::{Input, Output};
use crate::shell::error::ExecError;
use crate::shell::job_manager::JobController;
use crate::shell::parser::ast::{CommandUnit, NextOp, Segment};

/// Outcome of running one command, pipeline or segment.
#[derive(Debug)]
pub struct CommandResult {
    pub status: i32,
    pub error: Option<ExecError>,
}

impl CommandResult {
    pub fn success() -> CommandResult {
        CommandResult::from_status(0)
    }

    pub fn from_status(status: i32) -> CommandResult {
        CommandResult {
            status,
            error: None,
        }
    }

    pub fn error(error: ExecError) -> CommandResult {
        CommandResult {
            status: 1,
            error: Some(error),
        }
    }

    /// Signal deaths map to `128 + signo`.
    pub fn from_exit(status: ExitStatus) -> CommandResult {
        match (status.code(), status.signal()) {
            (Some(code), _) => CommandResult::from_status(code),
            (None, Some(signal)) => CommandResult::from_status(128 + signal),
            (None, None) => CommandResult::from_status(1),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none() && self.status == 0
    }
}

impl From<Result<i32, ExecError>> for CommandResult {
    fn from(result: Result<i32, ExecError>) -> Self {
        match result {
            Ok(status) => CommandResult::from_status(status),
            Err(e) => CommandResult::error(e),
        }
    }
}

pub struct Executor {
    jobs: Arc<JobController>,
    builtins: Builtins,
}

impl Executor {
    pub fn new(jobs: Arc<JobController>) -> Self {
        Self {
            jobs,
            builtins: Builtins::new(),
        }
    }

    pub fn jobs(&self) -> &Arc<JobController> {
        &self.jobs
    }

    /// Runs the segments of one line left to right with `&&` / `||`
    /// short-circuiting. `observe` sees the index and result of every
    /// segment that actually ran. Returns the final status.
    pub fn execute<F>(&self, segments: &[Segment], mut observe: F) -> bool
    where
        F: FnMut(usize, &CommandResult),
    {
        let mut last_status = true;

        for (index, segment) in segments.iter().enumerate() {
            if index > 0 {
                let skip = match segments[index - 1].next_op {
                    NextOp::And => !last_status,
                    NextOp::Or => last_status,
                    NextOp::None => false,
                };
                if skip {
                    debug!("跳过第 {} 段, last_status={}", index, last_status);
                    continue;
                }
            }

            let result = self.run_segment(segment);
            last_status = result.is_success();
            observe(index, &result);
        }

        last_status
    }

    pub fn run_segment(&self, segment: &Segment) -> CommandResult {
        match segment.pipeline.as_slice() {
            [] => CommandResult::success(),
            [unit] => self.run_single(unit),
            units => self.run_pipeline(units),
        }
    }

    fn run_single(&self, unit: &CommandUnit) -> CommandResult {
        let streams = Input::open(unit.stdin_path.as_deref())
            .and_then(|input| Ok((input, Output::create(unit.stdout_path.as_deref())?)));
        let (input, output) = match streams {
            Ok(streams) => streams,
            Err(e) => return CommandResult::error(e),
        };

        if let Some(builtin) = self.builtins.get(unit.program()) {
            let mut reader = input.into_reader();
            let mut writer = output.into_writer();
            return builtin.run(unit.arguments(), &mut *reader, &mut *writer);
        }

        let mut child = match self.spawn(unit, input, output, None) {
            Ok(child) => child,
            Err(e) => return CommandResult::error(e),
        };
        let _foreground = self.jobs.enter_foreground(child.id());
        wait_child(unit.program(), &mut child)
    }

    /// Spawns `unit` with the given streams, placed in process group `group`
    /// (a new one when `None`). The shell's copies of the streams are
    /// released before returning.
    fn spawn(
        &self,
        unit: &CommandUnit,
        input: Input,
        output: Output,
        group: Option<u32>,
    ) -> Result<Child, ExecError> {
        debug!("执行外部命令: {:?}", unit.args);
        let mut command = Command::new(unit.program());
        command
            .args(unit.arguments())
            .stdin(input.into_stdio())
            .stdout(output.into_stdio())
            .stderr(Stdio::inherit());
        self.jobs.place(&mut command, group);

        command.spawn().map_err(|source| ExecError::Spawn {
            program: unit.program().to_string(),
            source,
        })
    }

    fn run_pipeline(&self, units: &[CommandUnit]) -> CommandResult {
        let stages = units.len();
        let mut readers = Vec::with_capacity(stages - 1);
        let mut writers = Vec::with_capacity(stages - 1);
        for _ in 1..stages {
            match os_pipe::pipe() {
                Ok((reader, writer)) => {
                    readers.push(reader);
                    writers.push(writer);
                }
                Err(e) => return CommandResult::error(ExecError::Pipe(e)),
            }
        }
        let mut readers = readers.into_iter();
        let mut writers = writers.into_iter();

        thread::scope(|scope| {
            let mut failures = Vec::new();
            let mut children = Vec::new();
            let mut tasks = Vec::new();
            let mut foreground = None;
            let mut leader = None;

            for (index, unit) in units.iter().enumerate() {
                if index > 0 && unit.stdin_path.is_some() {
                    warn!("管道中间的输入重定向被忽略: {:?}", unit.args);
                }
                if index + 1 < stages && unit.stdout_path.is_some() {
                    warn!("管道中间的输出重定向被忽略: {:?}", unit.args);
                }

                let input = if index == 0 {
                    Input::open(unit.stdin_path.as_deref())
                } else {
                    Ok(readers.next().map_or(Input::Inherit, Input::Pipe))
                };
                let output = if index + 1 == stages {
                    Output::create(unit.stdout_path.as_deref())
                } else {
                    Ok(writers.next().map_or(Output::Inherit, Output::Pipe))
                };
                // a stage that cannot start drops its pipe ends so its
                // neighbours see EOF / EPIPE instead of blocking
                let (input, output) = match (input, output) {
                    (Ok(input), Ok(output)) => (input, output),
                    (Err(e), _) | (_, Err(e)) => {
                        error!("管道第 {} 段无法启动: {}", index, e);
                        failures.push(CommandResult::error(e));
                        continue;
                    }
                };

                if let Some(builtin) = self.builtins.get(unit.program()) {
                    let task = scope.spawn(move || {
                        let mut reader = input.into_reader();
                        let mut writer = output.into_writer();
                        builtin.run(unit.arguments(), &mut *reader, &mut *writer)
                    });
                    tasks.push((unit.program(), task));
                    continue;
                }

                match self.spawn(unit, input, output, leader) {
                    Ok(child) => {
                        if leader.is_none() {
                            leader = Some(child.id());
                            foreground = Some(self.jobs.enter_foreground(child.id()));
                        }
                        children.push((unit.program(), child));
                    }
                    Err(e) => {
                        error!("管道第 {} 段无法启动: {}", index, e);
                        failures.push(CommandResult::error(e));
                    }
                }
            }

            for (program, mut child) in children {
                let result = wait_child(program, &mut child);
                if !result.is_success() {
                    failures.push(result);
                }
            }

            let mut builtin_failures = Vec::new();
            for (program, task) in tasks {
                let result = task.join().unwrap_or_else(|_| {
                    CommandResult::error(ExecError::TaskPanicked(program.to_string()))
                });
                if !result.is_success() {
                    builtin_failures.push(result);
                }
            }
            drop(foreground);

            failures
                .into_iter()
                .chain(builtin_failures)
                .next()
                .unwrap_or_else(CommandResult::success)
        })
    }
}

fn wait_child(program: &str, child: &mut Child) -> CommandResult {
    match child.wait() {
        Ok(status) => {
            debug!("{} 退出: {}", program, status);
            CommandResult::from_exit(status)
        }
        Err(source) => CommandResult::error(ExecError::Wait {
            program: program.to_string(),
            source,
        }),
    }
}
