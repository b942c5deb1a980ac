use std::io;
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::sync::Arc;
use std::thread;

use log::{debug, warn};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use signal_hook::consts::SIGINT;
use signal_hook::iterator::Signals;

use super::job_manager::JobController;

/// Process-group operations the executor and the job controller rely on.
pub trait ProcessGroups: Send + Sync {
    /// Arranges for `command` to start in process group `group`, or in a new
    /// group led by itself when `group` is `None`.
    fn place(&self, command: &mut Command, group: Option<u32>);

    /// Delivers `signal` to every process of group `pgid`.
    fn signal_group(&self, pgid: u32, signal: i32) -> io::Result<()>;
}

pub struct PosixGroups;

impl ProcessGroups for PosixGroups {
    fn place(&self, command: &mut Command, group: Option<u32>) {
        let pgid = group.and_then(|g| i32::try_from(g).ok()).unwrap_or(0);
        command.process_group(pgid);
    }

    fn signal_group(&self, pgid: u32, signal: i32) -> io::Result<()> {
        let pgid = i32::try_from(pgid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "process group out of range"))?;
        let signal = Signal::try_from(signal)?;
        killpg(Pid::from_raw(pgid), signal)?;
        Ok(())
    }
}

/// Starts the listener thread that forwards SIGINT to the foreground job.
///
/// Registering the handler also keeps the default SIGINT action from
/// terminating the shell itself.
pub fn spawn_interrupt_forwarder(jobs: Arc<JobController>) -> io::Result<thread::JoinHandle<()>> {
    let mut signals = Signals::new([SIGINT])?;
    thread::Builder::new()
        .name("sigint-forwarder".to_string())
        .spawn(move || {
            for signal in signals.forever() {
                match jobs.forward(signal) {
                    Some(pgid) => debug!("信号 {} 已转发给进程组 {}", signal, pgid),
                    None => debug!("接收到信号 {}, 没有前台任务", signal),
                }
            }
            warn!("信号监听线程已退出");
        })
}
