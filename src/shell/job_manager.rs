use std::process::Command;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error};

use super::signals::{PosixGroups, ProcessGroups};

/// Owns the identity of the foreground job and routes signals to it.
///
/// Exactly one job is foreground at a time; the executor sets it while a
/// segment runs and the signal listener reads it.
pub struct JobController {
    foreground: Mutex<Option<u32>>,
    groups: Arc<dyn ProcessGroups>,
}

impl JobController {
    pub fn new(groups: Arc<dyn ProcessGroups>) -> Self {
        Self {
            foreground: Mutex::new(None),
            groups,
        }
    }

    pub fn posix() -> Self {
        Self::new(Arc::new(PosixGroups))
    }

    fn lock(&self) -> MutexGuard<'_, Option<u32>> {
        self.foreground.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn foreground(&self) -> Option<u32> {
        *self.lock()
    }

    /// Records `pgid` as the foreground group until the guard is dropped.
    pub fn enter_foreground(&self, pgid: u32) -> ForegroundGuard<'_> {
        debug!("设置前台进程组 {}", pgid);
        *self.lock() = Some(pgid);
        ForegroundGuard { jobs: self }
    }

    fn clear_foreground(&self) {
        if let Some(pgid) = self.lock().take() {
            debug!("前台进程组 {} 已结束", pgid);
        }
    }

    pub fn place(&self, command: &mut Command, group: Option<u32>) {
        self.groups.place(command, group);
    }

    /// Sends `signal` to the whole foreground group, if there is one.
    /// Returns the group that was targeted.
    pub fn forward(&self, signal: i32) -> Option<u32> {
        let pgid = self.foreground()?;
        if let Err(e) = self.groups.signal_group(pgid, signal) {
            error!("向进程组 {} 发送信号失败: {}", pgid, e);
        }
        Some(pgid)
    }
}

/// Clears the foreground group when the job it was created for ends.
pub struct ForegroundGuard<'a> {
    jobs: &'a JobController,
}

impl Drop for ForegroundGuard<'_> {
    fn drop(&mut self) {
        self.jobs.clear_foreground();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Default)]
    struct Recorder {
        sent: Mutex<Vec<(u32, i32)>>,
    }

    impl ProcessGroups for Recorder {
        fn place(&self, _command: &mut Command, _group: Option<u32>) {}

        fn signal_group(&self, pgid: u32, signal: i32) -> io::Result<()> {
            self.sent
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((pgid, signal));
            Ok(())
        }
    }

    #[test]
    fn test_no_foreground_job_no_signal() {
        let recorder = Arc::new(Recorder::default());
        let jobs = JobController::new(recorder.clone());

        assert_eq!(jobs.forward(2), None);
        assert!(recorder.sent.lock().unwrap_or_else(PoisonError::into_inner).is_empty());
    }

    #[test]
    fn test_forward_to_foreground_group() {
        let recorder = Arc::new(Recorder::default());
        let jobs = JobController::new(recorder.clone());

        {
            let _guard = jobs.enter_foreground(4242);
            assert_eq!(jobs.foreground(), Some(4242));
            assert_eq!(jobs.forward(2), Some(4242));
        }

        assert_eq!(jobs.foreground(), None);
        assert_eq!(jobs.forward(2), None);
        assert_eq!(
            *recorder.sent.lock().unwrap_or_else(PoisonError::into_inner),
            vec![(4242, 2)]
        );
    }
}
