use log::{debug, error, warn};
use std::error::Error;
use std::io::Write;
use std::sync::Arc;

use crate::shell::error::ShellError;
use crate::shell::executor::Executor;
use crate::shell::job_manager::JobController;
use crate::shell::parser::parse_line;
use crate::shell::readline::{ReadlineError, ReadlineManager};
use crate::shell::signals;
use crate::utils::config::Config;
use crate::utils::path;
use crate::utils::theme::Theme;

pub struct Shell<'a> {
    theme: Theme,
    readline: ReadlineManager<'a>,
    executor: Executor,
}

impl<'a> Shell<'a> {
    pub fn new(config: &'a Config) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            theme: Theme::load_theme(&config.theme),
            readline: ReadlineManager::new(config)?,
            executor: Executor::new(Arc::new(JobController::posix())),
        })
    }

    pub fn run(&mut self) -> Result<(), Box<dyn Error>> {
        debug!("初始化 tinysh...");

        // Ctrl-C 只转发给前台进程组，不会结束 shell 自身
        signals::spawn_interrupt_forwarder(Arc::clone(self.executor.jobs()))?;

        self.readline.load_history();
        debug!("tinysh 准备就绪...");

        self.run_loop()?;
        self.readline.save_history();

        debug!("退出 tinysh...");
        Ok(())
    }

    fn run_loop(&mut self) -> Result<(), Box<dyn Error>> {
        loop {
            std::io::stdout().flush()?;
            let prompt = self.theme.prompt(&path::current_dir());

            match self.readline.readline(&prompt) {
                Ok(line) => self.handle_input(&line),
                Err(ReadlineError::Eof) => {
                    debug!("接收到 EOF, 退出 tinysh...");
                    println!();
                    break;
                }
                Err(ReadlineError::Interrupted) => {
                    debug!("提示符处接收到中断信号");
                }
                Err(err) => {
                    error!("读取输入失败: {}", err);
                    eprintln!("{}", (self.theme.error_style)(format!("read error: {}", err)));
                }
            }
        }
        Ok(())
    }

    fn handle_input(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if let Err(err) = self.readline.add_history(line) {
            warn!("添加历史记录失败: {}", err);
        }
        debug!("执行命令: {}", line);

        let segments = match parse_line(line) {
            Ok(segments) => segments,
            Err(err) => {
                self.report(&err);
                return;
            }
        };

        let theme = &self.theme;
        let status = self.executor.execute(&segments, |index, result| {
            if let Some(err) = &result.error {
                error!("第 {} 段执行失败: {}", index, err);
                eprintln!("{}", (theme.error_style)(format!("exec error: {}", err)));
            }
        });
        debug!("命令结束, status={}", status);
    }

    fn report(&self, err: &ShellError) {
        warn!("{}", err);
        eprintln!("{}", (self.theme.warning_style)(err.to_string()));
    }
}
