use std::env;

use log::error;

/// Working directory for the prompt; empty when it cannot be determined.
pub fn current_dir() -> String {
    match env::current_dir() {
        Ok(dir) => dir.to_string_lossy().into_owned(),
        Err(e) => {
            error!("无法获取当前工作目录: {}", e);
            String::new()
        }
    }
}
