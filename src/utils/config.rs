use dotenv::dotenv;
use rustyline::EditMode;
use std::env;
use std::path::PathBuf;

pub struct Config {
    pub name: String,
    pub theme: String,
    pub history_file: PathBuf,
    pub editor_mode: String,
    pub logger_level: String,
    pub logger_dir: PathBuf,
}

impl Config {
    fn get_config_dir() -> PathBuf {
        match env::var("HOME") {
            Ok(home) if !home.is_empty() => PathBuf::from(home).join(".config/tinysh"),
            _ => env::temp_dir().join("tinysh"),
        }
    }

    fn default() -> Self {
        let config_dir = Self::get_config_dir();
        Config {
            name: String::from(env!("CARGO_PKG_NAME")),
            theme: String::from("default"),
            history_file: config_dir.join(".tinysh_history"),
            editor_mode: String::from("emacs"),
            logger_level: String::from("info"),
            logger_dir: config_dir.join("logs"),
        }
    }

    pub fn new() -> Self {
        // 优先加载环境变量
        if cfg!(debug_assertions) {
            dotenv::from_filename(".env.development").ok();
        } else {
            dotenv().ok();
        }

        let mut config = Config::default();

        if let Ok(theme) = env::var("TINYSH_THEME") {
            config.theme = theme;
        }

        if let Ok(editor) = env::var("TINYSH_EDITOR") {
            config.editor_mode = editor;
        }

        if let Ok(history) = env::var("TINYSH_HISTORY") {
            config.history_file = PathBuf::from(history);
        }

        if let Ok(level) = env::var("TINYSH_LOG_LEVEL") {
            config.logger_level = level;
        }

        if let Ok(dir) = env::var("TINYSH_LOG_DIR") {
            config.logger_dir = PathBuf::from(dir);
        }

        config
    }

    pub fn get_edit_mode(&self) -> EditMode {
        match self.editor_mode.to_lowercase().as_str() {
            "vi" => EditMode::Vi,
            _ => EditMode::Emacs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.name, "tinysh");
        assert!(config.history_file.ends_with(".tinysh_history"));
        assert!(config.logger_dir.ends_with("logs"));
        assert!(matches!(config.get_edit_mode(), EditMode::Emacs));
    }

    #[test]
    fn test_edit_mode() {
        let mut config = Config::default();
        config.editor_mode = "VI".to_string();
        assert!(matches!(config.get_edit_mode(), EditMode::Vi));
    }
}
