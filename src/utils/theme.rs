use colored::Colorize;

pub struct Theme {
    pub prompt_style: Box<dyn Fn(String) -> String>,
    pub error_style: Box<dyn Fn(String) -> String>,
    pub warning_style: Box<dyn Fn(String) -> String>,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            prompt_style: Box::new(|s| s.bright_cyan().to_string()),
            error_style: Box::new(|s| s.bright_red().to_string()),
            warning_style: Box::new(|s| s.yellow().to_string()),
        }
    }
}

impl Theme {
    pub fn plain() -> Self {
        Theme {
            prompt_style: Box::new(|s| s),
            error_style: Box::new(|s| s),
            warning_style: Box::new(|s| s),
        }
    }

    pub fn load_theme(theme_name: &str) -> Theme {
        match theme_name {
            "plain" => Theme::plain(),
            _ => Theme::default(),
        }
    }

    pub fn prompt(&self, cwd: &str) -> String {
        (self.prompt_style)(format!("{}$ ", cwd))
    }
}
