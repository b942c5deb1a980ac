/// Control operator that follows a segment on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextOp {
    And,
    Or,
    None,
}

/// One command of a pipeline: name, arguments and optional redirects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandUnit {
    pub args: Vec<String>,
    pub stdin_path: Option<String>,
    pub stdout_path: Option<String>,
}

impl CommandUnit {
    pub fn program(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or_default()
    }

    pub fn arguments(&self) -> &[String] {
        self.args.get(1..).unwrap_or_default()
    }
}

/// A `&&`/`||` delimited part of a line; itself a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub pipeline: Vec<CommandUnit>,
    pub next_op: NextOp,
}
