pub mod config;
pub mod messages;

pub type Result<T> = core::result::Result<T, QuestError>;

#[derive(thiserror::Error, Debug)]
pub enum QuestError {
    #[error("missing required environment variable {0}")]
    MissingEnv(&'static str),
    #[error("failed to read message file {path}: {source}")]
    MessageFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("message file {path} is not a JSON array of strings: {source}")]
    MessageFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Config(String),
    #[error("agent request failed: {0}")]
    Agent(String),
    #[error("usage report failed: {0}")]
    Report(String),
    #[error("{0}")]
    Message(String),
}

impl QuestError {
    /// Label used for the `outcome` metric dimension.
    pub fn outcome(&self) -> &'static str {
        match self {
            QuestError::Agent(_) => "agent_error",
            QuestError::Report(_) => "report_error",
            _ => "error",
        }
    }
}
