use thiserror::Error;

#[derive(Error, Debug)]
pub enum EdaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A row or header that cannot become part of a dataset. `line` is the
    /// 1-based data line (header excluded), 0 for header problems.
    #[error("Parse error at line {line}, column '{column}': {message}")]
    Parse {
        line: usize,
        column: String,
        message: String,
    },

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unknown page: {0}")]
    UnknownPage(String),

    #[error("A dataset is already loaded for this session")]
    AlreadyLoaded,

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl EdaError {
    pub fn parse(line: usize, column: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column: column.to_string(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EdaError>;
