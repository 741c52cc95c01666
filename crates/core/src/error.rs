use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote OCR failed: {0}")]
    OcrFailed(String),
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model endpoint returned {status}: {details}")]
    Status { status: u16, details: String },

    #[error("response does not match the {schema} schema: {details}")]
    Schema {
        schema: &'static str,
        details: String,
    },

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),
}

impl ExtractError {
    /// Transport-level failures may succeed on retry; schema failures will
    /// not, the model already answered.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractError::Http(_) | ExtractError::Status { .. })
    }
}

#[derive(Debug, Error)]
pub enum RankError {
    #[error("skill list has {skills} entries but weight list has {weights}")]
    ConfigurationMismatch { skills: usize, weights: usize },

    #[error("document task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T, E = RankError> = std::result::Result<T, E>;
