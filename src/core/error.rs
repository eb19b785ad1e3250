use thiserror::Error;

pub type Result<T, E = PackError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum PackError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Failed to fetch {resource}: HTTP {status}: {message}")]
    Upstream {
        status: u16,
        resource: String,
        message: String,
    },

    #[error("Unexpected API response format: {0}")]
    Protocol(String),

    #[error("Directory '{path}' is nested deeper than the limit of {limit} levels")]
    TraversalTooDeep { path: String, limit: usize },

    #[error("No files found or unable to fetch repository contents.")]
    NotFound,

    #[error("Token estimation failed: {0}")]
    Tokenization(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PackError {
    pub fn http_status(&self) -> u16 {
        match self {
            PackError::InvalidInput(_) => 400,
            PackError::NotFound => 404,
            PackError::Upstream { .. } => 502,
            PackError::Protocol(_)
            | PackError::TraversalTooDeep { .. }
            | PackError::Tokenization(_)
            | PackError::Internal(_) => 500,
        }
    }
}

impl From<reqwest::Error> for PackError {
    fn from(err: reqwest::Error) -> Self {
        PackError::Internal(err.to_string())
    }
}
