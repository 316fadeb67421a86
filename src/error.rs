use thiserror::Error;

pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Errors that abort a run. Per-item extraction misses never surface here;
/// see [`crate::parser::species::MissingElement`].
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("invalid selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },

    #[error("invalid URL `{input}`")]
    InvalidUrl {
        input: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
