use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{capability} is unavailable: {hint}")]
    CapabilityUnavailable {
        capability: &'static str,
        hint: String,
    },

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status {
        status: reqwest::StatusCode,
        url: String,
    },

    #[error("project {project} has no storage container")]
    NoStorage { project: String },

    #[error("invalid date {input:?}: expected DD/MM/YYYY")]
    InvalidDate { input: String },

    #[error("invalid creation timestamp {input:?}")]
    InvalidTimestamp { input: String },

    #[error("{name} has no download handle (descriptor was not produced by a listing)")]
    MissingHandle { name: String },

    #[cfg(feature = "tabular")]
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV has no columns to parse")]
    NoColumns,

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("JSON document is a bare {kind}, expected an array, object or string")]
    NotACollection { kind: &'static str },

    #[error("{name} was still empty after {attempts} attempts")]
    AttemptsExhausted { name: String, attempts: u32 },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
