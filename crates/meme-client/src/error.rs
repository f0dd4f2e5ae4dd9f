use thiserror::Error;

#[derive(Error, Debug)]
pub enum MemeClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Meme service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Unrecognized meme service version: {0}")]
    Version(String),
}

impl From<serde_json::Error> for MemeClientError {
    fn from(e: serde_json::Error) -> Self {
        MemeClientError::Decode(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, MemeClientError>;
