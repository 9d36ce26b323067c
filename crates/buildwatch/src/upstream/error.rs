use thiserror::Error;

#[derive(Error, Debug)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status} for {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("failed to decode upstream document: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("two-factor authentication is required for this account; use an API key instead")]
    TwoFactorRequired,

    #[error("team selection failed for `{team_id}`: {reason}")]
    TeamSelection { team_id: String, reason: String },

    #[error("no app found for identifier `{0}`")]
    AppNotFound(String),
}

pub type Result<T> = std::result::Result<T, UpstreamError>;
