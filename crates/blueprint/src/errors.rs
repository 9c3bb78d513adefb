use reqwest::StatusCode;
use thiserror::Error;
use uuid::Uuid;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(StatusCode),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("unknown chat: {0}")]
    UnknownChat(Uuid),

    #[error("session is not idle")]
    SessionNotIdle,
}

pub type ClientResult<T> = Result<T, ClientError>;
