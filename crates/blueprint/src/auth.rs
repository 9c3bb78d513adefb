use std::env;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::errors::ClientError;

pub const TOKEN_ENV_VAR: &str = "BLUEPRINT_ID_TOKEN";

/// Source of the bearer token attached to chat persistence calls.
///
/// The embedding application owns credential mechanics; the client only
/// needs a fresh token ahead of each backend call. A missing token aborts
/// that call alone and never touches an in-progress generation.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn id_token(&self) -> Result<String, ClientError>;
}

/// Reads the token from the environment.
pub struct EnvTokenProvider;

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn id_token(&self) -> Result<String, ClientError> {
        env::var(TOKEN_ENV_VAR)
            .map_err(|_| ClientError::Auth(format!("{} is not set", TOKEN_ENV_VAR)))
    }
}
