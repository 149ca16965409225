pub mod client;

pub use client::{ChatClient, DEFAULT_TIMEOUT};

use async_trait::async_trait;
use thiserror::Error;

use crate::composer::SendRequest;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("chat API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("request task aborted: {0}")]
    Aborted(String),
}

/// Anything that can answer one chat turn.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, request: SendRequest) -> Result<String, ApiError>;
}
