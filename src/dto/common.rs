use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Acknowledgement returned by delete endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OkResponse {
    /// Always `true`; failures use an error status instead.
    pub ok: bool,
    /// Optional human-readable detail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OkResponse {
    /// Bare acknowledgement.
    pub fn ok() -> Self {
        Self {
            ok: true,
            message: None,
        }
    }

    /// Acknowledgement carrying `message`.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: Some(message.into()),
        }
    }
}
