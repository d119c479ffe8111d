use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Simple health response returned by the `/health` route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("activo" or "degradado").
    pub estado: String,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok() -> Self {
        Self {
            estado: "activo".to_string(),
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded() -> Self {
        Self {
            estado: "degradado".to_string(),
        }
    }
}
