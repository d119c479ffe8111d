use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{dao::models::PhotoEntity, dto::format_system_time};

/// Query string of the photo upload route.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PhotoQuery {
    /// Optional caption stored with the photo.
    pub caption: Option<String>,
}

/// Multipart body of the photo upload route, for documentation only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct PhotoUpload {
    /// Image file.
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

/// Stored photo as returned to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PhotoSummary {
    /// Photo identifier.
    pub id: i64,
    /// Patient the photo belongs to.
    pub patient_id: i64,
    /// Relative URL under `/uploads/`.
    pub url: String,
    /// Caption given at upload time.
    pub caption: Option<String>,
    /// RFC 3339 upload time.
    pub created_at: String,
}

impl From<PhotoEntity> for PhotoSummary {
    fn from(photo: PhotoEntity) -> Self {
        Self {
            id: photo.id,
            patient_id: photo.patient_id,
            url: photo.url,
            caption: photo.caption,
            created_at: format_system_time(photo.created_at),
        }
    }
}
