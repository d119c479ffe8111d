use std::time::SystemTime;

use tracing::{info, warn};

use crate::{
    dao::models::{PhotoEntity, RecordKind, UserEntity},
    dto::{common::OkResponse, normalize_optional, photo::PhotoSummary},
    error::ServiceError,
    services::patient_service::{ensure_record_owner, owned_patient},
    state::SharedState,
};

/// File received from a multipart upload.
#[derive(Debug)]
pub struct UploadedFile {
    /// Client-side file name, used only for its extension.
    pub file_name: Option<String>,
    /// Raw file contents.
    pub bytes: Vec<u8>,
}

/// Photos of an owned patient.
pub async fn list_photos(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
) -> Result<Vec<PhotoSummary>, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;
    let photos = store.list_photos(patient_id).await?;
    Ok(photos.into_iter().map(PhotoSummary::from).collect())
}

/// Store the file on disk, then record it. The file is removed again if the record cannot be saved.
pub async fn upload_photo(
    state: &SharedState,
    user: &UserEntity,
    patient_id: i64,
    caption: Option<String>,
    file: UploadedFile,
) -> Result<PhotoSummary, ServiceError> {
    let store = state.require_med_store().await?;
    owned_patient(&store, user.id, patient_id).await?;

    let url = state
        .uploads()
        .save(file.file_name.as_deref(), &file.bytes)
        .await?;

    let saved = async {
        let photo = PhotoEntity {
            id: store.next_id(RecordKind::Photos).await?,
            patient_id,
            url: url.clone(),
            caption: normalize_optional(caption),
            created_at: SystemTime::now(),
        };
        store.save_photo(photo.clone()).await?;
        Ok::<_, ServiceError>(photo)
    }
    .await;

    match saved {
        Ok(photo) => {
            info!(patient_id, photo_id = photo.id, url = %photo.url, size = file.bytes.len(), "stored photo");
            Ok(photo.into())
        }
        Err(err) => {
            if let Err(cleanup) = state.uploads().remove_by_url(&url).await {
                warn!(url = %url, error = %cleanup, "failed to remove orphaned upload");
            }
            Err(err)
        }
    }
}

/// Delete the record and its file. A file already gone is not an error.
pub async fn delete_photo(
    state: &SharedState,
    user: &UserEntity,
    photo_id: i64,
) -> Result<OkResponse, ServiceError> {
    let store = state.require_med_store().await?;
    let photo = store
        .find_photo(photo_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound("photo not found".into()))?;
    ensure_record_owner(&store, user.id, photo.patient_id).await?;

    if !store.delete_photo(photo_id).await? {
        return Err(ServiceError::NotFound("photo not found".into()));
    }
    if let Err(err) = state.uploads().remove_by_url(&photo.url).await {
        warn!(photo_id, url = %photo.url, error = %err, "failed to remove photo file");
    }

    info!(photo_id, "deleted photo");
    Ok(OkResponse::with_message("photo deleted"))
}
