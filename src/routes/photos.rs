use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartError},
    http::StatusCode,
    routing::{delete, get},
};
use tower_http::services::ServeDir;
use tracing::debug;

use crate::{
    dto::{
        common::OkResponse,
        photo::{PhotoQuery, PhotoSummary, PhotoUpload},
    },
    error::AppError,
    routes::{
        auth::CurrentUser,
        extract::{AppMultipart, AppPath, AppQuery},
    },
    services::photo_service::{self, UploadedFile},
    state::SharedState,
};

/// Room left for multipart boundaries and headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Photo routes plus the static file service for stored uploads.
pub fn router(state: &SharedState) -> Router<SharedState> {
    let body_limit = state
        .config()
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route(
            "/patients/{pid}/photos",
            get(list_photos)
                .post(upload_photo)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/photos/{photo_id}", delete(delete_photo))
        .nest_service("/uploads", ServeDir::new(state.uploads().dir()))
}

/// List the photos of a patient.
#[utoipa::path(
    get,
    path = "/patients/{pid}/photos",
    tag = "photos",
    params(("pid" = i64, Path, description = "Patient identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Photos of the patient", body = [PhotoSummary]),
        (status = 404, description = "Patient not found")
    )
)]
pub async fn list_photos(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
) -> Result<Json<Vec<PhotoSummary>>, AppError> {
    Ok(Json(photo_service::list_photos(&state, &user, pid).await?))
}

/// Upload an image for a patient as the multipart field `file`.
#[utoipa::path(
    post,
    path = "/patients/{pid}/photos",
    tag = "photos",
    params(("pid" = i64, Path, description = "Patient identifier"), PhotoQuery),
    request_body(content = PhotoUpload, content_type = "multipart/form-data"),
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Photo stored", body = PhotoSummary),
        (status = 400, description = "Missing `file` field"),
        (status = 404, description = "Patient not found"),
        (status = 413, description = "File larger than the configured limit")
    )
)]
pub async fn upload_photo(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(pid): AppPath<i64>,
    AppQuery(query): AppQuery<PhotoQuery>,
    AppMultipart(multipart): AppMultipart,
) -> Result<(StatusCode, Json<PhotoSummary>), AppError> {
    let max_bytes = state.config().max_upload_bytes;
    let file = read_file_field(multipart, max_bytes).await?;
    let photo = photo_service::upload_photo(&state, &user, pid, query.caption, file).await?;
    Ok((StatusCode::CREATED, Json(photo)))
}

/// Pull the `file` field out of the multipart body, skipping any other field.
async fn read_file_field(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<UploadedFile, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("file") {
            debug!(field = ?field.name(), "ignoring multipart field");
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        if bytes.len() > max_bytes {
            return Err(too_large(max_bytes));
        }
        return Ok(UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::BadRequest("missing file field".into()))
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("upload exceeds the size limit".into())
    } else {
        AppError::BadRequest(format!("invalid multipart body: {}", err.body_text()))
    }
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::PayloadTooLarge(format!("file exceeds {max_bytes} bytes"))
}

/// Delete a photo and its stored file.
#[utoipa::path(
    delete,
    path = "/photos/{photo_id}",
    tag = "photos",
    params(("photo_id" = i64, Path, description = "Photo identifier")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Photo deleted", body = OkResponse),
        (status = 403, description = "Photo belongs to another user"),
        (status = 404, description = "Photo not found")
    )
)]
pub async fn delete_photo(
    State(state): State<SharedState>,
    CurrentUser(user): CurrentUser,
    AppPath(photo_id): AppPath<i64>,
) -> Result<Json<OkResponse>, AppError> {
    Ok(Json(
        photo_service::delete_photo(&state, &user, photo_id).await?,
    ))
}
