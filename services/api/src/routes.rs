//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde_json::json;
use tracing::{error, info};

use crate::{
    cloudinary::VideoUpload,
    error::{ApiError, ApiResult},
    middleware::{CallerIdentity, session_guard},
    models::video::{NewVideo, UploadMetadata, Video},
    state::AppState,
};

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/video-upload",
            post(upload_video).layer(DefaultBodyLimit::max(state.max_upload_bytes)),
        )
        .route("/api/videos", get(list_videos))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session_guard,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "video-api"
    }))
}

/// Fields read from the upload form
#[derive(Default)]
struct UploadForm {
    file: Option<VideoUpload>,
    metadata: UploadMetadata,
}

fn invalid_multipart(e: MultipartError) -> ApiError {
    ApiError::InvalidInput(e.to_string())
}

/// Read the upload form, keeping the first occurrence of each field
async fn read_upload_form(multipart: &mut Multipart) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(invalid_multipart)? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "file" if form.file.is_none() => {
                // Plain text parts carry no filename
                let Some(file_name) = field.file_name().map(str::to_owned) else {
                    return Err(ApiError::InvalidInput(
                        "file field is not binary content".to_string(),
                    ));
                };
                let content_type = field.content_type().map(str::to_owned);
                let data = field.bytes().await.map_err(invalid_multipart)?;

                form.file = Some(VideoUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            "title" if form.metadata.title.is_none() => {
                form.metadata.title = Some(field.text().await.map_err(invalid_multipart)?);
            }
            "description" if form.metadata.description.is_none() => {
                form.metadata.description = Some(field.text().await.map_err(invalid_multipart)?);
            }
            "originalSize" if form.metadata.original_size.is_none() => {
                form.metadata.original_size =
                    Some(field.text().await.map_err(invalid_multipart)?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Upload a video to the media provider and store its record
pub async fn upload_video(
    State(state): State<AppState>,
    Extension(caller): Extension<CallerIdentity>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<Video>> {
    let transcoder = state.transcoder.clone().ok_or_else(|| {
        error!("Cloudinary credentials not found");
        ApiError::Configuration
    })?;

    let mut multipart = multipart.map_err(|e| ApiError::InvalidInput(e.to_string()))?;
    let form = read_upload_form(&mut multipart).await?;
    let upload = form
        .file
        .ok_or_else(|| ApiError::InvalidInput("missing file field".to_string()))?;

    info!(
        user_id = caller.user_id(),
        file_name = %upload.file_name,
        bytes = upload.data.len(),
        "Uploading video"
    );

    let transcoded = transcoder.upload_video(upload).await.map_err(|e| {
        error!("Upload video failed: {}", e);
        ApiError::Upstream(e)
    })?;

    let new_video = NewVideo::from_transcoded(form.metadata, &transcoded, caller.user_id());

    let video = state.video_store.create(new_video).await.map_err(|e| {
        error!(
            public_id = %transcoded.public_id,
            "Failed to persist video record: {}", e
        );
        ApiError::Persistence(e)
    })?;

    info!(video_id = %video.id, public_id = %video.public_id, "Video stored");

    Ok(Json(video))
}

/// List all videos, newest first
pub async fn list_videos(State(state): State<AppState>) -> ApiResult<Json<Vec<Video>>> {
    let videos = state.video_store.list_newest_first().await.map_err(|e| {
        error!("Failed to fetch videos: {}", e);
        ApiError::Query(e)
    })?;

    Ok(Json(videos))
}
