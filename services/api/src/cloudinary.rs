//! Cloudinary upload client
//!
//! Uploads a fully buffered video to Cloudinary as a signed upload and
//! returns the hosted asset's identifier, stored size and duration. The
//! [`Transcoder`] trait is the seam the upload handler depends on.

use async_trait::async_trait;
use axum::body::Bytes;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

/// Resource kind requested for every upload
const RESOURCE_TYPE: &str = "video";

/// Automatic quality, output normalized to MP4
pub const VIDEO_TRANSFORMATION: &str = "f_mp4,q_auto";

/// Default destination folder for uploaded videos
pub const DEFAULT_UPLOAD_FOLDER: &str = "video-uploads";

/// Default Cloudinary API base URL
pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com/v1_1";

/// Account credentials for the Cloudinary API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

/// A video buffered in memory, ready to upload
#[derive(Debug, Clone)]
pub struct VideoUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// What the provider reports back for a stored video
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TranscodedVideo {
    pub public_id: String,
    /// Stored size in bytes
    pub bytes: u64,
    /// Length in seconds, omitted by the provider for some assets
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Errors returned by the upload client
#[derive(Error, Debug)]
pub enum TranscodeError {
    /// Transport level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("Provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// The provider's success body could not be decoded
    #[error("Failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Uploads a video and waits for the hosted asset
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transcoder: Send + Sync {
    async fn upload_video(&self, upload: VideoUpload) -> Result<TranscodedVideo, TranscodeError>;
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    error: ProviderErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorMessage {
    message: String,
}

/// Cloudinary implementation of [`Transcoder`]
#[derive(Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    credentials: CloudinaryCredentials,
    base_url: String,
    folder: String,
}

impl CloudinaryClient {
    /// Create a new client for the given account
    pub fn new(
        credentials: CloudinaryCredentials,
        base_url: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            credentials,
            base_url: base_url.into(),
            folder: folder.into(),
        }
    }

    fn upload_url(&self) -> String {
        format!(
            "{}/{}/{}/upload",
            self.base_url.trim_end_matches('/'),
            self.credentials.cloud_name,
            RESOURCE_TYPE
        )
    }

    /// Parameters covered by the upload signature
    fn signed_params(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        vec![
            ("folder", self.folder.clone()),
            ("timestamp", timestamp.to_string()),
            ("transformation", VIDEO_TRANSFORMATION.to_string()),
        ]
    }
}

/// Compute a Cloudinary request signature
///
/// Parameters are sorted by name, empty values dropped, joined as
/// `name=value&name=value` and suffixed with the API secret before hashing
/// with SHA-1.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");

    sha1_smol::Sha1::from(format!("{}{}", to_sign, api_secret))
        .digest()
        .to_string()
}

#[async_trait]
impl Transcoder for CloudinaryClient {
    async fn upload_video(&self, upload: VideoUpload) -> Result<TranscodedVideo, TranscodeError> {
        let params = self.signed_params(Utc::now().timestamp());
        let signature = sign_params(&params, &self.credentials.api_secret);

        debug!(
            url = %self.upload_url(),
            content_type = upload.content_type.as_deref().unwrap_or("unknown"),
            "Sending video to Cloudinary"
        );

        let part =
            reqwest::multipart::Part::bytes(Vec::from(upload.data)).file_name(upload.file_name);
        let mut form = reqwest::multipart::Form::new()
            .text("api_key", self.credentials.api_key.clone())
            .text("signature", signature)
            .part("file", part);
        for (name, value) in params {
            form = form.text(name, value);
        }

        let resp = self
            .http
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ProviderErrorBody>(&text)
                .map(|body| body.error.message)
                .unwrap_or(text);
            return Err(TranscodeError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let video: TranscodedVideo = serde_json::from_str(&text)?;
        info!(
            public_id = %video.public_id,
            bytes = video.bytes,
            "Cloudinary upload completed"
        );

        Ok(video)
    }
}
