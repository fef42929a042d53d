//! Video record models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cloudinary::TranscodedVideo;

/// A persisted video record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub public_id: String,
    /// Size reported by the uploader before upload
    pub original_size: String,
    /// Size of the stored asset reported by the provider
    pub compressed_size: String,
    /// Length in seconds
    pub duration: f64,
    /// Always equal to `public_id`
    pub cloudinary_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Optional text fields sent alongside the uploaded file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub original_size: Option<String>,
}

/// A video record that has not been persisted yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideo {
    pub title: String,
    pub description: String,
    pub public_id: String,
    pub original_size: String,
    pub compressed_size: String,
    pub duration: f64,
    pub cloudinary_id: String,
    pub user_id: String,
}

impl NewVideo {
    /// Build the record for a completed upload
    pub fn from_transcoded(
        metadata: UploadMetadata,
        transcoded: &TranscodedVideo,
        user_id: &str,
    ) -> Self {
        let duration = transcoded
            .duration
            .filter(|d| d.is_finite() && *d >= 0.0)
            .unwrap_or(0.0);

        Self {
            title: metadata.title.unwrap_or_default(),
            description: metadata.description.unwrap_or_default(),
            public_id: transcoded.public_id.clone(),
            original_size: metadata.original_size.unwrap_or_default(),
            compressed_size: transcoded.bytes.to_string(),
            duration,
            cloudinary_id: transcoded.public_id.clone(),
            user_id: user_id.to_string(),
        }
    }
}
