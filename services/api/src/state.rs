//! Application state shared across handlers

use std::sync::Arc;

use crate::{
    cloudinary::Transcoder, middleware::IdentityVerifier, repositories::video::VideoStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub identity_verifier: Arc<dyn IdentityVerifier>,
    /// `None` when the provider credentials were not configured
    pub transcoder: Option<Arc<dyn Transcoder>>,
    pub video_store: Arc<dyn VideoStore>,
    /// Upper bound for upload request bodies, in bytes
    pub max_upload_bytes: usize,
}
