//! Service settings
//!
//! Loaded with the `config` crate from built-in defaults, an optional
//! `config/video-api.{toml,yaml,json}` file and the process environment.
//! Environment keys are flat, e.g. `CLOUDINARY_API_KEY` maps to
//! `cloudinary_api_key`.

use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

use crate::{
    cloudinary::{CloudinaryCredentials, DEFAULT_API_BASE_URL, DEFAULT_UPLOAD_FOLDER},
    error::ApiError,
};

/// Default listen address
const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3001";

/// Default upload body limit (100 MiB)
const DEFAULT_MAX_UPLOAD_BYTES: i64 = 100 * 1024 * 1024;

/// API service settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Address the HTTP server binds to
    pub bind_address: String,
    /// Identity provider public key (PEM) or path to a PEM file
    pub jwt_public_key: Option<String>,
    /// Cloud name as exposed to the frontend
    pub next_public_cloudinary_cloud_name: Option<String>,
    /// Cloud name, used when the frontend variable is absent
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    /// Destination folder for uploaded videos
    pub cloudinary_folder: String,
    pub cloudinary_api_base_url: String,
    /// Maximum accepted upload request size in bytes
    pub max_upload_bytes: usize,
}

impl Settings {
    /// Load settings from defaults, the optional config file and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::builder()?
            .add_source(File::with_name("config/video-api").required(false))
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("cloudinary_folder", DEFAULT_UPLOAD_FOLDER)?
            .set_default("cloudinary_api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES)
    }

    /// Resolve the Cloudinary account credentials
    ///
    /// Fails with [`ApiError::Configuration`] if any of the cloud name, API
    /// key or API secret is missing or blank.
    pub fn cloudinary_credentials(&self) -> Result<CloudinaryCredentials, ApiError> {
        let cloud_name = non_blank(&self.next_public_cloudinary_cloud_name)
            .or_else(|| non_blank(&self.cloudinary_cloud_name));

        match (
            cloud_name,
            non_blank(&self.cloudinary_api_key),
            non_blank(&self.cloudinary_api_secret),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(CloudinaryCredentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => Err(ApiError::Configuration),
        }
    }

    /// Resolve the identity provider's public key
    ///
    /// The value is used as-is when it is a PEM document, otherwise it is read
    /// as a file path, first from the working directory, then relative to the
    /// crate root.
    pub fn jwt_public_key_pem(&self) -> anyhow::Result<String> {
        let public_key = self
            .jwt_public_key
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        if public_key.starts_with("-----BEGIN") {
            return Ok(public_key.to_string());
        }

        let pem = std::fs::read_to_string(public_key)
            .or_else(|_| {
                let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                path.push(public_key);
                std::fs::read_to_string(path)
            })
            .map_err(|e| anyhow::anyhow!("Failed to read public key file: {}", e))?;

        Ok(pem.trim().to_string())
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
