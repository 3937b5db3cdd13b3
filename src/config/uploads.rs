use std::{ env, path::PathBuf };

use super::database::ConfigError;

// Mirrors the limits the original deployment enforced at its upload
// middleware: images are capped at 5 MiB.
pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Where uploaded post images land on disk and how they are addressed
/// over HTTP. The stored `imageUrl` is `{public_prefix}/{file name}`.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub directory: PathBuf,
    pub public_prefix: String,
    pub max_image_bytes: usize,
}

impl UploadConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let directory = env
            ::var("UPLOAD_DIR")
            .unwrap_or_else(|_| "uploads/images".to_string());

        let max_image_bytes = match env::var("MAX_IMAGE_BYTES") {
            Ok(raw) =>
                raw
                    .parse()
                    .map_err(|e| {
                        ConfigError::Config(format!("Failed to parse MAX_IMAGE_BYTES: {}", e))
                    })?,
            Err(_) => DEFAULT_MAX_IMAGE_BYTES,
        };

        Ok(Self {
            directory: PathBuf::from(directory),
            public_prefix: "/uploads/images".to_string(),
            max_image_bytes,
        })
    }
}
