use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::{ config::UploadConfig, errors::{ ErrorMessage, HttpError } };

#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("image of {size} bytes exceeds the {max} byte limit")] TooLarge {
        size: usize,
        max: usize,
    },

    #[error("unsupported media type: {0}")] UnsupportedMediaType(String),

    #[error("storage failure: {0}")] Io(#[from] std::io::Error),
}

impl From<ImageStoreError> for HttpError {
    fn from(err: ImageStoreError) -> Self {
        match err {
            ImageStoreError::TooLarge { max, .. } =>
                HttpError::bad_request(ErrorMessage::ImageTooLarge(max).to_string()),
            ImageStoreError::UnsupportedMediaType(_) =>
                HttpError::bad_request(ErrorMessage::UnsupportedMediaType.to_string()),
            ImageStoreError::Io(e) => {
                tracing::error!("image store failure: {}", e);
                HttpError::server_error(ErrorMessage::InternalServerError.to_string())
            }
        }
    }
}

/// Blob-store collaborator: persists an uploaded image and hands back the
/// stable path that gets stored verbatim as the post's `imageUrl`.
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn store_image(
        &self,
        content_type: Option<&str>,
        data: &[u8]
    ) -> Result<String, ImageStoreError>;
}

/// Local-filesystem implementation. Files are named by a fresh uuid so a
/// stored path never collides and never reflects client input.
#[derive(Debug, Clone)]
pub struct LocalImageStore {
    directory: PathBuf,
    public_prefix: String,
    max_bytes: usize,
}

impl LocalImageStore {
    pub fn new(config: &UploadConfig) -> Self {
        LocalImageStore {
            directory: config.directory.clone(),
            public_prefix: config.public_prefix.clone(),
            max_bytes: config.max_image_bytes,
        }
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn store_image(
        &self,
        content_type: Option<&str>,
        data: &[u8]
    ) -> Result<String, ImageStoreError> {
        if data.len() > self.max_bytes {
            return Err(ImageStoreError::TooLarge {
                size: data.len(),
                max: self.max_bytes,
            });
        }

        let extension = match content_type {
            Some("image/png") => "png",
            Some("image/jpeg") => "jpg",
            Some("image/gif") => "gif",
            Some("image/webp") => "webp",
            Some(other) => {
                return Err(ImageStoreError::UnsupportedMediaType(other.to_string()));
            }
            None => {
                return Err(ImageStoreError::UnsupportedMediaType("unknown".to_string()));
            }
        };

        fs::create_dir_all(&self.directory).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        let path = self.directory.join(&file_name);
        fs::write(&path, data).await?;

        debug!(file = %file_name, size = data.len(), "stored post image");

        Ok(format!("{}/{}", self.public_prefix, file_name))
    }
}
