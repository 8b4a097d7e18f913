/// Uploaded image storage
///
/// Post images live under `<MEDIA_ROOT>/posts/<uuid>.<ext>` and are served
/// back from `/media/posts/<file>`.
use image::ImageFormat;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use crate::config::MediaConfig;
use crate::error::{AppError, Result};

pub const MEDIA_URL_PREFIX: &str = "/media";
pub const POSTS_DIR: &str = "posts";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImageRejection {
    #[error("File size exceeds limit: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    NotAnImage,
}

/// Image that decoded successfully and may be stored
#[derive(Debug, Clone)]
pub struct CheckedImage {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
    max_upload_bytes: usize,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>, max_upload_bytes: usize) -> Self {
        Self {
            root: root.into(),
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.root.clone(), config.max_upload_bytes)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Check size, then fully decode the upload
    pub async fn inspect(
        &self,
        bytes: Vec<u8>,
    ) -> std::result::Result<CheckedImage, ImageRejection> {
        if bytes.len() > self.max_upload_bytes {
            return Err(ImageRejection::TooLarge(bytes.len(), self.max_upload_bytes));
        }

        tokio::task::spawn_blocking(move || {
            let extension = decode_extension(&bytes).ok_or(ImageRejection::NotAnImage)?;
            Ok(CheckedImage { bytes, extension })
        })
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Image decoding task failed");
            ImageRejection::NotAnImage
        })?
    }

    /// Write a checked image and return its path relative to the media root
    pub async fn save_post_image(&self, image: &CheckedImage) -> Result<String> {
        let dir = self.root.join(POSTS_DIR);
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), image.extension);
        tokio::fs::write(dir.join(&file_name), &image.bytes).await?;

        let relative = format!("{}/{}", POSTS_DIR, file_name);
        tracing::info!(path = %relative, bytes = image.bytes.len(), "Stored post image");
        Ok(relative)
    }

    /// Filesystem path of a post image, `None` for names that could escape the directory
    pub fn resolve_post_image(&self, file_name: &str) -> Option<PathBuf> {
        if is_safe_file_name(file_name) {
            Some(self.root.join(POSTS_DIR).join(file_name))
        } else {
            None
        }
    }

    /// Delete a stored post image by its media-relative path; a missing file is not an error
    pub async fn remove_post_image(&self, relative: &str) -> Result<()> {
        let path = relative
            .strip_prefix(POSTS_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|file_name| self.resolve_post_image(file_name))
            .ok_or_else(|| AppError::Media(format!("not a post image path: {}", relative)))?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::info!(path = %relative, "Removed post image");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read_post_image(&self, file_name: &str) -> Result<Vec<u8>> {
        let path = self
            .resolve_post_image(file_name)
            .ok_or_else(|| AppError::not_found(format!("media {}", file_name)))?;

        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::not_found(format!("media {}", file_name)))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Public URL of a stored media path
pub fn url_for(relative: &str) -> String {
    format!("{}/{}", MEDIA_URL_PREFIX, relative)
}

/// Content type derived from a stored file's extension
pub fn content_type(file_name: &str) -> mime::Mime {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "png" => mime::IMAGE_PNG,
        "jpg" | "jpeg" => mime::IMAGE_JPEG,
        "gif" => mime::IMAGE_GIF,
        "bmp" => mime::IMAGE_BMP,
        "webp" => "image/webp".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "ico" => "image/x-icon".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        "tiff" => "image/tiff".parse().unwrap_or(mime::APPLICATION_OCTET_STREAM),
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
}

fn decode_extension(bytes: &[u8]) -> Option<&'static str> {
    let format = image::guess_format(bytes).ok()?;
    let extension = match format {
        ImageFormat::Png => "png",
        ImageFormat::Jpeg => "jpg",
        ImageFormat::Gif => "gif",
        ImageFormat::WebP => "webp",
        ImageFormat::Bmp => "bmp",
        ImageFormat::Ico => "ico",
        ImageFormat::Tiff => "tiff",
        _ => return None,
    };

    image::load_from_memory_with_format(bytes, format).ok()?;
    Some(extension)
}
