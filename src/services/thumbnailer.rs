use std::{io::Cursor, sync::Arc};

use image::{codecs::jpeg::JpegEncoder, GenericImageView};
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use crate::{
    application::{repositories::file_repository::FileRepository, services::BlobBackend},
    domain::models::file::FileEntry,
};

const THUMBNAIL_HEIGHT: u32 = 320;
const THUMBNAIL_JPEG_QUALITY: u8 = 60;

#[derive(Debug, Error)]
pub enum ThumbnailError {
    #[error("Image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ffmpeg exited with {0}")]
    Ffmpeg(std::process::ExitStatus),

    #[error("{0:?}")]
    Application(crate::application::error::ApplicationError),

    #[error("Worker error: {0}")]
    Worker(String),
}

// ApplicationError is a plain enum without an Error impl, so thiserror's
// #[from] cannot generate this conversion.
impl From<crate::application::error::ApplicationError> for ThumbnailError {
    fn from(error: crate::application::error::ApplicationError) -> Self {
        Self::Application(error)
    }
}

/// Scales the image down to a 320px-tall JPEG, preserving aspect ratio.
/// Images already shorter than that are re-encoded at their original size.
pub fn render_image_thumbnail(bytes: &[u8]) -> Result<Vec<u8>, ThumbnailError> {
    let source = image::load_from_memory(bytes)?;
    let (source_width, source_height) = source.dimensions();

    let scaled = if source_height > THUMBNAIL_HEIGHT {
        let width = (source_width as f64 * THUMBNAIL_HEIGHT as f64 / source_height as f64)
            .round()
            .max(1.0) as u32;
        source.resize_exact(width, THUMBNAIL_HEIGHT, image::imageops::FilterType::Triangle)
    } else {
        source
    };

    let mut output = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut output), THUMBNAIL_JPEG_QUALITY);
    scaled.to_rgb8().write_with_encoder(encoder)?;
    Ok(output)
}

/// Extracts a representative frame with ffmpeg and returns it as JPEG bytes.
/// The input is spooled to a temp file because ffmpeg needs a seekable source
/// for most container formats.
async fn render_video_thumbnail(bytes: &[u8], extension: &str) -> Result<Vec<u8>, ThumbnailError> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join(format!("input.{}", extension));
    let output_path = dir.path().join("frame.jpg");
    tokio::fs::write(&input_path, bytes).await?;

    let status = tokio::process::Command::new("ffmpeg")
        .arg("-y")
        .args(["-loglevel", "error"])
        .arg("-i")
        .arg(&input_path)
        .args(["-vf", "thumbnail,scale=-2:320"])
        .args(["-frames:v", "1"])
        .args(["-f", "mjpeg"])
        .arg(&output_path)
        .status()
        .await?;
    if !status.success() {
        return Err(ThumbnailError::Ffmpeg(status));
    }

    Ok(tokio::fs::read(&output_path).await?)
}

/// Background thumbnail generation. Uploads enqueue a batch and return
/// immediately; the worker renders each entry, stores the result under
/// `thumbnails/<id>.jpg` and flips the row's thumbnail flag. Failures are
/// logged and skipped so one broken file never stalls the batch.
#[derive(Clone)]
pub struct ThumbnailWorker {
    backend: Arc<dyn BlobBackend>,
    files: Arc<dyn FileRepository>,
    tracker: TaskTracker,
}

impl ThumbnailWorker {
    pub fn new(backend: Arc<dyn BlobBackend>, files: Arc<dyn FileRepository>) -> Self {
        Self {
            backend,
            files,
            tracker: TaskTracker::new(),
        }
    }

    pub fn enqueue(&self, batch: Vec<FileEntry>) {
        if batch.is_empty() {
            return;
        }
        let worker = self.clone();
        self.tracker.spawn(async move {
            for entry in batch {
                if let Err(e) = worker.process(&entry).await {
                    warn!("Thumbnail generation failed for {}: {}", entry.id, e);
                }
            }
        });
    }

    async fn process(&self, entry: &FileEntry) -> Result<(), ThumbnailError> {
        let mut reader = self.backend.get(&entry.blob_key()).await?;
        let mut bytes = Vec::with_capacity(entry.size.max(0) as usize);
        reader.read_to_end(&mut bytes).await?;

        let thumbnail = if entry.is_video() {
            let extension = entry.extension.as_deref().unwrap_or("mp4");
            render_video_thumbnail(&bytes, extension).await?
        } else {
            tokio::task::spawn_blocking(move || render_image_thumbnail(&bytes))
                .await
                .map_err(|e| ThumbnailError::Worker(e.to_string()))??
        };

        self.backend.put(&entry.thumbnail_key(), &thumbnail).await?;
        self.files.mark_thumbnail(entry.id).await?;
        debug!("Generated thumbnail for {}", entry.id);
        Ok(())
    }

    /// Stops accepting work and waits for in-flight batches to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn tall_images_are_scaled_to_320_preserving_ratio() {
        let thumbnail = render_image_thumbnail(&sample_png(800, 640)).unwrap();
        let decoded = image::load_from_memory(&thumbnail).unwrap();
        assert_eq!(decoded.dimensions(), (400, 320));
        assert_eq!(
            image::guess_format(&thumbnail).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn small_images_keep_their_dimensions() {
        let thumbnail = render_image_thumbnail(&sample_png(100, 80)).unwrap();
        let decoded = image::load_from_memory(&thumbnail).unwrap();
        assert_eq!(decoded.dimensions(), (100, 80));
    }

    #[test]
    fn undecodable_bytes_are_an_error() {
        assert!(render_image_thumbnail(b"definitely not an image").is_err());
    }
}
