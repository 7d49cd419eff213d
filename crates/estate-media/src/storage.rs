use anyhow::Result;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::compress::compress_image;

/// Manages on-disk media storage for report photos.
///
/// Each upload is stored as a single flat file at `{media_dir}/{image_id}`.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Media storage directory: {}", dir.display());
        Ok(Self { dir })
    }

    /// Path to the stored file for a given image id.
    pub fn file_path(&self, image_id: &str) -> PathBuf {
        self.dir.join(image_id)
    }

    /// Persist an upload, then compress it in place.
    ///
    /// The original bytes are written to their final path first, so the file
    /// exists at its durable location before compression rewrites it. A
    /// decode failure is logged and leaves the original bytes untouched —
    /// one bad upload must not fail the owning report's save.
    pub async fn ingest(&self, image_id: &str, raw: Vec<u8>) -> Result<()> {
        let path = self.file_path(image_id);
        fs::write(&path, &raw).await?;

        let original_len = raw.len();
        // CPU-bound; keep it off the async runtime.
        let compressed = tokio::task::spawn_blocking(move || compress_image(&raw)).await?;

        match compressed {
            Ok(out) => {
                debug!(
                    "Compressed image {}: {} -> {} bytes at quality {}",
                    image_id,
                    original_len,
                    out.bytes.len(),
                    out.quality
                );
                fs::write(&path, &out.bytes).await?;
            }
            Err(e) => {
                warn!("Skipping compression for image {}: {}", image_id, e);
            }
        }
        Ok(())
    }

    pub async fn read(&self, image_id: &str) -> Result<Vec<u8>> {
        let bytes = fs::read(self.file_path(image_id)).await?;
        Ok(bytes)
    }

    /// Delete a stored image.
    pub async fn delete(&self, image_id: &str) -> Result<()> {
        let path = self.file_path(image_id);
        match fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted image {}", image_id);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Image {} already gone", image_id);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Size on disk of a stored image.
    pub async fn file_size(&self, image_id: &str) -> Result<u64> {
        let metadata = fs::metadata(self.file_path(image_id)).await?;
        Ok(metadata.len())
    }
}
