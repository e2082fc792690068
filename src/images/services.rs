use std::path::PathBuf;

use anyhow::Context;
use axum::async_trait;
use bytes::Bytes;
use tracing::debug;

/// Profile pictures are shrunk to fit this square before being written.
const BOUNDING_BOX: u32 = 125;

#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores a picture and returns the generated filename.
    async fn save_profile_picture(&self, body: Bytes, content_type: &str)
        -> anyhow::Result<String>;
}

/// Writes resized pictures to a local directory served under /static.
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

pub fn ext_from_mime(ct: &str) -> Option<&'static str> {
    match ct {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        _ => None,
    }
}

/// Random 16-hex-character filename, so uploads never collide or leak the
/// original name.
fn random_filename(ext: &str) -> String {
    let bytes: [u8; 8] = rand::random();
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{hex}.{ext}")
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save_profile_picture(
        &self,
        body: Bytes,
        content_type: &str,
    ) -> anyhow::Result<String> {
        let ext = ext_from_mime(content_type)
            .with_context(|| format!("unsupported image type {content_type}"))?;
        let filename = random_filename(ext);
        let path = self.root.join(&filename);

        tokio::fs::create_dir_all(&self.root)
            .await
            .context("create upload directory")?;

        // Decoding and re-encoding are CPU-bound, keep them off the runtime.
        tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
            let img = image::load_from_memory(&body).context("decode image")?;
            let thumb = img.thumbnail(BOUNDING_BOX, BOUNDING_BOX);
            thumb.save(&path).context("save thumbnail")?;
            Ok(())
        })
        .await
        .context("image task panicked")??;

        debug!(%filename, "profile picture stored");
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ext_from_mime() {
        assert_eq!(ext_from_mime("image/jpeg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/jpg"), Some("jpg"));
        assert_eq!(ext_from_mime("image/png"), Some("png"));
        assert_eq!(ext_from_mime("image/webp"), None);
        assert_eq!(ext_from_mime("application/octet-stream"), None);
    }

    #[test]
    fn random_filenames_have_hex_stem_and_extension() {
        let name = random_filename("png");
        let (stem, ext) = name.split_once('.').expect("has extension");
        assert_eq!(ext, "png");
        assert_eq!(stem.len(), 16);
        assert!(stem.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn random_filenames_do_not_repeat() {
        let a = random_filename("jpg");
        let b = random_filename("jpg");
        assert_ne!(a, b);
    }
}
