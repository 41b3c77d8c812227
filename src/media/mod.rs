use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("payload is not a decodable image")]
    InvalidImage,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Filesystem-backed image asset store. Uploads land under
/// `<root>/uploads/<kind>/<random-uuid>.<ext>`, with the extension taken from
/// the sniffed image format.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Validates and persists an uploaded image, returning its relative path.
    /// The payload must both sniff as a known format and fully decode;
    /// anything else is rejected before touching the filesystem.
    pub fn save_image(&self, kind: &str, bytes: &[u8]) -> Result<String, MediaError> {
        let format = image::guess_format(bytes).map_err(|_| MediaError::InvalidImage)?;
        image::load_from_memory(bytes).map_err(|_| MediaError::InvalidImage)?;

        let ext = format.extensions_str().first().copied().unwrap_or("png");
        let relative = format!("uploads/{}/{}.{}", kind, Uuid::new_v4(), ext);

        let path = self.root.join(&relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(relative)
    }

    /// Removes a stored asset. Missing files are not an error; the entity
    /// row is already the source of truth.
    pub fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove media asset {}: {}", path.display(), e);
            }
        }
    }

    pub fn path_for(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x1 RGBA PNG
    const PNG: &[u8] = &[
        0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48,
        0x44, 0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00,
        0x00, 0x1f, 0x15, 0xc4, 0x89, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x44, 0x41, 0x54, 0x78,
        0x9c, 0x63, 0xf8, 0xcf, 0xc0, 0xf0, 0x1f, 0x00, 0x05, 0x00, 0x01, 0xff, 0x89, 0x99,
        0x3d, 0x1d, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4e, 0x44, 0xae, 0x42, 0x60, 0x82,
    ];

    fn temp_store() -> MediaStore {
        let root = std::env::temp_dir().join(format!("wardrobe-media-{}", Uuid::new_v4()));
        MediaStore::new(root)
    }

    #[test]
    fn saves_valid_png_under_kind_directory() {
        let store = temp_store();
        let relative = store.save_image("collection", PNG).unwrap();
        assert!(relative.starts_with("uploads/collection/"));
        assert!(relative.ends_with(".png"));
        assert!(store.path_for(&relative).exists());
        store.remove(&relative);
        assert!(!store.path_for(&relative).exists());
    }

    #[test]
    fn rejects_non_image_payload() {
        let store = temp_store();
        let err = store.save_image("garment", b"definitely not an image").unwrap_err();
        assert!(matches!(err, MediaError::InvalidImage));
    }

    #[test]
    fn rejects_truncated_image_payload() {
        let store = temp_store();
        // Valid magic bytes, unusable body
        let err = store.save_image("garment", &PNG[..16]).unwrap_err();
        assert!(matches!(err, MediaError::InvalidImage));
    }

    #[test]
    fn removing_missing_asset_is_silent() {
        let store = temp_store();
        store.remove("uploads/collection/nope.png");
    }
}
