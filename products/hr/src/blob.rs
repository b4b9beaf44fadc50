//! Blob storage for profile images and onboarding documents.
//!
//! The workflow only relies on the [`BlobStore`] contract: uploading an
//! already-hosted URL is a no-op that returns it unchanged, and deleting a URL
//! the store does not own does nothing.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use thiserror::Error;
use uuid::Uuid;

pub const MAX_BLOB_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("payload is not valid base64")]
    InvalidEncoding,
    #[error("payload is empty")]
    Empty,
    #[error("payload exceeds {MAX_BLOB_BYTES} bytes")]
    TooLarge,
    #[error("blob storage failed: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `payload` (base64, data URL, or hosted URL) under `folder` and
    /// returns its public URL.
    async fn upload(&self, payload: &str, folder: &str) -> Result<String, BlobError>;

    /// Removes a previously uploaded blob. Unknown URLs are ignored.
    async fn delete(&self, url: &str) -> Result<(), BlobError>;
}

pub fn is_hosted_url(payload: &str) -> bool {
    let trimmed = payload.trim_start();
    trimmed.starts_with("https://") || trimmed.starts_with("http://")
}

/// Decoded upload body plus the file extension to store it under.
#[derive(Debug, PartialEq, Eq)]
pub struct DecodedBlob {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
}

pub fn decode_payload(payload: &str) -> Result<DecodedBlob, BlobError> {
    let trimmed = payload.trim();
    let (mime, encoded) = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (meta, data) = rest.split_once(',').ok_or(BlobError::InvalidEncoding)?;
            let mime = meta.strip_suffix(";base64").ok_or(BlobError::InvalidEncoding)?;
            (Some(mime), data)
        }
        None => (None, trimmed),
    };
    if encoded.is_empty() {
        return Err(BlobError::Empty);
    }
    // Base64 inflates by 4/3; bail before decoding oversized bodies.
    if encoded.len() / 4 * 3 > MAX_BLOB_BYTES {
        return Err(BlobError::TooLarge);
    }
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|_| BlobError::InvalidEncoding)?;
    if bytes.is_empty() {
        return Err(BlobError::Empty);
    }
    let extension = mime
        .and_then(extension_for_mime)
        .unwrap_or_else(|| sniff_extension(&bytes));
    Ok(DecodedBlob { bytes, extension })
}

fn extension_for_mime(mime: &str) -> Option<&'static str> {
    match mime.to_ascii_lowercase().as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "application/pdf" => Some("pdf"),
        "text/plain" => Some("txt"),
        _ => None,
    }
}

fn sniff_extension(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        "pdf"
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        "png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "jpg"
    } else if bytes.starts_with(b"GIF8") {
        "gif"
    } else {
        "bin"
    }
}

/// Filesystem-backed store. Files land under `root/<folder>/<uuid>.<ext>` and
/// are served from `public_base_url`.
#[derive(Clone, Debug)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for_url(&self, url: &str) -> Option<PathBuf> {
        let relative = url.strip_prefix(&self.public_base_url)?.strip_prefix('/')?;
        if relative.split('/').any(|part| part.is_empty() || part == "..") {
            return None;
        }
        Some(self.root.join(relative))
    }
}

fn sanitize_folder(folder: &str) -> String {
    let cleaned: String = folder
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect();
    if cleaned.is_empty() {
        "misc".to_string()
    } else {
        cleaned
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, payload: &str, folder: &str) -> Result<String, BlobError> {
        if is_hosted_url(payload) {
            return Ok(payload.trim().to_string());
        }
        let blob = decode_payload(payload)?;
        let folder = sanitize_folder(folder);
        let dir = self.root.join(&folder);
        tokio::fs::create_dir_all(&dir).await?;
        let file_name = format!("{}.{}", Uuid::new_v4().simple(), blob.extension);
        tokio::fs::write(dir.join(&file_name), &blob.bytes).await?;
        tracing::debug!(folder = %folder, bytes = blob.bytes.len(), "blob stored");
        Ok(format!("{}/{}/{}", self.public_base_url, folder, file_name))
    }

    async fn delete(&self, url: &str) -> Result<(), BlobError> {
        let Some(path) = self.path_for_url(url) else {
            return Ok(());
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_urls_use_the_declared_mime() {
        let blob = decode_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(blob.bytes, b"hello");
        assert_eq!(blob.extension, "png");
    }

    #[test]
    fn raw_base64_is_sniffed() {
        let encoded = STANDARD.encode(b"%PDF-1.7 body");
        let blob = decode_payload(&encoded).unwrap();
        assert_eq!(blob.extension, "pdf");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode_payload("not base64 at all!"),
            Err(BlobError::InvalidEncoding)
        ));
        assert!(matches!(decode_payload("   "), Err(BlobError::Empty)));
        assert!(matches!(
            decode_payload("data:image/png,aGVsbG8="),
            Err(BlobError::InvalidEncoding)
        ));
    }

    #[tokio::test]
    async fn hosted_urls_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/uploads");
        let url = store
            .upload("https://cdn.example/avatar.png", "avatars")
            .await
            .unwrap();
        assert_eq!(url, "https://cdn.example/avatar.png");
    }

    #[tokio::test]
    async fn upload_then_delete_round_trips_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/uploads/");
        let url = store
            .upload("data:text/plain;base64,aGVsbG8=", "docs/../x")
            .await
            .unwrap();
        assert!(url.starts_with("/uploads/docs----x/"));
        assert!(url.ends_with(".txt"));

        let path = store.path_for_url(&url).unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"hello");

        store.delete(&url).await.unwrap();
        assert!(!path.exists());
        // Second delete and foreign URLs are no-ops.
        store.delete(&url).await.unwrap();
        store.delete("https://elsewhere.example/a.png").await.unwrap();
    }

    #[test]
    fn traversal_urls_are_not_ours() {
        let store = LocalBlobStore::new("/tmp/blobs", "/uploads");
        assert!(store.path_for_url("/uploads/../etc/passwd").is_none());
        assert!(store.path_for_url("/uploadsevil/a").is_none());
    }
}
