use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::ServiceError;

/// URL prefix under which stored files are served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads/";
const MAX_EXTENSION_LEN: usize = 10;

/// Local directory holding uploaded photos.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
}

impl UploadStorage {
    /// Storage rooted at `dir`. The directory is created by [`UploadStorage::ensure_dir`].
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the upload directory (and parents) when missing.
    pub async fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    /// Write `bytes` under a fresh `<uuid><ext>` name and return the public URL.
    pub async fn save(
        &self,
        original_name: Option<&str>,
        bytes: &[u8],
    ) -> Result<String, ServiceError> {
        let file_name = format!(
            "{}{}",
            Uuid::new_v4(),
            sanitize_extension(original_name.unwrap_or_default())
        );
        self.ensure_dir().await.map_err(|err| {
            warn!(dir = %self.dir.display(), error = %err, "failed to create upload directory");
            ServiceError::Internal("failed to store upload".into())
        })?;

        let path = self.dir.join(&file_name);
        fs::write(&path, bytes).await.map_err(|err| {
            warn!(path = %path.display(), error = %err, "failed to write upload");
            ServiceError::Internal("failed to store upload".into())
        })?;

        debug!(file = %file_name, size = bytes.len(), "stored upload");
        Ok(format!("{UPLOADS_URL_PREFIX}{file_name}"))
    }

    /// Remove the file behind a `/uploads/<file>` URL.
    ///
    /// URLs outside the upload area, or pointing at nested paths, are ignored.
    /// A file that is already gone is not an error. Returns whether a file was removed.
    pub async fn remove_by_url(&self, url: &str) -> Result<bool, ServiceError> {
        let Some(file_name) = url.strip_prefix(UPLOADS_URL_PREFIX) else {
            return Ok(false);
        };
        if !is_plain_file_name(file_name) {
            warn!(url, "refusing to remove upload outside the upload directory");
            return Ok(false);
        }

        let path = self.dir.join(file_name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(file = %file_name, "removed upload");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "failed to remove upload");
                Err(ServiceError::Internal("failed to remove upload".into()))
            }
        }
    }
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.contains("..")
}

/// Extension of `original_name` with its leading dot, or an empty string when
/// the name has no usable extension. Only ASCII alphanumerics are kept.
pub fn sanitize_extension(original_name: &str) -> String {
    let Some((stem, ext)) = original_name.rsplit_once('.') else {
        return String::new();
    };
    if stem.is_empty() {
        // dotfile such as ".bashrc"
        return String::new();
    }

    let cleaned: String = ext
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(MAX_EXTENSION_LEN)
        .collect::<String>()
        .to_ascii_lowercase();

    if cleaned.is_empty() {
        String::new()
    } else {
        format!(".{cleaned}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_extension() {
        assert_eq!(sanitize_extension("scan.PNG"), ".png");
        assert_eq!(sanitize_extension("archive.tar.gz"), ".gz");
        assert_eq!(sanitize_extension("noext"), "");
        assert_eq!(sanitize_extension(".bashrc"), "");
        assert_eq!(sanitize_extension("evil.p/h\\p"), ".php");
        assert_eq!(sanitize_extension("long.abcdefghijklmnop"), ".abcdefghij");
        assert_eq!(sanitize_extension("trailing."), "");
    }

    #[tokio::test]
    async fn test_save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path().join("nested"));

        let url = storage.save(Some("xray.jpg"), b"pixels").await.unwrap();
        assert!(url.starts_with(UPLOADS_URL_PREFIX));
        assert!(url.ends_with(".jpg"));

        let file_name = url.strip_prefix(UPLOADS_URL_PREFIX).unwrap();
        let stored = std::fs::read(storage.dir().join(file_name)).unwrap();
        assert_eq!(stored, b"pixels");

        assert!(storage.remove_by_url(&url).await.unwrap());
        assert!(!storage.remove_by_url(&url).await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_ignores_foreign_urls() {
        let dir = tempfile::tempdir().unwrap();
        let storage = UploadStorage::new(dir.path());
        let outside = dir.path().join("keep.txt");
        std::fs::write(&outside, b"x").unwrap();

        assert!(!storage.remove_by_url("https://cdn.example.com/a.png").await.unwrap());
        assert!(!storage.remove_by_url("/uploads/../keep.txt").await.unwrap());
        assert!(!storage.remove_by_url("/uploads/sub/keep.txt").await.unwrap());
        assert!(outside.exists());
    }
}
