//! On-disk media store.
//!
//! Files live under `<root>/<images|videos|audio|documents>/` and are
//! referenced from the database by their path relative to the root.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::{Component, Path, PathBuf};
use tracing::{info, warn};

use super::models::MediaType;

const SUBDIRS: [&str; 4] = ["images", "videos", "audio", "documents"];

/// File written by [`MediaStorage::save`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub file_name: String,
    /// Relative to the storage root
    pub relative_path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StorageStats {
    pub total: String,
    pub total_bytes: u64,
    pub by_type: StorageByType,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StorageByType {
    pub images: String,
    pub videos: String,
    pub audio: String,
    pub documents: String,
}

#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
}

impl MediaStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and per-type subdirectories.
    pub async fn init(&self) -> Result<()> {
        for subdir in SUBDIRS {
            let dir = self.root.join(subdir);
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("Failed to create media directory {}", dir.display()))?;
        }
        info!(path = %self.root.display(), "Media storage ready");
        Ok(())
    }

    /// Reject paths that could escape the root.
    pub fn resolve(&self, relative_path: &str) -> Result<PathBuf> {
        let path = Path::new(relative_path);
        let escapes = path.is_absolute()
            || path
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if relative_path.is_empty() || escapes {
            bail!("Invalid media path: {}", relative_path);
        }
        Ok(self.root.join(path))
    }

    pub async fn save(&self, media_type: MediaType, mime_type: &str, bytes: &[u8]) -> Result<StoredFile> {
        let size = bytes.len() as u64;
        if size > media_type.max_size() {
            bail!(
                "File too large. Max size for {}: {}",
                media_type.as_str(),
                format_bytes(media_type.max_size())
            );
        }

        let file_name = generate_file_name(extension_for_mime(mime_type));
        let relative_path = format!("{}/{}", media_type.subdir(), file_name);
        let full_path = self.root.join(media_type.subdir()).join(&file_name);

        tokio::fs::create_dir_all(self.root.join(media_type.subdir())).await?;
        tokio::fs::write(&full_path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", full_path.display()))?;

        info!(file_name = %file_name, size, "Media saved");

        Ok(StoredFile {
            file_name,
            relative_path,
            size,
        })
    }

    pub async fn read(&self, relative_path: &str) -> Result<Option<Vec<u8>>> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Returns false when the file was already gone.
    pub async fn delete(&self, relative_path: &str) -> Result<bool> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!(path = %relative_path, "Media deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %relative_path, "Media file not found for deletion");
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to delete {}", path.display())),
        }
    }

    pub async fn stats(&self) -> Result<StorageStats> {
        let mut sizes = [0u64; 4];
        for (i, subdir) in SUBDIRS.iter().enumerate() {
            let dir = self.root.join(subdir);
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e).with_context(|| format!("Failed to list {}", dir.display())),
            };
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                if metadata.is_file() {
                    sizes[i] += metadata.len();
                }
            }
        }

        let total_bytes = sizes.iter().sum();
        Ok(StorageStats {
            total: format_bytes(total_bytes),
            total_bytes,
            by_type: StorageByType {
                images: format_bytes(sizes[0]),
                videos: format_bytes(sizes[1]),
                audio: format_bytes(sizes[2]),
                documents: format_bytes(sizes[3]),
            },
        })
    }
}

pub fn extension_for_mime(mime_type: &str) -> &'static str {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    match essence {
        "image/jpeg" => ".jpg",
        "image/png" => ".png",
        "image/gif" => ".gif",
        "image/webp" => ".webp",
        "video/mp4" => ".mp4",
        "video/3gpp" => ".3gp",
        "video/quicktime" => ".mov",
        "audio/ogg" => ".ogg",
        "audio/mpeg" => ".mp3",
        "audio/mp4" => ".m4a",
        "audio/amr" => ".amr",
        "application/pdf" => ".pdf",
        "application/msword" => ".doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => ".docx",
        "application/vnd.ms-excel" => ".xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => ".xlsx",
        "text/plain" => ".txt",
        _ => ".bin",
    }
}

/// `<unix_ms>_<random8><ext>`
fn generate_file_name(extension: &str) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "{}_{}{}",
        chrono::Utc::now().timestamp_millis(),
        &random[..8],
        extension
    )
}

pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(16 * 1024 * 1024), "16.00 MB");
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/jpeg"), ".jpg");
        assert_eq!(extension_for_mime("audio/ogg; codecs=opus"), ".ogg");
        assert_eq!(extension_for_mime("application/x-unknown"), ".bin");
    }

    #[test]
    fn test_resolve_rejects_escapes() {
        let storage = MediaStorage::new("/srv/media");
        assert!(storage.resolve("../etc/passwd").is_err());
        assert!(storage.resolve("images/../../secret").is_err());
        assert!(storage.resolve("/etc/passwd").is_err());
        assert!(storage.resolve("").is_err());
        assert_eq!(
            storage.resolve("images/1_abc.jpg").unwrap(),
            PathBuf::from("/srv/media/images/1_abc.jpg")
        );
    }

    #[test]
    fn test_generated_file_name_shape() {
        let name = generate_file_name(".png");
        let (millis, rest) = name.split_once('_').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(rest.len(), 8 + ".png".len());
        assert!(rest.ends_with(".png"));
    }

    #[tokio::test]
    async fn test_save_read_delete_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        storage.init().await.unwrap();

        let stored = storage
            .save(MediaType::Image, "image/jpeg", &[0u8; 2048])
            .await
            .unwrap();
        assert!(stored.relative_path.starts_with("images/"));
        assert!(stored.file_name.ends_with(".jpg"));
        assert_eq!(stored.size, 2048);

        let bytes = storage.read(&stored.relative_path).await.unwrap().unwrap();
        assert_eq!(bytes.len(), 2048);

        let stats = storage.stats().await.unwrap();
        assert_eq!(stats.total_bytes, 2048);
        assert_eq!(stats.by_type.images, "2.00 KB");
        assert_eq!(stats.by_type.videos, "0 B");

        assert!(storage.delete(&stored.relative_path).await.unwrap());
        assert!(!storage.delete(&stored.relative_path).await.unwrap());
        assert!(storage.read(&stored.relative_path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_rejects_oversized() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::new(dir.path());
        let too_big = vec![0u8; (16 * 1024 * 1024) + 1];

        let err = storage
            .save(MediaType::Audio, "audio/ogg", &too_big)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "File too large. Max size for AUDIO: 16.00 MB");
    }
}
