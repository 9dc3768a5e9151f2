use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("destination directory missing or not writable: {0}")]
    Destination(String),
    #[error("invalid file name: {0}")]
    InvalidName(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the destination directory exists and is writable; create if missing.
pub fn ensure_output_dir(dir: &Path) -> Result<(), StorageError> {
    if dir.exists() {
        let meta =
            std::fs::metadata(dir).map_err(|e| StorageError::Destination(e.to_string()))?;
        if !meta.is_dir() {
            return Err(StorageError::Destination("path is not a directory".into()));
        }
    } else {
        std::fs::create_dir_all(dir).map_err(|e| StorageError::Destination(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| StorageError::Destination(e.to_string()))?;
    Ok(())
}

/// Creates named writable resources. One run opens, writes and closes many
/// of them sequentially, one at a time.
#[async_trait::async_trait]
pub trait StorageTarget: Send + Sync {
    async fn create(&self, name: &str) -> Result<Box<dyn WritableResource>, StorageError>;
}

/// A local file opened for sequential writing. The file only appears under
/// its final name after `finish`; `abort` leaves nothing behind.
#[async_trait::async_trait]
pub trait WritableResource: Send {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError>;
    async fn finish(self: Box<Self>) -> Result<(), StorageError>;
    async fn abort(self: Box<Self>);
}

/// Filesystem storage target writing into one output directory.
#[derive(Debug, Clone)]
pub struct DirStorageTarget {
    dir: PathBuf,
}

impl DirStorageTarget {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait::async_trait]
impl StorageTarget for DirStorageTarget {
    async fn create(&self, name: &str) -> Result<Box<dyn WritableResource>, StorageError> {
        // Names come from the resolver already sanitized; a separator here
        // would escape the output directory, so it is rejected outright.
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(StorageError::InvalidName(name.to_string()));
        }

        let target_path = self.dir.join(name);
        let part_path = self.dir.join(format!("{name}.part"));
        let file = fs::File::create(&part_path).await?;

        Ok(Box::new(PartFileWriter {
            file,
            part_path,
            target_path,
        }))
    }
}

/// Streams into `<name>.part`, then fsyncs and renames into place on close.
struct PartFileWriter {
    file: fs::File,
    part_path: PathBuf,
    target_path: PathBuf,
}

#[async_trait::async_trait]
impl WritableResource for PartFileWriter {
    async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), StorageError> {
        self.file.write_all(chunk).await?;
        Ok(())
    }

    async fn finish(self: Box<Self>) -> Result<(), StorageError> {
        let mut file = self.file;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        // Replace an existing file if present to keep determinism.
        if fs::metadata(&self.target_path).await.is_ok() {
            fs::remove_file(&self.target_path).await?;
        }
        fs::rename(&self.part_path, &self.target_path).await?;
        Ok(())
    }

    async fn abort(self: Box<Self>) {
        drop(self.file);
        let _ = fs::remove_file(&self.part_path).await;
    }
}
