use ss_core::{Error, Result, VectorStorage};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub mod backends;

pub use backends::*;

pub const DEFAULT_STORAGE_PATH: &str = "db/articles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Memory,
    Disk,
    Qdrant,
}

impl FromStr for StorageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "disk" | "file" => Ok(Self::Disk),
            "qdrant" => Ok(Self::Qdrant),
            other => Err(Error::Config(format!(
                "Unknown storage backend '{}'. Available: memory, disk, qdrant",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Memory => "memory",
            Self::Disk => "disk",
            Self::Qdrant => "qdrant",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub kind: StorageKind,
    pub path: PathBuf,
    pub url: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            path: PathBuf::from(DEFAULT_STORAGE_PATH),
            url: None,
        }
    }
}

pub async fn create_storage(config: &StorageConfig) -> Result<Arc<dyn VectorStorage>> {
    match config.kind {
        StorageKind::Memory => Ok(Arc::new(MemoryStorage::new())),
        StorageKind::Disk => Ok(Arc::new(DiskStorage::open(&config.path).await?)),
        #[cfg(feature = "qdrant")]
        StorageKind::Qdrant => Ok(Arc::new(QdrantStorage::connect(config.url.as_deref()).await?)),
        #[cfg(not(feature = "qdrant"))]
        StorageKind::Qdrant => Err(Error::Config(
            "Qdrant support is not compiled in; rebuild with the 'qdrant' feature".to_string(),
        )),
    }
}

/// Collection names end up in file names and remote identifiers.
pub(crate) fn validate_collection(collection: &str) -> Result<()> {
    let valid = !collection.is_empty()
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!("Invalid collection name: {:?}", collection)))
    }
}

pub(crate) fn check_lengths(chunks: usize, embeddings: usize) -> Result<()> {
    if chunks != embeddings {
        return Err(Error::Storage(format!(
            "Got {} chunks but {} embeddings",
            chunks, embeddings
        )));
    }
    Ok(())
}

pub mod prelude {
    pub use super::{create_storage, StorageConfig, StorageKind};
    pub use super::backends::*;
}
