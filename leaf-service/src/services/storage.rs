use async_trait::async_trait;
use service_core::error::AppError;
use std::path::PathBuf;
use tokio::fs;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError>;
    /// Whether the backing location is reachable.
    async fn is_ready(&self) -> bool;
}

/// Flat directory on local disk. Keys are file names generated by the
/// service, never client input.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn upload(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        fs::write(self.base_path.join(key), data).await?;
        Ok(())
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let data = fs::read(self.base_path.join(key)).await?;
        Ok(data)
    }

    async fn is_ready(&self) -> bool {
        fs::metadata(&self.base_path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false)
    }
}
