use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Empty upload")]
    Empty,
    #[error("Upload failed: {0}")]
    Io(String),
}

/// Object storage for uploaded files such as identity proofs.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Stores the bytes and returns a URL the artifact can be fetched from.
    async fn put(&self, file_name: &str, content: Vec<u8>) -> Result<String, ArtifactError>;
}
