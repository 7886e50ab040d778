use std::path::PathBuf;

use async_trait::async_trait;
use roam_core::{ArtifactError, ArtifactStore};
use uuid::Uuid;

/// Stores uploads on the local filesystem and hands back a public URL.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    dir: PathBuf,
    public_base: String,
}

impl FsArtifactStore {
    pub fn new(dir: impl Into<PathBuf>, public_base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base: public_base.into().trim_end_matches('/').to_string(),
        }
    }
}

/// Keeps `[A-Za-z0-9._-]`, replaces the rest, never yields a path separator.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or("");
    let cleaned: String = base
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, file_name: &str, content: Vec<u8>) -> Result<String, ArtifactError> {
        if content.is_empty() {
            return Err(ArtifactError::Empty);
        }

        let stored_name = format!("{}-{}", Uuid::new_v4(), sanitize_file_name(file_name));
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ArtifactError::Io(e.to_string()))?;
        tokio::fs::write(self.dir.join(&stored_name), content)
            .await
            .map_err(|e| ArtifactError::Io(e.to_string()))?;

        tracing::debug!(file = %stored_name, "Upload stored");
        Ok(format!("{}/{}", self.public_base, stored_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("passport scan.pdf"), "passport_scan.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\docs\\id.png"), "id.png");
        assert_eq!(sanitize_file_name(".."), "upload");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn test_put_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path(), "http://localhost:3000/uploads/");

        let url = store.put("id proof.jpg", b"jpeg-bytes".to_vec()).await.unwrap();
        assert!(url.starts_with("http://localhost:3000/uploads/"));
        assert!(url.ends_with("-id_proof.jpg"));

        let stored = url.rsplit('/').next().unwrap();
        let bytes = std::fs::read(dir.path().join(stored)).unwrap();
        assert_eq!(bytes, b"jpeg-bytes");
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsArtifactStore::new(dir.path(), "/uploads");
        assert!(matches!(store.put("a.png", Vec::new()).await, Err(ArtifactError::Empty)));
    }
}
