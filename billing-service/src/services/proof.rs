//! Proof-of-transfer image storage collaborator.
//!
//! The HTTP layer enforces content type and size before bytes get here; this
//! layer only persists them and hands back a stable reference.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

#[async_trait]
pub trait ProofStore: Send + Sync {
    async fn store(
        &self,
        invoice_id: Uuid,
        bytes: &[u8],
        content_type: &str,
    ) -> anyhow::Result<String>;
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// Stores proof images under a configured directory on local disk.
pub struct DiskProofStore {
    root: PathBuf,
}

impl DiskProofStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

#[async_trait]
impl ProofStore for DiskProofStore {
    async fn store(
        &self,
        invoice_id: Uuid,
        bytes: &[u8],
        content_type: &str,
    ) -> anyhow::Result<String> {
        let filename = format!(
            "{}-{}.{}",
            invoice_id,
            Uuid::new_v4(),
            extension_for(content_type)
        );
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.root.join(&filename);
        tokio::fs::write(&path, bytes).await?;

        tracing::info!(invoice_id = %invoice_id, path = %path.display(), "Proof image stored");

        Ok(format!("/proofs/{}", filename))
    }
}

/// Mock proof store for tests: records nothing on disk.
pub struct MockProofStore {
    stored: AtomicU64,
}

impl MockProofStore {
    pub fn new() -> Self {
        Self {
            stored: AtomicU64::new(0),
        }
    }

    pub fn stored(&self) -> u64 {
        self.stored.load(Ordering::SeqCst)
    }
}

impl Default for MockProofStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProofStore for MockProofStore {
    async fn store(
        &self,
        invoice_id: Uuid,
        _bytes: &[u8],
        content_type: &str,
    ) -> anyhow::Result<String> {
        let n = self.stored.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!(
            "mock://proofs/{}/{}.{}",
            invoice_id,
            n,
            extension_for(content_type)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disk_store_writes_the_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let store = DiskProofStore::new(dir.path().to_path_buf());
        let invoice_id = Uuid::new_v4();

        let url = store
            .store(invoice_id, b"fake image bytes", "image/png")
            .await
            .unwrap();

        assert!(url.starts_with("/proofs/"));
        assert!(url.ends_with(".png"));

        let filename = url.trim_start_matches("/proofs/");
        let on_disk = std::fs::read(dir.path().join(filename)).unwrap();
        assert_eq!(on_disk, b"fake image bytes");
    }
}
