use std::io;
use std::path::{Path, PathBuf};

use rand::RngCore;

/// Length in hex characters of scratch directory ids
const SCRATCH_ID_HEX_LEN: usize = 24;

/// 24 hex characters of fresh randomness
pub fn random_hex_id() -> String {
    let mut bytes = [0u8; SCRATCH_ID_HEX_LEN / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// A private working directory for a single job.
///
/// Nothing removes it implicitly, the owner calls [`ScratchDir::remove`] on every exit path.
#[derive(Debug)]
pub struct ScratchDir {
    id: String,
    path: PathBuf,
}

impl ScratchDir {
    /// Create `<root>/<24-hex>`. Fails if that directory already exists.
    pub async fn create(root: &Path) -> io::Result<Self> {
        tokio::fs::create_dir_all(root).await?;
        let id = random_hex_id();
        let path = root.join(&id);
        tokio::fs::create_dir(&path).await?;
        Ok(Self { id, path })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.path.join(name)
    }

    /// Remove the directory and everything below it. A directory that is already gone is fine.
    pub async fn remove(self) -> Result<(), (PathBuf, io::Error)> {
        remove_path(&self.path).await.map_err(|e| (self.path, e))
    }
}

/// Recursively remove a file or directory, treating a missing path as success.
pub async fn remove_path(path: &Path) -> io::Result<()> {
    let result = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) if metadata.is_dir() => tokio::fs::remove_dir_all(path).await,
        Ok(_) => tokio::fs::remove_file(path).await,
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
