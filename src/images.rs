use rand::RngCore;
use rand::rngs::OsRng;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use unicode_normalization::UnicodeNormalization;

use crate::config::UploadConfig;

/// Filesystem store for item images. Stored names are opaque to callers.
pub struct ImageStore {
    dir: PathBuf,
    allowed_extensions: Vec<String>,
}

impl ImageStore {
    pub fn new(cfg: &UploadConfig) -> Self {
        Self {
            dir: cfg.dir.clone(),
            allowed_extensions: cfg.allowed_extensions.iter().map(|e| e.to_lowercase()).collect(),
        }
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => self.allowed_extensions.iter().any(|a| *a == ext.to_lowercase()),
            None => false,
        }
    }

    /// Writes `data` under a freshly generated name. Returns `None` without touching the
    /// disk when there is no filename or its extension is not accepted.
    pub async fn save(&self, data: &[u8], original_filename: Option<&str>) -> io::Result<Option<String>> {
        let original = match original_filename {
            Some(name) if !name.is_empty() => name,
            _ => return Ok(None),
        };

        if !self.is_allowed(original) {
            tracing::debug!(filename = original, "dropping upload with disallowed extension");
            return Ok(None);
        }

        let mut token = [0u8; 8];
        OsRng.fill_bytes(&mut token);
        let filename = secure_filename(&format!("{}_{}", hex::encode(token), original));

        self.ensure_dir().await?;
        let path = self.dir.join(&filename);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        tracing::debug!("saved image to {:?}", path);
        Ok(Some(filename))
    }

    /// Removes a stored image. Already missing files are not an error.
    pub async fn delete(&self, filename: &str) -> io::Result<()> {
        let Some(path) = self.path_for(filename) else {
            return Ok(());
        };

        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!("deleted image {:?}", path);
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Path of a stored image; `None` if `filename` tries to leave the store.
    pub fn path_for(&self, filename: &str) -> Option<PathBuf> {
        let name = Path::new(filename).file_name()?;
        if name != filename {
            return None;
        }
        Some(self.dir.join(name))
    }
}

/// Reduces an arbitrary client filename to `[A-Za-z0-9_.-]`, safe to join onto a directory.
pub fn secure_filename(name: &str) -> String {
    let ascii: String = name
        .nfkd()
        .filter(char::is_ascii)
        .map(|c| if c == '/' || c == '\\' { ' ' } else { c })
        .collect();

    let joined = ascii.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}
