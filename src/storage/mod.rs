//! File storage collaborator.
//!
//! Owns path construction, collision-safe naming and the actual disk writes
//! for session artifacts. The archiver talks to this trait only, so tests can
//! point it at a temp directory or an in-memory fake.

pub mod archiver;

use crate::error::{LiverecError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory for finalized audio recordings.
pub const RECORDINGS_DIR: &str = "Recordings";
/// Subdirectory for transcript text files.
pub const TRANSCRIPTS_DIR: &str = "Transcripts";
/// Subdirectory for translation text files.
pub const TRANSLATIONS_DIR: &str = "Translations";
/// Subdirectory for marker metadata files.
pub const MARKERS_DIR: &str = "Markers";

/// Trait for artifact persistence.
pub trait FileStorage: Send + Sync {
    /// Absolute path for a scratch file with the given name.
    fn temp_path(&self, name: &str) -> PathBuf;

    /// A filename under `subdirectory` that does not collide with an
    /// existing file, derived from `base` and `ext`.
    fn create_unique_filename(&self, base: &str, ext: &str, subdirectory: &str) -> String;

    /// Persist raw bytes under `subdirectory`, returning the final path.
    fn save_file(&self, bytes: &[u8], name: &str, subdirectory: &str) -> Result<PathBuf>;

    /// Persist UTF-8 text under `subdirectory`, returning the final path.
    fn save_text_file(&self, text: &str, name: &str, subdirectory: &str) -> Result<PathBuf>;
}

/// Storage rooted at a directory on the local filesystem.
pub struct LocalFileStorage {
    root: PathBuf,
    temp_dir: PathBuf,
}

impl LocalFileStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            temp_dir: std::env::temp_dir(),
            root,
        }
    }

    /// Use a dedicated scratch directory instead of the system temp dir.
    pub fn with_temp_dir(mut self, temp_dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = temp_dir.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn subdir(&self, subdirectory: &str) -> Result<PathBuf> {
        let dir = if subdirectory.is_empty() {
            self.root.clone()
        } else {
            self.root.join(subdirectory)
        };
        fs::create_dir_all(&dir).map_err(|e| LiverecError::Storage {
            message: format!("Failed to create {}: {}", dir.display(), e),
        })?;
        Ok(dir)
    }
}

impl FileStorage for LocalFileStorage {
    fn temp_path(&self, name: &str) -> PathBuf {
        self.temp_dir.join(name)
    }

    fn create_unique_filename(&self, base: &str, ext: &str, subdirectory: &str) -> String {
        let dir = if subdirectory.is_empty() {
            self.root.clone()
        } else {
            self.root.join(subdirectory)
        };

        let candidate = format!("{}.{}", base, ext);
        if !dir.join(&candidate).exists() {
            return candidate;
        }
        for n in 1.. {
            let candidate = format!("{}_{}.{}", base, n, ext);
            if !dir.join(&candidate).exists() {
                return candidate;
            }
        }
        unreachable!("filename counter exhausted")
    }

    fn save_file(&self, bytes: &[u8], name: &str, subdirectory: &str) -> Result<PathBuf> {
        let path = self.subdir(subdirectory)?.join(name);
        fs::write(&path, bytes).map_err(|e| LiverecError::Storage {
            message: format!("Failed to write {}: {}", path.display(), e),
        })?;
        Ok(path)
    }

    fn save_text_file(&self, text: &str, name: &str, subdirectory: &str) -> Result<PathBuf> {
        self.save_file(text.as_bytes(), name, subdirectory)
    }
}
