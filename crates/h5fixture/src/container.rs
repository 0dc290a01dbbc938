//! Exclusive ownership of the output file.

use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{FixtureError, Result};

/// An output file created exclusively for one build.
///
/// The file is removed again on drop unless [`ContainerFile::commit`]
/// succeeded, so an aborted build never leaves a partial fixture behind.
#[derive(Debug)]
pub struct ContainerFile {
    path: PathBuf,
    file: Option<File>,
    committed: bool,
}

impl ContainerFile {
    /// Create `path`, failing if anything already exists there.
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => FixtureError::ContainerCreateConflict {
                    path: path.to_path_buf(),
                },
                _ => FixtureError::Io(e),
            })?;
        debug!(path = %path.display(), "created container file");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
            committed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the complete image and sync it to disk.
    pub fn commit(mut self, image: &[u8]) -> Result<()> {
        if let Some(file) = self.file.as_mut() {
            file.write_all(image)?;
            file.flush()?;
            file.sync_all()?;
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for ContainerFile {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        drop(self.file.take());
        match fs::remove_file(&self.path) {
            Ok(()) => warn!(path = %self.path.display(), "removed incomplete fixture"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "could not remove incomplete fixture"),
        }
    }
}
