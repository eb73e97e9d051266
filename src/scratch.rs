use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, warn};

/// Tracks scratch files created during a run and deletes them when dropped.
///
/// Paths are registered before the file is written, so a step that fails
/// halfway still leaves nothing behind.
#[derive(Debug, Default)]
pub struct ScratchFiles {
    paths: Vec<PathBuf>,
}

impl ScratchFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, path: impl Into<PathBuf>) -> PathBuf {
        let path = path.into();
        if !self.paths.contains(&path) {
            self.paths.push(path.clone());
        }
        path
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Deletes every tracked file and returns how many were actually removed.
    pub fn cleanup(&mut self) -> usize {
        let mut removed = 0;
        for path in self.paths.drain(..) {
            if remove_quietly(&path) {
                removed += 1;
            }
        }
        removed
    }
}

impl Drop for ScratchFiles {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn remove_quietly(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("deleted scratch file {}", path.display());
            true
        }
        Err(err) if err.kind() == ErrorKind::NotFound => false,
        Err(err) => {
            warn!("failed to delete scratch file {}: {err}", path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleanup_removes_tracked_files_once() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let a = dir.path().join("temp_page_1.png");
        let b = dir.path().join("temp_page_2.png");
        fs::write(&a, b"a")?;

        let mut scratch = ScratchFiles::new();
        scratch.track(&a);
        scratch.track(&a);
        scratch.track(&b);
        assert_eq!(scratch.paths().len(), 2);

        assert_eq!(scratch.cleanup(), 1);
        assert!(!a.exists());
        assert_eq!(scratch.cleanup(), 0);
        Ok(())
    }

    #[test]
    fn drop_removes_tracked_files() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("resized_page_1.jpg");
        {
            let mut scratch = ScratchFiles::new();
            scratch.track(&path);
            fs::write(&path, b"jpg")?;
        }
        assert!(!path.exists());
        Ok(())
    }
}
