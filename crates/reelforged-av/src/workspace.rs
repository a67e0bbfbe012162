//! Scratch space for a single render run.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Workspace for a render run.
///
/// Holds narration payloads, caption text files and intermediate clips in a
/// temporary directory created next to the final destination, so the
/// finished file can be moved into place with a rename. Everything left in
/// the workspace is removed when it is dropped.
///
/// # Example
///
/// ```no_run
/// use reelforged_av::Workspace;
///
/// let workspace = Workspace::new("/srv/output/compilation.mp4")?;
/// let audio = workspace.write_file("aries_narration.mp3", b"...")?;
/// // encode into workspace.output(), then
/// workspace.finalize()?;
/// # Ok::<(), reelforged_av::Error>(())
/// ```
pub struct Workspace {
    temp_dir: TempDir,
    destination: PathBuf,
    output_path: PathBuf,
}

impl Workspace {
    /// Create a new workspace whose finished output lands at `destination`.
    pub fn new<P: AsRef<Path>>(destination: P) -> Result<Self> {
        let destination = destination.as_ref().to_path_buf();

        let file_name = destination
            .file_name()
            .ok_or_else(|| Error::InvalidInput("Invalid output file path".to_string()))?
            .to_owned();

        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| {
            Error::Workspace(format!("Failed to create output directory {:?}: {}", parent, e))
        })?;

        let temp_dir = tempfile::Builder::new()
            .prefix(".reelforged-")
            .tempdir_in(&parent)
            .map_err(|e| Error::Workspace(e.to_string()))?;
        let output_path = temp_dir.path().join(file_name);

        Ok(Self {
            temp_dir,
            destination,
            output_path,
        })
    }

    /// Where the finished file will be moved by [`Workspace::finalize`].
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Get the in-workspace output file path.
    pub fn output(&self) -> &Path {
        &self.output_path
    }

    /// Get the temp directory path.
    pub fn temp_dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create a temp file path with the given name.
    pub fn temp_file(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write `contents` to a named file inside the workspace.
    pub fn write_file(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.temp_file(name);
        std::fs::write(&path, contents)?;
        Ok(path)
    }

    /// Move the finished output to its destination.
    ///
    /// An existing file at the destination is kept as a `.bak` until the
    /// move succeeds, and restored if it fails.
    pub fn finalize(self) -> Result<PathBuf> {
        let dest = self.destination.as_path();

        if !self.output_path.exists() {
            return Err(Error::Workspace(format!(
                "Output file does not exist: {:?}",
                self.output_path
            )));
        }

        if dest.exists() {
            let backup = dest.with_extension("bak");
            std::fs::rename(dest, &backup).map_err(|e| {
                Error::Workspace(format!("Failed to back up previous output: {}", e))
            })?;

            if let Err(e) = std::fs::rename(&self.output_path, dest) {
                let _ = std::fs::rename(&backup, dest);
                return Err(Error::Workspace(format!(
                    "Failed to move output to destination: {}",
                    e
                )));
            }

            let _ = std::fs::remove_file(&backup);
        } else {
            std::fs::rename(&self.output_path, dest).map_err(|e| {
                Error::Workspace(format!("Failed to move output to destination: {}", e))
            })?;
        }

        Ok(dest.to_path_buf())
    }
}
