//! Atomic writes and rollback snapshots.

use std::fs;
use std::io::{self, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

/// Mode of generated config files.
const CONFIG_FILE_MODE: u32 = 0o644;

/// Write `content` to `path` atomically, creating parent directories.
///
/// The temporary file is created with an unpredictable name and `O_EXCL`
/// in the target directory, synced, then renamed over `path`.
pub fn write_atomic(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no parent directory", path.display()),
        )
    })?;
    fs::create_dir_all(parent)?;

    let mut file = NamedTempFile::new_in(parent)?;
    file.write_all(content)?;
    file.as_file().sync_all()?;
    fs::set_permissions(file.path(), fs::Permissions::from_mode(CONFIG_FILE_MODE))?;
    file.persist(path).map_err(|e| e.error)?;

    debug!(path = %path.display(), bytes = content.len(), "File written");
    Ok(())
}

/// Contents of a file captured before it is changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSnapshot {
    path: PathBuf,
    content: Option<Vec<u8>>,
}

impl FileSnapshot {
    /// Remember the current bytes of `path` (or that it does not exist).
    pub fn capture(path: &Path) -> io::Result<Self> {
        let content = match fs::read(path) {
            Ok(bytes) => Some(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };
        Ok(Self {
            path: path.to_path_buf(),
            content,
        })
    }

    pub fn existed(&self) -> bool {
        self.content.is_some()
    }

    /// Whether the file currently holds exactly `content`.
    pub fn matches(&self, content: &[u8]) -> bool {
        self.content.as_deref() == Some(content)
    }

    /// Put the captured state back.
    pub fn restore(&self) -> io::Result<()> {
        match &self.content {
            Some(bytes) => write_atomic(&self.path, bytes),
            None => match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        }
    }
}
