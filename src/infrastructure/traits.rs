//! I/O boundary traits for testability
//!
//! These traits abstract filesystem operations, allowing services
//! to be tested against temporary directories or fakes.

use std::io;
use std::path::Path;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Rename/move a file.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Remove a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Copy file from source to destination.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Mark a file as executable (no-op where permissions are not mode based).
    fn set_executable(&self, path: &Path) -> io::Result<()>;

    /// Move a file, with fallback for cross-device moves.
    ///
    /// Tries atomic rename first. If that fails with EXDEV (cross-device link),
    /// the file is copied next to the destination and renamed into place.
    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    #[cfg(unix)]
    fn set_executable(&self, path: &Path) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
    }

    #[cfg(not(unix))]
    fn set_executable(&self, _path: &Path) -> io::Result<()> {
        Ok(())
    }

    fn move_path(&self, from: &Path, to: &Path) -> io::Result<()> {
        match std::fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) => {
                // EXDEV = 18 on Unix (cross-device link not permitted)
                #[cfg(unix)]
                const EXDEV: i32 = 18;
                #[cfg(windows)]
                const EXDEV: i32 = 17; // ERROR_NOT_SAME_DEVICE

                if e.raw_os_error() == Some(EXDEV) {
                    // Stage on the destination filesystem so the final step stays a rename
                    let staged = staging_path(to);
                    self.copy(from, &staged)?;
                    std::fs::rename(&staged, to)?;
                    self.remove_file(from)?;
                    Ok(())
                } else {
                    Err(e)
                }
            }
        }
    }
}

/// Sibling of `path` used to stage a file before renaming it into place.
fn staging_path(path: &Path) -> std::path::PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".new");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn given_same_device_when_moving_then_source_is_gone() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("a");
        let to = temp.path().join("b");
        std::fs::write(&from, "payload").unwrap();

        RealFileSystem.move_path(&from, &to).unwrap();

        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "payload");
    }

    #[test]
    fn given_path_when_staging_then_sibling_has_new_suffix() {
        let staged = staging_path(Path::new("/usr/local/bin/fastly"));
        assert_eq!(staged, Path::new("/usr/local/bin/fastly.new"));
    }
}
