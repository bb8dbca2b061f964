//! Replacing the running executable in place

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::infrastructure::traits::FileSystem;

/// How the running binary is swapped for a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceStrategy {
    /// Rename the new file over the old path. The running process keeps its inode.
    Overwrite,
    /// The running file is locked: rename it aside first, then move the new file in.
    RenameAside,
}

impl ReplaceStrategy {
    pub fn for_current_platform() -> Self {
        if cfg!(windows) {
            ReplaceStrategy::RenameAside
        } else {
            ReplaceStrategy::Overwrite
        }
    }
}

/// Path the old binary is parked at by `RenameAside`.
pub fn aside_path(current: &Path) -> PathBuf {
    let mut name: OsString = current
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".old");
    current.with_file_name(name)
}

/// Move `replacement` to `current`.
///
/// With `RenameAside` the original binary is restored if the final move fails.
pub fn replace_executable(
    fs: &dyn FileSystem,
    replacement: &Path,
    current: &Path,
    strategy: ReplaceStrategy,
) -> io::Result<()> {
    debug!(
        "replace_executable: {} -> {} ({:?})",
        replacement.display(),
        current.display(),
        strategy
    );
    match strategy {
        ReplaceStrategy::Overwrite => fs.move_path(replacement, current),
        ReplaceStrategy::RenameAside => {
            let old = aside_path(current);
            if fs.exists(&old) {
                fs.remove_file(&old)?;
            }
            fs.rename(current, &old)?;
            if let Err(e) = fs.move_path(replacement, current) {
                if let Err(restore) = fs.rename(&old, current) {
                    warn!("failed to restore {}: {}", current.display(), restore);
                }
                return Err(e);
            }
            Ok(())
        }
    }
}

/// Remove a binary parked by a previous `RenameAside` update.
///
/// Failures are ignored: the file may still be locked by another process.
pub fn remove_stale_binary(fs: &dyn FileSystem, current: &Path) {
    let old = aside_path(current);
    if fs.exists(&old) {
        match fs.remove_file(&old) {
            Ok(()) => debug!("removed stale binary {}", old.display()),
            Err(e) => debug!("could not remove stale binary {}: {}", old.display(), e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::traits::RealFileSystem;
    use rstest::rstest;
    use tempfile::TempDir;

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let temp = TempDir::new().unwrap();
        let current = temp.path().join("fastly");
        let replacement = temp.path().join("download");
        std::fs::write(&current, "old").unwrap();
        std::fs::write(&replacement, "new").unwrap();
        (temp, current, replacement)
    }

    #[rstest]
    #[case(ReplaceStrategy::Overwrite)]
    #[case(ReplaceStrategy::RenameAside)]
    fn given_strategy_when_replacing_then_current_holds_new_content(
        #[case] strategy: ReplaceStrategy,
    ) {
        let (_temp, current, replacement) = setup();

        replace_executable(&RealFileSystem, &replacement, &current, strategy).unwrap();

        assert_eq!(std::fs::read_to_string(&current).unwrap(), "new");
        assert!(!replacement.exists());
    }

    #[test]
    fn given_rename_aside_when_replacing_then_old_binary_is_parked() {
        let (_temp, current, replacement) = setup();

        replace_executable(
            &RealFileSystem,
            &replacement,
            &current,
            ReplaceStrategy::RenameAside,
        )
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(aside_path(&current)).unwrap(),
            "old"
        );
        remove_stale_binary(&RealFileSystem, &current);
        assert!(!aside_path(&current).exists());
    }

    #[test]
    fn given_missing_replacement_when_renaming_aside_then_original_is_restored() {
        let (temp, current, _) = setup();
        let missing = temp.path().join("does-not-exist");

        let result = replace_executable(
            &RealFileSystem,
            &missing,
            &current,
            ReplaceStrategy::RenameAside,
        );

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&current).unwrap(), "old");
        assert!(!aside_path(&current).exists());
    }
}
