//! Self-update: version checks and binary replacement

use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Utc};
use semver::Version as SemVer;
use tracing::{debug, info};

use crate::application::{ApplicationResult, IoResultExt};
use crate::config::Settings;
use crate::domain::is_newer;
use crate::infrastructure::github::Versioner;
use crate::infrastructure::replace::{replace_executable, ReplaceStrategy};
use crate::infrastructure::traits::FileSystem;

/// How long process exit waits for the background check.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(3);

/// Outcome of comparing the running version with the latest release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateCheck {
    pub current: SemVer,
    pub latest: SemVer,
}

impl UpdateCheck {
    pub fn update_available(&self) -> bool {
        is_newer(&self.current, &self.latest)
    }
}

/// Service for checking and installing new releases.
pub struct UpdateService {
    versioner: Arc<dyn Versioner>,
    fs: Arc<dyn FileSystem>,
    strategy: ReplaceStrategy,
}

impl UpdateService {
    pub fn new(versioner: Arc<dyn Versioner>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            versioner,
            fs,
            strategy: ReplaceStrategy::for_current_platform(),
        }
    }

    /// Override how the executable is swapped (tests, unusual filesystems).
    pub fn with_strategy(mut self, strategy: ReplaceStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn check(&self, current: &SemVer) -> ApplicationResult<UpdateCheck> {
        let latest = self.versioner.latest_version()?;
        debug!("check: current={} latest={}", current, latest);
        Ok(UpdateCheck {
            current: current.clone(),
            latest,
        })
    }

    /// Download `version` and swap it in for the binary at `target`.
    pub fn install(&self, version: &SemVer, target: &Path) -> ApplicationResult<()> {
        let downloaded = self.versioner.download(version)?;
        debug!("install: downloaded {}", downloaded.display());
        replace_executable(self.fs.as_ref(), &downloaded, target, self.strategy)
            .with_path_context("replace executable", target)?;
        info!("installed {} {} at {}", self.versioner.binary_name(), version, target.display());
        Ok(())
    }
}

/// Why the background check was not started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The command itself deals with versions (`update`, `version`).
    VersionCommand,
    PreRelease,
    Disabled,
    /// Checked recently enough.
    WithinTtl,
}

/// Decide whether a background check should run for this invocation.
pub fn should_check(
    settings: &Settings,
    current: &SemVer,
    is_version_command: bool,
    now: DateTime<Utc>,
) -> Result<(), SkipReason> {
    if is_version_command {
        return Err(SkipReason::VersionCommand);
    }
    if !current.pre.is_empty() {
        return Err(SkipReason::PreRelease);
    }
    if settings.env.disable_update_check {
        return Err(SkipReason::Disabled);
    }
    if let Some(last) = settings.file.cli.last_checked {
        let ttl = settings.file.update_ttl();
        let elapsed = now.signed_duration_since(last).to_std().unwrap_or_default();
        if elapsed < ttl {
            return Err(SkipReason::WithinTtl);
        }
    }
    Ok(())
}

/// An update check running on a background thread.
pub struct BackgroundCheck {
    rx: Receiver<ApplicationResult<UpdateCheck>>,
}

impl BackgroundCheck {
    /// Start checking for a newer version than `current`.
    pub fn spawn(versioner: Arc<dyn Versioner>, current: SemVer) -> Self {
        let (tx, rx) = mpsc::sync_channel(1);
        thread::spawn(move || {
            let latest = versioner.latest_version().map_err(Into::into);
            let result = latest.map(|latest| UpdateCheck { current, latest });
            // Receiver may already be gone if the command finished first
            let _ = tx.send(result);
        });
        Self { rx }
    }

    /// Collect the result, waiting at most `timeout`.
    pub fn wait(self, timeout: Duration) -> Option<UpdateCheck> {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(check)) => Some(check),
            Ok(Err(e)) => {
                debug!("update check failed: {}", e);
                None
            }
            Err(RecvTimeoutError::Timeout) => {
                debug!("update check timed out after {:?}", timeout);
                None
            }
            Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, EnvOverrides, Manifest};
    use chrono::Duration as ChronoDuration;
    use std::path::PathBuf;

    fn settings(last_checked: Option<DateTime<Utc>>, disabled: bool) -> Settings {
        let mut file = ConfigFile::default();
        file.cli.last_checked = last_checked;
        Settings {
            file,
            path: PathBuf::from("/nonexistent/config.toml"),
            env: EnvOverrides {
                disable_update_check: disabled,
                ..Default::default()
            },
            manifest: Manifest::default(),
        }
    }

    #[test]
    fn given_never_checked_when_deciding_then_checks() {
        let now = Utc::now();
        assert_eq!(
            should_check(&settings(None, false), &SemVer::new(1, 0, 0), false, now),
            Ok(())
        );
    }

    #[test]
    fn given_recent_check_when_deciding_then_skips_within_ttl() {
        let now = Utc::now();
        let recent = now - ChronoDuration::hours(1);
        assert_eq!(
            should_check(&settings(Some(recent), false), &SemVer::new(1, 0, 0), false, now),
            Err(SkipReason::WithinTtl)
        );
    }

    #[test]
    fn given_stale_check_when_deciding_then_checks() {
        let now = Utc::now();
        let stale = now - ChronoDuration::hours(25);
        assert_eq!(
            should_check(&settings(Some(stale), false), &SemVer::new(1, 0, 0), false, now),
            Ok(())
        );
    }

    #[test]
    fn given_prerelease_when_deciding_then_skips() {
        let current = SemVer::parse("1.0.0-beta.2").unwrap();
        assert_eq!(
            should_check(&settings(None, false), &current, false, Utc::now()),
            Err(SkipReason::PreRelease)
        );
    }

    #[test]
    fn given_update_command_or_env_disable_when_deciding_then_skips() {
        let current = SemVer::new(1, 0, 0);
        assert_eq!(
            should_check(&settings(None, false), &current, true, Utc::now()),
            Err(SkipReason::VersionCommand)
        );
        assert_eq!(
            should_check(&settings(None, true), &current, false, Utc::now()),
            Err(SkipReason::Disabled)
        );
    }
}
