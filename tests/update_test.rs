//! Self-update: the `update` command and the background version check

mod common;

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use semver::Version as SemVer;
use tempfile::TempDir;

use fastly_cli::application::services::BackgroundCheck;
use fastly_cli::cli::commands::run_update;
use fastly_cli::config::{EnvOverrides, Manifest, Settings};
use fastly_cli::infrastructure::di::{GlobalOptions, ServiceContainer};
use fastly_cli::infrastructure::traits::RealFileSystem;
use fastly_cli::util::testing::{fake_factory, init_test_setup, FakeApi, FakeVersioner};

/// Container whose release source offers `latest`, downloadable from `binary`.
fn container(temp: &TempDir, latest: SemVer, binary: &Path) -> ServiceContainer {
    init_test_setup();
    let settings = Settings {
        file: Default::default(),
        path: temp.path().join("config.toml"),
        env: EnvOverrides::default(),
        manifest: Manifest::default(),
    };
    ServiceContainer::with_deps(
        settings,
        GlobalOptions {
            quiet: true,
            ..Default::default()
        },
        Arc::new(RealFileSystem),
        fake_factory(Arc::new(FakeApi::new())),
        Arc::new(FakeVersioner::new(latest, binary)),
    )
}

#[test]
fn given_latest_installed_when_updating_then_binary_untouched() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("fastly");
    fs::write(&target, "old").unwrap();
    let ctx = container(&temp, SemVer::new(1, 2, 0), Path::new("/nonexistent/fastly"));
    let mut out = Vec::new();

    // Act
    run_update(&ctx, &SemVer::new(1, 2, 0), &target, &mut out).unwrap();

    // Assert
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "Current version: 1.2.0\nLatest version: 1.2.0\nSUCCESS: Latest version already installed.\n"
    );
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
}

#[test]
fn given_newer_release_when_updating_then_binary_is_replaced() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("fastly");
    fs::write(&target, "old").unwrap();
    let download_dir = TempDir::new().unwrap();
    let downloaded = download_dir.path().join("fastly");
    fs::write(&downloaded, "new").unwrap();
    let ctx = container(&temp, SemVer::new(2, 0, 0), &downloaded);
    let mut out = Vec::new();

    // Act
    run_update(&ctx, &SemVer::new(1, 9, 3), &target, &mut out).unwrap();

    // Assert
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Current version: 1.9.3\nLatest version: 2.0.0\nUpdating versioned binary...\n"));
    assert!(text.ends_with(&format!("SUCCESS: Updated {} to 2.0.0.\n", target.display())));
    assert_eq!(fs::read_to_string(&target).unwrap(), "new");
    assert!(!downloaded.exists());
}

#[test]
fn given_newer_local_build_when_updating_then_nothing_is_downloaded() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("fastly");
    fs::write(&target, "old").unwrap();
    let ctx = container(&temp, SemVer::new(1, 0, 0), Path::new("/nonexistent/fastly"));
    let mut out = Vec::new();

    run_update(&ctx, &SemVer::new(1, 1, 0), &target, &mut out).unwrap();

    assert!(String::from_utf8(out).unwrap().contains("Latest version already installed."));
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
}

#[test]
fn given_failed_download_when_updating_then_error_is_logged_and_binary_kept() {
    // Arrange
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("fastly");
    fs::write(&target, "old").unwrap();
    let ctx = container(&temp, SemVer::new(2, 0, 0), Path::new("/nonexistent/fastly"));
    let mut out = Vec::new();

    // Act
    let result = run_update(&ctx, &SemVer::new(1, 0, 0), &target, &mut out);

    // Assert
    assert!(result.is_err());
    assert_eq!(fs::read_to_string(&target).unwrap(), "old");
    let entries = ctx.errlog.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].context.get("Latest version").map(String::as_str), Some("2.0.0"));
}

#[test]
fn given_newer_release_when_background_check_completes_then_update_is_reported() {
    // Arrange
    let versioner = Arc::new(FakeVersioner::new(SemVer::new(3, 1, 0), Path::new("/nonexistent")));

    // Act
    let check = BackgroundCheck::spawn(versioner, SemVer::new(3, 0, 0)).wait(Duration::from_secs(5));

    // Assert
    let check = check.unwrap();
    assert!(check.update_available());
    assert_eq!(check.latest, SemVer::new(3, 1, 0));
}

#[test]
fn given_slow_release_source_when_waiting_briefly_then_check_is_abandoned() {
    // Arrange
    let versioner = Arc::new(
        FakeVersioner::new(SemVer::new(3, 1, 0), Path::new("/nonexistent"))
            .with_delay(Duration::from_secs(2)),
    );

    // Act
    let check = BackgroundCheck::spawn(versioner, SemVer::new(3, 0, 0))
        .wait(Duration::from_millis(50));

    // Assert
    assert!(check.is_none());
}
