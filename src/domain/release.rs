//! Release naming and version comparison for self-update

use semver::Version as SemVer;

use crate::domain::DomainError;

/// Operating system and architecture as used in release asset names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    /// Platform of the running binary.
    pub fn current() -> Self {
        Self::from_rust(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Translate Rust target names into the names used by published releases.
    ///
    /// Names without a known translation pass through unchanged; whether a
    /// release exists for them is only known once its assets are listed.
    pub fn from_rust(os: &str, arch: &str) -> Self {
        let os = match os {
            "macos" => "darwin",
            other => other,
        };
        let arch = match arch {
            "x86_64" => "amd64",
            "aarch64" => "arm64",
            "x86" => "386",
            "powerpc64" => "ppc64",
            "loongarch64" => "loong64",
            other => other,
        };
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    pub fn is_windows(&self) -> bool {
        self.os == "windows"
    }

    /// Archive extension of release assets for this platform.
    pub fn archive_extension(&self) -> &'static str {
        if self.is_windows() {
            ".zip"
        } else {
            ".tar.gz"
        }
    }

    /// File name of the executable inside the archive.
    pub fn executable_name(&self, binary: &str) -> String {
        if self.is_windows() {
            format!("{binary}.exe")
        } else {
            binary.to_string()
        }
    }
}

/// Release asset name, e.g. `fastly_v10.4.0_linux-amd64.tar.gz`.
pub fn asset_name(binary: &str, version: &SemVer, platform: &Platform) -> String {
    format!(
        "{}_v{}_{}-{}{}",
        binary,
        version,
        platform.os,
        platform.arch,
        platform.archive_extension()
    )
}

/// Parse a version string, tolerating a leading `v`.
pub fn parse_version(raw: &str) -> Result<SemVer, DomainError> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
    SemVer::parse(trimmed).map_err(|_| DomainError::InvalidSemver(raw.to_string()))
}

/// True if `latest` is strictly newer than `current`.
pub fn is_newer(current: &SemVer, latest: &SemVer) -> bool {
    latest > current
}
