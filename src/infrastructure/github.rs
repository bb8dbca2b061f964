//! Release lookup and download from GitHub
//!
//! Used by `fastly update` and the background update check.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use semver::Version as SemVer;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::domain::{asset_name, parse_version, DomainError, Platform};
use crate::infrastructure::archive::{extract_executable, ArchiveFormat};
use crate::infrastructure::traits::FileSystem;

const GITHUB_API: &str = "https://api.github.com";
const RELEASES_PER_PAGE: usize = 100;

/// Errors while discovering or downloading a release.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("error fetching {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("no matching release found for v{0}")]
    NoMatchingRelease(SemVer),

    #[error("no asset found for your OS ({os}) and architecture ({arch})")]
    NoAssetForPlatform { os: String, arch: String },

    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ReleaseError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Discovers and downloads published versions of a binary.
pub trait Versioner: Send + Sync {
    /// Name of the binary being versioned.
    fn binary_name(&self) -> &str;

    /// Latest published (non pre-release) version.
    fn latest_version(&self) -> Result<SemVer, ReleaseError>;

    /// Download and extract `version`, returning the path of the executable.
    fn download(&self, version: &SemVer) -> Result<PathBuf, ReleaseError>;
}

#[derive(Debug, Deserialize)]
struct Release {
    #[serde(default)]
    name: Option<String>,
    tag_name: String,
    #[serde(default)]
    assets: Vec<Asset>,
}

#[derive(Debug, Clone, Deserialize)]
struct Asset {
    name: String,
    browser_download_url: String,
}

impl Release {
    fn matches(&self, version: &SemVer) -> bool {
        let plain = version.to_string();
        let prefixed = format!("v{plain}");
        [Some(self.tag_name.as_str()), self.name.as_deref()]
            .into_iter()
            .flatten()
            .any(|candidate| candidate == plain || candidate == prefixed)
    }
}

/// Request pages from 1 upwards until a release matches `version`.
///
/// A page shorter than `RELEASES_PER_PAGE` is the last one.
fn scan_pages<F>(version: &SemVer, mut fetch_page: F) -> Result<Release, ReleaseError>
where
    F: FnMut(usize) -> Result<Vec<Release>, ReleaseError>,
{
    for page in 1.. {
        let releases = fetch_page(page)?;
        let exhausted = releases.len() < RELEASES_PER_PAGE;
        if let Some(release) = releases.into_iter().find(|r| r.matches(version)) {
            return Ok(release);
        }
        if exhausted {
            break;
        }
    }
    Err(ReleaseError::NoMatchingRelease(version.clone()))
}

/// `Versioner` backed by the GitHub releases API.
pub struct GitHubReleases {
    http: Client,
    api_base: String,
    org: String,
    repo: String,
    binary: String,
    platform: Platform,
    fs: std::sync::Arc<dyn FileSystem>,
}

impl GitHubReleases {
    pub fn new(
        org: &str,
        repo: &str,
        binary: &str,
        platform: Platform,
        fs: std::sync::Arc<dyn FileSystem>,
    ) -> Result<Self, ReleaseError> {
        let http = Client::builder()
            .user_agent(format!("FastlyCLI/v{}", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|source| ReleaseError::Http {
                url: GITHUB_API.to_string(),
                source,
            })?;
        Ok(Self {
            http,
            api_base: GITHUB_API.to_string(),
            org: org.to_string(),
            repo: repo.to_string(),
            binary: binary.to_string(),
            platform,
            fs,
        })
    }

    /// Point at a different API host (GitHub Enterprise, local mirrors).
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    fn releases_url(&self) -> String {
        format!("{}/repos/{}/{}/releases", self.api_base, self.org, self.repo)
    }

    fn fetch(&self, url: &str) -> Result<reqwest::blocking::Response, ReleaseError> {
        debug!(url, "github request");
        let response = self
            .http
            .get(url)
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .map_err(|source| ReleaseError::Http {
                url: url.to_string(),
                source,
            })?;
        if !response.status().is_success() {
            return Err(ReleaseError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }
        Ok(response)
    }

    fn fetch_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ReleaseError> {
        self.fetch(url)?.json().map_err(|source| ReleaseError::Http {
            url: url.to_string(),
            source,
        })
    }

    /// Page through all releases until one matches `version`.
    fn find_release(&self, version: &SemVer) -> Result<Release, ReleaseError> {
        scan_pages(version, |page| {
            self.fetch_json(&format!(
                "{}?per_page={}&page={}",
                self.releases_url(),
                RELEASES_PER_PAGE,
                page
            ))
        })
    }

    fn select_asset(&self, release: &Release, version: &SemVer) -> Result<Asset, ReleaseError> {
        let wanted = asset_name(&self.binary, version, &self.platform);
        release
            .assets
            .iter()
            .find(|a| a.name == wanted)
            .cloned()
            .ok_or_else(|| ReleaseError::NoAssetForPlatform {
                os: self.platform.os.clone(),
                arch: self.platform.arch.clone(),
            })
    }
}

impl Versioner for GitHubReleases {
    fn binary_name(&self) -> &str {
        &self.binary
    }

    #[instrument(skip(self))]
    fn latest_version(&self) -> Result<SemVer, ReleaseError> {
        let release: Release = self.fetch_json(&format!("{}/latest", self.releases_url()))?;
        let tag = release.name.as_deref().unwrap_or(&release.tag_name);
        Ok(parse_version(tag).or_else(|_| parse_version(&release.tag_name))?)
    }

    #[instrument(skip(self))]
    fn download(&self, version: &SemVer) -> Result<PathBuf, ReleaseError> {
        let release = self.find_release(version)?;
        let asset = self.select_asset(&release, version)?;
        let format = ArchiveFormat::from_name(&asset.name).ok_or_else(|| {
            ReleaseError::NoAssetForPlatform {
                os: self.platform.os.clone(),
                arch: self.platform.arch.clone(),
            }
        })?;

        let data = self
            .fetch(&asset.browser_download_url)?
            .bytes()
            .map_err(|source| ReleaseError::Http {
                url: asset.browser_download_url.clone(),
                source,
            })?;
        debug!("downloaded {} ({} bytes)", asset.name, data.len());

        let workdir = tempfile::Builder::new()
            .prefix("fastly-download")
            .tempdir()
            .map_err(|e| ReleaseError::io("error creating download directory", e))?;
        let executable = self.platform.executable_name(&self.binary);
        let extracted = extract_executable(&data, format, &executable, workdir.path())
            .map_err(|e| ReleaseError::io(format!("error extracting {}", asset.name), e))?;

        // Copy out of the work dir so the result outlives it
        let (_, target) = tempfile::Builder::new()
            .prefix("fastly-")
            .tempfile()
            .and_then(|f| f.keep().map_err(|e| e.error))
            .map_err(|e| ReleaseError::io("error creating temporary file", e))?;
        self.fs
            .copy(&extracted, &target)
            .map_err(|e| ReleaseError::io(format!("error copying {}", extracted.display()), e))?;
        self.fs
            .set_executable(&target)
            .map_err(|e| ReleaseError::io(format!("error setting permissions on {}", target.display()), e))?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(tag: &str, name: Option<&str>, assets: &[&str]) -> Release {
        Release {
            name: name.map(str::to_string),
            tag_name: tag.to_string(),
            assets: assets
                .iter()
                .map(|a| Asset {
                    name: a.to_string(),
                    browser_download_url: format!("https://example.com/{a}"),
                })
                .collect(),
        }
    }

    fn releases(platform: Platform) -> GitHubReleases {
        GitHubReleases::new(
            "fastly",
            "cli",
            "fastly",
            platform,
            std::sync::Arc::new(crate::infrastructure::traits::RealFileSystem),
        )
        .unwrap()
    }

    #[test]
    fn given_prefixed_tag_when_matching_then_plain_version_matches() {
        let version = SemVer::new(10, 4, 0);
        assert!(release("v10.4.0", None, &[]).matches(&version));
        assert!(release("x", Some("10.4.0"), &[]).matches(&version));
        assert!(!release("v10.3.0", Some("v10.3.0"), &[]).matches(&version));
    }

    #[test]
    fn given_release_with_platform_asset_when_selecting_then_returns_it() {
        let platform = Platform::from_rust("linux", "x86_64");
        let version = SemVer::new(1, 2, 3);
        let rel = release(
            "v1.2.3",
            None,
            &[
                "fastly_v1.2.3_darwin-arm64.tar.gz",
                "fastly_v1.2.3_linux-amd64.tar.gz",
            ],
        );

        let asset = releases(platform).select_asset(&rel, &version).unwrap();

        assert_eq!(asset.name, "fastly_v1.2.3_linux-amd64.tar.gz");
    }

    #[test]
    fn given_release_without_platform_asset_when_selecting_then_names_os_and_arch() {
        let platform = Platform::from_rust("windows", "aarch64");
        let rel = release("v1.2.3", None, &["fastly_v1.2.3_linux-amd64.tar.gz"]);

        let err = releases(platform)
            .select_asset(&rel, &SemVer::new(1, 2, 3))
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "no asset found for your OS (windows) and architecture (arm64)"
        );
    }

    #[test]
    fn given_freebsd_without_published_asset_when_selecting_then_no_asset_error() {
        let platform = Platform::from_rust("freebsd", "x86_64");
        let rel = release("v1.2.3", None, &["fastly_v1.2.3_linux-amd64.tar.gz"]);

        let err = releases(platform)
            .select_asset(&rel, &SemVer::new(1, 2, 3))
            .unwrap_err();

        assert!(matches!(err, ReleaseError::NoAssetForPlatform { ref os, .. } if os == "freebsd"));
    }

    fn page_of(count: usize, first_tag: u64) -> Vec<Release> {
        (0..count as u64)
            .map(|i| release(&format!("v0.{}.0", first_tag + i), None, &[]))
            .collect()
    }

    #[test]
    fn given_match_on_second_page_when_scanning_then_stops_there() {
        let mut requested = Vec::new();

        let found = scan_pages(&SemVer::new(0, 150, 0), |page| {
            requested.push(page);
            Ok(page_of(RELEASES_PER_PAGE, (page as u64 - 1) * RELEASES_PER_PAGE as u64))
        })
        .unwrap();

        assert_eq!(found.tag_name, "v0.150.0");
        assert_eq!(requested, vec![1, 2]);
    }

    #[test]
    fn given_short_page_without_match_when_scanning_then_no_matching_release() {
        let mut requested = Vec::new();

        let err = scan_pages(&SemVer::new(9, 9, 9), |page| {
            requested.push(page);
            let count = if page == 1 { RELEASES_PER_PAGE } else { 3 };
            Ok(page_of(count, 0))
        })
        .unwrap_err();

        assert_eq!(requested, vec![1, 2]);
        assert_eq!(err.to_string(), "no matching release found for v9.9.9");
    }

    #[test]
    fn given_failing_page_when_scanning_then_error_propagates() {
        let err = scan_pages(&SemVer::new(1, 0, 0), |_| {
            Err(ReleaseError::Status {
                url: "https://api.github.com/repos/fastly/cli/releases".into(),
                status: 503,
            })
        })
        .unwrap_err();

        assert!(matches!(err, ReleaseError::Status { status: 503, .. }));
    }
}
