//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Config file: `$XDG_CONFIG_HOME/fastly/config.toml` (or `FASTLY_CONFIG_FILE`)
//! 3. Project manifest: `./fastly.toml` (service id, profile)
//! 4. Environment variables: `FASTLY_*` prefix
//! 5. Command line flags

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::application::ApplicationError;
use crate::infrastructure::api::DEFAULT_ENDPOINT;

/// Current layout version of `config.toml`.
pub const CONFIG_VERSION: u32 = 1;

/// File name of the user configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// File name of the project manifest.
pub const MANIFEST_FILE_NAME: &str = "fastly.toml";

/// Default interval between update checks.
pub const DEFAULT_TTL: &str = "24h";

/// `[fastly]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FastlySection {
    pub api_endpoint: String,
}

impl Default for FastlySection {
    fn default() -> Self {
        Self {
            api_endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

/// `[cli]` section: update check bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CliSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_checked: Option<DateTime<Utc>>,
    pub version: String,
    pub ttl: String,
}

impl Default for CliSection {
    fn default() -> Self {
        Self {
            last_checked: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
            ttl: DEFAULT_TTL.to_string(),
        }
    }
}

/// A named set of credentials (`[profile.<name>]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Profile {
    pub default: bool,
    pub email: String,
    pub token: String,
}

/// Pre-profile `[user]` section, migrated on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LegacyUser {
    pub email: String,
    pub token: String,
}

/// Contents of `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ConfigFile {
    pub config_version: u32,
    pub fastly: FastlySection,
    pub cli: CliSection,
    pub profile: BTreeMap<String, Profile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<LegacyUser>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            config_version: CONFIG_VERSION,
            fastly: FastlySection::default(),
            cli: CliSection::default(),
            profile: BTreeMap::new(),
            user: None,
        }
    }
}

impl ConfigFile {
    /// Parse TOML content.
    pub fn parse(content: &str) -> Result<Self, ApplicationError> {
        toml::from_str(content).map_err(|e| ApplicationError::Config {
            message: format!("parse config: {e}"),
        })
    }

    /// Move a legacy `[user]` section into a `user` profile.
    ///
    /// Returns true if the file changed.
    pub fn migrate_legacy_user(&mut self) -> bool {
        let Some(user) = self.user.take() else {
            return false;
        };
        if user.token.is_empty() || self.profile.contains_key("user") {
            return true;
        }
        let make_default = self.default_profile().is_none();
        self.profile.insert(
            "user".to_string(),
            Profile {
                default: make_default,
                email: user.email,
                token: user.token,
            },
        );
        info!("migrated legacy [user] section to profile 'user'");
        true
    }

    /// The profile flagged as default, if any.
    pub fn default_profile(&self) -> Option<(&str, &Profile)> {
        self.profile
            .iter()
            .find(|(_, p)| p.default)
            .map(|(name, p)| (name.as_str(), p))
    }

    /// Interval between update checks, falling back to the default on bad input.
    pub fn update_ttl(&self) -> Duration {
        parse_ttl(&self.cli.ttl)
            .or_else(|| parse_ttl(DEFAULT_TTL))
            .unwrap_or(Duration::from_secs(24 * 60 * 60))
    }
}

/// Parse durations such as `30s`, `15m`, `24h` or `7d`.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit())?;
    let (number, unit) = raw.split_at(split);
    let value: u64 = number.parse().ok()?;
    let scale: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        _ => return None,
    };
    value.checked_mul(scale).map(Duration::from_secs)
}

/// `FASTLY_*` environment overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvOverrides {
    pub api_token: Option<String>,
    pub api_endpoint: Option<String>,
    pub service_id: Option<String>,
    pub config_file: Option<PathBuf>,
    pub disable_update_check: bool,
}

impl EnvOverrides {
    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("FASTLY"))
            .build()
            .map_err(config_err)?;

        let non_empty = |key: &str| config.get_string(key).ok().filter(|v| !v.is_empty());

        Ok(Self {
            api_token: non_empty("api_token"),
            api_endpoint: non_empty("api_endpoint"),
            service_id: non_empty("service_id"),
            config_file: non_empty("config_file").map(PathBuf::from),
            disable_update_check: config
                .get_bool("disable_update_check")
                .unwrap_or(false),
        })
    }
}

/// Project manifest (`fastly.toml`), only the fields the CLI reads.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Manifest {
    pub manifest_version: Option<i64>,
    pub name: Option<String>,
    pub service_id: Option<String>,
    pub profile: Option<String>,
}

impl Manifest {
    /// Load `fastly.toml` from `dir`; a missing file yields an empty manifest.
    pub fn load(dir: &Path) -> Result<Self, ApplicationError> {
        let path = dir.join(MANIFEST_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| ApplicationError::Config {
            message: format!("read {}: {}", path.display(), e),
        })?;
        toml::from_str(&content).map_err(|e| ApplicationError::Config {
            message: format!("parse {}: {}", path.display(), e),
        })
    }
}

/// Where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Flag(&'static str),
    Environment(&'static str),
    Profile(String),
    Manifest,
    ConfigFile,
    Default,
    Undefined,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Flag(flag) => write!(f, "{flag}"),
            Source::Environment(var) => write!(f, "{var}"),
            Source::Profile(name) => write!(f, "profile '{name}'"),
            Source::Manifest => write!(f, "{MANIFEST_FILE_NAME}"),
            Source::ConfigFile => write!(f, "config file"),
            Source::Default => write!(f, "default"),
            Source::Undefined => write!(f, "not provided"),
        }
    }
}

/// API token plus its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedToken {
    pub token: Option<String>,
    pub source: Source,
}

/// Unified configuration for the CLI.
#[derive(Debug, Clone)]
pub struct Settings {
    pub file: ConfigFile,
    pub path: PathBuf,
    pub env: EnvOverrides,
    pub manifest: Manifest,
}

/// Get the platform config directory for the CLI.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fastly").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}

impl Settings {
    /// Load settings from the environment, the config file and the manifest in `project_dir`.
    pub fn load(project_dir: &Path) -> Result<Self, ApplicationError> {
        let env = EnvOverrides::from_env()?;
        let path = env
            .config_file
            .clone()
            .or_else(global_config_path)
            .ok_or_else(|| ApplicationError::Config {
                message: "cannot determine config directory".to_string(),
            })?;
        let manifest = Manifest::load(project_dir)?;
        Self::load_from(&path, env, manifest)
    }

    /// Load settings from an explicit config path.
    pub fn load_from(
        path: &Path,
        env: EnvOverrides,
        manifest: Manifest,
    ) -> Result<Self, ApplicationError> {
        let mut file = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
                message: format!("read {}: {}", path.display(), e),
            })?;
            ConfigFile::parse(&content)?
        } else {
            debug!("no config at {}, using defaults", path.display());
            ConfigFile::default()
        };

        let settings_changed = file.migrate_legacy_user();
        let settings = Self {
            file,
            path: path.to_path_buf(),
            env,
            manifest,
        };
        if settings_changed {
            settings.save()?;
        }
        Ok(settings)
    }

    /// Directory holding the config file and the error log.
    pub fn config_dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Write the config file atomically with owner-only permissions.
    pub fn save(&self) -> Result<(), ApplicationError> {
        let dir = self.config_dir();
        create_private_dir(&dir).map_err(|e| ApplicationError::Config {
            message: format!("create {}: {}", dir.display(), e),
        })?;
        let content = toml::to_string_pretty(&self.file).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })?;

        let write_err = |e: std::io::Error| ApplicationError::Config {
            message: format!("write {}: {}", self.path.display(), e),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&dir).map_err(write_err)?;
        tmp.write_all(content.as_bytes()).map_err(write_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(tmp.path(), std::fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        debug!("saved config to {}", self.path.display());
        Ok(())
    }

    /// True when the config file is readable by group or others.
    #[cfg(unix)]
    pub fn has_insecure_permissions(&self) -> bool {
        use std::os::unix::fs::PermissionsExt;
        std::fs::metadata(&self.path)
            .map(|m| m.permissions().mode() & 0o077 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    pub fn has_insecure_permissions(&self) -> bool {
        false
    }

    /// Resolve the API token: flag, env, `--profile`, manifest profile, default profile.
    pub fn resolve_token(
        &self,
        flag_token: Option<&str>,
        flag_profile: Option<&str>,
    ) -> Result<ResolvedToken, ApplicationError> {
        if let Some(token) = flag_token.filter(|t| !t.is_empty()) {
            return Ok(ResolvedToken {
                token: Some(token.to_string()),
                source: Source::Flag("--token"),
            });
        }
        if let Some(token) = &self.env.api_token {
            return Ok(ResolvedToken {
                token: Some(token.clone()),
                source: Source::Environment("FASTLY_API_TOKEN"),
            });
        }
        if let Some(name) = flag_profile {
            let profile = self
                .file
                .profile
                .get(name)
                .ok_or_else(|| ApplicationError::ProfileNotFound(name.to_string()))?;
            return Ok(ResolvedToken {
                token: Some(profile.token.clone()),
                source: Source::Profile(name.to_string()),
            });
        }
        if let Some(name) = &self.manifest.profile {
            if let Some(profile) = self.file.profile.get(name) {
                return Ok(ResolvedToken {
                    token: Some(profile.token.clone()),
                    source: Source::Manifest,
                });
            }
            debug!("manifest profile '{}' not found, using default", name);
        }
        if let Some((name, profile)) = self.file.default_profile() {
            return Ok(ResolvedToken {
                token: Some(profile.token.clone()),
                source: Source::Profile(name.to_string()),
            });
        }
        Ok(ResolvedToken {
            token: None,
            source: Source::Undefined,
        })
    }

    /// Resolve the API endpoint: flag, env, config file, default.
    pub fn resolve_endpoint(&self, flag: Option<&str>) -> (String, Source) {
        if let Some(endpoint) = flag.filter(|e| !e.is_empty()) {
            return (endpoint.to_string(), Source::Flag("--endpoint"));
        }
        if let Some(endpoint) = &self.env.api_endpoint {
            return (endpoint.clone(), Source::Environment("FASTLY_API_ENDPOINT"));
        }
        let configured = &self.file.fastly.api_endpoint;
        if !configured.is_empty() && configured != DEFAULT_ENDPOINT {
            return (configured.clone(), Source::ConfigFile);
        }
        (DEFAULT_ENDPOINT.to_string(), Source::Default)
    }

    /// Resolve the service id: flag, env, manifest.
    pub fn resolve_service_id(&self, flag: Option<&str>) -> (Option<String>, Source) {
        if let Some(id) = flag.filter(|id| !id.is_empty()) {
            return (Some(id.to_string()), Source::Flag("--service-id"));
        }
        if let Some(id) = &self.env.service_id {
            return (Some(id.clone()), Source::Environment("FASTLY_SERVICE_ID"));
        }
        if let Some(id) = self.manifest.service_id.as_ref().filter(|id| !id.is_empty()) {
            return (Some(id.clone()), Source::Manifest);
        }
        (None, Source::Undefined)
    }
}

fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        std::fs::DirBuilder::new()
            .recursive(true)
            .mode(0o700)
            .create(dir)
    }
    #[cfg(not(unix))]
    {
        std::fs::create_dir_all(dir)
    }
}

/// Convert ConfigError to ApplicationError.
fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn settings_with(file: ConfigFile, env: EnvOverrides, manifest: Manifest) -> Settings {
        Settings {
            file,
            path: PathBuf::from("/nonexistent/config.toml"),
            env,
            manifest,
        }
    }

    fn two_profiles() -> ConfigFile {
        let mut file = ConfigFile::default();
        file.profile.insert(
            "main".into(),
            Profile {
                default: true,
                email: "main@example.com".into(),
                token: "main-token".into(),
            },
        );
        file.profile.insert(
            "staging".into(),
            Profile {
                default: false,
                email: "staging@example.com".into(),
                token: "staging-token".into(),
            },
        );
        file
    }

    #[rstest]
    #[case("30s", 30)]
    #[case("15m", 900)]
    #[case("24h", 86_400)]
    #[case("7d", 604_800)]
    fn given_ttl_string_when_parsing_then_returns_seconds(#[case] raw: &str, #[case] secs: u64) {
        assert_eq!(parse_ttl(raw), Some(Duration::from_secs(secs)));
    }

    #[rstest]
    #[case("")]
    #[case("h")]
    #[case("10")]
    #[case("10w")]
    #[case("999999999999999999d")]
    #[case("99999999999999999999s")]
    fn given_invalid_ttl_when_parsing_then_none(#[case] raw: &str) {
        assert_eq!(parse_ttl(raw), None);
    }

    #[test]
    fn given_flag_token_when_resolving_then_flag_wins() {
        let env = EnvOverrides {
            api_token: Some("env-token".into()),
            ..Default::default()
        };
        let settings = settings_with(two_profiles(), env, Manifest::default());

        let resolved = settings.resolve_token(Some("flag-token"), None).unwrap();

        assert_eq!(resolved.token.as_deref(), Some("flag-token"));
        assert_eq!(resolved.source, Source::Flag("--token"));
    }

    #[test]
    fn given_env_token_when_resolving_then_env_beats_profiles() {
        let env = EnvOverrides {
            api_token: Some("env-token".into()),
            ..Default::default()
        };
        let settings = settings_with(two_profiles(), env, Manifest::default());

        let resolved = settings.resolve_token(None, Some("staging")).unwrap();

        assert_eq!(resolved.token.as_deref(), Some("env-token"));
        assert_eq!(resolved.source, Source::Environment("FASTLY_API_TOKEN"));
    }

    #[test]
    fn given_profile_flag_when_resolving_then_uses_named_profile() {
        let settings = settings_with(two_profiles(), EnvOverrides::default(), Manifest::default());

        let resolved = settings.resolve_token(None, Some("staging")).unwrap();

        assert_eq!(resolved.token.as_deref(), Some("staging-token"));
        assert_eq!(resolved.source, Source::Profile("staging".into()));
    }

    #[test]
    fn given_unknown_profile_flag_when_resolving_then_error() {
        let settings = settings_with(two_profiles(), EnvOverrides::default(), Manifest::default());

        let result = settings.resolve_token(None, Some("nope"));

        assert!(matches!(result, Err(ApplicationError::ProfileNotFound(name)) if name == "nope"));
    }

    #[test]
    fn given_manifest_profile_when_resolving_then_beats_default_profile() {
        let manifest = Manifest {
            profile: Some("staging".into()),
            ..Default::default()
        };
        let settings = settings_with(two_profiles(), EnvOverrides::default(), manifest);

        let resolved = settings.resolve_token(None, None).unwrap();

        assert_eq!(resolved.token.as_deref(), Some("staging-token"));
        assert_eq!(resolved.source, Source::Manifest);
    }

    #[test]
    fn given_nothing_configured_when_resolving_then_undefined() {
        let settings = settings_with(
            ConfigFile::default(),
            EnvOverrides::default(),
            Manifest::default(),
        );

        let resolved = settings.resolve_token(None, None).unwrap();

        assert_eq!(resolved.token, None);
        assert_eq!(resolved.source, Source::Undefined);
    }

    #[test]
    fn given_custom_endpoint_in_file_when_resolving_then_config_file_source() {
        let mut file = ConfigFile::default();
        file.fastly.api_endpoint = "https://api.example.com".into();
        let settings = settings_with(file, EnvOverrides::default(), Manifest::default());

        assert_eq!(
            settings.resolve_endpoint(None),
            ("https://api.example.com".to_string(), Source::ConfigFile)
        );
        assert_eq!(
            settings.resolve_endpoint(Some("http://localhost")),
            ("http://localhost".to_string(), Source::Flag("--endpoint"))
        );
    }

    #[test]
    fn given_manifest_service_id_when_env_set_then_env_wins() {
        let env = EnvOverrides {
            service_id: Some("env-sid".into()),
            ..Default::default()
        };
        let manifest = Manifest {
            service_id: Some("manifest-sid".into()),
            ..Default::default()
        };
        let settings = settings_with(ConfigFile::default(), env, manifest);

        assert_eq!(
            settings.resolve_service_id(None),
            (
                Some("env-sid".to_string()),
                Source::Environment("FASTLY_SERVICE_ID")
            )
        );
    }

    #[test]
    fn given_legacy_user_section_when_loading_then_migrates_to_default_profile() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            "[user]\nemail = \"dev@example.com\"\ntoken = \"legacy-token\"\n",
        )
        .unwrap();

        let settings =
            Settings::load_from(&path, EnvOverrides::default(), Manifest::default()).unwrap();

        let profile = settings.file.profile.get("user").unwrap();
        assert!(profile.default);
        assert_eq!(profile.token, "legacy-token");
        assert!(settings.file.user.is_none());
        let saved = std::fs::read_to_string(&path).unwrap();
        assert!(saved.contains("[profile.user]"));
        assert!(!saved.contains("[user]"));
    }

    #[cfg(unix)]
    #[test]
    fn given_settings_when_saving_then_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(CONFIG_FILE_NAME);
        let settings = Settings {
            file: two_profiles(),
            path: path.clone(),
            env: EnvOverrides::default(),
            manifest: Manifest::default(),
        };

        settings.save().unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!settings.has_insecure_permissions());
        let reloaded =
            Settings::load_from(&path, EnvOverrides::default(), Manifest::default()).unwrap();
        assert_eq!(reloaded.file, settings.file);
    }

    #[test]
    fn given_manifest_file_when_loading_then_reads_service_id() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(MANIFEST_FILE_NAME),
            "manifest_version = 3\nname = \"app\"\nservice_id = \"abc\"\n[local_server]\n",
        )
        .unwrap();

        let manifest = Manifest::load(temp.path()).unwrap();

        assert_eq!(manifest.service_id.as_deref(), Some("abc"));
    }
}
