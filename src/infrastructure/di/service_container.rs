//! Service container for dependency injection
//!
//! Wires settings, the API client factory, the release source and the error
//! log into the services commands use.

use std::sync::Arc;

use tracing::debug;

use crate::application::services::{ProfileService, ServiceResolver, UpdateService};
use crate::application::{ApplicationError, ApplicationResult};
use crate::config::{ResolvedToken, Settings, Source};
use crate::domain::Platform;
use crate::infrastructure::api::{ApiFactory, FastlyApi, HttpFastlyClient};
use crate::infrastructure::errlog::ErrorLog;
use crate::infrastructure::github::{GitHubReleases, Versioner};
use crate::infrastructure::traits::{FileSystem, RealFileSystem};

const RELEASE_ORG: &str = "fastly";
const RELEASE_REPO: &str = "cli";
const RELEASE_BINARY: &str = "fastly";

/// Global flags shared by every command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlobalOptions {
    pub token: Option<String>,
    pub endpoint: Option<String>,
    pub profile: Option<String>,
    pub verbose: bool,
    pub quiet: bool,
    pub auto_yes: bool,
    pub non_interactive: bool,
}

/// Container holding settings and the I/O boundaries.
pub struct ServiceContainer {
    pub settings: Settings,
    pub globals: GlobalOptions,
    pub fs: Arc<dyn FileSystem>,
    pub api_factory: ApiFactory,
    pub versioner: Arc<dyn Versioner>,
    pub errlog: Arc<ErrorLog>,
}

impl ServiceContainer {
    /// Create a container with real implementations.
    pub fn new(settings: Settings, globals: GlobalOptions) -> ApplicationResult<Self> {
        let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
        let versioner = GitHubReleases::new(
            RELEASE_ORG,
            RELEASE_REPO,
            RELEASE_BINARY,
            Platform::current(),
            fs.clone(),
        )?;
        Ok(Self::with_deps(
            settings,
            globals,
            fs,
            HttpFastlyClient::factory(),
            Arc::new(versioner),
        ))
    }

    /// Create a container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        globals: GlobalOptions,
        fs: Arc<dyn FileSystem>,
        api_factory: ApiFactory,
        versioner: Arc<dyn Versioner>,
    ) -> Self {
        Self {
            settings,
            globals,
            fs,
            api_factory,
            versioner,
            errlog: Arc::new(ErrorLog::new()),
        }
    }

    pub fn token(&self) -> ApplicationResult<ResolvedToken> {
        self.settings
            .resolve_token(self.globals.token.as_deref(), self.globals.profile.as_deref())
    }

    pub fn endpoint(&self) -> (String, Source) {
        self.settings.resolve_endpoint(self.globals.endpoint.as_deref())
    }

    /// Authenticated API client for the resolved token and endpoint.
    pub fn api(&self) -> ApplicationResult<Arc<dyn FastlyApi>> {
        let resolved = self.token()?;
        let token = resolved.token.ok_or(ApplicationError::NoToken)?;
        let (endpoint, endpoint_source) = self.endpoint();
        debug!(
            "api: token from {}, endpoint {} from {}",
            resolved.source, endpoint, endpoint_source
        );
        Ok((self.api_factory)(&token, &endpoint)?)
    }

    pub fn resolver(&self) -> ApplicationResult<ServiceResolver> {
        Ok(ServiceResolver::new(self.api()?))
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.api_factory.clone())
    }

    pub fn updates(&self) -> UpdateService {
        UpdateService::new(self.versioner.clone(), self.fs.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigFile, EnvOverrides, Manifest, Profile};
    use crate::util::testing::{fake_factory, FakeApi, FakeVersioner};
    use std::path::{Path, PathBuf};

    fn container(file: ConfigFile, globals: GlobalOptions) -> ServiceContainer {
        let settings = Settings {
            file,
            path: PathBuf::from("/nonexistent/config.toml"),
            env: EnvOverrides::default(),
            manifest: Manifest::default(),
        };
        ServiceContainer::with_deps(
            settings,
            globals,
            Arc::new(RealFileSystem),
            fake_factory(Arc::new(FakeApi::new())),
            Arc::new(FakeVersioner::new(
                semver::Version::new(1, 0, 0),
                Path::new("/nonexistent/fastly"),
            )),
        )
    }

    #[test]
    fn given_no_credentials_when_building_api_then_no_token_error() {
        let c = container(ConfigFile::default(), GlobalOptions::default());

        let result = c.api();

        assert!(matches!(result, Err(ApplicationError::NoToken)));
    }

    #[test]
    fn given_default_profile_when_building_api_then_client_is_created() {
        let mut file = ConfigFile::default();
        file.profile.insert(
            "user".into(),
            Profile {
                default: true,
                email: "a@example.com".into(),
                token: "abc".into(),
            },
        );
        let c = container(file, GlobalOptions::default());

        assert!(c.api().is_ok());
        assert_eq!(c.token().unwrap().source, Source::Profile("user".into()));
    }
}
