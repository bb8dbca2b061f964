//! Shared harness: parse a command line, run it against the in-memory API,
//! capture what it printed.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use tempfile::TempDir;

use fastly_cli::cli::commands::execute_command;
use fastly_cli::cli::{Cli, CliResult};
use fastly_cli::config::{ConfigFile, EnvOverrides, Manifest, Settings};
use fastly_cli::infrastructure::di::ServiceContainer;
use fastly_cli::infrastructure::traits::RealFileSystem;
use fastly_cli::util::testing::{fake_factory, init_test_setup, FakeApi, FakeVersioner};

pub struct TestEnv {
    pub temp: TempDir,
    pub api: Arc<FakeApi>,
    pub file: ConfigFile,
    pub env: EnvOverrides,
    pub manifest: Manifest,
}

impl TestEnv {
    /// Environment with an API token set, as if `FASTLY_API_TOKEN` were exported.
    pub fn new(api: FakeApi) -> Self {
        init_test_setup();
        Self {
            temp: TempDir::new().unwrap(),
            api: Arc::new(api),
            file: ConfigFile::default(),
            env: EnvOverrides {
                api_token: Some("123".into()),
                ..Default::default()
            },
            manifest: Manifest::default(),
        }
    }

    /// Environment without any credentials.
    pub fn without_token(api: FakeApi) -> Self {
        let mut env = Self::new(api);
        env.env.api_token = None;
        env
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp.path().join("config.toml")
    }

    pub fn container(&self, cli: &Cli) -> ServiceContainer {
        let settings = Settings {
            file: self.file.clone(),
            path: self.config_path(),
            env: self.env.clone(),
            manifest: self.manifest.clone(),
        };
        ServiceContainer::with_deps(
            settings,
            cli.globals(),
            Arc::new(RealFileSystem),
            fake_factory(self.api.clone()),
            Arc::new(FakeVersioner::new(
                semver::Version::new(1, 0, 0),
                Path::new("/nonexistent/fastly"),
            )),
        )
    }

    /// Run `fastly <args>` and return the result with everything printed.
    pub fn run(&self, args: &[&str]) -> (CliResult<()>, String) {
        let (result, out, _) = self.run_with_ctx(args);
        (result, out)
    }

    /// Like `run`, also returning the container so settings changes can be inspected.
    pub fn run_with_ctx(&self, args: &[&str]) -> (CliResult<()>, String, ServiceContainer) {
        let cli = Cli::try_parse_from(std::iter::once("fastly").chain(args.iter().copied()))
            .unwrap_or_else(|e| panic!("failed to parse {:?}: {}", args, e));
        let mut ctx = self.container(&cli);
        let mut out = Vec::new();
        let result = execute_command(&cli, &mut ctx, &mut out);
        (result, String::from_utf8(out).unwrap(), ctx)
    }
}
