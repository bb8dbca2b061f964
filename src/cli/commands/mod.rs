//! Command handlers
//!
//! Each handler resolves its inputs through the service container, calls the
//! API and renders the result to `out`. Nothing here prints directly, so the
//! handlers can be driven from tests with a byte buffer.

mod backend;
mod completion;
mod dictionary;
mod dictionary_entry;
mod domain;
mod domainv1;
mod healthcheck;
mod logging;
mod ngwaf;
mod profile;
mod purge;
mod service;
mod service_version;
mod update;
mod whoami;

use std::fmt::Display;
use std::io::Write;

use tracing::{debug, instrument};

use crate::application::services::ServiceResolver;
use crate::cli::args::{Cli, Commands, EditTarget, OutputFlags, ServiceTarget, VersionTarget};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{ResolvedToken, Source};
use crate::domain::Version;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::errlog::ErrorLog;

pub use update::{current_version, run_update, run_version};

#[instrument(skip_all)]
pub fn execute_command(cli: &Cli, ctx: &mut ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    debug!("command: {:?}", cli.command);
    if ctx.globals.verbose && uses_api(&cli.command) {
        report_credentials(ctx, out)?;
    }
    match &cli.command {
        Commands::Service { command } => service::run(command, ctx, out),
        Commands::ServiceVersion { command } => service_version::run(command, ctx, out),
        Commands::Domain { command } => domain::run(command, ctx, out),
        Commands::DomainV1 { command } => domainv1::run(command, ctx, out),
        Commands::Backend { command } => backend::run(command, ctx, out),
        Commands::Healthcheck { command } => healthcheck::run(command, ctx, out),
        Commands::Dictionary { command } => dictionary::run(command, ctx, out),
        Commands::DictionaryEntry { command } => dictionary_entry::run(command, ctx, out),
        Commands::Logging { vendor } => logging::run(vendor, ctx, out),
        Commands::Purge(args) => purge::run(args, ctx, out),
        Commands::Ngwaf { command } => ngwaf::run(command, ctx, out),
        Commands::Profile { command } => profile::run(command, ctx, out),
        Commands::Whoami { output } => whoami::run(*output, ctx, out),
        Commands::Update => {
            let current = update::current_version()?;
            let target = std::env::current_exe().map_err(|e| {
                CliError::Infra(crate::infrastructure::InfraError::io(
                    "locate current executable",
                    e,
                ))
            })?;
            run_update(ctx, &current, &target, out)
        }
        Commands::Version => run_version(out),
        Commands::Completion { shell } => completion::run(*shell, out),
    }
}

fn uses_api(command: &Commands) -> bool {
    !matches!(
        command,
        Commands::Profile { .. } | Commands::Update | Commands::Version | Commands::Completion { .. }
    )
}

/// Where the token and endpoint came from, shown in verbose mode.
fn report_credentials(ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    // Resolution errors surface once the command asks for a client
    match ctx.token() {
        Ok(ResolvedToken {
            token: Some(_),
            source,
        }) => output::info(out, &format!("Fastly API token provided via {source}"))?,
        _ => output::info(out, "Fastly API token not provided")?,
    }
    match ctx.endpoint() {
        (endpoint, Source::Default) => output::info(out, &format!("Fastly API endpoint: {endpoint}"))?,
        (endpoint, source) => {
            output::info(out, &format!("Fastly API endpoint (via {source}): {endpoint}"))?
        }
    }
    Ok(())
}

/// Record a failed result in the error log before it is propagated.
pub trait Logged {
    fn logged(self, log: &ErrorLog, context: &[(&str, String)]) -> Self;
}

impl<T, E: Display> Logged for Result<T, E> {
    #[track_caller]
    fn logged(self, log: &ErrorLog, context: &[(&str, String)]) -> Self {
        if let Err(e) = &self {
            log.add_with_context(e, context);
        }
        self
    }
}

/// `--verbose` and `--json` produce competing output formats.
pub(crate) fn check_output(ctx: &ServiceContainer, output: OutputFlags) -> CliResult<()> {
    if ctx.globals.verbose && output.json {
        return Err(CliError::usage("invalid flag combination, --verbose and --json"));
    }
    Ok(())
}

/// Warnings are dropped in quiet mode.
pub(crate) fn warn(ctx: &ServiceContainer, out: &mut dyn Write, msg: &str) -> CliResult<()> {
    if !ctx.globals.quiet {
        output::warning(out, msg)?;
    }
    Ok(())
}

pub(crate) fn service_id(
    ctx: &ServiceContainer,
    resolver: &ServiceResolver,
    target: &ServiceTarget,
    out: &mut dyn Write,
) -> CliResult<String> {
    let resolved = resolver
        .service(
            &ctx.settings,
            target.service_id.as_deref(),
            target.service_name.as_deref(),
        )
        .logged(&ctx.errlog, &[])?;
    if ctx.globals.verbose {
        output::info(out, &format!("Service ID (via {}): {}", resolved.source, resolved.id))?;
    }
    Ok(resolved.id)
}

/// Version a read-only command operates on.
pub(crate) fn read_version(
    ctx: &ServiceContainer,
    resolver: &ServiceResolver,
    service_id: &str,
    target: &VersionTarget,
) -> CliResult<Version> {
    let version = resolver
        .version(service_id, target.selector())
        .logged(&ctx.errlog, &[("Service ID", service_id.to_string())])?;
    Ok(version)
}

/// Version number a mutating command operates on, cloned if `--autoclone` allows.
pub(crate) fn edit_version(
    ctx: &ServiceContainer,
    resolver: &ServiceResolver,
    service_id: &str,
    target: &EditTarget,
    out: &mut dyn Write,
) -> CliResult<i64> {
    let editable = resolver
        .editable_version(service_id, target.version.selector(), target.autoclone)
        .logged(
            &ctx.errlog,
            &[
                ("Service ID", service_id.to_string()),
                ("Version", target.version.selector().to_string()),
            ],
        )?;
    if let (Some(from), true) = (editable.cloned_from, ctx.globals.verbose) {
        output::info(
            out,
            &format!(
                "Service version {} is not editable, so it was automatically cloned because --autoclone is enabled. Now operating on version {}.",
                from,
                editable.number()
            ),
        )?;
    }
    Ok(editable.number())
}

/// Service id and the version to read, as most list/describe commands need.
pub(crate) fn read_target(
    ctx: &ServiceContainer,
    service: &ServiceTarget,
    version: &VersionTarget,
    out: &mut dyn Write,
) -> CliResult<(String, i64)> {
    let resolver = ctx.resolver()?;
    let sid = service_id(ctx, &resolver, service, out)?;
    let number = read_version(ctx, &resolver, &sid, version)?.number;
    Ok((sid, number))
}

/// Service id and the editable version, as create/update/delete commands need.
pub(crate) fn edit_target(
    ctx: &ServiceContainer,
    service: &ServiceTarget,
    target: &EditTarget,
    out: &mut dyn Write,
) -> CliResult<(String, i64)> {
    let resolver = ctx.resolver()?;
    let sid = service_id(ctx, &resolver, service, out)?;
    let number = edit_version(ctx, &resolver, &sid, target, out)?;
    Ok((sid, number))
}

/// Context attached to error log entries of versioned resources.
pub(crate) fn version_context(service_id: &str, version: i64) -> [(&'static str, String); 2] {
    [
        ("Service ID", service_id.to_string()),
        ("Service Version", version.to_string()),
    ]
}

/// Header printed above verbose listings of versioned resources.
pub(crate) fn versioned_header(out: &mut dyn Write, service_id: &str, version: i64) -> CliResult<()> {
    output::Block::new(out)
        .field("Service ID", service_id)?
        .field("Version", version)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnvOverrides, Manifest, Settings};
    use crate::infrastructure::di::GlobalOptions;
    use crate::infrastructure::traits::RealFileSystem;
    use crate::util::testing::{fake_factory, FakeApi, FakeVersioner};
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    fn container(globals: GlobalOptions) -> ServiceContainer {
        let settings = Settings {
            file: Default::default(),
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
    fn given_verbose_and_json_when_checking_output_then_usage_error() {
        // Arrange
        let ctx = container(GlobalOptions {
            verbose: true,
            ..Default::default()
        });

        // Act
        let result = check_output(&ctx, OutputFlags { json: true });

        // Assert
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "invalid flag combination, --verbose and --json");
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }

    #[test]
    fn given_failed_result_when_logged_then_entry_has_context() {
        let log = ErrorLog::new();
        let result: Result<(), String> = Err("boom".to_string());

        let _ = result.logged(&log, &[("Service ID", "123".to_string())]);

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].error, "boom");
        assert_eq!(entries[0].context.get("Service ID").map(String::as_str), Some("123"));
        assert!(entries[0].caller.contains("mod.rs"));
    }

    #[test]
    fn given_quiet_mode_when_warning_then_nothing_is_written() {
        let ctx = container(GlobalOptions {
            quiet: true,
            ..Default::default()
        });
        let mut out = Vec::new();

        warn(&ctx, &mut out, "careful").unwrap();

        assert!(out.is_empty());
    }
}
