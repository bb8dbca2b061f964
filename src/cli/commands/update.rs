use std::io::Write;
use std::path::Path;

use semver::Version as SemVer;
use tracing::instrument;

use crate::cli::commands::Logged;
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, spinner};
use crate::domain::parse_version;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Version of the running binary.
pub fn current_version() -> CliResult<SemVer> {
    Ok(parse_version(env!("CARGO_PKG_VERSION"))?)
}

/// `fastly update`: replace the binary at `target` with the latest release.
#[instrument(skip(ctx, out))]
pub fn run_update(
    ctx: &ServiceContainer,
    current: &SemVer,
    target: &Path,
    out: &mut dyn Write,
) -> CliResult<()> {
    let updates = ctx.updates();
    let pb = spinner("Checking for the latest release", ctx.globals.quiet);
    let check = updates.check(current);
    pb.finish_and_clear();
    let check = check.logged(&ctx.errlog, &[("Current version", current.to_string())])?;

    output::plain(out, &format!("Current version: {}", check.current))?;
    output::plain(out, &format!("Latest version: {}", check.latest))?;
    if !check.update_available() {
        output::success(out, "Latest version already installed.")?;
        return Ok(());
    }

    output::plain(out, "Updating versioned binary...")?;
    let pb = spinner("Downloading latest release", ctx.globals.quiet);
    let installed = updates.install(&check.latest, target);
    pb.finish_and_clear();
    installed.logged(
        &ctx.errlog,
        &[
            ("Latest version", check.latest.to_string()),
            ("Binary", target.display().to_string()),
        ],
    )?;
    output::success(
        out,
        &format!("Updated {} to {}.", target.display(), check.latest),
    )?;
    Ok(())
}

/// `fastly version`
pub fn run_version(out: &mut dyn Write) -> CliResult<()> {
    let current = current_version()?;
    output::plain(
        out,
        &format!(
            "Fastly CLI version v{} ({}-{})",
            current,
            std::env::consts::ARCH,
            std::env::consts::OS
        ),
    )?;
    let exe = std::env::current_exe()
        .map_err(|e| CliError::Infra(InfraError::io("locate current executable", e)))?;
    output::plain(out, &format!("Binary path: {}", exe.display()))?;
    Ok(())
}
