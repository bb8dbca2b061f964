use std::io::{self, Write};
use std::path::PathBuf;
use std::{env, process};

use chrono::Utc;
use clap::Parser;
use semver::Version as SemVer;
use tracing::debug;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, Layer};

use fastly_cli::application::services::{should_check, BackgroundCheck, CHECK_TIMEOUT};
use fastly_cli::cli::args::Cli;
use fastly_cli::cli::commands::{current_version, execute_command};
use fastly_cli::cli::{output, CliError, CliResult};
use fastly_cli::config::Settings;
use fastly_cli::exitcode;
use fastly_cli::infrastructure::di::ServiceContainer;
use fastly_cli::infrastructure::errlog::LOG_FILE_NAME;
use fastly_cli::infrastructure::replace::remove_stale_binary;

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.debug_mode);

    let mut stderr = io::stderr();
    let (mut ctx, current) = match bootstrap(&cli, &mut stderr) {
        Ok(v) => v,
        Err(e) => {
            let _ = output::error(&mut stderr, &e, e.remediation().as_deref());
            process::exit(e.exit_code());
        }
    };

    let background = match should_check(&ctx.settings, &current, cli.is_version_command(), Utc::now()) {
        Ok(()) => Some(BackgroundCheck::spawn(ctx.versioner.clone(), current)),
        Err(reason) => {
            debug!("update check skipped: {:?}", reason);
            None
        }
    };

    let mut stdout = io::stdout();
    let result = execute_command(&cli, &mut ctx, &mut stdout);
    let _ = stdout.flush();

    let code = match &result {
        Ok(()) => exitcode::OK,
        Err(e) => {
            report(&ctx, e, &mut stderr);
            e.exit_code()
        }
    };

    if let Some(check) = background {
        finish_update_check(check, &mut ctx, &mut stderr);
    }
    process::exit(code);
}

/// Load settings and wire the service container.
fn bootstrap(cli: &Cli, stderr: &mut dyn Write) -> CliResult<(ServiceContainer, SemVer)> {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let settings = Settings::load(&cwd)?;
    if settings.has_insecure_permissions() && !cli.quiet {
        output::warning(
            stderr,
            &format!(
                "Unprotected configuration file {}, run `chmod 600` on it",
                settings.path.display()
            ),
        )?;
    }
    let ctx = ServiceContainer::new(settings, cli.globals())?;
    if let Ok(exe) = env::current_exe() {
        remove_stale_binary(ctx.fs.as_ref(), &exe);
    }
    Ok((ctx, current_version()?))
}

/// Print the error and append it, with everything logged during the run, to `errors.log`.
fn report(ctx: &ServiceContainer, err: &CliError, stderr: &mut dyn Write) {
    let _ = output::error(stderr, err, err.remediation().as_deref());
    ctx.errlog.add(err);
    let path = ctx.settings.config_dir().join(LOG_FILE_NAME);
    let args: Vec<String> = env::args().skip(1).collect();
    if let Err(e) = ctx.errlog.persist(&path, &args) {
        debug!("could not write error log {}: {}", path.display(), e);
    }
}

fn finish_update_check(check: BackgroundCheck, ctx: &mut ServiceContainer, stderr: &mut dyn Write) {
    let Some(result) = check.wait(CHECK_TIMEOUT) else {
        return;
    };
    if result.update_available() && !ctx.globals.quiet {
        let _ = writeln!(stderr);
        let _ = output::info(
            stderr,
            &format!(
                "A new version of the Fastly CLI is available.\nCurrent version: {}\nLatest version: {}\nRun `fastly update` to get the latest version.",
                result.current, result.latest
            ),
        );
    }
    ctx.settings.file.cli.last_checked = Some(Utc::now());
    if let Err(e) = ctx.settings.save() {
        debug!("could not record update check time: {}", e);
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        3 => LevelFilter::TRACE,
        _ => {
            eprintln!("Don't be crazy, max is --debug-mode x3");
            LevelFilter::TRACE
        }
    };

    // HTTP stack internals drown out our own events at debug level
    let noisy_modules = ["hyper", "reqwest", "rustls", "h2"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE);

    let filtered_layer = fmt_layer.with_filter(filter).with_filter(module_filter);

    tracing_subscriber::registry().with(filtered_layer).init();

    match filter {
        LevelFilter::INFO => tracing::info!("Debug mode: info"),
        LevelFilter::DEBUG => tracing::debug!("Debug mode: debug"),
        LevelFilter::TRACE => tracing::debug!("Debug mode: trace"),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastly_cli::util::testing;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        testing::init_test_setup();
        Cli::command().debug_assert();
    }
}
