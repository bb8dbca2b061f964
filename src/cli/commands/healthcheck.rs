use std::io::Write;

use crate::cli::args::{HealthCheckCommands, HealthCheckFlags};
use crate::cli::commands::{check_output, edit_target, read_target, version_context, versioned_header, Logged};
use crate::cli::error::CliResult;
use crate::cli::output::{self, cell, Block, Table};
use crate::domain::HealthCheck;
use crate::infrastructure::api::HealthCheckFields;
use crate::infrastructure::di::ServiceContainer;

pub fn run(cmd: &HealthCheckCommands, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    match cmd {
        HealthCheckCommands::Create {
            service,
            target,
            name,
            flags,
        } => {
            let (sid, version) = edit_target(ctx, service, target, out)?;
            let hc = ctx
                .api()?
                .create_healthcheck(&sid, version, &fields(Some(name.clone()), flags))
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Created healthcheck {} (service {} version {})", hc.name, sid, version),
            )?;
        }
        HealthCheckCommands::List {
            service,
            version,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let (sid, version) = read_target(ctx, service, version, out)?;
            let checks = ctx
                .api()?
                .list_healthchecks(&sid, version)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &checks)?;
            } else if ctx.globals.verbose {
                versioned_header(out, &sid, version)?;
                for (i, hc) in checks.iter().enumerate() {
                    writeln!(out, "\tHealthcheck {}/{}", i + 1, checks.len())?;
                    describe(&mut Block::indented(out, 2), hc)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["SERVICE", "VERSION", "NAME", "METHOD", "HOST", "PATH"]);
                for hc in &checks {
                    table.row([
                        hc.service_id.clone(),
                        hc.version.to_string(),
                        hc.name.clone(),
                        cell(&hc.method),
                        cell(&hc.host),
                        cell(&hc.path),
                    ]);
                }
                table.render(out)?;
            }
        }
        HealthCheckCommands::Describe {
            service,
            version,
            name,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let (sid, version) = read_target(ctx, service, version, out)?;
            let hc = ctx
                .api()?
                .get_healthcheck(&sid, version, name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &hc)?;
            } else {
                let mut block = Block::new(out);
                block.field("Service ID", &hc.service_id)?;
                block.field("Version", hc.version)?;
                describe(&mut block, &hc)?;
            }
        }
        HealthCheckCommands::Update {
            service,
            target,
            name,
            new_name,
            flags,
        } => {
            let (sid, version) = edit_target(ctx, service, target, out)?;
            let hc = ctx
                .api()?
                .update_healthcheck(&sid, version, name, &fields(new_name.clone(), flags))
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Updated healthcheck {} (service {} version {})", hc.name, sid, version),
            )?;
        }
        HealthCheckCommands::Delete {
            service,
            target,
            name,
        } => {
            let (sid, version) = edit_target(ctx, service, target, out)?;
            ctx.api()?
                .delete_healthcheck(&sid, version, name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Deleted healthcheck {} (service {} version {})", name, sid, version),
            )?;
        }
    }
    Ok(())
}

fn fields(name: Option<String>, flags: &HealthCheckFlags) -> HealthCheckFields {
    HealthCheckFields {
        name,
        comment: flags.comment.clone(),
        method: flags.method.clone(),
        host: flags.host.clone(),
        path: flags.path.clone(),
        http_version: flags.http_version.clone(),
        timeout: flags.timeout,
        check_interval: flags.check_interval,
        expected_response: flags.expected_response,
        window: flags.window,
        threshold: flags.threshold,
        initial: flags.initial,
    }
}

fn describe(block: &mut Block<'_>, hc: &HealthCheck) -> std::io::Result<()> {
    block.field("Name", &hc.name)?;
    block.optional("Comment", &hc.comment)?;
    block.optional("Method", &hc.method)?;
    block.optional("Host", &hc.host)?;
    block.optional("Path", &hc.path)?;
    block.optional("HTTP version", &hc.http_version)?;
    block.optional("Timeout", &hc.timeout)?;
    block.optional("Check interval", &hc.check_interval)?;
    block.optional("Expected response", &hc.expected_response)?;
    block.optional("Window", &hc.window)?;
    block.optional("Threshold", &hc.threshold)?;
    block.optional("Initial", &hc.initial)?;
    Ok(())
}
