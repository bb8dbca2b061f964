use std::io::Write;

use crate::cli::args::ServiceVersionCommands;
use crate::cli::commands::{check_output, edit_version, read_version, service_id, version_context, Logged};
use crate::cli::error::CliResult;
use crate::cli::output::{self, cell, Block, Table};
use crate::infrastructure::di::ServiceContainer;

pub fn run(
    cmd: &ServiceVersionCommands,
    ctx: &ServiceContainer,
    out: &mut dyn Write,
) -> CliResult<()> {
    let resolver = ctx.resolver()?;
    let api = ctx.api()?;
    match cmd {
        ServiceVersionCommands::Clone { service, version } => {
            let sid = service_id(ctx, &resolver, service, out)?;
            let source = read_version(ctx, &resolver, &sid, version)?;
            let cloned = api
                .clone_version(&sid, source.number)
                .logged(&ctx.errlog, &version_context(&sid, source.number))?;
            output::success(
                out,
                &format!(
                    "Cloned service {} version {} to version {}",
                    sid, source.number, cloned.number
                ),
            )?;
        }
        ServiceVersionCommands::List {
            service,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let sid = service_id(ctx, &resolver, service, out)?;
            let mut versions = api
                .list_versions(&sid)
                .logged(&ctx.errlog, &[("Service ID", sid.clone())])?;
            versions.sort_by_key(|v| v.number);
            if fmt.json {
                output::json(out, &versions)?;
            } else if ctx.globals.verbose {
                for v in &versions {
                    writeln!(out, "Version {}/{}", v.number, versions.len())?;
                    Block::indented(out, 1)
                        .field("Number", v.number)?
                        .field("Active", v.active)?
                        .field("Locked", v.locked)?
                        .field("Deployed", v.deployed)?
                        .field("Staging", v.staging)?
                        .field("Testing", v.testing)?
                        .optional("Comment", &v.comment)?
                        .optional("Created (UTC)", &v.created_at)?
                        .optional("Last edited (UTC)", &v.updated_at)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["NUMBER", "ACTIVE", "LAST EDITED (UTC)"]);
                for v in &versions {
                    table.row([v.number.to_string(), v.active.to_string(), cell(&v.updated_at)]);
                }
                table.render(out)?;
            }
        }
        ServiceVersionCommands::Update {
            service,
            target,
            comment,
        } => {
            let sid = service_id(ctx, &resolver, service, out)?;
            let number = edit_version(ctx, &resolver, &sid, target, out)?;
            api.update_version(&sid, number, comment.as_deref())
                .logged(&ctx.errlog, &version_context(&sid, number))?;
            output::success(out, &format!("Updated service {} version {}", sid, number))?;
        }
        ServiceVersionCommands::Activate { service, target } => {
            let sid = service_id(ctx, &resolver, service, out)?;
            // Locked versions can be activated; only --autoclone forces a fresh copy
            let number = if target.autoclone {
                edit_version(ctx, &resolver, &sid, target, out)?
            } else {
                read_version(ctx, &resolver, &sid, &target.version)?.number
            };
            api.activate_version(&sid, number)
                .logged(&ctx.errlog, &version_context(&sid, number))?;
            output::success(out, &format!("Activated service {} version {}", sid, number))?;
        }
        ServiceVersionCommands::Deactivate { service, version } => {
            let sid = service_id(ctx, &resolver, service, out)?;
            let number = read_version(ctx, &resolver, &sid, version)?.number;
            api.deactivate_version(&sid, number)
                .logged(&ctx.errlog, &version_context(&sid, number))?;
            output::success(out, &format!("Deactivated service {} version {}", sid, number))?;
        }
        ServiceVersionCommands::Lock { service, version } => {
            let sid = service_id(ctx, &resolver, service, out)?;
            let number = read_version(ctx, &resolver, &sid, version)?.number;
            api.lock_version(&sid, number)
                .logged(&ctx.errlog, &version_context(&sid, number))?;
            output::success(out, &format!("Locked service {} version {}", sid, number))?;
        }
    }
    Ok(())
}
