use std::io::Write;

use tracing::info;

use crate::cli::args::ServiceCommands;
use crate::cli::commands::{check_output, service_id, Logged};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, cell, Block, Table};
use crate::domain::Service;
use crate::infrastructure::api::ServiceFields;
use crate::infrastructure::di::ServiceContainer;

pub fn run(cmd: &ServiceCommands, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    match cmd {
        ServiceCommands::Create {
            name,
            service_type,
            comment,
        } => {
            let fields = ServiceFields {
                name: Some(name.clone()),
                service_type: Some(service_type.clone()),
                comment: comment.clone(),
            };
            let service = ctx
                .api()?
                .create_service(&fields)
                .logged(&ctx.errlog, &[("Name", name.clone())])?;
            output::success(out, &format!("Created service {}", service.id))?;
        }
        ServiceCommands::List { output: fmt } => {
            check_output(ctx, *fmt)?;
            let services = ctx.api()?.list_services().logged(&ctx.errlog, &[])?;
            if fmt.json {
                output::json(out, &services)?;
            } else if ctx.globals.verbose {
                for (i, s) in services.iter().enumerate() {
                    writeln!(out, "Service {}/{}", i + 1, services.len())?;
                    describe(&mut Block::indented(out, 1), s)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["NAME", "ID", "TYPE", "ACTIVE VERSION", "LAST EDITED (UTC)"]);
                for s in &services {
                    table.row([
                        s.name.clone(),
                        s.id.clone(),
                        s.service_type.clone(),
                        cell(&s.version),
                        cell(&s.updated_at),
                    ]);
                }
                table.render(out)?;
            }
        }
        ServiceCommands::Describe {
            service,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let resolver = ctx.resolver()?;
            let sid = service_id(ctx, &resolver, service, out)?;
            let service = ctx
                .api()?
                .get_service(&sid)
                .logged(&ctx.errlog, &[("Service ID", sid.clone())])?;
            if fmt.json {
                output::json(out, &service)?;
            } else {
                describe(&mut Block::new(out), &service)?;
            }
        }
        ServiceCommands::Update {
            service,
            name,
            comment,
        } => {
            if name.is_none() && comment.is_none() {
                return Err(CliError::usage(
                    "error parsing arguments: must provide either --name or --comment to update service",
                ));
            }
            let resolver = ctx.resolver()?;
            let sid = service_id(ctx, &resolver, service, out)?;
            let fields = ServiceFields {
                name: name.clone(),
                service_type: None,
                comment: comment.clone(),
            };
            let updated = ctx
                .api()?
                .update_service(&sid, &fields)
                .logged(&ctx.errlog, &[("Service ID", sid.clone())])?;
            output::success(out, &format!("Updated service {}", updated.id))?;
        }
        ServiceCommands::Delete { service, force } => {
            let resolver = ctx.resolver()?;
            let sid = service_id(ctx, &resolver, service, out)?;
            let api = ctx.api()?;
            let context = [("Service ID", sid.clone())];
            if *force {
                let versions = api.list_versions(&sid).logged(&ctx.errlog, &context)?;
                if let Some(active) = versions.iter().find(|v| v.active) {
                    api.deactivate_version(&sid, active.number)
                        .logged(&ctx.errlog, &context)?;
                    info!(service_id = %sid, version = active.number, "deactivated before delete");
                }
            }
            api.delete_service(&sid).logged(&ctx.errlog, &context)?;
            output::success(out, &format!("Deleted service ID {}", sid))?;
        }
        ServiceCommands::Search { name, output: fmt } => {
            check_output(ctx, *fmt)?;
            let service = ctx
                .api()?
                .search_service(name)
                .logged(&ctx.errlog, &[("Name", name.clone())])?;
            if fmt.json {
                output::json(out, &service)?;
            } else {
                describe(&mut Block::new(out), &service)?;
            }
        }
    }
    Ok(())
}

fn describe(block: &mut Block<'_>, s: &Service) -> std::io::Result<()> {
    block.field("ID", &s.id)?;
    block.field("Name", &s.name)?;
    block.field("Type", &s.service_type)?;
    block.optional("Comment", &s.comment)?;
    block.optional("Customer ID", &s.customer_id)?;
    block.optional("Created (UTC)", &s.created_at)?;
    block.optional("Last edited (UTC)", &s.updated_at)?;
    block.optional("Active version", &s.version)?;
    if !s.versions.is_empty() {
        block.section("Versions")?;
        let mut nested = block.nested();
        for v in &s.versions {
            nested.section(&format!("Version {}/{}", v.number, s.versions.len()))?;
            nested
                .nested()
                .field("Number", v.number)?
                .field("Active", v.active)?
                .field("Locked", v.locked)?
                .optional("Comment", &v.comment)?
                .optional("Last edited (UTC)", &v.updated_at)?;
        }
    }
    Ok(())
}
