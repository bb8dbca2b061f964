use std::io::Write;

use crate::cli::args::DomainCommands;
use crate::cli::commands::{check_output, edit_target, read_target, version_context, versioned_header, Logged};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, cell, Block, Table};
use crate::domain::DomainValidation;
use crate::infrastructure::api::DomainFields;
use crate::infrastructure::di::ServiceContainer;

pub fn run(cmd: &DomainCommands, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    match cmd {
        DomainCommands::Create {
            service,
            target,
            name,
            comment,
        } => {
            let (sid, version) = edit_target(ctx, service, target, out)?;
            let fields = DomainFields {
                name: Some(name.clone()),
                comment: comment.clone(),
            };
            let domain = ctx
                .api()?
                .create_domain(&sid, version, &fields)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Created domain {} (service {} version {})", domain.name, sid, version),
            )?;
        }
        DomainCommands::List {
            service,
            version,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let (sid, version) = read_target(ctx, service, version, out)?;
            let domains = ctx
                .api()?
                .list_domains(&sid, version)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &domains)?;
            } else if ctx.globals.verbose {
                versioned_header(out, &sid, version)?;
                for (i, d) in domains.iter().enumerate() {
                    writeln!(out, "\tDomain {}/{}", i + 1, domains.len())?;
                    Block::indented(out, 2)
                        .field("Name", &d.name)?
                        .optional("Comment", &d.comment)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["SERVICE", "VERSION", "NAME", "COMMENT"]);
                for d in &domains {
                    table.row([
                        d.service_id.clone(),
                        d.version.to_string(),
                        d.name.clone(),
                        cell(&d.comment),
                    ]);
                }
                table.render(out)?;
            }
        }
        DomainCommands::Describe {
            service,
            version,
            name,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let (sid, version) = read_target(ctx, service, version, out)?;
            let domain = ctx
                .api()?
                .get_domain(&sid, version, name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &domain)?;
            } else {
                Block::new(out)
                    .field("Service ID", &domain.service_id)?
                    .field("Version", domain.version)?
                    .field("Name", &domain.name)?
                    .optional("Comment", &domain.comment)?;
            }
        }
        DomainCommands::Update {
            service,
            target,
            name,
            new_name,
            comment,
        } => {
            if new_name.is_none() && comment.is_none() {
                return Err(CliError::usage(
                    "error parsing arguments: must provide either --new-name or --comment to update domain",
                ));
            }
            let (sid, version) = edit_target(ctx, service, target, out)?;
            let fields = DomainFields {
                name: new_name.clone(),
                comment: comment.clone(),
            };
            let domain = ctx
                .api()?
                .update_domain(&sid, version, name, &fields)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Updated domain {} (service {} version {})", domain.name, sid, version),
            )?;
        }
        DomainCommands::Delete {
            service,
            target,
            name,
        } => {
            let (sid, version) = edit_target(ctx, service, target, out)?;
            ctx.api()?
                .delete_domain(&sid, version, name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Deleted domain {} (service {} version {})", name, sid, version),
            )?;
        }
        DomainCommands::Validate {
            service,
            version,
            all,
            name,
        } => {
            let (sid, version) = read_target(ctx, service, version, out)?;
            let api = ctx.api()?;
            if *all {
                let results = api
                    .validate_all_domains(&sid, version)
                    .logged(&ctx.errlog, &version_context(&sid, version))?;
                let mut table = Table::new(["NAME", "CNAME", "VALID"]);
                for r in &results {
                    table.row([r.domain.name.clone(), r.cname.clone(), r.valid.to_string()]);
                }
                table.render(out)?;
            } else {
                let Some(name) = name else {
                    return Err(CliError::usage(
                        "error parsing arguments: must provide --name or --all",
                    ));
                };
                let result = api
                    .validate_domain(&sid, version, name)
                    .logged(&ctx.errlog, &version_context(&sid, version))?;
                describe_validation(out, &sid, version, &result)?;
            }
        }
    }
    Ok(())
}

fn describe_validation(
    out: &mut dyn Write,
    service_id: &str,
    version: i64,
    v: &DomainValidation,
) -> std::io::Result<()> {
    Block::new(out)
        .field("Service ID", service_id)?
        .field("Service Version", version)?
        .field("Name", &v.domain.name)?
        .field("CNAME", &v.cname)?
        .field("Valid", v.valid)?;
    Ok(())
}
