use std::io::Write;

use crate::cli::args::DictionaryCommands;
use crate::cli::commands::{check_output, edit_target, read_target, version_context, versioned_header, Logged};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, Block, Table};
use crate::domain::Dictionary;
use crate::infrastructure::api::DictionaryFields;
use crate::infrastructure::di::ServiceContainer;

pub fn run(cmd: &DictionaryCommands, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    match cmd {
        DictionaryCommands::Create {
            service,
            target,
            name,
            write_only,
        } => {
            let (sid, version) = edit_target(ctx, service, target, out)?;
            let fields = DictionaryFields {
                name: Some(name.clone()),
                write_only: write_only.then_some(true),
            };
            let dict = ctx
                .api()?
                .create_dictionary(&sid, version, &fields)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!(
                    "Created dictionary {} (id {}, service {}, version {})",
                    dict.name, dict.id, sid, version
                ),
            )?;
        }
        DictionaryCommands::List {
            service,
            version,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let (sid, version) = read_target(ctx, service, version, out)?;
            let dicts = ctx
                .api()?
                .list_dictionaries(&sid, version)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &dicts)?;
            } else if ctx.globals.verbose {
                versioned_header(out, &sid, version)?;
                for d in &dicts {
                    describe(&mut Block::indented(out, 1), d)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["SERVICE", "VERSION", "ID", "NAME", "WRITE ONLY"]);
                for d in &dicts {
                    table.row([
                        d.service_id.clone(),
                        d.version.to_string(),
                        d.id.clone(),
                        d.name.clone(),
                        d.write_only.to_string(),
                    ]);
                }
                table.render(out)?;
            }
        }
        DictionaryCommands::Describe {
            service,
            version,
            name,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let (sid, version) = read_target(ctx, service, version, out)?;
            let dict = ctx
                .api()?
                .get_dictionary(&sid, version, name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &dict)?;
            } else {
                let mut block = Block::new(out);
                block.field("Service ID", &dict.service_id)?;
                block.field("Version", dict.version)?;
                describe(&mut block, &dict)?;
            }
        }
        DictionaryCommands::Update {
            service,
            target,
            name,
            new_name,
            write_only,
        } => {
            if new_name.is_none() && write_only.is_none() {
                return Err(CliError::usage(
                    "error parsing arguments: required flag --new-name or --write-only not provided",
                ));
            }
            let (sid, version) = edit_target(ctx, service, target, out)?;
            let fields = DictionaryFields {
                name: new_name.clone(),
                write_only: *write_only,
            };
            let dict = ctx
                .api()?
                .update_dictionary(&sid, version, name, &fields)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!(
                    "Updated dictionary {} (service {} version {})",
                    dict.name, sid, version
                ),
            )?;
        }
        DictionaryCommands::Delete {
            service,
            target,
            name,
        } => {
            let (sid, version) = edit_target(ctx, service, target, out)?;
            ctx.api()?
                .delete_dictionary(&sid, version, name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Deleted dictionary {} (service {} version {})", name, sid, version),
            )?;
        }
    }
    Ok(())
}

fn describe(block: &mut Block<'_>, d: &Dictionary) -> std::io::Result<()> {
    block.field("ID", &d.id)?;
    block.field("Name", &d.name)?;
    block.field("Write Only", d.write_only)?;
    block.optional("Created (UTC)", &d.created_at)?;
    block.optional("Last edited (UTC)", &d.updated_at)?;
    Ok(())
}
