use std::io::Write;

use crate::cli::args::{BackendCommands, BackendFlags};
use crate::cli::commands::{
    check_output, edit_target, read_target, version_context, versioned_header, warn, Logged,
};
use crate::cli::error::CliResult;
use crate::cli::output::{self, cell, Block, Table};
use crate::domain::Backend;
use crate::infrastructure::api::BackendFields;
use crate::infrastructure::di::ServiceContainer;

const DEFAULT_SSL_PORT: u16 = 443;

pub fn run(cmd: &BackendCommands, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    match cmd {
        BackendCommands::Create {
            service,
            target,
            name,
            flags,
        } => {
            let mut fields = fields(Some(name.clone()), flags);
            if flags.use_ssl == Some(true) && flags.port.is_none() {
                warn(
                    ctx,
                    out,
                    "Use-ssl was set but no port was specified, using default port 443",
                )?;
                fields.port = Some(DEFAULT_SSL_PORT);
            }
            let (sid, version) = edit_target(ctx, service, target, out)?;
            let api = ctx.api()?;
            let backend = api
                .create_backend(&sid, version, &fields)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Created backend {} (service {} version {})", backend.name, sid, version),
            )?;
        }
        BackendCommands::List {
            service,
            version,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let (sid, version) = read_target(ctx, service, version, out)?;
            let backends = ctx
                .api()?
                .list_backends(&sid, version)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &backends)?;
            } else if ctx.globals.verbose {
                versioned_header(out, &sid, version)?;
                for (i, backend) in backends.iter().enumerate() {
                    writeln!(out, "\tBackend {}/{}", i + 1, backends.len())?;
                    describe(&mut Block::indented(out, 2), backend)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["SERVICE", "VERSION", "NAME", "ADDRESS", "PORT", "COMMENT"]);
                for b in &backends {
                    table.row([
                        b.service_id.clone(),
                        b.version.to_string(),
                        b.name.clone(),
                        cell(&b.address),
                        cell(&b.port),
                        cell(&b.comment),
                    ]);
                }
                table.render(out)?;
            }
        }
        BackendCommands::Describe {
            service,
            version,
            name,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let (sid, version) = read_target(ctx, service, version, out)?;
            let backend = ctx
                .api()?
                .get_backend(&sid, version, name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &backend)?;
            } else {
                let mut block = Block::new(out);
                block.field("Service ID", &backend.service_id)?;
                block.field("Version", backend.version)?;
                describe(&mut block, &backend)?;
            }
        }
        BackendCommands::Update {
            service,
            target,
            name,
            new_name,
            flags,
        } => {
            let fields = fields(new_name.clone(), flags);
            let (sid, version) = edit_target(ctx, service, target, out)?;
            let backend = ctx
                .api()?
                .update_backend(&sid, version, name, &fields)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Updated backend {} (service {} version {})", backend.name, sid, version),
            )?;
        }
        BackendCommands::Delete {
            service,
            target,
            name,
        } => {
            let (sid, version) = edit_target(ctx, service, target, out)?;
            ctx.api()?
                .delete_backend(&sid, version, name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!("Deleted backend {} (service {} version {})", name, sid, version),
            )?;
        }
    }
    Ok(())
}

/// Only flags the user passed end up in the request.
fn fields(name: Option<String>, flags: &BackendFlags) -> BackendFields {
    BackendFields {
        name,
        address: flags.address.clone(),
        port: flags.port,
        use_ssl: flags.use_ssl,
        override_host: flags.override_host.clone(),
        comment: flags.comment.clone(),
        connect_timeout: flags.connect_timeout,
        first_byte_timeout: flags.first_byte_timeout,
        between_bytes_timeout: flags.between_bytes_timeout,
        max_conn: flags.max_conn,
        weight: flags.weight,
        auto_loadbalance: flags.auto_loadbalance,
        healthcheck: flags.healthcheck.clone(),
        shield: flags.shield.clone(),
        request_condition: flags.request_condition.clone(),
        ssl_cert_hostname: flags.ssl_cert_hostname.clone(),
        ssl_sni_hostname: flags.ssl_sni_hostname.clone(),
        ssl_check_cert: flags.ssl_check_cert,
        min_tls_version: flags.min_tls_version.clone(),
        max_tls_version: flags.max_tls_version.clone(),
    }
}

fn describe(block: &mut Block<'_>, b: &Backend) -> std::io::Result<()> {
    block.field("Name", &b.name)?;
    block.optional("Comment", &b.comment)?;
    block.optional("Address", &b.address)?;
    block.optional("Port", &b.port)?;
    block.optional("Override host", &b.override_host)?;
    block.optional("Connect timeout", &b.connect_timeout)?;
    block.optional("Max connections", &b.max_conn)?;
    block.optional("First byte timeout", &b.first_byte_timeout)?;
    block.optional("Between bytes timeout", &b.between_bytes_timeout)?;
    block.optional("Auto loadbalance", &b.auto_loadbalance)?;
    block.optional("Weight", &b.weight)?;
    block.optional("Healthcheck", &b.healthcheck)?;
    block.optional("Shield", &b.shield)?;
    block.optional("Use SSL", &b.use_ssl)?;
    block.optional("SSL check cert", &b.ssl_check_cert)?;
    block.optional("SSL certificate hostname", &b.ssl_cert_hostname)?;
    block.optional("SSL SNI hostname", &b.ssl_sni_hostname)?;
    block.optional("Min TLS version", &b.min_tls_version)?;
    block.optional("Max TLS version", &b.max_tls_version)?;
    block.optional("Request condition", &b.request_condition)?;
    Ok(())
}
