//! Logging endpoint commands for every supported vendor
//!
//! The five operations are identical across vendors; only the flags that
//! become vendor settings differ. `VendorFlags` maps those flags to the API
//! field names and validates combinations that the API would reject.

use std::io::Write;

use crate::cli::args::{
    DatadogFlags, GcsFlags, HttpsFlags, LoggingCommonFlags, LoggingFileFlags, LoggingOp,
    LoggingTlsFlags, LoggingVendor, S3Flags, SplunkFlags, SyslogFlags,
};
use crate::cli::commands::{check_output, edit_target, read_target, version_context, versioned_header, Logged};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, Block, Table};
use crate::domain::{LoggingEndpoint, LoggingKind};
use crate::infrastructure::api::LoggingFields;
use crate::infrastructure::di::ServiceContainer;

/// Vendor specific flags of a logging endpoint.
pub trait VendorFlags {
    const KIND: LoggingKind;

    /// Copy the provided flags into `fields.settings`.
    fn apply(&self, fields: &mut LoggingFields) -> CliResult<()>;
}

impl LoggingFileFlags {
    fn apply(&self, fields: &mut LoggingFields) -> CliResult<()> {
        if self.gzip_level.is_some() && self.compression_codec.is_some() {
            return Err(CliError::usage(
                "the --compression-codec flag is mutually exclusive with the --gzip-level flag",
            ));
        }
        fields.set("path", &self.path);
        fields.set("period", &self.period);
        fields.set("gzip_level", &self.gzip_level);
        fields.set("compression_codec", &self.compression_codec);
        fields.set("message_type", &self.message_type);
        fields.set("timestamp_format", &self.timestamp_format);
        Ok(())
    }
}

impl LoggingTlsFlags {
    fn apply(&self, fields: &mut LoggingFields) {
        fields.set("tls_ca_cert", &self.tls_ca_cert);
        fields.set("tls_hostname", &self.tls_hostname);
    }
}

impl VendorFlags for GcsFlags {
    const KIND: LoggingKind = LoggingKind::Gcs;

    fn apply(&self, fields: &mut LoggingFields) -> CliResult<()> {
        fields.set("user", &self.user);
        fields.set("secret_key", &self.secret_key);
        fields.set("account_name", &self.account_name);
        fields.set("bucket_name", &self.bucket);
        fields.set("project_id", &self.project_id);
        self.file.apply(fields)
    }
}

impl VendorFlags for S3Flags {
    const KIND: LoggingKind = LoggingKind::S3;

    fn apply(&self, fields: &mut LoggingFields) -> CliResult<()> {
        if self.iam_role.is_some() && (self.access_key.is_some() || self.secret_key.is_some()) {
            return Err(CliError::usage(
                "the --access-key and --secret-key flags are mutually exclusive with the --iam-role flag",
            ));
        }
        fields.set("bucket_name", &self.bucket);
        fields.set("access_key", &self.access_key);
        fields.set("secret_key", &self.secret_key);
        fields.set("iam_role", &self.iam_role);
        fields.set("domain", &self.domain);
        fields.set("redundancy", &self.redundancy);
        fields.set("server_side_encryption", &self.server_side_encryption);
        self.file.apply(fields)
    }
}

impl VendorFlags for SyslogFlags {
    const KIND: LoggingKind = LoggingKind::Syslog;

    fn apply(&self, fields: &mut LoggingFields) -> CliResult<()> {
        fields.set("address", &self.address);
        fields.set("port", &self.port);
        fields.set("use_tls", &self.use_tls.map(u8::from));
        fields.set("token", &self.auth_token);
        fields.set("message_type", &self.message_type);
        self.tls.apply(fields);
        Ok(())
    }
}

impl VendorFlags for HttpsFlags {
    const KIND: LoggingKind = LoggingKind::Https;

    fn apply(&self, fields: &mut LoggingFields) -> CliResult<()> {
        fields.set("url", &self.url);
        fields.set("method", &self.method);
        fields.set("content_type", &self.content_type);
        fields.set("header_name", &self.header_name);
        fields.set("header_value", &self.header_value);
        fields.set("json_format", &self.json_format);
        fields.set("message_type", &self.message_type);
        fields.set("request_max_entries", &self.request_max_entries);
        fields.set("request_max_bytes", &self.request_max_bytes);
        self.tls.apply(fields);
        Ok(())
    }
}

impl VendorFlags for DatadogFlags {
    const KIND: LoggingKind = LoggingKind::Datadog;

    fn apply(&self, fields: &mut LoggingFields) -> CliResult<()> {
        fields.set("token", &self.auth_token);
        fields.set("region", &self.region);
        Ok(())
    }
}

impl VendorFlags for SplunkFlags {
    const KIND: LoggingKind = LoggingKind::Splunk;

    fn apply(&self, fields: &mut LoggingFields) -> CliResult<()> {
        fields.set("url", &self.url);
        fields.set("token", &self.auth_token);
        fields.set("request_max_entries", &self.request_max_entries);
        fields.set("request_max_bytes", &self.request_max_bytes);
        self.tls.apply(fields);
        Ok(())
    }
}

pub fn run(vendor: &LoggingVendor, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    match vendor {
        LoggingVendor::Gcs { command } => run_op(command.clone().into_op(), ctx, out),
        LoggingVendor::S3 { command } => run_op(command.clone().into_op(), ctx, out),
        LoggingVendor::Syslog { command } => run_op(command.clone().into_op(), ctx, out),
        LoggingVendor::Https { command } => run_op(command.clone().into_op(), ctx, out),
        LoggingVendor::Datadog { command } => run_op(command.clone().into_op(), ctx, out),
        LoggingVendor::Splunk { command } => run_op(command.clone().into_op(), ctx, out),
    }
}

fn fields<F: VendorFlags>(
    name: Option<String>,
    common: &LoggingCommonFlags,
    vendor: &F,
) -> CliResult<LoggingFields> {
    let mut fields = LoggingFields {
        name,
        format: common.format.clone(),
        format_version: common.format_version,
        placement: common.placement.clone(),
        response_condition: common.response_condition.clone(),
        ..Default::default()
    };
    vendor.apply(&mut fields)?;
    Ok(fields)
}

fn run_op<F: VendorFlags>(op: LoggingOp<F>, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    let kind = F::KIND;
    let vendor = kind.display_name();
    match op {
        LoggingOp::Create {
            service,
            target,
            name,
            common,
            vendor: flags,
        } => {
            // Reject bad flag combinations before touching the service version
            let fields = fields(Some(name), &common, &flags)?;
            let (sid, version) = edit_target(ctx, &service, &target, out)?;
            let endpoint = ctx
                .api()?
                .create_logging(kind, &sid, version, &fields)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!(
                    "Created {} logging endpoint {} (service {} version {})",
                    vendor, endpoint.name, sid, version
                ),
            )?;
        }
        LoggingOp::List {
            service,
            version,
            output: fmt,
        } => {
            check_output(ctx, fmt)?;
            let (sid, version) = read_target(ctx, &service, &version, out)?;
            let endpoints = ctx
                .api()?
                .list_logging(kind, &sid, version)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &endpoints)?;
            } else if ctx.globals.verbose {
                versioned_header(out, &sid, version)?;
                for (i, e) in endpoints.iter().enumerate() {
                    writeln!(out, "\t{} {}/{}", vendor, i + 1, endpoints.len())?;
                    describe(&mut Block::indented(out, 2), e)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["SERVICE", "VERSION", "NAME"]);
                for e in &endpoints {
                    table.row([e.service_id.clone(), e.version.to_string(), e.name.clone()]);
                }
                table.render(out)?;
            }
        }
        LoggingOp::Describe {
            service,
            version,
            name,
            output: fmt,
        } => {
            check_output(ctx, fmt)?;
            let (sid, version) = read_target(ctx, &service, &version, out)?;
            let endpoint = ctx
                .api()?
                .get_logging(kind, &sid, version, &name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            if fmt.json {
                output::json(out, &endpoint)?;
            } else {
                let mut block = Block::new(out);
                block.field("Service ID", &endpoint.service_id)?;
                block.field("Version", endpoint.version)?;
                describe(&mut block, &endpoint)?;
            }
        }
        LoggingOp::Update {
            service,
            target,
            name,
            new_name,
            common,
            vendor: flags,
        } => {
            let fields = fields(new_name, &common, &flags)?;
            let (sid, version) = edit_target(ctx, &service, &target, out)?;
            let endpoint = ctx
                .api()?
                .update_logging(kind, &sid, version, &name, &fields)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!(
                    "Updated {} logging endpoint {} (service {} version {})",
                    vendor, endpoint.name, sid, version
                ),
            )?;
        }
        LoggingOp::Delete {
            service,
            target,
            name,
        } => {
            let (sid, version) = edit_target(ctx, &service, &target, out)?;
            ctx.api()?
                .delete_logging(kind, &sid, version, &name)
                .logged(&ctx.errlog, &version_context(&sid, version))?;
            output::success(
                out,
                &format!(
                    "Deleted {} logging endpoint {} (service {} version {})",
                    vendor, name, sid, version
                ),
            )?;
        }
    }
    Ok(())
}

fn describe(block: &mut Block<'_>, e: &LoggingEndpoint) -> std::io::Result<()> {
    block.field("Name", &e.name)?;
    block.optional("Format", &e.format)?;
    block.optional("Format version", &e.format_version)?;
    block.optional("Placement", &e.placement)?;
    block.optional("Response condition", &e.response_condition)?;
    for (key, value) in &e.settings {
        match value {
            serde_json::Value::Null => {}
            serde_json::Value::String(s) => {
                block.field(key, s)?;
            }
            other => {
                block.field(key, other)?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_gzip_level_and_codec_when_building_fields_then_mutually_exclusive_error() {
        // Arrange
        let flags = GcsFlags {
            file: LoggingFileFlags {
                gzip_level: Some(9),
                compression_codec: Some("zstd".into()),
                ..Default::default()
            },
            ..Default::default()
        };

        // Act
        let result = fields(Some("logs".into()), &LoggingCommonFlags::default(), &flags);

        // Assert
        assert_eq!(
            result.unwrap_err().to_string(),
            "the --compression-codec flag is mutually exclusive with the --gzip-level flag"
        );
    }

    #[test]
    fn given_gcs_flags_when_building_fields_then_api_names_are_used() {
        let flags = GcsFlags {
            bucket: Some("my-bucket".into()),
            user: Some("svc@example.com".into()),
            file: LoggingFileFlags {
                period: Some(3600),
                ..Default::default()
            },
            ..Default::default()
        };

        let fields = fields(None, &LoggingCommonFlags::default(), &flags).unwrap();

        assert_eq!(fields.settings.get("bucket_name").map(String::as_str), Some("my-bucket"));
        assert_eq!(fields.settings.get("user").map(String::as_str), Some("svc@example.com"));
        assert_eq!(fields.settings.get("period").map(String::as_str), Some("3600"));
        assert!(!fields.settings.contains_key("gzip_level"));
    }

    #[test]
    fn given_syslog_tls_when_building_fields_then_bool_is_numeric() {
        let flags = SyslogFlags {
            use_tls: Some(true),
            auth_token: Some("tok".into()),
            ..Default::default()
        };

        let fields = fields(None, &LoggingCommonFlags::default(), &flags).unwrap();

        assert_eq!(fields.settings.get("use_tls").map(String::as_str), Some("1"));
        assert_eq!(fields.settings.get("token").map(String::as_str), Some("tok"));
    }

    #[test]
    fn given_syslog_tls_disabled_when_building_fields_then_zero_is_sent() {
        let flags = SyslogFlags {
            use_tls: Some(false),
            ..Default::default()
        };

        let fields = fields(None, &LoggingCommonFlags::default(), &flags).unwrap();

        assert_eq!(fields.settings.get("use_tls").map(String::as_str), Some("0"));
    }
}
