use std::fs;
use std::io::Write;
use std::path::Path;

use itertools::Itertools;
use tracing::{debug, instrument};

use crate::cli::args::PurgeArgs;
use crate::cli::commands::{service_id, Logged};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, Table};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

#[instrument(skip(ctx, out))]
pub fn run(args: &PurgeArgs, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    // URLs are purged globally, no service needed
    if let Some(url) = &args.url {
        let result = ctx
            .api()?
            .purge_url(url, args.soft)
            .logged(&ctx.errlog, &[("URL", url.clone())])?;
        output::success(
            out,
            &format!(
                "Purged URL: {} (soft: {}). Status: {}, ID: {}",
                url,
                args.soft,
                result.status,
                result.id.unwrap_or_default()
            ),
        )?;
        return Ok(());
    }

    if args.all && args.soft {
        return Err(CliError::usage_with(
            "purge-all requests cannot be done in soft mode (--soft)",
            "The --soft flag should not be used with --all so retry command without it.",
        ));
    }

    let resolver = ctx.resolver()?;
    let sid = service_id(ctx, &resolver, &args.service, out)?;
    let api = ctx.api()?;
    let context = [("Service ID", sid.clone())];

    if args.all {
        let result = api.purge_all(&sid).logged(&ctx.errlog, &context)?;
        output::success(out, &format!("Purge all status: {}", result.status))?;
    } else if let Some(path) = &args.file {
        let keys = read_keys(path)?;
        let ids = api
            .purge_keys(&sid, &keys, args.soft)
            .logged(&ctx.errlog, &context)?;
        // BTreeMap iteration keeps the table sorted by key
        let mut table = Table::new(["KEY", "ID"]);
        for (key, id) in &ids {
            table.row([key, id]);
        }
        table.render(out)?;
    } else if let Some(key) = &args.key {
        let result = api
            .purge_key(&sid, key, args.soft)
            .logged(&ctx.errlog, &context)?;
        output::success(
            out,
            &format!(
                "Purged key: {} (soft: {}). Status: {}, ID: {}",
                key,
                args.soft,
                result.status,
                result.id.unwrap_or_default()
            ),
        )?;
    } else {
        return Err(CliError::usage_with(
            "error parsing arguments: must provide either --all, --file, --key or --url",
            "Run `fastly purge --help` to see the available flags",
        ));
    }
    Ok(())
}

/// Newline delimited surrogate keys; blank lines and repeats are skipped.
fn read_keys(path: &Path) -> CliResult<Vec<String>> {
    let content = fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read surrogate keys from {}", path.display()), e))?;
    let keys: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unique()
        .map(String::from)
        .collect();
    debug!("read_keys: {} keys", keys.len());
    Ok(keys)
}
