use std::fs;
use std::io::Write;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::cli::args::DictionaryEntryCommands;
use crate::cli::commands::{check_output, service_id, Logged};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, Block, Table};
use crate::domain::DictionaryItemBatch;
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Body of a `--file` batch update.
#[derive(Debug, Deserialize)]
struct BatchFile {
    items: Vec<DictionaryItemBatch>,
}

pub fn run(
    cmd: &DictionaryEntryCommands,
    ctx: &ServiceContainer,
    out: &mut dyn Write,
) -> CliResult<()> {
    let resolver = ctx.resolver()?;
    match cmd {
        DictionaryEntryCommands::List {
            service,
            dictionary_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let sid = service_id(ctx, &resolver, service, out)?;
            let items = ctx
                .api()?
                .list_dictionary_items(&sid, dictionary_id)
                .logged(&ctx.errlog, &context(&sid, dictionary_id))?;
            if fmt.json {
                output::json(out, &items)?;
            } else if ctx.globals.verbose {
                for (i, item) in items.iter().enumerate() {
                    writeln!(out, "Item: {}/{}", i + 1, items.len())?;
                    Block::indented(out, 1)
                        .field("Item Key", &item.item_key)?
                        .field("Item Value", &item.item_value)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["DICTIONARY ID", "KEY", "VALUE"]);
                for item in &items {
                    table.row([
                        item.dictionary_id.clone(),
                        item.item_key.clone(),
                        item.item_value.clone(),
                    ]);
                }
                table.render(out)?;
            }
        }
        DictionaryEntryCommands::Describe {
            service,
            dictionary_id,
            key,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let sid = service_id(ctx, &resolver, service, out)?;
            let item = ctx
                .api()?
                .get_dictionary_item(&sid, dictionary_id, key)
                .logged(&ctx.errlog, &context(&sid, dictionary_id))?;
            if fmt.json {
                output::json(out, &item)?;
            } else {
                Block::new(out)
                    .field("Service ID", &item.service_id)?
                    .field("Dictionary ID", &item.dictionary_id)?
                    .field("Item Key", &item.item_key)?
                    .field("Item Value", &item.item_value)?;
            }
        }
        DictionaryEntryCommands::Create {
            service,
            dictionary_id,
            key,
            value,
        } => {
            let sid = service_id(ctx, &resolver, service, out)?;
            ctx.api()?
                .create_dictionary_item(&sid, dictionary_id, key, value)
                .logged(&ctx.errlog, &context(&sid, dictionary_id))?;
            output::success(
                out,
                &format!(
                    "Created dictionary item {} (service {}, dictionary {})",
                    key, sid, dictionary_id
                ),
            )?;
        }
        DictionaryEntryCommands::Update {
            service,
            dictionary_id,
            key,
            value,
            file,
        } => {
            let sid = service_id(ctx, &resolver, service, out)?;
            if let Some(path) = file {
                let items = read_batch(path)?;
                ctx.api()?
                    .batch_dictionary_items(&sid, dictionary_id, &items)
                    .logged(&ctx.errlog, &context(&sid, dictionary_id))?;
                output::success(
                    out,
                    &format!(
                        "Made {} modifications of Dictionary {} on service {}",
                        items.len(),
                        dictionary_id,
                        sid
                    ),
                )?;
                return Ok(());
            }
            let (Some(key), Some(value)) = (key, value) else {
                return Err(CliError::usage(
                    "an empty value is not allowed for either the '--key' or '--value' flags",
                ));
            };
            ctx.api()?
                .update_dictionary_item(&sid, dictionary_id, key, value)
                .logged(&ctx.errlog, &context(&sid, dictionary_id))?;
            output::success(
                out,
                &format!(
                    "Updated dictionary item {} (service {}, dictionary {})",
                    key, sid, dictionary_id
                ),
            )?;
        }
        DictionaryEntryCommands::Delete {
            service,
            dictionary_id,
            key,
        } => {
            let sid = service_id(ctx, &resolver, service, out)?;
            ctx.api()?
                .delete_dictionary_item(&sid, dictionary_id, key)
                .logged(&ctx.errlog, &context(&sid, dictionary_id))?;
            output::success(
                out,
                &format!(
                    "Deleted dictionary item {} (service {}, dictionary {})",
                    key, sid, dictionary_id
                ),
            )?;
        }
    }
    Ok(())
}

fn context(service_id: &str, dictionary_id: &str) -> [(&'static str, String); 2] {
    [
        ("Service ID", service_id.to_string()),
        ("Dictionary ID", dictionary_id.to_string()),
    ]
}

fn read_batch(path: &Path) -> CliResult<Vec<DictionaryItemBatch>> {
    let content = fs::read_to_string(path)
        .map_err(|e| InfraError::io(format!("read batch file {}", path.display()), e))?;
    let batch: BatchFile = serde_json::from_str(&content).map_err(|e| {
        CliError::usage_with(
            format!("failed to decode {}: {}", path.display(), e),
            r#"Provide a JSON file of the form {"items": [{"op": "upsert", "item_key": "k", "item_value": "v"}]}"#,
        )
    })?;
    debug!("read_batch: {} items from {}", batch.items.len(), path.display());
    Ok(batch.items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BatchOperation;
    use std::io::Write as _;

    #[test]
    fn given_batch_file_when_reading_then_items_are_decoded() {
        // Arrange
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"items": [{{"op": "upsert", "item_key": "a", "item_value": "1"}}, {{"op": "delete", "item_key": "b"}}]}}"#
        )
        .unwrap();

        // Act
        let items = read_batch(file.path()).unwrap();

        // Assert
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].op, BatchOperation::Upsert);
        assert_eq!(items[1].item_value, None);
    }

    #[test]
    fn given_malformed_batch_file_when_reading_then_usage_error_with_remediation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = read_batch(file.path()).unwrap_err();

        assert!(err.to_string().starts_with("failed to decode"));
        assert!(err.remediation().is_some());
    }
}
