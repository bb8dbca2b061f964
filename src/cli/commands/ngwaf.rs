//! Next-Gen WAF workspaces and their IP lists

use std::io::Write;

use serde_json::json;

use crate::cli::args::{IpListCommands, NgwafCommands, WorkspaceCommands, WorkspaceFlags};
use crate::cli::commands::{check_output, Logged};
use crate::cli::error::CliResult;
use crate::cli::output::{self, cell, Block, Table};
use crate::domain::{ListScope, NgwafList, Workspace};
use crate::infrastructure::api::{FastlyApi, ListFields, WorkspaceFields};
use crate::infrastructure::di::ServiceContainer;

const IP_LIST_TYPE: &str = "ip";
const WORKSPACE_SCOPE: &str = "workspace";

pub fn run(cmd: &NgwafCommands, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    let api = ctx.api()?;
    match cmd {
        NgwafCommands::Workspace { command } => workspace(command, api.as_ref(), ctx, out),
        NgwafCommands::Iplist { command } => ip_list(command, api.as_ref(), ctx, out),
    }
}

fn workspace(
    cmd: &WorkspaceCommands,
    api: &dyn FastlyApi,
    ctx: &ServiceContainer,
    out: &mut dyn Write,
) -> CliResult<()> {
    match cmd {
        WorkspaceCommands::Create {
            name,
            description,
            blocking_mode,
            flags,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let fields = WorkspaceFields {
                name: Some(name.clone()),
                description: Some(description.clone()),
                mode: Some(blocking_mode.clone()),
                ..workspace_fields(flags)
            };
            let ws = api
                .create_workspace(&fields)
                .logged(&ctx.errlog, &[("Name", name.clone())])?;
            if fmt.json {
                output::json(out, &ws)?;
            } else {
                output::success(
                    out,
                    &format!("Created workspace '{}' (workspace-id: {})", ws.name, ws.id),
                )?;
            }
        }
        WorkspaceCommands::List { limit, output: fmt } => {
            check_output(ctx, *fmt)?;
            let page = api.list_workspaces(*limit).logged(&ctx.errlog, &[])?;
            if fmt.json {
                output::json(out, &page.data)?;
            } else if ctx.globals.verbose {
                for ws in &page.data {
                    describe_workspace(out, ws)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["ID", "Name", "Description", "Mode", "Created At"]);
                for ws in &page.data {
                    table.row([
                        ws.id.clone(),
                        ws.name.clone(),
                        ws.description.clone(),
                        ws.mode.clone(),
                        cell(&ws.created_at),
                    ]);
                }
                table.render(out)?;
            }
        }
        WorkspaceCommands::Get {
            workspace_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let ws = api
                .get_workspace(workspace_id)
                .logged(&ctx.errlog, &[("Workspace ID", workspace_id.clone())])?;
            if fmt.json {
                output::json(out, &ws)?;
            } else {
                describe_workspace(out, &ws)?;
            }
        }
        WorkspaceCommands::Update {
            workspace_id,
            name,
            description,
            blocking_mode,
            flags,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let fields = WorkspaceFields {
                name: name.clone(),
                description: description.clone(),
                mode: blocking_mode.clone(),
                ..workspace_fields(flags)
            };
            let ws = api
                .update_workspace(workspace_id, &fields)
                .logged(&ctx.errlog, &[("Workspace ID", workspace_id.clone())])?;
            if fmt.json {
                output::json(out, &ws)?;
            } else {
                output::success(
                    out,
                    &format!("Updated workspace '{}' (workspace-id: {})", ws.name, ws.id),
                )?;
            }
        }
        WorkspaceCommands::Delete {
            workspace_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            api.delete_workspace(workspace_id)
                .logged(&ctx.errlog, &[("Workspace ID", workspace_id.clone())])?;
            if fmt.json {
                output::json(out, &json!({ "id": workspace_id, "deleted": true }))?;
            } else {
                output::success(out, &format!("Deleted workspace (id: {})", workspace_id))?;
            }
        }
    }
    Ok(())
}

fn workspace_fields(flags: &WorkspaceFlags) -> WorkspaceFields {
    WorkspaceFields {
        attack_signal_thresholds: flags.attack_thresholds.clone(),
        client_ip_headers: flags.client_ip_headers.as_deref().map(|h| split(h, ':')),
        default_blocking_response_code: flags.default_blocking_code,
        default_redirect_url: flags.default_redirect_url.clone(),
        ip_anonymization: flags.ip_anonymization.clone(),
        ..Default::default()
    }
}

fn split(raw: &str, sep: char) -> Vec<String> {
    raw.split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn describe_workspace(out: &mut dyn Write, ws: &Workspace) -> std::io::Result<()> {
    let mut block = Block::new(out);
    block
        .field("ID", &ws.id)?
        .field("Name", &ws.name)?
        .field("Description", &ws.description)?
        .field("Mode", &ws.mode)?
        .section("Attack Signal Thresholds")?;
    let t = &ws.attack_signal_thresholds;
    block
        .nested()
        .field("Immediate", t.immediate)?
        .field("One Minute", t.one_minute)?
        .field("Ten Minutes", t.ten_minutes)?
        .field("One Hour", t.one_hour)?;
    block
        .field("Client IP Headers", ws.client_ip_headers.join(", "))?
        .optional("Default Blocking Response Code", &ws.default_blocking_response_code)?
        .optional("Default Redirect URL", &ws.default_redirect_url)?
        .optional("IP Anonymization", &ws.ip_anonymization)?
        .field("Created (UTC)", cell(&ws.created_at))?;
    Ok(())
}

fn ip_list(
    cmd: &IpListCommands,
    api: &dyn FastlyApi,
    ctx: &ServiceContainer,
    out: &mut dyn Write,
) -> CliResult<()> {
    match cmd {
        IpListCommands::Create {
            workspace_id,
            name,
            entries,
            description,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let fields = ListFields {
                name: Some(name.clone()),
                description: description.clone(),
                list_type: Some(IP_LIST_TYPE.to_string()),
                entries: Some(split(entries, ',')),
                scope: Some(ListScope {
                    scope_type: WORKSPACE_SCOPE.to_string(),
                    applies_to: vec![workspace_id.clone()],
                }),
            };
            let list = api
                .create_workspace_list(workspace_id, &fields)
                .logged(&ctx.errlog, &[("Workspace ID", workspace_id.clone())])?;
            if fmt.json {
                output::json(out, &list)?;
            } else {
                output::success(
                    out,
                    &format!("Created Workspace IP List '{}' (list id: {})", list.name, list.id),
                )?;
            }
        }
        IpListCommands::List {
            workspace_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let page = api
                .list_workspace_lists(workspace_id)
                .logged(&ctx.errlog, &[("Workspace ID", workspace_id.clone())])?;
            // The endpoint returns every list kind
            let lists: Vec<&NgwafList> = page
                .data
                .iter()
                .filter(|l| l.list_type == IP_LIST_TYPE)
                .collect();
            if fmt.json {
                output::json(out, &lists)?;
            } else if ctx.globals.verbose {
                for list in &lists {
                    describe_list(out, list)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new([
                    "ID",
                    "Name",
                    "Description",
                    "Type",
                    "Scope",
                    "Entries",
                    "Created At",
                ]);
                for l in &lists {
                    table.row([
                        l.id.clone(),
                        l.name.clone(),
                        cell(&l.description),
                        l.list_type.clone(),
                        l.scope.scope_type.clone(),
                        l.entries.join(", "),
                        cell(&l.created_at),
                    ]);
                }
                table.render(out)?;
            }
        }
        IpListCommands::Get {
            workspace_id,
            list_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let list = api
                .get_workspace_list(workspace_id, list_id)
                .logged(&ctx.errlog, &[("Workspace ID", workspace_id.clone())])?;
            if fmt.json {
                output::json(out, &list)?;
            } else {
                describe_list(out, &list)?;
            }
        }
        IpListCommands::Update {
            workspace_id,
            list_id,
            entries,
            description,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let fields = ListFields {
                description: description.clone(),
                entries: entries.as_deref().map(|e| split(e, ',')),
                ..Default::default()
            };
            let list = api
                .update_workspace_list(workspace_id, list_id, &fields)
                .logged(&ctx.errlog, &[("Workspace ID", workspace_id.clone())])?;
            if fmt.json {
                output::json(out, &list)?;
            } else {
                output::success(
                    out,
                    &format!("Updated Workspace IP List '{}' (list id: {})", list.name, list.id),
                )?;
            }
        }
        IpListCommands::Delete {
            workspace_id,
            list_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            api.delete_workspace_list(workspace_id, list_id)
                .logged(&ctx.errlog, &[("Workspace ID", workspace_id.clone())])?;
            if fmt.json {
                output::json(out, &json!({ "id": list_id, "deleted": true }))?;
            } else {
                output::success(out, &format!("Deleted Workspace IP List (list id: {})", list_id))?;
            }
        }
    }
    Ok(())
}

fn describe_list(out: &mut dyn Write, l: &NgwafList) -> std::io::Result<()> {
    Block::new(out)
        .field("ID", &l.id)?
        .field("Name", &l.name)?
        .field("Description", cell(&l.description))?
        .field("Type", &l.list_type)?
        .field("Entries", l.entries.join(", "))?
        .field("Scope", &l.scope.scope_type)?
        .field("Updated (UTC)", cell(&l.updated_at))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AttackSignalThresholds;

    #[test]
    fn given_workspace_when_describing_then_thresholds_are_nested() {
        // Arrange
        let ws = Workspace {
            id: "someID".into(),
            name: "testName".into(),
            description: "testDescription".into(),
            mode: "block".into(),
            attack_signal_thresholds: AttackSignalThresholds {
                immediate: true,
                one_minute: 1,
                ten_minutes: 2,
                one_hour: 3,
            },
            client_ip_headers: vec!["X-Forwarded-For".into(), "X-Real-IP".into()],
            created_at: Some("2025-01-01T00:00:00Z".into()),
            ..Default::default()
        };
        let mut out = Vec::new();

        // Act
        describe_workspace(&mut out, &ws).unwrap();

        // Assert
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "ID: someID\nName: testName\nDescription: testDescription\nMode: block\n\
             Attack Signal Thresholds:\n\tImmediate: true\n\tOne Minute: 1\n\tTen Minutes: 2\n\tOne Hour: 3\n\
             Client IP Headers: X-Forwarded-For, X-Real-IP\nCreated (UTC): 2025-01-01T00:00:00Z\n"
        );
    }

    #[test]
    fn given_colon_separated_headers_when_building_fields_then_split_and_trimmed() {
        let flags = WorkspaceFlags {
            client_ip_headers: Some("X-Forwarded-For: X-Real-IP".into()),
            ..Default::default()
        };

        let fields = workspace_fields(&flags);

        assert_eq!(
            fields.client_ip_headers,
            Some(vec!["X-Forwarded-For".to_string(), "X-Real-IP".to_string()])
        );
        assert_eq!(fields.name, None);
    }
}
