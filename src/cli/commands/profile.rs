use std::io::{self, Write};

use dialoguer::{Confirm, Password};
use serde_json::json;
use tracing::debug;

use crate::application::ApplicationError;
use crate::cli::args::ProfileCommands;
use crate::cli::commands::{check_output, warn, Logged};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, spinner, Table};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn run(cmd: &ProfileCommands, ctx: &mut ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    let profiles = ctx.profiles();
    let (endpoint, _) = ctx.endpoint();
    match cmd {
        ProfileCommands::Create { name, make_default } => {
            if ctx.settings.file.profile.contains_key(name) {
                return Err(ApplicationError::ProfileExists(name.clone()).into());
            }
            let make_default = *make_default
                || ctx.settings.file.default_profile().is_none()
                || confirm_default(ctx)?;
            let token = token_input(ctx)?;
            let pb = spinner("Validating token", ctx.globals.quiet);
            let result = profiles.create(&mut ctx.settings, name, &token, make_default, &endpoint);
            pb.finish_and_clear();
            let summary = result.logged(&ctx.errlog, &[("Profile", name.clone())])?;
            output::success(out, &format!("Profile '{}' created", summary.name))?;
            if summary.default {
                output::info(out, &format!("Profile '{}' is the default profile", summary.name))?;
            }
        }
        ProfileCommands::List { output: fmt } => {
            check_output(ctx, *fmt)?;
            let list = profiles.list(&ctx.settings);
            if fmt.json {
                let value: Vec<_> = list
                    .iter()
                    .map(|p| json!({ "name": p.name, "email": p.email, "default": p.default }))
                    .collect();
                output::json(out, &value)?;
            } else if list.is_empty() {
                warn(ctx, out, "No profiles defined. To create a profile, run `fastly profile create`")?;
            } else {
                let mut table = Table::new(["PROFILE", "DEFAULT", "EMAIL"]);
                for p in &list {
                    table.row([p.name.clone(), p.default.to_string(), p.email.clone()]);
                }
                table.render(out)?;
            }
        }
        ProfileCommands::Switch { name } => {
            let summary = profiles
                .switch(&mut ctx.settings, name)
                .logged(&ctx.errlog, &[("Profile", name.clone())])?;
            output::success(out, &format!("Profile switched to '{}'", summary.name))?;
        }
        ProfileCommands::Update { name, make_default } => {
            let name = match name {
                Some(n) => n.clone(),
                None => ctx
                    .settings
                    .file
                    .default_profile()
                    .map(|(n, _)| n.to_string())
                    .ok_or(ApplicationError::NoToken)?,
            };
            let token = match (&ctx.globals.token, ctx.globals.non_interactive) {
                (Some(t), _) => Some(t.clone()),
                (None, true) => None,
                (None, false) => Some(prompt_token()?),
            };
            let pb = spinner("Validating token", ctx.globals.quiet || token.is_none());
            let result = profiles.update(
                &mut ctx.settings,
                &name,
                token.as_deref(),
                *make_default,
                &endpoint,
            );
            pb.finish_and_clear();
            let summary = result.logged(&ctx.errlog, &[("Profile", name.clone())])?;
            output::success(out, &format!("Profile '{}' updated", summary.name))?;
        }
        ProfileCommands::Delete { name } => {
            let removed = profiles
                .delete(&mut ctx.settings, name)
                .logged(&ctx.errlog, &[("Profile", name.clone())])?;
            output::success(out, &format!("Profile '{}' deleted", removed.name))?;
            if removed.default {
                warn(
                    ctx,
                    out,
                    "The deleted profile was the default. Run `fastly profile switch <NAME>` to set a new default",
                )?;
            }
        }
        ProfileCommands::Token { name } => {
            let token = profiles
                .token(&ctx.settings, name.as_deref())
                .logged(&ctx.errlog, &[])?;
            output::plain(out, &token)?;
        }
    }
    Ok(())
}

/// Token from `--token`, or asked for interactively.
fn token_input(ctx: &ServiceContainer) -> CliResult<String> {
    if let Some(token) = &ctx.globals.token {
        debug!("token_input: using --token");
        return Ok(token.clone());
    }
    if ctx.globals.non_interactive {
        return Err(ApplicationError::NoToken.into());
    }
    prompt_token()
}

/// Whether a new profile should replace the existing default.
fn confirm_default(ctx: &ServiceContainer) -> CliResult<bool> {
    if ctx.globals.auto_yes {
        return Ok(true);
    }
    if ctx.globals.non_interactive {
        return Ok(false);
    }
    Confirm::new()
        .with_prompt("Set this profile to be your default?")
        .default(false)
        .interact()
        .map_err(|e| CliError::Infra(InfraError::io("read answer", io::Error::other(e))))
}

fn prompt_token() -> CliResult<String> {
    Password::new()
        .with_prompt("Fastly API token")
        .interact()
        .map_err(|e| CliError::Infra(InfraError::io("read token", io::Error::other(e))))
}
