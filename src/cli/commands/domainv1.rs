use std::io::Write;

use serde_json::json;

use crate::cli::args::DomainV1Commands;
use crate::cli::commands::{check_output, Logged};
use crate::cli::error::CliResult;
use crate::cli::output::{self, cell, Block, Table};
use crate::domain::DomainV1;
use crate::infrastructure::api::{DomainV1Fields, DomainV1Query};
use crate::infrastructure::di::ServiceContainer;

pub fn run(cmd: &DomainV1Commands, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    let api = ctx.api()?;
    match cmd {
        DomainV1Commands::Create {
            fqdn,
            service_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let fields = DomainV1Fields {
                fqdn: Some(fqdn.clone()),
                service_id: service_id.clone(),
            };
            let domain = api
                .create_domain_v1(&fields)
                .logged(&ctx.errlog, &[("FQDN", fqdn.clone())])?;
            if fmt.json {
                output::json(out, &domain)?;
            } else {
                output::success(out, &format!("Created domain {}", summary(&domain)))?;
            }
        }
        DomainV1Commands::List {
            cursor,
            limit,
            fqdn,
            service_id,
            sort,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let query = DomainV1Query {
                cursor: cursor.clone(),
                limit: *limit,
                fqdn: fqdn.clone(),
                service_id: service_id.clone(),
                sort: sort.clone(),
            };
            let page = api.list_domains_v1(&query).logged(&ctx.errlog, &[])?;
            if fmt.json {
                output::json(out, &page.data)?;
            } else if ctx.globals.verbose {
                for d in &page.data {
                    describe(out, d)?;
                    writeln!(out)?;
                }
            } else {
                let mut table = Table::new(["FQDN", "DOMAIN ID", "SERVICE ID", "CREATED AT", "UPDATED AT"]);
                for d in &page.data {
                    table.row([
                        d.fqdn.clone(),
                        d.id.clone(),
                        cell(&d.service_id),
                        cell(&d.created_at),
                        cell(&d.updated_at),
                    ]);
                }
                table.render(out)?;
            }
            if let Some(next) = page.meta.next_cursor.filter(|c| !c.is_empty()) {
                if !fmt.json {
                    output::info(out, &format!("More results available, use --cursor {}", next))?;
                }
            }
        }
        DomainV1Commands::Describe {
            domain_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let domain = api
                .get_domain_v1(domain_id)
                .logged(&ctx.errlog, &[("Domain ID", domain_id.clone())])?;
            if fmt.json {
                output::json(out, &domain)?;
            } else {
                describe(out, &domain)?;
            }
        }
        DomainV1Commands::Update {
            domain_id,
            service_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            let fields = DomainV1Fields {
                fqdn: None,
                service_id: service_id.clone(),
            };
            let domain = api
                .update_domain_v1(domain_id, &fields)
                .logged(&ctx.errlog, &[("Domain ID", domain_id.clone())])?;
            if fmt.json {
                output::json(out, &domain)?;
            } else {
                output::success(out, &format!("Updated domain {}", summary(&domain)))?;
            }
        }
        DomainV1Commands::Delete {
            domain_id,
            output: fmt,
        } => {
            check_output(ctx, *fmt)?;
            api.delete_domain_v1(domain_id)
                .logged(&ctx.errlog, &[("Domain ID", domain_id.clone())])?;
            if fmt.json {
                output::json(out, &json!({ "id": domain_id, "deleted": true }))?;
            } else {
                output::success(out, &format!("Deleted domain (domain-id: {})", domain_id))?;
            }
        }
    }
    Ok(())
}

/// `'fqdn' (domain-id: X[, service-id: Y])`
fn summary(d: &DomainV1) -> String {
    match &d.service_id {
        Some(sid) if !sid.is_empty() => {
            format!("'{}' (domain-id: {}, service-id: {})", d.fqdn, d.id, sid)
        }
        _ => format!("'{}' (domain-id: {})", d.fqdn, d.id),
    }
}

fn describe(out: &mut dyn Write, d: &DomainV1) -> std::io::Result<()> {
    Block::new(out)
        .field("FQDN", &d.fqdn)?
        .field("Domain ID", &d.id)?
        .field("Service ID", cell(&d.service_id))?
        .optional("Activated", &d.activated)?
        .optional("Verified", &d.verified)?
        .optional("Created at", &d.created_at)?
        .optional("Updated at", &d.updated_at)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("svc"), "'example.com' (domain-id: d1, service-id: svc)")]
    #[case(None, "'example.com' (domain-id: d1)")]
    #[case(Some(""), "'example.com' (domain-id: d1)")]
    fn given_domain_when_summarizing_then_service_id_is_optional(
        #[case] service_id: Option<&str>,
        #[case] expected: &str,
    ) {
        let d = DomainV1 {
            id: "d1".into(),
            fqdn: "example.com".into(),
            service_id: service_id.map(String::from),
            ..Default::default()
        };

        assert_eq!(summary(&d), expected);
    }
}
