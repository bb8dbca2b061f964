use std::io::Write;

use crate::cli::args::OutputFlags;
use crate::cli::commands::{check_output, Logged};
use crate::cli::error::CliResult;
use crate::cli::output::{self, Block};
use crate::infrastructure::di::ServiceContainer;

pub fn run(fmt: OutputFlags, ctx: &ServiceContainer, out: &mut dyn Write) -> CliResult<()> {
    check_output(ctx, fmt)?;
    let verify = ctx.api()?.verify().logged(&ctx.errlog, &[])?;
    if fmt.json {
        output::json(out, &verify)?;
        return Ok(());
    }

    let mut block = Block::new(out);
    block
        .field("Customer ID", &verify.customer.id)?
        .field("Customer name", &verify.customer.name)?
        .field("User ID", &verify.user.id)?
        .field("User name", &verify.user.name)?
        .field("User login", &verify.user.login)?
        .field("Service count", verify.services.len())?;
    if ctx.globals.verbose && !verify.services.is_empty() {
        block.section("Services")?;
        let mut nested = block.nested();
        for (id, name) in &verify.services {
            nested.field(name, id)?;
        }
    }
    Ok(())
}
