use std::io::Write;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::args::Cli;
use crate::cli::error::CliResult;

pub fn run(shell: Shell, out: &mut dyn Write) -> CliResult<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "fastly", out);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_bash_when_generating_completion_then_script_mentions_binary() {
        let mut out = Vec::new();

        run(Shell::Bash, &mut out).unwrap();

        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("_fastly"));
    }
}
