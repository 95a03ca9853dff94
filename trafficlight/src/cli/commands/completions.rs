//! Shell completion generation

use clap::CommandFactory;
use clap_complete::Shell as ClapShell;

use crate::cli::args::{Cli, CompletionsArgs, Shell};

impl From<Shell> for ClapShell {
    fn from(shell: Shell) -> Self {
        match shell {
            Shell::Bash => Self::Bash,
            Shell::Zsh => Self::Zsh,
            Shell::Fish => Self::Fish,
            Shell::PowerShell => Self::PowerShell,
            Shell::Elvish => Self::Elvish,
        }
    }
}

/// Generate and print a shell completion script to stdout.
pub fn run(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    clap_complete::generate(
        ClapShell::from(args.shell),
        &mut cmd,
        "trafficlight",
        &mut std::io::stdout(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bash_script_mentions_subcommands() {
        let mut cmd = Cli::command();
        let mut out = Vec::new();
        clap_complete::generate(ClapShell::Bash, &mut cmd, "trafficlight", &mut out);
        let script = String::from_utf8(out).unwrap();
        assert!(script.contains("trafficlight"));
        assert!(script.contains("validate"));
    }
}
