//! Completions command - print a shell completion script

use crate::cli::Cli;
use clap::CommandFactory;
use clap_complete::Shell;

/// Execute the completions command
pub fn execute(shell: Shell) {
    let mut command = Cli::command();
    clap_complete::generate(shell, &mut command, "packwright", &mut std::io::stdout());
}
