//! Command-line interface.

use clap::Parser;

use crate::config::AppConfig;

/// Run a shell command and report its outcome to Telegram.
///
/// Credentials and settings come from the environment,
/// ~/.config/tg-exec/config.conf and /etc/tg-exec/config.conf.
#[derive(Parser, Debug)]
#[command(name = "tg-exec", version, about)]
pub struct Args {
    /// Note shown in the report, overrides TG_NOTE
    #[arg(short, long)]
    pub note: Option<String>,

    /// Exit with status 70 if the report cannot be delivered
    #[arg(long)]
    pub strict: bool,

    /// Print diagnostic messages to stderr
    #[arg(long)]
    pub debug: bool,

    /// Command to run; all remaining arguments are joined and passed to bash -c
    #[arg(
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

impl Args {
    /// The command line handed to the shell.
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }

    /// Apply flag overrides on top of the resolved configuration.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(note) = &self.note {
            config.note = note.clone();
        }
        config.strict |= self.strict;
        config.debug |= self.debug;
    }
}
