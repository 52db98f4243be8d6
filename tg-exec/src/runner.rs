//! Sequencing of execution, composition and delivery.

use tracing::debug;

use crate::config::AppConfig;
use crate::error::Error;
use crate::executor::{ExecutionOutcome, execute};
use crate::notification::channels::NotificationChannel;
use crate::notification::report::{ReportOptions, compose};

/// Runs a command and reports its outcome through a channel.
pub struct Runner<C> {
    options: ReportOptions,
    strict: bool,
    channel: C,
}

impl<C: NotificationChannel> Runner<C> {
    pub fn new(options: ReportOptions, strict: bool, channel: C) -> Self {
        Self {
            options,
            strict,
            channel,
        }
    }

    pub fn from_config(config: &AppConfig, channel: C) -> Self {
        Self::new(config.report_options(), config.strict, channel)
    }

    /// Execute `command_line`, report it, and return the process exit status.
    pub async fn run(&self, command_line: &str) -> i32 {
        let outcome = execute(command_line).await;
        self.finish(&outcome).await
    }

    /// Report an already captured outcome and return the process exit status.
    ///
    /// The command's own exit code is returned unless delivery failed in
    /// strict mode.
    pub async fn finish(&self, outcome: &ExecutionOutcome) -> i32 {
        let text = compose(outcome, &self.options);
        if text.is_empty() {
            debug!("No message composed, nothing to send");
            return outcome.exit_code;
        }

        if !self.channel.is_enabled() {
            debug!(channel = self.channel.channel_type(), "Channel disabled, skipping");
            return outcome.exit_code;
        }

        match self.channel.send(&text).await {
            Ok(()) => {
                debug!(channel = self.channel.channel_type(), "Report delivered");
                outcome.exit_code
            }
            Err(e) => {
                debug!(
                    exhausted = e.is_exhausted(),
                    cause = %e.last_cause(),
                    "Report not delivered"
                );
                eprintln!("tg-exec: failed to send Telegram message: {e}");
                if self.strict {
                    Error::from(e).exit_code()
                } else {
                    outcome.exit_code
                }
            }
        }
    }
}
