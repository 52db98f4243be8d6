//! Run the wrapped command and capture what happened.

use chrono::{DateTime, Utc};
use process_utils::{run_teed, shell_command};
use tracing::{debug, warn};

/// Exit code reported when the command could not be started at all.
pub const EXIT_SPAWN_FAILED: i32 = 1;

/// Captured result of one command run.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    /// The literal command line handed to the shell.
    pub command_line: String,
    /// Interleaved stdout and stderr.
    pub output: Vec<u8>,
    pub exit_code: i32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Whole seconds between start and finish, never negative.
    pub fn duration_secs(&self) -> i64 {
        (self.finished_at - self.started_at).num_seconds().max(0)
    }
}

/// Run `command_line` through `bash -c`, mirroring its output live.
///
/// A command that cannot be spawned is reported as exit code 1 with the
/// spawn error as its output.
pub async fn execute(command_line: &str) -> ExecutionOutcome {
    let started_at = Utc::now();
    debug!(command = %command_line, "Running command");

    let (output, exit_code) = match run_teed(shell_command(command_line)).await {
        Ok(teed) => (teed.combined, process_utils::exit_code(&teed.status)),
        Err(e) => {
            warn!(command = %command_line, error = %e, "Failed to start command");
            (
                format!("tg-exec: failed to start command: {e}\n").into_bytes(),
                EXIT_SPAWN_FAILED,
            )
        }
    };

    let finished_at = Utc::now();
    debug!(exit_code, bytes = output.len(), "Command finished");

    ExecutionOutcome {
        command_line: command_line.to_string(),
        output,
        exit_code,
        started_at,
        finished_at,
    }
}
