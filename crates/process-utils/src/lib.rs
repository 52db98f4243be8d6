//! Small process-related helpers shared across the workspace.

use std::ffi::OsStr;
use std::process::ExitStatus;

#[cfg(feature = "tokio")]
mod tee;

#[cfg(feature = "tokio")]
pub use tee::{TeedOutput, run_teed, run_teed_into};

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;

/// Offset added to a signal number when a child is killed by that signal,
/// matching the convention used by POSIX shells.
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Apply the Windows `CREATE_NO_WINDOW` flag to child processes.
///
/// On non-Windows targets this is a no-op.
pub trait NoWindowExt {
    fn no_window(&mut self);
}

impl NoWindowExt for std::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.creation_flags(CREATE_NO_WINDOW);
        }
    }
}

#[cfg(feature = "tokio")]
impl NoWindowExt for tokio::process::Command {
    fn no_window(&mut self) {
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            self.as_std_mut().creation_flags(CREATE_NO_WINDOW);
        }
    }
}

/// Create a `tokio::process::Command` with `CREATE_NO_WINDOW` applied on Windows.
#[cfg(feature = "tokio")]
pub fn tokio_command(program: impl AsRef<OsStr>) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new(program);
    cmd.no_window();
    cmd
}

/// Build a command that runs `line` through `bash -c`.
#[cfg(feature = "tokio")]
pub fn shell_command(line: &str) -> tokio::process::Command {
    let mut cmd = tokio_command("bash");
    cmd.arg("-c").arg(line);
    cmd
}

/// Collapse an exit status into a single integer code.
///
/// A normal exit yields its own code. On Unix a child terminated by a
/// signal yields `128 + signal`. Anything else is reported as `1`.
pub fn exit_code(status: &ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE + signal;
        }
    }

    1
}
