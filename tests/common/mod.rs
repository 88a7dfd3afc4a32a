//! Shared helpers for driving real programs through a PTY.

#![allow(dead_code)]

use ptyscript::{PtyError, Session, SessionConfig};
use std::time::Duration;

pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

/// Start `sh -c <script>`.
pub fn sh(script: &str) -> Result<Session, PtyError> {
    Session::spawn("sh", ["-c", script])
}

/// Start `python3 -c <script>` with the given config.
pub fn python_with(script: &str, config: SessionConfig) -> Result<Session, PtyError> {
    Session::spawn_with_config("python3", ["-c", script], config)
}

pub fn python(script: &str) -> Result<Session, PtyError> {
    python_with(script, SessionConfig::default())
}

/// Python prelude that puts stdin in raw mode and defines `read_until`,
/// which collects input until `stop` is seen or the line goes quiet.
pub const RAW_PRELUDE: &str = r#"
import os, select, sys, termios, tty
saved = termios.tcgetattr(0)
tty.setraw(0)

def read_until(stop, quiet=5.0):
    data = b''
    while stop not in data:
        ready, _, _ = select.select([0], [], [], quiet)
        if not ready:
            break
        data += os.read(0, 64)
    return data

def restore():
    termios.tcsetattr(0, termios.TCSADRAIN, saved)
"#;

/// Build a raw-mode python program from the prelude and `body`.
pub fn raw_program(body: &str) -> String {
    format!("{RAW_PRELUDE}\n{body}\n")
}

/// Whether `pid` still names a process (running or unreaped).
#[cfg(unix)]
pub fn process_exists(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    // SAFETY: kill(2) takes no pointers; signal 0 only checks the pid exists.
    unsafe { libc::kill(pid, 0) == 0 }
}
