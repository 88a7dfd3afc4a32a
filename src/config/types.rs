use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for one interactive session.
///
/// Delays are plain milliseconds so they can be tuned from a TOML file;
/// the accessor methods hand them out as [`Duration`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Terminal height in rows.
    pub rows: u16,
    /// Terminal width in columns.
    pub cols: u16,
    /// Value of `TERM` in the child environment.
    pub term: String,
    /// Extra environment variables for the child.
    pub env: BTreeMap<String, String>,
    /// Working directory for the child (default: current directory).
    pub cwd: Option<PathBuf>,
    /// Pause after launch so the first frame can start arriving.
    pub launch_grace_ms: u64,
    /// Pause after `send_line` / `send_enter`.
    pub send_settle_ms: u64,
    /// Pause between a matched prompt and the response in `expect_and_send`.
    pub render_settle_ms: u64,
    /// Polling slice of the prompt matcher.
    pub poll_interval_ms: u64,
    /// Quiet period after which `read_all` considers output settled.
    pub idle_window_ms: u64,
    /// Polling slice of `read_all`.
    pub idle_poll_ms: u64,
    /// How long `close` waits for a terminated child before escalating.
    pub kill_grace_ms: u64,
    /// Size of a single read from the terminal.
    pub read_buffer_size: usize,
    /// Capacity of the output event queue.
    pub event_capacity: usize,
    /// Log every captured chunk at debug level.
    pub echo_output: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            rows: 40,
            cols: 120,
            term: "xterm-256color".to_string(),
            env: BTreeMap::new(),
            cwd: None,
            launch_grace_ms: 50,
            send_settle_ms: 50,
            render_settle_ms: 100,
            poll_interval_ms: 100,
            idle_window_ms: 300,
            idle_poll_ms: 50,
            kill_grace_ms: 500,
            read_buffer_size: 1024,
            event_capacity: 1000,
            echo_output: false,
        }
    }
}

impl SessionConfig {
    pub fn launch_grace(&self) -> Duration {
        Duration::from_millis(self.launch_grace_ms)
    }

    pub fn send_settle(&self) -> Duration {
        Duration::from_millis(self.send_settle_ms)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn idle_window(&self) -> Duration {
        Duration::from_millis(self.idle_window_ms)
    }

    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }

    #[must_use]
    pub fn with_geometry(mut self, rows: u16, cols: u16) -> Self {
        self.rows = rows;
        self.cols = cols;
        self
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    #[must_use]
    pub fn with_echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }
}
