//! Driving one interactive program through a pseudo-terminal.
//!
//! A [`Session`] owns the child process, the master side of its terminal
//! and a single capture thread. The capture thread appends everything it
//! reads to an append-only log and publishes each chunk on a bounded
//! queue; the blocking methods here consume that queue on the caller's
//! thread, one step at a time.

use portable_pty::ChildKiller;
use scopeguard::ScopeGuard;
use std::ffi::OsStr;
use std::io;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SessionConfig;
use crate::error::PtyError;
use crate::keys::CARRIAGE_RETURN;
use crate::pty::{
    spawn_on_pty, CaptureLoop, ExitWatcher, OutputChunk, OutputLog, ProcessExit, PtyHandle,
};
use crate::stop::StopSignal;

/// Upper bound applied to caller timeouts so deadlines never overflow.
const MAX_TIMEOUT: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Strip ANSI escape sequences, leaving the visible text.
pub fn strip_ansi(text: &str) -> String {
    strip_ansi_escapes::strip_str(text)
}

pub struct Session {
    program: String,
    pid: Option<u32>,
    config: SessionConfig,
    handle: PtyHandle,
    log: OutputLog,
    events: Option<Receiver<OutputChunk>>,
    /// Output read past the last match, not yet seen by a matcher.
    unmatched: String,
    stop: StopSignal,
    exit: ExitWatcher,
    killer: Box<dyn ChildKiller + Send + Sync>,
    capture: Option<thread::JoinHandle<()>>,
    closed: bool,
}

impl Session {
    /// Start `program` on a 40x120 terminal with default settings.
    pub fn spawn<I, S>(program: &str, args: I) -> Result<Self, PtyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        Self::spawn_with_config(program, args, SessionConfig::default())
    }

    /// Start `program` attached to a new PTY and begin capturing its output.
    ///
    /// Returns after the configured launch grace period so the first frame
    /// has a chance to arrive before the first expectation.
    pub fn spawn_with_config<I, S>(
        program: &str,
        args: I,
        config: SessionConfig,
    ) -> Result<Self, PtyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        config.validate()?;
        let spawned = spawn_on_pty(program, args, &config)?;
        let pid = spawned.child.process_id();

        // Until the session is assembled, a failure must take the child down.
        let killer = scopeguard::guard(spawned.child.clone_killer(), |mut killer| {
            let _ = killer.kill();
        });
        let launch_error = |source: io::Error| PtyError::Launch {
            program: program.to_string(),
            source: source.into(),
        };

        let exit = ExitWatcher::spawn(spawned.child).map_err(launch_error)?;
        let log = OutputLog::default();
        let stop = StopSignal::new();
        let (events_tx, events_rx) = mpsc::sync_channel(config.event_capacity);
        let capture = CaptureLoop {
            reader: spawned.reader,
            handle: spawned.handle.clone(),
            log: log.clone(),
            events: events_tx,
            stop: stop.clone(),
            buffer_size: config.read_buffer_size,
            echo: config.echo_output,
        }
        .spawn()
        .map_err(launch_error)?;
        let killer = ScopeGuard::into_inner(killer);

        tracing::debug!(program, ?pid, "session started");
        thread::sleep(config.launch_grace());

        Ok(Self {
            program: program.to_string(),
            pid,
            config,
            handle: spawned.handle,
            log,
            events: Some(events_rx),
            unmatched: String::new(),
            stop,
            exit,
            killer,
            capture: Some(capture),
            closed: false,
        })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Shared write handle to the terminal.
    pub fn handle(&self) -> PtyHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.exit.has_exited()
    }

    pub fn is_closed(&self) -> bool {
        self.closed || self.handle.is_closed()
    }

    /// Wait up to `timeout` for `expected` to appear in output that arrives
    /// during this call.
    ///
    /// Matching is case-sensitive substring containment. On success returns
    /// the text collected up to and including the match; anything read past
    /// the match is kept for the next call. An empty `expected` is satisfied
    /// by the first chunk, or immediately when `timeout` is zero.
    pub fn expect_prompt(&mut self, expected: &str, timeout: Duration) -> Result<String, PtyError> {
        let Some(events) = self.events.as_ref() else {
            return Err(PtyError::Closed);
        };

        let mut collected = std::mem::take(&mut self.unmatched);
        if expected.is_empty() && timeout.is_zero() {
            return Ok(collected);
        }
        if let Some(end) = match_end(&collected, expected) {
            self.unmatched = collected.split_off(end);
            return Ok(collected);
        }

        let poll = self.config.poll_interval();
        let deadline = Instant::now() + timeout.min(MAX_TIMEOUT);
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match events.recv_timeout(poll.min(deadline - now)) {
                Ok(chunk) => {
                    collected.push_str(&chunk.text());
                    if chunk.is_error() {
                        return Err(PtyError::StreamEnded {
                            expected: expected.to_string(),
                            collected,
                        });
                    }
                    if let Some(end) = match_end(&collected, expected) {
                        self.unmatched = collected.split_off(end);
                        tracing::trace!(expected, "prompt matched");
                        return Ok(collected);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                // Capture has ended; no further output can satisfy the wait.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        Err(PtyError::PromptTimeout {
            expected: expected.to_string(),
            timeout,
            collected,
        })
    }

    /// Drain output until it has been quiet for the idle window, or until
    /// `timeout` elapses, then return everything captured so far.
    pub fn read_all(&mut self, timeout: Duration) -> String {
        let Some(events) = self.events.as_ref() else {
            return self.full_output();
        };
        self.unmatched.clear();

        let idle_window = self.config.idle_window();
        let poll = self.config.idle_poll();
        let deadline = Instant::now() + timeout.min(MAX_TIMEOUT);
        let mut last_output = Instant::now();
        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match events.recv_timeout(poll.min(deadline - now)) {
                Ok(_) => last_output = Instant::now(),
                Err(RecvTimeoutError::Timeout) => {
                    if last_output.elapsed() >= idle_window {
                        break;
                    }
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        self.full_output()
    }

    /// Write raw bytes, such as a key from [`crate::keys`].
    pub fn send(&self, input: impl AsRef<[u8]>) -> Result<(), PtyError> {
        let input = input.as_ref();
        tracing::trace!(bytes = ?String::from_utf8_lossy(input), "send");
        self.handle.send_input(input)
    }

    /// Write `text` followed by a carriage return, then let the program settle.
    pub fn send_line(&self, text: &str) -> Result<(), PtyError> {
        let mut line = Vec::with_capacity(text.len() + CARRIAGE_RETURN.len());
        line.extend_from_slice(text.as_bytes());
        line.extend_from_slice(CARRIAGE_RETURN);
        self.send(&line)?;
        thread::sleep(self.config.send_settle());
        Ok(())
    }

    /// Accept the default value with a bare carriage return.
    pub fn send_enter(&self) -> Result<(), PtyError> {
        self.send(CARRIAGE_RETURN)?;
        thread::sleep(self.config.send_settle());
        Ok(())
    }

    /// Wait for `prompt`, give it time to render, then answer with `response`.
    pub fn expect_and_send(
        &mut self,
        prompt: &str,
        response: &str,
        timeout: Duration,
    ) -> Result<String, PtyError> {
        let collected = self.expect_prompt(prompt, timeout)?;
        thread::sleep(self.config.render_settle());
        self.send_line(response)?;
        Ok(collected)
    }

    /// Block until the child exits or `timeout` elapses.
    ///
    /// On timeout the child is left running; call [`Session::close`].
    pub fn wait(&self, timeout: Duration) -> Result<ProcessExit, PtyError> {
        match self.exit.wait_timeout(timeout) {
            Some(Ok(exit)) => Ok(exit),
            Some(Err(err)) => Err(PtyError::Wait(err)),
            None => Err(PtyError::WaitTimeout { timeout }),
        }
    }

    pub fn resize(&self, rows: u16, cols: u16) -> Result<(), PtyError> {
        self.handle.resize(rows, cols)
    }

    /// Everything captured since launch, escape sequences included.
    pub fn full_output(&self) -> String {
        self.log.snapshot()
    }

    /// [`Session::full_output`] with ANSI escape sequences stripped.
    pub fn full_clean_output(&self) -> String {
        strip_ansi(&self.full_output())
    }

    /// Raw and cleaned output in one report, for failing tests.
    pub fn dump_output(&self) -> String {
        let raw = self.full_output();
        format!(
            "=== RAW OUTPUT ===\n{:?}\n=== CLEANED OUTPUT ===\n{}\n=== END OUTPUT ===\n",
            raw,
            strip_ansi(&raw)
        )
    }

    /// Stop capture, kill the child if it is still alive and release the
    /// terminal. Calling it again does nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        self.stop.signal();
        if !self.exit.has_exited() {
            self.terminate_child();
        }
        self.handle.close();
        // Unblocks a capture thread parked on a full queue.
        self.events.take();
        if let Some(capture) = self.capture.take() {
            if capture.is_finished() {
                let _ = capture.join();
            }
        }
        tracing::debug!(program = %self.program, "session closed");
    }

    fn terminate_child(&mut self) {
        tracing::debug!(program = %self.program, pid = ?self.pid, "terminating child");
        if let Err(err) = self.killer.kill() {
            tracing::debug!(error = %err, "kill request failed");
        }
        let grace = self.config.kill_grace();
        if self.exit.wait_timeout(grace).is_some() {
            return;
        }
        if let Some(pid) = self.pid {
            tracing::warn!(pid, "child still running after hangup, forcing kill");
            force_kill(pid);
            let _ = self.exit.wait_timeout(grace);
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Byte offset just past the first occurrence of `expected`.
fn match_end(collected: &str, expected: &str) -> Option<usize> {
    if expected.is_empty() {
        return (!collected.is_empty()).then_some(collected.len());
    }
    collected
        .find(expected)
        .map(|start| start + expected.len())
}

#[cfg(unix)]
fn force_kill(pid: u32) {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return;
    };
    // SAFETY: kill(2) takes no pointers; the pid belongs to our unreaped child.
    unsafe {
        libc::kill(pid, libc::SIGKILL);
    }
}

#[cfg(not(unix))]
fn force_kill(_pid: u32) {}
