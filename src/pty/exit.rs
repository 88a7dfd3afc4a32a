use parking_lot::{Condvar, Mutex};
use portable_pty::Child;
use std::io;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How a child process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    code: u32,
    success: bool,
}

impl ProcessExit {
    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn success(&self) -> bool {
        self.success
    }
}

#[derive(Debug, Clone)]
enum ExitOutcome {
    Exited(ProcessExit),
    /// Shared so every waiter can be handed the failure.
    Failed(Arc<io::Error>),
}

struct ExitShared {
    outcome: Mutex<Option<ExitOutcome>>,
    exited: Condvar,
}

/// Owns the child on a dedicated thread that blocks in `wait()`.
///
/// Waiters race the recorded outcome against their own deadline. The
/// thread also reaps the child, so a killed process does not linger as
/// a zombie.
#[derive(Clone)]
pub(crate) struct ExitWatcher {
    shared: Arc<ExitShared>,
}

impl ExitWatcher {
    pub(crate) fn spawn(mut child: Box<dyn Child + Send + Sync>) -> io::Result<Self> {
        let shared = Arc::new(ExitShared {
            outcome: Mutex::new(None),
            exited: Condvar::new(),
        });
        let thread_shared = Arc::clone(&shared);
        thread::Builder::new()
            .name("pty-exit".to_string())
            .spawn(move || {
                let outcome = match child.wait() {
                    Ok(status) => ExitOutcome::Exited(ProcessExit {
                        code: status.exit_code(),
                        success: status.success(),
                    }),
                    Err(err) => ExitOutcome::Failed(Arc::new(err)),
                };
                tracing::debug!(?outcome, "child exited");
                *thread_shared.outcome.lock() = Some(outcome);
                thread_shared.exited.notify_all();
            })?;
        Ok(Self { shared })
    }

    pub(crate) fn has_exited(&self) -> bool {
        self.shared.outcome.lock().is_some()
    }

    /// Block until the child exits or `timeout` elapses.
    ///
    /// Returns `None` on timeout; the child keeps running.
    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Option<io::Result<ProcessExit>> {
        let mut outcome = self.shared.outcome.lock();
        match Instant::now().checked_add(timeout) {
            Some(deadline) => {
                while outcome.is_none() {
                    if self
                        .shared
                        .exited
                        .wait_until(&mut outcome, deadline)
                        .timed_out()
                    {
                        break;
                    }
                }
            }
            None => {
                while outcome.is_none() {
                    self.shared.exited.wait(&mut outcome);
                }
            }
        }
        outcome.clone().map(|outcome| match outcome {
            ExitOutcome::Exited(exit) => Ok(exit),
            ExitOutcome::Failed(err) => Err(io::Error::new(err.kind(), err)),
        })
    }
}
