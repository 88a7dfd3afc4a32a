use parking_lot::Mutex;
use portable_pty::{MasterPty, PtySize};
use std::io::Write;
use std::sync::Arc;

use crate::error::PtyError;

/// Shared write side of a session's terminal.
///
/// Both the session (keystrokes) and the capture thread (cursor reports)
/// write through the same handle. Closing it drops the writer and the
/// master; later writes fail with [`PtyError::Closed`].
#[derive(Clone)]
pub struct PtyHandle {
    writer: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
    master: Arc<Mutex<Option<Box<dyn MasterPty + Send>>>>,
}

impl PtyHandle {
    pub fn new(writer: Box<dyn Write + Send>, master: Box<dyn MasterPty + Send>) -> Self {
        Self {
            writer: Arc::new(Mutex::new(Some(writer))),
            master: Arc::new(Mutex::new(Some(master))),
        }
    }

    pub fn send_input(&self, bytes: &[u8]) -> Result<(), PtyError> {
        let mut writer = self.writer.lock();
        let Some(writer) = writer.as_mut() else {
            return Err(PtyError::Closed);
        };
        writer.write_all(bytes).map_err(PtyError::Write)?;
        writer.flush().map_err(PtyError::Write)?;
        Ok(())
    }

    pub fn resize(&self, rows: u16, cols: u16) -> Result<(), PtyError> {
        let size = PtySize {
            rows,
            cols,
            pixel_width: 0,
            pixel_height: 0,
        };
        let master = self.master.lock();
        let Some(master) = master.as_ref() else {
            return Err(PtyError::Closed);
        };
        master.resize(size).map_err(|e| PtyError::Resize(e.into()))
    }

    /// Drop the writer and the master. Safe to call more than once.
    pub fn close(&self) {
        self.writer.lock().take();
        self.master.lock().take();
    }

    pub fn is_closed(&self) -> bool {
        self.writer.lock().is_none()
    }
}
