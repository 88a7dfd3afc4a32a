//! Background capture of everything the child writes to its terminal.

use parking_lot::RwLock;
use std::borrow::Cow;
use std::io::{self, Read};
use std::sync::mpsc::SyncSender;
use std::sync::Arc;
use std::thread;

use crate::keys::{CURSOR_POSITION_QUERY, CURSOR_POSITION_REPORT};
use crate::pty::handle::PtyHandle;
use crate::pty::query::QueryScanner;
use crate::pty::utf8::Utf8Carry;
use crate::stop::StopSignal;

/// One unit published on a session's event queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputChunk {
    /// Text read from the terminal, in read order.
    Data(String),
    /// A read failed; capture has stopped and no further chunks follow.
    Error(String),
}

impl OutputChunk {
    /// Text form of the chunk. Errors render as `[IO Error: ...]`.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            OutputChunk::Data(text) => Cow::Borrowed(text),
            OutputChunk::Error(message) => Cow::Owned(format!("[IO Error: {message}]")),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, OutputChunk::Error(_))
    }
}

/// Append-only record of all captured output.
///
/// Readers only ever see a prefix of what a later read returns.
#[derive(Clone, Default)]
pub(crate) struct OutputLog {
    text: Arc<RwLock<String>>,
}

impl OutputLog {
    fn append(&self, chunk: &str) {
        self.text.write().push_str(chunk);
    }

    pub(crate) fn snapshot(&self) -> String {
        self.text.read().clone()
    }
}

/// The single reader of a session's terminal.
pub(crate) struct CaptureLoop {
    pub reader: Box<dyn Read + Send>,
    pub handle: PtyHandle,
    pub log: OutputLog,
    pub events: SyncSender<OutputChunk>,
    pub stop: StopSignal,
    pub buffer_size: usize,
    pub echo: bool,
}

impl CaptureLoop {
    pub(crate) fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("pty-capture".to_string())
            .spawn(move || self.run())
    }

    fn run(mut self) {
        let mut buffer = vec![0u8; self.buffer_size];
        let mut decoder = Utf8Carry::default();
        let mut queries = QueryScanner::new(CURSOR_POSITION_QUERY);

        loop {
            if self.stop.is_stopped() {
                tracing::trace!("capture stopped on signal");
                return;
            }

            let count = match self.reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(count) => count,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) if is_end_of_stream(&err) => break,
                Err(err) => {
                    tracing::debug!(error = %err, "PTY read failed");
                    let _ = self.events.send(OutputChunk::Error(err.to_string()));
                    return;
                }
            };

            let bytes = &buffer[..count];
            let replies = queries.scan(bytes);
            let text = decoder.decode(bytes);
            if !text.is_empty() {
                self.log.append(&text);
            }
            for _ in 0..replies {
                if let Err(err) = self.handle.send_input(CURSOR_POSITION_REPORT) {
                    tracing::warn!(error = %err, "failed to answer cursor position query");
                }
            }
            if replies > 0 {
                tracing::trace!(replies, "answered cursor position queries");
            }
            if !text.is_empty() && !self.publish(text) {
                return;
            }
        }

        tracing::trace!("PTY output reached end of stream");
        let rest = decoder.finish();
        if !rest.is_empty() {
            self.log.append(&rest);
            self.publish(rest);
        }
    }

    /// Blocking enqueue. Returns `false` once the session has dropped the
    /// receiving end.
    fn publish(&self, text: String) -> bool {
        if self.echo {
            tracing::debug!(target: "ptyscript::output", "{:?}", text);
        } else {
            tracing::trace!(bytes = text.len(), "captured output chunk");
        }
        self.events.send(OutputChunk::Data(text)).is_ok()
    }
}

/// Linux reports `EIO` on the master once every slave descriptor is closed.
#[cfg(unix)]
fn is_end_of_stream(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EIO)
}

#[cfg(not(unix))]
fn is_end_of_stream(_err: &io::Error) -> bool {
    false
}
