mod capture;
mod exit;
mod handle;
mod query;
mod spawn;
mod utf8;

pub use capture::OutputChunk;
pub use exit::ProcessExit;
pub use handle::PtyHandle;

pub(crate) use capture::{CaptureLoop, OutputLog};
pub(crate) use exit::ExitWatcher;
pub(crate) use spawn::spawn_on_pty;
