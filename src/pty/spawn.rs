//! Starting a program on a freshly allocated pseudo-terminal.

use portable_pty::{native_pty_system, Child, CommandBuilder, PtySize};
use std::ffi::OsStr;
use std::io::Read;

use crate::config::SessionConfig;
use crate::error::PtyError;
use crate::pty::handle::PtyHandle;

/// A started child together with both ends of its terminal.
pub(crate) struct SpawnedPty {
    pub handle: PtyHandle,
    pub reader: Box<dyn Read + Send>,
    pub child: Box<dyn Child + Send + Sync>,
}

/// Allocate a PTY with the configured geometry and start `program` on it.
///
/// The geometry is applied when the pair is opened, before the child
/// exists, so the child never observes a default size.
pub(crate) fn spawn_on_pty<I, S>(
    program: &str,
    args: I,
    config: &SessionConfig,
) -> Result<SpawnedPty, PtyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let pty_system = native_pty_system();
    let pair = pty_system
        .openpty(PtySize {
            rows: config.rows,
            cols: config.cols,
            pixel_width: 0,
            pixel_height: 0,
        })
        .map_err(|e| PtyError::OpenPty(e.into()))?;

    let reader = pair
        .master
        .try_clone_reader()
        .map_err(|e| PtyError::OpenPty(e.into()))?;
    let writer = pair
        .master
        .take_writer()
        .map_err(|e| PtyError::OpenPty(e.into()))?;

    let cmd = build_command(program, args, config)?;
    let child = pair
        .slave
        .spawn_command(cmd)
        .map_err(|e| PtyError::Launch {
            program: program.to_string(),
            source: e.into(),
        })?;
    // The child holds its own copy of the slave side. Keeping ours would
    // stop reads from ever reporting end-of-stream.
    drop(pair.slave);

    tracing::debug!(
        program,
        pid = ?child.process_id(),
        rows = config.rows,
        cols = config.cols,
        "spawned child on PTY"
    );

    Ok(SpawnedPty {
        handle: PtyHandle::new(writer, pair.master),
        reader,
        child,
    })
}

fn build_command<I, S>(program: &str, args: I, config: &SessionConfig) -> Result<CommandBuilder, PtyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = CommandBuilder::new(program);
    cmd.args(args);
    let cwd = match &config.cwd {
        Some(cwd) => cwd.clone(),
        None => std::env::current_dir().map_err(|e| PtyError::Launch {
            program: program.to_string(),
            source: e.into(),
        })?,
    };
    cmd.cwd(cwd);
    cmd.env("TERM", &config.term);
    for (key, value) in &config.env {
        cmd.env(key, value);
    }
    Ok(cmd)
}
