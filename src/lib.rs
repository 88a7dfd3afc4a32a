//! Drive interactive terminal programs from tests.
//!
//! A [`Session`] starts a program on a pseudo-terminal, captures its output
//! on a background thread, answers cursor position queries, and lets the
//! caller wait for prompts and type responses:
//!
//! ```no_run
//! use std::time::Duration;
//! use ptyscript::{keys, Session};
//!
//! let mut session = Session::spawn("rosa", ["create", "account-roles"])?;
//! session.expect_and_send("Role prefix", "asdf-test", Duration::from_secs(30))?;
//! session.expect_prompt("Permissions boundary", Duration::from_secs(30))?;
//! session.send(keys::DOWN)?;
//! session.send_enter()?;
//! session.wait(Duration::from_secs(60))?;
//! session.close();
//! # Ok::<(), ptyscript::PtyError>(())
//! ```

pub mod config;
pub mod error;
pub mod keys;
pub mod logging;
pub mod pty;
pub mod script;
pub mod session;
mod stop;

pub use config::{ConfigError, SessionConfig};
pub use error::PtyError;
pub use pty::{OutputChunk, ProcessExit, PtyHandle};
pub use script::{Step, StepParseError};
pub use session::{strip_ansi, Session};
