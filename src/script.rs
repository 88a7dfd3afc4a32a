//! Scripted conversations: a list of steps run against one session.
//!
//! Steps are written as `kind:argument`:
//!
//! | step                       | action                                 |
//! |----------------------------|----------------------------------------|
//! | `expect:TEXT`              | wait for `TEXT`                        |
//! | `line:TEXT`                | send `TEXT` and a carriage return      |
//! | `send:TEXT`                | send `TEXT` as-is                      |
//! | `key:NAME`                 | send a named key (`down`, `ctrl-c`...) |
//! | `enter`                    | send a bare carriage return            |
//! | `answer:PROMPT=>RESPONSE`  | wait for `PROMPT`, then send a line    |

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::error::PtyError;
use crate::keys;
use crate::session::Session;

const ANSWER_SEPARATOR: &str = "=>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Expect(String),
    Line(String),
    Send(String),
    Key {
        name: String,
        bytes: &'static [u8],
    },
    Enter,
    Answer {
        prompt: String,
        response: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StepParseError {
    #[error("unknown step kind '{0}'")]
    UnknownKind(String),

    #[error("unknown key '{0}'")]
    UnknownKey(String),

    #[error("step '{0}' needs an argument")]
    MissingArgument(String),

    #[error("answer step '{0}' must look like PROMPT=>RESPONSE")]
    MalformedAnswer(String),
}

impl FromStr for Step {
    type Err = StepParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw == "enter" {
            return Ok(Step::Enter);
        }
        let Some((kind, argument)) = raw.split_once(':') else {
            return Err(StepParseError::UnknownKind(raw.to_string()));
        };
        if argument.is_empty() && kind != "line" && kind != "send" {
            return Err(StepParseError::MissingArgument(raw.to_string()));
        }
        match kind {
            "expect" => Ok(Step::Expect(argument.to_string())),
            "line" => Ok(Step::Line(argument.to_string())),
            "send" => Ok(Step::Send(argument.to_string())),
            "key" => keys::by_name(argument)
                .map(|bytes| Step::Key {
                    name: argument.to_string(),
                    bytes,
                })
                .ok_or_else(|| StepParseError::UnknownKey(argument.to_string())),
            "answer" => match argument.split_once(ANSWER_SEPARATOR) {
                Some((prompt, response)) if !prompt.is_empty() => Ok(Step::Answer {
                    prompt: prompt.to_string(),
                    response: response.to_string(),
                }),
                _ => Err(StepParseError::MalformedAnswer(raw.to_string())),
            },
            _ => Err(StepParseError::UnknownKind(kind.to_string())),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Expect(text) => write!(f, "expect:{text}"),
            Step::Line(text) => write!(f, "line:{text}"),
            Step::Send(text) => write!(f, "send:{text}"),
            Step::Key { name, .. } => write!(f, "key:{name}"),
            Step::Enter => write!(f, "enter"),
            Step::Answer { prompt, response } => {
                write!(f, "answer:{prompt}{ANSWER_SEPARATOR}{response}")
            }
        }
    }
}

/// Run `steps` in order against `session`, stopping at the first failure.
///
/// `timeout` bounds every step that waits for a prompt.
pub fn run(session: &mut Session, steps: &[Step], timeout: Duration) -> Result<(), PtyError> {
    for (index, step) in steps.iter().enumerate() {
        tracing::info!(step = index + 1, "{}", step);
        match step {
            Step::Expect(text) => {
                session.expect_prompt(text, timeout)?;
            }
            Step::Line(text) => session.send_line(text)?,
            Step::Send(text) => session.send(text)?,
            Step::Key { bytes, .. } => session.send(bytes)?,
            Step::Enter => session.send_enter()?,
            Step::Answer { prompt, response } => {
                session.expect_and_send(prompt, response, timeout)?;
            }
        }
    }
    Ok(())
}
