//! Invocation lifecycle and collaborator dispatch.
//!
//! Every command runs through the same forward-only phases: validate the
//! parameters, build the request, dispatch it to a collaborator and forward
//! the result to an [`OutputSink`]. Collaborator failures are returned to the
//! caller unchanged; nothing here retries.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::output::{OutputError, OutputSink};
use crate::params::ValidationError;

/// Future returned by collaborator operations.
pub type ClientFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Errors surfaced by a command invocation.
#[derive(Debug, Error)]
pub enum CommandError<E>
where
    E: std::error::Error + 'static,
{
    /// Parameters were rejected before any mutating call.
    #[error("invalid parameters: {0}")]
    Validation(#[from] ValidationError),
    /// The collaborator failed; the error is passed through verbatim.
    #[error("{0}")]
    Collaborator(#[source] E),
    /// The result could not be written to the output sink.
    #[error("{0}")]
    Output(#[from] OutputError),
}

impl<E> CommandError<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the validation error, if this is one.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Collaborator(_) | Self::Output(_) => None,
        }
    }
}

/// Step of a command invocation.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Phase {
    /// Not started.
    Idle,
    /// Checking parameters and resolving identities.
    Validating,
    /// Constructing the request value.
    Building,
    /// Calling the collaborator.
    Dispatching,
    /// Finished successfully.
    Done,
    /// Finished with an error.
    Failed,
}

impl Phase {
    const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Building => "building",
            Self::Dispatching => "dispatching",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Tracks the phase of a single command invocation.
#[derive(Debug)]
pub struct Invocation {
    command: &'static str,
    phase: Phase,
}

impl Invocation {
    /// Starts tracking an invocation of `command`.
    #[must_use]
    pub const fn start(command: &'static str) -> Self {
        Self {
            command,
            phase: Phase::Idle,
        }
    }

    /// Returns the current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Moves to `next`. Backward moves and moves out of a terminal phase are
    /// ignored.
    pub fn advance(&mut self, next: Phase) {
        if self.phase.is_terminal() || next <= self.phase {
            warn!(
                command = self.command,
                from = %self.phase,
                to = %next,
                "ignoring out-of-order phase transition"
            );
            return;
        }
        debug!(command = self.command, from = %self.phase, to = %next, "phase transition");
        self.phase = next;
    }

    /// Records the outcome and returns it unchanged.
    pub fn finish<T, E: fmt::Display>(&mut self, result: Result<T, E>) -> Result<T, E> {
        match &result {
            Ok(_) => self.advance(Phase::Done),
            Err(err) => {
                debug!(command = self.command, phase = %self.phase, error = %err, "command failed");
                self.advance(Phase::Failed);
            }
        }
        result
    }
}

/// Awaits a collaborator call and writes its result to `sink`.
///
/// # Errors
///
/// Returns [`CommandError::Collaborator`] when the call fails, or
/// [`CommandError::Output`] when the result cannot be written.
pub async fn forward<T, E, S>(
    call: ClientFuture<'_, T, E>,
    sink: &mut S,
) -> Result<T, CommandError<E>>
where
    T: Serialize,
    E: std::error::Error + 'static,
    S: OutputSink,
{
    let value = call.await.map_err(CommandError::Collaborator)?;
    sink.write_object(&value)?;
    Ok(value)
}
