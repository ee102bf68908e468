//! Output sinks receiving command results.

use std::io::{self, Write};

use serde::Serialize;
use thiserror::Error;

/// Errors raised while writing a result object.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OutputError {
    /// Raised when the object cannot be serialised.
    #[error("failed to serialise output: {0}")]
    Serialise(String),
    /// Raised when the underlying writer fails.
    #[error("failed to write output: {0}")]
    Io(String),
}

/// Destination for the objects a command emits.
pub trait OutputSink {
    /// Writes one result object.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError`] when the object cannot be written.
    fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), OutputError>;
}

/// Writes each object as a pretty-printed JSON document followed by a
/// newline.
#[derive(Debug)]
pub struct JsonSink<W> {
    writer: W,
}

impl<W: Write> JsonSink<W> {
    /// Wraps an arbitrary writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonSink<io::Stdout> {
    /// Creates a sink writing to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> OutputSink for JsonSink<W> {
    fn write_object<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), OutputError> {
        serde_json::to_writer_pretty(&mut self.writer, value)
            .map_err(|err| OutputError::Serialise(err.to_string()))?;
        writeln!(self.writer).map_err(|err| OutputError::Io(err.to_string()))?;
        self.writer
            .flush()
            .map_err(|err| OutputError::Io(err.to_string()))
    }
}
