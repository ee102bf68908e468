//! Validation errors raised before any collaborator is called.

use thiserror::Error;

/// Describes the parameter that made a command invocation illegal.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ValidationError {
    /// A mandatory parameter was not supplied.
    #[error("missing required parameter: {field}")]
    Missing {
        /// Parameter name.
        field: &'static str,
    },
    /// A text parameter was empty or whitespace.
    #[error("parameter {field} must not be empty")]
    Empty {
        /// Parameter name.
        field: &'static str,
    },
    /// A parameter held a value outside its allowed set.
    #[error("invalid value '{value}' for {field} (expected one of {})", .allowed.join(", "))]
    NotAllowed {
        /// Parameter name.
        field: &'static str,
        /// Value supplied by the caller.
        value: String,
        /// Accepted values.
        allowed: &'static [&'static str],
    },
    /// A list parameter was supplied without entries.
    #[error("parameter {field} must list at least one entry")]
    EmptyList {
        /// Parameter name.
        field: &'static str,
    },
    /// A list parameter contained a blank entry.
    #[error("parameter {field} contains a blank entry at position {index}")]
    BlankEntry {
        /// Parameter name.
        field: &'static str,
        /// Zero-based position of the blank entry.
        index: usize,
    },
    /// A structured payload failed to parse.
    #[error("parameter {field} is malformed: {message}")]
    Malformed {
        /// Parameter name.
        field: &'static str,
        /// Parser diagnostic.
        message: String,
    },
    /// A parameter was supplied with the wrong shape (for example a list
    /// where text was expected).
    #[error("parameter {field} has the wrong kind of value")]
    WrongKind {
        /// Parameter name.
        field: &'static str,
    },
    /// A parameter not declared by the command was supplied.
    #[error("unexpected parameter: {field}")]
    Unknown {
        /// Parameter name.
        field: &'static str,
    },
    /// More than one member of a mutually exclusive group was supplied.
    #[error("parameters {} are mutually exclusive", .fields.join(", "))]
    Conflict {
        /// Group identifier.
        group: &'static str,
        /// Members that were supplied together.
        fields: Vec<&'static str>,
    },
    /// No member of a mutually exclusive group was supplied.
    #[error("one of {} is required", .fields.join(", "))]
    MissingOneOf {
        /// Group identifier.
        group: &'static str,
        /// Members of the group.
        fields: Vec<&'static str>,
    },
    /// The value is well formed but does not name an existing resource.
    #[error("{field} '{value}' could not be resolved: {reason}")]
    Unresolved {
        /// Parameter name.
        field: &'static str,
        /// Value supplied by the caller.
        value: String,
        /// Why the lookup failed.
        reason: String,
    },
}

impl ValidationError {
    /// Returns the offending parameter name, or the group identifier for
    /// group violations.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::Empty { field }
            | Self::NotAllowed { field, .. }
            | Self::EmptyList { field }
            | Self::BlankEntry { field, .. }
            | Self::Malformed { field, .. }
            | Self::WrongKind { field }
            | Self::Unknown { field }
            | Self::Unresolved { field, .. } => *field,
            Self::Conflict { group, .. } | Self::MissingOneOf { group, .. } => *group,
        }
    }
}
