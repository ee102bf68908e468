//! Deployment slots shared by the extension and web-job commands.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::params::ValidationError;

/// Deployment environment a command targets.
#[derive(
    Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// The live deployment. Used when no slot is given.
    #[default]
    Production,
    /// The pre-release deployment.
    Staging,
}

impl Slot {
    /// Accepted spellings, compared without regard to ASCII case.
    pub const NAMES: &'static [&'static str] = &["production", "staging"];

    /// Lowercase name used on the wire and in output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Staging => "staging",
        }
    }

    /// Capitalised name used when composing extension identifiers.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Production => "Production",
            Self::Staging => "Staging",
        }
    }

    /// Resolves an optional, already validated slot parameter, defaulting to
    /// [`Slot::Production`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::NotAllowed`] when `value` names no slot.
    pub fn from_parameter(field: &'static str, value: Option<&str>) -> Result<Self, ValidationError> {
        value.map_or(Ok(Self::default()), |text| {
            text.parse().map_err(|UnknownSlot(value)| ValidationError::NotAllowed {
                field,
                value,
                allowed: Self::NAMES,
            })
        })
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a slot name is not recognised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown deployment slot '{0}' (expected production or staging)")]
pub struct UnknownSlot(pub String);

impl FromStr for Slot {
    type Err = UnknownSlot;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("production") {
            Ok(Self::Production)
        } else if trimmed.eq_ignore_ascii_case("staging") {
            Ok(Self::Staging)
        } else {
            Err(UnknownSlot(trimmed.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("production", Slot::Production)]
    #[case("Production", Slot::Production)]
    #[case(" STAGING ", Slot::Staging)]
    fn parses_case_insensitively(#[case] input: &str, #[case] expected: Slot) {
        assert_eq!(input.parse::<Slot>(), Ok(expected));
    }

    #[test]
    fn rejects_unknown_slot() {
        let err = "preview".parse::<Slot>().expect_err("preview is not a slot");
        assert_eq!(err, UnknownSlot(String::from("preview")));
    }

    #[test]
    fn renders_lowercase_and_title_forms() {
        assert_eq!(Slot::Staging.to_string(), "staging");
        assert_eq!(Slot::Staging.title(), "Staging");
        assert_eq!(Slot::default(), Slot::Production);
    }

    #[rstest]
    #[case(None, Slot::Production)]
    #[case(Some("Staging"), Slot::Staging)]
    fn resolves_optional_parameter(#[case] value: Option<&str>, #[case] expected: Slot) {
        assert_eq!(Slot::from_parameter("slot", value), Ok(expected));
    }

    #[test]
    fn unknown_parameter_lists_allowed_slots() {
        let err = Slot::from_parameter("slot", Some("preview")).expect_err("preview is invalid");
        assert_eq!(
            err,
            ValidationError::NotAllowed {
                field: "slot",
                value: String::from("preview"),
                allowed: Slot::NAMES,
            }
        );
    }
}
