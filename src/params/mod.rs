//! Table-driven parameter validation shared by every command.
//!
//! Commands describe their parameters once, as a static slice of
//! [`FieldSpec`] values, and hand the raw values they received to
//! [`validate`]. The routine checks presence, applies each field's [`Rule`],
//! enforces exactly-one-of groups, and returns trimmed values wrapped in
//! [`ValidatedParameters`]. Nothing is dispatched until this succeeds.

mod error;
#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

pub use error::ValidationError;

use crate::payload::parse_xml_document;

/// Check applied to a single parameter value.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Rule {
    /// Text containing at least one non-whitespace character.
    NonEmpty,
    /// Text matching one of the listed values, ignoring ASCII case.
    OneOf(&'static [&'static str]),
    /// A list with at least one entry and no blank entries.
    NonEmptyList,
    /// Text holding a well formed XML document with a single root element.
    WellFormedXml,
    /// A binary payload with at least one byte.
    NonEmptyBytes,
}

/// Declarative description of one command parameter.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldSpec {
    /// Parameter name as it appears in errors.
    pub name: &'static str,
    /// Whether the parameter must be supplied. Ignored for group members,
    /// whose presence is governed by the group.
    pub required: bool,
    /// Exactly-one-of group the parameter belongs to, if any.
    pub group: Option<&'static str>,
    /// Rule applied when the parameter is present.
    pub rule: Rule,
}

impl FieldSpec {
    /// Declares a mandatory parameter.
    #[must_use]
    pub const fn required(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            required: true,
            group: None,
            rule,
        }
    }

    /// Declares an optional parameter.
    #[must_use]
    pub const fn optional(name: &'static str, rule: Rule) -> Self {
        Self {
            name,
            required: false,
            group: None,
            rule,
        }
    }

    /// Places the parameter in an exactly-one-of group.
    #[must_use]
    pub const fn in_group(mut self, group: &'static str) -> Self {
        self.group = Some(group);
        self
    }
}

/// Raw value bound to a parameter.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParamValue {
    /// Free text.
    Text(String),
    /// Repeated text values, in the order supplied.
    List(Vec<String>),
    /// Binary content, such as a certificate.
    Bytes(Vec<u8>),
}

/// Parameters supplied to a single command invocation.
///
/// Absent parameters are simply not stored, so "not supplied" and
/// "supplied but empty" stay distinguishable.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ParameterBag {
    values: BTreeMap<&'static str, ParamValue>,
}

impl ParameterBag {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value, replacing any previous one.
    pub fn insert(&mut self, name: &'static str, value: ParamValue) {
        self.values.insert(name, value);
    }

    /// Adds a text value when one was supplied.
    #[must_use]
    pub fn with_text(mut self, name: &'static str, value: Option<&str>) -> Self {
        if let Some(text) = value {
            self.insert(name, ParamValue::Text(text.to_owned()));
        }
        self
    }

    /// Adds a list value when one was supplied.
    #[must_use]
    pub fn with_list(mut self, name: &'static str, value: Option<&[String]>) -> Self {
        if let Some(items) = value {
            self.insert(name, ParamValue::List(items.to_vec()));
        }
        self
    }

    /// Adds a binary value when one was supplied.
    #[must_use]
    pub fn with_bytes(mut self, name: &'static str, value: Option<&[u8]>) -> Self {
        if let Some(bytes) = value {
            self.insert(name, ParamValue::Bytes(bytes.to_vec()));
        }
        self
    }

    /// Returns the value bound to `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Reports whether a value is bound to `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

/// Parameters that passed [`validate`], with text trimmed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidatedParameters {
    bag: ParameterBag,
}

impl ValidatedParameters {
    /// Returns a text value, if supplied.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.bag.get(name) {
            Some(ParamValue::Text(text)) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Returns a text value that the command's table marks as required.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Missing`] when the value is absent, which
    /// only happens if the table and the accessor disagree.
    pub fn require_text(&self, name: &'static str) -> Result<&str, ValidationError> {
        self.text(name)
            .ok_or(ValidationError::Missing { field: name })
    }

    /// Returns a list value, if supplied.
    #[must_use]
    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.bag.get(name) {
            Some(ParamValue::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Returns a binary value, if supplied.
    #[must_use]
    pub fn bytes(&self, name: &str) -> Option<&[u8]> {
        match self.bag.get(name) {
            Some(ParamValue::Bytes(bytes)) => Some(bytes.as_slice()),
            _ => None,
        }
    }
}

/// Shared interface implemented once per command variant.
pub trait CommandParameters {
    /// Parameter table evaluated by [`validate`].
    const FIELDS: &'static [FieldSpec];

    /// Collects the raw values supplied for this invocation.
    fn parameters(&self) -> ParameterBag;

    /// Validates the invocation's parameters against [`Self::FIELDS`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    fn validate(&self) -> Result<ValidatedParameters, ValidationError> {
        validate(&self.parameters(), Self::FIELDS)
    }
}

/// Validates `bag` against `specs`.
///
/// Fields are checked in table order, then groups in order of first
/// appearance. Accepted values are returned trimmed.
///
/// # Errors
///
/// Returns the first [`ValidationError`] encountered.
pub fn validate(
    bag: &ParameterBag,
    specs: &[FieldSpec],
) -> Result<ValidatedParameters, ValidationError> {
    if let Some(unknown) = bag
        .values
        .keys()
        .find(|name| !specs.iter().any(|spec| spec.name == **name))
    {
        return Err(ValidationError::Unknown { field: *unknown });
    }

    let mut normalised = ParameterBag::new();
    for spec in specs {
        match bag.get(spec.name) {
            Some(value) => {
                let checked = check_rule(spec, value)?;
                normalised.insert(spec.name, checked);
            }
            None if spec.required && spec.group.is_none() => {
                return Err(ValidationError::Missing { field: spec.name });
            }
            None => {}
        }
    }

    check_groups(&normalised, specs)?;
    Ok(ValidatedParameters { bag: normalised })
}

fn check_rule(spec: &FieldSpec, value: &ParamValue) -> Result<ParamValue, ValidationError> {
    let field = spec.name;
    match (spec.rule, value) {
        (Rule::NonEmpty, ParamValue::Text(text)) => {
            non_empty(field, text).map(|trimmed| ParamValue::Text(trimmed.to_owned()))
        }
        (Rule::OneOf(allowed), ParamValue::Text(text)) => {
            let trimmed = non_empty(field, text)?;
            if allowed
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(trimmed))
            {
                Ok(ParamValue::Text(trimmed.to_owned()))
            } else {
                Err(ValidationError::NotAllowed {
                    field,
                    value: trimmed.to_owned(),
                    allowed,
                })
            }
        }
        (Rule::NonEmptyList, ParamValue::List(items)) => {
            if items.is_empty() {
                return Err(ValidationError::EmptyList { field });
            }
            let mut trimmed = Vec::with_capacity(items.len());
            for (index, item) in items.iter().enumerate() {
                let entry = item.trim();
                if entry.is_empty() {
                    return Err(ValidationError::BlankEntry { field, index });
                }
                trimmed.push(entry.to_owned());
            }
            Ok(ParamValue::List(trimmed))
        }
        (Rule::WellFormedXml, ParamValue::Text(text)) => {
            let trimmed = non_empty(field, text)?;
            parse_xml_document(trimmed).map_err(|err| ValidationError::Malformed {
                field,
                message: err.to_string(),
            })?;
            Ok(ParamValue::Text(trimmed.to_owned()))
        }
        (Rule::NonEmptyBytes, ParamValue::Bytes(bytes)) => {
            if bytes.is_empty() {
                Err(ValidationError::Empty { field })
            } else {
                Ok(ParamValue::Bytes(bytes.clone()))
            }
        }
        _ => Err(ValidationError::WrongKind { field }),
    }
}

fn non_empty<'a>(field: &'static str, text: &'a str) -> Result<&'a str, ValidationError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty { field })
    } else {
        Ok(trimmed)
    }
}

fn check_groups(bag: &ParameterBag, specs: &[FieldSpec]) -> Result<(), ValidationError> {
    let mut seen: Vec<&'static str> = Vec::new();
    for group in specs.iter().filter_map(|spec| spec.group) {
        if seen.contains(&group) {
            continue;
        }
        seen.push(group);

        let members: Vec<&'static str> = specs
            .iter()
            .filter(|spec| spec.group == Some(group))
            .map(|spec| spec.name)
            .collect();
        let supplied: Vec<&'static str> = members
            .iter()
            .copied()
            .filter(|name| bag.contains(name))
            .collect();

        match supplied.len() {
            1 => {}
            0 => {
                return Err(ValidationError::MissingOneOf {
                    group,
                    fields: members,
                });
            }
            _ => {
                return Err(ValidationError::Conflict {
                    group,
                    fields: supplied,
                });
            }
        }
    }
    Ok(())
}
