//! Local payload loading for command parameters.
//!
//! Diagnostics configuration documents and certificates are supplied as file
//! paths on the command line. This module reads them through `cap-std` and
//! checks that XML documents are well formed before they are embedded in an
//! extension configuration.

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// Errors raised while loading or inspecting a payload.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PayloadError {
    /// Raised when a file path is empty or only whitespace.
    #[error("payload file path must not be empty")]
    PathEmpty,
    /// Raised when reading the file fails.
    #[error("failed to read `{path}`: {message}")]
    FileRead {
        /// Path that failed to read.
        path: String,
        /// Underlying error message.
        message: String,
    },
    /// Raised when the document cannot be parsed.
    #[error("malformed XML at byte {position}: {message}")]
    MalformedXml {
        /// Byte offset reported by the parser.
        position: usize,
        /// Parser diagnostic.
        message: String,
    },
    /// Raised when the document has no root element.
    #[error("XML document has no root element")]
    MissingRoot,
    /// Raised when the document has more than one top-level element.
    #[error("XML document has more than one root element (found {second} after {first})")]
    MultipleRoots {
        /// Name of the first root element.
        first: String,
        /// Name of the extra top-level element.
        second: String,
    },
    /// Raised when text appears outside the root element.
    #[error("XML document has text outside its root element")]
    StrayText,
    /// Raised when the document ends inside an element.
    #[error("XML document ends before element {element} is closed")]
    Unclosed {
        /// Innermost element still open at the end of input.
        element: String,
    },
}

/// A well formed XML document, stripped of its prolog.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct XmlDocument {
    /// Name of the root element.
    pub root: String,
    /// Document text starting at the root element.
    pub body: String,
}

/// Reads a UTF-8 text file.
///
/// # Errors
///
/// Returns [`PayloadError`] when the path is blank or the file cannot be read.
pub fn read_text_file(path: &str) -> Result<String, PayloadError> {
    with_file(path, |dir, file| dir.read_to_string(file))
}

/// Reads a binary file.
///
/// # Errors
///
/// Returns [`PayloadError`] when the path is blank or the file cannot be read.
pub fn read_binary_file(path: &str) -> Result<Vec<u8>, PayloadError> {
    with_file(path, |dir, file| dir.read(file))
}

fn with_file<T>(
    path: &str,
    read: impl FnOnce(&Dir, &Utf8Path) -> std::io::Result<T>,
) -> Result<T, PayloadError> {
    if path.trim().is_empty() {
        return Err(PayloadError::PathEmpty);
    }
    let file_error = |message: String| PayloadError::FileRead {
        path: path.to_owned(),
        message,
    };

    let path_buf = Utf8Path::new(path);
    let (dir_path, file_path) = if path_buf.is_absolute() {
        let parent = path_buf
            .parent()
            .ok_or_else(|| file_error(String::from("path has no parent directory")))?;
        let file_name = path_buf
            .file_name()
            .ok_or_else(|| file_error(String::from("path has no file name")))?;
        (parent, Utf8Path::new(file_name))
    } else {
        (Utf8Path::new("."), path_buf)
    };

    let dir = Dir::open_ambient_dir(dir_path, ambient_authority())
        .map_err(|err| file_error(err.to_string()))?;
    read(&dir, file_path).map_err(|err| file_error(err.to_string()))
}

/// Parses `text` and returns the document body from the root element on.
///
/// Only well-formedness is checked; no schema is applied.
///
/// # Errors
///
/// Returns [`PayloadError`] when the document is malformed, empty, has more
/// than one root, or leaves an element open.
pub fn parse_xml_document(text: &str) -> Result<XmlDocument, PayloadError> {
    let mut reader = Reader::from_str(text);
    let mut root: Option<(String, usize)> = None;
    let mut open: Vec<String> = Vec::new();

    loop {
        let position = reader.buffer_position();
        let event = reader
            .read_event()
            .map_err(|err| PayloadError::MalformedXml {
                position: reader.buffer_position(),
                message: err.to_string(),
            })?;

        match event {
            Event::Start(start) => {
                check_attributes(&start, position)?;
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                if open.is_empty() {
                    claim_root(&mut root, &name, position)?;
                }
                open.push(name);
            }
            Event::Empty(start) => {
                check_attributes(&start, position)?;
                if open.is_empty() {
                    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                    claim_root(&mut root, &name, position)?;
                }
            }
            Event::End(_) => {
                open.pop();
            }
            Event::Text(content) => {
                let text = content
                    .unescape()
                    .map_err(|err| PayloadError::MalformedXml {
                        position,
                        message: err.to_string(),
                    })?;
                if open.is_empty() && !text.trim().is_empty() {
                    return Err(PayloadError::StrayText);
                }
            }
            Event::CData(_) if open.is_empty() => return Err(PayloadError::StrayText),
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(element) = open.pop() {
        return Err(PayloadError::Unclosed { element });
    }

    let (name, start) = root.ok_or(PayloadError::MissingRoot)?;
    let body = text
        .get(start..)
        .map(str::trim_end)
        .ok_or(PayloadError::MissingRoot)?;
    Ok(XmlDocument {
        root: name,
        body: body.to_owned(),
    })
}

/// Rejects malformed or duplicate attributes, raw `<` in values and
/// unresolvable entity references.
fn check_attributes(start: &BytesStart<'_>, position: usize) -> Result<(), PayloadError> {
    let malformed = |message: String| PayloadError::MalformedXml { position, message };
    for attribute in start.attributes().with_checks(true) {
        let attribute = attribute.map_err(|err| malformed(err.to_string()))?;
        if attribute.value.contains(&b'<') {
            return Err(malformed(format!(
                "attribute `{}` contains `<`",
                String::from_utf8_lossy(attribute.key.as_ref())
            )));
        }
        attribute
            .unescape_value()
            .map_err(|err| malformed(err.to_string()))?;
    }
    Ok(())
}

fn claim_root(
    root: &mut Option<(String, usize)>,
    name: &str,
    position: usize,
) -> Result<(), PayloadError> {
    if let Some((first, _)) = root.as_ref() {
        return Err(PayloadError::MultipleRoots {
            first: first.clone(),
            second: name.to_owned(),
        });
    }
    *root = Some((name.to_owned(), position));
    Ok(())
}
