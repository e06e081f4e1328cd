//! Splits post source files into their YAML front matter and raw body. A post
//! source file is structured as follows:
//!
//! 1. An opening fence line (`---`), which must be the very first line
//! 2. YAML front matter
//! 3. A closing fence line (`---`) followed by a newline
//! 4. The raw post body
//!
//! ```md
//! ---
//! title: Hello, world!
//! date: 2021-04-16
//! ---
//! # Hello
//! ```

use serde_yaml::{Mapping, Value};
use std::fmt;

const FENCE: &str = "---\n";

/// Splits `input` into `(front_matter, body)` without interpreting either
/// piece. The closing fence is the first line after the opening fence that
/// consists only of `---`.
pub fn split(input: &str) -> Result<(&str, &str)> {
    let rest = input
        .strip_prefix(FENCE)
        .ok_or(Error::MissingStartFence)?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line == FENCE {
            return Ok((&rest[..offset], &rest[offset + FENCE.len()..]));
        }
        offset += line.len();
    }
    Err(Error::MissingEndFence)
}

/// Returns true if `yaml` holds nothing but blank lines and comments.
/// `serde_yaml` rejects such documents instead of reading them as null.
fn is_blank(yaml: &str) -> bool {
    yaml.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#')
    })
}

/// Parses the front matter of `input` into a YAML mapping and returns it
/// alongside the verbatim body. Empty front matter (including front matter
/// holding only comments) yields an empty mapping.
pub fn parse(input: &str) -> Result<(Mapping, &str)> {
    let (yaml, body) = split(input)?;
    if is_blank(yaml) {
        return Ok((Mapping::new(), body));
    }
    let metadata = match serde_yaml::from_str::<Value>(yaml)? {
        Value::Null => Mapping::new(),
        Value::Mapping(mapping) => mapping,
        _ => return Err(Error::NotAMapping),
    };
    Ok((metadata, body))
}

/// Represents the result of a front matter operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents malformed front matter.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file doesn't start with a `---` line.
    MissingStartFence,

    /// Returned when the opening fence was found but no closing `---` line
    /// follows it.
    MissingEndFence,

    /// Returned when the front matter is valid YAML but not a mapping.
    NotAMapping,

    /// Returned when the front matter isn't valid YAML.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingStartFence => {
                write!(f, "format error: file does not start with `---`")
            }
            Error::MissingEndFence => {
                write!(f, "format error: front matter does not end with `---`")
            }
            Error::NotAMapping => {
                write!(f, "format error: front matter is not a mapping")
            }
            Error::DeserializeYaml(err) => write!(f, "format error: {}", err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::DeserializeYaml(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}
