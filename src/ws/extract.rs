//! Turning agent output into the response frame.
//!
//! In [`OutputMode::Raw`] the output is relayed unchanged. In
//! [`OutputMode::ExtractJson`] the output is treated as log noise around a
//! single JSON object, and only that object is relayed.

use std::fmt;
use std::str::FromStr;

use serde_json::{Map, Value};

/// How agent output becomes the response frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Relay the full output.
    #[default]
    Raw,
    /// Relay only the first embedded JSON object; send nothing if none.
    ExtractJson,
}

impl OutputMode {
    /// Renders the frame for `output`.
    ///
    /// # Errors
    ///
    /// Returns [`ObjectNotFound`] in [`OutputMode::ExtractJson`] when the
    /// output holds no JSON object; no frame should be sent then.
    pub fn render(self, output: &str) -> Result<String, ObjectNotFound> {
        match self {
            Self::Raw => Ok(output.to_string()),
            Self::ExtractJson => extract_json_object(output).map(str::to_string),
        }
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::ExtractJson => f.write_str("extract_json"),
        }
    }
}

/// Error for an unrecognised output mode string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output mode: {0}")]
pub struct ParseOutputModeError(String);

impl FromStr for OutputMode {
    type Err = ParseOutputModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "extract_json" | "json" => Ok(Self::ExtractJson),
            other => Err(ParseOutputModeError(other.to_string())),
        }
    }
}

/// No JSON object could be decoded from the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("json object not found in output")]
pub struct ObjectNotFound;

/// Finds the first JSON object embedded in `raw`.
///
/// Each `{` is tried left to right as the start of an object. The first
/// position where a complete object decodes wins; the returned slice is
/// that object's text with surrounding whitespace trimmed.
///
/// # Errors
///
/// Returns [`ObjectNotFound`] if no position yields an object.
pub fn extract_json_object(raw: &str) -> Result<&str, ObjectNotFound> {
    for (start, _) in raw.match_indices('{') {
        let Some(rest) = raw.get(start..) else {
            continue;
        };

        let mut stream =
            serde_json::Deserializer::from_str(rest).into_iter::<Map<String, Value>>();
        if !matches!(stream.next(), Some(Ok(_))) {
            continue;
        }

        let Some(candidate) = rest.get(..stream.byte_offset()).map(str::trim) else {
            continue;
        };
        if candidate.is_empty() || serde_json::from_str::<Value>(candidate).is_err() {
            continue;
        }

        return Ok(candidate);
    }

    Err(ObjectNotFound)
}
