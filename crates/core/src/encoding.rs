//! Output encodings for synthesized text.
//!
//! Only text the engine generates itself (hunk headers, line prefixes,
//! conflict markers, the "no newline" notice) passes through here. Token
//! bytes are copied to the sink untouched.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::errors::DiffError;

/// Character encoding used for synthesized output text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum OutputEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "iso-8859-1")]
    Latin1,
    #[serde(rename = "us-ascii")]
    Ascii,
}

impl OutputEncoding {
    /// Parse an encoding label, accepting the usual aliases.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Some(Self::Utf8),
            "iso-8859-1" | "iso8859-1" | "latin1" | "latin-1" => Some(Self::Latin1),
            "us-ascii" | "ascii" => Some(Self::Ascii),
            _ => None,
        }
    }

    /// Canonical label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Latin1 => "iso-8859-1",
            Self::Ascii => "us-ascii",
        }
    }

    /// Encode `text`, failing on the first character the encoding cannot
    /// represent.
    pub fn encode<'t>(&self, text: &'t str) -> Result<Cow<'t, [u8]>, DiffError> {
        let limit = match self {
            Self::Utf8 => return Ok(Cow::Borrowed(text.as_bytes())),
            Self::Latin1 => 0xFF,
            Self::Ascii => 0x7F,
        };

        if text.is_ascii() {
            return Ok(Cow::Borrowed(text.as_bytes()));
        }

        text.chars()
            .map(|c| {
                u8::try_from(u32::from(c))
                    .ok()
                    .filter(|b| u32::from(*b) <= limit)
            })
            .collect::<Option<Vec<u8>>>()
            .map(Cow::Owned)
            .ok_or_else(|| DiffError::Encoding {
                encoding: self.label().to_string(),
                text: text.to_string(),
            })
    }
}

impl std::fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
