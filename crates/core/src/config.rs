//! TOML-based configuration for the diff engine.
//!
//! Three independent sections drive the three stages of a call: how tokens
//! are compared ([`DiffOptions`]), how unified output is laid out
//! ([`UnifiedOptions`]) and how merge output is rendered ([`MergeOptions`]).
//! Every section can be used on its own through the free functions in
//! [`crate::engine`], or together through [`EngineConfig`].

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::encoding::OutputEncoding;
use crate::errors::ConfigError;

/// Unified context is clamped to this many lines.
pub const MAX_CONTEXT_SIZE: usize = 100_000;

/// Conventional unified context size.
pub const DEFAULT_CONTEXT_SIZE: usize = 3;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Complete engine configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Token comparison settings.
    #[serde(default)]
    pub diff: DiffOptions,

    /// Unified output settings.
    #[serde(default)]
    pub unified: UnifiedOptions,

    /// Merge output settings.
    #[serde(default)]
    pub merge: MergeOptions,
}

// ---------------------------------------------------------------------------
// Comparison
// ---------------------------------------------------------------------------

/// How horizontal whitespace takes part in comparison.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IgnoreSpace {
    /// Whitespace is significant.
    #[default]
    None,
    /// Runs of whitespace compare equal to a single space.
    Change,
    /// Whitespace is dropped entirely.
    All,
}

/// Normalization applied to tokens before they are compared.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffOptions {
    #[serde(default)]
    pub ignore_space: IgnoreSpace,

    /// Treat `\n`, `\r` and `\r\n` terminators as equal (and equal to none).
    #[serde(default)]
    pub ignore_eol_style: bool,

    /// Ignore a missing terminator on the last line of a source.
    #[serde(default)]
    pub ignore_eol_at_eof: bool,
}

impl DiffOptions {
    /// True when comparison is plain byte equality.
    pub fn is_verbatim(&self) -> bool {
        self.ignore_space == IgnoreSpace::None && !self.ignore_eol_style && !self.ignore_eol_at_eof
    }
}

// ---------------------------------------------------------------------------
// Unified output
// ---------------------------------------------------------------------------

/// Layout of unified-diff output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnifiedOptions {
    /// Lines of unchanged context around each change.
    #[serde(default = "default_context_size")]
    pub context_size: usize,

    /// Encoding of header lines, prefixes and the "no newline" notice.
    #[serde(default)]
    pub header_encoding: OutputEncoding,
}

fn default_context_size() -> usize {
    DEFAULT_CONTEXT_SIZE
}

impl Default for UnifiedOptions {
    fn default() -> Self {
        Self {
            context_size: default_context_size(),
            header_encoding: OutputEncoding::default(),
        }
    }
}

impl UnifiedOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.context_size > MAX_CONTEXT_SIZE {
            return Err(ConfigError::InvalidValue {
                field: "unified.context_size".into(),
                detail: format!("must be at most {MAX_CONTEXT_SIZE}"),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Merge output
// ---------------------------------------------------------------------------

/// Optional overrides for the four conflict markers. A line terminator is
/// appended when the marker is written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConflictMarkers {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest: Option<String>,
}

pub const DEFAULT_MODIFIED_MARKER: &str = "<<<<<<< (modified)";
pub const DEFAULT_ORIGINAL_MARKER: &str = "||||||| (original)";
pub const DEFAULT_SEPARATOR_MARKER: &str = "=======";
pub const DEFAULT_LATEST_MARKER: &str = ">>>>>>> (latest)";

impl ConflictMarkers {
    pub fn modified(&self) -> &str {
        self.modified.as_deref().unwrap_or(DEFAULT_MODIFIED_MARKER)
    }

    pub fn original(&self) -> &str {
        self.original.as_deref().unwrap_or(DEFAULT_ORIGINAL_MARKER)
    }

    pub fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or(DEFAULT_SEPARATOR_MARKER)
    }

    pub fn latest(&self) -> &str {
        self.latest.as_deref().unwrap_or(DEFAULT_LATEST_MARKER)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let overrides = [
            ("merge.markers.modified", &self.modified),
            ("merge.markers.original", &self.original),
            ("merge.markers.separator", &self.separator),
            ("merge.markers.latest", &self.latest),
        ];
        for (field, marker) in overrides {
            let Some(marker) = marker else { continue };
            if marker.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    detail: "marker must not be empty".into(),
                });
            }
            if marker.contains(['\r', '\n']) {
                return Err(ConfigError::InvalidValue {
                    field: field.into(),
                    detail: "marker must not contain a line terminator".into(),
                });
            }
        }

        if self.separator() == self.modified() || self.separator() == self.original() {
            return Err(ConfigError::InvalidValue {
                field: "merge.markers.separator".into(),
                detail: "separator must differ from the opening markers".into(),
            });
        }
        Ok(())
    }
}

/// Rendering of merge output.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeOptions {
    /// Include the original text between the modified and separator markers.
    #[serde(default)]
    pub show_original_in_conflict: bool,

    /// Render the modified-vs-latest sub-diff of a conflict in place, so
    /// only the lines that really disagree are framed by markers.
    #[serde(default)]
    pub resolve_conflicts: bool,

    /// Encoding of the synthesized markers.
    #[serde(default)]
    pub marker_encoding: OutputEncoding,

    #[serde(default)]
    pub markers: ConflictMarkers,
}

impl MergeOptions {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.markers.validate()
    }
}

// ---------------------------------------------------------------------------
// Loading & validation
// ---------------------------------------------------------------------------

impl EngineConfig {
    /// Load an [`EngineConfig`] from a TOML file at the given path.
    ///
    /// This does **not** validate the values -- call
    /// [`validate`](Self::validate) afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&contents)?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Parse an [`EngineConfig`] from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize to TOML, e.g. to write a starter file.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.unified.validate()?;
        self.merge.validate()?;
        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }
}
