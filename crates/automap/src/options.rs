//! Mapping options
#![allow(clippy::must_use_candidate)] // Builder/constructor API intentionally omits pervasive #[must_use].
#![allow(clippy::return_self_not_must_use)] // Fluent builder methods return Self for ergonomics.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{Error, Result};

/// How unresolved destination fields are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// A destination field without a source counterpart is an error
    #[default]
    Strict,

    /// A destination field without a source counterpart keeps its zero value
    Loose,
}

/// Options controlling a [`Mapper`](crate::Mapper)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapOptions {
    /// Strict or loose field resolution (default: strict)
    pub mode: MatchMode,

    /// Check element compatibility of empty source sequences (default: true)
    pub verify_empty_sequences: bool,

    /// Also search non-embedded struct fields of the source when a field
    /// is not found directly (default: false)
    pub promote_from_named_fields: bool,

    /// Fill an unmatched struct-typed destination field by mapping the
    /// whole current source into it (default: false)
    pub descend_into_unmatched_structs: bool,

    /// Maximum value nesting depth; unbounded when unset (default: unset)
    pub max_depth: Option<usize>,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            mode: MatchMode::Strict,
            verify_empty_sequences: true,
            promote_from_named_fields: false,
            descend_into_unmatched_structs: false,
            max_depth: None,
        }
    }
}

impl MapOptions {
    /// Create options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with loose field resolution
    pub fn loose() -> Self {
        Self::default().mode(MatchMode::Loose)
    }

    /// Parse options from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config(format!("Invalid options: {e}")))
    }

    /// Load options from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_yaml_str(&content)
    }

    /// Set the match mode
    pub fn mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable the empty sequence element check
    pub fn verify_empty_sequences(mut self, verify: bool) -> Self {
        self.verify_empty_sequences = verify;
        self
    }

    /// Enable or disable promotion from named struct fields
    pub fn promote_from_named_fields(mut self, enabled: bool) -> Self {
        self.promote_from_named_fields = enabled;
        self
    }

    /// Enable or disable descending into unmatched struct fields
    pub fn descend_into_unmatched_structs(mut self, enabled: bool) -> Self {
        self.descend_into_unmatched_structs = enabled;
        self
    }

    /// Bound the value nesting depth
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// Whether missing source fields are tolerated
    pub fn is_loose(&self) -> bool {
        self.mode == MatchMode::Loose
    }
}
