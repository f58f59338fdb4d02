//! Tree configuration.
//!
//! Holds the two knobs the coercion and token layers read: the radix used
//! when a leaf is coerced to an integer, and the delimiter standalone word
//! sequences split on. Path addressing itself always tokenizes on
//! whitespace.
use crate::error::{TreeError, TreeResult};
use serde::{Deserialize, Serialize};

/// Default radix for integer coercion.
pub const DEFAULT_PARSE_INT_BASE: u32 = 10;

/// Default delimiter for word sequences.
pub const DEFAULT_WORD_DELIMITER: char = ' ';

/// Configuration shared by a [`PathTree`](crate::PathTree) and the word
/// sequences it hands out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Radix used by `get_number` when parsing string leaves (2..=36).
    pub parse_int_base: u32,

    /// Delimiter used by [`Words`](crate::Words) built through the tree.
    pub word_delimiter: char,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            parse_int_base: DEFAULT_PARSE_INT_BASE,
            word_delimiter: DEFAULT_WORD_DELIMITER,
        }
    }
}

impl TreeConfig {
    /// Set the integer coercion radix.
    pub fn with_parse_int_base(mut self, base: u32) -> Self {
        self.parse_int_base = base;
        self
    }

    /// Set the word delimiter.
    pub fn with_word_delimiter(mut self, delimiter: char) -> Self {
        self.word_delimiter = delimiter;
        self
    }

    /// Load a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> TreeResult<Self> {
        let config: TreeConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration values are usable.
    pub fn validate(&self) -> TreeResult<()> {
        if !(2..=36).contains(&self.parse_int_base) {
            return Err(TreeError::InvalidConfig {
                reason: format!(
                    "parse_int_base must be within 2..=36, got {}",
                    self.parse_int_base
                ),
            });
        }
        if self.word_delimiter != ' ' && self.word_delimiter.is_whitespace() {
            return Err(TreeError::InvalidConfig {
                reason: "word_delimiter may only be a plain space or a non-whitespace character"
                    .to_string(),
            });
        }
        Ok(())
    }
}
