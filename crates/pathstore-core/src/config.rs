//! Record evaluation configuration.
//!
//! Provides [`RecordConfig`], which controls the evaluator behaviours that
//! callers may want to tune per dataset. Values can be loaded from
//! environment variables via [`RecordConfig::from_env`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Default nesting limit for sub-queries and terms.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default text a date/time marker term resolves to.
pub const DEFAULT_DATETIME_MARKER: &str = "__datetime__";

/// How `LIKE` patterns are matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeMode {
    /// Anchored SQL pattern: `%` matches any sequence, `_` one character.
    #[default]
    Pattern,
    /// Strip every `%` and test substring containment.
    Substring,
}

impl fmt::Display for LikeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pattern => f.write_str("pattern"),
            Self::Substring => f.write_str("substring"),
        }
    }
}

impl FromStr for LikeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pattern" | "glob" => Ok(Self::Pattern),
            "substring" | "contains" => Ok(Self::Substring),
            other => Err(format!("unknown LIKE mode: {other}")),
        }
    }
}

/// Record evaluation configuration.
///
/// # Examples
///
/// ```
/// use pathstore_core::config::{LikeMode, RecordConfig};
///
/// let config = RecordConfig::builder().like_mode(LikeMode::Substring).build();
/// assert_eq!(config.max_depth, 64);
/// assert_eq!(config.datetime_marker, "__datetime__");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct RecordConfig {
    /// `LIKE` matching mode.
    #[builder(default)]
    #[serde(default)]
    pub like_mode: LikeMode,

    /// Maximum nesting of sub-queries and terms before evaluation fails.
    #[builder(default = DEFAULT_MAX_DEPTH)]
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Text that date/time marker terms resolve to.
    #[builder(default = String::from(DEFAULT_DATETIME_MARKER))]
    #[serde(default = "default_datetime_marker")]
    pub datetime_marker: String,
}

impl Default for RecordConfig {
    fn default() -> Self {
        Self {
            like_mode: LikeMode::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            datetime_marker: String::from(DEFAULT_DATETIME_MARKER),
        }
    }
}

impl RecordConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `PATHSTORE_LIKE_MODE` | `pattern` |
    /// | `PATHSTORE_MAX_DEPTH` | `64` |
    /// | `PATHSTORE_DATETIME_MARKER` | `__datetime__` |
    ///
    /// Unparseable values are ignored and the default is kept.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("PATHSTORE_LIKE_MODE") {
            match v.parse() {
                Ok(mode) => config.like_mode = mode,
                Err(e) => tracing::warn!(error = %e, "ignoring PATHSTORE_LIKE_MODE"),
            }
        }
        if let Ok(v) = std::env::var("PATHSTORE_MAX_DEPTH") {
            match v.parse::<usize>() {
                Ok(n) => config.max_depth = n,
                Err(e) => tracing::warn!(error = %e, "ignoring PATHSTORE_MAX_DEPTH"),
            }
        }
        if let Ok(v) = std::env::var("PATHSTORE_DATETIME_MARKER") {
            config.datetime_marker = v;
        }

        config
    }
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_datetime_marker() -> String {
    String::from(DEFAULT_DATETIME_MARKER)
}
