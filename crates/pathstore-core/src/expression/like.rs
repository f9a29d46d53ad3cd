//! `LIKE` matching.

use std::cell::RefCell;
use std::collections::HashMap;

use regex::Regex;
use tracing::trace;

use crate::config::LikeMode;
use crate::error::EvalError;

/// Translate a SQL `LIKE` pattern into an anchored regex.
///
/// `%` matches any sequence and `_` any single character; everything else is
/// literal.
///
/// # Errors
///
/// Returns the regex error if the compiled pattern exceeds the size limit.
pub fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str("(?s)^");
    let mut buf = [0_u8; 4];
    for c in pattern.chars() {
        match c {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            c => source.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    source.push('$');
    Regex::new(&source)
}

/// Substring containment after stripping every `%`.
#[must_use]
pub fn substring_match(text: &str, pattern: &str) -> bool {
    text.contains(&pattern.replace('%', ""))
}

/// Upper bound on cached patterns. Patterns taken from row data can be
/// unique per row; the cache starts over once it is full.
pub(crate) const MAX_CACHED_PATTERNS: usize = 256;

/// Compiled `LIKE` patterns, kept per record so a scan compiles each
/// pattern once.
#[derive(Debug, Clone, Default)]
pub(crate) struct LikeCache {
    compiled: RefCell<HashMap<String, Regex>>,
}

impl LikeCache {
    pub(crate) fn is_match(
        &self,
        mode: LikeMode,
        text: &str,
        pattern: &str,
    ) -> Result<bool, EvalError> {
        if mode == LikeMode::Substring {
            return Ok(substring_match(text, pattern));
        }
        if let Some(re) = self.compiled.borrow().get(pattern) {
            return Ok(re.is_match(text));
        }
        let re = compile_pattern(pattern).map_err(|e| EvalError::malformed("LIKE", e.to_string()))?;
        trace!(pattern, "compiled LIKE pattern");
        let matched = re.is_match(text);
        let mut compiled = self.compiled.borrow_mut();
        if compiled.len() >= MAX_CACHED_PATTERNS {
            trace!(entries = compiled.len(), "clearing LIKE pattern cache");
            compiled.clear();
        }
        compiled.insert(pattern.to_owned(), re);
        Ok(matched)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.compiled.borrow().len()
    }
}
