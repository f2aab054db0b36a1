//! Key Builder Module
//!
//! Namespaces logical keys into storage keys.

/// Default separator placed between key parts.
pub const DEFAULT_SEPARATOR: &str = ":";

// == Key Builder ==
/// Joins key parts with a separator behind an optional fixed prefix.
///
/// ```
/// use cachet::KeyBuilder;
///
/// let keys = KeyBuilder::new("app");
/// assert_eq!(keys.build(&["user", "42"]), "app:user:42");
/// assert_eq!(keys.build(&[]), "app");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBuilder {
    prefix: String,
    separator: String,
}

impl KeyBuilder {
    /// Creates a builder with the default `:` separator.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_separator(prefix, DEFAULT_SEPARATOR)
    }

    pub fn with_separator(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Builds a storage key. With no parts this is the bare prefix, with no
    /// trailing separator, or the empty string when there is no prefix.
    pub fn build(&self, parts: &[&str]) -> String {
        let joined = parts.join(&self.separator);
        match (self.prefix.is_empty(), parts.is_empty()) {
            (true, _) => joined,
            (false, true) => self.prefix.clone(),
            (false, false) => format!("{}{}{}", self.prefix, self.separator, joined),
        }
    }

    /// Prefix shared by every key this builder produces from one or more
    /// parts. Used to scope scans and clears to the namespace.
    pub fn scan_prefix(&self) -> String {
        if self.prefix.is_empty() {
            String::new()
        } else {
            format!("{}{}", self.prefix, self.separator)
        }
    }

    /// Maps a storage key back to the logical key, or `None` if the key is
    /// outside this namespace.
    pub fn strip<'a>(&self, storage_key: &'a str) -> Option<&'a str> {
        if self.prefix.is_empty() {
            return Some(storage_key);
        }
        storage_key
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix(self.separator.as_str())
    }
}

impl Default for KeyBuilder {
    fn default() -> Self {
        Self::new("")
    }
}
