//! ExtraConfig entries supplied with the repeatable `-e key=value` flag.

use std::fmt;

/// Error returned when an `-e` argument is not of the form `key=value`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to parse extraConfig: {0}")]
pub struct ExtraConfigParseError(pub String);

/// A single extraConfig key/value pair.
///
/// Values are always strings; the command line never supplies anything else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtraConfigEntry {
    pub key: String,
    pub value: String,
}

impl ExtraConfigEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Parse a raw `key=value` argument, splitting on the first `=` only.
    ///
    /// Empty keys (`=value`) and empty values (`key=`) are accepted as given.
    pub fn parse(raw: &str) -> Result<Self, ExtraConfigParseError> {
        match raw.split_once('=') {
            Some((key, value)) => Ok(Self::new(key, value)),
            None => Err(ExtraConfigParseError(raw.to_string())),
        }
    }
}

impl fmt::Display for ExtraConfigEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Ordered `-e` entries, one per occurrence of the flag.
///
/// Duplicate keys are kept; the remote side decides which write wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraConfig {
    entries: Vec<ExtraConfigEntry>,
}

impl ExtraConfig {
    pub fn entries(&self) -> &[ExtraConfigEntry] {
        &self.entries
    }
}

impl From<Vec<ExtraConfigEntry>> for ExtraConfig {
    fn from(entries: Vec<ExtraConfigEntry>) -> Self {
        Self { entries }
    }
}

impl FromIterator<ExtraConfigEntry> for ExtraConfig {
    fn from_iter<I: IntoIterator<Item = ExtraConfigEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ExtraConfig {
    type Item = &'a ExtraConfigEntry;
    type IntoIter = std::slice::Iter<'a, ExtraConfigEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for ExtraConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.entries.iter().map(ToString::to_string).collect();
        write!(f, "[{}]", parts.join(" "))
    }
}
