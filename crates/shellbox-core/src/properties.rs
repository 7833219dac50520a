use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

const UTF8_BOM: &str = "\u{feff}";

/// A flat `key=value` property set.
///
/// Lines are trimmed, `#` and `!` comment lines are skipped, and the first
/// `=` splits key from value. Editor-saved files may carry a UTF-8 byte-order
/// mark; it is stripped before parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);
        let mut entries = BTreeMap::new();
        for line in raw.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self { entries }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read properties file: {}", path.display()))?;
        Ok(Self::parse(&raw))
    }

    /// Parses a `KEY=VALUE;KEY=VALUE` delimited string, as carried by the
    /// settings-injection environment variable. Blank segments are ignored.
    pub fn from_delimited(raw: &str) -> Self {
        let mut entries = BTreeMap::new();
        for segment in raw.split(';').map(str::trim) {
            if segment.is_empty() {
                continue;
            }
            let Some((key, value)) = segment.split_once('=') else {
                continue;
            };
            entries.insert(key.trim().to_string(), value.trim().to_string());
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Case-insensitive prefix lookup tolerating an optional leading dash on
    /// the stored key.
    pub fn get_no_case(&self, text: &str) -> Option<&str> {
        let needle = text.to_ascii_lowercase();
        let dashed = format!("-{needle}");
        self.entries
            .iter()
            .find(|(key, _)| {
                let lower = key.to_ascii_lowercase();
                lower.starts_with(&needle) || lower.starts_with(&dashed)
            })
            .map(|(_, value)| value.as_str())
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get_no_case(key)
            .map(|value| value.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Shallow merge where the overriding set wins on key collisions
    /// (last-loaded wins).
    pub fn merge(&mut self, overrides: &Properties) {
        for (key, value) in &overrides.entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }
}
