//! Well identifier (API number) normalization.
//!
//! Registries publish API numbers with dashes, thousands separators, county
//! suffixes and missing state prefixes. [`IdentifierFormat`] describes how a
//! source's identifiers are brought onto the common 10-digit form.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default API number length: state, county and unique well digits.
pub const API_LENGTH: usize = 10;

/// Per-source rules for normalizing well identifiers.
///
/// The steps run in a fixed order: trim, drop `strip_leading` and
/// `strip_trailing` characters, remove `-`, `,` and whitespace, truncate to
/// `max_len`, left-pad with zeros to `zero_pad`, check `min_len`, and finally
/// prepend `prefix`. Identifiers that end up empty or consist only of zeros
/// are rejected.
///
/// # Examples
/// ```
/// use orphan_wells_core::IdentifierFormat;
///
/// let texas = IdentifierFormat {
///     prefix: Some("42".into()),
///     ..IdentifierFormat::default()
/// };
/// assert_eq!(texas.normalise("003-12,345"), Some("4200312345".into()));
/// assert_eq!(texas.normalise("00000000"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(default, deny_unknown_fields)
)]
pub struct IdentifierFormat {
    /// Characters removed from the start before cleaning.
    pub strip_leading: usize,
    /// Characters removed from the end before cleaning.
    pub strip_trailing: usize,
    /// Maximum identifier length; longer identifiers are truncated.
    pub max_len: Option<usize>,
    /// Width to left-pad with zeros.
    pub zero_pad: Option<usize>,
    /// Minimum length (before `prefix`) for an identifier to be kept.
    pub min_len: Option<usize>,
    /// State digits prepended to the cleaned identifier.
    pub prefix: Option<String>,
}

impl Default for IdentifierFormat {
    fn default() -> Self {
        Self {
            strip_leading: 0,
            strip_trailing: 0,
            max_len: Some(API_LENGTH),
            zero_pad: None,
            min_len: None,
            prefix: None,
        }
    }
}

impl IdentifierFormat {
    /// Normalize a raw identifier, returning `None` when nothing usable
    /// remains.
    pub fn normalise(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        let kept = trimmed
            .chars()
            .count()
            .checked_sub(self.strip_leading + self.strip_trailing)?;
        let mut digits: String = trimmed
            .chars()
            .skip(self.strip_leading)
            .take(kept)
            .filter(|ch| !matches!(ch, '-' | ',') && !ch.is_whitespace())
            .collect();

        if let Some(max_len) = self.max_len
            && digits.chars().count() > max_len
        {
            digits = digits.chars().take(max_len).collect();
        }
        if let Some(width) = self.zero_pad {
            let len = digits.chars().count();
            if len < width {
                digits.insert_str(0, &"0".repeat(width - len));
            }
        }
        if digits.chars().all(|ch| ch == '0') {
            return None;
        }
        if let Some(min_len) = self.min_len
            && digits.chars().count() < min_len
        {
            return None;
        }
        Some(match &self.prefix {
            Some(prefix) => format!("{prefix}{digits}"),
            None => digits,
        })
    }
}
