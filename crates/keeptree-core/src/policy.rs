//! Inherited policy flags and search options.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A three-valued policy flag resolved through the group's ancestors.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum TriState {
    /// Use the parent's resolved value.
    #[default]
    Inherit,
    /// Explicitly enabled.
    Enable,
    /// Explicitly disabled.
    Disable,
}

impl TriState {
    /// The explicit value of this flag, or `None` for `Inherit`.
    pub fn explicit(self) -> Option<bool> {
        match self {
            Self::Inherit => None,
            Self::Enable => Some(true),
            Self::Disable => Some(false),
        }
    }
}

impl From<bool> for TriState {
    fn from(enabled: bool) -> Self {
        if enabled { Self::Enable } else { Self::Disable }
    }
}

/// Case handling for text matching.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum CaseSensitivity {
    /// Exact byte-wise comparison.
    Sensitive,
    /// Compare lowercased text.
    #[default]
    Insensitive,
}

impl CaseSensitivity {
    /// Check whether `term` occurs in `haystack`.
    ///
    /// An empty term is contained in every string.
    pub fn contains(self, haystack: &str, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        match self {
            Self::Sensitive => haystack.contains(term),
            Self::Insensitive => haystack.to_lowercase().contains(&term.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_tristate_explicit() {
        assert_eq!(TriState::Inherit.explicit(), None);
        assert_eq!(TriState::Enable.explicit(), Some(true));
        assert_eq!(TriState::Disable.explicit(), Some(false));
        assert_eq!(TriState::from(false), TriState::Disable);
    }

    #[test]
    fn test_tristate_parse() {
        assert_eq!(TriState::from_str("disable").unwrap(), TriState::Disable);
        assert_eq!(TriState::from_str("Inherit").unwrap(), TriState::Inherit);
        assert_eq!(TriState::Enable.to_string(), "enable");
    }

    #[test]
    fn test_case_sensitivity_contains() {
        assert!(CaseSensitivity::Insensitive.contains("GitHub Login", "github"));
        assert!(!CaseSensitivity::Sensitive.contains("GitHub Login", "github"));
        assert!(CaseSensitivity::Sensitive.contains("anything", ""));
    }
}
