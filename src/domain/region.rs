use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::constants::query::SHORT_KEY_LEN;

/// Geographic/administrative entity as reported by the result page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, rename = "LSNRegion")]
pub struct Region {
    /// Full 9-digit identifier, e.g. `254026000`
    pub id: String,
    /// Short key, e.g. `254026`
    #[serde(rename = "schluessel")]
    pub short_key: String,
    pub name: String,
}

impl Region {
    pub fn new(id: impl Into<String>, short_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            short_key: short_key.into(),
            name: name.into(),
        }
    }
}

/// Derive the short key of a region id: trailing zeros stripped, then
/// truncated to [`SHORT_KEY_LEN`] characters.
///
/// Mirrors the key shortening the remote service applies to its range
/// parameters.
pub fn short_key(region_id: &str) -> String {
    region_id
        .trim_end_matches('0')
        .chars()
        .take(SHORT_KEY_LEN)
        .collect()
}

/// Administrative granularity of a query (`LN` form field)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export, rename = "GebietsEbene")]
pub enum HierarchyLevel {
    #[serde(rename = "land")]
    Nation,
    #[serde(rename = "region")]
    Region,
    #[serde(rename = "kreis")]
    District,
    #[serde(rename = "samtgemeinde")]
    CollectiveMunicipality,
    #[default]
    #[serde(rename = "gemeinde")]
    Municipality,
}

impl HierarchyLevel {
    pub const ALL: [Self; 5] = [
        Self::Nation,
        Self::Region,
        Self::District,
        Self::CollectiveMunicipality,
        Self::Municipality,
    ];

    /// Numeric value expected by the remote query
    pub const fn as_param(self) -> u8 {
        match self {
            Self::Nation => 1,
            Self::Region => 2,
            Self::District => 3,
            Self::CollectiveMunicipality => 4,
            Self::Municipality => 5,
        }
    }

    /// German name used by the service and the downstream feed
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Nation => "land",
            Self::Region => "region",
            Self::District => "kreis",
            Self::CollectiveMunicipality => "samtgemeinde",
            Self::Municipality => "gemeinde",
        }
    }
}

impl fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown hierarchy level: {0}")]
pub struct UnknownLevelError(pub String);

impl FromStr for HierarchyLevel {
    type Err = UnknownLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "land" | "nation" | "1" => Ok(Self::Nation),
            "region" | "2" => Ok(Self::Region),
            "kreis" | "district" | "3" => Ok(Self::District),
            "samtgemeinde" | "collective-municipality" | "4" => Ok(Self::CollectiveMunicipality),
            "gemeinde" | "municipality" | "5" => Ok(Self::Municipality),
            other => Err(UnknownLevelError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn short_key_strips_trailing_zeros() {
        assert_eq!(short_key("254026000"), "254026");
        assert_eq!(short_key("254000000"), "254");
        assert_eq!(short_key("000000000"), "");
        assert_eq!(short_key(""), "");
    }

    #[test]
    fn short_key_truncates_to_six_characters() {
        assert_eq!(short_key("254026123"), "254026");
        assert_eq!(short_key("103000010"), "103000");
    }

    #[test]
    fn level_params_follow_hierarchy() {
        let params: Vec<u8> = HierarchyLevel::ALL.iter().map(|l| l.as_param()).collect();
        assert_eq!(params, vec![1, 2, 3, 4, 5]);
        assert_eq!(HierarchyLevel::default(), HierarchyLevel::Municipality);
    }

    #[test]
    fn level_parses_german_and_english_names() {
        assert_eq!("gemeinde".parse::<HierarchyLevel>(), Ok(HierarchyLevel::Municipality));
        assert_eq!("Kreis".parse::<HierarchyLevel>(), Ok(HierarchyLevel::District));
        assert_eq!("nation".parse::<HierarchyLevel>(), Ok(HierarchyLevel::Nation));
        assert!("bezirk".parse::<HierarchyLevel>().is_err());
    }

    #[test]
    fn level_serializes_to_german_name() {
        let json = serde_json::to_string(&HierarchyLevel::CollectiveMunicipality).unwrap();
        assert_eq!(json, "\"samtgemeinde\"");
    }

    proptest! {
        #[test]
        fn short_key_is_bounded_prefix(id in "[0-9]{9}") {
            let key = short_key(&id);
            prop_assert!(key.len() <= SHORT_KEY_LEN);
            prop_assert!(id.starts_with(&key));
            prop_assert!(!key.ends_with('0') || key.len() == SHORT_KEY_LEN);
        }
    }
}
