//! Harm categories and the severity taxonomy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::moderator::ModerationError;

/// Harm category reported by a content analyser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModerationCategory {
    /// Hateful content.
    Hate,
    /// Content promoting self harm.
    SelfHarm,
    /// Sexual content.
    Sexual,
    /// Violent content.
    Violence,
}

impl ModerationCategory {
    /// Every category, in reporting order.
    pub const ALL: [Self; 4] = [Self::Hate, Self::SelfHarm, Self::Sexual, Self::Violence];

    /// Returns the canonical name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hate => "Hate",
            Self::SelfHarm => "SelfHarm",
            Self::Sexual => "Sexual",
            Self::Violence => "Violence",
        }
    }
}

impl fmt::Display for ModerationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationCategory {
    type Err = ModerationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| ModerationError::UnknownCategory(value.to_owned()))
    }
}

/// Discrete severity level: 0, 2, 4 or 6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Severity {
    /// Level 0.
    Safe,
    /// Level 2.
    Low,
    /// Level 4.
    Medium,
    /// Level 6.
    High,
}

impl Severity {
    /// Maps an analysed score onto the taxonomy, rounding down.
    ///
    /// Scores above the highest level saturate at [`Severity::High`].
    #[must_use]
    pub const fn round_down(level: u8) -> Self {
        match level {
            0 | 1 => Self::Safe,
            2 | 3 => Self::Low,
            4 | 5 => Self::Medium,
            _ => Self::High,
        }
    }

    /// Returns the numeric level.
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Safe => 0,
            Self::Low => 2,
            Self::Medium => 4,
            Self::High => 6,
        }
    }

    /// Level scaled into `0.0..=1.0`.
    #[must_use]
    pub fn score(self) -> f64 {
        f64::from(self.level()) / f64::from(Self::High.level())
    }
}

impl TryFrom<u8> for Severity {
    type Error = ModerationError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Self::Safe),
            2 => Ok(Self::Low),
            4 => Ok(Self::Medium),
            6 => Ok(Self::High),
            other => Err(ModerationError::InvalidSeverity(other)),
        }
    }
}

impl From<Severity> for u8 {
    fn from(severity: Severity) -> Self {
        severity.level()
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level())
    }
}

/// Minimum severity at which a category is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryThreshold {
    /// Category the threshold applies to.
    pub category: ModerationCategory,
    /// Lowest severity that gets flagged.
    pub severity: Severity,
}

impl CategoryThreshold {
    /// Creates a threshold.
    #[must_use]
    pub const fn new(category: ModerationCategory, severity: Severity) -> Self {
        Self { category, severity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysed_levels_round_down() {
        assert_eq!(Severity::round_down(1), Severity::Safe);
        assert_eq!(Severity::round_down(3), Severity::Low);
        assert_eq!(Severity::round_down(4), Severity::Medium);
        assert_eq!(Severity::round_down(7), Severity::High);
    }

    #[test]
    fn only_taxonomy_levels_convert_exactly() {
        assert_eq!(Severity::try_from(2).unwrap(), Severity::Low);
        assert!(matches!(
            Severity::try_from(3),
            Err(ModerationError::InvalidSeverity(3))
        ));
    }

    #[test]
    fn severity_serialises_as_its_level() {
        let threshold = CategoryThreshold::new(ModerationCategory::SelfHarm, Severity::Medium);
        let json = serde_json::to_string(&threshold).unwrap();
        assert_eq!(json, r#"{"category":"SelfHarm","severity":4}"#);

        let err = serde_json::from_str::<CategoryThreshold>(r#"{"category":"Hate","severity":5}"#);
        assert!(err.is_err());
    }

    #[test]
    fn categories_parse_case_insensitively() {
        assert_eq!(
            "selfharm".parse::<ModerationCategory>().unwrap(),
            ModerationCategory::SelfHarm
        );
        assert!("spam".parse::<ModerationCategory>().is_err());
    }
}
