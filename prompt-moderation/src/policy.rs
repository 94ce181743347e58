//! Thresholds and the flags they produce.

use serde::{Deserialize, Serialize};

use crate::category::{CategoryThreshold, ModerationCategory, Severity};
use crate::moderator::CategoryAnalysis;

/// Per-category outcome of a review.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryFlag {
    /// Category reviewed.
    pub category: ModerationCategory,
    /// Severity reported by the analyser, [`Severity::Safe`] when absent.
    pub severity: Severity,
    /// Severity scaled into `0.0..=1.0`.
    pub score: f64,
    /// Whether the severity reached the configured threshold.
    pub flagged: bool,
}

/// Outcome of applying a [`ModerationPolicy`] to an analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationResult {
    /// True when any category was flagged.
    pub flagged: bool,
    /// One entry per category, in [`ModerationCategory::ALL`] order.
    pub categories: Vec<CategoryFlag>,
}

impl ModerationResult {
    /// Returns the entry for `category`.
    #[must_use]
    pub fn category(&self, category: ModerationCategory) -> Option<&CategoryFlag> {
        self.categories.iter().find(|flag| flag.category == category)
    }

    /// Iterates over flagged categories.
    pub fn flagged_categories(&self) -> impl Iterator<Item = ModerationCategory> + '_ {
        self.categories
            .iter()
            .filter(|flag| flag.flagged)
            .map(|flag| flag.category)
    }
}

/// Set of category thresholds.
///
/// Categories without a threshold are reported but never flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationPolicy {
    thresholds: Vec<CategoryThreshold>,
}

impl ModerationPolicy {
    /// Creates a policy from thresholds; a later entry for the same category
    /// replaces an earlier one.
    #[must_use]
    pub fn new(thresholds: impl IntoIterator<Item = CategoryThreshold>) -> Self {
        thresholds
            .into_iter()
            .fold(Self { thresholds: Vec::new() }, |policy, threshold| {
                policy.with_threshold(threshold.category, threshold.severity)
            })
    }

    /// Sets the threshold for `category`.
    #[must_use]
    pub fn with_threshold(mut self, category: ModerationCategory, severity: Severity) -> Self {
        self.thresholds.retain(|existing| existing.category != category);
        self.thresholds.push(CategoryThreshold::new(category, severity));
        self
    }

    /// Returns the configured thresholds.
    #[must_use]
    pub fn thresholds(&self) -> &[CategoryThreshold] {
        &self.thresholds
    }

    /// Returns the threshold for `category`.
    #[must_use]
    pub fn threshold(&self, category: ModerationCategory) -> Option<Severity> {
        self.thresholds
            .iter()
            .find(|threshold| threshold.category == category)
            .map(|threshold| threshold.severity)
    }

    /// Flags every analysed category whose severity reaches its threshold.
    #[must_use]
    pub fn flag(&self, analysis: &[CategoryAnalysis]) -> ModerationResult {
        let categories: Vec<_> = ModerationCategory::ALL
            .into_iter()
            .map(|category| {
                let analysed = analysis
                    .iter()
                    .filter(|entry| entry.category == category)
                    .map(|entry| entry.severity)
                    .max();
                let severity = analysed.unwrap_or(Severity::Safe);
                let flagged = matches!(
                    (analysed, self.threshold(category)),
                    (Some(found), Some(limit)) if found >= limit
                );
                CategoryFlag {
                    category,
                    severity,
                    score: severity.score(),
                    flagged,
                }
            })
            .collect();

        ModerationResult {
            flagged: categories.iter().any(|flag| flag.flagged),
            categories,
        }
    }
}

impl Default for ModerationPolicy {
    /// Flags every category from [`Severity::Low`] upward.
    fn default() -> Self {
        Self::new(
            ModerationCategory::ALL
                .into_iter()
                .map(|category| CategoryThreshold::new(category, Severity::Low)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysed(category: ModerationCategory, level: u8) -> CategoryAnalysis {
        CategoryAnalysis::new(category, Severity::round_down(level))
    }

    #[test]
    fn flags_when_threshold_is_reached() {
        let policy = ModerationPolicy::default().with_threshold(ModerationCategory::Hate, Severity::Medium);

        let result = policy.flag(&[analysed(ModerationCategory::Hate, 5)]);
        assert!(result.flagged);
        let hate = result.category(ModerationCategory::Hate).unwrap();
        assert_eq!(hate.severity, Severity::Medium);
        assert!((hate.score - 4.0 / 6.0).abs() < f64::EPSILON);

        let result = policy.flag(&[analysed(ModerationCategory::Hate, 3)]);
        assert!(!result.flagged);
    }

    #[test]
    fn categories_without_threshold_are_never_flagged() {
        let policy = ModerationPolicy::new([CategoryThreshold::new(
            ModerationCategory::Violence,
            Severity::Low,
        )]);

        let result = policy.flag(&[
            analysed(ModerationCategory::Sexual, 6),
            analysed(ModerationCategory::Violence, 2),
        ]);
        assert!(result.flagged);
        assert_eq!(
            result.flagged_categories().collect::<Vec<_>>(),
            vec![ModerationCategory::Violence]
        );
        assert_eq!(result.categories.len(), 4);
    }

    #[test]
    fn unanalysed_categories_report_safe() {
        let policy = ModerationPolicy::default().with_threshold(ModerationCategory::Hate, Severity::Safe);

        let result = policy.flag(&[]);
        assert!(!result.flagged);
        assert!(result.categories.iter().all(|flag| flag.severity == Severity::Safe));
    }

    #[test]
    fn later_thresholds_replace_earlier_ones() {
        let policy = ModerationPolicy::new([
            CategoryThreshold::new(ModerationCategory::Hate, Severity::Low),
            CategoryThreshold::new(ModerationCategory::Hate, Severity::High),
        ]);
        assert_eq!(policy.thresholds().len(), 1);
        assert_eq!(policy.threshold(ModerationCategory::Hate), Some(Severity::High));
    }
}
