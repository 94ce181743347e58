//! Moderators that review input and output text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::category::{ModerationCategory, Severity};
use crate::policy::{ModerationPolicy, ModerationResult};

/// Errors surfaced while reviewing content.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// The analysis service failed.
    #[error("content analysis failed: {reason}")]
    Analyzer {
        /// Human-readable explanation for logging and operators.
        reason: String,
    },
    /// Severity outside the 0/2/4/6 taxonomy.
    #[error("severity {0} is not one of 0, 2, 4, 6")]
    InvalidSeverity(u8),
    /// Category name not recognised.
    #[error("unknown moderation category `{0}`")]
    UnknownCategory(String),
}

impl ModerationError {
    /// Wraps an analyser failure.
    #[must_use]
    pub fn analyzer(reason: impl Into<String>) -> Self {
        Self::Analyzer {
            reason: reason.into(),
        }
    }
}

/// Result alias for moderation operations.
pub type ReviewResult<T> = Result<T, ModerationError>;

/// Severity the analyser assigned to one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAnalysis {
    /// Category analysed.
    pub category: ModerationCategory,
    /// Severity found.
    pub severity: Severity,
}

impl CategoryAnalysis {
    /// Creates an analysis entry.
    #[must_use]
    pub const fn new(category: ModerationCategory, severity: Severity) -> Self {
        Self { category, severity }
    }
}

/// Scoring service that grades text per category.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    /// Analyses `text`.
    async fn analyze(&self, text: &str) -> ReviewResult<Vec<CategoryAnalysis>>;
}

/// Which side of the exchange a moderator reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationTarget {
    /// User input only.
    Input,
    /// Model output only.
    Output,
    /// Both directions.
    #[default]
    Both,
}

impl ModerationTarget {
    /// Returns true when input is reviewed.
    #[must_use]
    pub const fn reviews_input(self) -> bool {
        matches!(self, Self::Input | Self::Both)
    }

    /// Returns true when output is reviewed.
    #[must_use]
    pub const fn reviews_output(self) -> bool {
        matches!(self, Self::Output | Self::Both)
    }
}

/// Action requested when content is flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    /// The input was flagged.
    FlaggedInput,
    /// The output was flagged.
    FlaggedOutput,
}

/// Flagged content together with the action to dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    /// Action to dispatch.
    pub action: ModerationAction,
    /// Per-category detail.
    pub result: ModerationResult,
}

/// Reviews text before it reaches the model and after it leaves it.
///
/// `None` means the text may proceed.
#[async_trait]
pub trait Moderator: Send + Sync {
    /// Reviews user input, typically the rendered prompt.
    async fn review_input(&self, text: &str) -> ReviewResult<Option<ModerationVerdict>>;

    /// Reviews model output.
    async fn review_output(&self, text: &str) -> ReviewResult<Option<ModerationVerdict>>;
}

/// Moderator that grades text with an analyser and flags it with a policy.
#[derive(Debug, Clone)]
pub struct PolicyModerator<A> {
    analyzer: A,
    policy: ModerationPolicy,
    target: ModerationTarget,
}

impl<A: ContentAnalyzer> PolicyModerator<A> {
    /// Creates a moderator reviewing both directions with the default policy.
    #[must_use]
    pub fn new(analyzer: A) -> Self {
        Self {
            analyzer,
            policy: ModerationPolicy::default(),
            target: ModerationTarget::Both,
        }
    }

    /// Replaces the policy.
    #[must_use]
    pub fn with_policy(mut self, policy: ModerationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets which direction is reviewed.
    #[must_use]
    pub fn with_target(mut self, target: ModerationTarget) -> Self {
        self.target = target;
        self
    }

    /// Returns the policy.
    #[must_use]
    pub fn policy(&self) -> &ModerationPolicy {
        &self.policy
    }

    /// Returns the target.
    #[must_use]
    pub const fn target(&self) -> ModerationTarget {
        self.target
    }

    async fn review(
        &self,
        text: &str,
        action: ModerationAction,
    ) -> ReviewResult<Option<ModerationVerdict>> {
        let analysis = self.analyzer.analyze(text).await.inspect_err(|err| {
            warn!(?action, error = %err, "content analysis failed");
        })?;
        let result = self.policy.flag(&analysis);
        if !result.flagged {
            return Ok(None);
        }

        debug!(
            ?action,
            categories = ?result.flagged_categories().collect::<Vec<_>>(),
            "content flagged"
        );
        Ok(Some(ModerationVerdict { action, result }))
    }
}

#[async_trait]
impl<A: ContentAnalyzer> Moderator for PolicyModerator<A> {
    async fn review_input(&self, text: &str) -> ReviewResult<Option<ModerationVerdict>> {
        if !self.target.reviews_input() {
            return Ok(None);
        }
        self.review(text, ModerationAction::FlaggedInput).await
    }

    async fn review_output(&self, text: &str) -> ReviewResult<Option<ModerationVerdict>> {
        if !self.target.reviews_output() {
            return Ok(None);
        }
        self.review(text, ModerationAction::FlaggedOutput).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Grades text by counting occurrences of a keyword.
    struct KeywordAnalyzer {
        keyword: &'static str,
        category: ModerationCategory,
        calls: AtomicUsize,
    }

    impl KeywordAnalyzer {
        fn new(keyword: &'static str, category: ModerationCategory) -> Self {
            Self {
                keyword,
                category,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContentAnalyzer for KeywordAnalyzer {
        async fn analyze(&self, text: &str) -> ReviewResult<Vec<CategoryAnalysis>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let hits = text.matches(self.keyword).count();
            let level = u8::try_from(hits * 2).unwrap_or(u8::MAX);
            Ok(vec![CategoryAnalysis::new(
                self.category,
                Severity::round_down(level),
            )])
        }
    }

    struct FailingAnalyzer;

    #[async_trait]
    impl ContentAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _text: &str) -> ReviewResult<Vec<CategoryAnalysis>> {
            Err(ModerationError::analyzer("service unavailable"))
        }
    }

    #[tokio::test]
    async fn flags_input_reaching_the_threshold() {
        let moderator = PolicyModerator::new(KeywordAnalyzer::new("hate", ModerationCategory::Hate))
            .with_policy(ModerationPolicy::default().with_threshold(ModerationCategory::Hate, Severity::Medium));

        let verdict = moderator
            .review_input("hate, hate, hate")
            .await
            .unwrap()
            .expect("flagged");
        assert_eq!(verdict.action, ModerationAction::FlaggedInput);
        assert_eq!(
            verdict.result.category(ModerationCategory::Hate).unwrap().severity,
            Severity::High
        );

        assert!(moderator.review_input("hate").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn flags_output_with_output_action() {
        let moderator = PolicyModerator::new(KeywordAnalyzer::new("hit", ModerationCategory::Violence));

        let verdict = moderator.review_output("hit").await.unwrap().expect("flagged");
        assert_eq!(verdict.action, ModerationAction::FlaggedOutput);
    }

    #[tokio::test]
    async fn text_outside_the_target_is_not_analysed() {
        let moderator = PolicyModerator::new(KeywordAnalyzer::new("hit", ModerationCategory::Violence))
            .with_target(ModerationTarget::Input);

        assert!(moderator.review_output("hit hit hit").await.unwrap().is_none());
        assert_eq!(moderator.analyzer.calls.load(Ordering::SeqCst), 0);
        assert!(moderator.review_input("hit hit hit").await.unwrap().is_some());
        assert_eq!(moderator.analyzer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn analyser_failures_propagate() {
        let moderator = PolicyModerator::new(FailingAnalyzer);

        let err = moderator.review_input("anything").await.unwrap_err();
        assert!(matches!(err, ModerationError::Analyzer { .. }));
    }
}
