//! Configuration for prompt rendering.
//!
//! Loaded from TOML with defaults for every field, then overridden from the
//! environment:
//!
//! ```toml
//! max_input_tokens = 4096
//!
//! [tokenizer]
//! encoding = "cl100k_base"
//!
//! [layout]
//! separator = "\n\n"
//!
//! [history]
//! memory_key = "conversation.history"
//!
//! [moderation]
//! target = "both"
//! categories = [{ category = "Hate", severity = 2 }]
//! ```

#![warn(missing_docs, clippy::pedantic)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use prompt_moderation::{
    CategoryThreshold, ModerationCategory, ModerationPolicy, ModerationTarget, Severity,
};
use prompt_sections::history::DEFAULT_HISTORY_KEY;
use prompt_sections::{ConversationHistory, Prompt};
use prompt_tokenizers::{Encoding, Tokenizer, build_tokenizer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Overrides [`PromptConfig::max_input_tokens`].
pub const MAX_INPUT_TOKENS_ENV: &str = "PROMPT_MAX_INPUT_TOKENS";
/// Overrides [`TokenizerConfig::encoding`].
pub const TOKENIZER_ENV: &str = "PROMPT_TOKENIZER";

/// Errors raised while loading or applying configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {reason}")]
    Read {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        reason: String,
    },
    /// The TOML was malformed.
    #[error("failed to parse config: {reason}")]
    Parse {
        /// Parser error.
        reason: String,
    },
    /// A value was out of range.
    #[error("invalid config: {0}")]
    Validation(String),
    /// The configured tokenizer could not be built.
    #[error("failed to build tokenizer: {0}")]
    Tokenizer(#[from] prompt_tokenizers::TokenizerError),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Budget handed to the root prompt.
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
    /// Tokenizer selection.
    #[serde(default)]
    pub tokenizer: TokenizerConfig,
    /// Root layout settings.
    #[serde(default)]
    pub layout: LayoutConfig,
    /// Conversation history settings.
    #[serde(default)]
    pub history: HistoryConfig,
    /// Moderation thresholds.
    #[serde(default)]
    pub moderation: ModerationConfig,
}

fn default_max_input_tokens() -> usize {
    4096
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_input_tokens: default_max_input_tokens(),
            tokenizer: TokenizerConfig::default(),
            layout: LayoutConfig::default(),
            history: HistoryConfig::default(),
            moderation: ModerationConfig::default(),
        }
    }
}

/// Tokenizer selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Encoding used to measure every rendered section.
    #[serde(default)]
    pub encoding: Encoding,
}

/// Root layout settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Separator between top-level sections in text mode.
    #[serde(default = "default_layout_separator")]
    pub separator: String,
}

fn default_layout_separator() -> String {
    "\n\n".to_owned()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            separator: default_layout_separator(),
        }
    }
}

/// Conversation history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Memory key the history is read from.
    #[serde(default = "default_memory_key")]
    pub memory_key: String,
    /// Text-mode prefix for user turns.
    #[serde(default = "default_user_prefix")]
    pub user_prefix: String,
    /// Text-mode prefix for assistant turns.
    #[serde(default = "default_assistant_prefix")]
    pub assistant_prefix: String,
    /// Separator between turns in text mode.
    #[serde(default = "default_history_separator")]
    pub separator: String,
}

fn default_memory_key() -> String {
    DEFAULT_HISTORY_KEY.to_owned()
}

fn default_user_prefix() -> String {
    "user: ".to_owned()
}

fn default_assistant_prefix() -> String {
    "assistant: ".to_owned()
}

fn default_history_separator() -> String {
    "\n".to_owned()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            memory_key: default_memory_key(),
            user_prefix: default_user_prefix(),
            assistant_prefix: default_assistant_prefix(),
            separator: default_history_separator(),
        }
    }
}

/// Moderation settings.
///
/// Severities stay raw until [`PromptConfig::validate`] checks them against
/// the taxonomy, so a bad level is reported as a validation error naming the
/// category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Direction reviewed.
    #[serde(default)]
    pub target: ModerationTarget,
    /// Per-category thresholds; empty means the default policy.
    #[serde(default)]
    pub categories: Vec<ThresholdConfig>,
}

/// One configured threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Category the threshold applies to.
    pub category: ModerationCategory,
    /// Severity level, one of 0, 2, 4, 6.
    pub severity: u8,
}

impl PromptConfig {
    /// Parses configuration from TOML and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Validation`] for out-of-range values.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from `path`, falling back to defaults when the
    /// file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file exists but cannot be read,
    /// plus the errors of [`PromptConfig::from_toml_str`].
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no prompt config found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Loads configuration from `path` and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`PromptConfig::load_from`] and
    /// [`PromptConfig::apply_overrides`].
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies `PROMPT_MAX_INPUT_TOKENS` and `PROMPT_TOKENIZER` as returned
    /// by `lookup`, then re-validates.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when an override cannot be parsed
    /// or leaves the configuration invalid.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> ConfigResult<()> {
        if let Some(value) = lookup(MAX_INPUT_TOKENS_ENV) {
            self.max_input_tokens = value.trim().parse().map_err(|_| {
                ConfigError::Validation(format!(
                    "{MAX_INPUT_TOKENS_ENV} must be a positive integer, got `{value}`"
                ))
            })?;
        }

        if let Some(value) = lookup(TOKENIZER_ENV) {
            self.tokenizer.encoding = value
                .parse()
                .map_err(|err| ConfigError::Validation(format!("{TOKENIZER_ENV}: {err}")))?;
        }

        self.validate()
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a zero budget or a moderation
    /// severity outside 0, 2, 4, 6.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_input_tokens == 0 {
            return Err(ConfigError::Validation(
                "max_input_tokens must be greater than zero".into(),
            ));
        }

        for threshold in &self.moderation.categories {
            Severity::try_from(threshold.severity).map_err(|err| {
                ConfigError::Validation(format!("moderation {}: {err}", threshold.category))
            })?;
        }
        Ok(())
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if serialisation fails.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|err| ConfigError::Parse {
            reason: err.to_string(),
        })
    }

    /// Builds the configured tokenizer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Tokenizer`] when the encoding fails to load.
    pub fn build_tokenizer(&self) -> ConfigResult<Arc<dyn Tokenizer>> {
        Ok(build_tokenizer(self.tokenizer.encoding)?)
    }

    /// An empty root prompt with the configured separator.
    #[must_use]
    pub fn prompt(&self) -> Prompt {
        Prompt::default().with_separator(self.layout.separator.clone())
    }

    /// A history section with the configured key, prefixes and separator.
    #[must_use]
    pub fn conversation_history(&self) -> ConversationHistory {
        ConversationHistory::new(self.history.memory_key.clone())
            .with_user_prefix(self.history.user_prefix.clone())
            .with_assistant_prefix(self.history.assistant_prefix.clone())
            .with_separator(self.history.separator.clone())
    }

    /// The configured moderation policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] for a severity outside the
    /// taxonomy.
    pub fn moderation_policy(&self) -> ConfigResult<ModerationPolicy> {
        if self.moderation.categories.is_empty() {
            return Ok(ModerationPolicy::default());
        }

        let thresholds = self
            .moderation
            .categories
            .iter()
            .map(|threshold| {
                Severity::try_from(threshold.severity)
                    .map(|severity| CategoryThreshold::new(threshold.category, severity))
                    .map_err(|err| ConfigError::Validation(err.to_string()))
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(ModerationPolicy::new(thresholds))
    }
}
