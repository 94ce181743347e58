//! Errors surfaced by render calls.

use prompt_templates::TemplateError;
use thiserror::Error;

/// Result alias for render operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that abort a render call.
///
/// Running over budget is not an error; it is reported through
/// [`RenderedSection::too_long`](crate::RenderedSection::too_long).
#[derive(Debug, Error)]
pub enum RenderError {
    /// A leaf's content could not be produced.
    #[error("section `{section}` failed to resolve: {source}")]
    TemplateResolution {
        /// Short label identifying the failing section.
        section: String,
        /// Underlying resolver error.
        #[source]
        source: TemplateError,
    },

    /// A token sizing value outside the supported policies.
    #[error("invalid section sizing {tokens}: {reason}")]
    InvalidSizing {
        /// Offending value.
        tokens: f64,
        /// Why it was rejected.
        reason: &'static str,
    },
}

const LABEL_CHARS: usize = 32;

impl RenderError {
    /// Wraps a resolver failure, labelling it with the start of the template.
    #[must_use]
    pub fn template(template: &str, source: TemplateError) -> Self {
        let mut section: String = template.chars().take(LABEL_CHARS).collect();
        if template.chars().count() > LABEL_CHARS {
            section.push_str("...");
        }
        Self::TemplateResolution { section, source }
    }
}
