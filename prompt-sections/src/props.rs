//! Construction-time settings shared by sections.

use serde::{Deserialize, Serialize};

use crate::sizing::Sizing;

/// Sizing, required flag, separator and text prefix of a section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionProps {
    /// Budget policy.
    pub sizing: Sizing,
    /// Whether the section must appear even when it overflows.
    pub required: bool,
    /// Text-mode separator.
    pub separator: String,
    /// Label prepended to the text-mode output.
    pub text_prefix: String,
}

impl SectionProps {
    /// Creates settings with the given separator and prefix, automatic
    /// sizing and the required flag set.
    #[must_use]
    pub fn new(separator: impl Into<String>, text_prefix: impl Into<String>) -> Self {
        Self {
            sizing: Sizing::Auto,
            required: true,
            separator: separator.into(),
            text_prefix: text_prefix.into(),
        }
    }
}

impl Default for SectionProps {
    fn default() -> Self {
        Self::new("\n", "")
    }
}

/// Adds the builder setters every section exposes over its `props` field.
macro_rules! section_props_builders {
    ($ty:ty) => {
        impl $ty {
            /// Sets the sizing policy.
            #[must_use]
            pub fn with_sizing(mut self, sizing: $crate::Sizing) -> Self {
                self.props.sizing = sizing;
                self
            }

            /// Sets whether the section must always appear.
            #[must_use]
            pub fn with_required(mut self, required: bool) -> Self {
                self.props.required = required;
                self
            }

            /// Sets the text-mode separator.
            #[must_use]
            pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
                self.props.separator = separator.into();
                self
            }

            /// Sets the text-mode prefix.
            #[must_use]
            pub fn with_text_prefix(mut self, prefix: impl Into<String>) -> Self {
                self.props.text_prefix = prefix.into();
                self
            }

            /// Returns the section settings.
            #[must_use]
            pub fn props(&self) -> &$crate::SectionProps {
                &self.props
            }
        }
    };
}

pub(crate) use section_props_builders;
