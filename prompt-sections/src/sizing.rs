//! Token sizing policies for sections.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};

/// How much of its container's budget a section may use.
///
/// The numeric form used in configuration is `-1` for [`Sizing::Auto`], a
/// fraction in `(0, 1)` for [`Sizing::Proportional`], and a value `>= 1` for
/// [`Sizing::Fixed`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub enum Sizing {
    /// Use whatever the container has left.
    #[default]
    Auto,
    /// Reserve this fraction of the container's budget.
    Proportional(f64),
    /// Cap at an absolute token count regardless of container size.
    Fixed(usize),
}

impl Sizing {
    /// Parses the numeric sizing form.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidSizing`] for non-finite values, zero, and
    /// negatives other than `-1`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_tokens(tokens: f64) -> RenderResult<Self> {
        if !tokens.is_finite() {
            return Err(RenderError::InvalidSizing {
                tokens,
                reason: "value must be finite",
            });
        }

        if (tokens + 1.0).abs() < f64::EPSILON {
            Ok(Self::Auto)
        } else if tokens >= 1.0 {
            Ok(Self::Fixed(tokens.floor() as usize))
        } else if tokens > 0.0 {
            Ok(Self::Proportional(tokens))
        } else {
            Err(RenderError::InvalidSizing {
                tokens,
                reason: "expected -1, a fraction in (0, 1), or a count >= 1",
            })
        }
    }

    /// Returns the numeric form of the policy.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn tokens(self) -> f64 {
        match self {
            Self::Auto => -1.0,
            Self::Proportional(fraction) => fraction,
            Self::Fixed(count) => count as f64,
        }
    }

    /// Budget a section actually works with when handed `max_tokens`.
    #[must_use]
    pub fn cap(self, max_tokens: usize) -> usize {
        match self {
            Self::Fixed(count) => count.min(max_tokens),
            _ => max_tokens,
        }
    }

    /// Absolute token limit the section enforces on its own output.
    #[must_use]
    pub const fn hard_limit(self) -> Option<usize> {
        match self {
            Self::Fixed(count) => Some(count),
            _ => None,
        }
    }
}

impl TryFrom<f64> for Sizing {
    type Error = RenderError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::from_tokens(value)
    }
}

impl From<Sizing> for f64 {
    fn from(value: Sizing) -> Self {
        value.tokens()
    }
}

impl fmt::Display for Sizing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => f.write_str("auto"),
            Self::Proportional(fraction) => write!(f, "{:.0}%", fraction * 100.0),
            Self::Fixed(count) => write!(f, "{count} tokens"),
        }
    }
}
