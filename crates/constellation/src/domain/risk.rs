//! Risk scoring attached to configuration items.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Inclusive bounds for every likelihood and impact score.
pub const RISK_SCORE_RANGE: (u8, u8) = (1, 5);

/// Likelihood and impact of the risk a CI carries, with optional residual
/// scores after mitigation.
///
/// Scores are on a 1-5 scale; the overall score is their product (1-25).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// How likely the risk is to materialise.
    pub likelihood: u8,

    /// How severe the consequences are.
    pub impact: u8,

    /// Likelihood after controls are applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_likelihood: Option<u8>,

    /// Impact after controls are applied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_impact: Option<u8>,
}

impl RiskAssessment {
    /// An inherent-only assessment.
    #[must_use]
    pub const fn new(likelihood: u8, impact: u8) -> Self {
        Self {
            likelihood,
            impact,
            residual_likelihood: None,
            residual_impact: None,
        }
    }

    /// Inherent risk score, `likelihood * impact`.
    #[must_use]
    pub fn score(&self) -> u16 {
        u16::from(self.likelihood) * u16::from(self.impact)
    }

    /// Residual score, once both residual values are known.
    #[must_use]
    pub fn residual_score(&self) -> Option<u16> {
        Some(u16::from(self.residual_likelihood?) * u16::from(self.residual_impact?))
    }

    /// Check every supplied score is within [`RISK_SCORE_RANGE`].
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ScoreOutOfRange`] for the first bad score.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_score("likelihood", self.likelihood)?;
        check_score("impact", self.impact)?;
        if let Some(value) = self.residual_likelihood {
            check_score("residual_likelihood", value)?;
        }
        if let Some(value) = self.residual_impact {
            check_score("residual_impact", value)?;
        }
        Ok(())
    }
}

fn check_score(field: &'static str, value: u8) -> Result<(), ValidationError> {
    let (min, max) = RISK_SCORE_RANGE;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::ScoreOutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
