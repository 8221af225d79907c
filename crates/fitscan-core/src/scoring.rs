//! Inclusivity, accessibility and sustainability scores.
//!
//! Every number that enters a formula is kept in the [`ScoreBreakdown`] so a
//! caller can reproduce the arithmetic term by term.

use serde::{Deserialize, Serialize};

use crate::config::{RoundingMode, ScoringConfig};
use crate::scene::UnsupportedReason;

/// Guards `floor` against representation error (0.55 * 60 = 33.000000000000004).
const ROUNDING_EPSILON: f64 = 1e-9;

/// Inputs of the weighted formulas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInputs {
    pub overall_confidence: f64,
    pub size_variation_count: usize,
    pub accessibility_feature_count: usize,
    pub material_count: usize,
}

/// `input * coefficient = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTerm {
    pub label: String,
    pub input: f64,
    pub coefficient: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub score: u32,
    /// Sum of the terms before rounding and clamping
    pub raw: f64,
    /// Raw value exceeded the ceiling
    pub clamped: bool,
    pub terms: Vec<ScoreTerm>,
}

impl ScoreComponent {
    fn fixed(score: u32) -> Self {
        Self {
            score,
            raw: f64::from(score),
            clamped: false,
            terms: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScoreBasis {
    /// Weighted formulas over detected evidence
    Weighted { rounding: RoundingMode, ceiling: u32 },
    /// Fixed scores; the document carried no usable structure
    Baseline { reason: UnsupportedReason },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub basis: ScoreBasis,
    /// Absent on the baseline path
    pub inputs: Option<ScoreInputs>,
    pub inclusivity: ScoreComponent,
    pub accessibility: ScoreComponent,
    pub sustainability: ScoreComponent,
}

impl ScoreBreakdown {
    pub fn is_baseline(&self) -> bool {
        matches!(self.basis, ScoreBasis::Baseline { .. })
    }

    /// `(inclusivity, accessibility, sustainability)`
    pub fn scores(&self) -> (u32, u32, u32) {
        (
            self.inclusivity.score,
            self.accessibility.score,
            self.sustainability.score,
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScoreCalculator {
    config: ScoringConfig,
}

impl ScoreCalculator {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    pub fn calculate(&self, inputs: ScoreInputs) -> ScoreBreakdown {
        let cfg = &self.config;
        let c = inputs.overall_confidence.clamp(0.0, 1.0);

        let inclusivity = self.component(vec![
            term("overall confidence", c, cfg.inclusivity_confidence_weight),
            term(
                "size variations",
                inputs.size_variation_count as f64,
                cfg.inclusivity_per_size_variation,
            ),
        ]);
        let accessibility = self.component(vec![
            term(
                "accessibility features",
                inputs.accessibility_feature_count as f64,
                cfg.accessibility_per_feature,
            ),
            term("overall confidence", c, cfg.accessibility_confidence_weight),
        ]);
        let sustainability = self.component(vec![
            term(
                "materials",
                inputs.material_count as f64,
                cfg.sustainability_per_material,
            ),
            term("overall confidence", c, cfg.sustainability_confidence_weight),
        ]);

        ScoreBreakdown {
            basis: ScoreBasis::Weighted {
                rounding: cfg.rounding,
                ceiling: cfg.ceiling,
            },
            inputs: Some(ScoreInputs {
                overall_confidence: c,
                ..inputs
            }),
            inclusivity,
            accessibility,
            sustainability,
        }
    }

    /// Fixed low scores for documents without derivable structure.
    pub fn baseline(&self, reason: UnsupportedReason) -> ScoreBreakdown {
        let baseline = self.config.baseline;
        ScoreBreakdown {
            basis: ScoreBasis::Baseline { reason },
            inputs: None,
            inclusivity: ScoreComponent::fixed(baseline.inclusivity),
            accessibility: ScoreComponent::fixed(baseline.accessibility),
            sustainability: ScoreComponent::fixed(baseline.sustainability),
        }
    }

    fn component(&self, terms: Vec<ScoreTerm>) -> ScoreComponent {
        let raw: f64 = terms.iter().map(|t| t.value).sum();
        let rounded = round(raw, self.config.rounding).max(0.0);
        let ceiling = f64::from(self.config.ceiling);
        ScoreComponent {
            score: rounded.min(ceiling) as u32,
            raw,
            clamped: rounded > ceiling,
            terms,
        }
    }
}

fn term(label: &str, input: f64, coefficient: f64) -> ScoreTerm {
    ScoreTerm {
        label: label.to_string(),
        input,
        coefficient,
        value: input * coefficient,
    }
}

fn round(raw: f64, mode: RoundingMode) -> f64 {
    match mode {
        RoundingMode::HalfUp => (raw + 0.5 + ROUNDING_EPSILON).floor(),
        RoundingMode::Floor => (raw + ROUNDING_EPSILON).floor(),
    }
}
