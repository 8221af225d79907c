//! Engine configuration: every weight, threshold and constant the engine uses.
//!
//! The configuration is immutable once built and is passed by reference into
//! the detectors, the aggregator and the score calculator. It can be loaded
//! from YAML; any missing section or field falls back to its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Name-pattern matching
    pub matching: MatchingConfig,

    /// Material classification weights and PBR thresholds
    pub materials: MaterialConfig,

    /// Size variation detection
    pub sizing: SizingConfig,

    /// Confidence aggregation
    pub aggregation: AggregationConfig,

    /// Anomaly detection
    pub anomalies: AnomalyConfig,

    /// Output score formulas
    pub scoring: ScoringConfig,

    /// Manual-validation checklist
    pub checklist: ChecklistConfig,
}

/// Which named entities the pattern matcher scans.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    pub scan_meshes: bool,
    pub scan_materials: bool,
    /// Names shorter than this (after trimming) are ignored
    pub min_name_len: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            scan_meshes: true,
            scan_materials: true,
            min_name_len: 2,
        }
    }
}

/// Material classifier weights and decision thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    /// Share of each non-strongest signal added to a class score
    pub corroboration_weight: f64,
    /// Fraction of the losing class score subtracted from the winner
    pub conflict_penalty: f64,
    /// Confidence of the textile fallback when no signal is decisive
    pub default_textile_confidence: f64,

    /// Substituted when a PBR block omits `roughnessFactor`
    pub default_roughness: f64,
    /// Substituted when a PBR block omits `metallicFactor`
    pub default_metallic: f64,

    pub hardware_metallic: f64,
    pub hardware_confidence: f64,
    pub polished_metallic: f64,
    pub polished_roughness: f64,
    pub polished_confidence: f64,

    pub textile_max_metallic: f64,
    pub rough_roughness: f64,
    pub rough_confidence: f64,
    pub smooth_roughness: f64,
    pub smooth_confidence: f64,
    pub standard_confidence: f64,

    pub diffuse_hint_confidence: f64,
    pub channel_hint_confidence: f64,
    pub base_color_presence_confidence: f64,
    pub normal_presence_confidence: f64,

    pub clo_extension_confidence: f64,
    pub sheen_extension_confidence: f64,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            corroboration_weight: 0.25,
            conflict_penalty: 0.5,
            default_textile_confidence: 0.4,
            default_roughness: 0.5,
            default_metallic: 0.0,
            hardware_metallic: 0.7,
            hardware_confidence: 0.9,
            polished_metallic: 0.5,
            polished_roughness: 0.3,
            polished_confidence: 0.7,
            textile_max_metallic: 0.2,
            rough_roughness: 0.8,
            rough_confidence: 0.7,
            smooth_roughness: 0.3,
            smooth_confidence: 0.6,
            standard_confidence: 0.5,
            diffuse_hint_confidence: 0.7,
            channel_hint_confidence: 0.5,
            base_color_presence_confidence: 0.4,
            normal_presence_confidence: 0.3,
            clo_extension_confidence: 0.95,
            sheen_extension_confidence: 0.6,
        }
    }
}

/// Size variation detection constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizingConfig {
    /// Relative scale difference between siblings that counts as deliberate
    pub scale_delta_threshold: f64,
    /// Multiplier applied when only one detection path supports a candidate
    pub single_path_discount: f64,
    pub geometric_confidence: f64,
    pub explicit_label_confidence: f64,
    pub numeric_label_confidence: f64,
    pub scale_label_confidence: f64,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            scale_delta_threshold: 0.02,
            single_path_discount: 0.8,
            geometric_confidence: 0.7,
            explicit_label_confidence: 0.8,
            numeric_label_confidence: 0.6,
            scale_label_confidence: 0.6,
        }
    }
}

/// Per-category weights of the overall confidence. Must sum to 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub garment_elements: f64,
    pub materials: f64,
    pub size_variations: f64,
    pub accessibility_elements: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self {
            garment_elements: 0.4,
            materials: 0.3,
            size_variations: 0.2,
            accessibility_elements: 0.1,
        }
    }
}

impl CategoryWeights {
    pub fn total(&self) -> f64 {
        self.garment_elements + self.materials + self.size_variations + self.accessibility_elements
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Candidates below this local confidence are discarded before averaging
    pub survivor_threshold: f64,
    pub weights: CategoryWeights,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            survivor_threshold: 0.5,
            weights: CategoryWeights::default(),
        }
    }
}

/// Anomaly flag triggers and their confidence penalties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyConfig {
    /// Lowercase signatures of known fashion-authoring tools
    #[serde(default = "default_fashion_generators")]
    pub fashion_generators: Vec<String>,
    pub generator_penalty: f64,

    /// Detected elements of one kind above `ratio * node_count` are a flood
    pub flood_ratio: f64,
    pub flood_min_elements: usize,
    pub flood_penalty: f64,

    pub min_materials: usize,
    pub max_materials: usize,
    pub material_outlier_penalty: f64,
}

fn default_fashion_generators() -> Vec<String> {
    [
        "clo",
        "clo3d",
        "clo-set",
        "marvelous designer",
        "browzwear",
        "vstitcher",
        "optitex",
        "style3d",
        "tuka3d",
        "fashion",
        "textile",
        "garment",
        "apparel",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for AnomalyConfig {
    fn default() -> Self {
        Self {
            fashion_generators: default_fashion_generators(),
            generator_penalty: 0.10,
            flood_ratio: 0.8,
            flood_min_elements: 5,
            flood_penalty: 0.10,
            min_materials: 1,
            max_materials: 50,
            material_outlier_penalty: 0.05,
        }
    }
}

/// How a raw weighted score becomes an integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Round half away from zero (82.5 becomes 83)
    #[default]
    HalfUp,
    /// Truncate toward negative infinity (82.5 becomes 82)
    Floor,
}

/// Fixed scores used when a document carries no structural evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaselineScores {
    pub inclusivity: u32,
    pub accessibility: u32,
    pub sustainability: u32,
}

impl Default for BaselineScores {
    fn default() -> Self {
        Self {
            inclusivity: 30,
            accessibility: 25,
            sustainability: 35,
        }
    }
}

/// Coefficients of the three output score formulas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub inclusivity_confidence_weight: f64,
    pub inclusivity_per_size_variation: f64,
    pub accessibility_per_feature: f64,
    pub accessibility_confidence_weight: f64,
    pub sustainability_per_material: f64,
    pub sustainability_confidence_weight: f64,
    pub ceiling: u32,
    pub rounding: RoundingMode,
    pub baseline: BaselineScores,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            inclusivity_confidence_weight: 60.0,
            inclusivity_per_size_variation: 10.0,
            accessibility_per_feature: 15.0,
            accessibility_confidence_weight: 40.0,
            sustainability_per_material: 5.0,
            sustainability_confidence_weight: 50.0,
            ceiling: 100,
            rounding: RoundingMode::HalfUp,
            baseline: BaselineScores::default(),
        }
    }
}

/// Checklist thresholds and review-effort estimates (minutes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecklistConfig {
    pub low_confidence_threshold: f64,
    /// Sustainability points from raw material count above which the
    /// material coupling gets its own review item
    pub material_dominance_points: f64,
    pub low_confidence_minutes: u32,
    pub anomaly_minutes: u32,
    pub missing_family_minutes: u32,
    pub coupling_minutes: u32,
    pub confirm_minutes: u32,
    pub baseline_minutes: u32,
}

impl Default for ChecklistConfig {
    fn default() -> Self {
        Self {
            low_confidence_threshold: 0.6,
            material_dominance_points: 50.0,
            low_confidence_minutes: 15,
            anomaly_minutes: 10,
            missing_family_minutes: 10,
            coupling_minutes: 5,
            confirm_minutes: 2,
            baseline_minutes: 45,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Load from `path` when given and present, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                tracing::debug!(path = %p.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse and validate YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let total = self.aggregation.weights.total();
        if (total - 1.0).abs() > 1e-6 {
            return Err(ConfigError::Invalid(format!(
                "aggregation weights must sum to 1.0, got {total:.4}"
            )));
        }

        let unit_values = [
            ("aggregation.survivor_threshold", self.aggregation.survivor_threshold),
            ("checklist.low_confidence_threshold", self.checklist.low_confidence_threshold),
            ("sizing.scale_delta_threshold", self.sizing.scale_delta_threshold),
            ("sizing.single_path_discount", self.sizing.single_path_discount),
            ("materials.default_textile_confidence", self.materials.default_textile_confidence),
            ("materials.corroboration_weight", self.materials.corroboration_weight),
            ("anomalies.generator_penalty", self.anomalies.generator_penalty),
            ("anomalies.flood_penalty", self.anomalies.flood_penalty),
            ("anomalies.material_outlier_penalty", self.anomalies.material_outlier_penalty),
        ];
        for (name, value) in unit_values {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }

        if self.materials.default_textile_confidence > 0.5 {
            return Err(ConfigError::Invalid(
                "materials.default_textile_confidence must not exceed 0.5".to_string(),
            ));
        }

        if self.anomalies.min_materials > self.anomalies.max_materials {
            return Err(ConfigError::Invalid(format!(
                "anomalies.min_materials ({}) exceeds max_materials ({})",
                self.anomalies.min_materials, self.anomalies.max_materials
            )));
        }

        if self.scoring.ceiling == 0 || self.scoring.ceiling > 100 {
            return Err(ConfigError::Invalid(format!(
                "scoring.ceiling must lie in [1, 100], got {}",
                self.scoring.ceiling
            )));
        }

        Ok(())
    }
}
