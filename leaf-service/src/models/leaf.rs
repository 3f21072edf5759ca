//! Leaf analysis data model: heuristics computed locally and the
//! diagnosis returned by the generative model.

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Plant name reported when neither the model nor the user supplied one.
pub const UNKNOWN_PLANT: &str = "Unknown Plant";

/// Suggestion shown when the model call could not be completed.
pub const FALLBACK_SUGGESTION: &str = "Could not analyze properly.";

/// Longest suggestion kept, in lines.
pub const MAX_SUGGESTION_LINES: usize = 3;

/// Color and shape heuristics for one leaf image, as percentages rounded
/// to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeafMetrics {
    pub yellow_spots: f64,
    pub brown_spots: f64,
    pub solidity: f64,
}

/// Health limits suggested for the identified plant. Limits the model
/// leaves out take their default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub yellow_max: f64,
    pub brown_max: f64,
    pub solidity_min: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            yellow_max: 10.0,
            brown_max: 5.0,
            solidity_min: 85.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub plant: String,
    pub suggestion: String,
    #[serde(default, deserialize_with = "thresholds_or_default")]
    pub thresholds: Thresholds,
}

/// `"thresholds": null` reads as absent.
fn thresholds_or_default<'de, D>(deserializer: D) -> Result<Thresholds, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Thresholds>::deserialize(deserializer)?.unwrap_or_default())
}

impl AnalysisResult {
    /// Static result used when the model cannot be reached or understood.
    pub fn fallback(plant_override: Option<&str>) -> Self {
        Self {
            plant: plant_override.unwrap_or(UNKNOWN_PLANT).to_string(),
            suggestion: FALLBACK_SUGGESTION.to_string(),
            thresholds: Thresholds::default(),
        }
    }

    /// Trims the plant name and caps the suggestion at
    /// [`MAX_SUGGESTION_LINES`] non-empty lines.
    pub fn normalized(mut self) -> Self {
        let plant = self.plant.trim();
        self.plant = if plant.is_empty() {
            UNKNOWN_PLANT.to_string()
        } else {
            plant.to_string()
        };

        self.suggestion = self
            .suggestion
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(MAX_SUGGESTION_LINES)
            .collect::<Vec<_>>()
            .join("\n");

        self
    }
}

/// Where an [`AnalysisResult`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisSource {
    Model,
    Fallback,
}

impl AnalysisSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisSource::Model => "model",
            AnalysisSource::Fallback => "fallback",
        }
    }
}

/// Body of a successful `/analyze` call.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Token to pass to `/correct-plant` for this image.
    pub upload_id: Uuid,
    #[serde(flatten)]
    pub metrics: LeafMetrics,
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub analysis_source: AnalysisSource,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CorrectPlantRequest {
    /// Token from `/analyze`, kept as text so a malformed one is just an
    /// unknown token.
    pub upload_id: Option<String>,
    #[validate(length(max = 100, message = "plant must be at most 100 characters"))]
    pub plant: Option<String>,
    pub yellow_spots: Option<f64>,
    pub brown_spots: Option<f64>,
    pub solidity: Option<f64>,
}

impl CorrectPlantRequest {
    pub fn upload_token(&self) -> Option<Uuid> {
        self.upload_id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id.trim()).ok())
    }

    /// The user-confirmed plant name, if a non-blank one was sent.
    pub fn plant_override(&self) -> Option<&str> {
        self.plant
            .as_deref()
            .map(str::trim)
            .filter(|plant| !plant.is_empty())
    }

    /// Metrics sent by the client, falling back to the ones stored at
    /// upload time field by field.
    pub fn metrics_or(&self, stored: LeafMetrics) -> LeafMetrics {
        LeafMetrics {
            yellow_spots: self.yellow_spots.unwrap_or(stored.yellow_spots),
            brown_spots: self.brown_spots.unwrap_or(stored.brown_spots),
            solidity: self.solidity.unwrap_or(stored.solidity),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CorrectionResponse {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub analysis_source: AnalysisSource,
}
