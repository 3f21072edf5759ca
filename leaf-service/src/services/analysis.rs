//! Plant identification and care suggestions from the vision model.

use crate::error::LeafError;
use crate::models::{AnalysisResult, AnalysisSource, LeafMetrics};
use crate::services::json_extract::extract_json;
use crate::services::providers::{GenerationRequest, GenerativeModel, Part};
use std::sync::Arc;

/// Image handed to the model alongside the prompt.
#[derive(Debug, Clone)]
pub struct LeafImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// What a single analysis attempt produced.
///
/// The failure arm carries the ready-made fallback so callers decide how
/// to surface it instead of the analyzer hiding the error.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Analyzed(AnalysisResult),
    Fallback {
        result: AnalysisResult,
        error: LeafError,
    },
}

impl AnalysisOutcome {
    pub fn source(&self) -> AnalysisSource {
        match self {
            AnalysisOutcome::Analyzed(_) => AnalysisSource::Model,
            AnalysisOutcome::Fallback { .. } => AnalysisSource::Fallback,
        }
    }

    /// Collapse to the result to show the user.
    pub fn into_result(self) -> AnalysisResult {
        match self {
            AnalysisOutcome::Analyzed(result) | AnalysisOutcome::Fallback { result, .. } => result,
        }
    }
}

pub struct LeafAnalyzer {
    provider: Arc<dyn GenerativeModel>,
    model: String,
}

impl LeafAnalyzer {
    pub fn new(provider: Arc<dyn GenerativeModel>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// One model call, no retries. Any provider, parse or empty-reply
    /// failure becomes [`AnalysisOutcome::Fallback`].
    pub async fn analyze(
        &self,
        image: &LeafImage,
        metrics: &LeafMetrics,
        plant_override: Option<&str>,
    ) -> AnalysisOutcome {
        match self.request_analysis(image, metrics, plant_override).await {
            Ok(result) => AnalysisOutcome::Analyzed(result),
            Err(error) => AnalysisOutcome::Fallback {
                result: AnalysisResult::fallback(plant_override),
                error,
            },
        }
    }

    async fn request_analysis(
        &self,
        image: &LeafImage,
        metrics: &LeafMetrics,
        plant_override: Option<&str>,
    ) -> Result<AnalysisResult, LeafError> {
        let request = GenerationRequest {
            model: self.model.clone(),
            parts: vec![
                Part::Text(build_prompt(metrics, plant_override)),
                Part::Image {
                    mime_type: image.mime_type.clone(),
                    data: image.bytes.clone(),
                },
            ],
            json_output: true,
        };

        let response = self.provider.generate(&request).await?;
        let raw = response.text.ok_or(LeafError::EmptyReply)?;

        let result: AnalysisResult = extract_json(&raw)?;
        Ok(result.normalized())
    }
}

pub fn build_prompt(metrics: &LeafMetrics, plant_override: Option<&str>) -> String {
    let plant_info = match plant_override {
        Some(plant) => format!("The user confirms this is a {} leaf.", plant),
        None => "Identify the plant type from the image.".to_string(),
    };

    format!(
        "You are a plant pathology expert.\n\
         {plant_info}\n\
         Leaf stats:\n\
         - Yellow spots: {yellow}%\n\
         - Brown spots: {brown}%\n\
         - Solidity: {solidity}%\n\
         \n\
         Return a JSON object with:\n\
         - plant (string)\n\
         - suggestion (string, max 3 lines)\n\
         - thresholds (object with yellow_max, brown_max, solidity_min)",
        yellow = metrics.yellow_spots,
        brown = metrics.brown_spots,
        solidity = metrics.solidity,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Thresholds, UNKNOWN_PLANT};
    use crate::services::providers::{MockProvider, ProviderError};

    const METRICS: LeafMetrics = LeafMetrics {
        yellow_spots: 12.5,
        brown_spots: 3.25,
        solidity: 88.0,
    };

    fn image() -> LeafImage {
        LeafImage {
            bytes: vec![0xFF, 0xD8, 0xFF],
            mime_type: "image/jpeg".to_string(),
        }
    }

    fn analyzer(provider: Arc<MockProvider>) -> LeafAnalyzer {
        LeafAnalyzer::new(provider, "gemini-2.0-flash")
    }

    #[test]
    fn prompt_asks_for_identification_without_override() {
        let prompt = build_prompt(&METRICS, None);
        assert!(prompt.contains("Identify the plant type from the image."));
        assert!(prompt.contains("- Yellow spots: 12.5%"));
        assert!(prompt.contains("- Brown spots: 3.25%"));
        assert!(prompt.contains("- Solidity: 88%"));
        assert!(prompt.contains("yellow_max, brown_max, solidity_min"));
    }

    #[test]
    fn prompt_carries_confirmed_plant() {
        let prompt = build_prompt(&METRICS, Some("Tomato"));
        assert!(prompt.contains("The user confirms this is a Tomato leaf."));
        assert!(!prompt.contains("Identify the plant"));
    }

    #[tokio::test]
    async fn parses_fenced_model_reply() {
        let provider = Arc::new(MockProvider::replying(
            "```json\n{\"plant\": \"Tomato\", \"suggestion\": \"Remove infected leaves.\", \
             \"thresholds\": {\"yellow_max\": 8, \"brown_max\": 4, \"solidity_min\": 90}}\n```",
        ));

        let outcome = analyzer(provider.clone())
            .analyze(&image(), &METRICS, None)
            .await;

        assert_eq!(outcome.source(), AnalysisSource::Model);
        let result = outcome.into_result();
        assert_eq!(result.plant, "Tomato");
        assert_eq!(result.thresholds.solidity_min, 90.0);

        let requests = provider.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].json_output);
        assert_eq!(requests[0].model, "gemini-2.0-flash");
        assert!(requests[0].parts.iter().any(|part| matches!(
            part,
            Part::Image { mime_type, .. } if mime_type == "image/jpeg"
        )));
    }

    #[tokio::test]
    async fn incomplete_thresholds_keep_model_answer() {
        for reply in [
            r#"{"plant": "Tomato", "suggestion": "ok", "thresholds": {"yellow_max": 8}}"#,
            r#"{"plant": "Tomato", "suggestion": "ok", "thresholds": null}"#,
        ] {
            let provider = Arc::new(MockProvider::replying(reply));
            let outcome = analyzer(provider).analyze(&image(), &METRICS, None).await;

            assert_eq!(outcome.source(), AnalysisSource::Model, "{reply}");
            let result = outcome.into_result();
            assert_eq!(result.plant, "Tomato");
            assert_eq!(result.thresholds.brown_max, 5.0);
            assert_eq!(result.thresholds.solidity_min, 85.0);
        }
    }

    #[tokio::test]
    async fn remote_failure_falls_back_to_unknown_plant() {
        let provider = Arc::new(MockProvider::failing(ProviderError::NetworkError(
            "connection reset".to_string(),
        )));

        let outcome = analyzer(provider).analyze(&image(), &METRICS, None).await;

        let AnalysisOutcome::Fallback { result, error } = outcome else {
            panic!("expected fallback");
        };
        assert!(matches!(error, LeafError::RemoteApi(_)));
        assert_eq!(result.plant, UNKNOWN_PLANT);
        assert_eq!(result.suggestion, "Could not analyze properly.");
        assert_eq!(
            result.thresholds,
            Thresholds {
                yellow_max: 10.0,
                brown_max: 5.0,
                solidity_min: 85.0
            }
        );
    }

    #[tokio::test]
    async fn fallback_keeps_confirmed_plant() {
        let provider = Arc::new(MockProvider::failing(ProviderError::RateLimited));
        let outcome = analyzer(provider)
            .analyze(&image(), &METRICS, Some("Mango"))
            .await;

        assert_eq!(outcome.source(), AnalysisSource::Fallback);
        assert_eq!(outcome.into_result().plant, "Mango");
    }

    #[tokio::test]
    async fn unparsable_reply_falls_back_with_parse_error() {
        let provider = Arc::new(MockProvider::replying("Sorry, I cannot help with that."));
        let outcome = analyzer(provider).analyze(&image(), &METRICS, None).await;

        assert!(matches!(
            outcome,
            AnalysisOutcome::Fallback {
                error: LeafError::Parse(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_reply_falls_back() {
        let provider = Arc::new(MockProvider::empty());
        let outcome = analyzer(provider).analyze(&image(), &METRICS, None).await;

        assert!(matches!(
            outcome,
            AnalysisOutcome::Fallback {
                error: LeafError::EmptyReply,
                ..
            }
        ));
    }
}
