use crate::error::LeafError;
use crate::models::{
    AnalysisResult, AnalysisSource, AnalyzeResponse, CorrectPlantRequest, CorrectionResponse,
};
use crate::services::heuristics;
use crate::services::metrics::record_analysis;
use crate::services::{AnalysisOutcome, LeafImage, UploadRecord};
use crate::startup::AppState;
use crate::handlers::extract::ApiJson;
use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

const FILE_FIELD: &str = "file";

pub async fn analyze(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, LeafError> {
    let mut multipart = multipart?;
    let bytes = read_file_field(&mut multipart).await?;

    let (bytes, metrics) = tokio::task::spawn_blocking(move || {
        let metrics = heuristics::extract_metrics(&bytes);
        (bytes, metrics)
    })
    .await
    .map_err(|e| AppError::InternalError(anyhow::anyhow!("Heuristics task failed: {}", e)))?;
    let metrics = metrics?;

    let (mime_type, extension) = heuristics::image_kind(&bytes);
    let upload_id = Uuid::new_v4();
    let storage_key = format!("{}.{}", upload_id, extension);

    state.uploads.upload(&storage_key, bytes.clone()).await?;
    state.registry.register(
        upload_id,
        UploadRecord {
            storage_key: storage_key.clone(),
            mime_type: mime_type.to_string(),
            metrics,
        },
    );

    tracing::info!(
        %upload_id,
        storage_key = %storage_key,
        mime_type,
        size = bytes.len(),
        yellow_spots = metrics.yellow_spots,
        brown_spots = metrics.brown_spots,
        solidity = metrics.solidity,
        registered = state.registry.len(),
        "Leaf image stored"
    );

    let image = LeafImage {
        bytes,
        mime_type: mime_type.to_string(),
    };
    let outcome = state.analyzer.analyze(&image, &metrics, None).await;
    let (analysis, analysis_source) = resolve("analyze", outcome);

    Ok(Json(AnalyzeResponse {
        upload_id,
        metrics,
        analysis,
        analysis_source,
    }))
}

pub async fn correct_plant(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CorrectPlantRequest>,
) -> Result<Json<CorrectionResponse>, LeafError> {
    payload.validate()?;

    let upload_id = payload.upload_token().ok_or(LeafError::MissingState)?;
    let record = state
        .registry
        .get(&upload_id)
        .ok_or(LeafError::MissingState)?;

    let bytes = state
        .uploads
        .download(&record.storage_key)
        .await
        .map_err(|e| {
            tracing::warn!(%upload_id, error = %e, "Stored upload is no longer readable");
            LeafError::MissingState
        })?;

    let metrics = payload.metrics_or(record.metrics);
    let image = LeafImage {
        bytes,
        mime_type: record.mime_type,
    };

    let outcome = state
        .analyzer
        .analyze(&image, &metrics, payload.plant_override())
        .await;
    let (analysis, analysis_source) = resolve("correct_plant", outcome);

    Ok(Json(CorrectionResponse {
        analysis,
        analysis_source,
    }))
}

/// Bytes of the first multipart field named `file`; other fields are skipped.
async fn read_file_field(multipart: &mut Multipart) -> Result<Vec<u8>, LeafError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| LeafError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| LeafError::BadRequest(format!("Failed to read file bytes: {}", e)))?;
        return Ok(data.to_vec());
    }

    Err(LeafError::BadRequest("No file uploaded".to_string()))
}

fn resolve(endpoint: &'static str, outcome: AnalysisOutcome) -> (AnalysisResult, AnalysisSource) {
    let source = outcome.source();
    if let AnalysisOutcome::Fallback { error, .. } = &outcome {
        tracing::warn!(
            endpoint,
            code = error.code(),
            error = %error,
            "Model analysis failed, returning fallback"
        );
    }
    record_analysis(endpoint, source);
    (outcome.into_result(), source)
}
