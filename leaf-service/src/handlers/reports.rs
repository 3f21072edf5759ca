use crate::error::LeafError;
use crate::handlers::extract::ApiJson;
use crate::models::{ReportFile, ReportRequest};
use crate::services::metrics::record_report;
use crate::services::report::render_report;
use crate::startup::AppState;
use axum::{extract::State, Json};
use uuid::Uuid;

/// Render the posted analysis to `report-<uuid>.pdf` in the report
/// directory. The file is then served from `/get-report/{file}`.
pub async fn download_report(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ReportRequest>,
) -> Result<Json<ReportFile>, LeafError> {
    let pdf = render_report(&payload)?;

    let file = format!("report-{}.pdf", Uuid::new_v4());
    state.reports.upload(&file, pdf).await?;

    record_report();
    tracing::info!(file = %file, "Report generated");

    Ok(Json(ReportFile { file }))
}
