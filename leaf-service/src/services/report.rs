//! Single-page PDF summary of a leaf analysis.

use crate::error::LeafError;
use crate::models::ReportRequest;
use printpdf::{BuiltinFont, Mm, PdfDocument, Pt};
use serde_json::Value;
use service_core::error::AppError;

const PAGE_WIDTH: Mm = Mm(210.0);
const PAGE_HEIGHT: Mm = Mm(297.0);
const FONT_SIZE: f32 = 12.0;
const LEFT_MARGIN: Pt = Pt(100.0);
/// Baselines from the bottom of the page, one per line.
const BASELINES: [f32; 6] = [800.0, 770.0, 750.0, 730.0, 710.0, 690.0];

pub const REPORT_TITLE: &str = "Leaf Analysis Report";

/// Text lines of the report, top to bottom.
///
/// Fails with [`LeafError::MissingField`] on the first absent or null
/// field, in display order.
pub fn report_lines(request: &ReportRequest) -> Result<[String; 6], LeafError> {
    let plant = field(&request.plant, "plant")?;
    let yellow = field(&request.yellow_spots, "yellow_spots")?;
    let brown = field(&request.brown_spots, "brown_spots")?;
    let solidity = field(&request.solidity, "solidity")?;
    let suggestion = field(&request.suggestion, "suggestion")?;

    Ok([
        REPORT_TITLE.to_string(),
        format!("Plant: {}", plant),
        format!("Yellow spots: {}%", yellow),
        format!("Brown spots: {}%", brown),
        format!("Solidity: {}%", solidity),
        format!("Suggestion: {}", suggestion),
    ])
}

/// Render the report as PDF bytes.
pub fn render_report(request: &ReportRequest) -> Result<Vec<u8>, LeafError> {
    let lines = report_lines(request)?;

    let (doc, page, layer) = PdfDocument::new(REPORT_TITLE, PAGE_WIDTH, PAGE_HEIGHT, "text");
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(pdf_error)?;
    let canvas = doc.get_page(page).get_layer(layer);

    for (line, baseline) in lines.iter().zip(BASELINES) {
        canvas.use_text(
            line.as_str(),
            FONT_SIZE,
            Mm::from(LEFT_MARGIN),
            Mm::from(Pt(baseline)),
            &font,
        );
    }

    doc.save_to_bytes().map_err(pdf_error)
}

/// Display form of a loose JSON value: strings unquoted, everything on one
/// line.
fn field(value: &Option<Value>, name: &'static str) -> Result<String, LeafError> {
    let text = match value {
        None | Some(Value::Null) => return Err(LeafError::MissingField(name)),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    Ok(text.replace("\r\n", " ").replace(['\n', '\r'], " "))
}

fn pdf_error(err: impl std::fmt::Display) -> LeafError {
    AppError::InternalError(anyhow::anyhow!("PDF rendering failed: {}", err)).into()
}
