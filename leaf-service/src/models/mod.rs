pub mod chat;
pub mod leaf;
pub mod report;

pub use chat::{ChatRequest, ChatResponse};
pub use leaf::{
    AnalysisResult, AnalysisSource, AnalyzeResponse, CorrectPlantRequest, CorrectionResponse,
    LeafMetrics, Thresholds, UNKNOWN_PLANT,
};
pub use report::{ReportFile, ReportRequest};
