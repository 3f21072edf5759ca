pub mod analysis;
pub mod chat;
pub mod heuristics;
pub mod json_extract;
pub mod metrics;
pub mod providers;
pub mod report;
pub mod storage;
pub mod uploads;

pub use analysis::{AnalysisOutcome, LeafAnalyzer, LeafImage};
pub use chat::ChatRelay;
pub use storage::{LocalStorage, Storage};
pub use uploads::{UploadRecord, UploadRegistry};
