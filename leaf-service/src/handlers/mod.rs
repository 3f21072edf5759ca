pub mod analysis;
pub mod chat;
pub mod extract;
pub mod health;
pub mod pages;
pub mod reports;

pub use analysis::{analyze, correct_plant};
pub use chat::ask;
pub use health::{health_check, metrics, readiness_check};
pub use reports::download_report;
