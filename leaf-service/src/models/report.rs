use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Analysis payload posted to `/download-report`.
///
/// Fields are loose JSON values: clients echo back whatever `/analyze`
/// returned, numbers and strings alike.
#[derive(Debug, Default, Deserialize)]
pub struct ReportRequest {
    pub plant: Option<Value>,
    pub yellow_spots: Option<Value>,
    pub brown_spots: Option<Value>,
    pub solidity: Option<Value>,
    pub suggestion: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportFile {
    pub file: String,
}
