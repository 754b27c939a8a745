//! Request and response bodies for the JSON API.

use serde::{Deserialize, Serialize};
use vitalog_core::{Measurement, TIMESTAMP_FORMAT};

/// A numeric field that clients may send as a JSON number or a string
/// (`7.2` or `"7.2"`). Anything that does not parse is a 400.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
}

impl NumericField {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Number(n) => Some(n),
            Self::Text(ref s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AddMeasurementRequest {
    pub value: NumericField,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddMeasurementResponse {
    pub id: i64,
    pub success: bool,
}

/// One measurement as the list endpoint renders it, with the timestamp
/// additionally split into date and wall-clock fields.
#[derive(Debug, Serialize)]
pub struct MeasurementView {
    pub id: i64,
    pub value: f64,
    pub note: String,
    pub created_at: String,
    pub date: String,
    pub time: String,
}

impl From<Measurement> for MeasurementView {
    fn from(m: Measurement) -> Self {
        Self {
            id: m.id,
            value: m.value,
            created_at: m.created_at.format(TIMESTAMP_FORMAT).to_string(),
            date: m.created_at.format("%Y-%m-%d").to_string(),
            time: m.created_at.format("%H:%M").to_string(),
            note: m.note,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub records: u64,
    pub backend: &'static str,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub backend: vitalog_storage::BackendInfo,
    pub records: u64,
    /// Oldest row's timestamp, absent on an empty store.
    pub first: Option<String>,
    /// Newest row's timestamp, absent on an empty store.
    pub last: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeedResponse {
    pub rows: usize,
    pub success: bool,
}
