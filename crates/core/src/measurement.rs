//! Measurement domain types and timestamp handling.

use chrono::{Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::constants::TIMESTAMP_FORMAT;

/// One stored health measurement.
///
/// Rows are immutable once created; ids are assigned by the store and never
/// reused. Listing order is `created_at` descending (ties broken by id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: i64,
    pub value: f64,
    #[serde(default)]
    pub note: String,
    #[serde(with = "timestamp")]
    pub created_at: NaiveDateTime,
}

impl Measurement {
    /// Strips the id for serialization into a backup artifact.
    #[must_use]
    pub fn to_record(&self) -> MeasurementRecord {
        MeasurementRecord {
            value: self.value,
            note: self.note.clone(),
            created_at: self.created_at,
        }
    }
}

/// One row of a structured backup artifact.
///
/// Timestamps that fail to parse degrade to the current time instead of
/// failing the whole restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub value: f64,
    #[serde(default)]
    pub note: String,
    #[serde(with = "timestamp::lenient", default = "now")]
    pub created_at: NaiveDateTime,
}

/// Current local wall-clock time, truncated to whole seconds so that values
/// survive a round trip through [`TIMESTAMP_FORMAT`].
#[must_use]
pub fn now() -> NaiveDateTime {
    let t = Local::now().naive_local();
    t.with_nanosecond(0).unwrap_or(t)
}

/// Best-effort timestamp parsing.
///
/// Accepts the canonical storage format, an ISO-8601 `T` separator, and
/// strings with trailing fractional seconds (only the first 19 chars count).
#[must_use]
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(t) = NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT) {
        return Some(t);
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(t);
    }
    let head = s.get(..19)?;
    NaiveDateTime::parse_from_str(head, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

/// Serde adapter writing timestamps as `YYYY-MM-DD HH:MM:SS`.
pub mod timestamp {
    use chrono::NaiveDateTime;
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};

    use crate::constants::TIMESTAMP_FORMAT;

    pub fn serialize<S: Serializer>(t: &NaiveDateTime, ser: S) -> Result<S::Ok, S::Error> {
        ser.collect_str(&t.format(TIMESTAMP_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<NaiveDateTime, D::Error> {
        let s = String::deserialize(de)?;
        super::parse_timestamp(&s)
            .ok_or_else(|| D::Error::custom(format!("invalid timestamp: {s}")))
    }

    /// Like the parent module, but unparseable input degrades to "now".
    pub mod lenient {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        pub use super::serialize;

        pub fn deserialize<'de, D: Deserializer<'de>>(
            de: D,
        ) -> Result<NaiveDateTime, D::Error> {
            let s = String::deserialize(de)?;
            Ok(crate::parse_timestamp(&s).unwrap_or_else(|| {
                tracing::warn!(value = %s, "unparseable timestamp in artifact, using now");
                crate::now()
            }))
        }
    }
}
