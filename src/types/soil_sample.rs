//! Soil sample data structures

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Serialize, Serializer};

/// Wire format for `createdAt`: naive ISO-8601 with microseconds and a `Z` marker.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// A persisted soil measurement record
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct SoilSample {
    /// Surrogate key assigned by the store
    pub id: i64,

    /// Potassium, 0..=2000
    pub potassium: f64,

    /// Nitrogen, 0..=500
    pub nitrogen: f64,

    /// Phosphorus, 0..=200
    pub phosphorus: f64,

    /// Soil pH, 0..=14
    #[serde(rename = "pH")]
    pub ph: f64,

    /// Insert time, never updated
    #[serde(rename = "createdAt", serialize_with = "serialize_timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Input for creating a new soil sample record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewSoilSample {
    pub potassium: f64,
    pub nitrogen: f64,
    pub phosphorus: f64,
    pub ph: f64,
}

/// Sparse field-set for partial updates. `None` means "leave unchanged".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SoilSamplePatch {
    pub potassium: Option<f64>,
    pub nitrogen: Option<f64>,
    pub phosphorus: Option<f64>,
    pub ph: Option<f64>,
}

impl SoilSamplePatch {
    /// Merge this patch over an existing record.
    ///
    /// Only `Some` fields overwrite; `id` and `created_at` are always carried over.
    pub fn apply_to(&self, existing: &SoilSample) -> SoilSample {
        SoilSample {
            id: existing.id,
            potassium: self.potassium.unwrap_or(existing.potassium),
            nitrogen: self.nitrogen.unwrap_or(existing.nitrogen),
            phosphorus: self.phosphorus.unwrap_or(existing.phosphorus),
            ph: self.ph.unwrap_or(existing.ph),
            created_at: existing.created_at,
        }
    }

    /// True when the patch would not change anything
    pub fn is_empty(&self) -> bool {
        self.potassium.is_none()
            && self.nitrogen.is_none()
            && self.phosphorus.is_none()
            && self.ph.is_none()
    }
}

/// Current UTC time at the precision the wire format carries
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn serialize_timestamp<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.collect_str(&ts.format(TIMESTAMP_FORMAT))
}
