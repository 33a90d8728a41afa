//! The per-user e-bike record and the partial patch submitted by clients.
//!
//! Wire names are camelCase to match the JSON document format the frontend
//! reads and writes.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A quick-add destination preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub mileage: f64,
}

/// The per-user e-bike record, persisted at `ebike:{userId}` with a sliding TTL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EbikeDocument {
    /// Full-charge range in distance units
    pub total_mileage: f64,
    /// Distance traveled since the last full charge; may transiently exceed
    /// `total_mileage` (not clamped)
    pub current_mileage: f64,
    #[serde(default)]
    pub destinations: Vec<Destination>,
    /// Client-local working set, mirrored server-side only incidentally
    #[serde(default)]
    pub selected_destinations: Vec<Destination>,
    /// RFC3339 timestamp of the last full-charge event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_charged: Option<String>,
    /// Per-day accumulated mileage ledger, keyed `YYYY-MM-DD` in the fixed
    /// reference zone. Bounded to the retention window on every write.
    #[serde(default)]
    pub daily_mileage: BTreeMap<String, f64>,
}

impl Default for EbikeDocument {
    /// The document materialized for a user with no persisted record.
    fn default() -> Self {
        Self {
            total_mileage: 60.0,
            current_mileage: 0.0,
            destinations: vec![
                Destination {
                    name: "Home".to_string(),
                    mileage: 7.7,
                },
                Destination {
                    name: "Work".to_string(),
                    mileage: 1.7,
                },
                Destination {
                    name: "Fangzhen".to_string(),
                    mileage: 3.0,
                },
                Destination {
                    name: "LGD".to_string(),
                    mileage: 7.2,
                },
            ],
            selected_destinations: Vec::new(),
            last_charged: None,
            daily_mileage: BTreeMap::new(),
        }
    }
}

/// Partial update submitted by a client.
///
/// The engine only interprets the fields it knows; unknown fields in the body
/// are ignored. Numeric fields are coerced leniently (a non-numeric value is
/// treated as absent) so a sloppy client never fails the whole request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPatch {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub current_mileage: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub total_mileage: Option<f64>,
    #[serde(default)]
    pub destinations: Option<Vec<Destination>>,
    #[serde(default)]
    pub selected_destinations: Option<Vec<Destination>>,
    /// Command sentinel: record a full-charge event. Never stored.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub full_charge: bool,
    /// Caller-supplied day key (`YYYY-MM-DD`) overriding server-side day
    /// computation, for clients in a different zone than the server clock.
    #[serde(default)]
    pub client_date: Option<String>,
}

/// Accept numbers or numeric strings; anything else deserializes to `None`.
///
/// Non-finite values are treated as absent too: `f64::from_str` accepts
/// "NaN" and "inf", but NaN serializes as JSON `null` and would make the
/// persisted record unreadable on the next fetch.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => {
            s.trim().parse().ok().filter(|f: &f64| f.is_finite())
        }
        _ => None,
    })
}

/// JS-style truthiness: `true`, non-zero numbers and non-empty strings
/// (other than `"false"`) all count as set.
fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Bool(b) => b,
        serde_json::Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        serde_json::Value::String(s) => !s.is_empty() && s != "false",
        _ => false,
    })
}
