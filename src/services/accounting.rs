// SPDX-License-Identifier: MIT

//! Mileage accounting engine.
//!
//! Every data-save request re-derives the full document from the prior
//! persisted version (or defaults) plus the incoming partial patch: merge,
//! full-charge handling, day-bucketed ledger accumulation, and retention
//! pruning. The engine is pure given its inputs - the request clock and the
//! optional client-supplied day key are parameters, never ambient state - so
//! tests can pin time exactly.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

use crate::models::{DocumentPatch, EbikeDocument};
use crate::time_utils::{
    day_in_offset, day_key, format_utc_rfc3339, parse_day_key, retention_cutoff,
};

/// Applies patches to e-bike documents and maintains the daily ledger.
#[derive(Debug, Clone)]
pub struct AccountingEngine {
    /// Fixed reference zone for day bucketing
    offset: FixedOffset,
    /// Ledger retention window in calendar months
    retention_months: u32,
}

impl AccountingEngine {
    /// Create an engine bucketing days at the given UTC offset (hours east).
    pub fn new(utc_offset_hours: i32, retention_months: u32) -> Self {
        let offset = FixedOffset::east_opt(utc_offset_hours.clamp(-23, 23) * 3600)
            .expect("clamped offset is always valid");
        Self {
            offset,
            retention_months,
        }
    }

    /// Derive the next document from the previous one (or defaults) and a patch.
    ///
    /// `reference` is the wall-clock time of the request; `client_date`
    /// overrides server-side day computation when the client supplied one.
    /// The caller persists the result with a refreshed TTL.
    pub fn apply(
        &self,
        previous: Option<EbikeDocument>,
        patch: &DocumentPatch,
        reference: DateTime<Utc>,
        client_date: Option<NaiveDate>,
    ) -> EbikeDocument {
        let mut next = previous.unwrap_or_default();
        let prior_current = next.current_mileage;

        // Delta comes from the raw patch value (falling back to the prior
        // reading), before any full-charge reset touches the merged document.
        let patched_current = patch.current_mileage.unwrap_or(prior_current);
        let delta = patched_current - prior_current;

        // Shallow merge: fields present in the patch replace prior values.
        if let Some(v) = patch.current_mileage {
            next.current_mileage = v;
        }
        if let Some(v) = patch.total_mileage {
            next.total_mileage = v;
        }
        if let Some(v) = &patch.destinations {
            next.destinations = v.clone();
        }
        if let Some(v) = &patch.selected_destinations {
            next.selected_destinations = v.clone();
        }

        // A full charge is a command, not stored state: stamp the event and
        // zero the odometer unless the patch carried its own reading.
        if patch.full_charge {
            next.last_charged = Some(format_utc_rfc3339(reference));
            if patch.current_mileage.is_none() {
                next.current_mileage = 0.0;
            }
        }

        let today = client_date.unwrap_or_else(|| day_in_offset(reference, self.offset));
        let today_key = day_key(today);

        // Positive deltas accumulate; a reset still marks the day as touched
        // at 0 without ever decrementing an existing bucket.
        if delta > 0.0 {
            *next.daily_mileage.entry(today_key).or_insert(0.0) += delta;
        } else {
            next.daily_mileage.entry(today_key).or_insert(0.0);
        }

        self.prune_ledger(&mut next, today);

        next
    }

    /// Remove ledger entries strictly older than the retention cutoff.
    ///
    /// An entry dated exactly at the cutoff is kept. Malformed keys are
    /// dropped rather than failing the whole update.
    fn prune_ledger(&self, doc: &mut EbikeDocument, today: NaiveDate) {
        let cutoff = retention_cutoff(today, self.retention_months);

        doc.daily_mileage.retain(|key, _| match parse_day_key(key) {
            Some(day) => day >= cutoff,
            None => {
                tracing::warn!(key = %key, "Dropping ledger entry with malformed day key");
                false
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn engine() -> AccountingEngine {
        AccountingEngine::new(8, 6)
    }

    /// 2024-01-01 02:00 UTC = 2024-01-01 10:00 in UTC+8
    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap()
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn patch_json(body: &str) -> DocumentPatch {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_absent_previous_empty_patch_yields_defaults_plus_today() {
        let result = engine().apply(None, &DocumentPatch::default(), reference(), None);

        let mut expected = EbikeDocument::default();
        // Today is still marked as touched, at 0
        expected.daily_mileage.insert("2024-01-01".to_string(), 0.0);
        assert_eq!(result, expected);
    }

    #[test]
    fn test_deterministic() {
        let prev = engine().apply(None, &patch_json(r#"{"currentMileage": 5}"#), reference(), None);
        let patch = patch_json(r#"{"currentMileage": 9.5, "totalMileage": 55}"#);

        let a = engine().apply(Some(prev.clone()), &patch, reference(), None);
        let b = engine().apply(Some(prev), &patch, reference(), None);

        assert_eq!(a, b);
    }

    #[test]
    fn test_positive_delta_accumulates_into_existing_bucket() {
        // prev current=10, ledger {2024-01-01: 5}, patch current=15,
        // same day -> bucket becomes 10
        let mut prev = EbikeDocument {
            current_mileage: 10.0,
            ..Default::default()
        };
        prev.daily_mileage.insert("2024-01-01".to_string(), 5.0);

        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"currentMileage": 15}"#),
            reference(),
            None,
        );

        assert_eq!(result.current_mileage, 15.0);
        assert_eq!(result.daily_mileage.get("2024-01-01"), Some(&10.0));
    }

    #[test]
    fn test_positive_delta_creates_bucket() {
        let prev = EbikeDocument {
            current_mileage: 3.0,
            ..Default::default()
        };

        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"currentMileage": 7.5}"#),
            reference(),
            None,
        );

        assert_eq!(result.daily_mileage.get("2024-01-01"), Some(&4.5));
    }

    #[test]
    fn test_reset_records_zero_without_decrementing() {
        let mut prev = EbikeDocument {
            current_mileage: 20.0,
            ..Default::default()
        };
        prev.daily_mileage.insert("2024-01-01".to_string(), 12.0);

        // Mileage reset: negative delta must not touch the existing bucket
        let result = engine().apply(
            Some(prev.clone()),
            &patch_json(r#"{"currentMileage": 0}"#),
            reference(),
            None,
        );
        assert_eq!(result.daily_mileage.get("2024-01-01"), Some(&12.0));

        // Same reset on a day with no bucket yet records 0, not a negative
        prev.daily_mileage.clear();
        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"currentMileage": 0}"#),
            reference(),
            None,
        );
        assert_eq!(result.daily_mileage.get("2024-01-01"), Some(&0.0));
    }

    #[test]
    fn test_no_op_patch_leaves_existing_bucket_unchanged() {
        let mut prev = EbikeDocument {
            current_mileage: 10.0,
            ..Default::default()
        };
        prev.daily_mileage.insert("2024-01-01".to_string(), 5.0);

        let result = engine().apply(Some(prev), &DocumentPatch::default(), reference(), None);

        assert_eq!(result.current_mileage, 10.0);
        assert_eq!(result.daily_mileage.get("2024-01-01"), Some(&5.0));
    }

    #[test]
    fn test_full_charge_resets_mileage_and_stamps_timestamp() {
        let prev = EbikeDocument {
            current_mileage: 42.0,
            ..Default::default()
        };

        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"fullCharge": true}"#),
            reference(),
            None,
        );

        assert_eq!(result.current_mileage, 0.0);
        assert_eq!(result.last_charged.as_deref(), Some("2024-01-01T02:00:00Z"));
        // The sentinel never appears in the stored document
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("fullCharge").is_none());
    }

    #[test]
    fn test_full_charge_delta_is_zero_not_negative() {
        let mut prev = EbikeDocument {
            current_mileage: 30.0,
            ..Default::default()
        };
        prev.daily_mileage.insert("2024-01-01".to_string(), 8.0);

        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"currentMileage": 0, "fullCharge": true}"#),
            reference(),
            None,
        );

        assert_eq!(result.current_mileage, 0.0);
        assert_eq!(result.daily_mileage.get("2024-01-01"), Some(&8.0));
    }

    #[test]
    fn test_merge_replaces_only_supplied_fields() {
        let prev = EbikeDocument {
            current_mileage: 10.0,
            total_mileage: 55.0,
            ..Default::default()
        };

        let patch = patch_json(
            r#"{"destinations": [{"name": "Gym", "mileage": 2.2}], "totalMileage": 70}"#,
        );
        let result = engine().apply(Some(prev), &patch, reference(), None);

        assert_eq!(result.total_mileage, 70.0);
        assert_eq!(result.current_mileage, 10.0);
        assert_eq!(result.destinations.len(), 1);
        assert_eq!(result.destinations[0].name, "Gym");
    }

    #[test]
    fn test_non_numeric_mileage_falls_back_to_previous() {
        let prev = EbikeDocument {
            current_mileage: 9.0,
            ..Default::default()
        };

        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"currentMileage": "not a number"}"#),
            reference(),
            None,
        );

        assert_eq!(result.current_mileage, 9.0);
        // delta = prev - prev = 0, so today is touched at 0
        assert_eq!(result.daily_mileage.get("2024-01-01"), Some(&0.0));
    }

    #[test]
    fn test_nan_mileage_string_cannot_poison_the_record() {
        let prev = EbikeDocument {
            current_mileage: 9.0,
            ..Default::default()
        };

        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"currentMileage": "NaN"}"#),
            reference(),
            None,
        );

        // Treated as absent: the prior reading survives
        assert_eq!(result.current_mileage, 9.0);

        // The persisted form must round-trip; a NaN would serialize as null
        // and fail every subsequent read of the record
        let json = serde_json::to_string(&result).unwrap();
        let reloaded: EbikeDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(reloaded, result);
    }

    #[test]
    fn test_client_date_overrides_server_day() {
        let prev = EbikeDocument {
            current_mileage: 1.0,
            ..Default::default()
        };

        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"currentMileage": 4}"#),
            reference(),
            Some(day(2023, 12, 31)),
        );

        assert_eq!(result.daily_mileage.get("2023-12-31"), Some(&3.0));
        assert!(!result.daily_mileage.contains_key("2024-01-01"));
    }

    #[test]
    fn test_server_day_uses_fixed_offset_not_utc() {
        // 2024-01-01 18:30 UTC is 2024-01-02 in UTC+8
        let late = Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap();

        let result = engine().apply(None, &patch_json(r#"{"currentMileage": 2}"#), late, None);

        assert_eq!(result.daily_mileage.get("2024-01-02"), Some(&2.0));
    }

    #[test]
    fn test_retention_prunes_strictly_older_than_six_months() {
        let mut prev = EbikeDocument::default();
        // reference day is 2024-01-01, cutoff is 2023-07-01
        prev.daily_mileage.insert("2023-06-30".to_string(), 5.0); // one day past cutoff
        prev.daily_mileage.insert("2023-07-01".to_string(), 6.0); // exactly at cutoff
        prev.daily_mileage.insert("2023-12-15".to_string(), 7.0); // well inside

        let result = engine().apply(Some(prev), &DocumentPatch::default(), reference(), None);

        assert!(!result.daily_mileage.contains_key("2023-06-30"));
        assert_eq!(result.daily_mileage.get("2023-07-01"), Some(&6.0));
        assert_eq!(result.daily_mileage.get("2023-12-15"), Some(&7.0));
    }

    #[test]
    fn test_retention_follows_client_date() {
        let mut prev = EbikeDocument::default();
        prev.daily_mileage.insert("2023-01-10".to_string(), 5.0);

        // Client says it is 2023-07-09: cutoff 2023-01-09, entry survives
        let result = engine().apply(
            Some(prev.clone()),
            &DocumentPatch::default(),
            reference(),
            Some(day(2023, 7, 9)),
        );
        assert_eq!(result.daily_mileage.get("2023-01-10"), Some(&5.0));

        // A day later the entry falls out of the window
        let result = engine().apply(
            Some(prev),
            &DocumentPatch::default(),
            reference(),
            Some(day(2023, 7, 11)),
        );
        assert!(!result.daily_mileage.contains_key("2023-01-10"));
    }

    #[test]
    fn test_malformed_ledger_key_dropped_without_failing() {
        let mut prev = EbikeDocument::default();
        prev.daily_mileage.insert("yesterday-ish".to_string(), 3.0);
        prev.daily_mileage.insert("2023-12-01".to_string(), 4.0);

        let result = engine().apply(Some(prev), &DocumentPatch::default(), reference(), None);

        assert!(!result.daily_mileage.contains_key("yesterday-ish"));
        assert_eq!(result.daily_mileage.get("2023-12-01"), Some(&4.0));
    }

    #[test]
    fn test_ledger_values_never_negative_across_sequence() {
        let e = engine();
        let mut doc = None;

        for body in [
            r#"{"currentMileage": 5}"#,
            r#"{"currentMileage": 2}"#,
            r#"{"currentMileage": 11}"#,
            r#"{"fullCharge": true}"#,
            r#"{"currentMileage": 3}"#,
        ] {
            doc = Some(e.apply(doc, &patch_json(body), reference(), None));
        }

        let doc = doc.unwrap();
        for (key, value) in &doc.daily_mileage {
            assert!(*value >= 0.0, "negative ledger entry at {}", key);
        }
        // 5 + 9 + 3 positive deltas all land on the same day
        assert_eq!(doc.daily_mileage.get("2024-01-01"), Some(&17.0));
    }

    #[test]
    fn test_current_mileage_may_exceed_total() {
        let prev = EbikeDocument {
            total_mileage: 60.0,
            current_mileage: 58.0,
            ..Default::default()
        };

        let result = engine().apply(
            Some(prev),
            &patch_json(r#"{"currentMileage": 65}"#),
            reference(),
            None,
        );

        // Not clamped
        assert_eq!(result.current_mileage, 65.0);
    }
}
