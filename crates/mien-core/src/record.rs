use serde::{Deserialize, Serialize};

/// Timestamp layout for stored records: ISO-8601 local time with
/// microsecond precision and no timezone suffix.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Scores at or below this bound are taken as 0.0-1.0 fractions
/// and rescaled to the canonical 0-100 range.
const FRACTION_CEILING: f64 = 1.0;

/// One observation in the emotion journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionRecord {
    /// Display name of the observed subject.
    pub name: String,
    /// Local wall-clock time at append. Kept as a string; only the
    /// aggregation reader parses it, and it drops what it cannot parse.
    pub datetime: String,
    /// Emotion label as reported by the classifier (lower-case by convention,
    /// but stored verbatim).
    pub emotion: String,
    /// Classifier confidence on the canonical 0-100 scale.
    pub percentage: f64,
}

impl EmotionRecord {
    /// Build a record timestamped with the current local time.
    ///
    /// `percentage` passes through [`normalize_percentage`], so callers may
    /// hand in either a 0-100 value or a 0.0-1.0 fraction.
    pub fn now(name: impl Into<String>, emotion: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            datetime: chrono::Local::now()
                .naive_local()
                .format(TIMESTAMP_FORMAT)
                .to_string(),
            emotion: emotion.into(),
            percentage: normalize_percentage(percentage),
        }
    }
}

/// Rescale fractional confidences onto the canonical 0-100 scale.
///
/// Historically call sites mixed 0-100 percentages with 0.0-1.0 fractions.
/// Any finite value in (0.0, 1.0] is taken as a fraction and multiplied by
/// 100; everything else is returned unchanged.
pub fn normalize_percentage(score: f64) -> f64 {
    if score.is_finite() && score > 0.0 && score <= FRACTION_CEILING {
        score * 100.0
    } else {
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_fraction_rescaled() {
        assert!((normalize_percentage(0.87) - 87.0).abs() < 1e-9);
        assert!((normalize_percentage(1.0) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_percent_unchanged() {
        assert_eq!(normalize_percentage(80.0), 80.0);
        assert_eq!(normalize_percentage(100.0), 100.0);
        assert_eq!(normalize_percentage(1.5), 1.5);
    }

    #[test]
    fn test_normalize_zero_and_negative_unchanged() {
        assert_eq!(normalize_percentage(0.0), 0.0);
        assert_eq!(normalize_percentage(-5.0), -5.0);
    }

    #[test]
    fn test_normalize_non_finite_unchanged() {
        assert!(normalize_percentage(f64::NAN).is_nan());
        assert_eq!(normalize_percentage(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_now_sets_parseable_local_timestamp() {
        let record = EmotionRecord::now("Ann", "happy", 0.8);
        assert!((record.percentage - 80.0).abs() < 1e-9);
        assert!(record.datetime.contains('T'));
        assert!(
            chrono::NaiveDateTime::parse_from_str(&record.datetime, TIMESTAMP_FORMAT).is_ok(),
            "timestamp should round-trip through its own format: {}",
            record.datetime
        );
    }

    #[test]
    fn test_serde_field_names() {
        let record = EmotionRecord {
            name: "Ann".into(),
            datetime: "2026-08-25T10:00:00.000000".into(),
            emotion: "happy".into(),
            percentage: 80.0,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["name"], "Ann");
        assert_eq!(json["datetime"], "2026-08-25T10:00:00.000000");
        assert_eq!(json["emotion"], "happy");
        assert_eq!(json["percentage"], 80.0);
    }
}
