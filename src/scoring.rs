//! Package popularity scoring.

use serde_json::Value;

use crate::errors::CatalogError;

/// Weight of a single detail-page view
pub const VIEW_WEIGHT: i64 = 1;
/// Weight of a single inquiry referencing the package
pub const INQUIRY_WEIGHT: i64 = 5;
/// Flat bonus for administrator-featured packages
pub const FEATURED_BONUS: i64 = 50;

/// Compute the popularity score of a package.
///
/// `views * 1 + inquiries * 5 + (featured ? 50 : 0)`. Negative counters are
/// treated as zero so that a corrupted counter can never invert ranking.
pub fn popularity_score(view_count: i64, inquiry_count: i64, is_featured: bool) -> i64 {
    let views = view_count.max(0).saturating_mul(VIEW_WEIGHT);
    let inquiries = inquiry_count.max(0).saturating_mul(INQUIRY_WEIGHT);
    let bonus = if is_featured { FEATURED_BONUS } else { 0 };

    views.saturating_add(inquiries).saturating_add(bonus)
}

/// Administrator-supplied popularity score, persisted verbatim
///
/// Only non-negative JSON integers are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PopularityScore(i64);

impl TryFrom<i64> for PopularityScore {
    type Error = CatalogError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if value < 0 {
            return Err(CatalogError::InvalidPopularityScore(format!(
                "must be non-negative, got {value}"
            )));
        }
        Ok(Self(value))
    }
}

impl TryFrom<&Value> for PopularityScore {
    type Error = CatalogError;

    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(v) => Self::try_from(v),
                None if n.as_u64().is_some() => Err(CatalogError::InvalidPopularityScore(
                    format!("out of range: {n}"),
                )),
                None => Err(CatalogError::InvalidPopularityScore(format!(
                    "must be an integer, got {n}"
                ))),
            },
            Value::Null => Err(CatalogError::InvalidPopularityScore(
                "value is required".to_string(),
            )),
            other => Err(CatalogError::InvalidPopularityScore(format!(
                "must be an integer, got {other}"
            ))),
        }
    }
}

impl PopularityScore {
    /// Get the raw score
    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_combines_weights() {
        assert_eq!(popularity_score(10, 2, true), 70);
        assert_eq!(popularity_score(10, 2, false), 20);
        assert_eq!(popularity_score(0, 0, false), 0);
    }

    #[test]
    fn featured_adds_exactly_fifty() {
        for (views, inquiries) in [(0, 0), (3, 1), (1000, 40)] {
            assert_eq!(
                popularity_score(views, inquiries, true) - popularity_score(views, inquiries, false),
                50
            );
        }
    }

    #[test]
    fn score_is_monotonic_in_counters() {
        let base = popularity_score(7, 3, false);
        assert!(popularity_score(8, 3, false) > base);
        assert!(popularity_score(7, 4, false) > base);
        assert_eq!(popularity_score(7, 4, false) - base, 5);
    }

    #[test]
    fn negative_counters_are_clamped() {
        assert_eq!(popularity_score(-10, -2, false), 0);
        assert_eq!(popularity_score(-10, 2, true), 60);
    }

    #[test]
    fn score_saturates() {
        assert_eq!(popularity_score(i64::MAX, i64::MAX, true), i64::MAX);
    }

    #[test]
    fn override_accepts_non_negative_integers() {
        assert_eq!(PopularityScore::try_from(&json!(0)).unwrap().value(), 0);
        assert_eq!(PopularityScore::try_from(&json!(1234)).unwrap().value(), 1234);
    }

    #[test]
    fn override_rejects_malformed_values() {
        for value in [
            json!(-1),
            json!(1.5),
            json!(2.0),
            json!("10"),
            json!(null),
            json!(true),
            json!([1]),
            json!(u64::MAX),
        ] {
            let result = PopularityScore::try_from(&value);
            assert!(
                matches!(result, Err(CatalogError::InvalidPopularityScore(_))),
                "accepted {value}"
            );
        }
    }
}
