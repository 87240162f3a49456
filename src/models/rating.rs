use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MIN_RATING: f64 = 1.0;
pub const MAX_RATING: f64 = 5.0;

/// Running rating totals for one post.
///
/// Stored in the `ratings` container; `id` always equals `postId`, which is
/// also the partition key, so there is exactly one document per post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingAggregate {
    pub id: String,
    pub post_id: String,
    pub count: u64,
    pub sum: f64,
    pub avg: f64,
}

impl RatingAggregate {
    /// The aggregate of a post that has not been rated yet.
    pub fn empty(post_id: &str) -> Self {
        Self {
            id: post_id.to_string(),
            post_id: post_id.to_string(),
            count: 0,
            sum: 0.0,
            avg: 0.0,
        }
    }

    /// Adds one rating and recomputes the average from `sum` and `count`.
    pub fn record(mut self, value: f64) -> Self {
        self.count += 1;
        self.sum += value;
        self.avg = round_to_hundredths(self.sum / self.count as f64);
        self
    }
}

pub fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whether `value` is an acceptable rating.
pub fn is_valid_rating(value: f64) -> bool {
    value.is_finite() && (MIN_RATING..=MAX_RATING).contains(&value)
}

/// DTO for submitting a rating.
/// `rating` is kept raw so that numeric strings are accepted and anything
/// else is reported as a bad request instead of a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubmitRatingRequest {
    pub rating: Value,
}

impl SubmitRatingRequest {
    pub fn rating_value(&self) -> Option<f64> {
        match &self.rating {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}
