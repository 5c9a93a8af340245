//! Utility functions for the ranking engine

use chrono::{DateTime, Utc};

/// Get the current UTC timestamp
pub fn current_timestamp() -> DateTime<Utc> {
    Utc::now()
}

/// Calculate the absolute difference between two ratings
pub fn rating_difference(rating1: f64, rating2: f64) -> f64 {
    (rating1 - rating2).abs()
}

/// Check if two ratings are strictly closer than the given threshold
pub fn ratings_within_proximity(rating1: f64, rating2: f64, threshold: f64) -> bool {
    rating_difference(rating1, rating2) < threshold
}
