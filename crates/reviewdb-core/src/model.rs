//! Review document model.
//!
//! A review document is the denormalized form of one `reviews` row together
//! with the user who wrote it and the book it is about.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Natural key of a review.
pub type ReviewId = i64;

/// Non-negative fixed-point price with two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price {
    cents: i64,
}

impl Price {
    /// Build a price from whole cents.
    pub fn from_cents(cents: i64) -> Option<Self> {
        (cents >= 0).then_some(Self { cents })
    }

    /// Build a price from a raw numeric value, rounding to the nearest cent.
    ///
    /// Returns `None` for negative, NaN, or infinite input.
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() || value < 0.0 {
            return None;
        }
        let cents = (value * 100.0).round();
        if cents > i64::MAX as f64 {
            return None;
        }
        Self::from_cents(cents as i64)
    }

    /// Whole cents.
    pub fn cents(&self) -> i64 {
        self.cents
    }

    /// Value as a float, e.g. `19.99`.
    pub fn as_f64(&self) -> f64 {
        self.cents as f64 / 100.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.cents / 100, self.cents % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_f64())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = f64::deserialize(deserializer)?;
        Price::from_f64(raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid price {}", raw)))
    }
}

/// Embedded user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// Embedded book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: i64,
    pub isbn: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Price,
    pub publication_date: Option<DateTime<Utc>>,
}

/// A comment attached to a review (document form only).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub user_id: i64,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// The nested review document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewDocument {
    pub review_id: ReviewId,
    pub rating: u8,
    pub review_text: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_deleted: bool,
    pub user: User,
    pub book: Book,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
}

/// Field holding the natural key in stored review documents.
pub const REVIEW_KEY_FIELD: &str = "review_id";

/// Valid rating range.
pub const RATING_RANGE: std::ops::RangeInclusive<i64> = 1..=5;
