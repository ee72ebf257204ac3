//! Structured search query sent to `POST /search`.
//!
//! The price constraint has two mutually exclusive representations: an
//! explicit min/max range and a quick-pick bucket. The setters keep exactly
//! one of them populated; [`FilterQuery::validate`] rejects queries that were
//! assembled field-by-field into a conflicting state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Maximum accepted length of the free-text location, in characters.
pub const MAX_LOCATION_LENGTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Price range and price bucket cannot both be set")]
    ConflictingPrice,

    #[error("Minimum price {min} exceeds maximum price {max}")]
    InvertedPriceRange { min: u64, max: u64 },

    #[error("Location is too long ({0} characters, max 256)")]
    LocationTooLong(usize),
}

/// Quick-pick monthly rent brackets offered next to the min/max inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PriceBucket {
    UpTo10k,
    From10kTo20k,
    From20kTo30k,
    Above30k,
}

impl PriceBucket {
    /// Inclusive bounds covered by the bucket. `None` means unbounded.
    pub fn bounds(self) -> (Option<u64>, Option<u64>) {
        match self {
            PriceBucket::UpTo10k => (None, Some(10_000)),
            PriceBucket::From10kTo20k => (Some(10_000), Some(20_000)),
            PriceBucket::From20kTo30k => (Some(20_000), Some(30_000)),
            PriceBucket::Above30k => (Some(30_000), None),
        }
    }
}

/// Room layout in the local "rooms + living rooms" notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomCount {
    #[serde(rename = "1+0")]
    Studio,
    #[serde(rename = "1+1")]
    OnePlusOne,
    #[serde(rename = "2+1")]
    TwoPlusOne,
    #[serde(rename = "3+1")]
    ThreePlusOne,
    #[serde(rename = "4+1")]
    FourPlusOneOrMore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyCategory {
    Apartment,
    Residence,
    Villa,
    DetachedHouse,
    StudentHousing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    Furnished,
    Parking,
    Elevator,
    Balcony,
    Garden,
    PetsAllowed,
    Security,
    NaturalGas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ListingStatus {
    Available,
    Reserved,
    Rented,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Newest,
    PriceAscending,
    PriceDescending,
    MostFavorited,
}

/// Search predicate. All fields are optional; an empty query matches every
/// listing the backend is willing to return.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_price: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_bucket: Option<PriceBucket>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rooms: Option<RoomCount>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<PropertyCategory>,
    #[serde(skip_serializing_if = "BTreeSet::is_empty")]
    pub features: BTreeSet<Feature>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ListingStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortKey>,
}

impl FilterQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text location. Blank input clears it.
    pub fn location(mut self, location: &str) -> Self {
        self.set_location(location);
        self
    }

    pub fn set_location(&mut self, location: &str) {
        let trimmed = location.trim();
        self.location = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
    }

    /// Set an explicit price range. Clears the quick-pick bucket.
    pub fn price_range(mut self, min: Option<u64>, max: Option<u64>) -> Self {
        self.set_price_range(min, max);
        self
    }

    pub fn set_price_range(&mut self, min: Option<u64>, max: Option<u64>) {
        self.min_price = min;
        self.max_price = max;
        if min.is_some() || max.is_some() {
            self.price_bucket = None;
        }
    }

    /// Select a quick-pick price bucket. Clears the explicit range.
    pub fn price_bucket(mut self, bucket: PriceBucket) -> Self {
        self.set_price_bucket(Some(bucket));
        self
    }

    pub fn set_price_bucket(&mut self, bucket: Option<PriceBucket>) {
        self.price_bucket = bucket;
        if bucket.is_some() {
            self.min_price = None;
            self.max_price = None;
        }
    }

    pub fn rooms(mut self, rooms: RoomCount) -> Self {
        self.rooms = Some(rooms);
        self
    }

    pub fn category(mut self, category: PropertyCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.insert(feature);
        self
    }

    /// Flip a feature flag, returning whether it is now set.
    pub fn toggle_feature(&mut self, feature: Feature) -> bool {
        if self.features.remove(&feature) {
            false
        } else {
            self.features.insert(feature);
            true
        }
    }

    pub fn status(mut self, status: ListingStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Effective inclusive price bounds, whichever representation is in use.
    pub fn effective_price_bounds(&self) -> (Option<u64>, Option<u64>) {
        match self.price_bucket {
            Some(bucket) => bucket.bounds(),
            None => (self.min_price, self.max_price),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.price_bucket.is_some() && (self.min_price.is_some() || self.max_price.is_some()) {
            return Err(ValidationError::ConflictingPrice);
        }
        if let (Some(min), Some(max)) = (self.min_price, self.max_price) {
            if min > max {
                return Err(ValidationError::InvertedPriceRange { min, max });
            }
        }
        if let Some(location) = &self.location {
            let len = location.chars().count();
            if len > MAX_LOCATION_LENGTH {
                return Err(ValidationError::LocationTooLong(len));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_price_range_clears_bucket() {
        let query = FilterQuery::new()
            .price_bucket(PriceBucket::From10kTo20k)
            .price_range(Some(12_000), None);
        assert_eq!(query.price_bucket, None);
        assert_eq!(query.min_price, Some(12_000));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_bucket_clears_price_range() {
        let query = FilterQuery::new()
            .price_range(Some(5_000), Some(9_000))
            .price_bucket(PriceBucket::Above30k);
        assert_eq!(query.min_price, None);
        assert_eq!(query.max_price, None);
        assert_eq!(query.effective_price_bounds(), (Some(30_000), None));
    }

    #[test]
    fn test_empty_range_keeps_bucket() {
        let mut query = FilterQuery::new().price_bucket(PriceBucket::UpTo10k);
        query.set_price_range(None, None);
        assert_eq!(query.price_bucket, Some(PriceBucket::UpTo10k));
    }

    #[test]
    fn test_conflicting_price_fields_rejected() {
        let query = FilterQuery {
            min_price: Some(1),
            price_bucket: Some(PriceBucket::UpTo10k),
            ..FilterQuery::default()
        };
        assert_eq!(query.validate(), Err(ValidationError::ConflictingPrice));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let query = FilterQuery::new().price_range(Some(20_000), Some(10_000));
        assert_eq!(
            query.validate(),
            Err(ValidationError::InvertedPriceRange {
                min: 20_000,
                max: 10_000
            })
        );
    }

    #[test]
    fn test_location_is_trimmed_and_limited() {
        assert_eq!(
            FilterQuery::new().location("  Kadıköy ").location.as_deref(),
            Some("Kadıköy")
        );
        assert_eq!(FilterQuery::new().location("   ").location, None);

        let long = FilterQuery::new().location(&"ş".repeat(MAX_LOCATION_LENGTH + 1));
        assert_eq!(
            long.validate(),
            Err(ValidationError::LocationTooLong(MAX_LOCATION_LENGTH + 1))
        );
    }

    #[test]
    fn test_toggle_feature() {
        let mut query = FilterQuery::new();
        assert!(query.toggle_feature(Feature::Balcony));
        assert!(!query.toggle_feature(Feature::Balcony));
        assert!(query.features.is_empty());
    }

    #[test]
    fn test_serializes_only_set_fields() {
        let query = FilterQuery::new()
            .location("Kadıköy")
            .rooms(RoomCount::TwoPlusOne)
            .feature(Feature::Furnished)
            .feature(Feature::Elevator)
            .sort(SortKey::PriceAscending);
        assert_eq!(
            serde_json::to_value(&query).unwrap(),
            json!({
                "location": "Kadıköy",
                "rooms": "2+1",
                "features": ["furnished", "elevator"],
                "sort": "priceAscending"
            })
        );
    }
}
