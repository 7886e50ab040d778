use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::StayRange;
use crate::{CatalogError, CatalogResult};

/// A period during which a listing cannot be booked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockedRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub reason: Option<String>,
}

/// A host-owned stay. Hidden from the public until an admin approves it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub id: Uuid,
    #[serde(default)]
    pub version: u64,
    pub host_id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<String>,
    pub stay_type: Option<String>,
    #[serde(default)]
    pub approved: bool,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blocked_ranges: Vec<BlockedRange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub location: String,
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<String>,
    pub stay_type: Option<String>,
    pub available_from: Option<DateTime<Utc>>,
    pub available_to: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blocked_ranges: Vec<BlockedRange>,
}

impl ListingDraft {
    pub fn validate(&self) -> CatalogResult<()> {
        for (name, value) in [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
        ] {
            if value.trim().is_empty() {
                return Err(CatalogError::Validation(format!("{} is required", name)));
            }
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(CatalogError::Validation("price must be positive".to_string()));
        }
        if let (Some(from), Some(to)) = (self.available_from, self.available_to) {
            if to <= from {
                return Err(CatalogError::Validation("availableTo must be after availableFrom".to_string()));
            }
        }
        if self.blocked_ranges.iter().any(|r| r.to < r.from) {
            return Err(CatalogError::Validation("blocked range ends before it starts".to_string()));
        }
        Ok(())
    }
}

impl Listing {
    /// New listings always start unapproved.
    pub fn new(host_id: Uuid, draft: ListingDraft) -> CatalogResult<Self> {
        draft.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            version: 0,
            host_id,
            title: draft.title,
            description: draft.description,
            location: draft.location,
            price: draft.price,
            images: draft.images,
            category: draft.category,
            stay_type: draft.stay_type,
            approved: false,
            available_from: draft.available_from,
            available_to: draft.available_to,
            blocked_ranges: draft.blocked_ranges,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace editable fields; ownership and approval are untouched.
    pub fn apply(&mut self, draft: ListingDraft) -> CatalogResult<()> {
        draft.validate()?;
        self.title = draft.title;
        self.description = draft.description;
        self.location = draft.location;
        self.price = draft.price;
        self.images = draft.images;
        self.category = draft.category;
        self.stay_type = draft.stay_type;
        self.available_from = draft.available_from;
        self.available_to = draft.available_to;
        self.blocked_ranges = draft.blocked_ranges;
        self.updated_at = Utc::now();
        Ok(())
    }

    pub fn set_approved(&mut self, approved: bool) {
        self.approved = approved;
        self.updated_at = Utc::now();
    }

    /// True when the stay sits inside the availability window (if any)
    /// and clear of every blocked range.
    pub fn is_open_for(&self, stay: &StayRange) -> bool {
        if let Some(from) = self.available_from {
            if stay.check_in < from {
                return false;
            }
        }
        if let Some(to) = self.available_to {
            if stay.check_out > to {
                return false;
            }
        }
        !self
            .blocked_ranges
            .iter()
            .any(|b| StayRange::new(b.from, b.to).overlaps(stay))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, d, 0, 0, 0).unwrap()
    }

    fn listing() -> Listing {
        Listing::new(
            Uuid::new_v4(),
            ListingDraft {
                title: "Lake Cabin".to_string(),
                description: "Quiet cabin".to_string(),
                location: "Kodaikanal".to_string(),
                price: 2500.0,
                available_from: Some(day(1)),
                available_to: Some(day(28)),
                blocked_ranges: vec![BlockedRange { from: day(10), to: day(12), reason: Some("repairs".into()) }],
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_new_listing_is_unapproved() {
        let l = listing();
        assert!(!l.approved);
        assert_eq!(l.version, 0);
    }

    #[test]
    fn test_is_open_for() {
        let l = listing();
        assert!(l.is_open_for(&StayRange::new(day(2), day(5))));
        assert!(!l.is_open_for(&StayRange::new(day(9), day(11))));
        assert!(!l.is_open_for(&StayRange::new(day(25), day(30))));

        let mut no_window = l.clone();
        no_window.available_from = None;
        no_window.available_to = None;
        no_window.blocked_ranges.clear();
        assert!(no_window.is_open_for(&StayRange::new(day(25), day(30))));
    }

    #[test]
    fn test_wire_shape_is_camel_case() {
        let value = serde_json::to_value(listing()).unwrap();
        assert_eq!(value["approved"], false);
        assert!(value.get("hostId").is_some());
        assert!(value.get("blockedRanges").is_some());
        assert!(value.get("host_id").is_none());

        let back: Listing = serde_json::from_value(value).unwrap();
        assert_eq!(back.blocked_ranges.len(), 1);
    }

    #[test]
    fn test_draft_validation() {
        let bad = ListingDraft {
            title: "Cabin".into(),
            description: "x".into(),
            location: "y".into(),
            price: 100.0,
            available_from: Some(day(5)),
            available_to: Some(day(4)),
            ..Default::default()
        };
        assert!(matches!(bad.validate(), Err(CatalogError::Validation(_))));
    }
}
