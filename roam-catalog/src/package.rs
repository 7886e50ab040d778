use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::{CatalogError, CatalogResult};

/// A fixed-itinerary trip sold at a fixed per-person price.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    pub id: Uuid,
    #[serde(default)]
    pub version: u64,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    pub region: String,
    pub category: Option<String>,
    pub stay_type: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub days: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub images: Vec<String>,
    pub slug: String,
    /// false = admin-authored, true = authored by a host
    #[serde(default)]
    pub is_host_listing: bool,
    pub host_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating or replacing a package.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageDraft {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: String,
    pub region: String,
    pub category: Option<String>,
    pub stay_type: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub days: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub available_dates: Vec<DateTime<Utc>>,
    /// New image URLs; on update these are appended.
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub is_host_listing: bool,
    pub host_id: Option<Uuid>,
}

impl PackageDraft {
    pub fn validate(&self) -> CatalogResult<()> {
        let required = [
            ("title", &self.title),
            ("description", &self.description),
            ("location", &self.location),
            ("region", &self.region),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(CatalogError::Validation(format!("{} is required", name)));
            }
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            return Err(CatalogError::Validation("price must be positive".to_string()));
        }
        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if end < start {
                return Err(CatalogError::Validation("endDate is before startDate".to_string()));
            }
        }
        if self.is_host_listing && self.host_id.is_none() {
            return Err(CatalogError::Validation("hostId is required for host packages".to_string()));
        }
        Ok(())
    }
}

impl Package {
    pub fn new(draft: PackageDraft) -> CatalogResult<Self> {
        draft.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            version: 0,
            slug: slugify(&draft.title),
            title: draft.title,
            description: draft.description,
            price: draft.price,
            location: draft.location,
            region: draft.region,
            category: draft.category,
            stay_type: draft.stay_type,
            tags: draft.tags,
            days: draft.days,
            start_date: draft.start_date,
            end_date: draft.end_date,
            available_dates: draft.available_dates,
            images: draft.images,
            is_host_listing: draft.is_host_listing,
            host_id: draft.host_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace editable fields. Slug is always re-derived from the new title.
    pub fn apply(&mut self, draft: PackageDraft, remove_images: &[String]) -> CatalogResult<()> {
        draft.validate()?;

        let mut images: Vec<String> = self
            .images
            .drain(..)
            .filter(|img| !remove_images.contains(img))
            .collect();
        images.extend(draft.images);

        self.slug = slugify(&draft.title);
        self.title = draft.title;
        self.description = draft.description;
        self.price = draft.price;
        self.location = draft.location;
        self.region = draft.region;
        self.category = draft.category;
        self.stay_type = draft.stay_type;
        self.tags = draft.tags;
        self.days = draft.days;
        self.start_date = draft.start_date;
        self.end_date = draft.end_date;
        self.available_dates = draft.available_dates;
        self.images = images;
        self.is_host_listing = draft.is_host_listing;
        self.host_id = draft.host_id;
        self.updated_at = Utc::now();
        Ok(())
    }
}

/// Lowercase, hyphen-separated form of a title.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for ch in title.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.extend(ch.to_lowercase());
        } else if ch.is_whitespace() || ch == '-' || ch == '_' {
            pending_hyphen = true;
        }
    }

    slug
}

/// Optional equality filters for listing packages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageFilter {
    pub region: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub is_host_listing: Option<bool>,
}

impl PackageFilter {
    pub fn matches(&self, package: &Package) -> bool {
        fn eq_ci(want: &Option<String>, have: &str) -> bool {
            want.as_deref().map_or(true, |w| w.eq_ignore_ascii_case(have))
        }

        eq_ci(&self.region, &package.region)
            && eq_ci(&self.location, &package.location)
            && self
                .category
                .as_deref()
                .map_or(true, |c| package.category.as_deref().is_some_and(|pc| pc.eq_ignore_ascii_case(c)))
            && self.is_host_listing.map_or(true, |h| h == package.is_host_listing)
    }
}
