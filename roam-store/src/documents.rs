use chrono::{DateTime, Utc};
use roam_booking::Reservation;
use roam_catalog::{Listing, Package};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A document with an optimistic-concurrency token.
pub trait Versioned: Serialize + DeserializeOwned + Clone + Send + Sync {
    fn collection(&self) -> &'static str;
    fn id(&self) -> Uuid;
    fn version(&self) -> u64;
    fn set_version(&mut self, version: u64);
    fn created_at(&self) -> DateTime<Utc>;
}

impl Versioned for Package {
    fn collection(&self) -> &'static str {
        PACKAGES
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Versioned for Listing {
    fn collection(&self) -> &'static str {
        LISTINGS
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Versioned for Reservation {
    fn collection(&self) -> &'static str {
        self.kind.collection()
    }
    fn id(&self) -> Uuid {
        self.id
    }
    fn version(&self) -> u64 {
        self.version
    }
    fn set_version(&mut self, version: u64) {
        self.version = version;
    }
    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

pub const PACKAGES: &str = "packages";
pub const LISTINGS: &str = "listings";

/// Newest first, ties broken by id so listings are stable.
pub fn newest_first<T: Versioned>(docs: &mut [T]) {
    docs.sort_by(|a, b| b.created_at().cmp(&a.created_at()).then_with(|| a.id().cmp(&b.id())));
}
