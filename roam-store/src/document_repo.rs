use async_trait::async_trait;
use roam_booking::{Reservation, ReservationFilter, ReservationKind, ReservationRepository};
use roam_catalog::{Listing, ListingFilter, ListingRepository, Package, PackageFilter, PackageRepository, StayRange};
use roam_shared::{StoreError, StoreResult};
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

use crate::documents::{Versioned, LISTINGS, PACKAGES};

/// JSONB document store on Postgres: one row per document in `documents`,
/// keyed by (collection, id), with the version kept in its own column.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

fn backend(err: sqlx::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn decode<T: Versioned>(collection: &'static str, body: Value) -> StoreResult<T> {
    serde_json::from_value(body).map_err(|e| StoreError::Corrupt {
        collection,
        reason: e.to_string(),
    })
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a small pool; bookings are low-volume and mostly wait on the gateway.
    pub async fn connect(url: &str) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(url)
            .await?;
        Ok(Self::new(pool))
    }

    /// Applies `migrations/` (the `documents` table and its JSONB indexes).
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../migrations").run(&self.pool).await?;
        info!("Document store schema is up to date");
        Ok(())
    }

    async fn insert_doc<T: Versioned>(&self, doc: &T) -> StoreResult<()> {
        let body = serde_json::to_value(doc)?;
        sqlx::query(
            "INSERT INTO documents (collection, id, version, body, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, NOW())",
        )
        .bind(doc.collection())
        .bind(doc.id())
        .bind(doc.version() as i64)
        .bind(body)
        .bind(doc.created_at())
        .execute(&self.pool)
        .await
        .map_err(backend)?;
        Ok(())
    }

    async fn get_doc<T: Versioned>(&self, collection: &'static str, id: Uuid) -> StoreResult<Option<T>> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|(body,)| decode(collection, body)).transpose()
    }

    async fn list_docs<T: Versioned>(&self, collection: &'static str) -> StoreResult<Vec<T>> {
        let rows: Vec<(Value,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = $1 ORDER BY created_at DESC, id")
                .bind(collection)
                .fetch_all(&self.pool)
                .await
                .map_err(backend)?;

        rows.into_iter().map(|(body,)| decode(collection, body)).collect()
    }

    /// Writes `doc` with version `expected + 1` only while the row still has `expected`.
    async fn update_doc<T: Versioned>(&self, doc: &T, expected: u64) -> StoreResult<T> {
        let mut stored = doc.clone();
        stored.set_version(expected + 1);
        let body = serde_json::to_value(&stored)?;

        let result = sqlx::query(
            "UPDATE documents SET body = $3, version = $4, updated_at = NOW() \
             WHERE collection = $1 AND id = $2 AND version = $5",
        )
        .bind(doc.collection())
        .bind(doc.id())
        .bind(body)
        .bind((expected + 1) as i64)
        .bind(expected as i64)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 1 {
            return Ok(stored);
        }

        let exists: Option<(i64,)> = sqlx::query_as("SELECT version FROM documents WHERE collection = $1 AND id = $2")
            .bind(doc.collection())
            .bind(doc.id())
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        Err(match exists {
            Some(_) => StoreError::VersionConflict {
                collection: doc.collection(),
                id: doc.id(),
                expected,
            },
            None => StoreError::NotFound {
                collection: doc.collection(),
                id: doc.id(),
            },
        })
    }

    async fn delete_doc(&self, collection: &'static str, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl PackageRepository for PgDocumentStore {
    async fn insert_package(&self, package: &Package) -> StoreResult<()> {
        self.insert_doc(package).await
    }

    async fn get_package(&self, id: Uuid) -> StoreResult<Option<Package>> {
        self.get_doc(PACKAGES, id).await
    }

    async fn find_package_by_slug(&self, slug: &str) -> StoreResult<Option<Package>> {
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT body FROM documents WHERE collection = $1 AND body->>'slug' = $2 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(PACKAGES)
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|(body,)| decode(PACKAGES, body)).transpose()
    }

    async fn list_packages(&self, filter: &PackageFilter) -> StoreResult<Vec<Package>> {
        let all: Vec<Package> = self.list_docs(PACKAGES).await?;
        Ok(all.into_iter().filter(|p| filter.matches(p)).collect())
    }

    async fn update_package(&self, package: &Package, expected_version: u64) -> StoreResult<Package> {
        self.update_doc(package, expected_version).await
    }

    async fn delete_package(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_doc(PACKAGES, id).await
    }
}

#[async_trait]
impl ListingRepository for PgDocumentStore {
    async fn insert_listing(&self, listing: &Listing) -> StoreResult<()> {
        self.insert_doc(listing).await
    }

    async fn get_listing(&self, id: Uuid) -> StoreResult<Option<Listing>> {
        self.get_doc(LISTINGS, id).await
    }

    async fn list_listings(&self, filter: &ListingFilter) -> StoreResult<Vec<Listing>> {
        let all: Vec<Listing> = self.list_docs(LISTINGS).await?;
        Ok(all.into_iter().filter(|l| filter.matches(l)).collect())
    }

    async fn update_listing(&self, listing: &Listing, expected_version: u64) -> StoreResult<Listing> {
        self.update_doc(listing, expected_version).await
    }

    async fn delete_listing(&self, id: Uuid) -> StoreResult<bool> {
        self.delete_doc(LISTINGS, id).await
    }
}

#[async_trait]
impl ReservationRepository for PgDocumentStore {
    async fn insert(&self, reservation: &Reservation) -> StoreResult<()> {
        self.insert_doc(reservation).await
    }

    async fn get(&self, kind: ReservationKind, id: Uuid) -> StoreResult<Option<Reservation>> {
        self.get_doc(kind.collection(), id).await
    }

    async fn list(&self, kind: ReservationKind, filter: &ReservationFilter) -> StoreResult<Vec<Reservation>> {
        let collection = kind.collection();
        let rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT body FROM documents \
             WHERE collection = $1 \
               AND ($2::text IS NULL OR body->>'user_id' = $2) \
               AND ($3::text IS NULL OR body->>'host_id' = $3) \
               AND ($4::text IS NULL OR body->>'status' <> $4) \
             ORDER BY created_at DESC, id",
        )
        .bind(collection)
        .bind(filter.user_id.map(|u| u.to_string()))
        .bind(filter.host_id.map(|h| h.to_string()))
        .bind(filter.exclude_status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(|(body,)| decode(collection, body)).collect()
    }

    async fn update(&self, reservation: &Reservation, expected_version: u64) -> StoreResult<Reservation> {
        self.update_doc(reservation, expected_version).await
    }

    async fn find_paid_overlap(&self, listing_id: Uuid, stay: &StayRange) -> StoreResult<Option<Reservation>> {
        let collection = ReservationKind::HostStay.collection();
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT body FROM documents \
             WHERE collection = $1 \
               AND body->>'subject_id' = $2 \
               AND body->>'payment_status' = 'paid' \
               AND (body->>'check_in')::timestamptz <= $4 \
               AND (body->>'check_out')::timestamptz >= $3 \
             LIMIT 1",
        )
        .bind(collection)
        .bind(listing_id.to_string())
        .bind(stay.check_in)
        .bind(stay.check_out)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(|(body,)| decode(collection, body)).transpose()
    }
}
