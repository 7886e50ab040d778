use axum::{
    extract::State,
    routing::{get, post, put},
    Extension, Json, Router,
};
use roam_catalog::{Actor, Listing, ListingDraft, Package, PackageDraft, PackageFilter};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageUpdate {
    #[serde(flatten)]
    pub draft: PackageDraft,
    #[serde(default)]
    pub remove_images: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewListing {
    #[serde(flatten)]
    pub draft: ListingDraft,
    /// Only honoured for admins; hosts always create under their own id.
    pub host_id: Option<Uuid>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/packages", get(list_packages))
        .route("/packages/{id}", get(get_package))
        .route("/packages/slug/{slug}", get(get_package_by_slug))
        .route("/listings", get(public_listings))
        .route("/listings/{id}", get(get_listing))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/packages", post(create_package))
        .route("/admin/packages/{id}", put(update_package).delete(delete_package))
        .route("/admin/listings", get(all_listings))
        .route("/admin/listings/{id}/approve", put(approve_listing))
        .route("/admin/listings/{id}/reject", put(reject_listing))
}

pub fn host_routes() -> Router<AppState> {
    Router::new()
        .route("/host/listings", post(create_listing))
        .route("/host/listings/my/{host_id}", get(my_listings))
        .route("/host/listings/{id}", put(update_listing).delete(delete_listing))
}

async fn list_packages(
    State(state): State<AppState>,
    AppQuery(filter): AppQuery<PackageFilter>,
) -> Result<Json<Vec<Package>>, AppError> {
    Ok(Json(state.catalog.list_packages(&filter).await?))
}

async fn get_package(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Json<Package>, AppError> {
    Ok(Json(state.catalog.package(id).await?))
}

async fn get_package_by_slug(
    State(state): State<AppState>,
    AppPath(slug): AppPath<String>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(state.catalog.package_by_slug(&slug).await?))
}

async fn create_package(
    State(state): State<AppState>,
    AppJson(draft): AppJson<PackageDraft>,
) -> Result<Json<Package>, AppError> {
    let package = state.catalog.create_package(draft).await?;
    tracing::info!(package_id = %package.id, slug = %package.slug, "Package created");
    Ok(Json(package))
}

async fn update_package(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(update): AppJson<PackageUpdate>,
) -> Result<Json<Package>, AppError> {
    Ok(Json(
        state
            .catalog
            .update_package(id, update.draft, &update.remove_images)
            .await?,
    ))
}

async fn delete_package(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Json<Value>, AppError> {
    state.catalog.delete_package(id).await?;
    Ok(Json(json!({ "message": "Package deleted" })))
}

async fn public_listings(State(state): State<AppState>) -> Result<Json<Vec<Listing>>, AppError> {
    Ok(Json(state.catalog.public_listings().await?))
}

async fn get_listing(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Json<Listing>, AppError> {
    Ok(Json(state.catalog.listing(id).await?))
}

async fn all_listings(State(state): State<AppState>) -> Result<Json<Vec<Listing>>, AppError> {
    Ok(Json(state.catalog.all_listings().await?))
}

async fn approve_listing(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Json<Listing>, AppError> {
    Ok(Json(state.catalog.set_listing_approval(id, true).await?))
}

async fn reject_listing(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Json<Listing>, AppError> {
    Ok(Json(state.catalog.set_listing_approval(id, false).await?))
}

async fn create_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppJson(req): AppJson<NewListing>,
) -> Result<Json<Listing>, AppError> {
    let host_id = match claims.actor()? {
        Actor::Host(id) => id,
        Actor::Admin => req
            .host_id
            .ok_or_else(|| AppError::ValidationError("hostId is required".to_string()))?,
    };
    Ok(Json(state.catalog.create_listing(host_id, req.draft).await?))
}

async fn my_listings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(host_id): AppPath<Uuid>,
) -> Result<Json<Vec<Listing>>, AppError> {
    let actor = claims.actor()?;
    if actor != Actor::Admin && actor != Actor::Host(host_id) {
        return Err(AppError::AuthorizationError("Cannot view another host's listings".to_string()));
    }
    Ok(Json(state.catalog.host_listings(host_id).await?))
}

async fn update_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
    AppJson(draft): AppJson<ListingDraft>,
) -> Result<Json<Listing>, AppError> {
    Ok(Json(state.catalog.update_listing(claims.actor()?, id, draft).await?))
}

async fn delete_listing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Value>, AppError> {
    state.catalog.delete_listing(claims.actor()?, id).await?;
    Ok(Json(json!({ "message": "Listing deleted" })))
}
