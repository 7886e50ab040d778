use std::sync::Arc;

use roam_catalog::{Actor, CatalogError, CatalogService, ListingDraft, PackageDraft, PackageFilter};
use roam_store::MemoryStore;
use uuid::Uuid;

fn service() -> CatalogService {
    let store = Arc::new(MemoryStore::new());
    CatalogService::new(store.clone(), store)
}

fn draft(title: &str, region: &str) -> PackageDraft {
    PackageDraft {
        title: title.into(),
        description: "A week on the road".into(),
        price: 12_000.0,
        location: "Leh".into(),
        region: region.into(),
        images: vec!["a.jpg".into(), "b.jpg".into()],
        ..Default::default()
    }
}

fn listing_draft(title: &str) -> ListingDraft {
    ListingDraft {
        title: title.into(),
        description: "Quiet homestay".into(),
        location: "Munnar".into(),
        price: 1800.0,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_package_slug_follows_title() {
    let catalog = service();
    let created = catalog.create_package(draft("Ladakh  Bike Trip!", "North")).await.unwrap();
    assert_eq!(created.slug, "ladakh-bike-trip");
    assert_eq!(catalog.package_by_slug("ladakh-bike-trip").await.unwrap().id, created.id);

    let mut edit = draft("Ladakh -- Zanskar Loop", "North");
    edit.images = vec!["c.jpg".into()];
    let updated = catalog
        .update_package(created.id, edit, &["a.jpg".to_string()])
        .await
        .unwrap();

    assert_eq!(updated.slug, "ladakh-zanskar-loop");
    assert_eq!(updated.images, vec!["b.jpg".to_string(), "c.jpg".to_string()]);
    assert_eq!(updated.version, 1);
    assert!(matches!(
        catalog.package_by_slug("ladakh-bike-trip").await,
        Err(CatalogError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_package_filters_and_delete() {
    let catalog = service();
    let north = catalog.create_package(draft("Spiti", "North")).await.unwrap();
    catalog.create_package(draft("Goa Beaches", "West")).await.unwrap();

    let filter = PackageFilter {
        region: Some("north".into()),
        ..Default::default()
    };
    let found = catalog.list_packages(&filter).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, north.id);
    assert_eq!(catalog.list_packages(&PackageFilter::default()).await.unwrap().len(), 2);

    catalog.delete_package(north.id).await.unwrap();
    assert!(matches!(catalog.package(north.id).await, Err(CatalogError::NotFound(_))));
    assert!(matches!(catalog.delete_package(north.id).await, Err(CatalogError::NotFound(_))));
}

#[tokio::test]
async fn test_invalid_package_rejected() {
    let catalog = service();
    let mut bad = draft("Free Trip", "South");
    bad.price = 0.0;
    assert!(matches!(catalog.create_package(bad).await, Err(CatalogError::Validation(_))));
}

#[tokio::test]
async fn test_listing_approval_gate() {
    let catalog = service();
    let host = Uuid::new_v4();
    let listing = catalog.create_listing(host, listing_draft("Tea Garden Cottage")).await.unwrap();
    assert!(!listing.approved);
    assert!(catalog.public_listings().await.unwrap().is_empty());
    assert_eq!(catalog.host_listings(host).await.unwrap().len(), 1);

    catalog.set_listing_approval(listing.id, true).await.unwrap();
    assert_eq!(catalog.public_listings().await.unwrap().len(), 1);

    catalog.set_listing_approval(listing.id, false).await.unwrap();
    assert!(catalog.public_listings().await.unwrap().is_empty());
    assert_eq!(catalog.all_listings().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_only_owner_or_admin_manages_listing() {
    let catalog = service();
    let owner = Uuid::new_v4();
    let listing = catalog.create_listing(owner, listing_draft("Cliff House")).await.unwrap();

    let err = catalog
        .update_listing(Actor::Host(Uuid::new_v4()), listing.id, listing_draft("Stolen"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Forbidden(_)));

    let renamed = catalog
        .update_listing(Actor::Host(owner), listing.id, listing_draft("Cliff House Deluxe"))
        .await
        .unwrap();
    assert_eq!(renamed.title, "Cliff House Deluxe");
    assert_eq!(renamed.host_id, owner);

    assert!(matches!(
        catalog.delete_listing(Actor::Host(Uuid::new_v4()), listing.id).await,
        Err(CatalogError::Forbidden(_))
    ));
    catalog.delete_listing(Actor::Admin, listing.id).await.unwrap();
    assert!(matches!(catalog.listing(listing.id).await, Err(CatalogError::NotFound(_))));
}
