use std::sync::Arc;

use roam_booking::{LifecycleManager, PaymentOrchestrator, ReservationRepository, SideEffects};
use roam_catalog::{CatalogService, ListingRepository, PackageRepository};
use roam_core::{ArtifactStore, InvoiceRenderer, Notifier, PaymentGateway, SignatureVerifier};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: LifecycleManager,
    pub payments: PaymentOrchestrator,
    pub catalog: CatalogService,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub auth: AuthConfig,
}

/// Storage and collaborator backends the state is wired from.
pub struct Backends {
    pub reservations: Arc<dyn ReservationRepository>,
    pub packages: Arc<dyn PackageRepository>,
    pub listings: Arc<dyn ListingRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub invoices: Arc<dyn InvoiceRenderer>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub artifacts: Arc<dyn ArtifactStore>,
}

/// Payment and branding settings needed to build the services.
pub struct Settings {
    pub key_secret: String,
    pub currency: String,
    pub brand: String,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn assemble(backends: Backends, settings: Settings) -> Self {
        let side_effects = SideEffects::new(backends.notifier, backends.invoices, settings.brand);

        let lifecycle = LifecycleManager::new(
            backends.reservations.clone(),
            backends.packages.clone(),
            backends.listings.clone(),
            side_effects.clone(),
        );
        let payments = PaymentOrchestrator::new(
            backends.gateway,
            SignatureVerifier::new(settings.key_secret),
            backends.reservations,
            side_effects,
            settings.currency,
        );

        Self {
            lifecycle,
            payments,
            catalog: CatalogService::new(backends.packages, backends.listings),
            artifacts: backends.artifacts,
            auth: settings.auth,
        }
    }
}
