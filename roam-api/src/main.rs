use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use roam_api::{
    app,
    state::{AppState, AuthConfig, Backends, Settings},
};
use roam_booking::ReservationRepository;
use roam_catalog::{ListingRepository, PackageRepository};
use roam_core::{Notifier, TextInvoiceRenderer};
use roam_store::{Config, FsArtifactStore, LogNotifier, MemoryStore, PgDocumentStore, RazorpayClient, SmtpNotifier};
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type Stores = (
    Arc<dyn ReservationRepository>,
    Arc<dyn PackageRepository>,
    Arc<dyn ListingRepository>,
);

fn shared<S>(store: Arc<S>) -> Stores
where
    S: ReservationRepository + PackageRepository + ListingRepository + 'static,
{
    let reservations: Arc<dyn ReservationRepository> = store.clone();
    let packages: Arc<dyn PackageRepository> = store.clone();
    let listings: Arc<dyn ListingRepository> = store;
    (reservations, packages, listings)
}

async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    match config.database.url.as_deref() {
        Some(url) => {
            let store = PgDocumentStore::connect(url).await.context("Failed to connect to Postgres")?;
            store.migrate().await.context("Failed to run migrations")?;
            Ok(shared(Arc::new(store)))
        }
        None => {
            tracing::warn!("No database.url configured, bookings are kept in memory");
            Ok(shared(Arc::new(MemoryStore::new())))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roam_api=debug,roam_booking=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Roam API on port {}", config.server.port);

    let (reservations, packages, listings) = open_stores(&config).await?;

    let notifier: Arc<dyn Notifier> = match config.email.smtp_host.as_deref() {
        Some(host) => Arc::new(SmtpNotifier::new(&config.email, host).context("Failed to configure SMTP")?),
        None => {
            tracing::warn!("No email.smtp_host configured, outgoing mail is only logged");
            Arc::new(LogNotifier)
        }
    };
    let gateway = RazorpayClient::new(&config.payments).context("Failed to build payment gateway client")?;

    let state = AppState::assemble(
        Backends {
            reservations,
            packages,
            listings,
            notifier,
            invoices: Arc::new(TextInvoiceRenderer::new(config.business_rules.brand_name.clone())),
            gateway: Arc::new(gateway),
            artifacts: Arc::new(FsArtifactStore::new(&config.uploads.dir, config.uploads.public_base.clone())),
        },
        Settings {
            key_secret: config.payments.key_secret.clone(),
            currency: config.payments.currency.clone(),
            brand: config.business_rules.brand_name.clone(),
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
                expiration: config.auth.jwt_expiration_seconds,
            },
        },
    );

    let app = app(state).nest_service("/uploads", ServeDir::new(&config.uploads.dir));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.context("Failed to bind listener")?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
