use axum::{http::Method, middleware::from_fn_with_state, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod bookings;
pub mod catalog;
pub mod error;
pub mod extract;
pub mod host_bookings;
pub mod invoice;
pub mod middleware;
pub mod payments;
pub mod state;

pub use state::AppState;

use middleware::{admin_auth_middleware, host_auth_middleware};

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let admin = Router::new()
        .merge(bookings::admin_routes())
        .merge(host_bookings::admin_routes())
        .merge(catalog::admin_routes())
        .route_layer(from_fn_with_state(state.clone(), admin_auth_middleware));

    let host = catalog::host_routes().route_layer(from_fn_with_state(state.clone(), host_auth_middleware));

    Router::new()
        .merge(bookings::routes())
        .merge(host_bookings::routes())
        .merge(payments::routes())
        .merge(invoice::routes())
        .merge(catalog::routes())
        .merge(admin)
        .merge(host)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
