use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::AppPath;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/invoice/{id}", get(download_invoice))
}

async fn download_invoice(State(state): State<AppState>, AppPath(id): AppPath<Uuid>) -> Result<Response, AppError> {
    let (reservation, invoice) = state.lifecycle.invoice(id).await?;
    let disposition = format!("inline; filename={}", invoice.file_name(reservation.id));

    Ok((
        [
            (header::CONTENT_TYPE, invoice.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        invoice.bytes,
    )
        .into_response())
}
