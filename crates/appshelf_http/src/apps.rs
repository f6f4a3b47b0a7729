use axum::extract::State;
use axum::Json;

use appshelf_core::{AppRecord, Catalog, Registry};

/// Always answers `200`; upstream failures surface as missing or degraded entries.
pub(crate) async fn list_apps<R: Registry>(
    State(catalog): State<Catalog<R>>,
) -> Json<Vec<AppRecord>> {
    Json(catalog.fetch_all().await)
}
