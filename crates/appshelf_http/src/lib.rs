//! # appshelf HTTP
//!
//! `appshelf_http` serves the catalog assembled by [`appshelf_core::Catalog`] over HTTP. It is
//! generic over [`appshelf_core::Registry`] so the same router works against any registry
//! implementation.
//!
//! ## Example `main.rs`
//!
//! ```rust,no_run
//! use anyhow::Result;
//!
//! use appshelf_core::{HubClient, RegistryConfig};
//! use appshelf_http::AppShelf;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = HubClient::new(RegistryConfig::default())?;
//!     let router = AppShelf::new(client).router()?;
//!
//!     axum::Server::bind(&"0.0.0.0:3000".parse()?)
//!         .serve(router.into_make_service())
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Routes
//!
//! * `GET /apps`: JSON array of `{ name, location, description, pictureUrl }`, always `200`
//! * `GET /api-docs/openapi.json`: OpenAPI document for the above
//! * anything else: `404` with a JSON `{ "message": "not found" }` body
use axum::http::header::{self, HeaderValue};
use axum::routing::get;
use axum::Router;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::{self, TraceLayer};

use appshelf_core::{Catalog, Registry};

mod errors;
pub use errors::{Error, Result};

mod apps;
mod docs;

/// Owns the catalog and provides the [`axum::Router`] serving it.
#[derive(Clone)]
pub struct AppShelf<R: Registry> {
    catalog: Catalog<R>,
}

impl<R: Registry> AppShelf<R> {
    pub fn new(registry: R) -> Self {
        Self {
            catalog: Catalog::new(registry),
        }
    }

    /// Return an [`axum::Router`] serving the catalog.
    pub fn router(&self) -> Result<Router> {
        let app = Router::new()
            .route("/apps", get(apps::list_apps::<R>))
            .route("/api-docs/openapi.json", get(docs::openapi))
            .fallback(not_found)
            .with_state(self.catalog.clone())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(trace::DefaultMakeSpan::new().include_headers(true))
                    .on_response(trace::DefaultOnResponse::new())
                    .on_request(trace::DefaultOnRequest::new()),
            )
            .layer(SetResponseHeaderLayer::if_not_present(
                header::CONTENT_TYPE,
                HeaderValue::from_str("application/json")?,
            ));

        Ok(app)
    }
}

async fn not_found() -> Error {
    Error::NotFound
}
