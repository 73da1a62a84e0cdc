//! HTTP server for address creation and lookup.
//!
//! Exposes the normalizer behind a small JSON API: the autocomplete widget
//! posts its component mapping here and receives the canonical, deduplicated
//! address back.

use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use uuid::Uuid;

use quadra::config::Config;
use quadra::error::AddressError;
use quadra::geocode::NominatimClient;
use quadra::models::{Address, AddressComponents, AddressInput};
use quadra::normalize::AddressNormalizer;
use quadra::notify::WebhookNotifier;
use quadra::storage::MemoryStore;
use quadra::error::SubmissionError;
use quadra::submission::AddressSubmission;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Address normalization server")]
struct Args {
    /// Listen address
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    listen: String,

    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "quadra.toml")]
    config: String,
}

/// Application state shared across handlers
struct AppState {
    normalizer: AddressNormalizer,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("Quadra address server");
    let config = Config::load_from_file(&args.config)?;

    let store = Arc::new(MemoryStore::new());
    let geocoder = Arc::new(NominatimClient::new(&config.geocoder)?);
    let mut normalizer = AddressNormalizer::new(store, geocoder);
    if let Some(notify) = &config.notify {
        info!("Save notifications go to {}", notify.webhook_url);
        normalizer.add_listener(Arc::new(WebhookNotifier::new(notify.webhook_url.clone())));
    }

    let state = Arc::new(AppState { normalizer });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/addresses", post(create_address_handler))
        .route("/v1/addresses/{id}", get(get_address_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", args.listen);

    let listener = tokio::net::TcpListener::bind(&args.listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

/// Accept a widget submission and normalize it into a stored address.
async fn create_address_handler(
    State(state): State<Arc<AppState>>,
    Json(submission): Json<AddressSubmission>,
) -> Result<Json<AddressResponse>, (StatusCode, String)> {
    let components = submission
        .validate()
        .map_err(|e| (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    // Validation guarantees a non-empty raw string, so normalization always
    // produces an address here.
    let address = state
        .normalizer
        .normalize(Some(AddressInput::Components(components)))
        .await
        .map_err(map_address_error)?
        .ok_or((
            StatusCode::UNPROCESSABLE_ENTITY,
            SubmissionError::MissingRaw.to_string(),
        ))?;

    let components = state
        .normalizer
        .components_of(&address)
        .await
        .map_err(map_address_error)?;

    Ok(Json(AddressResponse {
        address,
        components,
    }))
}

/// Fetch a stored address with its resolved components.
async fn get_address_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<AddressResponse>, (StatusCode, String)> {
    // An `Existing` input either resolves or fails with `AddressNotFound`,
    // which `map_address_error` turns into a 404.
    let Some(address) = state
        .normalizer
        .normalize(Some(AddressInput::Existing(id)))
        .await
        .map_err(map_address_error)?
    else {
        unreachable!("an Existing input never normalizes to None");
    };

    let components = state
        .normalizer
        .components_of(&address)
        .await
        .map_err(map_address_error)?;

    Ok(Json(AddressResponse {
        address,
        components,
    }))
}

#[derive(Serialize)]
struct AddressResponse {
    address: Address,
    components: AddressComponents,
}

fn map_address_error(e: AddressError) -> (StatusCode, String) {
    match e {
        AddressError::InvalidCode { .. } => (StatusCode::UNPROCESSABLE_ENTITY, e.to_string()),
        AddressError::AddressNotFound(_) => (StatusCode::NOT_FOUND, e.to_string()),
        _ => {
            tracing::error!("Address operation failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_address_maps_to_not_found() {
        let (status, _) = map_address_error(AddressError::AddressNotFound(Uuid::new_v4()));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_invalid_code_maps_to_unprocessable() {
        let (status, _) = map_address_error(AddressError::InvalidCode {
            kind: "country",
            code: "BRA".into(),
        });
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
