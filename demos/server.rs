//! REST API server example for the plot inventory.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /plots` - Register a parcel
//! - `GET /plots/{id}` - Get a parcel with its claims
//! - `POST /claims` - Claim area on a parcel
//! - `PUT /claims/{id}` - Resize a claim
//! - `DELETE /claims/{id}` - Release a claim
//! - `GET /inventory/summary` - Overall occupancy
//! - `GET /inventory/periods?period=` - Occupancy per sales period
//! - `GET /inventory/sections?period=&status=&search=&sortBy=&sortOrder=&page=&limit=`
//! - `GET /inventory/areas?period=&search=&sortBy=&sortOrder=&page=&limit=`
//!
//! ## Example Usage
//!
//! ```bash
//! # Register a parcel
//! curl -X POST http://localhost:3000/plots \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": 1, "plotNumber": "A-56", "period": "1期", "totalAreaSqm": "3.6"}'
//!
//! # Claim half of it
//! curl -X POST http://localhost:3000/claims \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": 1, "physicalPlotId": 1, "claimedAreaSqm": "1.8"}'
//!
//! # Section breakdown, busiest first
//! curl 'http://localhost:3000/inventory/sections?sortBy=usageRate&sortOrder=desc'
//! ```

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use plot_inventory_rs::pager::Page;
use plot_inventory_rs::report::{
    AreaInventory, AreaQuery, OverallSummary, PeriodQuery, PeriodSummaries, SectionInventory,
    SectionQuery,
};
use plot_inventory_rs::{
    ClaimRejection, ContractPlot, ContractPlotId, InventoryError, LedgerError, NewPhysicalPlot,
    PhysicalPlot, PhysicalPlotId, PlotRegistry, StoreError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

// === Request/Response DTOs ===

/// Request body for creating a claim.
///
/// ```json
/// {"id": 1, "physicalPlotId": 1, "claimedAreaSqm": "1.8"}
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub id: u32,
    pub physical_plot_id: u32,
    pub claimed_area_sqm: Decimal,
}

/// Request body for resizing a claim.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeRequest {
    pub claimed_area_sqm: Decimal,
}

/// Response body for a parcel and every claim on it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlotResponse {
    #[serde(flatten)]
    pub plot: PhysicalPlot,
    pub available_area_sqm: Decimal,
    pub claims: Vec<ContractPlot>,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the registry.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<PlotRegistry>,
}

// === Error Handling ===

/// Wrapper for converting library errors into HTTP responses.
pub enum AppError {
    Ledger(LedgerError),
    Inventory(InventoryError),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError::Ledger(err)
    }
}

impl From<InventoryError> for AppError {
    fn from(err: InventoryError) -> Self {
        AppError::Inventory(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Ledger(err) => {
                let (status, code) = match err {
                    LedgerError::PlotNotFound(_) => (StatusCode::NOT_FOUND, "PLOT_NOT_FOUND"),
                    LedgerError::ClaimNotFound(_) => (StatusCode::NOT_FOUND, "CLAIM_NOT_FOUND"),
                    LedgerError::ClaimReleased(_) => (StatusCode::CONFLICT, "CLAIM_RELEASED"),
                    LedgerError::ClaimRejected {
                        reason: ClaimRejection::NonPositiveArea,
                        ..
                    } => (StatusCode::BAD_REQUEST, "NON_POSITIVE_AREA"),
                    LedgerError::ClaimRejected {
                        reason: ClaimRejection::ExceedsAvailableArea,
                        ..
                    } => (StatusCode::UNPROCESSABLE_ENTITY, "EXCEEDS_AVAILABLE_AREA"),
                    LedgerError::AreaBelowActiveClaims { .. } => {
                        (StatusCode::UNPROCESSABLE_ENTITY, "AREA_BELOW_ACTIVE_CLAIMS")
                    }
                    LedgerError::InvalidArea => (StatusCode::BAD_REQUEST, "INVALID_AREA"),
                    LedgerError::Store(StoreError::DuplicatePlot(_)) => {
                        (StatusCode::CONFLICT, "DUPLICATE_PLOT")
                    }
                    LedgerError::Store(StoreError::DuplicateClaim(_)) => {
                        (StatusCode::CONFLICT, "DUPLICATE_CLAIM")
                    }
                    LedgerError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
                };
                (status, code, err.to_string())
            }
            // Scan failures are not detailed to clients.
            AppError::Inventory(err) => {
                tracing::error!(%err, "report failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal error".to_string(),
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /plots - Register a parcel.
async fn register_plot(
    State(state): State<AppState>,
    Json(request): Json<NewPhysicalPlot>,
) -> Result<(StatusCode, Json<PhysicalPlot>), AppError> {
    let plot = state.registry.register_plot(request)?;
    Ok((StatusCode::CREATED, Json(plot)))
}

/// GET /plots/{id} - Get a parcel with its claims.
async fn get_plot(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<PlotResponse>, AppError> {
    let id = PhysicalPlotId(id);
    Ok(Json(PlotResponse {
        plot: state.registry.plot(id)?,
        available_area_sqm: state.registry.available_area(id)?,
        claims: state.registry.claims(id)?,
    }))
}

/// POST /claims - Claim area on a parcel.
async fn create_claim(
    State(state): State<AppState>,
    Json(request): Json<ClaimRequest>,
) -> Result<(StatusCode, Json<ContractPlot>), AppError> {
    let claim = state.registry.create_claim(
        PhysicalPlotId(request.physical_plot_id),
        ContractPlotId(request.id),
        request.claimed_area_sqm,
        Utc::now(),
    )?;
    Ok((StatusCode::CREATED, Json(claim)))
}

/// PUT /claims/{id} - Resize a claim.
async fn resize_claim(
    State(state): State<AppState>,
    Path(id): Path<u32>,
    Json(request): Json<ResizeRequest>,
) -> Result<Json<ContractPlot>, AppError> {
    let claim = state
        .registry
        .resize_claim(ContractPlotId(id), request.claimed_area_sqm)?;
    Ok(Json(claim))
}

/// DELETE /claims/{id} - Release a claim.
async fn release_claim(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<ContractPlot>, AppError> {
    Ok(Json(state.registry.release_claim(ContractPlotId(id))?))
}

async fn summary(State(state): State<AppState>) -> Result<Json<OverallSummary>, AppError> {
    Ok(Json(state.registry.summary()?))
}

async fn periods(
    State(state): State<AppState>,
    Query(query): Query<PeriodQuery>,
) -> Result<Json<PeriodSummaries>, AppError> {
    Ok(Json(state.registry.periods(query.period)?))
}

async fn sections(
    State(state): State<AppState>,
    Query(query): Query<SectionQuery>,
) -> Result<Json<Page<SectionInventory>>, AppError> {
    Ok(Json(state.registry.sections(&query)?))
}

async fn areas(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> Result<Json<Page<AreaInventory>>, AppError> {
    Ok(Json(state.registry.areas(&query)?))
}

// === Router ===

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/plots", post(register_plot))
        .route("/plots/{id}", get(get_plot))
        .route("/claims", post(create_claim))
        .route(
            "/claims/{id}",
            axum::routing::put(resize_claim).delete(release_claim),
        )
        .route("/inventory/summary", get(summary))
        .route("/inventory/periods", get(periods))
        .route("/inventory/sections", get(sections))
        .route("/inventory/areas", get(areas))
        .with_state(state)
}

// === Journal ===

/// Drains the ledger journal every `every`, logging each event.
pub fn spawn_journal_drain(registry: Arc<PlotRegistry>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            for event in registry.events() {
                tracing::debug!(?event, "ledger event");
            }
        }
    })
}

// === Main ===

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let registry = Arc::new(PlotRegistry::new());
    spawn_journal_drain(registry.clone(), Duration::from_secs(5));
    let state = AppState { registry };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Plot inventory API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST   /plots               - Register a parcel");
    println!("  GET    /plots/:id           - Get a parcel with its claims");
    println!("  POST   /claims              - Claim area on a parcel");
    println!("  PUT    /claims/:id          - Resize a claim");
    println!("  DELETE /claims/:id          - Release a claim");
    println!("  GET    /inventory/summary   - Overall occupancy");
    println!("  GET    /inventory/periods   - Occupancy per period");
    println!("  GET    /inventory/sections  - Occupancy per section");
    println!("  GET    /inventory/areas     - Occupancy per area size");

    axum::serve(listener, app).await.unwrap();
}
