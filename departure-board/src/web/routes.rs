//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post, put},
};

use crate::board::{BoardSnapshot, Settings, SettingsError};
use crate::domain::{Stop, StopConfig};
use crate::efa::{EfaError, TransitSource};

use super::dto::*;
use super::state::AppState;
use super::templates::*;

/// Create the application router.
pub fn create_router<S: TransitSource>(state: AppState<S>) -> Router {
    Router::new()
        .route("/", get(board_page::<S>))
        .route("/health", get(health))
        .route("/api/board", get(get_board::<S>))
        .route("/api/board/refresh", post(refresh_board::<S>))
        .route("/api/lifecycle", post(set_lifecycle::<S>))
        .route("/api/stops/search", get(search_stops::<S>))
        .route("/api/stops/:id/platforms", get(stop_platforms::<S>))
        .route("/api/settings", get(get_settings::<S>))
        .route("/api/settings/stops", post(add_stop::<S>))
        .route(
            "/api/settings/stops/:id",
            put(update_stop::<S>).delete(remove_stop::<S>),
        )
        .route(
            "/api/settings/refresh-interval",
            put(set_refresh_interval::<S>),
        )
        .route("/api/settings/max-departures", put(set_max_departures::<S>))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The departure board page.
async fn board_page<S: TransitSource>(
    State(state): State<AppState<S>>,
) -> Result<Html<String>, AppError> {
    let template = BoardTemplate {
        board: BoardView::from_snapshot(&state.board.snapshot()),
    };
    let html = template.render().map_err(|e| AppError::Internal {
        message: format!("Template error: {}", e),
    })?;
    Ok(Html(html))
}

/// Current board state.
async fn get_board<S: TransitSource>(State(state): State<AppState<S>>) -> Json<BoardSnapshot> {
    Json(state.board.snapshot())
}

/// Refresh every stop now and return the result.
async fn refresh_board<S: TransitSource>(
    State(state): State<AppState<S>>,
) -> Json<BoardSnapshot> {
    state.board.refresh_all().await;
    Json(state.board.snapshot())
}

/// Deliver a lifecycle signal (page shown or hidden).
async fn set_lifecycle<S: TransitSource>(
    State(state): State<AppState<S>>,
    Json(req): Json<LifecycleRequest>,
) -> Json<LifecycleResponse> {
    state.board.set_active(req.active).await;
    Json(LifecycleResponse {
        active: state.board.is_active().await,
    })
}

/// Search stops by name.
async fn search_stops<S: TransitSource>(
    State(state): State<AppState<S>>,
    Query(req): Query<StopSearchRequest>,
) -> Json<Vec<Stop>> {
    Json(state.board.search_stops(&req.q).await)
}

/// Platforms currently served at a stop.
async fn stop_platforms<S: TransitSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    let platforms = state.board.available_platforms(&id).await?;
    Ok(Json(platforms))
}

async fn get_settings<S: TransitSource>(State(state): State<AppState<S>>) -> Json<Settings> {
    Json(state.board.settings().snapshot())
}

/// Add a stop to the board.
async fn add_stop<S: TransitSource>(
    State(state): State<AppState<S>>,
    Json(req): Json<AddStopRequest>,
) -> Result<(StatusCode, Json<Settings>), AppError> {
    if req.id.trim().is_empty() || req.name.trim().is_empty() {
        return Err(AppError::BadRequest {
            message: "Stop id and name are required".to_string(),
        });
    }

    let config = req.into_config();
    validate_window(&config)?;

    let settings = state.board.settings();
    let status = if settings.add_stop(config)? {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(settings.snapshot())))
}

/// Update a configured stop.
async fn update_stop<S: TransitSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStopRequest>,
) -> Result<Json<Settings>, AppError> {
    let settings = state.board.settings();
    let existing = settings
        .stops()
        .into_iter()
        .find(|s| s.id == id)
        .ok_or_else(|| AppError::NotFound {
            message: format!("Stop {id} is not on the board"),
        })?;

    let config = req.apply(existing);
    validate_window(&config)?;

    settings.update_stop(config)?;
    Ok(Json(settings.snapshot()))
}

/// Remove a stop from the board.
async fn remove_stop<S: TransitSource>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Settings>, AppError> {
    let settings = state.board.settings();
    if !settings.remove_stop(&id)? {
        return Err(AppError::NotFound {
            message: format!("Stop {id} is not on the board"),
        });
    }
    Ok(Json(settings.snapshot()))
}

async fn set_refresh_interval<S: TransitSource>(
    State(state): State<AppState<S>>,
    Json(req): Json<RefreshIntervalRequest>,
) -> Result<Json<Settings>, AppError> {
    let settings = state.board.settings();
    settings.set_refresh_interval(req.seconds)?;
    Ok(Json(settings.snapshot()))
}

async fn set_max_departures<S: TransitSource>(
    State(state): State<AppState<S>>,
    Json(req): Json<MaxDeparturesRequest>,
) -> Result<Json<Settings>, AppError> {
    let settings = state.board.settings();
    settings.set_max_departures(req.count)?;
    Ok(Json(settings.snapshot()))
}

fn validate_window(config: &StopConfig) -> Result<(), AppError> {
    if config.time_from > config.time_to {
        return Err(AppError::BadRequest {
            message: format!(
                "timeFrom ({}) must not exceed timeTo ({})",
                config.time_from, config.time_to
            ),
        });
    }
    Ok(())
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Upstream { message: String },
    Internal { message: String },
}

impl From<EfaError> for AppError {
    fn from(e: EfaError) -> Self {
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl From<SettingsError> for AppError {
    fn from(e: SettingsError) -> Self {
        AppError::Internal {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            tracing::error!(%status, %message, "request failed");
        } else {
            tracing::debug!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
