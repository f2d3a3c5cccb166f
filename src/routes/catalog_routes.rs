use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use tracing::{debug, error};

use ecg_viewer::{CatalogFilters, SignalType, TypeFilters};

use crate::routes::error_response;
use crate::state::app_state::AppState;

/// Query of GET /records. `types` is a comma separated list.
#[derive(Deserialize, Debug, Default)]
pub struct RecordsQuery {
    pub types: Option<String>,
    pub search: Option<String>,
    pub owner: Option<String>,
}

impl RecordsQuery {
    pub fn into_filters(self) -> Result<CatalogFilters, String> {
        let types = match self.types.as_deref() {
            Some(list) => {
                let parsed = list
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::parse::<SignalType>)
                    .collect::<Result<Vec<_>, _>>()?;
                TypeFilters::only(&parsed)
            }
            None => TypeFilters::default(),
        };

        Ok(CatalogFilters {
            types,
            search_term: self.search.unwrap_or_default(),
            selected_owner: self.owner.filter(|o| !o.is_empty()),
        })
    }
}

#[derive(Deserialize, Debug)]
pub struct SearchRequest {
    pub term: String,
}

#[derive(Deserialize, Debug)]
pub struct OwnerRequest {
    pub owner: Option<String>,
}

/// =======================
/// ROUTER
/// =======================

pub fn catalog_routes(state: AppState) -> Router {
    Router::new()
        .route("/records", get(list_records))
        .route("/catalog", get(current_view))
        .route("/catalog/refresh", post(refresh_catalog))
        .route("/catalog/filters", get(current_filters))
        .route("/catalog/filters/toggle/{signal_type}", post(toggle_filter))
        .route("/catalog/search", put(set_search))
        .route("/catalog/owner", put(select_owner))
        .with_state(state)
}

/// =======================
/// HANDLERS
/// =======================

async fn list_records(State(state): State<AppState>, Query(query): Query<RecordsQuery>) -> Response {
    debug!("Listing records: {:?}", query);

    match query.into_filters() {
        Ok(filters) => Json(state.session.preview(&filters).await).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}

async fn current_view(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.view().await)
}

async fn current_filters(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.filters().await)
}

async fn refresh_catalog(State(state): State<AppState>) -> Response {
    match state.session.refresh_catalog().await {
        Ok(view) => Json(view).into_response(),
        Err(e) => {
            error!("{}", e);
            error_response(StatusCode::BAD_GATEWAY, e)
        }
    }
}

async fn toggle_filter(State(state): State<AppState>, Path(signal_type): Path<String>) -> Response {
    match signal_type.parse::<SignalType>() {
        Ok(ty) => Json(state.session.toggle_type_filter(ty).await).into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e),
    }
}

async fn set_search(State(state): State<AppState>, Json(request): Json<SearchRequest>) -> impl IntoResponse {
    Json(state.session.set_search_term(request.term).await)
}

async fn select_owner(State(state): State<AppState>, Json(request): Json<OwnerRequest>) -> impl IntoResponse {
    Json(state.session.select_owner(request.owner).await)
}
