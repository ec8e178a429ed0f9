use std::sync::Arc;

use axum::Router;
use axum::extract::{Form, Query, State};
use axum::http::header;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::app::model::{AllowedValues, ChartSnapshot, MoviesResponse, RefreshResponse, RejectedQuery};
use crate::app::panel::{self, PanelView};
use crate::app::source::{ChartSource, load_snapshot};
use crate::app::store::ChartStore;
use crate::export::{DOWNLOAD_FILE_NAME, to_json_bytes};
use crate::formats::MovieRecord;
use crate::query::{InvalidQueryError, QueryOptions, QueryParams, query};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ChartStore>,
    pub source: Arc<dyn ChartSource>,
}

impl AppState {
    pub fn new(store: Arc<ChartStore>, source: Arc<dyn ChartSource>) -> Self {
        Self { store, source }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/preview", post(preview))
        .route("/api/movies", get(api_movies))
        .route("/download.json", get(download_json))
        .route("/refresh", post(refresh))
        .route("/healthz", get(|| async { "ok\n" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn run_query(
    snapshot: &ChartSnapshot,
    params: &QueryParams,
) -> Result<(QueryOptions, Vec<MovieRecord>), InvalidQueryError> {
    let options = QueryOptions::from_params(params)?;
    let movies = query(&snapshot.records, &options)?;
    Ok((options, movies))
}

fn reject(err: &InvalidQueryError) -> Response {
    tracing::debug!(%err, "rejecting query");
    (
        StatusCode::BAD_REQUEST,
        Json(RejectedQuery {
            error: err.to_string(),
            allowed: AllowedValues::new(),
        }),
    )
        .into_response()
}

async fn index(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Response {
    render_panel(&state, &params).await
}

async fn preview(State(state): State<AppState>, Form(params): Form<QueryParams>) -> Response {
    render_panel(&state, &params).await
}

async fn render_panel(state: &AppState, params: &QueryParams) -> Response {
    let snapshot = state.store.snapshot().await;
    match run_query(&snapshot, params) {
        Ok((options, movies)) => Html(panel::render(&PanelView {
            snapshot: &snapshot,
            options,
            movies: &movies,
            error: None,
        }))
        .into_response(),
        Err(err) => {
            let message = err.to_string();
            let body = panel::render(&PanelView {
                snapshot: &snapshot,
                options: QueryOptions::default(),
                movies: &[],
                error: Some(&message),
            });
            (StatusCode::BAD_REQUEST, Html(body)).into_response()
        }
    }
}

async fn api_movies(State(state): State<AppState>, Query(params): Query<QueryParams>) -> Response {
    let snapshot = state.store.snapshot().await;
    let (options, movies) = match run_query(&snapshot, &params) {
        Ok(out) => out,
        Err(err) => return reject(&err),
    };

    Json(MoviesResponse {
        source: &snapshot.source,
        loaded_at: snapshot.loaded_at,
        filters: options,
        diagnostics: &snapshot.diagnostics,
        error: snapshot.error.as_deref(),
        count: movies.len(),
        movies,
    })
    .into_response()
}

async fn download_json(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Response {
    let snapshot = state.store.snapshot().await;
    let movies = match run_query(&snapshot, &params) {
        Ok((_, movies)) => movies,
        Err(err) => return reject(&err),
    };

    let body = match to_json_bytes(&movies) {
        Ok(body) => body,
        Err(err) => {
            tracing::error!(?err, "serialize download");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let mut resp = Response::new(axum::body::Body::from(body));
    resp.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    let Ok(disposition) =
        HeaderValue::from_str(&format!("attachment; filename=\"{DOWNLOAD_FILE_NAME}\""))
    else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    resp.headers_mut()
        .insert(header::CONTENT_DISPOSITION, disposition);
    resp
}

async fn refresh(State(state): State<AppState>) -> Result<Response, (StatusCode, String)> {
    let next = load_snapshot(state.source.as_ref()).await.map_err(|err| {
        tracing::warn!(?err, "refresh failed; keeping previous snapshot");
        (StatusCode::BAD_GATEWAY, format!("refresh failed: {err:#}"))
    })?;

    tracing::info!(
        source = %next.source,
        records = next.records.len(),
        "installing refreshed chart"
    );
    let source = next.source.clone();
    let loaded_at = next.loaded_at;
    let diagnostics = next.diagnostics.clone();
    state.store.replace(next).await;

    Ok(Json(RefreshResponse {
        source: &source,
        loaded_at,
        diagnostics: &diagnostics,
    })
    .into_response())
}
