//! HTTP routes
//!
//! - `GET /` - render the dashboard
//! - `POST /credentials` - set access key, secret key and region
//! - `POST /views/{view}/select` - pick the file a view shows
//! - `POST /views/explorer/column` - pick the histogram column
//! - `GET /views/{view}/export` - download the shown file as CSV
//! - `GET /health` - liveness check
//!
//! Form posts answer `303 See Other` back to the page.

use axum::{
    extract::{Form, Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::error;

use super::{html, Session, ViewId};
use crate::s3::Credentials;

/// Shared router state: the one dashboard session
#[derive(Clone)]
pub struct AppState {
    session: Arc<Mutex<Session>>,
}

impl AppState {
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsForm {
    #[serde(default)]
    access_key: String,
    #[serde(default)]
    secret_key: String,
    region: String,
}

#[derive(Debug, Deserialize)]
struct SelectForm {
    key: String,
}

#[derive(Debug, Deserialize)]
struct ColumnForm {
    column: String,
}

/// Create the dashboard router
pub fn router(session: Session) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/credentials", post(update_credentials))
        .route("/views/explorer/column", post(select_column))
        .route("/views/{view}/select", post(select_file))
        .route("/views/{view}/export", get(export))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(session))
}

/// GET / - render the whole dashboard
async fn index(State(state): State<AppState>) -> Html<String> {
    let mut session = state.session.lock().await;
    let page = session.render().await;
    Html(html::render_page(&page))
}

async fn health() -> &'static str {
    "ok"
}

/// POST /credentials
async fn update_credentials(State(state): State<AppState>, Form(form): Form<CredentialsForm>) -> Response {
    let credentials = Credentials::new(form.access_key, form.secret_key, form.region);
    let mut session = state.session.lock().await;

    match session.set_credentials(credentials) {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
    }
}

/// POST /views/{view}/select
async fn select_file(
    State(state): State<AppState>,
    Path(view): Path<String>,
    Form(form): Form<SelectForm>,
) -> Response {
    let view = match view.parse::<ViewId>() {
        Ok(view) => view,
        Err(e) => return (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    };

    state.session.lock().await.select(view, form.key);
    Redirect::to(&format!("/#{}", view.slug())).into_response()
}

/// POST /views/explorer/column
async fn select_column(State(state): State<AppState>, Form(form): Form<ColumnForm>) -> Redirect {
    state.session.lock().await.select_column(form.column);
    Redirect::to(&format!("/#{}", ViewId::Explorer.slug()))
}

/// GET /views/{view}/export
async fn export(State(state): State<AppState>, Path(view): Path<String>) -> Response {
    let view = match view.parse::<ViewId>() {
        Ok(view) => view,
        Err(e) => return (StatusCode::NOT_FOUND, e.to_string()).into_response(),
    };

    let mut session = state.session.lock().await;
    match session.export(view).await {
        Ok(Some(export)) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                export.file_name.replace('"', "\\\"")
            );
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                export.body,
            )
                .into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "No file loaded in this view").into_response(),
        Err(e) => {
            error!("Export from {} failed: {:#}", view, e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Export failed").into_response()
        }
    }
}
