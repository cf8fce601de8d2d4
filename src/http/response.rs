//! Response rendering.
//!
//! # Responsibilities
//! - Turn a `RoutingOutcome` into a redirect or the local 404 page
//! - Map `RoutingError` to a status code and plain-text body
//!
//! # Design Decisions
//! - Redirects are always 307 so the client repeats the original method
//! - An unreadable 404 page still yields a 404, with a plain-text body

use std::path::{Path, PathBuf};

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::config::NotFoundStyle;
use crate::routing::{RedirectPlanner, RoutingError, RoutingOutcome};

/// Public path of the not-found page under the static prefix.
pub const NOT_FOUND_PUBLIC_PATH: &str = "/static/404.html";

/// How and from where the not-found page is delivered.
#[derive(Debug, Clone)]
pub struct NotFoundPage {
    path: PathBuf,
    style: NotFoundStyle,
}

impl NotFoundPage {
    pub fn new(static_dir: impl AsRef<Path>, style: NotFoundStyle) -> Self {
        Self {
            path: static_dir.as_ref().join("404.html"),
            style,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn render(&self) -> Response {
        if self.style == NotFoundStyle::Redirect {
            return Redirect::temporary(NOT_FOUND_PUBLIC_PATH).into_response();
        }

        match tokio::fs::read(&self.path).await {
            Ok(page) => (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                page,
            )
                .into_response(),
            Err(e) => {
                tracing::warn!(path = ?self.path, error = %e, "Failed to read 404 page");
                (StatusCode::NOT_FOUND, "404 page not found").into_response()
            }
        }
    }
}

/// Render a successful routing decision.
pub async fn render_outcome(
    outcome: RoutingOutcome,
    planner: &RedirectPlanner,
    not_found: &NotFoundPage,
) -> Response {
    match outcome {
        RoutingOutcome::Loading(app_url) => {
            Redirect::temporary(planner.loading_redirect_url(&app_url).as_str()).into_response()
        }
        RoutingOutcome::Landing => Redirect::temporary(planner.landing_page_url()).into_response(),
        RoutingOutcome::NotFound => not_found.render().await,
    }
}

impl IntoResponse for RoutingError {
    fn into_response(self) -> Response {
        (self.status_code(), self.to_string()).into_response()
    }
}
