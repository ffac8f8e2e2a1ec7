//! Response bodies for the navigation host.
//!
//! # Responsibilities
//! - Flatten a `Resolution` / `Navigation` into JSON
//! - Map navigation errors to HTTP status codes
//!
//! # Design Decisions
//! - The fallback route answers 404 with a full body, so a client still gets
//!   the not-found view to render
//! - View load failures are upstream failures (502)

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::navigation::{Navigation, NavigationError};
use crate::routing::{Resolution, RouteTable};
use crate::views::LoadError;

/// One entry of the matched chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedRoute {
    pub name: Option<String>,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<String>,
}

/// Summary of a loaded view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewSummary {
    pub module: String,
    pub size_bytes: usize,
}

/// JSON answer to a navigation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationBody {
    pub path: String,
    pub title: String,
    /// Name of the innermost matched route.
    pub route: Option<String>,
    pub matched: Vec<MatchedRoute>,
    pub params: BTreeMap<String, String>,
    pub query: Option<String>,
    pub fragment: Option<String>,
    pub redirected_from: Option<String>,
    pub outcome: String,
    /// Loaded views, outermost first. Empty when only resolving.
    pub views: Vec<ViewSummary>,
}

impl NavigationBody {
    /// Body for a bare resolution, without loaded views.
    pub fn from_resolution(resolution: &Resolution, default_title: &str) -> Self {
        Self {
            path: resolution.location.path.clone(),
            title: resolution.title().unwrap_or(default_title).to_string(),
            route: resolution.name().map(str::to_string),
            matched: resolution
                .matched
                .iter()
                .map(|r| MatchedRoute {
                    name: r.name.clone(),
                    path: r.path.clone(),
                    view: r.view.as_ref().map(|v| v.module.clone()),
                })
                .collect(),
            params: resolution.params.clone(),
            query: resolution.location.query.clone(),
            fragment: resolution.location.fragment.clone(),
            redirected_from: resolution.redirected_from.clone(),
            outcome: resolution.outcome().as_str().to_string(),
            views: Vec::new(),
        }
    }

    pub fn from_navigation(navigation: &Navigation) -> Self {
        let mut body = Self::from_resolution(&navigation.resolution, &navigation.title);
        body.title = navigation.title.clone();
        body.views = navigation
            .views
            .iter()
            .map(|v| ViewSummary {
                module: v.module.clone(),
                size_bytes: v.size_bytes,
            })
            .collect();
        body
    }
}

/// A navigation answer: 200, or 404 when the fallback route matched.
pub struct NavigationResponse(pub Navigation);

impl IntoResponse for NavigationResponse {
    fn into_response(self) -> Response {
        let status = if self.0.resolution.is_fallback {
            StatusCode::NOT_FOUND
        } else {
            StatusCode::OK
        };
        (status, Json(NavigationBody::from_navigation(&self.0))).into_response()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    module: Option<String>,
}

pub fn error_status(err: &NavigationError) -> StatusCode {
    match err {
        NavigationError::ViewLoad(LoadError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
        NavigationError::ViewLoad(_) => StatusCode::BAD_GATEWAY,
        NavigationError::Aborted { .. } => StatusCode::FORBIDDEN,
    }
}

impl IntoResponse for NavigationError {
    fn into_response(self) -> Response {
        let module = match &self {
            NavigationError::ViewLoad(
                LoadError::NotFound(module)
                | LoadError::Io { module, .. }
                | LoadError::Timeout { module, .. }
                | LoadError::Rejected { module, .. },
            ) => Some(module.clone()),
            NavigationError::Aborted { .. } => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            module,
        };
        (error_status(&self), Json(body)).into_response()
    }
}

/// Flattened route table row for `/_router/routes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRow {
    pub name: Option<String>,
    pub path: String,
    pub depth: usize,
    pub view: Option<String>,
    pub eager: bool,
    pub redirect: Option<String>,
    pub title: Option<String>,
}

/// Rows in declaration order, children after their parent.
pub fn route_rows(table: &RouteTable) -> Vec<RouteRow> {
    table
        .routes()
        .map(|r| RouteRow {
            name: r.name.clone(),
            path: r.path.clone(),
            depth: r.depth,
            view: r.view.as_ref().map(|v| v.module.clone()),
            eager: r.view.as_ref().map(|v| v.eager).unwrap_or(false),
            redirect: r.redirect.as_ref().map(|target| target.to_string()),
            title: r.title.clone(),
        })
        .collect()
}
