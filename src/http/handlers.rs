//! Route handlers.
//!
//! # Routes
//! - `GET /` landing page
//! - `GET /health` liveness
//! - `POST /fetch` fetch + transform a page, JSON envelope
//! - `GET /proxy-resource?url=` fetch a sub-resource, CSS recolored

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::fetch::ContentKind;
use crate::http::error::ApiError;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;

const LANDING_PAGE: &str = include_str!("../../static/index.html");

#[derive(Debug, Default, Deserialize)]
pub struct FetchRequest {
    #[serde(default)]
    pub url: Option<String>,
}

impl FetchRequest {
    /// Accept JSON bodies and urlencoded forms. Anything unparseable has no URL.
    pub fn from_body(headers: &HeaderMap, body: &[u8]) -> Self {
        let is_form = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let url = url::form_urlencoded::parse(body)
                .find(|(k, _)| k == "url")
                .map(|(_, v)| v.into_owned());
            Self { url }
        } else {
            serde_json::from_slice(body).unwrap_or_default()
        }
    }

    fn target(&self) -> Option<&str> {
        self.url.as_deref().map(str::trim).filter(|u| !u.is_empty())
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub success: bool,
    pub content: String,
    pub title: String,
    pub original_url: String,
}

#[derive(Debug, Deserialize)]
pub struct ResourceQuery {
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn index() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn fetch_page(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let start = Instant::now();
    let result = fetch_page_inner(&state, &headers, &body).await;
    let response = match result {
        Ok(json) => json.into_response(),
        Err(e) => {
            if e.status().is_server_error() {
                tracing::error!(request_id = %request_id(&headers), error = %e, "Fetch failed");
            }
            e.into_response()
        }
    };
    metrics::record_request("fetch", response.status().as_u16(), start);
    response
}

async fn fetch_page_inner(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<FetchResponse>, ApiError> {
    let request = FetchRequest::from_body(headers, body);
    let target = request.target().ok_or(ApiError::Validation("URL is required"))?;

    let resource = state
        .gateway
        .fetch(target)
        .await
        .map_err(|e| ApiError::Content(e.to_string()))?;
    metrics::record_upstream_bytes(resource.kind().as_str(), resource.body.len());

    let transformed = state
        .transformer
        .transform(&resource.text(), &resource.url)
        .map_err(|e| ApiError::Content(e.to_string()))?;

    tracing::info!(
        request_id = %request_id(headers),
        url = %resource.url,
        title = %transformed.title,
        "Page transformed"
    );

    Ok(Json(FetchResponse {
        success: true,
        content: transformed.content,
        title: transformed.title,
        original_url: target.to_string(),
    }))
}

pub async fn proxy_resource(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ResourceQuery>, QueryRejection>,
) -> Response {
    let start = Instant::now();
    let query = match query {
        Ok(Query(query)) => query,
        Err(e) => {
            tracing::debug!(request_id = %request_id(&headers), error = %e, "Rejected resource query");
            ResourceQuery { url: None }
        }
    };
    let response = match proxy_resource_inner(&state, &headers, query).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    };
    metrics::record_request("proxy_resource", response.status().as_u16(), start);
    response
}

async fn proxy_resource_inner(
    state: &AppState,
    headers: &HeaderMap,
    query: ResourceQuery,
) -> Result<Response, ApiError> {
    let target = query
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or(ApiError::Validation("Resource URL is required"))?;

    let resource = state.gateway.fetch(target).await.map_err(|e| {
        tracing::error!(request_id = %request_id(headers), url = %target, error = %e, "Error fetching resource");
        ApiError::Resource
    })?;

    let kind = resource.kind();
    metrics::record_upstream_bytes(kind.as_str(), resource.body.len());

    let content_type = resource
        .content_type
        .as_deref()
        .and_then(|ct| HeaderValue::from_str(ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    let response = match kind {
        ContentKind::Css => {
            let css = state.colors.rewrite(&resource.text());
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], css).into_response()
        }
        ContentKind::Html | ContentKind::Other => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], resource.body).into_response()
        }
    };

    tracing::debug!(
        request_id = %request_id(headers),
        url = %resource.url,
        kind = kind.as_str(),
        "Resource proxied"
    );

    Ok(response)
}
