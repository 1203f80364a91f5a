//! Page Handlers
//!
//! Placeholder bodies for the console pages. Rendering is not done here; an
//! authorized request gets a JSON description of who it was authorized as.

use axum::{
    extract::{Query, Request},
    http::Uri,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::dto::{AdminContextResponse, SearchQuery};
use crate::application::services::AdminContext;
use crate::shared::error::AppError;

#[derive(Debug, Deserialize)]
pub struct LoginPageQuery {
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LoginPageResponse {
    pub page: &'static str,
    /// Where to go after signing in; only same-origin paths are echoed back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    #[serde(flatten)]
    pub admin: AdminContextResponse,
}

pub async fn login_page(Query(query): Query<LoginPageQuery>) -> Json<LoginPageResponse> {
    Json(LoginPageResponse {
        page: "login",
        redirect: query.redirect.filter(|target| is_local_path(target)),
    })
}

/// Any path the guard authorized. Unprotected unknown paths are 404.
pub async fn protected_page(request: Request) -> Result<Json<AdminContextResponse>, AppError> {
    let path = request.uri().path();
    match request.extensions().get::<AdminContext>() {
        Some(admin) => Ok(Json(AdminContextResponse::new(path, admin))),
        None => Err(AppError::NotFound(format!("No page at {}", path))),
    }
}

pub async fn search(
    uri: Uri,
    Extension(admin): Extension<AdminContext>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, AppError> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    Ok(Json(SearchResponse {
        query: query.q,
        admin: AdminContextResponse::new(uri.path(), &admin),
    }))
}

/// Same-origin absolute path, not a protocol-relative URL.
fn is_local_path(target: &str) -> bool {
    target.starts_with('/') && !target.starts_with("//") && !target.contains('\\')
}
