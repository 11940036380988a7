//! # hs-api Handlers
//!
//! JSON endpoints. Each handler decodes the request, calls into
//! `hs_core`, and shapes the response; no business rules live here.

use actix_web::{web, HttpResponse};
use hs_core::accounts::{self, Credentials, Registration};
use hs_core::issues::{self, IssueDraft, IssueFilter};
use hs_core::models::SessionUser;
use hs_core::traits::{AuthProvider, HostelStore};
use hs_core::AppError;
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::session;

/// State shared across all Actix-web workers.
pub struct AppState {
    pub store: Box<dyn HostelStore>,
    pub auth: Box<dyn AuthProvider>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdate {
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolveRequest {
    pub admin_id: Option<i64>,
    pub notes: Option<String>,
}

pub async fn list_facilities(data: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let facilities = data.store.list_facilities().await.map_err(AppError::from)?;
    Ok(HttpResponse::Ok().json(facilities))
}

pub async fn create_issue(
    data: web::Data<AppState>,
    body: web::Json<IssueDraft>,
) -> Result<HttpResponse, ApiError> {
    let issue = issues::create_issue(&*data.store, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "issue": issue })))
}

pub async fn list_issues(
    data: web::Data<AppState>,
    query: web::Query<IssueFilter>,
) -> Result<HttpResponse, ApiError> {
    let records = issues::list_issues(&*data.store, &query).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true, "issues": records })))
}

pub async fn issue_stats(
    data: web::Data<AppState>,
    query: web::Query<IssueFilter>,
) -> Result<HttpResponse, ApiError> {
    let stats = issues::issue_stats(&*data.store, &query).await?;
    Ok(HttpResponse::Ok().json(stats))
}

pub async fn update_issue(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let issue = issues::update_status(&*data.store, path.into_inner(), body.status.as_deref()).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Issue updated successfully",
        "issue": issue,
    })))
}

pub async fn resolve_issue(
    data: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<ResolveRequest>,
) -> Result<HttpResponse, ApiError> {
    let ResolveRequest { admin_id, notes } = body.into_inner();
    let admin_id =
        admin_id.ok_or_else(|| AppError::ValidationError("Missing admin_id".into()))?;

    let (issue, resolution) =
        issues::resolve_issue(&*data.store, path.into_inner(), admin_id, notes).await?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Issue resolved",
        "issue": issue,
        "resolution": resolution,
    })))
}

pub async fn get_resolution(
    data: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let issue_id = path.into_inner();
    let resolution = match data.store.resolutions() {
        Some(repo) => repo.resolution_for(issue_id).await.map_err(AppError::from)?,
        None => None,
    };
    let resolution = resolution.ok_or_else(|| AppError::NotFound("resolution".into()))?;
    Ok(HttpResponse::Ok().json(resolution))
}

pub async fn login(
    data: web::Data<AppState>,
    body: web::Json<Credentials>,
) -> Result<HttpResponse, ApiError> {
    let user = accounts::authenticate(&*data.store, &*data.auth, body.into_inner())
        .await
        .map_err(ApiError::account)?;
    let cookie = session::login_cookie(&user).map_err(ApiError::account)?;
    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(json!({ "success": true, "user": user })))
}

pub async fn register(
    data: web::Data<AppState>,
    body: web::Json<Registration>,
) -> Result<HttpResponse, ApiError> {
    let student = accounts::register(&*data.store, &*data.auth, body.into_inner())
        .await
        .map_err(ApiError::account)?;
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Account created successfully",
        "user": SessionUser::from(&student),
    })))
}

pub async fn health() -> HttpResponse {
    HttpResponse::Ok().body("ok")
}
