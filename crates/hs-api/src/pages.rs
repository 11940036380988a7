//! # Pages
//!
//! Server-rendered dashboards. Every protected page runs the route guard
//! first and answers with a redirect when access is refused.

use actix_web::http::{header, StatusCode};
use actix_web::{web, HttpResponse};
use askama::Template;
use hs_core::accounts::{self, Credentials, Registration};
use hs_core::guard::{self, Access, Area, LOGIN_PATH};
use hs_core::issues::{self, IssueDraft, IssueFilter};
use hs_core::models::{FacilityCategory, IssueRecord, IssueScope, IssueStats, IssueStatus, SessionUser};
use hs_core::views::{IssueView, StatusFilter};
use hs_core::AppError;
use hs_ui::{
    CategoryOption, DashboardTemplate, FacilityCard, FilterLink, IssueRow, IssuesTemplate, Layout,
    LoginTemplate, NavLink, RaiseIssueTemplate, RegisterTemplate, StatCard,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{status_of, ApiError};
use crate::handlers::AppState;
use crate::session::{self, CurrentUser};

type PageResult = Result<HttpResponse, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListingQuery {
    pub status: Option<String>,
    pub q: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RaiseQuery {
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RaiseForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub id: i64,
    pub status: String,
    pub return_to: Option<String>,
}

fn redirect(location: impl AsRef<str>) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, location.as_ref()))
        .finish()
}

fn render(template: impl Template, status: StatusCode) -> PageResult {
    let html = template
        .render()
        .map_err(|e| AppError::Internal(format!("template rendering failed: {e}")))?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// Runs the guard; `Err` carries the redirect to send instead.
fn admit(current: &CurrentUser, area: Area) -> Result<&SessionUser, HttpResponse> {
    match guard::authorize(current.get(), area) {
        Access::Granted => current.get().ok_or_else(|| redirect(LOGIN_PATH)),
        Access::Redirect(to) => Err(redirect(to)),
    }
}

macro_rules! admit_or_redirect {
    ($current:expr, $area:expr) => {
        match admit(&$current, $area) {
            Ok(user) => user,
            Err(response) => return Ok(response),
        }
    };
}

fn parse_category(raw: &str) -> Result<FacilityCategory, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::issue(AppError::NotFound("facility".into())))
}

fn student_nav(current: &str) -> Vec<NavLink> {
    vec![
        NavLink::new("/student", "Dashboard", current),
        NavLink::new("/student/my-issues", "My Issues", current),
        NavLink::new("/student/raise-issue", "Raise Issue", current),
    ]
}

fn admin_nav(current: &str) -> Vec<NavLink> {
    vec![
        NavLink::new("/admin", "Dashboard", current),
        NavLink::new("/admin/raised-issues", "Raised Issues", current),
        NavLink::new("/admin/resolved-issues", "Resolved Issues", current),
    ]
}

fn facility_nav(category: FacilityCategory, current: &str) -> Vec<NavLink> {
    let base = guard::facility_dashboard_path(category);
    vec![
        NavLink::new(base.clone(), "Dashboard", current),
        NavLink::new(format!("{base}/raised-issues"), "Raised Issues", current),
        NavLink::new(format!("{base}/resolved-issues"), "Resolved Issues", current),
        NavLink::new(format!("{base}/facilities"), "Facilities", current),
    ]
}

fn status_filters(base: &str, active: StatusFilter) -> Vec<FilterLink> {
    let mut links = vec![FilterLink {
        href: format!("{base}?status=all"),
        label: "All",
        active: active.query_value() == "all",
    }];
    links.extend(IssueStatus::ALL.into_iter().map(|status| FilterLink {
        href: format!("{base}?status={}", status.as_str()),
        label: status.label(),
        active: active == StatusFilter::Only(status),
    }));
    links
}

fn rows(records: &[&IssueRecord], editable: bool) -> Vec<IssueRow> {
    records.iter().map(|r| IssueRow::new(r, editable)).collect()
}

fn optional_category(raw: Option<&str>) -> Option<FacilityCategory> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

async fn scoped_records(data: &AppState, scope: IssueScope) -> Result<Vec<IssueRecord>, ApiError> {
    Ok(data.store.list_issues(scope).await.map_err(AppError::from)?)
}

// ── Entry ───────────────────────────────────────────────────────────────────

pub async fn home(current: CurrentUser) -> HttpResponse {
    match current.get() {
        Some(user) => redirect(guard::landing_path(user)),
        None => redirect(LOGIN_PATH),
    }
}

pub async fn login_page(query: web::Query<LoginQuery>) -> PageResult {
    let notice = query
        .registered
        .as_ref()
        .map(|_| "Account created successfully. Please sign in.".to_string());
    render(
        LoginTemplate {
            layout: Layout::public("Login"),
            identifier: String::new(),
            error: None,
            notice,
        },
        StatusCode::OK,
    )
}

pub async fn login_submit(data: web::Data<AppState>, form: web::Form<Credentials>) -> PageResult {
    let credentials = form.into_inner();
    let identifier = credentials.identifier.clone().unwrap_or_default();

    match accounts::authenticate(&*data.store, &*data.auth, credentials).await {
        Ok(user) => {
            let cookie = session::login_cookie(&user)?;
            Ok(HttpResponse::SeeOther()
                .insert_header((header::LOCATION, guard::landing_path(&user)))
                .cookie(cookie)
                .finish())
        }
        Err(AppError::Internal(cause)) => Err(ApiError::issue(AppError::Internal(cause))),
        Err(err) => render(
            LoginTemplate {
                layout: Layout::public("Login"),
                identifier,
                error: Some(err.message()),
                notice: None,
            },
            status_of(&err),
        ),
    }
}

pub async fn register_page() -> PageResult {
    render(
        RegisterTemplate {
            layout: Layout::public("Register"),
            name: String::new(),
            email: String::new(),
            room_number: String::new(),
            error: None,
        },
        StatusCode::OK,
    )
}

pub async fn register_submit(
    data: web::Data<AppState>,
    form: web::Form<Registration>,
) -> PageResult {
    let registration = form.into_inner();
    let retry = RegisterTemplate {
        layout: Layout::public("Register"),
        name: registration.name.clone().unwrap_or_default(),
        email: registration.email.clone().unwrap_or_default(),
        room_number: registration.room_number.clone().unwrap_or_default(),
        error: None,
    };

    match accounts::register(&*data.store, &*data.auth, registration).await {
        Ok(_) => Ok(redirect("/login?registered=1")),
        Err(AppError::Internal(cause)) => Err(ApiError::issue(AppError::Internal(cause))),
        Err(err) => render(
            RegisterTemplate {
                error: Some(err.message()),
                ..retry
            },
            status_of(&err),
        ),
    }
}

pub async fn logout() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, LOGIN_PATH))
        .cookie(session::clear_cookie())
        .finish()
}

// ── Student ─────────────────────────────────────────────────────────────────

pub async fn student_dashboard(data: web::Data<AppState>, current: CurrentUser) -> PageResult {
    let user = admit_or_redirect!(current, Area::Student);

    let facilities = data.store.list_facilities().await.map_err(AppError::from)?;
    let mine = scoped_records(&data, IssueScope::Student(user.id)).await?;
    let stats = IssueStats::tally(mine.iter().map(|r| &r.issue));

    render(
        DashboardTemplate {
            layout: Layout::for_user("Student Dashboard", user, student_nav("/student")),
            heading: format!("Welcome, {}", user.name),
            subheading: "View and explore available hostel facilities below.".into(),
            stats: StatCard::from_stats(&stats),
            facilities: facilities
                .iter()
                .map(|f| {
                    let href = format!("/student/raise-issue?category={}", f.category);
                    FacilityCard::new(f, Some(href))
                })
                .collect(),
        },
        StatusCode::OK,
    )
}

pub async fn student_issues(
    data: web::Data<AppState>,
    current: CurrentUser,
    query: web::Query<ListingQuery>,
) -> PageResult {
    let user = admit_or_redirect!(current, Area::Student);
    let path = "/student/my-issues";

    let records = scoped_records(&data, IssueScope::Student(user.id)).await?;
    let view = IssueView::mine(query.status.as_deref());
    let shown = view.apply(&records);

    render(
        IssuesTemplate {
            layout: Layout::for_user("My Issues", user, student_nav(path)),
            heading: "My Issues".into(),
            filters: status_filters(path, view.status),
            searchable: false,
            search: String::new(),
            categories: Vec::new(),
            rows: rows(&shown, false),
            update_action: None,
            return_to: path.into(),
            empty_message: "You have not raised any issues yet.",
        },
        StatusCode::OK,
    )
}

fn raise_page(
    user: &SessionUser,
    category: Option<FacilityCategory>,
    form: Option<&RaiseForm>,
    error: Option<String>,
) -> RaiseIssueTemplate {
    RaiseIssueTemplate {
        layout: Layout::for_user(
            "Raise Issue",
            user,
            student_nav("/student/raise-issue"),
        ),
        categories: CategoryOption::all(category),
        title: form.and_then(|f| f.title.clone()).unwrap_or_default(),
        description: form.and_then(|f| f.description.clone()).unwrap_or_default(),
        error,
    }
}

pub async fn raise_issue_page(current: CurrentUser, query: web::Query<RaiseQuery>) -> PageResult {
    let user = admit_or_redirect!(current, Area::Student);
    let category = optional_category(query.category.as_deref());
    render(raise_page(user, category, None, None), StatusCode::OK)
}

pub async fn raise_issue_submit(
    data: web::Data<AppState>,
    current: CurrentUser,
    form: web::Form<RaiseForm>,
) -> PageResult {
    let user = admit_or_redirect!(current, Area::Student);
    let form = form.into_inner();

    let draft = IssueDraft {
        student_id: Some(user.id),
        title: form.title.clone(),
        description: form.description.clone(),
        category: form.category.clone(),
    };

    match issues::create_issue(&*data.store, draft).await {
        Ok(_) => Ok(redirect("/student/my-issues")),
        Err(AppError::Internal(cause)) => Err(ApiError::issue(AppError::Internal(cause))),
        Err(err) => {
            let category = optional_category(form.category.as_deref());
            render(
                raise_page(user, category, Some(&form), Some(err.message())),
                status_of(&err),
            )
        }
    }
}

// ── Super admin ─────────────────────────────────────────────────────────────

pub async fn admin_dashboard(data: web::Data<AppState>, current: CurrentUser) -> PageResult {
    let user = admit_or_redirect!(current, Area::SuperAdmin);

    let stats = issues::issue_stats(&*data.store, &IssueFilter::default()).await?;
    let facilities = data.store.list_facilities().await.map_err(AppError::from)?;

    render(
        DashboardTemplate {
            layout: Layout::for_user("Admin Dashboard", user, admin_nav("/admin")),
            heading: "Hostel Overview".into(),
            subheading: "Every issue raised across all facilities.".into(),
            stats: StatCard::from_stats(&stats),
            facilities: facilities
                .iter()
                .map(|f| FacilityCard::new(f, Some(guard::facility_dashboard_path(f.category))))
                .collect(),
        },
        StatusCode::OK,
    )
}

pub async fn admin_raised(
    data: web::Data<AppState>,
    current: CurrentUser,
    query: web::Query<ListingQuery>,
) -> PageResult {
    let user = admit_or_redirect!(current, Area::SuperAdmin);
    let path = "/admin/raised-issues";

    let records = scoped_records(&data, IssueScope::All).await?;
    let view = IssueView::raised(query.status.as_deref());
    let shown = view.apply(&records);

    render(
        IssuesTemplate {
            layout: Layout::for_user("Raised Issues", user, admin_nav(path)),
            heading: "Raised Issues".into(),
            filters: status_filters(path, view.status),
            searchable: false,
            search: String::new(),
            categories: Vec::new(),
            rows: rows(&shown, true),
            update_action: Some("/admin/issues/status".into()),
            return_to: path.into(),
            empty_message: "No open issues.",
        },
        StatusCode::OK,
    )
}

pub async fn admin_resolved(
    data: web::Data<AppState>,
    current: CurrentUser,
    query: web::Query<ListingQuery>,
) -> PageResult {
    let user = admit_or_redirect!(current, Area::SuperAdmin);
    let path = "/admin/resolved-issues";

    let category = optional_category(query.category.as_deref());
    let records = scoped_records(&data, IssueScope::All).await?;
    let view = IssueView::resolved()
        .with_search(query.q.as_deref())
        .with_category(category);
    let shown = view.apply(&records);

    render(
        IssuesTemplate {
            layout: Layout::for_user("Resolved Issues", user, admin_nav(path)),
            heading: "Resolved Issues".into(),
            filters: Vec::new(),
            searchable: true,
            search: query.q.clone().unwrap_or_default(),
            categories: CategoryOption::all(category),
            rows: rows(&shown, false),
            update_action: None,
            return_to: path.into(),
            empty_message: "No resolved issues match.",
        },
        StatusCode::OK,
    )
}

/// Only same-area paths are followed after a status change.
fn back_to(requested: Option<&str>, area_root: &str) -> String {
    match requested {
        Some(path) if path.starts_with(area_root) && !path.starts_with("//") => path.to_string(),
        _ => area_root.to_string(),
    }
}

pub async fn admin_update_status(
    data: web::Data<AppState>,
    current: CurrentUser,
    form: web::Form<StatusForm>,
) -> PageResult {
    let user = admit_or_redirect!(current, Area::SuperAdmin);
    let form = form.into_inner();

    let issue = issues::update_status(&*data.store, form.id, Some(form.status.as_str())).await?;
    info!(admin_id = user.id, issue_id = issue.id, "status changed from admin dashboard");
    Ok(redirect(back_to(form.return_to.as_deref(), "/admin")))
}

// ── Facility admin ──────────────────────────────────────────────────────────

pub async fn facility_dashboard(
    data: web::Data<AppState>,
    current: CurrentUser,
    path: web::Path<String>,
) -> PageResult {
    let category = parse_category(&path)?;
    let user = admit_or_redirect!(current, Area::Facility(category));

    let records = scoped_records(&data, IssueScope::Category(category)).await?;
    let stats = IssueStats::tally(records.iter().map(|r| &r.issue));
    let facilities = data.store.list_facilities().await.map_err(AppError::from)?;
    let base = guard::facility_dashboard_path(category);

    render(
        DashboardTemplate {
            layout: Layout::for_user(
                format!("{} Dashboard", category.label()),
                user,
                facility_nav(category, &base),
            ),
            heading: format!("{} Admin Dashboard", category.label()),
            subheading: format!("Issues raised against {} facilities.", category.label()),
            stats: StatCard::from_stats(&stats),
            facilities: facilities
                .iter()
                .filter(|f| f.category == category)
                .map(|f| FacilityCard::new(f, Some(format!("{base}/raised-issues"))))
                .collect(),
        },
        StatusCode::OK,
    )
}

pub async fn facility_raised(
    data: web::Data<AppState>,
    current: CurrentUser,
    path: web::Path<String>,
    query: web::Query<ListingQuery>,
) -> PageResult {
    let category = parse_category(&path)?;
    let user = admit_or_redirect!(current, Area::Facility(category));
    let base = guard::facility_dashboard_path(category);
    let here = format!("{base}/raised-issues");

    let records = scoped_records(&data, IssueScope::Category(category)).await?;
    let view = IssueView::raised(query.status.as_deref());
    let shown = view.apply(&records);

    render(
        IssuesTemplate {
            layout: Layout::for_user("Raised Issues", user, facility_nav(category, &here)),
            heading: format!("{} Issues", category.label()),
            filters: status_filters(&here, view.status),
            searchable: false,
            search: String::new(),
            categories: Vec::new(),
            rows: rows(&shown, true),
            update_action: Some(format!("{base}/issues/status")),
            return_to: here,
            empty_message: "No open issues for this facility.",
        },
        StatusCode::OK,
    )
}

pub async fn facility_resolved(
    data: web::Data<AppState>,
    current: CurrentUser,
    path: web::Path<String>,
    query: web::Query<ListingQuery>,
) -> PageResult {
    let category = parse_category(&path)?;
    let user = admit_or_redirect!(current, Area::Facility(category));
    let here = format!("{}/resolved-issues", guard::facility_dashboard_path(category));

    let records = scoped_records(&data, IssueScope::Category(category)).await?;
    let view = IssueView::resolved().broad().with_search(query.q.as_deref());
    let shown = view.apply(&records);

    render(
        IssuesTemplate {
            layout: Layout::for_user("Resolved Issues", user, facility_nav(category, &here)),
            heading: format!("Resolved {} Issues", category.label()),
            filters: Vec::new(),
            searchable: true,
            search: query.q.clone().unwrap_or_default(),
            categories: Vec::new(),
            rows: rows(&shown, false),
            update_action: None,
            return_to: here,
            empty_message: "No resolved issues match.",
        },
        StatusCode::OK,
    )
}

pub async fn facility_facilities(
    data: web::Data<AppState>,
    current: CurrentUser,
    path: web::Path<String>,
) -> PageResult {
    let category = parse_category(&path)?;
    let user = admit_or_redirect!(current, Area::Facility(category));
    let here = format!("{}/facilities", guard::facility_dashboard_path(category));

    let facilities = data.store.list_facilities().await.map_err(AppError::from)?;

    render(
        DashboardTemplate {
            layout: Layout::for_user("Facilities", user, facility_nav(category, &here)),
            heading: format!("{} Facilities", category.label()),
            subheading: "Facilities under your management.".into(),
            stats: Vec::new(),
            facilities: facilities
                .iter()
                .filter(|f| f.category == category)
                .map(|f| FacilityCard::new(f, None))
                .collect(),
        },
        StatusCode::OK,
    )
}

pub async fn facility_update_status(
    data: web::Data<AppState>,
    current: CurrentUser,
    path: web::Path<String>,
    form: web::Form<StatusForm>,
) -> PageResult {
    let category = parse_category(&path)?;
    let user = admit_or_redirect!(current, Area::Facility(category));
    let form = form.into_inner();

    // facility admins may only touch issues of their own category
    let owned = data
        .store
        .get_issue(form.id)
        .await
        .map_err(AppError::from)?
        .filter(|issue| issue.category == category);
    if owned.is_none() {
        warn!(admin_id = user.id, issue_id = form.id, %category, "status change outside category");
        return Err(AppError::NotFound("issue".into()).into());
    }

    issues::update_status(&*data.store, form.id, Some(form.status.as_str())).await?;
    let base = guard::facility_dashboard_path(category);
    Ok(redirect(back_to(form.return_to.as_deref(), &base)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_changes_only_return_within_area() {
        assert_eq!(back_to(Some("/admin/raised-issues?status=pending"), "/admin"), "/admin/raised-issues?status=pending");
        assert_eq!(back_to(Some("https://evil.example"), "/admin"), "/admin");
        assert_eq!(back_to(None, "/facility-admin/mess"), "/facility-admin/mess");
    }

    #[test]
    fn raised_filters_mark_the_active_status() {
        let links = status_filters("/admin/raised-issues", StatusFilter::Open);
        assert!(links[0].active);
        assert_eq!(links.len(), 1 + IssueStatus::ALL.len());

        let links = status_filters("/x", StatusFilter::Only(IssueStatus::Pending));
        let active: Vec<_> = links.iter().filter(|l| l.active).map(|l| l.href.as_str()).collect();
        assert_eq!(active, vec!["/x?status=pending"]);
    }
}
