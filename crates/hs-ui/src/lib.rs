//! # hs-ui
//!
//! Askama templates for the server-rendered pages, plus the flat view models
//! they render. Everything a template shows is precomputed here so the
//! templates stay free of logic.

use askama::Template;
use hs_core::models::{
    Facility, FacilityCategory, FacilityStatus, IssueRecord, IssueStats, IssueStatus, SessionUser,
};

/// Page chrome shared by every template.
pub struct Layout {
    pub title: String,
    pub user_name: Option<String>,
    pub nav: Vec<NavLink>,
}

impl Layout {
    pub fn public(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            user_name: None,
            nav: Vec::new(),
        }
    }

    pub fn for_user(title: impl Into<String>, user: &SessionUser, nav: Vec<NavLink>) -> Self {
        Self {
            title: title.into(),
            user_name: Some(user.name.clone()),
            nav,
        }
    }
}

pub struct NavLink {
    pub href: String,
    pub label: String,
    pub active: bool,
}

impl NavLink {
    pub fn new(href: impl Into<String>, label: impl Into<String>, current: &str) -> Self {
        let href = href.into();
        Self {
            active: href == current,
            href,
            label: label.into(),
        }
    }
}

pub struct FacilityCard {
    pub name: String,
    pub description: String,
    pub location: String,
    pub status: &'static str,
    pub active: bool,
    pub href: Option<String>,
}

impl FacilityCard {
    pub fn new(facility: &Facility, href: Option<String>) -> Self {
        Self {
            name: facility.name.clone(),
            description: facility.description.clone(),
            location: facility.location.clone(),
            status: facility.status.as_str(),
            active: facility.status == FacilityStatus::Active,
            href,
        }
    }
}

pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl StatusOption {
    pub fn all(current: Option<IssueStatus>) -> Vec<Self> {
        IssueStatus::ALL
            .into_iter()
            .map(|status| Self {
                value: status.as_str(),
                label: status.label(),
                selected: current == Some(status),
            })
            .collect()
    }
}

pub struct CategoryOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

impl CategoryOption {
    pub fn all(current: Option<FacilityCategory>) -> Vec<Self> {
        FacilityCategory::ALL
            .into_iter()
            .map(|category| Self {
                value: category.as_str(),
                label: category.label(),
                selected: current == Some(category),
            })
            .collect()
    }
}

/// One table row of an issue listing.
pub struct IssueRow {
    pub id: i64,
    pub reference: String,
    pub title: String,
    pub description: String,
    pub category: &'static str,
    pub status: &'static str,
    pub status_label: &'static str,
    pub student_name: String,
    pub room_number: String,
    pub created_on: String,
    /// Present when the viewer may change the status.
    pub status_options: Vec<StatusOption>,
}

impl IssueRow {
    pub fn new(record: &IssueRecord, editable: bool) -> Self {
        let issue = &record.issue;
        Self {
            id: issue.id,
            reference: issue.reference(),
            title: issue.title.clone(),
            description: issue.description.clone(),
            category: issue.category.label(),
            status: issue.status.as_str(),
            status_label: issue.status.label(),
            student_name: record.student_name.clone(),
            room_number: record.room_number.clone().unwrap_or_else(|| "-".to_string()),
            created_on: issue.created_at.format("%Y-%m-%d").to_string(),
            status_options: if editable {
                StatusOption::all(Some(issue.status))
            } else {
                Vec::new()
            },
        }
    }
}

pub struct StatCard {
    pub label: &'static str,
    pub value: usize,
}

impl StatCard {
    pub fn from_stats(stats: &IssueStats) -> Vec<Self> {
        vec![
            Self {
                label: "Total",
                value: stats.total,
            },
            Self {
                label: "Pending",
                value: stats.pending,
            },
            Self {
                label: "In Progress",
                value: stats.in_progress,
            },
            Self {
                label: "Resolved",
                value: stats.resolved,
            },
        ]
    }
}

/// `?status=` links above a listing.
pub struct FilterLink {
    pub href: String,
    pub label: &'static str,
    pub active: bool,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub identifier: String,
    pub error: Option<String>,
    pub notice: Option<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    pub layout: Layout,
    pub name: String,
    pub email: String,
    pub room_number: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub layout: Layout,
    pub heading: String,
    pub subheading: String,
    pub stats: Vec<StatCard>,
    pub facilities: Vec<FacilityCard>,
}

/// Shared by every issue listing page.
#[derive(Template)]
#[template(path = "issues.html")]
pub struct IssuesTemplate {
    pub layout: Layout,
    pub heading: String,
    pub filters: Vec<FilterLink>,
    /// Shows the search box and, when non-empty, the category picker.
    pub searchable: bool,
    pub search: String,
    pub categories: Vec<CategoryOption>,
    pub rows: Vec<IssueRow>,
    /// Form target for status changes; rows carry the options.
    pub update_action: Option<String>,
    pub return_to: String,
    pub empty_message: &'static str,
}

#[derive(Template)]
#[template(path = "raise_issue.html")]
pub struct RaiseIssueTemplate {
    pub layout: Layout,
    pub categories: Vec<CategoryOption>,
    pub title: String,
    pub description: String,
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use hs_core::models::Issue;

    fn record(status: IssueStatus) -> IssueRecord {
        IssueRecord {
            issue: Issue {
                id: 12,
                student_id: 1,
                title: "Leaking <tap>".into(),
                description: "Bathroom 2".into(),
                category: FacilityCategory::Maintenance,
                status,
                created_at: Utc.with_ymd_and_hms(2024, 11, 2, 8, 30, 0).unwrap(),
            },
            student_name: "Rohan Sharma".into(),
            room_number: None,
        }
    }

    #[test]
    fn issue_row_precomputes_display_fields() {
        let row = IssueRow::new(&record(IssueStatus::InProgress), true);
        assert_eq!(row.reference, "ISS012");
        assert_eq!(row.created_on, "2024-11-02");
        assert_eq!(row.room_number, "-");
        let selected: Vec<_> = row.status_options.iter().filter(|o| o.selected).collect();
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].value, "in-progress");

        assert!(IssueRow::new(&record(IssueStatus::Pending), false)
            .status_options
            .is_empty());
    }

    #[test]
    fn issues_page_escapes_user_text() {
        let page = IssuesTemplate {
            layout: Layout::public("Issues"),
            heading: "Raised Issues".into(),
            filters: Vec::new(),
            searchable: false,
            search: String::new(),
            categories: Vec::new(),
            rows: vec![IssueRow::new(&record(IssueStatus::Pending), true)],
            update_action: Some("/admin/issues/status".into()),
            return_to: "/admin/raised-issues".into(),
            empty_message: "No issues",
        };
        let html = page.render().unwrap();
        assert!(html.contains("Leaking &lt;tap&gt;"));
        assert!(html.contains("ISS012"));
        assert!(html.contains("/admin/issues/status"));
        assert!(!html.contains("No issues"));
    }

    #[test]
    fn signed_in_header_names_the_user() {
        let user = SessionUser {
            id: 7,
            name: "Rohan Sharma".into(),
            email: "student@hostel.com".into(),
            role: "student".into(),
            room_number: Some("A-102".into()),
            facility_id: None,
            facility_category: None,
        };
        let nav = vec![
            NavLink::new("/student", "Dashboard", "/student"),
            NavLink::new("/student/my-issues", "My Issues", "/student"),
        ];
        let page = DashboardTemplate {
            layout: Layout::for_user("Student Dashboard", &user, nav),
            heading: "Welcome".into(),
            subheading: String::new(),
            stats: Vec::new(),
            facilities: Vec::new(),
        };
        let html = page.render().unwrap();
        assert!(html.contains("Rohan Sharma &middot;"));
        assert!(html.contains("href=\"/logout\""));
        assert!(html.contains("href=\"/student\" class=\"active\""));
    }

    #[test]
    fn register_form_keeps_typed_name_out_of_header() {
        let page = RegisterTemplate {
            layout: Layout::public("Register"),
            name: "Neha Verma".into(),
            email: "neha@hostel.com".into(),
            room_number: "C-9".into(),
            error: None,
        };
        let html = page.render().unwrap();
        assert!(html.contains("value=\"Neha Verma\""));
        assert!(!html.contains("/logout"));
    }

    #[test]
    fn login_page_shows_error() {
        let page = LoginTemplate {
            layout: Layout::public("Login"),
            identifier: "messadmin".into(),
            error: Some("Invalid password".into()),
            notice: None,
        };
        let html = page.render().unwrap();
        assert!(html.contains("Invalid password"));
        assert!(html.contains("value=\"messadmin\""));
    }
}
