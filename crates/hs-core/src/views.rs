//! # Dashboard filters
//!
//! Pure filtering over listing rows, shared by every dashboard page.

use crate::models::{FacilityCategory, IssueRecord, IssueStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusFilter {
    /// Every status.
    Any,
    /// Everything that is not resolved yet.
    Open,
    Only(IssueStatus),
}

impl StatusFilter {
    /// Reads a `?status=` value. `all` (or nothing) gives `default`; unknown
    /// values also fall back to it.
    pub fn from_query(raw: Option<&str>, default: StatusFilter) -> Self {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None | Some("all") => default,
            Some(value) => value.parse().map(Self::Only).unwrap_or(default),
        }
    }

    pub fn matches(self, status: IssueStatus) -> bool {
        match self {
            Self::Any => true,
            Self::Open => status != IssueStatus::Resolved,
            Self::Only(wanted) => status == wanted,
        }
    }

    /// Value used in filter links; `all` for the unfiltered views.
    pub fn query_value(self) -> &'static str {
        match self {
            Self::Any | Self::Open => "all",
            Self::Only(status) => status.as_str(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueView {
    pub status: StatusFilter,
    pub search: Option<String>,
    /// Search also matches the student's name and the category label.
    pub broad_search: bool,
    pub category: Option<FacilityCategory>,
}

impl IssueView {
    /// Open issues by default, or exactly the requested status.
    pub fn raised(status: Option<&str>) -> Self {
        Self {
            status: StatusFilter::from_query(status, StatusFilter::Open),
            search: None,
            broad_search: false,
            category: None,
        }
    }

    /// Only issues whose status is exactly `resolved`.
    pub fn resolved() -> Self {
        Self {
            status: StatusFilter::Only(IssueStatus::Resolved),
            search: None,
            broad_search: false,
            category: None,
        }
    }

    /// Every status by default (a student's own list).
    pub fn mine(status: Option<&str>) -> Self {
        Self {
            status: StatusFilter::from_query(status, StatusFilter::Any),
            search: None,
            broad_search: false,
            category: None,
        }
    }

    pub fn with_search(mut self, search: Option<&str>) -> Self {
        self.search = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        self
    }

    pub fn broad(mut self) -> Self {
        self.broad_search = true;
        self
    }

    pub fn with_category(mut self, category: Option<FacilityCategory>) -> Self {
        self.category = category;
        self
    }

    fn keeps(&self, record: &IssueRecord) -> bool {
        let issue = &record.issue;
        if !self.status.matches(issue.status) {
            return false;
        }
        if self.category.is_some_and(|c| c != issue.category) {
            return false;
        }
        match &self.search {
            Some(term) => {
                let term = term.as_str();
                issue.title.to_lowercase().contains(term)
                    || issue.reference().to_lowercase().contains(term)
                    || (self.broad_search
                        && (record.student_name.to_lowercase().contains(term)
                            || issue.category.label().to_lowercase().contains(term)
                            || issue.category.as_str().contains(term)))
            }
            None => true,
        }
    }

    pub fn apply<'a>(&self, records: &'a [IssueRecord]) -> Vec<&'a IssueRecord> {
        records.iter().filter(|r| self.keeps(r)).collect()
    }
}
