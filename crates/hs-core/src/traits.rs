//! # Core Traits (Ports)
//!
//! Any storage or auth plugin must implement these traits to be used by the
//! binary.

use async_trait::async_trait;

use crate::models::{
    Admin, Facility, Issue, IssueRecord, IssueScope, IssueStatus, NewIssue, NewResolution,
    NewStudent, Resolution, Student,
};

/// Read access to the facility catalog.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait FacilityRepo: Send + Sync {
    async fn list_facilities(&self) -> anyhow::Result<Vec<Facility>>;
    async fn get_facility(&self, id: i64) -> anyhow::Result<Option<Facility>>;
}

/// Persistence contract for issues.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait IssueRepo: Send + Sync {
    /// Inserts with status `pending` and returns the stored record.
    async fn create_issue(&self, issue: NewIssue) -> anyhow::Result<Issue>;
    async fn get_issue(&self, id: i64) -> anyhow::Result<Option<Issue>>;
    /// Newest first, joined with the raising student.
    async fn list_issues(&self, scope: IssueScope) -> anyhow::Result<Vec<IssueRecord>>;
    /// Returns `None` when no issue has this id.
    async fn update_status(&self, id: i64, status: IssueStatus) -> anyhow::Result<Option<Issue>>;
}

/// Account lookup over the admin and student tables.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Matches on email or name.
    async fn find_admin(&self, identifier: &str) -> anyhow::Result<Option<Admin>>;
    /// Matches on email or name.
    async fn find_student(&self, identifier: &str) -> anyhow::Result<Option<Student>>;
    async fn find_student_by_id(&self, id: i64) -> anyhow::Result<Option<Student>>;
    /// True when either table already holds this email or this name.
    async fn identity_taken(&self, email: &str, name: &str) -> anyhow::Result<bool>;
    /// Returns `None` when the email or name was claimed in the meantime.
    async fn create_student(&self, student: NewStudent) -> anyhow::Result<Option<Student>>;
}

/// Resolution notes. Only stores that keep them implement this.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait ResolutionRepo: Send + Sync {
    async fn record_resolution(&self, resolution: NewResolution) -> anyhow::Result<Resolution>;
    async fn resolution_for(&self, issue_id: i64) -> anyhow::Result<Option<Resolution>>;
}

/// Everything a storage plugin provides to the web layer.
pub trait HostelStore: FacilityRepo + IssueRepo + UserRepo {
    fn resolutions(&self) -> Option<&dyn ResolutionRepo> {
        None
    }
}

/// Password handling contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Produces the value stored in the password column.
    fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Checks a login attempt against the stored value.
    async fn verify_password(&self, password: &str, stored: &str) -> bool;
}
