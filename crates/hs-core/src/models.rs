//! # Domain Models
//!
//! These structs represent the core entities of Hostel Solve.
//! Identifiers are the integer row ids handed out by whichever store is
//! compiled in.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Raised when a string does not name a known facility category.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown facility category: {0}")]
pub struct UnknownCategory(pub String);

/// Raised when a string does not name a known issue status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown issue status: {0}")]
pub struct UnknownStatus(pub String);

/// A hostel service that issues are filed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum FacilityCategory {
    Mess,
    Maintenance,
    Internet,
    Cleaning,
    EntryExit,
    Medical,
    Others,
}

impl FacilityCategory {
    pub const ALL: [FacilityCategory; 7] = [
        Self::Mess,
        Self::Maintenance,
        Self::Internet,
        Self::Cleaning,
        Self::EntryExit,
        Self::Medical,
        Self::Others,
    ];

    /// The canonical stored form (e.g. `entry-exit`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mess => "mess",
            Self::Maintenance => "maintenance",
            Self::Internet => "internet",
            Self::Cleaning => "cleaning",
            Self::EntryExit => "entry-exit",
            Self::Medical => "medical",
            Self::Others => "others",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Mess => "Mess",
            Self::Maintenance => "Maintenance",
            Self::Internet => "Internet",
            Self::Cleaning => "Cleaning",
            Self::EntryExit => "Entry / Exit",
            Self::Medical => "Medical",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for FacilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FacilityCategory {
    type Err = UnknownCategory;

    /// Accepts the canonical names plus the spellings used by older clients
    /// (`entry_exit`, `mess-food`, `room-maintenance`, ...).
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let key = raw.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match key.as_str() {
            "mess" | "mess-food" => Ok(Self::Mess),
            "maintenance" | "room-maintenance" => Ok(Self::Maintenance),
            "internet" => Ok(Self::Internet),
            "cleaning" => Ok(Self::Cleaning),
            "entry-exit" => Ok(Self::EntryExit),
            "medical" => Ok(Self::Medical),
            "others" | "other" => Ok(Self::Others),
            _ => Err(UnknownCategory(raw.to_string())),
        }
    }
}

impl TryFrom<String> for FacilityCategory {
    type Error = UnknownCategory;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Operational state of a facility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacilityStatus {
    Active,
    Maintenance,
}

impl FacilityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Maintenance => "maintenance",
        }
    }
}

impl FromStr for FacilityStatus {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "maintenance" => Ok(Self::Maintenance),
            other => Err(format!("unknown facility status: {other}")),
        }
    }
}

/// A hostel facility. Reference data: seeded, never created through the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    pub id: i64,
    pub name: String,
    pub category: FacilityCategory,
    pub location: String,
    pub status: FacilityStatus,
    pub description: String,
}

/// Lifecycle state of an issue. Any state may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", try_from = "String")]
pub enum IssueStatus {
    Raised,
    Pending,
    InProgress,
    Resolved,
}

impl IssueStatus {
    pub const ALL: [IssueStatus; 4] = [
        Self::Raised,
        Self::Pending,
        Self::InProgress,
        Self::Resolved,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raised => "raised",
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Resolved => "resolved",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Raised => "Raised",
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = UnknownStatus;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "raised" => Ok(Self::Raised),
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            _ => Err(UnknownStatus(raw.to_string())),
        }
    }
}

impl TryFrom<String> for IssueStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A student-submitted report against a facility category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: i64,
    pub student_id: i64,
    pub title: String,
    pub description: String,
    pub category: FacilityCategory,
    pub status: IssueStatus,
    pub created_at: DateTime<Utc>,
}

impl Issue {
    /// Human-facing reference shown in tables, e.g. `ISS007`.
    pub fn reference(&self) -> String {
        format!("ISS{:03}", self.id)
    }
}

/// A validated issue waiting to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewIssue {
    pub student_id: i64,
    pub title: String,
    pub description: String,
    pub category: FacilityCategory,
}

/// Listing row: the issue joined with the student who raised it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    #[serde(flatten)]
    pub issue: Issue,
    pub student_name: String,
    pub room_number: Option<String>,
}

/// Which issues a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueScope {
    All,
    Student(i64),
    Category(FacilityCategory),
}

/// Per-status counters shown on every dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueStats {
    pub total: usize,
    pub resolved: usize,
    /// Both `pending` and `raised` count as pending.
    pub pending: usize,
    pub in_progress: usize,
}

impl IssueStats {
    pub fn tally<'a>(issues: impl IntoIterator<Item = &'a Issue>) -> Self {
        issues
            .into_iter()
            .fold(Self::default(), |mut stats, issue| {
                stats.total += 1;
                match issue.status {
                    IssueStatus::Resolved => stats.resolved += 1,
                    IssueStatus::InProgress => stats.in_progress += 1,
                    IssueStatus::Pending | IssueStatus::Raised => stats.pending += 1,
                }
                stats
            })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// Stored credential: a PHC hash or a legacy plain-text value.
    pub password: String,
    pub room_number: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    pub password: String,
    pub room_number: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    /// `None` means a facility admin.
    pub role: Option<String>,
    pub facility_id: Option<i64>,
}

/// The user object handed to the client after login and read back by the
/// route guards. Nothing on the server remembers it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_category: Option<FacilityCategory>,
}

impl SessionUser {
    pub fn role(&self) -> Option<Role> {
        Role::parse(&self.role)
    }
}

impl From<&Student> for SessionUser {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id,
            name: student.name.clone(),
            email: student.email.clone(),
            role: Role::STUDENT.to_string(),
            room_number: Some(student.room_number.clone()),
            facility_id: None,
            facility_category: None,
        }
    }
}

/// Parsed form of the role string carried by [`SessionUser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Student,
    SuperAdmin,
    /// Carries a category when the role name itself names one (`messadmin`).
    FacilityAdmin(Option<FacilityCategory>),
}

impl Role {
    pub const STUDENT: &'static str = "student";
    pub const FACILITY_ADMIN: &'static str = "facilityadmin";

    /// Case-insensitive; tolerates the spellings found in older sessions.
    pub fn parse(raw: &str) -> Option<Self> {
        let role = raw.trim().to_ascii_lowercase();
        match role.as_str() {
            "student" => Some(Self::Student),
            "superadmin" | "super-admin" | "super_admin" | "admin" => Some(Self::SuperAdmin),
            "facilityadmin" | "facility-admin" | "facility_admin" => Some(Self::FacilityAdmin(None)),
            other => other
                .strip_suffix("admin")
                .and_then(|prefix| prefix.parse::<FacilityCategory>().ok())
                .map(|category| Self::FacilityAdmin(Some(category))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionStatus {
    Pending,
    Completed,
}

/// An admin's note attached to a resolved issue. Only the local store keeps
/// these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub id: i64,
    pub issue_id: i64,
    pub admin_id: i64,
    pub resolution_notes: String,
    pub status: ResolutionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewResolution {
    pub issue_id: i64,
    pub admin_id: i64,
    pub resolution_notes: String,
}
