//! # Issue operations
//!
//! Validation and orchestration shared by the JSON API and the HTML pages.
//! Storage details stay behind [`IssueRepo`] / [`FacilityRepo`].

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{AppError, Result};
use crate::models::{
    FacilityCategory, Issue, IssueRecord, IssueScope, IssueStats, IssueStatus, NewIssue,
    NewResolution, Resolution,
};
use crate::traits::{FacilityRepo, HostelStore, IssueRepo, UserRepo};

/// Lowercases and turns spaces into underscores (`"Entry Exit"` → `entry_exit`).
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase().replace(' ', "_")
}

/// Raw issue submission; every field is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueDraft {
    pub student_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl IssueDraft {
    pub fn validate(self) -> Result<NewIssue> {
        let missing = || AppError::ValidationError("Missing required fields".into());

        let student_id = self.student_id.ok_or_else(missing)?;
        let title = present(self.title).ok_or_else(missing)?;
        let description = present(self.description).ok_or_else(missing)?;
        let raw_category = present(self.category).ok_or_else(missing)?;

        let category = normalize_category(&raw_category)
            .parse::<FacilityCategory>()
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        Ok(NewIssue {
            student_id,
            title,
            description,
            category,
        })
    }
}

/// Query-string filters accepted by issue listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IssueFilter {
    pub facility_id: Option<i64>,
    pub student_id: Option<i64>,
    pub category: Option<String>,
}

/// Turns filters into a scope. `facility_id` wins over `student_id`, which
/// wins over `category`.
pub async fn resolve_scope<F>(facilities: &F, filter: &IssueFilter) -> Result<IssueScope>
where
    F: FacilityRepo + ?Sized,
{
    if let Some(facility_id) = filter.facility_id {
        let facility = facilities.get_facility(facility_id).await?.ok_or_else(|| {
            warn!(facility_id, "no category found for facility");
            AppError::NotFound("facility".into())
        })?;
        return Ok(IssueScope::Category(facility.category));
    }

    if let Some(student_id) = filter.student_id {
        return Ok(IssueScope::Student(student_id));
    }

    match present(filter.category.clone()) {
        Some(raw) => normalize_category(&raw)
            .parse()
            .map(IssueScope::Category)
            .map_err(|e: crate::models::UnknownCategory| AppError::ValidationError(e.to_string())),
        None => Ok(IssueScope::All),
    }
}

/// Validates the draft and stores it for an existing student.
pub async fn create_issue<S>(store: &S, draft: IssueDraft) -> Result<Issue>
where
    S: IssueRepo + UserRepo + ?Sized,
{
    let new_issue = draft.validate()?;
    if store.find_student_by_id(new_issue.student_id).await?.is_none() {
        warn!(student_id = new_issue.student_id, "issue raised for unknown student");
        return Err(AppError::NotFound("student".into()));
    }
    let issue = store.create_issue(new_issue).await?;
    info!(issue_id = issue.id, category = %issue.category, "issue raised");
    Ok(issue)
}

pub async fn list_issues<S>(store: &S, filter: &IssueFilter) -> Result<Vec<IssueRecord>>
where
    S: FacilityRepo + IssueRepo + ?Sized,
{
    let scope = resolve_scope(store, filter).await?;
    Ok(store.list_issues(scope).await?)
}

pub async fn issue_stats<S>(store: &S, filter: &IssueFilter) -> Result<IssueStats>
where
    S: FacilityRepo + IssueRepo + ?Sized,
{
    let records = list_issues(store, filter).await?;
    Ok(IssueStats::tally(records.iter().map(|r| &r.issue)))
}

/// Sets a new status. Only the status changes.
pub async fn update_status<R>(issues: &R, id: i64, status: Option<&str>) -> Result<Issue>
where
    R: IssueRepo + ?Sized,
{
    let raw = status
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::ValidationError("Missing ID or status".into()))?;
    let status: IssueStatus = raw
        .parse()
        .map_err(|e: crate::models::UnknownStatus| AppError::ValidationError(e.to_string()))?;

    let issue = issues
        .update_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound("issue".into()))?;
    info!(issue_id = id, status = %status, "issue status updated");
    Ok(issue)
}

/// Marks an issue resolved and keeps the admin's note when the store can.
pub async fn resolve_issue<S>(
    store: &S,
    id: i64,
    admin_id: i64,
    notes: Option<String>,
) -> Result<(Issue, Option<Resolution>)>
where
    S: HostelStore + ?Sized,
{
    let issue = update_status(store, id, Some(IssueStatus::Resolved.as_str())).await?;

    let notes = present(notes);
    let resolution = match (store.resolutions(), notes) {
        (Some(repo), Some(resolution_notes)) => Some(
            repo.record_resolution(NewResolution {
                issue_id: id,
                admin_id,
                resolution_notes,
            })
            .await?,
        ),
        (None, Some(_)) => {
            warn!(issue_id = id, "store does not keep resolution notes; dropping them");
            None
        }
        (_, None) => None,
    };

    Ok((issue, resolution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Admin, Facility, FacilityStatus, NewStudent, Student};
    use crate::traits::{MockFacilityRepo, MockIssueRepo, MockUserRepo};
    use async_trait::async_trait;
    use chrono::Utc;
    use mockall::predicate::eq;

    fn draft() -> IssueDraft {
        IssueDraft {
            student_id: Some(7),
            title: Some("Cold food".into()),
            description: Some("Dinner served cold".into()),
            category: Some("Mess".into()),
        }
    }

    fn stored(new: NewIssue) -> Issue {
        Issue {
            id: 1,
            student_id: new.student_id,
            title: new.title,
            description: new.description,
            category: new.category,
            status: IssueStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn normalize_lowercases_and_underscores() {
        assert_eq!(normalize_category("Entry Exit"), "entry_exit");
        assert_eq!(normalize_category("  MESS "), "mess");
    }

    #[test]
    fn draft_requires_every_field() {
        let mut blank_title = draft();
        blank_title.title = Some("   ".into());
        assert!(matches!(blank_title.validate(), Err(AppError::ValidationError(_))));

        let mut no_student = draft();
        no_student.student_id = None;
        assert!(matches!(no_student.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn draft_rejects_unknown_category() {
        let mut odd = draft();
        odd.category = Some("swimming pool".into());
        assert!(matches!(odd.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn draft_maps_spaced_category() {
        let mut gate = draft();
        gate.category = Some("Entry Exit".into());
        assert_eq!(gate.validate().unwrap().category, FacilityCategory::EntryExit);
    }

    /// Issue and account mocks behind one store.
    struct Store {
        issues: MockIssueRepo,
        users: MockUserRepo,
    }

    #[async_trait]
    impl IssueRepo for Store {
        async fn create_issue(&self, issue: NewIssue) -> anyhow::Result<Issue> {
            self.issues.create_issue(issue).await
        }
        async fn get_issue(&self, id: i64) -> anyhow::Result<Option<Issue>> {
            self.issues.get_issue(id).await
        }
        async fn list_issues(&self, scope: IssueScope) -> anyhow::Result<Vec<IssueRecord>> {
            self.issues.list_issues(scope).await
        }
        async fn update_status(&self, id: i64, status: IssueStatus) -> anyhow::Result<Option<Issue>> {
            self.issues.update_status(id, status).await
        }
    }

    #[async_trait]
    impl UserRepo for Store {
        async fn find_admin(&self, identifier: &str) -> anyhow::Result<Option<Admin>> {
            self.users.find_admin(identifier).await
        }
        async fn find_student(&self, identifier: &str) -> anyhow::Result<Option<Student>> {
            self.users.find_student(identifier).await
        }
        async fn find_student_by_id(&self, id: i64) -> anyhow::Result<Option<Student>> {
            self.users.find_student_by_id(id).await
        }
        async fn identity_taken(&self, email: &str, name: &str) -> anyhow::Result<bool> {
            self.users.identity_taken(email, name).await
        }
        async fn create_student(&self, student: NewStudent) -> anyhow::Result<Option<Student>> {
            self.users.create_student(student).await
        }
    }

    fn rohan(id: i64) -> Student {
        Student {
            id,
            name: "Rohan Sharma".into(),
            email: "student@hostel.com".into(),
            password: "pw".into(),
            room_number: "A-102".into(),
        }
    }

    #[tokio::test]
    async fn create_issue_passes_normalized_issue_to_repo() {
        let mut store = Store {
            issues: MockIssueRepo::new(),
            users: MockUserRepo::new(),
        };
        store
            .users
            .expect_find_student_by_id()
            .with(eq(7))
            .returning(|id| Ok(Some(rohan(id))));
        store
            .issues
            .expect_create_issue()
            .withf(|new| new.category == FacilityCategory::Mess && new.student_id == 7)
            .times(1)
            .returning(|new| Ok(stored(new)));

        let issue = create_issue(&store, draft()).await.unwrap();
        assert_eq!(issue.status, IssueStatus::Pending);
        assert_eq!(issue.id, 1);
    }

    #[tokio::test]
    async fn create_issue_for_unknown_student_is_not_found() {
        let mut store = Store {
            issues: MockIssueRepo::new(),
            users: MockUserRepo::new(),
        };
        store.users.expect_find_student_by_id().returning(|_| Ok(None));
        store.issues.expect_create_issue().never();

        let err = create_issue(&store, draft()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "student"));
    }

    #[tokio::test]
    async fn facility_filter_resolves_to_category() {
        let mut facilities = MockFacilityRepo::new();
        facilities
            .expect_get_facility()
            .with(eq(4))
            .returning(|id| {
                Ok(Some(Facility {
                    id,
                    name: "Internet".into(),
                    category: FacilityCategory::Internet,
                    location: "All Blocks".into(),
                    status: FacilityStatus::Active,
                    description: String::new(),
                }))
            });

        let filter = IssueFilter {
            facility_id: Some(4),
            student_id: Some(9),
            category: None,
        };
        let scope = resolve_scope(&facilities, &filter).await.unwrap();
        assert_eq!(scope, IssueScope::Category(FacilityCategory::Internet));
    }

    #[tokio::test]
    async fn unknown_facility_is_not_found() {
        let mut facilities = MockFacilityRepo::new();
        facilities.expect_get_facility().returning(|_| Ok(None));

        let filter = IssueFilter {
            facility_id: Some(99),
            ..Default::default()
        };
        let err = resolve_scope(&facilities, &filter).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_status_rejects_unknown_and_missing_status() {
        let repo = MockIssueRepo::new();
        assert!(matches!(
            update_status(&repo, 1, Some("closed")).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            update_status(&repo, 1, None).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn update_status_reports_missing_issue() {
        let mut repo = MockIssueRepo::new();
        repo.expect_update_status()
            .with(eq(5), eq(IssueStatus::InProgress))
            .returning(|_, _| Ok(None));

        let err = update_status(&repo, 5, Some("in_progress")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
