//! # hs-store-local
//!
//! File-backed implementation of `HostelStore`. Each collection lives in its
//! own JSON document under the store root (`hostel_issues.json`, ...), so the
//! data can be inspected and edited by hand.
//!
//! Every operation holds one lock for its whole read-modify-write cycle, and
//! documents are replaced by writing a sibling file and renaming it over.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use hs_core::catalog::{default_facilities, DEMO_ACCOUNTS};
use hs_core::models::{
    Admin, Facility, FacilityCategory, Issue, IssueRecord, IssueScope, IssueStatus, NewIssue,
    NewResolution, NewStudent, Resolution, ResolutionStatus, Role, Student,
};
use hs_core::traits::{FacilityRepo, HostelStore, IssueRepo, ResolutionRepo, UserRepo};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

const FACILITIES_KEY: &str = "hostel_facilities";
const ISSUES_KEY: &str = "hostel_issues";
const RESOLUTIONS_KEY: &str = "hostel_resolutions";
const USERS_KEY: &str = "hostel_users";

/// One account document. Admins and students share the collection and are
/// told apart by `role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facility_id: Option<i64>,
}

impl LocalUser {
    fn is_student(&self) -> bool {
        self.role.eq_ignore_ascii_case(Role::STUDENT)
    }

    fn answers_to(&self, identifier: &str) -> bool {
        self.email == identifier || self.name == identifier
    }
}

pub struct LocalStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl LocalStore {
    /// Opens the store, creating the directory and the facility and account
    /// documents when they are missing.
    pub async fn open(root: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("creating store root {}", root.display()))?;

        let store = Self {
            root,
            lock: Mutex::new(()),
        };

        if !store.exists(FACILITIES_KEY).await? {
            store.save(FACILITIES_KEY, &default_facilities()).await?;
        }
        if !store.exists(USERS_KEY).await? {
            let users: Vec<LocalUser> = DEMO_ACCOUNTS
                .iter()
                .zip(1..)
                .map(|(account, id)| LocalUser {
                    id,
                    name: account.name.to_string(),
                    email: account.email.to_string(),
                    password: account.password.to_string(),
                    role: account.role.to_string(),
                    room_number: account.room_number.map(str::to_string),
                    facility_id: account.facility_id,
                })
                .collect();
            store.save(USERS_KEY, &users).await?;
        }

        info!(root = %store.root.display(), "local store ready");
        Ok(store)
    }

    /// Writes a handful of sample issues when the issue document is missing.
    pub async fn seed_demo_issues(&self) -> anyhow::Result<()> {
        let _guard = self.lock.lock().await;
        if self.exists(ISSUES_KEY).await? {
            debug!("issues present, skipping demo seed");
            return Ok(());
        }

        let users: Vec<LocalUser> = self.load(USERS_KEY).await?;
        let student = users
            .iter()
            .find(|u| u.is_student())
            .ok_or_else(|| anyhow!("no student account to attach demo issues to"))?;

        let samples = [
            (
                "Room Maintenance Issue",
                "Broken window lock in room 102",
                FacilityCategory::Maintenance,
                IssueStatus::Resolved,
                "Rohan Sharma",
                (2024, 10, 22),
            ),
            (
                "Mess Food Quality",
                "Poor quality food in breakfast",
                FacilityCategory::Mess,
                IssueStatus::InProgress,
                "Priya Singh",
                (2024, 10, 28),
            ),
            (
                "Internet Speed Issue",
                "Slow WiFi in Block C",
                FacilityCategory::Internet,
                IssueStatus::Pending,
                "Amit Kumar",
                (2024, 11, 2),
            ),
        ];

        let mut issues = Vec::with_capacity(samples.len());
        for (id, (title, description, category, status, created_by, (y, m, d))) in
            (1..).zip(samples)
        {
            let created_at = NaiveDate::from_ymd_opt(y, m, d)
                .and_then(|date| date.and_hms_opt(9, 0, 0))
                .ok_or_else(|| anyhow!("invalid demo date {y}-{m}-{d}"))?
                .and_utc();
            issues.push(IssueRecord {
                issue: Issue {
                    id,
                    student_id: student.id,
                    title: title.to_string(),
                    description: description.to_string(),
                    category,
                    status,
                    created_at,
                },
                student_name: created_by.to_string(),
                room_number: student.room_number.clone(),
            });
        }

        self.save(ISSUES_KEY, &issues).await?;
        info!(count = issues.len(), "seeded demo issues");
        Ok(())
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }

    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(fs::try_exists(self.path(key)).await?)
    }

    /// A missing document reads as empty.
    async fn load<T>(&self, key: &str) -> anyhow::Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let path = self.path(key);
        match fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing {}", path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    async fn save<T>(&self, key: &str, items: &[T]) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let path = self.path(key);
        let staging = staging_path(&path);
        fs::write(&staging, serde_json::to_vec_pretty(items)?)
            .await
            .with_context(|| format!("writing {}", staging.display()))?;
        fs::rename(&staging, &path)
            .await
            .with_context(|| format!("replacing {}", path.display()))?;
        Ok(())
    }
}

fn staging_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

/// Newest first; ties go to the higher id.
fn newest_first(records: &mut [IssueRecord]) {
    records.sort_by(|a, b| {
        b.issue
            .created_at
            .cmp(&a.issue.created_at)
            .then(b.issue.id.cmp(&a.issue.id))
    });
}

#[async_trait]
impl FacilityRepo for LocalStore {
    async fn list_facilities(&self) -> anyhow::Result<Vec<Facility>> {
        let _guard = self.lock.lock().await;
        let mut facilities: Vec<Facility> = self.load(FACILITIES_KEY).await?;
        facilities.sort_by_key(|f| f.id);
        Ok(facilities)
    }

    async fn get_facility(&self, id: i64) -> anyhow::Result<Option<Facility>> {
        let _guard = self.lock.lock().await;
        let facilities: Vec<Facility> = self.load(FACILITIES_KEY).await?;
        Ok(facilities.into_iter().find(|f| f.id == id))
    }
}

#[async_trait]
impl IssueRepo for LocalStore {
    async fn create_issue(&self, issue: NewIssue) -> anyhow::Result<Issue> {
        let _guard = self.lock.lock().await;

        let users: Vec<LocalUser> = self.load(USERS_KEY).await?;
        let student = users
            .iter()
            .find(|u| u.is_student() && u.id == issue.student_id)
            .ok_or_else(|| anyhow!("student {} does not exist", issue.student_id))?;

        let mut records: Vec<IssueRecord> = self.load(ISSUES_KEY).await?;
        let stored = Issue {
            id: next_id(records.iter().map(|r| r.issue.id)),
            student_id: issue.student_id,
            title: issue.title,
            description: issue.description,
            category: issue.category,
            status: IssueStatus::Pending,
            created_at: Utc::now(),
        };
        records.push(IssueRecord {
            issue: stored.clone(),
            student_name: student.name.clone(),
            room_number: student.room_number.clone(),
        });
        self.save(ISSUES_KEY, &records).await?;

        Ok(stored)
    }

    async fn get_issue(&self, id: i64) -> anyhow::Result<Option<Issue>> {
        let _guard = self.lock.lock().await;
        let records: Vec<IssueRecord> = self.load(ISSUES_KEY).await?;
        Ok(records
            .into_iter()
            .find(|r| r.issue.id == id)
            .map(|r| r.issue))
    }

    async fn list_issues(&self, scope: IssueScope) -> anyhow::Result<Vec<IssueRecord>> {
        let _guard = self.lock.lock().await;
        let mut records: Vec<IssueRecord> = self.load(ISSUES_KEY).await?;
        records.retain(|r| match scope {
            IssueScope::All => true,
            IssueScope::Student(student_id) => r.issue.student_id == student_id,
            IssueScope::Category(category) => r.issue.category == category,
        });
        newest_first(&mut records);
        Ok(records)
    }

    async fn update_status(&self, id: i64, status: IssueStatus) -> anyhow::Result<Option<Issue>> {
        let _guard = self.lock.lock().await;
        let mut records: Vec<IssueRecord> = self.load(ISSUES_KEY).await?;

        let Some(record) = records.iter_mut().find(|r| r.issue.id == id) else {
            return Ok(None);
        };
        record.issue.status = status;
        let updated = record.issue.clone();

        self.save(ISSUES_KEY, &records).await?;
        Ok(Some(updated))
    }
}

#[async_trait]
impl UserRepo for LocalStore {
    async fn find_admin(&self, identifier: &str) -> anyhow::Result<Option<Admin>> {
        let _guard = self.lock.lock().await;
        let users: Vec<LocalUser> = self.load(USERS_KEY).await?;
        Ok(users
            .into_iter()
            .find(|u| !u.is_student() && u.answers_to(identifier))
            .map(|u| Admin {
                id: u.id,
                name: u.name,
                email: u.email,
                password: u.password,
                role: Some(u.role),
                facility_id: u.facility_id,
            }))
    }

    async fn find_student(&self, identifier: &str) -> anyhow::Result<Option<Student>> {
        let _guard = self.lock.lock().await;
        let users: Vec<LocalUser> = self.load(USERS_KEY).await?;
        Ok(users
            .into_iter()
            .find(|u| u.is_student() && u.answers_to(identifier))
            .map(|u| Student {
                id: u.id,
                name: u.name,
                email: u.email,
                password: u.password,
                room_number: u.room_number.unwrap_or_default(),
            }))
    }

    async fn find_student_by_id(&self, id: i64) -> anyhow::Result<Option<Student>> {
        let _guard = self.lock.lock().await;
        let users: Vec<LocalUser> = self.load(USERS_KEY).await?;
        Ok(users
            .into_iter()
            .find(|u| u.is_student() && u.id == id)
            .map(|u| Student {
                id: u.id,
                name: u.name,
                email: u.email,
                password: u.password,
                room_number: u.room_number.unwrap_or_default(),
            }))
    }

    async fn identity_taken(&self, email: &str, name: &str) -> anyhow::Result<bool> {
        let _guard = self.lock.lock().await;
        let users: Vec<LocalUser> = self.load(USERS_KEY).await?;
        Ok(users.iter().any(|u| u.email == email || u.name == name))
    }

    async fn create_student(&self, student: NewStudent) -> anyhow::Result<Option<Student>> {
        let _guard = self.lock.lock().await;
        let mut users: Vec<LocalUser> = self.load(USERS_KEY).await?;
        if users
            .iter()
            .any(|u| u.email == student.email || u.name == student.name)
        {
            return Ok(None);
        }

        let id = next_id(users.iter().map(|u| u.id));
        users.push(LocalUser {
            id,
            name: student.name.clone(),
            email: student.email.clone(),
            password: student.password.clone(),
            role: Role::STUDENT.to_string(),
            room_number: Some(student.room_number.clone()),
            facility_id: None,
        });
        self.save(USERS_KEY, &users).await?;

        Ok(Some(Student {
            id,
            name: student.name,
            email: student.email,
            password: student.password,
            room_number: student.room_number,
        }))
    }
}

#[async_trait]
impl ResolutionRepo for LocalStore {
    async fn record_resolution(&self, resolution: NewResolution) -> anyhow::Result<Resolution> {
        let _guard = self.lock.lock().await;
        let mut resolutions: Vec<Resolution> = self.load(RESOLUTIONS_KEY).await?;

        let stored = Resolution {
            id: next_id(resolutions.iter().map(|r| r.id)),
            issue_id: resolution.issue_id,
            admin_id: resolution.admin_id,
            resolution_notes: resolution.resolution_notes,
            status: ResolutionStatus::Completed,
            created_at: Utc::now(),
        };
        resolutions.push(stored.clone());
        self.save(RESOLUTIONS_KEY, &resolutions).await?;

        Ok(stored)
    }

    async fn resolution_for(&self, issue_id: i64) -> anyhow::Result<Option<Resolution>> {
        let _guard = self.lock.lock().await;
        let resolutions: Vec<Resolution> = self.load(RESOLUTIONS_KEY).await?;
        // latest note wins
        Ok(resolutions
            .into_iter()
            .filter(|r| r.issue_id == issue_id)
            .max_by_key(|r| r.id))
    }
}

impl HostelStore for LocalStore {
    fn resolutions(&self) -> Option<&dyn ResolutionRepo> {
        Some(self as &dyn ResolutionRepo)
    }
}
