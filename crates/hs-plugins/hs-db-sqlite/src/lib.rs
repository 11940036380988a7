//! # hs-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `hs-core` domain models. Every write is a single autocommitted
//! statement, except the demo seed which runs in one transaction.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hs_core::catalog::DEMO_ACCOUNTS;
use hs_core::models::{
    Admin, Facility, FacilityStatus, Issue, IssueRecord, IssueScope, IssueStatus, NewIssue,
    NewStudent, Student,
};
use hs_core::traits::{FacilityRepo, HostelStore, IssueRepo, UserRepo};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use tracing::{debug, info};

macro_rules! issue_listing {
    ($tail:literal) => {
        concat!(
            "SELECT i.id, i.student_id, i.title, i.description, i.category, i.status, i.created_at, ",
            "s.name AS student_name, s.room_number ",
            "FROM issue i JOIN student s ON i.student_id = s.id",
            $tail
        )
    };
}

const ISSUE_COLUMNS: &str =
    "SELECT id, student_id, title, description, category, status, created_at FROM issue";

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database and applies pending migrations.
    ///
    /// In-memory URLs get a single long-lived connection so every query sees
    /// the same database.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };
        let pool = pool_options.connect_with(options).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        info!(in_memory, "sqlite store ready");

        Ok(Self { pool })
    }

    /// Inserts the demo admins and student unless an admin already exists.
    pub async fn seed_demo_accounts(&self) -> anyhow::Result<()> {
        let admins: i64 = sqlx::query("SELECT COUNT(*) FROM admin")
            .fetch_one(&self.pool)
            .await?
            .try_get(0)?;
        if admins > 0 {
            debug!(admins, "accounts present, skipping demo seed");
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        for account in DEMO_ACCOUNTS {
            if account.is_student() {
                sqlx::query(
                    "INSERT INTO student (name, email, password, room_number) VALUES (?, ?, ?, ?)",
                )
                .bind(account.name)
                .bind(account.email)
                .bind(account.password)
                .bind(account.room_number.unwrap_or_default())
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query(
                    "INSERT INTO admin (name, email, password, role, facility_id) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(account.name)
                .bind(account.email)
                .bind(account.password)
                .bind(account.role)
                .bind(account.facility_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        info!(accounts = DEMO_ACCOUNTS.len(), "seeded demo accounts");
        Ok(())
    }
}

fn facility_from_row(row: &SqliteRow) -> anyhow::Result<Facility> {
    Ok(Facility {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        category: row.try_get::<String, _>("category")?.parse()?,
        location: row.try_get("location")?,
        status: row
            .try_get::<String, _>("status")?
            .parse::<FacilityStatus>()
            .map_err(anyhow::Error::msg)?,
        description: row.try_get("description")?,
    })
}

fn issue_from_row(row: &SqliteRow) -> anyhow::Result<Issue> {
    Ok(Issue {
        id: row.try_get("id")?,
        student_id: row.try_get("student_id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        category: row.try_get::<String, _>("category")?.parse()?,
        status: row.try_get::<String, _>("status")?.parse()?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn record_from_row(row: &SqliteRow) -> anyhow::Result<IssueRecord> {
    Ok(IssueRecord {
        issue: issue_from_row(row)?,
        student_name: row.try_get("student_name")?,
        room_number: row.try_get("room_number")?,
    })
}

fn admin_from_row(row: &SqliteRow) -> anyhow::Result<Admin> {
    Ok(Admin {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        role: row.try_get("role")?,
        facility_id: row.try_get("facility_id")?,
    })
}

fn student_from_row(row: &SqliteRow) -> anyhow::Result<Student> {
    Ok(Student {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password: row.try_get("password")?,
        room_number: row.try_get("room_number")?,
    })
}

#[async_trait]
impl FacilityRepo for SqliteStore {
    async fn list_facilities(&self) -> anyhow::Result<Vec<Facility>> {
        sqlx::query("SELECT * FROM facility ORDER BY id")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(facility_from_row)
            .collect()
    }

    async fn get_facility(&self, id: i64) -> anyhow::Result<Option<Facility>> {
        sqlx::query("SELECT * FROM facility WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(facility_from_row)
            .transpose()
    }
}

#[async_trait]
impl IssueRepo for SqliteStore {
    async fn create_issue(&self, issue: NewIssue) -> anyhow::Result<Issue> {
        let created_at = Utc::now();
        let status = IssueStatus::Pending;

        let id = sqlx::query(
            "INSERT INTO issue (student_id, title, description, category, status, created_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(issue.student_id)
        .bind(issue.title.clone())
        .bind(issue.description.clone())
        .bind(issue.category.as_str())
        .bind(status.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        Ok(Issue {
            id,
            student_id: issue.student_id,
            title: issue.title,
            description: issue.description,
            category: issue.category,
            status,
            created_at,
        })
    }

    async fn get_issue(&self, id: i64) -> anyhow::Result<Option<Issue>> {
        sqlx::query(&format!("{ISSUE_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(issue_from_row)
            .transpose()
    }

    async fn list_issues(&self, scope: IssueScope) -> anyhow::Result<Vec<IssueRecord>> {
        let query = match scope {
            IssueScope::All => {
                sqlx::query(issue_listing!(" ORDER BY i.created_at DESC, i.id DESC"))
            }
            IssueScope::Student(student_id) => sqlx::query(issue_listing!(
                " WHERE i.student_id = ? ORDER BY i.created_at DESC, i.id DESC"
            ))
            .bind(student_id),
            IssueScope::Category(category) => sqlx::query(issue_listing!(
                " WHERE i.category = ? ORDER BY i.created_at DESC, i.id DESC"
            ))
            .bind(category.as_str()),
        };

        query
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(record_from_row)
            .collect()
    }

    async fn update_status(&self, id: i64, status: IssueStatus) -> anyhow::Result<Option<Issue>> {
        let affected = sqlx::query("UPDATE issue SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Ok(None);
        }
        self.get_issue(id).await
    }
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn find_admin(&self, identifier: &str) -> anyhow::Result<Option<Admin>> {
        sqlx::query("SELECT * FROM admin WHERE email = ? OR name = ? ORDER BY id LIMIT 1")
            .bind(identifier)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(admin_from_row)
            .transpose()
    }

    async fn find_student(&self, identifier: &str) -> anyhow::Result<Option<Student>> {
        sqlx::query("SELECT * FROM student WHERE email = ? OR name = ? ORDER BY id LIMIT 1")
            .bind(identifier)
            .bind(identifier)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(student_from_row)
            .transpose()
    }

    async fn find_student_by_id(&self, id: i64) -> anyhow::Result<Option<Student>> {
        sqlx::query("SELECT * FROM student WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .as_ref()
            .map(student_from_row)
            .transpose()
    }

    async fn identity_taken(&self, email: &str, name: &str) -> anyhow::Result<bool> {
        let taken: i64 = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM admin WHERE email = ? OR name = ?) \
             OR EXISTS(SELECT 1 FROM student WHERE email = ? OR name = ?)",
        )
        .bind(email)
        .bind(name)
        .bind(email)
        .bind(name)
        .fetch_one(&self.pool)
        .await?
        .try_get(0)?;
        Ok(taken != 0)
    }

    /// The identity check and the insert share one write transaction; the
    /// unique indexes on `student` catch whatever slips past it.
    async fn create_student(&self, student: NewStudent) -> anyhow::Result<Option<Student>> {
        let mut tx = self.pool.begin().await?;

        let taken: i64 = sqlx::query(
            "SELECT EXISTS(SELECT 1 FROM admin WHERE email = ? OR name = ?) \
             OR EXISTS(SELECT 1 FROM student WHERE email = ? OR name = ?)",
        )
        .bind(student.email.as_str())
        .bind(student.name.as_str())
        .bind(student.email.as_str())
        .bind(student.name.as_str())
        .fetch_one(&mut *tx)
        .await?
        .try_get(0)?;
        if taken != 0 {
            return Ok(None);
        }

        let inserted = sqlx::query(
            "INSERT INTO student (name, email, password, room_number) VALUES (?, ?, ?, ?)",
        )
        .bind(student.name.as_str())
        .bind(student.email.as_str())
        .bind(student.password.as_str())
        .bind(student.room_number.as_str())
        .execute(&mut *tx)
        .await;

        let id = match inserted {
            Ok(done) => done.last_insert_rowid(),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                debug!(email = %student.email, "student identity claimed concurrently");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;

        Ok(Some(Student {
            id,
            name: student.name,
            email: student.email,
            password: student.password,
            room_number: student.room_number,
        }))
    }
}

impl HostelStore for SqliteStore {}

#[cfg(test)]
mod tests {
    use super::*;
    use hs_core::models::FacilityCategory;

    async fn store() -> SqliteStore {
        SqliteStore::new("sqlite::memory:").await.unwrap()
    }

    async fn student(store: &SqliteStore, name: &str) -> Student {
        store
            .create_student(NewStudent {
                name: name.into(),
                email: format!("{}@hostel.com", name.to_lowercase()),
                password: "pw".into(),
                room_number: "B-12".into(),
            })
            .await
            .unwrap()
            .expect("fresh identity")
    }

    fn new_issue(student_id: i64, title: &str, category: FacilityCategory) -> NewIssue {
        NewIssue {
            student_id,
            title: title.into(),
            description: "details".into(),
            category,
        }
    }

    #[tokio::test]
    async fn test_catalog_is_seeded_by_migration() {
        let store = store().await;
        let facilities = store.list_facilities().await.unwrap();
        assert_eq!(facilities.len(), 7);
        assert_eq!(facilities[0].category, FacilityCategory::Mess);

        let gate = store.get_facility(3).await.unwrap().unwrap();
        assert_eq!(gate.category, FacilityCategory::EntryExit);
        assert!(store.get_facility(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_and_list_issue() {
        let store = store().await;
        let priya = student(&store, "Priya").await;

        let issue = store
            .create_issue(new_issue(priya.id, "Cold food", FacilityCategory::Mess))
            .await
            .expect("Failed to create issue");
        assert!(issue.id > 0);
        assert_eq!(issue.status, IssueStatus::Pending);

        let listed = store.list_issues(IssueScope::All).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].issue, issue);
        assert_eq!(listed[0].student_name, "Priya");
        assert_eq!(listed[0].room_number.as_deref(), Some("B-12"));
    }

    #[tokio::test]
    async fn test_identical_submissions_create_two_records() {
        let store = store().await;
        let amit = student(&store, "Amit").await;
        let first = store
            .create_issue(new_issue(amit.id, "Slow WiFi", FacilityCategory::Internet))
            .await
            .unwrap();
        let second = store
            .create_issue(new_issue(amit.id, "Slow WiFi", FacilityCategory::Internet))
            .await
            .unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_scoped_listings() {
        let store = store().await;
        let priya = student(&store, "Priya").await;
        let amit = student(&store, "Amit").await;
        store.create_issue(new_issue(priya.id, "Cold food", FacilityCategory::Mess)).await.unwrap();
        store.create_issue(new_issue(amit.id, "Slow WiFi", FacilityCategory::Internet)).await.unwrap();
        store.create_issue(new_issue(amit.id, "Bland dal", FacilityCategory::Mess)).await.unwrap();

        let amits = store.list_issues(IssueScope::Student(amit.id)).await.unwrap();
        assert_eq!(amits.len(), 2);
        assert!(amits.iter().all(|r| r.issue.student_id == amit.id));

        let mess = store
            .list_issues(IssueScope::Category(FacilityCategory::Mess))
            .await
            .unwrap();
        assert_eq!(mess.len(), 2);
        assert!(mess.iter().all(|r| r.issue.category == FacilityCategory::Mess));
        // newest first
        assert_eq!(mess[0].issue.title, "Bland dal");
    }

    #[tokio::test]
    async fn test_update_status_touches_only_status() {
        let store = store().await;
        let priya = student(&store, "Priya").await;
        let before = store
            .create_issue(new_issue(priya.id, "Cold food", FacilityCategory::Mess))
            .await
            .unwrap();

        let after = store
            .update_status(before.id, IssueStatus::Resolved)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after.status, IssueStatus::Resolved);
        assert_eq!(Issue { status: before.status, ..after }, before);

        assert!(store.update_status(999, IssueStatus::Raised).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_demo_accounts_and_identity_checks() {
        let store = store().await;
        store.seed_demo_accounts().await.unwrap();
        // second call is a no-op
        store.seed_demo_accounts().await.unwrap();

        let by_email = store.find_admin("mess@hostel.com").await.unwrap().unwrap();
        let by_name = store.find_admin("messadmin").await.unwrap().unwrap();
        assert_eq!(by_email.id, by_name.id);
        assert_eq!(by_email.facility_id, Some(1));
        assert_eq!(by_email.role.as_deref(), Some("facilityadmin"));

        let student = store.find_student("student@hostel.com").await.unwrap().unwrap();
        assert_eq!(student.room_number, "A-102");

        assert!(store.identity_taken("nobody@hostel.com", "superadmin").await.unwrap());
        assert!(store.identity_taken("student@hostel.com", "someone new").await.unwrap());
        assert!(!store.identity_taken("new@hostel.com", "New Person").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_student_refuses_taken_identity() {
        let store = store().await;
        store.seed_demo_accounts().await.unwrap();
        let neha = student(&store, "Neha").await;
        assert_eq!(store.find_student_by_id(neha.id).await.unwrap(), Some(neha.clone()));
        assert!(store.find_student_by_id(999).await.unwrap().is_none());

        for (name, email) in [
            ("Neha", "other@hostel.com"),
            ("Someone", "neha@hostel.com"),
            ("gateadmin", "gate2@hostel.com"),
        ] {
            let again = store
                .create_student(NewStudent {
                    name: name.into(),
                    email: email.into(),
                    password: "pw".into(),
                    room_number: "E-1".into(),
                })
                .await
                .unwrap();
            assert!(again.is_none(), "{name} / {email}");
        }
    }

    #[tokio::test]
    async fn test_unique_index_backs_identity_check() {
        let store = store().await;
        student(&store, "Neha").await;
        let err = sqlx::query(
            "INSERT INTO student (name, email, password, room_number) VALUES ('x', 'neha@hostel.com', 'pw', 'E-1')",
        )
        .execute(&store.pool)
        .await
        .unwrap_err();
        assert!(matches!(err, sqlx::Error::Database(ref e) if e.is_unique_violation()));
    }
}
