//! # Accounts
//!
//! Login and registration against the admin and student tables. There are no
//! session tokens: a successful login returns the [`SessionUser`] and the
//! client keeps it.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use crate::catalog::admin_facility_category;
use crate::error::{AppError, Result};
use crate::models::{Admin, NewStudent, Role, SessionUser, Student};
use crate::traits::{AuthProvider, UserRepo};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    pub identifier: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Registration {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "roomNumber")]
    pub room_number: Option<String>,
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn admin_session(admin: &Admin) -> SessionUser {
    let role = admin
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(Role::FACILITY_ADMIN)
        .to_string();

    SessionUser {
        id: admin.id,
        name: admin.name.clone(),
        email: admin.email.clone(),
        role,
        room_number: None,
        facility_id: admin.facility_id,
        facility_category: admin.facility_id.and_then(admin_facility_category),
    }
}

/// Admins are checked before students; the first table holding the
/// identifier decides the outcome.
pub async fn authenticate<U, A>(users: &U, auth: &A, credentials: Credentials) -> Result<SessionUser>
where
    U: UserRepo + ?Sized,
    A: AuthProvider + ?Sized,
{
    let (identifier, password) = match (
        required(credentials.identifier),
        credentials.password.filter(|p| !p.is_empty()),
    ) {
        (Some(identifier), Some(password)) => (identifier, password),
        _ => {
            return Err(AppError::ValidationError(
                "Email/Username and password are required".into(),
            ))
        }
    };

    if let Some(admin) = users.find_admin(&identifier).await? {
        if !auth.verify_password(&password, &admin.password).await {
            return Err(AppError::Unauthorized("Invalid password".into()));
        }
        let user = admin_session(&admin);
        info!(user_id = user.id, role = %user.role, "admin authenticated");
        return Ok(user);
    }

    if let Some(student) = users.find_student(&identifier).await? {
        if !auth.verify_password(&password, &student.password).await {
            return Err(AppError::Unauthorized("Invalid password".into()));
        }
        info!(user_id = student.id, "student authenticated");
        return Ok(SessionUser::from(&student));
    }

    Err(AppError::NotFound("user".into()))
}

/// Creates a student account. Names and emails are unique across both tables.
pub async fn register<U, A>(users: &U, auth: &A, registration: Registration) -> Result<Student>
where
    U: UserRepo + ?Sized,
    A: AuthProvider + ?Sized,
{
    let missing = || AppError::ValidationError("All fields are required".into());
    let name = required(registration.name).ok_or_else(missing)?;
    let email = required(registration.email).ok_or_else(missing)?;
    let password = registration
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(missing)?;
    let room_number = required(registration.room_number).ok_or_else(missing)?;

    let taken = || AppError::Conflict("User with this email or name already exists".into());
    if users.identity_taken(&email, &name).await? {
        return Err(taken());
    }

    let student = users
        .create_student(NewStudent {
            name,
            email,
            password: auth.hash_password(&password)?,
            room_number,
        })
        .await?
        .ok_or_else(taken)?;
    info!(user_id = student.id, "student registered");
    Ok(student)
}

/// Compares passwords as stored, with no hashing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextAuth;

#[async_trait]
impl AuthProvider for PlainTextAuth {
    fn hash_password(&self, password: &str) -> anyhow::Result<String> {
        Ok(password.to_string())
    }

    async fn verify_password(&self, password: &str, stored: &str) -> bool {
        password == stored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FacilityCategory;
    use crate::traits::{MockAuthProvider, MockUserRepo};
    use mockall::predicate::eq;

    fn mess_admin() -> Admin {
        Admin {
            id: 3,
            name: "messadmin".into(),
            email: "mess@hostel.com".into(),
            password: "secret".into(),
            role: None,
            facility_id: Some(1),
        }
    }

    fn student() -> Student {
        Student {
            id: 11,
            name: "Rohan Sharma".into(),
            email: "student@hostel.com".into(),
            password: "pw".into(),
            room_number: "A-102".into(),
        }
    }

    fn creds(identifier: &str, password: &str) -> Credentials {
        Credentials {
            identifier: Some(identifier.into()),
            password: Some(password.into()),
        }
    }

    #[tokio::test]
    async fn facility_admin_gets_derived_category() {
        let mut users = MockUserRepo::new();
        users
            .expect_find_admin()
            .with(eq("mess@hostel.com"))
            .returning(|_| Ok(Some(mess_admin())));

        let user = authenticate(&users, &PlainTextAuth, creds("mess@hostel.com", "secret"))
            .await
            .unwrap();
        assert_eq!(user.role, "facilityadmin");
        assert_eq!(user.facility_id, Some(1));
        assert_eq!(user.facility_category, Some(FacilityCategory::Mess));
    }

    #[tokio::test]
    async fn wrong_admin_password_is_unauthorized() {
        let mut users = MockUserRepo::new();
        users.expect_find_admin().returning(|_| Ok(Some(mess_admin())));
        users.expect_find_student().never();

        let err = authenticate(&users, &PlainTextAuth, creds("messadmin", "nope"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn student_login_uses_stored_credential() {
        let mut users = MockUserRepo::new();
        users.expect_find_admin().returning(|_| Ok(None));
        users.expect_find_student().returning(|_| Ok(Some(student())));

        let mut auth = MockAuthProvider::new();
        auth.expect_verify_password()
            .withf(|given, stored| given == "pw" && stored == "pw")
            .returning(|_, _| true);

        let user = authenticate(&users, &auth, creds("Rohan Sharma", "pw"))
            .await
            .unwrap();
        assert_eq!(user.role, "student");
        assert_eq!(user.room_number.as_deref(), Some("A-102"));
        assert_eq!(user.facility_category, None);
    }

    #[tokio::test]
    async fn unknown_identifier_is_not_found() {
        let mut users = MockUserRepo::new();
        users.expect_find_admin().returning(|_| Ok(None));
        users.expect_find_student().returning(|_| Ok(None));

        let err = authenticate(&users, &PlainTextAuth, creds("ghost", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "User not found");
    }

    #[tokio::test]
    async fn missing_password_is_rejected_before_lookup() {
        let users = MockUserRepo::new();
        let err = authenticate(
            &users,
            &PlainTextAuth,
            Credentials {
                identifier: Some("someone".into()),
                password: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn register_conflicts_on_taken_identity() {
        let mut users = MockUserRepo::new();
        users
            .expect_identity_taken()
            .with(eq("student@hostel.com"), eq("Rohan Sharma"))
            .returning(|_, _| Ok(true));
        users.expect_create_student().never();

        let err = register(
            &users,
            &PlainTextAuth,
            Registration {
                name: Some("Rohan Sharma".into()),
                email: Some("student@hostel.com".into()),
                password: Some("pw".into()),
                room_number: Some("B-7".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn register_stores_hashed_password() {
        let mut users = MockUserRepo::new();
        users.expect_identity_taken().returning(|_, _| Ok(false));
        users
            .expect_create_student()
            .withf(|new| new.password == "hashed:pw")
            .returning(|new| {
                Ok(Some(Student {
                    id: 2,
                    name: new.name,
                    email: new.email,
                    password: new.password,
                    room_number: new.room_number,
                }))
            });

        let mut auth = MockAuthProvider::new();
        auth.expect_hash_password()
            .returning(|pw| Ok(format!("hashed:{pw}")));

        let student = register(
            &users,
            &auth,
            Registration {
                name: Some("Priya Singh".into()),
                email: Some("priya@hostel.com".into()),
                password: Some("pw".into()),
                room_number: Some("C-12".into()),
            },
        )
        .await
        .unwrap();
        assert_eq!(student.id, 2);
    }

    #[tokio::test]
    async fn register_conflicts_when_insert_loses_race() {
        let mut users = MockUserRepo::new();
        users.expect_identity_taken().returning(|_, _| Ok(false));
        users.expect_create_student().times(1).returning(|_| Ok(None));

        let err = register(
            &users,
            &PlainTextAuth,
            Registration {
                name: Some("Amit Kumar".into()),
                email: Some("amit@hostel.com".into()),
                password: Some("pw".into()),
                room_number: Some("B-3".into()),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
