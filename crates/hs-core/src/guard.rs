//! # Route guards
//!
//! Decides, from the user object the client presents, whether a page may be
//! shown or where to send the visitor instead.

use crate::models::{FacilityCategory, Role, SessionUser};

pub const LOGIN_PATH: &str = "/login";

/// A group of pages sharing one access rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    Student,
    SuperAdmin,
    Facility(FacilityCategory),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(String),
}

/// The category a facility admin manages: the one derived at login, or the
/// one named by a legacy role such as `messadmin`.
pub fn managed_category(user: &SessionUser) -> Option<FacilityCategory> {
    match user.role()? {
        Role::FacilityAdmin(from_role) => user.facility_category.or(from_role),
        Role::Student | Role::SuperAdmin => None,
    }
}

pub fn facility_dashboard_path(category: FacilityCategory) -> String {
    format!("/facility-admin/{category}")
}

/// Where a freshly logged-in user lands.
pub fn landing_path(user: &SessionUser) -> String {
    match user.role() {
        Some(Role::Student) => "/student".to_string(),
        Some(Role::SuperAdmin) => "/admin".to_string(),
        Some(Role::FacilityAdmin(_)) => match managed_category(user) {
            Some(category) => facility_dashboard_path(category),
            None => LOGIN_PATH.to_string(),
        },
        None => LOGIN_PATH.to_string(),
    }
}

pub fn authorize(user: Option<&SessionUser>, area: Area) -> Access {
    let login = || Access::Redirect(LOGIN_PATH.to_string());
    let Some(user) = user else {
        return login();
    };

    match (area, user.role()) {
        (Area::Student, Some(Role::Student)) => Access::Granted,
        (Area::SuperAdmin | Area::Facility(_), Some(Role::SuperAdmin)) => Access::Granted,
        (Area::SuperAdmin, Some(Role::FacilityAdmin(_))) => match managed_category(user) {
            Some(category) => Access::Redirect(facility_dashboard_path(category)),
            None => login(),
        },
        (Area::Facility(wanted), Some(Role::FacilityAdmin(_))) => {
            if managed_category(user) == Some(wanted) {
                Access::Granted
            } else {
                login()
            }
        }
        _ => login(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str, category: Option<FacilityCategory>) -> SessionUser {
        SessionUser {
            id: 1,
            name: "someone".into(),
            email: "someone@hostel.com".into(),
            role: role.into(),
            room_number: None,
            facility_id: None,
            facility_category: category,
        }
    }

    fn login() -> Access {
        Access::Redirect(LOGIN_PATH.into())
    }

    #[test]
    fn anonymous_visitors_go_to_login() {
        assert_eq!(authorize(None, Area::Student), login());
        assert_eq!(authorize(None, Area::SuperAdmin), login());
    }

    #[test]
    fn student_area_is_students_only() {
        let student = user("Student", None);
        assert_eq!(authorize(Some(&student), Area::Student), Access::Granted);
        assert_eq!(authorize(Some(&student), Area::SuperAdmin), login());

        let admin = user("superadmin", None);
        assert_eq!(authorize(Some(&admin), Area::Student), login());
    }

    #[test]
    fn super_admin_reaches_every_admin_area() {
        for role in ["superadmin", "SuperAdmin", "admin"] {
            let admin = user(role, None);
            assert_eq!(authorize(Some(&admin), Area::SuperAdmin), Access::Granted);
            assert_eq!(
                authorize(Some(&admin), Area::Facility(FacilityCategory::Medical)),
                Access::Granted
            );
        }
    }

    #[test]
    fn facility_admin_is_scoped_to_its_category() {
        let mess = user("facilityadmin", Some(FacilityCategory::Mess));
        assert_eq!(
            authorize(Some(&mess), Area::Facility(FacilityCategory::Mess)),
            Access::Granted
        );
        assert_eq!(
            authorize(Some(&mess), Area::Facility(FacilityCategory::Internet)),
            login()
        );
        assert_eq!(
            authorize(Some(&mess), Area::SuperAdmin),
            Access::Redirect("/facility-admin/mess".into())
        );
    }

    #[test]
    fn legacy_role_names_carry_their_category() {
        let mess = user("MessAdmin", None);
        assert_eq!(
            authorize(Some(&mess), Area::Facility(FacilityCategory::Mess)),
            Access::Granted
        );
        assert_eq!(landing_path(&mess), "/facility-admin/mess");
    }

    #[test]
    fn facility_admin_without_category_cannot_land() {
        let lost = user("facilityadmin", None);
        assert_eq!(landing_path(&lost), LOGIN_PATH);
        assert_eq!(authorize(Some(&lost), Area::SuperAdmin), login());
    }

    #[test]
    fn unknown_roles_are_turned_away() {
        let odd = user("janitor", None);
        assert_eq!(landing_path(&odd), LOGIN_PATH);
        assert_eq!(authorize(Some(&odd), Area::Student), login());
    }

    #[test]
    fn landing_paths_per_role() {
        assert_eq!(landing_path(&user("student", None)), "/student");
        assert_eq!(landing_path(&user("superadmin", None)), "/admin");
        assert_eq!(
            landing_path(&user("facilityadmin", Some(FacilityCategory::EntryExit))),
            "/facility-admin/entry-exit"
        );
    }
}
