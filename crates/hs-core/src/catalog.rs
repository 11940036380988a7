//! # Facility Catalog
//!
//! The facility list is reference data. The SQL migrations seed the same rows
//! as [`default_facilities`], so ids line up with [`admin_facility_category`].

use crate::models::{Facility, FacilityCategory, FacilityStatus, Role};

/// Maps an admin's `facility_id` onto the category their dashboard covers.
pub fn admin_facility_category(facility_id: i64) -> Option<FacilityCategory> {
    match facility_id {
        1 => Some(FacilityCategory::Mess),
        2 => Some(FacilityCategory::Maintenance),
        3 => Some(FacilityCategory::EntryExit),
        4 => Some(FacilityCategory::Internet),
        5 => Some(FacilityCategory::Medical),
        _ => None,
    }
}

pub fn default_facilities() -> Vec<Facility> {
    let rows: [(i64, &str, FacilityCategory, &str, &str); 7] = [
        (
            1,
            "Mess Food",
            FacilityCategory::Mess,
            "Building A, Ground Floor",
            "Central mess facility for all students",
        ),
        (
            2,
            "Room Maintenance",
            FacilityCategory::Maintenance,
            "All Blocks",
            "Repairs to rooms, furniture and fittings",
        ),
        (
            3,
            "Entry/Exit Management",
            FacilityCategory::EntryExit,
            "Main Gate",
            "Gate and security management",
        ),
        (
            4,
            "Internet",
            FacilityCategory::Internet,
            "All Blocks",
            "WiFi and wired internet connectivity",
        ),
        (
            5,
            "Medical Facility",
            FacilityCategory::Medical,
            "Building C, First Floor",
            "On-campus medical clinic",
        ),
        (
            6,
            "Room Cleaning",
            FacilityCategory::Cleaning,
            "All Rooms",
            "Daily room cleaning service",
        ),
        (
            7,
            "Others",
            FacilityCategory::Others,
            "Hostel Office",
            "Anything not covered by another facility",
        ),
    ];

    rows.into_iter()
        .map(|(id, name, category, location, description)| Facility {
            id,
            name: name.to_string(),
            category,
            location: location.to_string(),
            status: FacilityStatus::Active,
            description: description.to_string(),
        })
        .collect()
}

/// A login seeded into fresh stores so the dashboards can be tried out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoAccount {
    pub name: &'static str,
    pub email: &'static str,
    pub password: &'static str,
    pub role: &'static str,
    pub facility_id: Option<i64>,
    pub room_number: Option<&'static str>,
}

impl DemoAccount {
    pub fn is_student(&self) -> bool {
        self.role == Role::STUDENT
    }
}

const fn facility_admin(name: &'static str, email: &'static str, facility_id: i64) -> DemoAccount {
    DemoAccount {
        name,
        email,
        password: "admin123",
        role: Role::FACILITY_ADMIN,
        facility_id: Some(facility_id),
        room_number: None,
    }
}

pub const DEMO_ACCOUNTS: [DemoAccount; 7] = [
    DemoAccount {
        name: "superadmin",
        email: "superadmin@hostel.com",
        password: "admin123",
        role: "superadmin",
        facility_id: None,
        room_number: None,
    },
    facility_admin("messadmin", "mess@hostel.com", 1),
    facility_admin("maintenanceadmin", "maintenance@hostel.com", 2),
    facility_admin("gateadmin", "gate@hostel.com", 3),
    facility_admin("internetadmin", "internet@hostel.com", 4),
    facility_admin("medicaladmin", "medical@hostel.com", 5),
    DemoAccount {
        name: "Rohan Sharma",
        email: "student@hostel.com",
        password: "student123",
        role: Role::STUDENT,
        facility_id: None,
        room_number: Some("A-102"),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_map_agrees_with_catalog_ids() {
        let catalog = default_facilities();
        for id in 1..=5 {
            let facility = catalog.iter().find(|f| f.id == id).unwrap();
            assert_eq!(admin_facility_category(id), Some(facility.category));
        }
        assert_eq!(admin_facility_category(42), None);
    }

    #[test]
    fn demo_admins_point_at_mapped_facilities() {
        for account in DEMO_ACCOUNTS.iter().filter(|a| !a.is_student()) {
            if let Some(id) = account.facility_id {
                assert!(admin_facility_category(id).is_some(), "{}", account.name);
            }
        }
        assert_eq!(DEMO_ACCOUNTS.iter().filter(|a| a.is_student()).count(), 1);
    }

    #[test]
    fn first_facility_is_mess() {
        assert_eq!(admin_facility_category(1), Some(FacilityCategory::Mess));
    }
}
