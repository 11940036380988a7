//! hostel-solve/crates/hs-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Hostel Solve.

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod guard;
pub mod issues;
pub mod models;
pub mod traits;
pub mod views;

// Re-exporting for easier access in other crates
pub use error::*;
pub use models::*;
pub use traits::*;
