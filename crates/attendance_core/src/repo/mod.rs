//! Classroom store contracts and SQLite implementation.
//!
//! # Responsibility
//! - Define the load/save-by-identifier contract the classroom service
//!   depends on.
//! - Keep SQL details out of the service layer.
//!
//! # Invariants
//! - Read paths return semantic `NotFound` next to storage errors.
//! - Read-modify-write on one classroom runs under a single writer lock.

pub mod classroom_repo;
