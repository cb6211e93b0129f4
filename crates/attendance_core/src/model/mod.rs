//! Classroom aggregate model.
//!
//! # Responsibility
//! - Define the classroom aggregate and the values embedded in it.
//! - Own the pure mutation rules (enrollment, attendance, notes).
//!
//! # Invariants
//! - A classroom never holds two students with the same student id.
//! - Students, attendance records and notes are owned by exactly one
//!   classroom; they have no identity outside it.

pub mod attendance;
pub mod classroom;
pub mod join_code;
