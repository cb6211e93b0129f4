//! Classroom use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into the classroom mutation rules.
//! - Keep request-handling layers decoupled from storage details.

pub mod classroom_service;
