//! Core permitting logic for Firecert.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Services talk to persistence through repository traits implemented by the
//! db crate.
//!
//! # Modules
//!
//! - `auth` - Roles, actors, and password hashing
//! - `workflow` - Establishment and application status state machines
//! - `establishment` - Establishment registration
//! - `application` - Certification applications and their documents
//! - `inspection` - Inspection checklists and assignment lookup
//! - `dashboard` - Status counts scoped by role
//! - `storage` - Object storage for documents and inspection photos

pub mod application;
pub mod auth;
pub mod dashboard;
pub mod establishment;
pub mod inspection;
pub mod storage;
pub mod workflow;

#[cfg(test)]
mod testing;
