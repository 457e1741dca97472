//! Status workflows for Firecert.
//!
//! This module implements the two lifecycle state machines: establishment
//! registration and certification applications. Every status mutation in
//! the services goes through one of these.
//!
//! # Modules
//!
//! - `types` - Status enums, certificate types, and actions
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic

pub mod error;
pub mod service;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::WorkflowError;
pub use service::{ApplicationWorkflow, EstablishmentWorkflow};
pub use types::{
    ApplicationAction, ApplicationStatus, CertificateType, Decision, EstablishmentAction,
    EstablishmentStatus,
};
