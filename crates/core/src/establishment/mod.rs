//! Establishment registration.
//!
//! Owners create establishments and submit them with an address; admins
//! approve or reject the registration. Only registered establishments may
//! apply for certificates.

mod error;
mod service;
mod types;

pub use error::EstablishmentError;
pub use service::{EstablishmentRepository, EstablishmentService};
pub use types::{
    CreateEstablishmentInput, Establishment, EstablishmentFilter, EstablishmentTransition,
    NewEstablishment,
};
