//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.
//! The domain repositories implement the persistence traits of `firecert-core`.

pub mod application;
pub mod dashboard;
pub mod establishment;
pub mod inspection;
pub mod profile;
pub mod session;

pub use application::ApplicationRepository;
pub use dashboard::DashboardRepository;
pub use establishment::EstablishmentRepository;
pub use inspection::InspectionRepository;
pub use profile::{NewProfile, ProfileError, ProfileRepository, to_profile};
pub use session::SessionRepository;
