//! Dashboard status counts.
//!
//! One summary endpoint serves all three roles; the scope follows the caller.

mod service;
pub mod types;

pub use service::{DashboardRepository, DashboardService};
pub use types::*;
