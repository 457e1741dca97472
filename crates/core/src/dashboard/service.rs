//! Dashboard service implementation.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use firecert_shared::AppError;

use super::types::{ApplicationCount, DashboardScope, DashboardSummary, EstablishmentCount};
use crate::auth::{Actor, Role};
use crate::workflow::{ApplicationStatus, CertificateType, EstablishmentStatus};

/// Repository trait for dashboard aggregates.
pub trait DashboardRepository: Send + Sync {
    /// Establishment counts grouped by status.
    fn establishment_counts(
        &self,
        scope: DashboardScope,
    ) -> impl Future<Output = Result<Vec<(EstablishmentStatus, u64)>, AppError>> + Send;

    /// Application counts grouped by certificate type and status.
    fn application_counts(
        &self,
        scope: DashboardScope,
    ) -> impl Future<Output = Result<Vec<(CertificateType, ApplicationStatus, u64)>, AppError>> + Send;
}

/// Dashboard service.
pub struct DashboardService<R: DashboardRepository> {
    repo: Arc<R>,
}

impl<R: DashboardRepository> DashboardService<R> {
    /// Create a new dashboard service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Status counts for the caller: everything for admins, own records for
    /// owners, own assignments for inspectors.
    pub async fn summary(&self, actor: &Actor) -> Result<DashboardSummary, AppError> {
        let scope = match actor.role {
            Role::Admin => DashboardScope::All,
            Role::Owner => DashboardScope::Owner(actor.user_id),
            Role::Inspector => DashboardScope::Inspector(actor.user_id),
        };

        let establishment_rows = if matches!(scope, DashboardScope::Inspector(_)) {
            Vec::new()
        } else {
            self.repo.establishment_counts(scope).await?
        };
        let application_rows = self.repo.application_counts(scope).await?;

        Ok(build_summary(scope, &establishment_rows, &application_rows))
    }
}

fn build_summary(
    scope: DashboardScope,
    establishment_rows: &[(EstablishmentStatus, u64)],
    application_rows: &[(CertificateType, ApplicationStatus, u64)],
) -> DashboardSummary {
    let establishment_totals: HashMap<EstablishmentStatus, u64> =
        establishment_rows.iter().copied().collect();
    let application_totals: HashMap<(CertificateType, ApplicationStatus), u64> = application_rows
        .iter()
        .map(|(cert, status, count)| ((*cert, *status), *count))
        .collect();

    let establishments = if matches!(scope, DashboardScope::Inspector(_)) {
        Vec::new()
    } else {
        EstablishmentStatus::ALL
            .into_iter()
            .map(|status| EstablishmentCount {
                status,
                count: establishment_totals.get(&status).copied().unwrap_or(0),
            })
            .collect()
    };

    let applications: Vec<ApplicationCount> = CertificateType::ALL
        .into_iter()
        .filter(|cert| !matches!(scope, DashboardScope::Inspector(_)) || cert.requires_inspection())
        .flat_map(|cert| {
            cert.reachable_statuses()
                .iter()
                .map(move |status| (cert, *status))
        })
        .map(|(certificate_type, status)| ApplicationCount {
            certificate_type,
            status,
            count: application_totals
                .get(&(certificate_type, status))
                .copied()
                .unwrap_or(0),
        })
        .collect();

    let awaiting_decision = applications
        .iter()
        .filter(|c| match c.status {
            ApplicationStatus::Pending => !c.certificate_type.requires_inspection(),
            ApplicationStatus::Inspected => true,
            _ => false,
        })
        .map(|c| c.count)
        .sum();
    let scheduled_inspections = applications
        .iter()
        .filter(|c| c.status == ApplicationStatus::ForInspection)
        .map(|c| c.count)
        .sum();

    DashboardSummary {
        pending_registrations: establishment_totals
            .get(&EstablishmentStatus::Pending)
            .copied()
            .unwrap_or(0),
        establishments,
        applications,
        awaiting_decision,
        scheduled_inspections,
    }
}
