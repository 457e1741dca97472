//! Establishment service implementation.

use std::future::Future;
use std::sync::Arc;

use firecert_shared::types::{PageRequest, PageResponse};
use tracing::info;
use uuid::Uuid;

use super::error::EstablishmentError;
use super::types::{
    CreateEstablishmentInput, Establishment, EstablishmentFilter, EstablishmentTransition,
    NewEstablishment,
};
use crate::auth::{Actor, Role};
use crate::workflow::{EstablishmentAction, EstablishmentWorkflow, WorkflowError};

const MAX_NAME_LENGTH: usize = 255;
const MAX_DTI_LENGTH: usize = 64;

/// Repository trait for establishment persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait EstablishmentRepository: Send + Sync {
    /// Insert a new `unregistered` establishment.
    ///
    /// Returns `DuplicateDtiNumber` if the DTI number is taken.
    fn create(
        &self,
        input: NewEstablishment,
    ) -> impl Future<Output = Result<Establishment, EstablishmentError>> + Send;

    /// Find establishment by ID.
    fn find_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = Result<Option<Establishment>, EstablishmentError>> + Send;

    /// List establishments matching a filter, newest first, with the total count.
    fn list(
        &self,
        filter: EstablishmentFilter,
        page: PageRequest,
    ) -> impl Future<Output = Result<(Vec<Establishment>, u64), EstablishmentError>> + Send;

    /// Apply a status change if the row is still in `expected`.
    ///
    /// Returns `None` when the status had already changed.
    fn transition(
        &self,
        change: EstablishmentTransition,
    ) -> impl Future<Output = Result<Option<Establishment>, EstablishmentError>> + Send;
}

/// Establishment registration service.
pub struct EstablishmentService<R: EstablishmentRepository> {
    repo: Arc<R>,
}

impl<R: EstablishmentRepository> EstablishmentService<R> {
    /// Create a new establishment service.
    #[must_use]
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Create an `unregistered` establishment owned by the caller.
    pub async fn create(
        &self,
        actor: &Actor,
        input: CreateEstablishmentInput,
    ) -> Result<Establishment, EstablishmentError> {
        actor.require(Role::Owner)?;

        let name = input.name.trim();
        let dti_cert_no = input.dti_cert_no.trim();
        if name.is_empty() || name.len() > MAX_NAME_LENGTH {
            return Err(EstablishmentError::Validation(format!(
                "name must be between 1 and {MAX_NAME_LENGTH} characters"
            )));
        }
        if dti_cert_no.is_empty() || dti_cert_no.len() > MAX_DTI_LENGTH {
            return Err(EstablishmentError::Validation(format!(
                "dti_cert_no must be between 1 and {MAX_DTI_LENGTH} characters"
            )));
        }

        let establishment = self
            .repo
            .create(NewEstablishment {
                id: Uuid::new_v4(),
                owner_id: actor.user_id,
                name: name.to_string(),
                dti_cert_no: dti_cert_no.to_string(),
            })
            .await?;

        info!(
            establishment_id = %establishment.id,
            owner_id = %actor.user_id,
            "Establishment created"
        );
        Ok(establishment)
    }

    /// Get an establishment. Owners may only read their own.
    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<Establishment, EstablishmentError> {
        let establishment = self.load(id).await?;
        match actor.role {
            Role::Admin => Ok(establishment),
            Role::Owner if establishment.owner_id == actor.user_id => Ok(establishment),
            _ => Err(EstablishmentError::Forbidden(
                "you cannot view this establishment".to_string(),
            )),
        }
    }

    /// List establishments. Owners see only their own; admins see all.
    pub async fn list(
        &self,
        actor: &Actor,
        mut filter: EstablishmentFilter,
        page: PageRequest,
    ) -> Result<PageResponse<Establishment>, EstablishmentError> {
        match actor.role {
            Role::Admin => {}
            Role::Owner => filter.owner_id = Some(actor.user_id),
            Role::Inspector => {
                return Err(EstablishmentError::Forbidden(
                    "inspectors cannot list establishments".to_string(),
                ));
            }
        }

        let page = page.normalized();
        let (items, total) = self.repo.list(filter, page).await?;
        Ok(PageResponse::new(items, page, total))
    }

    /// Submit an unregistered establishment for approval with its address.
    pub async fn register(
        &self,
        actor: &Actor,
        id: Uuid,
        address: &str,
    ) -> Result<Establishment, EstablishmentError> {
        let establishment = self.load(id).await?;
        actor.require_owner_of(establishment.owner_id)?;

        let new_status = EstablishmentWorkflow::register(establishment.status, address)?;
        self.apply(EstablishmentTransition {
            id,
            expected: establishment.status,
            new_status,
            address: Some(address.trim().to_string()),
            rejection_reason: None,
        })
        .await
    }

    /// Resubmit a rejected establishment, optionally with a corrected address.
    pub async fn resubmit(
        &self,
        actor: &Actor,
        id: Uuid,
        address: Option<&str>,
    ) -> Result<Establishment, EstablishmentError> {
        let establishment = self.load(id).await?;
        actor.require_owner_of(establishment.owner_id)?;

        let new_status =
            EstablishmentWorkflow::transition(establishment.status, EstablishmentAction::Resubmit)?;
        let address = match address.map(str::trim) {
            Some("") => return Err(WorkflowError::AddressRequired.into()),
            other => other.map(String::from),
        };

        self.apply(EstablishmentTransition {
            id,
            expected: establishment.status,
            new_status,
            address,
            rejection_reason: None,
        })
        .await
    }

    /// Approve a pending registration.
    pub async fn approve(&self, actor: &Actor, id: Uuid) -> Result<Establishment, EstablishmentError> {
        actor.require(Role::Admin)?;
        let establishment = self.load(id).await?;

        let new_status =
            EstablishmentWorkflow::transition(establishment.status, EstablishmentAction::Approve)?;
        self.apply(EstablishmentTransition {
            id,
            expected: establishment.status,
            new_status,
            address: None,
            rejection_reason: None,
        })
        .await
    }

    /// Reject a pending registration. The reason is stored verbatim.
    pub async fn reject(
        &self,
        actor: &Actor,
        id: Uuid,
        reason: &str,
    ) -> Result<Establishment, EstablishmentError> {
        actor.require(Role::Admin)?;
        let establishment = self.load(id).await?;

        let new_status = EstablishmentWorkflow::reject(establishment.status, reason)?;
        self.apply(EstablishmentTransition {
            id,
            expected: establishment.status,
            new_status,
            address: None,
            rejection_reason: Some(reason.to_string()),
        })
        .await
    }

    async fn load(&self, id: Uuid) -> Result<Establishment, EstablishmentError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(EstablishmentError::NotFound(id))
    }

    async fn apply(
        &self,
        change: EstablishmentTransition,
    ) -> Result<Establishment, EstablishmentError> {
        let (id, from, to) = (change.id, change.expected, change.new_status);
        let updated = self
            .repo
            .transition(change)
            .await?
            .ok_or(WorkflowError::ConcurrentModification)?;

        info!(establishment_id = %id, from = %from, to = %to, "Establishment status changed");
        Ok(updated)
    }
}
