use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use super::domain::{SelfRegistration, SkipReason, UserInfo};
use super::repository::{RoleCatalogRepository, UserProvisioner};
use crate::errors::ServiceError;

/// Default-role catalogue and self-registration provisioning.
pub struct SelfRegistrationService<R: RoleCatalogRepository, P: UserProvisioner> {
    roles: Arc<R>,
    users: Arc<P>,
}

impl<R: RoleCatalogRepository, P: UserProvisioner> SelfRegistrationService<R, P> {
    pub fn new(roles: Arc<R>, users: Arc<P>) -> Self { Self { roles, users } }

    /// Non-empty default role names.
    pub async fn get_all(&self) -> Result<Vec<String>, ServiceError> {
        let entries = self.roles.get_all().await.map_err(|e| {
            error!(err = %e, "error fetching all roles");
            e
        })?;
        Ok(entries.into_iter().map(|r| r.role).filter(|r| !r.is_empty()).collect())
    }

    /// Whether self-registration is enabled, i.e. at least one non-empty default role exists.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use service::self_registration::{SelfRegistrationService, repository::mock::{InMemoryRoleCatalog, RecordingProvisioner}};
    /// let svc = SelfRegistrationService::new(
    ///     Arc::new(InMemoryRoleCatalog::with_roles(&["", ""])),
    ///     Arc::new(RecordingProvisioner::default()),
    /// );
    /// assert!(!tokio_test::block_on(svc.check()).unwrap());
    /// ```
    pub async fn check(&self) -> Result<bool, ServiceError> {
        let entries = self.roles.get_all().await.map_err(|e| {
            error!(err = %e, "error fetching all roles");
            e
        })?;
        Ok(entries.iter().any(|r| !r.role.is_empty()))
    }

    /// Provision `email_id` with every default role.
    ///
    /// Does nothing when the email already has an account, no default role
    /// is configured, or the catalogue can't be read. Failures are logged and
    /// reported in the return value only.
    #[instrument(skip(self), fields(email = %email_id))]
    pub async fn self_register(&self, email_id: &str) -> SelfRegistration {
        match self.users.is_registered(email_id).await {
            Ok(true) => {
                debug!("user already registered; skipping self-registration");
                return SelfRegistration::Skipped(SkipReason::AlreadyRegistered);
            }
            Ok(false) => {}
            Err(e) => {
                error!(err = %e, "error looking up user");
                return SelfRegistration::Failed(e.to_string());
            }
        }
        let roles = match self.get_all().await {
            Ok(roles) if roles.is_empty() => {
                debug!("no default roles configured; skipping self-registration");
                return SelfRegistration::Skipped(SkipReason::NoDefaultRoles);
            }
            Ok(roles) => roles,
            Err(e) => return SelfRegistration::Skipped(SkipReason::CatalogUnavailable(e.to_string())),
        };
        let info = UserInfo { email_id: email_id.to_string(), roles };
        match self.users.create_user(&info).await {
            Ok(user) => {
                info!(user_id = user.id, roles = user.roles.len(), "self-registered user");
                SelfRegistration::Provisioned(user)
            }
            // a concurrent request provisioned the same user first
            Err(ServiceError::Conflict(_)) => {
                debug!("user registered concurrently; skipping self-registration");
                SelfRegistration::Skipped(SkipReason::AlreadyRegistered)
            }
            Err(e) => {
                error!(err = %e, "error while registering user");
                SelfRegistration::Failed(e.to_string())
            }
        }
    }
}
