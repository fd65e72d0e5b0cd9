use async_trait::async_trait;

use super::domain::{DefaultRole, ProvisionedUser, UserInfo};
use crate::errors::ServiceError;

#[async_trait]
pub trait RoleCatalogRepository: Send + Sync {
    async fn get_all(&self) -> Result<Vec<DefaultRole>, ServiceError>;
}

/// Creates user accounts with an initial role set.
#[async_trait]
pub trait UserProvisioner: Send + Sync {
    /// Whether an account already exists for `email_id`.
    async fn is_registered(&self, email_id: &str) -> Result<bool, ServiceError>;
    /// `Conflict` when the email is already taken.
    async fn create_user(&self, info: &UserInfo) -> Result<ProvisionedUser, ServiceError>;
}

/// Simple in-memory mock repositories for tests and doc examples
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct InMemoryRoleCatalog {
        roles: Mutex<Vec<DefaultRole>>,
        failing: Mutex<bool>,
    }

    impl InMemoryRoleCatalog {
        pub fn with_roles(roles: &[&str]) -> Self {
            let catalog = Self::default();
            *catalog.roles.lock().unwrap() = roles.iter().map(|r| DefaultRole { role: r.to_string() }).collect();
            catalog
        }

        pub fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }
    }

    #[async_trait]
    impl RoleCatalogRepository for InMemoryRoleCatalog {
        async fn get_all(&self) -> Result<Vec<DefaultRole>, ServiceError> {
            if *self.failing.lock().unwrap() {
                return Err(ServiceError::Db("role catalogue unavailable".into()));
            }
            Ok(self.roles.lock().unwrap().clone())
        }
    }

    /// Records every request; rejects an email it has already provisioned.
    #[derive(Default)]
    pub struct RecordingProvisioner {
        requests: Mutex<Vec<UserInfo>>,
        provisioned: Mutex<Vec<String>>,
        failing: Mutex<bool>,
    }

    impl RecordingProvisioner {
        pub fn requests(&self) -> Vec<UserInfo> {
            self.requests.lock().unwrap().clone()
        }

        /// Account creation fails from now on; lookups keep working.
        pub fn set_failing(&self, failing: bool) {
            *self.failing.lock().unwrap() = failing;
        }

        /// Mark `email_id` as registered without recording a request.
        pub fn seed_user(&self, email_id: &str) {
            self.provisioned.lock().unwrap().push(email_id.to_string());
        }
    }

    #[async_trait]
    impl UserProvisioner for RecordingProvisioner {
        async fn is_registered(&self, email_id: &str) -> Result<bool, ServiceError> {
            Ok(self.provisioned.lock().unwrap().iter().any(|e| e == email_id))
        }

        async fn create_user(&self, info: &UserInfo) -> Result<ProvisionedUser, ServiceError> {
            self.requests.lock().unwrap().push(info.clone());
            if *self.failing.lock().unwrap() {
                return Err(ServiceError::Db("user store unavailable".into()));
            }
            let mut provisioned = self.provisioned.lock().unwrap();
            if provisioned.contains(&info.email_id) {
                return Err(ServiceError::Conflict(format!("user {} already exists", info.email_id)));
            }
            provisioned.push(info.email_id.clone());
            Ok(ProvisionedUser { id: provisioned.len() as i32, email_id: info.email_id.clone(), roles: info.roles.clone() })
        }
    }
}
