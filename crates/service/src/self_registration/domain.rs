use serde::{Deserialize, Serialize};

/// Catalogue entry; blank roles are stored but never granted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultRole {
    pub role: String,
}

/// User-creation request handed to the provisioner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub email_id: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedUser {
    pub id: i32,
    pub email_id: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// An account already exists for the email.
    AlreadyRegistered,
    NoDefaultRoles,
    CatalogUnavailable(String),
}

/// What a self-registration attempt did. Never an error: callers cannot act on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelfRegistration {
    Skipped(SkipReason),
    Provisioned(ProvisionedUser),
    Failed(String),
}
