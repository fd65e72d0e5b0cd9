use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Db(String),
    /// Storage failure carrying a message fit for end users next to the raw cause.
    #[error("{user_message}: {internal}")]
    Persist { user_message: String, internal: String },
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn persist(user_message: &str, cause: ServiceError) -> Self {
        Self::Persist { user_message: user_message.to_string(), internal: cause.to_string() }
    }

    pub fn db(e: impl std::fmt::Display) -> Self { Self::Db(e.to_string()) }

    /// Message safe to hand back to API callers.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Persist { user_message, .. } => user_message.clone(),
            ServiceError::Db(_) => "storage failure".to_string(),
            other => other.to_string(),
        }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Conflict(_) => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::Model(_) => 1004,
            ServiceError::Db(_) => 1200,
            ServiceError::Persist { .. } => 1201,
        }
    }
}
