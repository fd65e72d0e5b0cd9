//! Audit columns shared by every writable row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    pub created_on: DateTime<Utc>,
    pub created_by: Option<i32>,
    pub updated_on: DateTime<Utc>,
    pub updated_by: Option<i32>,
}

impl AuditLog {
    /// Fresh stamp for a row created now.
    pub fn created_now(by: Option<i32>) -> Self {
        let now = Utc::now();
        Self { created_on: now, created_by: by, updated_on: now, updated_by: by }
    }

    /// Move the update stamp to now, keeping creation data.
    pub fn touch(&mut self, by: Option<i32>) {
        self.updated_on = Utc::now();
        self.updated_by = by;
    }
}
