//! Service layer for external linkouts and self-registration roles.
//! - Managers depend on repository traits, never on SeaORM directly.
//! - `repo::seaorm` modules hold the database-backed implementations.
//! - `repository::mock` modules hold in-memory implementations for tests and examples.

pub mod errors;
pub mod audit;
pub mod linkout;
pub mod self_registration;
#[cfg(test)]
pub mod test_support;
