//! Self-registration: default roles granted to users who sign in without an account.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::SelfRegistrationService;
