//! External linkouts: named monitoring-tool URLs shown in the UI, optionally scoped to clusters.
//!
//! Three layers, as elsewhere in this crate: `domain` types, `repository` traits
//! (with SeaORM and in-memory implementations), and the `service` orchestrating them.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;

pub use service::LinkoutService;
