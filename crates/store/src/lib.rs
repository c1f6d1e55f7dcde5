//! `taskloom-store` — the persistence service.
//!
//! Owns the relational store. Ownership is the core invariant: every
//! task/collection statement carries the owning principal in its predicate,
//! enforced inside the repository rather than trusted from callers.

pub mod app;
pub mod config;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod repository;

pub use app::build_app;
pub use config::StoreConfig;
pub use error::StoreError;
pub use memory::InMemoryRepository;
pub use postgres::PgRepository;
pub use repository::{NewCollection, NewTask, Repository, TaskFilter};
