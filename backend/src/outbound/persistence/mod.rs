//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain repository ports backed by
//! PostgreSQL via `diesel-async` and `bb8` pooling. Two databases are in
//! play: the canonical store and the bridging mirror read by the partner
//! system. Each gets its own [`DbPool`].
//!
//! - **Thin adapters**: repositories only translate between Diesel rows and
//!   domain types. No business logic resides here.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`, `bridging_schema.rs`) never leave this module.
//! - **Typed errors**: Diesel failures are classified once in
//!   `error_mapping.rs` and mapped onto each port's error enum.
//!
//! # Example
//!
//! ```ignore
//! use glucose_backend::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/glucose")).await?;
//! let users = DieselUserRepository::new(pool);
//! ```

mod bridging_schema;
mod diesel_activity_log_repository;
mod diesel_bridging_repository;
mod diesel_glucose_test_repository;
mod diesel_patient_repository;
mod diesel_permission_repository;
mod diesel_store_health_check;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_activity_log_repository::DieselActivityLogRepository;
pub use diesel_bridging_repository::DieselBridgingRepository;
pub use diesel_glucose_test_repository::DieselGlucoseTestRepository;
pub use diesel_patient_repository::DieselPatientRepository;
pub use diesel_permission_repository::DieselPermissionRepository;
pub use diesel_store_health_check::DieselStoreHealthCheck;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, Store, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
