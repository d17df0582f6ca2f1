//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`StoreHealthCheck`]) are implemented by outbound
//! adapters. Driving ports (`*Command`, `*Query`, [`AuthService`],
//! [`AuthorizationGate`], [`UserAdministration`]) are implemented by domain
//! services and consumed by the HTTP adapter through `Arc<dyn …>` handles.

mod macros;
pub(crate) use macros::define_port_error;

mod activity_log_repository;
mod auth_service;
mod authorization_gate;
mod bridging_query;
mod bridging_repository;
mod glucose_test_command;
mod glucose_test_query;
mod glucose_test_repository;
mod patient_repository;
mod permission_repository;
mod role_permission_command;
mod store_health_check;
mod user_administration;
mod user_repository;
mod validation_command;

#[cfg(test)]
pub use activity_log_repository::MockActivityLogRepository;
pub use activity_log_repository::{ActivityLogError, ActivityLogRepository, ActivityRecord};
pub use auth_service::{AuthService, LoginOutcome, UserWithRole};
pub use authorization_gate::AuthorizationGate;
pub use bridging_query::BridgingQuery;
#[cfg(test)]
pub use bridging_repository::MockBridgingRepository;
pub use bridging_repository::{BridgingRepository, BridgingRepositoryError};
pub use glucose_test_command::GlucoseTestCommand;
pub use glucose_test_query::GlucoseTestQuery;
#[cfg(test)]
pub use glucose_test_repository::MockGlucoseTestRepository;
pub use glucose_test_repository::{GlucoseTestRepository, GlucoseTestRepositoryError};
#[cfg(test)]
pub use patient_repository::MockPatientRepository;
pub use patient_repository::{PatientRepository, PatientRepositoryError};
#[cfg(test)]
pub use permission_repository::MockPermissionRepository;
pub use permission_repository::{PermissionRepository, PermissionRepositoryError};
pub use role_permission_command::{AssignReport, RolePermissionCommand, RolePermissions};
#[cfg(test)]
pub use store_health_check::MockStoreHealthCheck;
pub use store_health_check::{StoreHealthCheck, StoreHealthCheckError};
pub use user_administration::{UserAdministration, UserDetail};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{UserRepository, UserRepositoryError};
pub use validation_command::ValidationCommand;
