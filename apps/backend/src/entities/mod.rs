//! `tenants` lives in the system database; everything else in a tenant database.

pub mod activities;
pub mod contacts;
pub mod deals;
pub mod tenants;
pub mod users;

pub use tenants::Entity as Tenants;
pub use tenants::TenantStatus;
pub use users::Entity as TenantUsers;
pub use users::UserRole;
