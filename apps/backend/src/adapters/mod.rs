//! SeaORM adapters; repos wrap these and map `DbErr` to `DomainError`.

pub mod tenant_users_sea;
pub mod tenants_sea;
