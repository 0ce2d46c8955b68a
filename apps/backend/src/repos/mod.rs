pub mod tenant_users;
pub mod tenants;
