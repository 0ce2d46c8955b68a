pub mod tenant_context;
pub mod validated_json;

pub use tenant_context::TenantContext;
pub use validated_json::ValidatedJson;
