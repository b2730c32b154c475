// Audit stamping shared by every mutation
pub mod audit;

// Catalog and location stores
pub mod product_service;
pub mod warehouse_service;

// Credential administration
pub mod user_service;

pub use audit::AuditStamp;
pub use product_service::{ProductDraft, ProductService};
pub use user_service::{NewUser, SeedAccount, UpsertOutcome, UserService};
pub use warehouse_service::{WarehouseDraft, WarehouseService};
