pub mod schema;
pub mod settings;
pub mod storage;

pub use schema::SchemaManager;
pub use settings::{Billing, Database, DevicePolicy, Gateway, Settings};
pub use storage::Storage;
