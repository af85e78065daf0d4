pub mod config;
pub mod error;
pub mod notice;
pub mod segment;

pub use config::AppConfig;
pub use error::{StudioError, StudioResult};
pub use segment::{Catalog, SchemaEntry, SegmentPayload, TraitKind, TraitSchema};
