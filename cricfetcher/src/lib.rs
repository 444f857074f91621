pub mod audit;
pub mod builder;
pub mod deliveries;
pub mod entities;
pub mod error;
pub mod mapper;
pub mod models;
pub mod registry;
pub mod schema_registry;
pub mod season;
pub mod source;

pub use crate::audit::FieldAuditor;
pub use crate::mapper::build_match_graph;
pub use crate::models::MatchRecord;
pub use crate::source::{DirectorySource, LoadedRecord, RecordSource, SourceEntry};
