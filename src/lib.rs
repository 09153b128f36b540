pub mod batch;
pub mod error;
pub mod load;
pub mod mapping;
pub mod sheet;
pub mod stage;
pub mod store;

pub use error::LoadError;
pub use load::{run, Loader};
pub use mapping::{MappingRecord, MappingResolver, StaticMappings};
pub use sheet::WorksheetTable;
pub use stage::{DirStage, HttpStage, Stage};
pub use store::{ParquetStore, TableStore};
