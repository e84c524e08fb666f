pub mod core;
pub mod loader;
pub mod storage;
pub mod utils;
pub mod xbrl;

// Re-exports
pub use core::{ExtractError, FilingContext, FilingMetadata, LoaderConfig, Register};
pub use loader::{ArtifactStore, BatchRunner, BatchSummary, FilerDriver, LocalArtifactStore};
pub use storage::{CsvSink, TableSink};
pub use utils::progress::ProgressTracker;
pub use xbrl::{extract_filing, FilingExtract, FilingModel, JsonModelProvider, ModelProvider};
