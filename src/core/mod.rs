pub mod config;
pub mod error;
pub mod types;

pub use config::{ExtractOptions, LoaderConfig};
pub use error::ExtractError;
pub use types::{ExtraDetail, FilingContext, FilingMetadata, Register};
