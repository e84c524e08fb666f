pub mod analytics;
pub mod anchors;
pub mod concepts;
pub mod contexts;
pub mod extract;
pub mod graph;
pub mod markup;
pub mod model;
pub mod qname;
pub mod tables;

#[cfg(test)]
pub mod tests;

pub use extract::{extract_filing, FilingAnalytics, FilingExtract, FilingTables};
pub use model::{FilingModel, JsonModelProvider, ModelProvider, QName};
