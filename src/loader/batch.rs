//! Runs a list of filer indexes through one driver and sink. A bad index or a
//! failed write costs that filer or filing only.

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use super::FilerDriver;
use crate::core::FilingMetadata;
use crate::storage::TableSink;
use crate::utils::progress::ProgressTracker;
use crate::xbrl::FilingExtract;

pub fn read_index(path: &Path) -> Result<Vec<FilingMetadata>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read index {:?}", path))?;
    let filings = serde_json::from_str(&content).with_context(|| format!("Malformed index {:?}", path))?;
    Ok(filings)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub written: usize,
    /// Accepted filings that failed extraction or could not be written.
    pub skipped: usize,
    /// Index files that could not be read at all.
    pub failed_indexes: usize,
}

pub struct BatchRunner<'a> {
    driver: &'a FilerDriver,
    sink: &'a mut dyn TableSink,
    parallel: bool,
    show_progress: bool,
}

impl<'a> BatchRunner<'a> {
    pub fn new(driver: &'a FilerDriver, sink: &'a mut dyn TableSink) -> Self {
        Self {
            driver,
            sink,
            parallel: false,
            show_progress: false,
        }
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn show_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub async fn run(&mut self, indexes: &[PathBuf]) -> BatchSummary {
        let mut summary = BatchSummary::default();

        for index in indexes {
            let filings = match read_index(index) {
                Ok(filings) => filings,
                Err(e) => {
                    log::error!("Processing aborted, filer index unusable: {:#}", e);
                    summary.failed_indexes += 1;
                    continue;
                }
            };

            let accepted = self.driver.accepted(&filings);
            log::info!("{:?}: {} of {} filings accepted", index, accepted.len(), filings.len());
            let tracker = ProgressTracker::new(accepted.len() as u64, self.show_progress);

            let extracts = self.extract(&accepted, &tracker).await;
            summary.skipped += accepted.len() - extracts.len();

            for extract in &extracts {
                match self.sink.write_filing(extract) {
                    Ok(()) => {
                        tracker.println(&summary_line(extract));
                        summary.written += 1;
                    }
                    Err(e) => {
                        log::error!("Failed to write {}: {:#}", extract.filing_id, e);
                        tracker.println(&format!("{} {} not written", "✗".red(), extract.filing_id.bold()));
                        summary.skipped += 1;
                    }
                }
            }
            tracker.finish("done");
        }

        summary
    }

    async fn extract(&self, accepted: &[FilingMetadata], tracker: &ProgressTracker) -> Vec<FilingExtract> {
        if self.parallel {
            tracker.start_filing(&format!("{} filings", accepted.len()));
            let extracts = self.driver.process_parallel(accepted).await;
            for _ in accepted {
                tracker.finish_filing();
            }
            return extracts;
        }

        let mut extracts = Vec::new();
        for meta in accepted {
            let name = self.driver.register().filing_name(meta).unwrap_or_default();
            tracker.start_filing(&name);
            match self.driver.process(meta) {
                Some(extract) => extracts.push(extract),
                None => tracker.println(&format!("{} {}", "✗".red(), name.bold())),
            }
            tracker.finish_filing();
        }
        extracts
    }
}

fn summary_line(extract: &FilingExtract) -> String {
    let tables = &extract.tables;
    let period = extract
        .analytics
        .annual_period
        .map(|p| format!("{}..{}", p.start, p.end))
        .unwrap_or_else(|| "no annual period".to_string());
    format!(
        "{} {} {} facts, {} dims, {} anchors, {} concepts ({})",
        "✓".green(),
        extract.filing_id.bold(),
        tables.facts.len(),
        tables.dimensions.len(),
        tables.anchors.len(),
        tables.concepts.len(),
        period.dimmed()
    )
}
