use anyhow::{Context, Result};
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::utils::dirs::ensure_dir;
use crate::xbrl::FilingExtract;

pub const FACTS_FILE: &str = "facts.csv";
pub const DIMENSIONS_FILE: &str = "dims.csv";
pub const UNIQUE_DIMENSIONS_FILE: &str = "unique_dims.csv";
pub const ANCHORS_FILE: &str = "anchors.csv";
pub const CONCEPTS_FILE: &str = "concepts.csv";
pub const NAMESPACES_FILE: &str = "namespaces.csv";
pub const EXTRA_DETAIL_FILE: &str = "filings_extra_detail.csv";

/// Destination for the output of one filing at a time.
pub trait TableSink {
    fn write_filing(&mut self, extract: &FilingExtract) -> Result<()>;
}

/// Appends every row-set to a CSV file per table and writes the analytics
/// bundle as `<filing id>.json`, all inside one output directory.
#[derive(Clone, Debug)]
pub struct CsvSink {
    output_dir: PathBuf,
}

impl CsvSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        ensure_dir(&output_dir)?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn json_path(&self, filing_id: &str) -> PathBuf {
        self.output_dir.join(format!("{}.json", sanitize_file_name(filing_id)))
    }

    fn append_rows<T: Serialize>(&self, file_name: &str, rows: &[T]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let path = self.output_dir.join(file_name);
        let is_new = fs::metadata(&path).map(|m| m.len() == 0).unwrap_or(true);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open {:?}", path))?;

        let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        log::debug!("Appended {} rows to {:?}", rows.len(), path);
        Ok(())
    }
}

impl TableSink for CsvSink {
    fn write_filing(&mut self, extract: &FilingExtract) -> Result<()> {
        let tables = &extract.tables;
        self.append_rows(FACTS_FILE, &tables.facts)?;
        self.append_rows(DIMENSIONS_FILE, &tables.dimensions)?;
        self.append_rows(UNIQUE_DIMENSIONS_FILE, &tables.unique_dimensions)?;
        self.append_rows(ANCHORS_FILE, &tables.anchors)?;
        self.append_rows(CONCEPTS_FILE, &tables.concepts)?;
        self.append_rows(NAMESPACES_FILE, &tables.namespaces)?;
        if let Some(extra) = &extract.extra {
            self.append_rows(EXTRA_DETAIL_FILE, std::slice::from_ref(extra))?;
        }

        let json_path = self.json_path(&extract.filing_id);
        let file = fs::File::create(&json_path)
            .with_context(|| format!("Failed to create {:?}", json_path))?;
        serde_json::to_writer_pretty(file, extract)?;

        log::info!("Saved {} to {:?}", extract.filing_id, self.output_dir);
        Ok(())
    }
}

/// Keep filing ids usable as file names on every platform.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
