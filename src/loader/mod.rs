//! Per-filer orchestration: filter a filing index, locate each filing's
//! artifacts, run extraction and collect the results.

pub mod batch;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use url::Url;

use crate::core::{ExtraDetail, ExtractError, FilingContext, FilingMetadata, LoaderConfig, Register};
use crate::xbrl::markup::{concealed_fact_count, hidden_facts, identify_software, parse_report};
use crate::xbrl::{extract_filing, FilingExtract, ModelProvider};

pub use batch::{read_index, BatchRunner, BatchSummary};

/// Resolves a filing index URL to a file already on disk.
pub trait ArtifactStore: Send + Sync {
    fn locate(&self, url: &str) -> Option<PathBuf>;
}

/// Artifacts mirrored under a cache directory by URL path. Nothing is
/// downloaded; an artifact that is not on disk is reported missing.
#[derive(Clone, Debug)]
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Where `url` would live under the cache, whether or not it exists.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let relative = match Url::parse(url) {
            Ok(parsed) if parsed.scheme().starts_with("http") => {
                format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path())
            }
            _ => url
                .split(['?', '#'])
                .next()
                .unwrap_or(url)
                .replace('\\', "/"),
        };

        relative
            .split('/')
            .filter(|segment| !segment.is_empty() && *segment != "..")
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn locate(&self, url: &str) -> Option<PathBuf> {
        let path = self.path_for(url);
        if path.is_file() {
            Some(path)
        } else {
            log::debug!("Artifact {} not found at {:?}", url, path);
            None
        }
    }
}

/// Drives extraction for every filing of one filer.
#[derive(Clone)]
pub struct FilerDriver {
    register: Register,
    config: LoaderConfig,
    provider: Arc<dyn ModelProvider>,
    store: Arc<dyn ArtifactStore>,
}

impl FilerDriver {
    pub fn new(
        register: Register,
        config: LoaderConfig,
        provider: Arc<dyn ModelProvider>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            register,
            config,
            provider,
            store,
        }
    }

    pub fn register(&self) -> Register {
        self.register
    }

    /// Filings to attempt, in index order: excluded countries and filings
    /// ending before the `after` date are dropped, then at most `limit` kept.
    pub fn accepted(&self, filings: &[FilingMetadata]) -> Vec<FilingMetadata> {
        filings
            .iter()
            .filter(|meta| {
                let excluded = meta.country.as_deref().map_or(false, |country| {
                    self.config
                        .exclude_countries
                        .iter()
                        .any(|c| c.eq_ignore_ascii_case(country))
                });
                !excluded
            })
            .filter(|meta| match self.config.after {
                Some(after) => meta.period_end.map_or(false, |end| end >= after),
                None => true,
            })
            .take(self.config.limit)
            .cloned()
            .collect()
    }

    /// Extract one filing, logging and swallowing any failure.
    pub fn process(&self, meta: &FilingMetadata) -> Option<FilingExtract> {
        match self.try_process(meta) {
            Ok(extract) => Some(extract),
            Err(e) => {
                log::error!(
                    "Processing aborted {}: {}",
                    self.register.filing_name(meta).unwrap_or_default(),
                    e
                );
                None
            }
        }
    }

    pub fn try_process(&self, meta: &FilingMetadata) -> Result<FilingExtract, ExtractError> {
        let name = self
            .register
            .filing_name(meta)
            .ok_or_else(|| ExtractError::MissingArtifact("filing has no package or report url".to_string()))?;
        let report_url = meta
            .report_url
            .as_deref()
            .ok_or_else(|| ExtractError::MissingArtifact(format!("{}: report url missing", name)))?;

        // Companies House instances are cached under the package path.
        let report_key = match self.register {
            Register::CompaniesHouse => meta.package_url.as_deref().unwrap_or(report_url),
            Register::EsefFca | Register::EsefFo => report_url,
        };
        let report = self
            .store
            .locate(report_key)
            .ok_or_else(|| ExtractError::MissingArtifact(format!("{}: report file missing", name)))?;

        log::info!("Processing {}", name);
        let model = self.provider.load(&report)?;
        let filing = FilingContext::new(
            self.register,
            name,
            meta.period_end,
            self.config.options.clone(),
        )
        .resolved(&model);

        let mut extract = extract_filing(&model, &filing)?;
        drop(model);

        extract.extra = match self.extra_detail(&filing, meta, &report) {
            Ok(detail) => Some(detail),
            Err(e) => {
                log::warn!("Extra detail unavailable for {}: {}", filing.filing_id, e);
                None
            }
        };

        log::info!("Finished processing {}", filing.filing_id);
        Ok(extract)
    }

    /// Markup scans of the report plus the package size.
    pub fn extra_detail(
        &self,
        filing: &FilingContext,
        meta: &FilingMetadata,
        report: &Path,
    ) -> Result<ExtraDetail, ExtractError> {
        let xhtml = fs::read_to_string(report)
            .map_err(|e| ExtractError::MissingArtifact(format!("{:?}: {}", report, e)))?;

        let package_size = match self.register {
            Register::CompaniesHouse => None,
            Register::EsefFca | Register::EsefFo => meta
                .package_url
                .as_deref()
                .filter(|url| url.to_lowercase().ends_with(".zip"))
                .and_then(|url| self.store.locate(url))
                .and_then(|path| fs::metadata(path).ok())
                .map(|m| m.len()),
        };

        let doc = parse_report(&xhtml)?;
        let hidden_fact_values = hidden_facts(&doc)?;
        Ok(ExtraDetail {
            filing_id: filing.filing_id.clone(),
            vendor: identify_software(&xhtml),
            package_size,
            concealed_facts: concealed_fact_count(&doc),
            hidden_facts: hidden_fact_values.len(),
            hidden_fact_values,
        })
    }

    /// Extract accepted filings one after another.
    pub fn process_all(&self, filings: &[FilingMetadata]) -> Vec<FilingExtract> {
        self.accepted(filings)
            .iter()
            .filter_map(|meta| self.process(meta))
            .collect()
    }

    /// Extract accepted filings on blocking worker threads. Each worker builds
    /// its own model and filing context. Results come back in index order.
    pub async fn process_parallel(&self, filings: &[FilingMetadata]) -> Vec<FilingExtract> {
        let accepted = self.accepted(filings);
        let (tx, mut rx) = tokio::sync::mpsc::channel(accepted.len().max(1));

        let mut handles = Vec::new();
        for (index, meta) in accepted.into_iter().enumerate() {
            let tx = tx.clone();
            let driver = self.clone();
            let handle = tokio::task::spawn_blocking(move || {
                let result = driver.process(&meta);
                let _ = tx.blocking_send((index, result));
            });
            handles.push(handle);
        }

        // Drop the original sender
        drop(tx);

        let mut results = Vec::new();
        while let Some((index, result)) = rx.recv().await {
            if let Some(extract) = result {
                results.push((index, extract));
            }
        }

        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Filing worker failed: {}", e);
            }
        }

        results.sort_by_key(|(index, _)| *index);
        results.into_iter().map(|(_, extract)| extract).collect()
    }
}
