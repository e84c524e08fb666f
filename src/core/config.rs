use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

use crate::utils::dirs::{DEFAULT_CACHE_DIR, DEFAULT_OUTPUT_DIR};
use crate::xbrl::concepts::STANDARD_CONCEPT_PREFIXES;
use crate::xbrl::contexts::MultiDimensionPolicy;

pub const DEFAULT_FILING_LIMIT: usize = 5;

/// Knobs that change what the extractors emit for a filing.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractOptions {
    pub multi_dimension: MultiDimensionPolicy,
    pub concept_prefixes: Vec<String>,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            multi_dimension: MultiDimensionPolicy::default(),
            concept_prefixes: STANDARD_CONCEPT_PREFIXES
                .iter()
                .map(|p| p.to_string())
                .collect(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LoaderConfig {
    pub cache_dir: PathBuf,
    pub output_dir: PathBuf,
    pub limit: usize,
    pub after: Option<NaiveDate>,
    pub exclude_countries: Vec<String>,
    pub options: ExtractOptions,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            limit: DEFAULT_FILING_LIMIT,
            after: None,
            exclude_countries: Vec::new(),
            options: ExtractOptions::default(),
        }
    }
}

impl LoaderConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = var("FRC_CACHE_DIR") {
            config.cache_dir = PathBuf::from(dir);
        }
        if let Some(dir) = var("FRC_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(dir);
        }
        if let Some(limit) = var("FRC_LIMIT") {
            config.limit = limit
                .trim()
                .parse()
                .map_err(|e| anyhow!("FRC_LIMIT must be a positive number: {}", e))?;
        }
        if let Some(after) = var("FRC_AFTER") {
            let date = NaiveDate::parse_from_str(after.trim(), "%Y-%m-%d")
                .map_err(|e| anyhow!("FRC_AFTER must be YYYY-MM-DD: {}", e))?;
            config.after = Some(date);
        }
        if let Some(countries) = var("FRC_EXCLUDE_COUNTRIES") {
            config.exclude_countries = split_list(&countries);
        }
        if let Some(flag) = var("FRC_LEGACY_MULTI_DIMENSION") {
            if matches!(flag.trim().to_lowercase().as_str(), "1" | "true" | "yes") {
                config.options.multi_dimension = MultiDimensionPolicy::LastPairWins;
            }
        }
        if let Some(prefixes) = var("FRC_CONCEPT_PREFIXES") {
            config.options.concept_prefixes = split_list(&prefixes);
        }

        Ok(config)
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
