use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use strum::{Display, EnumString};

use super::config::ExtractOptions;
use crate::xbrl::concepts::{extension_prefix, standard_taxonomy_date};
use crate::xbrl::model::FilingModel;

/// The filing register a batch of filings was indexed from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Register {
    #[strum(to_string = "ESEF_FCA", serialize = "fca")]
    EsefFca,
    #[strum(to_string = "ESEF_FO", serialize = "fo")]
    EsefFo,
    #[strum(to_string = "CH", serialize = "ch")]
    CompaniesHouse,
}

impl Register {
    /// Short name for a filing, derived from where its package lives.
    pub fn filing_name(&self, meta: &FilingMetadata) -> Option<String> {
        let uri = meta.package_url.as_deref().or(meta.report_url.as_deref())?;
        let cleaned = uri
            .split(['?', '#'])
            .next()
            .unwrap_or(uri)
            .replace('\\', "/");
        let path = Path::new(&cleaned);
        match self {
            // The package directory alone repeats across filers ("0"), the
            // full parent path does not.
            Register::EsefFo => {
                let parent = path.parent()?;
                let segments: Vec<String> = parent
                    .iter()
                    .map(|s| s.to_string_lossy())
                    .filter(|s| !s.is_empty() && s != "/")
                    .map(|s| s.into_owned())
                    .collect();
                (!segments.is_empty()).then(|| segments.join("_"))
            }
            Register::EsefFca | Register::CompaniesHouse => {
                path.file_stem().map(|n| n.to_string_lossy().into_owned())
            }
        }
    }

    /// Companies House filings carry no extension taxonomy of their own.
    pub fn has_extension_taxonomy(&self) -> bool {
        !matches!(self, Register::CompaniesHouse)
    }
}

/// One entry of a filer's filing index.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilingMetadata {
    pub report_url: Option<String>,
    pub package_url: Option<String>,
    #[serde(deserialize_with = "date_prefix")]
    pub period_end: Option<NaiveDate>,
    pub country: Option<String>,
    pub disclosure_level: Option<String>,
    pub publication_date: Option<String>,
    pub submitted_date: Option<String>,
}

/// Accepts `YYYY-MM-DD` as well as timestamps that start with one.
fn date_prefix<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.get(..10).unwrap_or(s), "%Y-%m-%d")
            .map(Some)
            .map_err(de::Error::custom),
    }
}

/// Everything the extractors need to know about the filing being processed.
///
/// A fresh value is built per filing so that nothing leaks between filings,
/// including when several filings are processed at once.
#[derive(Clone, Debug)]
pub struct FilingContext {
    pub filing_id: String,
    pub filing: String,
    pub register: Register,
    pub period_end: Option<NaiveDate>,
    pub standard_taxonomy_date: Option<NaiveDate>,
    pub extension_prefix: Option<String>,
    pub options: ExtractOptions,
}

impl FilingContext {
    pub fn new(
        register: Register,
        filing: impl Into<String>,
        period_end: Option<NaiveDate>,
        options: ExtractOptions,
    ) -> Self {
        let filing = filing.into();
        Self {
            filing_id: format!("{}{}", register, filing),
            filing,
            register,
            period_end,
            standard_taxonomy_date: None,
            extension_prefix: None,
            options,
        }
    }

    /// Fill in the model-derived parts: the standard taxonomy date and the
    /// filer's own extension prefix.
    pub fn resolved(mut self, model: &FilingModel) -> Self {
        self.standard_taxonomy_date = standard_taxonomy_date(model);
        self.extension_prefix = if self.register.has_extension_taxonomy() {
            extension_prefix(model)
        } else {
            None
        };
        self
    }
}

/// Per-filing facts mined from the raw document rather than the model.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExtraDetail {
    pub filing_id: String,
    pub vendor: Option<String>,
    pub package_size: Option<u64>,
    pub concealed_facts: usize,
    pub hidden_facts: usize,
    #[serde(skip)]
    pub hidden_fact_values: BTreeMap<String, Vec<String>>,
}
