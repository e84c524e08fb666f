use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::model::{Balance, FilingModel, PeriodType};
use super::qname::is_base_uri;
use crate::core::FilingContext;

/// Prefixes of the standard taxonomies whose concepts are extracted alongside
/// the filer's own.
pub static STANDARD_CONCEPT_PREFIXES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "ifrs-full", "IFRS", "FRS-101", "FRS-102", "core", "common", "bus", "dpl", "ref", "accrep",
        "aurep", "direp",
    ]
});

static TAXONOMY_DATE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ConceptRow {
    pub prefix: String,
    pub local_name: String,
    pub type_name: Option<String>,
    pub period_type: Option<PeriodType>,
    pub balance: Option<Balance>,
    pub is_abstract: bool,
    pub is_text_block: bool,
    pub is_numeric: bool,
    pub label: Option<String>,
    pub documentation: Option<String>,
    pub references: Option<String>,
    pub namespace: String,
    pub taxonomy_date: Option<NaiveDate>,
}

/// Concepts under the filer's extension prefix or an allow-listed standard
/// prefix.
///
/// Extension concepts are dated with the filing's period end; everything else
/// with the filing-wide standard taxonomy date.
pub fn extract_concepts(model: &FilingModel, filing: &FilingContext) -> Vec<ConceptRow> {
    let extension_prefix = filing.extension_prefix.as_deref();
    let allowed = |prefix: &str| {
        Some(prefix) == extension_prefix
            || filing.options.concept_prefixes.iter().any(|p| p == prefix)
    };

    model
        .concepts()
        .iter()
        .filter(|concept| allowed(&concept.qname.prefix))
        .map(|concept| {
            let is_extension = Some(concept.qname.prefix.as_str()) == extension_prefix;
            ConceptRow {
                prefix: concept.qname.prefix.clone(),
                local_name: concept.qname.local_name.clone(),
                type_name: concept.type_name.clone(),
                period_type: concept.period_type,
                balance: concept.balance,
                is_abstract: concept.is_abstract,
                is_text_block: concept.is_text_block,
                is_numeric: concept.is_numeric,
                label: concept.metadata.english_label().map(String::from),
                documentation: concept.metadata.english_documentation().map(String::from),
                references: concept.metadata.reference().map(String::from),
                namespace: concept.qname.namespace.clone(),
                taxonomy_date: if is_extension {
                    filing.period_end
                } else {
                    filing.standard_taxonomy_date
                },
            }
        })
        .collect()
}

/// Prefix bound to the first namespace the report's own documents define.
pub fn extension_prefix(model: &FilingModel) -> Option<String> {
    let extension_ns = model.namespace_docs().first()?;
    model
        .namespaces()
        .iter()
        .find(|binding| &binding.uri == extension_ns)
        .map(|binding| binding.prefix.clone())
}

/// First `YYYY-MM-DD` path segment of a bound base taxonomy namespace, e.g.
/// `http://xbrl.frc.org.uk/FRS-102/2023-01-01`.
pub fn standard_taxonomy_date(model: &FilingModel) -> Option<NaiveDate> {
    model
        .namespaces()
        .iter()
        .filter(|binding| is_base_uri(&binding.uri))
        .find_map(|binding| {
            let url = Url::parse(&binding.uri).ok()?;
            let segment = url
                .path_segments()?
                .find(|segment| TAXONOMY_DATE.is_match(segment))?;
            NaiveDate::parse_from_str(segment, "%Y-%m-%d").ok()
        })
}
