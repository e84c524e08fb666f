use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::contexts::ContextCodes;
use super::model::{Fact, FilingModel};
use crate::core::FilingContext;

/// Longest text value stored as-is; anything longer becomes
/// [`OVERSIZE_TEXT_MARKER`].
pub const TEXT_VALUE_LIMIT: usize = 2000;
pub const OVERSIZE_TEXT_MARKER: &str = "_tooBIG";

// Logic for facts table

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct FactRow {
    pub filing_id: String,
    pub prefix: String,
    pub local_name: String,
    pub text_value: Option<String>,
    pub numeric_value: Option<String>,
    pub decimals: Option<String>,
    pub currency: Option<String>,
    pub end_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    /// Deduplicated context code, empty for non-dimensional facts.
    pub context_code: String,
}

pub fn extract_facts(model: &FilingModel, filing: &FilingContext, codes: &ContextCodes) -> Vec<FactRow> {
    let mut table_rows: Vec<FactRow> = Vec::with_capacity(model.facts().len());

    for fact in model.facts() {
        let concept = model.concept(&fact.qname);
        let is_numeric = concept.map_or(false, |c| c.is_numeric);
        let is_monetary = concept.map_or(false, |c| c.is_monetary);
        let period = model.context(&fact.context_ref).and_then(|c| c.period);

        let mut row = FactRow {
            filing_id: filing.filing_id.clone(),
            prefix: fact.qname.prefix.clone(),
            local_name: fact.qname.local_name.clone(),
            text_value: None,
            numeric_value: None,
            decimals: kept_decimals(fact),
            currency: None,
            end_date: period.and_then(|p| p.end_date()),
            start_date: period.and_then(|p| p.start_date()),
            context_code: codes
                .code_for(&fact.context_ref)
                .unwrap_or_default()
                .to_string(),
        };

        if is_numeric {
            // Verbatim, so "1.50" and "1.5" stay distinguishable downstream.
            row.numeric_value = fact.value.clone();
            if is_monetary {
                row.currency = fact
                    .unit
                    .as_ref()
                    .and_then(|u| u.currency())
                    .map(String::from);
            }
        } else {
            row.text_value = fact.value.as_deref().map(bounded_text);
        }

        table_rows.push(row);
    }

    table_rows
}

fn bounded_text(value: &str) -> String {
    if value.chars().count() <= TEXT_VALUE_LIMIT {
        value.to_string()
    } else {
        OVERSIZE_TEXT_MARKER.to_string()
    }
}

/// Decimals survive only when they end in a digit, which drops `INF`.
fn kept_decimals(fact: &Fact) -> Option<String> {
    fact.decimals
        .as_deref()
        .filter(|d| d.chars().last().map_or(false, |c| c.is_ascii_digit()))
        .map(String::from)
}

// Logic for dimensions table

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct DimensionRow {
    pub filing_id: String,
    pub context_code: String,
    pub dimension_prefix: String,
    pub dimension_name: String,
    /// Empty rather than null: the member pair is part of a composite key.
    pub member_prefix: String,
    pub member_name: String,
}

/// One row per coded `(context, dimension, member)` tuple.
///
/// Fed with exact codes this is the dimensions table; fed with deduplicated
/// codes it is the table of distinct dimensional slices.
pub fn dimension_rows(filing: &FilingContext, codes: &ContextCodes) -> Vec<DimensionRow> {
    codes
        .codes()
        .iter()
        .map(|code| DimensionRow {
            filing_id: filing.filing_id.clone(),
            context_code: code.code.clone(),
            dimension_prefix: code.dimension.prefix.clone(),
            dimension_name: code.dimension.local_name.clone(),
            member_prefix: code
                .member
                .as_ref()
                .map(|m| m.prefix.clone())
                .unwrap_or_default(),
            member_name: code
                .member
                .as_ref()
                .map(|m| m.local_name.clone())
                .unwrap_or_default(),
        })
        .collect()
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct NamespaceRow {
    pub filing_id: String,
    pub prefix: String,
    pub namespace: String,
}

pub fn extract_namespaces(model: &FilingModel, filing: &FilingContext) -> Vec<NamespaceRow> {
    model
        .namespaces()
        .iter()
        .map(|binding| NamespaceRow {
            filing_id: filing.filing_id.clone(),
            prefix: binding.prefix.clone(),
            namespace: binding.uri.clone(),
        })
        .collect()
}
