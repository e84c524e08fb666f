use serde::Serialize;
use std::collections::BTreeMap;

use super::analytics::{
    base_taxonomy_urls, concept_counts, currencies, extract_key_values, latest_annual_period,
    mandatory_facts, separate_member_fact_count, AnnualPeriod, ConceptCounts, CurrencyUsage,
    KeyValues,
};
use super::anchors::{anchor_rows, dimension_anchors, extract_anchors, Anchor, AnchorRow, DimensionAnchors};
use super::concepts::{extract_concepts, ConceptRow};
use super::contexts::{ordered_contexts, ContextCoding, DedupedCoding, ExactContextCoding};
use super::model::{FilingModel, ValidationMessage};
use super::tables::{
    dimension_rows, extract_facts, extract_namespaces, DimensionRow, FactRow, NamespaceRow,
};
use crate::core::{ExtraDetail, ExtractError, FilingContext};

/// Flat row-sets handed to a [`crate::storage::TableSink`].
#[derive(Clone, Debug, Default)]
pub struct FilingTables {
    pub facts: Vec<FactRow>,
    /// Context-exact coding.
    pub dimensions: Vec<DimensionRow>,
    /// Deduplicated coding, the codes the fact rows refer to.
    pub unique_dimensions: Vec<DimensionRow>,
    pub anchors: Vec<AnchorRow>,
    pub concepts: Vec<ConceptRow>,
    pub namespaces: Vec<NamespaceRow>,
}

#[derive(Clone, Debug, Serialize)]
pub struct FilingAnalytics {
    pub currencies: CurrencyUsage,
    pub anchors: Vec<Anchor>,
    pub dimension_anchors: DimensionAnchors,
    pub dts_files: Vec<String>,
    pub mandatory_facts: BTreeMap<String, bool>,
    pub counts: ConceptCounts,
    pub separate_member_fact_count: usize,
    pub annual_period: Option<AnnualPeriod>,
    pub key_metrics: Option<KeyValues>,
}

/// Everything extracted from one filing.
#[derive(Clone, Debug, Serialize)]
pub struct FilingExtract {
    pub filing_id: String,
    pub filing: String,
    #[serde(skip)]
    pub tables: FilingTables,
    pub analytics: FilingAnalytics,
    pub validation: Vec<ValidationMessage>,
    pub extra: Option<ExtraDetail>,
}

/// Run every extractor over one filing's model.
///
/// Context codes are assigned first since fact and dimension rows depend on
/// them; the remaining passes only read the model.
pub fn extract_filing(model: &FilingModel, filing: &FilingContext) -> Result<FilingExtract, ExtractError> {
    let undefined = model
        .facts()
        .iter()
        .filter(|fact| model.concept(&fact.qname).is_none())
        .count();
    if undefined > 0 {
        return Err(ExtractError::MissingConcepts { count: undefined });
    }

    log::info!("Extracting {} ({} facts)", filing.filing_id, model.facts().len());

    let contexts = ordered_contexts(model);
    let deduped = DedupedCoding::new(filing.options.multi_dimension).assign(&contexts);
    let exact = ExactContextCoding.assign(&contexts);
    log::debug!(
        "{}: {} dimensional contexts, {} distinct slices",
        filing.filing_id,
        exact.len(),
        deduped.codes().len()
    );

    let anchors = extract_anchors(model)?;
    let tables = FilingTables {
        facts: extract_facts(model, filing, &deduped),
        dimensions: dimension_rows(filing, &exact),
        unique_dimensions: dimension_rows(filing, &deduped),
        anchors: anchor_rows(filing, &anchors),
        concepts: extract_concepts(model, filing),
        namespaces: extract_namespaces(model, filing),
    };

    let (annual_period, key_metrics) = match latest_annual_period(model) {
        Ok(period) => (Some(period), Some(extract_key_values(model, &period))),
        Err(e) => {
            log::warn!("{}: {}", filing.filing_id, e);
            (None, None)
        }
    };

    let analytics = FilingAnalytics {
        currencies: currencies(model),
        anchors,
        dimension_anchors: dimension_anchors(model)?,
        dts_files: base_taxonomy_urls(model),
        mandatory_facts: mandatory_facts(model),
        counts: concept_counts(model),
        separate_member_fact_count: separate_member_fact_count(model),
        annual_period,
        key_metrics,
    };

    log::info!(
        "Extracted {}: {} facts, {} dimension rows, {} anchors, {} concepts",
        filing.filing_id,
        tables.facts.len(),
        tables.dimensions.len(),
        tables.anchors.len(),
        tables.concepts.len()
    );

    Ok(FilingExtract {
        filing_id: filing.filing_id.clone(),
        filing: filing.filing.clone(),
        tables,
        analytics,
        validation: model.validation().to_vec(),
        extra: None,
    })
}
