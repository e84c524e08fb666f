//! Filing-level summaries computed from the fact set.

use chrono::NaiveDate;
use itertools::Itertools;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::ops::RangeInclusive;
use thiserror::Error;

use super::model::{FilingModel, Period, QName};
use super::qname::{is_base, is_base_uri};

/// Base concepts every filing is expected to report at least once.
pub static MANDATORY_CONCEPT_NAMES: Lazy<BTreeSet<&'static str>> = Lazy::new(|| {
    [
        "AddressOfRegisteredOfficeOfEntity",
        "CountryOfIncorporation",
        "DescriptionOfNatureOfEntitysOperationsAndPrincipalActivities",
        "DomicileOfEntity",
        "ExplanationOfChangeInNameOfReportingEntityOrOtherMeansOfIdentificationFromEndOfPrecedingReportingPeriod",
        "LegalFormOfEntity",
        "NameOfParentEntity",
        "NameOfReportingEntityOrOtherMeansOfIdentification",
        "NameOfUltimateParentOfGroup",
        "PrincipalPlaceOfBusiness",
    ]
    .into_iter()
    .collect()
});

/// Semantic key to the base concept names that may carry it.
pub static KEY_VALUE_CONCEPTS: Lazy<BTreeMap<&'static str, Vec<&'static str>>> = Lazy::new(|| {
    BTreeMap::from([
        (
            "revenue",
            vec![
                "InterestRevenueExpense",
                "Revenue",
                "RevenueFromContractsWithCustomers",
                "RevenueFromInsuranceContractsIssuedWithoutReductionForReinsuranceHeld",
                "RevenueFromInterest",
            ],
        ),
        ("profit", vec!["ProfitLoss"]),
        ("country", vec!["CountryOfIncorporation"]),
        ("name", vec!["NameOfReportingEntityOrOtherMeansOfIdentification"]),
        ("goodwill", vec!["Goodwill"]),
        ("intangibleassetsandgoodwill", vec!["IntangibleAssetsAndGoodwill"]),
    ])
});

/// Durations, in days, accepted as "about one year".
pub const ANNUAL_PERIOD_DAYS: RangeInclusive<i64> = 351..=379;

pub const SEPARATE_MEMBER: &str = "SeparateMember";

/// Whether each mandatory concept is reported by a base-taxonomy fact.
pub fn mandatory_facts(model: &FilingModel) -> BTreeMap<String, bool> {
    let mut found: BTreeMap<String, bool> = MANDATORY_CONCEPT_NAMES
        .iter()
        .map(|name| (name.to_string(), false))
        .collect();

    for fact in model.facts() {
        if !is_base(&fact.qname) {
            continue;
        }
        if let Some(present) = found.get_mut(fact.qname.local_name.as_str()) {
            *present = true;
        }
    }

    found
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CurrencyUsage {
    /// Most used currency. Ties go to the alphabetically first code.
    pub primary: Option<String>,
    pub all_used: BTreeMap<String, usize>,
}

pub fn currencies(model: &FilingModel) -> CurrencyUsage {
    let mut all_used: BTreeMap<String, usize> = BTreeMap::new();

    for fact in model.facts() {
        let monetary = model.concept(&fact.qname).map_or(false, |c| c.is_monetary);
        if !monetary {
            continue;
        }
        if let Some(code) = fact.unit.as_ref().and_then(|u| u.currency()) {
            *all_used.entry(code.to_string()).or_insert(0) += 1;
        }
    }

    CurrencyUsage {
        primary: primary_currency(&all_used),
        all_used,
    }
}

pub fn primary_currency(tally: &BTreeMap<String, usize>) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    for (code, &count) in tally {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((code, count));
        }
    }
    best.map(|(code, _)| code.clone())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitCount {
    /// Distinct names.
    pub base: usize,
    pub extension: usize,
    /// Fact occurrences.
    pub base_facts: usize,
    pub extension_facts: usize,
}

impl SplitCount {
    fn from_tally(tally: &HashMap<&QName, usize>) -> Self {
        let mut split = SplitCount::default();
        for (qname, &count) in tally {
            if is_base(qname) {
                split.base += 1;
                split.base_facts += count;
            } else {
                split.extension += 1;
                split.extension_facts += count;
            }
        }
        split
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ConceptCounts {
    pub concepts: SplitCount,
    pub dimensions: SplitCount,
    pub members: SplitCount,
    pub facts: usize,
}

/// Concepts, dimensions and members used by facts, split base/extension.
pub fn concept_counts(model: &FilingModel) -> ConceptCounts {
    let mut concepts: HashMap<&QName, usize> = HashMap::new();
    let mut dimensions: HashMap<&QName, usize> = HashMap::new();
    let mut members: HashMap<&QName, usize> = HashMap::new();

    for fact in model.facts() {
        *concepts.entry(&fact.qname).or_insert(0) += 1;
        let Some(context) = model.context(&fact.context_ref) else {
            continue;
        };
        for value in &context.dimensions {
            *dimensions.entry(&value.dimension).or_insert(0) += 1;
            if let Some(member) = &value.member {
                *members.entry(member).or_insert(0) += 1;
            }
        }
    }

    ConceptCounts {
        concepts: SplitCount::from_tally(&concepts),
        dimensions: SplitCount::from_tally(&dimensions),
        members: SplitCount::from_tally(&members),
        facts: model.facts().len(),
    }
}

/// Base-hosted documents pulled in directly by the filer's own documents,
/// i.e. the effective base taxonomy entry points.
pub fn base_taxonomy_urls(model: &FilingModel) -> Vec<String> {
    model
        .documents()
        .iter()
        .filter(|doc| !is_base_uri(&doc.uri))
        .flat_map(|doc| doc.references.iter())
        .filter(|uri| is_base_uri(uri))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct AnnualPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl AnnualPeriod {
    /// Instant at the period end, or a duration spanning exactly the period.
    pub fn matches(&self, period: &Period) -> bool {
        match *period {
            Period::Instant { date } => date == self.end,
            Period::Duration { start, end } => start == self.start && end == self.end,
            Period::Forever => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct ObservedPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: i64,
}

impl fmt::Display for ObservedPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{} ({}d)", self.start, self.end, self.days)
    }
}

#[derive(Clone, Debug, PartialEq, Error)]
#[error("no period of about one year among: [{}]", .observed.iter().join(", "))]
pub struct NoAnnualPeriod {
    pub observed: Vec<ObservedPeriod>,
}

/// Latest `(start, end)` pair whose length is within [`ANNUAL_PERIOD_DAYS`].
/// Equal end dates resolve to the later start.
pub fn latest_annual_period_in<I>(periods: I) -> Result<AnnualPeriod, NoAnnualPeriod>
where
    I: IntoIterator<Item = (NaiveDate, NaiveDate)>,
{
    let observed: BTreeSet<ObservedPeriod> = periods
        .into_iter()
        .map(|(start, end)| ObservedPeriod {
            start,
            end,
            days: (end - start).num_days(),
        })
        .collect();

    observed
        .iter()
        .filter(|p| ANNUAL_PERIOD_DAYS.contains(&p.days))
        .max_by_key(|p| (p.end, p.start))
        .map(|p| AnnualPeriod {
            start: p.start,
            end: p.end,
        })
        .ok_or_else(|| NoAnnualPeriod {
            observed: observed.iter().copied().collect(),
        })
}

/// Scans the duration contexts that facts are reported against.
pub fn latest_annual_period(model: &FilingModel) -> Result<AnnualPeriod, NoAnnualPeriod> {
    let periods = model.facts().iter().filter_map(|fact| {
        match model.context(&fact.context_ref)?.period? {
            Period::Duration { start, end } => Some((start, end)),
            _ => None,
        }
    });
    latest_annual_period_in(periods)
}

pub type KeyValues = BTreeMap<String, BTreeMap<String, String>>;

/// Headline figures for the annual period: non-dimensional base facts whose
/// concept is listed in [`KEY_VALUE_CONCEPTS`]. Units are not checked.
pub fn extract_key_values(model: &FilingModel, period: &AnnualPeriod) -> KeyValues {
    let mut values = KeyValues::new();

    for fact in model.facts() {
        let Some(value) = fact.value.as_ref() else {
            continue;
        };
        if !is_base(&fact.qname) {
            continue;
        }
        let in_period = model
            .context(&fact.context_ref)
            .filter(|c| c.dimensions.is_empty())
            .and_then(|c| c.period)
            .map_or(false, |p| period.matches(&p));
        if !in_period {
            continue;
        }

        let name = fact.qname.local_name.as_str();
        for (key, concepts) in KEY_VALUE_CONCEPTS.iter() {
            if concepts.contains(&name) {
                values
                    .entry(key.to_string())
                    .or_default()
                    .insert(name.to_string(), value.clone());
            }
        }
    }

    values
}

/// Facts reported against a base `SeparateMember`, i.e. parent-only figures.
pub fn separate_member_fact_count(model: &FilingModel) -> usize {
    model
        .facts()
        .iter()
        .filter(|fact| {
            model.context(&fact.context_ref).map_or(false, |c| {
                c.dimensions.iter().any(|d| {
                    d.member
                        .as_ref()
                        .map_or(false, |m| is_base(m) && m.local_name == SEPARATE_MEMBER)
                })
            })
        })
        .count()
}
