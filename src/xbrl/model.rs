//! The in-memory report graph handed over by a model provider.
//!
//! Everything here is read-only once built. Extractors borrow from a
//! [`FilingModel`] and never mutate it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::Path;
use strum::Display;

use super::qname::Arcrole;
use crate::core::ExtractError;

/// Namespace-qualified name. Equality, ordering and hashing ignore the prefix.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QName {
    pub namespace: String,
    pub local_name: String,
    #[serde(default)]
    pub prefix: String,
}

impl QName {
    pub fn new(namespace: &str, local_name: &str, prefix: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            local_name: local_name.to_string(),
            prefix: prefix.to_string(),
        }
    }

    /// `{namespace}localName`
    pub fn clark(&self) -> String {
        format!("{{{}}}{}", self.namespace, self.local_name)
    }
}

impl PartialEq for QName {
    fn eq(&self, other: &Self) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl Eq for QName {}

impl Hash for QName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.namespace.hash(state);
        self.local_name.hash(state);
    }
}

impl PartialOrd for QName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QName {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.namespace, &self.local_name).cmp(&(&other.namespace, &other.local_name))
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.local_name)
        } else {
            write!(f, "{}:{}", self.prefix, self.local_name)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PeriodType {
    Instant,
    Duration,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Balance {
    Debit,
    Credit,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConceptLabel {
    /// Provider role string, e.g. `label (en)` or `documentation (en)`.
    pub role: String,
    pub text: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Disclosure,
    Example,
    Other,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConceptReference {
    pub kind: ReferenceKind,
    pub text: String,
}

/// Labels and references attached to a concept by its taxonomy.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConceptMetadata {
    pub labels: Vec<ConceptLabel>,
    pub references: Vec<ConceptReference>,
}

impl ConceptMetadata {
    pub fn english_label(&self) -> Option<&str> {
        self.label_with_role("label (en)")
    }

    pub fn english_documentation(&self) -> Option<&str> {
        self.label_with_role("documentation (en)")
    }

    /// The first disclosure or example reference block.
    pub fn reference(&self) -> Option<&str> {
        self.references
            .iter()
            .find(|r| matches!(r.kind, ReferenceKind::Disclosure | ReferenceKind::Example))
            .map(|r| r.text.as_str())
    }

    // Later entries win, so a taxonomy that lists several English labels
    // reports the last one.
    fn label_with_role(&self, role: &str) -> Option<&str> {
        self.labels
            .iter()
            .rev()
            .find(|l| l.role.starts_with(role))
            .map(|l| l.text.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Concept {
    pub qname: QName,
    #[serde(default)]
    pub type_name: Option<String>,
    #[serde(default)]
    pub is_numeric: bool,
    #[serde(default)]
    pub is_monetary: bool,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_text_block: bool,
    #[serde(default)]
    pub period_type: Option<PeriodType>,
    #[serde(default)]
    pub balance: Option<Balance>,
    #[serde(default)]
    pub metadata: ConceptMetadata,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Period {
    Instant { date: NaiveDate },
    Duration { start: NaiveDate, end: NaiveDate },
    Forever,
}

impl Period {
    pub fn end_date(&self) -> Option<NaiveDate> {
        match self {
            Period::Instant { date } => Some(*date),
            Period::Duration { end, .. } => Some(*end),
            Period::Forever => None,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        match self {
            Period::Duration { start, .. } => Some(*start),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DimensionValue {
    pub dimension: QName,
    /// Absent for typed dimensions and for some malformed filings.
    #[serde(default)]
    pub member: Option<QName>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Context {
    pub id: String,
    #[serde(default)]
    pub period: Option<Period>,
    #[serde(default)]
    pub dimensions: Vec<DimensionValue>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Unit {
    pub measures: Vec<QName>,
}

impl Unit {
    /// ISO code of the first numerator measure.
    pub fn currency(&self) -> Option<&str> {
        self.measures.first().map(|m| m.local_name.as_str())
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Fact {
    pub qname: QName,
    pub context_ref: String,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub decimals: Option<String>,
    #[serde(default)]
    pub unit: Option<Unit>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Relationship {
    pub from: QName,
    pub to: QName,
}

/// Identifies one base set: arcrole, extended link role, link and arc element.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseSetKey {
    pub arcrole: String,
    #[serde(default)]
    pub elr: Option<String>,
    #[serde(default)]
    pub link: Option<QName>,
    #[serde(default)]
    pub arc: Option<QName>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BaseSet {
    pub key: BaseSetKey,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NamespaceBinding {
    pub prefix: String,
    pub uri: String,
}

/// A document in the report's discoverable taxonomy set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelDocument {
    pub uri: String,
    #[serde(default)]
    pub references: Vec<String>,
}

/// A message from the provider's own validation pass, passed through as-is.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValidationMessage {
    pub severity: String,
    pub code: String,
    pub message: String,
}

/// The raw, unindexed parts of a model as a provider supplies them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParts {
    /// Namespaces defined by the report's own documents, first one being the
    /// filer's extension namespace.
    pub namespace_docs: Vec<String>,
    pub namespaces: Vec<NamespaceBinding>,
    pub concepts: Vec<Concept>,
    pub contexts: Vec<Context>,
    pub facts: Vec<Fact>,
    pub base_sets: Vec<BaseSet>,
    pub documents: Vec<ModelDocument>,
    pub validation: Vec<ValidationMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(from = "ModelParts")]
pub struct FilingModel {
    parts: ModelParts,
    concept_index: HashMap<QName, usize>,
    context_index: HashMap<String, usize>,
}

impl From<ModelParts> for FilingModel {
    fn from(parts: ModelParts) -> Self {
        let concept_index = parts
            .concepts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.qname.clone(), i))
            .collect();
        let context_index = parts
            .contexts
            .iter()
            .enumerate()
            .map(|(i, c)| (c.id.clone(), i))
            .collect();
        Self {
            parts,
            concept_index,
            context_index,
        }
    }
}

impl FilingModel {
    pub fn facts(&self) -> &[Fact] {
        &self.parts.facts
    }

    pub fn contexts(&self) -> &[Context] {
        &self.parts.contexts
    }

    pub fn context(&self, id: &str) -> Option<&Context> {
        self.context_index.get(id).map(|&i| &self.parts.contexts[i])
    }

    pub fn concepts(&self) -> &[Concept] {
        &self.parts.concepts
    }

    pub fn concept(&self, qname: &QName) -> Option<&Concept> {
        self.concept_index.get(qname).map(|&i| &self.parts.concepts[i])
    }

    pub fn namespaces(&self) -> &[NamespaceBinding] {
        &self.parts.namespaces
    }

    pub fn namespace_docs(&self) -> &[String] {
        &self.parts.namespace_docs
    }

    pub fn base_sets(&self) -> &[BaseSet] {
        &self.parts.base_sets
    }

    pub fn documents(&self) -> &[ModelDocument] {
        &self.parts.documents
    }

    pub fn validation(&self) -> &[ValidationMessage] {
        &self.parts.validation
    }

    /// Distinct extended link roles that carry the given arcrole, in base set
    /// order.
    pub fn link_roles(&self, arcrole: Arcrole) -> Vec<&str> {
        let mut roles: Vec<&str> = Vec::new();
        for set in self.base_sets() {
            if set.key.arcrole != arcrole.uri() {
                continue;
            }
            if let Some(elr) = set.key.elr.as_deref() {
                if !roles.contains(&elr) {
                    roles.push(elr);
                }
            }
        }
        roles
    }

    /// All arcs of `arcrole` in `elr`, merged across link and arc elements.
    /// `None` merges every extended link role.
    pub fn relationship_set<'a>(&'a self, arcrole: Arcrole, elr: Option<&'a str>) -> RelationshipSet<'a> {
        let arcs = self
            .base_sets()
            .iter()
            .filter(|set| set.key.arcrole == arcrole.uri())
            .filter(|set| elr.is_none() || set.key.elr.as_deref() == elr)
            .flat_map(|set| set.relationships.iter())
            .collect();
        RelationshipSet::new(arcrole, elr, arcs)
    }
}

/// A queryable view over the arcs of one arcrole.
pub struct RelationshipSet<'a> {
    arcrole: Arcrole,
    elr: Option<&'a str>,
    arcs: Vec<&'a Relationship>,
    inbound: HashMap<&'a QName, Vec<&'a Relationship>>,
    outbound: HashMap<&'a QName, Vec<&'a Relationship>>,
}

impl<'a> RelationshipSet<'a> {
    fn new(arcrole: Arcrole, elr: Option<&'a str>, arcs: Vec<&'a Relationship>) -> Self {
        let mut inbound: HashMap<&QName, Vec<&Relationship>> = HashMap::new();
        let mut outbound: HashMap<&QName, Vec<&Relationship>> = HashMap::new();
        for &arc in &arcs {
            inbound.entry(&arc.to).or_default().push(arc);
            outbound.entry(&arc.from).or_default().push(arc);
        }
        Self {
            arcrole,
            elr,
            arcs,
            inbound,
            outbound,
        }
    }

    pub fn arcrole(&self) -> Arcrole {
        self.arcrole
    }

    pub fn elr(&self) -> Option<&'a str> {
        self.elr
    }

    pub fn relationships(&self) -> &[&'a Relationship] {
        &self.arcs
    }

    /// Arcs pointing at `qname`.
    pub fn to_model_object(&self, qname: &QName) -> &[&'a Relationship] {
        self.inbound.get(qname).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Arcs leaving `qname`.
    pub fn from_model_object(&self, qname: &QName) -> &[&'a Relationship] {
        self.outbound.get(qname).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Builds the report graph for one filing.
pub trait ModelProvider: Send + Sync {
    fn load(&self, report: &Path) -> Result<FilingModel, ExtractError>;
}

/// Loads a model previously dumped to JSON by an external XBRL processor.
///
/// The dump sits beside the report with a `.json` extension.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonModelProvider;

impl ModelProvider for JsonModelProvider {
    fn load(&self, report: &Path) -> Result<FilingModel, ExtractError> {
        let source = report.with_extension("json");
        let load_error = |reason: String| ExtractError::ProviderLoad {
            path: source.display().to_string(),
            reason,
        };
        let content = std::fs::read_to_string(&source).map_err(|e| load_error(e.to_string()))?;
        let model: FilingModel =
            serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))?;
        log::debug!(
            "Loaded model from {:?}: {} facts, {} contexts, {} concepts",
            source,
            model.facts().len(),
            model.contexts().len(),
            model.concepts().len()
        );
        Ok(model)
    }
}
