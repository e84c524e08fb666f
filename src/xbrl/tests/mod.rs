use chrono::NaiveDate;

use crate::xbrl::model::{
    BaseSet, BaseSetKey, Concept, ConceptMetadata, Context, DimensionValue, Fact, FilingModel,
    ModelDocument, ModelParts, NamespaceBinding, Period, QName, Relationship, Unit,
    ValidationMessage,
};
use crate::xbrl::qname::Arcrole;

pub const IFRS_NS: &str = "https://xbrl.ifrs.org/taxonomy/2022-03-24/ifrs-full";
pub const EXT_NS: &str = "http://www.acme.co.uk/2022-12-31";
pub const ISO4217_NS: &str = "http://www.xbrl.org/2003/iso4217";
pub const LINK_NS: &str = "http://www.xbrl.org/2003/linkbase";

pub fn ifrs(local_name: &str) -> QName {
    QName::new(IFRS_NS, local_name, "ifrs-full")
}

pub fn ext(local_name: &str) -> QName {
    QName::new(EXT_NS, local_name, "acme")
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

/// Fluent builder for small synthetic report graphs.
#[derive(Default)]
pub struct ModelBuilder {
    parts: ModelParts,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.parts.namespaces.push(NamespaceBinding {
            prefix: prefix.to_string(),
            uri: uri.to_string(),
        });
        self
    }

    pub fn namespace_doc(mut self, uri: &str) -> Self {
        self.parts.namespace_docs.push(uri.to_string());
        self
    }

    pub fn concept(mut self, concept: Concept) -> Self {
        self.parts.concepts.push(concept);
        self
    }

    pub fn text_concept(self, qname: QName) -> Self {
        self.concept(bare_concept(qname))
    }

    pub fn numeric_concept(self, qname: QName) -> Self {
        let mut concept = bare_concept(qname);
        concept.is_numeric = true;
        self.concept(concept)
    }

    pub fn monetary_concept(self, qname: QName) -> Self {
        let mut concept = bare_concept(qname);
        concept.is_numeric = true;
        concept.is_monetary = true;
        self.concept(concept)
    }

    pub fn context(mut self, id: &str, period: Option<Period>, dims: &[(QName, Option<QName>)]) -> Self {
        self.parts.contexts.push(Context {
            id: id.to_string(),
            period,
            dimensions: dims
                .iter()
                .map(|(dimension, member)| DimensionValue {
                    dimension: dimension.clone(),
                    member: member.clone(),
                })
                .collect(),
        });
        self
    }

    pub fn instant_context(self, id: &str, at: &str, dims: &[(QName, Option<QName>)]) -> Self {
        self.context(id, Some(Period::Instant { date: date(at) }), dims)
    }

    pub fn duration_context(
        self,
        id: &str,
        start: &str,
        end: &str,
        dims: &[(QName, Option<QName>)],
    ) -> Self {
        let period = Period::Duration {
            start: date(start),
            end: date(end),
        };
        self.context(id, Some(period), dims)
    }

    pub fn fact(mut self, qname: QName, context_ref: &str, value: &str) -> Self {
        self.parts.facts.push(Fact {
            qname,
            context_ref: context_ref.to_string(),
            value: Some(value.to_string()),
            decimals: None,
            unit: None,
        });
        self
    }

    pub fn money_fact(mut self, qname: QName, context_ref: &str, value: &str, currency: &str) -> Self {
        self.parts.facts.push(Fact {
            qname,
            context_ref: context_ref.to_string(),
            value: Some(value.to_string()),
            decimals: Some("-3".to_string()),
            unit: Some(Unit {
                measures: vec![QName::new(ISO4217_NS, currency, "iso4217")],
            }),
        });
        self
    }

    pub fn raw_fact(mut self, fact: Fact) -> Self {
        self.parts.facts.push(fact);
        self
    }

    pub fn arc(mut self, arcrole: Arcrole, elr: &str, from: QName, to: QName) -> Self {
        let key = BaseSetKey {
            arcrole: arcrole.uri().to_string(),
            elr: Some(elr.to_string()),
            link: Some(QName::new(LINK_NS, "link", "link")),
            arc: Some(QName::new(LINK_NS, "arc", "link")),
        };
        let relationship = Relationship { from, to };
        match self.parts.base_sets.iter_mut().find(|s| s.key == key) {
            Some(set) => set.relationships.push(relationship),
            None => self.parts.base_sets.push(BaseSet {
                key,
                relationships: vec![relationship],
            }),
        }
        self
    }

    pub fn document(mut self, uri: &str, references: &[&str]) -> Self {
        self.parts.documents.push(ModelDocument {
            uri: uri.to_string(),
            references: references.iter().map(|r| r.to_string()).collect(),
        });
        self
    }

    pub fn validation(mut self, severity: &str, code: &str, message: &str) -> Self {
        self.parts.validation.push(ValidationMessage {
            severity: severity.to_string(),
            code: code.to_string(),
            message: message.to_string(),
        });
        self
    }

    pub fn build(self) -> FilingModel {
        FilingModel::from(self.parts)
    }
}

pub fn bare_concept(qname: QName) -> Concept {
    Concept {
        qname,
        type_name: None,
        is_numeric: false,
        is_monetary: false,
        is_abstract: false,
        is_text_block: false,
        period_type: None,
        balance: None,
        metadata: ConceptMetadata::default(),
    }
}
