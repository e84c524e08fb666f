//! Anchoring: where a filer ties its own concepts to the base taxonomy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use super::graph::{domain_top, presentation_roots};
use super::model::{FilingModel, QName};
use super::qname::{is_base, is_extension, Arcrole};
use crate::core::{ExtractError, FilingContext};

/// A wider-narrower arc together with the presentation roots of its
/// extension-side concept.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Anchor {
    pub wider: QName,
    pub narrower: QName,
    pub roots: Vec<QName>,
}

impl Anchor {
    /// Only the first root is kept in the anchors table.
    pub fn root(&self) -> Option<&QName> {
        self.roots.first()
    }
}

/// Every wider-narrower arc whose endpoints are both defined, deduplicated on
/// the `(wider, narrower)` pair.
pub fn extract_anchors(model: &FilingModel) -> Result<Vec<Anchor>, ExtractError> {
    let mut seen: BTreeSet<(&QName, &QName)> = BTreeSet::new();
    let mut anchors = Vec::new();

    for elr in model.link_roles(Arcrole::WiderNarrower) {
        let set = model.relationship_set(Arcrole::WiderNarrower, Some(elr));
        for arc in set.relationships() {
            let (wider, narrower) = match (model.concept(&arc.from), model.concept(&arc.to)) {
                (Some(w), Some(n)) => (&w.qname, &n.qname),
                _ => {
                    log::debug!("Skipping anchor {} -> {} with undefined endpoint", arc.from, arc.to);
                    continue;
                }
            };
            if !seen.insert((wider, narrower)) {
                continue;
            }

            let extension_side = if is_base(narrower) { wider } else { narrower };
            anchors.push(Anchor {
                wider: wider.clone(),
                narrower: narrower.clone(),
                roots: presentation_roots(model, extension_side)?,
            });
        }
    }

    Ok(anchors)
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AnchorRow {
    pub filing_id: String,
    pub wider_prefix: String,
    pub wider_name: String,
    pub narrower_prefix: String,
    pub narrower_name: String,
    /// Empty when the extension concept sits in no presentation tree.
    pub root_name: String,
}

pub fn anchor_rows(filing: &FilingContext, anchors: &[Anchor]) -> Vec<AnchorRow> {
    anchors
        .iter()
        .map(|anchor| AnchorRow {
            filing_id: filing.filing_id.clone(),
            wider_prefix: anchor.wider.prefix.clone(),
            wider_name: anchor.wider.local_name.clone(),
            narrower_prefix: anchor.narrower.prefix.clone(),
            narrower_name: anchor.narrower.local_name.clone(),
            root_name: anchor
                .root()
                .map(|r| r.local_name.clone())
                .unwrap_or_default(),
        })
        .collect()
}

/// Extension member hung under a base domain-member tree.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct MemberAnchor {
    pub dimension: QName,
    pub member: QName,
    pub parent: QName,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DomainAnchor {
    pub dimension: QName,
    pub domain: QName,
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct HypercubeAnchor {
    pub hypercube: QName,
    pub dimension: QName,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DimensionAnchors {
    pub members: Vec<MemberAnchor>,
    pub domains: Vec<DomainAnchor>,
    pub dimensions: Vec<HypercubeAnchor>,
}

/// Extension members, domains and dimensions attached to dimensional
/// structures. Each role is examined on its own and then all roles merged.
pub fn dimension_anchors(model: &FilingModel) -> Result<DimensionAnchors, ExtractError> {
    let mut members = BTreeSet::new();
    let mut domains = BTreeSet::new();
    let mut dimensions = BTreeSet::new();

    let mut roles: Vec<Option<&str>> = Vec::new();
    for set in model.base_sets() {
        let dimensional = Arcrole::from_str(&set.key.arcrole).map_or(false, Arcrole::is_dimensional);
        let elr = set.key.elr.as_deref();
        if dimensional && elr.is_some() && !roles.contains(&elr) {
            roles.push(elr);
        }
    }
    roles.push(None);

    for elr in roles {
        let domain_member = model.relationship_set(Arcrole::DomainMember, elr);
        let dimension_domain = model.relationship_set(Arcrole::DimensionDomain, elr);
        let hypercube_dimension = model.relationship_set(Arcrole::HypercubeDimension, elr);

        for arc in domain_member.relationships() {
            if !(is_base(&arc.from) && is_extension(&arc.to)) {
                continue;
            }
            let top = domain_top(&domain_member, &arc.from)?;
            for owner in dimension_domain.to_model_object(top) {
                members.insert(MemberAnchor {
                    dimension: owner.from.clone(),
                    member: arc.to.clone(),
                    parent: arc.from.clone(),
                });
            }
        }

        for arc in dimension_domain.relationships() {
            if is_extension(&arc.to) {
                domains.insert(DomainAnchor {
                    dimension: arc.from.clone(),
                    domain: arc.to.clone(),
                });
            }
        }

        for arc in hypercube_dimension.relationships() {
            if is_extension(&arc.to) {
                dimensions.insert(HypercubeAnchor {
                    hypercube: arc.from.clone(),
                    dimension: arc.to.clone(),
                });
            }
        }
    }

    Ok(DimensionAnchors {
        members: members.into_iter().collect(),
        domains: domains.into_iter().collect(),
        dimensions: dimensions.into_iter().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExtractOptions, Register};
    use crate::xbrl::tests::{ext, ifrs, ModelBuilder};

    const ROLE: &str = "http://www.acme.co.uk/role/Segments";
    const ANCHOR_ROLE: &str = "http://www.esma.europa.eu/xbrl/role/cor/esef_role-999999";
    const PRESENTATION: &str = "http://www.acme.co.uk/role/IncomeStatement";

    #[test]
    fn test_single_member_anchor() {
        let model = ModelBuilder::new()
            .arc(Arcrole::DomainMember, ROLE, ifrs("SegmentsDomain"), ext("RetailMember"))
            .arc(Arcrole::DimensionDomain, ROLE, ifrs("SegmentsAxis"), ifrs("SegmentsDomain"))
            .build();

        let anchors = dimension_anchors(&model).unwrap();
        assert_eq!(
            anchors.members,
            vec![MemberAnchor {
                dimension: ifrs("SegmentsAxis"),
                member: ext("RetailMember"),
                parent: ifrs("SegmentsDomain"),
            }]
        );
        assert!(anchors.domains.is_empty());
        assert!(anchors.dimensions.is_empty());
    }

    #[test]
    fn test_member_anchor_climbs_to_domain() {
        let model = ModelBuilder::new()
            .arc(Arcrole::DomainMember, ROLE, ifrs("SegmentsDomain"), ifrs("ReportableSegmentsMember"))
            .arc(Arcrole::DomainMember, ROLE, ifrs("ReportableSegmentsMember"), ext("RetailMember"))
            .arc(Arcrole::DimensionDomain, ROLE, ifrs("SegmentsAxis"), ifrs("SegmentsDomain"))
            .build();

        let anchors = dimension_anchors(&model).unwrap();
        assert_eq!(anchors.members.len(), 1);
        assert_eq!(anchors.members[0].dimension, ifrs("SegmentsAxis"));
        assert_eq!(anchors.members[0].parent, ifrs("ReportableSegmentsMember"));
    }

    #[test]
    fn test_domain_member_cycle_is_reported() {
        let model = ModelBuilder::new()
            .arc(Arcrole::DomainMember, ROLE, ifrs("SegmentsDomain"), ifrs("ReportableSegmentsMember"))
            .arc(Arcrole::DomainMember, ROLE, ifrs("ReportableSegmentsMember"), ifrs("SegmentsDomain"))
            .arc(Arcrole::DomainMember, ROLE, ifrs("ReportableSegmentsMember"), ext("RetailMember"))
            .arc(Arcrole::DimensionDomain, ROLE, ifrs("SegmentsAxis"), ifrs("SegmentsDomain"))
            .build();

        match dimension_anchors(&model).unwrap_err() {
            ExtractError::CycleDetected { arcrole, elr, .. } => {
                assert_eq!(arcrole, Arcrole::DomainMember.uri());
                assert_eq!(elr, ROLE);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_extension_domains_and_dimensions() {
        let model = ModelBuilder::new()
            .arc(Arcrole::DimensionDomain, ROLE, ifrs("SegmentsAxis"), ext("BrandsDomain"))
            .arc(Arcrole::DimensionDomain, ROLE, ext("RegionAxis"), ifrs("SegmentsDomain"))
            .arc(Arcrole::HypercubeDimension, ROLE, ifrs("SegmentsTable"), ext("RegionAxis"))
            .build();

        let anchors = dimension_anchors(&model).unwrap();
        assert!(anchors.members.is_empty());
        assert_eq!(
            anchors.domains,
            vec![DomainAnchor {
                dimension: ifrs("SegmentsAxis"),
                domain: ext("BrandsDomain"),
            }]
        );
        assert_eq!(anchors.dimensions.len(), 1);
        assert_eq!(anchors.dimensions[0].dimension, ext("RegionAxis"));
    }

    #[test]
    fn test_wider_narrower_anchor_with_root() {
        let model = ModelBuilder::new()
            .monetary_concept(ifrs("Revenue"))
            .monetary_concept(ext("WidgetSales"))
            .arc(Arcrole::WiderNarrower, ANCHOR_ROLE, ifrs("Revenue"), ext("WidgetSales"))
            .arc(Arcrole::ParentChild, PRESENTATION, ifrs("IncomeStatementAbstract"), ext("WidgetSales"))
            .build();

        let anchors = extract_anchors(&model).unwrap();
        assert_eq!(anchors.len(), 1);
        assert_eq!(anchors[0].wider, ifrs("Revenue"));
        assert_eq!(anchors[0].narrower, ext("WidgetSales"));
        assert_eq!(anchors[0].root(), Some(&ifrs("IncomeStatementAbstract")));

        let filing = FilingContext::new(Register::EsefFca, "acme", None, ExtractOptions::default());
        let rows = anchor_rows(&filing, &anchors);
        assert_eq!(rows[0].wider_name, "Revenue");
        assert_eq!(rows[0].narrower_prefix, "acme");
        assert_eq!(rows[0].root_name, "IncomeStatementAbstract");
    }

    #[test]
    fn test_anchor_without_defined_concepts_is_skipped() {
        let model = ModelBuilder::new()
            .monetary_concept(ifrs("Revenue"))
            .arc(Arcrole::WiderNarrower, ANCHOR_ROLE, ifrs("Revenue"), ext("Undefined"))
            .build();
        assert!(extract_anchors(&model).unwrap().is_empty());
    }

    #[test]
    fn test_anchor_without_roots_has_empty_root_name() {
        let model = ModelBuilder::new()
            .monetary_concept(ext("WidgetSales"))
            .monetary_concept(ifrs("Revenue"))
            .arc(Arcrole::WiderNarrower, ANCHOR_ROLE, ext("WidgetSales"), ifrs("Revenue"))
            .build();

        let anchors = extract_anchors(&model).unwrap();
        let filing = FilingContext::new(Register::EsefFca, "acme", None, ExtractOptions::default());
        assert_eq!(anchor_rows(&filing, &anchors)[0].root_name, "");
    }
}
