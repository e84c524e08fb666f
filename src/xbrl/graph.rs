//! Upward walks over presentation and dimensional arcs.
//!
//! Every walk keeps a visited set and stops with
//! [`ExtractError::CycleDetected`] instead of looping on a cyclic graph.

use std::collections::HashSet;

use super::model::{FilingModel, QName, Relationship, RelationshipSet};
use super::qname::Arcrole;
use crate::core::ExtractError;

fn cycle_error(set: &RelationshipSet<'_>, at: &QName) -> ExtractError {
    ExtractError::CycleDetected {
        arcrole: set.arcrole().uri().to_string(),
        elr: set.elr().unwrap_or("(all roles)").to_string(),
        concept: at.clark(),
    }
}

/// Presentation roles that belong to a fully keyed base set.
fn presentation_roles(model: &FilingModel) -> Vec<&str> {
    let mut roles: Vec<&str> = Vec::new();
    for set in model.base_sets() {
        let key = &set.key;
        if key.arcrole != Arcrole::ParentChild.uri() || key.link.is_none() || key.arc.is_none() {
            continue;
        }
        if let Some(elr) = key.elr.as_deref() {
            if !roles.contains(&elr) {
                roles.push(elr);
            }
        }
    }
    roles
}

/// Ultimate parent-child ancestors of `concept`, one per presentation role at
/// most, in role order without duplicates.
///
/// A concept that is not the child of anything in any role has no roots.
pub fn presentation_roots(model: &FilingModel, concept: &QName) -> Result<Vec<QName>, ExtractError> {
    let mut roots: Vec<QName> = Vec::new();

    for elr in presentation_roles(model) {
        let set = model.relationship_set(Arcrole::ParentChild, Some(elr));
        let top = walk_to_top(&set, concept, |inbound| inbound.first().map(|&r| &r.from))?;
        if top != concept && !roots.contains(top) {
            roots.push(top.clone());
        }
    }

    Ok(roots)
}

/// Top of the domain-member tree containing `start`, ascending only while a
/// node has exactly one parent.
pub fn domain_top<'a>(
    set: &RelationshipSet<'a>,
    start: &'a QName,
) -> Result<&'a QName, ExtractError> {
    walk_to_top(set, start, |inbound| match *inbound {
        [only] => Some(&only.from),
        _ => None,
    })
}

fn walk_to_top<'a, 's, F>(
    set: &'s RelationshipSet<'a>,
    start: &'a QName,
    parent_of: F,
) -> Result<&'a QName, ExtractError>
where
    F: Fn(&'s [&'a Relationship]) -> Option<&'a QName>,
{
    let mut visited: HashSet<&QName> = HashSet::new();
    visited.insert(start);
    let mut node = start;

    while let Some(parent) = parent_of(set.to_model_object(node)) {
        if !visited.insert(parent) {
            log::error!("Cycle in {} at {}", set.arcrole(), parent);
            return Err(cycle_error(set, parent));
        }
        node = parent;
    }

    Ok(node)
}
