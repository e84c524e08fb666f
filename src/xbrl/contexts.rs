//! Surrogate codes for dimensional contexts.
//!
//! Two coding strategies exist because the output tables need two views: the
//! facts table groups facts from different periods under one code per
//! dimensional slice, while the dimensions table keeps every context apart.

use serde::Serialize;
use std::collections::HashMap;

use super::model::{Context, DimensionValue, FilingModel, QName};

pub const DEDUPED_CODE_PREFIX: &str = "C-";
pub const EXACT_CODE_PREFIX: &str = "c-";

/// How [`DedupedCoding`] treats a context carrying more than one dimension.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MultiDimensionPolicy {
    /// Code each dimension/member pair on its own; the context maps to the code
    /// of its last pair. Earlier pairs may get codes nothing points to.
    LastPairWins,
    /// Code the context's whole set of pairs as one key.
    #[default]
    CombinedKey,
}

/// One distinct `(code, dimension, member)` tuple.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DimensionCode {
    pub code: String,
    pub dimension: QName,
    pub member: Option<QName>,
}

/// Filing-scoped output of a coding pass.
#[derive(Debug, Default)]
pub struct ContextCodes {
    lookup: HashMap<String, String>,
    codes: Vec<DimensionCode>,
}

impl ContextCodes {
    /// Code assigned to a raw context id, if the context is dimensional.
    pub fn code_for(&self, context_id: &str) -> Option<&str> {
        self.lookup.get(context_id).map(String::as_str)
    }

    pub fn codes(&self) -> &[DimensionCode] {
        &self.codes
    }

    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup.is_empty()
    }
}

pub trait ContextCoding {
    /// `contexts` must already be in a stable order; see [`ordered_contexts`].
    fn assign(&self, contexts: &[&Context]) -> ContextCodes;
}

/// Contexts in ascending raw id order, which fixes code assignment.
pub fn ordered_contexts(model: &FilingModel) -> Vec<&Context> {
    let mut contexts: Vec<&Context> = model.contexts().iter().collect();
    contexts.sort_by(|a, b| a.id.cmp(&b.id));
    contexts
}

/// One code per distinct dimension/member key, shared by every context with
/// that slice.
#[derive(Clone, Copy, Debug, Default)]
pub struct DedupedCoding {
    pub policy: MultiDimensionPolicy,
}

impl DedupedCoding {
    pub fn new(policy: MultiDimensionPolicy) -> Self {
        Self { policy }
    }
}

fn pair_key(value: &DimensionValue) -> String {
    let member = value.member.as_ref().map_or("", |m| m.local_name.as_str());
    format!("{}{}", value.dimension.local_name, member)
}

fn to_code(code: &str, value: &DimensionValue) -> DimensionCode {
    DimensionCode {
        code: code.to_string(),
        dimension: value.dimension.clone(),
        member: value.member.clone(),
    }
}

#[derive(Default)]
struct KeyedCodes {
    by_key: HashMap<String, String>,
    out: ContextCodes,
}

impl KeyedCodes {
    fn intern(&mut self, key: String, pairs: &[DimensionValue]) -> String {
        if let Some(code) = self.by_key.get(&key) {
            return code.clone();
        }
        let code = format!("{}{}", DEDUPED_CODE_PREFIX, self.by_key.len() + 1);
        for pair in pairs {
            self.out.codes.push(to_code(&code, pair));
        }
        self.by_key.insert(key, code.clone());
        code
    }
}

impl ContextCoding for DedupedCoding {
    fn assign(&self, contexts: &[&Context]) -> ContextCodes {
        let mut keyed = KeyedCodes::default();

        for context in contexts {
            let dims = &context.dimensions;
            if dims.is_empty() {
                continue;
            }
            if dims.len() > 1 {
                log::warn!(
                    "Context {} has {} dimensions, coding with {:?}",
                    context.id,
                    dims.len(),
                    self.policy
                );
            }

            let code = match self.policy {
                MultiDimensionPolicy::LastPairWins if dims.len() > 1 => {
                    let mut last = String::new();
                    for pair in dims {
                        last = keyed.intern(pair_key(pair), std::slice::from_ref(pair));
                    }
                    last
                }
                MultiDimensionPolicy::CombinedKey if dims.len() > 1 => {
                    let mut keys: Vec<String> = dims.iter().map(pair_key).collect();
                    keys.sort();
                    keyed.intern(keys.join("|"), dims)
                }
                _ => keyed.intern(pair_key(&dims[0]), &dims[..1]),
            };
            keyed.out.lookup.insert(context.id.clone(), code);
        }

        keyed.out
    }
}

/// One code per dimensional context, keeping every `(context, dimension,
/// member)` row.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExactContextCoding;

impl ContextCoding for ExactContextCoding {
    fn assign(&self, contexts: &[&Context]) -> ContextCodes {
        let mut out = ContextCodes::default();
        for context in contexts.iter().filter(|c| !c.dimensions.is_empty()) {
            let code = format!("{}{}", EXACT_CODE_PREFIX, out.lookup.len() + 1);
            for pair in &context.dimensions {
                out.codes.push(to_code(&code, pair));
            }
            out.lookup.insert(context.id.clone(), code);
        }
        out
    }
}
