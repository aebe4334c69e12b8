//! Variable reconciliation between a project's persisted values and a
//! template revision's declarations.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::domain::entities::{ProjectVariables, VarSpec, VariableDeclaration};
use crate::domain::error::DomainError;

/// Names added and removed between two variable sets. Both lists are sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub new_names: Vec<String>,
    pub removed_names: Vec<String>,
}

impl ReconciliationResult {
    pub fn is_empty(&self) -> bool {
        self.new_names.is_empty() && self.removed_names.is_empty()
    }
}

/// Stored versus freshly computed template digest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HashState {
    pub stored_hash: String,
    pub computed_hash: String,
    pub changed: bool,
}

impl HashState {
    pub fn new(stored_hash: impl Into<String>, computed_hash: impl Into<String>) -> Self {
        let stored_hash = stored_hash.into();
        let computed_hash = computed_hash.into();
        let changed = stored_hash != computed_hash;
        Self {
            stored_hash,
            computed_hash,
            changed,
        }
    }
}

/// Compare existing variable names against target declarations.
pub fn diff<'a, I>(
    existing_names: I,
    target: &BTreeMap<String, VariableDeclaration>,
) -> ReconciliationResult
where
    I: IntoIterator<Item = &'a str>,
{
    let existing: BTreeSet<&str> = existing_names.into_iter().collect();

    ReconciliationResult {
        new_names: target
            .keys()
            .filter(|k| !existing.contains(k.as_str()))
            .cloned()
            .collect(),
        removed_names: existing
            .iter()
            .filter(|k| !target.contains_key(**k))
            .map(|k| k.to_string())
            .collect(),
    }
}

/// How scanned declarations are folded into an existing manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergeMode {
    /// Keep existing entries; add only names the manifest lacks.
    #[default]
    Merge,
    /// Replace every scanned name with its scanned declaration.
    Overwrite,
}

impl FromStr for MergeMode {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "overwrite" => Ok(Self::Overwrite),
            other => Err(DomainError::InvalidValue {
                name: "mode".into(),
                reason: format!("'{other}' is not one of: merge, overwrite"),
            }),
        }
    }
}

impl fmt::Display for MergeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Merge => f.write_str("merge"),
            Self::Overwrite => f.write_str("overwrite"),
        }
    }
}

/// Fold scanned declarations into manifest variables. Names that were not
/// scanned are kept in both modes.
pub fn merge_declarations(
    scanned: &BTreeMap<String, VariableDeclaration>,
    existing: &BTreeMap<String, VarSpec>,
    mode: MergeMode,
) -> BTreeMap<String, VarSpec> {
    let mut merged = existing.clone();
    for (name, decl) in scanned {
        match mode {
            MergeMode::Merge => {
                merged
                    .entry(name.clone())
                    .or_insert_with(|| VarSpec::from_declaration(decl));
            }
            MergeMode::Overwrite => {
                merged.insert(name.clone(), VarSpec::from_declaration(decl));
            }
        }
    }
    merged
}

/// Provided values, plus declaration defaults for every key not provided.
pub fn apply_defaults(
    declarations: &BTreeMap<String, VariableDeclaration>,
    provided: Option<&ProjectVariables>,
) -> ProjectVariables {
    let mut values = provided.cloned().unwrap_or_default();
    for (name, decl) in declarations {
        if let Some(default) = &decl.default {
            values
                .entry(name.clone())
                .or_insert_with(|| default.clone());
        }
    }
    values
}

pub fn needs_prompt(decl: &VariableDeclaration) -> bool {
    decl.needs_prompt()
}

/// Persisted values minus removed names, overlaid with supplied values and
/// the defaults of newly declared variables.
pub fn merge_values(
    existing: &ProjectVariables,
    reconciliation: &ReconciliationResult,
    target: &BTreeMap<String, VariableDeclaration>,
    supplied: &ProjectVariables,
) -> ProjectVariables {
    let new_decls: BTreeMap<String, VariableDeclaration> = reconciliation
        .new_names
        .iter()
        .filter_map(|n| target.get(n).map(|d| (n.clone(), d.clone())))
        .collect();

    let mut merged: ProjectVariables = existing
        .iter()
        .filter(|(k, _)| !reconciliation.removed_names.contains(*k))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    merged.extend(apply_defaults(&new_decls, Some(supplied)));
    merged
}
