//! Variable declarations discovered while scanning a template.

use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;

use crate::domain::directive::Directive;
use crate::domain::value_objects::{VarType, VarValue};

/// A variable as declared by the directives in a template tree.
///
/// Created on first sighting; later sightings refine type and default.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration {
    pub name: String,
    var_type: Option<VarType>,
    pub default: Option<VarValue>,
    pub required: bool,
    pub sources: BTreeSet<String>,
}

impl VariableDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_type: None,
            default: None,
            required: true,
            sources: BTreeSet::new(),
        }
    }

    pub fn with_type(mut self, var_type: VarType) -> Self {
        self.var_type = Some(var_type);
        self
    }

    pub fn with_default(mut self, default: VarValue) -> Self {
        self.default = Some(default);
        self.required = false;
        self
    }

    /// Effective type; untyped declarations are strings.
    pub fn var_type(&self) -> VarType {
        self.var_type.unwrap_or_default()
    }

    /// A declaration needs a value from the user when it is required or has
    /// no default to fall back to.
    pub fn needs_prompt(&self) -> bool {
        self.required || self.default.is_none()
    }
}

/// A later sighting annotated a different type than the one already recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeConflict {
    pub name: String,
    pub kept: VarType,
    pub ignored: VarType,
    pub source: String,
}

/// Accumulates declarations across every sighting in a tree.
#[derive(Debug, Default)]
pub struct DeclarationSet {
    declarations: BTreeMap<String, VariableDeclaration>,
    conflicts: Vec<TypeConflict>,
}

impl DeclarationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one directive sighting from `source`.
    ///
    /// A type inferred from a default never conflicts; only annotations do.
    /// The first default is coerced to the kept type, and one that cannot be
    /// is recorded as a conflict and dropped.
    pub fn observe(&mut self, directive: &Directive, source: &str) {
        let (name, annotated, default) = match directive {
            Directive::Var(v) => (v.name.as_str(), v.var_type, v.default.as_ref()),
            Directive::If { name } => (name.as_str(), Some(VarType::Bool), None),
            Directive::Else | Directive::EndIf => return,
        };

        let decl = self
            .declarations
            .entry(name.to_string())
            .or_insert_with(|| VariableDeclaration::new(name));
        decl.sources.insert(source.to_string());

        let mut conflict = None;
        match (decl.var_type, annotated) {
            (None, Some(t)) => decl.var_type = Some(t),
            (Some(kept), Some(ignored)) if kept != ignored => conflict = Some(ignored),
            _ => {}
        }

        if decl.default.is_none() {
            if let Some(d) = default {
                let kept = *decl.var_type.get_or_insert(d.var_type());
                match coerce(name, kept, d) {
                    Some(value) => {
                        decl.default = Some(value);
                        decl.required = false;
                    }
                    None => conflict = conflict.or(Some(d.var_type())),
                }
            }
        }

        if let Some(ignored) = conflict {
            let kept = decl.var_type();
            warn!(
                variable = name,
                kept = %kept,
                ignored = %ignored,
                source,
                "Conflicting type annotation ignored"
            );
            self.conflicts.push(TypeConflict {
                name: name.to_string(),
                kept,
                ignored,
                source: source.to_string(),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    pub fn into_report(self, files_scanned: usize) -> ScanReport {
        ScanReport {
            declarations: self.declarations,
            files_scanned,
            conflicts: self.conflicts,
        }
    }
}

/// `value` as a `var_type` value, re-parsing its text when the types differ.
fn coerce(name: &str, var_type: VarType, value: &VarValue) -> Option<VarValue> {
    if var_type.accepts(value) {
        return Some(value.clone());
    }
    VarValue::parse_as(name, var_type, &value.to_string()).ok()
}

/// Outcome of scanning a template tree.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    pub declarations: BTreeMap<String, VariableDeclaration>,
    pub files_scanned: usize,
    pub conflicts: Vec<TypeConflict>,
}

impl ScanReport {
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }
}
