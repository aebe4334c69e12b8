//! Template and project manifests.
//!
//! `TemplateManifest` lives at the template root as `ign.json`.
//! `ProjectManifest` and `ProjectVariables` live under the generated
//! project's `.ign/` directory and record what the project was built from.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::directive::validate_name;
use crate::domain::entities::variable::VariableDeclaration;
use crate::domain::error::DomainError;
use crate::domain::ignore::IgnoreMatcher;
use crate::domain::value_objects::{VarType, VarValue};

/// Directory holding a generated project's state.
pub const PROJECT_STATE_DIR: &str = ".ign";
pub const PROJECT_MANIFEST_FILE: &str = "ign.json";
pub const PROJECT_VARIABLES_FILE: &str = "ign-var.json";

/// Persisted variable values, sorted by name.
pub type ProjectVariables = BTreeMap<String, VarValue>;

/// `<project>/.ign/ign.json`
pub fn project_manifest_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_STATE_DIR).join(PROJECT_MANIFEST_FILE)
}

/// `<project>/.ign/ign-var.json`
pub fn project_variables_path(project_dir: &Path) -> PathBuf {
    project_dir
        .join(PROJECT_STATE_DIR)
        .join(PROJECT_VARIABLES_FILE)
}

// ── template manifest ────────────────────────────────────────────────────────

/// Optional value constraints declared in a template manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VarConstraints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<VarValue>,
}

/// A variable entry in `ign.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarSpec {
    #[serde(rename = "type", default)]
    pub var_type: VarType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<VarValue>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<VarConstraints>,
}

impl VarSpec {
    pub fn from_declaration(decl: &VariableDeclaration) -> Self {
        Self {
            var_type: decl.var_type(),
            description: None,
            default: decl.default.clone(),
            required: decl.required,
            constraints: None,
        }
    }

    pub fn to_declaration(&self, name: &str) -> VariableDeclaration {
        let mut decl = VariableDeclaration::new(name).with_type(self.var_type);
        if let Some(d) = &self.default {
            decl = decl.with_default(d.clone());
        }
        decl.required = self.required;
        decl
    }

    pub fn needs_prompt(&self) -> bool {
        self.required || self.default.is_none()
    }

    /// Check a resolved value against the declared type and constraints.
    pub fn validate_value(&self, name: &str, value: &VarValue) -> Result<(), DomainError> {
        let invalid = |reason: String| DomainError::InvalidValue {
            name: name.to_string(),
            reason,
        };

        if !self.var_type.accepts(value) {
            return Err(invalid(format!(
                "expected {}, got {} ({})",
                self.var_type,
                value.var_type(),
                value
            )));
        }

        let Some(c) = &self.constraints else {
            return Ok(());
        };

        if let (Some(pattern), VarValue::String(s)) = (&c.pattern, value) {
            let re = Regex::new(&format!("^(?:{pattern})$"))
                .map_err(|e| invalid(format!("invalid pattern '{pattern}': {e}")))?;
            if !re.is_match(s) {
                return Err(invalid(format!("'{s}' does not match /{pattern}/")));
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = c.min.filter(|min| n < *min) {
                return Err(invalid(format!("{n} is below the minimum {min}")));
            }
            if let Some(max) = c.max.filter(|max| n > *max) {
                return Err(invalid(format!("{n} is above the maximum {max}")));
            }
        }

        if !c.choices.is_empty() && !c.choices.contains(value) {
            let allowed: Vec<String> = c.choices.iter().map(ToString::to_string).collect();
            return Err(invalid(format!(
                "'{value}' is not one of: {}",
                allowed.join(", ")
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateSettings {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore: Vec<String>,
}

/// `ign.json` at a template root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub variables: BTreeMap<String, VarSpec>,
    #[serde(default)]
    pub settings: TemplateSettings,
}

impl TemplateManifest {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            description: None,
            hash: String::new(),
            variables: BTreeMap::new(),
            settings: TemplateSettings::default(),
        }
    }

    pub fn ignore_matcher(&self) -> IgnoreMatcher {
        IgnoreMatcher::new(&self.settings.ignore)
    }

    /// Declarations described by this manifest, keyed by name.
    pub fn declarations(&self) -> BTreeMap<String, VariableDeclaration> {
        self.variables
            .iter()
            .map(|(name, spec)| (name.clone(), spec.to_declaration(name)))
            .collect()
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.name.trim().is_empty() {
            return Err(DomainError::MissingRequiredField { field: "name" });
        }

        for (name, spec) in &self.variables {
            validate_name(name)?;
            if let Some(default) = &spec.default {
                spec.validate_value(name, default).map_err(|e| {
                    DomainError::InvalidManifest(format!("default for '{name}': {e}"))
                })?;
            }
        }
        Ok(())
    }
}

// ── project manifest ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateIdentity {
    #[serde(rename = "ref")]
    pub reference: String,
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
}

impl GenerationMetadata {
    pub fn now() -> Self {
        Self {
            generated_at: Utc::now(),
            generated_by: format!("ign {}", crate::VERSION),
        }
    }
}

/// `.ign/ign.json` in a generated project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectManifest {
    pub template: TemplateIdentity,
    pub hash: String,
    pub metadata: GenerationMetadata,
}

impl ProjectManifest {
    pub fn new(template: TemplateIdentity, hash: impl Into<String>) -> Self {
        Self {
            template,
            hash: hash.into(),
            metadata: GenerationMetadata::now(),
        }
    }
}
