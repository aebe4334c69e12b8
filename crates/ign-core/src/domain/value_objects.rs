//! Value objects for the ign domain.
//!
//! Variables carry dynamically typed values in templates. In the domain every
//! value is a [`VarValue`] tagged with the [`VarType`] it was declared as, and
//! raw text only becomes a value through [`VarValue::infer`] (directive
//! defaults) or [`VarValue::parse_as`] (user input).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

// ============================================================================
// VarType
// ============================================================================

/// Declared type of a template variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VarType {
    #[default]
    String,
    Int,
    Number,
    Bool,
}

impl VarType {
    pub const ALL: [VarType; 4] = [Self::String, Self::Int, Self::Number, Self::Bool];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Number => "number",
            Self::Bool => "bool",
        }
    }

    /// Whether a value may be stored under a declaration of this type.
    ///
    /// Integers are accepted where a `number` is declared.
    pub fn accepts(self, value: &VarValue) -> bool {
        matches!(
            (self, value),
            (Self::String, VarValue::String(_))
                | (Self::Int, VarValue::Int(_))
                | (Self::Number, VarValue::Number(_) | VarValue::Int(_))
                | (Self::Bool, VarValue::Bool(_))
        )
    }
}

impl FromStr for VarType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(Self::String),
            "int" => Ok(Self::Int),
            "number" => Ok(Self::Number),
            "bool" => Ok(Self::Bool),
            _ => Err(DomainError::UnknownVarType(s.to_string())),
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// VarValue
// ============================================================================

/// A typed variable value.
///
/// Serialized untagged so persisted variable files read naturally
/// (`"port": 8080`, `"name": "svc"`). Variant order matters for
/// deserialization: booleans, then integers, then floats, then strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VarValue {
    Bool(bool),
    Int(i64),
    Number(f64),
    String(String),
}

impl VarValue {
    /// Infer a value from untyped directive text.
    ///
    /// Strict order: the literals `true`/`false`, then a whole-string integer
    /// parse, then the text itself. `1.25.4` stays a string because the
    /// integer parse rejects any trailing characters.
    pub fn infer(raw: &str) -> Self {
        match raw {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => raw
                .parse::<i64>()
                .map(Self::Int)
                .unwrap_or_else(|_| Self::String(raw.to_string())),
        }
    }

    /// Parse raw text as a value of the given type.
    pub fn parse_as(name: &str, var_type: VarType, raw: &str) -> Result<Self, DomainError> {
        let invalid = |reason: String| DomainError::InvalidValue {
            name: name.to_string(),
            reason,
        };

        match var_type {
            VarType::String => Ok(Self::String(raw.to_string())),
            VarType::Int => raw
                .trim()
                .parse::<i64>()
                .map(Self::Int)
                .map_err(|_| invalid(format!("'{raw}' is not an integer"))),
            VarType::Number => {
                let trimmed = raw.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Self::Int(i));
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => Ok(Self::Number(n)),
                    _ => Err(invalid(format!("'{raw}' is not a number"))),
                }
            }
            VarType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "y" | "1" => Ok(Self::Bool(true)),
                "false" | "no" | "n" | "0" => Ok(Self::Bool(false)),
                _ => Err(invalid(format!("'{raw}' is not a boolean"))),
            },
        }
    }

    /// The narrowest type this value satisfies.
    pub fn var_type(&self) -> VarType {
        match self {
            Self::Bool(_) => VarType::Bool,
            Self::Int(_) => VarType::Int,
            Self::Number(_) => VarType::Number,
            Self::String(_) => VarType::String,
        }
    }

    /// `true` for strings that are empty after trimming.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::String(s) if s.trim().is_empty())
    }

    /// Truthiness used by conditional directives.
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(b) => *b,
            Self::Int(i) => *i != 0,
            Self::Number(n) => *n != 0.0,
            Self::String(s) => !s.trim().is_empty(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

impl fmt::Display for VarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for VarValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<i64> for VarValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for VarValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ============================================================================
// TemplateRef
// ============================================================================

/// Where a template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateRef {
    /// A directory on the local filesystem.
    Local { path: PathBuf },
    /// A repository location such as `github.com/owner/repo/sub@v1`.
    Remote {
        location: String,
        reference: Option<String>,
    },
}

impl TemplateRef {
    /// Parse a user-supplied template reference.
    ///
    /// Anything starting with `/`, `.`, `~` or `file://` is a local path;
    /// everything else must look like `host/owner/repo[/subdir][@ref]`.
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        let raw = raw.trim();
        let invalid = |reason: &str| DomainError::InvalidTemplateRef {
            reference: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.is_empty() {
            return Err(invalid("reference is empty"));
        }

        if let Some(path) = raw.strip_prefix("file://") {
            if path.is_empty() {
                return Err(invalid("file:// reference has no path"));
            }
            return Ok(Self::local(path));
        }

        if raw.starts_with('/') || raw.starts_with('.') || raw.starts_with('~') {
            return Ok(Self::local(raw));
        }

        let (location, reference) = match raw.rsplit_once('@') {
            Some((loc, r)) if !loc.is_empty() && !r.is_empty() && !r.contains(['/', ':']) => {
                (loc, Some(r.to_string()))
            }
            _ => (raw, None),
        };

        let segments = location.trim_end_matches('/').split('/').count();
        if segments < 3 {
            return Err(invalid("expected host/owner/repo"));
        }

        Ok(Self::Remote {
            location: location.trim_end_matches('/').to_string(),
            reference,
        })
    }

    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self::Local { path: path.into() }
    }

    pub fn as_local(&self) -> Option<&Path> {
        match self {
            Self::Local { path } => Some(path),
            Self::Remote { .. } => None,
        }
    }
}

impl fmt::Display for TemplateRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local { path } => write!(f, "{}", path.display()),
            Self::Remote {
                location,
                reference: Some(r),
            } => write!(f, "{location}@{r}"),
            Self::Remote { location, .. } => f.write_str(location),
        }
    }
}

impl FromStr for TemplateRef {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ============================================================================
// CheckoutMode
// ============================================================================

/// Whether a workflow run creates a project or updates an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutMode {
    /// No persisted project state was found.
    Checkout,
    /// Persisted state exists; values are reconciled against the template.
    Update,
}

impl fmt::Display for CheckoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checkout => f.write_str("checkout"),
            Self::Update => f.write_str("update"),
        }
    }
}
