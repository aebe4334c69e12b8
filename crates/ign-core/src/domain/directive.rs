//! Inline template directives.
//!
//! ```text
//! @ign-var:NAME[:TYPE][=DEFAULT]@   substitution, declares NAME
//! @ign-if:NAME@                     conditional block, declares NAME as bool
//! @ign-else@ / @ign-endif@          block delimiters, declare nothing
//! ```

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::error::DomainError;
use super::value_objects::{VarType, VarValue};

static DIRECTIVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@ign-(var|if|else|endif)(?::([^@\r\n]*))?@").expect("directive regex is valid")
});

/// A parsed `@ign-var:…@` directive.
#[derive(Debug, Clone, PartialEq)]
pub struct VarDirective {
    pub name: String,
    /// Annotated type; `None` for `@ign-var:NAME@` and `@ign-var:NAME=DEFAULT@`.
    pub var_type: Option<VarType>,
    pub default: Option<VarValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Var(VarDirective),
    If { name: String },
    Else,
    EndIf,
}

/// Extracts directives from template text.
pub trait DirectiveExtractor: Send + Sync {
    fn extract(&self, content: &str) -> Result<Vec<Directive>, DomainError>;
}

/// Regex-backed extractor for the `@ign-…@` syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexDirectiveExtractor;

impl RegexDirectiveExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Directives with their byte ranges in `content`, in document order.
    pub fn locate(&self, content: &str) -> Result<Vec<(Range<usize>, Directive)>, DomainError> {
        DIRECTIVE_RE
            .captures_iter(content)
            .map(|caps| {
                let whole = caps.get(0).map(|m| m.range()).unwrap_or_default();
                let kind = caps.get(1).map_or("", |m| m.as_str());
                let args = caps.get(2).map(|m| m.as_str());
                let raw = &content[whole.clone()];
                parse_directive(raw, kind, args).map(|d| (whole, d))
            })
            .collect()
    }
}

impl DirectiveExtractor for RegexDirectiveExtractor {
    fn extract(&self, content: &str) -> Result<Vec<Directive>, DomainError> {
        Ok(self.locate(content)?.into_iter().map(|(_, d)| d).collect())
    }
}

fn parse_directive(raw: &str, kind: &str, args: Option<&str>) -> Result<Directive, DomainError> {
    let invalid = |reason: &str| DomainError::InvalidDirective {
        directive: raw.to_string(),
        reason: reason.to_string(),
    };

    match (kind, args) {
        ("var", Some(args)) => parse_var(args).map_err(|e| match e {
            DomainError::InvalidValue { reason, .. } => invalid(&reason),
            other => other,
        }),
        ("var", None) => Err(invalid("missing variable name")),
        ("if", Some(name)) => {
            let name = name.trim();
            validate_name(name)?;
            Ok(Directive::If {
                name: name.to_string(),
            })
        }
        ("if", None) => Err(invalid("missing variable name")),
        ("else", None) => Ok(Directive::Else),
        ("endif", None) => Ok(Directive::EndIf),
        _ => Err(invalid("unexpected arguments")),
    }
}

fn parse_var(args: &str) -> Result<Directive, DomainError> {
    let (head, raw_default) = match args.split_once('=') {
        Some((h, d)) => (h, Some(d)),
        None => (args, None),
    };

    let (name, raw_type) = match head.split_once(':') {
        Some((n, t)) => (n.trim(), Some(t.trim()).filter(|t| !t.is_empty())),
        None => (head.trim(), None),
    };

    validate_name(name)?;
    let explicit = raw_type.map(str::parse::<VarType>).transpose()?;

    let default = match (explicit, raw_default) {
        (Some(ty), Some(raw)) => Some(VarValue::parse_as(name, ty, raw)?),
        (None, Some(raw)) => Some(VarValue::infer(raw)),
        (_, None) => None,
    };

    Ok(Directive::Var(VarDirective {
        name: name.to_string(),
        var_type: explicit,
        default,
    }))
}

/// Variable names: `[A-Za-z_][A-Za-z0-9_.-]*`.
pub fn validate_name(name: &str) -> Result<(), DomainError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        _ => false,
    };

    if valid {
        Ok(())
    } else {
        Err(DomainError::InvalidVariableName {
            name: name.to_string(),
        })
    }
}
