//! Turning `--var` flags and terminal answers into typed variable values.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use ign_core::domain::{ProjectVariables, VarValue, VariableDeclaration};

use crate::error::CliResult;

/// Parse `--var` assignments against the template's declarations.
///
/// Values are parsed as the declared type.  Names the template does not
/// declare are dropped and returned so the caller can warn about them.
pub fn parse_supplied(
    vars: &[(String, String)],
    declarations: &BTreeMap<String, VariableDeclaration>,
) -> CliResult<(ProjectVariables, Vec<String>)> {
    let mut values = ProjectVariables::new();
    let mut undeclared = Vec::new();

    for (name, raw) in vars {
        match declarations.get(name) {
            Some(decl) => {
                let value = VarValue::parse_as(name, decl.var_type(), raw)?;
                values.insert(name.clone(), value);
            }
            None => {
                warn!(%name, "Ignoring --var for an undeclared variable");
                undeclared.push(name.clone());
            }
        }
    }
    Ok((values, undeclared))
}

/// Ask for every prompt-worthy declaration still missing from `supplied`.
///
/// Does nothing unless `interactive` is set and stdin is a terminal; the
/// service then reports whatever is still unresolved.
pub fn fill_missing(
    prompts: Vec<&VariableDeclaration>,
    supplied: &mut ProjectVariables,
    interactive: bool,
) -> CliResult<()> {
    let pending: Vec<&VariableDeclaration> = prompts
        .into_iter()
        .filter(|d| !supplied.contains_key(&d.name))
        .collect();

    if pending.is_empty() {
        return Ok(());
    }
    if !interactive || !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        debug!(pending = pending.len(), "Not prompting");
        return Ok(());
    }

    #[cfg(feature = "interactive")]
    {
        for decl in pending {
            let value = interactive::ask(decl)?;
            supplied.insert(decl.name.clone(), value);
        }
    }

    #[cfg(not(feature = "interactive"))]
    {
        debug!(pending = pending.len(), "Built without the interactive feature");
    }

    Ok(())
}

#[cfg(feature = "interactive")]
mod interactive {
    use std::io;

    use dialoguer::{Confirm, Input};
    use ign_core::domain::{VarType, VarValue, VariableDeclaration};

    use crate::error::{CliError, CliResult};

    pub fn ask(decl: &VariableDeclaration) -> CliResult<VarValue> {
        let var_type = decl.var_type();

        if var_type == VarType::Bool {
            let default = decl.default.as_ref().is_some_and(VarValue::is_truthy);
            let answer = Confirm::new()
                .with_prompt(decl.name.as_str())
                .default(default)
                .interact()
                .map_err(map_prompt_error)?;
            return Ok(VarValue::Bool(answer));
        }

        let name = decl.name.clone();
        let mut input = Input::<String>::new()
            .with_prompt(format!("{} ({})", decl.name, var_type))
            .validate_with(move |raw: &String| -> Result<(), String> {
                VarValue::parse_as(&name, var_type, raw)
                    .map(|_| ())
                    .map_err(|e| e.to_string())
            });
        if let Some(default) = &decl.default {
            input = input.default(default.to_string());
        }

        let raw = input.interact_text().map_err(map_prompt_error)?;
        Ok(VarValue::parse_as(&decl.name, var_type, &raw)?)
    }

    fn map_prompt_error(err: dialoguer::Error) -> CliError {
        let err = io::Error::from(err);
        if err.kind() == io::ErrorKind::Interrupted {
            CliError::Cancelled
        } else {
            CliError::IoError {
                message: "failed to read answer".into(),
                source: err,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ign_core::domain::VarType;

    fn declarations() -> BTreeMap<String, VariableDeclaration> {
        let mut decls = BTreeMap::new();
        decls.insert(
            "port".to_string(),
            VariableDeclaration::new("port").with_type(VarType::Int),
        );
        decls.insert(
            "docker".to_string(),
            VariableDeclaration::new("docker").with_type(VarType::Bool),
        );
        decls.insert("name".to_string(), VariableDeclaration::new("name"));
        decls
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn values_parse_as_declared_type() {
        let (values, undeclared) = parse_supplied(
            &pairs(&[("port", "8080"), ("docker", "yes"), ("name", "42")]),
            &declarations(),
        )
        .unwrap();
        assert!(undeclared.is_empty());
        assert_eq!(values["port"], VarValue::Int(8080));
        assert_eq!(values["docker"], VarValue::Bool(true));
        assert_eq!(values["name"], VarValue::String("42".into()));
    }

    #[test]
    fn mistyped_value_is_rejected() {
        assert!(parse_supplied(&pairs(&[("port", "eighty")]), &declarations()).is_err());
    }

    #[test]
    fn undeclared_names_are_reported_not_kept() {
        let (values, undeclared) =
            parse_supplied(&pairs(&[("typo", "x")]), &declarations()).unwrap();
        assert!(values.is_empty());
        assert_eq!(undeclared, vec!["typo"]);
    }

    #[test]
    fn non_interactive_leaves_values_alone() {
        let decls = declarations();
        let mut supplied = ProjectVariables::new();
        fill_missing(decls.values().collect(), &mut supplied, false).unwrap();
        assert!(supplied.is_empty());
    }
}
