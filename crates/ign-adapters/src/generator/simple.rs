//! Directive-substituting generator.
//!
//! Renders `@ign-var:…@` substitutions and `@ign-if@ … @ign-else@ …
//! @ign-endif@` blocks. A control directive that is alone on its line takes
//! the whole line with it, so templates stay readable without leaving blank
//! lines in the output.

use std::{fs, io, path::Path};

use tracing::{debug, instrument, warn};

use ign_core::{
    application::{
        ApplicationError,
        ports::{GenerationRequest, Generator},
    },
    cancel::CancellationToken,
    domain::{
        Directive, FileAction, GenerationReport, IgnoreMatcher, ProjectVariables,
        RegexDirectiveExtractor,
    },
    error::IgnResult,
};

use crate::walker::{self, WalkOptions, is_binary_path};

/// Generator over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleGenerator {
    extractor: RegexDirectiveExtractor,
}

impl SimpleGenerator {
    /// Create a new simple generator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Render one text file.
    pub fn render(&self, content: &str, values: &ProjectVariables) -> Result<String, String> {
        let located = self.extractor.locate(content).map_err(|e| e.to_string())?;

        let mut out = String::with_capacity(content.len());
        let mut frames: Vec<Frame> = Vec::new();
        let mut active = true;
        let mut cursor = 0;

        for (range, directive) in located {
            let span = match directive {
                Directive::Var(_) => range,
                _ => whole_line(content, range, cursor),
            };

            if active {
                out.push_str(&content[cursor..span.start]);
            }
            cursor = span.end;

            match directive {
                Directive::Var(var) => {
                    if !active {
                        continue;
                    }
                    match values.get(&var.name).or(var.default.as_ref()) {
                        Some(value) => out.push_str(&value.to_string()),
                        None => return Err(format!("no value for variable '{}'", var.name)),
                    }
                }
                Directive::If { name } => {
                    let condition = values.get(&name).is_some_and(|v| v.is_truthy());
                    frames.push(Frame {
                        parent_active: active,
                        condition,
                        in_else: false,
                    });
                    active = active && condition;
                }
                Directive::Else => {
                    let frame = frames
                        .last_mut()
                        .filter(|f| !f.in_else)
                        .ok_or_else(|| "@ign-else@ without matching @ign-if@".to_string())?;
                    frame.in_else = true;
                    active = frame.parent_active && !frame.condition;
                }
                Directive::EndIf => {
                    let frame = frames
                        .pop()
                        .ok_or_else(|| "@ign-endif@ without matching @ign-if@".to_string())?;
                    active = frame.parent_active;
                }
            }
        }

        if !frames.is_empty() {
            return Err(format!("{} unclosed @ign-if@ block(s)", frames.len()));
        }
        if active {
            out.push_str(&content[cursor..]);
        }
        Ok(out)
    }

    fn render_bytes(
        &self,
        relative: &str,
        bytes: Vec<u8>,
        values: &ProjectVariables,
    ) -> Result<Vec<u8>, String> {
        if is_binary_path(relative) {
            return Ok(bytes);
        }
        match String::from_utf8(bytes) {
            Ok(text) => self.render(&text, values).map(String::into_bytes),
            Err(e) => Ok(e.into_bytes()),
        }
    }
}

struct Frame {
    parent_active: bool,
    condition: bool,
    in_else: bool,
}

/// Widen a control directive's span to its whole line when nothing else
/// shares the line.
fn whole_line(content: &str, range: std::ops::Range<usize>, cursor: usize) -> std::ops::Range<usize> {
    let line_start = content[..range.start].rfind('\n').map_or(0, |i| i + 1);
    let line_end = content[range.end..]
        .find('\n')
        .map_or(content.len(), |i| range.end + i + 1);

    let before = &content[line_start..range.start];
    let after = content[range.end..line_end].trim_end_matches(['\n', '\r']);

    if line_start >= cursor && before.trim().is_empty() && after.trim().is_empty() {
        line_start..line_end
    } else {
        range
    }
}

impl Generator for SimpleGenerator {
    #[instrument(
        skip_all,
        fields(
            template = %request.template_root.display(),
            output = %request.output_dir.display(),
            dry_run = request.dry_run
        )
    )]
    fn generate(&self, request: &GenerationRequest) -> IgnResult<GenerationReport> {
        let ignore = IgnoreMatcher::new(&request.ignore);
        let files = walker::walk(
            &request.template_root,
            &ignore,
            WalkOptions::default(),
            &CancellationToken::new(),
        )
        .map_err(|e| ApplicationError::GenerationFailed {
            reason: e.to_string(),
        })?;

        let mut report = if request.dry_run {
            GenerationReport::dry_run()
        } else {
            GenerationReport::default()
        };

        for file in files {
            let rendered = fs::read(&file.absolute)
                .map_err(|e| e.to_string())
                .and_then(|bytes| self.render_bytes(&file.relative, bytes, &request.values));

            let content = match rendered {
                Ok(content) => content,
                Err(reason) => {
                    warn!(path = %file.relative, %reason, "File not generated");
                    report.record_error(&file.relative, reason);
                    continue;
                }
            };

            let target = request.output_dir.join(&file.relative);
            let action = FileAction::decide(target.exists(), request.overwrite);

            if request.dry_run || action == FileAction::Skip {
                report.record(&file.relative, action);
                continue;
            }

            match write_file(&file.absolute, &target, &content) {
                Ok(()) => {
                    debug!(path = %file.relative, ?action, "Generated");
                    report.record(&file.relative, action);
                }
                Err(e) => {
                    warn!(path = %file.relative, error = %e, "File not generated");
                    report.record_error(&file.relative, e.to_string());
                }
            }
        }

        Ok(report)
    }
}

fn write_file(source: &Path, target: &Path, content: &[u8]) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = fs::metadata(source)?.permissions().mode();
        if mode & 0o111 != 0 {
            let mut perms = fs::metadata(target)?.permissions();
            perms.set_mode(perms.mode() | (mode & 0o111));
            fs::set_permissions(target, perms)?;
        }
    }
    #[cfg(not(unix))]
    {
        let _ = source;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ign_core::domain::VarValue;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn values(pairs: &[(&str, VarValue)]) -> ProjectVariables {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn render(content: &str, vals: &ProjectVariables) -> Result<String, String> {
        SimpleGenerator::new().render(content, vals)
    }

    // ── rendering ─────────────────────────────────────────────────────────

    #[test]
    fn substitutes_values_and_defaults() {
        let vals = values(&[("name", VarValue::from("svc"))]);
        assert_eq!(
            render("app @ign-var:name@ on @ign-var:port:int=8080@", &vals).unwrap(),
            "app svc on 8080"
        );
    }

    #[test]
    fn missing_value_without_default_is_an_error() {
        let err = render("@ign-var:name@", &ProjectVariables::new()).unwrap_err();
        assert!(err.contains("name"));
    }

    #[test]
    fn conditional_blocks_consume_their_lines() {
        let template = "a\n@ign-if:docker@\nFROM scratch\n@ign-else@\n# no docker\n@ign-endif@\nz\n";
        let on = values(&[("docker", VarValue::Bool(true))]);
        let off = values(&[("docker", VarValue::Bool(false))]);
        assert_eq!(render(template, &on).unwrap(), "a\nFROM scratch\nz\n");
        assert_eq!(render(template, &off).unwrap(), "a\n# no docker\nz\n");
    }

    #[test]
    fn inline_conditionals_keep_surrounding_text() {
        let vals = values(&[("x", VarValue::Bool(true))]);
        assert_eq!(
            render("[@ign-if:x@yes@ign-else@no@ign-endif@]", &vals).unwrap(),
            "[yes]"
        );
    }

    #[test]
    fn nested_blocks() {
        let template = "@ign-if:a@A@ign-if:b@B@ign-endif@@ign-endif@.";
        let vals = values(&[("a", VarValue::Bool(true)), ("b", VarValue::Bool(false))]);
        assert_eq!(render(template, &vals).unwrap(), "A.");
        let vals = values(&[("a", VarValue::Bool(false)), ("b", VarValue::Bool(true))]);
        assert_eq!(render(template, &vals).unwrap(), ".");
    }

    #[test]
    fn skipped_blocks_do_not_need_values() {
        let vals = values(&[("x", VarValue::Bool(false))]);
        assert_eq!(
            render("@ign-if:x@@ign-var:undefined@@ign-endif@ok", &vals).unwrap(),
            "ok"
        );
    }

    #[test]
    fn unbalanced_blocks_are_errors() {
        let vals = values(&[("x", VarValue::Bool(true))]);
        assert!(render("@ign-if:x@open", &vals).is_err());
        assert!(render("@ign-endif@", &vals).is_err());
        assert!(render("@ign-if:x@@ign-else@@ign-else@@ign-endif@", &vals).is_err());
    }

    // ── generation ────────────────────────────────────────────────────────

    fn setup() -> (TempDir, TempDir) {
        let tpl = TempDir::new().unwrap();
        fs::write(tpl.path().join("ign.json"), "{}").unwrap();
        fs::write(tpl.path().join("README.md"), "# @ign-var:name@\n").unwrap();
        fs::create_dir_all(tpl.path().join("src")).unwrap();
        fs::write(tpl.path().join("src/bad.txt"), "@ign-var:missing@").unwrap();
        fs::write(tpl.path().join("logo.png"), [0x89, b'P', b'N', b'G', 0xff]).unwrap();
        (tpl, TempDir::new().unwrap())
    }

    fn request(tpl: &Path, out: &Path, overwrite: bool, dry_run: bool) -> GenerationRequest {
        GenerationRequest {
            template_root: tpl.to_path_buf(),
            ignore: vec![],
            values: values(&[("name", VarValue::from("svc"))]),
            output_dir: PathBuf::from(out),
            overwrite,
            dry_run,
        }
    }

    #[test]
    fn generates_files_and_collects_per_file_errors() {
        let (tpl, out) = setup();
        let report = SimpleGenerator::new()
            .generate(&request(tpl.path(), out.path(), false, false))
            .unwrap();

        assert_eq!(report.created, vec!["README.md", "logo.png"]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].path, "src/bad.txt");
        assert_eq!(
            fs::read_to_string(out.path().join("README.md")).unwrap(),
            "# svc\n"
        );
        assert_eq!(
            fs::read(out.path().join("logo.png")).unwrap(),
            vec![0x89, b'P', b'N', b'G', 0xff]
        );
        assert!(!out.path().join("ign.json").exists());
    }

    #[test]
    fn existing_files_are_skipped_unless_overwriting() {
        let (tpl, out) = setup();
        fs::write(out.path().join("README.md"), "mine").unwrap();
        let generator = SimpleGenerator::new();

        let report = generator
            .generate(&request(tpl.path(), out.path(), false, false))
            .unwrap();
        assert_eq!(report.skipped, vec!["README.md"]);
        assert_eq!(fs::read_to_string(out.path().join("README.md")).unwrap(), "mine");

        let report = generator
            .generate(&request(tpl.path(), out.path(), true, false))
            .unwrap();
        assert!(report.overwritten.contains(&"README.md".to_string()));
        assert_eq!(
            fs::read_to_string(out.path().join("README.md")).unwrap(),
            "# svc\n"
        );
    }

    #[test]
    fn dry_run_writes_nothing() {
        let (tpl, out) = setup();
        let report = SimpleGenerator::new()
            .generate(&request(tpl.path(), out.path(), false, true))
            .unwrap();
        assert!(report.dry_run);
        assert_eq!(report.preview.len(), 2);
        assert!(report.created.is_empty());
        assert!(!out.path().join("README.md").exists());
    }
}
