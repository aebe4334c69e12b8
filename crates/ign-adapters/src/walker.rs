//! Deterministic template tree walk shared by the hasher, scanner and
//! generator.
//!
//! # Walk policy
//!
//! ```text
//! .git/ (any depth), ign.json (root)  → always excluded
//! ignore-pattern match                → excluded; directories pruned
//! symlink → directory                 → followed
//! symlink → file                      → included
//! dangling symlink                    → skipped silently
//! symlink loop                        → skipped with a warning
//! device / socket / fifo              → skipped silently
//! any other I/O error                 → fatal
//! ```

use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, trace, warn};
use walkdir::WalkDir;

use ign_core::{
    application::ApplicationError, cancel::CancellationToken, domain::IgnoreMatcher,
    error::IgnError,
};

/// Extensions treated as binary: never scanned for directives, copied
/// verbatim by the generator.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "7z", "a", "avi", "bin", "bmp", "bz2", "class", "db", "dll", "dylib", "eot", "exe", "flac",
    "gif", "gz", "ico", "jar", "jpeg", "jpg", "mkv", "mov", "mp3", "mp4", "o", "obj", "ogg",
    "otf", "pdf", "png", "pyc", "rar", "so", "sqlite", "tar", "tgz", "tiff", "ttf", "war", "wasm",
    "wav", "webp", "woff", "woff2", "xz", "zip",
];

pub fn is_binary_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            BINARY_EXTENSIONS.contains(&ext.as_str())
        })
}

#[derive(Debug, Error)]
pub enum WalkError {
    #[error("walk cancelled")]
    Cancelled,

    #[error("{}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl WalkError {
    /// Map into a core error, wrapping I/O failures with `wrap`.
    pub fn into_ign(self, wrap: impl FnOnce(PathBuf, String) -> ApplicationError) -> IgnError {
        match self {
            Self::Cancelled => ApplicationError::Cancelled.into(),
            Self::Io { path, source } => wrap(path, source.to_string()).into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions {
    /// Leave out files listed in [`BINARY_EXTENSIONS`].
    pub skip_binary: bool,
}

/// A regular file found by the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Relative to the walk root, `/`-separated.
    pub relative: String,
    pub absolute: PathBuf,
}

/// Every included regular file under `root`, sorted byte-wise by relative
/// path.
pub fn walk(
    root: &Path,
    ignore: &IgnoreMatcher,
    options: WalkOptions,
    cancel: &CancellationToken,
) -> Result<Vec<WalkedFile>, WalkError> {
    let mut files = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| match relative_of(root, e.path()) {
            Some(rel) if !rel.is_empty() => !ignore.excludes(&rel),
            _ => true,
        });

    for entry in walker {
        if cancel.is_cancelled() {
            return Err(WalkError::Cancelled);
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                if let Some(ancestor) = err.loop_ancestor() {
                    warn!(
                        path = %err.path().unwrap_or(root).display(),
                        ancestor = %ancestor.display(),
                        "Skipping symlink loop"
                    );
                    continue;
                }
                if is_dangling_symlink(&err) {
                    debug!(path = %err.path().unwrap_or(root).display(), "Skipping dangling symlink");
                    continue;
                }
                let path = err.path().unwrap_or(root).to_path_buf();
                let source = err
                    .into_io_error()
                    .unwrap_or_else(|| io::Error::other("directory walk error"));
                return Err(WalkError::Io { path, source });
            }
        };

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(relative) = relative_of(root, entry.path()) else {
            continue;
        };

        if options.skip_binary && is_binary_path(&relative) {
            trace!(path = %relative, "Skipping binary file");
            continue;
        }

        files.push(WalkedFile {
            relative,
            absolute: entry.into_path(),
        });
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    debug!(root = %root.display(), files = files.len(), "Walk finished");
    Ok(files)
}

fn relative_of(root: &Path, path: &Path) -> Option<String> {
    path.strip_prefix(root)
        .ok()
        .map(|rel| normalize_path(&rel.to_string_lossy()))
}

/// The target of a followed link is missing.
fn is_dangling_symlink(err: &walkdir::Error) -> bool {
    let not_found = err
        .io_error()
        .is_some_and(|e| e.kind() == io::ErrorKind::NotFound);
    not_found
        && err
            .path()
            .and_then(|p| p.symlink_metadata().ok())
            .is_some_and(|m| m.file_type().is_symlink())
}

/// Normalise a filesystem path to forward slashes so Windows and Unix paths
/// compare identically.
pub(crate) fn normalize_path(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ── helpers ───────────────────────────────────────────────────────────

    fn make_tree(files: &[(&str, &str)]) -> TempDir {
        let temp = TempDir::new().unwrap();
        for (rel_path, content) in files {
            let full = temp.path().join(rel_path);
            if let Some(parent) = full.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(full, content).unwrap();
        }
        temp
    }

    fn relatives(files: &[WalkedFile]) -> Vec<&str> {
        files.iter().map(|f| f.relative.as_str()).collect()
    }

    fn walk_all(root: &Path, ignore: &IgnoreMatcher) -> Vec<WalkedFile> {
        walk(root, ignore, WalkOptions::default(), &CancellationToken::new()).unwrap()
    }

    // ── exclusion ─────────────────────────────────────────────────────────

    #[test]
    fn reserved_entries_are_excluded() {
        let tree = make_tree(&[
            ("ign.json", "{}"),
            (".git/HEAD", "ref"),
            ("sub/ign.json", "{}"),
            ("a.txt", "a"),
        ]);
        let files = walk_all(tree.path(), &IgnoreMatcher::empty());
        assert_eq!(relatives(&files), vec!["a.txt", "sub/ign.json"]);
    }

    #[test]
    fn ignored_directories_are_pruned() {
        let tree = make_tree(&[
            ("a/node_modules/b/c.js", "x"),
            ("a/index.js", "y"),
            ("debug.log", "z"),
        ]);
        let ignore = IgnoreMatcher::new(["node_modules", "*.log"]);
        assert_eq!(relatives(&walk_all(tree.path(), &ignore)), vec!["a/index.js"]);
    }

    #[test]
    fn results_are_sorted_bytewise() {
        let tree = make_tree(&[("b.txt", ""), ("B.txt", ""), ("a/z.txt", ""), ("a.txt", "")]);
        assert_eq!(
            relatives(&walk_all(tree.path(), &IgnoreMatcher::empty())),
            vec!["B.txt", "a.txt", "a/z.txt", "b.txt"]
        );
    }

    #[test]
    fn binary_files_skipped_on_request() {
        let tree = make_tree(&[("logo.PNG", "x"), ("main.go", "y")]);
        let files = walk(
            tree.path(),
            &IgnoreMatcher::empty(),
            WalkOptions { skip_binary: true },
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(relatives(&files), vec!["main.go"]);
    }

    #[test]
    fn cancelled_walk_fails() {
        let tree = make_tree(&[("a.txt", "a")]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = walk(tree.path(), &IgnoreMatcher::empty(), WalkOptions::default(), &cancel)
            .unwrap_err();
        assert!(matches!(err, WalkError::Cancelled));
    }

    // ── symlinks ──────────────────────────────────────────────────────────

    #[cfg(unix)]
    #[test]
    fn dangling_symlinks_are_skipped() {
        let tree = make_tree(&[("a.txt", "a")]);
        std::os::unix::fs::symlink(tree.path().join("missing"), tree.path().join("broken"))
            .unwrap();
        assert_eq!(
            relatives(&walk_all(tree.path(), &IgnoreMatcher::empty())),
            vec!["a.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_followed_and_loops_skipped() {
        let tree = make_tree(&[("real/f.txt", "f")]);
        std::os::unix::fs::symlink(tree.path().join("real"), tree.path().join("link")).unwrap();
        std::os::unix::fs::symlink(tree.path(), tree.path().join("real/loop")).unwrap();
        let files = walk_all(tree.path(), &IgnoreMatcher::empty());
        let rels = relatives(&files);
        assert!(rels.contains(&"link/f.txt"));
        assert!(rels.contains(&"real/f.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_included() {
        let tree = make_tree(&[("real.txt", "r")]);
        std::os::unix::fs::symlink(tree.path().join("real.txt"), tree.path().join("link.txt"))
            .unwrap();
        let files = walk_all(tree.path(), &IgnoreMatcher::empty());
        assert_eq!(relatives(&files), vec!["link.txt", "real.txt"]);
        assert_eq!(fs::read(&files[0].absolute).unwrap(), b"r");
    }

    #[cfg(unix)]
    #[test]
    fn pipes_and_sockets_are_skipped() {
        let tree = make_tree(&[("a.txt", "a")]);
        let status = std::process::Command::new("mkfifo")
            .arg(tree.path().join("pipe"))
            .status()
            .unwrap();
        assert!(status.success());
        let _listener =
            std::os::unix::net::UnixListener::bind(tree.path().join("sock")).unwrap();

        assert_eq!(
            relatives(&walk_all(tree.path(), &IgnoreMatcher::empty())),
            vec!["a.txt"]
        );
    }

    #[test]
    fn binary_detection_is_case_insensitive() {
        assert!(is_binary_path("img/Logo.JPG"));
        assert!(!is_binary_path("Makefile"));
        assert!(!is_binary_path("src/main.rs"));
    }
}
