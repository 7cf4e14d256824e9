//! TypeScript source file discovery.
//!
//! Recursively walks directories to collect `.ts`, `.tsx`, `.mts` and `.cts`
//! files. By default hidden entries and `node_modules` are skipped; further
//! entries can be excluded with glob patterns matched against either the
//! entry name or its full path.

use anyhow::{Context, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

const EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts"];

/// Collects TypeScript files under `paths`, sorted.
pub fn collect_source_files(
    paths: &[PathBuf],
    exclude: &[String],
    default_excludes: bool,
) -> Result<Vec<PathBuf>> {
    let patterns = exclude
        .iter()
        .map(|p| Pattern::new(p).with_context(|| format!("Invalid exclude pattern '{}'", p)))
        .collect::<Result<Vec<_>>>()?;

    let mut files = Vec::new();
    for path in paths {
        let walker = WalkDir::new(path)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e, &patterns, default_excludes));

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            if entry.file_type().is_file() && is_source_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    Ok(files)
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

fn is_excluded(entry: &DirEntry, patterns: &[Pattern], default_excludes: bool) -> bool {
    let name = entry.file_name().to_str().unwrap_or_default();
    if default_excludes && (name.starts_with('.') || name == "node_modules") {
        return true;
    }
    patterns
        .iter()
        .any(|p| p.matches(name) || p.matches_path(entry.path()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    fn relative(root: &Path, files: Vec<PathBuf>) -> Vec<String> {
        files
            .into_iter()
            .map(|f| {
                f.strip_prefix(root)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        touch(root, "src/a.ts");
        touch(root, "src/b.tsx");
        touch(root, "src/types.d.ts");
        touch(root, "src/esm.mts");
        touch(root, "src/cjs.cts");
        touch(root, "src/readme.md");
        touch(root, "src/script.js");
        touch(root, "src/nested/deep/c.ts");
        touch(root, "src/node_modules/pkg/index.ts");
        touch(root, "src/.cache/d.ts");
        touch(root, "src/generated/e.ts");
        dir
    }

    #[test]
    fn collects_typescript_files_only() {
        let dir = fixture();
        let files = collect_source_files(&[dir.path().join("src")], &[], true).unwrap();
        assert_eq!(
            relative(dir.path(), files),
            vec![
                "src/a.ts",
                "src/b.tsx",
                "src/cjs.cts",
                "src/esm.mts",
                "src/generated/e.ts",
                "src/nested/deep/c.ts",
                "src/types.d.ts",
            ]
        );
    }

    #[test]
    fn exclude_patterns_match_names() {
        let dir = fixture();
        let files = collect_source_files(
            &[dir.path().join("src")],
            &["generated".to_string(), "*.d.ts".to_string()],
            true,
        )
        .unwrap();
        let rel = relative(dir.path(), files);
        assert!(!rel.iter().any(|f| f.contains("generated")));
        assert!(!rel.iter().any(|f| f.ends_with(".d.ts")));
        assert!(rel.contains(&"src/a.ts".to_string()));
    }

    #[test]
    fn default_excludes_can_be_disabled() {
        let dir = fixture();
        let files = collect_source_files(&[dir.path().join("src")], &[], false).unwrap();
        let rel = relative(dir.path(), files);
        assert!(rel.contains(&"src/node_modules/pkg/index.ts".to_string()));
        assert!(rel.contains(&"src/.cache/d.ts".to_string()));
    }

    #[test]
    fn hidden_root_is_still_walked() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), ".work/a.ts");
        let files = collect_source_files(&[dir.path().join(".work")], &[], true).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let dir = fixture();
        let err = collect_source_files(&[dir.path().to_path_buf()], &["[".to_string()], true)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid exclude pattern"));
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(collect_source_files(&[dir.path().join("absent")], &[], true).is_err());
    }
}
