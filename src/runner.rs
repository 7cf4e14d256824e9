//! Project-wide driver.
//!
//! Discovers source files under `project_root/source_dir`, skips files whose
//! content hash matches the cache, transforms the rest in parallel, writes
//! changed files back and records the new hashes. Each worker owns its file's
//! model; the cache is only read by workers and is updated on the calling
//! thread once all files are processed.

use crate::cache::{HashCache, content_hash};
use crate::checker::{LocalChecker, TypeChecker};
use crate::scanner;
use crate::transform::transform_source;
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct FixOptions {
    pub project_root: PathBuf,
    /// Directory to search, relative to `project_root`.
    pub source_dir: PathBuf,
    /// Promote imports that are only used as types.
    pub check_usage: bool,
    /// Ignore and do not update the hash cache.
    pub no_cache: bool,
    pub exclude: Vec<String>,
    pub default_excludes: bool,
    /// Report what would change without writing files or the cache.
    pub dry_run: bool,
}

impl FixOptions {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            source_dir: PathBuf::from("src"),
            check_usage: false,
            no_cache: false,
            exclude: Vec::new(),
            default_excludes: true,
            dry_run: false,
        }
    }

    pub fn search_root(&self) -> PathBuf {
        self.project_root.join(&self.source_dir)
    }
}

/// Summary of a run.
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub files_found: usize,
    /// Files rewritten (or that would be, in a dry run).
    pub total_changes: usize,
    /// Files skipped because their hash matched the cache.
    pub skipped_files: usize,
    /// Files that could not be read or parsed.
    pub failed_files: usize,
    pub changed_files: Vec<PathBuf>,
}

#[derive(Debug)]
enum Outcome {
    Cached,
    Unchanged { hash: String },
    Changed { text: String },
    Failed,
}

/// Runs the fixer over a project, writing every changed file.
pub fn fix_type_imports(options: &FixOptions) -> Result<RunSummary> {
    fix_type_imports_with(options, |_| Ok(true))
}

/// Like [`fix_type_imports`], but asks `confirm` before writing each changed
/// file. Declined files are neither written nor cached.
pub fn fix_type_imports_with<F>(options: &FixOptions, mut confirm: F) -> Result<RunSummary>
where
    F: FnMut(&Path) -> Result<bool>,
{
    let search_root = options.search_root();
    info!(
        project_root = %options.project_root.display(),
        source_dir = %options.source_dir.display(),
        check_usage = options.check_usage,
        "searching for source files"
    );

    let files = scanner::collect_source_files(
        &[search_root],
        &options.exclude,
        options.default_excludes,
    )?;
    info!(count = files.len(), "found source files");

    let use_cache = !options.no_cache;
    let mut cache = if use_cache {
        HashCache::load(&options.project_root)
    } else {
        HashCache::default()
    };

    let outcomes: Vec<(PathBuf, String, Outcome)> = {
        let cache = &cache;
        files
            .par_iter()
            .map(|file| {
                let key = cache_key(&options.project_root, file);
                let outcome =
                    process_file(file, &key, use_cache.then_some(cache), options.check_usage);
                (file.clone(), key, outcome)
            })
            .collect()
    };

    let mut summary = RunSummary {
        files_found: files.len(),
        ..Default::default()
    };

    for (file, key, outcome) in outcomes {
        match outcome {
            Outcome::Cached => summary.skipped_files += 1,
            Outcome::Failed => summary.failed_files += 1,
            Outcome::Unchanged { hash } => cache.update(key, hash),
            Outcome::Changed { text } => {
                if options.dry_run {
                    summary.total_changes += 1;
                    summary.changed_files.push(file);
                    continue;
                }
                if !confirm(&file)? {
                    debug!(path = %file.display(), "skipped by user");
                    continue;
                }
                info!(path = %file.display(), "saving changes");
                std::fs::write(&file, &text)
                    .with_context(|| format!("Failed to write {}", file.display()))?;
                cache.update(key, content_hash(&text));
                summary.total_changes += 1;
                summary.changed_files.push(file);
            }
        }
    }

    if use_cache && !options.dry_run {
        cache
            .save(&options.project_root)
            .context("Failed to save cache")?;
    }

    info!(
        changed = summary.total_changes,
        skipped = summary.skipped_files,
        failed = summary.failed_files,
        "run complete"
    );
    Ok(summary)
}

/// Reads and transforms one file. Unreadable and unparsable files are
/// reported as [`Outcome::Failed`] so the rest of the run continues.
fn process_file(
    file: &Path,
    key: &str,
    cache: Option<&HashCache>,
    check_usage: bool,
) -> Outcome {
    let content = match std::fs::read_to_string(file) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %file.display(), error = %e, "failed to read file, skipping");
            return Outcome::Failed;
        }
    };
    let hash = content_hash(&content);

    if cache.is_some_and(|c| c.is_fresh(key, &hash)) {
        debug!(path = %file.display(), "unchanged since last run");
        return Outcome::Cached;
    }

    let local = LocalChecker;
    let checker = check_usage.then_some(&local as &dyn TypeChecker);
    match transform_source(file, &content, checker) {
        Ok(result) if result.changed => Outcome::Changed { text: result.text },
        Ok(_) => Outcome::Unchanged { hash },
        Err(e) => {
            warn!(path = %file.display(), error = %e, "skipping file");
            Outcome::Failed
        }
    }
}

/// Project-relative path with `/` separators.
fn cache_key(project_root: &Path, file: &Path) -> String {
    file.strip_prefix(project_root)
        .unwrap_or(file)
        .to_string_lossy()
        .replace('\\', "/")
}
