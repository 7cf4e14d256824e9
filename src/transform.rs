//! Single-file transform: usage classification followed by normalization.

use crate::checker::TypeChecker;
use crate::classifier;
use crate::error::Result;
use crate::model::SourceModel;
use crate::rewriter;
use std::path::Path;
use tracing::debug;

/// Result of transforming one file's text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    pub text: String,
    pub changed: bool,
}

/// Runs the classifier (when a checker is given) and then the rewriter over
/// `model`. Returns `true` if either phase changed anything.
pub fn apply_transforms(model: &mut SourceModel, checker: Option<&dyn TypeChecker>) -> Result<bool> {
    let promoted = match checker {
        Some(checker) => classifier::promote_type_only_usages(model, checker)?,
        None => false,
    };
    let normalized = rewriter::normalize_imports(model);

    debug!(
        path = %model.path().display(),
        promoted,
        normalized,
        "transformed imports"
    );
    Ok(promoted || normalized)
}

/// Parses, transforms and serializes `text`.
pub fn transform_source(
    path: &Path,
    text: &str,
    checker: Option<&dyn TypeChecker>,
) -> Result<Transformed> {
    let mut model = SourceModel::parse(path, text)?;
    let changed = apply_transforms(&mut model, checker)?;
    let text = if changed {
        model.to_text()
    } else {
        text.to_string()
    };
    Ok(Transformed { text, changed })
}

/// In-memory entry point for formatter integration.
///
/// Works without any project context, so usage checking is always skipped
/// and only explicit `type` markers are acted on.
pub fn organize_imports(code: &str, path: &Path) -> Result<String> {
    transform_source(path, code, None).map(|t| t.text)
}
