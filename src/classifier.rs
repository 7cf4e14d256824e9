//! Usage classification: promote value imports that are only used as types.
//!
//! Every candidate specifier is marked type-only in one batch, a single
//! diagnostics pass is run against the mutated model, and candidates the
//! diagnostics show to be used as values are reverted. One checker run covers
//! all candidates instead of one run per specifier.

use crate::checker::TypeChecker;
use crate::error::Result;
use crate::model::SourceModel;
use std::collections::HashSet;
use tracing::debug;

/// Position of a named specifier: (declaration index, specifier index).
type Candidate = (usize, usize);

/// Promotes named value imports that are only referenced in type positions.
///
/// Returns `true` if at least one specifier stayed promoted. Diagnostics that
/// cannot be traced back to an import binding are ignored, so such a binding
/// keeps its promotion. If the checker fails, all speculative flags are
/// reverted before the error is returned.
pub fn promote_type_only_usages(
    model: &mut SourceModel,
    checker: &dyn TypeChecker,
) -> Result<bool> {
    let candidates = collect_candidates(model);
    if candidates.is_empty() {
        return Ok(false);
    }

    for &candidate in &candidates {
        set_flag(model, candidate, true);
    }

    let diagnostics = match checker.pre_emit_diagnostics(model) {
        Ok(diagnostics) => diagnostics,
        Err(e) => {
            for &candidate in &candidates {
                set_flag(model, candidate, false);
            }
            return Err(e);
        }
    };

    let mut revert: HashSet<String> = HashSet::new();
    for diagnostic in diagnostics {
        if !diagnostic.category.reverts_promotion() || diagnostic.file != model.path() {
            continue;
        }
        let Some(start) = diagnostic.start else {
            continue;
        };
        let Some(ident) = model.identifier_at(start) else {
            debug!(offset = start, "diagnostic does not point at an identifier");
            continue;
        };

        let bindings = model.resolve_import_bindings(ident);
        match bindings.len() {
            0 => debug!(ident, "diagnostic does not resolve to an import"),
            1 => {}
            n => debug!(ident, bindings = n, "ambiguous import binding, reverting all"),
        }
        revert.extend(bindings.iter().map(|spec| spec.local_name().to_string()));
    }

    let mut changed = false;
    for &candidate in &candidates {
        let (decl, spec) = candidate;
        let local = model.imports()[decl].named_imports()[spec].local_name();
        if revert.contains(local) {
            set_flag(model, candidate, false);
        } else {
            debug!(
                binding = local,
                module = model.imports()[decl].module_specifier(),
                "promoted to type-only"
            );
            changed = true;
        }
    }

    Ok(changed)
}

/// Named specifiers that are neither type-only themselves nor inside an
/// `import type` declaration.
fn collect_candidates(model: &SourceModel) -> Vec<Candidate> {
    model
        .imports()
        .iter()
        .enumerate()
        .filter(|(_, decl)| !decl.is_type_only())
        .flat_map(|(d, decl)| {
            decl.named_imports()
                .iter()
                .enumerate()
                .filter(|(_, spec)| !spec.is_type_only())
                .map(move |(s, _)| (d, s))
        })
        .collect()
}

fn set_flag(model: &mut SourceModel, (decl, spec): Candidate, type_only: bool) {
    model.imports_mut()[decl].named_imports_mut()[spec].set_type_only(type_only);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::{Diagnostic, DiagnosticCategory, LocalChecker};
    use crate::error::Error;
    use std::path::PathBuf;

    /// Reports a fixed diagnostic for every occurrence of each listed name
    /// after the import block.
    struct Scripted(Vec<(&'static str, DiagnosticCategory)>);

    impl TypeChecker for Scripted {
        fn pre_emit_diagnostics(&self, model: &SourceModel) -> Result<Vec<Diagnostic>> {
            let text = model.original_text();
            let body = text.rfind("from").unwrap_or(0);
            Ok(self
                .0
                .iter()
                .filter_map(|(name, category)| {
                    text[body..].find(name).map(|at| Diagnostic {
                        category: *category,
                        file: model.path().to_path_buf(),
                        start: Some(body + at),
                        message: String::new(),
                    })
                })
                .collect())
        }
    }

    struct Failing;

    impl TypeChecker for Failing {
        fn pre_emit_diagnostics(&self, _: &SourceModel) -> Result<Vec<Diagnostic>> {
            Err(Error::Checker("backend unavailable".into()))
        }
    }

    fn flags(model: &SourceModel) -> Vec<(String, bool)> {
        model
            .imports()
            .iter()
            .flat_map(|d| d.named_imports())
            .map(|s| (s.local_name().to_string(), s.is_type_only()))
            .collect()
    }

    fn parse(source: &str) -> SourceModel {
        SourceModel::parse("test.ts", source).unwrap()
    }

    #[test]
    fn promotes_bindings_used_only_in_type_positions() {
        let mut model = parse(
            r#"import { Config, load } from "./config";
export function start(c: Config) { return load(c); }
"#,
        );
        let changed = promote_type_only_usages(&mut model, &LocalChecker).unwrap();
        assert!(changed);
        assert_eq!(
            flags(&model),
            vec![("Config".to_string(), true), ("load".to_string(), false)]
        );
    }

    #[test]
    fn no_candidates_is_a_no_op() {
        let mut model = parse(
            "import type { A } from \"./a\";\nimport { type B } from \"./b\";\nlet x: A | B;\n",
        );
        assert!(!promote_type_only_usages(&mut model, &LocalChecker).unwrap());
        assert!(!model.is_modified());
    }

    #[test]
    fn all_value_uses_revert_to_the_original_text() {
        let source = "import { a, b } from \"./m\";\na(b);\n";
        let mut model = parse(source);
        assert!(!promote_type_only_usages(&mut model, &LocalChecker).unwrap());
        assert_eq!(model.to_text(), source);
    }

    #[test]
    fn default_and_namespace_bindings_are_never_candidates() {
        let mut model = parse(
            "import D, { T } from \"./m\";\nimport * as ns from \"./n\";\nlet x: T;\n",
        );
        assert!(promote_type_only_usages(&mut model, &LocalChecker).unwrap());
        let decl = &model.imports()[0];
        assert!(!decl.is_type_only());
        assert_eq!(flags(&model), vec![("T".to_string(), true)]);
    }

    #[test]
    fn both_diagnostic_categories_revert() {
        let mut model = parse("import { A, B, C } from \"./m\";\nuse(A, B, C);\n");
        let checker = Scripted(vec![
            ("A", DiagnosticCategory::TypeOnlyImportUsedAsValue),
            ("B", DiagnosticCategory::ValueUsedAsType),
            ("C", DiagnosticCategory::Other(2322)),
        ]);
        assert!(promote_type_only_usages(&mut model, &checker).unwrap());
        assert_eq!(
            flags(&model),
            vec![
                ("A".to_string(), false),
                ("B".to_string(), false),
                ("C".to_string(), true),
            ]
        );
    }

    #[test]
    fn unresolvable_diagnostics_are_ignored() {
        let mut model = parse("import { A } from \"./m\";\nlocalThing(A);\n");
        let checker = Scripted(vec![(
            "localThing",
            DiagnosticCategory::TypeOnlyImportUsedAsValue,
        )]);
        assert!(promote_type_only_usages(&mut model, &checker).unwrap());
        assert_eq!(flags(&model), vec![("A".to_string(), true)]);
    }

    #[test]
    fn diagnostics_from_other_files_are_ignored() {
        struct Elsewhere;
        impl TypeChecker for Elsewhere {
            fn pre_emit_diagnostics(&self, model: &SourceModel) -> Result<Vec<Diagnostic>> {
                Ok(vec![Diagnostic {
                    category: DiagnosticCategory::TypeOnlyImportUsedAsValue,
                    file: PathBuf::from("other.ts"),
                    start: model.original_text().rfind('A'),
                    message: String::new(),
                }])
            }
        }

        let mut model = parse("import { A } from \"./m\";\nA();\n");
        assert!(promote_type_only_usages(&mut model, &Elsewhere).unwrap());
    }

    #[test]
    fn aliased_bindings_revert_by_local_name() {
        let mut model = parse(
            "import { A as First } from \"./one\";\nimport { A as Second } from \"./two\";\nFirst();\nlet s: Second;\n",
        );
        assert!(promote_type_only_usages(&mut model, &LocalChecker).unwrap());
        assert_eq!(
            flags(&model),
            vec![("First".to_string(), false), ("Second".to_string(), true)]
        );
    }

    #[test]
    fn ambiguous_binding_reverts_every_match() {
        let mut model = parse(
            "import { X, T } from \"./a\";\nimport { X } from \"./b\";\nX();\nlet t: T;\n",
        );
        let checker = Scripted(vec![("X", DiagnosticCategory::TypeOnlyImportUsedAsValue)]);
        assert!(promote_type_only_usages(&mut model, &checker).unwrap());
        assert_eq!(
            flags(&model),
            vec![
                ("X".to_string(), false),
                ("T".to_string(), true),
                ("X".to_string(), false),
            ]
        );
    }

    #[test]
    fn checker_failure_restores_flags() {
        let source = "import { A } from \"./m\";\nlet a: A;\n";
        let mut model = parse(source);
        let err = promote_type_only_usages(&mut model, &Failing).unwrap_err();
        assert!(matches!(err, Error::Checker(_)));
        assert!(!model.is_modified());
        assert_eq!(model.to_text(), source);
    }
}
