//! Pre-emit diagnostics for the usage classifier.
//!
//! The classifier only needs one signal from a type checker: "this binding,
//! now marked type-only, is still used as a value". [`TypeChecker`] is the
//! seam for that signal. [`LocalChecker`] is the built-in backend: it walks
//! the swc AST and reports every value-position reference to a type-only
//! import binding. Other backends (for example a wrapper around `tsc`
//! output) map their diagnostic codes with [`DiagnosticCategory::from_code`].

use crate::error::Result;
use crate::model::SourceModel;
use std::path::PathBuf;
use swc_common::Span;
use swc_ecma_ast::{
    ExportSpecifier, Expr, Ident, ImportDecl, JSXElementName, JSXObject, ModuleExportName,
    NamedExport, Prop, TsEntityName, TsExprWithTypeArgs, TsImportEqualsDecl, TsModuleRef,
};
use swc_ecma_visit::{Visit, VisitWith};

/// TypeScript: "'X' cannot be used as a value because it was imported using 'import type'."
pub const TS_TYPE_ONLY_IMPORT_USED_AS_VALUE: u32 = 1361;
/// TypeScript code the classifier treats as a value being used where a type is expected.
pub const TS_VALUE_USED_AS_TYPE: u32 = 1452;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCategory {
    /// A binding restricted to a type-only import is referenced as a value.
    TypeOnlyImportUsedAsValue,
    /// A value is referenced where a type is expected.
    ValueUsedAsType,
    Other(u32),
}

impl DiagnosticCategory {
    pub fn from_code(code: u32) -> Self {
        match code {
            TS_TYPE_ONLY_IMPORT_USED_AS_VALUE => DiagnosticCategory::TypeOnlyImportUsedAsValue,
            TS_VALUE_USED_AS_TYPE => DiagnosticCategory::ValueUsedAsType,
            other => DiagnosticCategory::Other(other),
        }
    }

    /// Whether a diagnostic of this category means the offending binding
    /// must stay a value import.
    pub fn reverts_promotion(self) -> bool {
        matches!(
            self,
            DiagnosticCategory::TypeOnlyImportUsedAsValue | DiagnosticCategory::ValueUsedAsType
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    /// File the diagnostic was reported in.
    pub file: PathBuf,
    /// Byte offset of the offending node, when known.
    pub start: Option<usize>,
    pub message: String,
}

/// A backend that can report diagnostics for the current state of a model,
/// including flags that have been changed but not yet serialized.
pub trait TypeChecker {
    fn pre_emit_diagnostics(&self, model: &SourceModel) -> Result<Vec<Diagnostic>>;
}

/// Syntactic checker: flags value-position references to type-only imports.
///
/// Resolution is by name within the file, so a local that shadows an import
/// counts as a use of the import.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalChecker;

impl TypeChecker for LocalChecker {
    fn pre_emit_diagnostics(&self, model: &SourceModel) -> Result<Vec<Diagnostic>> {
        let bindings = model.type_only_bindings();
        if bindings.is_empty() {
            return Ok(Vec::new());
        }

        let mut refs = ValueReferences::default();
        model.module().visit_with(&mut refs);

        Ok(refs
            .found
            .into_iter()
            .filter(|(name, _)| bindings.contains(name.as_str()))
            .map(|(name, span)| Diagnostic {
                category: DiagnosticCategory::TypeOnlyImportUsedAsValue,
                file: model.path().to_path_buf(),
                start: Some(model.span_range(span).start),
                message: format!(
                    "'{}' cannot be used as a value because it was imported using 'import type'",
                    name
                ),
            })
            .collect())
    }
}

/// Collects identifiers referenced in value positions.
#[derive(Debug, Default)]
struct ValueReferences {
    found: Vec<(String, Span)>,
}

impl ValueReferences {
    fn record(&mut self, ident: &Ident) {
        self.found.push((ident.sym.to_string(), ident.span));
    }
}

impl Visit for ValueReferences {
    // Import bindings are declarations, not references.
    fn visit_import_decl(&mut self, _: &ImportDecl) {}

    fn visit_expr(&mut self, n: &Expr) {
        match n {
            Expr::Ident(ident) => self.record(ident),
            _ => n.visit_children_with(self),
        }
    }

    fn visit_prop(&mut self, n: &Prop) {
        match n {
            Prop::Shorthand(ident) => self.record(ident),
            _ => n.visit_children_with(self),
        }
    }

    fn visit_jsx_element_name(&mut self, n: &JSXElementName) {
        match n {
            // Lowercase names are intrinsic elements.
            JSXElementName::Ident(ident)
                if !ident.sym.starts_with(|c: char| c.is_ascii_lowercase()) =>
            {
                self.record(ident)
            }
            JSXElementName::JSXMemberExpr(member) => self.record(jsx_object_root(&member.obj)),
            _ => {}
        }
    }

    // `implements X` and interface `extends X` are type positions.
    fn visit_ts_expr_with_type_args(&mut self, _: &TsExprWithTypeArgs) {}

    fn visit_named_export(&mut self, n: &NamedExport) {
        if n.src.is_some() || n.type_only {
            return;
        }
        for spec in &n.specifiers {
            if let ExportSpecifier::Named(named) = spec
                && !named.is_type_only
                && let ModuleExportName::Ident(ident) = &named.orig
            {
                self.record(ident);
            }
        }
    }

    fn visit_ts_import_equals_decl(&mut self, n: &TsImportEqualsDecl) {
        if !n.is_type_only
            && let TsModuleRef::TsEntityName(name) = &n.module_ref
        {
            self.record(entity_root(name));
        }
    }
}

fn jsx_object_root(obj: &JSXObject) -> &Ident {
    match obj {
        JSXObject::Ident(ident) => ident,
        JSXObject::JSXMemberExpr(member) => jsx_object_root(&member.obj),
    }
}

fn entity_root(name: &TsEntityName) -> &Ident {
    match name {
        TsEntityName::Ident(ident) => ident,
        TsEntityName::TsQualifiedName(qualified) => entity_root(&qualified.left),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagnosed(path: &str, source: &str) -> Vec<String> {
        let model = SourceModel::parse(path, source).unwrap();
        LocalChecker
            .pre_emit_diagnostics(&model)
            .unwrap()
            .into_iter()
            .map(|d| {
                let start = d.start.unwrap();
                model.identifier_at(start).unwrap().to_string()
            })
            .collect()
    }

    #[test]
    fn type_annotations_are_not_value_uses() {
        let source = r#"
import { type Props, type State } from "./types";
let p: Props;
function f(s: State): Array<Props> { return []; }
type Q = typeof State;
"#;
        assert!(diagnosed("a.ts", source).is_empty());
    }

    #[test]
    fn calls_and_member_roots_are_value_uses() {
        let source = r#"
import { type make, type api } from "./lib";
make();
api.get("x");
"#;
        assert_eq!(diagnosed("a.ts", source), vec!["make", "api"]);
    }

    #[test]
    fn runtime_typeof_is_a_value_use() {
        let source = r#"
import { type Thing } from "./lib";
if (typeof Thing === "function") {}
"#;
        assert_eq!(diagnosed("a.ts", source), vec!["Thing"]);
    }

    #[test]
    fn class_extends_is_value_but_implements_is_type() {
        let source = r#"
import { type Base, type Contract, type Shape } from "./lib";
class A extends Base implements Contract {}
interface B extends Shape {}
"#;
        assert_eq!(diagnosed("a.ts", source), vec!["Base"]);
    }

    #[test]
    fn shorthand_properties_and_local_exports_are_value_uses() {
        let source = r#"
import { type a, type b, type c } from "./lib";
const o = { a };
export { b };
export type { c };
"#;
        assert_eq!(diagnosed("a.ts", source), vec!["a", "b"]);
    }

    #[test]
    fn jsx_components_are_value_uses() {
        let source = r#"
import { type Button, type ui } from "./ui";
export const v = <div><Button /><ui.Panel /></div>;
"#;
        assert_eq!(diagnosed("a.tsx", source), vec!["Button", "ui"]);
    }

    #[test]
    fn declaration_level_type_imports_are_checked() {
        let source = r#"
import type { Client } from "./client";
new Client();
"#;
        assert_eq!(diagnosed("a.ts", source), vec!["Client"]);
    }

    #[test]
    fn value_imports_produce_no_diagnostics() {
        let source = "import { run } from \"./lib\";\nrun();\n";
        assert!(diagnosed("a.ts", source).is_empty());
    }

    #[test]
    fn diagnostics_carry_category_and_file() {
        let model =
            SourceModel::parse("src/a.ts", "import { type x } from \"./m\";\nx;\n").unwrap();
        let diags = LocalChecker.pre_emit_diagnostics(&model).unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(
            diags[0].category,
            DiagnosticCategory::TypeOnlyImportUsedAsValue
        );
        assert_eq!(diags[0].file, PathBuf::from("src/a.ts"));
        assert!(diags[0].message.contains("'x'"));
    }

    #[test]
    fn compiler_codes_map_to_categories() {
        assert_eq!(
            DiagnosticCategory::from_code(1361),
            DiagnosticCategory::TypeOnlyImportUsedAsValue
        );
        assert_eq!(
            DiagnosticCategory::from_code(1452),
            DiagnosticCategory::ValueUsedAsType
        );
        assert_eq!(
            DiagnosticCategory::from_code(2304),
            DiagnosticCategory::Other(2304)
        );
        assert!(DiagnosticCategory::ValueUsedAsType.reverts_promotion());
        assert!(!DiagnosticCategory::Other(2304).reverts_promotion());
    }
}
