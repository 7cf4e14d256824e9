//! Import declaration normalization.
//!
//! Given specifiers whose type-only flags are final, brings every import
//! declaration into canonical shape:
//!
//! - `import type { type A }` loses the redundant inner marker.
//! - `import { type A, type B }` becomes `import type { A, B }`.
//! - `import { A, type B }` and `import D, { type B }` keep their value
//!   bindings and move the type-only ones into a new `import type { B }`
//!   declaration placed directly after the original.
//!
//! Running the rewriter on its own output changes nothing.

use crate::model::{ImportDeclaration, NamedImportSpecifier, SourceModel};
use tracing::debug;

/// Normalizes all import declarations in `model`. Returns `true` if any
/// declaration changed.
pub fn normalize_imports(model: &mut SourceModel) -> bool {
    let mut changed = false;
    let mut index = 0;

    while index < model.imports().len() {
        let decl = &mut model.imports_mut()[index];

        if decl.is_type_only() {
            let mut had_inner_marker = false;
            for spec in decl.named_imports_mut() {
                if spec.is_type_only() {
                    spec.set_type_only(false);
                    had_inner_marker = true;
                }
            }
            if had_inner_marker {
                debug!(
                    module = decl.module_specifier(),
                    "removed redundant inner type markers"
                );
                changed = true;
            }
        }

        let type_count = decl
            .named_imports()
            .iter()
            .filter(|spec| spec.is_type_only())
            .count();
        if type_count == 0 {
            index += 1;
            continue;
        }
        let value_count = decl.named_imports().len() - type_count;

        if value_count == 0 && decl.default_import().is_none() {
            if !decl.is_type_only() {
                decl.set_type_only(true);
                for spec in decl.named_imports_mut() {
                    spec.set_type_only(false);
                }
                debug!(
                    module = decl.module_specifier(),
                    "converted to declaration-level type import"
                );
                changed = true;
            }
            index += 1;
        } else {
            let extracted = decl.extract_named(NamedImportSpecifier::is_type_only);
            let type_decl = ImportDeclaration::type_only_from(decl, extracted);
            debug!(
                module = decl.module_specifier(),
                moved = type_count,
                "split type-only specifiers into a separate declaration"
            );
            model.insert_after(index, type_decl);
            changed = true;
            index += 2;
        }
    }

    changed
}
