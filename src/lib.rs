//! fix-type-imports library for separating type-only imports from value imports.
//!
//! The core works on one TypeScript file at a time in three steps:
//!
//! 1. **Parsing**: [`SourceModel`] parses the file with swc and exposes its
//!    import declarations as a mutable model
//! 2. **Classification** (optional): [`classifier`] speculatively marks value
//!    imports as type-only, asks a [`TypeChecker`] which of them are still
//!    used as values, and reverts those
//! 3. **Rewriting**: [`rewriter`] splits mixed declarations and merges
//!    all-type ones into `import type`, converging on a canonical form
//!
//! [`runner`] drives this over a whole project with a content-hash cache.
//!
//! # Example
//!
//! ```
//! use fix_type_imports::organize_imports;
//! use std::path::Path;
//!
//! let code = "import { A, type B } from \"./exports\";\n";
//! let fixed = organize_imports(code, Path::new("file.ts")).unwrap();
//! assert_eq!(
//!     fixed,
//!     "import { A } from \"./exports\";\nimport type { B } from \"./exports\";\n"
//! );
//! ```

pub mod cache;
pub mod checker;
pub mod classifier;
pub mod error;
pub mod model;
pub mod rewriter;
pub mod runner;
pub mod scanner;
pub mod transform;

// Re-export commonly used types at crate root
pub use cache::{CACHE_FILE, HashCache};
pub use checker::{Diagnostic, DiagnosticCategory, LocalChecker, TypeChecker};
pub use error::{Error, Result};
pub use model::{ImportDeclaration, NamedImportSpecifier, SourceModel};
pub use runner::{FixOptions, RunSummary, fix_type_imports, fix_type_imports_with};
pub use transform::{Transformed, apply_transforms, organize_imports, transform_source};
