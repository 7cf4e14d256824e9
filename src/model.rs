//! Mutable import model for a single TypeScript source file.
//!
//! Parses the file with swc, records every top-level `import` declaration
//! together with its byte range and layout, and lets the classifier and
//! rewriter flip type-only flags, move named specifiers around and insert new
//! declarations. Serialization is span-based: only declarations whose state
//! differs from what was parsed are re-rendered and spliced over their
//! original range, so the rest of the file is preserved byte-for-byte.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::ops::Range;
use std::path::{Path, PathBuf};
use swc_common::{FileName, FilePathMapping, SourceMap, Span, Spanned, sync::Lrc};
use swc_ecma_ast::{ImportDecl, ImportSpecifier, Module, ModuleDecl, ModuleItem};
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax, lexer::Lexer};
use tracing::warn;

const BOM: char = '\u{feff}';

/// A parsed source file and its import declarations, in source order.
#[derive(Debug)]
pub struct SourceModel {
    path: PathBuf,
    text: String,
    module: Module,
    offsets: Offsets,
    imports: Vec<ImportDeclaration>,
}

/// Converts swc byte positions into offsets into the original text.
#[derive(Debug, Clone, Copy)]
struct Offsets {
    base: u32,
    bom: usize,
}

impl Offsets {
    fn range(&self, span: Span) -> Range<usize> {
        let start = (span.lo.0 - self.base) as usize + self.bom;
        let end = (span.hi.0 - self.base) as usize + self.bom;
        start..end
    }
}

impl SourceModel {
    /// Parses `text` as TypeScript. `.tsx` and `.jsx` paths enable JSX.
    ///
    /// A fatal parse error is returned as [`Error::Parse`]; errors the parser
    /// recovers from are logged and otherwise ignored.
    pub fn parse(path: impl Into<PathBuf>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let text = text.into();
        let bom = if text.starts_with(BOM) { BOM.len_utf8() } else { 0 };

        let cm = Lrc::new(SourceMap::new(FilePathMapping::empty()));
        let file_name = Lrc::new(FileName::Real(path.clone()));
        let source_file = cm.new_source_file(file_name, text[bom..].to_string());

        let lexer = Lexer::new(
            syntax_for(&path),
            Default::default(),
            StringInput::from(&*source_file),
            None,
        );
        let mut parser = Parser::new_from(lexer);

        let module = parser.parse_module().map_err(|e| Error::Parse {
            path: path.clone(),
            message: format!("{:?}", e),
        })?;

        let recovered = parser.take_errors();
        if !recovered.is_empty() {
            warn!(
                path = %path.display(),
                errors = recovered.len(),
                "recovered from parse errors"
            );
        }

        let offsets = Offsets {
            base: source_file.start_pos.0,
            bom,
        };

        let imports = module
            .body
            .iter()
            .filter_map(|item| match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => Some(decl),
                _ => None,
            })
            .map(|decl| ImportDeclaration::from_swc(decl, &text, offsets))
            .collect();

        Ok(Self {
            path,
            text,
            module,
            offsets,
            imports,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The text the model was parsed from.
    pub fn original_text(&self) -> &str {
        &self.text
    }

    /// The underlying swc module. Reflects the parsed text, not pending edits.
    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn imports(&self) -> &[ImportDeclaration] {
        &self.imports
    }

    pub fn imports_mut(&mut self) -> &mut [ImportDeclaration] {
        &mut self.imports
    }

    /// Inserts `decl` directly after the declaration at `index`.
    pub fn insert_after(&mut self, index: usize, decl: ImportDeclaration) {
        let at = (index + 1).min(self.imports.len());
        self.imports.insert(at, decl);
    }

    /// Byte range of an swc span within [`Self::original_text`].
    pub fn span_range(&self, span: Span) -> Range<usize> {
        self.offsets.range(span)
    }

    /// Returns the identifier starting exactly at `offset`, if any.
    pub fn identifier_at(&self, offset: usize) -> Option<&str> {
        let rest = self.text.get(offset..)?;
        let end = rest
            .char_indices()
            .find(|(_, c)| !is_identifier_char(*c))
            .map_or(rest.len(), |(i, _)| i);
        let ident = &rest[..end];
        if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
            None
        } else {
            Some(ident)
        }
    }

    /// Named import specifiers that bind `name` in this file.
    ///
    /// Well-formed files yield at most one; duplicates are all returned.
    pub fn resolve_import_bindings(&self, name: &str) -> Vec<&NamedImportSpecifier> {
        self.imports
            .iter()
            .flat_map(|decl| decl.named_imports.iter())
            .filter(|spec| spec.local == name)
            .collect()
    }

    /// Local names currently bound by a type-only import, either through a
    /// declaration-level `import type` or a specifier-level `type` marker.
    pub fn type_only_bindings(&self) -> HashSet<&str> {
        let mut bindings = HashSet::new();
        for decl in &self.imports {
            if decl.type_only {
                bindings.extend(decl.default_import.as_deref());
                bindings.extend(decl.namespace_import.as_deref());
                bindings.extend(decl.named_imports.iter().map(|s| s.local.as_str()));
            } else {
                bindings.extend(
                    decl.named_imports
                        .iter()
                        .filter(|s| s.type_only)
                        .map(|s| s.local.as_str()),
                );
            }
        }
        bindings
    }

    /// True if serializing would produce text different from the input.
    pub fn is_modified(&self) -> bool {
        self.imports.iter().any(ImportDeclaration::is_modified)
    }

    /// Serializes the model back to source text.
    pub fn to_text(&self) -> String {
        let newline = if self.text.contains("\r\n") { "\r\n" } else { "\n" };
        let mut replacements = Vec::new();
        let mut index = 0;

        while index < self.imports.len() {
            let mut end = index + 1;
            while end < self.imports.len() && self.imports[end].span().is_none() {
                end += 1;
            }

            let anchor = &self.imports[index];
            let inserted = &self.imports[index + 1..end];
            if let Some(span) = anchor.span()
                && (anchor.is_modified() || !inserted.is_empty())
            {
                let indent = line_indent(&self.text, span.start);
                let mut new_text = anchor.render(indent);
                for decl in inserted {
                    new_text.push_str(newline);
                    new_text.push_str(indent);
                    new_text.push_str(&decl.render(indent));
                }
                replacements.push(Replacement {
                    start: span.start,
                    end: span.end,
                    new_text,
                });
            }

            index = end;
        }

        apply_replacements(&self.text, replacements)
    }
}

fn syntax_for(path: &Path) -> Syntax {
    let tsx = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("tsx" | "jsx")
    );
    Syntax::Typescript(TsSyntax {
        tsx,
        decorators: true,
        ..Default::default()
    })
}

fn is_identifier_char(c: char) -> bool {
    c == '_' || c == '$' || c.is_alphanumeric()
}

/// Comments in a stretch of import-clause text, with their byte offsets, and
/// the remaining code with each comment replaced by a space.
fn split_comments(segment: &str) -> (Vec<(usize, &str)>, String) {
    let mut comments = Vec::new();
    let mut code = String::new();
    let mut offset = 0;

    while let Some(start) = [segment[offset..].find("//"), segment[offset..].find("/*")]
        .into_iter()
        .flatten()
        .min()
    {
        let start = offset + start;
        let tail = &segment[start..];
        let len = if tail.starts_with("//") {
            tail.find('\n').unwrap_or(tail.len())
        } else {
            tail.find("*/").map_or(tail.len(), |i| i + 2)
        };
        code.push_str(&segment[offset..start]);
        code.push(' ');
        comments.push((start, tail[..len].trim_end()));
        offset = start + len;
    }
    code.push_str(&segment[offset..]);
    (comments, code)
}

/// True if the code between the previous specifier (or `{`) and a
/// specifier's name is exactly a `type` modifier. The parser flags this
/// inconsistently when the whole declaration is already `import type`.
fn is_type_modifier(code: &str) -> bool {
    let mut words = code
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|word| !word.is_empty());
    words.next() == Some("type") && words.next().is_none()
}

/// Leading whitespace of the line containing `offset`, or `""` if the line
/// has other text before it.
fn line_indent(text: &str, offset: usize) -> &str {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &text[line_start..offset];
    if prefix.chars().all(char::is_whitespace) {
        prefix
    } else {
        ""
    }
}

/// A single text replacement with position information.
#[derive(Debug, Clone)]
struct Replacement {
    start: usize,
    end: usize,
    new_text: String,
}

/// Applies replacements from the end of the file backwards so earlier
/// offsets stay valid.
fn apply_replacements(content: &str, mut replacements: Vec<Replacement>) -> String {
    replacements.sort_by(|a, b| b.start.cmp(&a.start));

    let mut result = content.to_string();
    for rep in replacements {
        if rep.start <= rep.end && rep.end <= result.len() {
            result.replace_range(rep.start..rep.end, &rep.new_text);
        }
    }
    result
}

/// State captured at parse time, used to tell whether a declaration needs
/// re-rendering.
#[derive(Debug, Clone)]
enum Origin {
    Parsed {
        span: Range<usize>,
        type_only: bool,
        named_len: usize,
    },
    Inserted,
}

/// One `import ... from "..."` declaration.
#[derive(Debug, Clone)]
pub struct ImportDeclaration {
    module_specifier: String,
    default_import: Option<String>,
    namespace_import: Option<String>,
    named_imports: Vec<NamedImportSpecifier>,
    /// Comments inside the braces that belong to no specifier.
    dangling: Vec<String>,
    type_only: bool,
    braces: BraceStyle,
    attributes: String,
    semicolon: bool,
    origin: Origin,
}

impl ImportDeclaration {
    fn from_swc(decl: &ImportDecl, text: &str, offsets: Offsets) -> Self {
        let span = offsets.range(decl.span);
        let src = offsets.range(decl.src.span);

        let header = &text[span.start..src.start];
        let close = header.rfind('}').map(|i| span.start + i);
        let mut cursor = header.find('{').map_or(span.start, |i| span.start + i + 1);

        let mut default_import = None;
        let mut namespace_import = None;
        let mut named_imports: Vec<NamedImportSpecifier> = Vec::new();
        let mut dangling = Vec::new();

        for spec in &decl.specifiers {
            match spec {
                ImportSpecifier::Default(default) => {
                    default_import = Some(default.local.sym.to_string());
                }
                ImportSpecifier::Namespace(ns) => {
                    namespace_import = Some(ns.local.sym.to_string());
                }
                ImportSpecifier::Named(named) => {
                    let name_span = named.imported.as_ref().map_or(named.local.span, |n| n.span());
                    let segment = text.get(cursor..offsets.range(name_span).start).unwrap_or("");
                    let (comments, code) = split_comments(segment);

                    let mut leading = Vec::new();
                    for (at, comment) in comments {
                        match named_imports.last_mut() {
                            Some(prev) if !segment[..at].contains('\n') => {
                                prev.trailing.push(comment.to_string())
                            }
                            _ => leading.push(comment.to_string()),
                        }
                    }

                    let type_only = named.is_type_only || is_type_modifier(&code);
                    named_imports.push(NamedImportSpecifier {
                        local: named.local.sym.to_string(),
                        imported: named
                            .imported
                            .as_ref()
                            .map(|name| text[offsets.range(name.span())].to_string()),
                        type_only,
                        parsed_type_only: Some(type_only),
                        leading,
                        trailing: Vec::new(),
                    });
                    cursor = offsets.range(named.span).end;
                }
            }
        }

        if let Some(segment) = close.and_then(|close| text.get(cursor..close)) {
            for (at, comment) in split_comments(segment).0 {
                match named_imports.last_mut() {
                    Some(last) if !segment[..at].contains('\n') => {
                        last.trailing.push(comment.to_string())
                    }
                    _ => dangling.push(comment.to_string()),
                }
            }
        }

        let tail = text[src.end..span.end].trim_end();
        let semicolon = tail.ends_with(';');
        let attributes = tail.trim_end_matches(';').trim_end().to_string();
        let named_len = named_imports.len();

        Self {
            module_specifier: text[src.clone()].to_string(),
            default_import,
            namespace_import,
            named_imports,
            dangling,
            type_only: decl.type_only,
            braces: BraceStyle::detect(header),
            attributes,
            semicolon,
            origin: Origin::Parsed {
                span,
                type_only: decl.type_only,
                named_len,
            },
        }
    }

    /// A new `import type { ... }` declaration for the same module as
    /// `anchor`, laid out like it. Specifier-level markers are cleared.
    pub fn type_only_from(anchor: &ImportDeclaration, named: Vec<NamedImportSpecifier>) -> Self {
        let named_imports = named
            .into_iter()
            .map(|mut spec| {
                spec.type_only = false;
                spec.parsed_type_only = None;
                spec
            })
            .collect();

        Self {
            module_specifier: anchor.module_specifier.clone(),
            default_import: None,
            namespace_import: None,
            named_imports,
            dangling: Vec::new(),
            type_only: true,
            braces: anchor.braces.clone(),
            attributes: anchor.attributes.clone(),
            semicolon: anchor.semicolon,
            origin: Origin::Inserted,
        }
    }

    /// The module specifier without its quotes.
    pub fn module_specifier(&self) -> &str {
        let raw = self.module_specifier.as_str();
        raw.get(1..raw.len().saturating_sub(1)).unwrap_or(raw)
    }

    pub fn default_import(&self) -> Option<&str> {
        self.default_import.as_deref()
    }

    pub fn namespace_import(&self) -> Option<&str> {
        self.namespace_import.as_deref()
    }

    pub fn named_imports(&self) -> &[NamedImportSpecifier] {
        &self.named_imports
    }

    pub fn named_imports_mut(&mut self) -> &mut [NamedImportSpecifier] {
        &mut self.named_imports
    }

    pub fn is_type_only(&self) -> bool {
        self.type_only
    }

    pub fn set_type_only(&mut self, type_only: bool) {
        self.type_only = type_only;
    }

    /// Removes and returns the named specifiers matching `pred`, keeping the
    /// relative order of both groups.
    pub fn extract_named<F>(&mut self, mut pred: F) -> Vec<NamedImportSpecifier>
    where
        F: FnMut(&NamedImportSpecifier) -> bool,
    {
        let (extracted, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.named_imports)
            .into_iter()
            .partition(|spec| pred(spec));
        self.named_imports = kept;
        extracted
    }

    /// Byte range in the original text; `None` for inserted declarations.
    pub fn span(&self) -> Option<Range<usize>> {
        match &self.origin {
            Origin::Parsed { span, .. } => Some(span.clone()),
            Origin::Inserted => None,
        }
    }

    pub fn is_modified(&self) -> bool {
        match &self.origin {
            Origin::Inserted => true,
            Origin::Parsed {
                type_only,
                named_len,
                ..
            } => {
                self.type_only != *type_only
                    || self.named_imports.len() != *named_len
                    || self
                        .named_imports
                        .iter()
                        .any(|spec| spec.parsed_type_only != Some(spec.type_only))
            }
        }
    }

    /// Renders the declaration. `line_indent` is the indentation of the line
    /// the declaration starts on.
    pub fn render(&self, line_indent: &str) -> String {
        let mut clauses = Vec::new();
        if let Some(default) = &self.default_import {
            clauses.push(default.clone());
        }
        if let Some(ns) = &self.namespace_import {
            clauses.push(format!("* as {}", ns));
        }
        if !self.named_imports.is_empty() || clauses.is_empty() {
            clauses.push(
                self.braces
                    .render(&self.named_imports, &self.dangling, line_indent),
            );
        }

        let mut out = String::from("import ");
        if self.type_only {
            out.push_str("type ");
        }
        out.push_str(&clauses.join(", "));
        out.push_str(" from ");
        out.push_str(&self.module_specifier);
        out.push_str(&self.attributes);
        if self.semicolon {
            out.push(';');
        }
        out
    }
}

/// One `{ ... }` entry of an import declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImportSpecifier {
    local: String,
    /// Raw source text of the imported name when aliased, quotes included
    /// for string names.
    imported: Option<String>,
    type_only: bool,
    parsed_type_only: Option<bool>,
    /// Comments on the lines before the specifier.
    leading: Vec<String>,
    /// Comments after the specifier on the same line.
    trailing: Vec<String>,
}

impl NamedImportSpecifier {
    /// The name this specifier binds in the importing file.
    pub fn local_name(&self) -> &str {
        &self.local
    }

    /// The exported name being imported.
    pub fn name(&self) -> &str {
        self.imported.as_deref().unwrap_or(&self.local)
    }

    pub fn is_type_only(&self) -> bool {
        self.type_only
    }

    pub fn set_type_only(&mut self, type_only: bool) {
        self.type_only = type_only;
    }

    /// Source form of the specifier, e.g. `type A as B`.
    pub fn binding_text(&self) -> String {
        let prefix = if self.type_only { "type " } else { "" };
        match &self.imported {
            Some(imported) => format!("{}{} as {}", prefix, imported, self.local),
            None => format!("{}{}", prefix, self.local),
        }
    }
}

/// Layout of a declaration's `{ ... }` block.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BraceStyle {
    Inline { padded: bool },
    Multiline { indent: String, trailing_comma: bool },
}

impl Default for BraceStyle {
    fn default() -> Self {
        BraceStyle::Inline { padded: true }
    }
}

impl BraceStyle {
    /// Detects the layout from the declaration text preceding the module
    /// specifier.
    fn detect(header: &str) -> Self {
        let (Some(open), Some(close)) = (header.find('{'), header.rfind('}')) else {
            return Self::default();
        };
        if close <= open {
            return Self::default();
        }

        let inner = &header[open + 1..close];
        if inner.contains('\n') {
            let indent = inner
                .lines()
                .skip(1)
                .find(|line| !line.trim().is_empty())
                .map(|line| line[..line.len() - line.trim_start().len()].to_string())
                .unwrap_or_else(|| "  ".to_string());
            BraceStyle::Multiline {
                indent,
                trailing_comma: split_comments(inner).1.trim_end().ends_with(','),
            }
        } else {
            BraceStyle::Inline {
                padded: inner.is_empty() || inner.starts_with(char::is_whitespace),
            }
        }
    }

    fn render(
        &self,
        specs: &[NamedImportSpecifier],
        dangling: &[String],
        line_indent: &str,
    ) -> String {
        if specs.is_empty() && dangling.is_empty() {
            return "{}".to_string();
        }

        let has_line_comment = dangling
            .iter()
            .chain(specs.iter().flat_map(|s| s.leading.iter().chain(&s.trailing)))
            .any(|c| c.starts_with("//"));

        match self {
            BraceStyle::Inline { .. } if has_line_comment => BraceStyle::Multiline {
                indent: format!("{}  ", line_indent),
                trailing_comma: true,
            }
            .render(specs, dangling, line_indent),
            BraceStyle::Inline { padded } => {
                let items: Vec<String> = specs
                    .iter()
                    .map(|spec| {
                        let binding = spec.binding_text();
                        let mut words: Vec<&str> =
                            spec.leading.iter().map(String::as_str).collect();
                        words.push(&binding);
                        words.extend(spec.trailing.iter().map(String::as_str));
                        words.join(" ")
                    })
                    .collect();
                let mut inner = items.join(", ");
                for comment in dangling {
                    if !inner.is_empty() {
                        inner.push(' ');
                    }
                    inner.push_str(comment);
                }
                if *padded {
                    format!("{{ {} }}", inner)
                } else {
                    format!("{{{}}}", inner)
                }
            }
            BraceStyle::Multiline {
                indent,
                trailing_comma,
            } => {
                let mut out = String::from("{\n");
                for (i, spec) in specs.iter().enumerate() {
                    for comment in &spec.leading {
                        out.push_str(indent);
                        out.push_str(comment);
                        out.push('\n');
                    }
                    out.push_str(indent);
                    out.push_str(&spec.binding_text());
                    if i + 1 < specs.len() || *trailing_comma {
                        out.push(',');
                    }
                    for comment in &spec.trailing {
                        out.push(' ');
                        out.push_str(comment);
                    }
                    out.push('\n');
                }
                for comment in dangling {
                    out.push_str(indent);
                    out.push_str(comment);
                    out.push('\n');
                }
                out.push_str(line_indent);
                out.push('}');
                out
            }
        }
    }
}
