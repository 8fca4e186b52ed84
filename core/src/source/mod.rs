#![deny(missing_docs)]

//! # Source Program
//!
//! Parses a closed set of TypeScript files once, up front. Every later pass
//! (declaration lookup, decorator extraction, type resolution) borrows the
//! trees owned here.

use crate::error::{AppError, AppResult, BuildError};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};
use tree_sitter::{Node, Parser, Tree};

/// Named declaration index.
pub mod declarations;

/// Decorator and literal extraction.
pub mod decorators;

pub use declarations::{DeclKind, Declaration, DeclarationTable};
pub use decorators::Decorator;

/// One parsed file.
#[derive(Debug)]
pub struct SourceFile {
    /// Position in the program.
    pub index: usize,
    /// Path as supplied.
    pub path: PathBuf,
    /// File contents.
    pub text: String,
    /// Syntax tree.
    pub tree: Tree,
}

impl SourceFile {
    /// Root node of the file.
    pub fn root(&self) -> SourceNode<'_> {
        SourceNode {
            file: self,
            node: self.tree.root_node(),
        }
    }
}

/// Identity of a declaration: file and start offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId {
    /// File index.
    pub file: usize,
    /// Start byte of the declaration node.
    pub offset: usize,
}

/// A syntax node together with the file it belongs to.
#[derive(Debug, Clone, Copy)]
pub struct SourceNode<'p> {
    /// Owning file.
    pub file: &'p SourceFile,
    /// Node.
    pub node: Node<'p>,
}

impl<'p> SourceNode<'p> {
    fn wrap(&self, node: Node<'p>) -> SourceNode<'p> {
        SourceNode {
            file: self.file,
            node,
        }
    }

    /// Grammar kind.
    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    /// Source text.
    pub fn text(&self) -> &'p str {
        self.node
            .utf8_text(self.file.text.as_bytes())
            .unwrap_or_default()
    }

    /// Identity for cycle tracking.
    pub fn id(&self) -> SymbolId {
        SymbolId {
            file: self.file.index,
            offset: self.node.start_byte(),
        }
    }

    /// `file:line` for log messages.
    pub fn location(&self) -> String {
        format!(
            "{}:{}",
            self.file.path.display(),
            self.node.start_position().row + 1
        )
    }

    /// Child stored under a grammar field.
    pub fn field(&self, name: &str) -> Option<SourceNode<'p>> {
        self.node.child_by_field_name(name).map(|n| self.wrap(n))
    }

    /// Text of the child stored under a grammar field.
    pub fn field_text(&self, name: &str) -> Option<&'p str> {
        self.field(name).map(|n| n.text())
    }

    /// Every child stored under a grammar field.
    pub fn fields(&self, name: &str) -> Vec<SourceNode<'p>> {
        let mut cursor = self.node.walk();
        self.node
            .children_by_field_name(name, &mut cursor)
            .map(|n| self.wrap(n))
            .collect()
    }

    /// Named children, comments excluded.
    pub fn children(&self) -> Vec<SourceNode<'p>> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .filter(|n| n.kind() != "comment")
            .map(|n| self.wrap(n))
            .collect()
    }

    /// True when an anonymous token child (e.g. `?`) is present.
    pub fn has_token(&self, token: &str) -> bool {
        let mut cursor = self.node.walk();
        let found = self
            .node
            .children(&mut cursor)
            .any(|n| !n.is_named() && n.kind() == token);
        found
    }

    /// Parent node.
    pub fn parent(&self) -> Option<SourceNode<'p>> {
        self.node.parent().map(|n| self.wrap(n))
    }

    /// Names declared by a `type_parameters` field, if any.
    pub fn type_parameter_names(&self) -> Vec<String> {
        self.field("type_parameters")
            .map(|tp| {
                tp.children()
                    .into_iter()
                    .filter(|p| p.kind() == "type_parameter")
                    .filter_map(|p| p.field_text("name").map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// The parsed file set.
#[derive(Debug, Default)]
pub struct SourceProgram {
    files: Vec<SourceFile>,
}

/// Creates a parser for the file's dialect.
fn parser_for(path: &Path) -> AppResult<Parser> {
    let language = if path.extension().is_some_and(|ext| ext == "tsx") {
        tree_sitter_typescript::LANGUAGE_TSX
    } else {
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT
    };
    let mut parser = Parser::new();
    parser
        .set_language(&language.into())
        .map_err(|e| AppError::Parse(e.to_string()))?;
    Ok(parser)
}

impl SourceProgram {
    /// Reads and parses `paths`.
    ///
    /// Unreadable paths are returned as `InvalidSourcePath` build errors and
    /// the remaining files are still parsed.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> AppResult<(Self, Vec<BuildError>)> {
        let mut sources = Vec::new();
        let mut errors = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match fs::read_to_string(path) {
                Ok(text) => sources.push((path.to_path_buf(), text)),
                Err(e) => {
                    debug!("Cannot read {}: {}", path.display(), e);
                    let err = BuildError::InvalidSourcePath(path.display().to_string());
                    error!("{}", err);
                    errors.push(err);
                }
            }
        }
        Ok((Self::from_sources(sources)?, errors))
    }

    /// Parses in-memory sources.
    pub fn from_sources<P: Into<PathBuf>>(
        sources: impl IntoIterator<Item = (P, String)>,
    ) -> AppResult<Self> {
        let mut files = Vec::new();
        for (path, text) in sources {
            let path = path.into();
            let mut parser = parser_for(&path)?;
            let tree = parser
                .parse(&text, None)
                .ok_or_else(|| AppError::Parse(format!("parser gave no tree for {}", path.display())))?;
            if tree.root_node().has_error() {
                warn!("Syntax errors in {}; extraction continues", path.display());
            }
            files.push(SourceFile {
                index: files.len(),
                path,
                text,
                tree,
            });
        }
        debug!("Parsed {} source files", files.len());
        Ok(Self { files })
    }

    /// Parsed files in load order.
    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }

    /// Every node of `kinds` anywhere in the program, in source order.
    pub fn find_all<'p>(&'p self, kinds: &[&str]) -> Vec<SourceNode<'p>> {
        let mut out = Vec::new();
        for file in &self.files {
            collect_kinds(file.root(), kinds, &mut out);
        }
        out
    }
}

fn collect_kinds<'p>(node: SourceNode<'p>, kinds: &[&str], out: &mut Vec<SourceNode<'p>>) {
    if kinds.contains(&node.kind()) {
        out.push(node);
    }
    for child in node.children() {
        collect_kinds(child, kinds, out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_load_reports_missing_paths_and_continues() {
        let mut file = Builder::new().suffix(".ts").tempfile().unwrap();
        writeln!(file, "interface IOk {{ id: string; }}").unwrap();
        let missing = PathBuf::from("/definitely/not/here.ts");

        let (program, errors) =
            SourceProgram::load(&[file.path().to_path_buf(), missing.clone()]).unwrap();
        assert_eq!(program.files().len(), 1);
        assert_eq!(
            errors,
            vec![BuildError::InvalidSourcePath(missing.display().to_string())]
        );
    }

    #[test]
    fn test_node_helpers() {
        let program = SourceProgram::from_sources([(
            "a.ts",
            "interface IPage<T, K> { items?: T[]; }".to_string(),
        )])
        .unwrap();
        let iface = program.find_all(&["interface_declaration"])[0];
        assert_eq!(iface.field_text("name"), Some("IPage"));
        assert_eq!(iface.type_parameter_names(), vec!["T", "K"]);

        let prop = program.find_all(&["property_signature"])[0];
        assert!(prop.has_token("?"));
        assert_eq!(prop.location(), "a.ts:1");
    }
}
