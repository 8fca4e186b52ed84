#![deny(missing_docs)]

//! # Declarations
//!
//! Symbol table of every named type-like declaration in the program, looked
//! through `export`, `declare`, `namespace` and `module` wrappers.

use super::{SourceNode, SourceProgram};
use indexmap::IndexMap;
use std::fmt;

/// Kind of a named declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `interface X {}`
    Interface,
    /// `enum X {}`
    Enum,
    /// `type X = ...`
    TypeAlias,
    /// `class X {}`
    Class,
}

impl DeclKind {
    fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "interface_declaration" => Some(DeclKind::Interface),
            "enum_declaration" => Some(DeclKind::Enum),
            "type_alias_declaration" => Some(DeclKind::TypeAlias),
            "class_declaration" | "abstract_class_declaration" => Some(DeclKind::Class),
            _ => None,
        }
    }
}

impl fmt::Display for DeclKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeclKind::Interface => "InterfaceDeclaration",
            DeclKind::Enum => "EnumDeclaration",
            DeclKind::TypeAlias => "TypeAliasDeclaration",
            DeclKind::Class => "ClassDeclaration",
        };
        f.write_str(text)
    }
}

/// One named declaration.
#[derive(Debug, Clone, Copy)]
pub struct Declaration<'p> {
    /// Declaration kind.
    pub kind: DeclKind,
    /// Declaration node.
    pub node: SourceNode<'p>,
}

/// Name to declarations map, in source order.
#[derive(Debug, Default)]
pub struct DeclarationTable<'p> {
    by_name: IndexMap<&'p str, Vec<Declaration<'p>>>,
}

const CONTAINERS: [&str; 6] = [
    "program",
    "export_statement",
    "ambient_declaration",
    "expression_statement",
    "statement_block",
    "module",
];

impl<'p> DeclarationTable<'p> {
    /// Indexes every file of `program`.
    pub fn build(program: &'p SourceProgram) -> Self {
        let mut table = Self::default();
        for file in program.files() {
            table.index(file.root());
        }
        table
    }

    fn index(&mut self, node: SourceNode<'p>) {
        if let Some(kind) = DeclKind::from_kind(node.kind()) {
            if let Some(name) = node.field_text("name") {
                self.by_name
                    .entry(name)
                    .or_default()
                    .push(Declaration { kind, node });
            }
            return;
        }
        if CONTAINERS.contains(&node.kind()) || node.kind() == "internal_module" {
            for child in node.children() {
                self.index(child);
            }
        }
    }

    /// Declarations sharing `name`.
    pub fn lookup(&self, name: &str) -> &[Declaration<'p>] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Declared names in source order.
    pub fn names(&self) -> impl Iterator<Item = &'p str> + '_ {
        self.by_name.keys().copied()
    }
}
