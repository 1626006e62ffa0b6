//! A single parsed requirements document.
//!
//! The [`Document`] knows nothing about the filesystem beyond remembering the
//! path it was read from. Child documents are attached by the project loader
//! once the parent has been fully scanned.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::domain::{
    Category, Diagnostics, IdPattern, Requirement,
    requirement::fields,
};

/// The requirements, attribute names and children of one source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    name: String,
    path: PathBuf,
    id_pattern: Option<IdPattern>,
    /// Requirements in the order they were defined.
    requirements: Vec<Requirement>,
    /// Position of each requirement in `requirements`, keyed by ID.
    index: HashMap<String, usize>,
    attribute_names: Vec<String>,
    child_files: Vec<String>,
    children: Vec<Document>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// The display name of the document, used in hierarchies and cross-links.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The path the document was read from (empty if built in memory).
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records the path the document was read from.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
    }

    /// The identifier pattern in force for this document.
    #[must_use]
    pub const fn id_pattern(&self) -> Option<&IdPattern> {
        self.id_pattern.as_ref()
    }

    /// Sets the identifier pattern.
    pub fn set_id_pattern(&mut self, pattern: IdPattern) {
        self.id_pattern = Some(pattern);
    }

    /// Adds a requirement.
    ///
    /// Returns `false` (and records an identity error) if a requirement with
    /// the same ID is already present; the first one is kept. The
    /// requirement's attribute names are added to the document's registry.
    pub fn add_requirement(
        &mut self,
        requirement: Requirement,
        diagnostics: &mut Diagnostics,
    ) -> bool {
        let Some(id) = requirement.id().map(str::to_string) else {
            diagnostics.error(
                Category::Validation,
                requirement.line(),
                format!("Requirement without {} attribute not added", fields::ID),
            );
            return false;
        };
        if self.index.contains_key(&id) {
            diagnostics.error(
                Category::Identity,
                requirement.line(),
                format!("Duplicate requirement {id}"),
            );
            return false;
        }
        self.add_attribute_names(requirement.names());
        self.index.insert(id, self.requirements.len());
        self.requirements.push(requirement);
        true
    }

    /// Adds several requirements, see [`Document::add_requirement`].
    pub fn add_requirements(
        &mut self,
        requirements: impl IntoIterator<Item = Requirement>,
        diagnostics: &mut Diagnostics,
    ) {
        for requirement in requirements {
            self.add_requirement(requirement, diagnostics);
        }
    }

    /// Adds attribute names to the registry, ignoring ones already known.
    pub fn add_attribute_names<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            if !self.attribute_names.iter().any(|known| known == name) {
                self.attribute_names.push(name.to_string());
            }
        }
    }

    /// Attribute names seen in this document, in the order first seen.
    #[must_use]
    pub fn attribute_names(&self) -> &[String] {
        &self.attribute_names
    }

    /// The union of attribute names across this document and all of its
    /// descendants, in the order first seen (depth first).
    #[must_use]
    pub fn all_attribute_names(&self) -> Vec<String> {
        let mut names = self.attribute_names.clone();
        for child in &self.children {
            for name in child.all_attribute_names() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Looks up a requirement by ID.
    #[must_use]
    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.index.get(id).map(|&i| &self.requirements[i])
    }

    /// Returns `true` if a requirement with this ID is defined here.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Requirements in the order they were defined.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.iter()
    }

    /// Declares the child document files (as written in the document).
    pub fn set_child_files(&mut self, files: Vec<String>) {
        self.child_files = files;
    }

    /// The declared child document files.
    #[must_use]
    pub fn child_files(&self) -> &[String] {
        &self.child_files
    }

    /// Attaches a loaded child document.
    pub fn add_child(&mut self, child: Self) {
        self.children.push(child);
    }

    /// The loaded child documents.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }

    /// This document and all descendants, depth first, paired with their
    /// depth (0 for `self`).
    #[must_use]
    pub fn walk(&self) -> Vec<(usize, &Self)> {
        fn visit<'a>(doc: &'a Document, depth: usize, out: &mut Vec<(usize, &'a Document)>) {
            out.push((depth, doc));
            for child in &doc.children {
                visit(child, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        visit(self, 0, &mut out);
        out
    }

    /// Follows a path of child indices from this document.
    #[must_use]
    pub fn descendant(&self, path: &[usize]) -> Option<&Self> {
        path.iter()
            .try_fold(self, |doc, &i| doc.children.get(i))
    }
}
