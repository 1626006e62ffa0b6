use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::domain::{Category, Diagnostics, Document, Requirement};

/// How far down the document tree requirements are merged into the
/// project-wide index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeDepth {
    /// The root document and its direct children.
    #[default]
    Children,
    /// The root document and every descendant.
    Recursive,
}

/// A root document, its tree of child documents, and an index of every
/// requirement in the tree by ID.
///
/// The index does not own any requirements. It records where in the document
/// tree each requirement lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    root: Document,
    /// Path of child indices from the root to the owning document, keyed by ID.
    index: HashMap<String, Vec<usize>>,
    /// IDs in the order they were merged.
    order: Vec<String>,
}

impl Project {
    /// Builds the project-wide index over a fully loaded document tree.
    ///
    /// Requirements are merged root first, then children in declaration
    /// order. An ID already merged from an earlier document is reported as an
    /// identity error and the later requirement is left out of the index.
    #[instrument(skip_all, fields(root = root.name()))]
    pub fn new(root: Document, depth: MergeDepth, diagnostics: &mut Diagnostics) -> Self {
        let mut project = Self {
            root,
            index: HashMap::new(),
            order: Vec::new(),
        };
        let mut entries = Vec::new();
        collect(&project.root, &mut Vec::new(), depth, 0, &mut entries);
        for (path, id, line, doc_name) in entries {
            if project.index.contains_key(&id) {
                let mut duplicate = Diagnostics::new();
                duplicate.error(Category::Identity, line, format!("Duplicate requirement {id}"));
                diagnostics.absorb(duplicate, &doc_name);
            } else {
                project.order.push(id.clone());
                project.index.insert(id, path);
            }
        }
        project
    }

    /// The root document.
    #[must_use]
    pub const fn root(&self) -> &Document {
        &self.root
    }

    /// Looks up a requirement anywhere in the index.
    #[must_use]
    pub fn requirement(&self, id: &str) -> Option<&Requirement> {
        self.document_of(id)?.requirement(id)
    }

    /// The document that owns the indexed requirement with this ID.
    #[must_use]
    pub fn document_of(&self, id: &str) -> Option<&Document> {
        self.root.descendant(self.index.get(id)?)
    }

    /// Returns `true` if a requirement with this ID is indexed.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Every indexed requirement, in merge order.
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.order.iter().filter_map(|id| self.requirement(id))
    }

    /// The number of indexed requirements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if no requirements are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Attribute names across the whole document tree.
    #[must_use]
    pub fn attribute_names(&self) -> Vec<String> {
        self.root.all_attribute_names()
    }
}

type Entry = (Vec<usize>, String, Option<usize>, String);

fn collect(
    doc: &Document,
    path: &mut Vec<usize>,
    depth: MergeDepth,
    level: usize,
    out: &mut Vec<Entry>,
) {
    out.extend(doc.requirements().filter_map(|requirement| {
        requirement.id().map(|id| {
            (
                path.clone(),
                id.to_string(),
                requirement.line(),
                doc.name().to_string(),
            )
        })
    }));
    if level > 0 && depth == MergeDepth::Children {
        return;
    }
    for (i, child) in doc.children().iter().enumerate() {
        path.push(i);
        collect(child, path, depth, level + 1, out);
        path.pop();
    }
}
