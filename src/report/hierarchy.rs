use crate::domain::Document;

/// One bullet per document in the tree, nested by depth.
///
/// The root is `* name`, its children `** name`, and so on.
#[must_use]
pub fn document_hierarchy(root: &Document) -> Vec<String> {
    root.walk()
        .into_iter()
        .map(|(depth, doc)| format!("{} {}", "*".repeat(depth + 1), doc.name()))
        .collect()
}
