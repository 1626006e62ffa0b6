use std::collections::HashMap;

use regex::Regex;

use crate::domain::Document;

/// Rewrites requirement identifiers in text into links to the document that
/// defines them.
///
/// Built once per document tree. Every document with an identifier pattern
/// contributes that pattern; an identifier found in text links to the
/// document that actually defines it, or failing that, to the document whose
/// pattern matched it.
#[derive(Debug, Clone)]
pub struct CrossLinker {
    patterns: Vec<(Regex, String)>,
    owners: HashMap<String, String>,
}

impl CrossLinker {
    /// Collects patterns and requirement owners from `root` and all of its
    /// descendants.
    #[must_use]
    pub fn new(root: &Document) -> Self {
        let mut patterns = Vec::new();
        let mut owners = HashMap::new();
        for (_, doc) in root.walk() {
            if let Some(pattern) = doc.id_pattern() {
                patterns.push((pattern.searcher().clone(), doc.name().to_string()));
            }
            for id in doc.requirements().filter_map(|req| req.id()) {
                owners
                    .entry(id.to_string())
                    .or_insert_with(|| doc.name().to_string());
            }
        }
        Self { patterns, owners }
    }

    /// Finds the leftmost identifier at or after `from`, preferring the
    /// longest when several patterns match at the same place.
    fn next_match(&self, text: &str, from: usize) -> Option<(usize, usize, &str)> {
        self.patterns
            .iter()
            .filter_map(|(regex, doc)| {
                regex
                    .find_at(text, from)
                    .filter(|m| !m.is_empty())
                    .map(|m| (m.start(), m.end(), doc.as_str()))
            })
            .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)))
    }

    /// Rewrites every identifier in `text` as `xref:<doc>#<id>[<id>]`.
    #[must_use]
    pub fn link(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;
        while let Some((start, end, pattern_doc)) = self.next_match(text, pos) {
            let id = &text[start..end];
            let doc = self.owners.get(id).map_or(pattern_doc, String::as_str);
            out.push_str(&text[pos..start]);
            out.push_str(&format!("xref:{doc}#{id}[{id}]"));
            pos = end;
        }
        out.push_str(&text[pos..]);
        out
    }
}

/// Marks the definition site of `id` on `line` with an anchor.
///
/// Text before the identifier is kept as is, the identifier becomes
/// `[[<id>]]<id>`, and identifiers in the rest of the line are linked.
#[must_use]
pub fn insert_anchor(line: &str, id: &str, linker: &CrossLinker) -> String {
    let Some(start) = line.find(id) else {
        return linker.link(line);
    };
    let rest = &line[start + id.len()..];
    format!("{}[[{id}]]{id}{}", &line[..start], linker.link(rest))
}
