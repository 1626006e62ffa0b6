use crate::{
    domain::{Requirement, fields},
    parser::CONTINUATION,
    report::CrossLinker,
};

/// Attributes that are part of a term's label, title or body rather than its
/// attribute line.
const LAID_OUT: [&str; 4] = [fields::ID, fields::TEXT, fields::TITLE, fields::LINE];

/// Renders a requirement as a term.
///
/// ```text
/// [[SR-1]]SR-1::
/// Title:
/// +
/// Body text.
/// +
/// Parent: xref:ur.adoc#UR-1[UR-1]; Tags: a, b
/// ```
///
/// Blank lines inside the body become continuation markers so the body stays
/// attached to the term. The attribute line is only written when there is
/// something to put on it.
#[must_use]
pub fn render_term(req: &Requirement, linker: &CrossLinker) -> Vec<String> {
    let id = req.id().unwrap_or_default();
    let mut out = vec![format!("[[{id}]]{id}::")];

    if let Some(title) = req.title().filter(|title| !title.trim().is_empty()) {
        out.push(format!("{}:", title.trim().trim_end_matches(':')));
        out.push(CONTINUATION.to_string());
    }

    out.extend(req.text().unwrap_or_default().lines().map(|line| {
        if line.trim().is_empty() {
            CONTINUATION.to_string()
        } else {
            linker.link(line)
        }
    }));

    let attributes: Vec<String> = req
        .iter()
        .filter(|(name, _)| !LAID_OUT.contains(name))
        .map(|(name, value)| format!("{name}: {}", linker.link(value)))
        .collect();
    if !attributes.is_empty() {
        out.push(CONTINUATION.to_string());
        out.push(attributes.join("; "));
    }
    out
}
