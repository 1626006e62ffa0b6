use std::fmt;

/// Names of the attributes that carry meaning to the parser and reports.
pub mod fields {
    /// The requirement identifier.
    pub const ID: &str = "ID";
    /// The requirement body text.
    pub const TEXT: &str = "Text";
    /// The optional requirement title.
    pub const TITLE: &str = "Title";
    /// Comma separated identifiers of parent requirements.
    pub const PARENT: &str = "Parent";
    /// Comma separated identifiers of child requirements.
    pub const CHILD: &str = "Child";
    /// The line the requirement was defined on.
    pub const LINE: &str = "line";

    /// Every reserved attribute name.
    pub const RESERVED: [&str; 6] = [ID, TEXT, TITLE, PARENT, CHILD, LINE];
}

/// A requirement is a set of named, textual attributes.
///
/// Attributes keep the order they were defined in, but an attribute name may
/// only be defined once. A requirement that made it into a
/// [`Document`](crate::Document) always has a non-empty [`fields::ID`] and
/// [`fields::TEXT`].
#[derive(Debug, Clone, Default, Eq)]
pub struct Requirement {
    attributes: Vec<(String, String)>,
}

/// Returned when an attribute is defined twice on the same requirement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("attribute '{0}' is already defined")]
pub struct DuplicateAttribute(pub String);

impl Requirement {
    /// Creates a requirement with no attributes.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    /// Builds a requirement from name/value pairs.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateAttribute`] if a name appears more than once.
    pub fn try_from_pairs<I, N, V>(pairs: I) -> Result<Self, DuplicateAttribute>
    where
        I: IntoIterator<Item = (N, V)>,
        N: Into<String>,
        V: Into<String>,
    {
        let mut requirement = Self::new();
        for (name, value) in pairs {
            requirement.insert(name, value)?;
        }
        Ok(requirement)
    }

    /// Defines a new attribute.
    ///
    /// # Errors
    ///
    /// Returns [`DuplicateAttribute`] if the attribute is already defined. The
    /// existing value is left untouched.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), DuplicateAttribute> {
        let name = name.into();
        if self.contains(&name) {
            return Err(DuplicateAttribute(name));
        }
        self.attributes.push((name, value.into()));
        Ok(())
    }

    /// Sets an attribute, replacing any existing value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// The value of an attribute.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` if the attribute is defined.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.iter().any(|(n, _)| n == name)
    }

    /// The requirement identifier.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.get(fields::ID)
    }

    /// The requirement text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.get(fields::TEXT)
    }

    /// The requirement title.
    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.get(fields::TITLE)
    }

    /// The line the requirement was defined on.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        self.get(fields::LINE).and_then(|line| line.parse().ok())
    }

    /// The identifiers listed in the [`fields::PARENT`] attribute.
    #[must_use]
    pub fn parents(&self) -> Vec<&str> {
        self.get(fields::PARENT).map(split_links).unwrap_or_default()
    }

    /// The identifiers listed in the [`fields::CHILD`] attribute.
    #[must_use]
    pub fn children(&self) -> Vec<&str> {
        self.get(fields::CHILD).map(split_links).unwrap_or_default()
    }

    /// Attribute names in definition order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().map(|(n, _)| n.as_str())
    }

    /// Attributes in definition order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// The number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns `true` if no attributes are defined.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

/// Attribute order does not take part in equality.
impl PartialEq for Requirement {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(n, v)| other.get(n) == Some(v))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}: {value:?}")?;
        }
        f.write_str("}")
    }
}

/// Splits a comma separated list of identifiers into trimmed, non-empty items.
#[must_use]
pub fn split_links(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test]
    fn duplicate_attribute_is_rejected() {
        let mut requirement = Requirement::new();
        requirement.insert("ID", "SR-001").unwrap();
        let error = requirement.insert("ID", "SR-002").unwrap_err();
        assert_eq!(error, DuplicateAttribute("ID".to_string()));
        assert_eq!(requirement.id(), Some("SR-001"));
    }

    #[test]
    fn set_replaces_value() {
        let mut requirement = Requirement::try_from_pairs([("ID", "SR-001")]).unwrap();
        requirement.set(fields::LINE, "4");
        requirement.set(fields::LINE, "7");
        assert_eq!(requirement.line(), Some(7));
        assert_eq!(requirement.len(), 2);
    }

    #[test]
    fn equality_ignores_order() {
        let a = Requirement::try_from_pairs([("ID", "A"), ("Text", "t")]).unwrap();
        let b = Requirement::try_from_pairs([("Text", "t"), ("ID", "A")]).unwrap();
        let c = Requirement::try_from_pairs([("Text", "t")]).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn names_keep_definition_order() {
        let requirement =
            Requirement::try_from_pairs([("ID", "A"), ("Text", "t"), ("Tags", "x")]).unwrap();
        assert_eq!(
            requirement.names().collect::<Vec<_>>(),
            vec!["ID", "Text", "Tags"]
        );
    }

    #[test_case("", &[]; "empty")]
    #[test_case("One, Two,Three", &["One", "Two", "Three"]; "mixed spacing")]
    #[test_case(" UR-1 ,, UR-2 ,", &["UR-1", "UR-2"]; "blank items dropped")]
    fn split_links_cases(input: &str, expected: &[&str]) {
        assert_eq!(split_links(input), expected);
    }

    #[test]
    fn parents_and_children() {
        let requirement = Requirement::try_from_pairs([
            ("ID", "SR-1"),
            ("Parent", "UR-1, UR-2"),
            ("Child", "R-01"),
        ])
        .unwrap();
        assert_eq!(requirement.parents(), vec!["UR-1", "UR-2"]);
        assert_eq!(requirement.children(), vec!["R-01"]);
        assert!(Requirement::new().parents().is_empty());
    }
}
