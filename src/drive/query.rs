#![deny(warnings)]

// Structured Drive search query with escaping at serialization time

use std::fmt;

/// One clause of a Drive `q` expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `trashed = false`
    NotTrashed,
    /// `'<folder>' in parents`
    InParents(String),
    /// `name contains '<text>'`
    NameContains(String),
}

/// Conjunction of predicates, rendered as Drive query syntax.
///
/// User-supplied values only ever appear inside single-quoted literals, and
/// are escaped on the way out, so a quote in a search term is matched
/// literally rather than ending the literal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriveQuery {
    predicates: Vec<Predicate>,
}

impl DriveQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Query used by `gdrive_list`: non-trashed files, optionally narrowed
    /// to one folder and a name fragment.
    pub fn for_listing(folder_id: Option<&str>, name_contains: Option<&str>) -> Self {
        let mut query = Self::new().and(Predicate::NotTrashed);
        if let Some(folder) = folder_id {
            query = query.and(Predicate::InParents(folder.to_string()));
        }
        if let Some(text) = name_contains {
            query = query.and(Predicate::NameContains(text.to_string()));
        }
        query
    }

    pub fn and(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

/// Escape a value for use inside a single-quoted Drive query literal
pub fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            _ => out.push(ch),
        }
    }
    out
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::NotTrashed => write!(f, "trashed = false"),
            Predicate::InParents(folder) => write!(f, "'{}' in parents", escape_literal(folder)),
            Predicate::NameContains(text) => write!(f, "name contains '{}'", escape_literal(text)),
        }
    }
}

impl fmt::Display for DriveQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, predicate) in self.predicates.iter().enumerate() {
            if i > 0 {
                f.write_str(" and ")?;
            }
            write!(f, "{}", predicate)?;
        }
        Ok(())
    }
}
