//! Semantic graph (§3.5, §4.7): an append-only `(subject, predicate,
//! object)` triple store over the model's node and stroke URIs.

use uim_identity::{HashId, RandomId};

/// A single RDF-style fact. Subjects and objects are URIs (§4.7's URI
/// scheme); predicates are caller-defined strings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Triple {
    pub subject: String,
    pub predicate: String,
    pub object: String,
}

impl Triple {
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        }
    }
}

/// URI of a stand-alone node, `uim:<uuid>`.
pub fn uri_node(id: RandomId) -> String {
    format!("uim:{}", id.to_h_form())
}

/// URI of a node scoped to a tree, `uim:<tree>/<uuid>`.
pub fn uri_tree_node(tree: &str, id: RandomId) -> String {
    format!("uim:{tree}/{}", id.to_h_form())
}

/// URI of a stroke, `uim:stroke/<uuid>`.
pub fn uri_stroke(id: RandomId) -> String {
    format!("uim:stroke/{}", id.to_h_form())
}

/// URI of a named entity, `uim:ne/<uuid>`.
pub fn uri_named_entity(id: HashId) -> String {
    format!("uim:ne/{}", id.to_h_form())
}

/// URI of a named view, `uim:view/<tree>`.
pub fn uri_view(tree: &str) -> String {
    format!("uim:view/{tree}")
}

/// Rewrites a legacy 3.0.0-style URI (`uim:<uuid>/<tree>`) into the
/// current `uim:<tree>/<uuid>` form. Returns the input unchanged if it
/// doesn't match the legacy shape (§4.7 "legacy URI upgrade").
pub fn upgrade_legacy_uri(uri: &str) -> String {
    let Some(rest) = uri.strip_prefix("uim:") else {
        return uri.to_owned();
    };
    let Some((first, second)) = rest.split_once('/') else {
        return uri.to_owned();
    };
    if is_uuid(first) && !is_uuid(second) {
        format!("uim:{second}/{first}")
    } else {
        uri.to_owned()
    }
}

fn is_uuid(s: &str) -> bool {
    s.len() == 36
        && s.chars().enumerate().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_hexdigit(),
        })
}

/// The append-only triple store (§4.7). Triples are never mutated once
/// added; `remove_by_subject` deletes whole facts rather than editing
/// them, for cascading node removal.
#[derive(Debug, Default)]
pub struct TripleStore {
    triples: Vec<Triple>,
}

impl TripleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, triple: Triple) {
        self.triples.push(triple);
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Positional filter query: `None` in any position matches anything
    /// in that position (§4.7 "filter queries").
    pub fn filter<'a>(
        &'a self,
        subject: Option<&'a str>,
        predicate: Option<&'a str>,
        object: Option<&'a str>,
    ) -> impl Iterator<Item = &'a Triple> + 'a {
        self.triples.iter().filter(move |t| {
            subject.map_or(true, |s| t.subject == s)
                && predicate.map_or(true, |p| t.predicate == p)
                && object.map_or(true, |o| t.object == o)
        })
    }

    /// Removes every triple whose subject equals `subject`, used when a
    /// node is detached from the model (§4.8 "cascading removal").
    pub fn remove_by_subject(&mut self, subject: &str) {
        self.triples.retain(|t| t.subject != subject);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_on_any_subset_of_positions() {
        let mut store = TripleStore::new();
        store.add(Triple::new("uim:a", "p1", "uim:b"));
        store.add(Triple::new("uim:a", "p2", "uim:c"));
        store.add(Triple::new("uim:x", "p1", "uim:y"));

        assert_eq!(store.filter(Some("uim:a"), None, None).count(), 2);
        assert_eq!(store.filter(None, Some("p1"), None).count(), 2);
        assert_eq!(store.filter(Some("uim:a"), Some("p2"), None).count(), 1);
    }

    #[test]
    fn adding_an_identical_triple_twice_keeps_both() {
        let mut store = TripleStore::new();
        store.add(Triple::new("uim:a", "p", "uim:b"));
        store.add(Triple::new("uim:a", "p", "uim:b"));
        assert_eq!(store.len(), 2);
        assert_eq!(store.filter(Some("uim:a"), Some("p"), Some("uim:b")).count(), 2);
    }

    #[test]
    fn remove_by_subject_drops_every_matching_triple() {
        let mut store = TripleStore::new();
        store.add(Triple::new("uim:a", "p1", "uim:b"));
        store.add(Triple::new("uim:a", "p2", "uim:c"));
        store.add(Triple::new("uim:x", "p1", "uim:y"));
        store.remove_by_subject("uim:a");
        assert_eq!(store.len(), 1);
        assert_eq!(store.filter(Some("uim:x"), None, None).count(), 1);
    }

    #[test]
    fn legacy_uri_is_upgraded_to_tree_first_form() {
        let legacy = "uim:550e8400-e29b-41d4-a716-446655440000/main";
        assert_eq!(
            upgrade_legacy_uri(legacy),
            "uim:main/550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn non_legacy_uris_pass_through_unchanged() {
        let current = "uim:main/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(upgrade_legacy_uri(current), current);
        assert_eq!(upgrade_legacy_uri("uim:stroke/not-a-uuid"), "uim:stroke/not-a-uuid");
    }
}
