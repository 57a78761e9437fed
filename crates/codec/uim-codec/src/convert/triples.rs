//! KNWG chunk conversion: [`uim_model::semantic::TripleStore`] <-> [`uim_proto`].

use uim_model::semantic::{Triple, TripleStore};

pub(crate) fn to_proto(store: &TripleStore) -> uim_proto::TripleStore {
    uim_proto::TripleStore {
        triples: store
            .iter()
            .map(|t| uim_proto::Triple {
                subject: t.subject.clone(),
                predicate: t.predicate.clone(),
                object: t.object.clone(),
            })
            .collect(),
    }
}

pub(crate) fn from_proto(proto: &uim_proto::TripleStore) -> TripleStore {
    let mut store = TripleStore::new();
    for t in &proto.triples {
        store.add(Triple::new(
            t.subject.clone(),
            t.predicate.clone(),
            t.object.clone(),
        ));
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_triples_in_order() {
        let mut store = TripleStore::new();
        store.add(Triple::new("uim:stroke/a", "p1", "o1"));
        store.add(Triple::new("uim:stroke/a", "p2", "o2"));

        let proto = to_proto(&store);
        let restored = from_proto(&proto);
        assert_eq!(restored.iter().count(), 2);
        assert_eq!(restored.iter().next().unwrap().predicate, "p1");
    }
}
