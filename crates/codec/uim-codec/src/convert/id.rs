//! `Id128` conversions shared by every chunk converter.

use uim_identity::{HashId, RandomId};

pub(crate) fn hash_id_to_proto(id: HashId) -> uim_proto::Id128 {
    value_to_proto(id.id().value())
}

pub(crate) fn hash_id_from_proto(id: &uim_proto::Id128) -> HashId {
    HashId::from_u128(proto_to_value(id))
}

pub(crate) fn random_id_to_proto(id: RandomId) -> uim_proto::Id128 {
    value_to_proto(id.id().value())
}

pub(crate) fn random_id_from_proto(id: &uim_proto::Id128) -> RandomId {
    RandomId::from_u128(proto_to_value(id))
}

pub(crate) fn opt_hash_id_to_proto(id: Option<HashId>) -> Option<uim_proto::Id128> {
    id.map(hash_id_to_proto)
}

pub(crate) fn opt_hash_id_from_proto(id: &Option<uim_proto::Id128>) -> Option<HashId> {
    id.as_ref().map(hash_id_from_proto)
}

pub(crate) fn opt_random_id_to_proto(id: Option<RandomId>) -> Option<uim_proto::Id128> {
    id.map(random_id_to_proto)
}

pub(crate) fn opt_random_id_from_proto(id: &Option<uim_proto::Id128>) -> Option<RandomId> {
    id.as_ref().map(random_id_from_proto)
}

fn value_to_proto(value: u128) -> uim_proto::Id128 {
    uim_proto::Id128 {
        hi: (value >> 64) as u64,
        lo: value as u64,
    }
}

fn proto_to_value(id: &uim_proto::Id128) -> u128 {
    ((id.hi as u128) << 64) | id.lo as u128
}
