//! Generated protobuf message types for every RIFF chunk payload (§4.9).
//! `uim-codec` maps these onto `uim-model`'s in-memory types; nothing in
//! this crate knows about RIFF framing or the in-memory model itself.

#![allow(clippy::all)]

include!(concat!(env!("OUT_DIR"), "/uim.rs"));
