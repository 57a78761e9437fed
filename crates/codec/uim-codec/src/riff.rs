//! Low-level RIFF container framing (§4.9):
//!
//! ```text
//! offset 0   "RIFF"
//! offset 4   u32 LE total payload size (bytes after this field)
//! offset 8   "UINK"
//! offset 12  chunks: tag(4) + length(u32 LE) + payload + pad(0 or 1)
//! ```
//!
//! This layer knows nothing about what a chunk's payload means.

use crate::error::{CodecError, Result};

pub(crate) const RIFF: &[u8; 4] = b"RIFF";
pub(crate) const FORM: &[u8; 4] = b"UINK";

pub(crate) const HEAD: &[u8; 4] = b"HEAD";
pub(crate) const DATA: &[u8; 4] = b"DATA";
pub(crate) const INPT: &[u8; 4] = b"INPT";
pub(crate) const BRSH: &[u8; 4] = b"BRSH";
pub(crate) const INKD: &[u8; 4] = b"INKD";
pub(crate) const INKS: &[u8; 4] = b"INKS";
pub(crate) const KNWG: &[u8; 4] = b"KNWG";
pub(crate) const PRPS: &[u8; 4] = b"PRPS";

#[derive(Debug, Clone)]
pub(crate) struct Chunk {
    pub tag: [u8; 4],
    pub payload: Vec<u8>,
}

pub(crate) struct ChunkWriter {
    chunks: Vec<Chunk>,
}

impl ChunkWriter {
    pub(crate) fn new() -> Self {
        Self { chunks: Vec::new() }
    }

    pub(crate) fn push(&mut self, tag: &[u8; 4], payload: Vec<u8>) {
        self.chunks.push(Chunk {
            tag: *tag,
            payload,
        });
    }

    /// Writes the full `RIFF`/size/`UINK` envelope around every pushed
    /// chunk (§4.9 Table: byte-exact container layout).
    pub(crate) fn finish(self) -> Vec<u8> {
        let mut body = Vec::new();
        body.extend_from_slice(FORM);
        for chunk in self.chunks {
            body.extend_from_slice(&chunk.tag);
            body.extend_from_slice(&(chunk.payload.len() as u32).to_le_bytes());
            body.extend_from_slice(&chunk.payload);
            if chunk.payload.len() % 2 == 1 {
                body.push(0);
            }
        }

        let mut out = Vec::with_capacity(8 + body.len());
        out.extend_from_slice(RIFF);
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }
}

pub(crate) fn read_chunks(bytes: &[u8]) -> Result<Vec<Chunk>> {
    if bytes.len() < 12 || &bytes[0..4] != RIFF {
        return Err(CodecError::FormatError(
            "missing or invalid RIFF magic".into(),
        ));
    }
    let declared_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
    if declared_len > bytes.len() - 8 {
        return Err(CodecError::FormatError(format!(
            "RIFF payload size {declared_len} exceeds {} bytes actually present",
            bytes.len() - 8
        )));
    }
    if &bytes[8..12] != FORM {
        return Err(CodecError::FormatError(
            "missing or invalid UINK form type".into(),
        ));
    }

    let end = 8 + declared_len;
    let mut chunks = Vec::new();
    let mut cursor = 12usize;
    while cursor < end {
        if cursor + 8 > end {
            return Err(CodecError::FormatError("truncated chunk header".into()));
        }
        let mut tag = [0u8; 4];
        tag.copy_from_slice(&bytes[cursor..cursor + 4]);
        let len = u32::from_le_bytes(bytes[cursor + 4..cursor + 8].try_into().unwrap()) as usize;
        cursor += 8;
        if cursor + len > end {
            return Err(CodecError::FormatError(format!(
                "chunk {:?} declares length {len} past end of container",
                String::from_utf8_lossy(&tag)
            )));
        }
        let payload = bytes[cursor..cursor + len].to_vec();
        cursor += len;
        if len % 2 == 1 {
            cursor += 1;
        }
        chunks.push(Chunk { tag, payload });
    }
    Ok(chunks)
}

pub(crate) fn find<'a>(chunks: &'a [Chunk], tag: &[u8; 4]) -> Option<&'a Chunk> {
    chunks.iter().find(|c| &c.tag == tag)
}
