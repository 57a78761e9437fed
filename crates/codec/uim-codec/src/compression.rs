//! Per-chunk payload compression (§4.9): the HEAD chunk names one scheme
//! applied uniformly to every other chunk's payload.

use std::io::{Read, Write};

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression as ZlibLevel;

use crate::config::Compression;
use crate::error::{CodecError, Result};

pub(crate) fn compress(scheme: Compression, data: &[u8]) -> Result<Vec<u8>> {
    match scheme {
        Compression::None => Ok(data.to_vec()),
        Compression::Zip => {
            let mut encoder = ZlibEncoder::new(Vec::new(), ZlibLevel::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        Compression::Lzma => {
            let mut encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
    }
}

pub(crate) fn decompress(scheme: Compression, data: &[u8]) -> Result<Vec<u8>> {
    match scheme {
        Compression::None => Ok(data.to_vec()),
        Compression::Zip => {
            let mut decoder = ZlibDecoder::new(data);
            let mut out = Vec::new();
            decoder.read_to_end(&mut out)?;
            Ok(out)
        }
        Compression::Lzma => {
            let mut decoder = xz2::read::XzDecoder::new(data);
            let mut out = Vec::new();
            decoder
                .read_to_end(&mut out)
                .map_err(|e| CodecError::FormatError(format!("lzma decompression failed: {e}")))?;
            Ok(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zip_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let compressed = compress(Compression::Zip, &data).unwrap();
        let decompressed = decompress(Compression::Zip, &compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn lzma_round_trips() {
        let data = b"the quick brown fox jumps over the lazy dog".repeat(8);
        let compressed = compress(Compression::Lzma, &data).unwrap();
        let decompressed = decompress(Compression::Lzma, &compressed).unwrap();
        assert_eq!(decompressed, data);
    }

    #[test]
    fn none_is_a_pass_through() {
        let data = b"raw".to_vec();
        assert_eq!(compress(Compression::None, &data).unwrap(), data);
        assert_eq!(decompress(Compression::None, &data).unwrap(), data);
    }
}
