//! Template source assembled from input chunks.
//!
//! Templates arrive as a sequence of byte chunks (a stream, a socket, a
//! file read in pieces). Scanning needs the complete document, so the
//! buffer collects every chunk first and validates UTF-8 once at the end.
//! Chunk boundaries may split multi-byte characters; validation only
//! happens on the joined bytes.
//!
//! # Encoding
//!
//! A leading UTF-8 byte order mark is dropped. Invalid UTF-8 is reported as
//! [`ScanError::InvalidUtf8`] with the offset of the first bad byte.

use crate::ScanError;

/// UTF-8 byte order mark.
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Growable buffer for template source.
#[derive(Clone, Debug, Default)]
pub struct SourceBuffer {
    bytes: Vec<u8>,
    chunks: usize,
}

impl SourceBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer that already holds `source`.
    pub fn from_text(source: &str) -> Self {
        SourceBuffer {
            bytes: source.as_bytes().to_vec(),
            chunks: 1,
        }
    }

    /// Append one input chunk.
    pub fn push(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
        self.chunks += 1;
    }

    /// Number of bytes collected so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of chunks pushed.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Finish reading and return the template text.
    pub fn finish(self) -> Result<String, ScanError> {
        let mut bytes = self.bytes;
        if bytes.starts_with(UTF8_BOM) {
            bytes.drain(..UTF8_BOM.len());
        }
        String::from_utf8(bytes).map_err(|err| ScanError::InvalidUtf8 {
            offset: err.utf8_error().valid_up_to(),
        })
    }
}
