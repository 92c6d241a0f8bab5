//! Chunk production.
//!
//! A [`Chunk`] is a fixed-maximum-row batch of named column buffers,
//! emitted together once `chunk_length` rows have been filled or the
//! input is exhausted. The last chunk of an input is truncated to the
//! actual number of records seen.

use crate::buffer::ColumnBuffer;

/// One batch of columnar arrays, in input order, plus the sample
/// identifiers selected for this read (repeated on every chunk so a
/// transformer or sink never has to look elsewhere for them).
#[derive(Debug, Clone)]
pub struct Chunk {
    pub n_records: usize,
    pub columns: Vec<ColumnBuffer>,
    pub samples: Vec<String>,
}

impl Chunk {
    pub fn field(&self, name: &str) -> Option<&ColumnBuffer> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut ColumnBuffer> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// `true` if this chunk produced no records. The emitter uses this to
    /// signal sinks that would otherwise create an empty output file not
    /// to bother.
    pub fn is_empty(&self) -> bool {
        self.n_records == 0
    }
}
