//! Column buffers: pre-allocated, fixed-shape typed arrays.
//!
//! A buffer is allocated at chunk start with every cell set to the field's
//! fill value, written in place as records are scanned, then logically
//! truncated to the actual row count and handed to the consumer at chunk
//! end. Ownership of the backing `Vec` transfers to the consumer once a
//! chunk is emitted.

use crate::dtype::{DType, FillValue};

/// A single planned field's data for one chunk.
#[derive(Debug, Clone)]
pub struct ColumnBuffer {
    pub name: String,
    /// Number of samples this field carries per record: 0 for
    /// `variants/*` fields (and the `samples` array itself, which is
    /// handled separately), `n_selected_samples` for `calldata/*` fields.
    pub n_samples: usize,
    /// Trailing (vector/genotype) dimension; 1 for scalars.
    pub item_len: usize,
    pub data: ColumnData,
}

#[derive(Debug, Clone)]
pub enum ColumnData {
    I8(Vec<i8>),
    I16(Vec<i16>),
    I32(Vec<i32>),
    I64(Vec<i64>),
    F32(Vec<f32>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    /// NUL-padded/truncated fixed-width byte strings, `rows * samples_dim
    /// * item_len * width` bytes laid out cell-major.
    FixedStr { width: usize, bytes: Vec<u8> },
    VarStr(Vec<String>),
}

impl ColumnBuffer {
    /// Allocate a buffer for `rows` records, pre-filled with `fill`.
    pub fn allocate(
        name: impl Into<String>,
        dtype: &DType,
        rows: usize,
        n_samples: usize,
        item_len: usize,
        fill: &FillValue,
    ) -> ColumnBuffer {
        let cells = rows * n_samples.max(1) * item_len;
        let data = match dtype {
            DType::Int(crate::dtype::IntWidth::I8) => ColumnData::I8(vec![fill.as_int() as i8; cells]),
            DType::Int(crate::dtype::IntWidth::I16) => {
                ColumnData::I16(vec![fill.as_int() as i16; cells])
            }
            DType::Int(crate::dtype::IntWidth::I32) => {
                ColumnData::I32(vec![fill.as_int() as i32; cells])
            }
            DType::Int(crate::dtype::IntWidth::I64) => ColumnData::I64(vec![fill.as_int(); cells]),
            DType::Float(crate::dtype::FloatWidth::F32) => {
                ColumnData::F32(vec![fill.as_float() as f32; cells])
            }
            DType::Float(crate::dtype::FloatWidth::F64) => {
                ColumnData::F64(vec![fill.as_float(); cells])
            }
            DType::Bool => ColumnData::Bool(vec![fill.as_bool(); cells]),
            DType::FixedString(width) => {
                let mut bytes = vec![0u8; cells * width];
                let fill_bytes = fill.as_str().as_bytes();
                for cell in 0..cells {
                    let start = cell * width;
                    let n = fill_bytes.len().min(*width);
                    bytes[start..start + n].copy_from_slice(&fill_bytes[..n]);
                }
                ColumnData::FixedStr { width: *width, bytes }
            }
            DType::VarString => ColumnData::VarStr(vec![fill.as_str().to_string(); cells]),
        };

        ColumnBuffer {
            name: name.into(),
            n_samples,
            item_len,
            data,
        }
    }

    #[inline]
    fn index(&self, row: usize, sample: usize, sub: usize) -> usize {
        let samples_dim = self.n_samples.max(1);
        (row * samples_dim + sample) * self.item_len + sub
    }

    pub fn set_int(&mut self, row: usize, sample: usize, sub: usize, value: i64) {
        let idx = self.index(row, sample, sub);
        match &mut self.data {
            ColumnData::I8(v) => {
                if idx < v.len() {
                    v[idx] = value as i8;
                }
            }
            ColumnData::I16(v) => {
                if idx < v.len() {
                    v[idx] = value as i16;
                }
            }
            ColumnData::I32(v) => {
                if idx < v.len() {
                    v[idx] = value as i32;
                }
            }
            ColumnData::I64(v) => {
                if idx < v.len() {
                    v[idx] = value;
                }
            }
            ColumnData::F32(v) => {
                if idx < v.len() {
                    v[idx] = value as f32;
                }
            }
            ColumnData::F64(v) => {
                if idx < v.len() {
                    v[idx] = value as f64;
                }
            }
            _ => {}
        }
    }

    pub fn set_float(&mut self, row: usize, sample: usize, sub: usize, value: f64) {
        let idx = self.index(row, sample, sub);
        match &mut self.data {
            ColumnData::F32(v) => {
                if idx < v.len() {
                    v[idx] = value as f32;
                }
            }
            ColumnData::F64(v) => {
                if idx < v.len() {
                    v[idx] = value;
                }
            }
            ColumnData::I32(v) => {
                if idx < v.len() {
                    v[idx] = value as i32;
                }
            }
            ColumnData::I64(v) => {
                if idx < v.len() {
                    v[idx] = value as i64;
                }
            }
            _ => {}
        }
    }

    pub fn set_bool(&mut self, row: usize, sample: usize, sub: usize, value: bool) {
        let idx = self.index(row, sample, sub);
        if let ColumnData::Bool(v) = &mut self.data {
            if idx < v.len() {
                v[idx] = value;
            }
        }
    }

    pub fn set_str(&mut self, row: usize, sample: usize, sub: usize, value: &str) {
        let idx = self.index(row, sample, sub);
        match &mut self.data {
            ColumnData::VarStr(v) => {
                if idx < v.len() {
                    v[idx] = value.to_string();
                }
            }
            ColumnData::FixedStr { width, bytes } => {
                let start = idx * *width;
                if start + *width <= bytes.len() {
                    let slot = &mut bytes[start..start + *width];
                    slot.fill(0);
                    let raw = value.as_bytes();
                    let n = raw.len().min(*width);
                    slot[..n].copy_from_slice(&raw[..n]);
                }
            }
            _ => {}
        }
    }

    /// Logically slice the buffer down to `rows` records (chunk truncation
    /// at end of input).
    pub fn truncate_rows(&mut self, rows: usize) {
        let cells = rows * self.n_samples.max(1) * self.item_len;
        match &mut self.data {
            ColumnData::I8(v) => v.truncate(cells),
            ColumnData::I16(v) => v.truncate(cells),
            ColumnData::I32(v) => v.truncate(cells),
            ColumnData::I64(v) => v.truncate(cells),
            ColumnData::F32(v) => v.truncate(cells),
            ColumnData::F64(v) => v.truncate(cells),
            ColumnData::Bool(v) => v.truncate(cells),
            ColumnData::FixedStr { width, bytes } => bytes.truncate(cells * *width),
            ColumnData::VarStr(v) => v.truncate(cells),
        }
    }

    /// The buffer's logical row count, given its current (possibly
    /// truncated) cell count.
    pub fn rows(&self) -> usize {
        let stride = self.n_samples.max(1) * self.item_len;
        if stride == 0 {
            return 0;
        }
        match &self.data {
            ColumnData::I8(v) => v.len() / stride,
            ColumnData::I16(v) => v.len() / stride,
            ColumnData::I32(v) => v.len() / stride,
            ColumnData::I64(v) => v.len() / stride,
            ColumnData::F32(v) => v.len() / stride,
            ColumnData::F64(v) => v.len() / stride,
            ColumnData::Bool(v) => v.len() / stride,
            ColumnData::FixedStr { width, bytes } => bytes.len() / (stride * width.max(&1)),
            ColumnData::VarStr(v) => v.len() / stride,
        }
    }
}
