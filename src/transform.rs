//! Transformer hook.
//!
//! A transformer runs once per chunk, after the chunk is fully populated
//! and before it is handed to the consumer, rewriting the chunk's field
//! set. Modelling this as an explicit post-pass (rather than an inline
//! write-time hook) keeps composite-field expansion testable in isolation
//! against a chunk fixture.

use crate::chunk::Chunk;
use crate::dtype::{DType, FillValue};
use crate::error::Result;

/// A post-parse, pre-emit rewriter over a completed chunk.
pub trait Transformer: std::fmt::Debug {
    /// Rewrite `chunk` in place: add, replace or remove fields.
    fn transform(&self, chunk: &mut Chunk) -> Result<()>;
}

/// Splits a `|`-separated structured INFO field (the canonical example
/// being a variant-annotation field such as `ANN`/`CSQ`) into one column
/// per named sub-field.
///
/// Given `source = "variants/ANN"` and `subfields = ["Allele", "Effect",
/// "Impact"]`, a cell `"A|missense_variant|MODERATE"` becomes three
/// columns `variants/ANN_Allele`, `variants/ANN_Effect`,
/// `variants/ANN_Impact`. Multiple `,`-separated annotations on one
/// record take the first annotation's breakdown (matching the common
/// single-transcript-of-interest usage); records with fewer sub-fields
/// than declared leave the remaining output columns at their fill.
#[derive(Debug, Clone)]
pub struct AnnotationSplitter {
    pub source: String,
    pub subfields: Vec<(String, DType)>,
}

impl AnnotationSplitter {
    pub fn new(source: impl Into<String>, subfields: Vec<(String, DType)>) -> Self {
        AnnotationSplitter {
            source: source.into(),
            subfields,
        }
    }
}

impl Transformer for AnnotationSplitter {
    fn transform(&self, chunk: &mut Chunk) -> Result<()> {
        let Some(source) = chunk.field(&self.source) else {
            return Ok(());
        };
        let crate::buffer::ColumnData::VarStr(values) = &source.data else {
            return Ok(());
        };
        let rows = source.rows();
        let raw: Vec<String> = values.clone();

        let mut new_columns: Vec<crate::buffer::ColumnBuffer> = self
            .subfields
            .iter()
            .map(|(name, dtype)| {
                let fill = FillValue::default_for(dtype);
                crate::buffer::ColumnBuffer::allocate(
                    format!("{}_{}", self.source, name),
                    dtype,
                    rows,
                    0,
                    1,
                    &fill,
                )
            })
            .collect();

        for (row, raw_cell) in raw.iter().enumerate().take(rows) {
            if raw_cell.is_empty() {
                continue;
            }
            let first_annotation = raw_cell.split(',').next().unwrap_or("");
            let parts: Vec<&str> = first_annotation.split('|').collect();
            for (i, column) in new_columns.iter_mut().enumerate() {
                let Some(raw_value) = parts.get(i) else { continue };
                write_subfield_cell(column, row, raw_value);
            }
        }

        chunk.columns.retain(|c| c.name != self.source);
        chunk.columns.append(&mut new_columns);
        Ok(())
    }
}

fn write_subfield_cell(column: &mut crate::buffer::ColumnBuffer, row: usize, raw: &str) {
    match &column.data {
        crate::buffer::ColumnData::VarStr(_) => column.set_str(row, 0, 0, raw),
        crate::buffer::ColumnData::FixedStr { .. } => column.set_str(row, 0, 0, raw),
        crate::buffer::ColumnData::I8(_)
        | crate::buffer::ColumnData::I16(_)
        | crate::buffer::ColumnData::I32(_)
        | crate::buffer::ColumnData::I64(_) => {
            if let Ok(v) = raw.parse::<i64>() {
                column.set_int(row, 0, 0, v);
            }
        }
        crate::buffer::ColumnData::F32(_) | crate::buffer::ColumnData::F64(_) => {
            if let Ok(v) = raw.parse::<f64>() {
                column.set_float(row, 0, 0, v);
            }
        }
        crate::buffer::ColumnData::Bool(_) => {
            column.set_bool(row, 0, 0, !raw.is_empty());
        }
    }
}
