//! A streaming, columnar reader for the Variant Call Format (VCF).
//!
//! Rather than handing back one struct per record, [`read_vcf`] (and the
//! lower-level [`VcfReader`]) parse a VCF file into fixed-shape, typed
//! column buffers (`variants/POS`, `calldata/GT`, and so on), the same
//! array-oriented shape a columnar analysis library would want, produced
//! in bounded-size [`Chunk`]s so a whole-genome file never has to fit in
//! memory at once.
//!
//! ```no_run
//! use vcfire::{read_vcf, ReadOptions};
//!
//! let chunks = read_vcf("sample.vcf.gz", ReadOptions::new())?;
//! for chunk in &chunks {
//!     let pos = chunk.field("variants/POS").unwrap();
//!     println!("{} records, {} samples", chunk.n_records, chunk.samples.len());
//! }
//! # Ok::<(), vcfire::Error>(())
//! ```

pub mod buffer;
pub mod chunk;
pub mod computed;
pub mod dtype;
pub mod engine;
pub mod error;
pub mod header;
pub mod logging;
pub mod options;
pub mod plan;
pub mod record;
pub mod source;
pub mod transform;

pub use buffer::{ColumnBuffer, ColumnData};
pub use chunk::Chunk;
pub use dtype::{DType, FillValue, FloatWidth, IntWidth};
pub use engine::{read_vcf, read_vcf_headers, read_vcf_regions_parallel, VcfReader};
pub use error::{Error, Result, Warning, WarningKind};
pub use header::{FilterMeta, FormatMeta, InfoMeta, Number, ValueType, VcfHeader};
pub use options::{FieldSelector, Group, ReadOptions, Region, SampleSelection};
pub use plan::{FieldOrigin, FieldPlan, PlannedField, WriterKind};
pub use transform::{AnnotationSplitter, Transformer};
