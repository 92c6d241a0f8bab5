//! The public options surface.
//!
//! `ReadOptions` is a chained builder covering the full option set the
//! field plan resolver understands: field selection, renames and
//! overrides, sample selection, region filtering, chunking and
//! buffering, and post-chunk transformers.

use std::collections::HashMap;

use crate::transform::Transformer;

/// Which fields to materialise.
#[derive(Debug, Clone)]
pub enum FieldSelector {
    /// `*`: every fixed, computed, INFO and FORMAT field, plus `samples`.
    All,
    /// `variants/*`, `calldata/*`, `INFO`, or `FILTER`.
    Group(Group),
    /// An explicit list of logical names (short or canonical form).
    List(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    VariantsAll,
    CalldataAll,
    Info,
    Filter,
}

impl Default for FieldSelector {
    fn default() -> Self {
        FieldSelector::All
    }
}

/// Sample sub-selection, by identifier or by index. Both forms are
/// resolved to the same bit mask against the header's sample list, so
/// they are equivalent ways of expressing the same selection.
#[derive(Debug, Clone)]
pub enum SampleSelection {
    All,
    Ids(Vec<String>),
    Indices(Vec<usize>),
}

impl Default for SampleSelection {
    fn default() -> Self {
        SampleSelection::All
    }
}

/// A region predicate, `chrom` or `chrom:start-end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub chrom: String,
    pub start: Option<u64>,
    pub end: Option<u64>,
}

impl Region {
    pub fn parse(spec: &str) -> Option<Region> {
        match spec.split_once(':') {
            None => Some(Region {
                chrom: spec.to_string(),
                start: None,
                end: None,
            }),
            Some((chrom, range)) => {
                let (start, end) = range.split_once('-')?;
                Some(Region {
                    chrom: chrom.to_string(),
                    start: start.parse().ok(),
                    end: end.parse().ok(),
                })
            }
        }
    }

    pub fn contains(&self, chrom: &str, pos: u64) -> bool {
        if chrom != self.chrom {
            return false;
        }
        if let Some(start) = self.start {
            if pos < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if pos > end {
                return false;
            }
        }
        true
    }
}

/// Default rows per emitted chunk.
pub const DEFAULT_CHUNK_LENGTH: usize = 65536;

/// Full options surface recognised on the public entry points.
#[derive(Default)]
pub struct ReadOptions {
    pub fields: FieldSelector,
    pub exclude_fields: Vec<String>,
    pub rename_fields: HashMap<String, String>,
    pub types: HashMap<String, String>,
    pub numbers: HashMap<String, u32>,
    pub fills: HashMap<String, crate::dtype::FillValue>,
    pub alt_number: usize,
    pub samples: SampleSelection,
    pub region: Option<Region>,
    pub chunk_length: usize,
    pub buffer_size: usize,
    pub transformers: Vec<Box<dyn Transformer>>,
}

impl ReadOptions {
    pub fn new() -> Self {
        ReadOptions {
            fields: FieldSelector::All,
            exclude_fields: Vec::new(),
            rename_fields: HashMap::new(),
            types: HashMap::new(),
            numbers: HashMap::new(),
            fills: HashMap::new(),
            alt_number: 3,
            samples: SampleSelection::All,
            region: None,
            chunk_length: DEFAULT_CHUNK_LENGTH,
            buffer_size: crate::source::DEFAULT_BUFFER_SIZE,
            transformers: Vec::new(),
        }
    }

    pub fn fields(mut self, fields: FieldSelector) -> Self {
        self.fields = fields;
        self
    }

    pub fn exclude_fields(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.exclude_fields = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn rename_field(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rename_fields.insert(from.into(), to.into());
        self
    }

    pub fn type_override(mut self, name: impl Into<String>, ty: impl Into<String>) -> Self {
        self.types.insert(name.into(), ty.into());
        self
    }

    pub fn number_override(mut self, name: impl Into<String>, n: u32) -> Self {
        self.numbers.insert(name.into(), n);
        self
    }

    pub fn fill_override(mut self, name: impl Into<String>, fill: crate::dtype::FillValue) -> Self {
        self.fills.insert(name.into(), fill);
        self
    }

    pub fn alt_number(mut self, n: usize) -> Self {
        self.alt_number = n;
        self
    }

    pub fn samples(mut self, selection: SampleSelection) -> Self {
        self.samples = selection;
        self
    }

    pub fn region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn chunk_length(mut self, n: usize) -> Self {
        self.chunk_length = n.max(1);
        self
    }

    pub fn buffer_size(mut self, n: usize) -> Self {
        self.buffer_size = n;
        self
    }

    pub fn transformer(mut self, t: Box<dyn Transformer>) -> Self {
        self.transformers.push(t);
        self
    }
}
