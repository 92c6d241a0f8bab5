//! Error and warning types.
//!
//! Structural failures are represented by [`Error`] and
//! stop the parse. Recoverable anomalies are represented by [`Warning`] and
//! never stop the parse: the offending cell keeps its configured fill value,
//! a [`Warning`] is pushed to the caller-visible warning log, and parsing
//! continues with the next field.

use std::fmt;

/// Structural, unrecoverable failures.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The underlying byte source (file, stream, decompressor) returned an
    /// I/O error.
    #[error("I/O failure reading VCF input: {0}")]
    IoFailure(#[from] std::io::Error),

    /// The input did not look like a VCF file: no header, or the `#CHROM`
    /// line was never seen.
    #[error("malformed VCF input: {0}")]
    MalformedInput(String),

    /// A field plan produced two fields whose canonical names collide
    /// case-insensitively, and the caller asked for that to be treated as
    /// fatal (see [`crate::plan::FieldPlan::case_insensitive_collisions`]).
    #[error("duplicate field in case-insensitive key space: {0}")]
    DuplicateField(String),

    /// The caller supplied contradictory or unparseable overrides (an
    /// unknown type token, a cardinality override incompatible with the
    /// field's declared shape, and so on).
    #[error("invalid field plan: {0}")]
    InvalidPlan(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A recoverable parse anomaly, always tied to the 1-based line number of
/// the record (or header line) it was observed on.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub line: u64,
    pub kind: WarningKind,
}

impl Warning {
    pub fn new(line: u64, kind: WarningKind) -> Self {
        Warning { line, kind }
    }

    /// Emit this warning through the `log` facade and return it, so call
    /// sites can both collect it and have it show up on a live log stream.
    pub fn log(self) -> Self {
        log::warn!("line {}: {}", self.line, self.kind);
        self
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WarningKind {
    /// A `##FILTER`/`##INFO`/`##FORMAT` id was declared more than once in
    /// the header.
    DuplicateHeader { id: String },
    /// The caller requested a field that is neither declared in the header
    /// nor one of the fixed/computed fields.
    UnknownField { name: String },
    /// An integer/float cell had empty, missing, or non-numeric content.
    ParseValue { field: String, raw: String },
    /// A record had more sample columns than the header declared.
    ExtraSamples { expected: usize, found: usize },
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarningKind::DuplicateHeader { id } => {
                write!(f, "duplicate header declaration for '{id}'")
            }
            WarningKind::UnknownField { name } => {
                write!(f, "requested field '{name}' is not declared in the header")
            }
            WarningKind::ParseValue { field, raw } => {
                write!(f, "could not parse value '{raw}' for field '{field}'")
            }
            WarningKind::ExtraSamples { expected, found } => write!(
                f,
                "record has {found} sample columns, header declares {expected}"
            ),
        }
    }
}
