//! Data-record parsing and per-field write dispatch.
//!
//! A record is split once into its fixed columns and a raw FORMAT/SAMPLE
//! tail (no allocation beyond the `Vec` of sample slices), then each
//! planned field reads whatever sub-slice of that line it needs and
//! writes straight into its preallocated [`ColumnBuffer`]. Writer
//! dispatch is a `match` on the field's statically decided [`WriterKind`],
//! not a trait object: the plan fixes this once per read, not per value.

use crate::buffer::ColumnBuffer;
use crate::chunk::Chunk;
use crate::error::{Warning, WarningKind};
use crate::header::VcfHeader;
use crate::plan::{FieldOrigin, FieldPlan, FixedColumn, PlannedField, WriterKind};

pub const MISSING: &str = ".";

/// One data line, split into its fixed columns and raw FORMAT/SAMPLE tail.
pub struct RawRecord<'a> {
    pub chrom: &'a str,
    pub pos: &'a str,
    pub id: &'a str,
    pub reference: &'a str,
    pub alt: &'a str,
    pub qual: &'a str,
    pub filter: &'a str,
    pub info: &'a str,
    pub format: Option<&'a str>,
    pub samples: Vec<&'a str>,
}

impl<'a> RawRecord<'a> {
    pub fn alts(&self) -> Vec<&'a str> {
        if self.alt.is_empty() || self.alt == MISSING {
            Vec::new()
        } else {
            self.alt.split(',').collect()
        }
    }

    pub fn filters(&self) -> Vec<&'a str> {
        if self.filter.is_empty() || self.filter == MISSING {
            Vec::new()
        } else {
            self.filter.split(';').collect()
        }
    }
}

/// Split one tab-delimited data line. Returns `None` (after warning) if the
/// line is truncated before CHROM/POS; a short tail beyond that is padded
/// with `.`/empty, matching the per-column missing-value convention.
pub fn split_record<'a>(
    line: &'a str,
    line_no: u64,
    header: &VcfHeader,
    warnings: &mut Vec<Warning>,
) -> Option<RawRecord<'a>> {
    let mut fields = line.split('\t');
    let chrom = fields.next().filter(|s| !s.is_empty());
    let pos = fields.next();
    let (chrom, pos) = match (chrom, pos) {
        (Some(c), Some(p)) => (c, p),
        _ => {
            warnings.push(
                Warning::new(
                    line_no,
                    WarningKind::ParseValue {
                        field: "CHROM/POS".to_string(),
                        raw: line.to_string(),
                    },
                )
                .log(),
            );
            return None;
        }
    };
    let id = fields.next().unwrap_or(MISSING);
    let reference = fields.next().unwrap_or(MISSING);
    let alt = fields.next().unwrap_or(MISSING);
    let qual = fields.next().unwrap_or(MISSING);
    let filter = fields.next().unwrap_or(MISSING);
    let info = fields.next().unwrap_or("");
    let format = fields.next();
    let samples: Vec<&str> = fields.collect();

    if !header.samples.is_empty() && !samples.is_empty() && samples.len() != header.samples.len() {
        warnings.push(
            Warning::new(
                line_no,
                WarningKind::ExtraSamples {
                    expected: header.samples.len(),
                    found: samples.len(),
                },
            )
            .log(),
        );
    }

    Some(RawRecord {
        chrom,
        pos,
        id,
        reference,
        alt,
        qual,
        filter,
        info,
        format,
        samples,
    })
}

/// Write every planned field's value for this record into `chunk` at
/// `row`. Computed fields (`numalt`, `altlen`, `is_snp`) are left untouched
/// here; [`crate::computed`] fills them in from the same `RawRecord` in a
/// separate pass once ALT/REF are known to every consumer that needs them.
pub fn write_record(
    raw: &RawRecord,
    line_no: u64,
    plan: &FieldPlan,
    chunk: &mut Chunk,
    row: usize,
    warnings: &mut Vec<Warning>,
) {
    let filters = raw.filters();

    for field in &plan.fields {
        match &field.origin {
            FieldOrigin::Fixed(fixed) => {
                if let Some(column) = chunk.field_mut(&field.name) {
                    write_fixed(column, *fixed, raw, row, line_no, warnings);
                }
            }
            FieldOrigin::FilterTag(tag) => {
                if let Some(column) = chunk.field_mut(&field.name) {
                    write_filter_tag(column, tag, &filters, row);
                }
            }
            FieldOrigin::Info(id) => {
                if let Some(column) = chunk.field_mut(&field.name) {
                    write_info(column, id, raw.info, field, row, line_no, warnings);
                }
            }
            FieldOrigin::Format(id) => {
                if let Some(column) = chunk.field_mut(&field.name) {
                    write_format(column, id, raw, field, plan, row, line_no, warnings);
                }
            }
            FieldOrigin::Computed(_) | FieldOrigin::Samples => {}
        }
    }
}

fn write_fixed(
    column: &mut ColumnBuffer,
    fixed: FixedColumn,
    raw: &RawRecord,
    row: usize,
    line_no: u64,
    warnings: &mut Vec<Warning>,
) {
    match fixed {
        FixedColumn::Chrom => column.set_str(row, 0, 0, raw.chrom),
        FixedColumn::Id => {
            if raw.id != MISSING {
                column.set_str(row, 0, 0, raw.id);
            }
        }
        FixedColumn::Ref => column.set_str(row, 0, 0, raw.reference),
        FixedColumn::Alt => {
            for (i, a) in raw.alts().into_iter().enumerate() {
                if i >= column.item_len {
                    break;
                }
                column.set_str(row, 0, i, a);
            }
        }
        FixedColumn::Pos => {
            if raw.pos != MISSING {
                match raw.pos.parse::<i64>() {
                    Ok(v) => column.set_int(row, 0, 0, v),
                    Err(_) => warnings.push(
                        Warning::new(
                            line_no,
                            WarningKind::ParseValue { field: "POS".to_string(), raw: raw.pos.to_string() },
                        )
                        .log(),
                    ),
                }
            }
        }
        FixedColumn::Qual => {
            if raw.qual != MISSING && !raw.qual.is_empty() {
                match raw.qual.parse::<f64>() {
                    Ok(v) => column.set_float(row, 0, 0, v),
                    Err(_) => warnings.push(
                        Warning::new(
                            line_no,
                            WarningKind::ParseValue { field: "QUAL".to_string(), raw: raw.qual.to_string() },
                        )
                        .log(),
                    ),
                }
            }
        }
    }
}

fn write_filter_tag(column: &mut ColumnBuffer, tag: &str, filters: &[&str], row: usize) {
    let present = filters.iter().any(|f| *f == tag);
    column.set_bool(row, 0, 0, present);
}

fn write_info(
    column: &mut ColumnBuffer,
    id: &str,
    info: &str,
    field: &PlannedField,
    row: usize,
    line_no: u64,
    warnings: &mut Vec<Warning>,
) {
    if info.is_empty() || info == MISSING {
        return;
    }
    for entry in info.split(';') {
        let (key, value) = match entry.split_once('=') {
            Some((k, v)) => (k, Some(v)),
            None => (entry, None),
        };
        if key != id {
            continue;
        }
        match value {
            None => {
                if matches!(field.writer, WriterKind::Flag) {
                    column.set_bool(row, 0, 0, true);
                }
            }
            Some(raw) => write_vector_cell(column, field, row, 0, raw, line_no, warnings),
        }
        return;
    }
}

fn write_format(
    column: &mut ColumnBuffer,
    id: &str,
    raw: &RawRecord,
    field: &PlannedField,
    plan: &FieldPlan,
    row: usize,
    line_no: u64,
    warnings: &mut Vec<Warning>,
) {
    let Some(format_str) = raw.format else { return };
    let keys: Vec<&str> = format_str.split(':').collect();
    let Some(key_index) = keys.iter().position(|k| *k == id) else { return };

    let mut out_slot = 0usize;
    for (header_idx, selected) in plan.sample_mask.iter().enumerate() {
        if !*selected {
            continue;
        }
        let sample_field = raw.samples.get(header_idx).copied().unwrap_or(MISSING);
        let raw_value = sample_field.split(':').nth(key_index).unwrap_or(MISSING);
        write_sample_value(column, field, row, out_slot, raw_value, line_no, warnings);
        out_slot += 1;
    }
}

fn write_sample_value(
    column: &mut ColumnBuffer,
    field: &PlannedField,
    row: usize,
    sample: usize,
    raw: &str,
    line_no: u64,
    warnings: &mut Vec<Warning>,
) {
    if raw.is_empty() || raw == MISSING {
        return;
    }
    match &field.writer {
        WriterKind::GenotypeDiploid { .. } | WriterKind::GenotypeAny { .. } => {
            write_genotype(column, field, row, sample, raw, line_no, warnings)
        }
        WriterKind::GenotypeAlleleCount { max_alleles, .. } => {
            write_genotype_ac(column, field, row, sample, raw, *max_alleles, line_no, warnings)
        }
        WriterKind::Flag => column.set_bool(row, sample, 0, true),
        _ => write_vector_cell(column, field, row, sample, raw, line_no, warnings),
    }
}

/// Writes a (possibly comma-separated, `item_len`-bounded) scalar/vector
/// value at `(row, sample)`, used for both INFO (`sample == 0`) and FORMAT
/// fields alike.
fn write_vector_cell(
    column: &mut ColumnBuffer,
    field: &PlannedField,
    row: usize,
    sample: usize,
    raw: &str,
    line_no: u64,
    warnings: &mut Vec<Warning>,
) {
    if field.item_len <= 1 {
        write_scalar(column, field, row, sample, 0, raw, line_no, warnings);
        return;
    }
    for (i, part) in raw.split(',').enumerate() {
        if i >= field.item_len {
            break;
        }
        write_scalar(column, field, row, sample, i, part, line_no, warnings);
    }
}

fn write_scalar(
    column: &mut ColumnBuffer,
    field: &PlannedField,
    row: usize,
    sample: usize,
    sub: usize,
    raw: &str,
    line_no: u64,
    warnings: &mut Vec<Warning>,
) {
    if raw.is_empty() || raw == MISSING {
        return;
    }
    match field.writer {
        WriterKind::Integer => match raw.parse::<i64>() {
            Ok(v) => column.set_int(row, sample, sub, v),
            Err(_) => warnings.push(
                Warning::new(
                    line_no,
                    WarningKind::ParseValue { field: field.name.clone(), raw: raw.to_string() },
                )
                .log(),
            ),
        },
        WriterKind::Float => match raw.parse::<f64>() {
            Ok(v) => column.set_float(row, sample, sub, v),
            Err(_) => warnings.push(
                Warning::new(
                    line_no,
                    WarningKind::ParseValue { field: field.name.clone(), raw: raw.to_string() },
                )
                .log(),
            ),
        },
        WriterKind::VarString | WriterKind::FixedString => column.set_str(row, sample, sub, raw),
        WriterKind::Flag => column.set_bool(row, sample, sub, true),
        _ => {}
    }
}

fn write_genotype(
    column: &mut ColumnBuffer,
    field: &PlannedField,
    row: usize,
    sample: usize,
    raw: &str,
    line_no: u64,
    warnings: &mut Vec<Warning>,
) {
    for (i, allele) in raw.split(|c| c == '/' || c == '|').enumerate() {
        if i >= field.item_len {
            break;
        }
        if allele.is_empty() || allele == MISSING {
            continue;
        }
        match allele.parse::<i64>() {
            Ok(v) => column.set_int(row, sample, i, v),
            Err(_) => warnings.push(
                Warning::new(
                    line_no,
                    WarningKind::ParseValue { field: field.name.clone(), raw: raw.to_string() },
                )
                .log(),
            ),
        }
    }
}

fn write_genotype_ac(
    column: &mut ColumnBuffer,
    field: &PlannedField,
    row: usize,
    sample: usize,
    raw: &str,
    max_alleles: usize,
    line_no: u64,
    warnings: &mut Vec<Warning>,
) {
    let mut counts = vec![0i64; max_alleles];
    let mut any = false;
    for allele in raw.split(|c| c == '/' || c == '|') {
        if allele.is_empty() || allele == MISSING {
            continue;
        }
        match allele.parse::<usize>() {
            Ok(v) if v < max_alleles => {
                counts[v] += 1;
                any = true;
            }
            Ok(_) => {}
            Err(_) => warnings.push(
                Warning::new(
                    line_no,
                    WarningKind::ParseValue { field: field.name.clone(), raw: raw.to_string() },
                )
                .log(),
            ),
        }
    }
    if any {
        for (i, count) in counts.into_iter().enumerate() {
            column.set_int(row, sample, i, count);
        }
    }
}
