//! Computed-field derivation.
//!
//! `numalt`, `altlen` and `is_snp` have no column of their own in the VCF
//! line: they are derived from REF/ALT once those are already parsed. Run
//! as its own pass after [`crate::record::write_record`] so the per-field
//! loop there doesn't have to special-case them.

use crate::buffer::ColumnBuffer;
use crate::chunk::Chunk;
use crate::plan::{ComputedKind, FieldOrigin, FieldPlan};
use crate::record::RawRecord;

const SNP_BASES: [char; 4] = ['A', 'C', 'G', 'T'];

pub fn write_computed(raw: &RawRecord, plan: &FieldPlan, chunk: &mut Chunk, row: usize) {
    let alts = raw.alts();

    for field in &plan.fields {
        let FieldOrigin::Computed(kind) = &field.origin else { continue };
        let Some(column) = chunk.field_mut(&field.name) else { continue };
        match kind {
            ComputedKind::NumAlt => write_numalt(column, &alts, row),
            ComputedKind::AltLen => write_altlen(column, raw.reference, &alts, row),
            ComputedKind::IsSnp => write_is_snp(column, raw.reference, &alts, row),
        }
    }
}

fn write_numalt(column: &mut ColumnBuffer, alts: &[&str], row: usize) {
    column.set_int(row, 0, 0, alts.len() as i64);
}

fn write_altlen(column: &mut ColumnBuffer, reference: &str, alts: &[&str], row: usize) {
    let ref_len = reference.chars().count() as i64;
    for (i, alt) in alts.iter().enumerate() {
        if i >= column.item_len {
            break;
        }
        let alt_len = alt.chars().count() as i64;
        column.set_int(row, 0, i, alt_len - ref_len);
    }
}

/// A record is a SNP if REF is a single, unambiguous base (`A`/`C`/`G`/`T`,
/// case-sensitive), at least one ALT allele is present, and every ALT
/// allele is itself a single unambiguous base. A single non-SNP allele
/// anywhere in ALT (a multi-base indel, or the spanning-deletion symbol
/// `*`) disqualifies the whole site, even if another ALT allele on the
/// same record is a plain substitution.
fn write_is_snp(column: &mut ColumnBuffer, reference: &str, alts: &[&str], row: usize) {
    let ref_is_single_base = reference.chars().count() == 1
        && reference.chars().next().map(|c| SNP_BASES.contains(&c)).unwrap_or(false);
    let is_snp_base = |a: &&str| a.chars().count() == 1 && a.chars().next().map(|c| SNP_BASES.contains(&c)).unwrap_or(false);
    let all_alts_snp = !alts.is_empty() && alts.iter().all(is_snp_base);
    column.set_bool(row, 0, 0, ref_is_single_base && all_alts_snp);
}
