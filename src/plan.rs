//! Field plan resolution.
//!
//! Resolves the caller's field selector against the header's declared
//! FILTER/INFO/FORMAT ids and the fixed/computed column set into a static,
//! per-chunk schema: one [`PlannedField`] per output column, with its
//! storage dtype, shape and fill value already decided.

use std::collections::HashSet;

use crate::dtype::{DType, FillValue, IntWidth};
use crate::error::{Result, Warning, WarningKind};
use crate::header::{Number, ValueType, VcfHeader};
use crate::options::{FieldSelector, Group, ReadOptions, SampleSelection};

pub const FIXED_COLUMNS: &[&str] = &["CHROM", "POS", "ID", "REF", "ALT", "QUAL", "FILTER"];
pub const COMPUTED_FIELDS: &[&str] = &["numalt", "altlen", "is_snp"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixedColumn {
    Chrom,
    Pos,
    Id,
    Ref,
    Alt,
    Qual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputedKind {
    NumAlt,
    AltLen,
    IsSnp,
}

#[derive(Debug, Clone)]
pub enum FieldOrigin {
    Fixed(FixedColumn),
    FilterTag(String),
    Info(String),
    Format(String),
    Computed(ComputedKind),
    /// The `samples` 1-D array of selected sample identifiers: not a
    /// per-record column at all.
    Samples,
}

#[derive(Debug, Clone)]
pub enum WriterKind {
    Integer,
    Float,
    Flag,
    FixedString,
    VarString,
    GenotypeDiploid { storage: IntWidth },
    GenotypeAny { ploidy: usize, storage: IntWidth },
    GenotypeAlleleCount { max_alleles: usize, storage: IntWidth },
    Computed(ComputedKind),
}

#[derive(Debug, Clone)]
pub struct PlannedField {
    pub name: String,
    pub origin: FieldOrigin,
    pub writer: WriterKind,
    pub dtype: DType,
    /// Trailing (vector/genotype) dimension; 1 for scalars.
    pub item_len: usize,
    pub is_calldata: bool,
    pub fill: FillValue,
}

pub struct FieldPlan {
    pub fields: Vec<PlannedField>,
    /// Sample identifiers selected for this read, in header order.
    pub samples: Vec<String>,
    /// Bitmask over `header.samples`, `true` where selected.
    pub sample_mask: Vec<bool>,
}

impl FieldPlan {
    /// Names that collide case-insensitively but not exactly: permitted in
    /// the in-memory plan, but a sink requiring case-insensitive key
    /// uniqueness should treat a non-empty result as fatal
    /// (`Error::DuplicateField`).
    pub fn case_insensitive_collisions(&self) -> Vec<(String, String)> {
        let mut seen: Vec<(String, String)> = Vec::new();
        let mut collisions = Vec::new();
        for field in &self.fields {
            let lower = field.name.to_lowercase();
            if let Some((_, other)) = seen.iter().find(|(l, _)| *l == lower) {
                if other != &field.name {
                    collisions.push((other.clone(), field.name.clone()));
                }
            } else {
                seen.push((lower, field.name.clone()));
            }
        }
        collisions
    }

    pub fn resolve(
        header: &VcfHeader,
        options: &ReadOptions,
        warnings: &mut Vec<Warning>,
    ) -> Result<FieldPlan> {
        let (sample_mask, samples) = resolve_samples(header, &options.samples)?;

        let requested = expand_selector(header, &options.fields);
        let canonical: Vec<String> = requested
            .iter()
            .map(|name| canonicalize(header, name))
            .collect();
        let mut pairs: Vec<(String, String)> = requested.into_iter().zip(canonical).collect();
        pairs.retain(|(short, canon)| !is_excluded(short, canon, &options.exclude_fields));
        let (_requested, canonical): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();
        let renamed: Vec<String> = canonical
            .iter()
            .map(|name| options.rename_fields.get(name).cloned().unwrap_or_else(|| name.clone()))
            .collect();

        let mut seen_exact = HashSet::new();
        let mut fields = Vec::new();
        for (original, output_name) in canonical.iter().zip(renamed.iter()) {
            if !seen_exact.insert(output_name.clone()) {
                continue; // silent dedup of exact-match duplicates
            }
            if output_name == "samples" {
                continue; // `samples` is not a per-record column
            }
            match build_field(header, options, original, output_name, warnings)? {
                Some(field) => fields.push(field),
                None => {
                    warnings.push(
                        Warning::new(0, WarningKind::UnknownField { name: original.clone() }).log(),
                    );
                }
            }
        }

        Ok(FieldPlan {
            fields,
            samples,
            sample_mask,
        })
    }
}

fn resolve_samples(
    header: &VcfHeader,
    selection: &SampleSelection,
) -> Result<(Vec<bool>, Vec<String>)> {
    let n = header.samples.len();
    match selection {
        SampleSelection::All => {
            Ok((vec![true; n], header.samples.clone()))
        }
        SampleSelection::Indices(indices) => {
            let mut mask = vec![false; n];
            for &i in indices {
                if i < n {
                    mask[i] = true;
                }
            }
            let samples = header
                .samples
                .iter()
                .enumerate()
                .filter(|(i, _)| mask[*i])
                .map(|(_, s)| s.clone())
                .collect();
            Ok((mask, samples))
        }
        SampleSelection::Ids(ids) => {
            let mut mask = vec![false; n];
            for id in ids {
                if let Some(i) = header.samples.iter().position(|s| s == id) {
                    mask[i] = true;
                }
            }
            let samples = header
                .samples
                .iter()
                .enumerate()
                .filter(|(i, _)| mask[*i])
                .map(|(_, s)| s.clone())
                .collect();
            Ok((mask, samples))
        }
    }
}

/// Per spec.md §4.3 step 3: a requested name is dropped if it matches an
/// exclude entry in either its canonical (`variants/NAME`/`calldata/NAME`)
/// or short form.
fn is_excluded(short: &str, canonical: &str, excludes: &[String]) -> bool {
    excludes.iter().any(|e| e == canonical || e == short)
}

/// Expand the caller's selector into a flat list of short/canonical names,
/// not yet deduplicated or renamed.
fn expand_selector(header: &VcfHeader, selector: &FieldSelector) -> Vec<String> {
    match selector {
        FieldSelector::All => {
            let mut names: Vec<String> = FIXED_COLUMNS.iter().map(|s| s.to_string()).collect();
            names.extend(header.filters.keys().map(|id| format!("FILTER_{id}")));
            names.extend(header.infos.keys().cloned());
            names.extend(COMPUTED_FIELDS.iter().map(|s| s.to_string()));
            names.extend(header.formats.keys().cloned());
            names.push("samples".to_string());
            names
        }
        FieldSelector::Group(Group::VariantsAll) => {
            let mut names: Vec<String> = FIXED_COLUMNS.iter().map(|s| s.to_string()).collect();
            names.extend(header.filters.keys().map(|id| format!("FILTER_{id}")));
            names.extend(header.infos.keys().cloned());
            names.extend(COMPUTED_FIELDS.iter().map(|s| s.to_string()));
            names
        }
        FieldSelector::Group(Group::CalldataAll) => header.formats.keys().cloned().collect(),
        FieldSelector::Group(Group::Info) => header.infos.keys().cloned().collect(),
        FieldSelector::Group(Group::Filter) => {
            header.filters.keys().map(|id| format!("FILTER_{id}")).collect()
        }
        FieldSelector::List(names) => names.clone(),
    }
}

/// Canonicalise a short or already-canonical name to its final
/// `variants/NAME` / `calldata/NAME` form.
fn canonicalize(header: &VcfHeader, name: &str) -> String {
    if name == "samples" || name.starts_with("variants/") || name.starts_with("calldata/") {
        return name.to_string();
    }
    if name.starts_with("FILTER_") {
        return format!("variants/{name}");
    }
    if FIXED_COLUMNS.contains(&name) || COMPUTED_FIELDS.contains(&name) {
        return format!("variants/{name}");
    }
    if header.infos.contains_key(name) {
        return format!("variants/{name}");
    }
    if header.formats.contains_key(name) {
        return format!("calldata/{name}");
    }
    // Unknown: leave unprefixed; build_field will warn and drop it.
    name.to_string()
}

fn build_field(
    header: &VcfHeader,
    options: &ReadOptions,
    original: &str,
    output_name: &str,
    warnings: &mut Vec<Warning>,
) -> Result<Option<PlannedField>> {
    let short = original
        .strip_prefix("variants/")
        .or_else(|| original.strip_prefix("calldata/"))
        .unwrap_or(original);

    if let Some(tag) = short.strip_prefix("FILTER_") {
        return Ok(Some(filter_field(output_name, tag)));
    }
    if let Some(fixed) = fixed_column(short) {
        return Ok(Some(fixed_field(header, options, output_name, fixed, warnings)?));
    }
    if let Some(kind) = computed_kind(short) {
        return Ok(Some(computed_field(output_name, kind, options)));
    }
    if let Some(meta) = header.infos.get(short) {
        return Ok(Some(info_field(options, output_name, short, meta, warnings)?));
    }
    if let Some(meta) = header.formats.get(short) {
        return Ok(Some(format_field(options, output_name, short, meta, warnings)?));
    }
    Ok(None)
}

fn fixed_column(short: &str) -> Option<FixedColumn> {
    match short {
        "CHROM" => Some(FixedColumn::Chrom),
        "POS" => Some(FixedColumn::Pos),
        "ID" => Some(FixedColumn::Id),
        "REF" => Some(FixedColumn::Ref),
        "ALT" => Some(FixedColumn::Alt),
        "QUAL" => Some(FixedColumn::Qual),
        _ => None,
    }
}

fn computed_kind(short: &str) -> Option<ComputedKind> {
    match short {
        "numalt" => Some(ComputedKind::NumAlt),
        "altlen" => Some(ComputedKind::AltLen),
        "is_snp" => Some(ComputedKind::IsSnp),
        _ => None,
    }
}

fn filter_field(output_name: &str, tag: &str) -> PlannedField {
    PlannedField {
        name: output_name.to_string(),
        origin: FieldOrigin::FilterTag(tag.to_string()),
        writer: WriterKind::Flag,
        dtype: DType::Bool,
        item_len: 1,
        is_calldata: false,
        fill: FillValue::Bool(false),
    }
}

fn computed_field(output_name: &str, kind: ComputedKind, options: &ReadOptions) -> PlannedField {
    match kind {
        ComputedKind::NumAlt => PlannedField {
            name: output_name.to_string(),
            origin: FieldOrigin::Computed(kind),
            writer: WriterKind::Computed(kind),
            dtype: DType::Int(IntWidth::I32),
            item_len: 1,
            is_calldata: false,
            fill: FillValue::Int(0),
        },
        ComputedKind::IsSnp => PlannedField {
            name: output_name.to_string(),
            origin: FieldOrigin::Computed(kind),
            writer: WriterKind::Computed(kind),
            dtype: DType::Bool,
            item_len: 1,
            is_calldata: false,
            fill: FillValue::Bool(false),
        },
        ComputedKind::AltLen => PlannedField {
            name: output_name.to_string(),
            origin: FieldOrigin::Computed(kind),
            writer: WriterKind::Computed(kind),
            dtype: DType::Int(IntWidth::I32),
            item_len: options.alt_number,
            is_calldata: false,
            fill: FillValue::Int(-1),
        },
    }
}

fn fixed_field(
    header: &VcfHeader,
    options: &ReadOptions,
    output_name: &str,
    fixed: FixedColumn,
    warnings: &mut Vec<Warning>,
) -> Result<PlannedField> {
    let (default_dtype, item_len, fill) = match fixed {
        FixedColumn::Chrom | FixedColumn::Id => (DType::VarString, 1, FillValue::Str(String::new())),
        FixedColumn::Pos => (DType::Int(IntWidth::I32), 1, FillValue::Int(-1)),
        FixedColumn::Ref => (DType::VarString, 1, FillValue::Str(String::new())),
        FixedColumn::Alt => (DType::VarString, options.alt_number, FillValue::Str(String::new())),
        FixedColumn::Qual => (DType::Float(crate::dtype::FloatWidth::F32), 1, FillValue::Float(f64::NAN)),
    };
    let _ = header;
    let (dtype, item_len, fill) =
        apply_overrides(options, name_for_fixed(fixed), default_dtype, item_len, fill, warnings)?;
    let writer = match dtype {
        DType::VarString => WriterKind::VarString,
        DType::FixedString(_) => WriterKind::FixedString,
        DType::Int(_) => WriterKind::Integer,
        DType::Float(_) => WriterKind::Float,
        DType::Bool => WriterKind::Flag,
    };
    Ok(PlannedField {
        name: output_name.to_string(),
        origin: FieldOrigin::Fixed(fixed),
        writer,
        dtype,
        item_len,
        is_calldata: false,
        fill,
    })
}

fn name_for_fixed(fixed: FixedColumn) -> &'static str {
    match fixed {
        FixedColumn::Chrom => "CHROM",
        FixedColumn::Pos => "POS",
        FixedColumn::Id => "ID",
        FixedColumn::Ref => "REF",
        FixedColumn::Alt => "ALT",
        FixedColumn::Qual => "QUAL",
    }
}

/// Apply `types`/`numbers`/`fills` caller overrides, independently, over a
/// header/fixed-column default. Caller overrides always win.
fn apply_overrides(
    options: &ReadOptions,
    short_name: &str,
    default_dtype: DType,
    default_item_len: usize,
    default_fill: FillValue,
    warnings: &mut Vec<Warning>,
) -> Result<(DType, usize, FillValue)> {
    let canonical_variants = format!("variants/{short_name}");
    let canonical_calldata = format!("calldata/{short_name}");

    let type_token = options
        .types
        .get(short_name)
        .or_else(|| options.types.get(&canonical_variants))
        .or_else(|| options.types.get(&canonical_calldata));
    let dtype = match type_token {
        Some(token) => DType::parse_override(token)?,
        None => default_dtype,
    };

    let number_override = options
        .numbers
        .get(short_name)
        .or_else(|| options.numbers.get(&canonical_variants))
        .or_else(|| options.numbers.get(&canonical_calldata));
    let item_len = match number_override {
        Some(&n) => n as usize,
        None => default_item_len,
    };

    let fill_override = options
        .fills
        .get(short_name)
        .or_else(|| options.fills.get(&canonical_variants))
        .or_else(|| options.fills.get(&canonical_calldata));
    let fill = match fill_override {
        Some(f) => f.clone(),
        None => {
            if type_token.is_some() {
                FillValue::default_for(&dtype)
            } else {
                default_fill
            }
        }
    };
    let _ = warnings;
    Ok((dtype, item_len, fill))
}

fn info_field(
    options: &ReadOptions,
    output_name: &str,
    short: &str,
    meta: &crate::header::InfoMeta,
    warnings: &mut Vec<Warning>,
) -> Result<PlannedField> {
    let number_override = options
        .numbers
        .get(short)
        .or_else(|| options.numbers.get(&format!("variants/{short}")));

    // A `numbers` override of exactly 0 always means "presence flag":
    // treat the field as boolean-presence regardless of its declared type.
    if number_override == Some(&0) {
        return Ok(PlannedField {
            name: output_name.to_string(),
            origin: FieldOrigin::Info(short.to_string()),
            writer: WriterKind::Flag,
            dtype: DType::Bool,
            item_len: 1,
            is_calldata: false,
            fill: FillValue::Bool(false),
        });
    }

    if meta.ty == ValueType::Flag {
        return Ok(PlannedField {
            name: output_name.to_string(),
            origin: FieldOrigin::Info(short.to_string()),
            writer: WriterKind::Flag,
            dtype: DType::Bool,
            item_len: 1,
            is_calldata: false,
            fill: FillValue::Bool(false),
        });
    }

    let default_dtype = DType::default_for(meta.ty);
    let default_item_len = match meta.number {
        Number::Count(1) => 1,
        Number::Count(n) => n as usize,
        Number::A => options.alt_number,
        Number::R => options.alt_number + 1,
        Number::G => {
            if number_override.is_none() {
                warnings.push(
                    Warning::new(
                        0,
                        WarningKind::UnknownField {
                            name: format!(
                                "{short} (Number=G defaulted to diploid genotype count; supply a numbers override to silence this)"
                            ),
                        },
                    )
                    .log(),
                );
            }
            genotype_count(options.alt_number + 1, 2)
        }
        Number::Unknown => {
            if number_override.is_none() {
                warnings.push(
                    Warning::new(
                        0,
                        WarningKind::UnknownField {
                            name: format!("{short} (Number=. requires an explicit override)"),
                        },
                    )
                    .log(),
                );
            }
            1
        }
    };
    let default_fill = FillValue::default_for(&default_dtype);

    let (dtype, item_len, fill) =
        apply_overrides(options, short, default_dtype, default_item_len, default_fill, warnings)?;
    let writer = writer_for(&dtype);
    Ok(PlannedField {
        name: output_name.to_string(),
        origin: FieldOrigin::Info(short.to_string()),
        writer,
        dtype,
        item_len,
        is_calldata: false,
        fill,
    })
}

fn format_field(
    options: &ReadOptions,
    output_name: &str,
    short: &str,
    meta: &crate::header::FormatMeta,
    warnings: &mut Vec<Warning>,
) -> Result<PlannedField> {
    let is_genotype = short == "GT";

    let type_token = options
        .types
        .get(short)
        .or_else(|| options.types.get(&format!("calldata/{short}")))
        .cloned();

    if is_genotype || type_token.as_deref().map(|t| t.starts_with("genotype")).unwrap_or(false) {
        return genotype_format_field(options, output_name, short, type_token.as_deref());
    }

    if meta.ty == ValueType::Flag {
        return Ok(PlannedField {
            name: output_name.to_string(),
            origin: FieldOrigin::Format(short.to_string()),
            writer: WriterKind::Flag,
            dtype: DType::Bool,
            item_len: 1,
            is_calldata: true,
            fill: FillValue::Bool(false),
        });
    }

    let number_override = options
        .numbers
        .get(short)
        .or_else(|| options.numbers.get(&format!("calldata/{short}")));

    let default_dtype = DType::default_for(meta.ty);
    let default_item_len = match meta.number {
        Number::Count(1) => 1,
        Number::Count(n) => n as usize,
        Number::A => options.alt_number,
        Number::R => options.alt_number + 1,
        Number::G => {
            if number_override.is_none() {
                warnings.push(
                    Warning::new(
                        0,
                        WarningKind::UnknownField {
                            name: format!(
                                "{short} (Number=G defaulted to diploid genotype count; supply a numbers override to silence this)"
                            ),
                        },
                    )
                    .log(),
                );
            }
            genotype_count(options.alt_number + 1, 2)
        }
        Number::Unknown => {
            if number_override.is_none() {
                warnings.push(
                    Warning::new(
                        0,
                        WarningKind::UnknownField {
                            name: format!("{short} (Number=. requires an explicit override)"),
                        },
                    )
                    .log(),
                );
            }
            1
        }
    };
    let default_fill = FillValue::default_for(&default_dtype);
    let (dtype, item_len, fill) =
        apply_overrides(options, short, default_dtype, default_item_len, default_fill, warnings)?;
    let writer = writer_for(&dtype);
    Ok(PlannedField {
        name: output_name.to_string(),
        origin: FieldOrigin::Format(short.to_string()),
        writer,
        dtype,
        item_len,
        is_calldata: true,
        fill,
    })
}

fn genotype_format_field(
    options: &ReadOptions,
    output_name: &str,
    short: &str,
    type_token: Option<&str>,
) -> Result<PlannedField> {
    let ploidy_override = options
        .numbers
        .get(short)
        .or_else(|| options.numbers.get(&format!("calldata/{short}")))
        .copied();

    if let Some(rest) = type_token.and_then(|t| t.strip_prefix("genotype_ac/")) {
        let storage = match DType::parse_override(rest)? {
            DType::Int(w) => w,
            _ => IntWidth::I32,
        };
        let max_alleles = ploidy_override.map(|n| n as usize).unwrap_or(options.alt_number + 1);
        return Ok(PlannedField {
            name: output_name.to_string(),
            origin: FieldOrigin::Format(short.to_string()),
            writer: WriterKind::GenotypeAlleleCount { max_alleles, storage },
            dtype: DType::Int(storage),
            item_len: max_alleles,
            is_calldata: true,
            fill: FillValue::Int(0),
        });
    }

    let storage = match type_token.and_then(|t| t.strip_prefix("genotype/")) {
        Some(rest) => match DType::parse_override(rest)? {
            DType::Int(w) => w,
            _ => IntWidth::I8,
        },
        None => match type_token {
            Some(rest) => match DType::parse_override(rest)? {
                DType::Int(w) => w,
                _ => IntWidth::I8,
            },
            None => IntWidth::I8,
        },
    };
    let ploidy = ploidy_override.map(|n| n as usize).unwrap_or(2);
    let writer = if ploidy == 2 {
        WriterKind::GenotypeDiploid { storage }
    } else {
        WriterKind::GenotypeAny { ploidy, storage }
    };
    Ok(PlannedField {
        name: output_name.to_string(),
        origin: FieldOrigin::Format(short.to_string()),
        writer,
        dtype: DType::Int(storage),
        item_len: ploidy,
        is_calldata: true,
        fill: FillValue::Int(-1),
    })
}

fn writer_for(dtype: &DType) -> WriterKind {
    match dtype {
        DType::Int(_) => WriterKind::Integer,
        DType::Float(_) => WriterKind::Float,
        DType::Bool => WriterKind::Flag,
        DType::FixedString(_) => WriterKind::FixedString,
        DType::VarString => WriterKind::VarString,
    }
}

/// Number of distinct unordered genotypes over `n_alleles` alleles at the
/// given `ploidy`. Only ploidy 1 and 2 have a closed-form default; any
/// other ploidy needs an explicit `numbers` override on the field.
fn genotype_count(n_alleles: usize, ploidy: usize) -> usize {
    if ploidy == 1 {
        return n_alleles;
    }
    n_alleles * (n_alleles + 1) / 2
}
