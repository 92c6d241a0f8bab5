//! Header ingestion.
//!
//! Consumes the `##`-prefixed meta lines and the mandatory `#CHROM` column
//! line, producing a [`VcfHeader`] describing declared FILTER/INFO/FORMAT
//! fields and the sample identifiers.

use indexmap::IndexMap;

use crate::error::{Error, Result, Warning, WarningKind};
use crate::source::LineSource;

/// The `Number=` attribute of an INFO/FORMAT declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Number {
    Count(u32),
    /// One value per alternate allele.
    A,
    /// One value per reference+alternate allele.
    R,
    /// One value per possible genotype.
    G,
    /// Unknown / variable cardinality (`.`).
    Unknown,
}

impl Number {
    fn parse(s: &str) -> Number {
        match s {
            "A" => Number::A,
            "R" => Number::R,
            "G" => Number::G,
            "." => Number::Unknown,
            other => other
                .parse::<u32>()
                .map(Number::Count)
                .unwrap_or(Number::Unknown),
        }
    }
}

/// The `Type=` attribute of an INFO/FORMAT declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Integer,
    Float,
    Flag,
    Character,
    String,
}

impl ValueType {
    fn parse(s: &str) -> Option<ValueType> {
        match s {
            "Integer" => Some(ValueType::Integer),
            "Float" => Some(ValueType::Float),
            "Flag" => Some(ValueType::Flag),
            "Character" => Some(ValueType::Character),
            "String" => Some(ValueType::String),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FilterMeta {
    pub id: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct InfoMeta {
    pub id: String,
    pub number: Number,
    pub ty: ValueType,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct FormatMeta {
    pub id: String,
    pub number: Number,
    pub ty: ValueType,
    pub description: String,
}

/// Metadata describing a VCF file's declared schema: sample identifiers,
/// and the FILTER/INFO/FORMAT declarations from the `##` preamble.
#[derive(Debug, Clone, Default)]
pub struct VcfHeader {
    pub file_format: String,
    pub samples: Vec<String>,
    pub filters: IndexMap<String, FilterMeta>,
    pub infos: IndexMap<String, InfoMeta>,
    pub formats: IndexMap<String, FormatMeta>,
}

impl VcfHeader {
    /// Parse the leading `##`/`#CHROM` preamble from `source`, collecting
    /// non-fatal [`Warning`]s into `warnings`. Leaves `source` positioned at
    /// the first data record.
    pub fn parse(source: &mut dyn LineSource, warnings: &mut Vec<Warning>) -> Result<VcfHeader> {
        let mut header = VcfHeader::default();
        // An implicit PASS filter always exists; an explicit declaration in
        // the header must not trigger a duplicate-declaration warning.
        header.filters.insert(
            "PASS".to_string(),
            FilterMeta {
                id: "PASS".to_string(),
                description: "All filters passed".to_string(),
            },
        );
        let mut explicit_pass_seen = false;

        let mut line_no: u64 = 0;
        let mut buf = Vec::with_capacity(256);
        let mut chrom_seen = false;

        loop {
            if !source.read_record(&mut buf)? {
                break;
            }
            line_no += 1;
            let line = String::from_utf8_lossy(&buf);

            if let Some(rest) = line.strip_prefix("##") {
                if let Some(eq) = rest.find('=') {
                    let key = &rest[..eq];
                    let value = &rest[eq + 1..];
                    match key {
                        "fileformat" => header.file_format = value.to_string(),
                        "FILTER" => {
                            if let Some(attrs) = parse_attr_list(value) {
                                let id = attrs
                                    .iter()
                                    .find(|(k, _)| k == "ID")
                                    .map(|(_, v)| v.clone())
                                    .unwrap_or_default();
                                let description = attrs
                                    .iter()
                                    .find(|(k, _)| k == "Description")
                                    .map(|(_, v)| v.clone())
                                    .unwrap_or_default();
                                if id == "PASS" {
                                    if explicit_pass_seen {
                                        warnings.push(
                                            Warning::new(
                                                line_no,
                                                WarningKind::DuplicateHeader { id },
                                            )
                                            .log(),
                                        );
                                    }
                                    explicit_pass_seen = true;
                                    header
                                        .filters
                                        .insert("PASS".to_string(), FilterMeta { id, description });
                                } else if header.filters.contains_key(&id) {
                                    warnings.push(
                                        Warning::new(line_no, WarningKind::DuplicateHeader { id })
                                            .log(),
                                    );
                                } else {
                                    header
                                        .filters
                                        .insert(id.clone(), FilterMeta { id, description });
                                }
                            }
                        }
                        "INFO" => {
                            if let Some(meta) = parse_field_meta(value) {
                                if header.infos.contains_key(&meta.id) {
                                    warnings.push(
                                        Warning::new(
                                            line_no,
                                            WarningKind::DuplicateHeader { id: meta.id.clone() },
                                        )
                                        .log(),
                                    );
                                } else {
                                    header.infos.insert(
                                        meta.id.clone(),
                                        InfoMeta {
                                            id: meta.id,
                                            number: meta.number,
                                            ty: meta.ty,
                                            description: meta.description,
                                        },
                                    );
                                }
                            }
                        }
                        "FORMAT" => {
                            if let Some(meta) = parse_field_meta(value) {
                                if header.formats.contains_key(&meta.id) {
                                    warnings.push(
                                        Warning::new(
                                            line_no,
                                            WarningKind::DuplicateHeader { id: meta.id.clone() },
                                        )
                                        .log(),
                                    );
                                } else {
                                    header.formats.insert(
                                        meta.id.clone(),
                                        FormatMeta {
                                            id: meta.id,
                                            number: meta.number,
                                            ty: meta.ty,
                                            description: meta.description,
                                        },
                                    );
                                }
                            }
                        }
                        // Unknown top-level keys (contig, reference, ALT, ...) are
                        // ignored; they are not part of this crate's data model.
                        _ => {}
                    }
                }
                continue;
            }

            if line.starts_with("#CHROM") {
                chrom_seen = true;
                let mut fields = line.split('\t');
                // CHROM POS ID REF ALT QUAL FILTER INFO [FORMAT sample...]
                let format_and_samples: Vec<&str> = fields.by_ref().skip(8).collect();
                if let Some((_format, samples)) = format_and_samples.split_first() {
                    header.samples = samples.iter().map(|s| s.trim_end().to_string()).collect();
                }
                break;
            }

            // A non-## non-#CHROM line before #CHROM means the header never
            // terminated properly; treat it as the start of data, which is
            // malformed if we haven't seen #CHROM yet.
            break;
        }

        if !chrom_seen {
            return Err(Error::MalformedInput(
                "no #CHROM header line found".to_string(),
            ));
        }

        Ok(header)
    }
}

struct FieldMeta {
    id: String,
    number: Number,
    ty: ValueType,
    description: String,
}

/// Parse a `##INFO=<...>`/`##FORMAT=<...>` attribute list into the
/// `(Number, Type, Description)` triple the crate cares about. Returns
/// `None` (and the caller warns) on a malformed attribute list.
fn parse_field_meta(raw: &str) -> Option<FieldMeta> {
    let attrs = parse_attr_list(raw)?;
    let get = |key: &str| attrs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone());

    let id = get("ID")?;
    let number = get("Number").map(|s| Number::parse(&s)).unwrap_or(Number::Unknown);
    let ty = get("Type").and_then(|s| ValueType::parse(&s)).unwrap_or(ValueType::String);
    let description = get("Description").unwrap_or_default();

    Some(FieldMeta {
        id,
        number,
        ty,
        description,
    })
}

/// Parse the contents of a `<...>` angle-bracketed attribute list into an
/// ordered list of `key=value` pairs. Quote-aware: commas and `=` signs
/// inside a double-quoted value do not split the list.
fn parse_attr_list(raw: &str) -> Option<Vec<(String, String)>> {
    let raw = raw.trim();
    let inner = raw.strip_prefix('<')?.strip_suffix('>')?;

    let mut pairs = Vec::new();
    let bytes = inner.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        // skip leading whitespace/commas
        while i < bytes.len() && (bytes[i] == b',' || bytes[i] == b' ') {
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let key_start = i;
        while i < bytes.len() && bytes[i] != b'=' {
            i += 1;
        }
        if i >= bytes.len() {
            return None;
        }
        let key = inner[key_start..i].trim().to_string();
        i += 1; // skip '='

        let value;
        if i < bytes.len() && bytes[i] == b'"' {
            i += 1;
            let value_start = i;
            while i < bytes.len() && bytes[i] != b'"' {
                // allow escaped quotes
                if bytes[i] == b'\\' && i + 1 < bytes.len() {
                    i += 1;
                }
                i += 1;
            }
            value = inner[value_start..i].to_string();
            i += 1; // skip closing quote
        } else {
            let value_start = i;
            while i < bytes.len() && bytes[i] != b',' {
                i += 1;
            }
            value = inner[value_start..i].trim().to_string();
        }
        pairs.push((key, value));
    }
    Some(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryLineSource;

    const SAMPLE_HEADER: &str = "\
##fileformat=VCFv4.0\n\
##FILTER=<ID=q10,Description=\"Quality below 10\">\n\
##FILTER=<ID=s50,Description=\"Less than 50% of samples have data\">\n\
##INFO=<ID=AA,Number=1,Type=String,Description=\"Ancestral Allele\">\n\
##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count\">\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
##FORMAT=<ID=HQ,Number=2,Type=Integer,Description=\"Haplotype Quality\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA00001\tNA00002\tNA00003\n\
20\t14370\trs6054257\tG\tA\t29\tPASS\tNS=3\tGT\t0|0\t1|0\t1/1\n";

    #[test]
    fn parses_filters_infos_formats_and_samples() {
        let mut source = MemoryLineSource::new(SAMPLE_HEADER.as_bytes());
        let mut warnings = Vec::new();
        let header = VcfHeader::parse(&mut source, &mut warnings).expect("header parses");

        assert_eq!(header.file_format, "VCFv4.0");
        assert_eq!(
            header.samples,
            vec!["NA00001".to_string(), "NA00002".to_string(), "NA00003".to_string()]
        );
        assert!(header.filters.contains_key("q10"));
        assert!(header.filters.contains_key("s50"));
        assert!(header.filters.contains_key("PASS"));
        assert_eq!(header.infos["AA"].ty, ValueType::String);
        assert_eq!(header.infos["AC"].number, Number::A);
        assert_eq!(header.formats["HQ"].number, Number::Count(2));
        assert!(warnings.is_empty());
    }

    #[test]
    fn explicit_pass_does_not_warn() {
        let text = "\
##fileformat=VCFv4.0\n\
##FILTER=<ID=PASS,Description=\"All filters passed\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let mut source = MemoryLineSource::new(text.as_bytes());
        let mut warnings = Vec::new();
        let header = VcfHeader::parse(&mut source, &mut warnings).expect("header parses");
        assert!(header.filters.contains_key("PASS"));
        assert!(warnings.is_empty());
    }

    #[test]
    fn duplicate_info_declaration_warns() {
        let text = "\
##fileformat=VCFv4.0\n\
##INFO=<ID=AA,Number=1,Type=String,Description=\"a\">\n\
##INFO=<ID=AA,Number=1,Type=String,Description=\"b\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let mut source = MemoryLineSource::new(text.as_bytes());
        let mut warnings = Vec::new();
        let _ = VcfHeader::parse(&mut source, &mut warnings).expect("header parses");
        assert_eq!(warnings.len(), 1);
        assert!(matches!(warnings[0].kind, WarningKind::DuplicateHeader { .. }));
    }

    #[test]
    fn missing_chrom_line_is_malformed() {
        let text = "##fileformat=VCFv4.0\n";
        let mut source = MemoryLineSource::new(text.as_bytes());
        let mut warnings = Vec::new();
        let err = VcfHeader::parse(&mut source, &mut warnings).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));
    }
}
