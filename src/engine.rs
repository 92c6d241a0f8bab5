//! Top-level driver.
//!
//! [`VcfReader`] ties the pieces together: parse the header once, resolve
//! the field plan once, then hand out one [`Chunk`] at a time until the
//! input (or the region predicate) is exhausted.

use std::path::Path;

use crate::buffer::ColumnBuffer;
use crate::chunk::Chunk;
use crate::computed::write_computed;
use crate::error::{Result, Warning};
use crate::header::VcfHeader;
use crate::options::{Region, ReadOptions};
use crate::plan::FieldPlan;
use crate::record::{split_record, write_record};
use crate::source::{self, LineSource};
use crate::transform::Transformer;

pub struct VcfReader {
    source: Box<dyn LineSource>,
    header: VcfHeader,
    plan: FieldPlan,
    chunk_length: usize,
    region: Option<Region>,
    transformers: Vec<Box<dyn Transformer>>,
    warnings: Vec<Warning>,
    line_no: u64,
    exhausted: bool,
}

impl VcfReader {
    pub fn open_path(path: impl AsRef<Path>, options: ReadOptions) -> Result<VcfReader> {
        let source = source::open_path(path, options.buffer_size)?;
        VcfReader::new(source, options)
    }

    pub fn open_bytes(bytes: impl Into<Vec<u8>>, options: ReadOptions) -> Result<VcfReader> {
        let source = source::open_bytes(bytes)?;
        VcfReader::new(source, options)
    }

    pub fn open_reader(
        reader: impl std::io::Read + 'static,
        options: ReadOptions,
    ) -> Result<VcfReader> {
        let source = source::open_reader(reader, options.buffer_size)?;
        VcfReader::new(source, options)
    }

    fn new(mut source: Box<dyn LineSource>, options: ReadOptions) -> Result<VcfReader> {
        let mut warnings = Vec::new();
        let header = VcfHeader::parse(source.as_mut(), &mut warnings)?;
        let plan = FieldPlan::resolve(&header, &options, &mut warnings)?;
        Ok(VcfReader {
            source,
            header,
            plan,
            chunk_length: options.chunk_length,
            region: options.region,
            transformers: options.transformers,
            warnings,
            line_no: 0,
            exhausted: false,
        })
    }

    pub fn header(&self) -> &VcfHeader {
        &self.header
    }

    pub fn samples(&self) -> &[String] {
        &self.plan.samples
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    fn allocate_columns(&self, rows: usize) -> Vec<ColumnBuffer> {
        self.plan
            .fields
            .iter()
            .map(|field| {
                let n_samples = if field.is_calldata { self.plan.samples.len() } else { 0 };
                ColumnBuffer::allocate(field.name.clone(), &field.dtype, rows, n_samples, field.item_len, &field.fill)
            })
            .collect()
    }

    /// Fill and return the next chunk, up to `chunk_length` records.
    /// Returns `None` once the input is exhausted with no records left to
    /// emit; the final chunk of a file is truncated to however many
    /// records it actually holds.
    pub fn next_chunk(&mut self) -> Result<Option<Chunk>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut chunk = Chunk {
            n_records: 0,
            columns: self.allocate_columns(self.chunk_length),
            samples: self.plan.samples.clone(),
        };
        let mut filled = 0usize;
        let mut buf = Vec::with_capacity(512);

        while filled < self.chunk_length {
            if !self.source.read_record(&mut buf)? {
                self.exhausted = true;
                break;
            }
            self.line_no += 1;
            if buf.is_empty() {
                continue;
            }
            let line = String::from_utf8_lossy(&buf);
            let Some(raw) = split_record(&line, self.line_no, &self.header, &mut self.warnings) else {
                continue;
            };

            if let Some(region) = &self.region {
                let pos: u64 = raw.pos.parse().unwrap_or(0);
                if !region.contains(raw.chrom, pos) {
                    continue;
                }
            }

            write_record(&raw, self.line_no, &self.plan, &mut chunk, filled, &mut self.warnings);
            write_computed(&raw, &self.plan, &mut chunk, filled);
            filled += 1;
        }

        if filled == 0 {
            return Ok(None);
        }

        for column in &mut chunk.columns {
            column.truncate_rows(filled);
        }
        chunk.n_records = filled;

        for transformer in &self.transformers {
            transformer.transform(&mut chunk)?;
        }

        Ok(Some(chunk))
    }
}

impl Iterator for VcfReader {
    type Item = Result<Chunk>;

    fn next(&mut self) -> Option<Result<Chunk>> {
        self.next_chunk().transpose()
    }
}

/// Read an entire file into memory as a sequence of chunks.
pub fn read_vcf(path: impl AsRef<Path>, options: ReadOptions) -> Result<Vec<Chunk>> {
    let mut reader = VcfReader::open_path(path, options)?;
    let mut chunks = Vec::new();
    while let Some(chunk) = reader.next_chunk()? {
        chunks.push(chunk);
    }
    Ok(chunks)
}

/// Parse only the header preamble, without scanning any data records.
/// Useful for inspecting a file's declared schema before committing to a
/// full read.
pub fn read_vcf_headers(path: impl AsRef<Path>, buffer_size: usize) -> Result<VcfHeader> {
    let mut source = source::open_path(path, buffer_size)?;
    let mut warnings = Vec::new();
    VcfHeader::parse(source.as_mut(), &mut warnings)
}

/// Scan the same file for several disjoint regions concurrently, one
/// [`VcfReader`] per region on its own `rayon` worker. `build_options` maps
/// each region to the full [`ReadOptions`] to use for that scan (it must
/// set `.region(...)` itself: this helper only distributes the work, it
/// does not assume how each scan should be configured).
pub fn read_vcf_regions_parallel<F>(
    path: impl AsRef<Path> + Sync,
    regions: &[Region],
    build_options: F,
) -> Result<Vec<Vec<Chunk>>>
where
    F: Fn(Region) -> ReadOptions + Sync,
{
    use rayon::prelude::*;

    let path = path.as_ref();
    regions
        .par_iter()
        .map(|region| {
            let options = build_options(region.clone());
            read_vcf(path, options)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ColumnData;
    use crate::options::{FieldSelector, SampleSelection};

    const VCF: &str = "\
##fileformat=VCFv4.0\n\
##FILTER=<ID=q10,Description=\"Quality below 10\">\n\
##INFO=<ID=NS,Number=1,Type=Integer,Description=\"Number of samples\">\n\
##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count\">\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
##FORMAT=<ID=DP,Number=1,Type=Integer,Description=\"Read depth\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA00001\tNA00002\n\
20\t14370\trs6054257\tG\tA\t29\tPASS\tNS=2;AC=1\tGT:DP\t0|0:10\t1|0:9\n\
20\t17330\t.\tT\tA\t3\tq10\tNS=2;AC=1\tGT:DP\t0|0:8\t0|1:5\n\
20\t1110696\trs6040355\tA\tG,T\t67\tPASS\tNS=2;AC=2,1\tGT:DP\t1|2:9\t2|1:8\n";

    #[test]
    fn reads_all_records_into_one_chunk() {
        let options = ReadOptions::new();
        let mut reader = VcfReader::open_bytes(VCF.as_bytes().to_vec(), options).unwrap();
        let chunk = reader.next_chunk().unwrap().expect("one chunk");
        assert_eq!(chunk.n_records, 3);
        assert!(reader.next_chunk().unwrap().is_none());

        let pos = chunk.field("variants/POS").unwrap();
        if let ColumnData::I32(v) = &pos.data {
            assert_eq!(v, &vec![14370, 17330, 1110696]);
        } else {
            panic!("wrong variant");
        }

        let numalt = chunk.field("variants/numalt").unwrap();
        if let ColumnData::I32(v) = &numalt.data {
            assert_eq!(v, &vec![1, 1, 2]);
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn chunk_length_splits_output_and_truncates_the_last_chunk() {
        let options = ReadOptions::new().chunk_length(2);
        let mut reader = VcfReader::open_bytes(VCF.as_bytes().to_vec(), options).unwrap();
        let first = reader.next_chunk().unwrap().expect("first chunk");
        assert_eq!(first.n_records, 2);
        let second = reader.next_chunk().unwrap().expect("second chunk");
        assert_eq!(second.n_records, 1);
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn region_without_an_index_filters_in_band() {
        let options = ReadOptions::new().region(Region { chrom: "20".to_string(), start: Some(20000), end: None });
        let mut reader = VcfReader::open_bytes(VCF.as_bytes().to_vec(), options).unwrap();
        let chunk = reader.next_chunk().unwrap().expect("one chunk");
        assert_eq!(chunk.n_records, 1);
        let pos = chunk.field("variants/POS").unwrap();
        if let ColumnData::I32(v) = &pos.data {
            assert_eq!(v, &vec![1110696]);
        } else {
            panic!("wrong variant");
        }
    }

    #[test]
    fn sample_subselection_narrows_calldata_columns() {
        let options = ReadOptions::new()
            .fields(FieldSelector::List(vec!["GT".to_string()]))
            .samples(SampleSelection::Ids(vec!["NA00002".to_string()]));
        let mut reader = VcfReader::open_bytes(VCF.as_bytes().to_vec(), options).unwrap();
        let chunk = reader.next_chunk().unwrap().expect("one chunk");
        assert_eq!(chunk.samples, vec!["NA00002".to_string()]);
        let gt = chunk.field("calldata/GT").unwrap();
        assert_eq!(gt.n_samples, 1);
    }

    #[test]
    fn an_empty_input_after_the_header_yields_no_chunks() {
        let text = "##fileformat=VCFv4.0\n#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n";
        let options = ReadOptions::new();
        let mut reader = VcfReader::open_bytes(text.as_bytes().to_vec(), options).unwrap();
        assert!(reader.next_chunk().unwrap().is_none());
    }
}
