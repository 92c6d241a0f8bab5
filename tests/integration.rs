//! End-to-end tests driving [`vcfire::VcfReader`]/[`vcfire::read_vcf`]
//! against real files on disk (plain and gzip-compressed): one
//! `tests/` file per crate, exercising the public API rather than
//! internals, with `tempfile` standing in for on-disk fixtures.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use vcfire::{
    read_vcf, ColumnData, FieldSelector, Region, ReadOptions, SampleSelection, VcfReader,
};

fn write_plain(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file.flush().expect("flush temp file");
    file
}

fn write_gzip(contents: &str) -> NamedTempFile {
    // No `.gz` suffix on purpose: the byte source must detect gzip framing
    // by magic bytes alone when the extension doesn't give it away.
    let file = NamedTempFile::new().expect("create temp gzip file");
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(contents.as_bytes()).expect("write gzip body");
    let mut file = encoder.finish().expect("finish gzip stream");
    file.flush().expect("flush temp gzip file");
    file
}

fn pos_column(chunks: &[vcfire::Chunk]) -> Vec<i32> {
    let mut out = Vec::new();
    for chunk in chunks {
        let field = chunk.field("variants/POS").expect("variants/POS present");
        match &field.data {
            ColumnData::I32(v) => out.extend(v.iter().copied()),
            other => panic!("unexpected POS storage: {other:?}"),
        }
    }
    out
}

const BASIC_VCF: &str = "\
##fileformat=VCFv4.0\n\
##FILTER=<ID=q10,Description=\"Quality below 10\">\n\
##INFO=<ID=NS,Number=1,Type=Integer,Description=\"Number of samples\">\n\
##INFO=<ID=AC,Number=A,Type=Integer,Description=\"Allele count\">\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype Quality\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA00001\tNA00002\tNA00003\n\
20\t14370\trs6054257\tG\tA\t29\tPASS\tNS=3;AC=1\tGT:GQ\t0|0:48\t1|0:48\t1/1:43\n\
20\t17330\t.\tT\tA\t3\tq10\tNS=3;AC=1\tGT:GQ\t0|0:49\t0|1:3\t0/0:41\n\
20\t1110696\trs6040355\tA\tG,T\t67\tPASS\tNS=2;AC=2,1\tGT:GQ\t1|2:21\t2|1:2\t2/2:35\n";

#[test]
fn reading_from_path_gzip_path_and_in_memory_bytes_agree() {
    let from_bytes = {
        let mut reader =
            VcfReader::open_bytes(BASIC_VCF.as_bytes().to_vec(), ReadOptions::new()).unwrap();
        let mut chunks = Vec::new();
        while let Some(chunk) = reader.next_chunk().unwrap() {
            chunks.push(chunk);
        }
        chunks
    };

    let plain_file = write_plain(BASIC_VCF);
    let from_path = read_vcf(plain_file.path(), ReadOptions::new()).unwrap();

    let gz_file = write_gzip(BASIC_VCF);
    let from_gzip_path = read_vcf(gz_file.path(), ReadOptions::new()).unwrap();

    assert_eq!(pos_column(&from_bytes), vec![14370, 17330, 1110696]);
    assert_eq!(pos_column(&from_bytes), pos_column(&from_path));
    assert_eq!(pos_column(&from_bytes), pos_column(&from_gzip_path));
}

#[test]
fn line_terminator_style_does_not_affect_the_parsed_arrays() {
    let crlf = BASIC_VCF.replace('\n', "\r\n");
    let bare_cr = BASIC_VCF.replace('\n', "\r");

    let lf_chunks = read_vcf(write_plain(BASIC_VCF).path(), ReadOptions::new()).unwrap();
    let crlf_chunks = read_vcf(write_plain(&crlf).path(), ReadOptions::new()).unwrap();
    let cr_chunks = read_vcf(write_plain(&bare_cr).path(), ReadOptions::new()).unwrap();

    assert_eq!(pos_column(&lf_chunks), pos_column(&crlf_chunks));
    assert_eq!(pos_column(&lf_chunks), pos_column(&cr_chunks));
}

#[test]
fn missing_trailing_line_terminator_reads_identically_to_a_terminated_file() {
    let with_newline = BASIC_VCF.to_string();
    let without_newline = BASIC_VCF.trim_end_matches('\n').to_string();

    let terminated = read_vcf(write_plain(&with_newline).path(), ReadOptions::new()).unwrap();
    let unterminated = read_vcf(write_plain(&without_newline).path(), ReadOptions::new()).unwrap();

    assert_eq!(pos_column(&terminated), pos_column(&unterminated));
}

#[test]
fn chunk_length_does_not_change_the_concatenated_arrays() {
    let whole = read_vcf(write_plain(BASIC_VCF).path(), ReadOptions::new()).unwrap();
    let in_ones = read_vcf(
        write_plain(BASIC_VCF).path(),
        ReadOptions::new().chunk_length(1),
    )
    .unwrap();
    let in_twos = read_vcf(
        write_plain(BASIC_VCF).path(),
        ReadOptions::new().chunk_length(2),
    )
    .unwrap();

    assert_eq!(in_ones.len(), 3);
    assert_eq!(in_twos.len(), 2);
    assert_eq!(pos_column(&whole), pos_column(&in_ones));
    assert_eq!(pos_column(&whole), pos_column(&in_twos));
}

#[test]
fn sample_sub_selection_by_id_matches_by_index_and_matches_full_read_plus_slicing() {
    let by_id = ReadOptions::new()
        .fields(FieldSelector::List(vec!["GT".to_string()]))
        .samples(SampleSelection::Ids(vec![
            "NA00001".to_string(),
            "NA00003".to_string(),
        ]));
    let by_index = ReadOptions::new()
        .fields(FieldSelector::List(vec!["GT".to_string()]))
        .samples(SampleSelection::Indices(vec![0, 2]));

    let path = write_plain(BASIC_VCF);
    let chunks_by_id = read_vcf(path.path(), by_id).unwrap();
    let chunks_by_index = read_vcf(path.path(), by_index).unwrap();

    assert_eq!(chunks_by_id.len(), 1);
    let gt_by_id = chunks_by_id[0].field("calldata/GT").unwrap();
    let gt_by_index = chunks_by_index[0].field("calldata/GT").unwrap();
    assert_eq!(chunks_by_id[0].samples, chunks_by_index[0].samples);
    assert_eq!(gt_by_id.n_samples, 2);
    match (&gt_by_id.data, &gt_by_index.data) {
        (ColumnData::I8(a), ColumnData::I8(b)) => assert_eq!(a, b),
        other => panic!("unexpected GT storage: {other:?}"),
    }

    let full = read_vcf(
        path.path(),
        ReadOptions::new().fields(FieldSelector::List(vec!["GT".to_string()])),
    )
    .unwrap();
    let full_gt = full[0].field("calldata/GT").unwrap();
    let ColumnData::I8(full_values) = &full_gt.data else {
        panic!("expected I8 GT storage");
    };
    // column-prune sample 1 (NA00002, index 1) out of the full 3-sample
    // array: what's left should equal the 2-sample sub-selected read.
    let ploidy = full_gt.item_len;
    let mut sliced = Vec::new();
    for row in 0..chunks_by_id[0].n_records {
        for sample in [0usize, 2usize] {
            let base = (row * full_gt.n_samples + sample) * ploidy;
            sliced.extend_from_slice(&full_values[base..base + ploidy]);
        }
    }
    match &gt_by_id.data {
        ColumnData::I8(v) => assert_eq!(v, &sliced),
        other => panic!("unexpected GT storage: {other:?}"),
    }
}

const COMPUTED_FIELDS_VCF: &str = "\
##fileformat=VCFv4.0\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
2L\t2\t.\t.\t.\t.\t.\t.\n\
2L\t4\t.\t.\tG\t.\t.\t.\n\
2L\t12\t.\tA\t.\t.\t.\t.\n\
2L\t34\t.\tC\tT\t.\t.\t.\n\
3R\t45\t.\tG\tA,T\t.\t.\t.\n\
3R\t47\t.\tG\tC,T,*\t.\t.\t.\n\
3R\t56\t.\tG\tA,GTAC\t.\t.\t.\n\
3R\t57\t.\tCATG\tC,GATG\t.\t.\t.\n\
3R\t58\t.\tGTAC\tATAC,GTACTACTAC,G,GTACA,GTA\t.\t.\t.\n";

#[test]
fn computed_fields_match_numalt_altlen_and_is_snp_across_the_full_fixture() {
    let options = ReadOptions::new()
        .fields(FieldSelector::List(vec![
            "numalt".to_string(),
            "altlen".to_string(),
            "is_snp".to_string(),
        ]))
        .alt_number(5);
    let chunks = read_vcf(write_plain(COMPUTED_FIELDS_VCF).path(), options).unwrap();
    assert_eq!(chunks.len(), 1);
    let chunk = &chunks[0];

    let numalt = match &chunk.field("variants/numalt").unwrap().data {
        ColumnData::I32(v) => v.clone(),
        other => panic!("unexpected numalt storage: {other:?}"),
    };
    assert_eq!(numalt, vec![0, 1, 0, 1, 2, 3, 2, 2, 5]);

    let is_snp = match &chunk.field("variants/is_snp").unwrap().data {
        ColumnData::Bool(v) => v.clone(),
        other => panic!("unexpected is_snp storage: {other:?}"),
    };
    assert_eq!(
        is_snp,
        vec![false, false, false, true, true, false, false, false, false]
    );

    let altlen = match &chunk.field("variants/altlen").unwrap().data {
        ColumnData::I32(v) => v.clone(),
        other => panic!("unexpected altlen storage: {other:?}"),
    };
    let item_len = chunk.field("variants/altlen").unwrap().item_len;
    assert_eq!(altlen[7 * item_len], -3);
    assert_eq!(altlen[8 * item_len + 1], 6);
}

#[test]
fn a_truncated_final_record_without_a_trailing_newline_still_parses() {
    let text = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n2L\t12\t.\tA\t.\t.\t.\t.\n2R\t34\t.\tA\t.\t.\t.\t.";
    let options = ReadOptions::new().fields(FieldSelector::List(vec!["POS".to_string()]));
    let chunks = read_vcf(write_plain(text).path(), options).unwrap();
    assert_eq!(pos_column(&chunks), vec![12, 34]);
}

#[test]
fn a_region_query_without_an_index_scans_and_filters_in_encountered_order() {
    let unsorted = "\
##fileformat=VCFv4.0\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
20\t14370\t.\tG\tA\t.\t.\t.\n\
20\t1230237\t.\tT\t.\t.\t.\t.\n\
20\t17330\t.\tT\tA\t.\t.\t.\n\
20\t1110696\t.\tA\tG,T\t.\t.\t.\n";

    let options = ReadOptions::new()
        .fields(FieldSelector::List(vec!["POS".to_string()]))
        .region(Region::parse("20:1000000-1233000").unwrap());
    let chunks = read_vcf(write_plain(unsorted).path(), options).unwrap();
    assert_eq!(pos_column(&chunks), vec![1230237, 1110696]);
}

#[test]
fn a_region_with_no_matching_records_yields_empty_output_not_an_error() {
    let text = "\
##fileformat=VCFv4.0\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\n\
20\t1\t.\tA\tG\t.\t.\t.\n";
    let options = ReadOptions::new().region(Region::parse("21:1-100").unwrap());
    let chunks = read_vcf(write_plain(text).path(), options).unwrap();
    assert!(chunks.is_empty());
}

#[test]
fn a_sample_missing_a_trailing_format_subfield_fills_just_that_field() {
    // FORMAT declares GT:GQ but the sample only supplies one colon-separated
    // value: GQ is missing for this sample and should be filled, while GT
    // still parses from the value that is present.
    let text = "\
##fileformat=VCFv4.0\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype Quality\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA00001\n\
20\t14370\t.\tG\tA,T\t.\t.\t.\tGT:GQ\t1/2\n";
    let chunks = read_vcf(write_plain(text).path(), ReadOptions::new()).unwrap();
    let chunk = &chunks[0];

    let gt = match &chunk.field("calldata/GT").unwrap().data {
        ColumnData::I8(v) => v.clone(),
        other => panic!("unexpected GT storage: {other:?}"),
    };
    assert_eq!(gt, vec![1, 2]);

    let gq = match &chunk.field("calldata/GQ").unwrap().data {
        ColumnData::I32(v) => v.clone(),
        other => panic!("unexpected GQ storage: {other:?}"),
    };
    assert_eq!(gq, vec![-1]);
}

#[test]
fn a_cleared_format_column_fills_every_calldata_field_without_reading_samples() {
    let text = "\
##fileformat=VCFv4.0\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
##FORMAT=<ID=GQ,Number=1,Type=Integer,Description=\"Genotype Quality\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA00001\n\
20\t14370\t.\tG\tA\t.\t.\t.\t.\t.\n";
    let chunks = read_vcf(write_plain(text).path(), ReadOptions::new()).unwrap();
    let chunk = &chunks[0];

    let gt = match &chunk.field("calldata/GT").unwrap().data {
        ColumnData::I8(v) => v.clone(),
        other => panic!("unexpected GT storage: {other:?}"),
    };
    assert_eq!(gt, vec![-1]);

    let gq = match &chunk.field("calldata/GQ").unwrap().data {
        ColumnData::I32(v) => v.clone(),
        other => panic!("unexpected GQ storage: {other:?}"),
    };
    assert_eq!(gq, vec![-1]);
}
