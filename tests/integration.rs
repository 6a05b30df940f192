// tests/integration.rs
// Integration tests for FDF Reader

use std::fs;
use std::io::{self, Cursor, Read, Write};
use fdf_reader::{
    ByteOrder, FdfError, FdfErrorKind, FdfFile, FdfReader, FdfType, FdfValue, LoadOptions,
    FDF_ITEMNAME_LENGTH,
};
use tempfile::NamedTempFile;

/// Minimal FDF writer used to build test files.
struct FdfBuilder {
    order: ByteOrder,
    bytes: Vec<u8>,
}

impl FdfBuilder {
    fn new(order: ByteOrder) -> Self {
        FdfBuilder { order, bytes: b"fdf\0".to_vec() }
    }

    fn int(&mut self, value: i32) {
        let raw = match self.order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        self.bytes.extend_from_slice(&raw);
    }

    fn record(&mut self, name: &str, dims: &[i32], fdf_type: FdfType, payload: &[u8]) -> &mut Self {
        let mut name_buf = [0u8; FDF_ITEMNAME_LENGTH];
        name_buf[..name.len()].copy_from_slice(name.as_bytes());
        self.bytes.extend_from_slice(&name_buf);
        self.int(dims.len() as i32);
        for &dim in dims {
            self.int(dim);
        }
        self.int(fdf_type.index());
        self.bytes.extend_from_slice(payload);
        self
    }

    fn f64(&self, value: f64) -> [u8; 8] {
        match self.order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        }
    }

    /// Standard eight-field header with the given calibration.
    fn header(&mut self, vpc: f64, t0: f64, dt: f64) -> &mut Self {
        let zcv = self.f64(0.125);
        let vpc = self.f64(vpc);
        let t0 = self.f64(t0);
        let dt = self.f64(dt);
        let nbits = match self.order {
            ByteOrder::Little => 8u16.to_le_bytes(),
            ByteOrder::Big => 8u16.to_be_bytes(),
        };
        self.record("fdf_file_type", &[3], FdfType::Char, b"v01")
            .record("header", &[11], FdfType::Char, b"channel A\0\0")
            .record("zcv", &[1], FdfType::Float64, &zcv)
            .record("vpc", &[1], FdfType::Float64, &vpc)
            .record("t0", &[1], FdfType::Float64, &t0)
            .record("dt", &[1], FdfType::Float64, &dt)
            .record("nbits", &[1], FdfType::U16, &nbits)
            .record("units", &[5], FdfType::Char, b"volts")
    }

    fn finish(&self) -> Vec<u8> {
        self.bytes.clone()
    }
}

fn sample_file() -> Vec<u8> {
    let raw: [i16; 5] = [-100, -1, 0, 1, 100];
    let payload: Vec<u8> = raw.iter().flat_map(|v| v.to_le_bytes()).collect();
    FdfBuilder::new(ByteOrder::Little)
        .header(0.004, -2.0e-6, 5.0e-9)
        .record("data", &[5], FdfType::I16, &payload)
        .finish()
}

fn write_temp(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(bytes).expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

#[test]
fn test_load_from_disk() {
    let file = write_temp(&sample_file());
    let fdf = FdfFile::open(file.path()).expect("Failed to load FDF file");

    let header = fdf.header();
    assert_eq!(header.file_type.as_text().as_deref(), Some("v01"));
    assert_eq!(header.header_name.as_text().as_deref(), Some("channel A"));
    assert_eq!(header.zero_crossing_voltage, FdfValue::F64(0.125));
    assert_eq!(header.volts_per_channel, FdfValue::F64(0.004));
    assert_eq!(header.t0, FdfValue::F64(-2.0e-6));
    assert_eq!(header.dt, FdfValue::F64(5.0e-9));
    assert_eq!(header.nbits, FdfValue::U16(8));
    assert_eq!(header.units, FdfValue::Bytes(b"volts".to_vec()));

    let expected: Vec<f64> = [-100.0, -1.0, 0.0, 1.0, 100.0].iter().map(|v| v * 0.004).collect();
    assert_eq!(fdf.samples(), expected.as_slice());
    assert_eq!(fdf.data().fdf_type, FdfType::I16);
    assert_eq!(fdf.data().scale, 0.004);
}

#[test]
fn test_float32_scenario() {
    let payload: Vec<u8> = [1.0f32, 2.0, 3.0].iter().flat_map(|v| v.to_le_bytes()).collect();
    let bytes = FdfBuilder::new(ByteOrder::Little)
        .header(2.0, 0.0, 1.0)
        .record("data", &[3], FdfType::Float32, &payload)
        .finish();

    let fdf = fdf_reader::load(Cursor::new(bytes)).expect("Failed to load FDF stream");
    assert_eq!(fdf.samples(), &[2.0, 4.0, 6.0]);
}

#[test]
fn test_char_preamble_verbatim() {
    let mut builder = FdfBuilder::new(ByteOrder::Little);
    builder.bytes.clear();
    builder.record("greeting", &[5], FdfType::Char, b"hello");

    let mut reader = FdfReader::new(Cursor::new(builder.finish()));
    let record = reader.read_record("greeting").expect("Failed to read record");
    assert_eq!(record.value.as_bytes(), Some(&b"hello"[..]));
    assert_eq!(record.value.as_f64(), None);
}

#[test]
fn test_load_is_repeatable() {
    let bytes = sample_file();
    let first = FdfFile::load(Cursor::new(bytes.clone())).expect("first load");
    let second = FdfFile::load(Cursor::new(bytes)).expect("second load");
    assert_eq!(first, second);
}

#[test]
fn test_truncation_anywhere_is_reported() {
    let bytes = sample_file();
    for cut in 0..bytes.len() {
        match FdfFile::load(Cursor::new(&bytes[..cut])) {
            Err(e) => assert_eq!(e.kind(), FdfErrorKind::Truncated, "cut at {}: {}", cut, e),
            Ok(_) => panic!("cut at {} loaded successfully", cut),
        }
    }
    assert!(FdfFile::load(Cursor::new(&bytes[..])).is_ok());
}

#[test]
fn test_unknown_data_type() {
    let mut bytes = FdfBuilder::new(ByteOrder::Little).header(1.0, 0.0, 1.0).finish();
    bytes.extend_from_slice(&[0u8; FDF_ITEMNAME_LENGTH]);
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&1i32.to_le_bytes());
    bytes.extend_from_slice(&11i32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 16]);

    let err = FdfFile::load(Cursor::new(bytes)).unwrap_err();
    assert_eq!(err.kind(), FdfErrorKind::Format);
    assert!(matches!(err, FdfError::UnknownType { index: 11, .. }));
}

#[test]
fn test_big_endian_file() {
    let payload: Vec<u8> = [300i32, -300].iter().flat_map(|v| v.to_be_bytes()).collect();
    let bytes = FdfBuilder::new(ByteOrder::Big)
        .header(0.5, 0.0, 1.0)
        .record("data", &[2], FdfType::I32, &payload)
        .finish();

    let options = LoadOptions::new().byte_order(ByteOrder::Big);
    let fdf = FdfFile::load_with(Cursor::new(bytes), &options)
        .expect("Failed to load big-endian file");
    assert_eq!(fdf.samples(), &[150.0, -150.0]);
    assert_eq!(fdf.header().nbits, FdfValue::U16(8));
}

#[test]
fn test_csv_without_time_axis() {
    let bytes = FdfBuilder::new(ByteOrder::Little)
        .record("fdf_file_type", &[1], FdfType::Char, b"x")
        .record("header", &[1], FdfType::Char, b"x")
        .record("zcv", &[1], FdfType::I8, &[0])
        .record("vpc", &[1], FdfType::I8, &[3])
        .record("t0", &[1], FdfType::Char, b"?")
        .record("dt", &[1], FdfType::Char, b"?")
        .record("nbits", &[1], FdfType::U8, &[8])
        .record("units", &[1], FdfType::Char, b"V")
        .record("data", &[2], FdfType::U8, &[1, 2])
        .finish();

    let fdf = FdfFile::load(Cursor::new(bytes)).expect("Failed to load FDF stream");
    assert!(fdf.time_values().is_none());

    let out = NamedTempFile::new().expect("Failed to create temp file");
    fdf.write_csv(out.path()).expect("Failed to write CSV");
    let text = fs::read_to_string(out.path()).expect("Failed to read CSV");
    assert_eq!(text, "Sample,Voltage\n0,3\n1,6\n");
}

#[test]
fn test_error_handling() {
    let result = FdfFile::open("non_existent.fdf");
    assert!(matches!(result, Err(FdfError::Io(_))));

    let file = write_temp(b"This is not an FDF file");
    let strict = LoadOptions::new().strict_magic(true);
    let err = FdfFile::open_with(file.path(), &strict).unwrap_err();
    assert!(matches!(err, FdfError::InvalidMagic(_)));

    // Lenient mode gets past the magic and then fails on the malformed record.
    assert!(FdfFile::open(file.path()).is_err());
}

/// Hands out the wrapped bytes, then fails every read.
struct FlakyStream {
    inner: Cursor<Vec<u8>>,
}

impl Read for FlakyStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf)? {
            0 => Err(io::Error::new(io::ErrorKind::Other, "device detached")),
            n => Ok(n),
        }
    }
}

#[test]
fn test_read_failure_reports_location() {
    let bytes = sample_file();
    let cut = bytes.len() - 3;
    let stream = FlakyStream { inner: Cursor::new(bytes[..cut].to_vec()) };

    let err = FdfFile::load(stream).unwrap_err();
    assert_eq!(err.kind(), FdfErrorKind::Io);
    match err {
        FdfError::Read { field, offset, source } => {
            assert_eq!(field, "data.samples");
            assert_eq!(offset, cut as u64);
            assert_eq!(source.to_string(), "device detached");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
