// FDFReader Module
// Header assembly, data section decoding and the decoded file

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use log::{debug, info, warn};
use thiserror::Error;

use crate::fdf_types::{ByteOrder, FdfType, FdfValue};
use crate::preamble::{FdfReader, FDF_ITEMNAME_LENGTH};

/// Magic bytes at the start of every FDF file.
pub const FDF_MAGIC: &[u8; 4] = b"fdf\0";

/// Cap on up-front sample allocation; larger sections grow as they are read.
const MAX_PREALLOC: usize = 1 << 20;

#[derive(Error, Debug)]
pub enum FdfError {
    /// Opening or creating a file failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("IO error in {field} at byte {offset}: {source}")]
    Read {
        field: String,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error(
        "Truncated input in {field} at byte {offset}: expected {expected} bytes, got {actual}"
    )]
    Truncated {
        field: String,
        offset: u64,
        expected: usize,
        actual: usize,
    },

    #[error("Unknown type index {index} in {field} at byte {offset}")]
    UnknownType { field: String, index: i32, offset: u64 },

    #[error("Invalid magic: expected \"fdf\\0\", got {0:?}")]
    InvalidMagic([u8; 4]),

    #[error("Invalid dimensions in {field} at byte {offset}: {reason}")]
    InvalidDimensions {
        field: String,
        offset: u64,
        reason: String,
    },

    #[error("Header field {field} is not numeric")]
    NonNumeric { field: &'static str },
}

/// Coarse classification of [`FdfError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdfErrorKind {
    Io,
    Truncated,
    Format,
}

impl FdfError {
    pub fn kind(&self) -> FdfErrorKind {
        match self {
            FdfError::Io(_) | FdfError::Read { .. } => FdfErrorKind::Io,
            FdfError::Truncated { .. } => FdfErrorKind::Truncated,
            FdfError::UnknownType { .. }
            | FdfError::InvalidMagic(_)
            | FdfError::InvalidDimensions { .. }
            | FdfError::NonNumeric { .. } => FdfErrorKind::Format,
        }
    }
}

pub type Result<T> = std::result::Result<T, FdfError>;

/// Settings for a single load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadOptions {
    /// Fail on a bad magic instead of logging a warning.
    pub strict_magic: bool,
    pub byte_order: ByteOrder,
}

impl LoadOptions {
    pub fn new() -> Self {
        LoadOptions::default()
    }

    pub fn strict_magic(mut self, strict: bool) -> Self {
        self.strict_magic = strict;
        self
    }

    pub fn byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }
}

/// The eight header fields, in file order.
#[derive(Clone, Debug, PartialEq)]
pub struct FdfHeader {
    pub file_type: FdfValue,
    pub header_name: FdfValue,
    pub zero_crossing_voltage: FdfValue,
    pub volts_per_channel: FdfValue,
    pub t0: FdfValue,
    pub dt: FdfValue,
    pub nbits: FdfValue,
    pub units: FdfValue,
}

impl FdfHeader {
    /// Check the magic and read the eight header preambles.
    pub fn read<R: Read>(reader: &mut FdfReader<R>, strict_magic: bool) -> Result<Self> {
        let magic = reader.read_array::<4>("header", "magic")?;
        if &magic != FDF_MAGIC {
            if strict_magic {
                return Err(FdfError::InvalidMagic(magic));
            }
            warn!("FDF file has invalid magic {:?}, reading anyway", magic);
        }

        let file_type = Self::read_field(reader, "file_type")?;
        let header_name = Self::read_field(reader, "header_name")?;
        let zero_crossing_voltage = Self::read_field(reader, "zero_crossing_voltage")?;
        let volts_per_channel = Self::read_field(reader, "volts_per_channel")?;
        let t0 = Self::read_field(reader, "t0")?;
        let dt = Self::read_field(reader, "dt")?;
        let nbits = Self::read_field(reader, "nbits")?;
        let units = Self::read_field(reader, "units")?;

        Ok(FdfHeader {
            file_type,
            header_name,
            zero_crossing_voltage,
            volts_per_channel,
            t0,
            dt,
            nbits,
            units,
        })
    }

    fn read_field<R: Read>(reader: &mut FdfReader<R>, field: &'static str) -> Result<FdfValue> {
        let record = reader.read_record(field)?;
        debug!("fdf {} ({}): {}", field, record.fdf_type, record.value);
        Ok(record.value)
    }

    /// Calibration factor applied to every raw sample.
    pub fn scale(&self) -> Result<f64> {
        self.volts_per_channel
            .as_f64()
            .ok_or(FdfError::NonNumeric {
                field: "volts_per_channel",
            })
    }

    /// Time of the first sample, if stored as a number.
    pub fn t0_seconds(&self) -> Option<f64> {
        self.t0.as_f64()
    }

    /// Sample interval, if stored as a number.
    pub fn dt_seconds(&self) -> Option<f64> {
        self.dt.as_f64()
    }
}

/// The data section: record metadata plus scaled samples.
#[derive(Clone, Debug, PartialEq)]
pub struct FdfData {
    pub name: [u8; FDF_ITEMNAME_LENGTH],
    /// Shape as stored. Only `dims[0]` is reflected in `samples`.
    pub dims: Vec<i32>,
    pub fdf_type: FdfType,
    pub scale: f64,
    pub samples: Vec<f64>,
}

impl FdfData {
    /// Read the data record and scale every sample by `scale`.
    pub fn read<R: Read>(reader: &mut FdfReader<R>, scale: f64) -> Result<Self> {
        let layout = reader.read_layout("data")?;
        let width = layout.fdf_type.width();
        let order = reader.byte_order();

        let mut samples = Vec::with_capacity(layout.count.min(MAX_PREALLOC));
        let mut buf = [0u8; FdfType::MAX_WIDTH];
        for _ in 0..layout.count {
            let element = &mut buf[..width];
            reader.read_into(element, "data", "samples")?;
            // A full element is always in hand here, so decoding cannot fail.
            let raw = layout.fdf_type.decode_f64(element, order).unwrap_or_default();
            samples.push(raw * scale);
        }

        Ok(FdfData {
            name: layout.name,
            dims: layout.dims,
            fdf_type: layout.fdf_type,
            scale,
            samples,
        })
    }

    pub fn raw_sample_count(&self) -> usize {
        self.samples.len()
    }
}

/// A fully decoded FDF file.
///
/// Built in one go by [`FdfFile::load`]; never observable half-read.
#[derive(Clone, Debug, PartialEq)]
pub struct FdfFile {
    header: FdfHeader,
    data: FdfData,
}

impl FdfFile {
    /// Decode an FDF stream with default options.
    pub fn load<R: Read>(reader: R) -> Result<Self> {
        Self::load_with(reader, &LoadOptions::default())
    }

    pub fn load_with<R: Read>(reader: R, options: &LoadOptions) -> Result<Self> {
        let mut reader = FdfReader::with_byte_order(reader, options.byte_order);

        let header = FdfHeader::read(&mut reader, options.strict_magic)?;
        let scale = header.scale()?;
        let data = FdfData::read(&mut reader, scale)?;

        info!(
            "fdf data size: {} samples of {} ({} bytes read)",
            data.samples.len(),
            data.fdf_type,
            reader.offset()
        );
        Ok(FdfFile { header, data })
    }

    /// Open and decode the file at `path` with default options.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &LoadOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> Result<Self> {
        debug!("opening fdf file {}", path.as_ref().display());
        let file = File::open(path)?;
        Self::load_with(BufReader::new(file), options)
    }

    pub fn header(&self) -> &FdfHeader {
        &self.header
    }

    pub fn data(&self) -> &FdfData {
        &self.data
    }

    /// Scaled samples in stream order.
    pub fn samples(&self) -> &[f64] {
        &self.data.samples
    }

    pub fn into_parts(self) -> (FdfHeader, FdfData) {
        (self.header, self.data)
    }

    /// Time of each sample, `t0 + i * dt`.
    ///
    /// `None` when either `t0` or `dt` is not numeric.
    pub fn time_values(&self) -> Option<Vec<f64>> {
        let t0 = self.header.t0_seconds()?;
        let dt = self.header.dt_seconds()?;
        Some(
            (0..self.data.samples.len())
                .map(|i| t0 + i as f64 * dt)
                .collect(),
        )
    }

    /// Write the samples to a CSV file, with a time column when available.
    pub fn write_csv<P: AsRef<Path>>(&self, output_file: P) -> Result<()> {
        let file = File::create(output_file)?;
        let mut writer = BufWriter::new(file);

        match self.time_values() {
            Some(times) => {
                writeln!(writer, "Sample,Time,Voltage")?;
                for (idx, (&time, &value)) in times.iter().zip(self.samples()).enumerate() {
                    writeln!(writer, "{},{},{}", idx, time, value)?;
                }
            }
            None => {
                writeln!(writer, "Sample,Voltage")?;
                for (idx, &value) in self.samples().iter().enumerate() {
                    writeln!(writer, "{},{}", idx, value)?;
                }
            }
        }

        writer.flush()?;
        Ok(())
    }
}

/// Decode an FDF stream with default options.
pub fn load<R: Read>(reader: R) -> Result<FdfFile> {
    FdfFile::load(reader)
}
