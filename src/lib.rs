// src/lib.rs
// FDF Reader Library - Public API

//! # FDF Reader
//!
//! A Rust library for reading FDF waveform capture files.
//!
//! ## Features
//!
//! - Decode the eight-field FDF header (type, name, calibration, timing, units)
//! - Decode the data section into calibrated `f64` samples
//! - Report truncated or malformed input with the field and byte offset
//! - Export samples with their time axis to CSV
//!
//! ## Example
//!
//! ```no_run
//! use fdf_reader::FdfFile;
//!
//! let fdf = FdfFile::open("capture.fdf").expect("Failed to load file");
//!
//! println!("Units: {}", fdf.header().units);
//! println!("Samples: {}", fdf.samples().len());
//!
//! // Export to CSV
//! fdf.write_csv("output.csv").expect("Failed to write CSV");
//! ```

mod fdf_tools;
mod fdf_types;
mod preamble;

pub use fdf_tools::{
    load, FdfData, FdfError, FdfErrorKind, FdfFile, FdfHeader, LoadOptions, Result, FDF_MAGIC,
};
pub use fdf_types::{ByteOrder, FdfType, FdfValue};
pub use preamble::{
    FdfReader, PreambleRecord, RecordLayout, FDF_INT_SIZE, FDF_ITEMNAME_LENGTH, FDF_MAXDIMS,
};
