// FDF preamble records
// Forward-only byte cursor and the generic typed-record decoder

use std::io::{self, Read};

use crate::fdf_tools::{FdfError, Result};
use crate::fdf_types::{ByteOrder, FdfType, FdfValue};

/// Length of the fixed name field at the start of every record.
pub const FDF_ITEMNAME_LENGTH: usize = 64;
/// Largest `ndims` a record may declare.
pub const FDF_MAXDIMS: i32 = 32;
/// Size of the on-disk `ndims`, `dims` and type index integers.
pub const FDF_INT_SIZE: usize = 4;

/// Name, shape and type that prefix every record.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordLayout {
    pub name: [u8; FDF_ITEMNAME_LENGTH],
    pub dims: Vec<i32>,
    pub fdf_type: FdfType,
    /// Element count taken from `dims[0]`. Higher dimensions never size a read.
    pub count: usize,
}

impl RecordLayout {
    /// Payload size in bytes, `None` on overflow.
    pub fn byte_len(&self) -> Option<usize> {
        self.count.checked_mul(self.fdf_type.width())
    }

    pub fn name_str(&self) -> String {
        name_to_string(&self.name)
    }
}

/// One decoded preamble record.
#[derive(Debug, Clone, PartialEq)]
pub struct PreambleRecord {
    pub name: [u8; FDF_ITEMNAME_LENGTH],
    pub dims: Vec<i32>,
    pub fdf_type: FdfType,
    pub value: FdfValue,
}

impl PreambleRecord {
    pub fn name_str(&self) -> String {
        name_to_string(&self.name)
    }
}

fn name_to_string(name: &[u8]) -> String {
    let end = name.iter().position(|&b| b == 0).unwrap_or(name.len());
    String::from_utf8_lossy(&name[..end]).into_owned()
}

fn field_name(record: &str, part: &str) -> String {
    format!("{}.{}", record, part)
}

/// Forward-only reader over an FDF stream.
///
/// Tracks the absolute byte offset so errors can say where decoding stopped.
#[derive(Debug)]
pub struct FdfReader<R> {
    inner: R,
    offset: u64,
    byte_order: ByteOrder,
}

impl<R: Read> FdfReader<R> {
    pub fn new(inner: R) -> Self {
        Self::with_byte_order(inner, ByteOrder::default())
    }

    pub fn with_byte_order(inner: R, byte_order: ByteOrder) -> Self {
        FdfReader {
            inner,
            offset: 0,
            byte_order,
        }
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Fill `buf` completely or fail with [`FdfError::Truncated`].
    ///
    /// Read failures come back as [`FdfError::Read`] at the failing offset.
    pub fn read_into(&mut self, buf: &mut [u8], record: &str, part: &str) -> Result<()> {
        let start = self.offset;
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    self.offset += filled as u64;
                    return Err(FdfError::Read {
                        field: field_name(record, part),
                        offset: self.offset,
                        source,
                    });
                }
            }
        }
        self.offset += filled as u64;

        if filled < buf.len() {
            return Err(FdfError::Truncated {
                field: field_name(record, part),
                offset: start,
                expected: buf.len(),
                actual: filled,
            });
        }
        Ok(())
    }

    pub fn read_array<const N: usize>(&mut self, record: &str, part: &str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_into(&mut buf, record, part)?;
        Ok(buf)
    }

    /// Read exactly `len` bytes without trusting `len` for preallocation.
    pub fn read_bytes(&mut self, len: usize, record: &str, part: &str) -> Result<Vec<u8>> {
        let start = self.offset;
        let mut buf = Vec::new();
        let read = (&mut self.inner).take(len as u64).read_to_end(&mut buf);
        // Bytes read before a failure are still in `buf`.
        let got = buf.len();
        self.offset += got as u64;
        if let Err(source) = read {
            return Err(FdfError::Read {
                field: field_name(record, part),
                offset: self.offset,
                source,
            });
        }

        if got < len {
            return Err(FdfError::Truncated {
                field: field_name(record, part),
                offset: start,
                expected: len,
                actual: got,
            });
        }
        Ok(buf)
    }

    pub fn read_i32(&mut self, record: &str, part: &str) -> Result<i32> {
        let raw = self.read_array::<FDF_INT_SIZE>(record, part)?;
        Ok(match self.byte_order {
            ByteOrder::Little => i32::from_le_bytes(raw),
            ByteOrder::Big => i32::from_be_bytes(raw),
        })
    }

    /// Read the name, dimensions and type index of a record.
    ///
    /// All `ndims` dimensions are consumed so the cursor stays aligned, but
    /// only `dims[0]` becomes the element count.
    pub fn read_layout(&mut self, record: &str) -> Result<RecordLayout> {
        let name = self.read_array::<FDF_ITEMNAME_LENGTH>(record, "name")?;

        let ndims_offset = self.offset;
        let ndims = self.read_i32(record, "ndims")?;
        if !(1..=FDF_MAXDIMS).contains(&ndims) {
            return Err(FdfError::InvalidDimensions {
                field: field_name(record, "ndims"),
                offset: ndims_offset,
                reason: format!("ndims {} outside 1..={}", ndims, FDF_MAXDIMS),
            });
        }

        let dims_offset = self.offset;
        let mut dims = Vec::with_capacity(ndims as usize);
        for _ in 0..ndims {
            dims.push(self.read_i32(record, "dims")?);
        }
        let count = usize::try_from(dims[0]).map_err(|_| FdfError::InvalidDimensions {
            field: field_name(record, "dims"),
            offset: dims_offset,
            reason: format!("negative element count {}", dims[0]),
        })?;

        let type_offset = self.offset;
        let index = self.read_i32(record, "type")?;
        let fdf_type = FdfType::from_index(index).ok_or_else(|| FdfError::UnknownType {
            field: field_name(record, "type"),
            index,
            offset: type_offset,
        })?;

        Ok(RecordLayout {
            name,
            dims,
            fdf_type,
            count,
        })
    }

    /// Read one preamble record.
    ///
    /// Char payloads come back verbatim. For any other type all `dims[0]`
    /// elements are consumed but only the first one is decoded.
    pub fn read_record(&mut self, record: &str) -> Result<PreambleRecord> {
        let layout = self.read_layout(record)?;

        let payload_offset = self.offset;
        let len = layout.byte_len().ok_or_else(|| FdfError::InvalidDimensions {
            field: field_name(record, "dims"),
            offset: payload_offset,
            reason: format!(
                "payload of {} x {} bytes overflows",
                layout.count,
                layout.fdf_type.width()
            ),
        })?;
        let payload = self.read_bytes(len, record, "payload")?;

        let value = layout
            .fdf_type
            .decode(&payload, self.byte_order)
            .ok_or_else(|| FdfError::InvalidDimensions {
                field: field_name(record, "payload"),
                offset: payload_offset,
                reason: format!("{} record holds no elements", layout.fdf_type),
            })?;

        Ok(PreambleRecord {
            name: layout.name,
            dims: layout.dims,
            fdf_type: layout.fdf_type,
            value,
        })
    }
}
