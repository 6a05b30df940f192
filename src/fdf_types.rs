// FDF type registry
// Element types, byte widths and scalar decoding

use std::fmt;

/// Byte order used for every integer and float in a file.
///
/// FDF files carry no byte-order marker, so this must match the producing
/// system. Captures seen so far were written on little-endian hosts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

/// Copy the first `N` bytes out of a slice.
fn take<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.get(..N)?.try_into().ok()
}

macro_rules! num {
    ($t:ty, $bytes:expr, $order:expr) => {{
        let raw = take($bytes)?;
        match $order {
            ByteOrder::Little => <$t>::from_le_bytes(raw),
            ByteOrder::Big => <$t>::from_be_bytes(raw),
        }
    }};
}

/// Element type of a preamble or data record.
///
/// The discriminant is the type index stored on disk, so variants must never
/// be reordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FdfType {
    Char = 0,
    I8 = 1,
    U8 = 2,
    I16 = 3,
    U16 = 4,
    I32 = 5,
    U32 = 6,
    Float32 = 7,
    Float64 = 8,
    Complex64 = 9,
    Complex128 = 10,
}

impl FdfType {
    /// All types in on-disk index order.
    pub const ALL: [FdfType; 11] = [
        FdfType::Char,
        FdfType::I8,
        FdfType::U8,
        FdfType::I16,
        FdfType::U16,
        FdfType::I32,
        FdfType::U32,
        FdfType::Float32,
        FdfType::Float64,
        FdfType::Complex64,
        FdfType::Complex128,
    ];

    /// Width of the widest element (`Complex128`).
    pub const MAX_WIDTH: usize = 16;

    /// Resolve an on-disk type index. `None` for anything outside `0..=10`.
    pub fn from_index(index: i32) -> Option<Self> {
        usize::try_from(index)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    pub const fn index(self) -> i32 {
        self as i32
    }

    /// Size of one element in bytes.
    ///
    /// `Float32` is 4 bytes. Older tables list it as 2, but no such file
    /// can be decoded as an IEEE single.
    pub const fn width(self) -> usize {
        match self {
            FdfType::Char | FdfType::I8 | FdfType::U8 => 1,
            FdfType::I16 | FdfType::U16 => 2,
            FdfType::I32 | FdfType::U32 | FdfType::Float32 => 4,
            FdfType::Float64 | FdfType::Complex64 => 8,
            FdfType::Complex128 => 16,
        }
    }

    /// Char payloads are passed through as raw bytes instead of decoded.
    pub const fn is_char(self) -> bool {
        matches!(self, FdfType::Char)
    }

    pub const fn name(self) -> &'static str {
        match self {
            FdfType::Char => "fdf_char",
            FdfType::I8 => "fdf_i8",
            FdfType::U8 => "fdf_u8",
            FdfType::I16 => "fdf_i16",
            FdfType::U16 => "fdf_u16",
            FdfType::I32 => "fdf_i32",
            FdfType::U32 => "fdf_u32",
            FdfType::Float32 => "fdf_float",
            FdfType::Float64 => "fdf_double",
            FdfType::Complex64 => "fdf_complex",
            FdfType::Complex128 => "fdf_dcomplex",
        }
    }

    /// Decode one element from the front of `bytes`.
    ///
    /// Char passes every byte through unchanged. For numeric types bytes
    /// past the first element are ignored, and `None` is returned when fewer
    /// than [`FdfType::width`] bytes are supplied.
    pub fn decode(self, bytes: &[u8], order: ByteOrder) -> Option<FdfValue> {
        let value = match self {
            FdfType::Char => FdfValue::Bytes(bytes.to_vec()),
            FdfType::I8 => FdfValue::I8(num!(i8, bytes, order)),
            FdfType::U8 => FdfValue::U8(num!(u8, bytes, order)),
            FdfType::I16 => FdfValue::I16(num!(i16, bytes, order)),
            FdfType::U16 => FdfValue::U16(num!(u16, bytes, order)),
            FdfType::I32 => FdfValue::I32(num!(i32, bytes, order)),
            FdfType::U32 => FdfValue::U32(num!(u32, bytes, order)),
            FdfType::Float32 => FdfValue::F32(num!(f32, bytes, order)),
            FdfType::Float64 => FdfValue::F64(num!(f64, bytes, order)),
            FdfType::Complex64 => FdfValue::Complex64 {
                re: num!(f32, bytes, order),
                im: num!(f32, bytes.get(4..)?, order),
            },
            FdfType::Complex128 => FdfValue::Complex128 {
                re: num!(f64, bytes, order),
                im: num!(f64, bytes.get(8..)?, order),
            },
        };
        Some(value)
    }

    /// Decode one element as a real number, the way sample data is read.
    ///
    /// Char elements count as unsigned bytes; complex elements give their
    /// real part.
    pub fn decode_f64(self, bytes: &[u8], order: ByteOrder) -> Option<f64> {
        match self {
            FdfType::Char => bytes.first().map(|&b| f64::from(b)),
            _ => self.decode(bytes, order)?.as_f64(),
        }
    }
}

impl fmt::Display for FdfType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded preamble payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FdfValue {
    /// Raw Char payload, kept verbatim.
    Bytes(Vec<u8>),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    F32(f32),
    F64(f64),
    Complex64 { re: f32, im: f32 },
    Complex128 { re: f64, im: f64 },
}

impl FdfValue {
    pub fn fdf_type(&self) -> FdfType {
        match self {
            FdfValue::Bytes(_) => FdfType::Char,
            FdfValue::I8(_) => FdfType::I8,
            FdfValue::U8(_) => FdfType::U8,
            FdfValue::I16(_) => FdfType::I16,
            FdfValue::U16(_) => FdfType::U16,
            FdfValue::I32(_) => FdfType::I32,
            FdfValue::U32(_) => FdfType::U32,
            FdfValue::F32(_) => FdfType::Float32,
            FdfValue::F64(_) => FdfType::Float64,
            FdfValue::Complex64 { .. } => FdfType::Complex64,
            FdfValue::Complex128 { .. } => FdfType::Complex128,
        }
    }

    /// Numeric value as `f64`, real part for complex values.
    /// `None` for Char payloads.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            FdfValue::Bytes(_) => None,
            FdfValue::I8(v) => Some(f64::from(v)),
            FdfValue::U8(v) => Some(f64::from(v)),
            FdfValue::I16(v) => Some(f64::from(v)),
            FdfValue::U16(v) => Some(f64::from(v)),
            FdfValue::I32(v) => Some(f64::from(v)),
            FdfValue::U32(v) => Some(f64::from(v)),
            FdfValue::F32(v) => Some(f64::from(v)),
            FdfValue::F64(v) => Some(v),
            FdfValue::Complex64 { re, .. } => Some(f64::from(re)),
            FdfValue::Complex128 { re, .. } => Some(re),
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FdfValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Char payload as text, with trailing NUL padding removed.
    pub fn as_text(&self) -> Option<String> {
        let bytes = self.as_bytes()?;
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
    }
}

impl fmt::Display for FdfValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FdfValue::Bytes(_) => write!(f, "{}", self.as_text().unwrap_or_default()),
            FdfValue::I8(v) => write!(f, "{}", v),
            FdfValue::U8(v) => write!(f, "{}", v),
            FdfValue::I16(v) => write!(f, "{}", v),
            FdfValue::U16(v) => write!(f, "{}", v),
            FdfValue::I32(v) => write!(f, "{}", v),
            FdfValue::U32(v) => write!(f, "{}", v),
            FdfValue::F32(v) => write!(f, "{}", v),
            FdfValue::F64(v) => write!(f, "{}", v),
            FdfValue::Complex64 { re, im } => write!(f, "{}{:+}i", re, im),
            FdfValue::Complex128 { re, im } => write!(f, "{}{:+}i", re, im),
        }
    }
}
