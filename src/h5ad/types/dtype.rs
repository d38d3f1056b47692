//! Element type descriptors for raw dataset buffers.
//!
//! Descriptors follow the numpy type-string convention used by h5py when it
//! maps HDF5 types: a byte-order character, a kind character and a width.
//!
//! | Descriptor | Meaning                                  |
//! |------------|------------------------------------------|
//! | `\|b1`     | boolean, one byte                        |
//! | `<i8`      | little-endian signed 64-bit integer      |
//! | `>u2`      | big-endian unsigned 16-bit integer       |
//! | `<f4`      | little-endian 32-bit float               |
//! | `\|S12`    | fixed-width byte string, 12 bytes        |
//! | `<U3`      | fixed-width UTF-32 text, 3 characters    |
//!
//! Record (structured) types are packed sequences of named fields.

use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use super::error::{H5adError, Result};

static DESCR_PATTERN: OnceLock<Regex> = OnceLock::new();

fn descr_regex() -> &'static Regex {
    DESCR_PATTERN.get_or_init(|| {
        Regex::new(r"^([<>|=])?([biufSU])(\d+)$").expect("Invalid dtype descriptor pattern")
    })
}

/// Byte order of multi-byte elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Kind and width of a single (non-record) element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Bool,
    /// Signed integer, width in bytes.
    Int(usize),
    /// Unsigned integer, width in bytes.
    UInt(usize),
    /// IEEE float, width in bytes.
    Float(usize),
    /// Fixed-width byte string, width in bytes.
    Bytes(usize),
    /// Fixed-width UTF-32 text, width in characters.
    Unicode(usize),
}

impl ElementKind {
    /// Number of bytes one element occupies in a raw buffer.
    pub fn itemsize(&self) -> usize {
        match *self {
            ElementKind::Bool => 1,
            ElementKind::Int(w) | ElementKind::UInt(w) | ElementKind::Float(w) | ElementKind::Bytes(w) => w,
            ElementKind::Unicode(chars) => chars * 4,
        }
    }

    fn kind_char(&self) -> char {
        match self {
            ElementKind::Bool => 'b',
            ElementKind::Int(_) => 'i',
            ElementKind::UInt(_) => 'u',
            ElementKind::Float(_) => 'f',
            ElementKind::Bytes(_) => 'S',
            ElementKind::Unicode(_) => 'U',
        }
    }

    fn width(&self) -> usize {
        match *self {
            ElementKind::Bool => 1,
            ElementKind::Int(w)
            | ElementKind::UInt(w)
            | ElementKind::Float(w)
            | ElementKind::Bytes(w)
            | ElementKind::Unicode(w) => w,
        }
    }
}

/// A named field of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub dtype: DType,
}

/// Element type of a dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DType {
    Element { kind: ElementKind, order: Endianness },
    /// Packed record: field offsets are the cumulative widths of preceding fields.
    Record(Vec<Field>),
}

impl DType {
    pub fn element(kind: ElementKind) -> Self {
        DType::Element {
            kind,
            order: Endianness::Little,
        }
    }

    /// Builds a packed record type from `(name, descriptor)` pairs.
    pub fn record<'a, I>(fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, descr)| {
                Ok(Field {
                    name: name.to_string(),
                    dtype: descr.parse()?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if fields.is_empty() {
            return Err(H5adError::format("", "record dtype must have at least one field"));
        }
        Ok(DType::Record(fields))
    }

    /// Number of bytes one element (or one record) occupies.
    pub fn itemsize(&self) -> usize {
        match self {
            DType::Element { kind, .. } => kind.itemsize(),
            DType::Record(fields) => fields.iter().map(|f| f.dtype.itemsize()).sum(),
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, DType::Record(_))
    }
}

impl FromStr for DType {
    type Err = H5adError;

    fn from_str(descr: &str) -> Result<Self> {
        let caps = descr_regex()
            .captures(descr)
            .ok_or_else(|| H5adError::format("", format!("Unsupported dtype descriptor '{}'", descr)))?;

        let order = match caps.get(1).map(|m| m.as_str()) {
            Some(">") => Endianness::Big,
            Some("=") => Endianness::native(),
            _ => Endianness::Little,
        };
        let width: usize = caps[3]
            .parse()
            .map_err(|e| H5adError::format("", format!("Invalid width in dtype '{}': {}", descr, e)))?;

        let kind = match (&caps[2], width) {
            ("b", 1) => ElementKind::Bool,
            ("i", 1 | 2 | 4 | 8) => ElementKind::Int(width),
            ("u", 1 | 2 | 4 | 8) => ElementKind::UInt(width),
            ("f", 4 | 8) => ElementKind::Float(width),
            ("S", 1..) => ElementKind::Bytes(width),
            ("U", 1..) => ElementKind::Unicode(width),
            _ => {
                return Err(H5adError::format(
                    "",
                    format!("Unsupported element width in dtype '{}'", descr),
                ));
            }
        };
        Ok(DType::Element { kind, order })
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::Element { kind, order } => {
                let order = match kind {
                    ElementKind::Bool | ElementKind::Bytes(_) => '|',
                    ElementKind::Int(1) | ElementKind::UInt(1) => '|',
                    _ if *order == Endianness::Big => '>',
                    _ => '<',
                };
                write!(f, "{}{}{}", order, kind.kind_char(), kind.width())
            }
            DType::Record(fields) => {
                write!(f, "[")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "('{}', '{}')", field.name, field.dtype)?;
                }
                write!(f, "]")
            }
        }
    }
}
