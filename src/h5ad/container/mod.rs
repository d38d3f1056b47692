//! Backend seam for hierarchical containers.
//!
//! The reader only needs a read-only view of the container: node kinds,
//! member names, attributes and full dataset buffers. Anything that can answer
//! those questions for `/`-separated paths can be read.
//!
//! # Paths
//!
//! Paths are relative to the container root and never start with `/`. The
//! root group itself has the empty path `""`.

pub mod memory;

use std::collections::BTreeMap;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian};

use crate::h5ad::types::dtype::{DType, ElementKind, Field};
use crate::h5ad::types::error::{H5adError, Result};

/// Backend view of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Group,
    Dataset,
}

/// A single attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    IntArray(Vec<i64>),
    FloatArray(Vec<f64>),
    TextArray(Vec<String>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer sequence view: integer arrays, and float arrays holding whole numbers.
    pub fn as_int_array(&self) -> Option<Vec<i64>> {
        match self {
            AttrValue::IntArray(v) => Some(v.clone()),
            AttrValue::FloatArray(v) => v
                .iter()
                .map(|&f| (f.fract() == 0.0).then_some(f as i64))
                .collect(),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(value: Vec<i64>) -> Self {
        AttrValue::IntArray(value)
    }
}

impl<const N: usize> From<[i64; N]> for AttrValue {
    fn from(value: [i64; N]) -> Self {
        AttrValue::IntArray(value.to_vec())
    }
}

/// Attributes attached to a group or dataset.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    values: BTreeMap<String, AttrValue>,
}

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.values.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.values.insert(name.into(), value.into());
    }
}

/// The full contents of a dataset as stored: element type, shape and bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBuffer {
    pub dtype: DType,
    pub shape: Vec<usize>,
    pub bytes: Vec<u8>,
}

macro_rules! numeric_constructor {
    ($name:ident, $ty:ty, $kind:expr, $write:ident) => {
        /// One-dimensional little-endian buffer holding `values`.
        pub fn $name(values: &[$ty]) -> Self {
            let mut bytes = vec![0u8; values.len() * std::mem::size_of::<$ty>()];
            LittleEndian::$write(values, &mut bytes);
            Self::new(DType::element($kind), vec![values.len()], bytes)
        }
    };
}

impl RawBuffer {
    pub fn new(dtype: DType, shape: Vec<usize>, bytes: Vec<u8>) -> Self {
        Self { dtype, shape, bytes }
    }

    numeric_constructor!(from_i16, i16, ElementKind::Int(2), write_i16_into);
    numeric_constructor!(from_i32, i32, ElementKind::Int(4), write_i32_into);
    numeric_constructor!(from_i64, i64, ElementKind::Int(8), write_i64_into);
    numeric_constructor!(from_u32, u32, ElementKind::UInt(4), write_u32_into);
    numeric_constructor!(from_u64, u64, ElementKind::UInt(8), write_u64_into);
    numeric_constructor!(from_f32, f32, ElementKind::Float(4), write_f32_into);
    numeric_constructor!(from_f64, f64, ElementKind::Float(8), write_f64_into);

    pub fn from_bool(values: &[bool]) -> Self {
        let bytes = values.iter().map(|&b| b as u8).collect();
        Self::new(DType::element(ElementKind::Bool), vec![values.len()], bytes)
    }

    /// Fixed-width byte strings, NUL-padded (or truncated) to `width`.
    pub fn from_byte_strings(width: usize, values: &[&[u8]]) -> Self {
        let mut bytes = Vec::with_capacity(width * values.len());
        for value in values {
            let take = value.len().min(width);
            bytes.extend_from_slice(&value[..take]);
            bytes.resize(bytes.len() + (width - take), 0);
        }
        Self::new(DType::element(ElementKind::Bytes(width)), vec![values.len()], bytes)
    }

    /// Fixed-width UTF-32 text of `width` characters per element.
    pub fn from_text(width: usize, values: &[&str]) -> Self {
        let mut bytes = Vec::with_capacity(width * 4 * values.len());
        for value in values {
            let mut unit = [0u8; 4];
            let mut written = 0;
            for c in value.chars().take(width) {
                LittleEndian::write_u32(&mut unit, c as u32);
                bytes.extend_from_slice(&unit);
                written += 1;
            }
            bytes.resize(bytes.len() + (width - written) * 4, 0);
        }
        Self::new(DType::element(ElementKind::Unicode(width)), vec![values.len()], bytes)
    }

    /// Interleaves equally long one-dimensional columns into a packed record buffer.
    pub fn pack_records(columns: Vec<(&str, RawBuffer)>) -> Result<Self> {
        let len = columns.first().and_then(|(_, c)| c.element_count()).unwrap_or(0);
        if let Some((name, _)) = columns
            .iter()
            .find(|(_, c)| c.element_count() != Some(len) || c.dtype.is_record())
        {
            return Err(H5adError::format(
                *name,
                "record columns must be non-record buffers of equal length",
            ));
        }

        let itemsizes: Vec<usize> = columns.iter().map(|(_, c)| c.dtype.itemsize()).collect();
        let mut bytes = Vec::with_capacity(itemsizes.iter().sum::<usize>() * len);
        for row in 0..len {
            for ((_, column), &size) in columns.iter().zip(&itemsizes) {
                bytes.extend_from_slice(&column.bytes[row * size..(row + 1) * size]);
            }
        }

        let fields = columns
            .into_iter()
            .map(|(name, column)| Field {
                name: name.to_string(),
                dtype: column.dtype,
            })
            .collect::<Vec<_>>();
        if fields.is_empty() {
            return Err(H5adError::format("", "record dtype must have at least one field"));
        }
        Ok(Self::new(DType::Record(fields), vec![len], bytes))
    }

    /// Replaces the declared shape. The element count is checked when decoding.
    pub fn with_shape(mut self, shape: &[usize]) -> Self {
        self.shape = shape.to_vec();
        self
    }

    /// Product of the shape. `None` when it does not fit in `usize`.
    pub fn element_count(&self) -> Option<usize> {
        self.shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    }
}

/// Read-only access to a hierarchical container.
pub trait Container {
    /// Whether the node at `path` is a group or a dataset.
    fn entry_kind(&self, path: &str) -> Result<EntryKind>;

    /// Names of the direct members of the group at `group`, in backend order.
    fn member_names(&self, group: &str) -> Result<Vec<String>>;

    fn attributes(&self, path: &str) -> Result<Attributes>;

    /// Reads the complete buffer of the dataset at `path`.
    fn read_raw(&self, path: &str) -> Result<RawBuffer>;

    fn top_level_keys(&self) -> Result<Vec<String>> {
        self.member_names("")
    }
}

impl<C: Container + ?Sized> Container for &C {
    fn entry_kind(&self, path: &str) -> Result<EntryKind> {
        (**self).entry_kind(path)
    }

    fn member_names(&self, group: &str) -> Result<Vec<String>> {
        (**self).member_names(group)
    }

    fn attributes(&self, path: &str) -> Result<Attributes> {
        (**self).attributes(path)
    }

    fn read_raw(&self, path: &str) -> Result<RawBuffer> {
        (**self).read_raw(path)
    }

    fn top_level_keys(&self) -> Result<Vec<String>> {
        (**self).top_level_keys()
    }
}

/// Backends that open a container from a filesystem path.
pub trait OpenContainer: Container + Sized {
    fn open(path: &Path) -> Result<Self>;
}
