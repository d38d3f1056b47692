//! Core data structures for decoded container values.
//!
//! This module defines the value types produced by a read:
//! - Typed n-dimensional arrays and their scalar elements
//! - Record (structured) arrays
//! - Sparse matrices reconstructed from triplet groups
//! - Literals recovered from legacy dictionary strings

use ndarray::ArrayD;

use super::mapping::Mapping;

/// Applies `$body` to the inner `ndarray` of every non-record variant and
/// `$rbody` to the record variant.
macro_rules! each_array {
    ($value:expr, $a:ident => $body:expr, $r:ident => $rbody:expr) => {
        match $value {
            TypedArray::Bool($a) => $body,
            TypedArray::I8($a) => $body,
            TypedArray::I16($a) => $body,
            TypedArray::I32($a) => $body,
            TypedArray::I64($a) => $body,
            TypedArray::U8($a) => $body,
            TypedArray::U16($a) => $body,
            TypedArray::U32($a) => $body,
            TypedArray::U64($a) => $body,
            TypedArray::F32($a) => $body,
            TypedArray::F64($a) => $body,
            TypedArray::Bytes { values: $a, .. } => $body,
            TypedArray::Text { values: $a, .. } => $body,
            TypedArray::Record($r) => $rbody,
        }
    };
}

/// A fully materialized dataset, typed exactly as declared by its dtype.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedArray {
    Bool(ArrayD<bool>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    /// Fixed-width byte strings with trailing NULs removed.
    Bytes { width: usize, values: ArrayD<Vec<u8>> },
    /// Fixed-width text; `width` is the declared maximum number of characters.
    Text { width: usize, values: ArrayD<String> },
    Record(RecordArray),
}

impl TypedArray {
    pub fn shape(&self) -> &[usize] {
        each_array!(self, a => a.shape(), r => r.shape())
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Total number of elements (records count as one element each).
    pub fn len(&self) -> usize {
        self.shape().iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_record(&self) -> bool {
        matches!(self, TypedArray::Record(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypedArray::I8(_)
                | TypedArray::I16(_)
                | TypedArray::I32(_)
                | TypedArray::I64(_)
                | TypedArray::U8(_)
                | TypedArray::U16(_)
                | TypedArray::U32(_)
                | TypedArray::U64(_)
        )
    }

    /// Short element type name used in log and error messages.
    pub fn element_name(&self) -> &'static str {
        match self {
            TypedArray::Bool(_) => "bool",
            TypedArray::I8(_) => "int8",
            TypedArray::I16(_) => "int16",
            TypedArray::I32(_) => "int32",
            TypedArray::I64(_) => "int64",
            TypedArray::U8(_) => "uint8",
            TypedArray::U16(_) => "uint16",
            TypedArray::U32(_) => "uint32",
            TypedArray::U64(_) => "uint64",
            TypedArray::F32(_) => "float32",
            TypedArray::F64(_) => "float64",
            TypedArray::Bytes { .. } => "bytes",
            TypedArray::Text { .. } => "str",
            TypedArray::Record(_) => "record",
        }
    }

    /// Returns the first element as a scalar. `None` for records and empty arrays.
    pub fn first(&self) -> Option<Scalar> {
        match self {
            TypedArray::Bool(a) => a.iter().next().copied().map(Scalar::Bool),
            TypedArray::I8(a) => a.iter().next().copied().map(Scalar::I8),
            TypedArray::I16(a) => a.iter().next().copied().map(Scalar::I16),
            TypedArray::I32(a) => a.iter().next().copied().map(Scalar::I32),
            TypedArray::I64(a) => a.iter().next().copied().map(Scalar::I64),
            TypedArray::U8(a) => a.iter().next().copied().map(Scalar::U8),
            TypedArray::U16(a) => a.iter().next().copied().map(Scalar::U16),
            TypedArray::U32(a) => a.iter().next().copied().map(Scalar::U32),
            TypedArray::U64(a) => a.iter().next().copied().map(Scalar::U64),
            TypedArray::F32(a) => a.iter().next().copied().map(Scalar::F32),
            TypedArray::F64(a) => a.iter().next().copied().map(Scalar::F64),
            TypedArray::Bytes { values, .. } => values.iter().next().cloned().map(Scalar::Bytes),
            TypedArray::Text { values, .. } => values.iter().next().cloned().map(Scalar::Text),
            TypedArray::Record(_) => None,
        }
    }

    /// Converts an integer array into indices. `None` for non-integer types
    /// or when an element is negative.
    pub fn to_index_vec(&self) -> Option<Vec<usize>> {
        fn convert<T: Copy + TryInto<usize>>(a: &ArrayD<T>) -> Option<Vec<usize>> {
            a.iter().map(|&v| v.try_into().ok()).collect()
        }
        match self {
            TypedArray::I8(a) => convert(a),
            TypedArray::I16(a) => convert(a),
            TypedArray::I32(a) => convert(a),
            TypedArray::I64(a) => convert(a),
            TypedArray::U8(a) => convert(a),
            TypedArray::U16(a) => convert(a),
            TypedArray::U32(a) => convert(a),
            TypedArray::U64(a) => convert(a),
            _ => None,
        }
    }

    /// Text values in logical order, for `Text` arrays only.
    pub fn as_text(&self) -> Option<Vec<&str>> {
        match self {
            TypedArray::Text { values, .. } => Some(values.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// Values widened to `f64`, for numeric and boolean arrays.
    pub fn to_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            TypedArray::Bool(a) => Some(a.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect()),
            TypedArray::I8(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::I16(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::I32(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::I64(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::U8(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::U16(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::U32(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::U64(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::F32(a) => Some(a.iter().map(|&v| v as f64).collect()),
            TypedArray::F64(a) => Some(a.iter().copied().collect()),
            _ => None,
        }
    }
}

/// One named column of a record array.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordField {
    pub name: String,
    pub values: TypedArray,
}

/// A structured array stored column-wise. Every column has the record shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordArray {
    pub(crate) shape: Vec<usize>,
    pub(crate) fields: Vec<RecordField>,
}

impl RecordArray {
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn fields(&self) -> &[RecordField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&TypedArray> {
        self.fields.iter().find(|f| f.name == name).map(|f| &f.values)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

/// A single element unwrapped from a one-element array.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Bytes(Vec<u8>),
    Text(String),
}

impl Scalar {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A value recovered from a legacy dictionary-as-string dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Literal>),
    Tuple(Vec<Literal>),
    /// Key/value pairs in source order. Later duplicates replace earlier ones.
    Dict(Vec<(Literal, Literal)>),
}

impl Literal {
    /// Looks up a string key in a `Dict` literal.
    pub fn get(&self, key: &str) -> Option<&Literal> {
        match self {
            Literal::Dict(items) => items
                .iter()
                .find(|(k, _)| matches!(k, Literal::Str(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}

/// Compressed sparse layouts supported by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SparseFormat {
    /// Compressed sparse rows: `indptr` has `rows + 1` entries.
    Csr,
    /// Compressed sparse columns: `indptr` has `cols + 1` entries.
    Csc,
}

impl SparseFormat {
    pub fn tag(&self) -> &'static str {
        match self {
            SparseFormat::Csr => "csr",
            SparseFormat::Csc => "csc",
        }
    }

    /// Length of the compressed axis for a matrix of the given shape.
    pub fn major_len(&self, shape: (usize, usize)) -> usize {
        match self {
            SparseFormat::Csr => shape.0,
            SparseFormat::Csc => shape.1,
        }
    }
}

/// A sparse matrix rebuilt from a `data`/`indices`/`indptr` group.
///
/// The three arrays keep the element types they were stored with.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix {
    pub(crate) format: SparseFormat,
    pub(crate) shape: (usize, usize),
    pub(crate) data: TypedArray,
    pub(crate) indices: TypedArray,
    pub(crate) indptr: TypedArray,
}

impl SparseMatrix {
    pub fn format(&self) -> SparseFormat {
        self.format
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn data(&self) -> &TypedArray {
        &self.data
    }

    pub fn indices(&self) -> &TypedArray {
        &self.indices
    }

    pub fn indptr(&self) -> &TypedArray {
        &self.indptr
    }

    /// `(row, col)` coordinates of the stored entries, in storage order.
    pub fn coordinates(&self) -> Vec<(usize, usize)> {
        let (Some(indices), Some(indptr)) = (self.indices.to_index_vec(), self.indptr.to_index_vec()) else {
            return Vec::new();
        };
        let mut coords = Vec::with_capacity(indices.len());
        for (major, window) in indptr.windows(2).enumerate() {
            let end = window[1].min(indices.len());
            for &minor in indices.get(window[0]..end).unwrap_or_default() {
                coords.push(match self.format {
                    SparseFormat::Csr => (major, minor),
                    SparseFormat::Csc => (minor, major),
                });
            }
        }
        coords
    }
}

/// A node of the nested result mapping.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Scalar(Scalar),
    Array(TypedArray),
    Sparse(SparseMatrix),
    Literal(Literal),
    Mapping(Mapping),
}

impl Value {
    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&TypedArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_sparse(&self) -> Option<&SparseMatrix> {
        match self {
            Value::Sparse(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Value::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Short description of the value kind, for log messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "scalar",
            Value::Array(a) => a.element_name(),
            Value::Sparse(m) => m.format.tag(),
            Value::Literal(_) => "literal",
            Value::Mapping(_) => "mapping",
        }
    }
}

impl From<TypedArray> for Value {
    fn from(value: TypedArray) -> Self {
        Value::Array(value)
    }
}

impl From<SparseMatrix> for Value {
    fn from(value: SparseMatrix) -> Self {
        Value::Sparse(value)
    }
}

impl From<Mapping> for Value {
    fn from(value: Mapping) -> Self {
        Value::Mapping(value)
    }
}
