//! Sparse matrix groups.
//!
//! A sparse matrix is stored as a group holding three sibling datasets:
//!
//! ```text
//! X/                      attrs: h5sparse_format = "csr"
//! ├── data     [nnz]             h5sparse_shape  = [rows, cols]
//! ├── indices  [nnz]
//! └── indptr   [rows + 1]        (cols + 1 for csc)
//! ```
//!
//! Newer writers spell the marker `encoding-type = "csr_matrix"` with a
//! `shape` attribute; both spellings are recognized.

use log::debug;

use crate::h5ad::codec::buffer;
use crate::h5ad::container::{Attributes, Container, EntryKind};
use crate::h5ad::types::error::{H5adError, Result};
use crate::h5ad::types::models::{SparseFormat, SparseMatrix, TypedArray};
use crate::h5ad::utils;

pub const FORMAT_ATTR: &str = "h5sparse_format";
pub const SHAPE_ATTR: &str = "h5sparse_shape";
pub const ENCODING_TYPE_ATTR: &str = "encoding-type";
pub const ENCODING_SHAPE_ATTR: &str = "shape";

pub const DATA: &str = "data";
pub const INDICES: &str = "indices";
pub const INDPTR: &str = "indptr";

/// The sparse-storage attributes found on a group, not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct SparseMarker {
    pub format_tag: String,
    pub shape: Option<Vec<i64>>,
}

impl SparseMarker {
    /// Looks for a sparse marker in `attrs`.
    ///
    /// Returns `Ok(None)` when the node is not marked. A marker whose format
    /// attribute is not text is a format error.
    pub fn detect(path: &str, attrs: &Attributes) -> Result<Option<Self>> {
        if let Some(tag) = attrs.get(FORMAT_ATTR) {
            let format_tag = tag
                .as_text()
                .ok_or_else(|| H5adError::format(path, format!("'{}' attribute is not text", FORMAT_ATTR)))?;
            return Ok(Some(Self {
                format_tag: format_tag.to_string(),
                shape: attrs.get(SHAPE_ATTR).and_then(|v| v.as_int_array()),
            }));
        }

        let encoded = attrs
            .get(ENCODING_TYPE_ATTR)
            .and_then(|v| v.as_text())
            .filter(|t| matches!(*t, "csr_matrix" | "csc_matrix"));
        Ok(encoded.map(|tag| Self {
            format_tag: tag.to_string(),
            shape: attrs.get(ENCODING_SHAPE_ATTR).and_then(|v| v.as_int_array()),
        }))
    }

    pub fn format(&self, path: &str) -> Result<SparseFormat> {
        match self.format_tag.as_str() {
            "csr" | "csr_matrix" => Ok(SparseFormat::Csr),
            "csc" | "csc_matrix" => Ok(SparseFormat::Csc),
            other => Err(H5adError::format(path, format!("unsupported sparse format '{}'", other))),
        }
    }

    pub fn shape(&self, path: &str) -> Result<(usize, usize)> {
        let dims = self
            .shape
            .as_deref()
            .ok_or_else(|| H5adError::format(path, "sparse group has no integer shape attribute"))?;
        shape_from_dims(path, dims)
    }
}

pub(crate) fn shape_from_dims(path: &str, dims: &[i64]) -> Result<(usize, usize)> {
    match dims {
        [rows, cols] => {
            let rows = usize::try_from(*rows)
                .map_err(|_| H5adError::format(path, format!("negative row count {}", rows)))?;
            let cols = usize::try_from(*cols)
                .map_err(|_| H5adError::format(path, format!("negative column count {}", cols)))?;
            Ok((rows, cols))
        }
        _ => Err(H5adError::format(
            path,
            format!("sparse shape must have two dimensions, found {:?}", dims),
        )),
    }
}

/// Reads the three companion datasets of the sparse group at `path` and
/// rebuilds the matrix declared by `marker`.
///
/// # Errors
/// Returns [`H5adError::Format`] when the format tag is not `csr`/`csc`, the
/// shape is not two non-negative integers, a child dataset is missing, or the
/// array lengths disagree with the compressed-sparse contract.
pub fn reconstruct<C: Container + ?Sized>(container: &C, path: &str, marker: &SparseMarker) -> Result<SparseMatrix> {
    let format = marker.format(path)?;
    let shape = marker.shape(path)?;

    let data = read_child(container, path, DATA)?;
    let indices = read_child(container, path, INDICES)?;
    let indptr = read_child(container, path, INDPTR)?;

    from_parts(path, format, shape, data, indices, indptr)
}

fn read_child<C: Container + ?Sized>(container: &C, group: &str, name: &str) -> Result<TypedArray> {
    let path = utils::join(group, name);
    match container.entry_kind(&path) {
        Ok(EntryKind::Dataset) => buffer::decode(&path, &container.read_raw(&path)?),
        _ => Err(H5adError::format(
            path,
            format!("sparse group is missing its '{}' dataset", name),
        )),
    }
}

/// Assembles a matrix from already decoded arrays, checking only length
/// consistency.
pub fn from_parts(
    path: &str,
    format: SparseFormat,
    shape: (usize, usize),
    data: TypedArray,
    indices: TypedArray,
    indptr: TypedArray,
) -> Result<SparseMatrix> {
    for (name, array) in [(DATA, &data), (INDICES, &indices), (INDPTR, &indptr)] {
        if array.ndim() != 1 {
            return Err(H5adError::format(
                utils::join(path, name),
                format!("expected a one-dimensional array, found shape {:?}", array.shape()),
            ));
        }
    }
    for (name, array) in [(INDICES, &indices), (INDPTR, &indptr)] {
        if !array.is_integer() {
            return Err(H5adError::format(
                utils::join(path, name),
                format!("expected integer elements, found {}", array.element_name()),
            ));
        }
    }
    if data.is_record() || matches!(data, TypedArray::Bytes { .. } | TypedArray::Text { .. }) {
        return Err(H5adError::format(
            utils::join(path, DATA),
            format!("expected numeric elements, found {}", data.element_name()),
        ));
    }
    if indices.len() != data.len() {
        return Err(H5adError::format(
            path,
            format!("'indices' has {} entries but 'data' has {}", indices.len(), data.len()),
        ));
    }
    let major = format.major_len(shape);
    if indptr.len() != major + 1 {
        return Err(H5adError::format(
            path,
            format!(
                "'indptr' has {} entries, expected {} for a {}x{} {} matrix",
                indptr.len(),
                major + 1,
                shape.0,
                shape.1,
                format.tag()
            ),
        ));
    }

    debug!(
        "Reconstructed {} matrix at '{}': shape={}x{}, nnz={}, data={}",
        format.tag(),
        path,
        shape.0,
        shape.1,
        data.len(),
        data.element_name()
    );

    Ok(SparseMatrix {
        format,
        shape,
        data,
        indices,
        indptr,
    })
}
