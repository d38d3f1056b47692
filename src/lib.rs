//! # h5ad-alt-reader
//!
//! A reader for annotated-data containers written by early versions of the
//! h5ad format, before the current on-disk schema settled.
//!
//! Such files store their sections under several historical spellings
//! (`_X`, `smp`, `_smpm`, ...), keep sparse matrices as groups of three
//! datasets tagged with `h5sparse_*` attributes, and may hold dictionaries as
//! printed text. This crate walks the container, rebuilds the sparse matrices,
//! normalizes the values and returns one mapping keyed by canonical section
//! names.
//!
//! ```
//! use h5ad_alt_reader::{read_container, MemoryContainer, RawBuffer, Value};
//!
//! let mut container = MemoryContainer::new();
//! container.add_dataset("_data", RawBuffer::from_f32(&[1.0, 2.0, 3.0]))?;
//! container.add_dataset("custom_blob", RawBuffer::from_i64(&[7]))?;
//!
//! let sections = read_container(&container)?;
//! assert!(matches!(sections.get("X"), Some(Value::Array(_))));
//! assert!(sections.contains_path("uns/custom_blob"));
//! # Ok::<(), h5ad_alt_reader::H5adError>(())
//! ```
//!
//! The node tree is read through the [`Container`] trait. [`MemoryContainer`]
//! is the bundled backend; file-backed backends implement [`OpenContainer`]
//! and are used with [`read_file`].
pub mod h5ad;

// Re-export the main types for convenience
pub use h5ad::{
    AltReader, AttrValue, Attributes, Container, EntryKind, FromSections, H5adError, IgnorePolicy,
    MemoryContainer, OpenContainer, RawBuffer, ReadOptions, Result, read_container, read_file,
    types::{
        dtype::{DType, ElementKind, Endianness, Field},
        mapping::Mapping,
        models::{Literal, RecordArray, RecordField, Scalar, SparseFormat, SparseMatrix, TypedArray, Value},
    },
};
