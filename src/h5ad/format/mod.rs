//! Layout interpretation layer for legacy h5ad containers.
//!
//! This module turns the raw node tree exposed by a
//! [`Container`](crate::h5ad::container::Container) into the canonical
//! section mapping returned by [`AltReader`](crate::h5ad::reader::AltReader).
//!
//! # Module Organization
//!
//! - [`aliases`]: Legacy spellings of the canonical sections
//! - [`node`]: Classifies a node as plain group, dataset or sparse group
//! - [`sparse`]: Rebuilds CSR/CSC matrices from their three member datasets
//! - [`postprocess`]: Scalar unwrapping, string decoding and record re-typing
//! - [`walker`]: Depth-first reconstruction of group trees into mappings
//! - [`assemble`]: Resolves top-level keys into the final result
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐
//! │ top-level keys   │ ← assemble::Assembler
//! ├──────────────────┤
//! │ group subtrees   │ ← walker::TreeWalker
//! ├──────────────────┤
//! │ node             │ ← node::classify()
//! │  sparse group    │ ← sparse::reconstruct()
//! │  dataset         │ ← codec::buffer::decode()
//! ├──────────────────┤
//! │ value            │ ← postprocess::Postprocessor
//! └──────────────────┘
//! ```

pub mod aliases;
pub mod assemble;
pub mod node;
pub mod postprocess;
pub mod sparse;
pub mod walker;
