//! Node classification.

use crate::h5ad::container::{Container, EntryKind};
use crate::h5ad::types::error::{H5adError, Result};

use super::sparse::SparseMarker;

/// What a visited node is, decided once per visit.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// A plain group: no value of its own, members are visited separately.
    Group,
    Dataset,
    /// A group storing a sparse matrix in its `data`/`indices`/`indptr` members.
    SparseGroup(SparseMarker),
}

impl NodeKind {
    /// Whether the node has members to traverse.
    pub fn is_group(&self) -> bool {
        !matches!(self, NodeKind::Dataset)
    }
}

pub fn classify<C: Container + ?Sized>(container: &C, path: &str) -> Result<NodeKind> {
    let entry = container.entry_kind(path)?;
    let attrs = container.attributes(path)?;
    match (entry, SparseMarker::detect(path, &attrs)?) {
        (EntryKind::Group, Some(marker)) => Ok(NodeKind::SparseGroup(marker)),
        (EntryKind::Group, None) => Ok(NodeKind::Group),
        (EntryKind::Dataset, None) => Ok(NodeKind::Dataset),
        (EntryKind::Dataset, Some(_)) => Err(H5adError::format(
            path,
            "sparse marker found on a dataset, expected a group",
        )),
    }
}
