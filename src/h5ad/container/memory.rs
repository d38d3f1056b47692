//! In-memory container backend.
//!
//! Groups keep their members in insertion order, which is the enumeration
//! order reported by [`Container::member_names`].

use log::trace;

use super::{Attributes, AttrValue, Container, EntryKind, RawBuffer};
use crate::h5ad::types::error::{H5adError, Result};
use crate::h5ad::utils;

#[derive(Debug, Clone, Default)]
struct MemGroup {
    attrs: Attributes,
    members: Vec<(String, MemEntry)>,
}

impl MemGroup {
    fn member(&self, name: &str) -> Option<&MemEntry> {
        self.members.iter().find(|(n, _)| n == name).map(|(_, e)| e)
    }

    fn member_mut(&mut self, name: &str) -> Option<&mut MemEntry> {
        self.members.iter_mut().find(|(n, _)| n == name).map(|(_, e)| e)
    }
}

#[derive(Debug, Clone)]
struct MemDataset {
    attrs: Attributes,
    buffer: RawBuffer,
}

#[derive(Debug, Clone)]
enum MemEntry {
    Group(MemGroup),
    Dataset(MemDataset),
}

enum NodeRef<'a> {
    Group(&'a MemGroup),
    Dataset(&'a MemDataset),
}

/// A container held entirely in memory.
///
/// ```
/// use h5ad_alt_reader::{MemoryContainer, RawBuffer};
///
/// let mut container = MemoryContainer::new();
/// container
///     .add_dataset("uns/n_pcs", RawBuffer::from_i64(&[50]))?
///     .set_attr("uns", "note", "legacy")?;
/// # Ok::<(), h5ad_alt_reader::H5adError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryContainer {
    root: MemGroup,
}

impl MemoryContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates the group at `path` and any missing ancestors.
    pub fn add_group(&mut self, path: &str) -> Result<&mut Self> {
        self.ensure_group(path)?;
        Ok(self)
    }

    /// Stores `buffer` as a dataset at `path`, creating missing ancestor groups.
    pub fn add_dataset(&mut self, path: &str, buffer: RawBuffer) -> Result<&mut Self> {
        let (parent, leaf) = utils::split_parent(path);
        if leaf.is_empty() {
            return Err(H5adError::format(path, "dataset path must not be empty"));
        }
        let group = self.ensure_group(parent)?;
        if group.member(leaf).is_some() {
            return Err(H5adError::format(path, "node already exists"));
        }
        trace!("Adding dataset '{}' ({}, shape {:?})", path, buffer.dtype, buffer.shape);
        group.members.push((
            leaf.to_string(),
            MemEntry::Dataset(MemDataset {
                attrs: Attributes::new(),
                buffer,
            }),
        ));
        Ok(self)
    }

    /// Sets an attribute on an existing group or dataset.
    pub fn set_attr(&mut self, path: &str, name: &str, value: impl Into<AttrValue>) -> Result<&mut Self> {
        let attrs = self
            .attrs_mut(path)
            .ok_or_else(|| H5adError::format(path, "no such node"))?;
        attrs.insert(name, value);
        Ok(self)
    }

    fn ensure_group(&mut self, path: &str) -> Result<&mut MemGroup> {
        let mut group = &mut self.root;
        for segment in utils::segments(path) {
            let idx = match group.members.iter().position(|(n, _)| n == segment) {
                Some(idx) => idx,
                None => {
                    group
                        .members
                        .push((segment.to_string(), MemEntry::Group(MemGroup::default())));
                    group.members.len() - 1
                }
            };
            group = match &mut group.members[idx].1 {
                MemEntry::Group(g) => g,
                MemEntry::Dataset(_) => {
                    return Err(H5adError::format(
                        path,
                        format!("'{}' is a dataset, not a group", segment),
                    ));
                }
            };
        }
        Ok(group)
    }

    fn attrs_mut(&mut self, path: &str) -> Option<&mut Attributes> {
        let segments: Vec<&str> = utils::segments(path).collect();
        let Some((last, parents)) = segments.split_last() else {
            return Some(&mut self.root.attrs);
        };
        let mut group = &mut self.root;
        for segment in parents {
            group = match group.member_mut(segment)? {
                MemEntry::Group(g) => g,
                MemEntry::Dataset(_) => return None,
            };
        }
        match group.member_mut(last)? {
            MemEntry::Group(g) => Some(&mut g.attrs),
            MemEntry::Dataset(d) => Some(&mut d.attrs),
        }
    }

    fn lookup(&self, path: &str) -> Result<NodeRef<'_>> {
        let mut node = NodeRef::Group(&self.root);
        for segment in utils::segments(path) {
            let NodeRef::Group(group) = node else {
                return Err(H5adError::format(path, "path descends into a dataset"));
            };
            node = match group.member(segment) {
                Some(MemEntry::Group(g)) => NodeRef::Group(g),
                Some(MemEntry::Dataset(d)) => NodeRef::Dataset(d),
                None => return Err(H5adError::format(path, "no such node")),
            };
        }
        Ok(node)
    }
}

impl Container for MemoryContainer {
    fn entry_kind(&self, path: &str) -> Result<EntryKind> {
        Ok(match self.lookup(path)? {
            NodeRef::Group(_) => EntryKind::Group,
            NodeRef::Dataset(_) => EntryKind::Dataset,
        })
    }

    fn member_names(&self, group: &str) -> Result<Vec<String>> {
        match self.lookup(group)? {
            NodeRef::Group(g) => Ok(g.members.iter().map(|(n, _)| n.clone()).collect()),
            NodeRef::Dataset(_) => Err(H5adError::format(group, "not a group")),
        }
    }

    fn attributes(&self, path: &str) -> Result<Attributes> {
        Ok(match self.lookup(path)? {
            NodeRef::Group(g) => g.attrs.clone(),
            NodeRef::Dataset(d) => d.attrs.clone(),
        })
    }

    fn read_raw(&self, path: &str) -> Result<RawBuffer> {
        match self.lookup(path)? {
            NodeRef::Dataset(d) => Ok(d.buffer.clone()),
            NodeRef::Group(_) => Err(H5adError::format(path, "not a dataset")),
        }
    }
}
