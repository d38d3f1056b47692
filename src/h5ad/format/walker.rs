//! Recursive reconstruction of group trees into nested mappings.
//!
//! The walker visits every descendant of a root group depth-first, in the
//! backend's member order. Plain groups only contribute nesting; datasets and
//! sparse groups become values at the mapping location mirroring their path.
//! Members of a sparse group are consumed by the matrix and never appear on
//! their own.

use std::collections::HashSet;

use log::{debug, trace};

use crate::h5ad::codec::buffer;
use crate::h5ad::container::Container;
use crate::h5ad::options::{IgnorePolicy, ReadOptions};
use crate::h5ad::types::error::{H5adError, Result};
use crate::h5ad::types::mapping::Mapping;
use crate::h5ad::types::models::Value;
use crate::h5ad::utils;

use super::node::{self, NodeKind};
use super::postprocess::Postprocessor;
use super::sparse;

/// Sparse roots consumed during one walk.
///
/// Paths are relative to the walk root.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    policy: IgnorePolicy,
    entries: HashSet<String>,
}

impl IgnoreSet {
    pub fn new(policy: IgnorePolicy) -> Self {
        Self {
            policy,
            entries: HashSet::new(),
        }
    }

    /// Records the sparse group at `segments`.
    pub fn record(&mut self, segments: &[&str]) {
        let entry = match self.policy {
            IgnorePolicy::AncestorPath => segments.join("/"),
            IgnorePolicy::ParentName => segments.last().copied().unwrap_or_default().to_string(),
        };
        self.entries.insert(entry);
    }

    /// Whether the node at `segments` belongs to a recorded sparse group.
    pub fn covers(&self, segments: &[&str]) -> bool {
        match self.policy {
            IgnorePolicy::AncestorPath => {
                (1..segments.len()).any(|n| self.entries.contains(&segments[..n].join("/")))
            }
            IgnorePolicy::ParentName => {
                segments.len() > 1 && self.entries.contains(segments[segments.len() - 2])
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Walks container subtrees into [`Mapping`]s.
pub struct TreeWalker<'c, C: Container + ?Sized> {
    container: &'c C,
    policy: IgnorePolicy,
    postprocessor: Postprocessor,
}

impl<'c, C: Container + ?Sized> TreeWalker<'c, C> {
    pub fn new(container: &'c C, options: &ReadOptions) -> Self {
        Self {
            container,
            policy: options.ignore_policy,
            postprocessor: Postprocessor::new(options),
        }
    }

    /// Visits every descendant of the group at `root`, storing values in `into`
    /// at paths relative to `root`.
    pub fn walk(&self, root: &str, into: &mut Mapping) -> Result<()> {
        debug!("Walking group '{}'", root);
        let mut ignore = IgnoreSet::new(self.policy);
        self.descend(root, "", into, &mut ignore)?;
        debug!("Finished '{}': {} sparse group(s) consumed", root, ignore.len());
        Ok(())
    }

    fn descend(&self, root: &str, group: &str, into: &mut Mapping, ignore: &mut IgnoreSet) -> Result<()> {
        for member in self.container.member_names(&utils::join(root, group))? {
            let name = utils::join(group, &member);
            if self.visit(root, &name, into, ignore)? {
                self.descend(root, &name, into, ignore)?;
            }
        }
        Ok(())
    }

    /// Processes one node. Returns whether it has members to traverse.
    fn visit(&self, root: &str, name: &str, into: &mut Mapping, ignore: &mut IgnoreSet) -> Result<bool> {
        let path = utils::join(root, name);
        let kind = node::classify(self.container, &path)?;
        if kind == NodeKind::Group {
            return Ok(true);
        }

        let segments: Vec<&str> = utils::segments(name).collect();
        if ignore.covers(&segments) {
            trace!("Skipping '{}': member of a consumed sparse group", path);
            return Ok(kind.is_group());
        }
        let Some((leaf, parents)) = segments.split_last() else {
            return Ok(kind.is_group());
        };
        trace!("Visiting '{}' ({:?})", path, kind);

        let raw = self.materialize(&path, &kind)?;
        if let NodeKind::SparseGroup(_) = kind {
            ignore.record(&segments);
        }

        let mut target = into;
        for (depth, segment) in parents.iter().enumerate() {
            target = target.get_or_insert_mapping(segment).ok_or_else(|| {
                H5adError::format(
                    utils::join(root, &parents[..=depth].join("/")),
                    "a value is stored where a group is expected",
                )
            })?;
        }
        let (key, value) = self.postprocessor.apply(&path, leaf, raw)?;
        trace!("Stored '{}' as {}", path, value.kind_name());
        target.insert(key, value);
        Ok(kind.is_group())
    }

    /// Reads the node at `path` as a single value under `key`: datasets and
    /// sparse groups are read and postprocessed, plain groups are walked into
    /// a nested mapping.
    pub fn read_entry(&self, path: &str, key: &str) -> Result<(String, Value)> {
        let kind = node::classify(self.container, path)?;
        self.read_classified(path, key, &kind)
    }

    pub(crate) fn read_classified(&self, path: &str, key: &str, kind: &NodeKind) -> Result<(String, Value)> {
        if let NodeKind::Group = kind {
            let mut nested = Mapping::new();
            self.walk(path, &mut nested)?;
            return Ok((key.to_string(), Value::Mapping(nested)));
        }
        let raw = self.materialize(path, kind)?;
        self.postprocessor.apply(path, key, raw)
    }

    pub(crate) fn postprocessor(&self) -> &Postprocessor {
        &self.postprocessor
    }

    fn materialize(&self, path: &str, kind: &NodeKind) -> Result<Value> {
        match kind {
            NodeKind::SparseGroup(marker) => Ok(Value::Sparse(sparse::reconstruct(self.container, path, marker)?)),
            NodeKind::Dataset => Ok(Value::Array(buffer::decode(path, &self.container.read_raw(path)?)?)),
            NodeKind::Group => Err(H5adError::format(path, "a plain group has no value of its own")),
        }
    }
}
