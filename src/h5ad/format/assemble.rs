//! Top-level assembly of a container into canonical sections.
//!
//! # Resolution order
//!
//! ```text
//! top-level keys
//!   │
//!   ├─ legacy <key>_csr_* siblings ─→ one CSR matrix under <key>
//!   ├─ alias table (X, obs, var, obsm, varm, layers, uns)
//!   │     layers ─→ flat mapping of matrices
//!   │     uns    ─→ recursive walk into the unstructured mapping
//!   │     other  ─→ read + postprocess under the canonical name
//!   ├─ raw.X, raw.var, raw.varm, raw.cat ─→ stored under their literal key
//!   └─ anything else ─→ folded into uns
//! ```

use std::collections::BTreeMap;

use log::{debug, info, warn};

use crate::h5ad::codec::buffer;
use crate::h5ad::container::Container;
use crate::h5ad::options::ReadOptions;
use crate::h5ad::types::error::{H5adError, Result};
use crate::h5ad::types::mapping::Mapping;
use crate::h5ad::types::models::{SparseFormat, TypedArray, Value};
use crate::h5ad::utils;

use super::aliases::{self, SectionRole};
use super::node::{self, NodeKind};
use super::sparse;
use super::walker::TreeWalker;

const CSR_DATA: &str = "_csr_data";
const CSR_INDICES: &str = "_csr_indices";
const CSR_INDPTR: &str = "_csr_indptr";
const CSR_SHAPE: &str = "_csr_shape";

/// Builds the nested result mapping for a whole container.
pub struct Assembler<'c, C: Container + ?Sized> {
    container: &'c C,
    options: &'c ReadOptions,
    walker: TreeWalker<'c, C>,
}

impl<'c, C: Container + ?Sized> Assembler<'c, C> {
    pub fn new(container: &'c C, options: &'c ReadOptions) -> Self {
        Self {
            container,
            options,
            walker: TreeWalker::new(container, options),
        }
    }

    /// Resolves every top-level key into the result mapping.
    ///
    /// # Errors
    /// Returns [`H5adError::AliasConflict`] when one section is stored under
    /// several spellings, and propagates any read, format or decode error for
    /// the node that caused it. No partial mapping is returned.
    pub fn assemble(&self) -> Result<Mapping> {
        let mut result = Mapping::new();
        let mut uns = Mapping::new();
        let mut remaining = self.container.top_level_keys()?;
        info!("Assembling container with {} top-level key(s)", remaining.len());

        let mut recovered = if self.options.legacy_csr_keys {
            self.recover_legacy_csr(&mut remaining)?
        } else {
            BTreeMap::new()
        };

        for section in aliases::SECTIONS {
            let found: Vec<String> = remaining.iter().filter(|k| section.accepts(k)).cloned().collect();
            match found.as_slice() {
                [] => {}
                [key] => {
                    debug!("Section '{}' found under key '{}'", section.name, key);
                    match section.role {
                        SectionRole::Layers => {
                            result.insert(section.name, self.read_layers(key)?);
                        }
                        SectionRole::Unstructured => self.read_unstructured(key, &mut uns)?,
                        SectionRole::Direct => {
                            let (_, value) = self.read_top(key, &mut recovered)?;
                            result.insert(section.name, value);
                        }
                    }
                }
                _ => {
                    return Err(H5adError::AliasConflict {
                        section: section.name.to_string(),
                        keys: found,
                    });
                }
            }
            remaining.retain(|k| !section.accepts(k));
        }

        for &raw_key in aliases::RAW_KEYS {
            if remaining.iter().any(|k| k == raw_key) {
                debug!("Raw-data key '{}' found", raw_key);
                let (key, value) = self.read_top(raw_key, &mut recovered)?;
                result.insert(key, value);
            }
        }
        remaining.retain(|k| !aliases::RAW_KEYS.iter().any(|r| r == k));

        for key in remaining {
            debug!("Folding unrecognized key '{}' into uns", key);
            let (key, value) = self.read_top(&key, &mut recovered)?;
            if uns.insert(key.clone(), value).is_some() {
                warn!("Top-level key '{}' replaces an uns entry of the same name", key);
            }
        }

        result.insert(aliases::UNS.name, uns);
        info!("Assembled sections: {:?}", result.keys().collect::<Vec<_>>());
        Ok(result)
    }

    fn read_top(&self, key: &str, recovered: &mut BTreeMap<String, Value>) -> Result<(String, Value)> {
        match recovered.remove(key) {
            Some(value) => self.walker.postprocessor().apply(key, key, value),
            None => self.walker.read_entry(key, key),
        }
    }

    fn read_layers(&self, key: &str) -> Result<Mapping> {
        let mut layers = Mapping::new();
        for member in self.container.member_names(key)? {
            let path = utils::join(key, &member);
            let kind = node::classify(self.container, &path)?;
            if kind == NodeKind::Group {
                return Err(H5adError::format(
                    path,
                    "layer must be a dataset or a sparse matrix group",
                ));
            }
            let (name, value) = self.walker.read_classified(&path, &member, &kind)?;
            layers.insert(name, value);
        }
        Ok(layers)
    }

    fn read_unstructured(&self, key: &str, uns: &mut Mapping) -> Result<()> {
        match node::classify(self.container, key)? {
            NodeKind::Group => self.walker.walk(key, uns),
            _ => Err(H5adError::format(key, "unstructured annotations must be a plain group")),
        }
    }

    /// Rebuilds `<stem>_csr_{data,indices,indptr,shape}` siblings into a CSR
    /// matrix exposed as the top-level key `<stem>`.
    fn recover_legacy_csr(&self, remaining: &mut Vec<String>) -> Result<BTreeMap<String, Value>> {
        let has = |keys: &[String], key: &str| keys.iter().any(|k| k == key);
        let snapshot = remaining.clone();
        let stems: Vec<String> = snapshot
            .iter()
            .filter_map(|k| k.strip_suffix(CSR_DATA))
            .filter(|stem| {
                [CSR_INDICES, CSR_INDPTR, CSR_SHAPE]
                    .iter()
                    .all(|suffix| has(&snapshot, &format!("{}{}", stem, suffix)))
            })
            .map(str::to_string)
            .collect();

        let mut recovered = BTreeMap::new();
        for stem in stems {
            let parts: Vec<String> = [CSR_DATA, CSR_INDICES, CSR_INDPTR, CSR_SHAPE]
                .iter()
                .map(|suffix| format!("{}{}", stem, suffix))
                .collect();
            if has(&snapshot, &stem) {
                return Err(H5adError::AliasConflict {
                    section: stem.clone(),
                    keys: vec![stem, parts[0].clone()],
                });
            }

            warn!("Recovering legacy CSR triplet keys for '{}'", stem);
            let [data, indices, indptr, shape] = [0, 1, 2, 3].map(|i| self.read_dataset(&parts[i]));
            let shape = shape?;
            let dims: Vec<i64> = shape
                .to_index_vec()
                .ok_or_else(|| H5adError::format(parts[3].as_str(), "shape must hold non-negative integers"))?
                .into_iter()
                .map(|d| d as i64)
                .collect();
            let matrix = sparse::from_parts(
                &stem,
                SparseFormat::Csr,
                sparse::shape_from_dims(&parts[3], &dims)?,
                data?,
                indices?,
                indptr?,
            )?;

            remaining.retain(|k| !parts.contains(k));
            remaining.push(stem.clone());
            recovered.insert(stem, Value::Sparse(matrix));
        }
        Ok(recovered)
    }

    fn read_dataset(&self, path: &str) -> Result<TypedArray> {
        match node::classify(self.container, path)? {
            NodeKind::Dataset => buffer::decode(path, &self.container.read_raw(path)?),
            _ => Err(H5adError::format(path, "expected a dataset")),
        }
    }
}
