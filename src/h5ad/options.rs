//! Read configuration.

/// How the tree walker decides that a node belongs to an already
/// reconstructed sparse group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IgnorePolicy {
    /// Skip a node when any of its ancestor paths was consumed as a sparse
    /// matrix. Independent of enumeration order and of name reuse.
    #[default]
    AncestorPath,
    /// Skip a node when its immediate parent's *name* was consumed as a sparse
    /// matrix anywhere in the same walk. Matches files read by the legacy
    /// reader, including its false positives for reused group names.
    ParentName,
}

/// Options controlling a read.
///
/// ```
/// use h5ad_alt_reader::{IgnorePolicy, ReadOptions};
///
/// let options = ReadOptions::default()
///     .with_ignore_policy(IgnorePolicy::ParentName)
///     .with_legacy_csr_keys(false);
/// assert!(options.recover_dict_strings);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadOptions {
    pub ignore_policy: IgnorePolicy,
    /// Parse byte-string scalars that look like `{...}` into dictionary literals.
    pub recover_dict_strings: bool,
    /// Rebuild `<key>_csr_data` / `_csr_indices` / `_csr_indptr` / `_csr_shape`
    /// top-level siblings into a single CSR matrix under `<key>`.
    pub legacy_csr_keys: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            ignore_policy: IgnorePolicy::default(),
            recover_dict_strings: true,
            legacy_csr_keys: true,
        }
    }
}

impl ReadOptions {
    pub fn with_ignore_policy(mut self, policy: IgnorePolicy) -> Self {
        self.ignore_policy = policy;
        self
    }

    pub fn with_recover_dict_strings(mut self, enabled: bool) -> Self {
        self.recover_dict_strings = enabled;
        self
    }

    pub fn with_legacy_csr_keys(mut self, enabled: bool) -> Self {
        self.legacy_csr_keys = enabled;
        self
    }
}
