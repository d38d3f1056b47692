//! Canonical section names and their legacy top-level spellings.

/// How the assembler materializes a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionRole {
    /// Read the node directly and store it under the canonical key.
    Direct,
    /// Read every member of the group into a flat mapping.
    Layers,
    /// Walk the group recursively into the unstructured annotations.
    Unstructured,
}

/// A canonical section and the keys it may be stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub spellings: &'static [&'static str],
    pub role: SectionRole,
}

impl Section {
    pub fn accepts(&self, key: &str) -> bool {
        self.spellings.iter().any(|s| *s == key)
    }
}

pub const X: Section = Section {
    name: "X",
    spellings: &["X", "_X", "data", "_data"],
    role: SectionRole::Direct,
};

pub const OBS: Section = Section {
    name: "obs",
    spellings: &["obs", "_obs", "smp", "_smp"],
    role: SectionRole::Direct,
};

pub const VAR: Section = Section {
    name: "var",
    spellings: &["var", "_var"],
    role: SectionRole::Direct,
};

pub const OBSM: Section = Section {
    name: "obsm",
    spellings: &["obsm", "_obsm", "smpm", "_smpm"],
    role: SectionRole::Direct,
};

pub const VARM: Section = Section {
    name: "varm",
    spellings: &["varm", "_varm"],
    role: SectionRole::Direct,
};

pub const LAYERS: Section = Section {
    name: "layers",
    spellings: &["layers", "_layers"],
    role: SectionRole::Layers,
};

pub const UNS: Section = Section {
    name: "uns",
    spellings: &["uns"],
    role: SectionRole::Unstructured,
};

/// Sections in resolution order.
pub const SECTIONS: &[Section] = &[X, OBS, VAR, OBSM, VARM, LAYERS, UNS];

pub const RAW_VAR: &str = "raw.var";

/// Raw-data keys stored verbatim under their literal name.
pub const RAW_KEYS: &[&str] = &["raw.X", RAW_VAR, "raw.varm", "raw.cat"];

/// Keys whose record arrays keep their byte-string fields; the annotation
/// tables decode them when building their index.
pub fn keeps_byte_fields(key: &str) -> bool {
    OBS.accepts(key) || VAR.accepts(key) || key == RAW_VAR
}
