mod common;

use std::fs;
use std::path::Path;

use h5ad_alt_reader::{
    AltReader, Attributes, Container, EntryKind, FromSections, H5adError, Mapping, MemoryContainer, OpenContainer,
    RawBuffer, ReadOptions, Result, Scalar, SparseFormat, TypedArray, Value, read_container, read_file,
};

#[test]
fn assembles_canonical_sections() -> Result<()> {
    let container = common::scenario_container()?;
    let sections = read_container(&container)?;

    assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["X", "obs", "uns", "var"]);

    let x = sections.get("X").and_then(Value::as_sparse).expect("sparse X");
    assert_eq!(x.format(), SparseFormat::Csr);
    assert_eq!(x.shape(), (3, 4));
    assert_eq!(x.nnz(), 3);
    assert!(!sections.contains_path("X/data"));
    assert!(!sections.contains_path("uns/data"));
    assert!(!sections.contains_path("uns/indptr"));

    let Some(TypedArray::Record(obs)) = sections.get("obs").and_then(Value::as_array) else {
        panic!("obs is not a record array");
    };
    assert_eq!(obs.len(), 3);
    assert!(matches!(obs.field("index"), Some(TypedArray::Bytes { .. })));
    assert_eq!(sections.get("uns"), Some(&Value::Mapping(Mapping::new())));
    Ok(())
}

#[test]
fn resolves_legacy_spellings() -> Result<()> {
    let mut container = MemoryContainer::new();
    container
        .add_dataset("_data", RawBuffer::from_f32(&[1.0, 0.0, 2.0, 0.0]).with_shape(&[2, 2]))?
        .add_dataset("_smp", common::annotation_table(&[b"c1", b"c2"])?)?
        .add_dataset("_var", common::annotation_table(&[b"g1", b"g2"])?)?
        .add_dataset("_smpm/X_pca", RawBuffer::from_f64(&[0.1, 0.2, 0.3, 0.4]).with_shape(&[2, 2]))?
        .add_dataset("_varm/PCs", RawBuffer::from_f64(&[1.0, 2.0]).with_shape(&[2, 1]))?;

    let sections = read_container(&container)?;
    assert_eq!(
        sections.keys().collect::<Vec<_>>(),
        vec!["X", "obs", "obsm", "uns", "var", "varm"]
    );
    assert_eq!(sections.get("X").and_then(Value::as_array).map(TypedArray::shape), Some(&[2usize, 2][..]));
    assert!(sections.get_path("obsm/X_pca").and_then(Value::as_array).is_some());
    assert!(sections.contains_path("varm/PCs"));
    Ok(())
}

#[test]
fn two_spellings_of_one_section_conflict() -> Result<()> {
    let mut container = MemoryContainer::new();
    container
        .add_dataset("X", RawBuffer::from_f32(&[1.0, 2.0]))?
        .add_dataset("_data", RawBuffer::from_f32(&[3.0, 4.0]))?;

    match read_container(&container) {
        Err(H5adError::AliasConflict { section, keys }) => {
            assert_eq!(section, "X");
            assert_eq!(keys, vec!["X", "_data"]);
        }
        other => panic!("expected an alias conflict, got {other:?}"),
    }
    Ok(())
}

#[test]
fn unrecognized_keys_fold_into_uns() -> Result<()> {
    let mut container = MemoryContainer::new();
    container
        .add_dataset("uns/n_pcs", RawBuffer::from_i64(&[50]))?
        .add_dataset("custom_blob", RawBuffer::from_i64(&[7]))?
        .add_dataset("extra/nested/v", RawBuffer::from_f64(&[1.0, 2.0]))?;
    common::csr_3x4(&mut container, "graph")?;

    let sections = read_container(&container)?;
    assert_eq!(sections.get_path("uns/custom_blob"), Some(&Value::Scalar(Scalar::I64(7))));
    assert_eq!(sections.get_path("uns/n_pcs"), Some(&Value::Scalar(Scalar::I64(50))));
    assert!(sections.get_path("uns/extra/nested/v").and_then(Value::as_array).is_some());
    assert!(sections.get_path("uns/graph").and_then(Value::as_sparse).is_some());
    assert!(!sections.contains_key("custom_blob"));
    Ok(())
}

#[test]
fn top_level_key_replaces_uns_entry() -> Result<()> {
    let mut container = MemoryContainer::new();
    container
        .add_dataset("uns/colors", RawBuffer::from_i64(&[1]))?
        .add_dataset("colors", RawBuffer::from_i64(&[2]))?;

    let sections = read_container(&container)?;
    assert_eq!(sections.get_path("uns/colors"), Some(&Value::Scalar(Scalar::I64(2))));
    Ok(())
}

#[test]
fn uns_recovers_dictionary_strings() -> Result<()> {
    let mut container = MemoryContainer::new();
    container.add_dataset("uns/pca", RawBuffer::from_byte_strings(32, &[b"{'zero_center': True, 'n': 3}"]))?;

    let sections = read_container(&container)?;
    let literal = sections.get_path("uns/pca").and_then(Value::as_literal).expect("literal");
    assert_eq!(literal.get("n"), Some(&h5ad_alt_reader::Literal::Int(3)));
    Ok(())
}

#[test]
fn uns_must_be_a_group() -> Result<()> {
    let mut container = MemoryContainer::new();
    container.add_dataset("uns", RawBuffer::from_i64(&[1]))?;

    let err = read_container(&container).unwrap_err();
    assert!(matches!(err, H5adError::Format { .. }), "got {err:?}");
    assert_eq!(err.path(), Some("uns"));
    Ok(())
}

#[test]
fn reads_layers_into_a_flat_mapping() -> Result<()> {
    let mut container = MemoryContainer::new();
    common::csr_3x4(&mut container, "layers/counts")?;
    container.add_dataset("layers/spliced", RawBuffer::from_f32(&[0.0; 12]).with_shape(&[3, 4]))?;

    let sections = read_container(&container)?;
    let layers = sections.get("layers").and_then(Value::as_mapping).expect("layers");
    assert_eq!(layers.keys().collect::<Vec<_>>(), vec!["counts", "spliced"]);
    assert!(layers.get("counts").and_then(Value::as_sparse).is_some());
    assert!(!layers.contains_key("data"));
    Ok(())
}

#[test]
fn plain_group_layer_is_format_error() -> Result<()> {
    let mut container = MemoryContainer::new();
    container.add_dataset("_layers/nested/x", RawBuffer::from_f32(&[1.0, 2.0]))?;

    let err = read_container(&container).unwrap_err();
    assert!(matches!(err, H5adError::Format { .. }), "got {err:?}");
    assert_eq!(err.path(), Some("_layers/nested"));
    Ok(())
}

#[test]
fn raw_keys_keep_their_literal_names() -> Result<()> {
    let mut container = MemoryContainer::new();
    container
        .add_dataset("raw.X", RawBuffer::from_f32(&[1.0, 2.0, 3.0]))?
        .add_dataset("raw.var", common::annotation_table(&[b"g1", b"g2"])?)?
        .add_dataset("raw.cat", common::annotation_table(&[b"a", b"b"])?)?;

    let sections = read_container(&container)?;
    assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["raw.X", "raw.cat", "raw.var", "uns"]);

    let Some(TypedArray::Record(raw_var)) = sections.get("raw.var").and_then(Value::as_array) else {
        panic!("raw.var is not a record array");
    };
    assert!(matches!(raw_var.field("index"), Some(TypedArray::Bytes { .. })));

    let Some(TypedArray::Record(raw_cat)) = sections.get("raw.cat").and_then(Value::as_array) else {
        panic!("raw.cat is not a record array");
    };
    assert!(matches!(raw_cat.field("index"), Some(TypedArray::Text { width: 2, .. })));
    Ok(())
}

fn legacy_csr_container() -> Result<MemoryContainer> {
    let mut container = MemoryContainer::new();
    container
        .add_dataset("X_csr_data", RawBuffer::from_f32(&[1.0, 2.0, 3.0]))?
        .add_dataset("X_csr_indices", RawBuffer::from_i32(&[0, 2, 1]))?
        .add_dataset("X_csr_indptr", RawBuffer::from_i32(&[0, 1, 2, 3]))?
        .add_dataset("X_csr_shape", RawBuffer::from_i64(&[3, 4]))?;
    Ok(container)
}

#[test]
fn recovers_legacy_csr_keys() -> Result<()> {
    let container = legacy_csr_container()?;
    let sections = read_container(&container)?;

    assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["X", "uns"]);
    let x = sections.get("X").and_then(Value::as_sparse).expect("sparse X");
    assert_eq!(x.shape(), (3, 4));
    assert_eq!(x.coordinates(), vec![(0, 0), (1, 2), (2, 1)]);
    assert!(sections.get("uns").and_then(Value::as_mapping).is_some_and(Mapping::is_empty));
    Ok(())
}

#[test]
fn legacy_csr_recovery_can_be_disabled() -> Result<()> {
    let container = legacy_csr_container()?;
    let options = ReadOptions::default().with_legacy_csr_keys(false);
    let sections = AltReader::new(&container, options).read()?;

    assert!(!sections.contains_key("X"));
    assert!(sections.contains_path("uns/X_csr_data"));
    assert!(sections.contains_path("uns/X_csr_shape"));
    Ok(())
}

#[test]
fn legacy_csr_stem_collision_conflicts() -> Result<()> {
    let mut container = legacy_csr_container()?;
    container.add_dataset("X", RawBuffer::from_f32(&[1.0, 2.0]))?;

    let err = read_container(&container).unwrap_err();
    assert!(matches!(err, H5adError::AliasConflict { .. }), "got {err:?}");
    Ok(())
}

#[test]
fn empty_container_yields_empty_uns() -> Result<()> {
    let sections = read_container(&MemoryContainer::new())?;
    assert_eq!(sections.keys().collect::<Vec<_>>(), vec!["uns"]);
    Ok(())
}

#[test]
fn errors_name_the_failing_node() -> Result<()> {
    let mut container = common::scenario_container()?;
    container.add_dataset("uns/broken", RawBuffer::new("<i4".parse()?, vec![2], vec![0; 3]))?;

    let err = read_container(&container).unwrap_err();
    assert_eq!(err.path(), Some("uns/broken"));
    Ok(())
}

struct Summary {
    n_obs: usize,
    n_vars: usize,
    has_uns: bool,
}

impl FromSections for Summary {
    fn from_sections(sections: Mapping) -> Result<Self> {
        let shape = sections
            .get("X")
            .and_then(Value::as_sparse)
            .map(|x| x.shape())
            .ok_or_else(|| H5adError::Format {
                path: "X".into(),
                reason: "missing matrix".into(),
            })?;
        Ok(Self {
            n_obs: shape.0,
            n_vars: shape.1,
            has_uns: sections.contains_key("uns"),
        })
    }
}

#[test]
fn read_into_builds_caller_objects() -> Result<()> {
    let container = common::scenario_container()?;
    let summary: Summary = AltReader::new(&container, ReadOptions::default()).read_into()?;

    assert_eq!((summary.n_obs, summary.n_vars), (3, 4));
    assert!(summary.has_uns);
    Ok(())
}

/// File-backed fixture: the file must exist, its contents are ignored.
struct FixtureFile(MemoryContainer);

impl Container for FixtureFile {
    fn entry_kind(&self, path: &str) -> Result<EntryKind> {
        self.0.entry_kind(path)
    }

    fn member_names(&self, group: &str) -> Result<Vec<String>> {
        self.0.member_names(group)
    }

    fn attributes(&self, path: &str) -> Result<Attributes> {
        self.0.attributes(path)
    }

    fn read_raw(&self, path: &str) -> Result<RawBuffer> {
        self.0.read_raw(path)
    }
}

impl OpenContainer for FixtureFile {
    fn open(path: &Path) -> Result<Self> {
        fs::metadata(path)?;
        Ok(Self(common::scenario_container()?))
    }
}

#[test]
fn missing_file_is_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("missing.h5ad");

    match read_file::<FixtureFile>(&path, ReadOptions::default()) {
        Err(H5adError::NotFound(reported)) => assert_eq!(reported, path),
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[test]
fn reads_existing_file_through_backend() -> Result<()> {
    let file = tempfile::NamedTempFile::new()?;
    let sections = read_file::<FixtureFile>(file.path(), ReadOptions::default())?;
    assert!(sections.get("X").and_then(Value::as_sparse).is_some());
    Ok(())
}
