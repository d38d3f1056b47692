//! Shared container fixtures for the integration tests.
#![allow(dead_code)]

use h5ad_alt_reader::{MemoryContainer, RawBuffer, Result};

/// Stores a sparse group at `path` using the `h5sparse_*` attribute spelling.
pub fn sparse_group(
    container: &mut MemoryContainer,
    path: &str,
    format: &str,
    shape: [i64; 2],
    data: &[f32],
    indices: &[i32],
    indptr: &[i32],
) -> Result<()> {
    container
        .add_group(path)?
        .set_attr(path, "h5sparse_format", format)?
        .set_attr(path, "h5sparse_shape", shape)?
        .add_dataset(&format!("{}/data", path), RawBuffer::from_f32(data))?
        .add_dataset(&format!("{}/indices", path), RawBuffer::from_i32(indices))?
        .add_dataset(&format!("{}/indptr", path), RawBuffer::from_i32(indptr))?;
    Ok(())
}

/// The 3x4 CSR matrix with one entry per row used across the suites.
pub fn csr_3x4(container: &mut MemoryContainer, path: &str) -> Result<()> {
    sparse_group(container, path, "csr", [3, 4], &[1.0, 2.0, 3.0], &[0, 2, 1], &[0, 1, 2, 3])
}

/// An annotation table: a record array with a byte-string `index` column
/// and a float `n_counts` column.
pub fn annotation_table(names: &[&[u8]]) -> Result<RawBuffer> {
    let counts: Vec<f64> = (1..=names.len()).map(|n| n as f64 * 10.0).collect();
    RawBuffer::pack_records(vec![
        ("index", RawBuffer::from_byte_strings(8, names)),
        ("n_counts", RawBuffer::from_f64(&counts)),
    ])
}

/// `obs` (3 cells), `var` (4 genes) and a CSR `X` of shape 3x4.
pub fn scenario_container() -> Result<MemoryContainer> {
    let mut container = MemoryContainer::new();
    container
        .add_dataset("obs", annotation_table(&[b"cell_a", b"cell_b", b"cell_c"])?)?
        .add_dataset("var", annotation_table(&[b"g1", b"g2", b"g3", b"g4"])?)?;
    csr_3x4(&mut container, "X")?;
    Ok(container)
}
