use std::path::Path;

use log::info;

use super::container::{Container, OpenContainer};
use super::format::assemble::Assembler;
use super::options::ReadOptions;
use super::types::error::{H5adError, Result};
use super::types::mapping::Mapping;

/// Conversion from the assembled section mapping into a caller-defined object.
///
/// The reader builds a [`Mapping`] of canonical sections (`X`, `obs`, `var`,
/// `obsm`, `varm`, `layers`, `uns`, and any `raw.*` keys). Implement this
/// trait to turn it into a richer annotated-data type.
pub trait FromSections: Sized {
    fn from_sections(sections: Mapping) -> Result<Self>;
}

impl FromSections for Mapping {
    fn from_sections(sections: Mapping) -> Result<Self> {
        Ok(sections)
    }
}

/// The main reader for legacy h5ad containers.
///
/// Works over any [`Container`] backend and never mutates it.
#[derive(Debug)]
pub struct AltReader<'c, C: Container + ?Sized> {
    container: &'c C,
    options: ReadOptions,
}

impl<'c, C: Container + ?Sized> AltReader<'c, C> {
    pub fn new(container: &'c C, options: ReadOptions) -> Self {
        Self { container, options }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Reads the whole container into its canonical sections.
    ///
    /// # Errors
    /// Returns an error if:
    /// - Two spellings of one section are present
    /// - A sparse group is malformed or uses an unsupported format
    /// - A dataset buffer does not match its declared type
    /// - A byte string or legacy dictionary string cannot be decoded
    pub fn read(&self) -> Result<Mapping> {
        info!("Reading container with {:?}", self.options.ignore_policy);
        let sections = Assembler::new(self.container, &self.options).assemble()?;
        info!("Read complete: {} section(s)", sections.len());
        Ok(sections)
    }

    /// Reads the container and hands the sections to `T`'s constructor.
    pub fn read_into<T: FromSections>(&self) -> Result<T> {
        T::from_sections(self.read()?)
    }
}

/// Reads `container` with default options.
pub fn read_container<C: Container + ?Sized>(container: &C) -> Result<Mapping> {
    AltReader::new(container, ReadOptions::default()).read()
}

/// Opens the file at `path` with backend `B` and reads it.
///
/// # Errors
/// Returns [`H5adError::NotFound`] if nothing exists at `path`, and any
/// error raised by the backend while opening or by the read itself.
pub fn read_file<B: OpenContainer>(path: impl AsRef<Path>, options: ReadOptions) -> Result<Mapping> {
    let path = path.as_ref();
    info!("Opening container file: {}", path.display());
    if !path.exists() {
        return Err(H5adError::NotFound(path.to_path_buf()));
    }
    let container = B::open(path)?;
    AltReader::new(&container, options).read()
}
