//! Core legacy h5ad reader module

pub mod codec;
pub mod container;
pub mod format;
pub mod options;
pub mod reader;
pub mod types;
mod utils;

pub use container::memory::MemoryContainer;
pub use container::{AttrValue, Attributes, Container, EntryKind, OpenContainer, RawBuffer};
pub use options::{IgnorePolicy, ReadOptions};
pub use reader::{read_container, read_file, AltReader, FromSections};
pub use types::error::{H5adError, Result};
