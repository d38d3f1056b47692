//! Codec layer for raw buffers and legacy text payloads.
//!
//! # Submodules
//!
//! - [`buffer`][]: Raw dataset buffers to typed arrays (byte order, strings, records)
//! - [`text`][]: Byte-string decoding
//! - [`literal`][]: Safe parser for dictionaries stored as text

pub mod buffer;
pub mod literal;
pub mod text;
