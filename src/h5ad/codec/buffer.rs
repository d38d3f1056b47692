//! Decoding of raw dataset buffers into typed arrays.
//!
//! Every read allocates a fresh array whose element type and shape match the
//! buffer's declared dtype and shape exactly. Nothing is reinterpreted.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::trace;
use ndarray::{ArrayD, IxDyn};

use crate::h5ad::container::RawBuffer;
use crate::h5ad::types::dtype::{DType, ElementKind, Endianness};
use crate::h5ad::types::error::{H5adError, Result};
use crate::h5ad::types::models::{RecordArray, RecordField, TypedArray};

/// Decodes the full buffer of the dataset at `path`.
///
/// # Errors
/// Returns [`H5adError::Format`] when the byte length does not equal
/// `product(shape) * itemsize` or that product overflows, and
/// [`H5adError::Decode`] when a UTF-32 text element holds an invalid code
/// point.
pub fn decode(path: &str, raw: &RawBuffer) -> Result<TypedArray> {
    let overflow = || H5adError::format(path, format!("buffer size overflows for shape {:?}", raw.shape));
    let count = raw.element_count().ok_or_else(overflow)?;
    let itemsize = raw.dtype.itemsize();
    if itemsize == 0 && count > 0 {
        return Err(H5adError::format(
            path,
            format!("dtype {} has zero-width elements", raw.dtype),
        ));
    }
    let expected = count.checked_mul(itemsize).ok_or_else(overflow)?;
    if raw.bytes.len() != expected {
        return Err(H5adError::format(
            path,
            format!(
                "buffer holds {} bytes, but dtype {} with shape {:?} requires {}",
                raw.bytes.len(),
                raw.dtype,
                raw.shape,
                expected
            ),
        ));
    }
    trace!("Decoding '{}': dtype={}, shape={:?}", path, raw.dtype, raw.shape);

    let items: Vec<&[u8]> = if itemsize == 0 {
        Vec::new()
    } else {
        raw.bytes.chunks_exact(itemsize).collect()
    };
    decode_items(path, &raw.dtype, &items, &raw.shape)
}

fn decode_items(path: &str, dtype: &DType, items: &[&[u8]], shape: &[usize]) -> Result<TypedArray> {
    match dtype {
        DType::Element {
            kind,
            order: Endianness::Little,
        } => decode_elements::<LittleEndian>(path, *kind, items, shape),
        DType::Element {
            kind,
            order: Endianness::Big,
        } => decode_elements::<BigEndian>(path, *kind, items, shape),
        DType::Record(fields) => {
            let mut offset = 0;
            let mut columns = Vec::with_capacity(fields.len());
            for field in fields {
                let size = field.dtype.itemsize();
                let slices: Vec<&[u8]> = items.iter().map(|item| &item[offset..offset + size]).collect();
                let field_path = format!("{}[{}]", path, field.name);
                columns.push(RecordField {
                    name: field.name.clone(),
                    values: decode_items(&field_path, &field.dtype, &slices, shape)?,
                });
                offset += size;
            }
            Ok(TypedArray::Record(RecordArray {
                shape: shape.to_vec(),
                fields: columns,
            }))
        }
    }
}

fn decode_elements<B: ByteOrder>(
    path: &str,
    kind: ElementKind,
    items: &[&[u8]],
    shape: &[usize],
) -> Result<TypedArray> {
    let array = match kind {
        ElementKind::Bool => TypedArray::Bool(build(path, shape, items.iter().map(|b| b[0] != 0).collect())?),
        ElementKind::Int(1) => TypedArray::I8(build(path, shape, items.iter().map(|b| b[0] as i8).collect())?),
        ElementKind::Int(2) => TypedArray::I16(build(path, shape, items.iter().map(|b| B::read_i16(b)).collect())?),
        ElementKind::Int(4) => TypedArray::I32(build(path, shape, items.iter().map(|b| B::read_i32(b)).collect())?),
        ElementKind::Int(8) => TypedArray::I64(build(path, shape, items.iter().map(|b| B::read_i64(b)).collect())?),
        ElementKind::UInt(1) => TypedArray::U8(build(path, shape, items.iter().map(|b| b[0]).collect())?),
        ElementKind::UInt(2) => TypedArray::U16(build(path, shape, items.iter().map(|b| B::read_u16(b)).collect())?),
        ElementKind::UInt(4) => TypedArray::U32(build(path, shape, items.iter().map(|b| B::read_u32(b)).collect())?),
        ElementKind::UInt(8) => TypedArray::U64(build(path, shape, items.iter().map(|b| B::read_u64(b)).collect())?),
        ElementKind::Float(4) => TypedArray::F32(build(path, shape, items.iter().map(|b| B::read_f32(b)).collect())?),
        ElementKind::Float(8) => TypedArray::F64(build(path, shape, items.iter().map(|b| B::read_f64(b)).collect())?),
        ElementKind::Bytes(width) => TypedArray::Bytes {
            width,
            values: build(path, shape, items.iter().map(|b| strip_nul(b).to_vec()).collect())?,
        },
        ElementKind::Unicode(width) => {
            let values = items
                .iter()
                .map(|b| decode_utf32::<B>(path, b))
                .collect::<Result<Vec<_>>>()?;
            TypedArray::Text {
                width,
                values: build(path, shape, values)?,
            }
        }
        other => {
            return Err(H5adError::format(path, format!("unsupported element kind {:?}", other)));
        }
    };
    Ok(array)
}

fn build<T>(path: &str, shape: &[usize], values: Vec<T>) -> Result<ArrayD<T>> {
    ArrayD::from_shape_vec(IxDyn(shape), values)
        .map_err(|e| H5adError::format(path, format!("cannot shape buffer as {:?}: {}", shape, e)))
}

/// Fixed-width byte strings are NUL padded on the right.
pub(crate) fn strip_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&c| c != 0).map_or(0, |i| i + 1);
    &bytes[..end]
}

fn decode_utf32<B: ByteOrder>(path: &str, bytes: &[u8]) -> Result<String> {
    let mut text = bytes
        .chunks_exact(4)
        .map(|unit| {
            let code = B::read_u32(unit);
            char::from_u32(code)
                .ok_or_else(|| H5adError::decode(path, format!("invalid UTF-32 code point {:#x}", code)))
        })
        .collect::<Result<String>>()?;
    let trimmed = text.trim_end_matches('\0').len();
    text.truncate(trimmed);
    Ok(text)
}
